//! services/client/src/context.rs
//!
//! Owns every domain store plus the session, all built over the same ports.

use futures::join;
use jobs_dashboard_core::ports::{DownloadSink, PortResult, SystemClock};
use jobs_dashboard_core::session::SessionManager;
use jobs_dashboard_core::stores::{
    CompaniesStore, DashboardStore, EmpresasStore, FilteredStore, PublishersStore, ReportScope,
    ReportsStore, SkillsStore, StorePorts, TrendingStore, VagasStore,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use crate::adapters::{FileKeyValueStore, FsDownloads, ReqwestHttpClient};
use crate::config::Config;
use crate::error::ClientError;

pub struct DashboardContext {
    pub session: SessionManager,
    pub vagas: VagasStore,
    pub empresas: EmpresasStore,
    pub skills: SkillsStore,
    pub trending: TrendingStore,
    pub publishers: PublishersStore,
    pub companies: CompaniesStore,
    pub dashboard: DashboardStore,
    pub reports: ReportsStore,
}

impl DashboardContext {
    pub fn new(ports: StorePorts, session: SessionManager, downloads: Arc<dyn DownloadSink>) -> Self {
        Self {
            vagas: VagasStore::new(&ports),
            empresas: EmpresasStore::new(&ports),
            skills: SkillsStore::new(&ports),
            trending: TrendingStore::new(&ports),
            publishers: PublishersStore::new(&ports),
            companies: CompaniesStore::new(&ports),
            dashboard: DashboardStore::new(&ports),
            reports: ReportsStore::new(&ports, ReportScope::Private, downloads),
            session,
        }
    }

    /// Wires the file store, the reqwest client and the download directory.
    pub fn from_config(config: &Config) -> Result<Self, ClientError> {
        let storage = Arc::new(FileKeyValueStore::open(&config.storage_path)?);
        let clock = Arc::new(SystemClock);
        let session = SessionManager::new(storage.clone(), clock.clone());
        let http = Arc::new(ReqwestHttpClient::new(
            config.api_base_url.clone(),
            config.request_timeout,
            session.clone(),
        )?);
        let downloads = Arc::new(FsDownloads::new(config.download_dir.clone()));

        let context = Self::new(StorePorts { http, storage, clock }, session, downloads);
        if let Some(token) = &config.api_token {
            if context.session.token().as_deref() != Some(token.as_str()) {
                context.login(token, None)?;
            }
        }
        Ok(context)
    }

    /// Default windows plus whatever each domain persisted.
    pub fn initialize(&self) {
        self.vagas.initialize_with_defaults();
        self.empresas.initialize_with_defaults();
        self.skills.initialize_with_defaults();
        self.trending.initialize_with_defaults();
        self.publishers.initialize_with_defaults();
        self.companies.initialize_with_defaults();
        self.dashboard.initialize_with_defaults();
        self.reports.initialize_with_defaults();
    }

    pub fn login(&self, token: &str, user: Option<&Value>) -> PortResult<()> {
        self.session.set_token(token)?;
        if let Some(user) = user {
            self.session.set_user(user)?;
        }
        self.reset_stores();
        Ok(())
    }

    /// Clears the stored credentials and every domain's persisted and in-memory state.
    pub fn logout(&self) {
        self.session.logout();
        self.reset_stores();
    }

    fn reset_stores(&self) {
        self.vagas.reset_session_state();
        self.empresas.reset_session_state();
        self.skills.reset_session_state();
        self.trending.reset_session_state();
        self.publishers.reset_session_state();
        self.companies.reset_session_state();
        self.dashboard.reset_session_state();
        self.reports.reset_session_state();
    }

    /// Refreshes every screen concurrently. Failures stay in each store's slots.
    pub async fn refresh_all(&self) {
        info!("Refreshing every dashboard");
        join!(
            self.vagas.refresh_data(),
            self.empresas.refresh_data(),
            self.skills.refresh_data(),
            self.trending.refresh_all(),
            self.publishers.fetch_all_data(),
            self.companies.refresh_all(),
            self.dashboard.refresh_data(),
            self.reports.preview(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use jobs_dashboard_core::ports::{FixedClock, HttpClient, HttpResponse, KeyValueStore, PortError};
    use jobs_dashboard_core::query::QueryParams;
    use jobs_dashboard_core::{MemoryStore, Period};
    use serde_json::json;

    struct Offline;

    #[async_trait]
    impl HttpClient for Offline {
        async fn get(&self, path: &str, _params: &QueryParams) -> PortResult<HttpResponse> {
            Err(PortError::network(format!("offline: {}", path)))
        }

        async fn post(&self, path: &str, _body: &Value) -> PortResult<HttpResponse> {
            Err(PortError::network(format!("offline: {}", path)))
        }
    }

    struct Discard;

    impl DownloadSink for Discard {
        fn save(&self, _filename: &str, _contents: &[u8]) -> PortResult<()> {
            Ok(())
        }
    }

    fn context() -> (Arc<MemoryStore>, DashboardContext) {
        let storage = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixedClock::on(NaiveDate::from_ymd_opt(2025, 3, 15).unwrap()));
        let session = SessionManager::new(storage.clone(), clock.clone());
        let ports = StorePorts {
            http: Arc::new(Offline),
            storage: storage.clone(),
            clock,
        };
        (storage, DashboardContext::new(ports, session, Arc::new(Discard)))
    }

    #[test]
    fn logout_forgets_filters_everywhere() {
        let (storage, context) = context();
        context.login("token-1", Some(&json!({"email": "ana@example.com"}))).unwrap();
        context.initialize();
        context.vagas.set_period(Period::Last7Days);
        context
            .publishers
            .set_filters(json!({"publisher": "LinkedIn"}))
            .unwrap();
        assert!(storage.get_item("vagas_filters").is_some());

        context.logout();

        assert_eq!(storage.get_item("token"), None);
        assert_eq!(storage.get_item("vagas_filters"), None);
        assert_eq!(storage.get_item("publishers_filters"), None);
        assert_eq!(context.publishers.filters().publisher, None);
        assert_eq!(context.vagas.filters().window.date_from, None);
    }

    #[tokio::test]
    async fn offline_refresh_reports_per_store_errors() {
        let (_, context) = context();
        context.initialize();
        context.refresh_all().await;

        assert!(context.vagas.snapshot().jobs.error.is_some());
        assert!(context.dashboard.snapshot().overview.error.is_some());
        assert!(context.companies.snapshot().kpis.error.is_some());
        assert!(!context.publishers.snapshot().kpis.loading);
    }
}
