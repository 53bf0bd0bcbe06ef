//! crates/jobs_dashboard_core/src/stores/companies.rs
//!
//! The companies dashboard. Every chart has its own slot, so one failing endpoint
//! leaves the others intact.

use futures::join;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use super::{get_json, get_list, lock, track, FilterCell, FilteredStore, Slot, StorePorts};
use crate::domain::CompaniesKpis;
use crate::endpoints;
use crate::filters::CompaniesFilters;
use crate::ports::HttpClient;
use crate::query::{companies_params, position_params, QueryParams};

/// Window used when the filters carry no dates.
const DEFAULT_WINDOW_DAYS: u64 = 30;
const MAX_SKILLS_LIMIT: u64 = 50;

#[derive(Debug, Clone, Default)]
pub struct CompaniesState {
    pub kpis: Slot<CompaniesKpis>,
    pub top_companies: Slot<Vec<Value>>,
    pub seniority_distribution: Slot<Vec<Value>>,
    pub employment_type_distribution: Slot<Vec<Value>>,
    pub remote_percentage: Slot<Vec<Value>>,
    pub jobs_timeline: Slot<Vec<Value>>,
    pub top_skills: Slot<Vec<Value>>,
    pub available_companies: Vec<String>,
    pub available_seniority_levels: Vec<String>,
    pub available_positions: Vec<String>,
}

impl CompaniesState {
    fn errors_mut(&mut self) -> [(&mut Option<String>, &'static str); 7] {
        [
            (&mut self.kpis.error, "kpis"),
            (&mut self.top_companies.error, "top_companies"),
            (&mut self.seniority_distribution.error, "seniority_distribution"),
            (&mut self.employment_type_distribution.error, "employment_type_distribution"),
            (&mut self.remote_percentage.error, "remote_percentage"),
            (&mut self.jobs_timeline.error, "jobs_timeline"),
            (&mut self.top_skills.error, "top_skills"),
        ]
    }
}

pub struct CompaniesStore {
    http: Arc<dyn HttpClient>,
    filters: FilterCell<CompaniesFilters>,
    state: Mutex<CompaniesState>,
}

impl CompaniesStore {
    pub fn new(ports: &StorePorts) -> Self {
        Self {
            http: ports.http.clone(),
            filters: FilterCell::new(ports.storage.clone(), ports.clock.clone()),
            state: Mutex::new(CompaniesState::default()),
        }
    }

    pub fn snapshot(&self) -> CompaniesState {
        lock(&self.state).clone()
    }

    pub fn clear_errors(&self) {
        let mut state = lock(&self.state);
        for (error, _) in state.errors_mut() {
            *error = None;
        }
    }

    fn params(&self, limit: Option<u64>) -> QueryParams {
        let filters = self.filters.get();
        let range = filters
            .window
            .range_or_trailing(self.filters.today(), DEFAULT_WINDOW_DAYS);
        companies_params(&filters, range, limit)
    }

    async fn fetch_rows<T, Sel>(&self, path: &str, params: QueryParams, select: Sel, fallback: &str)
    where
        T: DeserializeOwned,
        Sel: Fn(&mut CompaniesState) -> &mut Slot<Vec<T>>,
    {
        track(&self.state, select, fallback, get_list(&*self.http, path, &params)).await;
    }

    //=====================================================================================
    // Slot fetches
    //=====================================================================================

    pub async fn fetch_kpis(&self) {
        let params = self.params(None);
        track(
            &self.state,
            |s| &mut s.kpis,
            "Failed to fetch KPIs",
            get_json(&*self.http, endpoints::COMPANIES_KPIS, &params),
        )
        .await;
    }

    pub async fn fetch_top_companies(&self) {
        self.fetch_rows(
            endpoints::TOP_COMPANIES,
            self.params(Some(20)),
            |s| &mut s.top_companies,
            "Failed to fetch top companies",
        )
        .await
    }

    pub async fn fetch_seniority_distribution(&self) {
        self.fetch_rows(
            endpoints::COMPANIES_SENIORITY,
            self.params(Some(10)),
            |s| &mut s.seniority_distribution,
            "Failed to fetch seniority distribution",
        )
        .await
    }

    pub async fn fetch_employment_type_distribution(&self) {
        self.fetch_rows(
            endpoints::EMPLOYMENT_TYPE_DISTRIBUTION,
            self.params(None),
            |s| &mut s.employment_type_distribution,
            "Failed to fetch employment type distribution",
        )
        .await
    }

    pub async fn fetch_remote_percentage(&self) {
        self.fetch_rows(
            endpoints::COMPANIES_REMOTE_PERCENTAGE,
            self.params(Some(20)),
            |s| &mut s.remote_percentage,
            "Failed to fetch remote percentage",
        )
        .await
    }

    pub async fn fetch_jobs_timeline(&self) {
        self.fetch_rows(
            endpoints::COMPANIES_JOBS_TIMELINE,
            self.params(Some(5)),
            |s| &mut s.jobs_timeline,
            "Failed to fetch jobs timeline",
        )
        .await
    }

    /// Top ten companies with up to `skills_limit` skills each, capped at 50.
    pub async fn fetch_top_skills(&self, skills_limit: u64) {
        let mut params = self.params(Some(10));
        params.number("skills_limit", skills_limit.min(MAX_SKILLS_LIMIT));
        self.fetch_rows(
            endpoints::COMPANIES_TOP_SKILLS,
            params,
            |s| &mut s.top_skills,
            "Failed to fetch top skills",
        )
        .await
    }

    pub async fn refresh_all(&self) {
        self.clear_errors();
        join!(
            self.fetch_kpis(),
            self.fetch_top_companies(),
            self.fetch_seniority_distribution(),
            self.fetch_employment_type_distribution(),
            self.fetch_remote_percentage(),
            self.fetch_jobs_timeline(),
            self.fetch_top_skills(MAX_SKILLS_LIMIT),
        );
        let mut state = lock(&self.state);
        let failed: Vec<&str> = state
            .errors_mut()
            .into_iter()
            .filter(|(error, _)| error.is_some())
            .map(|(_, name)| name)
            .collect();
        if failed.is_empty() {
            info!("Companies dashboard refreshed");
        } else {
            warn!(?failed, "Companies dashboard refreshed with failures");
        }
    }

    //=====================================================================================
    // Option lists
    //=====================================================================================

    /// Failures only log; the previous list stays.
    pub async fn fetch_available_companies(&self) {
        let params = position_params(self.filters.get().search_position_query.as_deref());
        match get_list(&*self.http, endpoints::AVAILABLE_COMPANIES, &params).await {
            Ok(companies) => lock(&self.state).available_companies = companies,
            Err(e) => warn!("Failed to fetch available companies: {}", e),
        }
    }

    pub async fn fetch_available_seniority_levels(&self) {
        let params = position_params(self.filters.get().search_position_query.as_deref());
        match get_list(&*self.http, endpoints::AVAILABLE_SENIORITY_LEVELS, &params).await {
            Ok(levels) => lock(&self.state).available_seniority_levels = levels,
            Err(e) => warn!("Failed to fetch available seniority levels: {}", e),
        }
    }

    pub async fn fetch_available_positions(&self) -> Vec<String> {
        let positions =
            match get_list(&*self.http, endpoints::AVAILABLE_POSITIONS, &QueryParams::new()).await
            {
                Ok(positions) => positions,
                Err(e) => {
                    warn!("Failed to fetch available positions: {}", e);
                    Vec::new()
                }
            };
        lock(&self.state).available_positions = positions.clone();
        positions
    }

    pub async fn initialize_filters(&self) {
        join!(
            self.fetch_available_companies(),
            self.fetch_available_seniority_levels(),
            self.fetch_available_positions(),
        );
    }
}

impl FilteredStore for CompaniesStore {
    type Filters = CompaniesFilters;

    fn filter_cell(&self) -> &FilterCell<CompaniesFilters> {
        &self.filters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::PortError;
    use crate::stores::testing::{ports, MockHttp};
    use serde_json::json;

    fn healthy() -> Arc<MockHttp> {
        let http = MockHttp::new();
        http.ok(
            endpoints::COMPANIES_KPIS,
            json!({"total_jobs": "120", "remote_percentage": 37.5, "avg_skills_per_job": null, "distinct_companies": 14}),
        );
        http.ok(endpoints::TOP_COMPANIES, json!([{"employer_name": "Acme", "job_count": 9}]));
        http.ok(
            endpoints::COMPANIES_SENIORITY,
            json!([{"employer_name": "Acme", "seniority": "Senior", "job_count": 4}]),
        );
        http.ok(
            endpoints::EMPLOYMENT_TYPE_DISTRIBUTION,
            json!([{"employment_type": "FULLTIME", "job_count": 8}]),
        );
        http.ok(
            endpoints::COMPANIES_REMOTE_PERCENTAGE,
            json!([{"employer_name": "Acme", "remote_percentage": 50}]),
        );
        http.ok(endpoints::COMPANIES_JOBS_TIMELINE, json!([]));
        http.ok(
            endpoints::COMPANIES_TOP_SKILLS,
            json!([{"employer_name": "Acme", "skill": "SQL", "count": 3}]),
        );
        http
    }

    #[tokio::test]
    async fn refresh_fills_every_slot() {
        let http = healthy();
        let (_, ports) = ports(&http);
        let store = CompaniesStore::new(&ports);
        store.refresh_all().await;

        let mut state = store.snapshot();
        assert!(state.errors_mut().iter().all(|(error, _)| error.is_none()));
        assert_eq!(state.kpis.data.total_jobs, 120);
        assert_eq!(state.kpis.data.avg_skills_per_job, 0.0);
        assert_eq!(state.top_companies.data.len(), 1);
        assert_eq!(state.top_skills.data.len(), 1);
        assert!(state.jobs_timeline.data.is_empty());

        let top = http.last_call(endpoints::TOP_COMPANIES).unwrap();
        assert_eq!(top.params.text_of("limit").as_deref(), Some("20"));
        assert_eq!(top.params.text_of("job_posted_at_date_from").as_deref(), Some("2025-02-13"));
        assert_eq!(top.params.text_of("job_posted_at_date_to").as_deref(), Some("2025-03-15"));
        let timeline = http.last_call(endpoints::COMPANIES_JOBS_TIMELINE).unwrap();
        assert_eq!(timeline.params.text_of("limit").as_deref(), Some("5"));
        let kpis = http.last_call(endpoints::COMPANIES_KPIS).unwrap();
        assert!(!kpis.params.contains("limit"));
        let skills = http.last_call(endpoints::COMPANIES_TOP_SKILLS).unwrap();
        assert_eq!(skills.params.text_of("skills_limit").as_deref(), Some("50"));
    }

    #[tokio::test]
    async fn boom_only_touches_its_own_slot() {
        let http = healthy();
        http.fail_with_detail(endpoints::COMPANIES_SENIORITY, "boom");
        let (_, ports) = ports(&http);
        let store = CompaniesStore::new(&ports);
        store.refresh_all().await;

        let state = store.snapshot();
        assert_eq!(state.seniority_distribution.error.as_deref(), Some("boom"));
        assert!(!state.seniority_distribution.loading);
        assert_eq!(state.kpis.error, None);
        assert_eq!(state.top_companies.error, None);
        assert_eq!(state.top_companies.data.len(), 1);
    }

    #[tokio::test]
    async fn fallback_message_without_detail() {
        let http = healthy();
        http.fail(endpoints::COMPANIES_KPIS, PortError::network("offline"));
        let (_, ports) = ports(&http);
        let store = CompaniesStore::new(&ports);
        store.fetch_kpis().await;
        assert_eq!(store.snapshot().kpis.error.as_deref(), Some("Failed to fetch KPIs"));
    }

    #[tokio::test]
    async fn all_sentinel_is_not_sent() {
        let http = healthy();
        let (_, ports) = ports(&http);
        let store = CompaniesStore::new(&ports);
        store
            .set_filters(json!({
                "employer_name": "all",
                "seniority": "Senior",
                "dateFrom": "2025-01-01",
                "dateTo": "2025-01-31"
            }))
            .unwrap();
        store.fetch_top_skills(500).await;

        let call = http.last_call(endpoints::COMPANIES_TOP_SKILLS).unwrap();
        assert!(!call.params.contains("employer_name"));
        assert_eq!(call.params.text_of("seniority").as_deref(), Some("Senior"));
        assert_eq!(call.params.text_of("job_posted_at_date_from").as_deref(), Some("2025-01-01"));
        assert_eq!(call.params.text_of("skills_limit").as_deref(), Some("50"));
    }

    #[tokio::test]
    async fn option_failures_keep_previous_lists() {
        let http = MockHttp::new();
        http.ok(endpoints::AVAILABLE_SENIORITY_LEVELS, json!(["Junior", "Senior"]));
        let (_, ports) = ports(&http);
        let store = CompaniesStore::new(&ports);
        lock(&store.state).available_companies = vec!["Acme".into()];

        store.initialize_filters().await;

        let state = store.snapshot();
        assert_eq!(state.available_companies, vec!["Acme"]);
        assert_eq!(state.available_seniority_levels, vec!["Junior", "Senior"]);
        assert!(state.available_positions.is_empty());
        let call = http.last_call(endpoints::AVAILABLE_SENIORITY_LEVELS).unwrap();
        assert_eq!(
            call.params.text_of("search_position_query").as_deref(),
            Some("Data Engineer")
        );
    }
}
