//! crates/jobs_dashboard_core/src/stores/empresas.rs
//!
//! The company explorer: up to a thousand matching jobs, aggregated per employer.

use std::sync::{Arc, Mutex};

use super::{
    filtered_locations, get_list, lock, option_list, track, FilterCell, FilteredStore,
    SelectionCell, Slot, StorePorts,
};
use crate::aggregate::{self, EntityOverview};
use crate::domain::{CompanyCount, JobRow, Location};
use crate::endpoints;
use crate::filters::{owned_list, EmpresasFilters, DEFAULT_SENIORITIES};
use crate::ports::HttpClient;
use crate::query::{position_params, preview_params, QueryParams};

const PREVIEW_LIMIT: u64 = 1000;

#[derive(Debug, Clone, Default)]
pub struct EmpresasState {
    pub jobs: Slot<Vec<JobRow>>,
    pub available_positions: Vec<String>,
    pub available_companies: Vec<String>,
    pub available_seniorities: Vec<String>,
    pub locations: Vec<Location>,
}

pub struct EmpresasStore {
    http: Arc<dyn HttpClient>,
    filters: FilterCell<EmpresasFilters>,
    selected: SelectionCell<CompanyCount>,
    state: Mutex<EmpresasState>,
}

impl EmpresasStore {
    pub fn new(ports: &StorePorts) -> Self {
        let filters = FilterCell::new(ports.storage.clone(), ports.clock.clone());
        let selected = SelectionCell::new(filters.persistence().clone());
        Self {
            http: ports.http.clone(),
            filters,
            selected,
            state: Mutex::new(EmpresasState::default()),
        }
    }

    pub fn snapshot(&self) -> EmpresasState {
        lock(&self.state).clone()
    }

    pub async fn fetch_jobs(&self) {
        let params = preview_params(&self.filters.get().to_report_filters(), PREVIEW_LIMIT);
        let fetched = track(
            &self.state,
            |s| &mut s.jobs,
            "Erro ao carregar empresas",
            get_list(&*self.http, endpoints::PREVIEW_EXPORT, &params),
        )
        .await;
        if fetched {
            self.derive_companies_if_missing();
        } else {
            lock(&self.state).jobs.data.clear();
        }
    }

    pub async fn refresh_data(&self) {
        self.fetch_jobs().await
    }

    /// Positions only; companies and seniorities are fetched per position.
    pub async fn fetch_available_options(&self) {
        let positions = option_list(
            &*self.http,
            endpoints::AVAILABLE_POSITIONS,
            &QueryParams::new(),
            Vec::new,
        )
        .await;
        let mut state = lock(&self.state);
        state.available_positions = positions;
        state.available_companies.clear();
        state.available_seniorities = owned_list(&DEFAULT_SENIORITIES);
    }

    /// On failure the list is derived from the loaded rows.
    pub async fn fetch_available_companies_for_position(&self, position: Option<&str>) {
        let params = position_params(position);
        match get_list::<String>(&*self.http, endpoints::AVAILABLE_COMPANIES, &params).await {
            Ok(companies) => lock(&self.state).available_companies = companies,
            Err(e) => {
                tracing::warn!("Failed to fetch companies for position, deriving from rows: {}", e);
                self.derive_companies_if_missing();
            }
        }
    }

    pub async fn fetch_available_seniority_for_position(&self, position: Option<&str>) {
        let seniorities = option_list(
            &*self.http,
            endpoints::AVAILABLE_SENIORITY_LEVELS,
            &position_params(position),
            || owned_list(&DEFAULT_SENIORITIES),
        )
        .await;
        lock(&self.state).available_seniorities = seniorities;
    }

    pub async fn fetch_filtered_locations(&self) -> Vec<Location> {
        let filters = self.filters.get();
        let locations = filtered_locations(
            &*self.http,
            filters.search_position_query.as_deref(),
            &filters.window,
        )
        .await;
        lock(&self.state).locations = locations.clone();
        locations
    }

    fn derive_companies_if_missing(&self) {
        let mut state = lock(&self.state);
        if state.available_companies.is_empty() && !state.jobs.data.is_empty() {
            state.available_companies = aggregate::distinct_companies(&state.jobs.data);
        }
    }

    //=====================================================================================
    // Derived views
    //=====================================================================================

    pub fn aggregated_companies(&self) -> Vec<CompanyCount> {
        aggregate::count_companies(&lock(&self.state).jobs.data)
    }

    pub fn jobs_for_company(&self, employer_name: &str) -> Vec<JobRow> {
        let state = lock(&self.state);
        aggregate::jobs_for_company(&state.jobs.data, employer_name)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn overview(&self) -> EntityOverview {
        aggregate::entity_overview(&lock(&self.state).jobs.data)
    }

    pub fn selected_company(&self) -> Option<CompanyCount> {
        self.selected.get()
    }

    pub fn set_selected_company(&self, company: Option<CompanyCount>) {
        self.selected.set(company)
    }
}

impl FilteredStore for EmpresasStore {
    type Filters = EmpresasFilters;

    fn filter_cell(&self) -> &FilterCell<EmpresasFilters> {
        &self.filters
    }

    fn load_selection(&self) {
        self.selected.load()
    }

    fn reset_session_state(&self) {
        self.filters.reset();
        self.selected.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::testing::{ports, MockHttp};
    use serde_json::json;

    fn jobs() -> serde_json::Value {
        json!([
            {"job_id": "1", "employer_name": "Beta"},
            {"job_id": "2", "employer_name": "Acme"},
            {"job_id": "3", "employer_name": "Acme"},
            {"job_id": "4", "employer_name": ""}
        ])
    }

    #[tokio::test]
    async fn companies_are_aggregated_and_derived() {
        let http = MockHttp::new();
        http.ok(endpoints::PREVIEW_EXPORT, jobs());
        let (_, ports) = ports(&http);
        let store = EmpresasStore::new(&ports);
        store
            .set_filters(json!({"employer_name": "Acme", "job_is_remote": true}))
            .unwrap();

        store.fetch_jobs().await;

        let call = http.last_call(endpoints::PREVIEW_EXPORT).unwrap();
        assert_eq!(call.params.text_of("limit").as_deref(), Some("1000"));
        assert_eq!(call.params.text_of("employer_names").as_deref(), Some("Acme"));
        assert_eq!(call.params.text_of("job_is_remote").as_deref(), Some("true"));

        assert_eq!(store.snapshot().available_companies, vec!["Acme", "Beta"]);
        let ranked = store.aggregated_companies();
        assert_eq!(ranked[0], CompanyCount { employer_name: "Acme".into(), job_count: 2 });
        assert_eq!(store.jobs_for_company("Acme").len(), 2);
        assert_eq!(store.overview().companies, 2);
    }

    #[tokio::test]
    async fn company_list_falls_back_to_rows() {
        let http = MockHttp::new();
        http.ok(endpoints::PREVIEW_EXPORT, jobs());
        http.fail_with_detail(endpoints::AVAILABLE_COMPANIES, "down");
        let (_, ports) = ports(&http);
        let store = EmpresasStore::new(&ports);
        store.fetch_jobs().await;
        lock(&store.state).available_companies.clear();

        store
            .fetch_available_companies_for_position(Some("Data Engineer"))
            .await;

        let call = http.last_call(endpoints::AVAILABLE_COMPANIES).unwrap();
        assert_eq!(
            call.params.text_of("search_position_query").as_deref(),
            Some("Data Engineer")
        );
        assert_eq!(store.snapshot().available_companies, vec!["Acme", "Beta"]);
        assert_eq!(store.snapshot().jobs.error, None);
    }

    #[tokio::test]
    async fn seniorities_default_when_unavailable() {
        let http = MockHttp::new();
        let (_, ports) = ports(&http);
        let store = EmpresasStore::new(&ports);
        store.fetch_available_seniority_for_position(None).await;
        assert_eq!(store.snapshot().available_seniorities, owned_list(&DEFAULT_SENIORITIES));

        store.fetch_available_options().await;
        let state = store.snapshot();
        assert!(state.available_positions.is_empty());
        assert!(state.available_companies.is_empty());
    }

    #[tokio::test]
    async fn failure_sets_fallback_and_empties_rows() {
        let http = MockHttp::new();
        http.fail(endpoints::PREVIEW_EXPORT, crate::ports::PortError::network("offline"));
        let (_, ports) = ports(&http);
        let store = EmpresasStore::new(&ports);
        store.fetch_jobs().await;
        let state = store.snapshot();
        assert_eq!(state.jobs.error.as_deref(), Some("Erro ao carregar empresas"));
        assert!(!state.jobs.loading);
        assert!(store.aggregated_companies().is_empty());
    }
}
