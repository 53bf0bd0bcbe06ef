//! crates/jobs_dashboard_core/src/stores/vagas.rs
//!
//! The job-listing explorer: a preview of matching rows and the selected job.

use std::sync::{Arc, Mutex};

use super::{
    filtered_locations, get_list, lock, option_list, track, FilterCell, FilteredStore,
    SelectionCell, Slot, StorePorts,
};
use crate::domain::{JobRow, Location};
use crate::endpoints;
use crate::filters::{
    owned_list, VagasFilters, DEFAULT_EMPLOYMENT_TYPES, DEFAULT_POSITIONS, DEFAULT_SENIORITIES,
};
use crate::ports::HttpClient;
use crate::query::{preview_params, QueryParams};

const PREVIEW_LIMIT: u64 = 50;

#[derive(Debug, Clone, Default)]
pub struct VagasState {
    pub jobs: Slot<Vec<JobRow>>,
    pub available_positions: Vec<String>,
    pub available_seniorities: Vec<String>,
    pub available_employment_types: Vec<String>,
    pub locations: Vec<Location>,
}

pub struct VagasStore {
    http: Arc<dyn HttpClient>,
    filters: FilterCell<VagasFilters>,
    selected: SelectionCell<JobRow>,
    state: Mutex<VagasState>,
}

impl VagasStore {
    pub fn new(ports: &StorePorts) -> Self {
        let filters = FilterCell::new(ports.storage.clone(), ports.clock.clone());
        let selected = SelectionCell::new(filters.persistence().clone());
        Self {
            http: ports.http.clone(),
            filters,
            selected,
            state: Mutex::new(VagasState::default()),
        }
    }

    pub fn snapshot(&self) -> VagasState {
        lock(&self.state).clone()
    }

    pub fn total_jobs(&self) -> usize {
        lock(&self.state).jobs.data.len()
    }

    /// Loads the first rows matching the filters. A failure also empties the list.
    pub async fn fetch_jobs(&self) {
        let params = preview_params(&self.filters.get().to_report_filters(), PREVIEW_LIMIT);
        let fetched = track(
            &self.state,
            |s| &mut s.jobs,
            "Erro ao carregar vagas",
            get_list(&*self.http, endpoints::PREVIEW_EXPORT, &params),
        )
        .await;
        if !fetched {
            lock(&self.state).jobs.data.clear();
        }
    }

    pub async fn refresh_data(&self) {
        self.fetch_jobs().await
    }

    pub async fn fetch_available_positions(&self) {
        let positions = option_list(
            &*self.http,
            endpoints::AVAILABLE_POSITIONS,
            &QueryParams::new(),
            || owned_list(&DEFAULT_POSITIONS),
        )
        .await;
        lock(&self.state).available_positions = positions;
    }

    pub async fn fetch_available_seniorities(&self) {
        let seniorities = option_list(
            &*self.http,
            endpoints::AVAILABLE_SENIORITY_LEVELS,
            &QueryParams::new(),
            || owned_list(&DEFAULT_SENIORITIES),
        )
        .await;
        lock(&self.state).available_seniorities = seniorities;
    }

    pub async fn fetch_available_employment_types(&self) {
        let types = option_list(
            &*self.http,
            endpoints::AVAILABLE_EMPLOYMENT_TYPES,
            &QueryParams::new(),
            || owned_list(&DEFAULT_EMPLOYMENT_TYPES),
        )
        .await;
        lock(&self.state).available_employment_types = types;
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

    pub fn selected_job(&self) -> Option<JobRow> {
        self.selected.get()
    }

    pub fn set_selected_job(&self, job: Option<JobRow>) {
        self.selected.set(job)
    }
}

impl FilteredStore for VagasStore {
    type Filters = VagasFilters;

    fn filter_cell(&self) -> &FilterCell<VagasFilters> {
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
