//! crates/jobs_dashboard_core/src/stores/dashboard.rs
//!
//! The market overview: jobs in the selected window, compared with the window before.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

use super::{
    filtered_locations, get_list, lock, option_list, track, FilterCell, FilteredStore, Slot,
    StorePorts,
};
use crate::aggregate::{self, DailyCount};
use crate::domain::{JobRow, Location};
use crate::endpoints;
use crate::filters::DashboardFilters;
use crate::period::DateRange;
use crate::ports::{HttpClient, PortError};
use crate::query::{dashboard_jobs_params, QueryParams};

/// Without filter dates the overview covers today and the 29 days before it.
const FALLBACK_WINDOW_DAYS: u64 = 29;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DashboardView {
    #[default]
    Table,
    Chart,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DashboardJobs {
    pub jobs: Vec<JobRow>,
    pub current_count: usize,
    /// Zero when no comparison window was fetched.
    pub previous_count: usize,
}

#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    pub overview: Slot<DashboardJobs>,
    pub daily_trends: Vec<DailyCount>,
    pub locations: Vec<Location>,
    pub available_positions: Vec<String>,
    pub selected_view: DashboardView,
}

pub struct DashboardStore {
    http: Arc<dyn HttpClient>,
    filters: FilterCell<DashboardFilters>,
    state: Mutex<DashboardState>,
}

impl DashboardStore {
    pub fn new(ports: &StorePorts) -> Self {
        Self {
            http: ports.http.clone(),
            filters: FilterCell::new(ports.storage.clone(), ports.clock.clone()),
            state: Mutex::new(DashboardState::default()),
        }
    }

    pub fn snapshot(&self) -> DashboardState {
        lock(&self.state).clone()
    }

    pub fn total_jobs(&self) -> usize {
        lock(&self.state).overview.data.jobs.len()
    }

    pub fn active_companies(&self) -> usize {
        aggregate::active_companies(&lock(&self.state).overview.data.jobs)
    }

    pub fn set_selected_view(&self, view: DashboardView) {
        lock(&self.state).selected_view = view;
    }

    /// With both dates set, the current and previous windows are fetched together;
    /// otherwise only the trailing window is.
    pub async fn fetch_dashboard_data(&self) {
        let http = &*self.http;
        let filters = self.filters.get();
        let today = self.filters.today();
        let fetch = async {
            match filters.window.range() {
                Some(range) => {
                    let current = dashboard_jobs_params(&filters, range);
                    let previous = dashboard_jobs_params(&filters, range.previous());
                    let (jobs, previous_jobs) = futures::try_join!(
                        get_list::<JobRow>(http, endpoints::DASHBOARD_JOBS, &current),
                        get_list::<JobRow>(http, endpoints::DASHBOARD_JOBS, &previous),
                    )?;
                    Ok::<_, PortError>(DashboardJobs {
                        current_count: jobs.len(),
                        previous_count: previous_jobs.len(),
                        jobs,
                    })
                }
                None => {
                    let range = DateRange::trailing(today, FALLBACK_WINDOW_DAYS);
                    let params = dashboard_jobs_params(&filters, range);
                    let jobs = get_list::<JobRow>(http, endpoints::DASHBOARD_JOBS, &params).await?;
                    Ok(DashboardJobs {
                        current_count: jobs.len(),
                        previous_count: 0,
                        jobs,
                    })
                }
            }
        };

        let fetched = track(
            &self.state,
            |s| &mut s.overview,
            "Failed to fetch dashboard data",
            fetch,
        )
        .await;
        if fetched {
            let mut state = lock(&self.state);
            state.daily_trends = aggregate::daily_counts(&state.overview.data.jobs);
            state.locations = aggregate::unique_locations(&state.overview.data.jobs);
        }
    }

    pub async fn refresh_data(&self) {
        self.fetch_dashboard_data().await
    }

    pub async fn fetch_available_positions(&self) -> Vec<String> {
        let positions = option_list(
            &*self.http,
            endpoints::AVAILABLE_POSITIONS,
            &QueryParams::new(),
            Vec::new,
        )
        .await;
        lock(&self.state).available_positions = positions.clone();
        positions
    }

    /// Replaces the derived locations with the backend's list, when it answers.
    pub async fn fetch_filtered_locations(&self) -> Vec<Location> {
        let filters = self.filters.get();
        let locations = filtered_locations(
            &*self.http,
            filters.search_position_query.as_deref(),
            &filters.window,
        )
        .await;
        if !locations.is_empty() {
            lock(&self.state).locations = locations.clone();
        }
        locations
    }
}

impl FilteredStore for DashboardStore {
    type Filters = DashboardFilters;

    fn filter_cell(&self) -> &FilterCell<DashboardFilters> {
        &self.filters
    }
}
