//! crates/jobs_dashboard_core/src/stores/reports.rs
//!
//! The export screen: a multi-select filter, a short preview, a record count and the
//! CSV download. The public scope talks to `/api/public/...` and cannot export.

use futures::join;
use regex::Regex;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use super::{
    get_list, lock, option_list, track, FilterCell, FilteredStore, Slot, StoreError, StorePorts,
};
use crate::domain::{CsvExport, ExportCount, JobRow, Location};
use crate::endpoints;
use crate::filters::ReportFilters;
use crate::ports::{DownloadSink, HttpClient, PortError};
use crate::query::{position_params, preview_params, report_body, QueryParams};

pub const DEFAULT_MAX_RECORDS: u64 = 50_000;
const DEFAULT_FILENAME: &str = "jobs_export.csv";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportScope {
    #[default]
    Private,
    Public,
}

impl ReportScope {
    fn preview_path(self) -> &'static str {
        match self {
            ReportScope::Private => endpoints::PREVIEW_EXPORT,
            ReportScope::Public => endpoints::PUBLIC_PREVIEW_EXPORT,
        }
    }

    fn count_path(self) -> &'static str {
        match self {
            ReportScope::Private => endpoints::COUNT_EXPORT_RECORDS,
            ReportScope::Public => endpoints::PUBLIC_COUNT_EXPORT_RECORDS,
        }
    }

    fn positions_path(self) -> &'static str {
        match self {
            ReportScope::Private => endpoints::AVAILABLE_POSITIONS,
            ReportScope::Public => endpoints::PUBLIC_AVAILABLE_POSITIONS,
        }
    }

    fn preview_limit(self) -> u64 {
        match self {
            ReportScope::Private => 10,
            ReportScope::Public => 15,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    pub positions: Vec<String>,
    pub companies: Vec<String>,
    pub publishers: Vec<String>,
    pub seniority_levels: Vec<String>,
    pub skills: Vec<String>,
    pub employment_types: Vec<String>,
    pub locations: Vec<Location>,
}

#[derive(Debug, Clone, Default)]
pub struct ReportsState {
    pub preview: Slot<Vec<JobRow>>,
    pub record_count: Option<ExportCount>,
    pub options: ReportOptions,
}

pub struct ReportsStore {
    scope: ReportScope,
    http: Arc<dyn HttpClient>,
    downloads: Arc<dyn DownloadSink>,
    filters: FilterCell<ReportFilters>,
    state: Mutex<ReportsState>,
}

impl ReportsStore {
    pub fn new(ports: &StorePorts, scope: ReportScope, downloads: Arc<dyn DownloadSink>) -> Self {
        Self {
            scope,
            http: ports.http.clone(),
            downloads,
            filters: FilterCell::new(ports.storage.clone(), ports.clock.clone()),
            state: Mutex::new(ReportsState::default()),
        }
    }

    pub fn scope(&self) -> ReportScope {
        self.scope
    }

    pub fn snapshot(&self) -> ReportsState {
        lock(&self.state).clone()
    }

    pub async fn preview(&self) {
        let params = preview_params(&self.filters.get(), self.scope.preview_limit());
        track(
            &self.state,
            |s| &mut s.preview,
            "Failed to preview export",
            get_list(&*self.http, self.scope.preview_path(), &params),
        )
        .await;
    }

    pub async fn count_export_records(&self, max_records: u64) -> Result<ExportCount, StoreError> {
        let body = report_body(&self.filters.get(), max_records);
        let count: ExportCount = self
            .http
            .post(self.scope.count_path(), &body)
            .await
            .and_then(|response| response.json())
            .map_err(|e| request_error(e, "Failed to count records"))?;
        lock(&self.state).record_count = Some(count.clone());
        Ok(count)
    }

    /// Posts the filters and hands the CSV body to the download sink under the name the
    /// backend suggests.
    pub async fn export_csv(&self, max_records: u64) -> Result<CsvExport, StoreError> {
        if self.scope == ReportScope::Public {
            return Err(StoreError::Request(
                "CSV export requires an authenticated session".to_string(),
            ));
        }
        let body = report_body(&self.filters.get(), max_records);
        let response = self
            .http
            .post(endpoints::EXPORT_CSV, &body)
            .await
            .map_err(|e| request_error(e, "Failed to export CSV"))?;

        let filename = response
            .header("content-disposition")
            .and_then(filename_from_disposition)
            .unwrap_or_else(|| DEFAULT_FILENAME.to_string());
        self.downloads
            .save(&filename, &response.body)
            .map_err(|e| request_error(e, "Failed to export CSV"))?;

        info!(filename = %filename, bytes = response.body.len(), "CSV export saved");
        Ok(CsvExport {
            filename,
            bytes: response.body.len(),
        })
    }

    //=====================================================================================
    // Option lists
    //=====================================================================================

    /// Every list the filter bar offers. Each one falls back to empty on its own; the
    /// public scope only knows positions.
    pub async fn fetch_available_options(&self) {
        let http = &*self.http;
        let positions_path = self.scope.positions_path();
        let unfiltered = QueryParams::new();
        if self.scope == ReportScope::Public {
            let positions = option_list(http, positions_path, &unfiltered, Vec::new).await;
            lock(&self.state).options.positions = positions;
            return;
        }

        let filters = self.filters.get();
        let by_position = position_params(filters.selected_position.as_deref());
        let (positions, companies, publishers, seniority_levels, skills, employment_types, locations) = join!(
            option_list(http, positions_path, &unfiltered, Vec::new),
            option_list(http, endpoints::AVAILABLE_COMPANIES, &by_position, Vec::new),
            option_list(http, endpoints::AVAILABLE_PUBLISHERS, &by_position, Vec::new),
            option_list(http, endpoints::AVAILABLE_SENIORITY_LEVELS, &by_position, Vec::new),
            option_list(http, endpoints::AVAILABLE_SKILLS, &by_position, Vec::new),
            option_list(http, endpoints::AVAILABLE_EMPLOYMENT_TYPES, &unfiltered, Vec::new),
            self.fetch_locations(&by_position),
        );
        lock(&self.state).options = ReportOptions {
            positions,
            companies,
            publishers,
            seniority_levels,
            skills,
            employment_types,
            locations,
        };
    }

    async fn fetch_locations(&self, params: &QueryParams) -> Vec<Location> {
        match get_list(&*self.http, endpoints::LOCATIONS, params).await {
            Ok(locations) => locations,
            Err(e) => {
                warn!("Failed to fetch locations: {}", e);
                Vec::new()
            }
        }
    }
}

impl FilteredStore for ReportsStore {
    type Filters = ReportFilters;

    fn filter_cell(&self) -> &FilterCell<ReportFilters> {
        &self.filters
    }
}

fn request_error(error: PortError, fallback: &str) -> StoreError {
    warn!("{}: {}", fallback, error);
    StoreError::Request(error.user_message(fallback))
}

/// `attachment; filename="jobs.csv"` -> `jobs.csv`.
fn filename_from_disposition(header: &str) -> Option<String> {
    let re = Regex::new(r#"filename="(.+)""#).ok()?;
    re.captures(header).map(|caps| caps[1].to_string())
}
