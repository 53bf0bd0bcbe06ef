//! crates/jobs_dashboard_core/src/stores/publishers.rs
//!
//! The publishers dashboard: seven independently fetched slots and the chart shapes
//! derived from them.

use futures::join;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use super::{get_json, get_list, lock, track, FilterCell, FilteredStore, Slot, StorePorts};
use crate::aggregate::{self, Matrix, Timeline};
use crate::domain::{
    PublisherCompanyRow, PublisherOptions, PublisherSeniorityRow, PublisherTimelineRow,
    PublishersKpis, TopPublisherRow,
};
use crate::endpoints;
use crate::filters::PublishersFilters;
use crate::ports::{HttpClient, PortError};
use crate::query::{position_params, publishers_params, PublisherLimits, QueryParams};

#[derive(Debug, Clone, Default)]
pub struct PublishersState {
    pub kpis: Slot<PublishersKpis>,
    pub top_publishers: Slot<Vec<TopPublisherRow>>,
    pub seniority_distribution: Slot<Vec<PublisherSeniorityRow>>,
    pub companies_matrix: Slot<Vec<PublisherCompanyRow>>,
    pub timeline: Slot<Vec<PublisherTimelineRow>>,
    /// Passed through to the chart untouched.
    pub direct_vs_indirect: Slot<Vec<Value>>,
    pub available_options: Slot<PublisherOptions>,
}

impl PublishersState {
    fn slots_mut(&mut self) -> [(&mut Option<String>, &'static str); 7] {
        [
            (&mut self.kpis.error, "kpis"),
            (&mut self.top_publishers.error, "top_publishers"),
            (&mut self.seniority_distribution.error, "seniority_distribution"),
            (&mut self.companies_matrix.error, "companies_matrix"),
            (&mut self.timeline.error, "timeline"),
            (&mut self.direct_vs_indirect.error, "direct_vs_indirect"),
            (&mut self.available_options.error, "available_options"),
        ]
    }
}

pub struct PublishersStore {
    http: Arc<dyn HttpClient>,
    filters: FilterCell<PublishersFilters>,
    state: Mutex<PublishersState>,
}

impl PublishersStore {
    pub fn new(ports: &StorePorts) -> Self {
        Self {
            http: ports.http.clone(),
            filters: FilterCell::new(ports.storage.clone(), ports.clock.clone()),
            state: Mutex::new(PublishersState::default()),
        }
    }

    pub fn snapshot(&self) -> PublishersState {
        lock(&self.state).clone()
    }

    pub fn clear_errors(&self) {
        let mut state = lock(&self.state);
        for (error, _) in state.slots_mut() {
            *error = None;
        }
    }

    fn params(&self, limits: PublisherLimits) -> QueryParams {
        publishers_params(&self.filters.get(), limits)
    }

    //=====================================================================================
    // Slot fetches
    //=====================================================================================

    pub async fn fetch_kpis(&self) {
        let params = self.params(PublisherLimits::None);
        track(
            &self.state,
            |s| &mut s.kpis,
            "Failed to fetch publishers KPIs",
            get_json(&*self.http, endpoints::PUBLISHERS_KPIS, &params),
        )
        .await;
    }

    pub async fn fetch_top_publishers(&self) {
        let params = self.params(PublisherLimits::Limit);
        track(
            &self.state,
            |s| &mut s.top_publishers,
            "Failed to fetch top publishers",
            get_list(&*self.http, endpoints::TOP_PUBLISHERS, &params),
        )
        .await;
    }

    pub async fn fetch_seniority_distribution(&self) {
        let params = self.params(PublisherLimits::Limit);
        track(
            &self.state,
            |s| &mut s.seniority_distribution,
            "Failed to fetch seniority distribution",
            get_list(&*self.http, endpoints::PUBLISHERS_SENIORITY, &params),
        )
        .await;
    }

    pub async fn fetch_companies_matrix(&self) {
        let params = self.params(PublisherLimits::Matrix);
        track(
            &self.state,
            |s| &mut s.companies_matrix,
            "Failed to fetch companies matrix",
            get_list(&*self.http, endpoints::PUBLISHERS_COMPANIES_MATRIX, &params),
        )
        .await;
    }

    pub async fn fetch_timeline(&self) {
        let params = self.params(PublisherLimits::Limit);
        track(
            &self.state,
            |s| &mut s.timeline,
            "Failed to fetch timeline",
            get_list(&*self.http, endpoints::PUBLISHERS_TIMELINE, &params),
        )
        .await;
    }

    pub async fn fetch_direct_vs_indirect(&self) {
        let params = self.params(PublisherLimits::None);
        track(
            &self.state,
            |s| &mut s.direct_vs_indirect,
            "Failed to fetch direct vs indirect distribution",
            get_list(&*self.http, endpoints::DIRECT_VS_INDIRECT, &params),
        )
        .await;
    }

    /// The four filter lists, fetched together. Any failure fails the whole slot and
    /// keeps the previous lists.
    pub async fn fetch_available_options(&self) {
        let http = &*self.http;
        let filters = self.filters.get();
        let by_position = position_params(filters.search_position_query.as_deref());
        let unfiltered = QueryParams::new();
        let fetch = async {
            let (publishers, seniority_levels, companies, positions) = futures::try_join!(
                get_list(http, endpoints::AVAILABLE_PUBLISHERS, &by_position),
                get_list(http, endpoints::AVAILABLE_SENIORITY_LEVELS, &by_position),
                get_list(http, endpoints::AVAILABLE_COMPANIES, &by_position),
                get_list(http, endpoints::AVAILABLE_POSITIONS, &unfiltered),
            )?;
            Ok::<_, PortError>(PublisherOptions {
                publishers,
                seniority_levels,
                companies,
                positions,
            })
        };
        track(
            &self.state,
            |s| &mut s.available_options,
            "Failed to fetch available options",
            fetch,
        )
        .await;
    }

    /// Positions alone, outside any slot.
    pub async fn fetch_available_positions(&self) -> Vec<String> {
        match get_list::<String>(&*self.http, endpoints::AVAILABLE_POSITIONS, &QueryParams::new())
            .await
        {
            Ok(positions) => {
                lock(&self.state).available_options.data.positions = positions.clone();
                positions
            }
            Err(e) => {
                warn!("Failed to fetch available positions: {}", e);
                Vec::new()
            }
        }
    }

    /// Option lists first, then every chart slot concurrently.
    pub async fn fetch_all_data(&self) {
        self.fetch_available_options().await;
        join!(
            self.fetch_kpis(),
            self.fetch_top_publishers(),
            self.fetch_seniority_distribution(),
            self.fetch_companies_matrix(),
            self.fetch_timeline(),
            self.fetch_direct_vs_indirect(),
        );
        let mut state = lock(&self.state);
        let failed: Vec<&str> = state
            .slots_mut()
            .into_iter()
            .filter(|(error, _)| error.is_some())
            .map(|(_, name)| name)
            .collect();
        if failed.is_empty() {
            info!("Publishers dashboard refreshed");
        } else {
            warn!(?failed, "Publishers dashboard refreshed with failures");
        }
    }

    //=====================================================================================
    // Chart shapes
    //=====================================================================================

    /// Publisher × seniority job counts.
    pub fn seniority_chart(&self) -> Matrix {
        let state = lock(&self.state);
        aggregate::pivot(
            &state.seniority_distribution.data,
            |row| row.publisher.as_str(),
            |row| row.seniority.as_str(),
            |row| row.job_count,
        )
    }

    /// Publisher × employer job counts, ready for a heatmap via `Matrix::cells`.
    pub fn companies_matrix_chart(&self) -> Matrix {
        let state = lock(&self.state);
        aggregate::pivot(
            &state.companies_matrix.data,
            |row| row.publisher.as_str(),
            |row| row.employer_name.as_str(),
            |row| row.job_count,
        )
    }

    /// Cumulative postings per publisher.
    pub fn timeline_chart(&self) -> Timeline {
        let state = lock(&self.state);
        aggregate::cumulative_series(
            &state.timeline.data,
            |row| row.publisher.as_str(),
            |row| row.job_posted_at_date,
            |row| row.job_count,
        )
    }
}

impl FilteredStore for PublishersStore {
    type Filters = PublishersFilters;

    fn filter_cell(&self) -> &FilterCell<PublishersFilters> {
        &self.filters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::Period;
    use crate::stores::testing::{ports, MockHttp};
    use serde_json::json;

    fn healthy() -> Arc<MockHttp> {
        let http = MockHttp::new();
        http.ok(
            endpoints::PUBLISHERS_KPIS,
            json!({"total_publishers": 4, "avg_publishers_per_job": 1.5, "biggest_coverage_publisher": "LinkedIn", "biggest_coverage_count": 10, "direct_percentage": null}),
        );
        http.ok(
            endpoints::TOP_PUBLISHERS,
            json!([{"publisher": "LinkedIn", "publication_count": 10, "unique_jobs_count": 8}]),
        );
        http.ok(
            endpoints::PUBLISHERS_SENIORITY,
            json!([
                {"publisher": "LinkedIn", "seniority": "Senior", "job_count": 3},
                {"publisher": "Indeed", "seniority": "Junior", "job_count": 1}
            ]),
        );
        http.ok(
            endpoints::PUBLISHERS_COMPANIES_MATRIX,
            json!([{"publisher": "LinkedIn", "employer_name": "Acme", "job_count": 2}]),
        );
        http.ok(
            endpoints::PUBLISHERS_TIMELINE,
            json!([
                {"job_posted_at_date": "2025-03-02", "publisher": "LinkedIn", "job_count": 2},
                {"job_posted_at_date": "2025-03-01", "publisher": "LinkedIn", "job_count": 1},
                {"job_posted_at_date": "2025-03-02", "publisher": "Indeed", "job_count": 5}
            ]),
        );
        http.ok(endpoints::DIRECT_VS_INDIRECT, json!([{"type": "direct", "count": 3}]));
        http.ok(endpoints::AVAILABLE_PUBLISHERS, json!(["Indeed", "LinkedIn"]));
        http.ok(endpoints::AVAILABLE_SENIORITY_LEVELS, json!(["Junior", "Senior"]));
        http.ok(endpoints::AVAILABLE_COMPANIES, json!(["Acme"]));
        http.ok(endpoints::AVAILABLE_POSITIONS, json!(["Data Engineer"]));
        http
    }

    #[tokio::test]
    async fn fetch_all_fills_every_slot() {
        let http = healthy();
        let (_, ports) = ports(&http);
        let store = PublishersStore::new(&ports);
        store.initialize_with_defaults();
        store.fetch_all_data().await;

        let state = store.snapshot();
        assert_eq!(state.kpis.data.total_publishers, 4);
        assert_eq!(state.kpis.data.direct_percentage, 0.0);
        assert_eq!(state.top_publishers.data.len(), 1);
        assert_eq!(state.direct_vs_indirect.data.len(), 1);
        assert_eq!(state.available_options.data.companies, vec!["Acme"]);
        assert!(!state.kpis.loading && !state.available_options.loading);

        let top = http.last_call(endpoints::TOP_PUBLISHERS).unwrap();
        assert_eq!(top.params.text_of("limit").as_deref(), Some("20"));
        assert_eq!(top.params.text_of("job_posted_at_date_from").as_deref(), Some("2025-02-13"));
        let matrix = http.last_call(endpoints::PUBLISHERS_COMPANIES_MATRIX).unwrap();
        assert_eq!(matrix.params.text_of("limit_publishers").as_deref(), Some("15"));
        assert!(!matrix.params.contains("limit"));
        let kpis = http.last_call(endpoints::PUBLISHERS_KPIS).unwrap();
        assert!(!kpis.params.contains("limit"));
        let positions = http.last_call(endpoints::AVAILABLE_POSITIONS).unwrap();
        assert!(positions.params.is_empty());
    }

    #[tokio::test]
    async fn boom_only_touches_its_own_slot() {
        let http = healthy();
        http.fail_with_detail(endpoints::TOP_PUBLISHERS, "boom");
        let (_, ports) = ports(&http);
        let store = PublishersStore::new(&ports);
        store.fetch_all_data().await;

        let state = store.snapshot();
        assert_eq!(state.top_publishers.error.as_deref(), Some("boom"));
        assert!(!state.top_publishers.loading);
        assert_eq!(state.kpis.error, None);
        assert_eq!(state.timeline.error, None);
        assert_eq!(state.seniority_distribution.data.len(), 2);

        store.clear_errors();
        assert_eq!(store.snapshot().top_publishers.error, None);
    }

    #[tokio::test]
    async fn one_failing_option_list_fails_the_options_slot() {
        let http = healthy();
        http.fail(endpoints::AVAILABLE_COMPANIES, PortError::network("offline"));
        let (_, ports) = ports(&http);
        let store = PublishersStore::new(&ports);
        store.fetch_available_options().await;
        let options = store.snapshot().available_options;
        assert_eq!(options.error.as_deref(), Some("Failed to fetch available options"));
        assert!(options.data.publishers.is_empty());
        assert!(!options.loading);
    }

    #[tokio::test]
    async fn chart_shapes_follow_fetched_rows() {
        let http = healthy();
        let (_, ports) = ports(&http);
        let store = PublishersStore::new(&ports);
        store.fetch_all_data().await;

        let seniority = store.seniority_chart();
        assert_eq!(seniority.rows, vec!["LinkedIn", "Indeed"]);
        assert_eq!(seniority.columns, vec!["Senior", "Junior"]);
        assert_eq!(seniority.value("Indeed", "Senior"), Some(0));
        assert_eq!(seniority.value("LinkedIn", "Senior"), Some(3));

        assert_eq!(store.companies_matrix_chart().cells(), vec![(0, 0, 2)]);

        let timeline = store.timeline_chart();
        assert_eq!(timeline.dates.len(), 2);
        let linkedin = &timeline.series[0];
        assert_eq!(linkedin.name, "LinkedIn");
        assert_eq!(linkedin.data, vec![1, 3]);
        assert_eq!(timeline.series[1].data, vec![0, 5]);
    }

    #[tokio::test]
    async fn set_filters_tags_trailing_month() {
        let http = MockHttp::new();
        let (_, ports) = ports(&http);
        let store = PublishersStore::new(&ports);
        store
            .set_filters(json!({"dateFrom": "2025-02-13", "dateTo": "2025-03-15"}))
            .unwrap();
        assert_eq!(store.filters().window.period, Period::Last30Days);
        store
            .set_filters(json!({"dateFrom": "2025-01-01", "dateTo": "2025-01-31"}))
            .unwrap();
        assert_eq!(store.filters().window.period, Period::Custom);
    }

    #[tokio::test]
    async fn positions_fall_back_to_empty() {
        let http = MockHttp::new();
        let (_, ports) = ports(&http);
        let store = PublishersStore::new(&ports);
        assert!(store.fetch_available_positions().await.is_empty());
    }
}
