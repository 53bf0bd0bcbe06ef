//! crates/jobs_dashboard_core/src/stores/skills.rs
//!
//! The skills explorer: every job matching the filters, counted per extracted skill.

use std::sync::{Arc, Mutex};
use tracing::warn;

use super::{
    get_list, lock, option_list, track, FilterCell, FilteredStore, SelectionCell, Slot,
    StorePorts,
};
use crate::aggregate;
use crate::domain::{JobRow, SkillCount};
use crate::endpoints;
use crate::filters::{owned_list, SkillsFilters, DEFAULT_SENIORITIES};
use crate::ports::HttpClient;
use crate::query::{position_params, report_params, EndpointShape, QueryParams};

const JOBS_LIMIT: u64 = 10_000;

#[derive(Debug, Clone, Default)]
pub struct SkillsState {
    pub jobs: Slot<Vec<JobRow>>,
    pub available_positions: Vec<String>,
    pub available_skills: Vec<String>,
    pub available_seniorities: Vec<String>,
}

pub struct SkillsStore {
    http: Arc<dyn HttpClient>,
    filters: FilterCell<SkillsFilters>,
    selected: SelectionCell<SkillCount>,
    state: Mutex<SkillsState>,
}

impl SkillsStore {
    pub fn new(ports: &StorePorts) -> Self {
        let filters = FilterCell::new(ports.storage.clone(), ports.clock.clone());
        let selected = SelectionCell::new(filters.persistence().clone());
        Self {
            http: ports.http.clone(),
            filters,
            selected,
            state: Mutex::new(SkillsState::default()),
        }
    }

    pub fn snapshot(&self) -> SkillsState {
        lock(&self.state).clone()
    }

    pub async fn fetch_jobs(&self) {
        let mut params = report_params(&self.filters.get().to_report_filters(), EndpointShape::Query);
        params.number("limit", JOBS_LIMIT);
        let fetched = track(
            &self.state,
            |s| &mut s.jobs,
            "Erro ao carregar dados de skills",
            get_list(&*self.http, endpoints::SKILLS_JOBS, &params),
        )
        .await;
        if !fetched {
            lock(&self.state).jobs.data.clear();
        }
    }

    pub async fn refresh_data(&self) {
        self.fetch_jobs().await
    }

    pub async fn fetch_available_options(&self) {
        let none = QueryParams::new();
        let positions =
            option_list(&*self.http, endpoints::AVAILABLE_POSITIONS, &none, Vec::new).await;
        let skills = option_list(&*self.http, endpoints::AVAILABLE_SKILLS, &none, Vec::new).await;
        let mut state = lock(&self.state);
        state.available_positions = positions;
        state.available_skills = skills;
        state.available_seniorities = owned_list(&DEFAULT_SENIORITIES);
    }

    /// On failure the list is derived from the loaded rows, if it is still empty.
    pub async fn fetch_available_skills_for_position(&self, position: Option<&str>) {
        let params = position_params(position);
        match get_list::<String>(&*self.http, endpoints::AVAILABLE_SKILLS, &params).await {
            Ok(skills) => lock(&self.state).available_skills = skills,
            Err(e) => {
                warn!("Failed to fetch skills for position, deriving from rows: {}", e);
                let mut state = lock(&self.state);
                if state.available_skills.is_empty() && !state.jobs.data.is_empty() {
                    state.available_skills = aggregate::distinct_skills(&state.jobs.data);
                }
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

    //=====================================================================================
    // Derived views
    //=====================================================================================

    /// Per-skill job counts, restricted to the filtered skills when any are selected.
    pub fn aggregated_skills(&self) -> Vec<SkillCount> {
        let filter = self.filters.get().skills;
        aggregate::count_skills(&lock(&self.state).jobs.data, &filter)
    }

    pub fn total_skills(&self) -> usize {
        aggregate::distinct_skills(&lock(&self.state).jobs.data).len()
    }

    pub fn jobs_for_skill(&self, skill_name: &str) -> Vec<JobRow> {
        let state = lock(&self.state);
        aggregate::jobs_for_skill(&state.jobs.data, skill_name)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn selected_skill(&self) -> Option<SkillCount> {
        self.selected.get()
    }

    pub fn set_selected_skill(&self, skill: Option<SkillCount>) {
        self.selected.set(skill)
    }
}

impl FilteredStore for SkillsStore {
    type Filters = SkillsFilters;

    fn filter_cell(&self) -> &FilterCell<SkillsFilters> {
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
    use crate::ports::KeyValueStore;
    use crate::stores::testing::{ports, MockHttp};
    use serde_json::json;

    fn rows() -> serde_json::Value {
        json!([
            {"job_id": "1", "extracted_skills": "[\"Go\",\"SQL\"]"},
            {"job_id": "2", "extracted_skills": "Go, Python"}
        ])
    }

    #[tokio::test]
    async fn skills_are_counted_from_mixed_encodings() {
        let http = MockHttp::new();
        http.ok(endpoints::SKILLS_JOBS, rows());
        let (_, ports) = ports(&http);
        let store = SkillsStore::new(&ports);
        store.fetch_jobs().await;

        let counts = store.aggregated_skills();
        let count_of = |name: &str| {
            counts
                .iter()
                .find(|c| c.skill_name == name)
                .map(|c| c.job_count)
        };
        assert_eq!(count_of("Go"), Some(2));
        assert_eq!(count_of("SQL"), Some(1));
        assert_eq!(count_of("Python"), Some(1));
        assert_eq!(counts.len(), 3);
        assert_eq!(store.total_skills(), 3);
        assert_eq!(store.jobs_for_skill("python").len(), 1);
    }

    #[tokio::test]
    async fn skills_filter_is_sent_and_closes_counts() {
        let http = MockHttp::new();
        http.ok(endpoints::SKILLS_JOBS, rows());
        let (_, ports) = ports(&http);
        let store = SkillsStore::new(&ports);
        store
            .set_filters(json!({"skills": ["Go", "Rust"], "search_position_query": "Backend"}))
            .unwrap();
        store.fetch_jobs().await;

        let call = http.last_call(endpoints::SKILLS_JOBS).unwrap();
        assert_eq!(call.params.text_of("skills").as_deref(), Some("Go,Rust"));
        assert_eq!(call.params.text_of("limit").as_deref(), Some("10000"));
        assert_eq!(call.params.text_of("search_position_query").as_deref(), Some("Backend"));

        let counts = store.aggregated_skills();
        assert_eq!(
            counts,
            vec![
                SkillCount { skill_name: "Go".into(), job_count: 2 },
                SkillCount { skill_name: "Rust".into(), job_count: 0 },
            ]
        );
    }

    #[tokio::test]
    async fn skill_list_is_derived_when_endpoint_fails() {
        let http = MockHttp::new();
        http.ok(endpoints::SKILLS_JOBS, rows());
        let (_, ports) = ports(&http);
        let store = SkillsStore::new(&ports);

        store.fetch_available_skills_for_position(None).await;
        assert!(store.snapshot().available_skills.is_empty());

        store.fetch_jobs().await;
        store.fetch_available_skills_for_position(None).await;
        assert_eq!(store.snapshot().available_skills, vec!["Go", "Python", "SQL"]);
    }

    #[tokio::test]
    async fn boom_detail_lands_in_slot() {
        let http = MockHttp::new();
        http.fail_with_detail(endpoints::SKILLS_JOBS, "boom");
        let (_, ports) = ports(&http);
        let store = SkillsStore::new(&ports);
        store.fetch_jobs().await;
        let state = store.snapshot();
        assert_eq!(state.jobs.error.as_deref(), Some("boom"));
        assert!(!state.jobs.loading);
    }

    #[tokio::test]
    async fn legacy_single_skill_is_migrated_on_initialize() {
        let http = MockHttp::new();
        let (storage, ports) = ports(&http);
        storage
            .set_item("skills_filters", r#"{"skills":"Python","schema_version":1}"#)
            .unwrap();
        storage
            .set_item("skills_selected_skill", r#"{"skill_name":"Python","job_count":7}"#)
            .unwrap();
        let store = SkillsStore::new(&ports);
        store.initialize_with_defaults();
        assert_eq!(store.filters().skills, vec!["Python"]);
        assert_eq!(store.selected_skill().map(|s| s.job_count), Some(7));
    }
}
