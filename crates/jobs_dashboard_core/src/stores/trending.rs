//! crates/jobs_dashboard_core/src/stores/trending.rs
//!
//! Skill demand over time, and how it moved against the previous period.

use chrono::{Days, NaiveDate};
use futures::join;
use std::sync::{Arc, Mutex};
use tracing::debug;

use super::{
    get_json, get_list, lock, option_list, track, FilterCell, FilteredStore, Slot, StorePorts,
};
use crate::aggregate::{self, SkillKpis};
use crate::domain::{SkillTrendRow, TopSkillRow};
use crate::endpoints;
use crate::filters::TrendingFilters;
use crate::period::DateRange;
use crate::ports::HttpClient;
use crate::query::{position_params, trending_params, QueryParams};

const DEFAULT_WINDOW_DAYS: u64 = 30;
const TOP_SKILLS_LIMIT: u64 = 50;
const TREND_LIMIT: u64 = 50;
const WORD_CLOUD_LIMIT: u64 = 100;
const PREVIOUS_PERIOD_LIMIT: u64 = 1000;

#[derive(Debug, Clone, Default)]
pub struct TrendingState {
    pub available_skills: Slot<Vec<String>>,
    pub seniority_levels: Slot<Vec<String>>,
    pub available_positions: Vec<String>,
    pub top_skills: Slot<Vec<TopSkillRow>>,
    pub skills_trend: Slot<Vec<SkillTrendRow>>,
    pub word_cloud: Slot<Vec<TopSkillRow>>,
    pub prev_period: Slot<Vec<TopSkillRow>>,
    pub kpis: SkillKpis,
}

pub struct TrendingStore {
    http: Arc<dyn HttpClient>,
    filters: FilterCell<TrendingFilters>,
    state: Mutex<TrendingState>,
}

impl TrendingStore {
    pub fn new(ports: &StorePorts) -> Self {
        Self {
            http: ports.http.clone(),
            filters: FilterCell::new(ports.storage.clone(), ports.clock.clone()),
            state: Mutex::new(TrendingState::default()),
        }
    }

    pub fn snapshot(&self) -> TrendingState {
        lock(&self.state).clone()
    }

    pub fn kpis(&self) -> SkillKpis {
        lock(&self.state).kpis.clone()
    }

    /// The filter dates, or the trailing 30 days when either is missing.
    pub fn current_range(&self) -> DateRange {
        self.filters
            .get()
            .window
            .range_or_trailing(self.filters.today(), DEFAULT_WINDOW_DAYS)
    }

    /// The comparison window: same span, ending the day before the current one starts.
    /// Without filter dates it is the 30 days before the trailing month.
    pub fn previous_range(&self) -> DateRange {
        match self.filters.get().window.range() {
            Some(range) => range.previous(),
            None => {
                let today = self.filters.today();
                let days_ago =
                    |n: u64| today.checked_sub_days(Days::new(n)).unwrap_or(NaiveDate::MIN);
                DateRange {
                    from: days_ago(2 * DEFAULT_WINDOW_DAYS - 1),
                    to: days_ago(DEFAULT_WINDOW_DAYS),
                }
            }
        }
    }

    //=====================================================================================
    // Option lists
    //=====================================================================================

    pub async fn fetch_available_skills(&self) {
        let params = position_params(self.filters.get().search_position_query.as_deref());
        track(
            &self.state,
            |s| &mut s.available_skills,
            "Failed to fetch available skills",
            get_list(&*self.http, endpoints::AVAILABLE_SKILLS, &params),
        )
        .await;
    }

    pub async fn fetch_available_seniority_levels(&self) {
        let params = position_params(self.filters.get().search_position_query.as_deref());
        track(
            &self.state,
            |s| &mut s.seniority_levels,
            "Failed to fetch available seniority levels",
            get_list(&*self.http, endpoints::AVAILABLE_SENIORITY_LEVELS, &params),
        )
        .await;
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

    //=====================================================================================
    // Chart slots
    //=====================================================================================

    pub async fn fetch_top_skills(&self) {
        let params = trending_params(&self.filters.get(), self.current_range(), TOP_SKILLS_LIMIT);
        track(
            &self.state,
            |s| &mut s.top_skills,
            "Failed to fetch top skills data",
            get_list(&*self.http, endpoints::TOP_SKILLS, &params),
        )
        .await;
    }

    /// One series per selected skill, or the top 50 when none are selected.
    pub async fn fetch_skills_trend(&self) {
        let filters = self.filters.get();
        let limit = match filters.selected_skills.len() {
            0 => TREND_LIMIT,
            n => n as u64,
        };
        let mut params = trending_params(&filters, self.current_range(), limit);
        params.repeated("skills", &filters.selected_skills);
        track(
            &self.state,
            |s| &mut s.skills_trend,
            "Failed to fetch skills trend data",
            get_list(&*self.http, endpoints::SKILLS_TREND, &params),
        )
        .await;
    }

    /// Anything but a JSON array is rejected and clears the cloud.
    pub async fn fetch_word_cloud(&self) {
        let params = trending_params(&self.filters.get(), self.current_range(), WORD_CLOUD_LIMIT);
        let fetched = track(
            &self.state,
            |s| &mut s.word_cloud,
            "Failed to fetch skills for word cloud",
            get_json(&*self.http, endpoints::TOP_SKILLS, &params),
        )
        .await;
        if !fetched {
            lock(&self.state).word_cloud.data.clear();
        }
    }

    pub async fn fetch_prev_period(&self) {
        let params =
            trending_params(&self.filters.get(), self.previous_range(), PREVIOUS_PERIOD_LIMIT);
        track(
            &self.state,
            |s| &mut s.prev_period,
            "Failed to fetch previous period skills",
            get_list(&*self.http, endpoints::TOP_SKILLS, &params),
        )
        .await;
    }

    /// Recomputes the KPIs from whatever the trend and previous-period slots hold.
    pub fn compute_kpis(&self) {
        let filters = self.filters.get();
        let seniority = filters.seniority();
        let mut state = lock(&self.state);
        let current = aggregate::sum_by_skill(
            state
                .skills_trend
                .data
                .iter()
                .filter(|row| seniority.is_none() || row.seniority.as_deref() == seniority)
                .map(|row| (row.skill.as_str(), row.skill_count)),
        );
        let previous = aggregate::sum_by_skill(
            state
                .prev_period
                .data
                .iter()
                .map(|row| (row.skill.as_str(), row.skill_count)),
        );
        state.kpis = aggregate::skill_kpis(&current, &previous);
        debug!(
            skills = current.len(),
            most_demanded = ?state.kpis.most_demanded.as_ref().map(|s| s.skill.as_str()),
            "Trending KPIs computed"
        );
    }

    /// Option lists in order, then the four chart slots together, then the KPIs.
    pub async fn refresh_all(&self) {
        self.fetch_available_skills().await;
        self.fetch_available_seniority_levels().await;
        self.fetch_available_positions().await;
        join!(
            self.fetch_top_skills(),
            self.fetch_skills_trend(),
            self.fetch_word_cloud(),
            self.fetch_prev_period(),
        );
        self.compute_kpis();
    }
}

impl FilteredStore for TrendingStore {
    type Filters = TrendingFilters;

    fn filter_cell(&self) -> &FilterCell<TrendingFilters> {
        &self.filters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::testing::{day, ports, MockHttp};
    use serde_json::json;

    #[tokio::test]
    async fn previous_range_mirrors_the_current_span() {
        let http = MockHttp::new();
        let (_, ports) = ports(&http);
        let store = TrendingStore::new(&ports);

        assert_eq!(
            store.previous_range(),
            DateRange { from: day(2025, 1, 15), to: day(2025, 2, 13) }
        );

        store
            .set_filters(json!({"dateFrom": "2025-03-01", "dateTo": "2025-03-10"}))
            .unwrap();
        assert_eq!(
            store.previous_range(),
            DateRange { from: day(2025, 2, 19), to: day(2025, 2, 28) }
        );
    }

    #[tokio::test]
    async fn trend_request_repeats_selected_skills() {
        let http = MockHttp::new();
        http.ok(endpoints::SKILLS_TREND, json!([]));
        let (_, ports) = ports(&http);
        let store = TrendingStore::new(&ports);
        store
            .set_filters(json!({"selectedSkills": ["Go", "SQL"], "selectedSeniority": "Todos"}))
            .unwrap();
        store.fetch_skills_trend().await;

        let call = http.last_call(endpoints::SKILLS_TREND).unwrap();
        assert_eq!(call.params.text_of("limit").as_deref(), Some("2"));
        assert!(!call.params.contains("seniority"));
        let pairs = call.params.to_pairs();
        let skills: Vec<&str> = pairs
            .iter()
            .filter(|(name, _)| name == "skills")
            .map(|(_, value)| value.as_str())
            .collect();
        assert_eq!(skills, vec!["Go", "SQL"]);
        assert_eq!(call.params.text_of("job_posted_at_date_from").as_deref(), Some("2025-02-13"));
    }

    #[tokio::test]
    async fn word_cloud_rejects_non_arrays() {
        let http = MockHttp::new();
        http.ok(endpoints::TOP_SKILLS, json!([{"skill": "Go", "skill_count": 3}]));
        let (_, ports) = ports(&http);
        let store = TrendingStore::new(&ports);
        store.fetch_word_cloud().await;
        assert_eq!(store.snapshot().word_cloud.data.len(), 1);

        http.ok(endpoints::TOP_SKILLS, json!({"skills": []}));
        store.fetch_word_cloud().await;
        let cloud = store.snapshot().word_cloud;
        assert!(cloud.data.is_empty());
        assert_eq!(cloud.error.as_deref(), Some("Failed to fetch skills for word cloud"));
        assert!(!cloud.loading);
    }

    #[tokio::test]
    async fn refresh_all_computes_kpis() {
        let http = MockHttp::new();
        http.ok(endpoints::AVAILABLE_SKILLS, json!(["Go", "SQL"]));
        http.ok(endpoints::AVAILABLE_SENIORITY_LEVELS, json!(["Senior"]));
        http.ok(endpoints::AVAILABLE_POSITIONS, json!(["Data Engineer"]));
        http.ok(
            endpoints::SKILLS_TREND,
            json!([
                {"job_posted_at_date": "2025-03-01", "skill": "Go", "seniority": "Senior", "skill_count": 3},
                {"job_posted_at_date": "2025-03-02", "skill": "Go", "seniority": "Senior", "skill_count": 2},
                {"job_posted_at_date": "2025-03-02", "skill": "SQL", "seniority": "Junior", "skill_count": 4}
            ]),
        );
        http.ok(
            endpoints::TOP_SKILLS,
            json!([{"skill": "Go", "skill_count": 10}, {"skill": "SQL", "skill_count": 2}]),
        );
        let (_, ports) = ports(&http);
        let store = TrendingStore::new(&ports);
        store.initialize_with_defaults();
        store.refresh_all().await;

        let kpis = store.kpis();
        assert_eq!(kpis.most_demanded.unwrap().skill, "Go");
        let growth = kpis.highest_growth.unwrap();
        assert_eq!(growth.change.skill, "SQL");
        assert_eq!(growth.change.change, 100.0);
        let drop = kpis.biggest_drop.unwrap();
        assert_eq!(drop.skill, "Go");
        assert_eq!(drop.change, -50.0);

        let prev = http
            .calls_to(endpoints::TOP_SKILLS)
            .into_iter()
            .find(|c| c.params.text_of("limit").as_deref() == Some("1000"))
            .unwrap();
        assert_eq!(prev.params.text_of("job_posted_at_date_to").as_deref(), Some("2025-02-12"));

        let state = store.snapshot();
        assert_eq!(state.available_skills.data, vec!["Go", "SQL"]);
        assert_eq!(state.available_positions, vec!["Data Engineer"]);
    }

    #[tokio::test]
    async fn seniority_filter_narrows_current_counts() {
        let http = MockHttp::new();
        http.ok(
            endpoints::SKILLS_TREND,
            json!([
                {"skill": "Go", "seniority": "Senior", "skill_count": 3},
                {"skill": "SQL", "seniority": "Junior", "skill_count": 9}
            ]),
        );
        let (_, ports) = ports(&http);
        let store = TrendingStore::new(&ports);
        store.set_filters(json!({"selectedSeniority": "Senior"})).unwrap();
        store.fetch_skills_trend().await;
        store.compute_kpis();
        assert_eq!(store.kpis().most_demanded.unwrap().skill, "Go");
    }

    #[tokio::test]
    async fn option_errors_stay_in_their_slots() {
        let http = MockHttp::new();
        http.fail_with_detail(endpoints::AVAILABLE_SKILLS, "boom");
        let (_, ports) = ports(&http);
        let store = TrendingStore::new(&ports);
        store.fetch_available_skills().await;
        store.fetch_available_seniority_levels().await;
        let state = store.snapshot();
        assert_eq!(state.available_skills.error.as_deref(), Some("boom"));
        assert_eq!(
            state.seniority_levels.error.as_deref(),
            Some("Failed to fetch available seniority levels")
        );
        assert_eq!(state.top_skills.error, None);
    }
}
