//! crates/jobs_dashboard_core/src/filters.rs
//!
//! The per-domain filter models. Field names are kept exactly as the persisted JSON
//! and the UI spell them, so older saved state keeps loading.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::Debug;

use crate::decode;
use crate::domain::Domain;
use crate::period::{DateRange, DateWindow, Period};

/// Position preselected by the chart dashboards.
pub const DEFAULT_POSITION: &str = "Data Engineer";
/// "Every seniority" in the trending seniority dropdown.
pub const TRENDING_ALL_SENIORITIES: &str = "Todos";
/// "Unfiltered" in the companies dropdowns.
pub const COMPANIES_ALL: &str = "all";
/// City placeholder that never becomes a filter.
pub const UNKNOWN_CITY: &str = "N/A";

pub const DEFAULT_SENIORITIES: [&str; 5] = ["Junior", "Pleno", "Senior", "Lead", "Principal"];
pub const DEFAULT_EMPLOYMENT_TYPES: [&str; 7] = [
    "CLT",
    "PJ",
    "Freelance",
    "Temporário",
    "Estágio",
    "Trainee",
    "Cooperado",
];
pub const DEFAULT_POSITIONS: [&str; 10] = [
    "Data Engineering",
    "Frontend",
    "Fullstack",
    "DevOps",
    "Data Scientist",
    "Backend",
    "Mobile",
    "QA",
    "UX/UI",
    "Product Manager",
];

pub fn owned_list(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

//=========================================================================================
// The FilterModel Trait
//=========================================================================================

/// Behaviour shared by every domain's filter model.
pub trait FilterModel:
    Serialize + DeserializeOwned + Default + Clone + Debug + PartialEq + Send + 'static
{
    const DOMAIN: Domain;
    const SCHEMA_VERSION: u32 = 1;
    /// JSON names of the fields that hold multi-select arrays.
    const LIST_FACETS: &'static [&'static str] = &[];
    const SUPPORTS_LAST_60_DAYS: bool = true;

    fn window(&self) -> &DateWindow;

    fn window_mut(&mut self) -> &mut DateWindow;

    /// Hook run on a `set_filters` patch before it is merged.
    fn normalize_patch(_patch: &mut Map<String, Value>, _today: NaiveDate) {}
}

/// Shallow field-by-field merge of `patch` over `current`.
pub fn merge_fields<F: FilterModel>(
    current: &F,
    patch: &Map<String, Value>,
) -> Result<F, serde_json::Error> {
    let mut merged = serde_json::to_value(current)?;
    if let Value::Object(fields) = &mut merged {
        for (name, value) in patch {
            fields.insert(name.clone(), value.clone());
        }
    }
    serde_json::from_value(merged)
}

macro_rules! filter_window {
    () => {
        fn window(&self) -> &DateWindow {
            &self.window
        }

        fn window_mut(&mut self) -> &mut DateWindow {
            &mut self.window
        }
    };
}

fn single(value: &Option<String>) -> Vec<String> {
    value.iter().cloned().collect()
}

fn remote_types(flag: Option<bool>) -> Vec<String> {
    flag.map(|b| vec![b.to_string()]).unwrap_or_default()
}

fn known_city(city: &Option<String>) -> Vec<String> {
    city.iter()
        .filter(|c| c.as_str() != UNKNOWN_CITY)
        .cloned()
        .collect()
}

//=========================================================================================
// Row-explorer models (vagas, empresas, skills)
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VagasFilters {
    #[serde(deserialize_with = "decode::optional_text")]
    pub search_position_query: Option<String>,
    #[serde(deserialize_with = "decode::optional_text")]
    pub employment_type: Option<String>,
    #[serde(deserialize_with = "decode::optional_flag")]
    pub job_is_remote: Option<bool>,
    #[serde(deserialize_with = "decode::optional_text")]
    pub seniority: Option<String>,
    #[serde(deserialize_with = "decode::optional_text")]
    pub job_city: Option<String>,
    #[serde(flatten)]
    pub window: DateWindow,
}

impl FilterModel for VagasFilters {
    const DOMAIN: Domain = Domain::Vagas;
    const SUPPORTS_LAST_60_DAYS: bool = false;

    filter_window!();
}

impl VagasFilters {
    pub fn to_report_filters(&self) -> ReportFilters {
        ReportFilters {
            selected_position: self.search_position_query.clone(),
            selected_seniority: single(&self.seniority),
            selected_employment_types: single(&self.employment_type),
            selected_cities: known_city(&self.job_city),
            selected_remote_types: remote_types(self.job_is_remote),
            window: self.window,
            ..ReportFilters::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmpresasFilters {
    #[serde(deserialize_with = "decode::optional_text")]
    pub search_position_query: Option<String>,
    #[serde(deserialize_with = "decode::optional_text")]
    pub employer_name: Option<String>,
    #[serde(deserialize_with = "decode::optional_flag")]
    pub job_is_remote: Option<bool>,
    #[serde(deserialize_with = "decode::optional_text")]
    pub seniority: Option<String>,
    #[serde(deserialize_with = "decode::optional_text")]
    pub job_city: Option<String>,
    #[serde(flatten)]
    pub window: DateWindow,
}

impl FilterModel for EmpresasFilters {
    const DOMAIN: Domain = Domain::Empresas;

    filter_window!();
}

impl EmpresasFilters {
    pub fn to_report_filters(&self) -> ReportFilters {
        ReportFilters {
            selected_position: self.search_position_query.clone(),
            selected_companies: single(&self.employer_name),
            selected_seniority: single(&self.seniority),
            selected_cities: known_city(&self.job_city),
            selected_remote_types: remote_types(self.job_is_remote),
            window: self.window,
            ..ReportFilters::default()
        }
    }
}

/// Schema v2: `skills` became a list. v1 stored a single string.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillsFilters {
    #[serde(deserialize_with = "decode::optional_text")]
    pub search_position_query: Option<String>,
    pub skills: Vec<String>,
    #[serde(deserialize_with = "decode::optional_flag")]
    pub job_is_remote: Option<bool>,
    #[serde(deserialize_with = "decode::optional_text")]
    pub seniority: Option<String>,
    #[serde(flatten)]
    pub window: DateWindow,
}

impl FilterModel for SkillsFilters {
    const DOMAIN: Domain = Domain::Skills;
    const SCHEMA_VERSION: u32 = 2;
    const LIST_FACETS: &'static [&'static str] = &["skills"];

    filter_window!();
}

impl SkillsFilters {
    pub fn to_report_filters(&self) -> ReportFilters {
        ReportFilters {
            selected_position: self.search_position_query.clone(),
            selected_seniority: single(&self.seniority),
            selected_skills: self.skills.clone(),
            selected_remote_types: remote_types(self.job_is_remote),
            window: self.window,
            ..ReportFilters::default()
        }
    }
}

//=========================================================================================
// Chart dashboards
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishersFilters {
    #[serde(deserialize_with = "decode::optional_text")]
    pub publisher: Option<String>,
    #[serde(deserialize_with = "decode::optional_text")]
    pub seniority: Option<String>,
    #[serde(deserialize_with = "decode::optional_text")]
    pub company: Option<String>,
    #[serde(deserialize_with = "decode::optional_flag")]
    pub remote: Option<bool>,
    #[serde(deserialize_with = "decode::optional_text")]
    pub search_position_query: Option<String>,
    pub limit: u32,
    #[serde(rename = "limitPublishers")]
    pub limit_publishers: u32,
    #[serde(rename = "limitCompanies")]
    pub limit_companies: u32,
    #[serde(flatten)]
    pub window: DateWindow,
}

impl Default for PublishersFilters {
    fn default() -> Self {
        Self {
            publisher: None,
            seniority: None,
            company: None,
            remote: None,
            search_position_query: Some(DEFAULT_POSITION.to_string()),
            limit: 20,
            limit_publishers: 15,
            limit_companies: 15,
            window: DateWindow::default(),
        }
    }
}

impl FilterModel for PublishersFilters {
    const DOMAIN: Domain = Domain::Publishers;

    filter_window!();

    /// A patch carrying both dates but no period is tagged with the preset it matches.
    fn normalize_patch(patch: &mut Map<String, Value>, today: NaiveDate) {
        let has_period = patch
            .get("period")
            .is_some_and(|p| !p.is_null() && p.as_str() != Some(""));
        let date_of = |name: &str| {
            patch
                .get(name)
                .and_then(Value::as_str)
                .filter(|raw| !raw.is_empty())
                .map(decode::parse_date)
        };
        if has_period {
            return;
        }
        let (Some(from), Some(to)) = (date_of("dateFrom"), date_of("dateTo")) else {
            return;
        };
        let given = from.zip(to).map(|(from, to)| DateRange { from, to });
        let period = [Period::Last7Days, Period::Last30Days]
            .into_iter()
            .find(|preset| given.is_some() && preset.resolve(today) == given)
            .unwrap_or(Period::Custom);
        patch.insert("period".to_string(), Value::String(period.as_str().to_string()));
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendingFilters {
    #[serde(deserialize_with = "decode::optional_text")]
    pub search_position_query: Option<String>,
    #[serde(rename = "selectedSkills")]
    pub selected_skills: Vec<String>,
    #[serde(rename = "selectedSeniority", deserialize_with = "decode::optional_text")]
    pub selected_seniority: Option<String>,
    #[serde(flatten)]
    pub window: DateWindow,
}

impl Default for TrendingFilters {
    fn default() -> Self {
        Self {
            search_position_query: Some(DEFAULT_POSITION.to_string()),
            selected_skills: Vec::new(),
            selected_seniority: None,
            window: DateWindow::default(),
        }
    }
}

impl FilterModel for TrendingFilters {
    const DOMAIN: Domain = Domain::Trending;
    const LIST_FACETS: &'static [&'static str] = &["selectedSkills"];

    filter_window!();
}

impl TrendingFilters {
    /// The seniority actually filtered on; `Todos` means every level.
    pub fn seniority(&self) -> Option<&str> {
        self.selected_seniority
            .as_deref()
            .filter(|s| *s != TRENDING_ALL_SENIORITIES)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardFilters {
    #[serde(deserialize_with = "decode::optional_text")]
    pub search_position_query: Option<String>,
    #[serde(deserialize_with = "decode::optional_text")]
    pub job_city: Option<String>,
    #[serde(deserialize_with = "decode::optional_text")]
    pub job_state: Option<String>,
    #[serde(deserialize_with = "decode::optional_flag")]
    pub job_is_remote: Option<bool>,
    #[serde(flatten)]
    pub window: DateWindow,
}

impl Default for DashboardFilters {
    fn default() -> Self {
        Self {
            search_position_query: Some(DEFAULT_POSITION.to_string()),
            job_city: None,
            job_state: None,
            job_is_remote: None,
            window: DateWindow::default(),
        }
    }
}

impl FilterModel for DashboardFilters {
    const DOMAIN: Domain = Domain::Dashboard;

    filter_window!();
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompaniesFilters {
    #[serde(deserialize_with = "decode::optional_text")]
    pub search_position_query: Option<String>,
    #[serde(deserialize_with = "decode::optional_text")]
    pub employer_name: Option<String>,
    #[serde(deserialize_with = "decode::optional_flag")]
    pub job_is_remote: Option<bool>,
    #[serde(deserialize_with = "decode::optional_text")]
    pub seniority: Option<String>,
    #[serde(flatten)]
    pub window: DateWindow,
}

impl Default for CompaniesFilters {
    fn default() -> Self {
        Self {
            search_position_query: Some(DEFAULT_POSITION.to_string()),
            employer_name: None,
            job_is_remote: None,
            seniority: None,
            window: DateWindow::default(),
        }
    }
}

impl FilterModel for CompaniesFilters {
    const DOMAIN: Domain = Domain::Companies;

    filter_window!();
}

//=========================================================================================
// Reports (multi-select)
//=========================================================================================

/// The multi-select model behind the export screen. Every list may contain the `''`
/// sentinel meaning "all".
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReportFilters {
    #[serde(deserialize_with = "decode::optional_text")]
    pub selected_position: Option<String>,
    pub selected_companies: Vec<String>,
    pub selected_publishers: Vec<String>,
    pub selected_seniority: Vec<String>,
    pub selected_employment_types: Vec<String>,
    pub selected_cities: Vec<String>,
    pub selected_states: Vec<String>,
    pub selected_skills: Vec<String>,
    pub selected_remote_types: Vec<String>,
    pub selected_direct_types: Vec<String>,
    #[serde(flatten)]
    pub window: DateWindow,
}

impl FilterModel for ReportFilters {
    const DOMAIN: Domain = Domain::Reports;
    const LIST_FACETS: &'static [&'static str] = &[
        "selectedCompanies",
        "selectedPublishers",
        "selectedSeniority",
        "selectedEmploymentTypes",
        "selectedCities",
        "selectedStates",
        "selectedSkills",
        "selectedRemoteTypes",
        "selectedDirectTypes",
    ];

    filter_window!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn patch(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(fields) => fields,
            _ => unreachable!(),
        }
    }

    #[test]
    fn merge_is_shallow_and_lenient() {
        let current = VagasFilters {
            seniority: Some("Senior".into()),
            ..VagasFilters::default()
        };
        let merged = merge_fields(
            &current,
            &patch(json!({"job_is_remote": "true", "job_city": "", "dateFrom": "2025-01-01"})),
        )
        .unwrap();
        assert_eq!(merged.job_is_remote, Some(true));
        assert_eq!(merged.job_city, None);
        assert_eq!(merged.seniority.as_deref(), Some("Senior"));
        assert_eq!(merged.window.date_from, NaiveDate::from_ymd_opt(2025, 1, 1));
        assert_eq!(merged.window.period, Period::Last30Days);
    }

    #[test]
    fn tri_state_accepts_all_wire_spellings() {
        for unset in [json!(""), json!("null"), json!("all"), Value::Null] {
            let merged =
                merge_fields(&CompaniesFilters::default(), &patch(json!({ "job_is_remote": unset })))
                    .unwrap();
            assert_eq!(merged.job_is_remote, None);
        }
        let merged =
            merge_fields(&CompaniesFilters::default(), &patch(json!({"job_is_remote": 0}))).unwrap();
        assert_eq!(merged.job_is_remote, Some(false));
    }

    #[test]
    fn invalid_patch_is_rejected() {
        let result = merge_fields(&PublishersFilters::default(), &patch(json!({"limit": "many"})));
        assert!(result.is_err());
    }

    #[test]
    fn vagas_report_filters_drop_unknown_city() {
        let filters = VagasFilters {
            job_city: Some(UNKNOWN_CITY.into()),
            job_is_remote: Some(false),
            employment_type: Some("CLT".into()),
            ..VagasFilters::default()
        };
        let report = filters.to_report_filters();
        assert!(report.selected_cities.is_empty());
        assert_eq!(report.selected_remote_types, vec!["false"]);
        assert_eq!(report.selected_employment_types, vec!["CLT"]);
    }

    #[test]
    fn publishers_patch_infers_period() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
        let mut seven = patch(json!({"dateFrom": "2025-03-08", "dateTo": "2025-03-15"}));
        PublishersFilters::normalize_patch(&mut seven, today);
        assert_eq!(seven["period"], json!("last7days"));

        let mut thirty = patch(json!({"dateFrom": "2025-02-13", "dateTo": "2025-03-15"}));
        PublishersFilters::normalize_patch(&mut thirty, today);
        assert_eq!(thirty["period"], json!("last30days"));

        let mut other = patch(json!({"dateFrom": "2025-01-01", "dateTo": "2025-01-31"}));
        PublishersFilters::normalize_patch(&mut other, today);
        assert_eq!(other["period"], json!("custom"));

        let mut tagged = patch(json!({"dateFrom": "2025-01-01", "dateTo": "2025-01-31", "period": "thisMonth"}));
        PublishersFilters::normalize_patch(&mut tagged, today);
        assert_eq!(tagged["period"], json!("thisMonth"));
    }

    #[test]
    fn report_filters_use_camel_case_names() {
        let filters = ReportFilters {
            selected_direct_types: vec!["true".into()],
            ..ReportFilters::default()
        };
        let value = serde_json::to_value(&filters).unwrap();
        assert_eq!(value["selectedDirectTypes"], json!(["true"]));
        assert_eq!(value["period"], json!("last30days"));
    }

    #[test]
    fn trending_todos_means_every_seniority() {
        let mut filters = TrendingFilters::default();
        filters.selected_seniority = Some(TRENDING_ALL_SENIORITIES.into());
        assert_eq!(filters.seniority(), None);
        filters.selected_seniority = Some("Senior".into());
        assert_eq!(filters.seniority(), Some("Senior"));
    }
}
