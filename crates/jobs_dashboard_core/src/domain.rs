//! crates/jobs_dashboard_core/src/domain.rs
//!
//! Defines the core data structures the dashboard works with: the domains themselves,
//! the canonical job row and the typed rows each backend chart endpoint returns.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::decode::{self, ApplyOptions};

/// One dashboard section. Each owns its filters, slots and persisted keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    Vagas,
    Empresas,
    Skills,
    Publishers,
    Trending,
    Dashboard,
    Companies,
    Reports,
}

impl Domain {
    pub const ALL: [Domain; 8] = [
        Domain::Vagas,
        Domain::Empresas,
        Domain::Skills,
        Domain::Publishers,
        Domain::Trending,
        Domain::Dashboard,
        Domain::Companies,
        Domain::Reports,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Domain::Vagas => "vagas",
            Domain::Empresas => "empresas",
            Domain::Skills => "skills",
            Domain::Publishers => "publishers",
            Domain::Trending => "trending",
            Domain::Dashboard => "dashboard",
            Domain::Companies => "companies",
            Domain::Reports => "reports",
        }
    }

    /// Storage key of the persisted filter model.
    pub fn filters_key(self) -> String {
        format!("{}_filters", self.key())
    }

    /// Storage key of the persisted selection, for domains that have one.
    pub fn selection_key(self) -> Option<&'static str> {
        match self {
            Domain::Vagas => Some("vagas_selected_job"),
            Domain::Empresas => Some("empresas_selected_company"),
            Domain::Skills => Some("skills_selected_skill"),
            _ => None,
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

//=========================================================================================
// Job rows
//=========================================================================================

/// A job posting, decoded once from the loose wire shape.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "RawJobRow", into = "RawJobRow")]
pub struct JobRow {
    pub job_id: Option<String>,
    pub job_title: Option<String>,
    pub employer_name: Option<String>,
    pub job_city: Option<String>,
    pub job_state: Option<String>,
    pub seniority: Option<String>,
    pub job_employment_type: Option<String>,
    pub job_publisher: Option<String>,
    pub job_is_remote: bool,
    pub job_posted_at_date: Option<NaiveDate>,
    pub extracted_skills: Vec<String>,
    pub apply_options: ApplyOptions,
    /// Every other column, kept so a persisted selection round-trips.
    pub extra: Map<String, Value>,
}

impl JobRow {
    /// Publishers advertising this job: the parsed `apply_options`, or `job_publisher`
    /// when the options are missing or malformed.
    pub fn publishers(&self) -> Vec<String> {
        match &self.apply_options {
            ApplyOptions::Parsed(publishers) => publishers.clone(),
            ApplyOptions::Missing | ApplyOptions::Malformed(_) => self
                .job_publisher
                .as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(|p| vec![p.to_string()])
                .unwrap_or_default(),
        }
    }

    pub fn has_skill_like(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.extracted_skills
            .iter()
            .any(|skill| skill.to_lowercase().contains(&needle))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawJobRow {
    #[serde(default, deserialize_with = "decode::optional_text", skip_serializing_if = "Option::is_none")]
    job_id: Option<String>,
    #[serde(default, deserialize_with = "decode::optional_text", skip_serializing_if = "Option::is_none")]
    job_title: Option<String>,
    #[serde(default, deserialize_with = "decode::optional_text", skip_serializing_if = "Option::is_none")]
    employer_name: Option<String>,
    #[serde(default, deserialize_with = "decode::optional_text", skip_serializing_if = "Option::is_none")]
    job_city: Option<String>,
    #[serde(default, deserialize_with = "decode::optional_text", skip_serializing_if = "Option::is_none")]
    job_state: Option<String>,
    #[serde(default, deserialize_with = "decode::optional_text", skip_serializing_if = "Option::is_none")]
    seniority: Option<String>,
    #[serde(default, deserialize_with = "decode::optional_text", skip_serializing_if = "Option::is_none")]
    job_employment_type: Option<String>,
    #[serde(default, deserialize_with = "decode::optional_text", skip_serializing_if = "Option::is_none")]
    job_publisher: Option<String>,
    #[serde(default)]
    job_is_remote: Value,
    #[serde(default, deserialize_with = "decode::optional_date", skip_serializing_if = "Option::is_none")]
    job_posted_at_date: Option<NaiveDate>,
    #[serde(default)]
    extracted_skills: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    apply_options: Value,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<RawJobRow> for JobRow {
    fn from(raw: RawJobRow) -> Self {
        Self {
            job_id: raw.job_id,
            job_title: raw.job_title,
            employer_name: raw.employer_name,
            job_city: raw.job_city,
            job_state: raw.job_state,
            seniority: raw.seniority,
            job_employment_type: raw.job_employment_type,
            job_publisher: raw.job_publisher,
            job_is_remote: decode::remote_flag(&raw.job_is_remote),
            job_posted_at_date: raw.job_posted_at_date,
            extracted_skills: decode::skill_list(&raw.extracted_skills),
            apply_options: ApplyOptions::decode(&raw.apply_options),
            extra: raw.extra,
        }
    }
}

impl From<JobRow> for RawJobRow {
    fn from(row: JobRow) -> Self {
        Self {
            job_id: row.job_id,
            job_title: row.job_title,
            employer_name: row.employer_name,
            job_city: row.job_city,
            job_state: row.job_state,
            seniority: row.seniority,
            job_employment_type: row.job_employment_type,
            job_publisher: row.job_publisher,
            job_is_remote: Value::Bool(row.job_is_remote),
            job_posted_at_date: row.job_posted_at_date,
            extracted_skills: Value::Array(
                row.extracted_skills.into_iter().map(Value::String).collect(),
            ),
            apply_options: row.apply_options.encode(),
            extra: row.extra,
        }
    }
}

//=========================================================================================
// Derived selections
//=========================================================================================

/// A company and how many of the loaded jobs it posted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyCount {
    pub employer_name: String,
    pub job_count: u64,
}

/// A skill and how many of the loaded jobs mention it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillCount {
    pub skill_name: String,
    pub job_count: u64,
}

/// A city/state pair offered as a location filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    #[serde(default, deserialize_with = "decode::nullable_text")]
    pub title: String,
    #[serde(default, deserialize_with = "decode::nullable_text")]
    pub state: String,
}

//=========================================================================================
// Chart endpoint rows
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopSkillRow {
    #[serde(default, deserialize_with = "decode::nullable_text")]
    pub skill: String,
    /// Only present when the backend did not filter by seniority.
    #[serde(default, deserialize_with = "decode::optional_text")]
    pub seniority: Option<String>,
    #[serde(default, deserialize_with = "decode::count")]
    pub skill_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillTrendRow {
    #[serde(default, deserialize_with = "decode::optional_date")]
    pub job_posted_at_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "decode::nullable_text")]
    pub skill: String,
    #[serde(default, deserialize_with = "decode::optional_text")]
    pub seniority: Option<String>,
    #[serde(default, deserialize_with = "decode::count")]
    pub skill_count: u64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PublishersKpis {
    #[serde(default, deserialize_with = "decode::count")]
    pub total_publishers: u64,
    #[serde(default, deserialize_with = "decode::ratio")]
    pub avg_publishers_per_job: f64,
    #[serde(default, deserialize_with = "decode::optional_text")]
    pub biggest_coverage_publisher: Option<String>,
    #[serde(default, deserialize_with = "decode::count")]
    pub biggest_coverage_count: u64,
    #[serde(default, deserialize_with = "decode::ratio")]
    pub direct_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopPublisherRow {
    #[serde(default, deserialize_with = "decode::nullable_text")]
    pub publisher: String,
    #[serde(default, deserialize_with = "decode::count")]
    pub publication_count: u64,
    #[serde(default, deserialize_with = "decode::count")]
    pub unique_jobs_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublisherSeniorityRow {
    #[serde(default, deserialize_with = "decode::nullable_text")]
    pub publisher: String,
    #[serde(default, deserialize_with = "decode::nullable_text")]
    pub seniority: String,
    #[serde(default, deserialize_with = "decode::count")]
    pub job_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublisherCompanyRow {
    #[serde(default, deserialize_with = "decode::nullable_text")]
    pub publisher: String,
    #[serde(default, deserialize_with = "decode::nullable_text")]
    pub employer_name: String,
    #[serde(default, deserialize_with = "decode::count")]
    pub job_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublisherTimelineRow {
    #[serde(default, deserialize_with = "decode::optional_date")]
    pub job_posted_at_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "decode::nullable_text")]
    pub publisher: String,
    #[serde(default, deserialize_with = "decode::count")]
    pub job_count: u64,
}

/// The option lists the publishers filter bar offers.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PublisherOptions {
    pub publishers: Vec<String>,
    pub seniority_levels: Vec<String>,
    pub companies: Vec<String>,
    pub positions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CompaniesKpis {
    #[serde(default, deserialize_with = "decode::count")]
    pub total_jobs: u64,
    #[serde(default, deserialize_with = "decode::ratio")]
    pub remote_percentage: f64,
    #[serde(default, deserialize_with = "decode::ratio")]
    pub avg_skills_per_job: f64,
    #[serde(default, deserialize_with = "decode::count")]
    pub distinct_companies: u64,
}

/// Answer of the export count endpoint.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExportCount {
    #[serde(default, deserialize_with = "decode::count")]
    pub count: u64,
    #[serde(default, deserialize_with = "decode::count")]
    pub max_allowed: u64,
    /// Any other field the backend reports (e.g. a warning flag).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Result of a finished CSV download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    pub filename: String,
    pub bytes: usize,
}
