//! crates/jobs_dashboard_core/src/query.rs
//!
//! Translates filter models into the parameter shapes the backend endpoints expect.
//! The backend parameter names below are a wire contract and must not change.

use chrono::NaiveDate;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

use crate::filters::{
    CompaniesFilters, DashboardFilters, PublishersFilters, ReportFilters, TrendingFilters,
    COMPANIES_ALL,
};
use crate::period::{DateRange, DateWindow};

/// Inside a multi-select list, the empty string means "all".
pub const SENTINEL_ALL: &str = "";

pub const DATE_FROM: &str = "job_posted_at_date_from";
pub const DATE_TO: &str = "job_posted_at_date_to";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Text(String),
    List(Vec<String>),
    Flag(bool),
}

/// GET endpoints take comma-joined lists; POST `filters` bodies take arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointShape {
    Query,
    Body,
}

/// Parameters of one backend request, ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    entries: BTreeMap<String, ParamValue>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `value` unless it is absent or empty.
    pub fn text(&mut self, name: &str, value: Option<&str>) -> &mut Self {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            self.entries
                .insert(name.to_string(), ParamValue::Text(value.to_string()));
        }
        self
    }

    pub fn date(&mut self, name: &str, value: Option<NaiveDate>) -> &mut Self {
        let formatted = value.map(|d| d.format("%Y-%m-%d").to_string());
        self.text(name, formatted.as_deref())
    }

    pub fn range(&mut self, range: DateRange) -> &mut Self {
        self.date(DATE_FROM, Some(range.from))
            .date(DATE_TO, Some(range.to))
    }

    pub fn window(&mut self, window: &DateWindow) -> &mut Self {
        self.date(DATE_FROM, window.date_from)
            .date(DATE_TO, window.date_to)
    }

    pub fn flag(&mut self, name: &str, value: Option<bool>) -> &mut Self {
        if let Some(value) = value {
            self.entries.insert(name.to_string(), ParamValue::Flag(value));
        }
        self
    }

    pub fn number(&mut self, name: &str, value: u64) -> &mut Self {
        self.entries
            .insert(name.to_string(), ParamValue::Text(value.to_string()));
        self
    }

    /// A multi-select facet. A selection holding the sentinel, or nothing, is omitted.
    pub fn facet(&mut self, name: &str, values: &[String], shape: EndpointShape) -> &mut Self {
        let Some(values) = active_selection(values) else {
            return self;
        };
        let values = values.to_vec();
        let value = match shape {
            EndpointShape::Query => ParamValue::Text(values.join(",")),
            EndpointShape::Body => ParamValue::List(values),
        };
        self.entries.insert(name.to_string(), value);
        self
    }

    /// Sent as one `name=value` pair per element.
    pub fn repeated(&mut self, name: &str, values: &[String]) -> &mut Self {
        if !values.is_empty() {
            self.entries
                .insert(name.to_string(), ParamValue::List(values.to_vec()));
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries.get(name)
    }

    /// The rendered text of a single-valued parameter.
    pub fn text_of(&self, name: &str) -> Option<String> {
        match self.entries.get(name)? {
            ParamValue::Text(text) => Some(text.clone()),
            ParamValue::Flag(flag) => Some(flag.to_string()),
            ParamValue::List(_) => None,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// URL query pairs. Flags render as `"true"`/`"false"`.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.entries.len());
        for (name, value) in &self.entries {
            match value {
                ParamValue::Text(text) => pairs.push((name.clone(), text.clone())),
                ParamValue::Flag(flag) => pairs.push((name.clone(), flag.to_string())),
                ParamValue::List(items) => {
                    pairs.extend(items.iter().map(|item| (name.clone(), item.clone())))
                }
            }
        }
        pairs
    }

    /// JSON object for POST bodies. Flags stay JSON booleans.
    pub fn to_json(&self) -> Value {
        let fields: Map<String, Value> = self
            .entries
            .iter()
            .map(|(name, value)| {
                let value = match value {
                    ParamValue::Text(text) => Value::String(text.clone()),
                    ParamValue::Flag(flag) => Value::Bool(*flag),
                    ParamValue::List(items) => json!(items),
                };
                (name.clone(), value)
            })
            .collect();
        Value::Object(fields)
    }
}

//=========================================================================================
// Facet helpers
//=========================================================================================

/// The values of a multi-select facet that actually filter: `None` when nothing is
/// selected or the sentinel is.
pub fn active_selection(values: &[String]) -> Option<&[String]> {
    if values.is_empty() || values.iter().any(|v| v == SENTINEL_ALL) {
        None
    } else {
        Some(values)
    }
}

/// Collapses a `"true"`/`"false"`/`''` selection. The sentinel, or both values
/// selected at once, means no filter.
pub fn resolve_tri_state(values: &[String]) -> Option<bool> {
    let has = |needle: &str| values.iter().any(|v| v == needle);
    if has(SENTINEL_ALL) {
        return None;
    }
    match (has("true"), has("false")) {
        (true, false) => Some(true),
        (false, true) => Some(false),
        _ => None,
    }
}

//=========================================================================================
// Report family (preview / count / export / skills jobs)
//=========================================================================================

/// The shared filter translation of the reports endpoints.
pub fn report_params(filters: &ReportFilters, shape: EndpointShape) -> QueryParams {
    let mut params = QueryParams::new();
    params
        .window(&filters.window)
        .text("search_position_query", filters.selected_position.as_deref())
        .facet("employer_names", &filters.selected_companies, shape)
        .facet("publishers", &filters.selected_publishers, shape)
        .facet("seniority_levels", &filters.selected_seniority, shape)
        .facet("employment_types", &filters.selected_employment_types, shape)
        .facet("cities", &filters.selected_cities, shape)
        .facet("states", &filters.selected_states, shape)
        .facet("skills", &filters.selected_skills, shape)
        .flag("job_is_remote", resolve_tri_state(&filters.selected_remote_types))
        .flag("is_direct", resolve_tri_state(&filters.selected_direct_types));
    params
}

/// `{"filters": {...}, "max_records": N}` for the count and export endpoints.
pub fn report_body(filters: &ReportFilters, max_records: u64) -> Value {
    json!({
        "filters": report_params(filters, EndpointShape::Body).to_json(),
        "max_records": max_records,
    })
}

pub fn preview_params(filters: &ReportFilters, limit: u64) -> QueryParams {
    let mut params = report_params(filters, EndpointShape::Query);
    params.number("limit", limit);
    params
}

//=========================================================================================
// Dashboard endpoint families
//=========================================================================================

/// Only the position; used by every option-list endpoint.
pub fn position_params(search_position_query: Option<&str>) -> QueryParams {
    let mut params = QueryParams::new();
    params.text("search_position_query", search_position_query);
    params
}

/// Position plus the model's dates, for `/api/dashboard/locations`.
pub fn locations_params(search_position_query: Option<&str>, window: &DateWindow) -> QueryParams {
    let mut params = position_params(search_position_query);
    params.window(window);
    params
}

/// Which limit parameters a publishers endpoint takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublisherLimits {
    None,
    Limit,
    Matrix,
}

pub fn publishers_params(filters: &PublishersFilters, limits: PublisherLimits) -> QueryParams {
    let mut params = QueryParams::new();
    match limits {
        PublisherLimits::None => {}
        PublisherLimits::Limit => {
            params.number("limit", filters.limit.into());
        }
        PublisherLimits::Matrix => {
            params
                .number("limit_publishers", filters.limit_publishers.into())
                .number("limit_companies", filters.limit_companies.into());
        }
    }
    params
        .window(&filters.window)
        .text("publisher", filters.publisher.as_deref())
        .text("seniority", filters.seniority.as_deref())
        .text("employer_name", filters.company.as_deref())
        .flag("job_is_remote", filters.remote)
        .text("search_position_query", filters.search_position_query.as_deref());
    params
}

/// `/api/dashboard/jobs` for one comparison window.
pub fn dashboard_jobs_params(filters: &DashboardFilters, range: DateRange) -> QueryParams {
    let mut params = QueryParams::new();
    params
        .number("limit", 1000)
        .number("offset", 0)
        .range(range)
        .text("job_city", filters.job_city.as_deref())
        .text("job_state", filters.job_state.as_deref())
        .flag("job_is_remote", filters.job_is_remote)
        .text("search_position_query", filters.search_position_query.as_deref());
    params
}

pub fn trending_params(filters: &TrendingFilters, range: DateRange, limit: u64) -> QueryParams {
    let mut params = QueryParams::new();
    params
        .number("limit", limit)
        .text("search_position_query", filters.search_position_query.as_deref())
        .range(range)
        .text("seniority", filters.seniority());
    params
}

fn unless_all(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| *v != COMPANIES_ALL)
}

pub fn companies_params(
    filters: &CompaniesFilters,
    range: DateRange,
    limit: Option<u64>,
) -> QueryParams {
    let mut params = QueryParams::new();
    if let Some(limit) = limit {
        params.number("limit", limit);
    }
    params
        .text("search_position_query", filters.search_position_query.as_deref())
        .range(range)
        .text("employer_name", unless_all(&filters.employer_name))
        .flag("job_is_remote", filters.job_is_remote)
        .text("seniority", unless_all(&filters.seniority));
    params
}
