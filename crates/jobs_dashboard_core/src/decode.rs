//! crates/jobs_dashboard_core/src/decode.rs
//!
//! Normalizes the loosely-typed fields the backend and older persisted state produce.
//! Every shape tolerated here is decoded exactly once, at ingestion, so aggregators
//! only ever see the canonical representation.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

//=========================================================================================
// Serde field helpers
//=========================================================================================

/// `null`, `""` and non-text values other than numbers/bools become `None`.
pub fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(text_of).filter(|s| !s.is_empty()))
}

/// Like `optional_text` but for required columns: a null becomes `""`.
pub fn nullable_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(text_of).unwrap_or_default())
}

/// Tri-state flag: `true`/`false`, `"true"`/`"false"`, `1`/`0`; anything else is unset.
pub fn optional_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(flag_of))
}

/// Accepts `YYYY-MM-DD` or any ISO timestamp starting with it.
pub fn optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(Value::as_str).and_then(parse_date))
}

/// Counters that may arrive as `null` or as floats.
pub fn count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().map(|f| f.max(0.0) as u64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

/// Percentages and averages that may arrive as `null`.
pub fn ratio<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    })
}

//=========================================================================================
// Value-level decoders
//=========================================================================================

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn flag_of(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        Value::String(s) => match s.trim() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let prefix = raw.trim().get(..10)?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

/// `job_is_remote` as a plain bool: only an explicit truthy value counts as remote.
pub fn remote_flag(value: &Value) -> bool {
    flag_of(value).unwrap_or(false)
}

/// Decodes `extracted_skills` from a JSON array, a JSON-encoded array string or a
/// comma-separated string. Never fails.
pub fn skill_list(value: &Value) -> Vec<String> {
    match value {
        Value::String(raw) => parse_skills(raw),
        Value::Array(items) => clean_names(items.iter().filter_map(Value::as_str)),
        _ => Vec::new(),
    }
}

/// Parses the string form of `extracted_skills`.
///
/// Malformed JSON falls back to comma splitting. Well-formed JSON that is not an
/// array carries no skills.
pub fn parse_skills(raw: &str) -> Vec<String> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(items)) => clean_names(items.iter().filter_map(Value::as_str)),
        Ok(_) => Vec::new(),
        Err(_) => clean_names(raw.split(',')),
    }
}

fn clean_names<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    names
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// The decoded form of `apply_options`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ApplyOptions {
    /// Absent or null on the wire.
    #[default]
    Missing,
    /// Present but not valid JSON; the raw text is kept so it round-trips.
    Malformed(String),
    /// Trimmed, non-empty publisher names of each option object.
    Parsed(Vec<String>),
}

impl ApplyOptions {
    pub fn decode(value: &Value) -> Self {
        match value {
            Value::Null => ApplyOptions::Missing,
            Value::String(raw) if raw.is_empty() => ApplyOptions::Missing,
            Value::String(raw) => match serde_json::from_str::<Value>(raw) {
                Ok(parsed) => ApplyOptions::Parsed(publishers_in(&parsed)),
                Err(_) => ApplyOptions::Malformed(raw.clone()),
            },
            other => ApplyOptions::Parsed(publishers_in(other)),
        }
    }

    /// Re-encodes for persistence.
    pub fn encode(&self) -> Value {
        match self {
            ApplyOptions::Missing => Value::Null,
            ApplyOptions::Malformed(raw) => Value::String(raw.clone()),
            ApplyOptions::Parsed(publishers) => Value::Array(
                publishers
                    .iter()
                    .map(|p| serde_json::json!({ "publisher": p }))
                    .collect(),
            ),
        }
    }
}

fn publishers_in(parsed: &Value) -> Vec<String> {
    match parsed {
        Value::Array(options) => clean_names(
            options
                .iter()
                .filter_map(|option| option.get("publisher").and_then(Value::as_str)),
        ),
        _ => Vec::new(),
    }
}
