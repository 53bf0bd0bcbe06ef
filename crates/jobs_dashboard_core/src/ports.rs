//! crates/jobs_dashboard_core/src/ports.rs
//!
//! Defines the service contracts (traits) the dashboard stores depend on.
//! These traits form the boundary of the hexagonal architecture: the stores only see
//! an HTTP client, a durable key-value store, a download sink and a clock, never a
//! concrete `reqwest` client or file on disk.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::query::QueryParams;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (network, disk).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PortError {
    /// The collaborator rejected the request or never produced a response.
    #[error("Request failed (status {status:?}): {message}")]
    Network {
        status: Option<u16>,
        /// Human-readable message provided by the backend, if any.
        detail: Option<String>,
        message: String,
    },
    /// The response arrived but did not have the expected shape.
    #[error("Unexpected response shape: {0}")]
    Decode(String),
    /// The backend answered 401. Handled by the session layer, opaque to stores.
    #[error("Authentication expired")]
    Unauthorized,
    #[error("Storage error: {0}")]
    Storage(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

impl PortError {
    /// A transport-level failure with no backend response.
    pub fn network(message: impl Into<String>) -> Self {
        PortError::Network {
            status: None,
            detail: None,
            message: message.into(),
        }
    }

    /// Builds an error from a non-success response, extracting the backend `detail`.
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        let detail = serde_json::from_slice::<Value>(body)
            .ok()
            .and_then(|payload| detail_message(&payload));
        let message = detail
            .clone()
            .unwrap_or_else(|| String::from_utf8_lossy(body).trim().to_string());
        PortError::Network {
            status: Some(status),
            detail,
            message,
        }
    }

    /// The backend-provided detail, when the failure carried one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            PortError::Network { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    /// The message shown to the user: backend detail first, else the fixed fallback.
    pub fn user_message(&self, fallback: &str) -> String {
        self.detail()
            .filter(|detail| !detail.is_empty())
            .unwrap_or(fallback)
            .to_string()
    }
}

/// Extracts `detail` (a string, or an array of `{msg}` objects) or `message` from an
/// error body.
pub fn detail_message(payload: &Value) -> Option<String> {
    match payload.get("detail") {
        Some(Value::String(detail)) => return Some(detail.clone()),
        Some(Value::Array(items)) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            if !messages.is_empty() {
                return Some(messages.join(", "));
            }
        }
        _ => {}
    }
    payload
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
}

//=========================================================================================
// Network Port
//=========================================================================================

/// A successful response from the network collaborator.
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status: u16,
    /// Header names are stored lowercase.
    pub headers: BTreeMap<String, String>,
    pub body: Bytes,
}

impl HttpResponse {
    /// Creates a 200 response carrying a JSON payload.
    pub fn json_body(payload: &Value) -> Self {
        Self {
            status: 200,
            headers: BTreeMap::new(),
            body: Bytes::from(payload.to_string()),
        }
    }

    /// Decodes the body, mapping any mismatch to `PortError::Decode`.
    pub fn json<T: DeserializeOwned>(&self) -> PortResult<T> {
        serde_json::from_slice(&self.body).map_err(|e| PortError::Decode(e.to_string()))
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Issues a GET request with the given query parameters.
    async fn get(&self, path: &str, params: &QueryParams) -> PortResult<HttpResponse>;

    /// Issues a POST request with a JSON body.
    async fn post(&self, path: &str, body: &Value) -> PortResult<HttpResponse>;
}

//=========================================================================================
// Storage, Download and Clock Ports
//=========================================================================================

/// A durable, synchronous string-keyed store holding JSON text.
pub trait KeyValueStore: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;

    fn set_item(&self, key: &str, value: &str) -> PortResult<()>;

    fn remove_item(&self, key: &str) -> PortResult<()>;
}

/// Receives a downloaded file, e.g. the CSV export.
pub trait DownloadSink: Send + Sync {
    fn save(&self, filename: &str, contents: &[u8]) -> PortResult<()>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// The current UTC calendar date.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// The wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock pinned to one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Midnight UTC of the given date.
    pub fn on(date: NaiveDate) -> Self {
        Self(date.and_time(chrono::NaiveTime::MIN).and_utc())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
