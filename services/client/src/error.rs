//! services/client/src/error.rs
//!
//! Defines the primary error type for the dashboard client.

use crate::config::ConfigError;
use jobs_dashboard_core::ports::PortError;
use jobs_dashboard_core::stores::StoreError;

/// The primary error type for the `client` service.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core ports.
    #[error("Port error: {0}")]
    Port(#[from] PortError),

    /// A store operation the caller asked for failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Represents an error building the HTTP client.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
