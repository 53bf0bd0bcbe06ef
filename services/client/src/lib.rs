pub mod adapters;
pub mod config;
pub mod context;
pub mod error;

pub use config::Config;
pub use context::DashboardContext;
pub use error::ClientError;
