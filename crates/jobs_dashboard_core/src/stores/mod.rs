//! crates/jobs_dashboard_core/src/stores/mod.rs
//!
//! The per-domain stores. Each owns its filter model, its result slots and its
//! persisted keys; none of them share mutable state.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::warn;

use crate::domain::Location;
use crate::endpoints;
use crate::period::DateWindow;
use crate::ports::{Clock, HttpClient, KeyValueStore, PortResult};
use crate::query::{locations_params, QueryParams};

mod cells;
pub mod companies;
pub mod dashboard;
pub mod empresas;
pub mod publishers;
pub mod reports;
pub mod skills;
pub mod trending;
pub mod vagas;

#[cfg(test)]
pub(crate) mod testing;

pub use cells::{FilterCell, FilteredStore, SelectionCell};
pub use companies::CompaniesStore;
pub use dashboard::{DashboardStore, DashboardView};
pub use empresas::EmpresasStore;
pub use publishers::PublishersStore;
pub use reports::{ReportScope, ReportsStore};
pub use skills::SkillsStore;
pub use trending::TrendingStore;
pub use vagas::VagasStore;

//=========================================================================================
// Errors
//=========================================================================================

/// Errors returned to the caller. Background fetches never produce one; their failures
/// land in the slot's `error` instead.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Invalid filter patch: {0}")]
    InvalidPatch(#[from] serde_json::Error),
    #[error("Filter patch must be a JSON object")]
    PatchNotObject,
    #[error("{0}")]
    Request(String),
}

//=========================================================================================
// Shared Ports
//=========================================================================================

/// The collaborators every store is built from.
#[derive(Clone)]
pub struct StorePorts {
    pub http: Arc<dyn HttpClient>,
    pub storage: Arc<dyn KeyValueStore>,
    pub clock: Arc<dyn Clock>,
}

//=========================================================================================
// Result Slots
//=========================================================================================

/// One independently fetched result set.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Slot<T> {
    pub data: T,
    pub loading: bool,
    pub error: Option<String>,
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Runs its closure when dropped, including when the owning future is dropped mid-await.
struct OnDrop<F: FnMut()>(F);

impl<F: FnMut()> Drop for OnDrop<F> {
    fn drop(&mut self) {
        (self.0)()
    }
}

/// Drives one slot through a fetch: `loading` is raised and `error` cleared, the
/// payload is stored on success, and on failure the backend detail (or `fallback`)
/// becomes the slot's error. `loading` is lowered on every path.
///
/// Returns whether the fetch succeeded.
pub(crate) async fn track<S, T, Sel, Fut>(
    state: &Mutex<S>,
    select: Sel,
    fallback: &str,
    fetch: Fut,
) -> bool
where
    Sel: Fn(&mut S) -> &mut Slot<T>,
    Fut: Future<Output = PortResult<T>>,
{
    {
        let mut guard = lock(state);
        let slot = select(&mut guard);
        slot.loading = true;
        slot.error = None;
    }
    let _loading = OnDrop(|| select(&mut lock(state)).loading = false);

    match fetch.await {
        Ok(data) => {
            select(&mut lock(state)).data = data;
            true
        }
        Err(e) => {
            warn!("{}: {}", fallback, e);
            select(&mut lock(state)).error = Some(e.user_message(fallback));
            false
        }
    }
}

//=========================================================================================
// Request Helpers
//=========================================================================================

pub(crate) async fn get_json<T: DeserializeOwned>(
    http: &dyn HttpClient,
    path: &str,
    params: &QueryParams,
) -> PortResult<T> {
    http.get(path, params).await?.json()
}

/// A list endpoint. A `null` payload is read as an empty list.
pub(crate) async fn get_list<T: DeserializeOwned>(
    http: &dyn HttpClient,
    path: &str,
    params: &QueryParams,
) -> PortResult<Vec<T>> {
    let list: Option<Vec<T>> = get_json(http, path, params).await?;
    Ok(list.unwrap_or_default())
}

/// An option list that must never fail the caller: any error is logged and `fallback`
/// produces the list instead.
pub(crate) async fn option_list(
    http: &dyn HttpClient,
    path: &str,
    params: &QueryParams,
    fallback: impl FnOnce() -> Vec<String>,
) -> Vec<String> {
    match get_list::<String>(http, path, params).await {
        Ok(list) => list,
        Err(e) => {
            warn!(path, "Option list unavailable, using fallback: {}", e);
            fallback()
        }
    }
}

/// City/state pairs with jobs for the position and window; empty when unavailable.
pub(crate) async fn filtered_locations(
    http: &dyn HttpClient,
    search_position_query: Option<&str>,
    window: &DateWindow,
) -> Vec<Location> {
    let params = locations_params(search_position_query, window);
    match get_list(http, endpoints::LOCATIONS, &params).await {
        Ok(locations) => locations,
        Err(e) => {
            warn!("Failed to fetch filtered locations: {}", e);
            Vec::new()
        }
    }
}
