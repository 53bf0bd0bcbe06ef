//! crates/jobs_dashboard_core/src/stores/cells.rs
//!
//! The mutable filter model and selected entity a store owns, each persisted on every
//! change through the domain's `PersistencePort`.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tracing::debug;

use super::{lock, StoreError};
use crate::filters::{merge_fields, FilterModel};
use crate::period::{DateWindow, Period, PeriodSelection};
use crate::persistence::PersistencePort;
use crate::ports::{Clock, KeyValueStore};

//=========================================================================================
// FilterCell
//=========================================================================================

pub struct FilterCell<F: FilterModel> {
    model: Mutex<F>,
    persistence: PersistencePort,
    clock: Arc<dyn Clock>,
}

impl<F: FilterModel> FilterCell<F> {
    pub fn new(storage: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            model: Mutex::new(F::default()),
            persistence: PersistencePort::new(storage, F::DOMAIN),
            clock,
        }
    }

    /// A snapshot of the current model.
    pub fn get(&self) -> F {
        lock(&self.model).clone()
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn persistence(&self) -> &PersistencePort {
        &self.persistence
    }

    /// Presets recompute both dates from today; an explicit window is copied as is.
    pub fn set_period(&self, selection: impl Into<PeriodSelection>) {
        let today = self.clock.today();
        let mut model = lock(&self.model);
        match selection.into() {
            PeriodSelection::Tag(tag) => {
                apply_preset::<F>(model.window_mut(), Period::from_tag(&tag), today)
            }
            PeriodSelection::Preset(period) => apply_preset::<F>(model.window_mut(), period, today),
            PeriodSelection::Explicit(window) => *model.window_mut() = window,
        }
        debug!(domain = %F::DOMAIN, period = %model.window().period, "Period set");
        self.persistence.persist(&*model);
    }

    /// Shallow merge of a JSON object over the model. On error the model is untouched.
    pub fn set_filters(&self, patch: Value) -> Result<(), StoreError> {
        let Value::Object(mut patch) = patch else {
            return Err(StoreError::PatchNotObject);
        };
        F::normalize_patch(&mut patch, self.clock.today());
        let mut model = lock(&self.model);
        *model = merge_fields(&*model, &patch)?;
        self.persistence.persist(&*model);
        Ok(())
    }

    pub fn update(&self, change: impl FnOnce(&mut F)) {
        let mut model = lock(&self.model);
        change(&mut model);
        self.persistence.persist(&*model);
    }

    /// Fills a missing date range with the trailing 30 days, then lets persisted
    /// values win. Safe to call repeatedly.
    pub fn initialize_with_defaults(&self) {
        let today = self.clock.today();
        let mut model = lock(&self.model);
        if !model.window().is_complete() {
            model.window_mut().apply(Period::Last30Days, today);
        }
        *model = self.persistence.load(&*model);
    }

    /// Back to the domain defaults, in memory only.
    pub fn reset(&self) {
        *lock(&self.model) = F::default();
    }
}

fn apply_preset<F: FilterModel>(window: &mut DateWindow, period: Period, today: NaiveDate) {
    let period = match period {
        Period::Last60Days if !F::SUPPORTS_LAST_60_DAYS => Period::Last30Days,
        other => other,
    };
    window.apply(period, today);
}

//=========================================================================================
// SelectionCell
//=========================================================================================

/// The entity the user drilled into, persisted under the domain's selection key.
pub struct SelectionCell<T> {
    value: Mutex<Option<T>>,
    persistence: PersistencePort,
}

impl<T: Clone + Serialize + DeserializeOwned> SelectionCell<T> {
    pub fn new(persistence: PersistencePort) -> Self {
        Self {
            value: Mutex::new(None),
            persistence,
        }
    }

    pub fn get(&self) -> Option<T> {
        lock(&self.value).clone()
    }

    /// `None` clears the selection and its stored entry.
    pub fn set(&self, value: Option<T>) {
        self.persistence.persist_selected(value.as_ref());
        *lock(&self.value) = value;
    }

    pub fn load(&self) {
        if let Some(value) = self.persistence.load_selected() {
            *lock(&self.value) = Some(value);
        }
    }

    pub fn reset(&self) {
        *lock(&self.value) = None;
    }
}

//=========================================================================================
// FilteredStore
//=========================================================================================

/// The filter operations every store exposes, delegated to its `FilterCell`.
pub trait FilteredStore {
    type Filters: FilterModel;

    fn filter_cell(&self) -> &FilterCell<Self::Filters>;

    fn filters(&self) -> Self::Filters {
        self.filter_cell().get()
    }

    fn set_period(&self, selection: impl Into<PeriodSelection>) {
        self.filter_cell().set_period(selection)
    }

    fn set_filters(&self, patch: Value) -> Result<(), StoreError> {
        self.filter_cell().set_filters(patch)
    }

    fn update_filters(&self, change: impl FnOnce(&mut Self::Filters)) {
        self.filter_cell().update(change)
    }

    fn initialize_with_defaults(&self) {
        self.filter_cell().initialize_with_defaults();
        self.load_selection();
    }

    /// Stores with a selected entity reload it here.
    fn load_selection(&self) {}

    /// Drops in-memory filters (and selection) after a session change.
    fn reset_session_state(&self) {
        self.filter_cell().reset();
    }
}
