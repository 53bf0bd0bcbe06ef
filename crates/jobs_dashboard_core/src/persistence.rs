//! crates/jobs_dashboard_core/src/persistence.rs
//!
//! One persistence port for every domain: filter models and selections are stored as
//! JSON text under domain-scoped keys, stamped with a schema version.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, error, warn};

use crate::domain::Domain;
use crate::filters::{merge_fields, FilterModel};
use crate::ports::{KeyValueStore, PortResult};

pub const SCHEMA_VERSION_FIELD: &str = "schema_version";

/// Reads and writes one domain's persisted state.
#[derive(Clone)]
pub struct PersistencePort {
    store: Arc<dyn KeyValueStore>,
    domain: Domain,
}

impl PersistencePort {
    pub fn new(store: Arc<dyn KeyValueStore>, domain: Domain) -> Self {
        Self { store, domain }
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// Writes the model. Failures are logged, never returned.
    pub fn persist<F: FilterModel>(&self, model: &F) {
        let key = self.domain.filters_key();
        let mut value = match serde_json::to_value(model) {
            Ok(value) => value,
            Err(e) => {
                error!(domain = %self.domain, "Failed to serialize filters: {}", e);
                return;
            }
        };
        if let Value::Object(fields) = &mut value {
            fields.insert(SCHEMA_VERSION_FIELD.to_string(), Value::from(F::SCHEMA_VERSION));
        }
        if let Err(e) = self.store.set_item(&key, &value.to_string()) {
            error!(domain = %self.domain, "Failed to persist filters: {}", e);
        }
    }

    /// Merges the persisted model over `current`. Persisted fields win; a missing or
    /// unreadable entry yields `current` unchanged.
    pub fn load<F: FilterModel>(&self, current: &F) -> F {
        let key = self.domain.filters_key();
        let Some(raw) = self.store.get_item(&key) else {
            return current.clone();
        };
        let mut stored = match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(fields)) => fields,
            Ok(_) => {
                warn!(domain = %self.domain, "Ignoring persisted filters that are not an object");
                return current.clone();
            }
            Err(e) => {
                warn!(domain = %self.domain, "Ignoring corrupt persisted filters: {}", e);
                return current.clone();
            }
        };

        let version = stored
            .remove(SCHEMA_VERSION_FIELD)
            .and_then(|v| v.as_u64())
            .unwrap_or(1);
        let migrated = wrap_string_facets(&mut stored, F::LIST_FACETS);
        if migrated > 0 {
            debug!(
                domain = %self.domain,
                from_version = version,
                to_version = F::SCHEMA_VERSION,
                "Migrated {} single-value facet(s) to lists",
                migrated
            );
        }

        match merge_fields(current, &stored) {
            Ok(merged) => {
                debug!(domain = %self.domain, "Loaded persisted filters");
                merged
            }
            Err(e) => {
                warn!(domain = %self.domain, "Persisted filters do not fit the model: {}", e);
                current.clone()
            }
        }
    }

    /// `None` removes the stored selection instead of writing a null.
    pub fn persist_selected<T: Serialize>(&self, entity: Option<&T>) {
        let Some(key) = self.domain.selection_key() else {
            return;
        };
        let result = match entity {
            Some(entity) => match serde_json::to_string(entity) {
                Ok(text) => self.store.set_item(key, &text),
                Err(e) => {
                    error!(domain = %self.domain, "Failed to serialize selection: {}", e);
                    return;
                }
            },
            None => self.store.remove_item(key),
        };
        if let Err(e) = result {
            error!(domain = %self.domain, "Failed to persist selection: {}", e);
        }
    }

    pub fn load_selected<T: DeserializeOwned>(&self) -> Option<T> {
        let key = self.domain.selection_key()?;
        let raw = self.store.get_item(key)?;
        match serde_json::from_str(&raw) {
            Ok(entity) => {
                debug!(domain = %self.domain, "Loaded persisted selection");
                Some(entity)
            }
            Err(e) => {
                warn!(domain = %self.domain, "Ignoring corrupt persisted selection: {}", e);
                None
            }
        }
    }
}

/// Legacy shape: a list facet stored as one string. `""` becomes an empty list.
pub fn wrap_string_facets(stored: &mut Map<String, Value>, list_facets: &[&str]) -> usize {
    let mut migrated = 0;
    for name in list_facets {
        let Some(value) = stored.get_mut(*name) else {
            continue;
        };
        let replacement = match value {
            Value::String(single) if !single.is_empty() => {
                Some(Value::Array(vec![Value::String(std::mem::take(single))]))
            }
            Value::String(_) | Value::Null => Some(Value::Array(Vec::new())),
            _ => None,
        };
        if let Some(replacement) = replacement {
            *value = replacement;
            migrated += 1;
        }
    }
    migrated
}

//=========================================================================================
// In-memory store
//=========================================================================================

/// A `KeyValueStore` backed by a map; used in tests and when no file is configured.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> Vec<String> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> PortResult<()> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> PortResult<()> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{JobRow, SkillCount};
    use crate::filters::{ReportFilters, SkillsFilters, VagasFilters};
    use crate::period::{DateWindow, Period};
    use chrono::NaiveDate;
    use serde_json::json;

    fn port(domain: Domain) -> (Arc<MemoryStore>, PersistencePort) {
        let store = Arc::new(MemoryStore::new());
        (store.clone(), PersistencePort::new(store, domain))
    }

    #[test]
    fn persist_then_load_round_trips() {
        let (store, port) = port(Domain::Skills);
        let model = SkillsFilters {
            search_position_query: Some("Data Engineer".into()),
            skills: vec!["Go".into(), "SQL".into()],
            job_is_remote: Some(true),
            seniority: None,
            window: DateWindow {
                date_from: NaiveDate::from_ymd_opt(2025, 1, 1),
                date_to: NaiveDate::from_ymd_opt(2025, 1, 31),
                period: Period::Custom,
            },
        };
        port.persist(&model);
        let stored: Value = serde_json::from_str(&store.get_item("skills_filters").unwrap()).unwrap();
        assert_eq!(stored["schema_version"], json!(2));
        assert_eq!(port.load(&SkillsFilters::default()), model);
    }

    #[test]
    fn legacy_string_facet_becomes_a_list() {
        let (store, port) = port(Domain::Skills);
        store
            .set_item("skills_filters", r#"{"skills":"Python","seniority":"Senior"}"#)
            .unwrap();
        let loaded = port.load(&SkillsFilters::default());
        assert_eq!(loaded.skills, vec!["Python"]);
        assert_eq!(loaded.seniority.as_deref(), Some("Senior"));

        store.set_item("skills_filters", r#"{"skills":""}"#).unwrap();
        assert!(port.load(&SkillsFilters::default()).skills.is_empty());
    }

    #[test]
    fn report_lists_are_migrated_too() {
        let (store, port) = port(Domain::Reports);
        store
            .set_item("reports_filters", r#"{"selectedCities":"Recife","selectedStates":null}"#)
            .unwrap();
        let loaded = port.load(&ReportFilters::default());
        assert_eq!(loaded.selected_cities, vec!["Recife"]);
        assert!(loaded.selected_states.is_empty());
    }

    #[test]
    fn corrupt_entry_leaves_model_unchanged() {
        let (store, port) = port(Domain::Vagas);
        let current = VagasFilters {
            seniority: Some("Lead".into()),
            ..VagasFilters::default()
        };
        store.set_item("vagas_filters", "{not json").unwrap();
        assert_eq!(port.load(&current), current);
        store.set_item("vagas_filters", "[1,2]").unwrap();
        assert_eq!(port.load(&current), current);
    }

    #[test]
    fn clearing_selection_removes_key() {
        let (store, port) = port(Domain::Skills);
        let skill = SkillCount { skill_name: "Go".into(), job_count: 3 };
        port.persist_selected(Some(&skill));
        assert_eq!(port.load_selected::<SkillCount>(), Some(skill));
        port.persist_selected::<SkillCount>(None);
        assert_eq!(store.get_item("skills_selected_skill"), None);
        assert_eq!(port.load_selected::<SkillCount>(), None);
    }

    #[test]
    fn corrupt_selection_is_ignored() {
        let (store, port) = port(Domain::Vagas);
        store.set_item("vagas_selected_job", "oops").unwrap();
        assert_eq!(port.load_selected::<JobRow>(), None);
    }
}
