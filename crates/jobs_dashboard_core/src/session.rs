//! crates/jobs_dashboard_core/src/session.rs
//!
//! Credential storage and the session transitions that wipe persisted dashboard state.

use chrono::{DateTime, TimeDelta, Utc};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::Domain;
use crate::ports::{Clock, KeyValueStore, PortResult};

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";
pub const TOKEN_EXPIRATION_KEY: &str = "tokenExpiration";

const TOKEN_LIFETIME_MINUTES: i64 = 50;
const EXPIRING_SOON_MINUTES: i64 = 5;

/// Owns the stored credentials. Every login, logout or expiry goes through here.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Stores a fresh token valid for 50 minutes. State persisted by a previous
    /// session is cleared first.
    pub fn set_token(&self, token: &str) -> PortResult<()> {
        self.clear_dashboard_state();
        let expires_at = self.clock.now() + TimeDelta::minutes(TOKEN_LIFETIME_MINUTES);
        self.store
            .set_item(TOKEN_EXPIRATION_KEY, &expires_at.timestamp_millis().to_string())?;
        self.store.set_item(TOKEN_KEY, token)?;
        info!("Session token stored");
        Ok(())
    }

    pub fn set_user(&self, user: &Value) -> PortResult<()> {
        self.store.set_item(USER_KEY, &user.to_string())
    }

    pub fn token(&self) -> Option<String> {
        self.store.get_item(TOKEN_KEY).filter(|t| !t.is_empty())
    }

    pub fn user(&self) -> Option<Value> {
        let raw = self.store.get_item(USER_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!("Ignoring corrupt stored user: {}", e);
                None
            }
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.store.get_item(TOKEN_EXPIRATION_KEY)?;
        let millis = raw.trim().parse::<i64>().ok()?;
        DateTime::from_timestamp_millis(millis)
    }

    /// Without a recorded expiration the token is never considered expired.
    pub fn is_token_expired(&self) -> bool {
        self.expires_at()
            .is_some_and(|expires_at| self.clock.now() >= expires_at)
    }

    /// True within the last five minutes of the token's lifetime.
    pub fn is_token_expiring_soon(&self) -> bool {
        self.expires_at().is_some_and(|expires_at| {
            self.clock.now() >= expires_at - TimeDelta::minutes(EXPIRING_SOON_MINUTES)
        })
    }

    /// Forgets the credentials and every persisted filter and selection.
    pub fn logout(&self) {
        info!("Logging out");
        for key in [TOKEN_KEY, USER_KEY, TOKEN_EXPIRATION_KEY] {
            self.remove(key);
        }
        self.clear_dashboard_state();
    }

    /// Called when the backend answers 401: the credentials are dropped, nothing else.
    pub fn expire(&self) {
        warn!("Authentication expired");
        self.remove(TOKEN_KEY);
        self.remove(USER_KEY);
    }

    /// Removes every `<domain>_filters` and `<domain>_selected_*` key.
    pub fn clear_dashboard_state(&self) {
        for domain in Domain::ALL {
            self.remove(&domain.filters_key());
            if let Some(key) = domain.selection_key() {
                self.remove(key);
            }
        }
    }

    fn remove(&self, key: &str) {
        if let Err(e) = self.store.remove_item(key) {
            warn!(key, "Failed to remove stored item: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use crate::ports::FixedClock;
    use chrono::TimeZone;
    use serde_json::json;

    fn session_at(now: DateTime<Utc>) -> (Arc<MemoryStore>, SessionManager) {
        let store = Arc::new(MemoryStore::new());
        let session = SessionManager::new(store.clone(), Arc::new(FixedClock(now)));
        (store, session)
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn new_token_clears_previous_dashboard_state() {
        let (store, session) = session_at(noon());
        store.set_item("vagas_filters", "{}").unwrap();
        store.set_item("skills_selected_skill", "{}").unwrap();
        store.set_item("publishers_filters", "{}").unwrap();
        session.set_token("abc").unwrap();
        assert_eq!(
            store.keys(),
            vec!["token".to_string(), "tokenExpiration".to_string()]
        );
        assert_eq!(session.expires_at(), Some(noon() + TimeDelta::minutes(50)));
        assert!(session.is_authenticated());
    }

    #[test]
    fn logout_removes_every_persisted_key() {
        let (store, session) = session_at(noon());
        session.set_token("abc").unwrap();
        session.set_user(&json!({"email": "a@b.c"})).unwrap();
        for domain in Domain::ALL {
            store.set_item(&domain.filters_key(), "{}").unwrap();
            if let Some(key) = domain.selection_key() {
                store.set_item(key, "{}").unwrap();
            }
        }
        session.logout();
        assert!(store.keys().is_empty());
        assert!(!session.is_authenticated());
    }

    #[test]
    fn expiry_windows() {
        let (store, session) = session_at(noon());
        assert!(!session.is_token_expired());
        let in_four_minutes = noon() + TimeDelta::minutes(4);
        store
            .set_item(TOKEN_EXPIRATION_KEY, &in_four_minutes.timestamp_millis().to_string())
            .unwrap();
        assert!(session.is_token_expiring_soon());
        assert!(!session.is_token_expired());
        let past = noon() - TimeDelta::seconds(1);
        store
            .set_item(TOKEN_EXPIRATION_KEY, &past.timestamp_millis().to_string())
            .unwrap();
        assert!(session.is_token_expired());
    }

    #[test]
    fn expire_keeps_dashboard_state() {
        let (store, session) = session_at(noon());
        session.set_token("abc").unwrap();
        session.set_user(&json!({"id": 1})).unwrap();
        store.set_item("vagas_filters", "{}").unwrap();
        session.expire();
        assert_eq!(session.token(), None);
        assert_eq!(session.user(), None);
        assert!(store.get_item("vagas_filters").is_some());
    }
}
