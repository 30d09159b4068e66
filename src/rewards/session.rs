//! Persistence of the active user session through a key-value store.

use std::sync::Arc;

use crate::model::UserProfile;
use crate::store::{KeyValueStore, StoreResult};

/// Key under which the active session is stored.
pub const SESSION_KEY: &str = "patimap_active_session";

#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Load the stored session, if any.
    pub fn load(&self) -> StoreResult<Option<UserProfile>> {
        match self.store.get(SESSION_KEY)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    pub fn save(&self, user: &UserProfile) -> StoreResult<()> {
        self.store.set(SESSION_KEY, &serde_json::to_string(user)?)
    }

    pub fn clear(&self) -> StoreResult<()> {
        self.store.remove(SESSION_KEY)
    }

    /// Restore the stored session for `user_id`, or start a fresh volunteer.
    ///
    /// A stored session belonging to another user, or one that cannot be
    /// read, is replaced rather than reported.
    pub fn restore_or_create(&self, user_id: &str, display_name: &str) -> UserProfile {
        match self.load() {
            Ok(Some(user)) if user.id == user_id => user,
            _ => UserProfile::new_volunteer(user_id, display_name),
        }
    }
}
