//! Reward crediting with local-first writes and best-effort remote sync.
//!
//! Every operation follows the same order:
//!   1. compute the updated profile and return it to the caller,
//!   2. write it through the session store (failure is logged),
//!   3. unless the user is a demo account or no backend is configured,
//!      spawn a detached task that calls the backend once per action.
//!
//! Step 3 never blocks or reorders local state and its errors are only
//! logged. Nothing in this module returns an error to the caller.
//!
//! The steps are also exposed separately (`credited`/`renamed`, `persist`,
//! `sync_*`) so a caller can update its own state under a lock and do the
//! store and network work after releasing it.

use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;

use crate::logging::{self, Component};
use crate::model::UserProfile;
use crate::rewards::session::SessionStore;
use crate::sync::RemoteSync;

/// Account id of the built-in demo user, which never syncs remotely.
pub const DEFAULT_DEMO_ACCOUNT: &str = "demo_user_nisa";

pub struct RewardLedger {
    sessions: SessionStore,
    remote: Option<Arc<dyn RemoteSync>>,
    demo_accounts: Vec<String>,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl RewardLedger {
    /// Local-only ledger.
    pub fn new(sessions: SessionStore) -> Self {
        Self {
            sessions,
            remote: None,
            demo_accounts: vec![DEFAULT_DEMO_ACCOUNT.to_string()],
            pending: Mutex::new(Vec::new()),
        }
    }

    pub fn with_remote(mut self, remote: Arc<dyn RemoteSync>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn with_demo_accounts(mut self, demo_accounts: Vec<String>) -> Self {
        self.demo_accounts = demo_accounts;
        self
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn is_demo_account(&self, user_id: &str) -> bool {
        self.demo_accounts.iter().any(|id| id == user_id)
    }

    /// Profile after a refill credit of `amount` points and one feeding.
    pub fn credited(user: &UserProfile, amount: u64) -> UserProfile {
        UserProfile {
            points: user.points.saturating_add(amount),
            total_feedings: user.total_feedings.saturating_add(1),
            ..user.clone()
        }
    }

    /// Profile with a trimmed display name, or `None` for a blank name.
    pub fn renamed(user: &UserProfile, new_name: &str) -> Option<UserProfile> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return None;
        }
        Some(UserProfile {
            display_name: new_name.to_string(),
            ..user.clone()
        })
    }

    /// Credits a refill: `amount` points and one feeding.
    pub fn credit_refill(&self, user: &UserProfile, station_id: &str, amount: u64) -> UserProfile {
        let updated = Self::credited(user, amount);
        self.persist(&updated);
        self.sync_refill(&updated, station_id, amount);
        updated
    }

    /// Changes the display name. A blank name leaves the profile unchanged.
    pub fn rename_user(&self, user: &UserProfile, new_name: &str) -> UserProfile {
        match Self::renamed(user, new_name) {
            Some(updated) => {
                self.persist(&updated);
                self.sync_rename(&updated);
                updated
            }
            None => {
                logging::debug(Component::Rewards, None, "ignoring blank display name");
                user.clone()
            }
        }
    }

    /// Logs an applied refill credit and pushes it to the remote backend.
    /// `updated` is the profile after [`RewardLedger::credited`].
    pub fn sync_refill(&self, updated: &UserProfile, station_id: &str, amount: u64) {
        logging::info(
            Component::Rewards,
            Some(station_id),
            &format!(
                "{} earned {} points ({} total, {} feedings)",
                updated.id, amount, updated.points, updated.total_feedings
            ),
        );

        if let Some(remote) = self.remote_for(&updated.id) {
            let user_id = updated.id.clone();
            self.spawn_sync(async move {
                if let Err(e) = remote.increment_points(&user_id, amount).await {
                    logging::log_sync_failure(&user_id, "increment_points", &e);
                }
                if let Err(e) = remote.increment_feedings(&user_id, 1).await {
                    logging::log_sync_failure(&user_id, "increment_feedings", &e);
                }
            });
        }
    }

    /// Pushes an applied display name change to the remote backend.
    pub fn sync_rename(&self, updated: &UserProfile) {
        if let Some(remote) = self.remote_for(&updated.id) {
            let user_id = updated.id.clone();
            let display_name = updated.display_name.clone();
            self.spawn_sync(async move {
                if let Err(e) = remote.set_display_name(&user_id, &display_name).await {
                    logging::log_sync_failure(&user_id, "set_display_name", &e);
                }
            });
        }
    }

    /// Writes `user` through the session store. Failure is logged only.
    pub fn persist(&self, user: &UserProfile) {
        if let Err(e) = self.sessions.save(user) {
            logging::warn(
                Component::Store,
                None,
                &format!("failed to persist session for {}: {}", user.id, e),
            );
        }
    }

    /// Waits for every sync task spawned so far. Used on shutdown.
    pub async fn flush_pending(&self) {
        let tasks = {
            let mut pending = self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            std::mem::take(&mut *pending)
        };
        for task in tasks {
            if let Err(e) = task.await {
                logging::warn(Component::Sync, None, &format!("sync task aborted: {}", e));
            }
        }
    }

    /// Number of sync tasks not yet known to be finished.
    pub fn pending_syncs(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .filter(|task| !task.is_finished())
            .count()
    }

    fn remote_for(&self, user_id: &str) -> Option<Arc<dyn RemoteSync>> {
        if self.is_demo_account(user_id) {
            return None;
        }
        self.remote.clone()
    }

    fn spawn_sync<F>(&self, sync: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let task = handle.spawn(sync);
                let mut pending = self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                pending.retain(|t| !t.is_finished());
                pending.push(task);
            }
            Err(_) => logging::warn(
                Component::Sync,
                None,
                "no async runtime available; remote sync skipped, kept local state",
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
