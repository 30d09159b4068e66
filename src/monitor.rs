/// Application controller: owns the live station collection and the
/// notification feed, runs the decay timer, and routes manual refills to the
/// reward ledger.
///
/// # Atomicity
/// All mutable state sits in one `MonitorState` behind a mutex. A tick
/// builds the next station collection from the current one and swaps it in
/// while holding the lock, so manual refills are serialized against ticks
/// and readers only ever see whole snapshots. The lock is never held across
/// an `.await` or a session store write; writes are serialized on their own
/// lock and always save the latest profile.
///
/// # Clock injection
/// `tick_at` and `manual_refill_at` take `now` explicitly; the timer loop
/// and the plain wrappers pass `Utc::now()`.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::alert::notifications::NotificationFeed;
use crate::logging::{self, Component};
use crate::model::{Notification, Station, UserProfile};
use crate::rewards::RewardLedger;
use crate::simulation::decay::{self, DecaySource};
use crate::stations::{self, StatusSummary};

#[derive(Debug, Error, PartialEq)]
pub enum MonitorError {
    #[error("unknown station: {0}")]
    UnknownStation(String),
}

/// What the UI layer observes after every state change.
#[derive(Debug, Clone)]
pub struct MonitorSnapshot {
    /// Number of ticks completed so far.
    pub tick_seq: u64,
    pub stations: Arc<Vec<Station>>,
    pub summary: StatusSummary,
    pub unread_notifications: usize,
}

/// Result of a manual refill.
#[derive(Debug, Clone, PartialEq)]
pub struct RefillOutcome {
    pub station: Station,
    /// Updated profile, or `None` when nobody is signed in.
    pub user: Option<UserProfile>,
}

/// Result of one tick as seen by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub tick_seq: u64,
    pub decayed: usize,
    pub notifications: Vec<Notification>,
}

struct MonitorState {
    stations: Arc<Vec<Station>>,
    feed: NotificationFeed,
    user: Option<UserProfile>,
    decay: Box<dyn DecaySource>,
    tick_seq: u64,
}

#[derive(Clone)]
pub struct Monitor {
    state: Arc<Mutex<MonitorState>>,
    ledger: Arc<RewardLedger>,
    persist_lock: Arc<Mutex<()>>,
    refill_reward: u64,
    snapshots: Arc<watch::Sender<MonitorSnapshot>>,
}

impl Monitor {
    pub fn new(
        stations: Vec<Station>,
        decay: Box<dyn DecaySource>,
        ledger: RewardLedger,
        refill_reward: u64,
    ) -> Self {
        let stations = Arc::new(stations);
        let (snapshots, _) = watch::channel(MonitorSnapshot {
            tick_seq: 0,
            summary: stations::summarize(&stations),
            stations: stations.clone(),
            unread_notifications: 0,
        });

        Self {
            state: Arc::new(Mutex::new(MonitorState {
                stations,
                feed: NotificationFeed::new(),
                user: None,
                decay,
                tick_seq: 0,
            })),
            ledger: Arc::new(ledger),
            persist_lock: Arc::new(Mutex::new(())),
            refill_reward,
            snapshots: Arc::new(snapshots),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MonitorState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish(&self, state: &MonitorState) {
        self.snapshots.send_replace(MonitorSnapshot {
            tick_seq: state.tick_seq,
            stations: state.stations.clone(),
            summary: stations::summarize(&state.stations),
            unread_notifications: state.feed.unread_count(),
        });
    }

    /// Saves whichever profile is signed in when the write lock is acquired,
    /// so concurrent updates can never leave an older profile on disk.
    fn persist_current_user(&self) {
        let _serial = self.persist_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(user) = self.current_user() {
            self.ledger.persist(&user);
        }
    }

    pub fn ledger(&self) -> &RewardLedger {
        &self.ledger
    }

    // --- Session ------------------------------------------------------------

    pub fn sign_in(&self, user: UserProfile) {
        logging::info(Component::System, None, &format!("{} signed in", user.id));
        self.lock().user = Some(user);
        self.persist_current_user();
    }

    pub fn sign_out(&self) {
        let _serial = self.persist_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        self.lock().user = None;
        if let Err(e) = self.ledger.sessions().clear() {
            logging::warn(Component::Store, None, &format!("failed to clear session: {}", e));
        }
    }

    pub fn current_user(&self) -> Option<UserProfile> {
        self.lock().user.clone()
    }

    // --- Reads --------------------------------------------------------------

    /// The current station collection. Cheap: shares the snapshot.
    pub fn stations(&self) -> Arc<Vec<Station>> {
        self.lock().stations.clone()
    }

    pub fn station(&self, id: &str) -> Option<Station> {
        stations::find_station(&self.lock().stations, id).cloned()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.lock().feed.to_vec()
    }

    pub fn unread_count(&self) -> usize {
        self.lock().feed.unread_count()
    }

    pub fn tick_seq(&self) -> u64 {
        self.lock().tick_seq
    }

    pub fn subscribe(&self) -> watch::Receiver<MonitorSnapshot> {
        self.snapshots.subscribe()
    }

    // --- Notification actions ------------------------------------------------

    pub fn mark_notification_read(&self, id: &str) -> bool {
        let mut state = self.lock();
        let found = state.feed.mark_as_read(id);
        if found {
            self.publish(&state);
        }
        found
    }

    pub fn clear_notifications(&self) {
        let mut state = self.lock();
        state.feed.clear_all();
        self.publish(&state);
    }

    // --- Decay --------------------------------------------------------------

    pub fn tick(&self) -> TickReport {
        self.tick_at(Utc::now())
    }

    /// Runs one decay tick and merges its notifications into the feed.
    pub fn tick_at(&self, now: DateTime<Utc>) -> TickReport {
        let mut state = self.lock();
        let state = &mut *state;

        let tick_seq = state.tick_seq + 1;
        let outcome = decay::tick(&state.stations, state.decay.as_mut(), tick_seq, now);

        state.stations = Arc::new(outcome.stations);
        state.tick_seq = tick_seq;
        state.feed.prepend_batch(outcome.notifications.clone());
        self.publish(state);

        for n in &outcome.notifications {
            logging::info(Component::Alerts, Some(&n.station_id), &n.message);
        }
        logging::log_tick_summary(
            tick_seq,
            state.stations.len(),
            outcome.decayed,
            outcome.notifications.len(),
        );

        TickReport {
            tick_seq,
            decayed: outcome.decayed,
            notifications: outcome.notifications,
        }
    }

    // --- Manual actions -----------------------------------------------------

    pub fn manual_refill(&self, station_id: &str) -> Result<RefillOutcome, MonitorError> {
        self.manual_refill_at(station_id, Utc::now())
    }

    /// Fills a station to 100% and credits the signed-in user.
    ///
    /// No notification is emitted. Crediting happens only if the station
    /// exists, and only when someone is signed in.
    pub fn manual_refill_at(
        &self,
        station_id: &str,
        now: DateTime<Utc>,
    ) -> Result<RefillOutcome, MonitorError> {
        let mut state = self.lock();

        let idx = state
            .stations
            .iter()
            .position(|s| s.id == station_id)
            .ok_or_else(|| MonitorError::UnknownStation(station_id.to_string()))?;

        let mut next = state.stations.as_ref().clone();
        next[idx] = next[idx].refilled(now);
        let station = next[idx].clone();
        state.stations = Arc::new(next);

        let user = state
            .user
            .as_ref()
            .map(|u| RewardLedger::credited(u, self.refill_reward));
        if let Some(updated) = &user {
            state.user = Some(updated.clone());
        }

        self.publish(&state);
        drop(state);

        logging::info(Component::Simulation, Some(station_id), "station refilled manually");
        if let Some(updated) = &user {
            self.persist_current_user();
            self.ledger.sync_refill(updated, station_id, self.refill_reward);
        }

        Ok(RefillOutcome { station, user })
    }

    /// Renames the signed-in user. Returns `None` when nobody is signed in.
    pub fn rename_user(&self, new_name: &str) -> Option<UserProfile> {
        let mut state = self.lock();
        let current = state.user.as_ref()?;
        let Some(updated) = RewardLedger::renamed(current, new_name) else {
            logging::debug(Component::Rewards, None, "ignoring blank display name");
            return Some(current.clone());
        };
        state.user = Some(updated.clone());
        drop(state);

        self.persist_current_user();
        self.ledger.sync_rename(&updated);
        Some(updated)
    }

    // --- Timer --------------------------------------------------------------

    /// Starts the decay timer on the current tokio runtime.
    ///
    /// The first tick fires one full `period` after start. The returned
    /// handle must be shut down to stop the timer.
    pub fn spawn(&self, period: Duration) -> MonitorHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let monitor = self.clone();

        let task = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut timer = tokio::time::interval_at(start, period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

            logging::info(
                Component::Simulation,
                None,
                &format!("decay timer started, every {:?}", period),
            );

            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    _ = timer.tick() => {
                        monitor.tick();
                    }
                }
            }

            logging::info(Component::Simulation, None, "decay timer stopped");
        });

        MonitorHandle {
            shutdown_tx,
            task,
            ledger: self.ledger.clone(),
        }
    }
}

/// Handle to a running decay timer.
pub struct MonitorHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
    ledger: Arc<RewardLedger>,
}

impl MonitorHandle {
    /// Stops the timer, waits for the loop to exit, then drains pending
    /// remote sync tasks.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.task.await {
            logging::error(Component::System, None, &format!("decay timer task failed: {}", e));
        }
        self.ledger.flush_pending().await;
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
