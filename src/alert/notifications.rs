//! Notification construction and the user-facing notification feed.
//!
//! # Ids
//! Notification ids are built from the crossing kind, the station id and the
//! tick sequence number (`warn_st_3_1_t12`). A station crosses a given
//! boundary at most once per tick, so ids are unique without relying on
//! wall-clock resolution.

use chrono::{DateTime, Utc};

use crate::alert::crossings::CrossingEvent;
use crate::model::{Notification, NotificationKind};

/// Fixed title for each severity.
pub fn title_for(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::Warning => "📉 Food running low",
        NotificationKind::Critical => "🚨 Critical level",
        NotificationKind::Emergency => "⚠️ Feeder empty!",
    }
}

fn message_for(kind: NotificationKind, station_name: &str) -> String {
    match kind {
        NotificationKind::Warning => format!("{} food level has started to drop.", station_name),
        NotificationKind::Critical => format!("{} fell below the critical threshold!", station_name),
        NotificationKind::Emergency => {
            format!("{} is completely empty. Refill needed urgently!", station_name)
        }
    }
}

/// Compound notification id: `<prefix>_<station id>_t<tick>`.
pub fn notification_id(kind: NotificationKind, station_id: &str, tick_seq: u64) -> String {
    format!("{}_{}_t{}", kind.id_prefix(), station_id, tick_seq)
}

/// Builds an unread notification for one crossing.
pub fn emit(
    station_id: &str,
    station_name: &str,
    kind: NotificationKind,
    tick_seq: u64,
    now: DateTime<Utc>,
) -> Notification {
    Notification {
        id: notification_id(kind, station_id, tick_seq),
        kind,
        title: title_for(kind).to_string(),
        message: message_for(kind, station_name),
        station_id: station_id.to_string(),
        station_name: station_name.to_string(),
        timestamp: now,
        is_read: false,
    }
}

/// Convenience wrapper over [`emit`] for detector output.
pub fn emit_for(event: &CrossingEvent, tick_seq: u64, now: DateTime<Utc>) -> Notification {
    emit(&event.station_id, &event.station_name, event.kind, tick_seq, now)
}

// ---------------------------------------------------------------------------
// Feed
// ---------------------------------------------------------------------------

/// The global notification list, most recent first.
#[derive(Debug, Clone, Default)]
pub struct NotificationFeed {
    items: Vec<Notification>,
}

impl NotificationFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts one tick's notifications at the front in a single step.
    /// Order inside the batch is kept as given (station iteration order).
    pub fn prepend_batch(&mut self, batch: Vec<Notification>) {
        if batch.is_empty() {
            return;
        }
        self.items.splice(0..0, batch);
    }

    /// Marks a notification read. Returns `false` if the id is unknown.
    pub fn mark_as_read(&mut self, id: &str) -> bool {
        match self.items.iter_mut().find(|n| n.id == id) {
            Some(notification) => {
                notification.is_read = true;
                true
            }
            None => false,
        }
    }

    pub fn clear_all(&mut self) {
        self.items.clear();
    }

    pub fn unread_count(&self) -> usize {
        self.items.iter().filter(|n| !n.is_read).count()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.items.iter()
    }

    pub fn to_vec(&self) -> Vec<Notification> {
        self.items.clone()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
