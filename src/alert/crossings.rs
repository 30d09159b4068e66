//! Downward threshold-crossing detection.
//!
//! A station alerts when it *crosses* a boundary during a tick, never merely
//! for sitting below one. Comparing the levels immediately before and after
//! the same tick is what makes each alert fire once per crossing: a station
//! hovering inside a band produces nothing until it is refilled above the
//! boundary and drops through it again.

use crate::alert::thresholds::{EMPTY_LEVEL, GREEN_THRESHOLD, RED_THRESHOLD};
use crate::model::{NotificationKind, Station};

/// One boundary crossed by one station in one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossingEvent {
    pub station_id: String,
    pub station_name: String,
    pub kind: NotificationKind,
}

/// Returns the kinds of boundaries crossed going from `before` to `after`,
/// in ascending severity.
///
/// The three checks are independent, so a steep drop (75 → 0) yields all
/// three. No assumption is made about the size of the drop. Upward moves
/// never yield anything.
pub fn crossings_between(before: u8, after: u8) -> Vec<NotificationKind> {
    let mut kinds = Vec::new();

    if after < GREEN_THRESHOLD && before >= GREEN_THRESHOLD {
        kinds.push(NotificationKind::Warning);
    }
    if after < RED_THRESHOLD && before >= RED_THRESHOLD {
        kinds.push(NotificationKind::Critical);
    }
    if after == EMPTY_LEVEL && before > EMPTY_LEVEL {
        kinds.push(NotificationKind::Emergency);
    }

    kinds
}

/// Compares two observations of the same station and returns one event per
/// boundary crossed. Name and id are taken from `after`.
pub fn detect_crossings(before: &Station, after: &Station) -> Vec<CrossingEvent> {
    crossings_between(before.fill_level(), after.fill_level())
        .into_iter()
        .map(|kind| CrossingEvent {
            station_id: after.id.clone(),
            station_name: after.name.clone(),
            kind,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
