//! Fill level thresholds and status classification.
//!
//! The same classifier backs station construction, decay and refill, so a
//! station's status can never drift from its fill level.

use crate::model::StationStatus;

/// Lowest fill level still considered GREEN.
pub const GREEN_THRESHOLD: u8 = 70;

/// Lowest fill level still considered YELLOW. Anything below is RED.
pub const RED_THRESHOLD: u8 = 20;

pub const FULL_LEVEL: u8 = 100;
pub const EMPTY_LEVEL: u8 = 0;

/// Clamps an arbitrary level into [0, 100].
pub fn clamp_fill_level(fill_level: i32) -> u8 {
    fill_level.clamp(i32::from(EMPTY_LEVEL), i32::from(FULL_LEVEL)) as u8
}

/// Maps a fill percentage to a station status.
///
/// Lower bounds are inclusive:
///   level >= 70       →  GREEN
///   20 <= level < 70  →  YELLOW
///   level < 20        →  RED
///
/// Out-of-range input is clamped first, so the function is total.
pub fn classify(fill_level: i32) -> StationStatus {
    let level = clamp_fill_level(fill_level);
    if level >= GREEN_THRESHOLD {
        StationStatus::Green
    } else if level >= RED_THRESHOLD {
        StationStatus::Yellow
    } else {
        StationStatus::Red
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
