/// Core data types for the feeding-station monitoring service.
///
/// This module defines the shared domain model imported by all other modules.
/// Apart from keeping a station's status in step with its fill level it
/// contains no logic and no I/O.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::alert::thresholds::{FULL_LEVEL, classify, clamp_fill_level};

// ---------------------------------------------------------------------------
// Station types
// ---------------------------------------------------------------------------

/// Three-level station status derived from the fill level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StationStatus {
    /// Fill level >= 70%.
    Green,
    /// Fill level in [20%, 70%).
    Yellow,
    /// Fill level < 20%.
    Red,
}

impl std::fmt::Display for StationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StationStatus::Green => write!(f, "GREEN"),
            StationStatus::Yellow => write!(f, "YELLOW"),
            StationStatus::Red => write!(f, "RED"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnimalType {
    Cat,
    Dog,
}

/// WGS84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// A seed record as supplied by the station generator or a seed file.
///
/// `fill_level` is accepted as a signed integer so malformed seed files can
/// be clamped instead of rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationSeed {
    pub id: String,
    pub name: String,
    pub city: String,
    pub location: GeoPoint,
    #[serde(default)]
    pub address: String,
    pub fill_level: i32,
    pub animal: AnimalType,
}

/// A feeding station and its live fill level.
///
/// `status` is private: every path that changes `fill_level` goes through
/// [`Station::with_fill_level`], which recomputes it with
/// [`classify`], so `status == classify(fill_level)` always holds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Station {
    pub id: String,
    pub name: String,
    pub city: String,
    pub location: GeoPoint,
    pub address: String,
    pub animal: AnimalType,
    fill_level: u8,
    status: StationStatus,
    last_updated: DateTime<Utc>,
}

impl Station {
    /// Builds a station from seed data, clamping the fill level to [0, 100].
    pub fn from_seed(seed: StationSeed, now: DateTime<Utc>) -> Self {
        let fill_level = clamp_fill_level(seed.fill_level);
        Self {
            id: seed.id,
            name: seed.name,
            city: seed.city,
            location: seed.location,
            address: seed.address,
            animal: seed.animal,
            fill_level,
            status: classify(i32::from(fill_level)),
            last_updated: now,
        }
    }

    pub fn fill_level(&self) -> u8 {
        self.fill_level
    }

    pub fn status(&self) -> StationStatus {
        self.status
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    pub fn is_empty(&self) -> bool {
        self.fill_level == 0
    }

    /// Returns a copy of this station at a new fill level, with the status
    /// re-derived. Out-of-range levels are clamped.
    pub fn with_fill_level(&self, fill_level: i32, now: DateTime<Utc>) -> Self {
        let fill_level = clamp_fill_level(fill_level);
        Self {
            fill_level,
            status: classify(i32::from(fill_level)),
            last_updated: now,
            ..self.clone()
        }
    }

    /// Returns a copy of this station filled to 100%.
    pub fn refilled(&self, now: DateTime<Utc>) -> Self {
        self.with_fill_level(i32::from(FULL_LEVEL), now)
    }
}

// ---------------------------------------------------------------------------
// Notification types
// ---------------------------------------------------------------------------

/// Severity of a threshold-crossing notification, in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// Dropped below the GREEN threshold.
    Warning,
    /// Dropped below the RED threshold.
    Critical,
    /// Emptied completely.
    Emergency,
}

impl NotificationKind {
    /// Short prefix used in notification ids.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            NotificationKind::Warning => "warn",
            NotificationKind::Critical => "crit",
            NotificationKind::Emergency => "empty",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationKind::Warning => write!(f, "warning"),
            NotificationKind::Critical => write!(f, "critical"),
            NotificationKind::Emergency => write!(f, "emergency"),
        }
    }
}

/// A notification shown to the user. Immutable after creation except for
/// `is_read`, which only the notification feed's mark-as-read action flips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    /// Snapshot of the station at creation time; not a live reference.
    pub station_id: String,
    pub station_name: String,
    pub timestamp: DateTime<Utc>,
    pub is_read: bool,
}

// ---------------------------------------------------------------------------
// User types
// ---------------------------------------------------------------------------

/// Points granted to a volunteer the first time they sign in.
pub const STARTING_POINTS: u64 = 100;

/// A volunteer's profile and reward balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub display_name: String,
    pub points: u64,
    pub total_feedings: u64,
}

impl UserProfile {
    /// A freshly registered volunteer.
    pub fn new_volunteer(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            points: STARTING_POINTS,
            total_feedings: 0,
        }
    }
}
