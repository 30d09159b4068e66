/// Station alerting: status thresholds, crossing detection and notifications.
///
/// Submodules:
/// - `thresholds`: fill level boundaries and the status classifier.
/// - `crossings`: detects boundaries crossed between two observations.
/// - `notifications`: builds notification records and holds the feed.

pub mod crossings;
pub mod notifications;
pub mod thresholds;
