/// patimon_service: feeding-station fill level monitoring and volunteer rewards.
///
/// # Module structure
///
/// ```text
/// patimon_service
/// ├── model: shared data types (Station, Notification, UserProfile, …)
/// ├── stations: city registry, station seeding, status summaries
/// ├── alert
/// │   ├── thresholds: fill level boundaries and status classification
/// │   ├── crossings: downward threshold-crossing detection
/// │   └── notifications: notification records and the feed
/// ├── simulation
/// │   └── decay: periodic fill level decay with injectable randomness
/// ├── rewards
/// │   ├── ledger: refill credits, local first, remote best-effort
/// │   ├── session: active user persistence
/// │   └── leaderboard: volunteer ranking
/// ├── sync: remote backend trait + HTTP client
/// ├── store: key-value persistence (memory, JSON file)
/// ├── monitor: timer loop, manual refills, snapshots
/// ├── config: TOML + environment configuration
/// └── logging: structured logging on tracing
/// ```

pub mod alert;
pub mod config;
pub mod logging;
pub mod model;
pub mod monitor;
pub mod rewards;
pub mod simulation;
pub mod stations;
pub mod store;
pub mod sync;
