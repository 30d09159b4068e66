/// Volunteer rewards.
///
/// Submodules:
/// - `ledger`: credits refills and renames, local first, remote best-effort.
/// - `session`: persists the active user through a key-value store.
/// - `leaderboard`: ranks volunteers by points.

pub mod leaderboard;
pub mod ledger;
pub mod session;

pub use leaderboard::{RankedVolunteer, leaderboard};
pub use ledger::{DEFAULT_DEMO_ACCOUNT, RewardLedger};
pub use session::{SESSION_KEY, SessionStore};
