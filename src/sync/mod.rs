/// Remote synchronisation of volunteer rewards.
///
/// The remote backend is a collaborator, not a source of truth: every call
/// is attempted at most once, and a failure only ever degrades the session
/// to local-only. See `rewards::RewardLedger` for how failures are absorbed.
///
/// Submodules:
/// - `http`: reqwest client for the REST backend.

pub mod http;

pub use http::HttpRemoteSync;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can arise when talking to the remote backend.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SyncError {
    /// Non-2xx HTTP response.
    #[error("HTTP error: {0}")]
    Http(u16),
    /// The request did not complete within the configured timeout.
    #[error("timeout: {0}")]
    Timeout(String),
    /// Connection, DNS or TLS failure.
    #[error("transport error: {0}")]
    Transport(String),
    /// The user id cannot name a remote document.
    #[error("invalid user id: {0:?}")]
    InvalidUserId(String),
    /// The client could not be built from the given settings.
    #[error("invalid remote configuration: {0}")]
    InvalidConfig(String),
}

impl From<reqwest::Error> for SyncError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SyncError::Timeout(e.to_string())
        } else if let Some(status) = e.status() {
            SyncError::Http(status.as_u16())
        } else {
            SyncError::Transport(e.to_string())
        }
    }
}

pub type SyncResult = Result<(), SyncError>;

/// Operations the remote user store exposes.
#[async_trait]
pub trait RemoteSync: Send + Sync {
    /// Atomically add `amount` to the user's point balance.
    async fn increment_points(&self, user_id: &str, amount: u64) -> SyncResult;

    /// Atomically add `by` to the user's feeding counter.
    async fn increment_feedings(&self, user_id: &str, by: u64) -> SyncResult;

    /// Replace the user's display name.
    async fn set_display_name(&self, user_id: &str, display_name: &str) -> SyncResult;
}
