//! Error taxonomy for watch-list sync and library ingestion

use thiserror::Error;

/// Failures surfaced by the synchronizer and the ingestion pipeline.
///
/// A declined conflict choice is not an error; it is reported as
/// [`crate::library::IngestOutcome::Cancelled`].
#[derive(Debug, Error)]
pub enum WatchError {
    /// Watch URL carries no trailing numeric id
    #[error("No thread id found in URL: {url}")]
    Parse { url: String },

    /// Remote catalog returned nothing for a name or URL
    #[error("No game found for '{query}'")]
    NotFound { query: String },

    /// Game is already in the library, by normalized name or remote id
    #[error("'{name}' is already listed")]
    AlreadyListed { name: String, remote_id: Option<i64> },

    /// Remote catalog request failed
    #[error("Remote catalog error: {0:#}")]
    Transport(#[source] anyhow::Error),

    /// Persistence layer failed
    #[error("Store error: {0:#}")]
    Store(#[source] anyhow::Error),
}

impl WatchError {
    /// Whether this failure is expected user-facing noise rather than a fault.
    pub fn is_benign(&self) -> bool {
        matches!(
            self,
            WatchError::Parse { .. } | WatchError::NotFound { .. } | WatchError::AlreadyListed { .. }
        )
    }
}

pub type WatchResult<T> = std::result::Result<T, WatchError>;
