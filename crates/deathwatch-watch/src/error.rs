//! Error types for the watch layer.

/// Errors that can occur while running a watch.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// The watch task panicked or was aborted.
    #[error("watch task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// The character's page could not be fetched for the initial status.
    #[error("character page unavailable for {0}")]
    StatusUnavailable(String),
}
