//! Unified error type for Deathwatch.

use deathwatch_protocol::ProtocolError;
use deathwatch_session::SessionError;
use deathwatch_transport::TransportError;
use deathwatch_watch::WatchError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `deathwatch` meta-crate, you deal with this single
/// error type instead of importing errors from each sub-crate.
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum DeathwatchError {
    /// Building the HTTP client or fetching a page failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Credentials or a portal date failed validation.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Login or character selection failed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The status check or the watch task failed.
    #[error(transparent)]
    Watch(#[from] WatchError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::Status {
            label: "account.html".into(),
            status: 503,
        };
        let deathwatch_err: DeathwatchError = err.into();
        assert!(matches!(deathwatch_err, DeathwatchError::Transport(_)));
        assert!(deathwatch_err.to_string().contains("503"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidCredentials("email is empty".into());
        let deathwatch_err: DeathwatchError = err.into();
        assert!(matches!(deathwatch_err, DeathwatchError::Protocol(_)));
        assert!(deathwatch_err.to_string().contains("email is empty"));
    }

    #[test]
    fn test_from_session_error() {
        let err = SessionError::MaxAttempts { attempts: 3 };
        let deathwatch_err: DeathwatchError = err.into();
        assert!(matches!(deathwatch_err, DeathwatchError::Session(_)));
    }

    #[test]
    fn test_from_watch_error() {
        let err = WatchError::StatusUnavailable("Sir Knight".into());
        let deathwatch_err: DeathwatchError = err.into();
        assert!(matches!(deathwatch_err, DeathwatchError::Watch(_)));
        assert!(deathwatch_err.to_string().contains("Sir Knight"));
    }
}
