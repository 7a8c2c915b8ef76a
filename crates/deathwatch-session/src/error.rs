//! Error types for the session layer.

use deathwatch_protocol::{ProtocolError, SessionState};

/// Errors that end a login negotiation or a character selection.
///
/// Every variant is terminal for the flow that produced it. Recoverable
/// conditions (a rejected password, a PIN prompt, an unknown choice) are
/// retried inside the negotiator and selector and only surface here once
/// their budget is spent.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Negotiation was started without credentials in the context.
    #[error("no credentials configured")]
    MissingCredentials,

    /// Credentials entered at a prompt could not be used.
    #[error(transparent)]
    InvalidCredentials(#[from] ProtocolError),

    /// A page could not be fetched. The cause has already been logged.
    #[error("page unavailable: {label}")]
    PageUnavailable { label: String },

    /// The portal refuses logins from this IP address for now.
    #[error("login blocked: too many failed attempts from this IP")]
    LockedOut,

    /// The login page could not be classified.
    #[error("unrecognized page after login attempt")]
    UnrecognizedPage,

    /// The retry budget for rejected logins and PIN prompts is spent.
    #[error("maximum login attempts reached ({attempts})")]
    MaxAttempts { attempts: u32 },

    /// An authenticated page listed no characters.
    #[error("no characters found on the account page")]
    EmptyRoster,

    /// No valid character was chosen within the re-prompt budget.
    #[error("no valid character selected after {attempts} attempts")]
    SelectionFailed { attempts: u32 },

    /// The context was asked to leave a terminal state.
    #[error("invalid session transition {from} -> {to}")]
    InvalidTransition {
        from: SessionState,
        to: SessionState,
    },

    /// The prompter could not read an answer (closed input, I/O error).
    #[error("prompt failed: {0}")]
    Prompt(String),
}
