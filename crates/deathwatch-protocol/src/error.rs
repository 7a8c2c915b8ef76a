//! Error types for the protocol layer.
//!
//! Page interpretation itself never fails. These errors come from the few
//! places where a value is validated: building credentials and reading a
//! calendar date out of a death record.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Credentials that cannot be submitted (blank email or password).
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// A death date that does not start with `Mon DD YYYY`.
    #[error("invalid date: {0:?}")]
    InvalidDate(String),
}
