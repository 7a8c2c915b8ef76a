//! Core data types produced by reading the account portal's pages.
//!
//! Everything here is derived from markup the portal controls. None of it
//! is persisted: a session rebuilds its roster and death lists from fresh
//! pages every time.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Login credentials for the account portal.
///
/// Constructed through [`Credentials::new`], which trims the email and
/// rejects blank fields, so a `Credentials` value is always submittable.
///
/// `Debug` is implemented by hand so the password never reaches a log line.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    email: String,
    password: String,
}

impl Credentials {
    /// Validates and builds credentials.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidCredentials`] if the email or the
    /// password is blank.
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, ProtocolError> {
        let email = email.into().trim().to_string();
        let password = password.into();
        if email.is_empty() {
            return Err(ProtocolError::InvalidCredentials("email is empty".into()));
        }
        if password.trim().is_empty() {
            return Err(ProtocolError::InvalidCredentials("password is empty".into()));
        }
        Ok(Self { email, password })
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// What an account page says about the login attempt that produced it.
///
/// ```text
///   AwaitingLogin ⇄ AwaitingPin ──→ Authenticated
///         │              │
///         └──────┬───────┘
///                ▼
///       LockedOut / Unknown
/// ```
///
/// - **AwaitingLogin**: the login form came back; credentials were rejected.
/// - **AwaitingPin**: neither welcome, lockout nor login form; the portal
///   wants a second factor.
/// - **Authenticated**: the account overview's welcome marker is present.
/// - **LockedOut**: the portal refuses logins from this IP for now.
/// - **Unknown**: the page was blank and cannot be classified.
///
/// The last three are terminal. Once a session reaches one of them it
/// never moves again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SessionState {
    #[default]
    AwaitingLogin,
    AwaitingPin,
    Authenticated,
    LockedOut,
    Unknown,
}

impl SessionState {
    /// Returns `true` for states no further page can change.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Authenticated | Self::LockedOut | Self::Unknown)
    }

    /// Returns `true` if a session in `self` may move to `target`.
    ///
    /// Non-terminal states may move anywhere, including back and forth
    /// between login and PIN prompts; terminal states only "move" to
    /// themselves.
    pub fn can_transition_to(self, target: Self) -> bool {
        !self.is_terminal() || self == target
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AwaitingLogin => write!(f, "AwaitingLogin"),
            Self::AwaitingPin => write!(f, "AwaitingPin"),
            Self::Authenticated => write!(f, "Authenticated"),
            Self::LockedOut => write!(f, "LockedOut"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

// ---------------------------------------------------------------------------
// CharacterSummary
// ---------------------------------------------------------------------------

/// One entry of the account's character roster.
///
/// When the roster line cannot be parsed, `name` holds the raw line and
/// the other fields are blank/zero.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CharacterSummary {
    pub name: String,
    pub vocation: String,
    pub level: u32,
    pub world: String,
}

impl fmt::Display for CharacterSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.vocation.is_empty() && self.world.is_empty() && self.level == 0 {
            return write!(f, "{}", self.name);
        }
        write!(
            f,
            "{} | {} | Level {} | {}",
            self.name, self.vocation, self.level, self.world
        )
    }
}

// ---------------------------------------------------------------------------
// DeathRecord
// ---------------------------------------------------------------------------

/// A logged character death, as listed on the character page.
///
/// Lists of these are newest-first. Two records are the same event iff all
/// three fields are equal (the derived `PartialEq`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeathRecord {
    /// Portal-formatted timestamp, e.g. `Jan 05 2024, 21:14:03 CET`.
    pub date: String,
    pub description: String,
    pub penalty: String,
}

impl DeathRecord {
    /// Calendar day of the death, ignoring time of day and zone.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidDate`] if the text does not start
    /// with `Mon DD YYYY`.
    pub fn parse_date(&self) -> Result<NaiveDate, ProtocolError> {
        parse_portal_date(&self.date)
    }

    /// [`parse_date`](Self::parse_date) without the error.
    pub fn calendar_date(&self) -> Option<NaiveDate> {
        self.parse_date().ok()
    }
}

/// Parses the leading `Mon DD YYYY` of a portal timestamp.
pub fn parse_portal_date(text: &str) -> Result<NaiveDate, ProtocolError> {
    let normalized = text.replace('\u{a0}', " ");
    let mut words = normalized
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|w| !w.is_empty());
    let (Some(month), Some(day), Some(year)) = (words.next(), words.next(), words.next()) else {
        return Err(ProtocolError::InvalidDate(text.to_string()));
    };
    NaiveDate::parse_from_str(&format!("{month} {day} {year}"), "%b %d %Y")
        .map_err(|_| ProtocolError::InvalidDate(text.to_string()))
}

impl fmt::Display for DeathRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.date, self.description, self.penalty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn death(date: &str) -> DeathRecord {
        DeathRecord {
            date: date.to_string(),
            description: "Died at Level 120 by a dragon lord.".to_string(),
            penalty: "Normal".to_string(),
        }
    }

    // =====================================================================
    // Credentials
    // =====================================================================

    #[test]
    fn test_credentials_trim_email() {
        let c = Credentials::new("  knight@example.com ", "pw").unwrap();
        assert_eq!(c.email(), "knight@example.com");
        assert_eq!(c.password(), "pw");
    }

    #[test]
    fn test_credentials_reject_blank_fields() {
        assert!(matches!(
            Credentials::new("", "pw"),
            Err(ProtocolError::InvalidCredentials(_))
        ));
        assert!(matches!(
            Credentials::new("a@b.c", "   "),
            Err(ProtocolError::InvalidCredentials(_))
        ));
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let c = Credentials::new("a@b.c", "hunter2").unwrap();
        let dbg = format!("{c:?}");
        assert!(dbg.contains("a@b.c"));
        assert!(!dbg.contains("hunter2"));
    }

    // =====================================================================
    // SessionState
    // =====================================================================

    #[test]
    fn test_session_state_terminal_states() {
        assert!(!SessionState::AwaitingLogin.is_terminal());
        assert!(!SessionState::AwaitingPin.is_terminal());
        assert!(SessionState::Authenticated.is_terminal());
        assert!(SessionState::LockedOut.is_terminal());
        assert!(SessionState::Unknown.is_terminal());
    }

    #[test]
    fn test_session_state_never_leaves_lockout() {
        assert!(!SessionState::LockedOut.can_transition_to(SessionState::Authenticated));
        assert!(!SessionState::LockedOut.can_transition_to(SessionState::AwaitingLogin));
        assert!(!SessionState::Authenticated.can_transition_to(SessionState::AwaitingPin));
    }

    #[test]
    fn test_session_state_login_and_pin_interchange() {
        assert!(SessionState::AwaitingLogin.can_transition_to(SessionState::AwaitingPin));
        assert!(SessionState::AwaitingPin.can_transition_to(SessionState::AwaitingLogin));
        assert!(SessionState::AwaitingPin.can_transition_to(SessionState::Authenticated));
        assert!(SessionState::Authenticated.can_transition_to(SessionState::Authenticated));
    }

    #[test]
    fn test_session_state_default_and_display() {
        assert_eq!(SessionState::default(), SessionState::AwaitingLogin);
        assert_eq!(SessionState::LockedOut.to_string(), "LockedOut");
    }

    // =====================================================================
    // CharacterSummary
    // =====================================================================

    #[test]
    fn test_character_summary_display() {
        let c = CharacterSummary {
            name: "Sir Knight".into(),
            vocation: "Elite Knight".into(),
            level: 120,
            world: "Antica".into(),
        };
        assert_eq!(c.to_string(), "Sir Knight | Elite Knight | Level 120 | Antica");

        let raw = CharacterSummary {
            name: "Something odd".into(),
            ..Default::default()
        };
        assert_eq!(raw.to_string(), "Something odd");
    }

    // =====================================================================
    // DeathRecord dates
    // =====================================================================

    #[test]
    fn test_parse_date_with_time_and_zone() {
        let d = death("Jan 05 2024, 21:14:03 CET");
        assert_eq!(d.calendar_date(), NaiveDate::from_ymd_opt(2024, 1, 5));
    }

    #[test]
    fn test_parse_date_with_nbsp() {
        let d = death("Mar\u{a0}17\u{a0}2025,\u{a0}08:00:00\u{a0}CET");
        assert_eq!(d.calendar_date(), NaiveDate::from_ymd_opt(2025, 3, 17));
    }

    #[test]
    fn test_parse_date_without_time() {
        let d = death("Jan 05 2024");
        assert_eq!(d.calendar_date(), NaiveDate::from_ymd_opt(2024, 1, 5));
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert!(matches!(
            death("yesterday").parse_date(),
            Err(ProtocolError::InvalidDate(_))
        ));
        assert!(death("Foo 05 2024").calendar_date().is_none());
        assert!(death("").calendar_date().is_none());
    }

    #[test]
    fn test_death_identity_is_all_three_fields() {
        let a = death("Jan 05 2024, 21:14:03 CET");
        let mut b = a.clone();
        assert_eq!(a, b);
        b.penalty = "Blessed".into();
        assert_ne!(a, b);
    }

    #[test]
    fn test_death_record_serializes_field_names() {
        let json = serde_json::to_value(death("Jan 05 2024")).unwrap();
        assert_eq!(json["date"], "Jan 05 2024");
        assert_eq!(json["penalty"], "Normal");
    }
}
