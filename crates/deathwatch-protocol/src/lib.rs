//! Page interpretation for Deathwatch.
//!
//! This crate knows what the account portal's pages look like:
//!
//! - **Types** ([`Credentials`], [`SessionState`], [`CharacterSummary`],
//!   [`DeathRecord`]): what a page means once read.
//! - **Interpretation** ([`classify_session`], [`extract_characters`],
//!   [`extract_deaths`]): pure functions from markup to those types.
//! - **Requests** ([`Portal`]): the page requests the login and watch
//!   flows make.
//! - **Markup** ([`markup`]): the small HTML scanner the interpreters use.
//!
//! # Architecture
//!
//! The protocol layer sits between the fetcher (raw pages) and the session
//! (login flow). It does no I/O.
//!
//! ```text
//! Transport (HTML) → Protocol (SessionState, roster, deaths) → Session
//! ```

mod error;
mod interpret;
pub mod markup;
mod requests;
mod types;

pub use error::ProtocolError;
pub use interpret::{
    DEATHS_MARKER, WELCOME_MARKER, classify_session, extract_characters, extract_deaths,
    parse_roster_line,
};
pub use requests::{ACCOUNT_PATH, Portal};
pub use types::{
    CharacterSummary, Credentials, DeathRecord, SessionState, parse_portal_date,
};
