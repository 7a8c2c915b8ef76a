//! Account login and character selection for Deathwatch.
//!
//! This crate turns a fetcher and a set of credentials into an
//! authenticated account session:
//!
//! 1. **Context**: [`SessionContext`] owns the fetcher, the credentials
//!    and the current [`SessionState`](deathwatch_protocol::SessionState)
//! 2. **Negotiation**: [`negotiate`] runs the retry-bounded login flow
//! 3. **Selection**: [`select_character`] picks the character to watch,
//!    asking a [`Prompter`] when the account has several
//!
//! # How it fits in the stack
//!
//! ```text
//! Watch Layer (above)  ← takes over the authenticated context
//!     ↕
//! Session Layer (this crate)  ← login state machine, character choice
//!     ↕
//! Protocol Layer (below)  ← page classification, roster, requests
//! ```

#![allow(async_fn_in_trait)]

mod context;
mod error;
mod negotiate;
mod prompt;

pub use context::{SessionConfig, SessionContext};
pub use error::SessionError;
pub use negotiate::{AuthenticatedPage, negotiate, select_character};
pub use prompt::Prompter;
