//! # Deathwatch
//!
//! Logs into a game account portal and watches one character for new
//! deaths.
//!
//! The work is split over layered crates; this one ties them into a
//! single pipeline and a single error type:
//!
//! ```text
//! deathwatch (this crate)  ← pipeline, DeathwatchError, config
//!     ↕
//! Watch Layer      ← polling task, new-death detection
//! Tick Layer       ← poll scheduling
//!     ↕
//! Session Layer    ← login state machine, character choice
//!     ↕
//! Protocol Layer   ← page classification, roster, death list, requests
//!     ↕
//! Transport Layer  ← cookie-aware HTTP fetcher, page dumps
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use deathwatch::prelude::*;
//!
//! # struct Stdin;
//! # impl Prompter for Stdin {
//! #     async fn prompt_text(&self, _: &str) -> Result<String, SessionError> { Ok(String::new()) }
//! #     async fn prompt_choice(&self, _: &str, _: &[String]) -> Result<String, SessionError> { Ok(String::new()) }
//! # }
//! # async fn run() -> Result<(), DeathwatchError> {
//! let fetcher = HttpFetcher::new(PortalConfig::default())?;
//! let credentials = Credentials::new("me@example.com", "secret")?;
//! let ctx = SessionContext::new(fetcher, Portal::default()).with_credentials(credentials);
//!
//! let session = Deathwatch::login(ctx, &Stdin, DeathwatchConfig::default()).await?;
//! let character = session.select_character(&Stdin).await?;
//! let status = session.character_status(&character).await?;
//!
//! let (handle, mut events) = session.watch(&status);
//! while let Some(event) = events.recv().await {
//!     println!("{event:?}");
//! }
//! handle.join().await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod pipeline;

pub use config::{DeathwatchConfig, DeathwatchConfigBuilder};
pub use error::DeathwatchError;
pub use pipeline::{CharacterStatus, Deathwatch};

pub mod prelude {
    pub use crate::{CharacterStatus, Deathwatch, DeathwatchConfig, DeathwatchError};
    pub use deathwatch_protocol::{
        CharacterSummary, Credentials, DeathRecord, Portal, SessionState,
    };
    pub use deathwatch_session::{Prompter, SessionConfig, SessionContext, SessionError};
    pub use deathwatch_tick::TickConfig;
    pub use deathwatch_transport::{DumpingFetcher, Fetcher, HttpFetcher, PortalConfig};
    pub use deathwatch_watch::{
        DetectionMode, WatchConfig, WatchEvent, WatchHandle, WatchReport, WatchSummary,
    };
}
