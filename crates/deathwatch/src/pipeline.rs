//! The run pipeline: login, character choice, status check, watch.
//!
//! ```text
//! SessionContext ──login──→ Deathwatch ──select_character──→ name
//!                               │
//!                               ├──character_status(name)──→ CharacterStatus
//!                               │
//!                               └──watch(&status)──→ WatchHandle + events
//! ```
//!
//! `watch` consumes the pipeline: the session context and its cookie jar
//! move into the watch task.

use deathwatch_protocol::{CharacterSummary, DeathRecord};
use deathwatch_session::{Prompter, SessionContext, negotiate, select_character};
use deathwatch_transport::Fetcher;
use deathwatch_watch::{WatchError, WatchEvent, WatchHandle, fetch_deaths, spawn_watch};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::{DeathwatchConfig, DeathwatchError};

/// A character's death list as read by one status check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterStatus {
    pub character: String,
    pub total_deaths: usize,
    /// Newest death, if any.
    pub last_death: Option<DeathRecord>,
    /// Every listed death, newest first.
    pub deaths: Vec<DeathRecord>,
}

impl CharacterStatus {
    pub fn new(character: impl Into<String>, deaths: Vec<DeathRecord>) -> Self {
        Self {
            character: character.into(),
            total_deaths: deaths.len(),
            last_death: deaths.first().cloned(),
            deaths,
        }
    }
}

/// An authenticated account session, ready to pick and watch a character.
pub struct Deathwatch<F: Fetcher> {
    ctx: SessionContext<F>,
    config: DeathwatchConfig,
    roster: Vec<CharacterSummary>,
}

impl<F: Fetcher> Deathwatch<F> {
    /// Logs in with the credentials held by `ctx`, asking `prompter` for
    /// fresh ones when the portal rejects them.
    ///
    /// # Errors
    /// Returns [`DeathwatchError::Session`] when the login flow fails.
    pub async fn login<P: Prompter>(
        mut ctx: SessionContext<F>,
        prompter: &P,
        config: DeathwatchConfig,
    ) -> Result<Self, DeathwatchError> {
        let page = negotiate(&mut ctx, prompter, &config.session).await?;
        Ok(Self {
            ctx,
            config,
            roster: page.roster,
        })
    }

    /// Characters listed on the account overview. Never empty.
    pub fn roster(&self) -> &[CharacterSummary] {
        &self.roster
    }

    pub fn config(&self) -> &DeathwatchConfig {
        &self.config
    }

    pub fn context(&self) -> &SessionContext<F> {
        &self.ctx
    }

    /// The configured character, or one chosen from the roster.
    ///
    /// # Errors
    /// Returns [`DeathwatchError::Session`] when no valid choice is made.
    pub async fn select_character<P: Prompter>(
        &self,
        prompter: &P,
    ) -> Result<String, DeathwatchError> {
        let name = select_character(
            &self.roster,
            self.config.character(),
            prompter,
            &self.config.session,
        )
        .await?;
        Ok(name)
    }

    /// Reads `character`'s death list once.
    ///
    /// # Errors
    /// Returns [`WatchError::StatusUnavailable`] (wrapped) when the page
    /// cannot be fetched.
    pub async fn character_status(
        &self,
        character: &str,
    ) -> Result<CharacterStatus, DeathwatchError> {
        let deaths = fetch_deaths(&self.ctx, character)
            .await
            .ok_or_else(|| WatchError::StatusUnavailable(character.to_string()))?;
        let status = CharacterStatus::new(character, deaths);
        tracing::info!(
            character,
            total_deaths = status.total_deaths,
            "character status loaded"
        );
        Ok(status)
    }

    /// Starts watching the character of `status`, seeded with its deaths
    /// so they are not reported again.
    pub fn watch(self, status: &CharacterStatus) -> (WatchHandle, mpsc::Receiver<WatchEvent>) {
        spawn_watch(
            self.ctx,
            status.character.clone(),
            &status.deaths,
            self.config.watch,
        )
    }
}
