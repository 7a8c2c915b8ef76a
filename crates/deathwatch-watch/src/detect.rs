//! New-death detection.
//!
//! [`WatchState`] is the only state that survives between polls: the
//! character's last known death count and newest death. Each poll feeds
//! the freshly extracted list to [`WatchState::observe`], which decides
//! whether the newest record is new and returns the [`WatchReport`] for
//! that poll.

use chrono::NaiveDate;
use deathwatch_protocol::DeathRecord;
use serde::{Deserialize, Serialize};

use crate::DetectionMode;

/// Decides whether `current` (newest first) holds a new death.
///
/// Pure: the caller supplies the previously observed newest record and
/// today's date.
pub fn is_new_death(
    mode: DetectionMode,
    previous: Option<&DeathRecord>,
    current: &[DeathRecord],
    today: NaiveDate,
) -> bool {
    let Some(top) = current.first() else {
        return false;
    };
    match mode {
        DetectionMode::EdgeTriggered => previous != Some(top),
        DetectionMode::SameDay => top.calendar_date() == Some(today),
    }
}

/// Result of one completed poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchReport {
    /// Poll number, starting at 1.
    pub tick: u64,
    pub character: String,
    pub total_deaths: usize,
    /// Newest death, if any.
    pub last_death: Option<DeathRecord>,
    pub new_death: bool,
}

/// Per-character memory carried from one poll to the next.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WatchState {
    pub character_name: String,
    pub last_known_death_count: usize,
    pub last_known_death: Option<DeathRecord>,
}

impl WatchState {
    /// State seeded from an initial status check, so the deaths it
    /// already listed are not reported as new.
    pub fn seeded(character_name: impl Into<String>, deaths: &[DeathRecord]) -> Self {
        Self {
            character_name: character_name.into(),
            last_known_death_count: deaths.len(),
            last_known_death: deaths.first().cloned(),
        }
    }

    /// Records a fresh death list and reports on it.
    ///
    /// An empty list leaves `last_known_death` in place, so a death that
    /// drops off the page and comes back is not reported twice.
    pub fn observe(
        &mut self,
        tick: u64,
        deaths: &[DeathRecord],
        mode: DetectionMode,
        today: NaiveDate,
    ) -> WatchReport {
        let new_death = is_new_death(mode, self.last_known_death.as_ref(), deaths, today);
        self.last_known_death_count = deaths.len();
        if let Some(top) = deaths.first() {
            self.last_known_death = Some(top.clone());
        }

        WatchReport {
            tick,
            character: self.character_name.clone(),
            total_deaths: deaths.len(),
            last_death: deaths.first().cloned(),
            new_death,
        }
    }
}
