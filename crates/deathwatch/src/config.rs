//! `DeathwatchConfig` and its builder.

use std::time::Duration;

use deathwatch_session::SessionConfig;
use deathwatch_tick::TickConfig;
use deathwatch_watch::{DetectionMode, WatchConfig};

/// Everything one login-then-watch run is configured with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeathwatchConfig {
    /// Login and selection retry budgets.
    pub session: SessionConfig,
    /// Poll interval and detection rule.
    pub watch: WatchConfig,
    /// Character to watch. `None` selects from the account roster.
    pub character: Option<String>,
}

impl DeathwatchConfig {
    /// Creates a new builder.
    pub fn builder() -> DeathwatchConfigBuilder {
        DeathwatchConfigBuilder::new()
    }

    /// The configured character, if it is not blank.
    pub fn character(&self) -> Option<&str> {
        self.character
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

/// Builder for [`DeathwatchConfig`].
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use deathwatch::prelude::*;
///
/// let config = DeathwatchConfig::builder()
///     .character("Sir Knight")
///     .interval(Duration::from_secs(30))
///     .detection(DetectionMode::SameDay)
///     .build();
///
/// assert_eq!(config.character(), Some("Sir Knight"));
/// assert_eq!(config.watch.interval(), Duration::from_secs(30));
/// ```
#[derive(Debug, Clone, Default)]
pub struct DeathwatchConfigBuilder {
    config: DeathwatchConfig,
}

impl DeathwatchConfigBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the login and selection retry budgets.
    pub fn session_config(mut self, session: SessionConfig) -> Self {
        self.config.session = session;
        self
    }

    /// Sets the whole watch configuration.
    pub fn watch_config(mut self, watch: WatchConfig) -> Self {
        self.config.watch = watch;
        self
    }

    /// Sets the poll interval, keeping the other tick settings.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.config.watch.tick.interval = interval;
        self
    }

    /// Sets the random delay added before the first poll.
    pub fn initial_jitter(mut self, jitter: Duration) -> Self {
        self.config.watch.tick.initial_jitter = jitter;
        self
    }

    pub fn detection(mut self, detection: DetectionMode) -> Self {
        self.config.watch.detection = detection;
        self
    }

    /// Sets the character to watch, skipping roster selection.
    pub fn character(mut self, name: impl Into<String>) -> Self {
        self.config.character = Some(name.into());
        self
    }

    /// Validates every section and returns the config.
    pub fn build(self) -> DeathwatchConfig {
        let DeathwatchConfig {
            session,
            mut watch,
            character,
        } = self.config;
        watch.tick = TickConfig::validated(watch.tick);
        DeathwatchConfig {
            session: session.validated(),
            watch,
            character,
        }
    }
}
