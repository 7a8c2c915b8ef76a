//! Watch configuration and detection modes.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use deathwatch_tick::TickConfig;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DetectionMode
// ---------------------------------------------------------------------------

/// How a poll decides that the newest death is a *new* death.
///
/// - **EdgeTriggered**: the newest record differs from the newest record
///   seen on the previous poll (or at seeding). Alerts once per death.
/// - **SameDay**: the newest record is dated today (local calendar).
///   Re-alerts on every poll for the rest of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetectionMode {
    #[default]
    EdgeTriggered,
    SameDay,
}

impl fmt::Display for DetectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EdgeTriggered => write!(f, "edge-triggered"),
            Self::SameDay => write!(f, "same-day"),
        }
    }
}

impl FromStr for DetectionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "edge" | "edge-triggered" => Ok(Self::EdgeTriggered),
            "same-day" | "today" => Ok(Self::SameDay),
            other => Err(format!("unknown detection mode: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// WatchConfig
// ---------------------------------------------------------------------------

/// Configuration for a watch task.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchConfig {
    /// Poll scheduling. Default interval: 10 s.
    pub tick: TickConfig,

    /// New-death rule. Default: edge-triggered.
    pub detection: DetectionMode,

    /// Capacity of the event channel. A full channel makes the watch
    /// wait for the consumer before arming the next poll.
    pub channel_size: usize,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            tick: TickConfig::default(),
            detection: DetectionMode::default(),
            channel_size: 32,
        }
    }
}

impl WatchConfig {
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            tick: TickConfig::with_interval(interval),
            ..Default::default()
        }
    }

    /// Poll interval after clamping.
    pub fn interval(&self) -> Duration {
        self.tick.clone().validated().interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_edge_triggered_every_10s() {
        let cfg = WatchConfig::default();
        assert_eq!(cfg.detection, DetectionMode::EdgeTriggered);
        assert_eq!(cfg.interval(), Duration::from_secs(10));
        assert_eq!(cfg.channel_size, 32);
    }

    #[test]
    fn test_interval_is_clamped() {
        assert_eq!(
            WatchConfig::with_interval(Duration::ZERO).interval(),
            Duration::from_secs(1)
        );
    }

    #[test]
    fn test_detection_mode_parse_and_display() {
        assert_eq!("same-day".parse::<DetectionMode>(), Ok(DetectionMode::SameDay));
        assert_eq!(" EDGE ".parse::<DetectionMode>(), Ok(DetectionMode::EdgeTriggered));
        assert!("sometimes".parse::<DetectionMode>().is_err());
        assert_eq!(DetectionMode::SameDay.to_string(), "same-day");
    }
}
