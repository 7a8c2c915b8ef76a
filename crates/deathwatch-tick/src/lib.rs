//! Completion-armed poll scheduler for Deathwatch.
//!
//! Fires one tick per interval, where the interval is measured from the
//! *end* of the previous tick's work rather than from its start. A slow
//! poll therefore delays the next one instead of overlapping it: tick N+1
//! is never armed before [`TickScheduler::record_tick_end`] reports that
//! tick N is done.
//!
//! # Integration
//!
//! The scheduler is designed to sit inside the watch task's
//! `tokio::select!` loop next to its cancellation branch:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         _ = cancel.cancelled() => break,
//!         tick = scheduler.wait_for_tick() => {
//!             poll(tick.tick).await;
//!             scheduler.record_tick_end();
//!         }
//!     }
//! }
//! ```

use std::time::Duration;

use rand::Rng;
use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Full configuration for the tick scheduler.
#[derive(Debug, Clone, PartialEq)]
pub struct TickConfig {
    /// Pause between the end of one tick and the start of the next.
    /// Default: 10 s. Clamped to [`Self::MIN_INTERVAL`]..=[`Self::MAX_INTERVAL`].
    pub interval: Duration,
    /// Random jitter (0..max) added to the *first* tick only.
    /// Default: zero.
    pub initial_jitter: Duration,
    /// Budget warning threshold (0.0–1.0). Default: 0.80 (80%).
    /// A tracing warning is emitted when a tick's work takes longer than
    /// this fraction of the interval.
    pub budget_warn_threshold: f64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            initial_jitter: Duration::ZERO,
            budget_warn_threshold: 0.80,
        }
    }
}

impl TickConfig {
    pub const MIN_INTERVAL: Duration = Duration::from_secs(1);
    pub const MAX_INTERVAL: Duration = Duration::from_secs(3600);

    /// A config for a specific interval with default settings.
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            ..Default::default()
        }
    }

    /// Clamp and fix any out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`TickScheduler::new`]. Rules:
    /// - `interval` clamped to `MIN_INTERVAL..=MAX_INTERVAL`.
    /// - `initial_jitter` capped to one interval.
    /// - `budget_warn_threshold` clamped to `0.0..=1.0`.
    pub fn validated(mut self) -> Self {
        let clamped = self.interval.clamp(Self::MIN_INTERVAL, Self::MAX_INTERVAL);
        if clamped != self.interval {
            warn!(
                requested_ms = self.interval.as_millis() as u64,
                clamped_ms = clamped.as_millis() as u64,
                "poll interval out of range, clamping"
            );
            self.interval = clamped;
        }
        self.initial_jitter = self.initial_jitter.min(self.interval);
        self.budget_warn_threshold = self.budget_warn_threshold.clamp(0.0, 1.0);
        self
    }
}

// ---------------------------------------------------------------------------
// Tick info (returned to caller each tick)
// ---------------------------------------------------------------------------

/// Information about a fired tick, returned by [`TickScheduler::wait_for_tick`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickInfo {
    /// Monotonically increasing tick number (starts at 1).
    pub tick: u64,
    /// How late the tick fired relative to its deadline.
    pub late_by: Duration,
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// Runtime metrics for the tick scheduler.
///
/// Timing values refer to the work reported via
/// [`TickScheduler::record_tick_end`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickMetrics {
    /// Total ticks fired.
    pub total_ticks: u64,
    /// Ticks whose work took longer than the interval.
    pub total_overruns: u64,
    /// Exponential moving average of tick work time (α = 0.1).
    pub avg_tick_time: Duration,
    /// Longest tick work time observed.
    pub max_tick_time: Duration,
    /// Work time of the last tick as a fraction of the interval.
    pub budget_utilization: f64,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Poll scheduler. One per watch task.
pub struct TickScheduler {
    config: TickConfig,
    tick_count: u64,
    /// When the next tick should fire. `None` while a tick's work is
    /// running.
    next_tick: Option<Instant>,
    /// When the current tick fired. Set by `wait_for_tick`, consumed by
    /// `record_tick_end`.
    tick_start: Option<Instant>,
    metrics: TickMetrics,
}

impl TickScheduler {
    /// Create a new scheduler from config. The first tick fires one
    /// interval (plus jitter) from now.
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();

        // Sub-microsecond jitter rounds down to none.
        let max_us = config.initial_jitter.as_micros() as u64;
        let jitter = if max_us > 0 {
            Duration::from_micros(rand::rng().random_range(0..max_us))
        } else {
            Duration::ZERO
        };
        let next_tick = Instant::now() + config.interval + jitter;

        debug!(
            interval_ms = config.interval.as_millis() as u64,
            jitter_ms = jitter.as_millis() as u64,
            "tick scheduler created"
        );

        Self {
            config,
            tick_count: 0,
            next_tick: Some(next_tick),
            tick_start: None,
            metrics: TickMetrics::default(),
        }
    }

    /// Create a scheduler for a specific interval with default settings.
    pub fn with_interval(interval: Duration) -> Self {
        Self::new(TickConfig::with_interval(interval))
    }

    /// Wait until the next tick is due. Returns [`TickInfo`] for the tick.
    ///
    /// If the previous tick was never closed with
    /// [`record_tick_end`](Self::record_tick_end), the next deadline is
    /// one interval from this call.
    ///
    /// Cancel-safe: dropping the future before it resolves leaves the
    /// deadline untouched.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let interval = self.config.interval;
        let next = *self
            .next_tick
            .get_or_insert_with(|| Instant::now() + interval);

        time::sleep_until(next).await;

        let now = Instant::now();
        self.next_tick = None;
        self.tick_start = Some(now);
        self.tick_count += 1;
        self.metrics.total_ticks += 1;

        let late_by = now.saturating_duration_since(next);
        trace!(tick = self.tick_count, late_ms = late_by.as_millis() as u64, "tick fired");

        TickInfo {
            tick: self.tick_count,
            late_by,
        }
    }

    /// Record that the current tick's work has finished and arm the next
    /// tick one interval from now.
    ///
    /// Emits a warning when the work used more than
    /// `budget_warn_threshold` of the interval; work longer than the whole
    /// interval counts as an overrun. Calling this without a fired tick
    /// does nothing.
    pub fn record_tick_end(&mut self) {
        let Some(start) = self.tick_start.take() else {
            return;
        };
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(start);
        let interval = self.config.interval;

        let utilization = elapsed.as_secs_f64() / interval.as_secs_f64();
        self.metrics.budget_utilization = utilization;

        if utilization >= 1.0 {
            self.metrics.total_overruns += 1;
            warn!(
                tick = self.tick_count,
                elapsed_ms = elapsed.as_millis() as u64,
                interval_ms = interval.as_millis() as u64,
                "tick work exceeded the poll interval"
            );
        } else if utilization >= self.config.budget_warn_threshold {
            warn!(
                tick = self.tick_count,
                elapsed_ms = elapsed.as_millis() as u64,
                interval_ms = interval.as_millis() as u64,
                utilization_pct = format!("{:.1}", utilization * 100.0),
                "tick work approaching the poll interval"
            );
        }

        if elapsed > self.metrics.max_tick_time {
            self.metrics.max_tick_time = elapsed;
        }
        // Exponential moving average (α = 0.1).
        let alpha = 0.1;
        let prev = self.metrics.avg_tick_time.as_secs_f64();
        let curr = elapsed.as_secs_f64();
        self.metrics.avg_tick_time = Duration::from_secs_f64(prev * (1.0 - alpha) + curr * alpha);

        self.next_tick = Some(now + interval);
    }

    /// Whether a tick has fired and not yet been closed.
    pub fn in_tick(&self) -> bool {
        self.tick_start.is_some()
    }

    /// Current tick count.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Snapshot of current metrics.
    pub fn metrics(&self) -> &TickMetrics {
        &self.metrics
    }

    /// The (validated) poll interval.
    pub fn interval(&self) -> Duration {
        self.config.interval
    }

    /// Deadline of the next tick, if armed.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.next_tick
    }
}
