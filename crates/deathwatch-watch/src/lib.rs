//! Death watch for Deathwatch.
//!
//! After login, one character's page is polled on a fixed interval and
//! each poll is compared with the previous one to spot new deaths. The
//! poll loop runs as an isolated Tokio task that owns the session.
//!
//! # Key types
//!
//! - [`spawn_watch`]: starts the task, returns a [`WatchHandle`] and an
//!   event receiver
//! - [`WatchEvent`]: one per completed poll
//! - [`WatchState`] / [`is_new_death`]: the detection rule
//! - [`WatchConfig`] / [`DetectionMode`]: interval and detection settings

mod config;
mod detect;
mod error;
mod watch;

pub use config::{DetectionMode, WatchConfig};
pub use detect::{WatchReport, WatchState, is_new_death};
pub use error::WatchError;
pub use watch::{
    TodayFn, WatchEvent, WatchHandle, WatchSummary, fetch_deaths, local_today, spawn_watch,
    spawn_watch_with_clock,
};
