//! Watch task: an isolated Tokio task that polls one character's deaths.
//!
//! The task owns the [`SessionContext`] (and with it the cookie jar) and a
//! [`TickScheduler`]. It talks to the outside world through an mpsc
//! channel of [`WatchEvent`]s and is stopped through the
//! [`CancellationToken`] held by its [`WatchHandle`].

use chrono::{Local, NaiveDate};
use deathwatch_protocol::{DeathRecord, SessionState, classify_session, extract_deaths};
use deathwatch_session::SessionContext;
use deathwatch_tick::TickScheduler;
use deathwatch_transport::Fetcher;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{DetectionMode, WatchConfig, WatchError, WatchReport, WatchState};

/// Source of "today" for same-day detection.
pub type TodayFn = fn() -> NaiveDate;

/// Local calendar date.
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// Fetches a character page and extracts its deaths.
///
/// Returns `None` when the page cannot be fetched (already logged).
pub async fn fetch_deaths<F: Fetcher>(
    ctx: &SessionContext<F>,
    character: &str,
) -> Option<Vec<DeathRecord>> {
    let request = ctx.portal().character_info(character);
    let html = ctx.fetch(&request).await?;
    let deaths = extract_deaths(&html);
    if deaths.is_empty() {
        tracing::warn!(%character, "no deaths listed for character");
    }
    Some(deaths)
}

/// One message from the watch task per completed poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WatchEvent {
    /// The page was read; deaths and detection result attached.
    Status(WatchReport),
    /// The page could not be fetched this poll. State is unchanged.
    PageUnavailable { tick: u64 },
}

impl WatchEvent {
    pub fn tick(&self) -> u64 {
        match self {
            Self::Status(report) => report.tick,
            Self::PageUnavailable { tick } => *tick,
        }
    }
}

/// Totals returned when a watch task ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchSummary {
    /// Polls completed.
    pub ticks: u64,
    /// Polls that reported a new death.
    pub alerts: u64,
    /// Polls whose page could not be fetched.
    pub unavailable: u64,
}

/// Handle to a running watch task.
#[derive(Debug)]
pub struct WatchHandle {
    cancel: CancellationToken,
    task: JoinHandle<WatchSummary>,
}

impl WatchHandle {
    /// Asks the task to stop. An in-flight fetch is abandoned.
    ///
    /// Safe to call multiple times (idempotent).
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A token that cancels this watch when cancelled, for wiring to
    /// signal handlers.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the task to end and returns its totals.
    ///
    /// # Errors
    /// Returns [`WatchError::Task`] if the task panicked.
    pub async fn join(self) -> Result<WatchSummary, WatchError> {
        Ok(self.task.await?)
    }
}

/// Spawns a watch task for `character` and returns its handle and event
/// stream.
///
/// `initial` is the death list from the status check that preceded the
/// watch; it seeds the state so deaths already shown are not re-reported.
/// The first poll happens one interval after spawning.
pub fn spawn_watch<F: Fetcher>(
    ctx: SessionContext<F>,
    character: impl Into<String>,
    initial: &[DeathRecord],
    config: WatchConfig,
) -> (WatchHandle, mpsc::Receiver<WatchEvent>) {
    spawn_watch_with_clock(ctx, character, initial, config, local_today)
}

/// [`spawn_watch`] with an explicit source of today's date.
pub fn spawn_watch_with_clock<F: Fetcher>(
    ctx: SessionContext<F>,
    character: impl Into<String>,
    initial: &[DeathRecord],
    config: WatchConfig,
    today: TodayFn,
) -> (WatchHandle, mpsc::Receiver<WatchEvent>) {
    let (tx, rx) = mpsc::channel(config.channel_size.max(1));
    let cancel = CancellationToken::new();

    let watcher = Watcher {
        ctx,
        state: WatchState::seeded(character, initial),
        scheduler: TickScheduler::new(config.tick),
        detection: config.detection,
        today,
        events: tx,
        cancel: cancel.clone(),
        summary: WatchSummary::default(),
    };
    let task = tokio::spawn(watcher.run());

    (WatchHandle { cancel, task }, rx)
}

/// The internal watch state. Runs inside a Tokio task.
struct Watcher<F: Fetcher> {
    ctx: SessionContext<F>,
    state: WatchState,
    scheduler: TickScheduler,
    detection: DetectionMode,
    today: TodayFn,
    events: mpsc::Sender<WatchEvent>,
    cancel: CancellationToken,
    summary: WatchSummary,
}

impl<F: Fetcher> Watcher<F> {
    /// Polls until cancelled or until nobody listens for events.
    async fn run(mut self) -> WatchSummary {
        tracing::info!(
            character = %self.state.character_name,
            interval_ms = self.scheduler.interval().as_millis() as u64,
            detection = %self.detection,
            "watch started"
        );

        loop {
            let tick = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                info = self.scheduler.wait_for_tick() => info.tick,
            };

            let request = self.ctx.portal().character_info(&self.state.character_name);
            let page = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                page = self.ctx.fetch(&request) => page,
            };

            let event = self.process(tick, page);

            let sent = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                sent = self.events.send(event) => sent,
            };
            if sent.is_err() {
                tracing::debug!("event receiver dropped, stopping watch");
                break;
            }
            // Delivery is part of the poll; the next one is armed after it.
            self.scheduler.record_tick_end();
        }

        tracing::info!(
            character = %self.state.character_name,
            ticks = self.summary.ticks,
            alerts = self.summary.alerts,
            "watch stopped"
        );
        self.summary
    }

    fn process(&mut self, tick: u64, page: Option<String>) -> WatchEvent {
        self.summary.ticks += 1;
        let Some(html) = page else {
            self.summary.unavailable += 1;
            tracing::warn!(tick, character = %self.state.character_name, "character page unavailable");
            return WatchEvent::PageUnavailable { tick };
        };

        if matches!(
            classify_session(&html),
            SessionState::AwaitingLogin | SessionState::LockedOut
        ) {
            self.summary.unavailable += 1;
            tracing::warn!(tick, character = %self.state.character_name, "poll returned a login page, session lost");
            return WatchEvent::PageUnavailable { tick };
        }

        let deaths = extract_deaths(&html);
        let report = self.state.observe(tick, &deaths, self.detection, (self.today)());
        if report.new_death {
            self.summary.alerts += 1;
            tracing::warn!(
                tick,
                character = %report.character,
                total_deaths = report.total_deaths,
                "new death detected"
            );
        } else {
            tracing::debug!(tick, total_deaths = report.total_deaths, "no new death");
        }
        WatchEvent::Status(report)
    }
}
