//! Session state machine.
//!
//! Unlike a wall-clock engine, a session owns a 1 Hz [`Interval`] and counts
//! whole seconds down. The interval is created fresh on every entry into a
//! counting phase and dropped on every exit, so no stale tick from a previous
//! phase can reach the next one.
//!
//! ## Usage
//!
//! ```ignore
//! let mut session = Session::new(config, blocker, notifier);
//! session.start(&domains).await?;
//! while let Some(events) = session.next_tick().await {
//!     render(events);
//! }
//! ```

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::time::{self, Duration, Instant, Interval, MissedTickBehavior};

use super::{hours_to_secs, minutes_to_secs, Mode, Phase, SessionConfig};
use crate::error::SessionError;
use crate::events::{BlockOperation, SessionEvent};
use crate::hosts::Blocker;
use crate::notify::{Notification, Notifier};

const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Point-in-time view of a session for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub mode: Mode,
    pub phase: Phase,
    pub remaining_secs: Option<u64>,
    pub phase_total_secs: Option<u64>,
    pub cycle_index: u32,
    pub cycle_total: u32,
    pub progress_pct: f64,
    /// Strict and active: the block list cannot change and stop is refused.
    pub locked: bool,
}

pub struct Session {
    config: SessionConfig,
    phase: Phase,
    /// `None` whenever no countdown is running.
    remaining_secs: Option<u64>,
    phase_total_secs: Option<u64>,
    /// 1-based; only advances in Pomodoro.
    cycle_index: u32,
    domains: Vec<String>,
    blocker: Arc<dyn Blocker>,
    notifier: Arc<dyn Notifier>,
    ticker: Option<Interval>,
    /// Set when the ticker fires, consumed by [`Session::tick`].
    tick_due: bool,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("phase", &self.phase)
            .field("remaining_secs", &self.remaining_secs)
            .field("cycle_index", &self.cycle_index)
            .field("domains", &self.domains)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(
        config: SessionConfig,
        blocker: Arc<dyn Blocker>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            phase: Phase::Idle,
            remaining_secs: None,
            phase_total_secs: None,
            cycle_index: 1,
            domains: Vec::new(),
            blocker,
            notifier,
            ticker: None,
            tick_due: false,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn mode(&self) -> Mode {
        self.config.mode()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn remaining_secs(&self) -> Option<u64> {
        self.remaining_secs
    }

    pub fn cycle_index(&self) -> u32 {
        self.cycle_index
    }

    pub fn cycle_total(&self) -> u32 {
        self.config.cycle_total()
    }

    pub fn domains(&self) -> &[String] {
        &self.domains
    }

    pub fn is_idle(&self) -> bool {
        self.phase == Phase::Idle
    }

    pub fn locks_block_list(&self) -> bool {
        self.mode() == Mode::Strict && self.phase == Phase::Active
    }

    /// Elapsed share of the current phase, 0.0 - 100.0.
    pub fn progress_pct(&self) -> f64 {
        match (self.remaining_secs, self.phase_total_secs) {
            (Some(remaining), Some(total)) if total > 0 => {
                total.saturating_sub(remaining) as f64 / total as f64 * 100.0
            }
            _ => 0.0,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            mode: self.mode(),
            phase: self.phase,
            remaining_secs: self.remaining_secs,
            phase_total_secs: self.phase_total_secs,
            cycle_index: self.cycle_index,
            cycle_total: self.cycle_total(),
            progress_pct: self.progress_pct(),
            locked: self.locks_block_list(),
        }
    }

    /// Start the session over `domains`.
    ///
    /// Normal and Pomodoro apply the block immediately. Strict only moves to
    /// [`Phase::PendingConfirmation`]; nothing is blocked until [`confirm`].
    /// If the block cannot be applied the session stays idle.
    ///
    /// [`confirm`]: Session::confirm
    pub async fn start(&mut self, domains: &[String]) -> Result<Vec<SessionEvent>, SessionError> {
        if !self.is_idle() {
            return Err(SessionError::AlreadyRunning(self.mode()));
        }
        self.config.validate()?;
        if domains.is_empty() {
            return Err(SessionError::EmptyBlockList);
        }

        let mode = self.mode();
        match self.config {
            SessionConfig::Strict(c) => {
                self.domains = domains.to_vec();
                self.phase = Phase::PendingConfirmation;
                tracing::info!(%mode, sites = domains.len(), "strict session awaiting confirmation");
                Ok(vec![SessionEvent::ConfirmationRequested {
                    mode,
                    duration_secs: hours_to_secs(c.duration_hours),
                    at: Utc::now(),
                }])
            }
            SessionConfig::Normal(c) => {
                self.blocker.apply(domains).await?;
                self.domains = domains.to_vec();
                Ok(vec![self.begin(Phase::Active, hours_to_secs(c.duration_hours))])
            }
            SessionConfig::Pomodoro(c) => {
                self.blocker.apply(domains).await?;
                self.domains = domains.to_vec();
                self.cycle_index = 1;
                Ok(vec![self.begin(Phase::Focusing, minutes_to_secs(c.focus_minutes))])
            }
        }
    }

    /// Strict only: apply the block and start the countdown.
    pub async fn confirm(&mut self) -> Result<Vec<SessionEvent>, SessionError> {
        let SessionConfig::Strict(c) = self.config else {
            return Err(self.invalid("confirm"));
        };
        if self.phase != Phase::PendingConfirmation {
            return Err(self.invalid("confirm"));
        }

        self.blocker.apply(&self.domains).await?;
        Ok(vec![self.begin(Phase::Active, hours_to_secs(c.duration_hours))])
    }

    /// Strict only: back out before anything was blocked.
    pub fn cancel(&mut self) -> Result<Vec<SessionEvent>, SessionError> {
        if self.mode() != Mode::Strict || self.phase != Phase::PendingConfirmation {
            return Err(self.invalid("cancel"));
        }
        let mode = self.mode();
        self.finish();
        tracing::info!(%mode, "strict session cancelled before confirmation");
        Ok(vec![SessionEvent::ConfirmationCancelled {
            mode,
            at: Utc::now(),
        }])
    }

    /// End the session early and release the block.
    ///
    /// If the block cannot be cleared the session keeps running.
    pub async fn stop(&mut self) -> Result<Vec<SessionEvent>, SessionError> {
        let mode = self.mode();
        match (mode, self.phase) {
            (_, Phase::Idle) => Err(SessionError::NotRunning),
            (Mode::Strict, Phase::Active) => {
                tracing::warn!("refusing to stop an active strict session");
                Err(SessionError::StrictLocked)
            }
            (Mode::Strict, Phase::PendingConfirmation) => self.cancel(),
            (Mode::Normal, Phase::Active) | (Mode::Pomodoro, Phase::Focusing | Phase::Breaking) => {
                self.blocker.clear().await?;
                self.finish();
                tracing::info!(%mode, "session stopped");
                Ok(vec![SessionEvent::SessionStopped {
                    mode,
                    at: Utc::now(),
                }])
            }
            _ => Err(self.invalid("stop")),
        }
    }

    /// Apply the tick that [`Session::wait_for_tick`] reported as due.
    ///
    /// Each timer tick takes exactly one second off the countdown. Without a
    /// due tick this does nothing, so calling it in a loop cannot shorten a
    /// session. When the last second elapses the phase transition runs before
    /// this returns.
    pub async fn tick(&mut self) -> Vec<SessionEvent> {
        if !std::mem::take(&mut self.tick_due) {
            return Vec::new();
        }
        let Some(remaining) = self.remaining_secs else {
            return Vec::new();
        };

        if remaining > 1 {
            let remaining = remaining - 1;
            self.remaining_secs = Some(remaining);
            return vec![SessionEvent::Tick {
                mode: self.mode(),
                phase: self.phase,
                remaining_secs: remaining,
                at: Utc::now(),
            }];
        }

        self.remaining_secs = Some(0);
        self.ticker = None;
        self.countdown_elapsed().await
    }

    /// Wait for the next timer tick and apply it.
    ///
    /// Returns `None` when no countdown is running.
    pub async fn next_tick(&mut self) -> Option<Vec<SessionEvent>> {
        if !self.wait_for_tick().await {
            return None;
        }
        Some(self.tick().await)
    }

    /// Wait until the next tick is due without applying it.
    ///
    /// Cancel-safe, so it can race other futures in `select!`. Returns
    /// `false` immediately when no countdown is running.
    pub async fn wait_for_tick(&mut self) -> bool {
        match self.ticker.as_mut() {
            Some(ticker) => {
                ticker.tick().await;
                self.tick_due = true;
                true
            }
            None => false,
        }
    }

    async fn countdown_elapsed(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        match (self.config, self.phase) {
            (SessionConfig::Normal(_), Phase::Active) => {
                events.extend(self.update_block(BlockOperation::Clear).await);
                self.notify(Notification::session_complete());
                events.push(self.complete(1));
            }
            (SessionConfig::Strict(_), Phase::Active) => {
                self.notify(Notification::strict_complete());
                events.extend(self.update_block(BlockOperation::Clear).await);
                events.push(self.complete(1));
            }
            (SessionConfig::Pomodoro(c), Phase::Focusing) => {
                self.notify(Notification::focus_complete());
                events.extend(self.update_block(BlockOperation::Clear).await);
                events.push(self.switch(Phase::Breaking, minutes_to_secs(c.break_minutes)));
            }
            (SessionConfig::Pomodoro(c), Phase::Breaking) if self.cycle_index < c.cycles => {
                self.cycle_index += 1;
                self.notify(Notification::break_complete());
                events.extend(self.update_block(BlockOperation::Apply).await);
                events.push(self.switch(Phase::Focusing, minutes_to_secs(c.focus_minutes)));
            }
            (SessionConfig::Pomodoro(c), Phase::Breaking) => {
                self.notify(Notification::pomodoro_complete(c.cycles));
                events.extend(self.update_block(BlockOperation::Clear).await);
                events.push(self.complete(c.cycles));
            }
            (config, phase) => {
                tracing::warn!(mode = %config.mode(), %phase, "countdown elapsed outside a counting phase");
                self.remaining_secs = None;
            }
        }
        events
    }

    /// Countdown-driven block update. Failures are reported, never raised.
    async fn update_block(&self, operation: BlockOperation) -> Option<SessionEvent> {
        let result = match operation {
            BlockOperation::Apply => self.blocker.apply(&self.domains).await,
            BlockOperation::Clear => self.blocker.clear().await,
        };
        let err = result.err()?;
        tracing::warn!(mode = %self.mode(), ?operation, error = %err, "block update failed during phase change");
        Some(SessionEvent::BlockFailed {
            mode: self.mode(),
            operation,
            error: err.to_string(),
            at: Utc::now(),
        })
    }

    fn notify(&self, notification: Notification) {
        if let Err(e) = self.notifier.notify(&notification) {
            tracing::warn!(title = %notification.title, error = %e, "notification not delivered");
        }
    }

    fn begin(&mut self, phase: Phase, secs: u64) -> SessionEvent {
        self.enter_countdown(phase, secs);
        tracing::info!(mode = %self.mode(), %phase, secs, "session started");
        SessionEvent::SessionStarted {
            mode: self.mode(),
            phase,
            cycle_index: self.cycle_index,
            duration_secs: secs,
            at: Utc::now(),
        }
    }

    fn switch(&mut self, to: Phase, secs: u64) -> SessionEvent {
        let from = self.phase;
        self.enter_countdown(to, secs);
        tracing::info!(mode = %self.mode(), %from, %to, cycle = self.cycle_index, "phase changed");
        SessionEvent::PhaseChanged {
            mode: self.mode(),
            from,
            to,
            cycle_index: self.cycle_index,
            duration_secs: secs,
            at: Utc::now(),
        }
    }

    fn complete(&mut self, cycles_completed: u32) -> SessionEvent {
        let mode = self.mode();
        self.finish();
        tracing::info!(%mode, cycles_completed, "session completed");
        SessionEvent::SessionCompleted {
            mode,
            cycles_completed,
            at: Utc::now(),
        }
    }

    fn enter_countdown(&mut self, phase: Phase, secs: u64) {
        self.phase = phase;
        self.remaining_secs = Some(secs);
        self.phase_total_secs = Some(secs);
        let mut ticker = time::interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.ticker = Some(ticker);
        self.tick_due = false;
    }

    fn finish(&mut self) {
        self.phase = Phase::Idle;
        self.remaining_secs = None;
        self.phase_total_secs = None;
        self.ticker = None;
        self.tick_due = false;
        self.cycle_index = 1;
        self.domains.clear();
    }

    fn invalid(&self, action: &'static str) -> SessionError {
        if self.is_idle() {
            SessionError::NotRunning
        } else {
            SessionError::InvalidTransition {
                mode: self.mode(),
                phase: self.phase,
                action,
            }
        }
    }
}
