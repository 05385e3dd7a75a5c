//! Timed blocking sessions.
//!
//! A [`Session`] is a tick-driven state machine. It owns its own 1 Hz timer
//! and calls the [`Blocker`](crate::hosts::Blocker) whenever a policy says the
//! sites must be blocked or released.
//!
//! ## State Transitions
//!
//! ```text
//! Normal:   Idle -> Active -> Idle
//! Pomodoro: Idle -> Focusing <-> Breaking -> Idle
//! Strict:   Idle -> PendingConfirmation -> Active -> Idle   (no stop once Active)
//! ```

mod controller;
mod machine;

pub use controller::SessionController;
pub use machine::{Session, SessionSnapshot};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Normal,
    Pomodoro,
    Strict,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Normal => "normal",
            Mode::Pomodoro => "pomodoro",
            Mode::Strict => "strict",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    /// Strict only: waiting for the user to acknowledge there is no way back.
    PendingConfirmation,
    /// Normal and Strict: sites are blocked.
    Active,
    /// Pomodoro: sites are blocked.
    Focusing,
    /// Pomodoro: sites are released.
    Breaking,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Idle => "idle",
            Phase::PendingConfirmation => "pending confirmation",
            Phase::Active => "active",
            Phase::Focusing => "focusing",
            Phase::Breaking => "breaking",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalConfig {
    pub duration_hours: f64,
}

impl NormalConfig {
    pub const MIN_HOURS: f64 = 0.1;
    pub const MAX_HOURS: f64 = 24.0;
}

impl Default for NormalConfig {
    fn default() -> Self {
        Self {
            duration_hours: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PomodoroConfig {
    pub focus_minutes: u32,
    pub break_minutes: u32,
    pub cycles: u32,
}

impl Default for PomodoroConfig {
    fn default() -> Self {
        Self {
            focus_minutes: 25,
            break_minutes: 5,
            cycles: 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrictConfig {
    pub duration_hours: f64,
}

impl StrictConfig {
    pub const MIN_HOURS: f64 = 0.5;
    pub const MAX_HOURS: f64 = 24.0;
}

impl Default for StrictConfig {
    fn default() -> Self {
        Self {
            duration_hours: 1.0,
        }
    }
}

/// What the user asked for when starting a session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum SessionConfig {
    Normal(NormalConfig),
    Pomodoro(PomodoroConfig),
    Strict(StrictConfig),
}

impl SessionConfig {
    pub fn mode(&self) -> Mode {
        match self {
            SessionConfig::Normal(_) => Mode::Normal,
            SessionConfig::Pomodoro(_) => Mode::Pomodoro,
            SessionConfig::Strict(_) => Mode::Strict,
        }
    }

    /// Number of focus cycles; one for the single-phase modes.
    pub fn cycle_total(&self) -> u32 {
        match self {
            SessionConfig::Pomodoro(c) => c.cycles,
            SessionConfig::Normal(_) | SessionConfig::Strict(_) => 1,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            SessionConfig::Normal(c) => check_range(
                "duration_hours",
                c.duration_hours,
                NormalConfig::MIN_HOURS,
                NormalConfig::MAX_HOURS,
            ),
            SessionConfig::Strict(c) => check_range(
                "duration_hours",
                c.duration_hours,
                StrictConfig::MIN_HOURS,
                StrictConfig::MAX_HOURS,
            ),
            SessionConfig::Pomodoro(c) => {
                check_range("focus_minutes", c.focus_minutes.into(), 1.0, 60.0)?;
                check_range("break_minutes", c.break_minutes.into(), 1.0, 30.0)?;
                check_range("cycles", c.cycles.into(), 1.0, 10.0)
            }
        }
    }
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ValidationError> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

/// Whole seconds in `hours`, rounded to the nearest second.
pub fn hours_to_secs(hours: f64) -> u64 {
    (hours * 3600.0).round() as u64
}

pub fn minutes_to_secs(minutes: u32) -> u64 {
    u64::from(minutes) * 60
}

/// Render seconds as `HH:MM:SS`; no countdown renders as zeros.
pub fn format_hms(seconds: Option<u64>) -> String {
    let s = seconds.unwrap_or(0);
    format!("{:02}:{:02}:{:02}", s / 3600, (s % 3600) / 60, s % 60)
}

/// Encouragement shown during a strict session.
pub fn strict_encouragement(remaining_secs: u64) -> &'static str {
    match remaining_secs {
        s if s > 3600 => "Keep going strong!",
        s if s > 1800 => "Past the halfway mark of the last hour!",
        s if s > 600 => "Final stretch!",
        _ => "Almost there!",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_hms_pads_fields() {
        assert_eq!(format_hms(None), "00:00:00");
        assert_eq!(format_hms(Some(360)), "00:06:00");
        assert_eq!(format_hms(Some(3 * 3600 + 5 * 60 + 9)), "03:05:09");
    }

    #[test]
    fn hours_round_to_whole_seconds() {
        assert_eq!(hours_to_secs(0.1), 360);
        assert_eq!(hours_to_secs(1.5), 5400);
        assert_eq!(minutes_to_secs(25), 1500);
    }

    #[test]
    fn validation_ranges() {
        assert!(SessionConfig::Normal(NormalConfig { duration_hours: 0.1 }).validate().is_ok());
        assert!(SessionConfig::Normal(NormalConfig { duration_hours: 0.0 }).validate().is_err());
        assert!(SessionConfig::Normal(NormalConfig { duration_hours: f64::NAN }).validate().is_err());
        assert!(SessionConfig::Strict(StrictConfig { duration_hours: 0.25 }).validate().is_err());
        assert!(SessionConfig::Strict(StrictConfig { duration_hours: 24.0 }).validate().is_ok());

        let bad_cycles = SessionConfig::Pomodoro(PomodoroConfig {
            cycles: 0,
            ..PomodoroConfig::default()
        });
        assert_eq!(
            bad_cycles.validate(),
            Err(ValidationError::OutOfRange {
                field: "cycles",
                value: 0.0,
                min: 1.0,
                max: 10.0,
            })
        );
    }

    #[test]
    fn config_serializes_with_mode_tag() {
        let json = serde_json::to_value(SessionConfig::Pomodoro(PomodoroConfig::default())).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"mode": "pomodoro", "focus_minutes": 25, "break_minutes": 5, "cycles": 4})
        );
    }

    #[test]
    fn encouragement_by_remaining_time() {
        assert_eq!(strict_encouragement(7200), "Keep going strong!");
        assert_eq!(strict_encouragement(700), "Final stretch!");
        assert_eq!(strict_encouragement(60), "Almost there!");
    }
}
