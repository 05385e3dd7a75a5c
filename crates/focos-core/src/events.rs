use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::{Mode, Phase};

/// Which side of the block a failed call was trying to reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockOperation {
    Apply,
    Clear,
}

/// Every session state change produces an Event.
/// The CLI renders them; tests assert on them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    SessionStarted {
        mode: Mode,
        phase: Phase,
        cycle_index: u32,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    /// Strict only: the block is not applied until confirmed.
    ConfirmationRequested {
        mode: Mode,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    ConfirmationCancelled {
        mode: Mode,
        at: DateTime<Utc>,
    },
    Tick {
        mode: Mode,
        phase: Phase,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    PhaseChanged {
        mode: Mode,
        from: Phase,
        to: Phase,
        cycle_index: u32,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    SessionCompleted {
        mode: Mode,
        cycles_completed: u32,
        at: DateTime<Utc>,
    },
    SessionStopped {
        mode: Mode,
        at: DateTime<Utc>,
    },
    /// A countdown-driven apply/clear failed; the transition still happened.
    BlockFailed {
        mode: Mode,
        operation: BlockOperation,
        error: String,
        at: DateTime<Utc>,
    },
}

impl SessionEvent {
    /// True for the events that end a session.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionEvent::SessionCompleted { .. }
                | SessionEvent::SessionStopped { .. }
                | SessionEvent::ConfirmationCancelled { .. }
        )
    }
}
