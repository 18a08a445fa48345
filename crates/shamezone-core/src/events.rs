use serde::{Deserialize, Serialize};

use crate::clock::Timestamp;
use crate::settings::Tone;

/// Every state change in the goal store or settings produces an Event.
/// The scheduling orchestrator consumes them; display surfaces may poll them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    GoalAdded {
        goal_id: String,
        at: Timestamp,
    },
    ProgressLogged {
        goal_id: String,
        progress: f64,
        target: f64,
        at: Timestamp,
    },
    /// Emitted alongside `ProgressLogged` when that log reached the target.
    GoalCompleted {
        goal_id: String,
        at: Timestamp,
    },
    GoalArchived {
        goal_id: String,
        at: Timestamp,
    },
    GoalsCleared {
        count: usize,
        at: Timestamp,
    },
    /// Persisted goals were loaded into the store.
    GoalsReplaced {
        count: usize,
        at: Timestamp,
    },
    ToneChanged {
        tone: Tone,
        at: Timestamp,
    },
    ReminderTimeChanged {
        time: Option<String>,
        at: Timestamp,
    },
    TestModeChanged {
        enabled: bool,
        at: Timestamp,
    },
}

impl Event {
    /// Whether this change can alter the reminder schedule.
    pub fn affects_schedule(&self) -> bool {
        !matches!(self, Event::TestModeChanged { .. })
    }
}
