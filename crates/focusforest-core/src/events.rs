use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::content::BreakActivity;
use crate::reward::Reward;
use crate::timer::{Mode, SessionSummary, Stage, TimerState};

/// Every state change in the engine produces an Event.
/// The front-end renders from them; the driver forwards them on its
/// event channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarted {
        mode: Mode,
        duration_secs: u64,
        subject: String,
        at: DateTime<Utc>,
    },
    SessionPaused {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    SessionResumed {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    Tick {
        remaining_secs: u64,
        progress: f64,
        stage: Stage,
    },
    SessionCompleted {
        session: SessionSummary,
    },
    /// Back to IDLE. `abandoned` carries the unfinished session, if one had
    /// been started.
    SessionReset {
        mode: Mode,
        abandoned: Option<SessionSummary>,
        at: DateTime<Utc>,
    },
    ModeSwitched {
        mode: Mode,
        duration_secs: u64,
        abandoned: Option<SessionSummary>,
        at: DateTime<Utc>,
    },
    DistractionRecorded {
        count: u32,
        at: DateTime<Utc>,
    },
    RewardEarned {
        reward: Reward,
    },
    BreakActivityReady {
        activity: BreakActivity,
    },
    AutoAdvanceScheduled {
        mode: Mode,
        delay_secs: u64,
    },
    StateSnapshot {
        state: TimerState,
        mode: Mode,
        subject: String,
        remaining_secs: u64,
        duration_secs: u64,
        progress: f64,
        stage: Stage,
        distraction_count: u32,
        at: DateTime<Utc>,
    },
}
