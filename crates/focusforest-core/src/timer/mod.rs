//! Session timer: the clock state machine, stage derivation, the tick
//! source and the task that drives them.

mod clock;
mod mode;
mod runner;
mod stage;
mod ticker;

pub use clock::{SessionClock, SessionSummary, TimerState};
pub use mode::{Mode, ModeDurations};
pub use runner::{Command, SessionHandle, SessionRunner};
pub use stage::{derive_stage, stage_for, Stage};
pub use ticker::{TickId, Ticker, TICK_INTERVAL};
