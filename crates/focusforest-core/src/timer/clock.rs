//! Session clock implementation.
//!
//! The clock is a plain state machine over whole seconds. It does not own a
//! timer - the driver (or a test) calls `tick()` once per elapsed second.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//!           |
//!           v
//!       Completed
//! (any) -> Idle         via reset() / switch_mode()
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut clock = SessionClock::new(ModeDurations::default(), Mode::Focus);
//! clock.start();
//! // Once per second:
//! clock.tick(); // Returns Some(Event::SessionCompleted) on the last second
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::mode::{Mode, ModeDurations};
use super::stage::{derive_stage, Stage};
use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    Completed,
}

/// Everything the completion side needs to know about a session that
/// ended, either by running out or by being abandoned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub mode: Mode,
    /// Configured length, not time actually spent.
    pub duration_secs: u64,
    pub remaining_secs: u64,
    pub subject: String,
    pub distraction_count: u32,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub completed: bool,
}

impl SessionSummary {
    pub fn elapsed_secs(&self) -> u64 {
        self.duration_secs.saturating_sub(self.remaining_secs)
    }
}

/// Countdown for a single session.
///
/// Invariant: `0 <= remaining_secs <= duration_secs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClock {
    durations: ModeDurations,
    mode: Mode,
    state: TimerState,
    duration_secs: u64,
    remaining_secs: u64,
    distraction_count: u32,
    #[serde(default)]
    started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    subject: String,
    /// Bumped whenever the session is thrown away, so late asynchronous
    /// results for an older session can be recognised and dropped.
    #[serde(default)]
    generation: u64,
    /// Focus sessions completed on this clock; drives long-break placement.
    #[serde(default)]
    completed_focus: u32,
}

impl SessionClock {
    /// Create an idle clock for `mode` with a full countdown.
    pub fn new(durations: ModeDurations, mode: Mode) -> Self {
        let duration_secs = durations.seconds(mode);
        Self {
            durations,
            mode,
            state: TimerState::Idle,
            duration_secs,
            remaining_secs: duration_secs,
            distraction_count: 0,
            started_at: None,
            subject: String::new(),
            generation: 0,
            completed_focus: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn duration_secs(&self) -> u64 {
        self.duration_secs
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn distraction_count(&self) -> u32 {
        self.distraction_count
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn completed_focus_count(&self) -> u32 {
        self.completed_focus
    }

    pub fn durations(&self) -> ModeDurations {
        self.durations
    }

    /// 0.0 .. 1.0 progress within the current session.
    pub fn progress(&self) -> f64 {
        if self.duration_secs == 0 {
            return 0.0;
        }
        let elapsed = self.duration_secs.saturating_sub(self.remaining_secs);
        elapsed as f64 / self.duration_secs as f64
    }

    pub fn stage(&self) -> Stage {
        derive_stage(self.mode, self.progress(), self.state)
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            state: self.state,
            mode: self.mode,
            subject: self.subject.clone(),
            remaining_secs: self.remaining_secs,
            duration_secs: self.duration_secs,
            progress: self.progress(),
            stage: self.stage(),
            distraction_count: self.distraction_count,
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Set the subject label. Only allowed while idle.
    pub fn set_subject(&mut self, subject: impl Into<String>) -> bool {
        if self.state != TimerState::Idle {
            return false;
        }
        self.subject = subject.into();
        true
    }

    /// Replace the configured durations. An idle clock picks the new length
    /// up immediately; otherwise it applies from the next session.
    pub fn set_durations(&mut self, durations: ModeDurations) {
        self.durations = durations;
        if self.state == TimerState::Idle {
            self.duration_secs = durations.seconds(self.mode);
            self.remaining_secs = self.duration_secs;
        }
    }

    pub fn start(&mut self) -> Option<Event> {
        match self.state {
            TimerState::Idle => {
                self.state = TimerState::Running;
                let now = Utc::now();
                self.started_at.get_or_insert(now);
                tracing::debug!(mode = %self.mode, duration_secs = self.duration_secs, "session started");
                Some(Event::SessionStarted {
                    mode: self.mode,
                    duration_secs: self.duration_secs,
                    subject: self.subject.clone(),
                    at: now,
                })
            }
            TimerState::Paused => {
                self.state = TimerState::Running;
                tracing::debug!(remaining_secs = self.remaining_secs, "session resumed");
                Some(Event::SessionResumed {
                    remaining_secs: self.remaining_secs,
                    at: Utc::now(),
                })
            }
            // Already running, or finished and waiting for a reset.
            TimerState::Running | TimerState::Completed => None,
        }
    }

    pub fn pause(&mut self) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        self.state = TimerState::Paused;
        tracing::debug!(remaining_secs = self.remaining_secs, "session paused");
        Some(Event::SessionPaused {
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Back to a full idle countdown in the current mode. Legal from any state.
    pub fn reset(&mut self) -> Option<Event> {
        let abandoned = self.discard();
        self.restore_idle();
        Some(Event::SessionReset {
            mode: self.mode,
            abandoned,
            at: Utc::now(),
        })
    }

    /// Switch to `mode`, forcing the clock back to idle.
    pub fn switch_mode(&mut self, mode: Mode) -> Option<Event> {
        let abandoned = self.discard();
        self.mode = mode;
        self.restore_idle();
        tracing::debug!(mode = %mode, duration_secs = self.duration_secs, "mode switched");
        Some(Event::ModeSwitched {
            mode,
            duration_secs: self.duration_secs,
            abandoned,
            at: Utc::now(),
        })
    }

    /// Advance by one whole second. Returns `SessionCompleted` exactly once,
    /// on the tick that reaches zero.
    pub fn tick(&mut self) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs > 0 {
            return Some(Event::Tick {
                remaining_secs: self.remaining_secs,
                progress: self.progress(),
                stage: self.stage(),
            });
        }

        self.state = TimerState::Completed;
        if self.mode.is_focus() {
            self.completed_focus = self.completed_focus.saturating_add(1);
        }
        let session = self.summary(true);
        tracing::info!(mode = %self.mode, distractions = self.distraction_count, "session completed");
        Some(Event::SessionCompleted { session })
    }

    /// Count a distraction. Only a running focus session counts.
    pub fn record_distraction(&mut self) -> Option<Event> {
        if self.state != TimerState::Running || !self.mode.is_focus() {
            return None;
        }
        self.distraction_count = self.distraction_count.saturating_add(1);
        Some(Event::DistractionRecorded {
            count: self.distraction_count,
            at: Utc::now(),
        })
    }

    /// The mode that follows the session that just completed.
    pub fn next_mode(&self, long_break_interval: u32) -> Mode {
        match self.mode {
            Mode::Focus => {
                let interval = long_break_interval.max(1);
                if self.completed_focus > 0 && self.completed_focus % interval == 0 {
                    Mode::LongBreak
                } else {
                    Mode::ShortBreak
                }
            }
            Mode::ShortBreak | Mode::LongBreak => Mode::Focus,
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn summary(&self, completed: bool) -> SessionSummary {
        let now = Utc::now();
        SessionSummary {
            mode: self.mode,
            duration_secs: self.duration_secs,
            remaining_secs: self.remaining_secs,
            subject: self.subject.clone(),
            distraction_count: self.distraction_count,
            started_at: self.started_at.unwrap_or(now),
            ended_at: now,
            completed,
        }
    }

    /// Summary of a started-but-unfinished session about to be thrown away.
    fn discard(&mut self) -> Option<SessionSummary> {
        self.generation = self.generation.wrapping_add(1);
        match self.state {
            TimerState::Running | TimerState::Paused if self.started_at.is_some() => {
                Some(self.summary(false))
            }
            _ => None,
        }
    }

    fn restore_idle(&mut self) {
        self.state = TimerState::Idle;
        self.duration_secs = self.durations.seconds(self.mode);
        self.remaining_secs = self.duration_secs;
        self.distraction_count = 0;
        self.started_at = None;
    }
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::new(ModeDurations::default(), Mode::Focus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticks(clock: &mut SessionClock, n: u64) -> Vec<Event> {
        (0..n).filter_map(|_| clock.tick()).collect()
    }

    fn short_durations() -> ModeDurations {
        ModeDurations {
            focus_min: 1,
            short_break_min: 1,
            long_break_min: 2,
        }
    }

    #[test]
    fn start_pause_resume() {
        let mut clock = SessionClock::default();
        assert_eq!(clock.state(), TimerState::Idle);
        assert_eq!(clock.remaining_secs(), 1500);

        assert!(matches!(clock.start(), Some(Event::SessionStarted { .. })));
        assert_eq!(clock.state(), TimerState::Running);
        assert!(clock.started_at().is_some());

        assert!(clock.pause().is_some());
        assert_eq!(clock.state(), TimerState::Paused);

        assert!(matches!(clock.start(), Some(Event::SessionResumed { .. })));
        assert_eq!(clock.state(), TimerState::Running);
    }

    #[test]
    fn illegal_transitions_are_no_ops() {
        let mut clock = SessionClock::default();
        assert!(clock.pause().is_none());
        assert!(clock.tick().is_none());
        assert_eq!(clock.remaining_secs(), 1500);

        clock.start();
        assert!(clock.start().is_none());
        assert_eq!(clock.state(), TimerState::Running);
    }

    #[test]
    fn pause_resume_preserves_remaining() {
        let mut clock = SessionClock::default();
        clock.start();
        ticks(&mut clock, 5);
        clock.pause();
        // Paused clocks ignore ticks.
        ticks(&mut clock, 30);
        assert_eq!(clock.remaining_secs(), 1495);
        clock.start();
        ticks(&mut clock, 5);
        assert_eq!(clock.remaining_secs(), 1490);
    }

    #[test]
    fn completes_exactly_once() {
        let mut clock = SessionClock::new(short_durations(), Mode::Focus);
        clock.start();
        let events = ticks(&mut clock, 120);
        let completions = events
            .iter()
            .filter(|e| matches!(e, Event::SessionCompleted { .. }))
            .count();
        assert_eq!(completions, 1);
        assert_eq!(clock.state(), TimerState::Completed);
        assert_eq!(clock.remaining_secs(), 0);
        assert_eq!(clock.stage(), Stage::Fruiting);
    }

    #[test]
    fn completion_summary_reports_configured_duration() {
        let mut clock = SessionClock::new(short_durations(), Mode::Focus);
        clock.set_subject("Math");
        clock.start();
        clock.record_distraction();
        let done = ticks(&mut clock, 60).pop();
        match done {
            Some(Event::SessionCompleted { session }) => {
                assert_eq!(session.duration_secs, 60);
                assert_eq!(session.subject, "Math");
                assert_eq!(session.distraction_count, 1);
                assert!(session.completed);
            }
            other => panic!("Expected SessionCompleted, got {other:?}"),
        }
    }

    #[test]
    fn completed_clock_cannot_restart() {
        let mut clock = SessionClock::new(short_durations(), Mode::Focus);
        clock.start();
        ticks(&mut clock, 60);
        assert!(clock.start().is_none());
        assert_eq!(clock.state(), TimerState::Completed);
        assert_eq!(clock.remaining_secs(), 0);
    }

    #[test]
    fn reset_from_every_state() {
        let mut clock = SessionClock::default();
        clock.reset();
        assert_eq!(clock.state(), TimerState::Idle);

        clock.start();
        ticks(&mut clock, 10);
        clock.record_distraction();
        clock.reset();
        assert_eq!(clock.state(), TimerState::Idle);
        assert_eq!(clock.remaining_secs(), clock.duration_secs());
        assert_eq!(clock.distraction_count(), 0);

        clock.start();
        clock.pause();
        clock.reset();
        assert_eq!(clock.state(), TimerState::Idle);

        let mut done = SessionClock::new(short_durations(), Mode::Focus);
        done.start();
        ticks(&mut done, 60);
        done.reset();
        assert_eq!(done.state(), TimerState::Idle);
        assert_eq!(done.remaining_secs(), 60);
    }

    #[test]
    fn reset_reports_abandoned_session() {
        let mut clock = SessionClock::default();
        match clock.reset() {
            Some(Event::SessionReset { abandoned, .. }) => assert!(abandoned.is_none()),
            other => panic!("Expected SessionReset, got {other:?}"),
        }

        clock.start();
        ticks(&mut clock, 90);
        match clock.reset() {
            Some(Event::SessionReset {
                abandoned: Some(s), ..
            }) => {
                assert!(!s.completed);
                assert_eq!(s.elapsed_secs(), 90);
            }
            other => panic!("Expected abandoned session, got {other:?}"),
        }
    }

    #[test]
    fn reset_and_switch_bump_generation() {
        let mut clock = SessionClock::default();
        let g0 = clock.generation();
        clock.reset();
        assert_eq!(clock.generation(), g0 + 1);
        clock.switch_mode(Mode::ShortBreak);
        assert_eq!(clock.generation(), g0 + 2);
    }

    #[test]
    fn switch_mode_forces_idle() {
        let mut clock = SessionClock::default();
        clock.start();
        ticks(&mut clock, 3);
        clock.switch_mode(Mode::LongBreak);
        assert_eq!(clock.state(), TimerState::Idle);
        assert_eq!(clock.mode(), Mode::LongBreak);
        assert_eq!(clock.remaining_secs(), 900);
        assert_eq!(clock.duration_secs(), 900);
    }

    #[test]
    fn distractions_only_count_in_running_focus() {
        let mut clock = SessionClock::default();
        assert!(clock.record_distraction().is_none());
        clock.start();
        assert!(clock.record_distraction().is_some());
        clock.pause();
        assert!(clock.record_distraction().is_none());
        assert_eq!(clock.distraction_count(), 1);

        clock.switch_mode(Mode::ShortBreak);
        clock.start();
        assert!(clock.record_distraction().is_none());
        assert_eq!(clock.distraction_count(), 0);
    }

    #[test]
    fn subject_is_locked_while_running() {
        let mut clock = SessionClock::default();
        assert!(clock.set_subject("History"));
        clock.start();
        assert!(!clock.set_subject("Science"));
        assert_eq!(clock.subject(), "History");
    }

    #[test]
    fn set_durations_applies_to_idle_clock() {
        let mut clock = SessionClock::default();
        clock.set_durations(short_durations());
        assert_eq!(clock.remaining_secs(), 60);

        clock.start();
        clock.set_durations(ModeDurations::default());
        assert_eq!(clock.duration_secs(), 60);
        clock.reset();
        assert_eq!(clock.duration_secs(), 1500);
    }

    #[test]
    fn every_fourth_focus_leads_to_long_break() {
        let mut clock = SessionClock::new(short_durations(), Mode::Focus);
        let mut next = Vec::new();
        for _ in 0..4 {
            clock.switch_mode(Mode::Focus);
            clock.start();
            ticks(&mut clock, 60);
            next.push(clock.next_mode(4));
        }
        assert_eq!(
            next,
            vec![Mode::ShortBreak, Mode::ShortBreak, Mode::ShortBreak, Mode::LongBreak]
        );

        clock.switch_mode(Mode::ShortBreak);
        assert_eq!(clock.next_mode(4), Mode::Focus);
    }

    #[test]
    fn stage_follows_progress() {
        let mut clock = SessionClock::new(short_durations(), Mode::Focus);
        assert_eq!(clock.stage(), Stage::Seed);
        clock.start();
        ticks(&mut clock, 6);
        assert_eq!(clock.stage(), Stage::Sprout);
        ticks(&mut clock, 30);
        assert_eq!(clock.stage(), Stage::Tree);
    }

    #[test]
    fn stage_changes_exactly_at_each_threshold() {
        let mut clock = SessionClock::new(ModeDurations::default(), Mode::Focus);
        clock.start();
        // 1500s focus: 10%, 30%, 60% and 90% elapsed.
        let mut done = 0;
        for (elapsed, stage) in [
            (150, Stage::Sprout),
            (450, Stage::Sapling),
            (900, Stage::Tree),
            (1350, Stage::Flowering),
        ] {
            ticks(&mut clock, elapsed - done - 1);
            assert_ne!(clock.stage(), stage, "one second before {elapsed}s");
            ticks(&mut clock, 1);
            assert_eq!(clock.stage(), stage, "at {elapsed}s");
            assert_eq!(clock.remaining_secs(), 1500 - elapsed);
            done = elapsed;
        }
    }

    #[test]
    fn snapshot_returns_valid_event() {
        let clock = SessionClock::default();
        match clock.snapshot() {
            Event::StateSnapshot {
                state,
                mode,
                remaining_secs,
                stage,
                ..
            } => {
                assert_eq!(state, TimerState::Idle);
                assert_eq!(mode, Mode::Focus);
                assert_eq!(remaining_secs, 25 * 60);
                assert_eq!(stage, Stage::Seed);
            }
            _ => panic!("Expected StateSnapshot"),
        }
    }
}
