//! Analytics over the session history.
//!
//! Everything is derived from the persisted [`SessionLog`]s; nothing here is
//! stored. Hours and "today" are taken in the time zone of `now`.

use chrono::{DateTime, TimeZone, Timelike};
use serde::{Deserialize, Serialize};

use crate::storage::SessionLog;

/// How many logs the dashboard lists.
pub const RECENT_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
}

impl TimeOfDay {
    /// Morning is 06-12, afternoon 12-18, everything else evening.
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            6..=11 => TimeOfDay::Morning,
            12..=17 => TimeOfDay::Afternoon,
            _ => TimeOfDay::Evening,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TimeOfDay::Morning => "Morning",
            TimeOfDay::Afternoon => "Afternoon",
            TimeOfDay::Evening => "Evening",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    /// Minutes of completed focus started today.
    pub today_focus_minutes: u64,
    /// Completed focus sessions, all time.
    pub total_sessions: usize,
    pub total_focus_minutes: u64,
    /// Percentage of logged sessions (any mode) that completed, rounded.
    pub completion_rate: u32,
    pub best_time_of_day: TimeOfDay,
    /// Mean length of a completed focus session.
    pub average_minutes: f64,
    pub total_distractions: u64,
    /// Newest first.
    pub recent: Vec<SessionLog>,
}

impl Stats {
    pub fn from_logs<Tz: TimeZone>(logs: &[SessionLog], now: &DateTime<Tz>) -> Self {
        let tz = now.timezone();
        let today = now.date_naive();

        let completed_focus: Vec<&SessionLog> = logs
            .iter()
            .filter(|l| l.completed && l.mode.is_focus())
            .collect();

        let today_focus_minutes = completed_focus
            .iter()
            .filter(|l| l.started_at.with_timezone(&tz).date_naive() == today)
            .map(|l| l.duration_minutes)
            .sum();
        let total_focus_minutes: u64 = completed_focus.iter().map(|l| l.duration_minutes).sum();
        let total_sessions = completed_focus.len();

        let completion_rate = if logs.is_empty() {
            0
        } else {
            let done = logs.iter().filter(|l| l.completed).count();
            ((done as f64 / logs.len() as f64) * 100.0).round() as u32
        };

        let average_minutes = if total_sessions == 0 {
            0.0
        } else {
            total_focus_minutes as f64 / total_sessions as f64
        };

        let mut by_period = [0usize; 3];
        for log in logs.iter().filter(|l| l.completed) {
            let hour = log.started_at.with_timezone(&tz).hour();
            by_period[TimeOfDay::from_hour(hour) as usize] += 1;
        }
        let [morning, afternoon, evening] = by_period;
        let best_time_of_day = if morning > afternoon && morning > evening {
            TimeOfDay::Morning
        } else if afternoon > morning && afternoon > evening {
            TimeOfDay::Afternoon
        } else {
            TimeOfDay::Evening
        };

        let total_distractions = logs.iter().map(|l| u64::from(l.distractions)).sum();

        let mut recent: Vec<SessionLog> = logs.to_vec();
        recent.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        recent.truncate(RECENT_LIMIT);

        Self {
            today_focus_minutes,
            total_sessions,
            total_focus_minutes,
            completion_rate,
            best_time_of_day,
            average_minutes,
            total_distractions,
            recent,
        }
    }
}
