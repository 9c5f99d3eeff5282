use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which kind of session the clock is counting down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    Focus,
    ShortBreak,
    LongBreak,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Focus, Mode::ShortBreak, Mode::LongBreak];

    pub fn is_focus(self) -> bool {
        self == Mode::Focus
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Focus => "FOCUS",
            Mode::ShortBreak => "SHORT_BREAK",
            Mode::LongBreak => "LONG_BREAK",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Mode::Focus => "Focus",
            Mode::ShortBreak => "Short Break",
            Mode::LongBreak => "Long Break",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    /// Accepts `focus`, `short-break`, `long-break` and the stored
    /// upper-case names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "focus" => Ok(Mode::Focus),
            "short-break" | "short" | "break" => Ok(Mode::ShortBreak),
            "long-break" | "long" => Ok(Mode::LongBreak),
            other => Err(format!("unknown mode: {other}")),
        }
    }
}

/// Configured length of each mode, in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeDurations {
    pub focus_min: u32,
    pub short_break_min: u32,
    pub long_break_min: u32,
}

impl ModeDurations {
    pub fn minutes(&self, mode: Mode) -> u32 {
        match mode {
            Mode::Focus => self.focus_min,
            Mode::ShortBreak => self.short_break_min,
            Mode::LongBreak => self.long_break_min,
        }
    }

    /// Duration in whole seconds. Zero-minute entries are treated as one
    /// minute so a session always has something to count down.
    pub fn seconds(&self, mode: Mode) -> u64 {
        u64::from(self.minutes(mode).max(1)).saturating_mul(60)
    }
}

impl Default for ModeDurations {
    fn default() -> Self {
        Self {
            focus_min: 25,
            short_break_min: 5,
            long_break_min: 15,
        }
    }
}
