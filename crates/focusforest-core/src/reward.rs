//! Collectible fruit granted for completed focus sessions.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FruitKind {
    Apple,
    Orange,
    Lemon,
    Cherry,
    Blueberry,
}

impl FruitKind {
    pub const ALL: [FruitKind; 5] = [
        FruitKind::Apple,
        FruitKind::Orange,
        FruitKind::Lemon,
        FruitKind::Cherry,
        FruitKind::Blueberry,
    ];

    /// Uniform pick over the five kinds.
    pub fn pick<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FruitKind::Apple => "APPLE",
            FruitKind::Orange => "ORANGE",
            FruitKind::Lemon => "LEMON",
            FruitKind::Cherry => "CHERRY",
            FruitKind::Blueberry => "BLUEBERRY",
        }
    }

    /// Lower-case name used in prompts.
    pub fn name(self) -> &'static str {
        match self {
            FruitKind::Apple => "apple",
            FruitKind::Orange => "orange",
            FruitKind::Lemon => "lemon",
            FruitKind::Cherry => "cherry",
            FruitKind::Blueberry => "blueberry",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            FruitKind::Apple => "🍎",
            FruitKind::Orange => "🍊",
            FruitKind::Lemon => "🍋",
            FruitKind::Cherry => "🍒",
            FruitKind::Blueberry => "🫐",
        }
    }
}

impl fmt::Display for FruitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FruitKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown fruit: {s}"))
    }
}

/// A fruit in the garden. Never mutated; removed only when sold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    pub id: String,
    pub kind: FruitKind,
    pub earned_at: DateTime<Utc>,
    pub subject: String,
    #[serde(default)]
    pub fact: Option<String>,
}

impl Reward {
    pub fn new(kind: FruitKind, subject: impl Into<String>, fact: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            earned_at: Utc::now(),
            subject: subject.into(),
            fact: Some(fact.into()),
        }
    }
}
