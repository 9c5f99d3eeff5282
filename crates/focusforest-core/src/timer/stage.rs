//! Growth stage derivation.
//!
//! Maps session progress to the discrete tree stage shown by the front-end.
//! Pure and stateless, so it is safe to call on every tick.

use serde::{Deserialize, Serialize};

use super::clock::TimerState;
use super::mode::Mode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    Seed,
    Sprout,
    Sapling,
    Tree,
    Flowering,
    Fruiting,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Seed => "SEED",
            Stage::Sprout => "SPROUT",
            Stage::Sapling => "SAPLING",
            Stage::Tree => "TREE",
            Stage::Flowering => "FLOWERING",
            Stage::Fruiting => "FRUITING",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Stage::Seed => "🌰",
            Stage::Sprout => "🌱",
            Stage::Sapling => "🌿",
            Stage::Tree => "🌳",
            Stage::Flowering => "🌸",
            Stage::Fruiting => "🍎",
        }
    }
}

/// Upper (exclusive) progress bound for each stage, checked in order.
const THRESHOLDS: [(f64, Stage); 5] = [
    (0.10, Stage::Seed),
    (0.30, Stage::Sprout),
    (0.60, Stage::Sapling),
    (0.90, Stage::Tree),
    (1.00, Stage::Flowering),
];

/// Stage for a focus session at `progress` (0.0 ..= 1.0).
///
/// Break modes always show a sapling.
pub fn stage_for(mode: Mode, progress: f64) -> Stage {
    if !mode.is_focus() {
        return Stage::Sapling;
    }
    THRESHOLDS
        .iter()
        .find(|(bound, _)| progress < *bound)
        .map(|(_, stage)| *stage)
        .unwrap_or(Stage::Fruiting)
}

/// Stage as displayed: a completed session always shows fruit, whatever the
/// arithmetic says about the remaining time.
pub fn derive_stage(mode: Mode, progress: f64, state: TimerState) -> Stage {
    if state == TimerState::Completed {
        return Stage::Fruiting;
    }
    stage_for(mode, progress)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn focus_thresholds() {
        assert_eq!(stage_for(Mode::Focus, 0.0), Stage::Seed);
        assert_eq!(stage_for(Mode::Focus, 0.099), Stage::Seed);
        assert_eq!(stage_for(Mode::Focus, 0.10), Stage::Sprout);
        assert_eq!(stage_for(Mode::Focus, 0.30), Stage::Sapling);
        assert_eq!(stage_for(Mode::Focus, 0.60), Stage::Tree);
        assert_eq!(stage_for(Mode::Focus, 0.90), Stage::Flowering);
        assert_eq!(stage_for(Mode::Focus, 0.999), Stage::Flowering);
        assert_eq!(stage_for(Mode::Focus, 1.0), Stage::Fruiting);
    }

    #[test]
    fn breaks_are_always_saplings() {
        for mode in [Mode::ShortBreak, Mode::LongBreak] {
            for p in [0.0, 0.05, 0.5, 0.95, 1.0] {
                assert_eq!(stage_for(mode, p), Stage::Sapling);
            }
        }
    }

    #[test]
    fn completed_forces_fruiting() {
        assert_eq!(
            derive_stage(Mode::Focus, 0.9999, TimerState::Completed),
            Stage::Fruiting
        );
        assert_eq!(
            derive_stage(Mode::ShortBreak, 1.0, TimerState::Completed),
            Stage::Fruiting
        );
        assert_eq!(
            derive_stage(Mode::Focus, 0.9999, TimerState::Running),
            Stage::Flowering
        );
    }

    proptest! {
        #[test]
        fn same_input_same_stage(p in 0.0f64..=1.0) {
            prop_assert_eq!(stage_for(Mode::Focus, p), stage_for(Mode::Focus, p));
        }

        #[test]
        fn focus_stage_never_regresses(a in 0.0f64..=1.0, b in 0.0f64..=1.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(stage_for(Mode::Focus, lo) <= stage_for(Mode::Focus, hi));
        }
    }
}
