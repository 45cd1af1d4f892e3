//! Progression engine.
//!
//! Pure functions over [`ProgressionState`]: every operation takes a state
//! value and returns a new one. Persistence and concurrency control belong to
//! the caller.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Highest reachable level.
pub const MAX_LEVEL: u32 = 11;

/// Minimum XP for each level; index `i` is the threshold of level `i + 1`.
pub const LEVEL_THRESHOLDS: [u64; MAX_LEVEL as usize] = [
    0, 500, 1_200, 2_200, 3_500, 5_000, 7_000, 9_500, 12_500, 16_000, 20_000,
];

/// Progression attributes carried by every student account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionState {
    /// Cumulative experience points.
    pub xp: u64,
    /// Level derived from `xp`.
    pub level: u32,
    /// Secondary reward currency.
    pub gems: u64,
    /// Consecutive active days.
    pub streak: u32,
    /// Last day with a qualifying activity.
    pub last_active_date: Option<NaiveDate>,
}

impl ProgressionState {
    /// State of a freshly created account.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            xp: 0,
            level: 1,
            gems: 0,
            streak: 0,
            last_active_date: None,
        }
    }
}

impl Default for ProgressionState {
    fn default() -> Self {
        Self::new()
    }
}

/// Base amounts an activity or game pays out for a perfect score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseReward {
    /// XP for a ratio of exactly 1.
    pub xp: u32,
    /// Gems for a ratio of exactly 1.
    pub gems: u32,
}

/// Result of [`apply_reward`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardOutcome {
    /// State after the reward was added.
    pub state: ProgressionState,
    /// XP added by this reward.
    pub xp_awarded: u64,
    /// Gems added by this reward.
    pub gems_awarded: u64,
}

/// Derives the level for a total amount of XP.
///
/// Thresholds are inclusive lower bounds: 500 XP is level 2.
#[must_use]
pub fn compute_level(xp: u64) -> u32 {
    // Thresholds ascend, so the last one reached names the level.
    (1..)
        .zip(LEVEL_THRESHOLDS)
        .take_while(|&(_, threshold)| threshold <= xp)
        .last()
        .map_or(1, |(level, _)| level)
}

/// XP total at which `level + 1` begins, or `None` from [`MAX_LEVEL`] up.
#[must_use]
pub fn next_level_threshold(level: u32) -> Option<u64> {
    let index = usize::try_from(level).ok()?;
    LEVEL_THRESHOLDS.get(index).copied()
}

/// XP still missing before the next level, or `None` at [`MAX_LEVEL`].
#[must_use]
pub fn xp_to_next_level(xp: u64) -> Option<u64> {
    next_level_threshold(compute_level(xp)).map(|threshold| threshold - xp)
}

/// Fraction of the base reward earned for a score.
///
/// A non-positive (or non-finite) `max_score` yields 0. Scores above the
/// maximum are not clamped.
#[must_use]
pub fn reward_ratio(raw_score: f64, max_score: f64) -> f64 {
    if max_score.is_finite() && max_score > 0.0 {
        raw_score / max_score
    } else {
        0.0
    }
}

/// Scales a base amount by `ratio`, rounding half up. Never negative.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn scale_reward(base: u32, ratio: f64) -> u64 {
    let scaled = (f64::from(base) * ratio + 0.5).floor();
    if scaled.is_nan() || scaled <= 0.0 {
        0
    } else {
        // Saturating float-to-int cast.
        scaled as u64
    }
}

/// Adds a score-scaled reward to `state` and recomputes its level.
#[must_use]
pub fn apply_reward(
    state: &ProgressionState,
    raw_score: f64,
    max_score: f64,
    base: BaseReward,
) -> RewardOutcome {
    let ratio = reward_ratio(raw_score, max_score);
    let xp_awarded = scale_reward(base.xp, ratio);
    let gems_awarded = scale_reward(base.gems, ratio);

    let xp = state.xp.saturating_add(xp_awarded);
    let next = ProgressionState {
        xp,
        level: compute_level(xp),
        gems: state.gems.saturating_add(gems_awarded),
        ..*state
    };

    RewardOutcome {
        state: next,
        xp_awarded,
        gems_awarded,
    }
}

/// How a login on a given day changes the streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakTransition {
    /// First activity ever, or a gap of more than one day.
    Reset,
    /// Activity on the day after the last one.
    Increment,
    /// Same day as the last activity, or a date before it.
    Hold,
}

impl StreakTransition {
    /// Classifies `today` against the last active date by whole-day gap.
    #[must_use]
    pub fn classify(last_active_date: Option<NaiveDate>, today: NaiveDate) -> Self {
        let Some(last) = last_active_date else {
            return Self::Reset;
        };
        match (today - last).num_days() {
            1 => Self::Increment,
            gap if gap > 1 => Self::Reset,
            _ => Self::Hold,
        }
    }
}

/// Records activity on `today`.
///
/// A `Hold` never moves `last_active_date`, so a backdated call cannot
/// regress it.
#[must_use]
pub fn update_streak(state: &ProgressionState, today: NaiveDate) -> ProgressionState {
    match StreakTransition::classify(state.last_active_date, today) {
        StreakTransition::Reset => ProgressionState {
            streak: 1,
            last_active_date: Some(today),
            ..*state
        },
        StreakTransition::Increment => ProgressionState {
            streak: state.streak.saturating_add(1),
            last_active_date: Some(today),
            ..*state
        },
        StreakTransition::Hold => ProgressionState {
            streak: state.streak.max(1),
            ..*state
        },
    }
}

/// Overwrites the XP total. The only operation allowed to lower XP.
#[must_use]
pub fn correct_experience(state: &ProgressionState, xp: u64) -> ProgressionState {
    ProgressionState {
        xp,
        level: compute_level(xp),
        ..*state
    }
}
