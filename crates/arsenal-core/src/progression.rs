//! Closed-form progression formulas.
//!
//! XP → rank per item, rank → score contribution, and total score → player
//! level. The level curve has two regimes: quadratic thresholds up to level
//! 30, then a linear "legendary" step of 147,500 points per level. The two are
//! joined at 30 with a hard change in slope.
//!
//! All arithmetic is integer so the boundary values are exact.

use serde::{Deserialize, Serialize};

use crate::category::Category;

/// Cap assumed when nothing else declares one.
pub const DEFAULT_CAP: u32 = 30;

/// Rank at which an item counts as mastered.
pub const MASTERED_RANK: u32 = 30;

/// Rank at which a cap-40 item counts as fully upgraded.
pub const FULLY_UPGRADED_RANK: u32 = 40;

/// Last level of the quadratic regime.
pub const STANDARD_LEVEL_CAP: u32 = 30;

const STANDARD_THRESHOLD_STEP: u64 = 2500;
const LEGENDARY_THRESHOLD_STEP: u64 = 147_500;

/// Score awarded per intrinsics sub-skill level.
pub const INTRINSIC_POINTS_PER_LEVEL: u64 = 1500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MasteryState {
    Unmastered,
    Mastered,
    FullyUpgraded,
}

impl MasteryState {
    pub fn is_mastered(self) -> bool {
        !matches!(self, Self::Unmastered)
    }
}

/// Rank reached with `xp` experience, never above `cap`.
pub fn rank_from_xp(xp: u64, category: Category, cap: u32) -> u32 {
    // floor(sqrt(x / m)) == isqrt(floor(x / m)) for non-negative x.
    let raw = (xp / category.regime().multiplier()).isqrt();
    raw.min(u64::from(cap)) as u32
}

/// XP needed to reach `cap`.
pub fn mastery_xp_for_cap(category: Category, cap: u32) -> u64 {
    let cap = u64::from(cap);
    category.regime().multiplier() * cap * cap
}

/// Score contributed by one item.
pub fn contribution(xp: u64, category: Category, cap: u32) -> u64 {
    u64::from(rank_from_xp(xp, category, cap)) * category.regime().points_per_rank()
}

pub fn mastery_state_from_rank(rank: u32, cap: u32) -> MasteryState {
    if cap > MASTERED_RANK && rank >= FULLY_UPGRADED_RANK {
        MasteryState::FullyUpgraded
    } else if rank >= MASTERED_RANK {
        MasteryState::Mastered
    } else {
        MasteryState::Unmastered
    }
}

/// Total score needed to reach player level `n`.
pub fn threshold(n: u32) -> u64 {
    let n = u64::from(n);
    let standard_cap = u64::from(STANDARD_LEVEL_CAP);
    if n <= standard_cap {
        STANDARD_THRESHOLD_STEP * n * n
    } else {
        STANDARD_THRESHOLD_STEP * standard_cap * standard_cap
            + LEGENDARY_THRESHOLD_STEP * (n - standard_cap)
    }
}

/// Player level and progress toward the next one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelProgress {
    pub level: u32,
    pub current_threshold: u64,
    pub next_threshold: u64,
    pub progress_percent: f64,
}

impl LevelProgress {
    /// Whether the level is in the linear regime beyond 30.
    pub fn is_legendary(&self) -> bool {
        self.level > STANDARD_LEVEL_CAP
    }
}

pub fn level_from_total_score(total: u64) -> LevelProgress {
    let legendary_floor = threshold(STANDARD_LEVEL_CAP);
    let level = if total >= legendary_floor {
        let tiers = (total - legendary_floor) / LEGENDARY_THRESHOLD_STEP;
        STANDARD_LEVEL_CAP.saturating_add(u32::try_from(tiers).unwrap_or(u32::MAX))
    } else {
        (total / STANDARD_THRESHOLD_STEP).isqrt() as u32
    };

    let current_threshold = threshold(level);
    let next_threshold = threshold(level.saturating_add(1));
    let span = next_threshold.saturating_sub(current_threshold);
    let progress_percent = if span == 0 {
        0.0
    } else {
        (total - current_threshold) as f64 / span as f64 * 100.0
    };

    LevelProgress {
        level,
        current_threshold,
        next_threshold,
        progress_percent,
    }
}

/// Score from the intrinsics side track.
pub fn intrinsics_score(total_levels: u64) -> u64 {
    total_levels * INTRINSIC_POINTS_PER_LEVEL
}

/// Breakdown of a player's aggregate score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerScore {
    pub item_score: u64,
    pub intrinsics_score: u64,
    pub exploration_score: u64,
    pub total: u64,
    pub level: LevelProgress,
}

/// Combine per-item contributions with the two side channels.
///
/// `items` yields `(xp, category, cap)` per owned item, `intrinsic_levels` is
/// the sum of every intrinsics sub-skill level, and `exploration_score` is the
/// sum of fixed rewards of completed nodes.
pub fn player_score<I>(items: I, intrinsic_levels: u64, exploration_score: u64) -> PlayerScore
where
    I: IntoIterator<Item = (u64, Category, u32)>,
{
    let item_score: u64 = items
        .into_iter()
        .map(|(xp, category, cap)| contribution(xp, category, cap))
        .sum();
    let intrinsics_score = intrinsics_score(intrinsic_levels);
    let total = item_score + intrinsics_score + exploration_score;

    PlayerScore {
        item_score,
        intrinsics_score,
        exploration_score,
        total,
        level: level_from_total_score(total),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_cap_boundary_is_exact() {
        for cap in [30, 40] {
            let xp = mastery_xp_for_cap(Category::Warframe, cap);
            assert_eq!(rank_from_xp(xp, Category::Warframe, cap), cap);
            assert_eq!(rank_from_xp(xp - 1, Category::Warframe, cap), cap - 1);
            assert_eq!(rank_from_xp(xp * 10, Category::Warframe, cap), cap);
        }
    }

    #[test]
    fn reference_ranks() {
        assert_eq!(rank_from_xp(900_000, Category::Warframe, 30), 30);
        assert_eq!(rank_from_xp(112_500, Category::Primary, 30), 15);
        assert_eq!(rank_from_xp(0, Category::Primary, 30), 0);
        assert_eq!(rank_from_xp(499, Category::Primary, 30), 0);
        assert_eq!(rank_from_xp(500, Category::Primary, 30), 1);
    }

    #[test]
    fn rank_never_exceeds_cap() {
        assert_eq!(rank_from_xp(u64::MAX, Category::Melee, 30), 30);
        assert_eq!(rank_from_xp(u64::MAX, Category::Necramech, 40), 40);
    }

    #[test]
    fn contributions_follow_regime() {
        assert_eq!(contribution(900_000, Category::Warframe, 30), 6000);
        assert_eq!(contribution(450_000, Category::Primary, 30), 3000);
        assert_eq!(contribution(112_500, Category::Primary, 30), 1500);
        assert_eq!(contribution(u64::MAX, Category::Necramech, 40), 8000);
    }

    #[test]
    fn mastery_states() {
        assert_eq!(mastery_state_from_rank(30, 30), MasteryState::Mastered);
        assert_eq!(mastery_state_from_rank(40, 40), MasteryState::FullyUpgraded);
        assert_eq!(mastery_state_from_rank(30, 40), MasteryState::Mastered);
        assert_eq!(mastery_state_from_rank(29, 30), MasteryState::Unmastered);
        // Cap-30 items never reach fully upgraded.
        assert_eq!(mastery_state_from_rank(40, 30), MasteryState::Mastered);
    }

    #[test]
    fn threshold_regimes() {
        assert_eq!(threshold(0), 0);
        assert_eq!(threshold(1), 2500);
        assert_eq!(threshold(30), 2_250_000);
        assert_eq!(threshold(31), 2_397_500);
        assert_eq!(threshold(32), 2_545_000);
        // Past 30 the step stays at 147,500 where the quadratic would keep growing.
        assert_eq!(threshold(30) - threshold(29), 147_500);
        assert_eq!(threshold(34) - threshold(33), 147_500);
        assert!(threshold(31) < 2500 * 31 * 31);
    }

    #[test]
    fn level_zero() {
        let p = level_from_total_score(0);
        assert_eq!(p.level, 0);
        assert_eq!(p.current_threshold, 0);
        assert_eq!(p.next_threshold, 2500);
        assert_eq!(p.progress_percent, 0.0);
    }

    #[test]
    fn level_boundaries() {
        assert_eq!(level_from_total_score(2499).level, 0);
        assert_eq!(level_from_total_score(2500).level, 1);
        assert_eq!(level_from_total_score(2_249_999).level, 29);
        assert_eq!(level_from_total_score(2_250_000).level, 30);
        assert_eq!(level_from_total_score(2_397_499).level, 30);
        assert_eq!(level_from_total_score(2_397_500).level, 31);
        assert!(level_from_total_score(2_397_500).is_legendary());
        assert!(!level_from_total_score(2_250_000).is_legendary());
    }

    #[test]
    fn legendary_midpoint_progress() {
        let mid = (threshold(31) + threshold(32)) / 2;
        let p = level_from_total_score(mid);
        assert_eq!(p.level, 31);
        assert_eq!(p.current_threshold, 2_397_500);
        assert_eq!(p.next_threshold, 2_545_000);
        assert!((p.progress_percent - 50.0).abs() < 1e-9);
    }

    #[test]
    fn standard_progress_percent() {
        // Level 1 spans 2,500..10,000.
        let p = level_from_total_score(6250);
        assert_eq!(p.level, 1);
        assert!((p.progress_percent - 50.0).abs() < 1e-9);
    }

    #[test]
    fn player_score_sums_all_channels() {
        let items = vec![
            (900_000, Category::Warframe, 30),
            (450_000, Category::Primary, 30),
        ];
        let score = player_score(items, 10, 2000);
        assert_eq!(score.item_score, 9000);
        assert_eq!(score.intrinsics_score, 15_000);
        assert_eq!(score.exploration_score, 2000);
        assert_eq!(score.total, 26_000);
        assert_eq!(score.level.level, 3);
    }
}
