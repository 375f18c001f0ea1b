//! Scoring module - placement and line-clear score deltas
//!
//! Every placement pays `block_place`. A placement that clears `k` lines also
//! pays the line bonus for `k` plus a combo bonus taken from the combo curve at
//! the chain length *before* this clear, so the first clear of a chain earns
//! `curve[0]`. Streak thresholds each pay once, when the streak first reaches
//! them, and a clear that empties the grid adds the perfect-clear bonus.

use crate::line_clear::ClearResult;
use crate::rules::{ComboCurve, RulesConfig, ScoreTable, StreakThreshold};

/// Combo and streak counters carried by a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScoreState {
    pub combo_count: u32,
    pub max_combo: u32,
    pub streak_count: u32,
}

impl ScoreState {
    /// Counters after an assisted action (shuffle, bomb) breaks the streak
    pub fn streak_broken(self) -> Self {
        Self {
            streak_count: 0,
            ..self
        }
    }
}

/// Score breakdown for one placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScoreDelta {
    pub place_points: u64,
    pub line_points: u64,
    pub combo_bonus: u64,
    pub streak_bonus: u64,
    pub perfect_clear_bonus: u64,
    pub total: u64,
    pub lines_cleared: u32,
    /// Streak threshold crossed by this placement, if any
    pub streak_threshold: Option<u32>,
}

impl ScoreDelta {
    pub fn is_perfect_clear(&self) -> bool {
        self.perfect_clear_bonus > 0
    }
}

/// Points for clearing `lines` lines at once
///
/// Four or more lines scale the quad bonus by `(k - 2) / 2`, so five lines pay
/// one and a half quads and six pay two.
pub fn line_bonus(table: &ScoreTable, lines: u32) -> u64 {
    match lines {
        0 => 0,
        1 => table.single_line,
        2 => table.double_line,
        3 => table.triple_line,
        k => table.quad_line.saturating_mul(k as u64 - 2) / 2,
    }
}

/// Combo bonus for a chain of `combo_count` previous clears
pub fn combo_bonus(curve: &ComboCurve, combo_count: u32) -> u64 {
    let Some(last) = curve.multipliers_pct.len().checked_sub(1) else {
        return 0;
    };
    let pct = curve.multipliers_pct[(combo_count as usize).min(last)];
    curve.base.saturating_mul(pct as u64) / 100
}

/// Highest threshold `t` with `previous < t <= current`
pub fn streak_bonus(
    thresholds: &[StreakThreshold],
    previous: u32,
    current: u32,
) -> Option<StreakThreshold> {
    thresholds
        .iter()
        .filter(|t| previous < t.streak && t.streak <= current)
        .max_by_key(|t| t.streak)
        .copied()
}

/// Level for a cumulative line count (1-based)
pub fn calculate_level(total_lines: u32, lines_per_level: u32) -> u32 {
    total_lines / lines_per_level.max(1) + 1
}

/// Score one successful placement
///
/// `grid_empty_after` is the grid state after the clear pass; it only matters
/// when at least one line was cleared.
pub fn score_placement(
    rules: &RulesConfig,
    state: ScoreState,
    clear: &ClearResult,
    grid_empty_after: bool,
) -> (ScoreState, ScoreDelta) {
    let lines = clear.total_lines;
    let mut next = state;
    let mut delta = ScoreDelta {
        place_points: rules.scores.block_place,
        lines_cleared: lines,
        ..ScoreDelta::default()
    };

    if lines == 0 {
        next.combo_count = 0;
    } else {
        delta.line_points = line_bonus(&rules.scores, lines);
        delta.combo_bonus = combo_bonus(&rules.combo, state.combo_count);
        next.combo_count = state.combo_count.saturating_add(1);
        next.max_combo = next.max_combo.max(next.combo_count);
        if grid_empty_after {
            delta.perfect_clear_bonus = rules.scores.perfect_clear;
        }
    }

    next.streak_count = state.streak_count.saturating_add(1);
    if let Some(t) = streak_bonus(&rules.streak_thresholds, state.streak_count, next.streak_count)
    {
        delta.streak_bonus = t.bonus;
        delta.streak_threshold = Some(t.streak);
    }

    delta.total = delta
        .place_points
        .saturating_add(delta.line_points)
        .saturating_add(delta.combo_bonus)
        .saturating_add(delta.streak_bonus)
        .saturating_add(delta.perfect_clear_bonus);
    (next, delta)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cleared(rows: u32, cols: u32) -> ClearResult {
        ClearResult {
            rows_cleared: rows,
            cols_cleared: cols,
            total_lines: rows + cols,
            ..ClearResult::default()
        }
    }

    #[test]
    fn test_line_bonus_table() {
        let table = ScoreTable::default();
        assert_eq!(line_bonus(&table, 0), 0);
        assert_eq!(line_bonus(&table, 1), 100);
        assert_eq!(line_bonus(&table, 2), 300);
        assert_eq!(line_bonus(&table, 3), 600);
        assert_eq!(line_bonus(&table, 4), 1000);
        assert_eq!(line_bonus(&table, 5), 1500);
        assert_eq!(line_bonus(&table, 6), 2000);
    }

    #[test]
    fn test_line_bonus_is_super_linear() {
        let table = ScoreTable::default();
        for k in 1..16 {
            let step = line_bonus(&table, k + 1) - line_bonus(&table, k);
            assert!(step >= line_bonus(&table, 1) || k >= 4, "k={}", k);
            assert!(line_bonus(&table, k + 1) > line_bonus(&table, k));
        }
    }

    #[test]
    fn test_combo_curve_non_decreasing() {
        let curve = ComboCurve::default();
        let mut prev = 0;
        for n in 0..64 {
            let bonus = combo_bonus(&curve, n);
            assert!(bonus >= prev, "combo {} dropped", n);
            prev = bonus;
        }
        assert_eq!(combo_bonus(&curve, 0), 0);
        assert_eq!(combo_bonus(&curve, 1), 50);
        assert_eq!(combo_bonus(&curve, 2), 75);
        // Clamped to the last entry.
        assert_eq!(combo_bonus(&curve, 100), 500);
    }

    #[test]
    fn test_combo_bonus_empty_curve() {
        let curve = ComboCurve {
            base: 50,
            multipliers_pct: vec![],
        };
        assert_eq!(combo_bonus(&curve, 3), 0);
    }

    #[test]
    fn test_streak_pays_highest_threshold_once() {
        let thresholds = RulesConfig::default().streak_thresholds;
        assert_eq!(streak_bonus(&thresholds, 1, 2), None);
        assert_eq!(streak_bonus(&thresholds, 2, 3).map(|t| t.bonus), Some(50));
        assert_eq!(streak_bonus(&thresholds, 3, 4), None);
        // A jump across two thresholds pays only the higher one.
        assert_eq!(streak_bonus(&thresholds, 2, 5).map(|t| t.bonus), Some(120));
    }

    #[test]
    fn test_level_calculation() {
        assert_eq!(calculate_level(0, 10), 1);
        assert_eq!(calculate_level(9, 10), 1);
        assert_eq!(calculate_level(10, 10), 2);
        assert_eq!(calculate_level(35, 10), 4);
        assert_eq!(calculate_level(5, 0), 6);
    }

    #[test]
    fn test_placement_without_clear_resets_combo() {
        let rules = RulesConfig::default();
        let state = ScoreState {
            combo_count: 4,
            max_combo: 4,
            streak_count: 0,
        };
        let (next, delta) = score_placement(&rules, state, &ClearResult::default(), false);
        assert_eq!(delta.total, 10);
        assert_eq!(next.combo_count, 0);
        assert_eq!(next.max_combo, 4);
        assert_eq!(next.streak_count, 1);
    }

    #[test]
    fn test_single_line_with_place_bonus() {
        let rules = RulesConfig::default();
        let (next, delta) = score_placement(&rules, ScoreState::default(), &cleared(1, 0), false);
        assert_eq!(delta.place_points, 10);
        assert_eq!(delta.line_points, 100);
        assert_eq!(delta.combo_bonus, 0);
        assert_eq!(delta.total, 110);
        assert_eq!(next.combo_count, 1);
        assert_eq!(next.max_combo, 1);
    }

    #[test]
    fn test_chain_and_perfect_clear() {
        let rules = RulesConfig::default();
        let state = ScoreState {
            combo_count: 2,
            max_combo: 2,
            streak_count: 2,
        };
        let (next, delta) = score_placement(&rules, state, &cleared(1, 1), true);
        assert_eq!(delta.line_points, 300);
        assert_eq!(delta.combo_bonus, 75);
        assert_eq!(delta.streak_bonus, 50);
        assert_eq!(delta.streak_threshold, Some(3));
        assert!(delta.is_perfect_clear());
        assert_eq!(delta.total, 10 + 300 + 75 + 50 + 2000);
        assert_eq!(next.combo_count, 3);
        assert_eq!(next.max_combo, 3);
    }

    #[test]
    fn test_streak_broken_keeps_combo() {
        let state = ScoreState {
            combo_count: 2,
            max_combo: 5,
            streak_count: 9,
        };
        let broken = state.streak_broken();
        assert_eq!(broken.streak_count, 0);
        assert_eq!(broken.combo_count, 2);
        assert_eq!(broken.max_combo, 5);
    }
}
