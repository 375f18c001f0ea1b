//! Achievements module - pure progress evaluation over profile data
//!
//! Each achievement reads one [`Metric`] of [`GameData`] and clamps it to its
//! target. Unlocking happens once and is stamped from an injected [`Clock`];
//! evaluating an unlocked achievement again changes nothing. Repeatable
//! achievements only restart when the player claims them, which moves their
//! baseline to the current metric value.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{EngineError, EngineResult};
use crate::types::{AchievementCategory, Rarity};

/// Source of unlock timestamps (milliseconds since the Unix epoch)
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Clock that always reads the same instant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn now_ms(&self) -> u64 {
        self.0
    }
}

/// Profile statistic an achievement tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    BestScore,
    TotalLines,
    BestCombo,
    GamesPlayed,
    PerfectClears,
    BlocksPlaced,
    PowerUpsUsed,
}

/// Cumulative player statistics fed to the evaluator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GameData {
    pub best_score: u64,
    pub total_lines: u64,
    pub best_combo: u32,
    pub games_played: u32,
    pub perfect_clears: u32,
    pub blocks_placed: u64,
    pub power_ups_used: u32,
}

impl GameData {
    pub fn metric(&self, metric: Metric) -> u64 {
        match metric {
            Metric::BestScore => self.best_score,
            Metric::TotalLines => self.total_lines,
            Metric::BestCombo => self.best_combo as u64,
            Metric::GamesPlayed => self.games_played as u64,
            Metric::PerfectClears => self.perfect_clears as u64,
            Metric::BlocksPlaced => self.blocks_placed,
            Metric::PowerUpsUsed => self.power_ups_used as u64,
        }
    }
}

/// Static achievement definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AchievementDef {
    pub id: String,
    pub name: String,
    pub category: AchievementCategory,
    pub rarity: Rarity,
    pub metric: Metric,
    pub target: u64,
    pub repeatable: bool,
    /// Reward points granted on unlock (display and economy only)
    pub reward: u32,
}

/// Per-profile achievement state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Achievement {
    pub id: String,
    pub category: AchievementCategory,
    pub rarity: Rarity,
    pub metric: Metric,
    pub target_value: u64,
    pub current_progress: u64,
    pub is_unlocked: bool,
    pub unlocked_at: Option<u64>,
    pub repeatable: bool,
    /// Metric value at the last claim; progress counts from here
    pub baseline: u64,
    pub times_claimed: u32,
}

impl Achievement {
    /// Fresh, locked achievement for a definition
    pub fn new(def: &AchievementDef) -> Self {
        Self {
            id: def.id.clone(),
            category: def.category,
            rarity: def.rarity,
            metric: def.metric,
            target_value: def.target.max(1),
            current_progress: 0,
            is_unlocked: false,
            unlocked_at: None,
            repeatable: def.repeatable,
            baseline: 0,
            times_claimed: 0,
        }
    }

    /// Progress in `[0.0, 1.0]`
    pub fn fraction(&self) -> f64 {
        self.current_progress as f64 / self.target_value as f64
    }
}

/// Updated achievement for the given data
///
/// Progress never moves backwards and never exceeds the target. The unlock
/// timestamp is taken only on the locked to unlocked transition.
pub fn evaluate(achievement: &Achievement, data: &GameData, clock: &dyn Clock) -> Achievement {
    if achievement.is_unlocked {
        return achievement.clone();
    }

    let raw = data
        .metric(achievement.metric)
        .saturating_sub(achievement.baseline);
    let progress = raw
        .min(achievement.target_value)
        .max(achievement.current_progress);

    let mut next = achievement.clone();
    next.current_progress = progress;
    if progress >= achievement.target_value {
        next.current_progress = achievement.target_value;
        next.is_unlocked = true;
        next.unlocked_at = Some(clock.now_ms());
    }
    next
}

/// Evaluate a whole set; returns the new set and ids unlocked by this call
pub fn evaluate_all(
    achievements: &[Achievement],
    data: &GameData,
    clock: &dyn Clock,
) -> (Vec<Achievement>, Vec<String>) {
    let mut unlocked = Vec::new();
    let next = achievements
        .iter()
        .map(|a| {
            let updated = evaluate(a, data, clock);
            if updated.is_unlocked && !a.is_unlocked {
                unlocked.push(updated.id.clone());
            }
            updated
        })
        .collect();
    (next, unlocked)
}

/// Reset an unlocked repeatable achievement so it can be earned again
pub fn claim(achievement: &Achievement, data: &GameData) -> EngineResult<Achievement> {
    if !achievement.repeatable {
        return Err(EngineError::not_playable("achievement is not repeatable")
            .with_details(achievement.id.clone()));
    }
    if !achievement.is_unlocked {
        return Err(EngineError::not_playable("achievement is not unlocked yet")
            .with_details(achievement.id.clone()));
    }
    Ok(Achievement {
        current_progress: 0,
        is_unlocked: false,
        unlocked_at: None,
        baseline: data.metric(achievement.metric),
        times_claimed: achievement.times_claimed.saturating_add(1),
        ..achievement.clone()
    })
}

type DefRow = (
    &'static str,
    &'static str,
    AchievementCategory,
    Rarity,
    Metric,
    u64,
    bool,
    u32,
);

const DEFAULT_DEFS: [DefRow; 15] = {
    use AchievementCategory::*;
    use Metric::*;
    use Rarity::*;
    [
        ("first_clear", "First Clear", Lines, Common, TotalLines, 1, false, 10),
        ("lines_100", "Line Cutter", Lines, Rare, TotalLines, 100, false, 50),
        ("lines_1000", "Line Master", Lines, Epic, TotalLines, 1000, false, 200),
        ("score_1000", "Getting Started", Score, Common, BestScore, 1000, false, 10),
        ("score_10000", "High Scorer", Score, Rare, BestScore, 10_000, false, 50),
        ("score_50000", "Score Legend", Score, Legendary, BestScore, 50_000, false, 500),
        ("combo_3", "Combo Starter", Combo, Common, BestCombo, 3, false, 10),
        ("combo_5", "Combo Artist", Combo, Rare, BestCombo, 5, false, 50),
        ("combo_10", "Combo King", Combo, Legendary, BestCombo, 10, false, 500),
        ("perfect_clear", "Clean Sweep", Special, Epic, PerfectClears, 1, false, 100),
        ("games_10", "Regular", Games, Common, GamesPlayed, 10, false, 20),
        ("games_100", "Dedicated", Games, Epic, GamesPlayed, 100, false, 200),
        ("blocks_500", "Builder", Special, Rare, BlocksPlaced, 500, false, 50),
        ("power_user", "Power User", Special, Common, PowerUpsUsed, 10, false, 20),
        ("daily_lines_50", "Daily Lines", Lines, Common, TotalLines, 50, true, 25),
    ]
};

/// The built-in achievement definitions
pub fn default_definitions() -> Vec<AchievementDef> {
    DEFAULT_DEFS
        .iter()
        .map(
            |&(id, name, category, rarity, metric, target, repeatable, reward)| AchievementDef {
                id: id.to_string(),
                name: name.to_string(),
                category,
                rarity,
                metric,
                target,
                repeatable,
                reward,
            },
        )
        .collect()
}

/// A fresh profile achievement set
pub fn default_achievements() -> Vec<Achievement> {
    default_definitions().iter().map(Achievement::new).collect()
}
