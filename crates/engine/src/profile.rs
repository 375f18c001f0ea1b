//! Player profile - lifetime statistics and achievement progress
//!
//! The profile outlives sessions. The controller feeds it after every
//! committed action and re-evaluates achievements from the updated totals.

use crate::core::achievements::{self, default_definitions, Achievement, AchievementDef};
use crate::core::{Clock, EngineError, EngineResult, GameData};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerProfile {
    data: GameData,
    achievements: Vec<Achievement>,
}

impl PlayerProfile {
    pub fn new(defs: &[AchievementDef]) -> Self {
        Self {
            data: GameData::default(),
            achievements: defs.iter().map(Achievement::new).collect(),
        }
    }

    pub fn from_parts(data: GameData, achievements: Vec<Achievement>) -> Self {
        Self { data, achievements }
    }

    pub fn data(&self) -> GameData {
        self.data
    }

    pub fn achievements(&self) -> &[Achievement] {
        &self.achievements
    }

    pub fn achievement(&self, id: &str) -> Option<&Achievement> {
        self.achievements.iter().find(|a| a.id == id)
    }

    pub fn unlocked_count(&self) -> usize {
        self.achievements.iter().filter(|a| a.is_unlocked).count()
    }

    /// Fold one placement into the totals
    pub fn record_placement(&mut self, lines: u32, combo: u32, perfect_clear: bool, score: u64) {
        let d = &mut self.data;
        d.blocks_placed = d.blocks_placed.saturating_add(1);
        d.total_lines = d.total_lines.saturating_add(lines as u64);
        d.best_combo = d.best_combo.max(combo);
        if perfect_clear {
            d.perfect_clears = d.perfect_clears.saturating_add(1);
        }
        d.best_score = d.best_score.max(score);
    }

    pub fn record_power_up(&mut self) {
        self.data.power_ups_used = self.data.power_ups_used.saturating_add(1);
    }

    pub fn record_game_end(&mut self, final_score: u64) {
        self.data.games_played = self.data.games_played.saturating_add(1);
        self.data.best_score = self.data.best_score.max(final_score);
    }

    /// Roll the totals back to `earlier` after an undo
    ///
    /// Power-up usage and games played are kept; spent power-ups stay spent.
    pub fn rewind(&mut self, earlier: GameData) {
        self.data = GameData {
            power_ups_used: self.data.power_ups_used,
            games_played: self.data.games_played,
            ..earlier
        };
    }

    /// Re-evaluate every achievement; returns ids unlocked by this call
    pub fn evaluate(&mut self, clock: &dyn Clock) -> Vec<String> {
        let (next, unlocked) = achievements::evaluate_all(&self.achievements, &self.data, clock);
        self.achievements = next;
        unlocked
    }

    /// Claim a repeatable achievement so it can be earned again
    pub fn claim(&mut self, id: &str) -> EngineResult<&Achievement> {
        let idx = self
            .achievements
            .iter()
            .position(|a| a.id == id)
            .ok_or_else(|| EngineError::not_playable("unknown achievement").with_details(id))?;
        let claimed = achievements::claim(&self.achievements[idx], &self.data)?;
        self.achievements[idx] = claimed;
        Ok(&self.achievements[idx])
    }
}

impl Default for PlayerProfile {
    fn default() -> Self {
        Self::new(&default_definitions())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FixedClock;

    #[test]
    fn test_record_placement_tracks_bests() {
        let mut p = PlayerProfile::default();
        p.record_placement(2, 3, false, 500);
        p.record_placement(0, 0, false, 510);
        p.record_placement(1, 1, true, 2600);
        let d = p.data();
        assert_eq!(d.blocks_placed, 3);
        assert_eq!(d.total_lines, 3);
        assert_eq!(d.best_combo, 3);
        assert_eq!(d.perfect_clears, 1);
        assert_eq!(d.best_score, 2600);
    }

    #[test]
    fn test_evaluate_unlocks_once() {
        let mut p = PlayerProfile::default();
        p.record_placement(1, 1, false, 110);
        assert_eq!(p.evaluate(&FixedClock(1)), vec!["first_clear".to_string()]);
        assert!(p.evaluate(&FixedClock(2)).is_empty());
        assert_eq!(p.achievement("first_clear").unwrap().unlocked_at, Some(1));
        assert_eq!(p.unlocked_count(), 1);
    }

    #[test]
    fn test_rewind_keeps_power_up_usage() {
        let mut p = PlayerProfile::default();
        p.record_placement(1, 1, false, 110);
        let earlier = p.data();
        p.record_placement(2, 2, false, 520);
        p.record_power_up();
        p.rewind(earlier);
        let d = p.data();
        assert_eq!(d.blocks_placed, 1);
        assert_eq!(d.total_lines, 1);
        assert_eq!(d.best_combo, 1);
        assert_eq!(d.best_score, 110);
        assert_eq!(d.power_ups_used, 1);
    }

    #[test]
    fn test_claim_unknown_id() {
        let mut p = PlayerProfile::default();
        assert!(p.claim("nope").is_err());
    }
}
