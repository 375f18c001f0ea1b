//! Snapshot module - versioned persisted schema for sessions and profiles
//!
//! Persisted data is plain serde structs with typed fields. Every field has a
//! default, so documents written by older builds load with the missing parts
//! filled in; unknown keys are ignored. A document that decodes but breaks a
//! session invariant is rejected as `CorruptSnapshot`, and the caller is
//! expected to fall back to a fresh session.
//!
//! Enum values travel as strings. The name tables live here, at the
//! serialization boundary, rather than on the domain enums.
//!
//! The undo slot is runtime-only and never persisted.

use serde::{Deserialize, Serialize};

use crate::core::achievements::{Achievement, AchievementDef, GameData};
use crate::core::rules::PowerUpTable;
use crate::core::scoring::calculate_level;
use crate::core::{ActiveBlock, BlockGenerator, EngineError, EngineResult, Grid, ScoreState};
use crate::powerups::PowerUpInventory;
use crate::profile::PlayerProfile;
use crate::session::{BlockQueue, GameSession, Ruleset};
use crate::types::{
    AchievementCategory, Difficulty, ErrorKind, GameMode, GameStatus, PowerUpKind, Rarity,
    SCHEMA_VERSION,
};

const STATUS_NAMES: [(GameStatus, &str); 5] = [
    (GameStatus::Initial, "initial"),
    (GameStatus::Playing, "playing"),
    (GameStatus::Paused, "paused"),
    (GameStatus::GameOver, "gameOver"),
    (GameStatus::Error, "error"),
];

const DIFFICULTY_NAMES: [(Difficulty, &str); 3] = [
    (Difficulty::Easy, "easy"),
    (Difficulty::Normal, "normal"),
    (Difficulty::Hard, "hard"),
];

const MODE_NAMES: [(GameMode, &str); 2] = [(GameMode::Classic, "classic"), (GameMode::Zen, "zen")];

const POWER_UP_NAMES: [(PowerUpKind, &str); 4] = [
    (PowerUpKind::Undo, "undo"),
    (PowerUpKind::Hint, "hint"),
    (PowerUpKind::Shuffle, "shuffle"),
    (PowerUpKind::Bomb, "bomb"),
];

const CATEGORY_NAMES: [(AchievementCategory, &str); 5] = [
    (AchievementCategory::Score, "score"),
    (AchievementCategory::Lines, "lines"),
    (AchievementCategory::Combo, "combo"),
    (AchievementCategory::Games, "games"),
    (AchievementCategory::Special, "special"),
];

const RARITY_NAMES: [(Rarity, &str); 4] = [
    (Rarity::Common, "common"),
    (Rarity::Rare, "rare"),
    (Rarity::Epic, "epic"),
    (Rarity::Legendary, "legendary"),
];

fn name_of<T: Copy + PartialEq>(table: &[(T, &'static str)], value: T) -> &'static str {
    table
        .iter()
        .find(|(v, _)| *v == value)
        .map_or("", |&(_, name)| name)
}

fn value_of<T: Copy>(table: &[(T, &'static str)], name: &str) -> Option<T> {
    table
        .iter()
        .find(|(_, n)| n.eq_ignore_ascii_case(name))
        .map(|(v, _)| *v)
}

pub fn status_name(status: GameStatus) -> &'static str {
    name_of(&STATUS_NAMES, status)
}

pub fn parse_status(name: &str) -> Option<GameStatus> {
    value_of(&STATUS_NAMES, name)
}

pub fn difficulty_name(difficulty: Difficulty) -> &'static str {
    name_of(&DIFFICULTY_NAMES, difficulty)
}

pub fn parse_difficulty(name: &str) -> Option<Difficulty> {
    value_of(&DIFFICULTY_NAMES, name)
}

pub fn mode_name(mode: GameMode) -> &'static str {
    name_of(&MODE_NAMES, mode)
}

pub fn parse_mode(name: &str) -> Option<GameMode> {
    value_of(&MODE_NAMES, name)
}

pub fn power_up_name(kind: PowerUpKind) -> &'static str {
    name_of(&POWER_UP_NAMES, kind)
}

pub fn parse_power_up(name: &str) -> Option<PowerUpKind> {
    value_of(&POWER_UP_NAMES, name)
}

pub fn category_name(category: AchievementCategory) -> &'static str {
    name_of(&CATEGORY_NAMES, category)
}

pub fn rarity_name(rarity: Rarity) -> &'static str {
    name_of(&RARITY_NAMES, rarity)
}

fn corrupt(message: &str, details: impl Into<String>) -> EngineError {
    EngineError::corrupt_snapshot(message).with_details(details)
}

fn check_version(version: u32) -> EngineResult<()> {
    if version == 0 || version > SCHEMA_VERSION {
        return Err(corrupt(
            "unsupported schema version",
            format!("{} (supported: 1..={})", version, SCHEMA_VERSION),
        ));
    }
    Ok(())
}

/// One queued block as persisted
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QueuedBlockRecord {
    pub id: u32,
    pub shape_id: u16,
    pub color_index: u8,
    /// Slot in the queue, 0-based
    pub position: u8,
    pub is_locked: bool,
}

/// Persisted game session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub schema_version: u32,
    pub status: String,
    pub difficulty: String,
    pub mode: String,
    /// Rows of cells; empty means a fresh grid
    pub grid: Vec<Vec<bool>>,
    pub block_queue: Vec<QueuedBlockRecord>,
    pub score: u64,
    pub level: u32,
    pub lines_cleared: u32,
    pub combo_count: u32,
    pub max_combo: u32,
    pub streak_count: u32,
    /// Missing means the full allowance for the difficulty
    pub remaining_undos: Option<u8>,
    /// Missing means the starting inventory
    pub inventory: Option<PowerUpTable<u32>>,
    pub cooldowns_ms: Option<PowerUpTable<u64>>,
    pub used_power_ups: Option<PowerUpTable<u32>>,
    pub rng_state: u32,
    /// Zero means one past the highest queued id
    pub next_block_id: u32,
    pub zen_rerolls: u8,
    pub blocks_placed: u32,
    pub perfect_clears: u32,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            status: status_name(GameStatus::Playing).to_string(),
            difficulty: difficulty_name(Difficulty::Normal).to_string(),
            mode: mode_name(GameMode::Classic).to_string(),
            grid: Vec::new(),
            block_queue: Vec::new(),
            score: 0,
            level: 1,
            lines_cleared: 0,
            combo_count: 0,
            max_combo: 0,
            streak_count: 0,
            remaining_undos: None,
            inventory: None,
            cooldowns_ms: None,
            used_power_ups: None,
            rng_state: 1,
            next_block_id: 0,
            zen_rerolls: 0,
            blocks_placed: 0,
            perfect_clears: 0,
        }
    }
}

impl SessionSnapshot {
    pub fn from_session(session: &GameSession) -> Self {
        let power_ups = session.power_ups();
        Self {
            schema_version: SCHEMA_VERSION,
            status: status_name(session.status()).to_string(),
            difficulty: difficulty_name(session.difficulty()).to_string(),
            mode: mode_name(session.mode()).to_string(),
            grid: session.grid().to_rows(),
            block_queue: session
                .queue()
                .iter()
                .enumerate()
                .map(|(i, b)| QueuedBlockRecord {
                    id: b.id,
                    shape_id: b.shape_id,
                    color_index: b.color_index,
                    position: i as u8,
                    is_locked: b.is_locked,
                })
                .collect(),
            score: session.score(),
            level: session.level(),
            lines_cleared: session.lines_cleared(),
            combo_count: session.combo_count(),
            max_combo: session.max_combo(),
            streak_count: session.streak_count(),
            remaining_undos: Some(session.remaining_undos()),
            inventory: Some(power_ups.counts()),
            cooldowns_ms: Some(power_ups.cooldowns_ms()),
            used_power_ups: Some(power_ups.used()),
            rng_state: session.generator().rng_state(),
            next_block_id: session.generator().next_block_id(),
            zen_rerolls: session.zen_rerolls(),
            blocks_placed: session.blocks_placed(),
            perfect_clears: session.perfect_clears(),
        }
    }

    pub fn to_json(&self) -> EngineResult<String> {
        serde_json::to_string(self).map_err(|e| corrupt("failed to encode session", e.to_string()))
    }

    pub fn from_json(s: &str) -> EngineResult<Self> {
        serde_json::from_str(s).map_err(|e| corrupt("failed to decode session", e.to_string()))
    }

    /// Rebuild a session, rejecting anything that breaks its invariants
    pub fn to_session(&self, ruleset: &Ruleset) -> EngineResult<GameSession> {
        check_version(self.schema_version)?;
        let rules = ruleset.config();

        let status = parse_status(&self.status)
            .ok_or_else(|| corrupt("unknown status", self.status.clone()))?;
        let difficulty = parse_difficulty(&self.difficulty)
            .ok_or_else(|| corrupt("unknown difficulty", self.difficulty.clone()))?;
        let mode =
            parse_mode(&self.mode).ok_or_else(|| corrupt("unknown mode", self.mode.clone()))?;

        let grid = if self.grid.is_empty() {
            Grid::new(ruleset.grid_size())
        } else {
            Grid::from_rows(&self.grid).ok_or_else(|| {
                corrupt(
                    "grid is not a supported square",
                    format!("{} rows", self.grid.len()),
                )
            })?
        };
        if grid.size() != ruleset.grid_size() {
            return Err(corrupt(
                "grid size does not match the rules",
                format!("{} != {}", grid.size(), ruleset.grid_size()),
            ));
        }

        if self.block_queue.len() > ruleset.max_active_blocks() {
            return Err(corrupt(
                "block queue over capacity",
                format!("{} > {}", self.block_queue.len(), ruleset.max_active_blocks()),
            ));
        }
        let mut records: Vec<&QueuedBlockRecord> = self.block_queue.iter().collect();
        records.sort_by_key(|r| r.position);
        let mut queue = BlockQueue::new();
        for r in records {
            if ruleset.shape(r.shape_id).is_none() {
                return Err(corrupt("unknown shape id", r.shape_id.to_string()));
            }
            queue.push(ActiveBlock {
                id: r.id,
                shape_id: r.shape_id,
                color_index: r.color_index,
                is_locked: r.is_locked,
            });
        }

        let highest_id = queue.iter().map(|b| b.id).max().unwrap_or(0);
        let next_block_id = if self.next_block_id == 0 {
            highest_id
                .checked_add(1)
                .ok_or_else(|| corrupt("block id counter overflow", highest_id.to_string()))?
        } else if self.next_block_id <= highest_id {
            return Err(corrupt(
                "block id counter behind the queue",
                format!("{} <= {}", self.next_block_id, highest_id),
            ));
        } else {
            self.next_block_id
        };

        let expected_level = calculate_level(self.lines_cleared, rules.lines_per_level);
        if self.level != expected_level {
            return Err(corrupt(
                "level does not match lines cleared",
                format!("{} != {}", self.level, expected_level),
            ));
        }

        let mut session = GameSession {
            status,
            difficulty,
            mode,
            grid,
            queue,
            score: self.score,
            level: self.level,
            lines_cleared: self.lines_cleared,
            scoring: ScoreState {
                combo_count: self.combo_count,
                max_combo: self.max_combo,
                streak_count: self.streak_count,
            },
            remaining_undos: self
                .remaining_undos
                .unwrap_or_else(|| rules.power_ups.undos.for_difficulty(difficulty)),
            power_ups: PowerUpInventory::from_parts(
                self.inventory.unwrap_or(rules.power_ups.starting_inventory),
                self.cooldowns_ms.unwrap_or_default(),
                self.used_power_ups.unwrap_or_default(),
            ),
            generator: BlockGenerator::from_parts(self.rng_state, next_block_id),
            zen_rerolls: self.zen_rerolls,
            blocks_placed: self.blocks_placed,
            perfect_clears: self.perfect_clears,
            undo: None,
        };
        if session.queue.is_empty() && !session.status.is_terminal() {
            session.queue = session.draw_queue(ruleset);
        }

        session.check_invariants(ruleset).map_err(|e| EngineError {
            kind: ErrorKind::CorruptSnapshot,
            ..e
        })?;
        Ok(session)
    }
}

/// Persisted profile statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StatsRecord {
    pub best_score: u64,
    pub total_lines: u64,
    pub best_combo: u32,
    pub games_played: u32,
    pub perfect_clears: u32,
    pub blocks_placed: u64,
    pub power_ups_used: u32,
}

impl From<GameData> for StatsRecord {
    fn from(d: GameData) -> Self {
        Self {
            best_score: d.best_score,
            total_lines: d.total_lines,
            best_combo: d.best_combo,
            games_played: d.games_played,
            perfect_clears: d.perfect_clears,
            blocks_placed: d.blocks_placed,
            power_ups_used: d.power_ups_used,
        }
    }
}

impl From<StatsRecord> for GameData {
    fn from(r: StatsRecord) -> Self {
        Self {
            best_score: r.best_score,
            total_lines: r.total_lines,
            best_combo: r.best_combo,
            games_played: r.games_played,
            perfect_clears: r.perfect_clears,
            blocks_placed: r.blocks_placed,
            power_ups_used: r.power_ups_used,
        }
    }
}

/// Persisted progress of one achievement
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AchievementRecord {
    pub id: String,
    /// Informational; the definition table is authoritative
    pub category: String,
    pub rarity: String,
    pub current_progress: u64,
    pub is_unlocked: bool,
    pub unlocked_at: Option<u64>,
    pub baseline: u64,
    pub times_claimed: u32,
}

impl From<&Achievement> for AchievementRecord {
    fn from(a: &Achievement) -> Self {
        Self {
            id: a.id.clone(),
            category: category_name(a.category).to_string(),
            rarity: rarity_name(a.rarity).to_string(),
            current_progress: a.current_progress,
            is_unlocked: a.is_unlocked,
            unlocked_at: a.unlocked_at,
            baseline: a.baseline,
            times_claimed: a.times_claimed,
        }
    }
}

/// Persisted player profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProfileSnapshot {
    pub schema_version: u32,
    pub stats: StatsRecord,
    pub achievements: Vec<AchievementRecord>,
}

impl Default for ProfileSnapshot {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            stats: StatsRecord::default(),
            achievements: Vec::new(),
        }
    }
}

impl ProfileSnapshot {
    pub fn from_profile(profile: &PlayerProfile) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            stats: profile.data().into(),
            achievements: profile.achievements().iter().map(AchievementRecord::from).collect(),
        }
    }

    pub fn to_json(&self) -> EngineResult<String> {
        serde_json::to_string(self).map_err(|e| corrupt("failed to encode profile", e.to_string()))
    }

    pub fn from_json(s: &str) -> EngineResult<Self> {
        serde_json::from_str(s).map_err(|e| corrupt("failed to decode profile", e.to_string()))
    }

    /// Rebuild a profile against the given definitions
    ///
    /// Records for unknown ids are dropped; definitions without a record start
    /// fresh.
    pub fn to_profile(&self, defs: &[AchievementDef]) -> EngineResult<PlayerProfile> {
        check_version(self.schema_version)?;
        let mut achievements = Vec::with_capacity(defs.len());
        for def in defs {
            let mut a = Achievement::new(def);
            if let Some(r) = self.achievements.iter().find(|r| r.id == def.id) {
                if r.current_progress > a.target_value {
                    return Err(corrupt("achievement progress above target", r.id.clone()));
                }
                if r.is_unlocked && r.current_progress != a.target_value {
                    return Err(corrupt("unlocked achievement below target", r.id.clone()));
                }
                a.current_progress = r.current_progress;
                a.is_unlocked = r.is_unlocked;
                a.unlocked_at = r.unlocked_at;
                a.baseline = r.baseline;
                a.times_claimed = r.times_claimed;
            }
            achievements.push(a);
        }
        Ok(PlayerProfile::from_parts(self.stats.into(), achievements))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::achievements::default_definitions;

    fn session() -> (Ruleset, GameSession) {
        let ruleset = Ruleset::default();
        let s = GameSession::new(&ruleset, Difficulty::Hard, GameMode::Zen, 77)
            .with_status(GameStatus::Playing)
            .with_grid(Grid::new(8).with_cells_set([(0, 0), (3, 4), (7, 7)]));
        (ruleset, s)
    }

    #[test]
    fn test_session_survives_json() {
        let (ruleset, s) = session();
        let json = SessionSnapshot::from_session(&s).to_json().unwrap();
        let back = SessionSnapshot::from_json(&json).unwrap().to_session(&ruleset).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn test_names_use_tables() {
        let (_, s) = session();
        let snap = SessionSnapshot::from_session(&s);
        assert_eq!(snap.status, "playing");
        assert_eq!(snap.difficulty, "hard");
        assert_eq!(snap.mode, "zen");
        assert_eq!(status_name(GameStatus::GameOver), "gameOver");
        assert_eq!(parse_power_up("Bomb"), Some(PowerUpKind::Bomb));
        assert_eq!(parse_mode("arcade"), None);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let ruleset = Ruleset::default();
        let s = SessionSnapshot::from_json(r#"{"schemaVersion": 1, "score": 40}"#)
            .unwrap()
            .to_session(&ruleset)
            .unwrap();
        assert_eq!(s.status(), GameStatus::Playing);
        assert_eq!(s.score(), 40);
        assert_eq!(s.remaining_undos(), 3);
        assert!(s.grid().is_empty());
        assert_eq!(s.queue().len(), 3);
        assert_eq!(s.power_ups().count(PowerUpKind::Hint), 3);
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let ruleset = Ruleset::default();
        let s = SessionSnapshot::from_json(r#"{"theme": "neon", "lastSavedAt": 12}"#)
            .unwrap()
            .to_session(&ruleset);
        assert!(s.is_ok());
    }

    #[test]
    fn test_corrupt_documents_rejected() {
        let ruleset = Ruleset::default();
        let cases = [
            r#"{"schemaVersion": 2}"#,
            r#"{"status": "winning"}"#,
            r#"{"grid": [[true, false], [false]]}"#,
            r#"{"linesCleared": 12, "level": 1}"#,
            r#"{"blockQueue": [{"id": 1, "shapeId": 999, "position": 0}]}"#,
            r#"{"blockQueue": [{"id": 5, "shapeId": 0}], "nextBlockId": 3}"#,
            r#"{"blockQueue": [{"id": 4294967295, "shapeId": 0, "position": 0}]}"#,
            r#"{"comboCount": 4, "maxCombo": 2}"#,
            r#"{"score": -5}"#,
            "not json",
        ];
        for doc in cases {
            let result = SessionSnapshot::from_json(doc).and_then(|s| s.to_session(&ruleset));
            let err = result.expect_err(doc);
            assert_eq!(err.kind, ErrorKind::CorruptSnapshot, "{}", doc);
        }
    }

    #[test]
    fn test_wrong_grid_size_rejected() {
        let ruleset = Ruleset::default();
        let snap = SessionSnapshot {
            grid: vec![vec![false; 10]; 10],
            ..SessionSnapshot::default()
        };
        assert_eq!(snap.to_session(&ruleset).unwrap_err().kind, ErrorKind::CorruptSnapshot);
    }

    #[test]
    fn test_undo_slot_not_persisted() {
        let (ruleset, s) = session();
        let mut with_undo = s.clone();
        with_undo.undo = Some(s.undo_point());
        let back = SessionSnapshot::from_session(&with_undo).to_session(&ruleset).unwrap();
        assert!(back.undo_snapshot().is_none());
    }

    #[test]
    fn test_profile_round_trip() {
        let defs = default_definitions();
        let mut profile = PlayerProfile::new(&defs);
        profile.record_game_end(1500);
        let _ = profile.evaluate(&crate::core::FixedClock(9));

        let json = ProfileSnapshot::from_profile(&profile).to_json().unwrap();
        let back = ProfileSnapshot::from_json(&json).unwrap().to_profile(&defs).unwrap();
        assert_eq!(back, profile);
    }

    #[test]
    fn test_profile_progress_above_target_rejected() {
        let defs = default_definitions();
        let snap = ProfileSnapshot {
            achievements: vec![AchievementRecord {
                id: "combo_3".to_string(),
                current_progress: 4,
                ..AchievementRecord::default()
            }],
            ..ProfileSnapshot::default()
        };
        assert_eq!(snap.to_profile(&defs).unwrap_err().kind, ErrorKind::CorruptSnapshot);
    }
}
