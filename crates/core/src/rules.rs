//! Rules module - static tables loaded once and read-only to the engine
//!
//! Every table has a built-in default; a JSON document may override any
//! subset of fields (missing fields keep their defaults). Tables are checked
//! by [`RulesConfig::validate`] before a session is built from them.
//!
//! | Table | Default |
//! |-------|---------|
//! | base scores | place 10, lines 100 / 300 / 600 / 1000, perfect clear 2000 |
//! | combo curve | base 50 x [0, 1, 1.5, 2, 3, 4, 5, 7.5, 10] |
//! | streak thresholds | 3:50, 5:120, 7:200, 10:350, 15:600, 20:1000 |
//! | power-up inventory | hint 3, shuffle 2, bomb 1 |
//! | cooldowns | undo 0s, hint 3s, shuffle 8s, bomb 12s |
//! | undo allowance | easy 5, normal 3, hard 1 |

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::shapes::{BlockShape, ShapeCatalog};
use crate::types::{
    Difficulty, PowerUpKind, DEFAULT_COLOR_COUNT, DEFAULT_GRID_SIZE, DEFAULT_LINES_PER_LEVEL,
    DEFAULT_MAX_ACTIVE_BLOCKS, MAX_ACTIVE_BLOCKS, MAX_GRID_SIZE, MIN_GRID_SIZE,
};

/// Base score table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreTable {
    pub block_place: u64,
    pub single_line: u64,
    pub double_line: u64,
    pub triple_line: u64,
    pub quad_line: u64,
    pub perfect_clear: u64,
}

impl Default for ScoreTable {
    fn default() -> Self {
        Self {
            block_place: 10,
            single_line: 100,
            double_line: 300,
            triple_line: 600,
            quad_line: 1000,
            perfect_clear: 2000,
        }
    }
}

/// Combo multiplier curve
///
/// `multipliers_pct[n]` is the percentage of `base` paid for combo count `n`;
/// indices past the end reuse the last entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComboCurve {
    pub base: u64,
    pub multipliers_pct: Vec<u32>,
}

impl Default for ComboCurve {
    fn default() -> Self {
        Self {
            base: 50,
            multipliers_pct: vec![0, 100, 150, 200, 300, 400, 500, 750, 1000],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakThreshold {
    pub streak: u32,
    pub bonus: u64,
}

/// Value per power-up kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerUpTable<T> {
    pub undo: T,
    pub hint: T,
    pub shuffle: T,
    pub bomb: T,
}

impl<T: Copy> PowerUpTable<T> {
    pub fn get(&self, kind: PowerUpKind) -> T {
        match kind {
            PowerUpKind::Undo => self.undo,
            PowerUpKind::Hint => self.hint,
            PowerUpKind::Shuffle => self.shuffle,
            PowerUpKind::Bomb => self.bomb,
        }
    }

    pub fn set(&mut self, kind: PowerUpKind, value: T) {
        match kind {
            PowerUpKind::Undo => self.undo = value,
            PowerUpKind::Hint => self.hint = value,
            PowerUpKind::Shuffle => self.shuffle = value,
            PowerUpKind::Bomb => self.bomb = value,
        }
    }

    pub fn with(mut self, kind: PowerUpKind, value: T) -> Self {
        self.set(kind, value);
        self
    }
}

impl<T: Default> Default for PowerUpTable<T> {
    fn default() -> Self {
        Self {
            undo: T::default(),
            hint: T::default(),
            shuffle: T::default(),
            bomb: T::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoAllowance {
    pub easy: u8,
    pub normal: u8,
    pub hard: u8,
}

impl UndoAllowance {
    pub fn for_difficulty(&self, difficulty: Difficulty) -> u8 {
        match difficulty {
            Difficulty::Easy => self.easy,
            Difficulty::Normal => self.normal,
            Difficulty::Hard => self.hard,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerUpRules {
    /// Starting inventory; the `undo` slot is unused (see `undos`)
    pub starting_inventory: PowerUpTable<u32>,
    pub cooldown_ms: PowerUpTable<u64>,
    /// Bomb clears a (2r+1) x (2r+1) square
    pub bomb_radius: u8,
    pub undos: UndoAllowance,
}

impl Default for PowerUpRules {
    fn default() -> Self {
        Self {
            starting_inventory: PowerUpTable {
                undo: 0,
                hint: 3,
                shuffle: 2,
                bomb: 1,
            },
            cooldown_ms: PowerUpTable {
                undo: 0,
                hint: 3_000,
                shuffle: 8_000,
                bomb: 12_000,
            },
            bomb_radius: 1,
            undos: UndoAllowance {
                easy: 5,
                normal: 3,
                hard: 1,
            },
        }
    }
}

/// A catalog entry as written in a rules file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeSpec {
    pub id: u16,
    pub name: String,
    pub weight: u32,
    pub matrix: Vec<Vec<u8>>,
}

impl ShapeSpec {
    pub fn to_shape(&self) -> Option<BlockShape> {
        let rows: Vec<&[u8]> = self.matrix.iter().map(Vec::as_slice).collect();
        BlockShape::from_matrix(self.id, &self.name, self.weight, &rows)
    }
}

/// All static tables the engine reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    pub grid_size: u8,
    pub max_active_blocks: u8,
    pub lines_per_level: u32,
    pub color_count: u8,
    pub scores: ScoreTable,
    pub combo: ComboCurve,
    pub streak_thresholds: Vec<StreakThreshold>,
    pub power_ups: PowerUpRules,
    /// Zen mode rerolls of a stuck queue before the game ends
    pub zen_reroll_limit: u8,
    /// Custom catalog; `None` selects the standard one
    pub shapes: Option<Vec<ShapeSpec>>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            max_active_blocks: DEFAULT_MAX_ACTIVE_BLOCKS,
            lines_per_level: DEFAULT_LINES_PER_LEVEL,
            color_count: DEFAULT_COLOR_COUNT,
            scores: ScoreTable::default(),
            combo: ComboCurve::default(),
            streak_thresholds: [(3, 50), (5, 120), (7, 200), (10, 350), (15, 600), (20, 1000)]
                .into_iter()
                .map(|(streak, bonus)| StreakThreshold { streak, bonus })
                .collect(),
            power_ups: PowerUpRules::default(),
            zen_reroll_limit: 8,
            shapes: None,
        }
    }
}

impl RulesConfig {
    pub fn validate(&self) -> EngineResult<()> {
        if !(MIN_GRID_SIZE..=MAX_GRID_SIZE as u8).contains(&self.grid_size) {
            return Err(EngineError::invalid_config("grid size out of range")
                .with_details(format!("grid_size={}", self.grid_size)));
        }
        if self.max_active_blocks == 0 || self.max_active_blocks as usize > MAX_ACTIVE_BLOCKS {
            return Err(EngineError::invalid_config("max_active_blocks out of range")
                .with_details(format!("max_active_blocks={}", self.max_active_blocks)));
        }
        if self.lines_per_level == 0 {
            return Err(EngineError::invalid_config("lines_per_level must be positive"));
        }
        if self.combo.multipliers_pct.is_empty() {
            return Err(EngineError::invalid_config("combo curve is empty"));
        }
        if let Some(i) = self
            .combo
            .multipliers_pct
            .windows(2)
            .position(|w| w[1] < w[0])
        {
            return Err(EngineError::invalid_config("combo curve must be non-decreasing")
                .with_details(format!("index {}", i + 1)));
        }
        if self
            .streak_thresholds
            .windows(2)
            .any(|w| w[1].streak <= w[0].streak)
        {
            return Err(EngineError::invalid_config(
                "streak thresholds must be strictly increasing",
            ));
        }
        self.catalog().map(|_| ())
    }

    /// The shape catalog these rules select
    pub fn catalog(&self) -> EngineResult<ShapeCatalog> {
        let Some(specs) = &self.shapes else {
            return Ok(ShapeCatalog::standard());
        };
        let mut shapes = Vec::with_capacity(specs.len());
        for spec in specs {
            let shape = spec.to_shape().ok_or_else(|| {
                EngineError::invalid_config("invalid shape matrix").with_details(spec.name.clone())
            })?;
            shapes.push(shape);
        }
        ShapeCatalog::new(shapes).ok_or_else(|| {
            EngineError::invalid_config("catalog must be non-empty with unique ids and weight")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ErrorKind;

    #[test]
    fn test_defaults_are_valid() {
        let rules = RulesConfig::default();
        assert!(rules.validate().is_ok());
        assert_eq!(rules.catalog().unwrap().len(), 19);
        assert_eq!(rules.power_ups.undos.for_difficulty(Difficulty::Normal), 3);
        assert_eq!(rules.power_ups.cooldown_ms.get(PowerUpKind::Bomb), 12_000);
    }

    #[test]
    fn test_partial_document_keeps_defaults() {
        let rules: RulesConfig =
            serde_json::from_str(r#"{"grid_size": 10, "scores": {"single_line": 150}}"#).unwrap();
        assert_eq!(rules.grid_size, 10);
        assert_eq!(rules.scores.single_line, 150);
        assert_eq!(rules.scores.block_place, 10);
        assert_eq!(rules.combo, ComboCurve::default());
        assert!(rules.validate().is_ok());
    }

    #[test]
    fn test_decreasing_combo_curve_rejected() {
        let mut rules = RulesConfig::default();
        rules.combo.multipliers_pct = vec![0, 100, 90];
        let err = rules.validate().unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidConfig);
        assert_eq!(err.details.as_deref(), Some("index 2"));
    }

    #[test]
    fn test_grid_size_bounds() {
        let mut rules = RulesConfig::default();
        rules.grid_size = 3;
        assert!(rules.validate().is_err());
        rules.grid_size = 17;
        assert!(rules.validate().is_err());
        rules.grid_size = 16;
        assert!(rules.validate().is_ok());
    }

    #[test]
    fn test_streak_thresholds_must_increase() {
        let mut rules = RulesConfig::default();
        rules.streak_thresholds = vec![
            StreakThreshold { streak: 5, bonus: 10 },
            StreakThreshold { streak: 5, bonus: 20 },
        ];
        assert!(rules.validate().is_err());
    }

    #[test]
    fn test_custom_catalog() {
        let mut rules = RulesConfig::default();
        rules.shapes = Some(vec![ShapeSpec {
            id: 7,
            name: "domino".to_string(),
            weight: 1,
            matrix: vec![vec![1, 1]],
        }]);
        let catalog = rules.catalog().unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get(7).unwrap().cell_count(), 2);

        rules.shapes = Some(vec![ShapeSpec {
            id: 1,
            name: "blank".to_string(),
            weight: 1,
            matrix: vec![vec![0]],
        }]);
        assert_eq!(rules.validate().unwrap_err().kind, ErrorKind::InvalidConfig);
    }

    #[test]
    fn test_power_up_table_with() {
        let table = PowerUpTable::<u32>::default().with(PowerUpKind::Hint, 4);
        assert_eq!(table.get(PowerUpKind::Hint), 4);
        assert_eq!(table.get(PowerUpKind::Bomb), 0);
    }
}
