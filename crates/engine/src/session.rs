//! Session module - the immutable game session value
//!
//! A [`GameSession`] is never mutated in place by callers. Every action builds
//! a new value from the previous one; the previous value (with its own undo
//! slot stripped) becomes the new value's undo point, so exactly one level of
//! history is retained and snapshots never alias each other.

use std::sync::Arc;

use arrayvec::ArrayVec;

use crate::core::placement::can_place;
use crate::core::scoring::calculate_level;
use crate::core::{
    ActiveBlock, BlockGenerator, BlockShape, EngineError, EngineResult, Grid, RulesConfig,
    ScoreState, ShapeCatalog,
};
use crate::powerups::PowerUpInventory;
use crate::types::{Difficulty, GameMode, GameStatus, MAX_ACTIVE_BLOCKS};

/// Blocks currently offered to the player, in display order
pub type BlockQueue = ArrayVec<ActiveBlock, MAX_ACTIVE_BLOCKS>;

/// Validated rules together with the catalog they select
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ruleset {
    config: RulesConfig,
    catalog: ShapeCatalog,
}

impl Ruleset {
    pub fn new(config: RulesConfig) -> EngineResult<Self> {
        config.validate()?;
        let catalog = config.catalog()?;
        Ok(Self { config, catalog })
    }

    pub fn config(&self) -> &RulesConfig {
        &self.config
    }

    pub fn catalog(&self) -> &ShapeCatalog {
        &self.catalog
    }

    pub fn shape(&self, shape_id: u16) -> Option<&BlockShape> {
        self.catalog.get(shape_id)
    }

    pub fn grid_size(&self) -> u8 {
        self.config.grid_size
    }

    pub fn max_active_blocks(&self) -> usize {
        (self.config.max_active_blocks as usize).min(MAX_ACTIVE_BLOCKS)
    }
}

impl Default for Ruleset {
    fn default() -> Self {
        Self {
            config: RulesConfig::default(),
            catalog: ShapeCatalog::standard(),
        }
    }
}

/// A legal move: queued block and the origin it fits at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hint {
    pub block_id: u32,
    pub row: i16,
    pub col: i16,
}

/// What the replenish / stuck check did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SettleOutcome {
    /// The queue ran out of placeable blocks and was refilled
    pub replenished: bool,
    /// Zen mode rerolls spent on a stuck queue
    pub rerolls: u8,
    pub game_over: bool,
}

/// Canonical session state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSession {
    pub(crate) status: GameStatus,
    pub(crate) difficulty: Difficulty,
    pub(crate) mode: GameMode,
    pub(crate) grid: Grid,
    pub(crate) queue: BlockQueue,
    pub(crate) score: u64,
    pub(crate) level: u32,
    pub(crate) lines_cleared: u32,
    pub(crate) scoring: ScoreState,
    pub(crate) remaining_undos: u8,
    pub(crate) power_ups: PowerUpInventory,
    pub(crate) generator: BlockGenerator,
    /// Consecutive Zen rerolls since the last placement
    pub(crate) zen_rerolls: u8,
    pub(crate) blocks_placed: u32,
    pub(crate) perfect_clears: u32,
    pub(crate) undo: Option<Arc<GameSession>>,
}

impl GameSession {
    /// Fresh session: empty grid, generated queue, `Initial` status
    pub fn new(ruleset: &Ruleset, difficulty: Difficulty, mode: GameMode, seed: u32) -> Self {
        let rules = ruleset.config();
        let mut session = Self {
            status: GameStatus::Initial,
            difficulty,
            mode,
            grid: Grid::new(rules.grid_size),
            queue: BlockQueue::new(),
            score: 0,
            level: 1,
            lines_cleared: 0,
            scoring: ScoreState::default(),
            remaining_undos: rules.power_ups.undos.for_difficulty(difficulty),
            power_ups: PowerUpInventory::new(rules.power_ups.starting_inventory),
            generator: BlockGenerator::new(seed),
            zen_rerolls: 0,
            blocks_placed: 0,
            perfect_clears: 0,
            undo: None,
        };
        session.queue = session.draw_queue(ruleset);
        session
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn queue(&self) -> &[ActiveBlock] {
        &self.queue
    }

    pub fn block(&self, block_id: u32) -> Option<&ActiveBlock> {
        self.queue.iter().find(|b| b.id == block_id)
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn lines_cleared(&self) -> u32 {
        self.lines_cleared
    }

    pub fn combo_count(&self) -> u32 {
        self.scoring.combo_count
    }

    pub fn max_combo(&self) -> u32 {
        self.scoring.max_combo
    }

    pub fn streak_count(&self) -> u32 {
        self.scoring.streak_count
    }

    pub fn score_state(&self) -> ScoreState {
        self.scoring
    }

    pub fn remaining_undos(&self) -> u8 {
        self.remaining_undos
    }

    pub fn power_ups(&self) -> &PowerUpInventory {
        &self.power_ups
    }

    pub fn generator(&self) -> &BlockGenerator {
        &self.generator
    }

    pub fn zen_rerolls(&self) -> u8 {
        self.zen_rerolls
    }

    pub fn blocks_placed(&self) -> u32 {
        self.blocks_placed
    }

    pub fn perfect_clears(&self) -> u32 {
        self.perfect_clears
    }

    /// The session an undo would restore
    pub fn undo_snapshot(&self) -> Option<&GameSession> {
        self.undo.as_deref()
    }

    pub fn with_status(mut self, status: GameStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_grid(mut self, grid: Grid) -> Self {
        self.grid = grid;
        self
    }

    pub fn with_queue(mut self, blocks: impl IntoIterator<Item = ActiveBlock>) -> Self {
        self.queue = blocks.into_iter().take(MAX_ACTIVE_BLOCKS).collect();
        self
    }

    pub fn with_remaining_undos(mut self, remaining: u8) -> Self {
        self.remaining_undos = remaining;
        self
    }

    pub fn with_power_ups(mut self, power_ups: PowerUpInventory) -> Self {
        self.power_ups = power_ups;
        self
    }

    /// This session as an undo point (its own history dropped)
    pub(crate) fn undo_point(&self) -> Arc<GameSession> {
        let mut point = self.clone();
        point.undo = None;
        Arc::new(point)
    }

    pub(crate) fn draw_queue(&mut self, ruleset: &Ruleset) -> BlockQueue {
        self.generator.next(
            ruleset.catalog(),
            ruleset.max_active_blocks(),
            ruleset.config().color_count,
        )
    }

    /// First legal move: row-major origins outer, queue order inner
    ///
    /// Locked blocks and blocks whose shape is unknown are skipped.
    pub fn first_move(&self, ruleset: &Ruleset) -> Option<Hint> {
        let candidates: ArrayVec<(u32, &BlockShape), MAX_ACTIVE_BLOCKS> = self
            .queue
            .iter()
            .filter(|b| !b.is_locked)
            .filter_map(|b| ruleset.shape(b.shape_id).map(|shape| (b.id, shape)))
            .collect();
        if candidates.is_empty() {
            return None;
        }

        let n = self.grid.size() as i16;
        for row in 0..n {
            for col in 0..n {
                if let Some(&(block_id, _)) = candidates
                    .iter()
                    .find(|(_, shape)| can_place(&self.grid, shape, row, col))
                {
                    return Some(Hint { block_id, row, col });
                }
            }
        }
        None
    }

    pub fn has_any_move(&self, ruleset: &Ruleset) -> bool {
        self.first_move(ruleset).is_some()
    }

    /// Refill an exhausted queue, then end the game if nothing fits
    ///
    /// Zen mode rerolls a stuck queue up to `zen_reroll_limit` consecutive
    /// times before giving up.
    pub(crate) fn settle(mut self, ruleset: &Ruleset) -> (Self, SettleOutcome) {
        let mut outcome = SettleOutcome::default();
        if self.queue.iter().all(|b| b.is_locked) {
            self.queue = self.draw_queue(ruleset);
            outcome.replenished = true;
        }

        while !self.has_any_move(ruleset) {
            if self.mode == GameMode::Zen && self.zen_rerolls < ruleset.config().zen_reroll_limit {
                self.zen_rerolls += 1;
                outcome.rerolls += 1;
                self.queue = self.draw_queue(ruleset);
                continue;
            }
            self.status = GameStatus::GameOver;
            outcome.game_over = true;
            break;
        }
        (self, outcome)
    }

    /// Structural invariants every committed session must satisfy
    pub fn check_invariants(&self, ruleset: &Ruleset) -> EngineResult<()> {
        let violation = |msg: &str, details: String| {
            Err(EngineError::invariant_violation(msg).with_details(details))
        };

        if self.grid.size() != ruleset.grid_size() {
            return violation(
                "grid size changed",
                format!("{} != {}", self.grid.size(), ruleset.grid_size()),
            );
        }
        if self.queue.len() > ruleset.max_active_blocks() {
            return violation("queue over capacity", format!("len={}", self.queue.len()));
        }
        for (i, block) in self.queue.iter().enumerate() {
            if self.queue[..i].iter().any(|b| b.id == block.id) {
                return violation("duplicate block id", format!("id={}", block.id));
            }
            if block.id >= self.generator.next_block_id() {
                return violation("block id from the future", format!("id={}", block.id));
            }
            if ruleset.shape(block.shape_id).is_none() {
                return violation("unknown shape", format!("shape_id={}", block.shape_id));
            }
        }
        let expected = calculate_level(self.lines_cleared, ruleset.config().lines_per_level);
        if self.level != expected {
            return violation("level out of step", format!("{} != {}", self.level, expected));
        }
        if self.scoring.combo_count > self.scoring.max_combo {
            return violation(
                "combo above max combo",
                format!("{} > {}", self.scoring.combo_count, self.scoring.max_combo),
            );
        }
        let allowance = ruleset.config().power_ups.undos.for_difficulty(self.difficulty);
        if self.remaining_undos > allowance {
            return violation(
                "undo allowance exceeded",
                format!("{} > {}", self.remaining_undos, allowance),
            );
        }
        if self.undo.as_ref().is_some_and(|u| u.undo.is_some()) {
            return violation("nested undo history", String::new());
        }
        Ok(())
    }
}
