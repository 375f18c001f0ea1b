//! Core types module - shared data structures and constants
//!
//! This module defines the fundamental types used throughout the engine.
//! All types are plain data with no external dependencies, so they can be
//! shared by the rules core, the session engine and any outer layer (UI,
//! persistence, analytics) without pulling in the rest of the workspace.
//!
//! String names for these enums are deliberately *not* defined here: the
//! persisted schema owns its own name tables (see the engine `snapshot`
//! module), so renaming a wire value never touches the domain type.
//!
//! # Grid Dimensions
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `DEFAULT_GRID_SIZE` | 8 | Side length of the square grid |
//! | `MIN_GRID_SIZE` | 4 | Smallest supported grid |
//! | `MAX_GRID_SIZE` | 16 | Largest supported grid |
//!
//! # Session Defaults
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `DEFAULT_MAX_ACTIVE_BLOCKS` | 3 | Blocks offered to the player at once |
//! | `DEFAULT_LINES_PER_LEVEL` | 10 | Cleared lines per level step |
//! | `DEFAULT_COLOR_COUNT` | 7 | Palette size for block colour indices |
//!
//! # Examples
//!
//! ```
//! use block_puzzle_types::{GameStatus, PowerUpKind, DEFAULT_GRID_SIZE};
//!
//! assert_eq!(DEFAULT_GRID_SIZE, 8);
//! assert!(GameStatus::GameOver.is_terminal());
//! assert!(!GameStatus::Paused.is_terminal());
//! assert_eq!(PowerUpKind::ALL.len(), 4);
//! ```

/// Default grid side length (8x8)
pub const DEFAULT_GRID_SIZE: u8 = 8;

/// Smallest grid the engine accepts
pub const MIN_GRID_SIZE: u8 = 4;

/// Largest grid the engine accepts
///
/// Bounds the stack-allocated scratch buffers used by line scans.
pub const MAX_GRID_SIZE: usize = 16;

/// Upper bound on cells in a single block shape (8x8 bounding box)
pub const MAX_SHAPE_CELLS: usize = 64;

/// Number of blocks offered to the player at once
pub const DEFAULT_MAX_ACTIVE_BLOCKS: u8 = 3;

/// Hard cap on the active queue, whatever the rules say
pub const MAX_ACTIVE_BLOCKS: usize = 8;

/// Cleared lines needed for each level step
pub const DEFAULT_LINES_PER_LEVEL: u32 = 10;

/// Palette size for block colour indices
pub const DEFAULT_COLOR_COUNT: u8 = 7;

/// Current persisted session schema version
pub const SCHEMA_VERSION: u32 = 1;

/// Lifecycle state of a game session
///
/// ```text
/// Initial -> Playing <-> Paused
/// Playing -> GameOver
/// any     -> Error
/// ```
///
/// `GameOver` and `Error` are terminal: only a restart leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GameStatus {
    #[default]
    Initial,
    Playing,
    Paused,
    GameOver,
    Error,
}

impl GameStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, GameStatus::GameOver | GameStatus::Error)
    }

    pub fn is_playing(self) -> bool {
        self == GameStatus::Playing
    }
}

/// Inventory-gated actions that bend the normal placement rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PowerUpKind {
    /// Restore the previous session snapshot
    Undo,
    /// Suggest a legal placement without changing the board
    Hint,
    /// Regenerate the active queue
    Shuffle,
    /// Clear a square area around a target cell
    Bomb,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 4] = [
        PowerUpKind::Undo,
        PowerUpKind::Hint,
        PowerUpKind::Shuffle,
        PowerUpKind::Bomb,
    ];

    /// Stable index for per-kind tables
    pub fn index(self) -> usize {
        match self {
            PowerUpKind::Undo => 0,
            PowerUpKind::Hint => 1,
            PowerUpKind::Shuffle => 2,
            PowerUpKind::Bomb => 3,
        }
    }

    /// Whether the power-up needs a target cell
    pub fn needs_target(self) -> bool {
        self == PowerUpKind::Bomb
    }
}

/// Difficulty preset chosen at session start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

/// Game mode chosen at session start
///
/// - **Classic**: the game ends as soon as no queued block fits
/// - **Zen**: a stuck queue is rerolled a bounded number of times first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GameMode {
    #[default]
    Classic,
    Zen,
}

/// Grouping used for achievement display and reward tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AchievementCategory {
    Score,
    Lines,
    Combo,
    Games,
    Special,
}

/// Achievement rarity (reward scaling and display only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

/// Error taxonomy shared across the workspace
///
/// Only `InvariantViolation` is fatal to a session; every other kind is a
/// rejected action that leaves the session untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Out-of-bounds, overlapping or otherwise illegal placement
    InvalidPlacement,
    /// Inventory exhausted or power-up still on cooldown
    InsufficientPowerUp,
    /// Session not in a state that accepts the action
    NotPlayable,
    /// Persisted session failed to decode or validate
    CorruptSnapshot,
    /// Static rules tables failed validation
    InvalidConfig,
    /// Internal bug guard; moves the session to `GameStatus::Error`
    InvariantViolation,
}

/// Commands accepted from the UI / input layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameCommand {
    /// Place a queued block with its top-left cell at (row, col)
    PlaceBlock { block_id: u32, row: i16, col: i16 },
    /// Use a power-up, with a target cell where the kind needs one
    UsePowerUp {
        kind: PowerUpKind,
        target: Option<(i16, i16)>,
    },
    Pause,
    Resume,
    Restart,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_up_indices_are_dense() {
        for (i, kind) in PowerUpKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn test_terminal_states() {
        assert!(GameStatus::GameOver.is_terminal());
        assert!(GameStatus::Error.is_terminal());
        assert!(!GameStatus::Initial.is_terminal());
        assert!(!GameStatus::Playing.is_terminal());
        assert!(!GameStatus::Paused.is_terminal());
    }

    #[test]
    fn test_defaults() {
        assert_eq!(GameStatus::default(), GameStatus::Initial);
        assert_eq!(Difficulty::default(), Difficulty::Normal);
        assert_eq!(GameMode::default(), GameMode::Classic);
        assert!((DEFAULT_GRID_SIZE as usize) <= MAX_GRID_SIZE);
        assert!(DEFAULT_GRID_SIZE >= MIN_GRID_SIZE);
    }

    #[test]
    fn test_rarity_orders_by_value() {
        assert!(Rarity::Common < Rarity::Rare);
        assert!(Rarity::Epic < Rarity::Legendary);
    }
}
