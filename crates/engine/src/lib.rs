//! Block puzzle engine - sessions, power-ups, profile and persistence
//!
//! Builds on the pure rules in `block-puzzle-core` and adds everything with
//! state: the immutable [`GameSession`] value, the one-level undo history,
//! power-up inventory, achievement bookkeeping, outbound events and the
//! versioned JSON snapshot format.
//!
//! | Module | Role |
//! |--------|------|
//! | [`session`] | immutable session value, queue refill, game-over detection |
//! | [`powerups`] | undo, hint, shuffle, bomb with inventory and cooldowns |
//! | [`controller`] | single entry point that commits sessions and emits events |
//! | [`profile`] | lifetime statistics and achievement progress |
//! | [`events`] | event values and sinks (memory, channel, JSONL file) |
//! | [`snapshot`] | camelCase JSON persistence of sessions and profiles |
//! | [`config`] | environment variables and rules files |
//!
//! # Example
//!
//! ```
//! use block_puzzle_engine::{GameSessionController, Ruleset};
//! use block_puzzle_engine::types::{Difficulty, GameMode, GameStatus};
//!
//! let mut game = GameSessionController::new(
//!     Ruleset::default(),
//!     Difficulty::Normal,
//!     GameMode::Classic,
//!     42,
//! );
//! game.start().unwrap();
//!
//! let hint = game.session().first_move(game.ruleset()).unwrap();
//! let out = game.place_block(hint.block_id, hint.row, hint.col).unwrap();
//! assert!(out.session.score() >= 10);
//! assert_eq!(out.session.status(), GameStatus::Playing);
//! ```

pub mod config;
pub mod controller;
pub mod events;
pub mod powerups;
pub mod profile;
pub mod session;
pub mod snapshot;

pub use block_puzzle_core as core;
pub use block_puzzle_types as types;

pub use config::{load_rules, rules_from_json, EngineConfig};
pub use controller::{place_block, GameSessionController, PlaceOutcome, PlacementStep, PowerUpOutcome};
pub use events::{ChannelSink, EventSink, GameEvent, JsonlEventLog, NullSink, RecordingSink};
pub use powerups::{apply_power_up, check_available, PowerUpInventory, PowerUpStep};
pub use profile::PlayerProfile;
pub use session::{BlockQueue, GameSession, Hint, Ruleset, SettleOutcome};
pub use snapshot::{ProfileSnapshot, SessionSnapshot};
