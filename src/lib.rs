//! Block puzzle (workspace facade crate).
//!
//! Exposes `block_puzzle::{core,engine,types}` while the implementation lives
//! in dedicated crates under `crates/`.

pub use block_puzzle_core as core;
pub use block_puzzle_engine as engine;
pub use block_puzzle_types as types;
