//! Block puzzle rules core - pure, deterministic, and testable
//!
//! This crate holds every rule of the puzzle and nothing else. It has no
//! dependencies on rendering, input, persistence or clocks, which makes it:
//!
//! - **Deterministic**: same seed and same commands give the same game
//! - **Testable**: each rule is a free function or an immutable value
//! - **Portable**: runs headless, in a UI, or inside a benchmark
//!
//! # Module Structure
//!
//! - [`grid`]: NxN occupancy matrix with O(1) cell queries and O(N) line scans
//! - [`shapes`]: block shape bitmasks, rotate/flip transforms, weighted catalog
//! - [`rng`]: LCG random source and the weighted block generator
//! - [`placement`]: legality of putting a shape at an origin
//! - [`line_clear`]: simultaneous row/column clearing
//! - [`scoring`]: line, combo, streak and perfect-clear bonuses
//! - [`rules`]: static tables (scores, curves, power-up limits)
//! - [`achievements`]: progress evaluation over profile statistics
//!
//! # Example
//!
//! ```
//! use block_puzzle_core::{clear_full_lines, can_place, Grid, ShapeCatalog};
//!
//! let catalog = ShapeCatalog::standard();
//! let line = catalog.by_name("line4_h").unwrap();
//!
//! // Row 0 is full except its last four cells.
//! let grid = Grid::new(8).with_cells_set((0..4).map(|c| (0, c)));
//! assert!(can_place(&grid, line, 0, 4));
//!
//! let placed = grid.with_cells_set(block_puzzle_core::placed_cells(line, 0, 4));
//! let (after, result) = clear_full_lines(&placed);
//! assert_eq!(result.rows_cleared, 1);
//! assert!(after.is_empty());
//! ```

pub mod achievements;
pub mod error;
pub mod grid;
pub mod line_clear;
pub mod placement;
pub mod rng;
pub mod rules;
pub mod scoring;
pub mod shapes;

pub use block_puzzle_types as types;

// Re-export commonly used types for convenience
pub use achievements::{Achievement, AchievementDef, Clock, FixedClock, GameData, Metric, SystemClock};
pub use error::{EngineError, EngineResult};
pub use grid::Grid;
pub use line_clear::{clear_full_lines, find_full_lines, ClearResult};
pub use placement::{can_place, first_legal_placement, has_any_legal_placement, placed_cells};
pub use rng::{ActiveBlock, BlockGenerator, SimpleRng};
pub use rules::RulesConfig;
pub use scoring::{score_placement, ScoreDelta, ScoreState};
pub use shapes::{BlockShape, ShapeCatalog};
