//! RNG module - deterministic weighted block generation
//!
//! Blocks are drawn independently from the shape catalog by weighted
//! sampling: repeats are allowed and the draw frequencies follow the weight
//! table exactly, with no bag or de-duplication.
//!
//! The RNG is a small LCG so that a session's whole future is captured by a
//! single `u32`, which snapshots and undo carry around.

use arrayvec::ArrayVec;

use crate::shapes::ShapeCatalog;
use crate::types::MAX_ACTIVE_BLOCKS;

/// Simple LCG (Linear Congruential Generator) RNG
/// Uses constants from Numerical Recipes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SimpleRng {
    state: u32,
}

impl SimpleRng {
    /// Create a new RNG with the given seed
    pub fn new(seed: u32) -> Self {
        // Avoid 0 seed which would produce all zeros
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Generate next random u32
    pub fn next_u32(&mut self) -> u32 {
        // LCG formula: (a * state + c) mod m
        // Using Numerical Recipes constants: a=1664525, c=1013904223, m=2^32
        self.state = self.state.wrapping_mul(1664525).wrapping_add(1013904223);
        self.state
    }

    /// Generate random value in range [0, max)
    pub fn next_range(&mut self, max: u32) -> u32 {
        if max == 0 {
            return 0;
        }
        // High bits of an LCG are far better distributed than the low ones.
        ((self.next_u32() as u64 * max as u64) >> 32) as u32
    }

    /// Resume from a previously observed `state()`, zero included
    pub fn from_state(state: u32) -> Self {
        Self { state }
    }

    /// Current state (for snapshots)
    pub fn state(&self) -> u32 {
        self.state
    }
}

impl Default for SimpleRng {
    fn default() -> Self {
        Self::new(1)
    }
}

/// A shape instance currently offered to the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActiveBlock {
    /// Unique within a session
    pub id: u32,
    pub shape_id: u16,
    pub color_index: u8,
    /// Locked blocks are shown but cannot be placed
    pub is_locked: bool,
}

/// Freshly generated queue contents
pub type BlockBatch = ArrayVec<ActiveBlock, MAX_ACTIVE_BLOCKS>;

/// Weighted block generator
///
/// Owns the RNG and the block id counter; cloning it forks the sequence,
/// which is exactly what copy-on-write sessions need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockGenerator {
    rng: SimpleRng,
    next_block_id: u32,
}

impl BlockGenerator {
    pub fn new(seed: u32) -> Self {
        Self {
            rng: SimpleRng::new(seed),
            next_block_id: 1,
        }
    }

    /// Restore from persisted parts
    pub fn from_parts(rng_state: u32, next_block_id: u32) -> Self {
        Self {
            rng: SimpleRng::from_state(rng_state),
            next_block_id: next_block_id.max(1),
        }
    }

    pub fn rng_state(&self) -> u32 {
        self.rng.state()
    }

    pub fn next_block_id(&self) -> u32 {
        self.next_block_id
    }

    /// Draw `count` blocks independently (capped at `MAX_ACTIVE_BLOCKS`)
    pub fn next(&mut self, catalog: &ShapeCatalog, count: usize, color_count: u8) -> BlockBatch {
        let mut out = BlockBatch::new();
        for _ in 0..count.min(MAX_ACTIVE_BLOCKS) {
            let roll = self.rng.next_range(catalog.total_weight());
            let shape = catalog.pick(roll);
            let color_index = self.rng.next_range(color_count.max(1) as u32) as u8;

            out.push(ActiveBlock {
                id: self.next_block_id,
                shape_id: shape.id,
                color_index,
                is_locked: false,
            });
            self.next_block_id = self.next_block_id.wrapping_add(1).max(1);
        }
        out
    }
}

impl Default for BlockGenerator {
    fn default() -> Self {
        Self::new(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::BlockShape;

    #[test]
    fn test_rng_deterministic() {
        let mut rng1 = SimpleRng::new(12345);
        let mut rng2 = SimpleRng::new(12345);

        // Same seed should produce same sequence
        for _ in 0..100 {
            assert_eq!(rng1.next_u32(), rng2.next_u32());
        }
    }

    #[test]
    fn test_rng_different_seeds() {
        let mut rng1 = SimpleRng::new(12345);
        let mut rng2 = SimpleRng::new(54321);

        assert_ne!(rng1.next_u32(), rng2.next_u32());
    }

    #[test]
    fn test_next_range_bounds() {
        let mut rng = SimpleRng::new(7);
        for _ in 0..1000 {
            assert!(rng.next_range(13) < 13);
        }
        assert_eq!(rng.next_range(0), 0);
    }

    #[test]
    fn test_generator_ids_are_unique_and_increasing() {
        let catalog = ShapeCatalog::standard();
        let mut generator = BlockGenerator::new(99);

        let a = generator.next(&catalog, 3, 7);
        let b = generator.next(&catalog, 3, 7);
        let ids: Vec<u32> = a.iter().chain(b.iter()).map(|blk| blk.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);
        assert!(a.iter().all(|blk| blk.color_index < 7 && !blk.is_locked));
    }

    #[test]
    fn test_generator_is_replayable_from_parts() {
        let catalog = ShapeCatalog::standard();
        let mut original = BlockGenerator::new(4242);
        let _ = original.next(&catalog, 3, 7);

        let mut restored = BlockGenerator::from_parts(original.rng_state(), original.next_block_id());
        assert_eq!(original.next(&catalog, 3, 7), restored.next(&catalog, 3, 7));
    }

    #[test]
    fn test_generator_follows_weights() {
        let rare = BlockShape::from_matrix(0, "rare", 1, &[&[1]]).unwrap();
        let common = BlockShape::from_matrix(1, "common", 9, &[&[1, 1]]).unwrap();
        let catalog = ShapeCatalog::new(vec![rare, common]).unwrap();

        let mut generator = BlockGenerator::new(2024);
        let mut common_draws = 0;
        for _ in 0..1000 {
            let batch = generator.next(&catalog, 3, 7);
            common_draws += batch.iter().filter(|b| b.shape_id == 1).count();
        }
        let share = common_draws as f64 / 3000.0;
        assert!((share - 0.9).abs() < 0.05, "share {}", share);
    }

    #[test]
    fn test_zero_weight_shape_is_never_drawn() {
        let never = BlockShape::from_matrix(0, "never", 0, &[&[1]]).unwrap();
        let always = BlockShape::from_matrix(1, "always", 5, &[&[1, 1]]).unwrap();
        let catalog = ShapeCatalog::new(vec![never, always]).unwrap();

        let mut generator = BlockGenerator::new(3);
        for _ in 0..200 {
            assert!(generator.next(&catalog, 3, 7).iter().all(|b| b.shape_id == 1));
        }
    }
}
