//! Property tests for placement, line clearing and long rollouts

use proptest::prelude::*;

use block_puzzle::core::{can_place, clear_full_lines, placed_cells, Grid, ShapeCatalog};
use block_puzzle::engine::{GameSessionController, Ruleset};
use block_puzzle::types::{Difficulty, GameMode, GameStatus};

fn grid_strategy() -> impl Strategy<Value = Grid> {
    (4u8..=12).prop_flat_map(|size| {
        let n = size as i16;
        prop::collection::vec((0..n, 0..n), 0..(size as usize * size as usize))
            .prop_map(move |cells| Grid::new(size).with_cells_set(cells))
    })
}

proptest! {
    #[test]
    fn test_legal_placement_only_touches_empty_in_bounds_cells(
        grid in grid_strategy(),
        shape_idx in 0usize..19,
        row in -3i16..14,
        col in -3i16..14,
    ) {
        let catalog = ShapeCatalog::standard();
        let shape = &catalog.shapes()[shape_idx % catalog.len()];
        let expected = placed_cells(shape, row, col)
            .all(|(r, c)| grid.in_bounds(r, c) && !grid.is_occupied(r, c));
        prop_assert_eq!(can_place(&grid, shape, row, col), expected);
    }

    #[test]
    fn test_legal_placement_adds_exactly_the_shape_cells(
        grid in grid_strategy(),
        shape_idx in 0usize..19,
        row in 0i16..12,
        col in 0i16..12,
    ) {
        let catalog = ShapeCatalog::standard();
        let shape = &catalog.shapes()[shape_idx % catalog.len()];
        if can_place(&grid, shape, row, col) {
            let after = grid.with_cells_set(placed_cells(shape, row, col));
            prop_assert_eq!(after.occupied_count(), grid.occupied_count() + shape.cell_count());
        }
    }

    #[test]
    fn test_clear_leaves_no_full_line(grid in grid_strategy()) {
        let before = grid.occupied_count();
        let (after, result) = clear_full_lines(&grid);
        let n = after.size() as usize;

        prop_assert!((0..n).all(|i| !after.row_full(i) && !after.col_full(i)));
        prop_assert_eq!(result.total_lines, result.rows_cleared + result.cols_cleared);
        prop_assert_eq!(before - after.occupied_count(), result.cells_cleared as usize);
        if result.total_lines == 0 {
            prop_assert_eq!(&after, &grid);
        }
    }

    #[test]
    fn test_autoplay_rollout_keeps_invariants(seed in any::<u32>(), steps in 1usize..60, zen in any::<bool>()) {
        let mode = if zen { GameMode::Zen } else { GameMode::Classic };
        let mut game = GameSessionController::new(Ruleset::default(), Difficulty::Normal, mode, seed);
        game.start().unwrap();

        let mut last_score = 0;
        for _ in 0..steps {
            if game.session().status() != GameStatus::Playing {
                break;
            }
            let Some(hint) = game.session().first_move(game.ruleset()) else {
                break;
            };
            let out = game.place_block(hint.block_id, hint.row, hint.col).unwrap();
            prop_assert!(out.session.score() >= last_score + 10);
            prop_assert!(out.session.check_invariants(game.ruleset()).is_ok());
            prop_assert!(out.session.combo_count() <= out.session.max_combo());
            last_score = out.session.score();
        }
        if game.session().status() == GameStatus::GameOver {
            prop_assert!(!game.session().has_any_move(game.ruleset()));
        }
    }
}
