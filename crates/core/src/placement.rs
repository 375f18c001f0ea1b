//! Placement module - legality of putting a shape on the grid
//!
//! A placement is legal only if every occupied cell of the shape lands in
//! bounds on an empty grid cell. Checks fail closed: one bad cell rejects the
//! whole placement, and nothing is ever partially applied.

use crate::grid::Grid;
use crate::shapes::BlockShape;

/// Why a placement was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementError {
    OutOfBounds { row: i16, col: i16 },
    Occupied { row: i16, col: i16 },
}

impl PlacementError {
    pub fn code(self) -> &'static str {
        match self {
            PlacementError::OutOfBounds { .. } => "out_of_bounds",
            PlacementError::Occupied { .. } => "occupied",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            PlacementError::OutOfBounds { .. } => "block would extend past the grid edge",
            PlacementError::Occupied { .. } => "block would overlap an occupied cell",
        }
    }

    pub fn cell(self) -> (i16, i16) {
        match self {
            PlacementError::OutOfBounds { row, col } | PlacementError::Occupied { row, col } => {
                (row, col)
            }
        }
    }
}

/// First violating cell of a placement, scanning the shape row-major
pub fn check_placement(
    grid: &Grid,
    shape: &BlockShape,
    origin_row: i16,
    origin_col: i16,
) -> Result<(), PlacementError> {
    for (dr, dc) in shape.cells() {
        let row = origin_row + dr;
        let col = origin_col + dc;
        if !grid.in_bounds(row, col) {
            return Err(PlacementError::OutOfBounds { row, col });
        }
        if grid.is_occupied(row, col) {
            return Err(PlacementError::Occupied { row, col });
        }
    }
    Ok(())
}

pub fn can_place(grid: &Grid, shape: &BlockShape, origin_row: i16, origin_col: i16) -> bool {
    check_placement(grid, shape, origin_row, origin_col).is_ok()
}

/// First legal origin in row-major order
pub fn first_legal_placement(grid: &Grid, shape: &BlockShape) -> Option<(i16, i16)> {
    let n = grid.size() as i16;
    // Origins that push the bounding box past the edge can never be legal.
    let max_row = n - shape.rows() as i16;
    let max_col = n - shape.cols() as i16;
    for row in 0..=max_row {
        for col in 0..=max_col {
            if can_place(grid, shape, row, col) {
                return Some((row, col));
            }
        }
    }
    None
}

pub fn has_any_legal_placement(grid: &Grid, shape: &BlockShape) -> bool {
    first_legal_placement(grid, shape).is_some()
}

/// Every legal origin, row-major
pub fn legal_placements(grid: &Grid, shape: &BlockShape) -> Vec<(i16, i16)> {
    let n = grid.size() as i16;
    let mut out = Vec::new();
    for row in 0..=(n - shape.rows() as i16) {
        for col in 0..=(n - shape.cols() as i16) {
            if can_place(grid, shape, row, col) {
                out.push((row, col));
            }
        }
    }
    out
}

/// Absolute cells a legal placement would occupy
pub fn placed_cells(
    shape: &BlockShape,
    origin_row: i16,
    origin_col: i16,
) -> impl Iterator<Item = (i16, i16)> {
    shape
        .cells()
        .into_iter()
        .map(move |(dr, dc)| (origin_row + dr, origin_col + dc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::ShapeCatalog;

    fn shape(name: &str) -> BlockShape {
        ShapeCatalog::standard().by_name(name).unwrap().clone()
    }

    #[test]
    fn test_place_on_empty_grid() {
        let grid = Grid::new(8);
        assert!(can_place(&grid, &shape("square2"), 0, 0));
        assert!(can_place(&grid, &shape("square2"), 6, 6));
    }

    #[test]
    fn test_out_of_bounds_rejected() {
        let grid = Grid::new(8);
        assert_eq!(
            check_placement(&grid, &shape("square2"), 7, 0),
            Err(PlacementError::OutOfBounds { row: 8, col: 0 })
        );
        assert!(!can_place(&grid, &shape("single"), -1, 0));
        assert!(!can_place(&grid, &shape("line5_h"), 0, 4));
    }

    #[test]
    fn test_overlap_rejected_fail_closed() {
        let grid = Grid::new(8).with_cells_set([(1, 1)]);
        let err = check_placement(&grid, &shape("square2"), 0, 0).unwrap_err();
        assert_eq!(err, PlacementError::Occupied { row: 1, col: 1 });
        assert_eq!(err.code(), "occupied");
    }

    #[test]
    fn test_empty_cells_in_bounding_box_may_overlap() {
        // corner_small is #. / ## : (0,1) is not part of the shape
        let grid = Grid::new(8).with_cells_set([(0, 1)]);
        assert!(can_place(&grid, &shape("corner_small"), 0, 0));
    }

    #[test]
    fn test_first_legal_is_row_major() {
        let grid = Grid::new(4).with_cells_set([(0, 0), (0, 1), (0, 2)]);
        assert_eq!(first_legal_placement(&grid, &shape("single")), Some((0, 3)));
        assert_eq!(first_legal_placement(&grid, &shape("line2_h")), Some((1, 0)));
    }

    #[test]
    fn test_no_legal_placement_on_full_grid() {
        let grid = Grid::new(4).with_cells_set((0..4).flat_map(|r| (0..4).map(move |c| (r, c))));
        assert!(!has_any_legal_placement(&grid, &shape("single")));
        assert!(legal_placements(&grid, &shape("single")).is_empty());
    }

    #[test]
    fn test_shape_larger_than_grid() {
        let grid = Grid::new(4);
        assert!(!has_any_legal_placement(&grid, &shape("line5_h")));
        assert!(legal_placements(&grid, &shape("line5_v")).is_empty());
    }

    #[test]
    fn test_legal_placements_count_on_empty_grid() {
        let grid = Grid::new(8);
        assert_eq!(legal_placements(&grid, &shape("single")).len(), 64);
        assert_eq!(legal_placements(&grid, &shape("square3")).len(), 36);
    }
}
