//! Grid module - the N x N occupancy matrix
//!
//! The grid is a square of boolean cells (occupied / empty) stored as a flat
//! row-major array. It holds no game rules: legality lives in `placement`,
//! line detection in `line_clear`.
//!
//! Coordinates are `(row, col)` with row 0 at the top and col 0 on the left.
//! Every mutation is copy-on-write: `with_*` methods return a new grid and
//! leave the receiver untouched, so session snapshots never alias.

use crate::types::{MAX_GRID_SIZE, MIN_GRID_SIZE};

/// Square occupancy grid with flat row-major storage
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Grid {
    size: u8,
    /// Row-major cells (row * size + col)
    cells: Vec<bool>,
}

impl Grid {
    /// Create an empty grid
    ///
    /// `size` is clamped into the supported range.
    pub fn new(size: u8) -> Self {
        let size = size.clamp(MIN_GRID_SIZE, MAX_GRID_SIZE as u8);
        Self {
            size,
            cells: vec![false; size as usize * size as usize],
        }
    }

    /// Build a grid from nested rows; `None` unless the rows form a supported square
    pub fn from_rows(rows: &[Vec<bool>]) -> Option<Self> {
        let size = rows.len();
        if !(MIN_GRID_SIZE as usize..=MAX_GRID_SIZE).contains(&size) {
            return None;
        }
        if rows.iter().any(|row| row.len() != size) {
            return None;
        }
        Some(Self {
            size: size as u8,
            cells: rows.iter().flatten().copied().collect(),
        })
    }

    /// Nested-row view, used by the persisted schema
    pub fn to_rows(&self) -> Vec<Vec<bool>> {
        self.cells
            .chunks(self.size as usize)
            .map(|row| row.to_vec())
            .collect()
    }

    #[inline(always)]
    fn index(&self, row: i16, col: i16) -> Option<usize> {
        let n = self.size as i16;
        if row < 0 || row >= n || col < 0 || col >= n {
            return None;
        }
        Some(row as usize * self.size as usize + col as usize)
    }

    pub fn size(&self) -> u8 {
        self.size
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn in_bounds(&self, row: i16, col: i16) -> bool {
        self.index(row, col).is_some()
    }

    /// Out-of-bounds cells read as unoccupied
    pub fn is_occupied(&self, row: i16, col: i16) -> bool {
        self.index(row, col).map_or(false, |idx| self.cells[idx])
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    pub fn is_empty(&self) -> bool {
        !self.cells.iter().any(|&c| c)
    }

    pub fn row_full(&self, row: usize) -> bool {
        if row >= self.size as usize {
            return false;
        }
        let n = self.size as usize;
        self.cells[row * n..(row + 1) * n].iter().all(|&c| c)
    }

    pub fn col_full(&self, col: usize) -> bool {
        if col >= self.size as usize {
            return false;
        }
        let n = self.size as usize;
        (0..n).all(|row| self.cells[row * n + col])
    }

    /// Occupied share of the grid in `[0.0, 100.0]`
    pub fn fill_percentage(&self) -> f64 {
        self.occupied_count() as f64 * 100.0 / self.cell_count() as f64
    }

    /// New grid with the given cells marked occupied
    ///
    /// Out-of-bounds coordinates are ignored; callers validate first.
    pub fn with_cells_set(&self, cells: impl IntoIterator<Item = (i16, i16)>) -> Grid {
        self.with_cells(cells, true)
    }

    /// New grid with the given cells emptied
    pub fn with_cells_cleared(&self, cells: impl IntoIterator<Item = (i16, i16)>) -> Grid {
        self.with_cells(cells, false)
    }

    fn with_cells(&self, cells: impl IntoIterator<Item = (i16, i16)>, value: bool) -> Grid {
        let mut next = self.clone();
        for (row, col) in cells {
            if let Some(idx) = next.index(row, col) {
                next.cells[idx] = value;
            }
        }
        next
    }

    /// Iterate `(row, col)` of every occupied cell, row-major
    pub fn occupied_cells(&self) -> impl Iterator<Item = (i16, i16)> + '_ {
        let n = self.size as usize;
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, &c)| c)
            .map(move |(i, _)| ((i / n) as i16, (i % n) as i16))
    }

    /// Raw row-major cells
    pub fn cells(&self) -> &[bool] {
        &self.cells
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new(crate::types::DEFAULT_GRID_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_index_calculation() {
        let grid = Grid::new(8);
        assert_eq!(grid.index(0, 0), Some(0));
        assert_eq!(grid.index(0, 7), Some(7));
        assert_eq!(grid.index(1, 0), Some(8));
        assert_eq!(grid.index(7, 7), Some(63));
        assert_eq!(grid.index(-1, 0), None);
        assert_eq!(grid.index(0, 8), None);
        assert_eq!(grid.index(8, 0), None);
    }

    #[test]
    fn test_size_is_clamped() {
        assert_eq!(Grid::new(1).size(), MIN_GRID_SIZE);
        assert_eq!(Grid::new(200).size(), MAX_GRID_SIZE as u8);
    }

    #[test]
    fn test_with_cells_set_is_pure() {
        let grid = Grid::new(8);
        let next = grid.with_cells_set([(0, 0), (3, 4)]);

        assert!(grid.is_empty());
        assert_eq!(next.occupied_count(), 2);
        assert!(next.is_occupied(3, 4));
        assert!(!next.is_occupied(4, 3));
    }

    #[test]
    fn test_rows_and_columns_full() {
        let n = 8i16;
        let grid = Grid::new(8)
            .with_cells_set((0..n).map(|c| (2, c)))
            .with_cells_set((0..n).map(|r| (r, 5)));

        assert!(grid.row_full(2));
        assert!(!grid.row_full(3));
        assert!(grid.col_full(5));
        assert!(!grid.col_full(4));
        assert!(!grid.row_full(99));
        assert_eq!(grid.occupied_count(), 15);
    }

    #[test]
    fn test_fill_percentage() {
        let grid = Grid::new(4).with_cells_set([(0, 0), (0, 1), (0, 2), (0, 3)]);
        assert!((grid.fill_percentage() - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rows_roundtrip() {
        let grid = Grid::new(5).with_cells_set([(1, 2), (4, 0)]);
        let back = Grid::from_rows(&grid.to_rows()).unwrap();
        assert_eq!(grid, back);
    }

    #[test]
    fn test_from_rows_rejects_ragged_and_tiny() {
        let mut ragged = vec![vec![false; 4]; 4];
        ragged[2].pop();
        assert!(Grid::from_rows(&ragged).is_none());
        assert!(Grid::from_rows(&vec![vec![false; 2]; 2]).is_none());
        assert!(Grid::from_rows(&vec![vec![false; 5]; 4]).is_none());
    }
}
