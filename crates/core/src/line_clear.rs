//! Line clear module - detection and simultaneous removal of full lines
//!
//! After a placement, every row and every column is scanned once. All full
//! lines found in that scan are cleared together, so a move completing a row
//! and a column at once clears both, and the shared intersection cell is
//! emptied exactly once. Cells do not shift: cleared cells simply become empty.

use arrayvec::ArrayVec;

use crate::grid::Grid;
use crate::types::MAX_GRID_SIZE;

/// Indices of full lines, stack allocated
pub type LineIndices = ArrayVec<u8, MAX_GRID_SIZE>;

/// Full rows and columns found by a scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FullLines {
    pub rows: LineIndices,
    pub cols: LineIndices,
}

impl FullLines {
    pub fn total(&self) -> usize {
        self.rows.len() + self.cols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Outcome of a clear pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClearResult {
    pub rows_cleared: u32,
    pub cols_cleared: u32,
    pub total_lines: u32,
    /// Distinct cells emptied (intersections counted once)
    pub cells_cleared: u32,
    pub lines: FullLines,
}

impl ClearResult {
    /// More than one line in a single pass
    pub fn is_multi_clear(&self) -> bool {
        self.total_lines > 1
    }
}

/// Scan all rows and columns for full occupancy
pub fn find_full_lines(grid: &Grid) -> FullLines {
    let n = grid.size() as usize;
    let mut lines = FullLines::default();
    for i in 0..n {
        if grid.row_full(i) {
            lines.rows.push(i as u8);
        }
        if grid.col_full(i) {
            lines.cols.push(i as u8);
        }
    }
    lines
}

/// Clear every full row and column simultaneously
///
/// Returns the new grid and what was cleared; the input grid is untouched.
pub fn clear_full_lines(grid: &Grid) -> (Grid, ClearResult) {
    let lines = find_full_lines(grid);
    if lines.is_empty() {
        return (grid.clone(), ClearResult::default());
    }

    let in_cleared_line = |row: i16, col: i16| {
        lines.rows.contains(&(row as u8)) || lines.cols.contains(&(col as u8))
    };
    let doomed: Vec<(i16, i16)> = grid
        .occupied_cells()
        .filter(|&(r, c)| in_cleared_line(r, c))
        .collect();

    let next = grid.with_cells_cleared(doomed.iter().copied());
    let result = ClearResult {
        rows_cleared: lines.rows.len() as u32,
        cols_cleared: lines.cols.len() as u32,
        total_lines: lines.total() as u32,
        cells_cleared: doomed.len() as u32,
        lines,
    };
    (next, result)
}
