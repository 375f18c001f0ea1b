//! Shapes module - block shape bitmasks and the static catalog
//!
//! A shape is an immutable bitmask inside a `rows x cols` bounding box
//! (row-major, bit `r * cols + c`). Rotations and flips are pure transforms
//! that return new shapes; the generator never applies them on its own.

use arrayvec::ArrayVec;

use crate::types::MAX_SHAPE_CELLS;

/// Offset of a single cell relative to the shape's top-left corner
pub type CellOffset = (i16, i16);

/// Occupied cells of a shape, stack allocated
pub type ShapeCells = ArrayVec<CellOffset, MAX_SHAPE_CELLS>;

/// Immutable block shape
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlockShape {
    /// Stable id, used by snapshots and the queue
    pub id: u16,
    pub name: String,
    rows: u8,
    cols: u8,
    mask: u64,
    /// Relative generation weight (per-mille in the default catalog)
    pub weight: u32,
}

impl BlockShape {
    /// Build a shape from a 0/1 matrix
    ///
    /// Returns `None` for an empty matrix, ragged rows, a bounding box larger
    /// than 64 cells, or a shape with no occupied cell.
    pub fn from_matrix(id: u16, name: &str, weight: u32, matrix: &[&[u8]]) -> Option<Self> {
        let rows = matrix.len();
        let cols = matrix.first()?.len();
        if rows == 0 || cols == 0 || rows * cols > MAX_SHAPE_CELLS {
            return None;
        }
        if matrix.iter().any(|r| r.len() != cols) {
            return None;
        }

        let mut mask = 0u64;
        for (r, row) in matrix.iter().enumerate() {
            for (c, &v) in row.iter().enumerate() {
                if v != 0 {
                    mask |= 1 << (r * cols + c);
                }
            }
        }
        if mask == 0 {
            return None;
        }

        Some(Self {
            id,
            name: name.to_string(),
            rows: rows as u8,
            cols: cols as u8,
            mask,
            weight,
        })
    }

    pub fn rows(&self) -> u8 {
        self.rows
    }

    pub fn cols(&self) -> u8 {
        self.cols
    }

    #[inline(always)]
    pub fn is_set(&self, row: u8, col: u8) -> bool {
        row < self.rows
            && col < self.cols
            && self.mask & (1 << (row as u32 * self.cols as u32 + col as u32)) != 0
    }

    /// Number of occupied cells
    pub fn cell_count(&self) -> usize {
        self.mask.count_ones() as usize
    }

    /// Occupied cell offsets, row-major
    pub fn cells(&self) -> ShapeCells {
        let mut out = ShapeCells::new();
        for r in 0..self.rows {
            for c in 0..self.cols {
                if self.is_set(r, c) {
                    out.push((r as i16, c as i16));
                }
            }
        }
        out
    }

    fn remap(&self, rows: u8, cols: u8, f: impl Fn(u8, u8) -> (u8, u8)) -> Self {
        let mut mask = 0u64;
        for r in 0..self.rows {
            for c in 0..self.cols {
                if self.is_set(r, c) {
                    let (nr, nc) = f(r, c);
                    mask |= 1 << (nr as u32 * cols as u32 + nc as u32);
                }
            }
        }
        Self {
            id: self.id,
            name: self.name.clone(),
            rows,
            cols,
            mask,
            weight: self.weight,
        }
    }

    /// Rotate 90 degrees clockwise
    pub fn rotate90(&self) -> Self {
        let rows = self.rows;
        self.remap(self.cols, self.rows, |r, c| (c, rows - 1 - r))
    }

    /// Mirror left-right
    pub fn flip_horizontal(&self) -> Self {
        let cols = self.cols;
        self.remap(self.rows, self.cols, |r, c| (r, cols - 1 - c))
    }

    /// Mirror top-bottom
    pub fn flip_vertical(&self) -> Self {
        let rows = self.rows;
        self.remap(self.rows, self.cols, |r, c| (rows - 1 - r, c))
    }

    /// Same occupied cells, ignoring id, name and weight
    pub fn same_cells(&self, other: &BlockShape) -> bool {
        self.rows == other.rows && self.cols == other.cols && self.mask == other.mask
    }
}

/// Static, read-only set of shapes with generation weights
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeCatalog {
    shapes: Vec<BlockShape>,
    total_weight: u32,
}

impl ShapeCatalog {
    /// Build a catalog; `None` when empty, ids repeat, or every weight is zero
    pub fn new(shapes: Vec<BlockShape>) -> Option<Self> {
        if shapes.is_empty() {
            return None;
        }
        for (i, s) in shapes.iter().enumerate() {
            if shapes[..i].iter().any(|o| o.id == s.id) {
                return None;
            }
        }
        let total_weight = shapes.iter().map(|s| s.weight).sum::<u32>();
        if total_weight == 0 {
            return None;
        }
        Some(Self {
            shapes,
            total_weight,
        })
    }

    /// The built-in 19-shape catalog; weights sum to 1000
    pub fn standard() -> Self {
        let shapes = STANDARD_SHAPES
            .iter()
            .enumerate()
            .filter_map(|(i, (name, weight, matrix))| {
                BlockShape::from_matrix(i as u16, name, *weight, matrix)
            })
            .collect();
        Self::new(shapes).expect("standard catalog is valid")
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn shapes(&self) -> &[BlockShape] {
        &self.shapes
    }

    pub fn get(&self, id: u16) -> Option<&BlockShape> {
        self.shapes.iter().find(|s| s.id == id)
    }

    pub fn by_name(&self, name: &str) -> Option<&BlockShape> {
        self.shapes.iter().find(|s| s.name == name)
    }

    pub fn total_weight(&self) -> u32 {
        self.total_weight
    }

    /// Normalised draw probability of a shape
    pub fn probability(&self, id: u16) -> f64 {
        self.get(id)
            .map_or(0.0, |s| s.weight as f64 / self.total_weight as f64)
    }

    /// Shape selected by a roll in `[0, total_weight)`
    pub fn pick(&self, roll: u32) -> &BlockShape {
        let mut acc = 0u32;
        for shape in &self.shapes {
            acc += shape.weight;
            if roll < acc {
                return shape;
            }
        }
        // roll >= total only if the caller ignored the contract; take the last shape
        &self.shapes[self.shapes.len() - 1]
    }
}

impl Default for ShapeCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

type ShapeRow = &'static [u8];

/// (name, weight, matrix)
const STANDARD_SHAPES: [(&str, u32, &[ShapeRow]); 19] = [
    ("single", 70, &[&[1]]),
    ("line2_h", 60, &[&[1, 1]]),
    ("line2_v", 60, &[&[1], &[1]]),
    ("line3_h", 60, &[&[1, 1, 1]]),
    ("line3_v", 60, &[&[1], &[1], &[1]]),
    ("line4_h", 50, &[&[1, 1, 1, 1]]),
    ("line4_v", 50, &[&[1], &[1], &[1], &[1]]),
    ("line5_h", 30, &[&[1, 1, 1, 1, 1]]),
    ("line5_v", 30, &[&[1], &[1], &[1], &[1], &[1]]),
    ("square2", 80, &[&[1, 1], &[1, 1]]),
    ("square3", 30, &[&[1, 1, 1], &[1, 1, 1], &[1, 1, 1]]),
    ("t", 60, &[&[1, 1, 1], &[0, 1, 0]]),
    ("l", 60, &[&[1, 0], &[1, 0], &[1, 1]]),
    ("j", 60, &[&[0, 1], &[0, 1], &[1, 1]]),
    ("s", 50, &[&[0, 1, 1], &[1, 1, 0]]),
    ("z", 50, &[&[1, 1, 0], &[0, 1, 1]]),
    ("plus", 30, &[&[0, 1, 0], &[1, 1, 1], &[0, 1, 0]]),
    ("corner_small", 70, &[&[1, 0], &[1, 1]]),
    ("corner_large", 40, &[&[1, 0, 0], &[1, 0, 0], &[1, 1, 1]]),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog_weights_sum_to_one() {
        let catalog = ShapeCatalog::standard();
        assert_eq!(catalog.len(), 19);
        assert_eq!(catalog.total_weight(), 1000);

        let total: f64 = catalog.shapes().iter().map(|s| catalog.probability(s.id)).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_from_matrix_rejects_bad_input() {
        assert!(BlockShape::from_matrix(0, "empty", 1, &[]).is_none());
        assert!(BlockShape::from_matrix(0, "zero", 1, &[&[0, 0]]).is_none());
        assert!(BlockShape::from_matrix(0, "ragged", 1, &[&[1, 1], &[1]]).is_none());
    }

    #[test]
    fn test_rotate_line() {
        let catalog = ShapeCatalog::standard();
        let h = catalog.by_name("line4_h").unwrap();
        let v = catalog.by_name("line4_v").unwrap();
        assert!(h.rotate90().same_cells(v));
        assert!(v.rotate90().same_cells(h));
    }

    #[test]
    fn test_rotate_four_times_is_identity() {
        for shape in ShapeCatalog::standard().shapes() {
            let back = shape.rotate90().rotate90().rotate90().rotate90();
            assert_eq!(&back, shape, "{}", shape.name);
        }
    }

    #[test]
    fn test_rotate_t_clockwise() {
        let t = ShapeCatalog::standard().by_name("t").unwrap().clone();
        // ###      .#
        // .#.  ->  ##
        //          .#
        let r = t.rotate90();
        assert_eq!((r.rows(), r.cols()), (3, 2));
        assert_eq!(r.cells().as_slice(), &[(0, 1), (1, 0), (1, 1), (2, 1)]);
    }

    #[test]
    fn test_flips() {
        let catalog = ShapeCatalog::standard();
        let l = catalog.by_name("l").unwrap();
        let j = catalog.by_name("j").unwrap();
        assert!(l.flip_horizontal().same_cells(j));
        assert!(l.flip_vertical().flip_vertical().same_cells(l));
        assert_eq!(l.flip_vertical().cell_count(), l.cell_count());
    }

    #[test]
    fn test_catalog_rejects_duplicate_ids() {
        let a = BlockShape::from_matrix(1, "a", 1, &[&[1]]).unwrap();
        let b = BlockShape::from_matrix(1, "b", 1, &[&[1, 1]]).unwrap();
        assert!(ShapeCatalog::new(vec![a, b]).is_none());
    }

    #[test]
    fn test_pick_follows_cumulative_weights() {
        let a = BlockShape::from_matrix(0, "a", 1, &[&[1]]).unwrap();
        let b = BlockShape::from_matrix(1, "b", 3, &[&[1, 1]]).unwrap();
        let catalog = ShapeCatalog::new(vec![a, b]).unwrap();
        assert_eq!(catalog.pick(0).id, 0);
        assert_eq!(catalog.pick(1).id, 1);
        assert_eq!(catalog.pick(3).id, 1);
    }
}
