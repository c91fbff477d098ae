// THEORY:
// The grid geometry turns a located `Target` into the square scoring area and its
// 3x3 subdivision. The square is deliberately much larger than the visible disk
// (half-extent is four radii) so near misses still land inside the grid.
//
// Cells are addressed row-major, `(row, col)` with row 0 at the top, and the
// point table follows the same order: 1 2 3 / 4 5 6 / 7 8 9.

use crate::core_modules::target_locator::Target;
use serde::{Deserialize, Serialize};

pub const GRID_DIVISIONS: usize = 3;
/// Half-extent of the grid square, in target radii.
pub const GRID_SCALE: f64 = 4.0;

pub const POINT_VALUES: [[u32; GRID_DIVISIONS]; GRID_DIVISIONS] = [[1, 2, 3], [4, 5, 6], [7, 8, 9]];

/// A `(row, col)` address inside the 3x3 grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridCell {
    pub row: usize,
    pub col: usize,
}

impl GridCell {
    pub fn points(&self) -> u32 {
        POINT_VALUES[self.row][self.col]
    }
}

/// Axis-aligned scoring square derived from a target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridArea {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl GridArea {
    pub fn from_target(target: &Target, scale: f64) -> Self {
        let half_extent = target.radius * scale;
        Self {
            min_x: target.center_x - half_extent,
            max_x: target.center_x + half_extent,
            min_y: target.center_y - half_extent,
            max_y: target.center_y + half_extent,
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.min_x + self.max_x) / 2.0, (self.min_y + self.max_y) / 2.0)
    }

    pub fn cell_width(&self) -> f64 {
        self.width() / GRID_DIVISIONS as f64
    }

    pub fn cell_height(&self) -> f64 {
        self.height() / GRID_DIVISIONS as f64
    }

    /// Raw `(row, col)` grid coordinates of a point, which may fall outside `0..3`.
    /// `None` when the area is degenerate.
    pub fn grid_coordinates(&self, x: f64, y: f64) -> Option<(i64, i64)> {
        let (width, height) = (self.width(), self.height());
        if width <= 0.0 || height <= 0.0 {
            return None;
        }
        let divisions = GRID_DIVISIONS as f64;
        let col = (((x - self.min_x) / width) * divisions).floor() as i64;
        let row = (((y - self.min_y) / height) * divisions).floor() as i64;
        Some((row, col))
    }

    /// The cell containing `(x, y)`, if the point lies in the grid.
    pub fn cell_at(&self, x: f64, y: f64) -> Option<GridCell> {
        let (row, col) = self.grid_coordinates(x, y)?;
        let range = 0..GRID_DIVISIONS as i64;
        (range.contains(&row) && range.contains(&col)).then(|| GridCell {
            row: row as usize,
            col: col as usize,
        })
    }

    pub fn cell_center(&self, cell: GridCell) -> (f64, f64) {
        (
            self.min_x + (cell.col as f64 + 0.5) * self.cell_width(),
            self.min_y + (cell.row as f64 + 0.5) * self.cell_height(),
        )
    }

    /// Every cell, row-major.
    pub fn cells() -> impl Iterator<Item = GridCell> {
        (0..GRID_DIVISIONS).flat_map(|row| (0..GRID_DIVISIONS).map(move |col| GridCell { row, col }))
    }
}
