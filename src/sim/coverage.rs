//! Flood coverage raster
//!
//! The viewport is divided into square cells. Painting a rectangle marks
//! every cell it touches; the painted count is kept incrementally so
//! repeated overlapping paints never double count and `percentage()` is O(1).

use glam::DVec2;

/// Default cell edge in pixels
pub const DEFAULT_CELL_SIZE: f64 = 1.0;

/// Visited-cell raster for flood mode
#[derive(Debug, Clone)]
pub struct Coverage {
    cell_size: f64,
    cols: usize,
    rows: usize,
    cells: Vec<bool>,
    painted: usize,
}

impl Coverage {
    /// Create an all-unvisited raster covering `viewport`
    pub fn new(viewport: DVec2, cell_size: f64) -> Self {
        let cell_size = if cell_size > 0.0 {
            cell_size
        } else {
            DEFAULT_CELL_SIZE
        };
        let (cols, rows) = Self::grid_dims(viewport, cell_size);
        Self {
            cell_size,
            cols,
            rows,
            cells: vec![false; cols * rows],
            painted: 0,
        }
    }

    fn grid_dims(viewport: DVec2, cell_size: f64) -> (usize, usize) {
        let cols = (viewport.x.max(0.0) / cell_size).ceil() as usize;
        let rows = (viewport.y.max(0.0) / cell_size).ceil() as usize;
        (cols, rows)
    }

    /// Rebuild for a new viewport (clears all paint)
    pub fn resize(&mut self, viewport: DVec2) {
        *self = Self::new(viewport, self.cell_size);
    }

    /// Clear to all-unvisited
    pub fn reset(&mut self) {
        self.cells.fill(false);
        self.painted = 0;
    }

    /// Cell index range touched by the span `[start, start + len)`
    fn span(start: f64, len: f64, cell_size: f64, limit: usize) -> std::ops::Range<usize> {
        let lo = (start / cell_size).floor().max(0.0);
        let hi = ((start + len) / cell_size).ceil().max(0.0);
        let lo = (lo as usize).min(limit);
        let hi = (hi as usize).min(limit);
        lo..hi
    }

    /// Mark the rectangle at `top_left` of `size` as visited
    pub fn paint(&mut self, top_left: DVec2, size: DVec2) {
        if size.x <= 0.0 || size.y <= 0.0 {
            return;
        }
        let cols = Self::span(top_left.x, size.x, self.cell_size, self.cols);
        let rows = Self::span(top_left.y, size.y, self.cell_size, self.rows);

        for row in rows {
            let base = row * self.cols;
            for cell in &mut self.cells[base + cols.start..base + cols.end] {
                if !*cell {
                    *cell = true;
                    self.painted += 1;
                }
            }
        }
    }

    /// Number of visited cells
    pub fn painted_cells(&self) -> usize {
        self.painted
    }

    pub fn total_cells(&self) -> usize {
        self.cells.len()
    }

    /// Visited share of the arena in percent, rounded to one decimal
    pub fn percentage(&self) -> f64 {
        if self.cells.is_empty() {
            return 0.0;
        }
        let raw = self.painted as f64 / self.cells.len() as f64 * 100.0;
        (raw * 10.0).round() / 10.0
    }
}
