//! Grid: fixed-size 2-D array addressed by column/row.

/// A W×H array of values, row-major, addressed by (x, y) where
/// x is the column (west to east) and y is the row (north to south).
///
/// Backs the usage, token, and vertex-id grids that run parallel to an
/// elevation raster during triangulation.
#[derive(Debug, Clone)]
pub struct Grid<T> {
    width: u32,
    height: u32,
    values: Vec<T>,
}

impl<T: Copy> Grid<T> {
    /// Allocate a width×height grid with every cell set to `fill`.
    pub fn new(width: u32, height: u32, fill: T) -> Self {
        assert!(
            width > 0 && height > 0,
            "grid dimensions must be positive, got {width}×{height}"
        );
        Self {
            width,
            height,
            values: vec![fill; width as usize * height as usize],
        }
    }

    /// Number of columns.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Value at (x, y).
    pub fn get(&self, x: u32, y: u32) -> T {
        self.values[self.index(x, y)]
    }

    /// Set the value at (x, y).
    pub fn set(&mut self, x: u32, y: u32, value: T) {
        let idx = self.index(x, y);
        self.values[idx] = value;
    }

    /// Reset every cell to `value`.
    pub fn fill(&mut self, value: T) {
        for slot in &mut self.values {
            *slot = value;
        }
    }

    fn index(&self, x: u32, y: u32) -> usize {
        assert!(
            x < self.width && y < self.height,
            "grid access out of bounds: ({x}, {y}) in {}×{}",
            self.width,
            self.height
        );
        y as usize * self.width as usize + x as usize
    }
}
