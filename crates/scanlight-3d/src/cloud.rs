/// A colored point cloud aligned with the camera pixel grid.
///
/// Each cell holds one 3D point and its BGR color sample. A cell is valid
/// only if its `z` coordinate is positive; cells start at the origin, which
/// doubles as the "not observed" sentinel. The cloud accumulates across
/// frames and later frames may overwrite a cell.
#[derive(Debug, Clone)]
pub struct PointCloudGrid {
    width: usize,
    height: usize,
    points: Vec<[f64; 3]>,
    colors: Vec<[u8; 3]>,
}

impl PointCloudGrid {
    /// Create a new, fully invalid cloud with the given grid size.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            points: vec![[0.0; 3]; width * height],
            colors: vec![[0; 3]; width * height],
        }
    }

    /// Width of the grid in cells.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height of the grid in cells.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn offset(&self, row: usize, col: usize) -> usize {
        row * self.width + col
    }

    /// Get the point stored at a cell.
    #[inline]
    pub fn point(&self, row: usize, col: usize) -> [f64; 3] {
        self.points[self.offset(row, col)]
    }

    /// Get the color sample stored at a cell.
    #[inline]
    pub fn color(&self, row: usize, col: usize) -> [u8; 3] {
        self.colors[self.offset(row, col)]
    }

    /// Check whether a cell holds an observed point.
    #[inline]
    pub fn is_valid(&self, row: usize, col: usize) -> bool {
        self.points[self.offset(row, col)][2] > 0.0
    }

    /// Store a point and its color sample at a cell, overwriting any
    /// previous observation.
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, point: [f64; 3], color: [u8; 3]) {
        let offset = self.offset(row, col);
        self.points[offset] = point;
        self.colors[offset] = color;
    }

    /// Number of valid cells in the cloud.
    pub fn valid_count(&self) -> usize {
        self.points.iter().filter(|p| p[2] > 0.0).count()
    }

    /// Iterate over the valid cells as `(row, col, point, color)`.
    pub fn iter_valid(&self) -> impl Iterator<Item = (usize, usize, [f64; 3], [u8; 3])> + '_ {
        self.points
            .iter()
            .zip(self.colors.iter())
            .enumerate()
            .filter(|(_, (p, _))| p[2] > 0.0)
            .map(|(i, (p, c))| (i / self.width, i % self.width, *p, *c))
    }
}
