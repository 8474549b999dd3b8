//! Tolerances and sizing hints

/// Hints controlling tensor comparison and construction
#[derive(Clone, Debug)]
pub struct TensorHints {
    /// Largest relative difference at which two cell values count as equal
    pub tolerance: f64,
    /// Whether two NaN cells compare equal
    pub nans_equal: bool,
    /// Expected number of cells, used to pre-size builder storage
    pub expected_cells: Option<usize>,
}

impl Default for TensorHints {
    fn default() -> Self {
        Self {
            tolerance: 1e-4,
            nans_equal: true,
            expected_cells: None,
        }
    }
}

impl TensorHints {
    /// Create new hints with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the comparison tolerance
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set whether NaN equals NaN
    pub fn with_nans_equal(mut self, nans_equal: bool) -> Self {
        self.nans_equal = nans_equal;
        self
    }

    /// Set the expected cell count
    pub fn with_expected_cells(mut self, cells: usize) -> Self {
        self.expected_cells = Some(cells);
        self
    }

    /// Whether `a` and `b` are equal under these hints
    pub fn values_equal(&self, a: f64, b: f64) -> bool {
        if a == b {
            return true;
        }
        if a.is_nan() || b.is_nan() {
            return self.nans_equal && a.is_nan() && b.is_nan();
        }
        let difference = (a - b).abs();
        let magnitude = 0.5 * (a.abs() + b.abs());
        if magnitude <= 1.0 {
            difference <= self.tolerance
        } else {
            difference / magnitude <= self.tolerance
        }
    }
}
