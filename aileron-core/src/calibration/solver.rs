//! Least-squares sensor calibration
//!
//! Offset: fit a sphere through the samples. For a point `s` on a sphere
//! of centre `c`, `|s|² = 2c·s + (r² - |c|²)`, which is linear in the
//! four unknowns `β = (2c, r² - |c|²)`. The normal equations are
//! accumulated sample by sample so no sample buffer is needed.
//!
//! Scale: rows 0..3 collect the squared, normalised samples of each
//! orientation pair. Solving gives `β_i = 1 / scale_i²`.

/// Normal equation accumulator
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CalibrationState {
    xtx: [[f64; 4]; 4],
    xty: [f64; 4],
}

impl CalibrationState {
    pub const fn new() -> Self {
        Self {
            xtx: [[0.0; 4]; 4],
            xty: [0.0; 4],
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Add a sample to the sphere fit
    pub fn push_offset_sample(&mut self, sample: &[i32; 3]) {
        let row = [sample[0] as f64, sample[1] as f64, sample[2] as f64, 1.0];
        let square_sum = row[0] * row[0] + row[1] * row[1] + row[2] * row[2];

        for (i, xi) in row.iter().enumerate() {
            for (j, xj) in row.iter().enumerate() {
                self.xtx[i][j] += xi * xj;
            }
            self.xty[i] += xi * square_sum;
        }
    }

    /// Add an offset-corrected orientation average to the scale fit
    ///
    /// `row` is the orientation pair (0..3) and `target` the expected
    /// magnitude of one unit of gravity.
    pub fn push_scale_sample(&mut self, row: usize, sample: &[i32; 3], target: i32) {
        for (i, value) in sample.iter().enumerate() {
            let scaled = *value as f64 / target as f64;
            self.xtx[row][i] += scaled * scaled;
            self.xtx[3][i] += scaled * scaled;
        }

        self.xtx[row][3] += 1.0;
        self.xty[row] += 1.0;
        self.xty[3] += 1.0;
    }

    /// Centre of the fitted sphere
    pub fn solve_offset(&self) -> Option<[f32; 3]> {
        let beta = solve(self.xtx, self.xty)?;
        Some([(beta[0] / 2.0) as f32, (beta[1] / 2.0) as f32, (beta[2] / 2.0) as f32])
    }

    /// Per-axis gain that maps the samples onto unit magnitude
    pub fn solve_scale(&self) -> Option<[f32; 3]> {
        let beta = solve(self.xtx, self.xty)?;
        if beta[..3].iter().any(|b| *b <= 0.0) {
            return None;
        }
        Some([
            libm::sqrt(beta[0]) as f32,
            libm::sqrt(beta[1]) as f32,
            libm::sqrt(beta[2]) as f32,
        ])
    }
}

/// Gaussian elimination with partial pivoting
///
/// Returns `None` for a singular system.
fn solve(mut a: [[f64; 4]; 4], mut b: [f64; 4]) -> Option<[f64; 4]> {
    let magnitude = a
        .iter()
        .flatten()
        .fold(0.0f64, |acc, v| if v.abs() > acc { v.abs() } else { acc });
    let epsilon = magnitude * 1e-12;

    for col in 0..4 {
        let mut pivot = col;
        for row in col + 1..4 {
            if a[row][col].abs() > a[pivot][col].abs() {
                pivot = row;
            }
        }
        if a[pivot][col].abs() <= epsilon {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in col + 1..4 {
            let factor = a[row][col] / a[col][col];
            for k in col..4 {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = [0.0; 4];
    for row in (0..4).rev() {
        let tail: f64 = (row + 1..4).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Some(x)
}
