//! Radial basis expansion over normalized phase.
//!
//! A trajectory shape is represented as a weighted sum of Gaussian bumps
//! placed evenly across phase `[0, 1]`. Activations are normalized to sum
//! to one at every phase value, so the representation carries no scale
//! drift near the phase boundaries.

use nalgebra::{DMatrix, DVector};

use crate::error::{PrompError, Result};

/// Evaluates normalized Gaussian basis activations at phase values.
///
/// Centers are evenly spaced on `[0, 1]`; all bases share one width set as
/// a multiple of the center spacing.
#[derive(Debug, Clone, PartialEq)]
pub struct BasisExpansion {
    centers: DVector<f64>,
    width: f64,
}

impl BasisExpansion {
    /// Create an expansion of `n_rbf` bases with width `width_scale` times
    /// the center spacing.
    ///
    /// # Errors
    ///
    /// Returns an error if `n_rbf < 2` or `width_scale` is not positive.
    pub fn new(n_rbf: usize, width_scale: f64) -> Result<Self> {
        if n_rbf < 2 {
            return Err(PrompError::invalid_config("n_rbf must be at least 2"));
        }
        if width_scale <= 0.0 {
            return Err(PrompError::invalid_config("width_scale must be positive"));
        }
        let spacing = 1.0 / (n_rbf - 1) as f64;
        let centers = DVector::from_fn(n_rbf, |i, _| i as f64 * spacing);
        Ok(Self {
            centers,
            width: spacing * width_scale,
        })
    }

    /// Number of basis functions.
    #[must_use]
    pub fn n_rbf(&self) -> usize {
        self.centers.len()
    }

    /// Normalized activations at phase `s`.
    ///
    /// The returned vector is nonnegative and sums to exactly one.
    #[must_use]
    pub fn activations(&self, s: f64) -> DVector<f64> {
        let inv_two_var = 1.0 / (2.0 * self.width * self.width);
        let mut phi = self.centers.map(|c| {
            let d = s - c;
            (-d * d * inv_two_var).exp()
        });
        let total: f64 = phi.sum();
        phi /= total;
        phi
    }

    /// Full design matrix for `timesteps` evenly spaced phase samples.
    ///
    /// Row `t` holds `activations(t / (timesteps - 1))`, so the first and
    /// last rows sit exactly at phase 0 and 1.
    ///
    /// # Errors
    ///
    /// Returns an error if `timesteps < 2`.
    pub fn design_matrix(&self, timesteps: usize) -> Result<DMatrix<f64>> {
        if timesteps < 2 {
            return Err(PrompError::trajectory_too_short(2, timesteps));
        }
        let n = self.n_rbf();
        let mut design = DMatrix::zeros(timesteps, n);
        for t in 0..timesteps {
            let s = t as f64 / (timesteps - 1) as f64;
            let phi = self.activations(s);
            design.row_mut(t).copy_from(&phi.transpose());
        }
        Ok(design)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rejects_degenerate_basis() {
        assert!(BasisExpansion::new(1, 1.0).is_err());
        assert!(BasisExpansion::new(5, 0.0).is_err());
    }

    #[test]
    fn test_partition_of_unity() {
        let basis = BasisExpansion::new(20, 1.0).unwrap();
        for i in 0..=200 {
            let s = f64::from(i) / 200.0;
            let phi = basis.activations(s);
            assert_relative_eq!(phi.sum(), 1.0, epsilon = 1e-12);
            assert!(phi.iter().all(|&a| a >= 0.0));
        }
    }

    #[test]
    fn test_centers_span_phase() {
        let basis = BasisExpansion::new(5, 1.0).unwrap();
        // at phase 0 the first basis dominates, at phase 1 the last
        let phi0 = basis.activations(0.0);
        let phi1 = basis.activations(1.0);
        assert_eq!(phi0.argmax().0, 0);
        assert_eq!(phi1.argmax().0, 4);
    }

    #[test]
    fn test_design_matrix_shape() {
        let basis = BasisExpansion::new(10, 1.0).unwrap();
        let design = basis.design_matrix(50).unwrap();
        assert_eq!(design.shape(), (50, 10));
        for t in 0..50 {
            assert_relative_eq!(design.row(t).sum(), 1.0, epsilon = 1e-12);
        }
        assert!(basis.design_matrix(1).is_err());
    }
}
