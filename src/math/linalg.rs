//! Linear algebra utilities for the weight model.
//!
//! Symmetric positive-definite solves via nalgebra's Cholesky
//! factorization, plus the symmetry/PSD maintenance the conditioning
//! updates rely on.

use nalgebra::{Cholesky, DMatrix, DVector};

use crate::error::{PrompError, Result};

/// Negative diagonal entries larger than this are an invariant violation;
/// smaller ones are rounding noise and get clamped to zero.
pub const PSD_TOLERANCE: f64 = 1e-8;

/// Solve `a * x = rhs` for a symmetric positive-definite `a`.
///
/// Consumes `a` for the factorization. `rhs` may carry multiple columns.
///
/// # Errors
///
/// Returns [`PrompError::RankDeficient`] naming `context` when the Cholesky
/// factorization fails.
pub fn solve_spd(a: DMatrix<f64>, rhs: &DMatrix<f64>, context: &str) -> Result<DMatrix<f64>> {
    let (rows, cols) = a.shape();
    let chol = Cholesky::new(a)
        .ok_or_else(|| PrompError::rank_deficient(context, rows, cols))?;
    Ok(chol.solve(rhs))
}

/// Replace `m` with its symmetric part `(m + m^T) / 2`.
pub fn symmetrize(m: &mut DMatrix<f64>) {
    let t = m.transpose();
    *m += t;
    *m *= 0.5;
}

/// Restore symmetry and verify the diagonal of a covariance matrix.
///
/// Rounding in a posterior update can push diagonal entries a hair below
/// zero; those are clamped. A diagonal entry below `-PSD_TOLERANCE` means
/// the update itself went wrong.
///
/// # Errors
///
/// Returns [`PrompError::CovarianceNotPsd`] naming `context` when a
/// diagonal entry is negative beyond tolerance.
pub fn enforce_psd(m: &mut DMatrix<f64>, context: &str) -> Result<()> {
    symmetrize(m);
    for i in 0..m.nrows() {
        let d = m[(i, i)];
        if d < -PSD_TOLERANCE {
            return Err(PrompError::covariance_not_psd(context));
        }
        if d < 0.0 {
            m[(i, i)] = 0.0;
        }
    }
    Ok(())
}

/// Quadratic form `phi^T * cov * phi`.
#[must_use]
pub fn quadratic_form(phi: &DVector<f64>, cov: &DMatrix<f64>) -> f64 {
    phi.dot(&(cov * phi))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_solve_spd_identity() {
        let a = DMatrix::<f64>::identity(3, 3) * 2.0;
        let rhs = DMatrix::from_column_slice(3, 1, &[2.0, 4.0, 6.0]);
        let x = solve_spd(a, &rhs, "test").unwrap();
        assert_relative_eq!(x[(0, 0)], 1.0, epsilon = 1e-12);
        assert_relative_eq!(x[(1, 0)], 2.0, epsilon = 1e-12);
        assert_relative_eq!(x[(2, 0)], 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_solve_spd_singular() {
        let a = DMatrix::<f64>::zeros(2, 2);
        let rhs = DMatrix::<f64>::zeros(2, 1);
        let err = solve_spd(a, &rhs, "singular test").unwrap_err();
        assert!(err.to_string().contains("singular test"));
    }

    #[test]
    fn test_symmetrize() {
        let mut m = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 4.0, 1.0]);
        symmetrize(&mut m);
        assert_relative_eq!(m[(0, 1)], 3.0);
        assert_relative_eq!(m[(1, 0)], 3.0);
    }

    #[test]
    fn test_enforce_psd_clamps_rounding_noise() {
        let mut m = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, -1e-12]);
        enforce_psd(&mut m, "test").unwrap();
        assert_eq!(m[(1, 1)], 0.0);
    }

    #[test]
    fn test_enforce_psd_rejects_negative_diagonal() {
        let mut m = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, -1.0]);
        assert!(enforce_psd(&mut m, "test").is_err());
    }

    #[test]
    fn test_quadratic_form() {
        let phi = DVector::from_vec(vec![1.0, 2.0]);
        let cov = DMatrix::from_row_slice(2, 2, &[2.0, 0.0, 0.0, 3.0]);
        assert_relative_eq!(quadratic_form(&phi, &cov), 14.0);
    }
}
