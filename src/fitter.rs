//! Per-demonstration weight fitting.
//!
//! Ridge-regularized least squares mapping one demonstration onto the basis
//! expansion: minimize `||y - design * w||^2 + ridge * ||w||^2` per DOF.
//! The normal equations are solved by Cholesky factorization, never by
//! explicit inversion.

use nalgebra::DMatrix;

use crate::error::{PrompError, Result};
use crate::math::linalg::solve_spd;
use crate::trajectory::Trajectory;

/// Fit one weight column per DOF of a demonstration.
///
/// `design` is the (timesteps x n_rbf) basis design matrix evaluated on the
/// demonstration's phase grid. Returns an (n_rbf x dof) weight matrix.
///
/// # Errors
///
/// Returns a dimension mismatch if `design` and the trajectory disagree on
/// timestep count, and [`PrompError::RankDeficient`] if the regularized
/// normal equations cannot be factorized.
pub fn fit_weights(
    trajectory: &Trajectory,
    design: &DMatrix<f64>,
    ridge: f64,
) -> Result<DMatrix<f64>> {
    if design.nrows() != trajectory.timesteps() {
        return Err(PrompError::dimension_mismatch(
            "weight fit design rows",
            trajectory.timesteps(),
            design.nrows(),
        ));
    }

    let n_rbf = design.ncols();
    let gram = design.transpose() * design + DMatrix::identity(n_rbf, n_rbf) * ridge;
    let rhs = design.transpose() * trajectory.matrix();
    solve_spd(gram, &rhs, "weight fit normal equations")
}
