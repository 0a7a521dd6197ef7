//! Trajectory value type.
//!
//! A [`Trajectory`] is an immutable (timesteps x dof) sample matrix plus a
//! strictly positive time step. Every transform returns a new value; nothing
//! mutates a trajectory after construction, so sharing one across analyses
//! cannot alias.

use nalgebra::{DMatrix, DVector, RowDVector};

use crate::config::SpeedSearch;
use crate::error::{PrompError, Result};
use crate::speed;

/// A fixed set of DOF signals sampled on a uniform time grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    data: DMatrix<f64>,
    dt: f64,
}

impl Trajectory {
    /// Wrap a (timesteps x dof) sample matrix with time step `dt`.
    ///
    /// # Errors
    ///
    /// Returns an error if the matrix has no rows or columns, or `dt` is
    /// not strictly positive.
    pub fn new(data: DMatrix<f64>, dt: f64) -> Result<Self> {
        if data.nrows() < 1 {
            return Err(PrompError::trajectory_too_short(1, data.nrows()));
        }
        if data.ncols() < 1 {
            return Err(PrompError::EmptySelection);
        }
        if dt <= 0.0 || !dt.is_finite() {
            return Err(PrompError::invalid_config("dt must be strictly positive"));
        }
        Ok(Self { data, dt })
    }

    /// Underlying sample matrix, rows are timesteps.
    #[must_use]
    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.data
    }

    /// Number of timesteps.
    #[must_use]
    pub fn timesteps(&self) -> usize {
        self.data.nrows()
    }

    /// Number of degrees of freedom.
    #[must_use]
    pub fn dof_count(&self) -> usize {
        self.data.ncols()
    }

    /// Time step between consecutive samples.
    #[must_use]
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Time span between the first and last sample.
    #[must_use]
    pub fn duration(&self) -> f64 {
        self.dt * (self.timesteps() - 1) as f64
    }

    /// Sample at timestep `t` as a column vector across DOFs.
    ///
    /// # Panics
    ///
    /// Panics if `t >= timesteps()`.
    #[must_use]
    pub fn row(&self, t: usize) -> DVector<f64> {
        self.data.row(t).transpose()
    }

    /// New trajectory keeping only the leading `steps` timesteps.
    ///
    /// # Errors
    ///
    /// Returns an error if `steps` is zero or exceeds the trajectory length.
    pub fn truncated(&self, steps: usize) -> Result<Self> {
        if steps < 1 || steps > self.timesteps() {
            return Err(PrompError::trajectory_too_short(steps.max(1), self.timesteps()));
        }
        Ok(Self {
            data: self.data.rows(0, steps).into_owned(),
            dt: self.dt,
        })
    }

    /// New trajectory restricted to the given DOF columns, in the given
    /// order.
    ///
    /// # Errors
    ///
    /// Returns an error if the selection is empty or any index is out of
    /// range.
    pub fn sub_trajectory(&self, dofs: &[usize]) -> Result<Self> {
        if dofs.is_empty() {
            return Err(PrompError::EmptySelection);
        }
        let dof_count = self.dof_count();
        for &d in dofs {
            if d >= dof_count {
                return Err(PrompError::dof_out_of_range(d, dof_count));
            }
        }
        let mut data = DMatrix::zeros(self.timesteps(), dofs.len());
        for (j, &d) in dofs.iter().enumerate() {
            data.column_mut(j).copy_from(&self.data.column(d));
        }
        Ok(Self { data, dt: self.dt })
    }

    /// Resample to exactly `target_len` timesteps by piecewise-linear
    /// interpolation along normalized phase.
    ///
    /// Endpoint samples are preserved exactly and the total duration is
    /// unchanged (`dt` is rescaled).
    ///
    /// # Errors
    ///
    /// Returns an error if the trajectory has fewer than 2 timesteps or
    /// `target_len < 2`.
    pub fn modulate(&self, target_len: usize) -> Result<Self> {
        let n = self.timesteps();
        if n < 2 {
            return Err(PrompError::trajectory_too_short(2, n));
        }
        if target_len < 2 {
            return Err(PrompError::trajectory_too_short(2, target_len));
        }

        let mut data = DMatrix::zeros(target_len, self.dof_count());
        for t in 0..target_len {
            let s = t as f64 / (target_len - 1) as f64;
            let x = s * (n - 1) as f64;
            let i0 = (x.floor() as usize).min(n - 2);
            let frac = x - i0 as f64;
            let row: RowDVector<f64> =
                self.data.row(i0) * (1.0 - frac) + self.data.row(i0 + 1) * frac;
            data.row_mut(t).copy_from(&row);
        }

        let dt = self.duration() / (target_len - 1) as f64;
        Self::new(data, dt)
    }

    /// Find the time-scale factor aligning this trajectory against a
    /// reference mean trajectory. See [`speed::infer_speed`].
    ///
    /// # Errors
    ///
    /// Propagates the search's validation and alignment errors.
    pub fn infer_speed(&self, reference: &Trajectory, search: &SpeedSearch) -> Result<f64> {
        speed::infer_speed(self, reference, search)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ramp(n: usize) -> Trajectory {
        let data = DMatrix::from_fn(n, 2, |r, c| {
            if c == 0 {
                r as f64
            } else {
                (r as f64).sin()
            }
        });
        Trajectory::new(data, 0.1).unwrap()
    }

    #[test]
    fn test_construction_invariants() {
        assert!(Trajectory::new(DMatrix::zeros(0, 2), 1.0).is_err());
        assert!(Trajectory::new(DMatrix::zeros(3, 0), 1.0).is_err());
        assert!(Trajectory::new(DMatrix::zeros(3, 2), 0.0).is_err());
        assert!(Trajectory::new(DMatrix::zeros(3, 2), 1.0).is_ok());
    }

    #[test]
    fn test_truncated() {
        let traj = ramp(10);
        let head = traj.truncated(4).unwrap();
        assert_eq!(head.timesteps(), 4);
        assert_eq!(head.dof_count(), 2);
        assert_relative_eq!(head.matrix()[(3, 0)], 3.0);
        assert!(traj.truncated(0).is_err());
        assert!(traj.truncated(11).is_err());
    }

    #[test]
    fn test_sub_trajectory() {
        let traj = ramp(5);
        let sub = traj.sub_trajectory(&[1]).unwrap();
        assert_eq!(sub.dof_count(), 1);
        assert_relative_eq!(sub.matrix()[(2, 0)], 2.0_f64.sin());
        assert!(traj.sub_trajectory(&[]).is_err());
        assert!(traj.sub_trajectory(&[2]).is_err());
    }

    #[test]
    fn test_modulate_preserves_endpoints_and_duration() {
        let traj = ramp(10);
        let long = traj.modulate(25).unwrap();
        assert_eq!(long.timesteps(), 25);
        assert_relative_eq!(long.matrix()[(0, 0)], traj.matrix()[(0, 0)]);
        assert_relative_eq!(long.matrix()[(24, 0)], traj.matrix()[(9, 0)]);
        assert_relative_eq!(long.duration(), traj.duration(), epsilon = 1e-12);
    }

    #[test]
    fn test_modulate_round_trip() {
        let traj = ramp(10);
        let back = traj.modulate(37).unwrap().modulate(10).unwrap();
        // a linear ramp survives linear resampling exactly; the sine within
        // interpolation error
        for t in 0..10 {
            assert_relative_eq!(back.matrix()[(t, 0)], traj.matrix()[(t, 0)], epsilon = 1e-9);
            assert_relative_eq!(back.matrix()[(t, 1)], traj.matrix()[(t, 1)], epsilon = 0.05);
        }
    }

    #[test]
    fn test_modulate_rejects_short_targets() {
        let traj = ramp(10);
        assert!(traj.modulate(1).is_err());
        let single = Trajectory::new(DMatrix::zeros(1, 1), 1.0).unwrap();
        assert!(single.modulate(5).is_err());
    }
}
