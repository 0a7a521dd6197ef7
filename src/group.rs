//! Demonstration collections.
//!
//! A [`TrajectoryGroup`] gathers demonstrations of the same motion and
//! forces them onto a common length before fitting. Members always agree on
//! DOF count; lengths may differ until [`TrajectoryGroup::normalize_length`]
//! runs.

use std::path::Path;

use tracing::debug;

use crate::error::{PrompError, Result};
use crate::io;
use crate::trajectory::Trajectory;

/// Time step assigned to demonstrations loaded from CSV, which carry no
/// time axis of their own.
const CSV_DT: f64 = 1.0;

/// An ordered collection of demonstration trajectories.
#[derive(Debug, Clone, Default)]
pub struct TrajectoryGroup {
    trajectories: Vec<Trajectory>,
}

impl TrajectoryGroup {
    /// Create an empty group.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Demonstrations in insertion order.
    #[must_use]
    pub fn trajectories(&self) -> &[Trajectory] {
        &self.trajectories
    }

    /// Number of demonstrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.trajectories.len()
    }

    /// Whether the group holds no demonstrations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trajectories.is_empty()
    }

    /// DOF count shared by all members, or `None` while empty.
    #[must_use]
    pub fn dof_count(&self) -> Option<usize> {
        self.trajectories.first().map(Trajectory::dof_count)
    }

    /// Add a demonstration.
    ///
    /// # Errors
    ///
    /// Returns an error if its DOF count differs from the members already
    /// present.
    pub fn push(&mut self, trajectory: Trajectory) -> Result<()> {
        if let Some(expected) = self.dof_count() {
            if trajectory.dof_count() != expected {
                return Err(PrompError::dof_mismatch(expected, trajectory.dof_count()));
            }
        }
        self.trajectories.push(trajectory);
        Ok(())
    }

    /// Load one demonstration per CSV path, restricted to the given DOF
    /// columns.
    ///
    /// # Errors
    ///
    /// Propagates load, parse, and selection errors; a failed file leaves
    /// previously loaded members in place.
    pub fn load_csv<P: AsRef<Path>>(&mut self, paths: &[P], dofs: &[usize]) -> Result<()> {
        for path in paths {
            let full = io::read_trajectory(path.as_ref(), CSV_DT)?;
            self.push(full.sub_trajectory(dofs)?)?;
        }
        debug!(demonstrations = self.len(), "loaded demonstration group");
        Ok(())
    }

    /// Resample every member to the rounded mean of member lengths.
    ///
    /// Returns the common length. See [`TrajectoryGroup::normalize_length_to`].
    ///
    /// # Errors
    ///
    /// Returns an error if the group is empty or any member has fewer than
    /// 2 timesteps.
    pub fn normalize_length(&mut self) -> Result<usize> {
        if self.is_empty() {
            return Err(PrompError::EmptyGroup);
        }
        let total: usize = self.trajectories.iter().map(Trajectory::timesteps).sum();
        let mean = (total as f64 / self.len() as f64).round() as usize;
        self.normalize_length_to(mean.max(2))
    }

    /// Resample every member to exactly `target` timesteps.
    ///
    /// One-time mutating operation: members are replaced with their
    /// resampled copies. Afterwards every member reports `timesteps() ==
    /// target`.
    ///
    /// # Errors
    ///
    /// Returns an error if the group is empty, `target < 2`, or any member
    /// has fewer than 2 timesteps.
    pub fn normalize_length_to(&mut self, target: usize) -> Result<usize> {
        if self.is_empty() {
            return Err(PrompError::EmptyGroup);
        }
        let mut resampled = Vec::with_capacity(self.len());
        for trajectory in &self.trajectories {
            resampled.push(trajectory.modulate(target)?);
        }
        self.trajectories = resampled;
        debug!(target, "normalized demonstration lengths");
        Ok(target)
    }
}
