//! Probabilistic movement primitive model.
//!
//! Aggregates per-demonstration basis weights into a Gaussian distribution
//! (mean + covariance), generates trajectories and uncertainty bands from
//! it, and supports Bayesian conditioning on via-points. Conditioning is
//! the one mutating operation; it takes `&mut self`, so exclusive access is
//! enforced by ownership rather than convention.

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::basis::BasisExpansion;
use crate::config::{CovarianceStructure, ModelConfig};
use crate::error::{PrompError, Result};
use crate::fitter::fit_weights;
use crate::group::TrajectoryGroup;
use crate::math::linalg::{enforce_psd, quadratic_form, solve_spd};
use crate::trajectory::Trajectory;

/// Floor applied to the innovation covariance so an all-zero observation
/// covariance acts as an exact interpolation constraint instead of a
/// singular solve.
const INNOVATION_FLOOR: f64 = 1e-10;

/// A desired value at one timestep of the model's normalized time range.
///
/// Small observation covariance pins the generated trajectory to the value;
/// large covariance leaves the model effectively untouched. Consumed by
/// [`ProMP::condition_via_points`], not retained.
#[derive(Debug, Clone, PartialEq)]
pub struct ViaPoint {
    /// Target timestep, 0-based within the model's training length.
    pub timestep: usize,
    /// Observed value, one entry per DOF.
    pub value: DVector<f64>,
    /// Observation covariance across DOFs.
    pub covariance: DMatrix<f64>,
}

impl ViaPoint {
    /// Create a via-point with an explicit observation covariance.
    #[must_use]
    pub fn new(timestep: usize, value: DVector<f64>, covariance: DMatrix<f64>) -> Self {
        Self {
            timestep,
            value,
            covariance,
        }
    }

    /// Create a via-point with isotropic observation noise of the given
    /// variance.
    #[must_use]
    pub fn with_uniform_noise(timestep: usize, value: DVector<f64>, variance: f64) -> Self {
        let dof = value.len();
        Self {
            timestep,
            value,
            covariance: DMatrix::identity(dof, dof) * variance,
        }
    }
}

/// Trajectory-space covariance propagated from the weight distribution.
#[derive(Debug, Clone, PartialEq)]
pub enum TrajectoryCovariance {
    /// One `timesteps x timesteps` matrix per DOF.
    PerDof(Vec<DMatrix<f64>>),
    /// A single `(timesteps * dof) x (timesteps * dof)` matrix with
    /// DOF-major block ordering.
    Joint(DMatrix<f64>),
}

/// Gaussian distribution over basis weights, one block per DOF or a single
/// stacked block depending on [`CovarianceStructure`].
#[derive(Debug, Clone, PartialEq)]
struct WeightBlock {
    mean: DVector<f64>,
    cov: DMatrix<f64>,
}

/// A learned movement primitive.
#[derive(Debug, Clone, PartialEq)]
pub struct ProMP {
    basis: BasisExpansion,
    structure: CovarianceStructure,
    train_len: usize,
    train_dt: f64,
    dof_count: usize,
    blocks: Vec<WeightBlock>,
}

impl ProMP {
    /// Learn a movement primitive from a length-normalized demonstration
    /// group.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the group is empty
    /// or not length-normalized, or a demonstration's weight fit fails.
    pub fn new(group: &TrajectoryGroup, config: &ModelConfig) -> Result<Self> {
        config.validate()?;
        let demos = group.trajectories();
        let Some(first) = demos.first() else {
            return Err(PrompError::EmptyGroup);
        };
        let train_len = first.timesteps();
        let dof_count = first.dof_count();
        for demo in demos {
            if demo.timesteps() != train_len {
                return Err(PrompError::dimension_mismatch(
                    "demonstration length (normalize the group first)",
                    train_len,
                    demo.timesteps(),
                ));
            }
        }

        let basis = BasisExpansion::new(config.n_rbf, config.width_scale)?;
        let design = basis.design_matrix(train_len)?;

        let mut weight_sets = Vec::with_capacity(demos.len());
        for demo in demos {
            weight_sets.push(fit_weights(demo, &design, config.ridge)?);
        }

        let blocks = match config.covariance {
            CovarianceStructure::Independent => (0..dof_count)
                .map(|d| {
                    let samples: Vec<DVector<f64>> = weight_sets
                        .iter()
                        .map(|w| w.column(d).into_owned())
                        .collect();
                    empirical_gaussian(&samples)
                })
                .collect(),
            CovarianceStructure::Joint => {
                let samples: Vec<DVector<f64>> = weight_sets
                    .iter()
                    .map(|w| DVector::from_column_slice(w.as_slice()))
                    .collect();
                vec![empirical_gaussian(&samples)]
            }
        };

        debug!(
            n_rbf = config.n_rbf,
            demonstrations = demos.len(),
            dof_count,
            "learned weight distribution"
        );

        Ok(Self {
            basis,
            structure: config.covariance,
            train_len,
            train_dt: first.dt(),
            dof_count,
            blocks,
        })
    }

    /// Number of basis functions.
    #[must_use]
    pub fn n_rbf(&self) -> usize {
        self.basis.n_rbf()
    }

    /// Number of modeled DOFs.
    #[must_use]
    pub fn dof_count(&self) -> usize {
        self.dof_count
    }

    /// Normalized training length the model's timestep indices refer to.
    #[must_use]
    pub fn train_len(&self) -> usize {
        self.train_len
    }

    /// Covariance layout across DOFs.
    #[must_use]
    pub fn structure(&self) -> CovarianceStructure {
        self.structure
    }

    /// Current weight mean for one DOF.
    ///
    /// # Errors
    ///
    /// Returns an error if `dof` is out of range.
    pub fn weight_mean(&self, dof: usize) -> Result<DVector<f64>> {
        self.check_dof(dof)?;
        let n = self.n_rbf();
        Ok(match self.structure {
            CovarianceStructure::Independent => self.blocks[dof].mean.clone(),
            CovarianceStructure::Joint => {
                self.blocks[0].mean.rows(dof * n, n).into_owned()
            }
        })
    }

    /// Current weight covariance block for one DOF.
    ///
    /// # Errors
    ///
    /// Returns an error if `dof` is out of range.
    pub fn weight_covariance(&self, dof: usize) -> Result<DMatrix<f64>> {
        self.check_dof(dof)?;
        let n = self.n_rbf();
        Ok(match self.structure {
            CovarianceStructure::Independent => self.blocks[dof].cov.clone(),
            CovarianceStructure::Joint => self.blocks[0]
                .cov
                .view((dof * n, dof * n), (n, n))
                .into_owned(),
        })
    }

    /// Mean trajectory at the training length.
    ///
    /// # Errors
    ///
    /// Propagates design-matrix construction errors.
    pub fn generate_trajectory(&self) -> Result<Trajectory> {
        self.generate_trajectory_with_len(self.train_len)
    }

    /// Mean trajectory evaluated at `len` evenly spaced phases.
    ///
    /// Decoupled from the training length; each returned step covers one
    /// tick of the training clock.
    ///
    /// # Errors
    ///
    /// Returns an error if `len < 2`.
    pub fn generate_trajectory_with_len(&self, len: usize) -> Result<Trajectory> {
        let design = self.basis.design_matrix(len)?;
        let mut data = DMatrix::zeros(len, self.dof_count);
        for d in 0..self.dof_count {
            let mean = self.weight_mean(d)?;
            data.column_mut(d).copy_from(&(&design * mean));
        }
        Trajectory::new(data, self.train_dt)
    }

    /// Mean trajectory re-timed by a speed factor.
    ///
    /// A factor below 1 stretches playback over more timesteps, above 1
    /// compresses it; the phase range covered is always `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns an error if `speed` is not strictly positive and finite.
    pub fn generate_trajectory_with_speed(&self, speed: f64) -> Result<Trajectory> {
        if speed <= 0.0 || !speed.is_finite() {
            return Err(PrompError::invalid_config("speed must be strictly positive"));
        }
        let len = (self.train_len as f64 / speed).round() as usize;
        self.generate_trajectory_with_len(len.max(2))
    }

    /// Per-timestep standard deviation band at the training length.
    ///
    /// # Errors
    ///
    /// Propagates design-matrix construction errors.
    pub fn std_dev(&self) -> Result<DMatrix<f64>> {
        self.std_dev_with_len(self.train_len)
    }

    /// Per-timestep standard deviation band at `len` evenly spaced phases.
    ///
    /// Entry `(t, d)` is `sqrt(phi_t^T * cov_d * phi_t)` for DOF `d`.
    ///
    /// # Errors
    ///
    /// Returns an error if `len < 2`.
    pub fn std_dev_with_len(&self, len: usize) -> Result<DMatrix<f64>> {
        let covs: Vec<DMatrix<f64>> = (0..self.dof_count)
            .map(|d| self.weight_covariance(d))
            .collect::<Result<_>>()?;
        let mut out = DMatrix::zeros(len, self.dof_count);
        let design = self.basis.design_matrix(len)?;
        for t in 0..len {
            let phi = design.row(t).transpose();
            for (d, cov) in covs.iter().enumerate() {
                out[(t, d)] = quadratic_form(&phi, cov).max(0.0).sqrt();
            }
        }
        Ok(out)
    }

    /// Full trajectory-space covariance at the training length.
    ///
    /// Propagates the weight covariance through the design matrix:
    /// `design * cov * design^T` per DOF for the independent structure, or
    /// one DOF-major joint matrix for the joint structure.
    ///
    /// # Errors
    ///
    /// Propagates design-matrix construction errors.
    pub fn trajectory_covariance(&self) -> Result<TrajectoryCovariance> {
        let design = self.basis.design_matrix(self.train_len)?;
        match self.structure {
            CovarianceStructure::Independent => {
                let per_dof = self
                    .blocks
                    .iter()
                    .map(|b| &design * &b.cov * design.transpose())
                    .collect();
                Ok(TrajectoryCovariance::PerDof(per_dof))
            }
            CovarianceStructure::Joint => {
                let stacked =
                    DMatrix::identity(self.dof_count, self.dof_count).kronecker(&design);
                Ok(TrajectoryCovariance::Joint(
                    &stacked * &self.blocks[0].cov * stacked.transpose(),
                ))
            }
        }
    }

    /// Condition the weight distribution on via-points, in order.
    ///
    /// Each via-point applies a Gaussian posterior update in place; later
    /// points see the posterior left by earlier ones. The covariance is
    /// re-symmetrized after every update and its diagonal verified.
    ///
    /// # Errors
    ///
    /// Returns an error on an out-of-range timestep, mismatched value or
    /// covariance dimensions, a singular innovation covariance, or a
    /// covariance that loses positive semi-definiteness.
    pub fn condition_via_points(&mut self, via_points: &[ViaPoint]) -> Result<()> {
        for vp in via_points {
            self.check_via_point(vp)?;
            let phase = vp.timestep as f64 / (self.train_len - 1) as f64;
            let phi = self.basis.activations(phase);
            match self.structure {
                CovarianceStructure::Independent => self.condition_independent(vp, &phi)?,
                CovarianceStructure::Joint => self.condition_joint(vp, &phi)?,
            }
        }
        debug!(via_points = via_points.len(), "conditioned weight distribution");
        Ok(())
    }

    /// Scalar posterior update per DOF; observation noise is the diagonal
    /// of the via-point covariance.
    fn condition_independent(&mut self, vp: &ViaPoint, phi: &DVector<f64>) -> Result<()> {
        for (d, block) in self.blocks.iter_mut().enumerate() {
            let sigma_phi = &block.cov * phi;
            let innovation_cov =
                (phi.dot(&sigma_phi) + vp.covariance[(d, d)]).max(INNOVATION_FLOOR);
            if !innovation_cov.is_finite() {
                return Err(PrompError::SingularInnovation {
                    timestep: vp.timestep,
                    dim: 1,
                });
            }
            let gain = &sigma_phi / innovation_cov;
            let residual = vp.value[d] - phi.dot(&block.mean);
            block.mean += &gain * residual;
            block.cov -= gain * sigma_phi.transpose();
            enforce_psd(&mut block.cov, "via-point conditioning")?;
        }
        Ok(())
    }

    /// Full-matrix posterior update coupling all DOFs through the joint
    /// weight covariance.
    fn condition_joint(&mut self, vp: &ViaPoint, phi: &DVector<f64>) -> Result<()> {
        let dof = self.dof_count;
        let block = &mut self.blocks[0];

        let obs = DMatrix::identity(dof, dof).kronecker(&phi.transpose());
        let obs_sigma = &obs * &block.cov;
        let innovation_cov = &obs_sigma * obs.transpose()
            + &vp.covariance
            + DMatrix::identity(dof, dof) * INNOVATION_FLOOR;

        let gain_t = solve_spd(innovation_cov, &obs_sigma, "via-point innovation").map_err(
            |_| PrompError::SingularInnovation {
                timestep: vp.timestep,
                dim: dof,
            },
        )?;
        let gain = gain_t.transpose();

        let residual = &vp.value - &obs * &block.mean;
        block.mean += &gain * residual;
        block.cov -= &gain * obs_sigma;
        enforce_psd(&mut block.cov, "via-point conditioning")
    }

    fn check_dof(&self, dof: usize) -> Result<()> {
        if dof >= self.dof_count {
            return Err(PrompError::dof_out_of_range(dof, self.dof_count));
        }
        Ok(())
    }

    fn check_via_point(&self, vp: &ViaPoint) -> Result<()> {
        if vp.timestep >= self.train_len {
            return Err(PrompError::ViaPointOutOfRange {
                timestep: vp.timestep,
                timesteps: self.train_len,
            });
        }
        if vp.value.len() != self.dof_count {
            return Err(PrompError::dimension_mismatch(
                "via-point value",
                self.dof_count,
                vp.value.len(),
            ));
        }
        if vp.covariance.shape() != (self.dof_count, self.dof_count) {
            return Err(PrompError::dimension_mismatch(
                "via-point covariance",
                self.dof_count,
                vp.covariance.nrows(),
            ));
        }
        Ok(())
    }
}

/// Empirical mean and covariance of weight samples across demonstrations.
///
/// Uses the unbiased `D - 1` divisor; a single demonstration yields a zero
/// covariance (a deterministic model).
fn empirical_gaussian(samples: &[DVector<f64>]) -> WeightBlock {
    let count = samples.len();
    let dim = samples[0].len();
    let mut mean = DVector::zeros(dim);
    for s in samples {
        mean += s;
    }
    mean /= count as f64;

    let mut cov = DMatrix::zeros(dim, dim);
    if count > 1 {
        for s in samples {
            let centered = s - &mean;
            cov += &centered * centered.transpose();
        }
        cov /= (count - 1) as f64;
    }
    WeightBlock { mean, cov }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sine_group(lens: &[usize]) -> TrajectoryGroup {
        let mut group = TrajectoryGroup::new();
        for (k, &n) in lens.iter().enumerate() {
            let amp = 1.0 + 0.05 * k as f64;
            let data = DMatrix::from_fn(n, 1, |r, _| {
                amp * (std::f64::consts::PI * r as f64 / (n - 1) as f64).sin()
            });
            group.push(Trajectory::new(data, 1.0).unwrap()).unwrap();
        }
        group
    }

    fn fitted_model(structure: CovarianceStructure) -> ProMP {
        let mut group = sine_group(&[100, 120, 90]);
        group.normalize_length_to(100).unwrap();
        let config = ModelConfig::new().with_covariance(structure);
        ProMP::new(&group, &config).unwrap()
    }

    #[test]
    fn test_rejects_unnormalized_group() {
        let group = sine_group(&[100, 120]);
        assert!(ProMP::new(&group, &ModelConfig::default()).is_err());
    }

    #[test]
    fn test_rejects_empty_group() {
        let group = TrajectoryGroup::new();
        assert!(matches!(
            ProMP::new(&group, &ModelConfig::default()),
            Err(PrompError::EmptyGroup)
        ));
    }

    #[test]
    fn test_generation_shapes() {
        let model = fitted_model(CovarianceStructure::Independent);
        assert_eq!(model.train_len(), 100);
        let mean = model.generate_trajectory().unwrap();
        assert_eq!(mean.timesteps(), 100);
        assert_eq!(mean.dof_count(), 1);
        let longer = model.generate_trajectory_with_len(250).unwrap();
        assert_eq!(longer.timesteps(), 250);
        let std = model.std_dev().unwrap();
        assert_eq!(std.shape(), (100, 1));
    }

    #[test]
    fn test_speed_changes_step_count() {
        let model = fitted_model(CovarianceStructure::Independent);
        let slow = model.generate_trajectory_with_speed(0.5).unwrap();
        assert_eq!(slow.timesteps(), 200);
        let fast = model.generate_trajectory_with_speed(2.0).unwrap();
        assert_eq!(fast.timesteps(), 50);
        assert!(model.generate_trajectory_with_speed(0.0).is_err());
    }

    #[test]
    fn test_trajectory_covariance_shapes() {
        let model = fitted_model(CovarianceStructure::Independent);
        match model.trajectory_covariance().unwrap() {
            TrajectoryCovariance::PerDof(per_dof) => {
                assert_eq!(per_dof.len(), 1);
                assert_eq!(per_dof[0].shape(), (100, 100));
            }
            TrajectoryCovariance::Joint(_) => panic!("expected per-DOF covariance"),
        }

        let model = fitted_model(CovarianceStructure::Joint);
        match model.trajectory_covariance().unwrap() {
            TrajectoryCovariance::Joint(cov) => assert_eq!(cov.shape(), (100, 100)),
            TrajectoryCovariance::PerDof(_) => panic!("expected joint covariance"),
        }
    }

    #[test]
    fn test_conditioning_with_huge_noise_is_a_noop() {
        let mut model = fitted_model(CovarianceStructure::Independent);
        let prior_mean = model.weight_mean(0).unwrap();
        let prior_cov = model.weight_covariance(0).unwrap();

        let vp = ViaPoint::with_uniform_noise(50, DVector::from_element(1, 5.0), 1e12);
        model.condition_via_points(&[vp]).unwrap();

        let post_mean = model.weight_mean(0).unwrap();
        let post_cov = model.weight_covariance(0).unwrap();
        for i in 0..prior_mean.len() {
            assert_relative_eq!(post_mean[i], prior_mean[i], epsilon = 1e-6);
        }
        for i in 0..prior_cov.nrows() {
            for j in 0..prior_cov.ncols() {
                assert_relative_eq!(post_cov[(i, j)], prior_cov[(i, j)], epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn test_conditioning_with_zero_noise_pins_the_point() {
        let mut model = fitted_model(CovarianceStructure::Independent);
        let target = 0.25;
        let vp = ViaPoint::new(
            30,
            DVector::from_element(1, target),
            DMatrix::zeros(1, 1),
        );
        model.condition_via_points(&[vp]).unwrap();

        let mean = model.generate_trajectory().unwrap();
        assert_relative_eq!(mean.matrix()[(30, 0)], target, epsilon = 1e-3);
    }

    #[test]
    fn test_joint_conditioning_pins_the_point() {
        let mut model = fitted_model(CovarianceStructure::Joint);
        let target = 0.4;
        let vp = ViaPoint::new(
            60,
            DVector::from_element(1, target),
            DMatrix::zeros(1, 1),
        );
        model.condition_via_points(&[vp]).unwrap();

        let mean = model.generate_trajectory().unwrap();
        assert_relative_eq!(mean.matrix()[(60, 0)], target, epsilon = 1e-3);
    }

    #[test]
    fn test_via_point_validation() {
        let mut model = fitted_model(CovarianceStructure::Independent);
        let out_of_range =
            ViaPoint::with_uniform_noise(100, DVector::from_element(1, 0.0), 1e-4);
        assert!(matches!(
            model.condition_via_points(&[out_of_range]),
            Err(PrompError::ViaPointOutOfRange { .. })
        ));

        let wrong_dof = ViaPoint::with_uniform_noise(10, DVector::from_element(2, 0.0), 1e-4);
        assert!(model.condition_via_points(&[wrong_dof]).is_err());
    }
}
