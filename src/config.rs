//! Configuration for movement-primitive learning and playback.
//!
//! This module provides the [`ModelConfig`] struct which centralizes the
//! tunable parameters of the weight model, and [`SpeedSearch`] which bounds
//! the time-scale inference grid.
//!
//! # Example
//!
//! ```
//! use promp::ModelConfig;
//!
//! // Default configuration: 20 bases, independent per-DOF covariance
//! let config = ModelConfig::default();
//!
//! // Tighter basis overlap, joint cross-DOF covariance
//! use promp::CovarianceStructure;
//! let config = ModelConfig::new()
//!     .with_n_rbf(30)
//!     .with_covariance(CovarianceStructure::Joint);
//! ```

use crate::error::{PrompError, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How the weight covariance is structured across DOFs.
///
/// The driving use case supplies via-point noise as block-diagonal across
/// DOFs, so `Independent` is the default; `Joint` keeps the full stacked
/// covariance and lets via-points couple DOFs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CovarianceStructure {
    /// One `n_rbf x n_rbf` covariance block per DOF; DOFs never interact.
    #[default]
    Independent,
    /// A single `(n_rbf * dof) x (n_rbf * dof)` covariance capturing
    /// cross-DOF correlation between demonstrations.
    Joint,
}

/// Configuration for learning a movement primitive.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ModelConfig {
    /// Number of radial basis functions spanning the phase axis.
    /// 10-20 suits smooth reaching motions; more bases track sharper
    /// features at the cost of a wider weight covariance.
    pub n_rbf: usize,

    /// Ridge regularization added to the normal equations of the weight
    /// fit. Keeps the solve well-posed when `n_rbf` approaches the number
    /// of timesteps.
    pub ridge: f64,

    /// Basis width as a multiple of the center spacing. 1.0 gives each
    /// Gaussian a standard deviation equal to the gap between neighboring
    /// centers, enough overlap for a smooth partition of unity.
    pub width_scale: f64,

    /// Covariance layout across DOFs.
    pub covariance: CovarianceStructure,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            n_rbf: 20,
            ridge: 1e-9,
            width_scale: 1.0,
            covariance: CovarianceStructure::Independent,
        }
    }
}

impl ModelConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter is out of valid range.
    pub fn validate(&self) -> Result<()> {
        if self.n_rbf < 2 {
            return Err(PrompError::invalid_config("n_rbf must be at least 2"));
        }
        if self.ridge <= 0.0 {
            return Err(PrompError::invalid_config("ridge must be positive"));
        }
        if self.width_scale <= 0.0 {
            return Err(PrompError::invalid_config("width_scale must be positive"));
        }
        Ok(())
    }

    /// Set the number of basis functions.
    #[must_use]
    pub const fn with_n_rbf(mut self, n_rbf: usize) -> Self {
        self.n_rbf = n_rbf;
        self
    }

    /// Set the ridge regularization constant.
    #[must_use]
    pub const fn with_ridge(mut self, ridge: f64) -> Self {
        self.ridge = ridge;
        self
    }

    /// Set the basis width scale.
    #[must_use]
    pub const fn with_width_scale(mut self, width_scale: f64) -> Self {
        self.width_scale = width_scale;
        self
    }

    /// Set the covariance structure.
    #[must_use]
    pub const fn with_covariance(mut self, covariance: CovarianceStructure) -> Self {
        self.covariance = covariance;
        self
    }
}

/// Bounds and resolution of the time-scale inference grid.
///
/// Defaults match the reference playback pipeline: factors between 0.75 and
/// 1.25 sampled at 2000 candidates.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpeedSearch {
    /// Smallest candidate time-scale factor.
    pub alpha_min: f64,

    /// Largest candidate time-scale factor.
    pub alpha_max: f64,

    /// Number of evenly spaced candidates evaluated between the bounds.
    pub candidates: usize,
}

impl Default for SpeedSearch {
    fn default() -> Self {
        Self {
            alpha_min: 0.75,
            alpha_max: 1.25,
            candidates: 2000,
        }
    }
}

impl SpeedSearch {
    /// Create a search over `[alpha_min, alpha_max]` with `candidates` steps.
    #[must_use]
    pub const fn new(alpha_min: f64, alpha_max: f64, candidates: usize) -> Self {
        Self {
            alpha_min,
            alpha_max,
            candidates,
        }
    }

    /// Validate the search bounds.
    ///
    /// # Errors
    ///
    /// Returns an error if the bounds are not ordered positive values or the
    /// grid has fewer than two candidates.
    pub fn validate(&self) -> Result<()> {
        if self.alpha_min <= 0.0 {
            return Err(PrompError::invalid_config("alpha_min must be positive"));
        }
        if self.alpha_max <= self.alpha_min {
            return Err(PrompError::invalid_config(
                "alpha_max must be greater than alpha_min",
            ));
        }
        if self.candidates < 2 {
            return Err(PrompError::invalid_config(
                "speed search needs at least 2 candidates",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ModelConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.n_rbf, 20);
        assert_eq!(config.covariance, CovarianceStructure::Independent);
    }

    #[test]
    fn test_validation() {
        let mut config = ModelConfig::default();

        config.n_rbf = 1;
        assert!(config.validate().is_err());

        config.n_rbf = 20;
        config.ridge = 0.0;
        assert!(config.validate().is_err());

        config.ridge = 1e-9;
        config.width_scale = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_builder_pattern() {
        let config = ModelConfig::new()
            .with_n_rbf(30)
            .with_ridge(1e-6)
            .with_covariance(CovarianceStructure::Joint);
        assert_eq!(config.n_rbf, 30);
        assert_eq!(config.ridge, 1e-6);
        assert_eq!(config.covariance, CovarianceStructure::Joint);
    }

    #[test]
    fn test_speed_search_validation() {
        assert!(SpeedSearch::default().validate().is_ok());
        assert!(SpeedSearch::new(0.0, 1.25, 100).validate().is_err());
        assert!(SpeedSearch::new(1.25, 0.75, 100).validate().is_err());
        assert!(SpeedSearch::new(0.75, 1.25, 1).validate().is_err());
    }
}
