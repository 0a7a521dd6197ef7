//! Probabilistic Movement Primitives
//!
//! Learn a Gaussian model of a family of demonstrated motion trajectories,
//! then generate new trajectories from it, re-time them to match an
//! observed partial trajectory, and reshape them through via-points while
//! respecting the learned motion statistics.
//!
//! # Features
//!
//! - **Basis-function regression**: demonstrations are compressed to
//!   radial-basis weight vectors by ridge least squares
//! - **Uncertainty propagation**: the weight distribution yields mean
//!   trajectories, per-timestep deviation bands, and full trajectory
//!   covariances
//! - **Bayesian conditioning**: via-points reshape the model through
//!   Gaussian posterior updates
//! - **Time modulation**: phase-based evaluation decouples playback length
//!   from training length, with grid-search speed inference
//!
//! # Quick Start
//!
//! ```
//! use nalgebra::{DMatrix, DVector};
//! use promp::{ModelConfig, ProMP, Trajectory, TrajectoryGroup, ViaPoint};
//!
//! // three demonstrations of the same reaching motion
//! let mut group = TrajectoryGroup::new();
//! for (k, n) in [100usize, 120, 90].into_iter().enumerate() {
//!     let amplitude = 1.0 + 0.05 * k as f64;
//!     let data = DMatrix::from_fn(n, 1, |t, _| {
//!         amplitude * (std::f64::consts::PI * t as f64 / (n - 1) as f64).sin()
//!     });
//!     group.push(Trajectory::new(data, 1.0)?)?;
//! }
//! group.normalize_length()?;
//!
//! let config = ModelConfig::new().with_n_rbf(20);
//! let mut model = ProMP::new(&group, &config)?;
//!
//! let mean = model.generate_trajectory()?;
//! let band = model.std_dev()?;
//! assert_eq!(mean.timesteps(), band.nrows());
//!
//! // pass through 0.5 at timestep 30
//! let via = ViaPoint::with_uniform_noise(30, DVector::from_element(1, 0.5), 1e-6);
//! model.condition_via_points(&[via])?;
//! let reshaped = model.generate_trajectory()?;
//! assert!((reshaped.matrix()[(30, 0)] - 0.5).abs() < 0.05);
//! # Ok::<(), promp::PrompError>(())
//! ```
//!
//! # Pipeline
//!
//! | Stage | Module |
//! |-------|--------|
//! | Load demonstrations | [`io`], [`group`] |
//! | Normalize lengths | [`group`], [`trajectory`] |
//! | Fit basis weights | [`basis`], [`fitter`] |
//! | Aggregate + generate | [`model`] |
//! | Infer speed | [`speed`] |
//! | Condition on via-points | [`model`] |

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

pub mod basis;
pub mod config;
pub mod error;
pub mod fitter;
pub mod group;
pub mod io;
pub mod math;
pub mod model;
pub mod speed;
pub mod trajectory;

// Re-exports for convenient access
pub use basis::BasisExpansion;
pub use config::{CovarianceStructure, ModelConfig, SpeedSearch};
pub use error::{ErrorKind, PrompError, Result};
pub use fitter::fit_weights;
pub use group::TrajectoryGroup;
pub use io::{read_matrix, read_trajectory, write_matrix, write_trajectory};
pub use model::{ProMP, TrajectoryCovariance, ViaPoint};
pub use speed::infer_speed;
pub use trajectory::Trajectory;
