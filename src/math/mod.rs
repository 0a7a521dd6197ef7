//! Mathematical utilities shared by fitting and conditioning.
//!
//! - [`linalg`]: SPD solves and covariance maintenance

pub mod linalg;

pub use linalg::{enforce_psd, quadratic_form, solve_spd, symmetrize};
