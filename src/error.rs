//! Error types for movement-primitive operations.
//!
//! Input and configuration problems are detected at construction time and
//! reported as recoverable errors; numerical failures name the operation and
//! the offending dimensions instead of silently defaulting.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for movement-primitive operations.
#[derive(Error, Debug)]
pub enum PrompError {
    /// Reading or creating a file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The CSV layer rejected the file (ragged rows included).
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A CSV field did not parse as a number.
    #[error("{path:?}: row {row}, column {col} is not a number")]
    Parse { path: PathBuf, row: usize, col: usize },

    /// A DOF index points outside the trajectory.
    #[error("DOF index {index} out of range for {dof_count} DOFs")]
    DofOutOfRange { index: usize, dof_count: usize },

    /// Trajectories in a group disagree on DOF count.
    #[error("DOF count mismatch: expected {expected}, got {actual}")]
    DofMismatch { expected: usize, actual: usize },

    /// Trajectory has too few timesteps for the requested operation.
    #[error("Trajectory too short: need at least {min} timesteps, got {actual}")]
    TrajectoryTooShort { min: usize, actual: usize },

    /// A group operation needs at least one demonstration.
    #[error("Trajectory group is empty")]
    EmptyGroup,

    /// A DOF sub-selection selected no columns.
    #[error("DOF selection is empty")]
    EmptySelection,

    /// Configuration validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A via-point targets a timestep outside the model's range.
    #[error("Via-point timestep {timestep} outside model range of {timesteps} timesteps")]
    ViaPointOutOfRange { timestep: usize, timesteps: usize },

    /// Operand shapes disagree.
    #[error("Dimension mismatch in {context}: expected {expected}, got {actual}")]
    DimensionMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },

    /// A regression system could not be factorized even after ridge
    /// regularization.
    #[error("Rank-deficient system in {context} ({rows}x{cols})")]
    RankDeficient {
        context: String,
        rows: usize,
        cols: usize,
    },

    /// The innovation covariance stayed singular beyond the numerical floor.
    #[error("Singular innovation covariance at timestep {timestep} (dim {dim})")]
    SingularInnovation { timestep: usize, dim: usize },

    /// A weight covariance lost positive semi-definiteness. Internal
    /// invariant violation; the affected computation is halted.
    #[error("Covariance lost positive semi-definiteness in {context}")]
    CovarianceNotPsd { context: String },
}

/// Coarse error category, used by callers that map failures to exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or inconsistent input data.
    Input,
    /// Invalid configuration or via-point placement.
    Config,
    /// A numerical solve or invariant failed.
    Numerical,
}

/// Result type alias for movement-primitive operations.
pub type Result<T> = std::result::Result<T, PrompError>;

impl PrompError {
    /// Category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_)
            | Self::Csv(_)
            | Self::Parse { .. }
            | Self::DofOutOfRange { .. }
            | Self::DofMismatch { .. }
            | Self::TrajectoryTooShort { .. }
            | Self::EmptyGroup
            | Self::EmptySelection => ErrorKind::Input,
            Self::InvalidConfig(_)
            | Self::ViaPointOutOfRange { .. }
            | Self::DimensionMismatch { .. } => ErrorKind::Config,
            Self::RankDeficient { .. }
            | Self::SingularInnovation { .. }
            | Self::CovarianceNotPsd { .. } => ErrorKind::Numerical,
        }
    }

    /// Create a trajectory too short error.
    #[must_use]
    pub const fn trajectory_too_short(min: usize, actual: usize) -> Self {
        Self::TrajectoryTooShort { min, actual }
    }

    /// Create a DOF out of range error.
    #[must_use]
    pub const fn dof_out_of_range(index: usize, dof_count: usize) -> Self {
        Self::DofOutOfRange { index, dof_count }
    }

    /// Create a DOF mismatch error.
    #[must_use]
    pub const fn dof_mismatch(expected: usize, actual: usize) -> Self {
        Self::DofMismatch { expected, actual }
    }

    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a dimension mismatch error.
    #[must_use]
    pub fn dimension_mismatch(context: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            context: context.into(),
            expected,
            actual,
        }
    }

    /// Create a rank-deficient system error.
    #[must_use]
    pub fn rank_deficient(context: impl Into<String>, rows: usize, cols: usize) -> Self {
        Self::RankDeficient {
            context: context.into(),
            rows,
            cols,
        }
    }

    /// Create a covariance invariant violation error.
    #[must_use]
    pub fn covariance_not_psd(context: impl Into<String>) -> Self {
        Self::CovarianceNotPsd {
            context: context.into(),
        }
    }
}
