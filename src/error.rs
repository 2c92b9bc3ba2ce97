//! Error types shared by the loader, the solvers and the reporting layer.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SolverError>;

#[derive(Debug, Error)]
pub enum SolverError {
    /// The instance text or matrix does not describe a valid `n×n` problem.
    #[error("malformed instance: {0}")]
    MalformedInstance(String),

    /// A city index outside `[0, n)`.
    #[error("city index {index} out of range for instance of size {size}")]
    IndexOutOfRange { index: usize, size: usize },

    /// A tour that is not a permutation of the instance cities.
    #[error("invalid tour: {0}")]
    InvalidTour(String),

    /// A solver was configured in a way that cannot produce a tour.
    #[error("empty result: {0}")]
    EmptyResult(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl SolverError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedInstance(message.into())
    }

    pub fn invalid_tour(message: impl Into<String>) -> Self {
        Self::InvalidTour(message.into())
    }

    pub fn empty_result(message: impl Into<String>) -> Self {
        Self::EmptyResult(message.into())
    }
}
