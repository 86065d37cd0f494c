//! # Forest Math
//!
//! Numeric core for demand forecasting.
//! This crate provides a CART regression tree and a bootstrap-aggregated
//! random forest built from those trees. Both operate on dense `f64`
//! feature rows and are serializable so fitted models can be persisted.

use thiserror::Error;

pub mod forest;
pub mod tree;

pub use forest::{FittedForest, RandomForestRegressor};
pub use tree::{Node, RegressionTree, TreeParams};

/// Errors that can occur while fitting or evaluating tree models
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForestError {
    #[error("Insufficient data for fitting: {0}")]
    InsufficientData(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Dimension mismatch: expected {expected} features, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Corrupt model: {0}")]
    CorruptModel(String),
}

/// Result type for forest operations
pub type Result<T> = std::result::Result<T, ForestError>;

/// Check that a feature matrix is rectangular and matches the targets.
///
/// Returns the number of features per row.
pub(crate) fn validate_matrix(x: &[Vec<f64>], y: &[f64]) -> Result<usize> {
    if x.is_empty() {
        return Err(ForestError::InsufficientData(
            "Feature matrix has no rows".to_string(),
        ));
    }
    if x.len() != y.len() {
        return Err(ForestError::InvalidParameter(format!(
            "Feature rows ({}) don't match targets ({})",
            x.len(),
            y.len()
        )));
    }

    let width = x[0].len();
    if width == 0 {
        return Err(ForestError::InsufficientData(
            "Feature rows have no columns".to_string(),
        ));
    }
    if let Some(row) = x.iter().find(|row| row.len() != width) {
        return Err(ForestError::DimensionMismatch {
            expected: width,
            actual: row.len(),
        });
    }
    if x.iter().flatten().chain(y.iter()).any(|v| !v.is_finite()) {
        return Err(ForestError::InvalidParameter(
            "Features and targets must be finite".to_string(),
        ));
    }

    Ok(width)
}
