//! Error types for the sales_forecast crate

use std::path::PathBuf;
use thiserror::Error;

/// Custom error types for the sales_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// The data store is unreachable or a query failed
    #[error("Data source error: {0}")]
    DataSource(String),

    /// Aggregation produced no daily demand records
    #[error("Empty dataset: no sales or order line items to train on")]
    EmptyDataset,

    /// No persisted model exists yet
    #[error("Model not found at {}: run the `train` command first", .0.display())]
    ModelNotFound(PathBuf),

    /// The target date could not be parsed
    #[error("Invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error related to input validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error from the regression core
    #[error("Model error: {0}")]
    Model(#[from] forest_math::ForestError),

    /// Model artifact could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration file or environment value is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

// Filesystem failures stay IO errors; anything else from csv is bad table data
impl From<csv::Error> for ForecastError {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() {
            match err.into_kind() {
                csv::ErrorKind::Io(io) => ForecastError::IoError(io),
                other => ForecastError::DataSource(format!("{:?}", other)),
            }
        } else {
            ForecastError::DataSource(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(err: serde_json::Error) -> Self {
        ForecastError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for ForecastError {
    fn from(err: toml::de::Error) -> Self {
        ForecastError::Config(err.to_string())
    }
}
