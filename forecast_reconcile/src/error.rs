//! Error types for the forecast_reconcile crate

use thiserror::Error;

/// Custom error types for the forecast_reconcile crate
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Error related to parameter validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Neither model produced a usable forecast
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// A forecasting model failed to produce output
    #[error("Model '{model}' failed: {message}")]
    ExternalModelFailure { model: String, message: String },

    /// Error from the worker pool
    #[error("Worker pool error: {0}")]
    WorkerPool(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from CSV parsing
    #[error("CSV error: {0}")]
    CsvError(String),

    /// Error from JSON (de)serialization
    #[error("JSON error: {0}")]
    JsonError(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ReconcileError>;

impl ReconcileError {
    /// Build an `ExternalModelFailure` for the named model
    pub fn model_failure(model: impl Into<String>, message: impl Into<String>) -> Self {
        ReconcileError::ExternalModelFailure {
            model: model.into(),
            message: message.into(),
        }
    }
}

impl From<csv::Error> for ReconcileError {
    fn from(err: csv::Error) -> Self {
        ReconcileError::CsvError(err.to_string())
    }
}

impl From<serde_json::Error> for ReconcileError {
    fn from(err: serde_json::Error) -> Self {
        ReconcileError::JsonError(err.to_string())
    }
}

impl From<rayon::ThreadPoolBuildError> for ReconcileError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        ReconcileError::WorkerPool(err.to_string())
    }
}
