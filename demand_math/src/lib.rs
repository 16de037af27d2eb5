//! # Demand Math
//!
//! Numeric primitives shared by the demand forecast reconciliation crates.
//! This crate provides summary statistics over quantity series, proportional
//! clamping helpers and backtest accuracy scoring (MAPE/MAE).

use thiserror::Error;

pub mod accuracy;
pub mod stats;

pub use accuracy::{score_backtest, AccuracyLevel, AccuracyReport};

/// Errors that can occur in demand calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for demand math operations
pub type Result<T> = std::result::Result<T, MathError>;
