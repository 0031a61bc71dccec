//! Setpoint optimization against a surrogate kiln model.

pub mod model;
pub mod search;

use thiserror::Error;

pub use model::{predict, Bounds, Range, Setpoints};
pub use search::{
    optimize, Evaluation, OptimizationResult, SearchOptions, DEFAULT_MAX_ITERATIONS,
    DEFAULT_MIN_CLINKER_QUALITY,
};

/// Optimizer input errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OptimizerError {
    /// A setpoint is NaN or infinite.
    #[error("setpoint {0} must be a finite number")]
    NonFinite(&'static str),

    /// A setpoint lies outside its operating range.
    #[error("setpoint {name}={value} outside [{min}, {max}]")]
    OutOfBounds {
        /// Setpoint name.
        name: &'static str,
        /// Offending value.
        value: f64,
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },

    /// A search option is invalid.
    #[error("invalid option: {0}")]
    InvalidOption(String),
}
