//! Error types shared by every part of the shielding calculation.
//!
//! Every fallible operation in the library returns [`Result`]. Errors are raised
//! where they are detected and propagate unchanged to the caller of
//! [`Model::calculate_exposure`](crate::model::Model::calculate_exposure); a
//! failure anywhere aborts the whole calculation.

use thiserror::Error;

/// Errors produced by the shielding library.
#[derive(Error, Debug)]
pub enum ShieldingError {
    /// A scalar argument is non-finite or outside its domain.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A photon energy lies outside a tabulated grid.
    #[error("{quantity} {value} is outside the tabulated range [{min}, {max}]")]
    OutOfRange {
        quantity: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("unsupported buildup factor formula: {0}")]
    UnsupportedFormula(String),

    /// The material has no table for the requested quantity.
    #[error("material '{material}' has no {table} data")]
    NoData { material: String, table: &'static str },

    /// A shape produced an intersection count that a well-formed body cannot.
    #[error("inconsistent geometry in {shape}: resolved {points} crossing points")]
    InconsistentGeometry { shape: &'static str, points: usize },

    #[error("unknown {kind} '{name}'")]
    UnknownName { kind: &'static str, name: String },

    /// Wraps an error raised while evaluating one shield of a model.
    #[error("shield {index} ({label}): {source}")]
    ShieldFailure {
        index: usize,
        label: String,
        #[source]
        source: Box<ShieldingError>,
    },

    /// The library file is malformed.
    #[error("library error: {0}")]
    Library(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for ShieldingError {
    fn from(err: toml::de::Error) -> Self {
        ShieldingError::Library(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ShieldingError>;

/// Fails with [`ShieldingError::InvalidArgument`] unless `value` is finite.
pub(crate) fn ensure_finite(value: f64, what: &str) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ShieldingError::InvalidArgument(format!(
            "{what} must be a finite number, got {value}"
        )))
    }
}
