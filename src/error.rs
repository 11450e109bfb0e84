//! Error taxonomy for the prism and survey layers.
//!
//! The current-source kernels in [`crate::physics`] and the mesh keep the
//! plain `&'static str` errors of the slice-kernel convention.

/// Error in configuring or evaluating a forward model.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum MagError {
    /// Magnetization mode string was not one of `induced`, `remanent`, `total`.
    #[error("Unknown magnetization mode `{0}`; expected `induced`, `remanent` or `total`")]
    UnknownMode(String),
    /// Output component string was not one of `bx`, `by`, `bz`, `tf`.
    #[error("Unknown field component `{0}`; expected `bx`, `by`, `bz` or `tf`")]
    UnknownComponent(String),
    /// A physical parameter was outside its allowed range.
    #[error("Invalid value {value} for parameter `{name}`")]
    InvalidParameter { name: &'static str, value: f64 },
    /// The forward operator produced a NaN or infinite coefficient.
    #[error("Non-finite forward operator coefficient at receiver {receiver}")]
    NonFinite { receiver: usize },
    /// Model configuration could not be parsed.
    ///
    /// (The parser error is kept as a string so that this type stays `Clone`)
    #[error("Invalid model configuration: {0}")]
    Config(String),
    /// Internal inconsistency in an evaluated result.
    #[error("{0}")]
    Numeric(&'static str),
}

impl From<serde_json::Error> for MagError {
    fn from(err: serde_json::Error) -> Self {
        MagError::Config(err.to_string())
    }
}

/// Check that a parameter is strictly positive (and not NaN).
pub(crate) fn require_positive(name: &'static str, value: f64) -> Result<f64, MagError> {
    if value > 0.0 {
        Ok(value)
    } else {
        Err(MagError::InvalidParameter { name, value })
    }
}

/// Check that a parameter is non-negative (and not NaN).
pub(crate) fn require_nonnegative(name: &'static str, value: f64) -> Result<f64, MagError> {
    if value >= 0.0 {
        Ok(value)
    } else {
        Err(MagError::InvalidParameter { name, value })
    }
}
