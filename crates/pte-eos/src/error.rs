//! EOS construction and evaluation errors.

use thiserror::Error;

/// Result type for EOS operations.
pub type EosResult<T> = Result<T, EosError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EosError {
    /// A model or modifier parameter is unusable (zero scale, negative cv, ...).
    #[error("Invalid parameter for {model}: {what}")]
    InvalidParameter {
        model: &'static str,
        what: &'static str,
    },

    /// Requested wrapping is outside the closed variant set.
    #[error("Illegal composition: {modifier} cannot wrap {inner}")]
    IllegalComposition {
        inner: &'static str,
        modifier: &'static str,
    },

    /// State outside the model's valid domain.
    #[error("Out of domain for {model}: {what} (rho={rho}, x={x})")]
    OutOfDomain {
        model: &'static str,
        what: &'static str,
        rho: f64,
        x: f64,
    },

    #[error("Length mismatch for {what}: expected {expected}, got {got}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },
}

impl EosError {
    pub(crate) fn param(model: &'static str, what: &'static str) -> Self {
        EosError::InvalidParameter { model, what }
    }
}
