use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

/// Argument and shape errors shared by every crate in the workspace.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Non-finite {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Invalid {what}")]
    InvalidArg { what: &'static str },
}
