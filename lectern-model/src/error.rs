use thiserror::Error;

/// Errors produced by model constructors and wire-shape conversions.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown content block type: {0}")]
    UnknownBlockKind(String),

    #[error("content block of type {kind} is missing field {field}")]
    MissingField { kind: &'static str, field: &'static str },

    #[error("invalid model data: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
