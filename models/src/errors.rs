// models/src/errors.rs

pub use thiserror::Error;

/// A validation error raised before anything is written.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was absent or blank.
    #[error("required field {0} is missing")]
    MissingField(&'static str),
    /// A field was present but its value is unusable.
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
    /// Password hashing failed.
    #[error("password hashing failed: {0}")]
    PasswordHashingFailed(String),
}

/// A type alias for a `Result` that returns a `ValidationError` on failure.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Rejects `None`, empty and whitespace-only values.
pub fn require(field: &'static str, value: Option<&str>) -> ValidationResult<()> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(()),
        _ => Err(ValidationError::MissingField(field)),
    }
}
