// lib/src/errors.rs

use thiserror::Error;
use uuid::Uuid;

use models::errors::ValidationError;

/// Failures while turning a prescription into a PDF.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("page {page} is outside 1..={total}")]
    PageOutOfRange { page: usize, total: usize },
    #[error("page {page} failed to render: {reason}")]
    Page { page: usize, reason: String },
    #[error("page {page} exceeded its {budget_ms} ms render budget")]
    Timeout { page: usize, budget_ms: u64 },
    #[error("failed to merge pages: {0}")]
    Merge(String),
}

#[derive(Debug, Error)]
pub enum PrescriptionError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Permission denied: {0}")]
    Permission(String),

    #[error("Editing is only allowed on the same day the version was created ({created_on})")]
    EditWindowExpired { created_on: chrono::NaiveDate },

    #[error("Version conflict: version {version} of lineage {lineage} is no longer the latest")]
    VersionConflict { lineage: Uuid, version: u32 },

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Artifact storage error: {0}")]
    Storage(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Already Exists: {0}")]
    AlreadyExists(String),

    #[error("Database operation failed: {0}")]
    Database(String),

    #[error("Serialization/Deserialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, PrescriptionError>;

impl From<sled::Error> for PrescriptionError {
    fn from(err: sled::Error) -> Self {
        PrescriptionError::Database(err.to_string())
    }
}

impl From<tokio::task::JoinError> for PrescriptionError {
    fn from(err: tokio::task::JoinError) -> Self {
        PrescriptionError::Internal(format!("Async task join error: {}", err))
    }
}

impl From<std::io::Error> for PrescriptionError {
    fn from(err: std::io::Error) -> Self {
        PrescriptionError::Storage(err.to_string())
    }
}

impl From<reqwest::Error> for PrescriptionError {
    fn from(err: reqwest::Error) -> Self {
        PrescriptionError::Storage(err.to_string())
    }
}

impl From<lopdf::Error> for RenderError {
    fn from(err: lopdf::Error) -> Self {
        RenderError::Merge(err.to_string())
    }
}
