//! Error types for the shortfall pipeline and service.
//!
//! - [`PipelineError`] - Spreadsheet pipeline failures (load, sheet lookup, write)
//! - [`StoreError`] - Job store failures
//! - [`ConfigError`] - Invalid environment configuration
//! - [`ServerError`] - HTTP layer errors, rendered as JSON responses
//!
//! Malformed cell content is never an error: it degrades to empty/null
//! values inside the transforms.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use std::path::PathBuf;
use thiserror::Error;

// =============================================================================
// Pipeline Errors
// =============================================================================

/// Fatal failures of a single pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Unrecognized extension, or a container that cannot be parsed.
    #[error("Unsupported or unreadable spreadsheet '{}': {details}", .path.display())]
    FileFormat { path: PathBuf, details: String },

    /// The requested sheet does not exist in the workbook.
    #[error("Sheet {sheet} not found (available: {available})")]
    SheetNotFound { sheet: String, available: String },

    /// The output workbook could not be persisted.
    #[error("Failed to write '{}': {details}", .path.display())]
    Write { path: PathBuf, details: String },
}

impl PipelineError {
    pub(crate) fn file_format(path: impl Into<PathBuf>, details: impl ToString) -> Self {
        PipelineError::FileFormat {
            path: path.into(),
            details: details.to_string(),
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, details: impl ToString) -> Self {
        PipelineError::Write {
            path: path.into(),
            details: details.to_string(),
        }
    }
}

// =============================================================================
// Job Store Errors
// =============================================================================

/// Errors from a [`crate::jobs::JobStore`] backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the status file failed.
    #[error("Job store IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The status file holds invalid JSON.
    #[error("Job store JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while reading configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Job store error.
    #[error("Job store error: {0}")]
    Store(#[from] StoreError),

    /// Invalid request.
    #[error("{0}")]
    BadRequest(String),

    /// Unknown task or missing result.
    #[error("{0}")]
    NotFound(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Store(_) | ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for job store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
