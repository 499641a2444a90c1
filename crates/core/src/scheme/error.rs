//! Error types for video jobs.

use thiserror::Error;

use super::classify::classify_error;
use super::types::JobId;

/// Errors surfaced by screenshot and conversion jobs.
#[derive(Debug, Error)]
pub enum VideoError {
    /// The engine never became available.
    #[error("Engine is not available: {reason}")]
    ReadinessFailure { reason: String },

    /// Unsupported URL scheme or otherwise unusable job input.
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    /// The codec probe did not complete.
    #[error("Codec probe failed: {reason}")]
    ProbeFailed { reason: String },

    /// The engine process failed. The message is already classified.
    #[error("{message}")]
    EngineFailure { message: String },

    /// No in-flight job has this id.
    #[error("Job not found: {0}")]
    NotFound(JobId),

    /// The job exceeded its time budget and was stopped.
    #[error("Job timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// The job was cancelled through the registry.
    #[error("Job cancelled")]
    Cancelled,
}

impl VideoError {
    /// Creates a readiness failure.
    pub fn readiness(reason: impl Into<String>) -> Self {
        Self::ReadinessFailure {
            reason: reason.into(),
        }
    }

    /// Creates an invalid input error.
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Creates a probe failure.
    pub fn probe_failed(reason: impl Into<String>) -> Self {
        Self::ProbeFailed {
            reason: reason.into(),
        }
    }

    /// Creates an engine failure from raw engine text.
    pub fn engine_failure(raw: &str) -> Self {
        Self::EngineFailure {
            message: classify_error(raw),
        }
    }

    /// Whether starting a new job for the same input could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::ReadinessFailure { .. })
    }
}
