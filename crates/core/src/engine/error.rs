//! Error types for the engine module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while locating or starting the engine process.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Engine binary not found.
    #[error("Engine binary not found at path: {path}")]
    BinaryNotFound { path: PathBuf },

    /// The binary exists but did not pass the readiness check.
    #[error("Engine not ready: {reason}")]
    NotReady { reason: String },

    /// The process could not be spawned.
    #[error("Failed to start engine: {0}")]
    Spawn(#[from] std::io::Error),
}

impl EngineError {
    /// Creates a new not-ready error.
    pub fn not_ready(reason: impl Into<String>) -> Self {
        Self::NotReady {
            reason: reason.into(),
        }
    }

    /// Maps a spawn failure, distinguishing a missing binary.
    pub fn from_spawn(err: std::io::Error, path: &std::path::Path) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::BinaryNotFound {
                path: path.to_path_buf(),
            }
        } else {
            Self::Spawn(err)
        }
    }
}
