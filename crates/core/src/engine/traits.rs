//! Trait definitions for the engine module.

use async_trait::async_trait;

use super::error::EngineError;
use super::types::{EngineCommand, EngineProcess};

/// Starts engine processes.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Returns the name of this engine implementation.
    fn name(&self) -> &str;

    /// Starts the command and returns immediately.
    ///
    /// Progress and the final outcome arrive on the returned process's event
    /// stream.
    async fn start(&self, command: EngineCommand) -> Result<EngineProcess, EngineError>;
}

/// Readiness gate in front of every engine invocation.
#[async_trait]
pub trait EngineSupport: Send + Sync {
    /// Prepares the engine. Safe to call more than once.
    fn init(&self);

    /// Resolves once the engine can be started.
    async fn ready(&self) -> Result<(), EngineError>;
}
