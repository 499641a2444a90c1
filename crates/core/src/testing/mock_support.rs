//! Mock engine support for testing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::engine::{EngineError, EngineSupport};

/// Mock implementation of the EngineSupport trait.
///
/// Ready by default. Counts `init` and `ready` calls so tests can assert
/// that every job passed the readiness gate.
#[derive(Debug, Clone, Default)]
pub struct MockEngineSupport {
    init_calls: Arc<AtomicUsize>,
    ready_calls: Arc<AtomicUsize>,
    /// If set, every readiness check fails with this reason.
    failure: Arc<RwLock<Option<String>>>,
}

impl MockEngineSupport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Support whose readiness check always fails.
    pub fn failing(reason: &str) -> Self {
        Self {
            failure: Arc::new(RwLock::new(Some(reason.to_string()))),
            ..Self::default()
        }
    }

    pub async fn set_failure(&self, reason: Option<&str>) {
        *self.failure.write().await = reason.map(str::to_string);
    }

    pub fn init_calls(&self) -> usize {
        self.init_calls.load(Ordering::SeqCst)
    }

    pub fn ready_calls(&self) -> usize {
        self.ready_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EngineSupport for MockEngineSupport {
    fn init(&self) {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
    }

    async fn ready(&self) -> Result<(), EngineError> {
        self.ready_calls.fetch_add(1, Ordering::SeqCst);
        match self.failure.read().await.as_ref() {
            Some(reason) => Err(EngineError::not_ready(reason.clone())),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ready_by_default() {
        let support = MockEngineSupport::new();
        support.init();
        assert!(support.ready().await.is_ok());
        assert_eq!(support.init_calls(), 1);
        assert_eq!(support.ready_calls(), 1);
    }

    #[tokio::test]
    async fn test_failure_can_be_cleared() {
        let support = MockEngineSupport::failing("ffmpeg missing");
        let err = support.ready().await.unwrap_err();
        assert!(err.to_string().contains("ffmpeg missing"));

        support.set_failure(None).await;
        assert!(support.ready().await.is_ok());
    }
}
