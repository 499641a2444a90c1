//! Types for video jobs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::oneshot;

use super::error::VideoError;
use crate::engine::ProgressRecord;

/// Identifier of a screenshot or conversion job.
///
/// Allocated from a counter, never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job-{}", self.0)
    }
}

/// Kind of job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Screenshot,
    Conversion,
}

/// Transcode strategy chosen for a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Stream copy into the target container.
    Fast,
    /// Full re-encode.
    Slow,
}

/// Lifecycle state of an in-flight job.
///
/// Terminal states are never stored: a finished job leaves the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum JobState {
    Created,
    Probing,
    Running {
        #[serde(skip_serializing_if = "Option::is_none")]
        strategy: Option<Strategy>,
    },
}

/// Point-in-time view of an in-flight job.
#[derive(Debug, Clone, Serialize)]
pub struct JobSnapshot {
    pub id: JobId,
    pub kind: JobKind,
    pub source_url: String,
    pub state: JobState,
    pub progress: ProgressRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    pub started_at: DateTime<Utc>,
}

/// Final outcome of a conversion. Exactly one fires per job.
#[derive(Debug)]
pub enum ConversionEvent {
    /// Carries the `file://` URL of the converted file.
    Done(String),
    Error(VideoError),
}

impl ConversionEvent {
    pub const DONE: &'static str = "conversion.done";
    pub const ERROR: &'static str = "conversion.error";

    /// Event name as seen by listeners.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Done(_) => Self::DONE,
            Self::Error(_) => Self::ERROR,
        }
    }

    pub fn into_result(self) -> Result<String, VideoError> {
        match self {
            Self::Done(url) => Ok(url),
            Self::Error(err) => Err(err),
        }
    }
}

/// Completion channel returned by a conversion request.
#[derive(Debug)]
pub struct ConversionHandle {
    job_id: JobId,
    outcome: oneshot::Receiver<ConversionEvent>,
}

impl ConversionHandle {
    pub(crate) fn new(job_id: JobId, outcome: oneshot::Receiver<ConversionEvent>) -> Self {
        Self { job_id, outcome }
    }

    /// Id to query progress or cancel through the registry.
    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    /// Waits for the conversion outcome.
    pub async fn wait(self) -> ConversionEvent {
        self.outcome.await.unwrap_or_else(|_| {
            ConversionEvent::Error(VideoError::EngineFailure {
                message: "conversion task ended without a result".to_string(),
            })
        })
    }

    /// Waits for the outcome as a `Result`.
    pub async fn done(self) -> Result<String, VideoError> {
        self.wait().await.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(
            ConversionEvent::Done("file:///tmp/a.mp4".to_string()).name(),
            "conversion.done"
        );
        assert_eq!(
            ConversionEvent::Error(VideoError::Cancelled).name(),
            "conversion.error"
        );
    }

    #[test]
    fn test_job_state_serialization() {
        let json = serde_json::to_string(&JobState::Running {
            strategy: Some(Strategy::Fast),
        })
        .unwrap();
        assert_eq!(json, r#"{"state":"running","strategy":"fast"}"#);

        let json = serde_json::to_string(&JobState::Probing).unwrap();
        assert_eq!(json, r#"{"state":"probing"}"#);
    }

    #[tokio::test]
    async fn test_dropped_sender_reports_error() {
        let (tx, rx) = oneshot::channel();
        let handle = ConversionHandle::new(JobId(7), rx);
        drop(tx);
        let event = handle.wait().await;
        assert_eq!(event.name(), ConversionEvent::ERROR);
    }

    #[test]
    fn test_handle_yields_sent_outcome() {
        let (tx, rx) = oneshot::channel();
        let handle = ConversionHandle::new(JobId(3), rx);
        assert_eq!(handle.job_id().to_string(), "job-3");

        tx.send(ConversionEvent::Done("file:///tmp/a.mp4".to_string()))
            .unwrap();
        let url = tokio_test::block_on(handle.done()).unwrap();
        assert_eq!(url, "file:///tmp/a.mp4");
    }
}
