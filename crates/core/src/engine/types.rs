//! Types for the engine module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::{mpsc, oneshot};

/// What an engine invocation is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    /// Bounded, no-output run that only reports input metadata.
    Probe,
    /// Single frame extraction.
    Screenshot,
    /// Stream copy into the target container.
    ConvertFast,
    /// Full re-encode.
    ConvertSlow,
}

/// A fully built engine invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineCommand {
    pub kind: CommandKind,
    /// Local path or remote URL handed to the engine as its input.
    pub input: String,
    /// Output file, `None` for the probe.
    pub output: Option<PathBuf>,
    /// Engine arguments, including input and output.
    pub args: Vec<String>,
    /// OS niceness to apply once the process is running.
    pub niceness: Option<i32>,
}

/// Input description reported by the engine before processing starts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodecData {
    /// Container format (first name ffmpeg reports).
    pub format: Option<String>,
    pub duration_secs: Option<f64>,
    /// Description of the first video stream, e.g. `h264 (High)`.
    pub video: Option<String>,
    /// Description of the first audio stream, e.g. `aac (LC)`.
    pub audio: Option<String>,
}

/// Last known progress of a running engine process.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    /// Progress percentage (0-100), 0 while the input duration is unknown.
    pub percent: f32,
    /// Output timestamp reached, in seconds.
    pub time_secs: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame: Option<u64>,
    /// Processing speed (e.g., "2.5x").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<String>,
}

/// Events emitted by a running engine process.
///
/// Every process ends with exactly one of `End`, `Error` or `Killed`.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    CodecData(CodecData),
    Progress(ProgressRecord),
    /// The process exited successfully.
    End,
    /// The process failed; carries the raw diagnostic text.
    Error(String),
    /// The process was stopped through its handle.
    Killed,
}

/// A started engine process: its event stream plus the means to stop it.
#[derive(Debug)]
pub struct EngineProcess {
    pid: Option<u32>,
    events: mpsc::Receiver<EngineEvent>,
    kill: oneshot::Sender<()>,
}

impl EngineProcess {
    pub fn new(
        pid: Option<u32>,
        events: mpsc::Receiver<EngineEvent>,
        kill: oneshot::Sender<()>,
    ) -> Self {
        Self { pid, events, kill }
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Splits the process into its ownership handle and its event stream.
    pub fn into_parts(self) -> (ProcessHandle, mpsc::Receiver<EngineEvent>) {
        (
            ProcessHandle {
                pid: self.pid,
                kill: Some(self.kill),
            },
            self.events,
        )
    }
}

/// Ownership token for a live engine process.
///
/// Dropping the handle stops the process.
#[derive(Debug)]
pub struct ProcessHandle {
    pid: Option<u32>,
    kill: Option<oneshot::Sender<()>>,
}

impl ProcessHandle {
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Asks the process to stop. Returns false if it already stopped or was
    /// asked before.
    pub fn kill(&mut self) -> bool {
        self.kill
            .take()
            .map(|tx| tx.send(()).is_ok())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_kill_signals_once() {
        let (_events_tx, events_rx) = mpsc::channel(1);
        let (kill_tx, mut kill_rx) = oneshot::channel();
        let process = EngineProcess::new(Some(42), events_rx, kill_tx);
        assert_eq!(process.pid(), Some(42));

        let (mut handle, _events) = process.into_parts();
        assert!(handle.kill());
        assert!(!handle.kill());
        assert!(kill_rx.try_recv().is_ok());
    }

    #[test]
    fn test_dropping_handle_closes_kill_channel() {
        let (_events_tx, events_rx) = mpsc::channel(1);
        let (kill_tx, mut kill_rx) = oneshot::channel::<()>();
        let (handle, _events) = EngineProcess::new(None, events_rx, kill_tx).into_parts();
        drop(handle);
        assert!(matches!(
            kill_rx.try_recv(),
            Err(oneshot::error::TryRecvError::Closed)
        ));
    }

    #[test]
    fn test_progress_record_serialization_skips_unknowns() {
        let record = ProgressRecord {
            percent: 12.5,
            time_secs: 3.0,
            frame: None,
            speed: None,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"percent":12.5,"time_secs":3.0}"#);
    }
}
