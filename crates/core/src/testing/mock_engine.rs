//! Mock engine for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, RwLock};

use crate::engine::{
    CodecData, CommandKind, Engine, EngineCommand, EngineError, EngineEvent, EngineProcess,
    ProgressRecord,
};

/// Mock implementation of the Engine trait.
///
/// Every started command is recorded and plays back the events scripted for
/// its kind. A script that does not end in `End`, `Error` or `Killed` leaves
/// the process running until it is killed (or its handle dropped), after
/// which it reports `Killed`.
///
/// Defaults:
/// - probe: codec data with an `h264 (High)` video stream, then `End`
/// - screenshot: full progress, then `End`
/// - conversions: half then full progress, then `End`
///
/// # Example
///
/// ```rust,ignore
/// use videoscheme_core::testing::MockEngine;
///
/// let engine = MockEngine::new();
/// engine.set_video_codec("mpeg4 (Simple Profile)").await;
/// engine.set_hang(CommandKind::ConvertSlow).await;
///
/// let scheme = VideoScheme::new(config, Arc::new(support), Arc::new(engine.clone()));
/// // ...
/// assert!(engine.started(CommandKind::Probe).await);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockEngine {
    commands: Arc<RwLock<Vec<EngineCommand>>>,
    scripts: Arc<RwLock<HashMap<CommandKind, Vec<EngineEvent>>>>,
    /// If set, the next start fails with this error.
    next_error: Arc<RwLock<Option<EngineError>>>,
    next_pid: Arc<AtomicU32>,
    /// Processes stopped through a kill request or a dropped handle.
    stopped: Arc<AtomicUsize>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the events played for `kind`.
    pub async fn set_script(&self, kind: CommandKind, events: Vec<EngineEvent>) {
        self.scripts.write().await.insert(kind, events);
    }

    /// Processes of `kind` run until killed.
    pub async fn set_hang(&self, kind: CommandKind) {
        self.set_script(kind, Vec::new()).await;
    }

    /// Probe reports a video stream described as `description`.
    pub async fn set_video_codec(&self, description: &str) {
        self.set_script(
            CommandKind::Probe,
            vec![
                EngineEvent::CodecData(codec_data(Some(description))),
                EngineEvent::End,
            ],
        )
        .await;
    }

    /// Processes of `kind` fail with the raw diagnostic `raw`.
    pub async fn set_failure(&self, kind: CommandKind, raw: &str) {
        self.set_script(kind, vec![EngineEvent::Error(raw.to_string())])
            .await;
    }

    pub async fn set_next_error(&self, error: EngineError) {
        *self.next_error.write().await = Some(error);
    }

    /// Every command started so far, oldest first.
    pub async fn recorded_commands(&self) -> Vec<EngineCommand> {
        self.commands.read().await.clone()
    }

    /// Kinds of the commands started so far, oldest first.
    pub async fn kinds(&self) -> Vec<CommandKind> {
        self.commands.read().await.iter().map(|c| c.kind).collect()
    }

    pub async fn started(&self, kind: CommandKind) -> bool {
        self.commands.read().await.iter().any(|c| c.kind == kind)
    }

    pub async fn command_count(&self) -> usize {
        self.commands.read().await.len()
    }

    /// Number of processes that were stopped before finishing their script.
    pub fn stopped_count(&self) -> usize {
        self.stopped.load(Ordering::SeqCst)
    }

    fn default_script(kind: CommandKind) -> Vec<EngineEvent> {
        match kind {
            CommandKind::Probe => vec![
                EngineEvent::CodecData(codec_data(Some("h264 (High)"))),
                EngineEvent::End,
            ],
            CommandKind::Screenshot => vec![EngineEvent::Progress(progress(100.0)), EngineEvent::End],
            CommandKind::ConvertFast | CommandKind::ConvertSlow => vec![
                EngineEvent::Progress(progress(50.0)),
                EngineEvent::Progress(progress(100.0)),
                EngineEvent::End,
            ],
        }
    }
}

/// Codec data for a 10 second AVI input with an AAC audio stream.
pub fn codec_data(video: Option<&str>) -> CodecData {
    CodecData {
        format: Some("avi".to_string()),
        duration_secs: Some(10.0),
        video: video.map(str::to_string),
        audio: Some("aac (LC)".to_string()),
    }
}

/// Progress record at `percent` of a 10 second input.
pub fn progress(percent: f32) -> ProgressRecord {
    ProgressRecord {
        percent,
        time_secs: f64::from(percent) / 10.0,
        frame: None,
        speed: Some("4.0x".to_string()),
    }
}

fn is_terminal(event: &EngineEvent) -> bool {
    matches!(
        event,
        EngineEvent::End | EngineEvent::Error(_) | EngineEvent::Killed
    )
}

#[async_trait]
impl Engine for MockEngine {
    fn name(&self) -> &str {
        "mock"
    }

    async fn start(&self, command: EngineCommand) -> Result<EngineProcess, EngineError> {
        let kind = command.kind;
        self.commands.write().await.push(command);

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        let events = self
            .scripts
            .read()
            .await
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| Self::default_script(kind));

        let pid = 1000 + self.next_pid.fetch_add(1, Ordering::Relaxed);
        let (events_tx, events_rx) = mpsc::channel(16);
        let (kill_tx, mut kill_rx) = oneshot::channel::<()>();

        let stopped = Arc::clone(&self.stopped);

        tokio::spawn(async move {
            for event in events {
                let terminal = is_terminal(&event);
                tokio::select! {
                    _ = &mut kill_rx => {
                        stopped.fetch_add(1, Ordering::SeqCst);
                        let _ = events_tx.send(EngineEvent::Killed).await;
                        return;
                    }
                    sent = events_tx.send(event) => {
                        if sent.is_err() || terminal {
                            return;
                        }
                    }
                }
            }

            // Kill request or dropped handle both stop the process.
            let _ = kill_rx.await;
            stopped.fetch_add(1, Ordering::SeqCst);
            let _ = events_tx.send(EngineEvent::Killed).await;
        });

        Ok(EngineProcess::new(Some(pid), events_rx, kill_tx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(kind: CommandKind) -> EngineCommand {
        EngineCommand {
            kind,
            input: "/testdata/sample.avi".to_string(),
            output: None,
            args: Vec::new(),
            niceness: None,
        }
    }

    #[tokio::test]
    async fn test_default_probe_reports_h264() {
        let engine = MockEngine::new();
        let process = engine.start(command(CommandKind::Probe)).await.unwrap();
        let (_handle, mut events) = process.into_parts();

        match events.recv().await {
            Some(EngineEvent::CodecData(data)) => {
                assert_eq!(data.video.as_deref(), Some("h264 (High)"))
            }
            other => panic!("unexpected event: {:?}", other),
        }
        assert_eq!(events.recv().await, Some(EngineEvent::End));
        assert_eq!(engine.kinds().await, vec![CommandKind::Probe]);
    }

    #[tokio::test]
    async fn test_hang_until_killed() {
        let engine = MockEngine::new();
        engine.set_hang(CommandKind::ConvertSlow).await;

        let process = engine.start(command(CommandKind::ConvertSlow)).await.unwrap();
        let (mut handle, mut events) = process.into_parts();
        assert!(handle.kill());
        assert_eq!(events.recv().await, Some(EngineEvent::Killed));
        assert_eq!(engine.stopped_count(), 1);
    }

    #[tokio::test]
    async fn test_error_injection() {
        let engine = MockEngine::new();
        engine
            .set_next_error(EngineError::not_ready("no binary"))
            .await;

        assert!(engine.start(command(CommandKind::Probe)).await.is_err());
        assert!(engine.start(command(CommandKind::Probe)).await.is_ok());
        assert_eq!(engine.command_count().await, 2);
    }
}
