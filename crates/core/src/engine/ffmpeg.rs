//! FFmpeg-based engine implementation.

use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, Command};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use super::error::EngineError;
use super::parse::StderrParser;
use super::traits::Engine;
use super::types::{CommandKind, EngineCommand, EngineEvent, EngineProcess};
use crate::config::EngineConfig;

/// Buffered events per process before the supervisor waits on the consumer.
const EVENT_BUFFER: usize = 64;

/// Arguments placed before every command.
const GLOBAL_ARGS: &[&str] = &["-hide_banner", "-nostdin", "-nostats"];

/// Runs ffmpeg as a child process per command.
pub struct FfmpegEngine {
    config: EngineConfig,
}

impl FfmpegEngine {
    /// Creates a new FFmpeg engine with the given configuration.
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Creates an engine with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(EngineConfig::default())
    }

    /// Applies OS scheduling priority to a running process.
    ///
    /// Raising priority (negative values) usually needs privileges, so a
    /// failure only gets logged.
    async fn renice(&self, pid: u32, niceness: i32) {
        if cfg!(not(unix)) {
            debug!(pid, niceness, "Process priority is only applied on unix");
            return;
        }

        let result = Command::new(&self.config.renice_path)
            .args(["-n", &niceness.to_string(), "-p", &pid.to_string()])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await;

        match result {
            Ok(output) if output.status.success() => {
                debug!(pid, niceness, "Applied engine process priority");
            }
            Ok(output) => warn!(
                pid,
                niceness,
                "renice failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            ),
            Err(e) => warn!(pid, niceness, "Failed to run renice: {}", e),
        }
    }
}

#[async_trait]
impl Engine for FfmpegEngine {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn start(&self, command: EngineCommand) -> Result<EngineProcess, EngineError> {
        debug!(
            kind = ?command.kind,
            args = %command.args.join(" "),
            "Starting ffmpeg"
        );

        let mut child = Command::new(&self.config.ffmpeg_path)
            .args(GLOBAL_ARGS)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| EngineError::from_spawn(e, &self.config.ffmpeg_path))?;

        let pid = child.id();
        if let (Some(pid), Some(niceness)) = (pid, command.niceness) {
            self.renice(pid, niceness).await;
        }

        let stderr = child.stderr.take().ok_or_else(|| {
            EngineError::Spawn(std::io::Error::other("ffmpeg stderr was not captured"))
        })?;

        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
        let (kill_tx, kill_rx) = oneshot::channel();

        tokio::spawn(supervise(child, stderr, command.kind, events_tx, kill_rx));

        Ok(EngineProcess::new(pid, events_rx, kill_tx))
    }
}

/// Follows one ffmpeg process until it exits or its handle asks it to stop.
async fn supervise(
    mut child: Child,
    stderr: ChildStderr,
    kind: CommandKind,
    events: mpsc::Sender<EngineEvent>,
    mut kill_rx: oneshot::Receiver<()>,
) {
    let mut lines = BufReader::new(stderr).lines();
    let mut parser = StderrParser::new();

    loop {
        tokio::select! {
            _ = &mut kill_rx => {
                stop(&mut child, kind, &events).await;
                return;
            }
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    for event in parser.feed(&line) {
                        if events.send(event).await.is_err() {
                            // Nobody is listening any more.
                            let _ = child.kill().await;
                            return;
                        }
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(kind = ?kind, "Failed to read ffmpeg output: {}", e);
                    break;
                }
            }
        }
    }

    let status = tokio::select! {
        _ = &mut kill_rx => {
            stop(&mut child, kind, &events).await;
            return;
        }
        status = child.wait() => status,
    };

    let event = match status {
        Ok(status) if status.success() => EngineEvent::End,
        Ok(status) => EngineEvent::Error(parser.failure_message(status.code())),
        Err(e) => EngineEvent::Error(e.to_string()),
    };
    debug!(kind = ?kind, event = ?event, "ffmpeg finished");
    let _ = events.send(event).await;
}

async fn stop(child: &mut Child, kind: CommandKind, events: &mpsc::Sender<EngineEvent>) {
    if let Err(e) = child.kill().await {
        warn!(kind = ?kind, "Failed to kill ffmpeg: {}", e);
    }
    debug!(kind = ?kind, "ffmpeg stopped");
    let _ = events.send(EngineEvent::Killed).await;
}
