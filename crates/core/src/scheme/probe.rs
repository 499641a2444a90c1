//! Codec detection through a short engine run.

use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

use super::classify::classify_error;
use super::commands;
use super::error::VideoError;
use super::paths::MediaSource;
use super::registry::JobRegistry;
use super::types::JobId;
use crate::config::EngineConfig;
use crate::engine::{Engine, EngineEvent};

/// Leading token of an engine codec description: `h264 (High)` -> `h264`.
pub fn codec_name(description: &str) -> String {
    description
        .trim()
        .split(|c: char| c == '(' || c.is_whitespace())
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Runs the engine in probe mode and returns the input's video codec.
///
/// With `job`, the probe process is owned by that job while it runs, so
/// cancelling the job stops the probe. The process is stopped as soon as
/// codec data arrives.
pub(crate) async fn probe_codec(
    engine: &dyn Engine,
    config: &EngineConfig,
    source: &MediaSource,
    job: Option<(&JobRegistry, JobId)>,
) -> Result<String, VideoError> {
    let command = commands::probe(config, &source.engine_input());
    let process = engine
        .start(command)
        .await
        .map_err(|e| VideoError::probe_failed(classify_error(&e.to_string())))?;
    let (handle, mut events) = process.into_parts();

    let _local_handle = match job {
        Some((registry, id)) => {
            registry.attach_process(id, handle)?;
            None
        }
        None => Some(handle),
    };

    let limit = Duration::from_secs(config.probe_timeout_secs);
    let result = timeout(limit, async {
        while let Some(event) = events.recv().await {
            match event {
                EngineEvent::CodecData(data) => {
                    return match data.video {
                        Some(video) => Ok(codec_name(&video)),
                        None => Err(VideoError::probe_failed("input has no video stream")),
                    };
                }
                EngineEvent::Progress(_) => {}
                EngineEvent::End => {
                    return Err(VideoError::probe_failed(
                        "engine finished without reporting codec data",
                    ))
                }
                EngineEvent::Error(raw) => return Err(VideoError::probe_failed(classify_error(&raw))),
                EngineEvent::Killed => return Err(VideoError::Cancelled),
            }
        }
        Err(VideoError::probe_failed(
            "engine exited without reporting codec data",
        ))
    })
    .await
    .unwrap_or_else(|_| {
        Err(VideoError::probe_failed(format!(
            "no codec data within {} seconds",
            config.probe_timeout_secs
        )))
    });

    if let Some((registry, id)) = job {
        registry.detach_process(id);
    }

    if let Ok(codec) = &result {
        debug!(input = %source.engine_input(), codec = %codec, "Probed codec");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_name() {
        assert_eq!(codec_name("h264 (High)"), "h264");
        assert_eq!(codec_name("hevc (Main 10) (hvc1 / 0x31637668)"), "hevc");
        assert_eq!(codec_name("mpeg4(Simple Profile)"), "mpeg4");
        assert_eq!(codec_name("  vp9"), "vp9");
        assert_eq!(codec_name(""), "");
    }
}
