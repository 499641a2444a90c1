//! Readiness gate for the ffmpeg binary.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::OnceLock;
use tokio::process::Command;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use super::error::EngineError;
use super::traits::EngineSupport;
use crate::config::EngineConfig;

/// Locates ffmpeg and checks it runs, once per instance.
pub struct FfmpegSupport {
    config: EngineConfig,
    resolved: OnceLock<Result<PathBuf, String>>,
    checked: OnceCell<Result<String, String>>,
}

impl FfmpegSupport {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            resolved: OnceLock::new(),
            checked: OnceCell::new(),
        }
    }

    /// Absolute path of the binary, once `init` found it.
    pub fn binary_path(&self) -> Option<&PathBuf> {
        self.resolved.get().and_then(|r| r.as_ref().ok())
    }

    fn resolve(&self) -> &Result<PathBuf, String> {
        self.resolved.get_or_init(|| {
            match which::which(&self.config.ffmpeg_path) {
                Ok(path) => {
                    debug!("Resolved ffmpeg binary at {:?}", path);
                    Ok(path)
                }
                Err(e) => {
                    warn!("ffmpeg not found at {:?}: {}", self.config.ffmpeg_path, e);
                    Err(e.to_string())
                }
            }
        })
    }

    async fn version(path: PathBuf) -> Result<String, String> {
        let output = Command::new(&path)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await
            .map_err(|e| e.to_string())?;

        if !output.status.success() {
            return Err(format!(
                "{} -version exited with code {:?}",
                path.display(),
                output.status.code()
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.lines().next().unwrap_or_default().to_string())
    }
}

#[async_trait]
impl EngineSupport for FfmpegSupport {
    fn init(&self) {
        let _ = self.resolve();
    }

    async fn ready(&self) -> Result<(), EngineError> {
        let path = match self.resolve() {
            Ok(path) => path.clone(),
            Err(_) => {
                return Err(EngineError::BinaryNotFound {
                    path: self.config.ffmpeg_path.clone(),
                })
            }
        };

        let checked = self
            .checked
            .get_or_init(|| async move {
                let result = Self::version(path).await;
                if let Ok(version) = &result {
                    info!("Engine ready: {}", version);
                }
                result
            })
            .await;

        checked.as_ref().map(|_| ()).map_err(EngineError::not_ready)
    }
}
