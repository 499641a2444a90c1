//! Screenshot and conversion pipelines.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::commands;
use super::error::VideoError;
use super::options::JobOptions;
use super::paths::{self, MediaSource, OutputTarget, ResolvedPaths};
use super::probe::probe_codec;
use super::registry::JobRegistry;
use super::types::{ConversionEvent, ConversionHandle, JobId, JobKind, JobState, Strategy};
use crate::config::Config;
use crate::engine::{Engine, EngineCommand, EngineEvent, EngineSupport};

/// Orchestrates screenshot and conversion jobs on top of an engine.
///
/// Clones share the registry, engine and readiness gate.
#[derive(Clone)]
pub struct VideoScheme {
    config: Arc<Config>,
    support: Arc<dyn EngineSupport>,
    engine: Arc<dyn Engine>,
    registry: JobRegistry,
}

impl VideoScheme {
    /// Creates the orchestrator and initializes the engine support.
    pub fn new(config: Config, support: Arc<dyn EngineSupport>, engine: Arc<dyn Engine>) -> Self {
        support.init();
        Self {
            config: Arc::new(config),
            support,
            engine,
            registry: JobRegistry::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Registry of in-flight jobs, for progress queries and cancellation.
    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    /// Extracts a single preview frame.
    ///
    /// Resolves with the `file://` URL of `<stem>_preview.png`, written next
    /// to a local input, into the temp directory for a remote input, or into
    /// `options.out_dir` when given.
    pub async fn screenshot(
        &self,
        source_url: &str,
        options: JobOptions,
    ) -> Result<String, VideoError> {
        let id = self.registry.register(JobKind::Screenshot, source_url);
        let guard = self.registry.guard(id);
        info!(job_id = %id, source = %source_url, "Screenshot started");

        let result = self.run_screenshot(id, source_url, &options).await;
        drop(guard);

        match &result {
            Ok(url) => info!(job_id = %id, output = %url, "Screenshot done"),
            Err(e) => warn!(job_id = %id, error = %e, "Screenshot failed"),
        }
        result
    }

    async fn run_screenshot(
        &self,
        id: JobId,
        source_url: &str,
        options: &JobOptions,
    ) -> Result<String, VideoError> {
        options.validate()?;
        self.ready().await?;

        let screenshot = &self.config.screenshot;
        let paths = self.resolve(
            source_url,
            options,
            OutputTarget::Preview {
                suffix: &screenshot.suffix,
                extension: &screenshot.extension,
            },
        )?;

        let command = commands::screenshot(
            screenshot,
            &paths.source.engine_input(),
            &paths.output_path,
            options.niceness(),
        );
        self.run_command(id, command, None, self.config.engine.screenshot_timeout_secs)
            .await?;

        Ok(paths.output_url)
    }

    /// Starts a conversion into the configured container.
    ///
    /// Returns immediately; the handle yields `conversion.done` with the
    /// output URL or `conversion.error`. Must be called within a Tokio
    /// runtime.
    pub fn convert_to_file(&self, source_url: &str, options: JobOptions) -> ConversionHandle {
        let id = self.registry.register(JobKind::Conversion, source_url);
        let guard = self.registry.guard(id);
        let (tx, rx) = oneshot::channel();
        let scheme = self.clone();
        let source_url = source_url.to_string();

        info!(job_id = %id, source = %source_url, "Conversion started");

        tokio::spawn(async move {
            let result = scheme.run_conversion(id, &source_url, &options).await;
            drop(guard);

            let event = match result {
                Ok(url) => {
                    info!(job_id = %id, output = %url, "Conversion done");
                    ConversionEvent::Done(url)
                }
                Err(e) => {
                    warn!(job_id = %id, error = %e, "Conversion failed");
                    ConversionEvent::Error(e)
                }
            };

            if tx.send(event).is_err() {
                debug!(job_id = %id, "Conversion outcome had no listener");
            }
        });

        ConversionHandle::new(id, rx)
    }

    async fn run_conversion(
        &self,
        id: JobId,
        source_url: &str,
        options: &JobOptions,
    ) -> Result<String, VideoError> {
        options.validate()?;
        self.ready().await?;

        let strategy = if options.enforce_slow {
            debug!(job_id = %id, "Slow conversion enforced, skipping probe");
            Strategy::Slow
        } else {
            self.select_strategy(id, source_url).await?
        };

        let conversion = &self.config.conversion;
        let paths = self.resolve(
            source_url,
            options,
            OutputTarget::Container {
                extension: &conversion.container,
            },
        )?;

        let command = commands::convert(
            conversion,
            strategy,
            &paths.source.engine_input(),
            &paths.output_path,
            options.niceness(),
        );
        self.run_command(
            id,
            command,
            Some(strategy),
            self.config.engine.conversion_timeout_secs,
        )
        .await?;

        Ok(paths.output_url)
    }

    /// Probes the input and picks fast remux for the configured codec.
    async fn select_strategy(&self, id: JobId, source_url: &str) -> Result<Strategy, VideoError> {
        self.registry.set_state(id, JobState::Probing);

        let source = MediaSource::parse(source_url)?;
        let probed = probe_codec(
            self.engine.as_ref(),
            &self.config.engine,
            &source,
            Some((&self.registry, id)),
        )
        .await;

        match probed {
            Ok(codec) if codec == self.config.conversion.fast_codec => {
                debug!(job_id = %id, codec = %codec, "Using fast conversion");
                Ok(Strategy::Fast)
            }
            Ok(codec) => {
                debug!(job_id = %id, codec = %codec, "Using slow conversion");
                Ok(Strategy::Slow)
            }
            Err(VideoError::Cancelled) => Err(VideoError::Cancelled),
            Err(e) => {
                warn!(job_id = %id, error = %e, "Probe failed, falling back to slow conversion");
                Ok(Strategy::Slow)
            }
        }
    }

    /// Video codec of the input, after awaiting engine readiness.
    pub async fn codec(&self, source_url: &str) -> Result<String, VideoError> {
        self.ready().await?;
        let source = MediaSource::parse(source_url)?;
        probe_codec(self.engine.as_ref(), &self.config.engine, &source, None).await
    }

    async fn ready(&self) -> Result<(), VideoError> {
        self.support
            .ready()
            .await
            .map_err(|e| VideoError::readiness(e.to_string()))
    }

    fn resolve(
        &self,
        source_url: &str,
        options: &JobOptions,
        target: OutputTarget<'_>,
    ) -> Result<ResolvedPaths, VideoError> {
        paths::resolve(
            source_url,
            options.out_dir.as_deref(),
            &self.config.engine.temp_dir,
            target,
        )
    }

    /// Starts `command` for job `id` and follows it to its terminal event.
    async fn run_command(
        &self,
        id: JobId,
        command: EngineCommand,
        strategy: Option<Strategy>,
        timeout_secs: u64,
    ) -> Result<(), VideoError> {
        let process = self
            .engine
            .start(command)
            .await
            .map_err(|e| VideoError::engine_failure(&e.to_string()))?;
        let (handle, events) = process.into_parts();

        self.registry.attach_process(id, handle)?;
        self.registry.set_state(id, JobState::Running { strategy });

        let result = self.follow(id, events, timeout_secs).await;
        self.registry.detach_process(id);
        result
    }

    async fn follow(
        &self,
        id: JobId,
        mut events: mpsc::Receiver<EngineEvent>,
        timeout_secs: u64,
    ) -> Result<(), VideoError> {
        let limit = Duration::from_secs(timeout_secs);
        let outcome = timeout(limit, async {
            while let Some(event) = events.recv().await {
                match event {
                    EngineEvent::Progress(progress) => {
                        debug!(job_id = %id, percent = progress.percent, "Progress");
                        self.registry.update_progress(id, progress);
                    }
                    EngineEvent::CodecData(data) => {
                        debug!(job_id = %id, video = ?data.video, audio = ?data.audio, "Input");
                    }
                    EngineEvent::End => return Ok(()),
                    EngineEvent::Error(raw) => return Err(VideoError::engine_failure(&raw)),
                    EngineEvent::Killed => return Err(VideoError::Cancelled),
                }
            }
            Err(VideoError::engine_failure(
                "engine exited without reporting a result",
            ))
        })
        .await;

        outcome.unwrap_or(Err(VideoError::Timeout { timeout_secs }))
    }
}
