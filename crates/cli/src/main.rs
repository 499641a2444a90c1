mod cli;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

use videoscheme_core::{
    load_config, validate_config, Config, ConversionEvent, EngineSupport, FfmpegEngine,
    FfmpegSupport, JobId, JobOptions, VideoScheme,
};

use cli::{Cli, Commands, JobArgs};

/// How often a running conversion reports its progress.
const PROGRESS_INTERVAL: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = load(cli.config.as_deref())?;
    let support = Arc::new(FfmpegSupport::new(config.engine.clone()));

    if let Commands::Check = cli.command {
        support.init();
        support.ready().await.context("ffmpeg is not usable")?;
        if let Some(path) = support.binary_path() {
            println!("{}", path.display());
        }
        return Ok(());
    }

    let engine = Arc::new(FfmpegEngine::new(config.engine.clone()));
    let scheme = VideoScheme::new(config, support, engine);

    match cli.command {
        Commands::Screenshot { input, job } => {
            let url = scheme
                .screenshot(&source_url(&input)?, job_options(job, false))
                .await
                .context("Screenshot failed")?;
            println!("{}", url);
        }
        Commands::Convert {
            input,
            job,
            enforce_slow,
        } => {
            let url = convert(&scheme, &source_url(&input)?, job_options(job, enforce_slow)).await?;
            println!("{}", url);
        }
        Commands::Codec { input, json } => {
            let source = source_url(&input)?;
            let codec = scheme.codec(&source).await.context("Codec probe failed")?;
            if json {
                println!(
                    "{}",
                    serde_json::json!({ "source": source, "codec": codec })
                );
            } else {
                println!("{}", codec);
            }
        }
        Commands::Check => {}
    }

    Ok(())
}

/// Loads and validates the config file, or the defaults when none is given.
fn load(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            load_config(path).with_context(|| format!("Failed to load config from {:?}", path))?
        }
        None => Config::default(),
    };

    validate_config(&config).context("Configuration validation failed")?;
    Ok(config)
}

/// Runs a conversion, logging progress and cancelling it on Ctrl+C.
async fn convert(scheme: &VideoScheme, source_url: &str, options: JobOptions) -> Result<String> {
    let handle = scheme.convert_to_file(source_url, options);
    let id = handle.job_id();
    let ticker = tokio::spawn(report_progress(scheme.clone(), id));

    let mut outcome = Box::pin(handle.wait());
    let event = tokio::select! {
        event = &mut outcome => event,
        _ = signal::ctrl_c() => {
            warn!(job_id = %id, "Interrupted, cancelling conversion");
            if let Err(e) = scheme.registry().cancel(id) {
                warn!(job_id = %id, error = %e, "Cancel failed");
            }
            outcome.await
        }
    };
    ticker.abort();

    match event {
        ConversionEvent::Done(url) => Ok(url),
        ConversionEvent::Error(e) => Err(e).context("Conversion failed"),
    }
}

async fn report_progress(scheme: VideoScheme, id: JobId) {
    let mut interval = tokio::time::interval(PROGRESS_INTERVAL);
    interval.tick().await;
    loop {
        interval.tick().await;
        match scheme.registry().job(id) {
            Ok(job) => info!(
                job_id = %id,
                state = ?job.state,
                percent = job.progress.percent,
                speed = job.progress.speed.as_deref().unwrap_or("-"),
                "Converting"
            ),
            Err(_) => break,
        }
    }
}

fn job_options(args: JobArgs, enforce_slow: bool) -> JobOptions {
    JobOptions {
        out_dir: args.out_dir,
        enforce_slow,
        priority: args.priority,
    }
}

/// Accepts a URL as is and turns anything else into a `file://` URL.
fn source_url(input: &str) -> Result<String> {
    match Url::parse(input) {
        // Single letter schemes are Windows drive letters.
        Ok(url) if url.scheme().len() > 1 => Ok(url.to_string()),
        _ => {
            let path = std::fs::canonicalize(PathBuf::from(input))
                .with_context(|| format!("Input not found: {}", input))?;
            Url::from_file_path(&path)
                .map(String::from)
                .map_err(|_| anyhow::anyhow!("Cannot build a file URL for {:?}", path))
        }
    }
}
