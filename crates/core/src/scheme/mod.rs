//! Video job orchestration.
//!
//! `VideoScheme` runs two kinds of jobs against an [`Engine`](crate::engine::Engine):
//!
//! - **Screenshot**: extracts one preview frame and resolves with its
//!   `file://` URL.
//! - **Conversion**: probes the input codec and either remuxes (fast path,
//!   input already in the target codec) or re-encodes (slow path), reporting
//!   through a [`ConversionHandle`].
//!
//! Every job awaits the engine readiness gate first, is tracked in the
//! [`JobRegistry`] while in flight, and reports engine failures with the
//! message produced by [`classify_error`].
//!
//! # Example
//!
//! ```ignore
//! use videoscheme_core::{ConversionEvent, JobOptions, VideoScheme};
//!
//! let scheme = VideoScheme::new(config, support, engine);
//!
//! let preview = scheme.screenshot("file:///videos/sample.avi", JobOptions::default()).await?;
//! assert_eq!(preview, "file:///videos/sample_preview.png");
//!
//! let handle = scheme.convert_to_file(
//!     "https://example.com/clip.avi",
//!     JobOptions::default().with_out_dir("/videos").with_priority(25.0),
//! );
//! let progress = scheme.registry().progress(handle.job_id())?;
//! match handle.wait().await {
//!     ConversionEvent::Done(url) => println!("converted to {}", url),
//!     ConversionEvent::Error(e) => eprintln!("conversion failed: {}", e),
//! }
//! ```

mod classify;
mod commands;
mod error;
mod niceness;
mod options;
mod paths;
mod pipeline;
mod probe;
mod registry;
mod types;

pub use classify::classify_error;
pub use error::VideoError;
pub use niceness::{nice_value, NICE_HIGHEST, NICE_LOWEST};
pub use options::JobOptions;
pub use paths::{resolve, MediaSource, OutputTarget, ResolvedPaths};
pub use pipeline::VideoScheme;
pub use probe::codec_name;
pub use registry::JobRegistry;
pub use types::{
    ConversionEvent, ConversionHandle, JobId, JobKind, JobSnapshot, JobState, Strategy,
};
