//! Engine module for driving the external video-processing binary.
//!
//! This module provides the `Engine` trait, which starts one engine command
//! and exposes its lifecycle as a stream of [`EngineEvent`]s, and the
//! `EngineSupport` readiness gate that every job awaits first.
//!
//! # Example
//!
//! ```ignore
//! use videoscheme_core::engine::{Engine, EngineEvent, EngineSupport, FfmpegEngine, FfmpegSupport};
//!
//! let support = FfmpegSupport::new(config.engine.clone());
//! support.init();
//! support.ready().await?;
//!
//! let engine = FfmpegEngine::new(config.engine.clone());
//! let (handle, mut events) = engine.start(command).await?.into_parts();
//! while let Some(event) = events.recv().await {
//!     match event {
//!         EngineEvent::Progress(p) => println!("{:.1}%", p.percent),
//!         EngineEvent::End => break,
//!         EngineEvent::Error(raw) => eprintln!("{}", raw),
//!         _ => {}
//!     }
//! }
//! drop(handle);
//! ```

mod error;
mod ffmpeg;
mod parse;
mod support;
mod traits;
mod types;

pub use error::EngineError;
pub use ffmpeg::FfmpegEngine;
pub use parse::StderrParser;
pub use support::FfmpegSupport;
pub use traits::{Engine, EngineSupport};
pub use types::{
    CodecData, CommandKind, EngineCommand, EngineEvent, EngineProcess, ProcessHandle,
    ProgressRecord,
};
