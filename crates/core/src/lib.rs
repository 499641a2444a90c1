pub mod config;
pub mod engine;
pub mod scheme;
pub mod testing;

pub use config::{load_config, load_config_from_str, validate_config, Config, ConfigError};
pub use engine::{Engine, EngineError, EngineSupport, FfmpegEngine, FfmpegSupport};
pub use scheme::{
    classify_error, nice_value, ConversionEvent, ConversionHandle, JobId, JobOptions,
    JobRegistry, VideoError, VideoScheme,
};
