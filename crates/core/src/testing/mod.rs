//! Testing utilities and mock implementations.
//!
//! The mocks stand in for the ffmpeg-backed engine so the pipelines can be
//! exercised without spawning processes.
//!
//! # Example
//!
//! ```rust,ignore
//! use videoscheme_core::testing::{MockEngine, MockEngineSupport};
//!
//! let engine = MockEngine::new();
//! let support = MockEngineSupport::new();
//!
//! // Configure engine behavior
//! engine.set_video_codec("mpeg4 (Simple Profile)").await;
//! engine.set_failure(CommandKind::Screenshot, "pipe:0: No such file or directory").await;
//!
//! let scheme = VideoScheme::new(Config::default(), Arc::new(support), Arc::new(engine));
//! ```

mod mock_engine;
mod mock_support;

pub use mock_engine::{codec_data, progress, MockEngine};
pub use mock_support::MockEngineSupport;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::Path;
    use std::sync::Arc;

    use super::{MockEngine, MockEngineSupport};
    use crate::config::Config;
    use crate::scheme::VideoScheme;

    /// Default configuration with `temp_dir` pointing at `temp_dir`.
    pub fn config(temp_dir: &Path) -> Config {
        let mut config = Config::default();
        config.engine.temp_dir = temp_dir.to_path_buf();
        config
    }

    /// Scheme over fresh mocks, returning the mocks for scripting and assertions.
    pub fn scheme(config: Config) -> (VideoScheme, MockEngine, MockEngineSupport) {
        let engine = MockEngine::new();
        let support = MockEngineSupport::new();
        let scheme = VideoScheme::new(
            config,
            Arc::new(support.clone()),
            Arc::new(engine.clone()),
        );
        (scheme, engine, support)
    }
}
