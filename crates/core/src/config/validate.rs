use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - ffmpeg path is set
/// - Timeouts are not 0
/// - CRF is within the x264/x265 range
/// - Container and screenshot naming are set
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.engine.ffmpeg_path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "engine.ffmpeg_path cannot be empty".to_string(),
        ));
    }

    for (name, value) in [
        ("engine.probe_timeout_secs", config.engine.probe_timeout_secs),
        (
            "engine.screenshot_timeout_secs",
            config.engine.screenshot_timeout_secs,
        ),
        (
            "engine.conversion_timeout_secs",
            config.engine.conversion_timeout_secs,
        ),
    ] {
        if value == 0 {
            return Err(ConfigError::ValidationError(format!(
                "{} cannot be 0",
                name
            )));
        }
    }

    if config.conversion.crf > 51 {
        return Err(ConfigError::ValidationError(format!(
            "conversion.crf must be between 0 and 51, got {}",
            config.conversion.crf
        )));
    }

    if config.conversion.container.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "conversion.container cannot be empty".to_string(),
        ));
    }

    if config.screenshot.extension.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "screenshot.extension cannot be empty".to_string(),
        ));
    }

    if matches!(config.screenshot.seek_secs, Some(s) if !s.is_finite() || s < 0.0) {
        return Err(ConfigError::ValidationError(
            "screenshot.seek_secs must be a non-negative number".to_string(),
        ));
    }

    Ok(())
}
