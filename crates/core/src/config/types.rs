use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub conversion: ConversionConfig,
    #[serde(default)]
    pub screenshot: ScreenshotConfig,
}

/// Engine process configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Path (or bare name looked up on PATH) of the ffmpeg binary.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,
    /// Binary used to apply scheduling priority to a running engine process.
    #[serde(default = "default_renice_path")]
    pub renice_path: PathBuf,
    /// Output directory for jobs whose input is a remote URL.
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,
    #[serde(default = "default_screenshot_timeout")]
    pub screenshot_timeout_secs: u64,
    #[serde(default = "default_conversion_timeout")]
    pub conversion_timeout_secs: u64,
    /// How much of the input the probe run reads before stopping.
    #[serde(default = "default_probe_duration")]
    pub probe_duration_secs: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            renice_path: default_renice_path(),
            temp_dir: default_temp_dir(),
            probe_timeout_secs: default_probe_timeout(),
            screenshot_timeout_secs: default_screenshot_timeout(),
            conversion_timeout_secs: default_conversion_timeout(),
            probe_duration_secs: default_probe_duration(),
        }
    }
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_renice_path() -> PathBuf {
    PathBuf::from("renice")
}

fn default_temp_dir() -> PathBuf {
    std::env::temp_dir()
}

fn default_probe_timeout() -> u64 {
    30
}

fn default_screenshot_timeout() -> u64 {
    60
}

fn default_conversion_timeout() -> u64 {
    3600 // 1 hour
}

fn default_probe_duration() -> u32 {
    1
}

/// Transcode target configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConversionConfig {
    /// Target container, also used as the output file extension.
    #[serde(default = "default_container")]
    pub container: String,
    /// Probed codec that can be remuxed into the container without re-encoding.
    #[serde(default = "default_fast_codec")]
    pub fast_codec: String,
    #[serde(default = "default_video_encoder")]
    pub video_encoder: String,
    #[serde(default = "default_preset")]
    pub preset: String,
    #[serde(default = "default_crf")]
    pub crf: u8,
    #[serde(default = "default_audio_encoder")]
    pub audio_encoder: String,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            container: default_container(),
            fast_codec: default_fast_codec(),
            video_encoder: default_video_encoder(),
            preset: default_preset(),
            crf: default_crf(),
            audio_encoder: default_audio_encoder(),
        }
    }
}

fn default_container() -> String {
    "mp4".to_string()
}

fn default_fast_codec() -> String {
    "h264".to_string()
}

fn default_video_encoder() -> String {
    "libx264".to_string()
}

fn default_preset() -> String {
    "veryfast".to_string()
}

fn default_crf() -> u8 {
    23
}

fn default_audio_encoder() -> String {
    "aac".to_string()
}

/// Preview frame configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScreenshotConfig {
    /// Appended to the input's file stem.
    #[serde(default = "default_suffix")]
    pub suffix: String,
    #[serde(default = "default_extension")]
    pub extension: String,
    /// Position of the extracted frame. First frame when unset.
    #[serde(default)]
    pub seek_secs: Option<f64>,
}

impl Default for ScreenshotConfig {
    fn default() -> Self {
        Self {
            suffix: default_suffix(),
            extension: default_extension(),
            seek_secs: None,
        }
    }
}

fn default_suffix() -> String {
    "_preview".to_string()
}

fn default_extension() -> String {
    "png".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.engine.ffmpeg_path, PathBuf::from("ffmpeg"));
        assert_eq!(config.engine.temp_dir, std::env::temp_dir());
        assert_eq!(config.engine.conversion_timeout_secs, 3600);
        assert_eq!(config.conversion.container, "mp4");
        assert_eq!(config.conversion.fast_codec, "h264");
        assert_eq!(config.screenshot.suffix, "_preview");
        assert!(config.screenshot.seek_secs.is_none());
    }

    #[test]
    fn test_deserialize_partial_sections() {
        let toml = r#"
[engine]
ffmpeg_path = "/opt/ffmpeg/bin/ffmpeg"
probe_timeout_secs = 5

[conversion]
crf = 28
preset = "slow"

[screenshot]
seek_secs = 1.5
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(
            config.engine.ffmpeg_path,
            PathBuf::from("/opt/ffmpeg/bin/ffmpeg")
        );
        assert_eq!(config.engine.probe_timeout_secs, 5);
        assert_eq!(config.engine.screenshot_timeout_secs, 60); // default
        assert_eq!(config.conversion.crf, 28);
        assert_eq!(config.conversion.preset, "slow");
        assert_eq!(config.conversion.video_encoder, "libx264"); // default
        assert_eq!(config.screenshot.seek_secs, Some(1.5));
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let toml = r#"
[engine]
hwaccel = "vaapi"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.engine.probe_duration_secs, 1);
    }
}
