//! Engine command lines for each kind of job.

use std::path::Path;

use super::types::Strategy;
use crate::config::{ConversionConfig, EngineConfig, ScreenshotConfig};
use crate::engine::{CommandKind, EngineCommand};

/// Probe run: no audio, bounded duration, video copied into the null muxer.
pub fn probe(config: &EngineConfig, input: &str) -> EngineCommand {
    let args = vec![
        "-i".to_string(),
        input.to_string(),
        "-an".to_string(),
        "-t".to_string(),
        config.probe_duration_secs.to_string(),
        "-c:v".to_string(),
        "copy".to_string(),
        "-f".to_string(),
        "null".to_string(),
        "-".to_string(),
    ];

    EngineCommand {
        kind: CommandKind::Probe,
        input: input.to_string(),
        output: None,
        args,
        niceness: None,
    }
}

/// Single frame extraction into `output`.
pub fn screenshot(
    config: &ScreenshotConfig,
    input: &str,
    output: &Path,
    niceness: Option<i32>,
) -> EngineCommand {
    let mut args = vec!["-y".to_string()];

    // Must precede -i to seek the input rather than decode up to it.
    if let Some(seek) = config.seek_secs {
        args.extend(["-ss".to_string(), format!("{:.3}", seek)]);
    }

    args.extend([
        "-i".to_string(),
        input.to_string(),
        "-frames:v".to_string(),
        "1".to_string(),
        "-an".to_string(),
        "-progress".to_string(),
        "pipe:2".to_string(),
        output.to_string_lossy().to_string(),
    ]);

    EngineCommand {
        kind: CommandKind::Screenshot,
        input: input.to_string(),
        output: Some(output.to_path_buf()),
        args,
        niceness,
    }
}

/// Transcode into the configured container using `strategy`.
pub fn convert(
    config: &ConversionConfig,
    strategy: Strategy,
    input: &str,
    output: &Path,
    niceness: Option<i32>,
) -> EngineCommand {
    let mut args = vec![
        "-y".to_string(),
        "-i".to_string(),
        input.to_string(),
        "-map".to_string(),
        "0:v:0".to_string(),
        "-map".to_string(),
        "0:a?".to_string(),
    ];

    let kind = match strategy {
        Strategy::Fast => {
            args.extend(["-c:v".to_string(), "copy".to_string()]);
            CommandKind::ConvertFast
        }
        Strategy::Slow => {
            args.extend([
                "-c:v".to_string(),
                config.video_encoder.clone(),
                "-preset".to_string(),
                config.preset.clone(),
                "-crf".to_string(),
                config.crf.to_string(),
                "-pix_fmt".to_string(),
                "yuv420p".to_string(),
            ]);
            CommandKind::ConvertSlow
        }
    };

    args.extend(["-c:a".to_string(), config.audio_encoder.clone()]);

    if config.container == "mp4" || config.container == "mov" {
        args.extend(["-movflags".to_string(), "+faststart".to_string()]);
    }

    args.extend([
        "-progress".to_string(),
        "pipe:2".to_string(),
        output.to_string_lossy().to_string(),
    ]);

    EngineCommand {
        kind,
        input: input.to_string(),
        output: Some(output.to_path_buf()),
        args,
        niceness,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_pair(args: &[String], flag: &str, value: &str) -> bool {
        args.windows(2).any(|w| w[0] == flag && w[1] == value)
    }

    #[test]
    fn test_probe_args() {
        let command = probe(&EngineConfig::default(), "https://example.com/drop.avi");
        assert_eq!(command.kind, CommandKind::Probe);
        assert!(command.output.is_none());
        assert!(has_pair(&command.args, "-i", "https://example.com/drop.avi"));
        assert!(command.args.contains(&"-an".to_string()));
        assert!(has_pair(&command.args, "-t", "1"));
        assert!(has_pair(&command.args, "-f", "null"));
        assert_eq!(command.args.last().map(String::as_str), Some("-"));
    }

    #[test]
    fn test_screenshot_args() {
        let command = screenshot(
            &ScreenshotConfig::default(),
            "/testdata/sample.avi",
            Path::new("/testdata/sample_preview.png"),
            Some(10),
        );
        assert_eq!(command.kind, CommandKind::Screenshot);
        assert_eq!(command.niceness, Some(10));
        assert!(has_pair(&command.args, "-frames:v", "1"));
        assert!(!command.args.contains(&"-ss".to_string()));
        assert_eq!(
            command.args.last().map(String::as_str),
            Some("/testdata/sample_preview.png")
        );
    }

    #[test]
    fn test_screenshot_seek_precedes_input() {
        let config = ScreenshotConfig {
            seek_secs: Some(2.5),
            ..Default::default()
        };
        let command = screenshot(&config, "/a.avi", Path::new("/a_preview.png"), None);
        let seek = command.args.iter().position(|a| a == "-ss").unwrap();
        let input = command.args.iter().position(|a| a == "-i").unwrap();
        assert!(seek < input);
        assert_eq!(command.args[seek + 1], "2.500");
    }

    #[test]
    fn test_fast_copies_video() {
        let command = convert(
            &ConversionConfig::default(),
            Strategy::Fast,
            "/a.avi",
            Path::new("/a.mp4"),
            None,
        );
        assert_eq!(command.kind, CommandKind::ConvertFast);
        assert!(has_pair(&command.args, "-c:v", "copy"));
        assert!(!command.args.contains(&"libx264".to_string()));
        assert!(has_pair(&command.args, "-movflags", "+faststart"));
    }

    #[test]
    fn test_slow_reencodes() {
        let command = convert(
            &ConversionConfig::default(),
            Strategy::Slow,
            "/a.avi",
            Path::new("/a.mp4"),
            Some(-20),
        );
        assert_eq!(command.kind, CommandKind::ConvertSlow);
        assert!(has_pair(&command.args, "-c:v", "libx264"));
        assert!(has_pair(&command.args, "-preset", "veryfast"));
        assert!(has_pair(&command.args, "-crf", "23"));
        assert!(has_pair(&command.args, "-c:a", "aac"));
        assert_eq!(command.niceness, Some(-20));
    }
}
