//! Line parser for ffmpeg's stderr.
//!
//! ffmpeg is run with `-progress pipe:2`, so stderr interleaves the
//! human-readable input description, `key=value` progress blocks and
//! diagnostics. The parser turns that into [`EngineEvent`]s.

use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::types::{CodecData, EngineEvent, ProgressRecord};

static STREAM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*Stream #\d+:\d+\S*: (Video|Audio): (.+)$").expect("stream regex is valid")
});

static DURATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Duration: (\d+):(\d{2}):(\d{2}(?:\.\d+)?)").expect("duration regex is valid")
});

/// Diagnostics ffmpeg prints after the actual error.
const TRAILING_NOISE: &[&str] = &["Conversion failed!", "Exiting normally"];

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum Section {
    #[default]
    Preamble,
    Input,
    Processing,
}

/// Incremental stderr parser, one per engine process.
#[derive(Debug, Default)]
pub struct StderrParser {
    section: Section,
    codec: CodecData,
    progress: ProgressRecord,
    last_diagnostic: Option<String>,
}

impl StderrParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one stderr line, returning the events it completes.
    ///
    /// The periodic stats line ends in `\r` rather than `\n`, so a single
    /// line may carry several carriage-return separated segments.
    pub fn feed(&mut self, line: &str) -> Vec<EngineEvent> {
        line.split('\r')
            .filter_map(|segment| self.feed_segment(segment))
            .collect()
    }

    fn feed_segment(&mut self, line: &str) -> Option<EngineEvent> {
        if line.trim().is_empty() {
            return None;
        }

        if let Some((key, value)) = progress_pair(line) {
            let codec = self.leave_input();
            self.apply_progress(key, value);
            // A progress block never starts in the same line the input
            // section ends, so at most one of the two fires.
            if key == "progress" {
                return Some(EngineEvent::Progress(self.progress.clone()));
            }
            return codec;
        }

        if let Some(rest) = line.strip_prefix("Input #") {
            self.section = Section::Input;
            self.codec.format = parse_input_format(rest);
            return None;
        }

        if line.starts_with("Output #") || line.starts_with("Stream mapping:") {
            return self.leave_input();
        }

        if self.section == Section::Input {
            if let Some(caps) = DURATION_RE.captures(line) {
                let hours: f64 = caps[1].parse().unwrap_or(0.0);
                let minutes: f64 = caps[2].parse().unwrap_or(0.0);
                let seconds: f64 = caps[3].parse().unwrap_or(0.0);
                self.codec.duration_secs = Some(hours * 3600.0 + minutes * 60.0 + seconds);
                return None;
            }

            if let Some(caps) = STREAM_RE.captures(line) {
                let description = caps[2].split(", ").next().unwrap_or("").trim().to_string();
                let slot = if &caps[1] == "Video" {
                    &mut self.codec.video
                } else {
                    &mut self.codec.audio
                };
                if slot.is_none() && !description.is_empty() {
                    *slot = Some(description);
                }
                return None;
            }
        }

        // Indented lines belong to stream/metadata listings; errors start at
        // column 0.
        if !line.starts_with(char::is_whitespace)
            && !is_stats_line(line)
            && !TRAILING_NOISE.iter().any(|noise| line.starts_with(noise))
        {
            self.last_diagnostic = Some(line.trim().to_string());
        }

        None
    }

    /// Raw failure text for a process that exited unsuccessfully.
    pub fn failure_message(&self, exit_code: Option<i32>) -> String {
        match (&self.last_diagnostic, exit_code) {
            (Some(line), _) => line.clone(),
            (None, Some(code)) => format!("ffmpeg exited with code {}", code),
            (None, None) => "ffmpeg was terminated by a signal".to_string(),
        }
    }

    pub fn codec_data(&self) -> &CodecData {
        &self.codec
    }

    fn leave_input(&mut self) -> Option<EngineEvent> {
        if self.section != Section::Input {
            if self.section == Section::Preamble {
                self.section = Section::Processing;
            }
            return None;
        }
        self.section = Section::Processing;
        Some(EngineEvent::CodecData(self.codec.clone()))
    }

    fn apply_progress(&mut self, key: &str, value: &str) {
        if value == "N/A" {
            return;
        }
        match key {
            "frame" => self.progress.frame = value.parse().ok(),
            // Both keys carry microseconds.
            "out_time_us" | "out_time_ms" => {
                if let Ok(us) = value.parse::<f64>() {
                    self.progress.time_secs = (us / 1_000_000.0).max(0.0);
                    self.progress.percent = match self.codec.duration_secs {
                        Some(duration) if duration > 0.0 => {
                            (self.progress.time_secs / duration * 100.0).min(100.0) as f32
                        }
                        _ => 0.0,
                    };
                }
            }
            "speed" => self.progress.speed = Some(value.trim().to_string()),
            "progress" if value == "end" => self.progress.percent = 100.0,
            _ => {}
        }
    }
}

/// Keys written by `-progress`, besides the per-stream `stream_*` ones.
const PROGRESS_KEYS: &[&str] = &[
    "frame",
    "fps",
    "bitrate",
    "total_size",
    "out_time_us",
    "out_time_ms",
    "out_time",
    "dup_frames",
    "drop_frames",
    "speed",
    "progress",
];

/// Splits a `-progress` line such as `out_time_us=1500000`.
///
/// Values are single tokens (padding aside), which tells a real progress
/// line apart from the `frame=  12 fps=0.0 ...` stats line.
fn progress_pair(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    let value = value.trim();
    let is_key = PROGRESS_KEYS.contains(&key) || key.starts_with("stream_");
    (is_key && !value.is_empty() && !value.contains(char::is_whitespace)).then_some((key, value))
}

/// The human-readable stats line printed unless `-nostats` is given.
fn is_stats_line(line: &str) -> bool {
    line.starts_with("frame=") || line.starts_with("size=")
}

/// Extracts `avi` from `0, avi, from 'sample.avi':`.
fn parse_input_format(rest: &str) -> Option<String> {
    let (_, after_index) = rest.split_once(", ")?;
    let (formats, _) = after_index.rsplit_once(", from ")?;
    formats
        .split(',')
        .next()
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
}
