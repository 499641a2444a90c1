use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::error::VideoError;
use super::niceness::nice_value;

/// Per-job options.
///
/// Field names follow the camelCase keys callers send (`outDir`,
/// `enforceSlow`, `priority`); unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobOptions {
    /// Absolute directory for the output file, overriding the default location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out_dir: Option<PathBuf>,
    /// Skip the codec probe and always re-encode.
    pub enforce_slow: bool,
    /// Scheduling priority in percent (0-100). Unset leaves the engine at
    /// normal priority.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<f64>,
}

impl JobOptions {
    pub fn with_out_dir(mut self, out_dir: impl Into<PathBuf>) -> Self {
        self.out_dir = Some(out_dir.into());
        self
    }

    pub fn with_enforce_slow(mut self, enforce_slow: bool) -> Self {
        self.enforce_slow = enforce_slow;
        self
    }

    pub fn with_priority(mut self, percent: f64) -> Self {
        self.priority = Some(percent);
        self
    }

    /// Checks the options before a job starts.
    pub fn validate(&self) -> Result<(), VideoError> {
        if let Some(dir) = &self.out_dir {
            if !dir.is_absolute() {
                return Err(VideoError::invalid_input(format!(
                    "outDir must be an absolute path, got {}",
                    dir.display()
                )));
            }
        }
        if let Some(priority) = self.priority {
            if !priority.is_finite() {
                return Err(VideoError::invalid_input("priority must be a number"));
            }
        }
        Ok(())
    }

    /// Niceness to apply to the job's engine processes, if any.
    pub fn niceness(&self) -> Option<i32> {
        self.priority.map(|p| nice_value(Some(p)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = JobOptions::default();
        assert!(options.out_dir.is_none());
        assert!(!options.enforce_slow);
        assert!(options.priority.is_none());
        assert!(options.niceness().is_none());
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_deserialize_camel_case_ignores_unknown() {
        let options: JobOptions = serde_json::from_str(
            r#"{"outDir": "/tmp/previews", "enforceSlow": true, "priority": 100, "segments": 4}"#,
        )
        .unwrap();
        assert_eq!(options.out_dir, Some(PathBuf::from("/tmp/previews")));
        assert!(options.enforce_slow);
        assert_eq!(options.niceness(), Some(-20));
    }

    #[test]
    fn test_relative_out_dir_rejected() {
        let options = JobOptions::default().with_out_dir("previews");
        assert!(matches!(
            options.validate(),
            Err(VideoError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_non_finite_priority_rejected() {
        let options = JobOptions::default().with_priority(f64::INFINITY);
        assert!(options.validate().is_err());
    }
}
