use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefix for environment variable overrides, e.g. `VIDEOSCHEME_ENGINE__FFMPEG_PATH`.
const ENV_PREFIX: &str = "VIDEOSCHEME_";

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[conversion]
container = "mkv"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.conversion.container, "mkv");
    }

    #[test]
    fn test_load_config_from_str_wrong_type() {
        let toml = r#"
[conversion]
crf = "high"
"#;
        let result = load_config_from_str(toml);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/videoscheme.toml"));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[engine]
ffmpeg_path = "/usr/local/bin/ffmpeg"
conversion_timeout_secs = 120

[screenshot]
extension = "jpg"
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(
            config.engine.ffmpeg_path,
            PathBuf::from("/usr/local/bin/ffmpeg")
        );
        assert_eq!(config.engine.conversion_timeout_secs, 120);
        assert_eq!(config.screenshot.extension, "jpg");
        assert_eq!(config.screenshot.suffix, "_preview");
    }
}
