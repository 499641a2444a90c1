//! Input and output locations for a job.

use std::path::{Path, PathBuf};
use url::Url;

use super::error::VideoError;

/// Appended to the stem when a conversion would overwrite its own input.
const OVERWRITE_SUFFIX: &str = "_converted";

/// Where a job reads its media from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    /// `file://` URL, resolved to a local path.
    Local(PathBuf),
    /// `http(s)://` URL, handed to the engine as is.
    Remote(Url),
}

impl MediaSource {
    /// Parses a source URL. Only `file`, `http` and `https` are accepted.
    pub fn parse(source_url: &str) -> Result<Self, VideoError> {
        let url = Url::parse(source_url).map_err(|e| {
            VideoError::invalid_input(format!("cannot parse source URL {}: {}", source_url, e))
        })?;

        match url.scheme() {
            "file" => url.to_file_path().map(Self::Local).map_err(|_| {
                VideoError::invalid_input(format!("not a local file URL: {}", source_url))
            }),
            "http" | "https" => Ok(Self::Remote(url)),
            other => Err(VideoError::invalid_input(format!(
                "unsupported URL scheme: {}",
                other
            ))),
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }

    /// The engine's input argument.
    pub fn engine_input(&self) -> String {
        match self {
            Self::Local(path) => path.to_string_lossy().to_string(),
            Self::Remote(url) => url.to_string(),
        }
    }

    /// Input basename without its extension.
    pub fn file_stem(&self) -> Result<String, VideoError> {
        let stem = match self {
            Self::Local(path) => path.file_stem().map(|s| s.to_string_lossy().to_string()),
            Self::Remote(url) => url
                .path_segments()
                .and_then(|mut segments| segments.next_back())
                .and_then(|segment| urlencoding::decode(segment).ok())
                .and_then(|name| {
                    Path::new(name.as_ref())
                        .file_stem()
                        .map(|s| s.to_string_lossy().to_string())
                }),
        };

        stem.filter(|s| !s.is_empty())
            .ok_or_else(|| VideoError::invalid_input("source URL has no file name"))
    }
}

/// Naming rule for the output file.
#[derive(Debug, Clone, Copy)]
pub enum OutputTarget<'a> {
    /// `<stem><suffix>.<extension>`
    Preview { suffix: &'a str, extension: &'a str },
    /// `<stem>.<extension>`
    Container { extension: &'a str },
}

impl OutputTarget<'_> {
    fn file_name(&self, stem: &str) -> String {
        match self {
            Self::Preview { suffix, extension } => format!("{}{}.{}", stem, suffix, extension),
            Self::Container { extension } => format!("{}.{}", stem, extension),
        }
    }
}

/// Resolved locations of a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub source: MediaSource,
    pub output_path: PathBuf,
    /// `output_path` behind a `file://` prefix, not percent-encoded.
    pub output_url: String,
}

/// Derives the output location for `source_url`.
///
/// The output directory is `out_dir` if given, otherwise `temp_dir` for
/// remote input and the input's own directory for local input.
pub fn resolve(
    source_url: &str,
    out_dir: Option<&Path>,
    temp_dir: &Path,
    target: OutputTarget<'_>,
) -> Result<ResolvedPaths, VideoError> {
    let source = MediaSource::parse(source_url)?;
    let stem = source.file_stem()?;

    let dir = match (out_dir, &source) {
        (Some(dir), _) => dir.to_path_buf(),
        (None, MediaSource::Remote(_)) => temp_dir.to_path_buf(),
        (None, MediaSource::Local(path)) => path
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| VideoError::invalid_input("source file has no parent directory"))?,
    };

    let mut output_path = dir.join(target.file_name(&stem));
    if matches!(&source, MediaSource::Local(input) if *input == output_path) {
        output_path = dir.join(target.file_name(&format!("{}{}", stem, OVERWRITE_SUFFIX)));
    }

    if !output_path.is_absolute() {
        return Err(VideoError::invalid_input(format!(
            "output path must be absolute: {}",
            output_path.display()
        )));
    }
    // Plain path after the prefix, so the returned name matches the input's.
    let output_url = format!("file://{}", output_path.display());

    Ok(ResolvedPaths {
        source,
        output_path,
        output_url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREVIEW: OutputTarget<'static> = OutputTarget::Preview {
        suffix: "_preview",
        extension: "png",
    };
    const MP4: OutputTarget<'static> = OutputTarget::Container { extension: "mp4" };

    #[test]
    fn test_local_file_uses_own_directory() {
        let paths = resolve("file:///testdata/sample.avi", None, Path::new("/tmp"), PREVIEW).unwrap();
        assert_eq!(paths.source, MediaSource::Local(PathBuf::from("/testdata/sample.avi")));
        assert_eq!(paths.output_path, PathBuf::from("/testdata/sample_preview.png"));
        assert_eq!(paths.output_url, "file:///testdata/sample_preview.png");
    }

    #[test]
    fn test_remote_uses_temp_dir() {
        let paths = resolve(
            "https://example.com/media/ES_MenorcaDemo.mp4",
            None,
            Path::new("/var/tmp"),
            PREVIEW,
        )
        .unwrap();
        assert!(paths.source.is_remote());
        assert_eq!(
            paths.source.engine_input(),
            "https://example.com/media/ES_MenorcaDemo.mp4"
        );
        assert_eq!(paths.output_url, "file:///var/tmp/ES_MenorcaDemo_preview.png");
    }

    #[test]
    fn test_out_dir_wins_for_both_schemes() {
        let out_dir = Path::new("/data/out");
        let local = resolve("file:///testdata/sample.avi", Some(out_dir), Path::new("/tmp"), MP4).unwrap();
        assert_eq!(local.output_path, PathBuf::from("/data/out/sample.mp4"));

        let remote = resolve("http://example.com/clip.webm", Some(out_dir), Path::new("/tmp"), MP4).unwrap();
        assert_eq!(remote.output_url, "file:///data/out/clip.mp4");
    }

    #[test]
    fn test_percent_encoded_names() {
        let local = resolve("file:///videos/My%20Clip.mov", None, Path::new("/tmp"), PREVIEW).unwrap();
        assert_eq!(local.output_path, PathBuf::from("/videos/My Clip_preview.png"));
        assert_eq!(local.output_url, "file:///videos/My Clip_preview.png");

        let remote = resolve("https://example.com/My%20Clip.mov", None, Path::new("/tmp"), PREVIEW).unwrap();
        assert_eq!(remote.output_path, PathBuf::from("/tmp/My Clip_preview.png"));
        assert_eq!(remote.output_url, "file:///tmp/My Clip_preview.png");
    }

    #[test]
    fn test_relative_temp_dir_rejected() {
        assert!(matches!(
            resolve("https://example.com/clip.avi", None, Path::new("tmp"), PREVIEW),
            Err(VideoError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_conversion_never_overwrites_input() {
        let paths = resolve("file:///videos/sample.mp4", None, Path::new("/tmp"), MP4).unwrap();
        assert_eq!(paths.output_path, PathBuf::from("/videos/sample_converted.mp4"));
    }

    #[test]
    fn test_unsupported_scheme() {
        let err = resolve("ftp://example.com/sample.avi", None, Path::new("/tmp"), PREVIEW).unwrap_err();
        assert!(matches!(err, VideoError::InvalidInput { .. }));
        assert!(err.to_string().contains("ftp"));
    }

    #[test]
    fn test_unparseable_and_nameless_urls() {
        assert!(matches!(
            resolve("/testdata/sample.avi", None, Path::new("/tmp"), PREVIEW),
            Err(VideoError::InvalidInput { .. })
        ));
        assert!(matches!(
            resolve("https://example.com/", None, Path::new("/tmp"), PREVIEW),
            Err(VideoError::InvalidInput { .. })
        ));
    }
}
