/// Separator between context and cause in engine diagnostics.
const CLAUSE_SEPARATOR: &str = ": ";

/// Reduces raw engine diagnostic text to a stable, user-facing message.
///
/// Keeps the clause after the last `": "`, so
/// `"pipe:0: No such file or directory"` becomes `"No such file or directory"`.
/// Text without a separator is returned unchanged.
pub fn classify_error(raw: &str) -> String {
    match raw.rsplit_once(CLAUSE_SEPARATOR) {
        Some((_, cause)) => cause.trim().to_string(),
        None => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_clause() {
        assert_eq!(
            classify_error("pipe:0: No such file or directory"),
            "No such file or directory"
        );
        assert_eq!(
            classify_error("something: Invalid data found when processing input"),
            "Invalid data found when processing input"
        );
    }

    #[test]
    fn test_last_separator_wins() {
        assert_eq!(
            classify_error("ffmpeg exited with code 1: /x/a.avi: Permission denied\n"),
            "Permission denied"
        );
    }

    #[test]
    fn test_without_separator_unchanged() {
        assert_eq!(classify_error("Conversion failed!"), "Conversion failed!");
        assert_eq!(classify_error("pipe:0:x"), "pipe:0:x");
        assert_eq!(classify_error(""), "");
    }
}
