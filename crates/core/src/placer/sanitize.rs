//! Filesystem-safe file names.

use once_cell::sync::Lazy;
use regex_lite::Regex;

/// Name used when sanitizing leaves nothing behind.
pub const PLACEHOLDER_NAME: &str = "download";

static ILLEGAL_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[<>:"|?*\x00-\x1f]"#).expect("valid regex"));
static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[/\\]+").expect("valid regex"));
static DOT_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.{2,}").expect("valid regex"));

/// Strip characters that are illegal on common filesystems.
///
/// Path separators become a single `.`, runs of dots collapse to one (so
/// `..` traversal cannot survive), and leading/trailing dots and spaces are
/// trimmed. Never returns an empty string, and is idempotent.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned = ILLEGAL_CHARS.replace_all(name, "");
    let cleaned = SEPARATORS.replace_all(&cleaned, ".");
    let cleaned = DOT_RUNS.replace_all(&cleaned, ".");
    let trimmed = cleaned.trim_matches(|c: char| c == '.' || c == ' ');

    if trimmed.is_empty() {
        PLACEHOLDER_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removes_illegal_characters() {
        assert_eq!(
            sanitize_filename("My Movie: The Return.mkv"),
            "My Movie The Return.mkv"
        );
        assert_eq!(sanitize_filename("a<b>c|d?e*f\"g.mkv"), "abcdefg.mkv");
    }

    #[test]
    fn test_traversal_is_neutralised() {
        assert_eq!(sanitize_filename("../secret/evil?.mkv"), "secret.evil.mkv");
        assert_eq!(sanitize_filename("..\\..\\windows\\x.mkv"), "windows.x.mkv");
    }

    #[test]
    fn test_empty_results_fall_back_to_placeholder() {
        assert_eq!(sanitize_filename(""), PLACEHOLDER_NAME);
        assert_eq!(sanitize_filename(" . .. "), PLACEHOLDER_NAME);
        assert_eq!(sanitize_filename("???"), PLACEHOLDER_NAME);
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "My Movie: The Return.mkv",
            "../secret/evil?.mkv",
            " .hidden. ",
            "a....b",
            ". .a. .",
            "Show/S01/E01 . mkv",
            "",
            "plain.mkv",
        ];
        for input in inputs {
            let once = sanitize_filename(input);
            assert_eq!(sanitize_filename(&once), once, "input: {:?}", input);
            assert!(!once.is_empty());
        }
    }
}
