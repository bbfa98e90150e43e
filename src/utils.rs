//! Utility functions for string shaping and file system checks.
//!
//! - Truncation for log payloads and prompt snippets
//! - Title-casing for category names derived from filenames
//! - Source labels derived from article URLs
//! - Output directory validation

use std::fs as stdfs;
use std::io;
use tokio::fs;
use tracing::{info, instrument};
use url::Url;

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes (on a character boundary) with
/// an ellipsis and a count of the dropped bytes appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Hard-truncate `s` to `max_chars` characters, appending `...` when cut.
pub fn truncate_with_ellipsis(s: &str, max_chars: usize) -> String {
    let s = s.trim();
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let kept: String = s.chars().take(max_chars).collect();
    format!("{}...", kept.trim_end())
}

/// Capitalize the first character of a string.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(upcase("hello"), "Hello");
/// assert_eq!(upcase(""), "");
/// ```
pub fn upcase(s: &str) -> String {
    let mut c = s.chars();
    match c.next() {
        None => String::new(),
        Some(f) => f.to_uppercase().collect::<String>() + c.as_str(),
    }
}

/// Title-case each whitespace-separated word.
pub fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|w| upcase(&w.to_lowercase()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extract the domain label before the TLD from a URL.
///
/// For example: `"https://www.reuters.com/world"` -> `"reuters"`.
pub fn source_tag(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    let parts: Vec<&str> = host.split('.').collect();
    if parts.len() >= 2 {
        Some(parts[parts.len() - 2].to_string())
    } else {
        None
    }
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then writes and removes a probe file.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> io::Result<()> {
    fs::create_dir_all(path).await?;
    // Sync write keeps the error surface simple
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!("Output directory is writable");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_for_log_short_string() {
        assert_eq!(truncate_for_log("Hello, world!", 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_multibyte() {
        // 'é' is two bytes; cutting at 3 must back off to a boundary
        let result = truncate_for_log("éééé", 3);
        assert!(result.starts_with("é…"));
    }

    #[test]
    fn test_truncate_with_ellipsis() {
        assert_eq!(truncate_with_ellipsis("short", 10), "short");
        assert_eq!(truncate_with_ellipsis("abcdefghij", 10), "abcdefghij");
        assert_eq!(truncate_with_ellipsis("abcdefghijk", 10), "abcdefghij...");
        assert_eq!(truncate_with_ellipsis("ünïcödé text", 6), "ünïcöd...");
    }

    #[test]
    fn test_upcase() {
        assert_eq!(upcase("hello"), "Hello");
        assert_eq!(upcase(""), "");
        assert_eq!(upcase("a"), "A");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("world news"), "World News");
        assert_eq!(title_case("SPORTS"), "Sports");
        assert_eq!(title_case("  science   and tech "), "Science And Tech");
    }

    #[test]
    fn test_source_tag() {
        assert_eq!(source_tag("https://lite.cnn.com/2025/05/06/a"), Some("cnn".into()));
        assert_eq!(source_tag("https://example.com/article"), Some("example".into()));
        assert_eq!(source_tag("https://localhost/a"), None);
        assert_eq!(source_tag("not a url"), None);
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_creates_nested() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a/b");
        let path = nested.to_str().unwrap();
        ensure_writable_dir(path).await.unwrap();
        assert!(nested.is_dir());
    }
}
