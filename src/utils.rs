//! String helpers shared by the extractor, pipeline, and logging.

/// Longest summary kept on an article, in characters.
pub const SUMMARY_MAX_CHARS: usize = 300;

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` characters and a `"…(+N bytes)"` marker is
/// appended. Cuts always land on a character boundary.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…(+{} bytes)", &s[..cut], s.len() - cut),
    }
}

/// Collapse every whitespace run to a single space and trim the ends.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Flatten a summary onto one line and bound its length.
///
/// Line breaks become spaces. Text longer than `max_chars` is cut to
/// `max_chars` characters and `...` is appended.
pub fn condense_summary(text: &str, max_chars: usize) -> String {
    let flat = text.replace('\n', " ");
    let flat = flat.trim();
    match flat.char_indices().nth(max_chars) {
        None => flat.to_string(),
        Some((cut, _)) => format!("{}...", &flat[..cut]),
    }
}
