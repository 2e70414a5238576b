//! Utility functions for general-purpose use across the application.

/// Return at most `max_chars` characters of `s`, never splitting a UTF-8 sequence.
///
/// # Examples
///
/// ```
/// use clicklink::util::truncate_chars;
///
/// assert_eq!(truncate_chars("https://example.com", 8), "https://");
/// assert_eq!(truncate_chars("héllo", 2), "hé");
/// assert_eq!(truncate_chars("short", 50), "short");
/// ```
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Join a base URL and a shortcode into a short link.
///
/// # Examples
///
/// ```
/// use clicklink::util::short_link;
///
/// assert_eq!(short_link("http://localhost:8080/", "abc123"), "http://localhost:8080/abc123");
/// ```
pub fn short_link(base_url: &str, shortcode: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), shortcode)
}
