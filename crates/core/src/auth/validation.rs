/// Validates a post-login `next` path.
///
/// Returns `Some(url)` for a relative path on this site and `None` for
/// anything that could send the browser elsewhere: protocol-relative
/// URLs, absolute URLs and control characters.
///
/// ```
/// use doctrips_core::auth::validate_return_to;
///
/// assert_eq!(validate_return_to("/db/2024/"), Some("/db/2024/"));
/// assert_eq!(validate_return_to("//evil.com"), None);
/// assert_eq!(validate_return_to("https://evil.com"), None);
/// ```
pub fn validate_return_to(url: &str) -> Option<&str> {
    if !url.starts_with('/') || url.starts_with("//") {
        return None;
    }
    if url.chars().any(|c| c.is_control()) {
        return None;
    }
    // Backslashes are treated as slashes by some browsers.
    if url.contains("://") || url.starts_with("/\\") {
        return None;
    }
    Some(url)
}
