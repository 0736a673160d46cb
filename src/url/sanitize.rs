use url::Url;

/// Rewrites a URL so it is safe to put in a log line
///
/// Query strings frequently carry tokens, so they are replaced with a
/// `?[redacted]` marker; userinfo and fragments are dropped. Strings that do
/// not parse are replaced wholesale.
///
/// # Examples
///
/// ```
/// use sumi_sieve::url::sanitize_for_log;
///
/// assert_eq!(
///     sanitize_for_log("https://example.com/cb?token=secret"),
///     "https://example.com/cb?[redacted]"
/// );
/// assert_eq!(sanitize_for_log("not-a-url"), "[invalid-url]");
/// ```
pub fn sanitize_for_log(raw: &str) -> String {
    match Url::parse(raw.trim()) {
        Ok(url) => sanitize_parsed(&url),
        Err(_) => "[invalid-url]".to_string(),
    }
}

/// Same as [`sanitize_for_log`] for an already parsed URL
pub(crate) fn sanitize_parsed(url: &Url) -> String {
    if url.cannot_be_a_base() {
        return format!("{}:[opaque]", url.scheme());
    }

    let mut clean = format!("{}{}", url.origin().ascii_serialization(), url.path());
    if url.query().is_some() {
        clean.push_str("?[redacted]");
    }
    clean
}
