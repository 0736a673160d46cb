use crate::UrlError;
use url::Url;

/// Schemes the crawler is willing to fetch
pub const ALLOWED_SCHEMES: &[&str] = &["http", "https"];

/// Validates a candidate seed URL
///
/// # Rules
///
/// 1. Surrounding whitespace is ignored; an empty candidate is rejected
/// 2. The candidate must parse as an absolute URL
/// 3. The scheme must be `http` or `https`
/// 4. The URL must carry a non-empty host
///
/// This check is pure and never touches the network. A rejection is final:
/// the caller records the URL as skipped.
///
/// # Arguments
///
/// * `candidate` - The raw URL string from the seed list
///
/// # Returns
///
/// * `Ok(Url)` - The parsed URL, ready for the robots check
/// * `Err(UrlError)` - Why the candidate was rejected
///
/// # Examples
///
/// ```
/// use sumi_sieve::url::validate_url;
///
/// assert!(validate_url("https://example.com/page").is_ok());
/// assert!(validate_url("ftp://example.com/file").is_err());
/// assert!(validate_url("not-a-url").is_err());
/// ```
pub fn validate_url(candidate: &str) -> Result<Url, UrlError> {
    let candidate = candidate.trim();
    if candidate.is_empty() {
        return Err(UrlError::Empty);
    }

    let url = Url::parse(candidate).map_err(|e| UrlError::Parse(e.to_string()))?;

    if !ALLOWED_SCHEMES.contains(&url.scheme()) {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(UrlError::MissingHost),
    }
}
