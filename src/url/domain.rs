use url::Url;

/// Returns the key under which robots policy for this URL is cached
///
/// The key is the ASCII origin (`scheme://host[:port]`), so
/// `http://a.test` and `https://a.test` get separate policies, as do
/// different ports on the same host.
pub fn host_key(url: &Url) -> String {
    url.origin().ascii_serialization()
}

/// Builds the robots.txt location for the URL's origin
///
/// Userinfo, query and fragment of the page URL are not carried over.
pub fn robots_url(url: &Url) -> String {
    format!("{}/robots.txt", host_key(url))
}
