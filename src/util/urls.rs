use url::Url;

/// Path used when a link cannot be parsed as an absolute URL.
const INVALID_PATH: &str = "/invalid.html";

/// Scheme prefixes removed from a feed URL before hashing it into a podcast GUID.
const FEED_URL_SCHEMES: [&str; 3] = ["http://", "https://", "feed://"];

/// Splits a link into the `(authority, path)` pair used by tag URIs.
///
/// The authority is the host plus a non-default port. A link that does not
/// parse as an absolute URL yields the raw link as authority and
/// `/invalid.html` as path, so a tag URI can still be formed.
///
/// # Examples
///
/// ```
/// use feedsmith::util::host_and_path;
///
/// assert_eq!(
///     host_and_path("https://example.com/ep/1"),
///     ("example.com".to_string(), "/ep/1".to_string())
/// );
/// assert_eq!(
///     host_and_path("http://example.com:8080/a"),
///     ("example.com:8080".to_string(), "/a".to_string())
/// );
/// ```
pub fn host_and_path(link: &str) -> (String, String) {
    match Url::parse(link) {
        Ok(url) => {
            let host = url.host_str().unwrap_or_default();
            let authority = match url.port() {
                Some(port) => format!("{host}:{port}"),
                None => host.to_owned(),
            };
            (authority, url.path().to_owned())
        }
        Err(e) => {
            tracing::debug!(link = %link, error = %e, "Link is not an absolute URL, using placeholder path");
            (link.to_owned(), INVALID_PATH.to_owned())
        }
    }
}

/// Normalizes a feed URL for podcast GUID derivation.
///
/// Removes one leading `http://`, `https://` or `feed://` (exact, case-sensitive
/// match) and then every trailing `/`.
///
/// # Examples
///
/// ```
/// use feedsmith::util::normalize_feed_url;
///
/// assert_eq!(normalize_feed_url("https://example.com/podcast.rss/"), "example.com/podcast.rss");
/// assert_eq!(normalize_feed_url("HTTPS://example.com/x"), "HTTPS://example.com/x");
/// ```
pub fn normalize_feed_url(feed_url: &str) -> &str {
    let stripped = FEED_URL_SCHEMES
        .iter()
        .find_map(|scheme| feed_url.strip_prefix(scheme))
        .unwrap_or(feed_url);
    stripped.trim_end_matches('/')
}
