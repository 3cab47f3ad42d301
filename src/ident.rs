//! Identifier generation for entries and podcasts.
//!
//! Two kinds of identifiers are produced here, both only at encode time:
//!
//! - **Entry fallback ids** for items without an explicit id. A link plus a
//!   timestamp yields a deterministic `tag:` URI; anything less yields a fresh
//!   random `urn:uuid:` URI that callers must not expect to be stable.
//! - **Podcast GUIDs**, a version-5 UUID over the normalized feed URL, used
//!   when the feed has no explicit id.

use uuid::Uuid;

use crate::model::{Feed, Timestamp};
use crate::util::{host_and_path, normalize_feed_url};

/// Namespace for podcast GUIDs (`ead4c236-bf58-58c6-a2c6-a6b28d128cb6`).
pub const PODCAST_GUID_NAMESPACE: Uuid = Uuid::from_u128(0xead4c236_bf58_58c6_a2c6_a6b28d128cb6);

/// Builds `tag:<host>,<YYYY-MM-DD>:<path>` from a link and a date.
///
/// The date is taken in the timestamp's own offset.
///
/// # Examples
///
/// ```
/// use chrono::DateTime;
/// use feedsmith::ident::tag_uri;
///
/// let date = DateTime::parse_from_rfc3339("2024-02-03T00:00:00Z").unwrap();
/// assert_eq!(tag_uri("https://example.com/ep/1", &date), "tag:example.com,2024-02-03:/ep/1");
/// ```
pub fn tag_uri(link: &str, date: &Timestamp) -> String {
    let (host, path) = host_and_path(link);
    format!("tag:{},{}:{}", host, date.format("%Y-%m-%d"), path)
}

/// A random version-4 UUID as a `urn:uuid:` URI.
pub fn random_urn() -> String {
    format!("urn:uuid:{}", Uuid::new_v4())
}

/// Fallback id for an entry that has none.
///
/// `dates` lists the candidate timestamps in the target format's order of
/// preference; the first present one is used. With a non-empty link and a
/// date the result is a deterministic [`tag_uri`], otherwise a
/// [`random_urn`].
pub fn fallback_entry_id(link: &str, dates: &[Option<&Timestamp>]) -> String {
    let date = dates.iter().find_map(|d| *d);
    match date {
        Some(date) if !link.is_empty() => tag_uri(link, date),
        _ => random_urn(),
    }
}

/// Version-5 podcast GUID for a feed URL.
///
/// # Examples
///
/// ```
/// use feedsmith::ident::podcast_guid;
///
/// // Scheme and trailing slashes do not change the GUID.
/// assert_eq!(
///     podcast_guid("https://example.com/podcast.rss/"),
///     podcast_guid("example.com/podcast.rss"),
/// );
/// ```
pub fn podcast_guid(feed_url: &str) -> Uuid {
    Uuid::new_v5(&PODCAST_GUID_NAMESPACE, normalize_feed_url(feed_url).as_bytes())
}

/// The GUID a podcast feed advertises: its explicit id verbatim, otherwise
/// the [`podcast_guid`] of its feed URL.
pub fn resolve_podcast_guid(feed: &Feed) -> String {
    if feed.id.is_empty() {
        podcast_guid(&feed.feed_url).to_string()
    } else {
        feed.id.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn ts(s: &str) -> Timestamp {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    fn is_urn_uuid(id: &str) -> bool {
        id.strip_prefix("urn:uuid:")
            .map(|rest| rest.len() == 36 && Uuid::parse_str(rest).is_ok())
            .unwrap_or(false)
    }

    #[test]
    fn test_tag_uri_from_created() {
        let created = ts("2024-02-03T12:00:00Z");
        let id = fallback_entry_id("https://example.com/ep/1", &[None, Some(&created)]);
        assert_eq!(id, "tag:example.com,2024-02-03:/ep/1");
    }

    #[test]
    fn test_tag_uri_prefers_first_candidate() {
        let updated = ts("2024-05-06T00:00:00Z");
        let created = ts("2024-02-03T00:00:00Z");
        let id = fallback_entry_id("https://example.com/p", &[Some(&updated), Some(&created)]);
        assert_eq!(id, "tag:example.com,2024-05-06:/p");
    }

    #[test]
    fn test_tag_uri_uses_local_date() {
        let late = ts("2024-02-03T23:30:00-05:00");
        assert_eq!(tag_uri("https://example.com/a", &late), "tag:example.com,2024-02-03:/a");
    }

    #[test]
    fn test_tag_uri_is_deterministic() {
        let created = ts("2024-02-03T00:00:00Z");
        let a = fallback_entry_id("https://example.com/ep/1", &[Some(&created)]);
        let b = fallback_entry_id("https://example.com/ep/1", &[Some(&created)]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_no_link_falls_back_to_uuid() {
        let created = ts("2024-02-03T00:00:00Z");
        assert!(is_urn_uuid(&fallback_entry_id("", &[Some(&created)])));
    }

    #[test]
    fn test_no_date_falls_back_to_uuid() {
        let id = fallback_entry_id("https://example.com/ep/1", &[None, None]);
        assert!(is_urn_uuid(&id), "unexpected id {id}");
    }

    #[test]
    fn test_random_fallback_is_fresh() {
        assert_ne!(fallback_entry_id("", &[]), fallback_entry_id("", &[]));
    }

    #[test]
    fn test_podcast_guid_known_value() {
        // Reference value computed independently with Python's uuid.uuid5.
        assert_eq!(
            podcast_guid("example.com/podcast.rss").to_string(),
            "c2ef26fb-9936-5eb0-afa3-b73dc2d1429c"
        );
        assert_eq!(
            podcast_guid("https://example.com/podcast.rss").to_string(),
            "c2ef26fb-9936-5eb0-afa3-b73dc2d1429c"
        );
    }

    #[test]
    fn test_podcast_guid_scheme_match_is_case_sensitive() {
        let upper = podcast_guid("HTTPS://example.com/podcast.rss");
        assert_eq!(upper.to_string(), "0ed07765-a2ee-56ea-992c-85acb084ce52");
        assert_ne!(upper, podcast_guid("https://example.com/podcast.rss"));
    }

    #[test]
    fn test_podcast_guid_is_version_5() {
        assert_eq!(podcast_guid("feed://feed.example.org/show").get_version_num(), 5);
        assert_eq!(
            podcast_guid("feed://feed.example.org/show//").to_string(),
            "ebd2b0e1-6982-51c3-b023-6d2c777e7c18"
        );
    }

    #[test]
    fn test_explicit_feed_id_wins() {
        let feed = Feed {
            id: "my-custom-guid".to_string(),
            feed_url: "https://example.com/podcast.rss".to_string(),
            ..Feed::default()
        };
        assert_eq!(resolve_podcast_guid(&feed), "my-custom-guid");
    }

    #[test]
    fn test_feed_url_used_without_id() {
        let feed = Feed {
            feed_url: "https://example.com/podcast.rss".to_string(),
            ..Feed::default()
        };
        assert_eq!(resolve_podcast_guid(&feed), "c2ef26fb-9936-5eb0-afa3-b73dc2d1429c");
    }
}
