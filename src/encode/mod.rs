//! Format encoders for the canonical feed model.
//!
//! Every encoder runs the same three stages:
//!
//! 1. **Merge extensions**: reserved `_config:*` nodes are consumed through a
//!    per-scope handler table, everything else is kept for pass-through
//! 2. **Project** feed and item fields onto the target's structural tree
//! 3. **Serialize** the tree: indented XML via `quick-xml`, or pretty JSON via
//!    `serde_json`
//!
//! # Architecture
//!
//! - [`rss`] - RSS 2.0 with the optional content module
//! - [`atom`] - Atom 1.0
//! - [`json`] - JSON Feed 1.1
//! - [`psp`] - PSP-1 podcast RSS (iTunes + Podcasting 2.0 namespaces)
//! - [`xml`] - the XML element tree and its writer
//!
//! Encoders never validate on their own, with two exceptions: [`Psp`]'s
//! [`Encoder::encode_to_string`] validates first, and [`Atom`] refuses feeds
//! that break the feed-level author rule. [`Encoder::encode_validated`] checks
//! any encoder's own [`Encoder::PROFILE`] before encoding.
//!
//! # Example
//!
//! ```
//! use feedsmith::encode::{Encoder, Rss};
//! use feedsmith::model::{Feed, Item};
//!
//! let mut feed = Feed::new("My Blog", "https://example.com", "Posts");
//! feed.items.push(Item::new("Hello World"));
//!
//! let xml = Rss.encode_to_string(&feed).unwrap();
//! assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?><rss version="2.0">"#));
//! ```

pub mod atom;
mod extensions;
pub mod json;
pub mod psp;
pub mod rss;
pub mod xml;

use std::io::Write;

use thiserror::Error;

use crate::model::{Enclosure, Feed, Item, Timestamp};
use crate::validate::{validate, Profile, ValidationError};

pub use atom::{Atom, ATOM_NAMESPACE};
pub use json::{JsonFeed, JSON_FEED_VERSION};
pub use psp::{Psp, ITUNES_NAMESPACE, PODCAST_NAMESPACE};
pub use rss::{Rss, CONTENT_NAMESPACE};

/// CDATA wrapping is on unless a `_config:cdata` node turns it off.
pub const DEFAULT_CDATA: bool = true;

/// Errors that abort an encode call. No partial document is returned.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The feed breaks a rule the encoder enforces itself.
    #[error("feed is not valid: {0}")]
    Invalid(#[from] ValidationError),

    /// XML serialization failed.
    #[error("XML serialization failed: {0}")]
    Xml(#[from] quick_xml::Error),

    /// JSON serialization failed.
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing to the sink failed.
    #[error("failed to write feed document: {0}")]
    Io(#[from] std::io::Error),

    /// Output could not be turned into a `String`.
    #[error("encoded feed is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Produces one target format's structural tree from the canonical model and
/// serializes it.
///
/// Implemented once per format; each implementation takes the feed as a
/// parameter and keeps its field mapping to itself.
pub trait Encoder {
    /// Format-specific document tree.
    type Tree;

    /// The validation profile matching this format.
    const PROFILE: Profile;

    /// Maps the feed onto the target's tree. Never mutates the feed.
    fn build(&self, feed: &Feed) -> Result<Self::Tree, EncodeError>;

    /// Serializes a tree built by [`Encoder::build`].
    fn write<W: Write>(&self, tree: &Self::Tree, sink: W) -> Result<(), EncodeError>;

    fn encode<W: Write>(&self, feed: &Feed, sink: W) -> Result<(), EncodeError> {
        let tree = self.build(feed)?;
        self.write(&tree, sink)
    }

    /// Checks the feed against [`Encoder::PROFILE`], then encodes it.
    fn encode_validated<W: Write>(&self, feed: &Feed, sink: W) -> Result<(), EncodeError> {
        validate(feed, Self::PROFILE)?;
        self.encode(feed, sink)
    }

    fn encode_to_string(&self, feed: &Feed) -> Result<String, EncodeError> {
        let mut buf = Vec::new();
        self.encode(feed, &mut buf)?;
        Ok(String::from_utf8(buf)?)
    }
}

pub fn to_rss_string(feed: &Feed) -> Result<String, EncodeError> {
    Rss.encode_to_string(feed)
}

pub fn to_atom_string(feed: &Feed) -> Result<String, EncodeError> {
    Atom.encode_to_string(feed)
}

pub fn to_json_string(feed: &Feed) -> Result<String, EncodeError> {
    JsonFeed.encode_to_string(feed)
}

/// Validates against PSP-1 and encodes only when the feed passes.
pub fn to_psp_string(feed: &Feed) -> Result<String, EncodeError> {
    Psp.encode_to_string(feed)
}

/// Encodes with the encoder matching `profile` into `sink`.
pub fn encode_profile<W: Write>(feed: &Feed, profile: Profile, sink: W) -> Result<(), EncodeError> {
    match profile {
        Profile::Rss => encode_with(&Rss, feed, sink),
        Profile::Atom => encode_with(&Atom, feed, sink),
        Profile::Json => encode_with(&JsonFeed, feed, sink),
        Profile::Psp => encode_with(&Psp, feed, sink),
    }
}

fn encode_with<E: Encoder, W: Write>(encoder: &E, feed: &Feed, sink: W) -> Result<(), EncodeError> {
    tracing::debug!(format = %E::PROFILE, items = feed.items.len(), "Encoding feed");
    encoder.encode(feed, sink)
}

/// RFC 1123 with a numeric zone, e.g. `Sat, 03 Feb 2024 10:00:00 +0100`.
pub(crate) fn rfc1123z(ts: &Timestamp) -> String {
    ts.format("%a, %d %b %Y %H:%M:%S %z").to_string()
}

/// RFC 3339 with whole seconds and `Z` for UTC.
pub(crate) fn rfc3339(ts: &Timestamp) -> String {
    ts.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

/// The item's enclosure when it can be emitted; logs the ones dropped.
pub(crate) fn emitted_enclosure(item: &Item) -> Option<&Enclosure> {
    match &item.enclosure {
        Some(enclosure) if enclosure.is_complete() => Some(enclosure),
        Some(enclosure) => {
            tracing::debug!(
                url = %enclosure.url,
                media_type = %enclosure.media_type,
                length = enclosure.length,
                "Dropping incomplete enclosure"
            );
            None
        }
        None => None,
    }
}
