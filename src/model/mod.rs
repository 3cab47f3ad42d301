//! Canonical, format-agnostic feed model.
//!
//! Every encoder reads from these types and nothing else. The model carries no
//! format-specific knobs: anything a target format needs beyond the fields below
//! travels as an [`ExtensionNode`], either as a pass-through element or as a
//! reserved `_config:*` node that an encoder consumes.
//!
//! Plain text fields use the empty string for "absent", timestamps use `None`.
//! Encoders never mutate a [`Feed`]; derived values such as generated ids live
//! only in the per-call output tree.

mod extension;

pub use extension::{ExtensionNode, CONFIG_PREFIX};

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Timestamp type used throughout the model. The offset is preserved so RSS
/// dates render with the caller's numeric zone.
pub type Timestamp = DateTime<FixedOffset>;

/// A syndication feed: channel metadata plus an ordered list of items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Feed {
    pub title: String,
    /// Primary (alternate) link to the site the feed describes.
    pub link: Option<Link>,
    pub description: String,
    pub author: Option<Author>,
    pub updated: Option<Timestamp>,
    pub created: Option<Timestamp>,
    /// Stable feed identifier. Used as the Atom id and, when non-empty, as the
    /// podcast GUID verbatim.
    pub id: String,
    /// Output order always mirrors this order.
    pub items: Vec<Item>,
    pub copyright: String,
    pub image: Option<Image>,
    pub language: String,
    /// The first non-empty category is authoritative for formats that carry one.
    pub categories: Vec<Category>,
    /// Canonical self-referencing URL of the serialized feed.
    pub feed_url: String,
    pub extensions: Vec<ExtensionNode>,
}

impl Feed {
    /// Creates a feed with the three fields every profile asks for.
    pub fn new(title: impl Into<String>, link: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: Some(Link::new(link)),
            description: description.into(),
            ..Self::default()
        }
    }

    /// Href of the primary link, or `""` when the feed has none.
    pub fn link_href(&self) -> &str {
        self.link.as_ref().map(|l| l.href.as_str()).unwrap_or("")
    }

    /// First category with a non-empty term.
    pub fn primary_category(&self) -> Option<&Category> {
        self.categories.iter().find(|c| !c.term.is_empty())
    }
}

/// One entry of a feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Item {
    pub title: String,
    pub link: Option<Link>,
    /// A related or mirror link, distinct from the primary link.
    pub source: Option<Link>,
    pub author: Option<Author>,
    /// Summary role; may hold HTML.
    pub description: String,
    /// Opaque identifier: RSS/PSP guid, Atom id, JSON Feed id.
    pub id: String,
    /// RSS/PSP `isPermaLink`. `None` leaves the attribute off.
    pub is_permalink: Option<bool>,
    pub updated: Option<Timestamp>,
    pub created: Option<Timestamp>,
    pub enclosure: Option<Enclosure>,
    /// Full HTML body, distinct from the summary in `description`.
    pub content: String,
    pub duration_seconds: u64,
    pub extensions: Vec<ExtensionNode>,
}

impl Item {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn link_href(&self) -> &str {
        self.link.as_ref().map(|l| l.href.as_str()).unwrap_or("")
    }

    /// The enclosure, but only when it is complete enough to emit.
    pub fn complete_enclosure(&self) -> Option<&Enclosure> {
        self.enclosure.as_ref().filter(|e| e.is_complete())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Link {
    pub href: String,
    pub rel: Option<String>,
    pub media_type: Option<String>,
    pub length: Option<u64>,
}

impl Link {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Author {
    pub name: String,
    pub email: String,
    pub uri: String,
}

impl Author {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            uri: String::new(),
        }
    }

    /// RSS rendering: `email (Name)` when both are set, the bare email when only
    /// the email is, `None` without an email.
    pub fn rss_string(&self) -> Option<String> {
        match (self.email.is_empty(), self.name.is_empty()) {
            (true, _) => None,
            (false, true) => Some(self.email.clone()),
            (false, false) => Some(format!("{} ({})", self.email, self.name)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Category {
    pub term: String,
    /// RSS `domain`, Atom `scheme`.
    pub scheme: Option<String>,
    pub label: Option<String>,
}

impl Category {
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Image {
    pub url: String,
    pub title: String,
    pub link: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// A single media resource attached to an item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Enclosure {
    pub url: String,
    pub media_type: String,
    /// Size in bytes. Only strictly positive values make the enclosure complete.
    pub length: i64,
}

impl Enclosure {
    pub fn new(url: impl Into<String>, media_type: impl Into<String>, length: i64) -> Self {
        Self {
            url: url.into(),
            media_type: media_type.into(),
            length,
        }
    }

    /// Url, type and a positive length are all present. Incomplete enclosures
    /// are left out of every encoding.
    pub fn is_complete(&self) -> bool {
        !self.url.is_empty() && !self.media_type.is_empty() && self.length > 0
    }
}
