//! JSON Feed 1.1 encoder.
//!
//! The tree is a set of `serde` structs serialized with 2-space indentation.
//! Extension nodes cannot keep their structure in JSON Feed, so each one with
//! text becomes a sibling key holding only that text; attributes and children
//! are dropped.

use std::collections::BTreeMap;
use std::io::Write;

use serde::Serialize;

use super::extensions::{config_flag, config_text, ConfigTable};
use super::{emitted_enclosure, rfc3339, EncodeError, Encoder};
use crate::ident::fallback_entry_id;
use crate::model::{Author, ExtensionNode, Feed, Item};
use crate::validate::Profile;

/// Value of the top-level `version` key.
pub const JSON_FEED_VERSION: &str = "https://jsonfeed.org/version/1.1";

/// Attachment sizes are clamped to this value.
const MAX_ATTACHMENT_SIZE: i64 = i32::MAX as i64;

const FEED_KEYS: &[&str] = &[
    "version",
    "title",
    "home_page_url",
    "feed_url",
    "description",
    "user_comment",
    "next_url",
    "icon",
    "favicon",
    "author",
    "authors",
    "language",
    "expired",
    "hubs",
    "items",
];

const ITEM_KEYS: &[&str] = &[
    "id",
    "url",
    "external_url",
    "title",
    "content_html",
    "content_text",
    "summary",
    "image",
    "banner_image",
    "date_published",
    "date_modified",
    "author",
    "authors",
    "tags",
    "language",
    "attachments",
];

/// JSON Feed 1.1 encoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFeed;

/// Top-level JSON Feed object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonFeedDocument {
    pub version: &'static str,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_page_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feed_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<JsonAuthor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expired: Option<bool>,
    pub items: Vec<JsonItem>,
    #[serde(flatten)]
    pub extensions: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonItem {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_published: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_modified: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<JsonAuthor>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<JsonAttachment>,
    #[serde(flatten)]
    pub extensions: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JsonAuthor {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JsonAttachment {
    pub url: String,
    pub mime_type: String,
    pub size_in_bytes: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_in_seconds: Option<u64>,
}

#[derive(Debug, Default)]
struct FeedSettings {
    icon: Option<String>,
    favicon: Option<String>,
    next_url: Option<String>,
    user_comment: Option<String>,
    expired: Option<bool>,
}

#[derive(Debug, Default)]
struct ItemSettings {
    banner_image: Option<String>,
    content_text: Option<String>,
    tags: Vec<String>,
}

fn feed_table() -> ConfigTable<FeedSettings> {
    ConfigTable::<FeedSettings>::new()
        .on("icon", |s, n| s.icon = config_text(n))
        .on("favicon", |s, n| s.favicon = config_text(n))
        .on("next_url", |s, n| s.next_url = config_text(n))
        .on("user_comment", |s, n| s.user_comment = config_text(n))
        .on("expired", |s, n| {
            if let Some(expired) = config_flag(n) {
                s.expired = Some(expired);
            }
        })
}

fn item_table() -> ConfigTable<ItemSettings> {
    ConfigTable::<ItemSettings>::new()
        .on("banner_image", |s, n| s.banner_image = config_text(n))
        .on("content_text", |s, n| s.content_text = config_text(n))
        .on("tag", |s, n| s.tags.extend(config_text(n)))
}

impl Encoder for JsonFeed {
    type Tree = JsonFeedDocument;
    const PROFILE: Profile = Profile::Json;

    fn build(&self, feed: &Feed) -> Result<JsonFeedDocument, EncodeError> {
        tracing::debug!(title = %feed.title, items = feed.items.len(), "Encoding JSON feed");

        let mut settings = FeedSettings::default();
        let passthrough = feed_table().apply(&mut settings, &feed.extensions);

        let icon = settings
            .icon
            .or_else(|| feed.image.as_ref().map(|i| i.url.clone()).filter(|u| !u.is_empty()));

        Ok(JsonFeedDocument {
            version: JSON_FEED_VERSION,
            title: feed.title.clone(),
            home_page_url: non_empty(feed.link_href()),
            feed_url: non_empty(&feed.feed_url),
            description: non_empty(&feed.description),
            user_comment: settings.user_comment,
            next_url: settings.next_url,
            icon,
            favicon: settings.favicon,
            authors: authors(feed.author.as_ref()),
            language: non_empty(&feed.language),
            expired: settings.expired,
            items: feed.items.iter().map(build_item).collect(),
            extensions: flatten_extensions(&passthrough, FEED_KEYS),
        })
    }

    fn write<W: Write>(&self, tree: &JsonFeedDocument, sink: W) -> Result<(), EncodeError> {
        serde_json::to_writer_pretty(sink, tree)?;
        Ok(())
    }
}

fn build_item(item: &Item) -> JsonItem {
    let mut settings = ItemSettings::default();
    let passthrough = item_table().apply(&mut settings, &item.extensions);

    let id = if item.id.is_empty() {
        fallback_entry_id(item.link_href(), &[item.updated.as_ref(), item.created.as_ref()])
    } else {
        item.id.clone()
    };

    // Content wins as the HTML body; the description then becomes the summary.
    let (content_html, summary) = if item.content.is_empty() {
        (non_empty(&item.description), None)
    } else {
        (Some(item.content.clone()), non_empty(&item.description))
    };

    let mut image = None;
    let mut attachments = Vec::new();
    if let Some(enclosure) = emitted_enclosure(item) {
        if enclosure.media_type.starts_with("image/") {
            image = Some(enclosure.url.clone());
        } else {
            attachments.push(JsonAttachment {
                url: enclosure.url.clone(),
                mime_type: enclosure.media_type.clone(),
                size_in_bytes: enclosure.length.min(MAX_ATTACHMENT_SIZE),
                duration_in_seconds: (item.duration_seconds > 0).then_some(item.duration_seconds),
            });
        }
    }

    JsonItem {
        id,
        url: non_empty(item.link_href()),
        external_url: item.source.as_ref().and_then(|s| non_empty(&s.href)),
        title: non_empty(&item.title),
        content_html,
        content_text: settings.content_text,
        summary,
        image,
        banner_image: settings.banner_image,
        date_published: item.created.as_ref().map(rfc3339),
        date_modified: item.updated.as_ref().map(rfc3339),
        authors: authors(item.author.as_ref()),
        tags: settings.tags,
        attachments,
        extensions: flatten_extensions(&passthrough, ITEM_KEYS),
    }
}

/// The single canonical author as a JSON Feed 1.1 `authors` array.
fn authors(author: Option<&Author>) -> Vec<JsonAuthor> {
    let Some(author) = author else {
        return Vec::new();
    };
    let url = if !author.uri.is_empty() {
        Some(author.uri.clone())
    } else if !author.email.is_empty() {
        Some(format!("mailto:{}", author.email))
    } else {
        None
    };
    let name = non_empty(&author.name);
    if name.is_none() && url.is_none() {
        return Vec::new();
    }
    vec![JsonAuthor { name, url }]
}

/// Text of each pass-through node keyed by its name. Nodes without text are
/// skipped, as are names that would shadow a JSON Feed key.
fn flatten_extensions(nodes: &[&ExtensionNode], reserved: &[&str]) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for node in nodes {
        if node.name.is_empty() || node.text.is_empty() {
            continue;
        }
        if reserved.contains(&node.name.as_str()) {
            tracing::warn!(name = %node.name, "Skipping extension that collides with a JSON Feed key");
            continue;
        }
        if !node.attrs.is_empty() || !node.children.is_empty() {
            tracing::debug!(name = %node.name, "Dropping extension attributes and children");
        }
        out.insert(node.name.clone(), node.text.clone());
    }
    out
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_owned())
}
