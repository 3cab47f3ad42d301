//! PSP-1 podcast RSS encoder.
//!
//! An RSS 2.0 document carrying the iTunes and Podcasting 2.0 namespaces. The
//! channel always advertises its own URL through `atom:link rel="self"` and a
//! `podcast:guid`.
//!
//! # Content namespace
//!
//! `xmlns:content` is declared when an item has content, or when its
//! description looks like HTML (contains both `<` and `>`). The second test is
//! a substring check and also fires on plain text such as `a <b> c`.

use std::collections::BTreeMap;
use std::io::Write;

use super::atom::ATOM_NAMESPACE;
use super::extensions::{
    append_extensions, config_flag, config_text, declare_namespaces, ConfigTable, HasXmlScope,
    XmlScope,
};
use super::rss::CONTENT_NAMESPACE;
use super::xml::{write_document, XmlElement};
use super::{emitted_enclosure, rfc1123z, EncodeError, Encoder, DEFAULT_CDATA};
use crate::ident::{fallback_entry_id, resolve_podcast_guid};
use crate::model::{ExtensionNode, Feed, Item};
use crate::validate::{validate, Profile};

pub const ITUNES_NAMESPACE: &str = "http://www.itunes.com/dtds/podcast-1.0.dtd";
pub const PODCAST_NAMESPACE: &str = "https://podcastindex.org/namespace/1.0";

/// PSP-1 encoder.
///
/// [`Encoder::encode_to_string`] validates the feed first and fails without
/// output when it does not conform; [`Encoder::encode`] does not.
#[derive(Debug, Clone, Copy, Default)]
pub struct Psp;

#[derive(Debug, Default)]
struct ChannelSettings {
    scope: XmlScope,
    explicit: Option<bool>,
    image: Option<String>,
    show_type: Option<String>,
    complete: bool,
    block: bool,
    locked: Option<bool>,
    owner: Option<(String, String)>,
    funding: Vec<(String, String)>,
}

impl HasXmlScope for ChannelSettings {
    fn xml_scope(&mut self) -> &mut XmlScope {
        &mut self.scope
    }
}

#[derive(Debug, Default)]
struct ItemSettings {
    scope: XmlScope,
    explicit: Option<bool>,
    image: Option<String>,
    episode: Option<String>,
    season: Option<String>,
    episode_type: Option<String>,
    transcripts: Vec<BTreeMap<String, String>>,
}

impl HasXmlScope for ItemSettings {
    fn xml_scope(&mut self) -> &mut XmlScope {
        &mut self.scope
    }
}

fn channel_table() -> ConfigTable<ChannelSettings> {
    ConfigTable::<ChannelSettings>::new()
        .with_cdata()
        .with_namespaces()
        .on("explicit", |s, n| {
            if let Some(explicit) = config_flag(n) {
                s.explicit = Some(explicit);
            }
        })
        .on("image", |s, n| s.image = config_text(n))
        .on("type", |s, n| s.show_type = config_text(n))
        .on("complete", |s, n| s.complete = config_flag(n).unwrap_or(s.complete))
        .on("block", |s, n| s.block = config_flag(n).unwrap_or(s.block))
        .on("locked", |s, n| {
            if let Some(locked) = config_flag(n) {
                s.locked = Some(locked);
            }
        })
        .on("owner", |s, n| {
            let name = n.attr("name").unwrap_or_default();
            let email = n.attr("email").unwrap_or_default();
            if name.is_empty() && email.is_empty() {
                tracing::warn!("Owner node needs a name or email attribute");
            } else {
                s.owner = Some((name.to_owned(), email.to_owned()));
            }
        })
        .on("funding", |s, n| match n.attr("url").filter(|u| !u.is_empty()) {
            Some(url) => s.funding.push((url.to_owned(), n.text.trim().to_owned())),
            None => tracing::warn!("Funding node needs a url attribute"),
        })
}

fn item_table() -> ConfigTable<ItemSettings> {
    ConfigTable::<ItemSettings>::new()
        .with_cdata()
        .on("explicit", |s, n| {
            if let Some(explicit) = config_flag(n) {
                s.explicit = Some(explicit);
            }
        })
        .on("image", |s, n| s.image = config_text(n))
        .on("episode", |s, n| s.episode = config_text(n))
        .on("season", |s, n| s.season = config_text(n))
        .on("episode_type", |s, n| s.episode_type = config_text(n))
        .on("transcript", |s, n| {
            if n.attr("url").is_some_and(|u| !u.is_empty()) {
                s.transcripts.push(n.attrs.clone());
            } else {
                tracing::warn!("Transcript node needs a url attribute");
            }
        })
}

/// Substring heuristic for HTML in a description.
fn looks_like_html(value: &str) -> bool {
    value.contains('<') && value.contains('>')
}

fn needs_content_namespace(item: &Item) -> bool {
    !item.content.is_empty() || looks_like_html(&item.description)
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

impl Encoder for Psp {
    type Tree = XmlElement;
    const PROFILE: Profile = Profile::Psp;

    fn build(&self, feed: &Feed) -> Result<XmlElement, EncodeError> {
        tracing::debug!(title = %feed.title, episodes = feed.items.len(), "Encoding podcast feed");

        let mut settings = ChannelSettings::default();
        let passthrough = channel_table().apply(&mut settings, &feed.extensions);
        let cdata = settings.scope.cdata.unwrap_or(DEFAULT_CDATA);

        let mut channel = XmlElement::new("channel");
        channel.push_required("title", &feed.title);
        channel.push_required("link", feed.link_href());
        match super::xml::rich_element("description", &feed.description, cdata) {
            Some(description) => channel.push(description),
            None => channel.push_required("description", ""),
        }
        channel.push_text("language", &feed.language);
        channel.push_text("copyright", &feed.copyright);
        channel.push(
            XmlElement::new("atom:link")
                .with_attr("href", feed.feed_url.as_str())
                .with_attr("rel", "self")
                .with_attr("type", "application/rss+xml"),
        );
        if let Some(author) = feed.author.as_ref().filter(|a| !a.name.is_empty()) {
            channel.push_text("itunes:author", &author.name);
        }
        if let Some((name, email)) = &settings.owner {
            let mut owner = XmlElement::new("itunes:owner");
            owner.push_text("itunes:name", name);
            owner.push_text("itunes:email", email);
            channel.push(owner);
        }
        let image = settings
            .image
            .as_deref()
            .or_else(|| feed.image.as_ref().map(|i| i.url.as_str()))
            .filter(|u| !u.is_empty());
        if let Some(href) = image {
            channel.push(XmlElement::new("itunes:image").with_attr("href", href));
        }
        for category in feed.categories.iter().filter(|c| !c.term.is_empty()) {
            channel.push(XmlElement::new("itunes:category").with_attr("text", category.term.as_str()));
        }
        channel.push_required(
            "itunes:explicit",
            &settings.explicit.unwrap_or(false).to_string(),
        );
        channel.push_text("itunes:type", settings.show_type.as_deref().unwrap_or(""));
        if settings.complete {
            channel.push_required("itunes:complete", "Yes");
        }
        if settings.block {
            channel.push_required("itunes:block", "Yes");
        }
        channel.push_required("podcast:guid", &resolve_podcast_guid(feed));
        if let Some(locked) = settings.locked {
            channel.push_required("podcast:locked", yes_no(locked));
        }
        for (url, text) in &settings.funding {
            channel.push(
                XmlElement::new("podcast:funding")
                    .with_attr("url", url.as_str())
                    .with_text(text.as_str()),
            );
        }
        if let Some(created) = &feed.created {
            channel.push_text("pubDate", &rfc1123z(created));
        }
        if let Some(updated) = &feed.updated {
            channel.push_text("lastBuildDate", &rfc1123z(updated));
        }
        append_extensions(&mut channel, &passthrough, cdata);

        for item in &feed.items {
            channel.push(build_item(item, cdata));
        }

        let mut rss = XmlElement::new("rss")
            .with_attr("version", "2.0")
            .with_attr("xmlns:itunes", ITUNES_NAMESPACE)
            .with_attr("xmlns:podcast", PODCAST_NAMESPACE)
            .with_attr("xmlns:atom", ATOM_NAMESPACE);
        if feed.items.iter().any(needs_content_namespace) {
            rss.push_attr("xmlns:content", CONTENT_NAMESPACE);
        }
        declare_namespaces(&mut rss, &settings.scope.namespaces);
        rss.push(channel);
        Ok(rss)
    }

    fn write<W: Write>(&self, tree: &XmlElement, sink: W) -> Result<(), EncodeError> {
        write_document(tree, sink)
    }

    fn encode_to_string(&self, feed: &Feed) -> Result<String, EncodeError> {
        validate(feed, Self::PROFILE)?;
        let mut buf = Vec::new();
        self.encode(feed, &mut buf)?;
        Ok(String::from_utf8(buf)?)
    }
}

fn build_item(item: &Item, channel_cdata: bool) -> XmlElement {
    let mut settings = ItemSettings::default();
    let passthrough = item_table().apply(&mut settings, &item.extensions);
    let cdata = settings.scope.cdata.unwrap_or(channel_cdata);

    let mut el = XmlElement::new("item");
    el.push_text("title", &item.title);
    el.push_text("link", item.link_href());
    el.push_rich("description", &item.description, cdata);
    if !item.content.is_empty() {
        el.push_rich("content:encoded", &item.content, cdata);
    } else if looks_like_html(&item.description) {
        el.push_rich("content:encoded", &item.description, cdata);
    }
    if let Some(enclosure) = emitted_enclosure(item) {
        el.push(
            XmlElement::new("enclosure")
                .with_attr("url", enclosure.url.as_str())
                .with_attr("length", enclosure.length.to_string())
                .with_attr("type", enclosure.media_type.as_str()),
        );
    }
    el.push(guid_element(item));
    if let Some(date) = item.created.as_ref().or(item.updated.as_ref()) {
        el.push_text("pubDate", &rfc1123z(date));
    }
    if let Some(author) = item.author.as_ref().filter(|a| !a.name.is_empty()) {
        el.push_text("itunes:author", &author.name);
    }
    if item.duration_seconds > 0 {
        el.push_text("itunes:duration", &item.duration_seconds.to_string());
    }
    if let Some(explicit) = settings.explicit {
        el.push_required("itunes:explicit", &explicit.to_string());
    }
    if let Some(href) = settings.image.as_deref() {
        el.push(XmlElement::new("itunes:image").with_attr("href", href));
    }
    el.push_text("itunes:episode", settings.episode.as_deref().unwrap_or(""));
    el.push_text("itunes:season", settings.season.as_deref().unwrap_or(""));
    el.push_text("itunes:episodeType", settings.episode_type.as_deref().unwrap_or(""));
    for attrs in &settings.transcripts {
        let node = ExtensionNode {
            name: "podcast:transcript".to_string(),
            attrs: attrs.clone(),
            ..ExtensionNode::default()
        };
        if let Some(transcript) = super::extensions::extension_element(&node, cdata) {
            el.push(transcript);
        }
    }
    append_extensions(&mut el, &passthrough, cdata);
    el
}

/// The item's own GUID, or a generated one marked as not a permalink.
fn guid_element(item: &Item) -> XmlElement {
    let mut guid = XmlElement::new("guid");
    if item.id.is_empty() {
        let generated = fallback_entry_id(item.link_href(), &[item.created.as_ref(), item.updated.as_ref()]);
        guid.push_attr("isPermaLink", "false");
        return guid.with_text(generated);
    }
    if let Some(permalink) = item.is_permalink {
        guid.push_attr("isPermaLink", permalink.to_string());
    }
    guid.with_text(item.id.as_str())
}
