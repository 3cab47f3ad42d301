//! RSS 2.0 encoder.
//!
//! Dates use RFC 1123 with a numeric zone. Authors render as `email (Name)`.
//! The content module namespace is declared only when some item carries a
//! `content:encoded` body.

use std::io::Write;

use super::extensions::{
    append_extensions, config_text, declare_namespaces, ConfigTable, HasXmlScope, XmlScope,
};
use super::xml::{write_document, XmlElement};
use super::{emitted_enclosure, rfc1123z, EncodeError, Encoder, DEFAULT_CDATA};
use crate::model::{Author, Feed, Image, Item};
use crate::validate::Profile;

/// RSS content module, used for `content:encoded`.
pub const CONTENT_NAMESPACE: &str = "http://purl.org/rss/1.0/modules/content/";

/// RSS 2.0 encoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rss;

#[derive(Debug, Default)]
struct ChannelSettings {
    scope: XmlScope,
    category: Option<String>,
    ttl: Option<String>,
    generator: Option<String>,
    docs: Option<String>,
    webmaster: Option<String>,
    rating: Option<String>,
}

impl HasXmlScope for ChannelSettings {
    fn xml_scope(&mut self) -> &mut XmlScope {
        &mut self.scope
    }
}

#[derive(Debug, Default)]
struct ItemSettings {
    scope: XmlScope,
    categories: Vec<String>,
    comments: Option<String>,
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
        .on("category", |s, n| s.category = config_text(n))
        .on("ttl", |s, n| s.ttl = config_text(n))
        .on("generator", |s, n| s.generator = config_text(n))
        .on("docs", |s, n| s.docs = config_text(n))
        .on("webmaster", |s, n| s.webmaster = config_text(n))
        .on("rating", |s, n| s.rating = config_text(n))
}

fn item_table() -> ConfigTable<ItemSettings> {
    ConfigTable::<ItemSettings>::new()
        .with_cdata()
        .on("category", |s, n| s.categories.extend(config_text(n)))
        .on("comments", |s, n| s.comments = config_text(n))
}

impl Encoder for Rss {
    type Tree = XmlElement;
    const PROFILE: Profile = Profile::Rss;

    fn build(&self, feed: &Feed) -> Result<XmlElement, EncodeError> {
        tracing::debug!(title = %feed.title, items = feed.items.len(), "Encoding RSS feed");

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
        if let Some(editor) = feed.author.as_ref().and_then(Author::rss_string) {
            channel.push_text("managingEditor", &editor);
        }
        channel.push_text("webMaster", settings.webmaster.as_deref().unwrap_or(""));
        if let Some(created) = &feed.created {
            channel.push_text("pubDate", &rfc1123z(created));
        }
        if let Some(updated) = &feed.updated {
            channel.push_text("lastBuildDate", &rfc1123z(updated));
        }
        if let Some(category) = settings.category.as_deref() {
            channel.push_text("category", category);
        } else if let Some(category) = feed.primary_category() {
            let mut el = XmlElement::new("category");
            if let Some(domain) = category.scheme.as_deref().filter(|d| !d.is_empty()) {
                el.push_attr("domain", domain);
            }
            channel.push(el.with_text(category.term.as_str()));
        }
        channel.push_text("generator", settings.generator.as_deref().unwrap_or(""));
        channel.push_text("docs", settings.docs.as_deref().unwrap_or(""));
        channel.push_text("ttl", settings.ttl.as_deref().unwrap_or(""));
        channel.push_text("rating", settings.rating.as_deref().unwrap_or(""));
        if let Some(image) = &feed.image {
            if let Some(el) = image_element(image, feed) {
                channel.push(el);
            }
        }
        append_extensions(&mut channel, &passthrough, cdata);

        let mut uses_content = false;
        for item in &feed.items {
            let (el, has_content) = build_item(item, cdata);
            uses_content |= has_content;
            channel.push(el);
        }

        let mut rss = XmlElement::new("rss").with_attr("version", "2.0");
        if uses_content {
            rss.push_attr("xmlns:content", CONTENT_NAMESPACE);
        }
        declare_namespaces(&mut rss, &settings.scope.namespaces);
        rss.push(channel);
        Ok(rss)
    }

    fn write<W: Write>(&self, tree: &XmlElement, sink: W) -> Result<(), EncodeError> {
        write_document(tree, sink)
    }
}

/// RSS requires url, title and link on `<image>`; title and link fall back to
/// the channel's.
fn image_element(image: &Image, feed: &Feed) -> Option<XmlElement> {
    if image.url.is_empty() {
        return None;
    }
    let title = if image.title.is_empty() { &feed.title } else { &image.title };
    let link = if image.link.is_empty() { feed.link_href() } else { image.link.as_str() };

    let mut el = XmlElement::new("image");
    el.push_required("url", &image.url);
    el.push_required("title", title);
    el.push_required("link", link);
    if let Some(width) = image.width {
        el.push_text("width", &width.to_string());
    }
    if let Some(height) = image.height {
        el.push_text("height", &height.to_string());
    }
    Some(el)
}

/// Builds one `<item>`; the flag reports whether it emitted `content:encoded`.
fn build_item(item: &Item, channel_cdata: bool) -> (XmlElement, bool) {
    let mut settings = ItemSettings::default();
    let passthrough = item_table().apply(&mut settings, &item.extensions);
    let cdata = settings.scope.cdata.unwrap_or(channel_cdata);

    let mut el = XmlElement::new("item");
    el.push_text("title", &item.title);
    el.push_text("link", item.link_href());
    el.push_rich("description", &item.description, cdata);
    let has_content = !item.content.is_empty();
    el.push_rich("content:encoded", &item.content, cdata);
    if let Some(author) = item.author.as_ref().and_then(Author::rss_string) {
        el.push_text("author", &author);
    }
    for category in &settings.categories {
        el.push_text("category", category);
    }
    el.push_text("comments", settings.comments.as_deref().unwrap_or(""));
    if let Some(enclosure) = emitted_enclosure(item) {
        el.push(
            XmlElement::new("enclosure")
                .with_attr("url", enclosure.url.as_str())
                .with_attr("length", enclosure.length.to_string())
                .with_attr("type", enclosure.media_type.as_str()),
        );
    }
    if !item.id.is_empty() {
        let mut guid = XmlElement::new("guid");
        if let Some(permalink) = item.is_permalink {
            guid.push_attr("isPermaLink", permalink.to_string());
        }
        el.push(guid.with_text(item.id.as_str()));
    }
    if let Some(date) = item.created.as_ref().or(item.updated.as_ref()) {
        el.push_text("pubDate", &rfc1123z(date));
    }
    if let Some(source) = item.source.as_ref().filter(|s| !s.href.is_empty()) {
        el.push(
            XmlElement::new("source")
                .with_attr("url", source.href.as_str())
                .with_text(source.href.as_str()),
        );
    }
    append_extensions(&mut el, &passthrough, cdata);
    (el, has_content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, Enclosure, ExtensionNode, Link};
    use chrono::DateTime;

    fn feed() -> Feed {
        let mut feed = Feed::new("My Blog", "https://example.com", "Posts");
        let mut item = Item::new("Hello World");
        item.description = "<p>Welcome!</p>".to_string();
        feed.items.push(item);
        feed
    }

    fn channel(tree: &XmlElement) -> &XmlElement {
        tree.child("channel").unwrap()
    }

    #[test]
    fn test_channel_basics() {
        let tree = Rss.build(&feed()).unwrap();
        assert_eq!(tree.attr("version"), Some("2.0"));
        let channel = channel(&tree);
        assert_eq!(channel.child("title").unwrap().text(), "My Blog");
        assert_eq!(channel.child("link").unwrap().text(), "https://example.com");
        assert_eq!(channel.children_named("item").count(), 1);
    }

    #[test]
    fn test_content_namespace_only_with_content() {
        let tree = Rss.build(&feed()).unwrap();
        assert_eq!(tree.attr("xmlns:content"), None);

        let mut with_content = feed();
        with_content.items[0].content = "<p>Body</p>".to_string();
        let tree = Rss.build(&with_content).unwrap();
        assert_eq!(tree.attr("xmlns:content"), Some(CONTENT_NAMESPACE));
        let item = channel(&tree).child("item").unwrap();
        assert_eq!(item.child("content:encoded").unwrap().text(), "<p>Body</p>");
    }

    #[test]
    fn test_dates_and_authors() {
        let mut feed = feed();
        feed.created = Some(DateTime::parse_from_rfc3339("2024-02-03T10:00:00+01:00").unwrap());
        feed.author = Some(Author::new("Jane", "jane@example.com"));
        feed.items[0].updated = Some(DateTime::parse_from_rfc3339("2024-02-04T08:30:00Z").unwrap());
        feed.items[0].author = Some(Author::new("", "bob@example.com"));

        let tree = Rss.build(&feed).unwrap();
        let channel = channel(&tree);
        assert_eq!(channel.child("pubDate").unwrap().text(), "Sat, 03 Feb 2024 10:00:00 +0100");
        assert_eq!(channel.child("managingEditor").unwrap().text(), "jane@example.com (Jane)");
        let item = channel.child("item").unwrap();
        assert_eq!(item.child("pubDate").unwrap().text(), "Sun, 04 Feb 2024 08:30:00 +0000");
        assert_eq!(item.child("author").unwrap().text(), "bob@example.com");
    }

    #[test]
    fn test_category_from_first_non_empty_or_override() {
        let mut feed = feed();
        feed.categories = vec![
            Category::new(""),
            Category {
                term: "Tech".into(),
                scheme: Some("https://e.com/cats".into()),
                label: None,
            },
        ];
        let tree = Rss.build(&feed).unwrap();
        let category = channel(&tree).child("category").unwrap();
        assert_eq!(category.text(), "Tech");
        assert_eq!(category.attr("domain"), Some("https://e.com/cats"));

        feed.extensions.push(ExtensionNode::config("category", "Override"));
        let tree = Rss.build(&feed).unwrap();
        assert_eq!(channel(&tree).children_named("category").count(), 1);
        assert_eq!(channel(&tree).child("category").unwrap().text(), "Override");
    }

    #[test]
    fn test_incomplete_enclosure_omitted() {
        let mut feed = feed();
        feed.items[0].enclosure = Some(Enclosure::new("https://e.com/a.mp3", "", 100));
        let tree = Rss.build(&feed).unwrap();
        assert!(channel(&tree).child("item").unwrap().child("enclosure").is_none());

        feed.items[0].enclosure = Some(Enclosure::new("https://e.com/a.mp3", "audio/mpeg", 100));
        let tree = Rss.build(&feed).unwrap();
        let enclosure = channel(&tree).child("item").unwrap().child("enclosure").unwrap();
        assert_eq!(enclosure.attr("length"), Some("100"));
        assert_eq!(enclosure.attr("type"), Some("audio/mpeg"));
    }

    #[test]
    fn test_guid_permalink_tristate() {
        let mut feed = feed();
        let tree = Rss.build(&feed).unwrap();
        assert!(channel(&tree).child("item").unwrap().child("guid").is_none());

        feed.items[0].id = "post-1".to_string();
        let tree = Rss.build(&feed).unwrap();
        let guid = channel(&tree).child("item").unwrap().child("guid").unwrap().clone();
        assert_eq!(guid.text(), "post-1");
        assert_eq!(guid.attr("isPermaLink"), None);

        feed.items[0].is_permalink = Some(false);
        let tree = Rss.build(&feed).unwrap();
        let guid = channel(&tree).child("item").unwrap().child("guid").unwrap().clone();
        assert_eq!(guid.attr("isPermaLink"), Some("false"));
    }

    #[test]
    fn test_item_config_and_passthrough() {
        let mut feed = feed();
        feed.items[0].source = Some(Link::new("https://mirror.example.com/1"));
        feed.items[0].extensions = vec![
            ExtensionNode::config("comments", "https://example.com/1#comments"),
            ExtensionNode::config("category", "Rust"),
            ExtensionNode::new("dc:creator").with_text("Jane"),
        ];
        feed.extensions.push(
            ExtensionNode::config("namespace", "http://purl.org/dc/elements/1.1/").with_attr("prefix", "dc"),
        );
        let tree = Rss.build(&feed).unwrap();
        assert_eq!(tree.attr("xmlns:dc"), Some("http://purl.org/dc/elements/1.1/"));
        let item = channel(&tree).child("item").unwrap();
        assert_eq!(item.child("comments").unwrap().text(), "https://example.com/1#comments");
        assert_eq!(item.child("category").unwrap().text(), "Rust");
        assert_eq!(item.child("dc:creator").unwrap().text(), "Jane");
        assert_eq!(item.child("source").unwrap().attr("url"), Some("https://mirror.example.com/1"));
        assert!(item.children_named("_config:comments").next().is_none());
    }

    #[test]
    fn test_image_falls_back_to_channel_title_and_link() {
        let mut feed = feed();
        feed.image = Some(Image {
            url: "https://example.com/logo.png".into(),
            width: Some(144),
            ..Image::default()
        });
        let tree = Rss.build(&feed).unwrap();
        let image = channel(&tree).child("image").unwrap();
        assert_eq!(image.child("title").unwrap().text(), "My Blog");
        assert_eq!(image.child("link").unwrap().text(), "https://example.com");
        assert_eq!(image.child("width").unwrap().text(), "144");
        assert!(image.child("height").is_none());
    }

    #[test]
    fn test_build_does_not_mutate_feed() {
        let feed = feed();
        let before = feed.clone();
        Rss.build(&feed).unwrap();
        assert_eq!(feed, before);
    }
}
