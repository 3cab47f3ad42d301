//! Atom 1.0 encoder.

use std::io::Write;

use super::extensions::{
    append_extensions, config_text, declare_namespaces, ConfigTable, HasXmlScope, XmlScope,
};
use super::xml::{write_document, XmlElement};
use super::{emitted_enclosure, rfc3339, EncodeError, Encoder, DEFAULT_CDATA};
use crate::ident::fallback_entry_id;
use crate::model::{Author, Category, Feed, Item, Link};
use crate::validate::{check_atom_authors, Profile};

/// Default namespace of every Atom document.
pub const ATOM_NAMESPACE: &str = "http://www.w3.org/2005/Atom";

/// Atom 1.0 encoder.
///
/// Refuses feeds without a feed-level author when some entry lacks one,
/// because such a document cannot be valid Atom.
#[derive(Debug, Clone, Copy, Default)]
pub struct Atom;

#[derive(Debug, Default)]
struct FeedSettings {
    scope: XmlScope,
    icon: Option<String>,
    logo: Option<String>,
}

impl HasXmlScope for FeedSettings {
    fn xml_scope(&mut self) -> &mut XmlScope {
        &mut self.scope
    }
}

#[derive(Debug, Default)]
struct EntrySettings {
    scope: XmlScope,
    categories: Vec<String>,
}

impl HasXmlScope for EntrySettings {
    fn xml_scope(&mut self) -> &mut XmlScope {
        &mut self.scope
    }
}

fn feed_table() -> ConfigTable<FeedSettings> {
    ConfigTable::<FeedSettings>::new()
        .with_cdata()
        .with_namespaces()
        .on("icon", |s, n| s.icon = config_text(n))
        .on("logo", |s, n| s.logo = config_text(n))
}

fn entry_table() -> ConfigTable<EntrySettings> {
    ConfigTable::<EntrySettings>::new()
        .with_cdata()
        .on("category", |s, n| s.categories.extend(config_text(n)))
}

impl Encoder for Atom {
    type Tree = XmlElement;
    const PROFILE: Profile = Profile::Atom;

    fn build(&self, feed: &Feed) -> Result<XmlElement, EncodeError> {
        check_atom_authors(feed)?;
        tracing::debug!(title = %feed.title, entries = feed.items.len(), "Encoding Atom feed");

        let mut settings = FeedSettings::default();
        let passthrough = feed_table().apply(&mut settings, &feed.extensions);
        let cdata = settings.scope.cdata.unwrap_or(DEFAULT_CDATA);

        let mut root = XmlElement::new("feed").with_attr("xmlns", ATOM_NAMESPACE);
        if !feed.language.is_empty() {
            root.push_attr("xml:lang", feed.language.as_str());
        }
        declare_namespaces(&mut root, &settings.scope.namespaces);

        root.push_required("title", &feed.title);
        let id = if feed.id.is_empty() { feed.link_href() } else { feed.id.as_str() };
        root.push_text("id", id);
        if let Some(updated) = feed.updated.as_ref().or(feed.created.as_ref()) {
            root.push_text("updated", &rfc3339(updated));
        }
        if let Some(subtitle) = html_element("subtitle", &feed.description, cdata) {
            root.push(subtitle);
        }
        if let Some(link) = &feed.link {
            if let Some(el) = link_element(link, "alternate") {
                root.push(el);
            }
        }
        if !feed.feed_url.is_empty() {
            root.push(
                XmlElement::new("link")
                    .with_attr("rel", "self")
                    .with_attr("href", feed.feed_url.as_str()),
            );
        }
        if let Some(author) = feed.author.as_ref().and_then(author_element) {
            root.push(author);
        }
        for category in feed.categories.iter().filter(|c| !c.term.is_empty()) {
            root.push(category_element(category));
        }
        root.push_text("rights", &feed.copyright);
        root.push_text("icon", settings.icon.as_deref().unwrap_or(""));
        let logo = settings
            .logo
            .as_deref()
            .or_else(|| feed.image.as_ref().map(|i| i.url.as_str()))
            .unwrap_or("");
        root.push_text("logo", logo);
        append_extensions(&mut root, &passthrough, cdata);

        for item in &feed.items {
            root.push(build_entry(item, cdata));
        }
        Ok(root)
    }

    fn write<W: Write>(&self, tree: &XmlElement, sink: W) -> Result<(), EncodeError> {
        write_document(tree, sink)
    }
}

fn build_entry(item: &Item, feed_cdata: bool) -> XmlElement {
    let mut settings = EntrySettings::default();
    let passthrough = entry_table().apply(&mut settings, &item.extensions);
    let cdata = settings.scope.cdata.unwrap_or(feed_cdata);

    let mut entry = XmlElement::new("entry");
    entry.push_required("title", &item.title);
    let id = if item.id.is_empty() {
        fallback_entry_id(item.link_href(), &[item.updated.as_ref(), item.created.as_ref()])
    } else {
        item.id.clone()
    };
    entry.push_required("id", &id);
    if let Some(updated) = item.updated.as_ref().or(item.created.as_ref()) {
        entry.push_text("updated", &rfc3339(updated));
    }
    if let Some(created) = &item.created {
        entry.push_text("published", &rfc3339(created));
    }
    if let Some(link) = &item.link {
        if let Some(el) = link_element(link, "alternate") {
            entry.push(el);
        }
    }
    if let Some(source) = &item.source {
        if let Some(el) = link_element(source, "related") {
            entry.push(el);
        }
    }
    if let Some(enclosure) = emitted_enclosure(item) {
        entry.push(
            XmlElement::new("link")
                .with_attr("rel", "enclosure")
                .with_attr("href", enclosure.url.as_str())
                .with_attr("type", enclosure.media_type.as_str())
                .with_attr("length", enclosure.length.to_string()),
        );
    }
    if let Some(author) = item.author.as_ref().and_then(author_element) {
        entry.push(author);
    }
    for term in &settings.categories {
        entry.push(XmlElement::new("category").with_attr("term", term.as_str()));
    }
    if let Some(summary) = html_element("summary", &item.description, cdata) {
        entry.push(summary);
    }
    if let Some(content) = html_element("content", &item.content, cdata) {
        entry.push(content);
    }
    append_extensions(&mut entry, &passthrough, cdata);
    entry
}

/// Rich text with `type="html"`, skipped when empty.
fn html_element(name: &str, value: &str, cdata: bool) -> Option<XmlElement> {
    super::xml::rich_element(name, value, cdata).map(|mut el| {
        el.attrs.insert(0, ("type".to_string(), "html".to_string()));
        el
    })
}

/// `<link>` with the link's own rel when set, `default_rel` otherwise.
fn link_element(link: &Link, default_rel: &str) -> Option<XmlElement> {
    if link.href.is_empty() {
        return None;
    }
    let rel = link.rel.as_deref().filter(|r| !r.is_empty()).unwrap_or(default_rel);
    let mut el = XmlElement::new("link")
        .with_attr("rel", rel)
        .with_attr("href", link.href.as_str());
    if let Some(media_type) = link.media_type.as_deref().filter(|t| !t.is_empty()) {
        el.push_attr("type", media_type);
    }
    if let Some(length) = link.length.filter(|l| *l > 0) {
        el.push_attr("length", length.to_string());
    }
    Some(el)
}

/// Atom requires a name; the email stands in when the name is blank.
fn author_element(author: &Author) -> Option<XmlElement> {
    let name = Some(author.name.trim())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| author.email.trim());
    if name.is_empty() {
        return None;
    }
    let mut el = XmlElement::new("author");
    el.push_required("name", name);
    el.push_text("email", &author.email);
    el.push_text("uri", &author.uri);
    Some(el)
}

fn category_element(category: &Category) -> XmlElement {
    let mut el = XmlElement::new("category").with_attr("term", category.term.as_str());
    if let Some(scheme) = category.scheme.as_deref().filter(|s| !s.is_empty()) {
        el.push_attr("scheme", scheme);
    }
    if let Some(label) = category.label.as_deref().filter(|l| !l.is_empty()) {
        el.push_attr("label", label);
    }
    el
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::xml::XmlNode;
    use crate::model::{Enclosure, ExtensionNode, Image};
    use crate::validate::Violation;
    use chrono::DateTime;

    fn feed() -> Feed {
        let mut feed = Feed::new("My Blog", "https://example.com", "<b>Posts</b>");
        feed.author = Some(Author::new("Jane", "jane@example.com"));
        feed.updated = Some(DateTime::parse_from_rfc3339("2024-02-03T10:00:00Z").unwrap());
        let mut item = Item::new("Hello World");
        item.link = Some(Link::new("https://example.com/posts/1"));
        item.created = Some(DateTime::parse_from_rfc3339("2024-02-01T08:00:00Z").unwrap());
        item.description = "<p>Welcome!</p>".to_string();
        feed.items.push(item);
        feed
    }

    #[test]
    fn test_root_namespace_and_feed_fields() {
        let tree = Atom.build(&feed()).unwrap();
        assert_eq!(tree.name, "feed");
        assert_eq!(tree.attr("xmlns"), Some(ATOM_NAMESPACE));
        assert_eq!(tree.child("id").unwrap().text(), "https://example.com");
        assert_eq!(tree.child("updated").unwrap().text(), "2024-02-03T10:00:00Z");
        let subtitle = tree.child("subtitle").unwrap();
        assert_eq!(subtitle.attr("type"), Some("html"));
        assert_eq!(subtitle.children[0], XmlNode::CData("<b>Posts</b>".into()));
    }

    #[test]
    fn test_entry_id_falls_back_to_tag_uri() {
        let tree = Atom.build(&feed()).unwrap();
        let entry = tree.child("entry").unwrap();
        assert_eq!(
            entry.child("id").unwrap().text(),
            "tag:example.com,2024-02-01:/posts/1"
        );
        assert_eq!(entry.child("updated").unwrap().text(), "2024-02-01T08:00:00Z");
        assert_eq!(entry.child("published").unwrap().text(), "2024-02-01T08:00:00Z");
        assert_eq!(entry.child("summary").unwrap().attr("type"), Some("html"));
    }

    #[test]
    fn test_explicit_entry_id_kept() {
        let mut feed = feed();
        feed.items[0].id = "urn:post:1".into();
        let tree = Atom.build(&feed).unwrap();
        assert_eq!(tree.child("entry").unwrap().child("id").unwrap().text(), "urn:post:1");
    }

    #[test]
    fn test_author_invariant_enforced() {
        let mut feed = feed();
        feed.author = None;
        match Atom.build(&feed) {
            Err(EncodeError::Invalid(err)) => assert_eq!(err.violation, Violation::AuthorRequired),
            other => panic!("expected author error, got {other:?}"),
        }

        feed.items[0].author = Some(Author::new("Bob", ""));
        let tree = Atom.build(&feed).unwrap();
        let author = tree.child("entry").unwrap().child("author").unwrap();
        assert_eq!(author.child("name").unwrap().text(), "Bob");
        assert!(tree.child("author").is_none());
    }

    #[test]
    fn test_blank_author_name_falls_back_to_email() {
        let mut feed = feed();
        feed.author = Some(Author::new("  ", "jane@example.com"));
        feed.items[0].author = Some(Author::new(" Bob ", ""));
        let tree = Atom.build(&feed).unwrap();

        let author = tree.child("author").unwrap();
        assert_eq!(author.child("name").unwrap().text(), "jane@example.com");
        assert_eq!(author.child("email").unwrap().text(), "jane@example.com");
        let entry_author = tree.child("entry").unwrap().child("author").unwrap();
        assert_eq!(entry_author.child("name").unwrap().text(), "Bob");

        feed.author = Some(Author::new(" ", " "));
        let tree = Atom.build(&feed).unwrap();
        assert!(tree.child("author").is_none());
    }

    #[test]
    fn test_links_self_related_and_enclosure() {
        let mut feed = feed();
        feed.feed_url = "https://example.com/atom.xml".into();
        feed.items[0].source = Some(Link::new("https://mirror.example.com/1"));
        feed.items[0].enclosure = Some(Enclosure::new("https://e.com/a.mp3", "audio/mpeg", 1200));
        let tree = Atom.build(&feed).unwrap();

        let rels: Vec<_> = tree.children_named("link").filter_map(|l| l.attr("rel")).collect();
        assert_eq!(rels, ["alternate", "self"]);
        let entry = tree.child("entry").unwrap();
        let rels: Vec<_> = entry.children_named("link").filter_map(|l| l.attr("rel")).collect();
        assert_eq!(rels, ["alternate", "related", "enclosure"]);
    }

    #[test]
    fn test_icon_and_logo() {
        let mut feed = feed();
        feed.image = Some(Image {
            url: "https://example.com/logo.png".into(),
            ..Image::default()
        });
        feed.extensions.push(ExtensionNode::config("icon", "https://example.com/favicon.ico"));
        let tree = Atom.build(&feed).unwrap();
        assert_eq!(tree.child("icon").unwrap().text(), "https://example.com/favicon.ico");
        assert_eq!(tree.child("logo").unwrap().text(), "https://example.com/logo.png");
    }

    #[test]
    fn test_entry_cdata_override() {
        let mut feed = feed();
        feed.items[0].extensions.push(ExtensionNode::config("cdata", "false"));
        let tree = Atom.build(&feed).unwrap();
        let summary = tree.child("entry").unwrap().child("summary").unwrap();
        assert_eq!(summary.children[0], XmlNode::Text("<p>Welcome!</p>".into()));
        // Feed scope keeps the default.
        assert!(matches!(tree.child("subtitle").unwrap().children[0], XmlNode::CData(_)));
    }

    #[test]
    fn test_entry_category_config() {
        let mut feed = feed();
        feed.items[0].extensions.push(ExtensionNode::config("category", "rust"));
        let tree = Atom.build(&feed).unwrap();
        let category = tree.child("entry").unwrap().child("category").unwrap();
        assert_eq!(category.attr("term"), Some("rust"));
    }
}
