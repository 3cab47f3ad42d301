//! Structural XML tree shared by the RSS, Atom and PSP encoders, and the
//! writer that turns it into indented text.

use std::io::Write;

use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesCData, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use super::EncodeError;
use crate::util::{should_wrap, strip_invalid_xml_chars, unwrap_cdata};

/// Declaration written before the root element, with no trailing newline.
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    /// Entity-escaped on output.
    Text(String),
    /// Emitted as a CDATA section.
    CData(String),
}

/// An element with ordered attributes and mixed content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push_attr(key, value);
        self
    }

    pub fn push_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attrs.push((key.into(), value.into()));
    }

    /// Adds escaped text content; empty text adds nothing.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        if !text.is_empty() {
            self.children.push(XmlNode::Text(text));
        }
        self
    }

    pub fn push(&mut self, child: XmlElement) {
        self.children.push(XmlNode::Element(child));
    }

    pub fn push_node(&mut self, node: XmlNode) {
        self.children.push(node);
    }

    /// `<name>value</name>`, skipped when `value` is empty.
    pub(crate) fn push_text(&mut self, name: &str, value: &str) {
        if !value.is_empty() {
            self.push(XmlElement::new(name).with_text(value));
        }
    }

    /// `<name>value</name>`, emitted even when `value` is empty.
    pub(crate) fn push_required(&mut self, name: &str, value: &str) {
        self.push(XmlElement::new(name).with_text(value));
    }

    /// Rich-text child following the CDATA policy, skipped when empty.
    pub(crate) fn push_rich(&mut self, name: &str, value: &str, cdata: bool) {
        if let Some(el) = rich_element(name, value, cdata) {
            self.push(el);
        }
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// First child element with the given name.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find_map(|node| match node {
            XmlNode::Element(el) if el.name == name => Some(el),
            _ => None,
        })
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children.iter().filter_map(move |node| match node {
            XmlNode::Element(el) if el.name == name => Some(el),
            _ => None,
        })
    }

    /// Concatenated text and CDATA content of this element (not descendants).
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                XmlNode::Text(t) | XmlNode::CData(t) => Some(t.as_str()),
                XmlNode::Element(_) => None,
            })
            .collect()
    }
}

/// Applies the CDATA policy to one value.
///
/// A value already wrapped in a single CDATA section is unwrapped first, so
/// re-encoding previously wrapped content never nests markers.
pub fn rich_text(value: &str, cdata: bool) -> XmlNode {
    let raw = unwrap_cdata(value);
    if should_wrap(raw, cdata) {
        XmlNode::CData(raw.to_owned())
    } else {
        XmlNode::Text(raw.to_owned())
    }
}

pub(crate) fn rich_element(name: &str, value: &str, cdata: bool) -> Option<XmlElement> {
    if value.is_empty() {
        return None;
    }
    let mut el = XmlElement::new(name);
    el.push_node(rich_text(value, cdata));
    Some(el)
}

/// Writes the declaration followed directly by the indented document.
pub fn write_document<W: Write>(root: &XmlElement, mut sink: W) -> Result<(), EncodeError> {
    sink.write_all(XML_DECLARATION.as_bytes())?;
    let mut writer = Writer::new_with_indent(sink, b' ', 2);
    write_element(&mut writer, root)
}

fn write_element<W: Write>(writer: &mut Writer<W>, el: &XmlElement) -> Result<(), EncodeError> {
    let mut start = BytesStart::new(el.name.as_str());
    for (key, value) in &el.attrs {
        let value = strip_invalid_xml_chars(value);
        start.push_attribute((key.as_str(), &*value));
    }

    if el.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    for child in &el.children {
        match child {
            XmlNode::Element(child) => write_element(writer, child)?,
            XmlNode::Text(text) => {
                let clean = strip_invalid_xml_chars(text);
                let escaped = partial_escape(&*clean);
                writer.write_event(Event::Text(BytesText::from_escaped(escaped)))?;
            }
            XmlNode::CData(text) => {
                let clean = strip_invalid_xml_chars(text);
                writer.write_event(Event::CData(BytesCData::new(clean)))?;
            }
        }
    }
    writer.write_event(Event::End(BytesEnd::new(el.name.as_str())))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn render(root: &XmlElement) -> String {
        let mut out = Vec::new();
        write_document(root, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_declaration_is_not_followed_by_newline() {
        let doc = render(&XmlElement::new("root"));
        assert_eq!(doc, r#"<?xml version="1.0" encoding="UTF-8"?><root/>"#);
    }

    #[test]
    fn test_nested_document_is_indented() {
        let mut root = XmlElement::new("rss").with_attr("version", "2.0");
        let mut channel = XmlElement::new("channel");
        channel.push_text("title", "A & B");
        root.push(channel);

        let expected = "<?xml version=\"1.0\" encoding=\"UTF-8\"?><rss version=\"2.0\">\n  <channel>\n    <title>A &amp; B</title>\n  </channel>\n</rss>";
        assert_eq!(render(&root), expected);
    }

    #[test]
    fn test_rich_text_policy() {
        assert_eq!(rich_text("<p>x</p>", true), XmlNode::CData("<p>x</p>".into()));
        assert_eq!(rich_text("<p>x</p>", false), XmlNode::Text("<p>x</p>".into()));
        assert_eq!(rich_text("plain", true), XmlNode::Text("plain".into()));
        assert_eq!(
            rich_text("<![CDATA[<p>x</p>]]>", true),
            XmlNode::CData("<p>x</p>".into())
        );
        assert_eq!(
            rich_text("<![CDATA[<p>x</p>]]>", false),
            XmlNode::Text("<p>x</p>".into())
        );
    }

    #[test]
    fn test_cdata_and_escaped_output() {
        let mut root = XmlElement::new("item");
        root.push_rich("description", "<p>Welcome!</p>", true);
        root.push_rich("summary", "<p>Welcome!</p>", false);
        let doc = render(&root);
        assert!(doc.contains("<description><![CDATA[<p>Welcome!</p>]]></description>"));
        assert!(doc.contains("<summary>&lt;p&gt;Welcome!&lt;/p&gt;</summary>"));
    }

    #[test]
    fn test_attribute_values_are_escaped() {
        let root = XmlElement::new("link").with_attr("href", "https://e.com/?a=1&b=\"2\"");
        let doc = render(&root);
        assert!(doc.contains(r#"href="https://e.com/?a=1&amp;b=&quot;2&quot;""#), "{doc}");
    }

    #[test]
    fn test_forbidden_chars_are_stripped() {
        let root = XmlElement::new("title")
            .with_attr("note", "a\x01b")
            .with_text("bad\x0bchar");
        let doc = render(&root);
        assert!(doc.contains(r#"note="ab""#));
        assert!(doc.contains(">badchar<"));
    }

    #[test]
    fn test_push_required_emits_empty_element() {
        let mut root = XmlElement::new("channel");
        root.push_required("description", "");
        root.push_text("language", "");
        assert!(root.child("description").is_some());
        assert!(root.child("language").is_none());
    }

    #[test]
    fn test_lookup_helpers() {
        let mut root = XmlElement::new("feed");
        root.push(XmlElement::new("link").with_attr("rel", "self"));
        root.push(XmlElement::new("link").with_attr("rel", "alternate"));
        root.push(XmlElement::new("title").with_text("T"));
        assert_eq!(root.children_named("link").count(), 2);
        assert_eq!(root.child("link").and_then(|l| l.attr("rel")), Some("self"));
        assert_eq!(root.child("title").map(XmlElement::text).as_deref(), Some("T"));
    }

    #[test]
    fn test_child_lookup_outlives_name() {
        let mut root = XmlElement::new("channel");
        root.push(XmlElement::new("title").with_text("T"));
        let found = {
            let name = String::from("title");
            root.child(&name)
        };
        assert_eq!(found.map(XmlElement::text).as_deref(), Some("T"));
    }

    #[test]
    fn test_text_with_markup_and_forbidden_chars() {
        let root = XmlElement::new("title").with_text("a\x02 < b & c");
        assert_eq!(
            render(&root),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><title>a &lt; b &amp; c</title>"
        );
    }
}
