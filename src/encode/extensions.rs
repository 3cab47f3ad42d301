//! Extension merging: reserved configuration nodes are dispatched through a
//! name → handler table, everything else is passed through.

use std::collections::HashMap;

use super::xml::{rich_text, XmlElement};
use crate::model::ExtensionNode;
use crate::util::is_xml_name;

/// Consumes one configuration node into a scope's settings.
pub(crate) type Handler<S> = fn(&mut S, &ExtensionNode);

/// Settings every XML scope understands.
#[derive(Debug, Default)]
pub(crate) struct XmlScope {
    pub cdata: Option<bool>,
    /// Extra `xmlns:prefix` declarations for the root element.
    pub namespaces: Vec<(String, String)>,
}

pub(crate) trait HasXmlScope {
    fn xml_scope(&mut self) -> &mut XmlScope;
}

/// Lookup table from configuration key (the part after `_config:`) to handler.
pub(crate) struct ConfigTable<S> {
    handlers: HashMap<&'static str, Handler<S>>,
}

impl<S> ConfigTable<S> {
    pub(crate) fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub(crate) fn on(mut self, key: &'static str, handler: Handler<S>) -> Self {
        self.handlers.insert(key, handler);
        self
    }

    /// Runs the handlers for every configuration node and returns the
    /// pass-through nodes in their original order.
    ///
    /// Configuration nodes without a handler are dropped: they target another
    /// format and must never reach the output.
    pub(crate) fn apply<'a>(&self, settings: &mut S, nodes: &'a [ExtensionNode]) -> Vec<&'a ExtensionNode> {
        let mut passthrough = Vec::with_capacity(nodes.len());
        for node in nodes {
            match node.config_key() {
                Some(key) => match self.handlers.get(key) {
                    Some(handler) => handler(settings, node),
                    None => tracing::debug!(key = %key, "Ignoring configuration node not used by this format"),
                },
                None => passthrough.push(node),
            }
        }
        passthrough
    }
}

impl<S: HasXmlScope> ConfigTable<S> {
    /// Registers the `cdata` switch.
    pub(crate) fn with_cdata(self) -> Self {
        self.on("cdata", |s: &mut S, node: &ExtensionNode| {
            if let Some(enabled) = config_flag(node) {
                s.xml_scope().cdata = Some(enabled);
            }
        })
    }

    /// Registers `namespace` (attr `prefix`, text = URI).
    pub(crate) fn with_namespaces(self) -> Self {
        self.on("namespace", |s: &mut S, node: &ExtensionNode| {
            match (node.attr("prefix"), node.value()) {
                (Some(prefix), Some(uri)) if is_xml_name(prefix) && !prefix.contains(':') => {
                    s.xml_scope().namespaces.push((prefix.to_owned(), uri.to_owned()));
                }
                _ => tracing::warn!(name = %node.name, "Namespace node needs a valid prefix attribute and a URI"),
            }
        })
    }
}

/// Boolean value of a configuration node; malformed values are logged and ignored.
pub(crate) fn config_flag(node: &ExtensionNode) -> Option<bool> {
    let flag = node.flag();
    if flag.is_none() {
        tracing::warn!(name = %node.name, value = %node.text, "Ignoring non-boolean configuration value");
    }
    flag
}

/// Trimmed text of a configuration node, `None` when blank.
pub(crate) fn config_text(node: &ExtensionNode) -> Option<String> {
    let value = node.value().map(str::to_owned);
    if value.is_none() {
        tracing::debug!(name = %node.name, "Ignoring empty configuration value");
    }
    value
}

/// Adds `xmlns:prefix` declarations to a root element, skipping prefixes it
/// already declares.
pub(crate) fn declare_namespaces(root: &mut XmlElement, namespaces: &[(String, String)]) {
    for (prefix, uri) in namespaces {
        let key = format!("xmlns:{prefix}");
        if root.attr(&key).is_some() {
            tracing::debug!(prefix = %prefix, "Namespace already declared");
            continue;
        }
        root.push_attr(key, uri.as_str());
    }
}

/// Renders a pass-through node: attributes in ascending key order, text under
/// the scope's CDATA policy, children recursively.
///
/// Returns `None` when the node's name is not a valid XML name. Attributes and
/// children with invalid names are dropped, so the result is always
/// well-formed.
pub(crate) fn extension_element(node: &ExtensionNode, cdata: bool) -> Option<XmlElement> {
    if !is_xml_name(&node.name) {
        tracing::warn!(name = %node.name, "Skipping extension node with an invalid XML name");
        return None;
    }
    let mut el = XmlElement::new(node.name.as_str());
    for (key, value) in &node.attrs {
        if !is_xml_name(key) {
            tracing::warn!(name = %node.name, key = %key, "Skipping extension attribute with an invalid XML name");
            continue;
        }
        el.push_attr(key.as_str(), value.as_str());
    }
    if !node.text.is_empty() {
        el.push_node(rich_text(&node.text, cdata));
    }
    for child in node.children.iter().filter(|c| !c.is_config()) {
        if let Some(child_el) = extension_element(child, cdata) {
            el.push(child_el);
        }
    }
    Some(el)
}

/// Appends the pass-through nodes that can be expressed as elements.
pub(crate) fn append_extensions(parent: &mut XmlElement, nodes: &[&ExtensionNode], cdata: bool) {
    for el in nodes.iter().filter_map(|node| extension_element(node, cdata)) {
        parent.push(el);
    }
}
