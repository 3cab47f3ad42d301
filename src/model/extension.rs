use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Name prefix reserving an extension node for encoder configuration.
///
/// Reserved nodes are never emitted. An encoder that recognizes the local name
/// turns the node into a first-class field of its output; every other encoder
/// drops it.
pub const CONFIG_PREFIX: &str = "_config:";

/// Generic, possibly namespaced element attached to a feed or an item.
///
/// `name` may be a plain local name or a `prefix:local` qualified name.
/// Attributes live in a `BTreeMap` so they always serialize in ascending key
/// order, whatever order the caller inserted them in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtensionNode {
    pub name: String,
    pub attrs: BTreeMap<String, String>,
    pub text: String,
    pub children: Vec<ExtensionNode>,
}

impl ExtensionNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// A reserved configuration node, e.g. `ExtensionNode::config("cdata", "false")`.
    pub fn config(key: &str, value: impl Into<String>) -> Self {
        Self::new(format!("{CONFIG_PREFIX}{key}")).with_text(value)
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_child(mut self, child: ExtensionNode) -> Self {
        self.children.push(child);
        self
    }

    /// Local configuration key when this is a reserved node.
    pub fn config_key(&self) -> Option<&str> {
        self.name.strip_prefix(CONFIG_PREFIX)
    }

    pub fn is_config(&self) -> bool {
        self.config_key().is_some()
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    /// Trimmed text, `None` when blank.
    pub fn value(&self) -> Option<&str> {
        let trimmed = self.text.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }

    /// Interprets the text as a boolean switch. Accepts `true/false`,
    /// `yes/no` and `1/0`, case-insensitively.
    pub fn flag(&self) -> Option<bool> {
        let value = self.value()?;
        if ["true", "yes", "1"].iter().any(|v| value.eq_ignore_ascii_case(v)) {
            Some(true)
        } else if ["false", "no", "0"].iter().any(|v| value.eq_ignore_ascii_case(v)) {
            Some(false)
        } else {
            None
        }
    }
}
