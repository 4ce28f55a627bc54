//! Host document abstraction
//!
//! The engine never owns nodes. Everything it needs from the live page goes
//! through [`Dom`]: an in-memory tree for tests and tools (`crate::tree`), and
//! the browser document in the wasm bindings.

use std::fmt;

use crate::types::{Rect, StyleValue, Viewport};

/// Error raised while reading from or writing to a host node.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("node is no longer attached to the document")]
    Detached,
    #[error("unreadable node property: {0}")]
    Unreadable(&'static str),
    #[error("host error: {0}")]
    Host(String),
}

// =============================================================================
// Attribute Selectors
// =============================================================================

/// Comparison applied to an attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrOp {
    /// `[name]`
    Present,
    /// `[name="value"]`
    Equals(&'static str),
    /// `[name*="value"]`
    Contains(&'static str),
    /// `[name^="value"]`
    Prefix(&'static str),
}

/// A single-attribute selector with an optional tag, e.g. `a[href*="/watch"]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttrSelector {
    pub tag: Option<&'static str>,
    pub name: &'static str,
    pub op: AttrOp,
}

impl AttrSelector {
    pub const fn present(tag: Option<&'static str>, name: &'static str) -> Self {
        Self { tag, name, op: AttrOp::Present }
    }

    pub const fn equals(tag: Option<&'static str>, name: &'static str, value: &'static str) -> Self {
        Self { tag, name, op: AttrOp::Equals(value) }
    }

    pub const fn contains(tag: Option<&'static str>, name: &'static str, value: &'static str) -> Self {
        Self { tag, name, op: AttrOp::Contains(value) }
    }

    pub const fn prefix(tag: Option<&'static str>, name: &'static str, value: &'static str) -> Self {
        Self { tag, name, op: AttrOp::Prefix(value) }
    }

    /// Check an attribute value (None = attribute absent).
    pub fn matches_value(&self, value: Option<&str>) -> bool {
        let Some(value) = value else {
            return false;
        };
        match self.op {
            AttrOp::Present => true,
            AttrOp::Equals(expected) => value == expected,
            AttrOp::Contains(needle) => value.contains(needle),
            AttrOp::Prefix(prefix) => value.starts_with(prefix),
        }
    }

    /// Check a tag name (lowercase) against the selector's tag, if any.
    pub fn matches_tag(&self, tag: &str) -> bool {
        self.tag.map_or(true, |expected| expected.eq_ignore_ascii_case(tag))
    }

    /// CSS form, for hosts that can run `querySelectorAll`.
    pub fn to_css(&self) -> String {
        let mut css = String::with_capacity(self.name.len() + 24);
        if let Some(tag) = self.tag {
            css.push_str(tag);
        }
        css.push('[');
        css.push_str(self.name);
        let (op, value) = match self.op {
            AttrOp::Present => {
                css.push(']');
                return css;
            }
            AttrOp::Equals(v) => ("=", v),
            AttrOp::Contains(v) => ("*=", v),
            AttrOp::Prefix(v) => ("^=", v),
        };
        css.push_str(op);
        css.push('"');
        for ch in value.chars() {
            if ch == '"' || ch == '\\' {
                css.push('\\');
            }
            css.push(ch);
        }
        css.push_str("\"]");
        css
    }
}

impl fmt::Display for AttrSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

// =============================================================================
// Dom
// =============================================================================

/// Read/write access to the host document.
///
/// Reads that can race with the host page (text, geometry) are fallible; the
/// engine treats a failed read as "no match" for the strategy that issued it.
/// Writes only touch inline style properties and attributes.
pub trait Dom {
    /// Live node handle. Equality is node identity.
    type Node: Clone + PartialEq + fmt::Debug;

    fn body(&self) -> Option<Self::Node>;
    fn document_element(&self) -> Option<Self::Node>;
    fn viewport(&self) -> Viewport;

    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;

    /// Element descendants of `scope` in document order, `scope` first.
    fn descendants(&self, scope: &Self::Node) -> Result<Vec<Self::Node>, DomError>;

    /// Lowercase tag name.
    fn tag_name(&self, node: &Self::Node) -> String;
    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;
    fn has_class(&self, node: &Self::Node, class: &str) -> bool;

    /// Concatenated text of the node's direct text children.
    fn own_text(&self, node: &Self::Node) -> Result<String, DomError>;
    /// Rendered text of the whole subtree; element boundaries read as whitespace.
    fn text_content(&self, node: &Self::Node) -> Result<String, DomError>;
    fn bounding_rect(&self, node: &Self::Node) -> Result<Rect, DomError>;

    /// Inclusive containment: a node contains itself.
    fn contains(&self, ancestor: &Self::Node, node: &Self::Node) -> bool;
    fn is_connected(&self, node: &Self::Node) -> bool;

    fn style_property(&self, node: &Self::Node, name: &str) -> Option<StyleValue>;
    fn set_style_property(
        &mut self,
        node: &Self::Node,
        name: &str,
        value: &StyleValue,
    ) -> Result<(), DomError>;
    fn remove_style_property(&mut self, node: &Self::Node, name: &str) -> Result<(), DomError>;

    fn set_attribute(&mut self, node: &Self::Node, name: &str, value: &str) -> Result<(), DomError>;
    fn remove_attribute(&mut self, node: &Self::Node, name: &str) -> Result<(), DomError>;

    /// Descendants of `scope` (inclusive) whose tag is one of `tags`.
    fn elements_by_tag(&self, scope: &Self::Node, tags: &[&str]) -> Result<Vec<Self::Node>, DomError> {
        Ok(self
            .descendants(scope)?
            .into_iter()
            .filter(|node| {
                let tag = self.tag_name(node);
                tags.iter().any(|t| t.eq_ignore_ascii_case(&tag))
            })
            .collect())
    }

    /// Descendants of `scope` (inclusive) matching `selector`.
    fn select(&self, scope: &Self::Node, selector: &AttrSelector) -> Result<Vec<Self::Node>, DomError> {
        Ok(self
            .descendants(scope)?
            .into_iter()
            .filter(|node| self.matches_selector(node, selector))
            .collect())
    }

    fn matches_selector(&self, node: &Self::Node, selector: &AttrSelector) -> bool {
        selector.matches_tag(&self.tag_name(node))
            && selector.matches_value(self.attribute(node, selector.name).as_deref())
    }

    /// Ancestor chain of `node`, nearest first, at most `limit` entries.
    fn ancestors(&self, node: &Self::Node, limit: usize) -> Vec<Self::Node> {
        let mut chain = Vec::with_capacity(limit);
        let mut current = self.parent(node);
        while let Some(parent) = current {
            if chain.len() >= limit {
                break;
            }
            current = self.parent(&parent);
            chain.push(parent);
        }
        chain
    }
}
