//! In-memory document
//!
//! Arena-backed element tree implementing [`Dom`]. Used by the unit tests, the
//! benchmarks and the CLI fixture loader. Nodes are never freed; detaching a
//! subtree only unlinks it, so stale handles keep answering `is_connected`.

use crate::dom::{Dom, DomError};
use crate::types::{Rect, StyleValue, Viewport};

/// Handle into a [`MemoryDom`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Default)]
struct NodeData {
    tag: String,
    attrs: Vec<(String, String)>,
    classes: Vec<String>,
    text: String,
    rect: Rect,
    style: Vec<(String, StyleValue)>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Reads of text/geometry fail, simulating a node torn down mid-read.
    poisoned: bool,
}

/// Arena element tree with an `<html>` root and a `<body>`.
#[derive(Debug, Clone)]
pub struct MemoryDom {
    nodes: Vec<NodeData>,
    root: NodeId,
    body: NodeId,
    viewport: Viewport,
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new(Viewport::default())
    }
}

impl MemoryDom {
    pub fn new(viewport: Viewport) -> Self {
        let mut dom = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            body: NodeId(0),
            viewport,
        };
        dom.root = dom.alloc("html", None);
        dom.body = dom.alloc("body", Some(dom.root));
        dom.nodes[dom.body.index()].rect = Rect::new(0.0, 0.0, viewport.width, viewport.height);
        dom
    }

    fn alloc(&mut self, tag: &str, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData {
            tag: tag.to_ascii_lowercase(),
            parent,
            ..NodeData::default()
        });
        if let Some(parent) = parent {
            self.nodes[parent.index()].children.push(id);
        }
        id
    }

    fn data(&self, node: &NodeId) -> &NodeData {
        &self.nodes[node.index()]
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn body_id(&self) -> NodeId {
        self.body
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 2
    }

    // -------------------------------------------------------------------------
    // Building
    // -------------------------------------------------------------------------

    /// Append a new element as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, tag: &str) -> NodeId {
        self.alloc(tag, Some(parent))
    }

    /// Append an element carrying direct text.
    pub fn append_text(&mut self, parent: NodeId, tag: &str, text: &str) -> NodeId {
        let id = self.alloc(tag, Some(parent));
        self.nodes[id.index()].text = text.to_string();
        id
    }

    pub fn set_text(&mut self, node: NodeId, text: &str) -> &mut Self {
        self.nodes[node.index()].text = text.to_string();
        self
    }

    pub fn set_attr(&mut self, node: NodeId, name: &str, value: &str) -> &mut Self {
        let attrs = &mut self.nodes[node.index()].attrs;
        match attrs.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = value.to_string(),
            None => attrs.push((name.to_string(), value.to_string())),
        }
        self
    }

    pub fn add_class(&mut self, node: NodeId, class: &str) -> &mut Self {
        let classes = &mut self.nodes[node.index()].classes;
        if !classes.iter().any(|c| c == class) {
            classes.push(class.to_string());
        }
        self
    }

    pub fn set_rect(&mut self, node: NodeId, rect: Rect) -> &mut Self {
        self.nodes[node.index()].rect = rect;
        self
    }

    /// Set an inline style as the host page would.
    pub fn set_style(&mut self, node: NodeId, name: &str, value: StyleValue) -> &mut Self {
        let style = &mut self.nodes[node.index()].style;
        match style.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = value,
            None => style.push((name.to_string(), value)),
        }
        self
    }

    /// Make text and geometry reads on `node` fail.
    pub fn poison(&mut self, node: NodeId) -> &mut Self {
        self.nodes[node.index()].poisoned = true;
        self
    }

    /// Unlink `node` (and its subtree) from its parent.
    pub fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.index()].parent.take() {
            self.nodes[parent.index()].children.retain(|c| *c != node);
        }
    }

    /// Move `node` (and its subtree) to the end of `parent`'s children.
    pub fn attach(&mut self, parent: NodeId, node: NodeId) {
        self.detach(node);
        self.nodes[node.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(node);
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.data(&node).children
    }

    /// Inline styles of `node`, in insertion order.
    pub fn inline_style(&self, node: NodeId) -> Vec<(String, StyleValue)> {
        self.data(&node).style.clone()
    }

    /// All attributes of `node`, in insertion order.
    pub fn attributes(&self, node: NodeId) -> Vec<(String, String)> {
        self.data(&node).attrs.clone()
    }

    /// Whether the node's inline display is forced to `none`.
    pub fn is_collapsed(&self, node: NodeId) -> bool {
        self.data(&node)
            .style
            .iter()
            .any(|(n, v)| n == "display" && v.value == "none")
    }

    fn collect_text(&self, node: NodeId, out: &mut String) -> Result<(), DomError> {
        let data = self.data(&node);
        if data.poisoned {
            return Err(DomError::Unreadable("textContent"));
        }
        if !data.text.is_empty() {
            // Element boundaries read as whitespace, like rendered text.
            if !out.is_empty() && !out.ends_with(char::is_whitespace) && !data.text.starts_with(char::is_whitespace) {
                out.push(' ');
            }
            out.push_str(&data.text);
        }
        for child in &data.children {
            self.collect_text(*child, out)?;
        }
        Ok(())
    }
}

impl Dom for MemoryDom {
    type Node = NodeId;

    fn body(&self) -> Option<NodeId> {
        Some(self.body)
    }

    fn document_element(&self) -> Option<NodeId> {
        Some(self.root)
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.data(node).parent
    }

    fn descendants(&self, scope: &NodeId) -> Result<Vec<NodeId>, DomError> {
        let mut out = Vec::new();
        let mut stack = vec![*scope];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.data(&node).children.iter().rev().copied());
        }
        Ok(out)
    }

    fn tag_name(&self, node: &NodeId) -> String {
        self.data(node).tag.clone()
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        self.data(node)
            .attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    fn has_class(&self, node: &NodeId, class: &str) -> bool {
        self.data(node).classes.iter().any(|c| c == class)
    }

    fn own_text(&self, node: &NodeId) -> Result<String, DomError> {
        let data = self.data(node);
        if data.poisoned {
            return Err(DomError::Unreadable("childNodes"));
        }
        Ok(data.text.clone())
    }

    fn text_content(&self, node: &NodeId) -> Result<String, DomError> {
        let mut out = String::new();
        self.collect_text(*node, &mut out)?;
        Ok(out)
    }

    fn bounding_rect(&self, node: &NodeId) -> Result<Rect, DomError> {
        let data = self.data(node);
        if data.poisoned {
            return Err(DomError::Unreadable("getBoundingClientRect"));
        }
        if !self.is_connected(node) {
            return Ok(Rect::default());
        }
        Ok(data.rect)
    }

    fn contains(&self, ancestor: &NodeId, node: &NodeId) -> bool {
        let mut current = Some(*node);
        while let Some(id) = current {
            if id == *ancestor {
                return true;
            }
            current = self.data(&id).parent;
        }
        false
    }

    fn is_connected(&self, node: &NodeId) -> bool {
        self.contains(&self.root, node)
    }

    fn style_property(&self, node: &NodeId, name: &str) -> Option<StyleValue> {
        self.data(node)
            .style
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    fn set_style_property(&mut self, node: &NodeId, name: &str, value: &StyleValue) -> Result<(), DomError> {
        self.set_style(*node, name, value.clone());
        Ok(())
    }

    fn remove_style_property(&mut self, node: &NodeId, name: &str) -> Result<(), DomError> {
        self.nodes[node.index()].style.retain(|(n, _)| n != name);
        Ok(())
    }

    fn set_attribute(&mut self, node: &NodeId, name: &str, value: &str) -> Result<(), DomError> {
        self.set_attr(*node, name, value);
        Ok(())
    }

    fn remove_attribute(&mut self, node: &NodeId, name: &str) -> Result<(), DomError> {
        self.nodes[node.index()].attrs.retain(|(n, _)| n != name);
        Ok(())
    }
}
