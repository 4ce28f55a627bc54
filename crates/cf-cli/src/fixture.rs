//! JSON page fixtures
//!
//! ```json
//! {
//!   "viewport": { "width": 1280, "height": 800 },
//!   "body": [
//!     { "tag": "div", "attrs": { "data-pagelet": "FeedUnit_0" }, "rect": [380, 80, 500, 400],
//!       "children": [ { "tag": "h3", "text": "Reels" } ] }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use cf_core::tree::{MemoryDom, NodeId};
use cf_core::types::{Rect, Viewport};
use cf_core::Dom;
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid fixture: {0}")]
    Json(#[from] serde_json::Error),
    #[error("node {path}: {reason}")]
    Node { path: String, reason: &'static str },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PageSpec {
    #[serde(default)]
    viewport: Option<ViewportSpec>,
    #[serde(default)]
    body: Vec<NodeSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ViewportSpec {
    width: f64,
    height: f64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NodeSpec {
    tag: String,
    #[serde(default)]
    attrs: BTreeMap<String, String>,
    #[serde(default)]
    classes: Vec<String>,
    #[serde(default)]
    text: Option<String>,
    /// `[x, y, width, height]`
    #[serde(default)]
    rect: Option<[f64; 4]>,
    #[serde(default)]
    children: Vec<NodeSpec>,
}

/// Read and build a fixture file.
pub fn load(path: &Path) -> Result<MemoryDom, FixtureError> {
    let text = fs::read_to_string(path).map_err(|source| FixtureError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse(&text)
}

/// Build a page from fixture JSON.
pub fn parse(text: &str) -> Result<MemoryDom, FixtureError> {
    let spec: PageSpec = serde_json::from_str(text)?;
    let viewport = spec
        .viewport
        .map(|v| Viewport { width: v.width, height: v.height })
        .unwrap_or_default();

    let mut dom = MemoryDom::new(viewport);
    let body = dom.body_id();
    for (i, node) in spec.body.iter().enumerate() {
        build(&mut dom, body, node, &format!("body/{i}"))?;
    }
    Ok(dom)
}

fn build(dom: &mut MemoryDom, parent: NodeId, spec: &NodeSpec, path: &str) -> Result<(), FixtureError> {
    let tag = spec.tag.trim();
    if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(FixtureError::Node {
            path: path.to_string(),
            reason: "tag must be a non-empty element name",
        });
    }

    let node = dom.append(parent, tag);
    if let Some(text) = &spec.text {
        dom.set_text(node, text);
    }
    for (name, value) in &spec.attrs {
        dom.set_attr(node, name, value);
    }
    for class in &spec.classes {
        dom.add_class(node, class);
    }
    if let Some([x, y, width, height]) = spec.rect {
        if width < 0.0 || height < 0.0 {
            return Err(FixtureError::Node {
                path: path.to_string(),
                reason: "rect size must not be negative",
            });
        }
        dom.set_rect(node, Rect::new(x, y, width, height));
    }

    for (i, child) in spec.children.iter().enumerate() {
        build(dom, node, child, &format!("{path}/{i}"))?;
    }
    Ok(())
}

/// Short CSS-like description of a node, e.g. `div[data-pagelet="FeedUnit_0"]`.
pub fn describe(dom: &MemoryDom, node: &NodeId) -> String {
    const KEYS: [&str; 4] = ["data-pagelet", "aria-label", "role", "href"];
    let mut out = dom.tag_name(node);
    for key in KEYS {
        if let Some(value) = dom.attribute(node, key) {
            out.push_str(&format!("[{key}=\"{value}\"]"));
            break;
        }
    }
    out
}
