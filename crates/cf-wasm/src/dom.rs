//! Browser document behind the engine's `Dom` trait

use cf_core::dom::{AttrSelector, Dom, DomError};
use cf_core::types::{Rect, StyleValue, Viewport};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CssStyleDeclaration, Document, Element, HtmlElement, Node, NodeList, Window};

/// The live page. Node handles are `Element`s; equality is JS identity.
pub struct WebDom {
    window: Window,
    document: Document,
}

impl WebDom {
    pub fn new(window: Window, document: Document) -> Self {
        Self { window, document }
    }

    /// The current window's document.
    pub fn from_window() -> Result<Self, DomError> {
        let window = web_sys::window().ok_or_else(|| DomError::Host("no window".into()))?;
        let document = window.document().ok_or_else(|| DomError::Host("no document".into()))?;
        Ok(Self::new(window, document))
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// `scope` (when it matches) followed by `querySelectorAll(css)`.
    fn query_inclusive(
        &self,
        scope: &Element,
        css: &str,
        scope_matches: bool,
    ) -> Result<Vec<Element>, DomError> {
        let list = scope.query_selector_all(css).map_err(host_error)?;
        let mut out = Vec::with_capacity(list.length() as usize + 1);
        if scope_matches {
            out.push(scope.clone());
        }
        out.extend(elements(&list));
        Ok(out)
    }
}

fn host_error(e: JsValue) -> DomError {
    DomError::Host(e.as_string().unwrap_or_else(|| format!("{e:?}")))
}

fn elements(list: &NodeList) -> impl Iterator<Item = Element> + '_ {
    (0..list.length()).filter_map(move |i| list.item(i)?.dyn_into::<Element>().ok())
}

fn inline_style(node: &Element) -> Option<CssStyleDeclaration> {
    node.dyn_ref::<HtmlElement>().map(HtmlElement::style)
}

fn require_connected(node: &Element) -> Result<(), DomError> {
    if node.is_connected() {
        Ok(())
    } else {
        Err(DomError::Detached)
    }
}

impl Dom for WebDom {
    type Node = Element;

    fn body(&self) -> Option<Element> {
        self.document.body().map(Element::from)
    }

    fn document_element(&self) -> Option<Element> {
        self.document.document_element()
    }

    fn viewport(&self) -> Viewport {
        let read = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64());
        match (read(self.window.inner_width()), read(self.window.inner_height())) {
            (Some(width), Some(height)) => Viewport { width, height },
            _ => Viewport::default(),
        }
    }

    fn parent(&self, node: &Element) -> Option<Element> {
        node.parent_element()
    }

    fn descendants(&self, scope: &Element) -> Result<Vec<Element>, DomError> {
        self.query_inclusive(scope, "*", true)
    }

    fn elements_by_tag(&self, scope: &Element, tags: &[&str]) -> Result<Vec<Element>, DomError> {
        if tags.is_empty() {
            return Ok(Vec::new());
        }
        let tag = self.tag_name(scope);
        let scope_matches = tags.iter().any(|t| t.eq_ignore_ascii_case(&tag));
        self.query_inclusive(scope, &tags.join(","), scope_matches)
    }

    fn select(&self, scope: &Element, selector: &AttrSelector) -> Result<Vec<Element>, DomError> {
        let scope_matches = self.matches_selector(scope, selector);
        self.query_inclusive(scope, &selector.to_css(), scope_matches)
    }

    fn tag_name(&self, node: &Element) -> String {
        node.local_name().to_ascii_lowercase()
    }

    fn attribute(&self, node: &Element, name: &str) -> Option<String> {
        node.get_attribute(name)
    }

    fn has_class(&self, node: &Element, class: &str) -> bool {
        node.class_list().contains(class)
    }

    fn own_text(&self, node: &Element) -> Result<String, DomError> {
        require_connected(node)?;
        let children = node.child_nodes();
        let mut text = String::new();
        for i in 0..children.length() {
            let Some(child) = children.item(i) else { continue };
            if child.node_type() == Node::TEXT_NODE {
                text.push_str(&child.text_content().unwrap_or_default());
            }
        }
        Ok(text)
    }

    fn text_content(&self, node: &Element) -> Result<String, DomError> {
        require_connected(node)?;
        // innerText separates blocks; textContent is the fallback for SVG.
        Ok(match node.dyn_ref::<HtmlElement>() {
            Some(html) => html.inner_text(),
            None => node.text_content().unwrap_or_default(),
        })
    }

    fn bounding_rect(&self, node: &Element) -> Result<Rect, DomError> {
        let r = node.get_bounding_client_rect();
        Ok(Rect::new(r.x(), r.y(), r.width(), r.height()))
    }

    fn contains(&self, ancestor: &Element, node: &Element) -> bool {
        let node: &Node = node;
        ancestor.contains(Some(node))
    }

    fn is_connected(&self, node: &Element) -> bool {
        node.is_connected()
    }

    fn style_property(&self, node: &Element, name: &str) -> Option<StyleValue> {
        let style = inline_style(node)?;
        let value = style.get_property_value(name).ok()?;
        if value.is_empty() {
            return None;
        }
        Some(StyleValue {
            value,
            important: style.get_property_priority(name) == "important",
        })
    }

    fn set_style_property(&mut self, node: &Element, name: &str, value: &StyleValue) -> Result<(), DomError> {
        let style = inline_style(node).ok_or(DomError::Unreadable("style"))?;
        let priority = if value.important { "important" } else { "" };
        style
            .set_property_with_priority(name, &value.value, priority)
            .map_err(host_error)
    }

    fn remove_style_property(&mut self, node: &Element, name: &str) -> Result<(), DomError> {
        let style = inline_style(node).ok_or(DomError::Unreadable("style"))?;
        style.remove_property(name).map(|_| ()).map_err(host_error)
    }

    fn set_attribute(&mut self, node: &Element, name: &str, value: &str) -> Result<(), DomError> {
        node.set_attribute(name, value).map_err(host_error)
    }

    fn remove_attribute(&mut self, node: &Element, name: &str) -> Result<(), DomError> {
        node.remove_attribute(name).map_err(host_error)
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use cf_core::ledger::STAMP_ATTR;
    use cf_core::{CategoryId, SuppressionLedger};
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn fixture() -> (WebDom, Element) {
        let dom = WebDom::from_window().unwrap();
        let body = dom.body().unwrap();
        let card = dom.document.create_element("div").unwrap();
        card.set_attribute("data-pagelet", "FeedUnit_Reel").unwrap();
        card.set_inner_html("<div><h3>Reels</h3><span>clip</span></div>");
        body.append_child(&card).unwrap();
        (dom, card)
    }

    #[wasm_bindgen_test]
    fn test_queries_are_inclusive() {
        let (dom, card) = fixture();
        let found = dom
            .select(&card, &AttrSelector::prefix(Some("div"), "data-pagelet", "FeedUnit_"))
            .unwrap();
        assert_eq!(found, vec![card.clone()]);
        assert_eq!(dom.elements_by_tag(&card, &["h3", "span"]).unwrap().len(), 2);
        assert_eq!(dom.descendants(&card).unwrap().len(), 4);
        card.remove();
    }

    #[wasm_bindgen_test]
    fn test_collapse_and_restore_inline_style() {
        let (mut dom, card) = fixture();
        card.unchecked_ref::<HtmlElement>().style().set_property("display", "flex").unwrap();

        let mut ledger = SuppressionLedger::new();
        assert_eq!(ledger.apply(&mut dom, &card, CategoryId::Reels), Ok(true));
        assert_eq!(dom.style_property(&card, "display"), Some(StyleValue::important("none")));
        assert_eq!(card.get_attribute(STAMP_ATTR).as_deref(), Some("reels"));

        assert_eq!(ledger.restore_all(&mut dom), 1);
        let display = dom.style_property(&card, "display").unwrap();
        assert_eq!(display.value, "flex");
        assert!(!display.important);
        assert_eq!(dom.style_property(&card, "visibility"), None);
        assert!(card.get_attribute(STAMP_ATTR).is_none());
        card.remove();
    }

    #[wasm_bindgen_test]
    fn test_detached_reads_fail() {
        let (dom, card) = fixture();
        card.remove();
        assert_eq!(dom.text_content(&card), Err(DomError::Detached));
        assert!(!dom.is_connected(&card));
    }
}
