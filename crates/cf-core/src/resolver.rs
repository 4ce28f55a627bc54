//! Container Resolver
//!
//! Promotes a candidate to the node that represents the whole section. The
//! climb is bounded and guarded: reaching a protected node or a preserve
//! phrase abandons the candidate, and running out of steps does too. A missed
//! section is always preferred over hiding page chrome.

use crate::dom::{AttrSelector, Dom};
use crate::strategy::Candidate;

/// Tags treated as generic block containers for the height rule.
pub const BLOCK_TAGS: &[&str] = &["div", "section", "aside", "li", "ul", "article"];

// =============================================================================
// Climb Policy
// =============================================================================

/// A structural marker that makes a node an acceptable boundary on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryMarker {
    Attr(AttrSelector),
    Tag(&'static str),
}

impl BoundaryMarker {
    fn matches<D: Dom>(&self, dom: &D, node: &D::Node) -> bool {
        match self {
            Self::Attr(selector) => dom.matches_selector(node, selector),
            Self::Tag(tag) => dom.tag_name(node).eq_ignore_ascii_case(tag),
        }
    }
}

/// Inclusive rendered-height range, CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightRange {
    pub min: f64,
    pub max: f64,
}

impl HeightRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn contains(&self, height: f64) -> bool {
        height >= self.min && height <= self.max
    }
}

/// Per-category tuning for the climb.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimbPolicy {
    /// Ancestors examined above the candidate.
    pub max_depth: usize,
    pub height: HeightRange,
    pub markers: &'static [BoundaryMarker],
    /// Whole-word phrases that veto the climb (identity / navigation anchors).
    pub preserve: &'static [&'static str],
}

// =============================================================================
// Guard
// =============================================================================

/// Nodes that must never be hidden or enclosed, collected once per pass.
#[derive(Debug, Clone)]
pub struct Guard<N> {
    protected: Vec<N>,
    protected_classes: Vec<String>,
    profile_names: Vec<String>,
}

const MAIN_LANDMARKS: [AttrSelector; 1] = [AttrSelector::equals(None, "role", "main")];

impl<N: Clone + PartialEq> Guard<N> {
    /// Collect body, document element and primary landmarks of `dom`.
    pub fn collect<D: Dom<Node = N>>(dom: &D, protected_classes: &[String], profile_names: &[String]) -> Self {
        let mut protected = Vec::new();
        if let Some(root) = dom.document_element() {
            protected.push(root);
        }
        if let Some(body) = dom.body() {
            if let Ok(mains) = dom.elements_by_tag(&body, &["main"]) {
                protected.extend(mains);
            }
            for selector in &MAIN_LANDMARKS {
                if let Ok(found) = dom.select(&body, selector) {
                    protected.extend(found);
                }
            }
            protected.push(body);
        }

        Self {
            protected,
            protected_classes: protected_classes.to_vec(),
            profile_names: profile_names
                .iter()
                .map(|name| name.trim().to_lowercase())
                .filter(|name| !name.is_empty())
                .collect(),
        }
    }

    /// Node is, or encloses, a protected node, or carries a protected class.
    pub fn blocks<D: Dom<Node = N>>(&self, dom: &D, node: &N) -> bool {
        self.protected.iter().any(|p| dom.contains(node, p))
            || self.protected_classes.iter().any(|class| dom.has_class(node, class))
    }

    /// Case-folded `text` mentions a preserve phrase or a profile name.
    pub fn preserves(&self, text: &str, policy: &ClimbPolicy) -> bool {
        policy.preserve.iter().any(|phrase| contains_word(text, phrase))
            || self.profile_names.iter().any(|name| contains_word(text, name))
    }
}

// =============================================================================
// Resolve
// =============================================================================

/// Find the suppression boundary for `candidate`, or `None`.
pub fn resolve<D: Dom>(
    dom: &D,
    candidate: &Candidate<D::Node>,
    policy: &ClimbPolicy,
    guard: &Guard<D::Node>,
) -> Option<D::Node> {
    let mut chain = Vec::with_capacity(policy.max_depth + 1);
    chain.push(candidate.node.clone());
    chain.extend(dom.ancestors(&candidate.node, policy.max_depth));

    for node in chain {
        if guard.blocks(dom, &node) {
            log::trace!("{}: stop at protected node {:?}", candidate.category, node);
            return None;
        }

        let text = match dom.text_content(&node) {
            Ok(text) => text.to_lowercase(),
            Err(e) => {
                log::trace!("{}: climb abandoned at {:?}: {}", candidate.category, node, e);
                return None;
            }
        };

        if guard.preserves(&text, policy) {
            log::trace!("{}: preserved {:?}", candidate.category, node);
            return None;
        }

        if policy.markers.iter().any(|marker| marker.matches(dom, &node)) {
            return Some(node);
        }

        if is_plausible_block(dom, &node, policy, &text, &candidate.anchor) {
            return Some(node);
        }
    }

    None
}

fn is_plausible_block<D: Dom>(
    dom: &D,
    node: &D::Node,
    policy: &ClimbPolicy,
    folded_text: &str,
    anchor: &str,
) -> bool {
    let tag = dom.tag_name(node);
    if !BLOCK_TAGS.iter().any(|t| t.eq_ignore_ascii_case(&tag)) {
        return false;
    }
    let Ok(rect) = dom.bounding_rect(node) else {
        return false;
    };
    !anchor.is_empty() && policy.height.contains(rect.height) && folded_text.contains(anchor)
}

/// Whole-word containment on case-folded text.
pub fn contains_word(text: &str, word: &str) -> bool {
    if word.is_empty() {
        return false;
    }
    let is_word_char = |c: char| c.is_alphanumeric();
    let mut start = 0;
    while let Some(pos) = text[start..].find(word) {
        let begin = start + pos;
        let end = begin + word.len();
        let before_ok = text[..begin].chars().next_back().map_or(true, |c| !is_word_char(c));
        let after_ok = text[end..].chars().next().map_or(true, |c| !is_word_char(c));
        if before_ok && after_ok {
            return true;
        }
        start = begin + word.chars().next().map_or(1, char::len_utf8);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{MemoryDom, NodeId};
    use crate::types::{CategoryId, Rect};

    const FEED_MARKERS: &[BoundaryMarker] = &[BoundaryMarker::Attr(AttrSelector::present(None, "data-pagelet"))];
    const NAV_MARKERS: &[BoundaryMarker] = &[
        BoundaryMarker::Attr(AttrSelector::equals(None, "role", "listitem")),
        BoundaryMarker::Tag("li"),
    ];

    const FEED: ClimbPolicy = ClimbPolicy {
        max_depth: 8,
        height: HeightRange::new(100.0, 2400.0),
        markers: FEED_MARKERS,
        preserve: &[],
    };

    const NAV: ClimbPolicy = ClimbPolicy {
        max_depth: 4,
        height: HeightRange::new(20.0, 120.0),
        markers: NAV_MARKERS,
        preserve: &["home", "shortcuts"],
    };

    fn candidate(node: NodeId, anchor: &str) -> Candidate<NodeId> {
        Candidate {
            node,
            category: CategoryId::Reels,
            anchor: anchor.to_string(),
        }
    }

    fn guard_for(dom: &MemoryDom) -> Guard<NodeId> {
        Guard::collect(dom, &["home-page-content".to_string()], &["Ada Lovelace".to_string()])
    }

    #[test]
    fn test_accepts_marked_ancestor() {
        let mut dom = MemoryDom::default();
        let body = dom.body_id();
        let block = dom.append(body, "div");
        dom.set_attr(block, "data-pagelet", "ReelsTray").set_rect(block, Rect::new(400.0, 300.0, 500.0, 400.0));
        let inner = dom.append(block, "div");
        let inner2 = dom.append(inner, "div");
        let heading = dom.append_text(inner2, "h3", "Reels");

        let guard = guard_for(&dom);
        assert_eq!(resolve(&dom, &candidate(heading, "reels"), &FEED, &guard), Some(block));
    }

    #[test]
    fn test_body_is_never_a_boundary() {
        let mut dom = MemoryDom::default();
        let body = dom.body_id();
        dom.set_attr(body, "data-pagelet", "Root");
        let heading = dom.append_text(body, "h3", "Reels");

        let guard = guard_for(&dom);
        assert_eq!(resolve(&dom, &candidate(heading, "reels"), &FEED, &guard), None);
        assert_eq!(resolve(&dom, &candidate(body, "reels"), &FEED, &guard), None);
        assert_eq!(resolve(&dom, &candidate(dom.root(), "reels"), &FEED, &guard), None);
    }

    #[test]
    fn test_main_landmark_and_its_wrappers_are_protected() {
        let mut dom = MemoryDom::default();
        let body = dom.body_id();
        let wrapper = dom.append(body, "div");
        dom.set_rect(wrapper, Rect::new(0.0, 0.0, 1280.0, 800.0));
        let main = dom.append(wrapper, "div");
        dom.set_attr(main, "role", "main").set_attr(main, "data-pagelet", "Feed");
        let heading = dom.append_text(main, "h3", "Reels");

        let guard = guard_for(&dom);
        assert_eq!(resolve(&dom, &candidate(heading, "reels"), &FEED, &guard), None);
        // A candidate that encloses the landmark is refused outright.
        assert_eq!(resolve(&dom, &candidate(wrapper, "reels"), &FEED, &guard), None);
    }

    #[test]
    fn test_protected_class_stops_climb() {
        let mut dom = MemoryDom::default();
        let body = dom.body_id();
        let home = dom.append(body, "div");
        dom.add_class(home, "home-page-content").set_attr(home, "data-pagelet", "Home");
        let heading = dom.append_text(home, "h3", "Reels");

        let guard = guard_for(&dom);
        assert_eq!(resolve(&dom, &candidate(heading, "reels"), &FEED, &guard), None);
    }

    #[test]
    fn test_preserve_phrases_veto() {
        let mut dom = MemoryDom::default();
        let body = dom.body_id();
        let list = dom.append(body, "ul");
        let item = dom.append(list, "div");
        dom.append_text(item, "span", "Home");
        let label = dom.append_text(item, "span", "Marketplace");
        dom.set_rect(item, Rect::new(0.0, 100.0, 300.0, 80.0));

        let guard = guard_for(&dom);
        assert_eq!(resolve(&dom, &candidate(label, "marketplace"), &NAV, &guard), None);

        let mut dom = MemoryDom::default();
        let body = dom.body_id();
        let item = dom.append(body, "div");
        dom.set_rect(item, Rect::new(0.0, 100.0, 300.0, 40.0));
        dom.append_text(item, "span", "Ada Lovelace");
        let label = dom.append_text(item, "span", "Gaming");
        let guard = guard_for(&dom);
        assert_eq!(resolve(&dom, &candidate(label, "gaming"), &NAV, &guard), None);
    }

    #[test]
    fn test_height_rule_requires_anchor_text() {
        let mut dom = MemoryDom::default();
        let body = dom.body_id();
        let outer = dom.append(body, "section");
        dom.set_rect(outer, Rect::new(0.0, 100.0, 300.0, 60.0));
        let row = dom.append(outer, "div");
        dom.set_rect(row, Rect::new(0.0, 100.0, 300.0, 36.0));
        let label = dom.append_text(row, "span", "Gaming");

        let guard = guard_for(&dom);
        assert_eq!(resolve(&dom, &candidate(label, "gaming"), &NAV, &guard), Some(row));
        // Anchor text missing from every block in range: nothing accepted.
        assert_eq!(resolve(&dom, &candidate(label, "watch"), &NAV, &guard), None);
    }

    #[test]
    fn test_height_rule_needs_an_anchor() {
        let mut dom = MemoryDom::default();
        let body = dom.body_id();
        let row = dom.append(body, "div");
        dom.set_rect(row, Rect::new(0.0, 100.0, 300.0, 36.0));
        let icon = dom.append(row, "a");
        dom.set_attr(icon, "href", "/gaming/");

        let guard = guard_for(&dom);
        assert_eq!(resolve(&dom, &candidate(icon, ""), &NAV, &guard), None);
        assert_eq!(resolve(&dom, &candidate(icon, "gaming"), &NAV, &guard), None);

        dom.set_text(icon, "Gaming");
        assert_eq!(resolve(&dom, &candidate(icon, "gaming"), &NAV, &guard), Some(row));
    }

    #[test]
    fn test_climb_is_bounded() {
        let mut dom = MemoryDom::default();
        let body = dom.body_id();
        let block = dom.append(body, "div");
        dom.set_attr(block, "role", "listitem");
        let mut node = block;
        for _ in 0..5 {
            node = dom.append(node, "span");
        }
        let label = dom.append_text(node, "span", "Watch");

        let guard = guard_for(&dom);
        assert_eq!(resolve(&dom, &candidate(label, "watch"), &NAV, &guard), None);
    }

    #[test]
    fn test_contains_word() {
        assert!(contains_word("go home now", "home"));
        assert!(contains_word("home", "home"));
        assert!(!contains_word("homestead", "home"));
        assert!(contains_word("homestead, home", "home"));
        assert!(contains_word("your shortcuts", "shortcuts"));
        assert!(!contains_word("anything", ""));
    }
}
