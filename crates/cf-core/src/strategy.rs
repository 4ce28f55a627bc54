//! Matcher Strategies
//!
//! Each strategy reads one weak signal from the page and yields candidate
//! nodes. Strategies are stateless and side-effect free; a category runs all of
//! its strategies independently and unions the results.

use crate::dom::{AttrSelector, Dom, DomError};
use crate::resolver::contains_word;
use crate::types::{CategoryId, Rect, RegionMask, Viewport};

// =============================================================================
// Region Thresholds
// =============================================================================

/// Everything whose box ends above this line sits in the top bar.
pub const TOP_BAR_MAX_Y: f64 = 56.0;
/// Left rail elements start within this distance of the left edge.
pub const LEFT_RAIL_MAX_X: f64 = 360.0;
/// Right rail elements start within this distance of the right edge.
pub const RIGHT_RAIL_WIDTH: f64 = 360.0;

/// Place a bounding box in a page region. Unrendered boxes have no region.
pub fn classify_region(rect: &Rect, viewport: &Viewport) -> Option<RegionMask> {
    if rect.is_empty() {
        return None;
    }
    if rect.y >= 0.0 && rect.bottom() <= TOP_BAR_MAX_Y {
        return Some(RegionMask::TOP_BAR);
    }
    if rect.y < TOP_BAR_MAX_Y {
        // Straddles the top bar edge: a scrolled feed element, not navigation.
        return Some(RegionMask::MAIN);
    }
    if rect.x < LEFT_RAIL_MAX_X {
        return Some(RegionMask::LEFT_RAIL);
    }
    if rect.x >= viewport.width - RIGHT_RAIL_WIDTH {
        return Some(RegionMask::RIGHT_RAIL);
    }
    Some(RegionMask::MAIN)
}

/// Node is, or sits inside, the primary-content landmark. Such nodes are feed
/// content wherever the scroll position puts their box.
pub fn in_primary_content<D: Dom>(dom: &D, node: &D::Node) -> bool {
    let mut current = Some(node.clone());
    while let Some(node) = current {
        if dom.tag_name(&node).eq_ignore_ascii_case("main") || dom.attribute(&node, "role").as_deref() == Some("main") {
            return true;
        }
        current = dom.parent(&node);
    }
    false
}

fn region_of<D: Dom>(dom: &D, node: &D::Node, rect: &Rect, viewport: &Viewport) -> Option<RegionMask> {
    let region = classify_region(rect, viewport)?;
    if region != RegionMask::MAIN && in_primary_content(dom, node) {
        return Some(RegionMask::MAIN);
    }
    Some(region)
}

// =============================================================================
// Candidates
// =============================================================================

/// Attribute anchors taken from text keep at most this many characters.
pub const ANCHOR_MAX_CHARS: usize = 80;

/// A node a strategy believes belongs to a category.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate<N> {
    pub node: N,
    pub category: CategoryId,
    /// Case-folded text that produced the match. Attribute matches use the
    /// node's `aria-label`, else the start of its text; empty when it has
    /// neither.
    pub anchor: String,
}

fn attribute_anchor<D: Dom>(dom: &D, node: &D::Node) -> String {
    if let Some(label) = dom.attribute(node, "aria-label") {
        let label = label.trim();
        if !label.is_empty() {
            return label.to_lowercase();
        }
    }
    let text = dom.text_content(node).unwrap_or_default();
    let head: String = text.trim().chars().take(ANCHOR_MAX_CHARS).collect();
    head.trim_end().to_lowercase()
}

// =============================================================================
// Strategy
// =============================================================================

/// One detector. Tables are `'static` so the category registry is a plain
/// static table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Strategy {
    /// Direct text, trimmed and case-folded, equals one of `labels`.
    ExactLabel {
        tags: &'static [&'static str],
        labels: &'static [&'static str],
    },
    /// Subtree text, case-folded, contains one of `phrases`. Elements whose
    /// text is longer than `max_text_len` characters are not signal text.
    Phrase {
        tags: &'static [&'static str],
        phrases: &'static [&'static str],
        max_text_len: usize,
    },
    /// Element matches one of the attribute selectors.
    Attribute { selectors: &'static [AttrSelector] },
    /// Element matches one of the selectors and its whole text, case-folded,
    /// contains one of `words` as a whole word. No length cutoff: this reads
    /// entire posts.
    ContainerText {
        selectors: &'static [AttrSelector],
        words: &'static [&'static str],
    },
    /// Candidates of `inner` whose box lies in one of `regions`.
    Geometry {
        regions: RegionMask,
        inner: &'static Strategy,
    },
}

impl Strategy {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ExactLabel { .. } => "exact-label",
            Self::Phrase { .. } => "phrase",
            Self::Attribute { .. } => "attribute",
            Self::ContainerText { .. } => "container-text",
            Self::Geometry { .. } => "geometry",
        }
    }

    /// Run the strategy over `scope` (inclusive).
    pub fn collect<D: Dom>(
        &self,
        dom: &D,
        scope: &D::Node,
        category: CategoryId,
    ) -> Result<Vec<Candidate<D::Node>>, DomError> {
        let mut out = Vec::new();

        match *self {
            Self::ExactLabel { tags, labels } => {
                for node in dom.elements_by_tag(scope, tags)? {
                    let text = dom.own_text(&node)?;
                    let text = text.trim();
                    if text.is_empty() {
                        continue;
                    }
                    let folded = text.to_lowercase();
                    if labels.iter().any(|label| label.to_lowercase() == folded) {
                        out.push(Candidate { node, category, anchor: folded });
                    }
                }
            }
            Self::Phrase { tags, phrases, max_text_len } => {
                for node in dom.elements_by_tag(scope, tags)? {
                    let text = dom.text_content(&node)?;
                    if text.chars().count() > max_text_len {
                        continue;
                    }
                    let folded = text.to_lowercase();
                    if let Some(phrase) = phrases.iter().find(|p| folded.contains(&p.to_lowercase())) {
                        out.push(Candidate {
                            node,
                            category,
                            anchor: phrase.to_lowercase(),
                        });
                    }
                }
            }
            Self::Attribute { selectors } => {
                for selector in selectors {
                    for node in dom.select(scope, selector)? {
                        if !out.iter().any(|c: &Candidate<D::Node>| c.node == node) {
                            let anchor = attribute_anchor(dom, &node);
                            out.push(Candidate { node, category, anchor });
                        }
                    }
                }
            }
            Self::ContainerText { selectors, words } => {
                for selector in selectors {
                    for node in dom.select(scope, selector)? {
                        if out.iter().any(|c: &Candidate<D::Node>| c.node == node) {
                            continue;
                        }
                        let text = dom.text_content(&node)?.to_lowercase();
                        if let Some(word) = words.iter().map(|w| w.to_lowercase()).find(|w| contains_word(&text, w)) {
                            out.push(Candidate { node, category, anchor: word });
                        }
                    }
                }
            }
            Self::Geometry { regions, inner } => {
                let viewport = dom.viewport();
                for candidate in inner.collect(dom, scope, category)? {
                    let rect = dom.bounding_rect(&candidate.node)?;
                    if region_of(dom, &candidate.node, &rect, &viewport).is_some_and(|r| regions.intersects(r)) {
                        out.push(candidate);
                    }
                }
            }
        }

        Ok(out)
    }
}
