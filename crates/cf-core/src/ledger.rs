//! Suppression Ledger
//!
//! Tracks the nodes this engine hid. Each hidden node carries a stamp
//! attribute, so re-matching it is a no-op, and the ledger remembers the inline
//! values it overwrote so `restore_all` hands the node back exactly as found.

use std::fmt;

use crate::dom::{AttrSelector, Dom, DomError};
use crate::types::{CategoryId, StyleValue};

/// Attribute written on every hidden node; its value is the category id.
pub const STAMP_ATTR: &str = "data-cf-hidden";

/// Inline properties forced to collapse a node.
pub const COLLAPSE_STYLES: [(&str, &str); 4] = [
    ("display", "none"),
    ("visibility", "hidden"),
    ("height", "0"),
    ("overflow", "hidden"),
];

type PriorStyles = [Option<StyleValue>; COLLAPSE_STYLES.len()];

const STAMPED: AttrSelector = AttrSelector::present(None, STAMP_ATTR);

#[derive(Debug, Clone)]
struct Record<N> {
    node: N,
    category: CategoryId,
    prior: PriorStyles,
}

/// Nodes currently hidden by the engine.
#[derive(Debug, Clone)]
pub struct SuppressionLedger<N> {
    records: Vec<Record<N>>,
}

impl<N> Default for SuppressionLedger<N> {
    fn default() -> Self {
        Self { records: Vec::new() }
    }
}

impl<N: Clone + PartialEq + fmt::Debug> SuppressionLedger<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of recorded nodes hidden for `category`.
    pub fn hidden_by(&self, category: CategoryId) -> usize {
        self.records.iter().filter(|r| r.category == category).count()
    }

    /// Category that hid `node`, if the ledger knows it.
    pub fn category_of(&self, node: &N) -> Option<CategoryId> {
        self.records.iter().find(|r| r.node == *node).map(|r| r.category)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (&N, CategoryId)> + '_ {
        self.records.iter().map(|r| (&r.node, r.category))
    }

    /// Collapse `node` for `category`. Returns `Ok(false)` when the node is
    /// already stamped.
    ///
    /// A stamped node unknown to the ledger (a previously pruned node the host
    /// re-attached) is adopted so `restore_all` still reaches it.
    pub fn apply<D: Dom<Node = N>>(&mut self, dom: &mut D, node: &N, category: CategoryId) -> Result<bool, DomError> {
        if let Some(stamp) = dom.attribute(node, STAMP_ATTR) {
            if self.category_of(node).is_none() {
                let owner = CategoryId::parse(&stamp).unwrap_or(category);
                self.records.push(Record {
                    node: node.clone(),
                    category: owner,
                    prior: Default::default(),
                });
            }
            return Ok(false);
        }

        let prior: PriorStyles = COLLAPSE_STYLES.map(|(name, _)| dom.style_property(node, name));

        for (name, value) in COLLAPSE_STYLES {
            if let Err(e) = dom.set_style_property(node, name, &StyleValue::important(value)) {
                restore_styles(dom, node, &prior);
                return Err(e);
            }
        }
        if let Err(e) = dom.set_attribute(node, STAMP_ATTR, category.as_str()) {
            restore_styles(dom, node, &prior);
            return Err(e);
        }

        self.records.push(Record {
            node: node.clone(),
            category,
            prior,
        });
        Ok(true)
    }

    /// Un-hide every recorded node still in the document and empty the
    /// ledger. Returns how many nodes were restored.
    ///
    /// Stamped nodes the ledger no longer knows (pruned while detached, then
    /// re-attached by the host) are un-hidden too; their prior inline values
    /// went with the record, so the collapse properties are just removed.
    pub fn restore_all<D: Dom<Node = N>>(&mut self, dom: &mut D) -> usize {
        let mut restored = 0;
        for record in self.records.drain(..) {
            if !dom.is_connected(&record.node) {
                continue;
            }
            restore_styles(dom, &record.node, &record.prior);
            clear_stamp(dom, &record.node);
            restored += 1;
        }
        restored + clear_strays(dom)
    }

    /// Forget nodes the host page removed. Returns how many were dropped.
    pub fn prune<D: Dom<Node = N>>(&mut self, dom: &D) -> usize {
        let before = self.records.len();
        self.records.retain(|r| dom.is_connected(&r.node));
        before - self.records.len()
    }
}

fn clear_stamp<D: Dom>(dom: &mut D, node: &D::Node) {
    if let Err(e) = dom.remove_attribute(node, STAMP_ATTR) {
        log::debug!("failed to clear stamp on {:?}: {}", node, e);
    }
}

fn clear_strays<D: Dom>(dom: &mut D) -> usize {
    let Some(root) = dom.document_element() else {
        return 0;
    };
    let strays = match dom.select(&root, &STAMPED) {
        Ok(strays) => strays,
        Err(e) => {
            log::debug!("stamp scan failed: {e}");
            return 0;
        }
    };
    let unknown: PriorStyles = Default::default();
    for node in &strays {
        log::trace!("un-hiding unrecorded stamped node {:?}", node);
        restore_styles(dom, node, &unknown);
        clear_stamp(dom, node);
    }
    strays.len()
}

fn restore_styles<D: Dom>(dom: &mut D, node: &D::Node, prior: &PriorStyles) {
    for ((name, _), value) in COLLAPSE_STYLES.iter().zip(prior) {
        let result = match value {
            Some(value) => dom.set_style_property(node, name, value),
            None => dom.remove_style_property(node, name),
        };
        if let Err(e) = result {
            log::debug!("failed to restore {} on {:?}: {}", name, node, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::MemoryDom;

    #[test]
    fn test_apply_collapses_and_stamps_once() {
        let mut dom = MemoryDom::default();
        let body = dom.body_id();
        let card = dom.append(body, "div");
        let mut ledger = SuppressionLedger::new();

        assert_eq!(ledger.apply(&mut dom, &card, CategoryId::Reels), Ok(true));
        assert!(dom.is_collapsed(card));
        assert_eq!(dom.attribute(&card, STAMP_ATTR).as_deref(), Some("reels"));
        assert_eq!(
            dom.style_property(&card, "height"),
            Some(StyleValue::important("0"))
        );

        assert_eq!(ledger.apply(&mut dom, &card, CategoryId::Reels), Ok(false));
        assert_eq!(ledger.apply(&mut dom, &card, CategoryId::Watch), Ok(false));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.category_of(&card), Some(CategoryId::Reels));
    }

    #[test]
    fn test_restore_returns_host_styles() {
        let mut dom = MemoryDom::default();
        let body = dom.body_id();
        let card = dom.append(body, "div");
        dom.set_style(card, "display", StyleValue { value: "flex".into(), important: false });
        dom.set_style(card, "color", StyleValue { value: "red".into(), important: false });
        dom.set_attr(card, "data-pagelet", "FeedUnit_3");
        let styles_before = dom.inline_style(card);
        let attrs_before = dom.attributes(card);

        let mut ledger = SuppressionLedger::new();
        ledger.apply(&mut dom, &card, CategoryId::FriendSuggestions).unwrap();
        assert_eq!(ledger.restore_all(&mut dom), 1);

        let mut after = dom.inline_style(card);
        let mut before = styles_before;
        after.sort_by(|a, b| a.0.cmp(&b.0));
        before.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(after, before);
        assert_eq!(dom.attributes(card), attrs_before);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_restore_skips_removed_nodes() {
        let mut dom = MemoryDom::default();
        let body = dom.body_id();
        let kept = dom.append(body, "div");
        let gone = dom.append(body, "div");
        let mut ledger = SuppressionLedger::new();
        ledger.apply(&mut dom, &kept, CategoryId::Reels).unwrap();
        ledger.apply(&mut dom, &gone, CategoryId::Reels).unwrap();

        dom.detach(gone);
        assert_eq!(ledger.restore_all(&mut dom), 1);
        assert!(ledger.is_empty());
        assert!(!dom.is_collapsed(kept));
    }

    #[test]
    fn test_prune_and_adopt() {
        let mut dom = MemoryDom::default();
        let body = dom.body_id();
        let card = dom.append(body, "div");
        let mut ledger = SuppressionLedger::new();
        ledger.apply(&mut dom, &card, CategoryId::Contacts).unwrap();

        dom.detach(card);
        assert_eq!(ledger.prune(&dom), 1);
        assert!(ledger.is_empty());

        // Host re-attaches the stamped node; the next match adopts it.
        let card = dom.append(body, "div");
        dom.set_attr(card, STAMP_ATTR, "contacts");
        assert_eq!(ledger.apply(&mut dom, &card, CategoryId::Birthdays), Ok(false));
        assert_eq!(ledger.hidden_by(CategoryId::Contacts), 1);
        assert_eq!(ledger.restore_all(&mut dom), 1);
        assert_eq!(dom.attribute(&card, STAMP_ATTR), None);
    }

    #[test]
    fn test_restore_reaches_reattached_nodes_the_ledger_forgot() {
        let mut dom = MemoryDom::default();
        let body = dom.body_id();
        let feed = dom.append(body, "div");
        let card = dom.append(feed, "div");
        dom.set_style(card, "color", StyleValue { value: "red".into(), important: false });
        let mut ledger = SuppressionLedger::new();
        ledger.apply(&mut dom, &card, CategoryId::Reels).unwrap();

        dom.detach(card);
        assert_eq!(ledger.prune(&dom), 1);
        dom.attach(feed, card);
        assert!(dom.is_collapsed(card));

        assert_eq!(ledger.restore_all(&mut dom), 1);
        assert!(!dom.is_collapsed(card));
        assert_eq!(dom.attribute(&card, STAMP_ATTR), None);
        assert_eq!(
            dom.inline_style(card),
            vec![("color".to_string(), StyleValue { value: "red".into(), important: false })]
        );
        // Nothing stamped is left, so a second restore is a no-op.
        assert_eq!(ledger.restore_all(&mut dom), 0);
    }
}
