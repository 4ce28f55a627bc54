//! Synthetic feed pages
//!
//! Generates a realistic page shape (top bar, left rail, feed column, right
//! rail) with a configurable number of feed units. Shared by the benchmark and
//! the CLI performance budget.

use crate::tree::{MemoryDom, NodeId};
use crate::types::{Rect, Viewport};

/// Every n-th feed unit is a reels tray.
pub const REELS_EVERY: usize = 5;
/// Every n-th feed unit is a "people you may know" unit.
pub const SUGGESTIONS_EVERY: usize = 7;

const UNIT_HEIGHT: f64 = 420.0;

const SHORTCUTS: &[(&str, &str)] = &[
    ("Home", "/"),
    ("Friends", "/friends/"),
    ("Groups", "/groups/feed/"),
    ("Marketplace", "/marketplace/"),
    ("Video", "/watch/"),
    ("Memories", "/memories/"),
    ("Saved", "/saved/"),
    ("Gaming Video", "/gaming/feed/"),
];

/// Feed units the default settings are expected to hide.
pub fn expected_feed_hits(units: usize) -> usize {
    (0..units).filter(|i| is_reels(*i) || is_suggestions(*i)).count()
}

fn is_reels(i: usize) -> bool {
    i % REELS_EVERY == REELS_EVERY - 1
}

fn is_suggestions(i: usize) -> bool {
    !is_reels(i) && i % SUGGESTIONS_EVERY == SUGGESTIONS_EVERY - 1
}

/// Build a page with `units` feed units below the fold-independent chrome.
pub fn synthetic_feed(units: usize) -> MemoryDom {
    let mut dom = MemoryDom::new(Viewport::default());
    let body = dom.body_id();

    let banner = dom.append(body, "div");
    dom.set_attr(banner, "role", "banner").set_rect(banner, Rect::new(0.0, 0.0, 1280.0, 56.0));
    let tabs = dom.append(banner, "ul");
    for (i, label) in ["Home", "Video", "Marketplace", "Groups", "Gaming"].into_iter().enumerate() {
        let x = 440.0 + i as f64 * 88.0;
        let tab = dom.append(tabs, "li");
        dom.set_rect(tab, Rect::new(x, 4.0, 80.0, 48.0));
        let link = dom.append(tab, "a");
        dom.set_attr(link, "aria-label", label).set_rect(link, Rect::new(x, 4.0, 80.0, 48.0));
    }

    let rail = dom.append(body, "div");
    dom.set_rect(rail, Rect::new(0.0, 56.0, 360.0, 744.0));
    let list = dom.append(rail, "ul");
    for (i, (label, href)) in SHORTCUTS.iter().enumerate() {
        let y = 64.0 + i as f64 * 48.0;
        let item = dom.append(list, "li");
        dom.set_rect(item, Rect::new(8.0, y, 340.0, 44.0));
        let link = dom.append(item, "a");
        dom.set_attr(link, "href", href).set_rect(link, Rect::new(8.0, y, 340.0, 44.0));
        let span = dom.append_text(link, "span", label);
        dom.set_rect(span, Rect::new(56.0, y + 12.0, 200.0, 20.0));
    }

    let main = dom.append(body, "div");
    dom.set_attr(main, "role", "main")
        .add_class(main, "home-page-content")
        .set_rect(main, Rect::new(360.0, 56.0, 560.0, 744.0));
    for i in 0..units {
        feed_unit(&mut dom, main, i);
    }

    let right = dom.append(body, "div");
    dom.set_rect(right, Rect::new(920.0, 56.0, 360.0, 744.0));
    let contacts = dom.append(right, "div");
    dom.set_attr(contacts, "role", "region").set_rect(contacts, Rect::new(930.0, 400.0, 340.0, 380.0));
    let label = dom.append_text(contacts, "span", "Contacts");
    dom.set_rect(label, Rect::new(940.0, 410.0, 100.0, 20.0));
    for n in 0..12 {
        let row = dom.append_text(contacts, "span", &format!("Contact {n}"));
        dom.set_rect(row, Rect::new(940.0, 440.0 + n as f64 * 28.0, 200.0, 24.0));
    }

    dom
}

fn feed_unit(dom: &mut MemoryDom, main: NodeId, i: usize) -> NodeId {
    let y = 80.0 + i as f64 * UNIT_HEIGHT;
    let unit = dom.append(main, "div");
    dom.set_attr(unit, "data-pagelet", &format!("FeedUnit_{i}"))
        .set_rect(unit, Rect::new(380.0, y, 500.0, UNIT_HEIGHT - 20.0));
    let body = dom.append(unit, "div");
    let header = dom.append(body, "div");

    let title = if is_reels(i) {
        "Reels"
    } else if is_suggestions(i) {
        "People you may know"
    } else {
        "Suggested for you"
    };
    let heading = dom.append_text(header, "h3", title);
    dom.set_rect(heading, Rect::new(400.0, y + 16.0, 240.0, 24.0));

    for line in 0..4 {
        let text = dom.append_text(body, "span", &format!("Post {i} line {line} about hiking and cooking"));
        dom.set_rect(text, Rect::new(400.0, y + 60.0 + line as f64 * 24.0, 460.0, 20.0));
    }
    unit
}
