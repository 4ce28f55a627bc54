//! Category Registry
//!
//! Static table of suppressible categories: which strategies find each one,
//! and how far and how carefully its candidates may climb. The table is
//! immutable; only the enabled mask changes, and only through
//! [`CategoryRegistry::apply_settings`].

use crate::dom::AttrSelector;
use crate::resolver::{BoundaryMarker, ClimbPolicy, HeightRange};
use crate::settings::SettingsSnapshot;
use crate::strategy::Strategy;
use crate::types::{CategoryId, CategoryMask, RegionMask};

/// Static description of one category.
#[derive(Debug)]
pub struct CategoryDef {
    pub id: CategoryId,
    pub label: &'static str,
    /// Run in order; results are unioned.
    pub strategies: &'static [Strategy],
    pub climb: ClimbPolicy,
    /// Further strategies whose candidates climb under their own policy,
    /// e.g. the navigation links of a feed category.
    pub extra: &'static [Detector],
}

/// Strategies paired with the climb their candidates take.
#[derive(Debug)]
pub struct Detector {
    pub strategies: &'static [Strategy],
    pub climb: ClimbPolicy,
}

impl CategoryDef {
    /// Main strategies with the category climb, then every extra detector.
    pub fn detectors(&self) -> impl Iterator<Item = (&'static [Strategy], &ClimbPolicy)> + '_ {
        std::iter::once((self.strategies, &self.climb))
            .chain(self.extra.iter().map(|d| (d.strategies, &d.climb)))
    }
}

// =============================================================================
// Tunables
// =============================================================================

/// Tags that carry headings and short labels.
pub const LABEL_TAGS: &[&str] = &["span", "h2", "h3", "h4", "a", "strong"];

/// Longer texts are containers, not mentions.
pub const PHRASE_MAX_TEXT_LEN: usize = 120;

const NAV_MARKERS: &[BoundaryMarker] = &[
    BoundaryMarker::Attr(AttrSelector::equals(None, "role", "listitem")),
    BoundaryMarker::Tag("li"),
    BoundaryMarker::Attr(AttrSelector::present(Some("div"), "data-testid")),
];

const RAIL_MARKERS: &[BoundaryMarker] = &[BoundaryMarker::Attr(AttrSelector::equals(None, "role", "region"))];

const FEED_MARKERS: &[BoundaryMarker] = &[
    BoundaryMarker::Attr(AttrSelector::present(None, "data-pagelet")),
    BoundaryMarker::Attr(AttrSelector::equals(None, "role", "region")),
    BoundaryMarker::Attr(AttrSelector::equals(None, "role", "article")),
];

/// Compact navigation entries: shallow climb, small boxes.
pub const NAV_CLIMB: ClimbPolicy = ClimbPolicy {
    max_depth: 4,
    height: HeightRange::new(20.0, 120.0),
    markers: NAV_MARKERS,
    preserve: &["home", "shortcuts"],
};

/// Side-rail modules (contacts, birthdays, requests).
pub const RAIL_CLIMB: ClimbPolicy = ClimbPolicy {
    max_depth: 6,
    height: HeightRange::new(40.0, 900.0),
    markers: RAIL_MARKERS,
    preserve: &["shortcuts"],
};

/// Feed cards and trays: deep climb, tall boxes.
pub const FEED_CLIMB: ClimbPolicy = ClimbPolicy {
    max_depth: 8,
    height: HeightRange::new(100.0, 2400.0),
    markers: FEED_MARKERS,
    preserve: &[],
};

// =============================================================================
// Strategy Tables
// =============================================================================

const ARTICLES: &[AttrSelector] = &[AttrSelector::equals(None, "role", "article")];

const PYMK_ARTICLES: Strategy = Strategy::ContainerText {
    selectors: ARTICLES,
    words: &["people you may know"],
};

static PYMK_TEXT: Strategy = Strategy::ExactLabel {
    tags: LABEL_TAGS,
    labels: &["People you may know"],
};

static PYMK_PHRASE: Strategy = Strategy::Phrase {
    tags: LABEL_TAGS,
    phrases: &["people you may know"],
    max_text_len: PHRASE_MAX_TEXT_LEN,
};

static REELS_TEXT: Strategy = Strategy::ExactLabel {
    tags: LABEL_TAGS,
    labels: &["Reels", "Reels and short videos"],
};

static REELS_PHRASE: Strategy = Strategy::Phrase {
    tags: LABEL_TAGS,
    phrases: &["reels"],
    max_text_len: PHRASE_MAX_TEXT_LEN,
};

const REELS_ARTICLES: Strategy = Strategy::ContainerText {
    selectors: ARTICLES,
    words: &["reel", "reels"],
};

static REELS_FEED_LINKS: Strategy = Strategy::Attribute {
    selectors: &[AttrSelector::contains(Some("a"), "href", "/reel/")],
};

static REELS_NAV_LINKS: Strategy = Strategy::Attribute {
    selectors: &[
        AttrSelector::equals(Some("a"), "aria-label", "Reels"),
        AttrSelector::equals(Some("a"), "href", "/reel/create/"),
    ],
};

static FRIEND_REQUESTS_TEXT: Strategy = Strategy::ExactLabel {
    tags: LABEL_TAGS,
    labels: &["Friend requests"],
};

static FRIEND_REQUESTS_PHRASE: Strategy = Strategy::Phrase {
    tags: LABEL_TAGS,
    phrases: &["friend request"],
    max_text_len: PHRASE_MAX_TEXT_LEN,
};

static BIRTHDAYS_TEXT: Strategy = Strategy::ExactLabel {
    tags: LABEL_TAGS,
    labels: &["Birthdays"],
};

static BIRTHDAYS_PHRASE: Strategy = Strategy::Phrase {
    tags: LABEL_TAGS,
    phrases: &["birthday today", "birthdays today"],
    max_text_len: PHRASE_MAX_TEXT_LEN,
};

static CONTACTS_TEXT: Strategy = Strategy::ExactLabel {
    tags: LABEL_TAGS,
    labels: &["Contacts"],
};

static LEFT_RAIL_EXTRAS_TEXT: Strategy = Strategy::ExactLabel {
    tags: LABEL_TAGS,
    labels: &[
        "Groups",
        "Marketplace",
        "Watch",
        "Video",
        "Gaming",
        "Play games",
        "Gaming Video",
        "Memories",
        "Saved",
        "Feeds",
        "Events",
        "Pages",
        "Ads Manager",
        "Fundraisers",
        "Messenger Kids",
        "Climate Science Center",
        "Recent ad activity",
        "Orders and payments",
    ],
};

static WATCH_LINKS: Strategy = Strategy::Attribute {
    selectors: &[
        AttrSelector::contains(Some("a"), "href", "/watch"),
        AttrSelector::equals(Some("a"), "aria-label", "Watch"),
        AttrSelector::equals(Some("a"), "aria-label", "Video"),
    ],
};

static MARKETPLACE_LINKS: Strategy = Strategy::Attribute {
    selectors: &[
        AttrSelector::contains(Some("a"), "href", "/marketplace"),
        AttrSelector::equals(Some("a"), "aria-label", "Marketplace"),
    ],
};

static GROUPS_LINKS: Strategy = Strategy::Attribute {
    selectors: &[
        AttrSelector::equals(Some("a"), "aria-label", "Groups"),
        AttrSelector::contains(Some("a"), "href", "/groups"),
    ],
};

static GROUPS_TEXT: Strategy = Strategy::ExactLabel {
    tags: LABEL_TAGS,
    labels: &["Groups"],
};

static GAMING_LINKS: Strategy = Strategy::Attribute {
    selectors: &[
        AttrSelector::contains(Some("a"), "href", "/gaming"),
        AttrSelector::equals(Some("a"), "aria-label", "Gaming"),
    ],
};

// =============================================================================
// Category Table
// =============================================================================

static CATEGORIES: [CategoryDef; 10] = [
    CategoryDef {
        id: CategoryId::FriendSuggestions,
        label: "People you may know",
        strategies: &[
            Strategy::Attribute {
                selectors: &[
                    AttrSelector::equals(Some("div"), "aria-label", "People You May Know"),
                    AttrSelector::equals(Some("div"), "data-testid", "friend_suggestions_unit"),
                    AttrSelector::equals(Some("div"), "data-pagelet", "FeedUnit_PYMK"),
                ],
            },
            Strategy::Geometry { regions: RegionMask::MAIN, inner: &PYMK_TEXT },
            Strategy::Geometry { regions: RegionMask::MAIN, inner: &PYMK_PHRASE },
            PYMK_ARTICLES,
        ],
        climb: FEED_CLIMB,
        extra: &[],
    },
    CategoryDef {
        id: CategoryId::Reels,
        label: "Reels",
        strategies: &[
            Strategy::Attribute {
                selectors: &[
                    AttrSelector::equals(Some("div"), "aria-label", "Reels"),
                    AttrSelector::equals(Some("div"), "aria-label", "Reels and short videos"),
                    AttrSelector::equals(Some("div"), "data-pagelet", "ReelsTrayContainer"),
                    AttrSelector::prefix(Some("div"), "data-pagelet", "VideoReelsChannel_"),
                    AttrSelector::prefix(Some("div"), "data-pagelet", "FeedUnit_Reel"),
                    AttrSelector::equals(Some("div"), "data-pagelet", "ReelStoriesTray"),
                ],
            },
            Strategy::Geometry { regions: RegionMask::MAIN, inner: &REELS_TEXT },
            Strategy::Geometry { regions: RegionMask::MAIN, inner: &REELS_PHRASE },
            Strategy::Geometry { regions: RegionMask::MAIN, inner: &REELS_FEED_LINKS },
            REELS_ARTICLES,
        ],
        climb: FEED_CLIMB,
        extra: &[Detector {
            strategies: &[Strategy::Geometry {
                regions: RegionMask::NAVIGATION,
                inner: &REELS_NAV_LINKS,
            }],
            climb: NAV_CLIMB,
        }],
    },
    CategoryDef {
        id: CategoryId::FriendRequests,
        label: "Friend requests",
        strategies: &[
            Strategy::Attribute {
                selectors: &[AttrSelector::equals(Some("div"), "aria-label", "Friend requests")],
            },
            Strategy::Geometry { regions: RegionMask::RIGHT_RAIL, inner: &FRIEND_REQUESTS_TEXT },
            Strategy::Geometry { regions: RegionMask::RIGHT_RAIL, inner: &FRIEND_REQUESTS_PHRASE },
        ],
        climb: RAIL_CLIMB,
        extra: &[],
    },
    CategoryDef {
        id: CategoryId::Birthdays,
        label: "Birthdays",
        strategies: &[
            Strategy::Geometry { regions: RegionMask::RIGHT_RAIL, inner: &BIRTHDAYS_TEXT },
            Strategy::Geometry { regions: RegionMask::RIGHT_RAIL, inner: &BIRTHDAYS_PHRASE },
        ],
        climb: RAIL_CLIMB,
        extra: &[],
    },
    CategoryDef {
        id: CategoryId::Contacts,
        label: "Contacts",
        strategies: &[
            Strategy::Attribute {
                selectors: &[AttrSelector::equals(Some("div"), "aria-label", "Contacts")],
            },
            Strategy::Geometry { regions: RegionMask::RIGHT_RAIL, inner: &CONTACTS_TEXT },
        ],
        climb: RAIL_CLIMB,
        extra: &[],
    },
    CategoryDef {
        id: CategoryId::LeftRailExtras,
        label: "Left sidebar extras",
        strategies: &[Strategy::Geometry {
            regions: RegionMask::LEFT_RAIL,
            inner: &LEFT_RAIL_EXTRAS_TEXT,
        }],
        climb: NAV_CLIMB,
        extra: &[],
    },
    CategoryDef {
        id: CategoryId::Watch,
        label: "Watch",
        strategies: &[Strategy::Geometry {
            regions: RegionMask::NAVIGATION,
            inner: &WATCH_LINKS,
        }],
        climb: NAV_CLIMB,
        extra: &[],
    },
    CategoryDef {
        id: CategoryId::Marketplace,
        label: "Marketplace",
        strategies: &[Strategy::Geometry {
            regions: RegionMask::NAVIGATION,
            inner: &MARKETPLACE_LINKS,
        }],
        climb: NAV_CLIMB,
        extra: &[],
    },
    CategoryDef {
        id: CategoryId::TopNavGroups,
        label: "Groups (top bar)",
        strategies: &[
            Strategy::Geometry { regions: RegionMask::TOP_BAR, inner: &GROUPS_LINKS },
            Strategy::Geometry { regions: RegionMask::TOP_BAR, inner: &GROUPS_TEXT },
        ],
        climb: NAV_CLIMB,
        extra: &[],
    },
    CategoryDef {
        id: CategoryId::Gaming,
        label: "Gaming",
        strategies: &[Strategy::Geometry {
            regions: RegionMask::NAVIGATION,
            inner: &GAMING_LINKS,
        }],
        climb: NAV_CLIMB,
        extra: &[],
    },
];

/// The built-in category table.
pub fn default_categories() -> &'static [CategoryDef] {
    &CATEGORIES
}

// =============================================================================
// Registry
// =============================================================================

/// Category table plus the enabled flags currently in effect.
#[derive(Debug, Clone)]
pub struct CategoryRegistry {
    table: &'static [CategoryDef],
    enabled: CategoryMask,
}

impl CategoryRegistry {
    /// Built-in table with the flags of `settings`.
    pub fn new(settings: &SettingsSnapshot) -> Self {
        Self::with_table(default_categories(), settings)
    }

    pub fn with_table(table: &'static [CategoryDef], settings: &SettingsSnapshot) -> Self {
        Self {
            table,
            enabled: settings.mask(),
        }
    }

    /// Replace the cached flags.
    pub fn apply_settings(&mut self, settings: &SettingsSnapshot) {
        self.enabled = settings.mask();
    }

    pub fn definitions(&self) -> &'static [CategoryDef] {
        self.table
    }

    pub fn get(&self, id: CategoryId) -> Option<&'static CategoryDef> {
        self.table.iter().find(|def| def.id == id)
    }

    pub fn is_enabled(&self, id: CategoryId) -> bool {
        self.enabled.contains_id(id)
    }

    pub fn enabled_mask(&self) -> CategoryMask {
        self.enabled
    }

    /// Enabled categories in table order.
    pub fn enabled(&self) -> impl Iterator<Item = &'static CategoryDef> + '_ {
        let table: &'static [CategoryDef] = self.table;
        table.iter().filter(move |def| self.enabled.contains_id(def.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_covers_every_category_once() {
        for id in CategoryId::ALL {
            let count = default_categories().iter().filter(|d| d.id == id).count();
            assert_eq!(count, 1, "{id} should appear exactly once");
        }
    }

    #[test]
    fn test_enabled_follows_settings() {
        let defaults = SettingsSnapshot::defaults();
        let mut registry = CategoryRegistry::new(&defaults);
        let enabled: Vec<_> = registry.enabled().map(|d| d.id).collect();
        assert_eq!(
            enabled,
            vec![CategoryId::FriendSuggestions, CategoryId::Reels, CategoryId::LeftRailExtras]
        );

        let mut settings = SettingsSnapshot::all_disabled();
        settings.set(CategoryId::Gaming, true);
        registry.apply_settings(&settings);
        assert!(registry.is_enabled(CategoryId::Gaming));
        assert!(!registry.is_enabled(CategoryId::Reels));
        assert_eq!(registry.enabled().count(), 1);
    }

    #[test]
    fn test_reels_nav_links_climb_as_navigation() {
        let reels = default_categories().iter().find(|d| d.id == CategoryId::Reels).unwrap();
        let climbs: Vec<usize> = reels.detectors().map(|(_, climb)| climb.max_depth).collect();
        assert_eq!(climbs, vec![FEED_CLIMB.max_depth, NAV_CLIMB.max_depth]);
        assert!(default_categories()
            .iter()
            .filter(|d| d.id != CategoryId::Reels)
            .all(|d| d.extra.is_empty()));
    }

    #[test]
    fn test_climb_policies_are_ordered_by_reach() {
        assert!(NAV_CLIMB.max_depth < RAIL_CLIMB.max_depth);
        assert!(RAIL_CLIMB.max_depth < FEED_CLIMB.max_depth);
        assert!(NAV_CLIMB.height.max < FEED_CLIMB.height.max);
        assert!((4..=8).contains(&NAV_CLIMB.max_depth) && (4..=8).contains(&FEED_CLIMB.max_depth));
    }
}
