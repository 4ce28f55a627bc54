//! Core type definitions for CleanFeed
//!
//! Category identifiers, their storage keys, and the geometry primitives the
//! matcher strategies and the resolver share.

use std::fmt;

use serde::{Serialize, Serializer};

// =============================================================================
// Category Identifiers
// =============================================================================

/// A suppressible class of page content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum CategoryId {
    /// "People you may know" feed units and widgets
    FriendSuggestions = 0,
    /// Reels trays, reels feed units, reels links
    Reels = 1,
    /// Friend request modules
    FriendRequests = 2,
    /// Birthday reminders in the right rail
    Birthdays = 3,
    /// Contacts list in the right rail
    Contacts = 4,
    /// Auxiliary shortcuts in the left rail
    LeftRailExtras = 5,
    /// Watch / Video navigation entries
    Watch = 6,
    /// Marketplace navigation entries
    Marketplace = 7,
    /// The "Groups" tab in the top navigation bar
    TopNavGroups = 8,
    /// Gaming navigation entries
    Gaming = 9,
}

impl CategoryId {
    /// Every category, in registry order.
    pub const ALL: [CategoryId; 10] = [
        Self::FriendSuggestions,
        Self::Reels,
        Self::FriendRequests,
        Self::Birthdays,
        Self::Contacts,
        Self::LeftRailExtras,
        Self::Watch,
        Self::Marketplace,
        Self::TopNavGroups,
        Self::Gaming,
    ];

    /// Stable identifier, also written as the stamp attribute value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FriendSuggestions => "friend-suggestions",
            Self::Reels => "reels",
            Self::FriendRequests => "friend-requests",
            Self::Birthdays => "birthdays",
            Self::Contacts => "contacts",
            Self::LeftRailExtras => "left-rail-extras",
            Self::Watch => "watch",
            Self::Marketplace => "marketplace",
            Self::TopNavGroups => "top-nav-groups",
            Self::Gaming => "gaming",
        }
    }

    /// Key used by the settings store and the update message.
    pub fn storage_key(self) -> &'static str {
        match self {
            Self::FriendSuggestions => "hidePeopleYouMayKnow",
            Self::Reels => "hideReels",
            Self::FriendRequests => "hideFriendRequests",
            Self::Birthdays => "hideBirthdays",
            Self::Contacts => "hideContacts",
            Self::LeftRailExtras => "hideLeftSidebar",
            Self::Watch => "hideWatch",
            Self::Marketplace => "hideMarketplace",
            Self::TopNavGroups => "hideGroups",
            Self::Gaming => "hideGaming",
        }
    }

    /// Flag used when the settings store has no value for this category.
    pub fn default_enabled(self) -> bool {
        matches!(
            self,
            Self::FriendSuggestions | Self::Reels | Self::LeftRailExtras
        )
    }

    /// Parse a category from its identifier or its storage key.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|id| id.as_str() == s || id.storage_key() == s)
    }

    /// Single-bit mask for this category.
    pub fn mask(self) -> CategoryMask {
        CategoryMask::from_bits_truncate(1 << self as u16)
    }
}

impl TryFrom<u8> for CategoryId {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL.get(value as usize).copied().ok_or(())
    }
}

impl Serialize for CategoryId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Category Mask
// =============================================================================

bitflags::bitflags! {
    /// Set of enabled categories.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CategoryMask: u16 {
        const FRIEND_SUGGESTIONS = 1 << 0;
        const REELS = 1 << 1;
        const FRIEND_REQUESTS = 1 << 2;
        const BIRTHDAYS = 1 << 3;
        const CONTACTS = 1 << 4;
        const LEFT_RAIL_EXTRAS = 1 << 5;
        const WATCH = 1 << 6;
        const MARKETPLACE = 1 << 7;
        const TOP_NAV_GROUPS = 1 << 8;
        const GAMING = 1 << 9;
    }
}

impl CategoryMask {
    pub fn contains_id(self, id: CategoryId) -> bool {
        self.contains(id.mask())
    }
}

// =============================================================================
// Page Regions
// =============================================================================

bitflags::bitflags! {
    /// Coarse page regions used to disambiguate identical labels.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RegionMask: u8 {
        /// Fixed navigation bar across the top of the page
        const TOP_BAR = 1 << 0;
        /// Shortcut column on the left, below the top bar
        const LEFT_RAIL = 1 << 1;
        /// Contacts / birthdays column on the right, below the top bar
        const RIGHT_RAIL = 1 << 2;
        /// Feed column
        const MAIN = 1 << 3;
        /// Both side columns
        const RAILS = Self::LEFT_RAIL.bits() | Self::RIGHT_RAIL.bits();
        /// Top bar or left rail (global navigation entries)
        const NAVIGATION = Self::TOP_BAR.bits() | Self::LEFT_RAIL.bits();
    }
}

// =============================================================================
// Geometry
// =============================================================================

/// Bounding box in viewport coordinates, CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Unrendered nodes report an all-zero box.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 && self.height <= 0.0
    }
}

/// Layout viewport size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 800.0,
        }
    }
}

// =============================================================================
// Inline Style
// =============================================================================

/// An inline style declaration as read back from a node.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StyleValue {
    pub value: String,
    pub important: bool,
}

impl StyleValue {
    pub fn important(value: &str) -> Self {
        Self {
            value: value.to_string(),
            important: true,
        }
    }
}
