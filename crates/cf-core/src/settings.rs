//! Settings Bridge types
//!
//! The settings store itself lives outside the engine. This module defines the
//! snapshot the engine caches, its JSON shape (storage key -> bool), and the
//! fallback chain used at startup: each [`SettingsSource`] is tried in order
//! and the built-in defaults apply when none yields a snapshot.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::types::{CategoryId, CategoryMask};

/// Error reported by a settings source.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("settings store unavailable: {0}")]
    Unavailable(String),
    #[error("malformed settings: {0}")]
    Malformed(String),
}

// =============================================================================
// Snapshot
// =============================================================================

/// Category flags in effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingsSnapshot {
    enabled: CategoryMask,
}

impl Default for SettingsSnapshot {
    fn default() -> Self {
        Self::defaults()
    }
}

impl SettingsSnapshot {
    /// Hard-coded per-category defaults.
    pub fn defaults() -> Self {
        let enabled = CategoryId::ALL
            .into_iter()
            .filter(|id| id.default_enabled())
            .fold(CategoryMask::empty(), |acc, id| acc | id.mask());
        Self { enabled }
    }

    pub fn all_disabled() -> Self {
        Self {
            enabled: CategoryMask::empty(),
        }
    }

    pub fn from_mask(enabled: CategoryMask) -> Self {
        Self { enabled }
    }

    pub fn mask(&self) -> CategoryMask {
        self.enabled
    }

    pub fn get(&self, id: CategoryId) -> bool {
        self.enabled.contains_id(id)
    }

    pub fn set(&mut self, id: CategoryId, enabled: bool) {
        self.enabled.set(id.mask(), enabled);
    }

    /// Build from a JSON object keyed by storage key (or category id).
    ///
    /// Missing or non-boolean entries take the category default; unknown keys
    /// are ignored.
    pub fn from_json(value: &Value) -> Result<Self, SettingsError> {
        let object = value
            .as_object()
            .ok_or_else(|| SettingsError::Malformed(format!("expected an object, got {}", json_kind(value))))?;
        Ok(Self::defaults().merged(object))
    }

    /// Copy of `self` with the boolean entries of `object` applied on top.
    /// Missing or non-boolean entries keep the current flag.
    pub fn merged(&self, object: &Map<String, Value>) -> Self {
        let mut snapshot = *self;
        for (key, value) in object {
            let Some(id) = CategoryId::parse(key) else {
                log::trace!("ignoring unknown settings key {key}");
                continue;
            };
            match value.as_bool() {
                Some(flag) => snapshot.set(id, flag),
                None => log::debug!("non-boolean value for {key}, keeping {}", snapshot.get(id)),
            }
        }
        snapshot
    }

    /// JSON object keyed by storage key, every category present.
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        for id in CategoryId::ALL {
            map.insert(id.storage_key().to_string(), Value::Bool(self.get(id)));
        }
        Value::Object(map)
    }
}

impl Serialize for SettingsSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SettingsSnapshot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_json(&value).map_err(serde::de::Error::custom)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// =============================================================================
// Sources
// =============================================================================

/// A place settings may be loaded from.
pub trait SettingsSource {
    fn name(&self) -> &str;

    /// `Ok(None)` when the source works but has nothing stored.
    fn load(&self) -> Result<Option<SettingsSnapshot>, SettingsError>;
}

/// Source over an already-fetched JSON value (a storage read result).
#[derive(Debug, Clone)]
pub struct JsonSource {
    name: String,
    value: Result<Value, SettingsError>,
}

impl JsonSource {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value: Ok(value),
        }
    }

    /// A source whose read already failed.
    pub fn failed(name: impl Into<String>, error: SettingsError) -> Self {
        Self {
            name: name.into(),
            value: Err(error),
        }
    }
}

impl SettingsSource for JsonSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn load(&self) -> Result<Option<SettingsSnapshot>, SettingsError> {
        let value = self.value.as_ref().map_err(Clone::clone)?;
        match value {
            Value::Null => Ok(None),
            Value::Object(map) if map.is_empty() => Ok(None),
            other => SettingsSnapshot::from_json(other).map(Some),
        }
    }
}

/// Try each source in order, falling back to the defaults. Never fails.
pub fn load_settings(sources: &[&dyn SettingsSource]) -> SettingsSnapshot {
    for source in sources {
        match source.load() {
            Ok(Some(snapshot)) => {
                log::debug!("settings loaded from {}", source.name());
                return snapshot;
            }
            Ok(None) => log::debug!("{} has no stored settings", source.name()),
            Err(e) => log::warn!("settings source {} failed: {}", source.name(), e),
        }
    }
    log::info!("using default settings");
    SettingsSnapshot::defaults()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let snapshot = SettingsSnapshot::defaults();
        assert!(snapshot.get(CategoryId::FriendSuggestions));
        assert!(snapshot.get(CategoryId::Reels));
        assert!(snapshot.get(CategoryId::LeftRailExtras));
        assert!(!snapshot.get(CategoryId::Watch));
        assert!(!snapshot.get(CategoryId::TopNavGroups));
    }

    #[test]
    fn test_from_json_merges_with_defaults() {
        let value = json!({
            "hideReels": false,
            "hideGaming": true,
            "hideWatch": "yes",
            "hideStories": true,
        });
        let snapshot = SettingsSnapshot::from_json(&value).unwrap();
        assert!(!snapshot.get(CategoryId::Reels));
        assert!(snapshot.get(CategoryId::Gaming));
        assert!(!snapshot.get(CategoryId::Watch));
        assert!(snapshot.get(CategoryId::FriendSuggestions));

        assert!(matches!(
            SettingsSnapshot::from_json(&json!([true])),
            Err(SettingsError::Malformed(_))
        ));
    }

    #[test]
    fn test_merged_keeps_unmentioned_flags() {
        let mut current = SettingsSnapshot::defaults();
        current.set(CategoryId::Contacts, true);
        current.set(CategoryId::Reels, false);

        let update = json!({ "hideWatch": true, "hideContacts": "no" });
        let merged = current.merged(update.as_object().unwrap());
        assert!(merged.get(CategoryId::Watch));
        assert!(merged.get(CategoryId::Contacts));
        assert!(!merged.get(CategoryId::Reels));
        assert!(merged.get(CategoryId::FriendSuggestions));
    }

    #[test]
    fn test_json_shape_uses_storage_keys() {
        let snapshot = SettingsSnapshot::defaults();
        let value = serde_json::to_value(snapshot).unwrap();
        assert_eq!(value["hidePeopleYouMayKnow"], json!(true));
        assert_eq!(value["hideGroups"], json!(false));
        let back: SettingsSnapshot = serde_json::from_value(value).unwrap();
        assert_eq!(back, snapshot);
    }

    #[test]
    fn test_fallback_chain() {
        let sync = JsonSource::failed("sync", SettingsError::Unavailable("quota".into()));
        let local = JsonSource::new("local", json!({ "hideContacts": true }));
        let snapshot = load_settings(&[&sync, &local]);
        assert!(snapshot.get(CategoryId::Contacts));

        let empty_sync = JsonSource::new("sync", json!({}));
        let broken_local = JsonSource::new("local", json!("garbage"));
        assert_eq!(load_settings(&[&empty_sync, &broken_local]), SettingsSnapshot::defaults());
        assert_eq!(load_settings(&[]), SettingsSnapshot::defaults());
    }
}
