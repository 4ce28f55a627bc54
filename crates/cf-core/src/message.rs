//! Messages from the settings UI
//!
//! One request is understood: `{ "action": "updateSettings", "settings": {..} }`.
//! Anything else is ignored without a response.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    /// Flags keyed by storage key. Keys left out keep their current value,
    /// see [`crate::SettingsSnapshot::merged`].
    UpdateSettings { settings: Map<String, Value> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Response {
    pub success: bool,
}

impl Response {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// Decode a request, or `None` for unrecognized or malformed messages.
pub fn parse_request(value: &Value) -> Option<Request> {
    match Request::deserialize(value) {
        Ok(request) => Some(request),
        Err(e) => {
            log::debug!("ignoring message: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SettingsSnapshot;
    use crate::types::CategoryId;
    use serde_json::json;

    #[test]
    fn test_update_settings() {
        let msg = json!({
            "action": "updateSettings",
            "settings": { "hideReels": false, "hideWatch": true }
        });
        let Some(Request::UpdateSettings { settings }) = parse_request(&msg) else {
            panic!("expected an update request");
        };
        let snapshot = SettingsSnapshot::defaults().merged(&settings);
        assert!(!snapshot.get(CategoryId::Reels));
        assert!(snapshot.get(CategoryId::Watch));
    }

    #[test]
    fn test_other_messages_are_ignored() {
        assert_eq!(parse_request(&json!({ "action": "getStats" })), None);
        assert_eq!(parse_request(&json!({ "action": "updateSettings" })), None);
        assert_eq!(parse_request(&json!({ "action": "updateSettings", "settings": 3 })), None);
        assert_eq!(parse_request(&json!("updateSettings")), None);
    }

    #[test]
    fn test_response_shape() {
        assert_eq!(serde_json::to_value(Response::ok()).unwrap(), json!({ "success": true }));
    }
}
