//! JSON payload encoding for the gateway's notification format.
//!
//! The payload is one flat JSON object holding the reserved `alert`, `badge`
//! and `sound` keys plus any caller-supplied extra fields. The gateway parses
//! the object by key name; key order carries no meaning.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

/// Key for the alert text or localized-alert object.
pub const KEY_ALERT: &str = "alert";
/// Key for the badge count.
pub const KEY_BADGE: &str = "badge";
/// Key for the sound name.
pub const KEY_SOUND: &str = "sound";

/// Alert content of a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alert {
    /// Literal alert text shown to the user.
    Text(String),
    /// Localized alert resolved on the device from a key and arguments.
    Localized(LocalizedAlert),
}

/// A structured alert referencing a localization key instead of literal text.
///
/// Optional fields are omitted from the encoded object entirely; `loc-key`
/// and `loc-args` are always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalizedAlert {
    /// Body text shown alongside the localized alert.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Localization key for the action button caption.
    #[serde(rename = "action-loc-key", skip_serializing_if = "Option::is_none")]
    pub action_loc_key: Option<String>,
    /// Launch image file name.
    #[serde(rename = "launch-image", skip_serializing_if = "Option::is_none")]
    pub launch_image: Option<String>,
    /// Localization key for the alert message.
    #[serde(rename = "loc-key")]
    pub loc_key: String,
    /// Format arguments for the localized message, in order.
    #[serde(rename = "loc-args")]
    pub loc_args: Vec<String>,
}

impl LocalizedAlert {
    /// Create a localized alert with only the mandatory key and arguments.
    #[must_use]
    pub const fn new(loc_key: String, loc_args: Vec<String>) -> Self {
        Self {
            body: None,
            action_loc_key: None,
            launch_image: None,
            loc_key,
            loc_args,
        }
    }
}

/// Whether an extra value survives encoding.
///
/// Only text and integers are representable; every other kind is silently
/// dropped rather than emitted as `null`.
fn emittable(value: &Value) -> bool {
    match value {
        Value::String(_) => true,
        Value::Number(n) => n.is_i64() || n.is_u64(),
        _ => false,
    }
}

/// Build the payload as a JSON value.
///
/// Absent alert, badge or sound fields are dropped entirely. Extra entries
/// whose value is neither text nor an integer are dropped as well.
///
/// # Errors
/// Returns an error if a localized alert fails to serialize.
#[must_use = "handle the result"]
pub fn to_value(
    alert: Option<&Alert>,
    badge: Option<i64>,
    sound: Option<&str>,
    extra: &BTreeMap<String, Value>,
) -> Result<Value, serde_json::Error> {
    let mut object = Map::new();
    match alert {
        Some(Alert::Text(text)) => {
            object.insert(KEY_ALERT.to_owned(), Value::String(text.clone()));
        }
        Some(Alert::Localized(localized)) => {
            object.insert(KEY_ALERT.to_owned(), serde_json::to_value(localized)?);
        }
        None => {}
    }
    if let Some(count) = badge {
        object.insert(KEY_BADGE.to_owned(), Value::from(count));
    }
    if let Some(name) = sound {
        object.insert(KEY_SOUND.to_owned(), Value::String(name.to_owned()));
    }
    for (key, value) in extra {
        if emittable(value) {
            object.insert(key.clone(), value.clone());
        }
    }
    Ok(Value::Object(object))
}

/// Encode the payload as UTF-8 JSON bytes.
///
/// # Errors
/// Returns an error if serialization fails.
#[must_use = "handle the result"]
pub fn encode(
    alert: Option<&Alert>,
    badge: Option<i64>,
    sound: Option<&str>,
    extra: &BTreeMap<String, Value>,
) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(&to_value(alert, badge, sound, extra)?)
}
