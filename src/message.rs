//! Notification messages accepted by the connection actor.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::{
    frame::{self, FrameError},
    payload::{self, Alert},
    token::DeviceToken,
};

/// One notification to deliver to a device.
///
/// Immutable per send: the actor reads it, encodes the payload and frames it,
/// but never mutates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationMessage {
    /// Target device token.
    pub token: DeviceToken,
    /// Alert content; `None` sends no alert field.
    pub alert: Option<Alert>,
    /// Badge count to display on the application icon.
    pub badge: Option<i64>,
    /// Sound name to play on delivery.
    pub sound: Option<String>,
    /// Extra top-level payload fields. Only text and integer values are
    /// emitted; other kinds are dropped during encoding.
    pub extra: BTreeMap<String, Value>,
}

impl NotificationMessage {
    /// Create an empty notification for the given device.
    #[must_use]
    pub const fn new(token: DeviceToken) -> Self {
        Self {
            token,
            alert: None,
            badge: None,
            sound: None,
            extra: BTreeMap::new(),
        }
    }

    /// Encode this message into its complete wire frame.
    ///
    /// # Errors
    /// Returns an error if the payload fails to serialize or exceeds the
    /// 16-bit length field.
    #[must_use = "use the encoded frame"]
    pub fn to_frame(&self) -> Result<Vec<u8>, FrameError> {
        let payload = payload::encode(
            self.alert.as_ref(),
            self.badge,
            self.sound.as_deref(),
            &self.extra,
        )?;
        frame::encode_frame(&self.token, &payload)
    }
}
