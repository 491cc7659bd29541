//! Device token parsing and formatting.
//!
//! The gateway identifies a device by a 32-byte token that callers supply as
//! 64 hexadecimal characters. Tokens are validated at construction so a
//! malformed value can never reach the framing layer.

use thiserror::Error;

/// Length of a raw device token in bytes.
pub const TOKEN_LEN: usize = 32;
/// Length of a device token in its hexadecimal text form.
pub const TOKEN_HEX_LEN: usize = 64;

/// A validated 32-byte device token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceToken([u8; TOKEN_LEN]);

/// Errors that can occur when parsing a device token.
#[derive(Debug, Error, PartialEq)]
pub enum TokenError {
    /// The text form is not exactly 64 characters long.
    #[error("device token must be 64 hex characters, got {0}")]
    BadLength(usize),
    /// The text form contains a character outside `[0-9a-fA-F]`.
    #[error("device token is not valid hex: {0}")]
    BadHex(#[from] hex::FromHexError),
}

impl DeviceToken {
    /// Parse a device token from its 64-character hexadecimal text form.
    ///
    /// # Errors
    /// Returns an error if the input has the wrong length or contains
    /// non-hexadecimal characters.
    #[must_use = "handle the result"]
    pub fn from_hex(text: &str) -> Result<Self, TokenError> {
        if text.len() != TOKEN_HEX_LEN {
            return Err(TokenError::BadLength(text.len()));
        }
        let mut raw = [0u8; TOKEN_LEN];
        hex::decode_to_slice(text, &mut raw)?;
        Ok(Self(raw))
    }

    /// Format the token as lowercase hexadecimal text.
    #[must_use]
    pub fn to_hex(&self) -> String { hex::encode(self.0) }

    /// Return the raw token bytes for framing.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; TOKEN_LEN] { &self.0 }
}

impl From<[u8; TOKEN_LEN]> for DeviceToken {
    fn from(raw: [u8; TOKEN_LEN]) -> Self { Self(raw) }
}

impl std::str::FromStr for DeviceToken {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> { Self::from_hex(s) }
}

impl std::fmt::Display for DeviceToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}
