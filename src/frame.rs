//! Binary wire frame for the gateway's notification command.
//!
//! Each notification is sent as one fixed-layout frame: a command byte, a
//! 16-bit big-endian token length, the raw device token, a 16-bit big-endian
//! payload length and the JSON payload bytes.

#![allow(clippy::big_endian_bytes, reason = "network protocol uses big-endian")]
#![allow(
    clippy::indexing_slicing,
    reason = "slice bounds are validated before indexing"
)]

use thiserror::Error;

use crate::token::{DeviceToken, TOKEN_LEN};

/// Command byte for a simple notification frame.
pub const COMMAND_NOTIFY: u8 = 0;
/// Fixed bytes surrounding the payload: command, token length, token and
/// payload length fields.
pub const FRAME_OVERHEAD: usize = 1 + 2 + TOKEN_LEN + 2;
/// Largest payload representable in the 16-bit length field.
pub const MAX_PAYLOAD_SIZE: usize = u16::MAX as usize;

/// Value of the token length field; matches [`TOKEN_LEN`].
const TOKEN_LEN_FIELD: u16 = 32;

/// Errors that can occur when building or parsing a frame.
#[derive(Debug, Error)]
pub enum FrameError {
    /// Payload exceeds the 16-bit length field.
    #[error("payload is {0} bytes, larger than the 16-bit length field allows")]
    PayloadTooLarge(usize),
    /// Payload serialization failed.
    #[error("payload encoding failed: {0}")]
    Payload(#[from] serde_json::Error),
    /// Buffer is too short to contain a complete frame.
    #[error("buffer too short")]
    ShortBuffer,
    /// A length field disagrees with the actual data.
    #[error("size mismatch")]
    SizeMismatch,
    /// The command byte is not a known command.
    #[error("unknown command {0}")]
    UnknownCommand(u8),
}

/// Read a big-endian `u16` from the provided byte slice.
///
/// # Errors
/// Returns an error if `buf` is shorter than two bytes.
#[must_use = "handle the result"]
pub fn read_u16(buf: &[u8]) -> Result<u16, FrameError> {
    if buf.len() < 2 {
        return Err(FrameError::ShortBuffer);
    }
    Ok(u16::from_be_bytes([buf[0], buf[1]]))
}

/// Assemble the wire frame for one notification.
///
/// # Errors
/// Returns [`FrameError::PayloadTooLarge`] if the payload does not fit the
/// 16-bit length field.
#[must_use = "use the encoded frame"]
pub fn encode_frame(token: &DeviceToken, payload: &[u8]) -> Result<Vec<u8>, FrameError> {
    let payload_len =
        u16::try_from(payload.len()).map_err(|_| FrameError::PayloadTooLarge(payload.len()))?;
    let mut buf = Vec::with_capacity(FRAME_OVERHEAD + payload.len());
    buf.push(COMMAND_NOTIFY);
    buf.extend_from_slice(&TOKEN_LEN_FIELD.to_be_bytes());
    buf.extend_from_slice(token.as_bytes());
    buf.extend_from_slice(&payload_len.to_be_bytes());
    buf.extend_from_slice(payload);
    Ok(buf)
}

/// A parsed notification frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Command byte.
    pub command: u8,
    /// Device token carried by the frame.
    pub token: DeviceToken,
    /// Raw JSON payload bytes.
    pub payload: Vec<u8>,
}

/// Parse a complete notification frame from a byte buffer.
///
/// # Errors
/// Returns an error if the buffer is truncated, a length field disagrees with
/// the buffer, or the command byte is unknown.
#[must_use = "handle the result"]
pub fn parse_frame(buf: &[u8]) -> Result<Frame, FrameError> {
    if buf.len() < FRAME_OVERHEAD {
        return Err(FrameError::ShortBuffer);
    }
    let command = buf[0];
    if command != COMMAND_NOTIFY {
        return Err(FrameError::UnknownCommand(command));
    }
    if read_u16(&buf[1..3])? != TOKEN_LEN_FIELD {
        return Err(FrameError::SizeMismatch);
    }
    let mut raw = [0u8; TOKEN_LEN];
    raw.copy_from_slice(&buf[3..3 + TOKEN_LEN]);
    let payload_len = read_u16(&buf[3 + TOKEN_LEN..FRAME_OVERHEAD])? as usize;
    if buf.len() != FRAME_OVERHEAD + payload_len {
        return Err(FrameError::SizeMismatch);
    }
    Ok(Frame {
        command,
        token: DeviceToken::from(raw),
        payload: buf[FRAME_OVERHEAD..].to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> DeviceToken { DeviceToken::from([0xAB; TOKEN_LEN]) }

    #[test]
    fn frame_layout_matches_the_wire_format() {
        let payload = br#"{"alert":"Hello"}"#;
        let frame = encode_frame(&token(), payload).expect("encode");

        assert_eq!(frame.len(), 1 + 2 + TOKEN_LEN + 2 + payload.len());
        assert_eq!(frame[0], COMMAND_NOTIFY);
        assert_eq!(read_u16(&frame[1..3]).expect("token length"), 32);
        assert_eq!(&frame[3..35], token().as_bytes());
        assert_eq!(
            read_u16(&frame[35..37]).expect("payload length") as usize,
            payload.len()
        );
        assert_eq!(&frame[37..], payload);
    }

    #[test]
    fn empty_payload_is_framed() {
        let frame = encode_frame(&token(), &[]).expect("encode");
        assert_eq!(frame.len(), FRAME_OVERHEAD);
        assert_eq!(read_u16(&frame[35..37]).expect("payload length"), 0);
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let payload = vec![b'x'; MAX_PAYLOAD_SIZE + 1];
        let err = encode_frame(&token(), &payload).expect_err("should fail");
        assert!(matches!(err, FrameError::PayloadTooLarge(n) if n == MAX_PAYLOAD_SIZE + 1));
    }

    #[test]
    fn boundary_payload_is_accepted() {
        let payload = vec![b'x'; MAX_PAYLOAD_SIZE];
        let frame = encode_frame(&token(), &payload).expect("encode");
        assert_eq!(frame.len(), FRAME_OVERHEAD + MAX_PAYLOAD_SIZE);
    }

    #[test]
    fn parse_round_trip() {
        let payload = br#"{"badge":3}"#;
        let encoded = encode_frame(&token(), payload).expect("encode");
        let parsed = parse_frame(&encoded).expect("parse");
        assert_eq!(parsed.command, COMMAND_NOTIFY);
        assert_eq!(parsed.token, token());
        assert_eq!(parsed.payload, payload);
    }

    #[test]
    fn parse_rejects_truncated_frames() {
        let encoded = encode_frame(&token(), b"{}").expect("encode");
        let err = parse_frame(&encoded[..encoded.len() - 1]).expect_err("should fail");
        assert!(matches!(err, FrameError::SizeMismatch));
        let err = parse_frame(&encoded[..10]).expect_err("should fail");
        assert!(matches!(err, FrameError::ShortBuffer));
    }

    #[test]
    fn parse_rejects_unknown_command() {
        let mut encoded = encode_frame(&token(), b"{}").expect("encode");
        encoded[0] = 9;
        let err = parse_frame(&encoded).expect_err("should fail");
        assert!(matches!(err, FrameError::UnknownCommand(9)));
    }
}
