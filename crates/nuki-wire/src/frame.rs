//! Plain frame codec for the pairing (GDIO) characteristic.
//!
//! Shape on the wire:
//!
//! ```text
//! | command : 2 LE | payload : n | crc : 2 LE |
//! ```
//!
//! The CRC-16/CCITT-FALSE covers `command || payload`.

use bytes::BufMut;
use thiserror::Error;

use crate::command::Command;
use crate::crc::crc16_ccitt_false;

/// Upper bound on a frame payload. The largest message of the protocol is
/// the 101-byte authorization data message; everything a caller can build
/// through the action surface stays well below this.
pub const MAX_PAYLOAD: usize = 192;

/// Overhead of a plain frame around its payload (command + CRC).
pub const PLAIN_OVERHEAD: usize = 4;

/// Framing errors, distinct per failure so callers can tell them apart.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum WireError {
    #[error("frame too short: {0} bytes")]
    TooShort(usize),

    #[error("crc mismatch")]
    CrcMismatch,

    #[error("payload too large: {0} bytes (max {MAX_PAYLOAD})")]
    PayloadTooLarge(usize),
}

/// Encode a plain frame.
pub fn encode_plain(command: Command, payload: &[u8]) -> Result<Vec<u8>, WireError> {
    if payload.len() > MAX_PAYLOAD {
        return Err(WireError::PayloadTooLarge(payload.len()));
    }

    let mut frame = Vec::with_capacity(PLAIN_OVERHEAD + payload.len());
    frame.put_u16_le(command.raw());
    frame.extend_from_slice(payload);
    let crc = crc16_ccitt_false(&frame);
    frame.put_u16_le(crc);
    Ok(frame)
}

/// Decode a plain frame, verifying the trailing CRC.
pub fn decode_plain(frame: &[u8]) -> Result<(Command, Vec<u8>), WireError> {
    if frame.len() < PLAIN_OVERHEAD {
        return Err(WireError::TooShort(frame.len()));
    }

    let body = &frame[..frame.len() - 2];
    let expected = u16::from_le_bytes([frame[frame.len() - 2], frame[frame.len() - 1]]);
    if crc16_ccitt_false(body) != expected {
        return Err(WireError::CrcMismatch);
    }

    let command = Command::from(u16::from_le_bytes([frame[0], frame[1]]));
    Ok((command, body[2..].to_vec()))
}
