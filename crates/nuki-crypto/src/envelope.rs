//! Encrypted envelope for the user (USDIO) characteristic.
//!
//! Shape on the wire:
//!
//! ```text
//! | nonce : 24 | auth_id : 4 | msg_len : 2 LE | secretbox ciphertext : msg_len |
//! ```
//!
//! Plaintext inside the secretbox, before sealing:
//!
//! ```text
//! | auth_id : 4 | command : 2 LE | payload : n | crc : 2 LE |
//! ```
//!
//! The CRC-16/CCITT-FALSE covers `auth_id || command || payload`. `msg_len`
//! is the ciphertext length, i.e. plaintext plus the 16-byte Poly1305 tag.

use crypto_secretbox::aead::{Aead, KeyInit};
use crypto_secretbox::{Key, Nonce, XSalsa20Poly1305};
use rand_core::{OsRng, RngCore};
use thiserror::Error;
use zeroize::Zeroize;

use nuki_wire::crc::crc16_ccitt_false;
use nuki_wire::Command;

/// Secretbox nonce length.
pub const NONCE_LEN: usize = 24;

/// Poly1305 tag length.
pub const MAC_LEN: usize = 16;

/// Unencrypted header in front of the ciphertext (nonce, auth-ID, length).
pub const HEADER_LEN: usize = NONCE_LEN + 4 + 2;

/// Plaintext overhead around the payload (auth-ID, command, CRC).
const INNER_OVERHEAD: usize = 8;

/// Envelope failures, distinct per cause. Callers drop the frame on any of
/// these; the protocol has no negative acknowledgement.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("envelope too short: {0} bytes")]
    TooShort(usize),

    #[error("secretbox authentication failed")]
    Mac,

    #[error("inner crc mismatch")]
    Crc,

    #[error("authorization id mismatch")]
    AuthIdMismatch,

    #[error("rng failure")]
    Rng,
}

/// Draw a fresh 24-byte nonce from the OS CSPRNG.
pub fn generate_nonce() -> Result<[u8; NONCE_LEN], EnvelopeError> {
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.try_fill_bytes(&mut nonce).map_err(|_| EnvelopeError::Rng)?;
    Ok(nonce)
}

/// Seal `command` and `payload` into an encrypted envelope.
///
/// Fails only if the RNG fails; every produced frame decodes with [`open`]
/// under the same key and authorization ID.
pub fn seal(
    command: Command,
    payload: &[u8],
    key: &[u8; 32],
    auth_id: [u8; 4],
) -> Result<Vec<u8>, EnvelopeError> {
    let mut plaintext = Vec::with_capacity(INNER_OVERHEAD + payload.len());
    plaintext.extend_from_slice(&auth_id);
    plaintext.extend_from_slice(&command.raw().to_le_bytes());
    plaintext.extend_from_slice(payload);
    let crc = crc16_ccitt_false(&plaintext);
    plaintext.extend_from_slice(&crc.to_le_bytes());

    let nonce = generate_nonce()?;
    let cipher = XSalsa20Poly1305::new(Key::from_slice(key));
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext.as_slice())
        .map_err(|_| EnvelopeError::Rng)?;
    plaintext.zeroize();

    let mut frame = Vec::with_capacity(HEADER_LEN + ciphertext.len());
    frame.extend_from_slice(&nonce);
    frame.extend_from_slice(&auth_id);
    frame.extend_from_slice(&(ciphertext.len() as u16).to_le_bytes());
    frame.extend_from_slice(&ciphertext);
    Ok(frame)
}

/// Open an encrypted envelope, verifying the secretbox tag, the inner CRC
/// and that both authorization IDs match `auth_id`.
pub fn open(
    frame: &[u8],
    key: &[u8; 32],
    auth_id: [u8; 4],
) -> Result<(Command, Vec<u8>), EnvelopeError> {
    if frame.len() < HEADER_LEN + MAC_LEN {
        return Err(EnvelopeError::TooShort(frame.len()));
    }

    let nonce = &frame[..NONCE_LEN];
    let outer_auth_id = &frame[NONCE_LEN..NONCE_LEN + 4];
    let msg_len =
        u16::from_le_bytes([frame[NONCE_LEN + 4], frame[NONCE_LEN + 5]]) as usize;
    let ciphertext = &frame[HEADER_LEN..];
    if ciphertext.len() != msg_len {
        return Err(EnvelopeError::TooShort(frame.len()));
    }

    if outer_auth_id != auth_id {
        return Err(EnvelopeError::AuthIdMismatch);
    }

    let cipher = XSalsa20Poly1305::new(Key::from_slice(key));
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| EnvelopeError::Mac)?;

    if plaintext.len() < INNER_OVERHEAD {
        return Err(EnvelopeError::TooShort(plaintext.len()));
    }
    let body = &plaintext[..plaintext.len() - 2];
    let expected = u16::from_le_bytes([
        plaintext[plaintext.len() - 2],
        plaintext[plaintext.len() - 1],
    ]);
    if crc16_ccitt_false(body) != expected {
        return Err(EnvelopeError::Crc);
    }

    if body[..4] != auth_id {
        return Err(EnvelopeError::AuthIdMismatch);
    }

    let command = Command::from(u16::from_le_bytes([body[4], body[5]]));
    Ok((command, body[6..].to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const KEY: [u8; 32] = [0x11; 32];
    const AUTH_ID: [u8; 4] = [0xDE, 0xAD, 0xBE, 0xEF];

    #[test]
    fn seal_open_round_trip() {
        let frame = seal(Command::KEYTURNER_STATES, &[0u8; 21], &KEY, AUTH_ID).unwrap();
        let (command, payload) = open(&frame, &KEY, AUTH_ID).unwrap();
        assert_eq!(command, Command::KEYTURNER_STATES);
        assert_eq!(payload, vec![0u8; 21]);
    }

    #[test]
    fn empty_payload_round_trip() {
        let frame = seal(Command::REQUEST_CONFIG, &[], &KEY, AUTH_ID).unwrap();
        let (command, payload) = open(&frame, &KEY, AUTH_ID).unwrap();
        assert_eq!(command, Command::REQUEST_CONFIG);
        assert!(payload.is_empty());
    }

    #[test]
    fn frame_layout() {
        let frame = seal(Command::REQUEST_DATA, &[0x0C, 0x00], &KEY, AUTH_ID).unwrap();
        // nonce || auth_id || msg_len || ciphertext; plaintext is 10 bytes.
        assert_eq!(frame.len(), HEADER_LEN + 10 + MAC_LEN);
        assert_eq!(&frame[NONCE_LEN..NONCE_LEN + 4], &AUTH_ID);
        let msg_len = u16::from_le_bytes([frame[NONCE_LEN + 4], frame[NONCE_LEN + 5]]);
        assert_eq!(msg_len as usize, 10 + MAC_LEN);
    }

    #[test]
    fn tampered_ciphertext_rejected() {
        let mut frame = seal(Command::STATUS, &[0x00], &KEY, AUTH_ID).unwrap();
        let last = frame.len() - 1;
        frame[last] ^= 0x01;
        assert_eq!(open(&frame, &KEY, AUTH_ID), Err(EnvelopeError::Mac));
    }

    #[test]
    fn wrong_key_rejected() {
        let frame = seal(Command::STATUS, &[0x00], &KEY, AUTH_ID).unwrap();
        assert_eq!(open(&frame, &[0x22; 32], AUTH_ID), Err(EnvelopeError::Mac));
    }

    #[test]
    fn auth_id_mismatch_rejected() {
        let frame = seal(Command::STATUS, &[0x00], &KEY, AUTH_ID).unwrap();
        assert_eq!(
            open(&frame, &KEY, [0, 0, 0, 1]),
            Err(EnvelopeError::AuthIdMismatch)
        );
    }

    #[test]
    fn truncated_frame_rejected() {
        let frame = seal(Command::STATUS, &[0x00], &KEY, AUTH_ID).unwrap();
        assert_eq!(
            open(&frame[..HEADER_LEN + 3], &KEY, AUTH_ID),
            Err(EnvelopeError::TooShort(HEADER_LEN + 3))
        );
        assert_eq!(open(&[], &KEY, AUTH_ID), Err(EnvelopeError::TooShort(0)));
    }

    #[test]
    fn bad_inner_crc_rejected() {
        // Seal by hand with a corrupted inner CRC; the MAC is fine so only
        // the CRC check can catch it.
        let mut plaintext = Vec::new();
        plaintext.extend_from_slice(&AUTH_ID);
        plaintext.extend_from_slice(&Command::STATUS.raw().to_le_bytes());
        plaintext.push(0x00);
        let crc = crc16_ccitt_false(&plaintext) ^ 0x0001;
        plaintext.extend_from_slice(&crc.to_le_bytes());

        let nonce = generate_nonce().unwrap();
        let cipher = XSalsa20Poly1305::new(Key::from_slice(&KEY));
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_slice())
            .unwrap();

        let mut frame = Vec::new();
        frame.extend_from_slice(&nonce);
        frame.extend_from_slice(&AUTH_ID);
        frame.extend_from_slice(&(ciphertext.len() as u16).to_le_bytes());
        frame.extend_from_slice(&ciphertext);

        assert_eq!(open(&frame, &KEY, AUTH_ID), Err(EnvelopeError::Crc));
    }

    #[test]
    fn nonces_never_repeat() {
        let mut seen = HashSet::new();
        for _ in 0..128 {
            let frame = seal(Command::STATUS, &[0x00], &KEY, AUTH_ID).unwrap();
            let nonce: [u8; NONCE_LEN] = frame[..NONCE_LEN].try_into().unwrap();
            assert_ne!(nonce, [0u8; NONCE_LEN]);
            assert!(seen.insert(nonce), "duplicate nonce after {} seals", seen.len());
        }
    }
}
