//! Crypto layer of the Nuki BLE client.
//!
//! Implements the exact primitives of the keyturner protocol, nothing more:
//!
//! - X25519 key agreement between the client keypair and the lock's
//!   public key,
//! - HSalsa20 derivation of the 32-byte long-term key (the NaCl
//!   `crypto_box` precomputation shape),
//! - HMAC-SHA256 authenticators exchanged during pairing,
//! - the NaCl secretbox (XSalsa20-Poly1305) envelope that carries every
//!   message on the user (USDIO) characteristic.
//!
//! Nonces come from the OS CSPRNG, never from time. Secret material is
//! zeroized on drop.

#![forbid(unsafe_code)]

pub mod auth;
pub mod envelope;
pub mod keys;

pub use auth::authenticator;
pub use envelope::{open, seal, EnvelopeError};
pub use keys::{derive_long_term_key, KeyPair};
