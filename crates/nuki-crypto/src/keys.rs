//! Client keypair and long-term key derivation.

use rand_core::OsRng;
use salsa20::cipher::consts::U10;
use salsa20::cipher::generic_array::GenericArray;
use salsa20::hsalsa;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// X25519 keypair identifying the client towards the lock.
///
/// The secret half is zeroized on drop. The pairing handshake consumes the
/// keypair by reference; it never leaves this process.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct KeyPair {
    /// Curve25519 public key (32 bytes), sent to the lock during pairing.
    pub public_key: [u8; 32],
    secret_key: [u8; 32],
}

impl KeyPair {
    /// Generate a fresh keypair from the OS CSPRNG.
    pub fn generate() -> Self {
        let secret = StaticSecret::random_from_rng(OsRng);
        Self::from_secret_key(secret.to_bytes())
    }

    /// Rebuild a keypair from a stored secret key.
    pub fn from_secret_key(secret_key: [u8; 32]) -> Self {
        let secret = StaticSecret::from(secret_key);
        KeyPair {
            public_key: PublicKey::from(&secret).to_bytes(),
            secret_key,
        }
    }

    pub fn secret_key(&self) -> &[u8; 32] {
        &self.secret_key
    }
}

/// Derive the 32-byte long-term key `k` shared with the lock.
///
/// `k = HSalsa20(key = X25519(own_secret, remote_public), nonce = 0^16)`,
/// with the standard `"expand 32-byte k"` constant; this is the NaCl
/// `crypto_box` precomputation. Both sides arrive at the same `k`.
pub fn derive_long_term_key(own: &KeyPair, remote_public_key: &[u8; 32]) -> [u8; 32] {
    let secret = StaticSecret::from(*own.secret_key());
    let shared = secret.diffie_hellman(&PublicKey::from(*remote_public_key));
    let expanded = hsalsa::<U10>(
        GenericArray::from_slice(shared.as_bytes()),
        &GenericArray::default(),
    );
    let mut key = [0u8; 32];
    key.copy_from_slice(&expanded);
    key
}
