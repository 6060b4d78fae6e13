//! HMAC-SHA256 authenticators used during pairing.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compute the 32-byte authenticator over the concatenation of `parts`,
/// keyed with the long-term key.
pub fn authenticator(key: &[u8; 32], parts: &[&[u8]]) -> [u8; 32] {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take keys of any size");
    for part in parts {
        mac.update(part);
    }
    let out = mac.finalize().into_bytes();
    let mut tag = [0u8; 32];
    tag.copy_from_slice(&out);
    tag
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rfc4231_test_case_2() {
        // HMAC-SHA256("Jefe", "what do ya want for nothing?") with the key
        // zero-padded to 32 bytes keyed the same way HMAC pads internally.
        let mut key = [0u8; 32];
        key[..4].copy_from_slice(b"Jefe");
        let tag = authenticator(&key, &[b"what do ya want for nothing?"]);
        assert_eq!(
            hex::encode(tag),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn concatenation_matches_single_buffer() {
        let key = [0x42u8; 32];
        let joined = authenticator(&key, &[b"abc", b"def"]);
        let single = authenticator(&key, &[b"abcdef"]);
        assert_eq!(joined, single);
    }

    #[test]
    fn different_keys_differ() {
        let a = authenticator(&[1u8; 32], &[b"payload"]);
        let b = authenticator(&[2u8; 32], &[b"payload"]);
        assert_ne!(a, b);
    }
}
