//! Transport contract towards the BLE stack.
//!
//! The core never talks GATT itself. A transport implementation owns the
//! scanner, the GATT client and the two indication subscriptions, and
//! exposes exactly this surface: acknowledged writes on either
//! characteristic plus a pull-based stream of inbound indications.
//! Implementations must deliver indications in arrival order; the core
//! applies them serially.

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;
use uuid::{uuid, Uuid};

/// Pairing service advertised by a lock in pairing mode.
pub const PAIRING_SERVICE_UUID: Uuid = uuid!("a92ee100-5501-11e4-916c-0800200c9a66");

/// GDIO characteristic of the pairing service; carries plain frames.
pub const PAIRING_GDIO_UUID: Uuid = uuid!("a92ee101-5501-11e4-916c-0800200c9a66");

/// Keyturner service of a paired lock.
pub const KEYTURNER_SERVICE_UUID: Uuid = uuid!("a92ee200-5501-11e4-916c-0800200c9a66");

/// USDIO characteristic of the keyturner service; carries encrypted frames.
pub const KEYTURNER_USDIO_UUID: Uuid = uuid!("a92ee202-5501-11e4-916c-0800200c9a66");

/// The two indication characteristics a lock exposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Channel {
    /// GDIO: plain frames, pairing handshake only.
    Pairing,
    /// USDIO: encrypted frames, everything after pairing.
    User,
}

/// A 6-byte BLE device address, most significant byte first.
#[derive(Clone, Copy, PartialEq, Eq, Hash, zeroize::Zeroize)]
pub struct BleAddress(pub [u8; 6]);

impl fmt::Debug for BleAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

impl fmt::Display for BleAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Transport failures. Everything here is terminal for the running
/// operation; the session controller handles retries.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("connect failed: {0}")]
    ConnectFailed(String),

    #[error("not connected")]
    NotConnected,

    #[error("write failed: {0}")]
    WriteFailed(String),

    #[error("transport closed")]
    Closed,
}

/// Boundary to the BLE stack.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Connect to the lock and subscribe to both indication
    /// characteristics. Idempotent when already connected.
    async fn connect(&self, address: &BleAddress) -> Result<(), TransportError>;

    fn is_connected(&self) -> bool;

    /// Acknowledged write on the pairing (GDIO) characteristic.
    async fn write_pairing(&self, frame: &[u8]) -> Result<(), TransportError>;

    /// Acknowledged write on the user (USDIO) characteristic.
    async fn write_user(&self, frame: &[u8]) -> Result<(), TransportError>;

    /// Next inbound indication, in arrival order. Pends until one arrives;
    /// the core bounds every wait with its own deadline.
    async fn recv(&self) -> Result<(Channel, Vec<u8>), TransportError>;
}
