//! Credential persistence.
//!
//! The store is a plain key-value contract; the core owns the schema. Four
//! keys make up a pairing. The store is treated as eventually consistent:
//! if any key is missing or malformed on load, or any write lands short,
//! the pairing is considered gone and every key is wiped.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::warn;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::transport::BleAddress;

/// 32-byte long-term key `k`.
pub const KEY_SECRET_KEY: &str = "secretKeyK";
/// 6-byte peer BLE address, stored byte-reversed.
pub const KEY_BLE_ADDRESS: &str = "bleAddress";
/// 4-byte authorization ID assigned by the lock.
pub const KEY_AUTHORIZATION_ID: &str = "authorizationId";
/// 16-bit security PIN, 0 when unset.
pub const KEY_SECURITY_PIN: &str = "securityPinCode";

const CREDENTIAL_KEYS: [&str; 4] = [
    KEY_SECRET_KEY,
    KEY_BLE_ADDRESS,
    KEY_AUTHORIZATION_ID,
    KEY_SECURITY_PIN,
];

/// Errors surfaced by a credential store backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("storage operation failed: {0}")]
    OperationFailed(String),
}

/// Persistent key-value storage for session identity.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Store `value` under `key`, returning the number of bytes written.
    async fn put_bytes(&self, key: &str, value: &[u8]) -> Result<usize, StoreError>;

    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Session identity of a paired lock.
///
/// Created by a successful pairing run, destroyed by an explicit unpair.
/// The long-term key is zeroized whenever a value is dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Credentials {
    pub secret_key: [u8; 32],
    pub ble_address: BleAddress,
    pub authorization_id: [u8; 4],
    pub security_pin: u16,
}

impl Credentials {
    /// Load the full credential set.
    ///
    /// Returns `None` when no complete pairing is stored. A partial or
    /// malformed set is wiped before returning `None`.
    pub async fn load<S: CredentialStore>(store: &S) -> Result<Option<Self>, StoreError> {
        let secret_key = store.get_bytes(KEY_SECRET_KEY).await?;
        let ble_address = store.get_bytes(KEY_BLE_ADDRESS).await?;
        let authorization_id = store.get_bytes(KEY_AUTHORIZATION_ID).await?;
        let security_pin = store.get_bytes(KEY_SECURITY_PIN).await?;

        let parsed = (|| {
            let secret_key: [u8; 32] = secret_key?.try_into().ok()?;
            let mut reversed: [u8; 6] = ble_address?.try_into().ok()?;
            reversed.reverse();
            let authorization_id: [u8; 4] = authorization_id?.try_into().ok()?;
            let pin: [u8; 2] = security_pin?.try_into().ok()?;
            Some(Credentials {
                secret_key,
                ble_address: BleAddress(reversed),
                authorization_id,
                security_pin: u16::from_le_bytes(pin),
            })
        })();

        match parsed {
            Some(credentials) => Ok(Some(credentials)),
            None => {
                // Anything short of a complete, well-formed set means
                // unpaired; leave no stragglers behind.
                Self::delete(store).await?;
                Ok(None)
            }
        }
    }

    /// Persist the full credential set. A short write wipes the store and
    /// fails: better unpaired than half-paired.
    pub async fn save<S: CredentialStore>(&self, store: &S) -> Result<(), StoreError> {
        let mut reversed = self.ble_address.0;
        reversed.reverse();

        let writes: [(&str, &[u8]); 4] = [
            (KEY_SECRET_KEY, &self.secret_key),
            (KEY_BLE_ADDRESS, &reversed),
            (KEY_AUTHORIZATION_ID, &self.authorization_id),
            (KEY_SECURITY_PIN, &self.security_pin.to_le_bytes()),
        ];
        for (key, value) in writes {
            if store.put_bytes(key, value).await? != value.len() {
                warn!(key, "credential write came up short, wiping store");
                Self::delete(store).await?;
                return Err(StoreError::OperationFailed(format!("short write for {key}")));
            }
        }
        Ok(())
    }

    /// Remove all four persisted items.
    pub async fn delete<S: CredentialStore>(store: &S) -> Result<(), StoreError> {
        for key in CREDENTIAL_KEYS {
            store.remove(key).await?;
        }
        Ok(())
    }
}

/// Thread-safe in-memory store for tests and hosts without flash.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    entries: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl CredentialStore for InMemoryStore {
    async fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put_bytes(&self, key: &str, value: &[u8]) -> Result<usize, StoreError> {
        self.entries
            .write()
            .await
            .insert(key.to_owned(), value.to_vec());
        Ok(value.len())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}
