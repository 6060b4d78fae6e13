//! The session controller.
//!
//! [`NukiClient`] owns the transport, the credential store and the session
//! state, and drives connect → pair → execute. All lock operations funnel
//! through [`NukiClient::execute`]; the session mutex keeps at most one
//! action in flight.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::command::{self, Action};
use crate::error::{CmdError, CmdResult};
use crate::pairing::{self, IdType, PairingParams};
use crate::session::SessionState;
use crate::store::{CredentialStore, Credentials};
use crate::transport::{BleAddress, Transport, TransportError};
use nuki_crypto::KeyPair;
use nuki_wire::Command;

/// Default deadline for each pairing step.
pub const PAIRING_TIMEOUT: Duration = Duration::from_secs(30);

/// Default deadline for each command step.
pub const CMD_TIMEOUT: Duration = Duration::from_secs(5);

const CONNECT_RETRIES: u32 = 5;
const CONNECT_BACKOFF: Duration = Duration::from_millis(200);

/// Events surfaced to an optional [`EventHandler`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    /// A fresh keyturner state snapshot was received.
    KeyturnerStateUpdated,
}

/// Callback capability handed to the client by the embedding application.
pub trait EventHandler: Send + Sync {
    fn notify(&self, event: Event);
}

/// Client identity and tuning knobs.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Name shown in the lock's authorization list; at most 32 bytes.
    pub device_name: String,
    /// Application ID sent with the authorization data and lock actions.
    pub app_id: u32,
    /// What kind of client this authorization is registered as.
    pub id_type: IdType,
    pub pairing_timeout: Duration,
    pub command_timeout: Duration,
    pub connect_retries: u32,
    pub connect_backoff: Duration,
}

impl ClientConfig {
    pub fn new(device_name: impl Into<String>, app_id: u32) -> Self {
        ClientConfig {
            device_name: device_name.into(),
            app_id,
            id_type: IdType::Bridge,
            pairing_timeout: PAIRING_TIMEOUT,
            command_timeout: CMD_TIMEOUT,
            connect_retries: CONNECT_RETRIES,
            connect_backoff: CONNECT_BACKOFF,
        }
    }
}

/// A client for one Nuki smart lock.
pub struct NukiClient<T: Transport, S: CredentialStore> {
    pub(crate) transport: T,
    pub(crate) store: Arc<S>,
    pub(crate) config: ClientConfig,
    pub(crate) session: Mutex<SessionState>,
    pub(crate) event_handler: Option<Arc<dyn EventHandler>>,
}

impl<T: Transport, S: CredentialStore> NukiClient<T, S> {
    pub fn new(transport: T, store: Arc<S>, config: ClientConfig) -> Self {
        NukiClient {
            transport,
            store,
            config,
            session: Mutex::new(SessionState::new()),
            event_handler: None,
        }
    }

    /// Register the handler notified about lock events.
    pub fn set_event_handler(&mut self, handler: Arc<dyn EventHandler>) {
        self.event_handler = Some(handler);
    }

    /// The transport this client drives.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The credential store backing this client.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Whether a complete credential set is stored.
    pub async fn is_paired(&self) -> bool {
        matches!(Credentials::load(&*self.store).await, Ok(Some(_)))
    }

    /// Pair with the lock at `address`.
    ///
    /// A no-op success when credentials already exist. The keypair is
    /// bootstrapped by the caller; the lock must be in pairing mode
    /// (advertising the pairing service).
    pub async fn pair(&self, address: BleAddress, keys: &KeyPair) -> CmdResult<()> {
        if Credentials::load(&*self.store).await?.is_some() {
            debug!("already paired");
            return Ok(());
        }

        self.connect_with_retry(&address).await?;

        let mut session = self.session.lock().await;
        let params = PairingParams {
            keys,
            device_name: &self.config.device_name,
            app_id: self.config.app_id,
            id_type: self.config.id_type,
            step_timeout: self.config.pairing_timeout,
        };
        let outcome = pairing::run(&self.transport, &mut session, &params).await?;

        let credentials = Credentials {
            secret_key: *outcome.long_term_key,
            ble_address: address,
            authorization_id: outcome.authorization_id,
            security_pin: 0,
        };
        credentials.save(&*self.store).await?;
        info!(
            address = %credentials.ble_address,
            lock_id = ?outcome.lock_id,
            "paired"
        );
        Ok(())
    }

    /// Forget the pairing: wipe the stored credentials and the session.
    pub async fn unpair(&self) -> CmdResult<()> {
        Credentials::delete(&*self.store).await?;
        let mut session = self.session.lock().await;
        session.reset_pairing();
        *session = SessionState::new();
        info!("unpaired");
        Ok(())
    }

    /// Drive `action` to its terminal result.
    ///
    /// Fails with [`CmdError::NotPaired`] before anything is sent when no
    /// credentials exist. Holding the session across the whole run keeps
    /// actions strictly serial.
    pub async fn execute(&self, action: Action) -> CmdResult<()> {
        let credentials = Credentials::load(&*self.store)
            .await?
            .ok_or(CmdError::NotPaired)?;
        self.connect_with_retry(&credentials.ble_address).await?;

        let mut session = self.session.lock().await;
        command::execute(
            &self.transport,
            &mut session,
            &credentials,
            &action,
            self.config.command_timeout,
        )
        .await
    }

    /// Error byte and command context of the most recent `ErrorReport`.
    pub async fn last_error(&self) -> Option<(u8, Command)> {
        let session = self.session.lock().await;
        session
            .last_error_code
            .map(|code| (code, session.last_error_command))
    }

    pub(crate) async fn connect_with_retry(&self, address: &BleAddress) -> CmdResult<()> {
        if self.transport.is_connected() {
            return Ok(());
        }
        let mut last = TransportError::NotConnected;
        for attempt in 1..=self.config.connect_retries {
            match self.transport.connect(address).await {
                Ok(()) => return Ok(()),
                Err(err) => {
                    warn!(%err, attempt, "connect attempt failed");
                    last = err;
                }
            }
            sleep(self.config.connect_backoff).await;
        }
        Err(last.into())
    }

    pub(crate) fn notify(&self, event: Event) {
        if let Some(handler) = &self.event_handler {
            handler.notify(event);
        }
    }
}
