//! A scripted mock lock.
//!
//! The script is a list of reply batches, one batch per write the client
//! performs, in order. Each write records itself, pops the next batch and
//! queues its frames for delivery through `recv`. Encrypted replies are
//! sealed with the credentials the test injected, exactly like the real
//! lock would.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex as StdMutex;

use async_trait::async_trait;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::Mutex;

use nuki_core::{BleAddress, Channel, Transport, TransportError};
use nuki_crypto::envelope;
use nuki_wire::{encode_plain, Command};

pub const LOCK_ADDRESS: BleAddress = BleAddress([0x54, 0xD2, 0x72, 0x01, 0x02, 0x03]);

/// One scripted reply.
#[allow(dead_code)]
pub enum Reply {
    /// Plain frame on the pairing channel.
    Plain(Command, Vec<u8>),
    /// Sealed frame on the user channel.
    Encrypted(Command, Vec<u8>),
    /// Raw bytes on the pairing channel, e.g. a corrupted frame.
    RawPairing(Vec<u8>),
}

pub struct MockLock {
    script: StdMutex<VecDeque<Vec<Reply>>>,
    writes: StdMutex<Vec<(Channel, Vec<u8>)>>,
    tx: UnboundedSender<(Channel, Vec<u8>)>,
    rx: Mutex<UnboundedReceiver<(Channel, Vec<u8>)>>,
    connected: AtomicBool,
    connect_attempts: AtomicU32,
    refuse_connects: bool,
    key: [u8; 32],
    auth_id: [u8; 4],
}

impl MockLock {
    pub fn new(script: Vec<Vec<Reply>>) -> Self {
        let (tx, rx) = unbounded_channel();
        MockLock {
            script: StdMutex::new(script.into()),
            writes: StdMutex::new(Vec::new()),
            tx,
            rx: Mutex::new(rx),
            connected: AtomicBool::new(false),
            connect_attempts: AtomicU32::new(0),
            refuse_connects: false,
            key: [0u8; 32],
            auth_id: [0u8; 4],
        }
    }

    /// Session credentials used to seal `Reply::Encrypted` frames.
    pub fn with_credentials(mut self, key: [u8; 32], auth_id: [u8; 4]) -> Self {
        self.key = key;
        self.auth_id = auth_id;
        self
    }

    /// Make every connect attempt fail.
    #[allow(dead_code)]
    pub fn refusing_connects(mut self) -> Self {
        self.refuse_connects = true;
        self
    }

    #[allow(dead_code)]
    pub fn connect_attempts(&self) -> u32 {
        self.connect_attempts.load(Ordering::SeqCst)
    }

    /// Everything the client wrote, in order.
    pub fn writes(&self) -> Vec<(Channel, Vec<u8>)> {
        self.writes.lock().unwrap().clone()
    }

    fn on_write(&self, channel: Channel, frame: &[u8]) {
        self.writes.lock().unwrap().push((channel, frame.to_vec()));

        let batch = self.script.lock().unwrap().pop_front().unwrap_or_default();
        for reply in batch {
            let (channel, frame) = match reply {
                Reply::Plain(command, payload) => (
                    Channel::Pairing,
                    encode_plain(command, &payload).expect("scripted frame"),
                ),
                Reply::Encrypted(command, payload) => (
                    Channel::User,
                    envelope::seal(command, &payload, &self.key, self.auth_id)
                        .expect("scripted frame"),
                ),
                Reply::RawPairing(bytes) => (Channel::Pairing, bytes),
            };
            let _ = self.tx.send((channel, frame));
        }
    }
}

#[async_trait]
impl Transport for MockLock {
    async fn connect(&self, _address: &BleAddress) -> Result<(), TransportError> {
        self.connect_attempts.fetch_add(1, Ordering::SeqCst);
        if self.refuse_connects {
            return Err(TransportError::ConnectFailed("mock refuses".into()));
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn write_pairing(&self, frame: &[u8]) -> Result<(), TransportError> {
        self.on_write(Channel::Pairing, frame);
        Ok(())
    }

    async fn write_user(&self, frame: &[u8]) -> Result<(), TransportError> {
        self.on_write(Channel::User, frame);
        Ok(())
    }

    async fn recv(&self) -> Result<(Channel, Vec<u8>), TransportError> {
        self.rx
            .lock()
            .await
            .recv()
            .await
            .ok_or(TransportError::Closed)
    }
}

/// Client config with test-friendly deadlines.
pub fn test_config() -> nuki_core::ClientConfig {
    let mut config = nuki_core::ClientConfig::new("TestBridge", 0x1000_0001);
    config.pairing_timeout = std::time::Duration::from_millis(100);
    config.command_timeout = std::time::Duration::from_millis(100);
    config.connect_backoff = std::time::Duration::from_millis(1);
    config
}
