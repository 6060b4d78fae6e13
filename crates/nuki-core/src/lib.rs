//! Client core for Nuki Smart Lock v2 over BLE.
//!
//! This crate implements:
//! - the pairing handshake (key agreement, mutual authentication,
//!   authorization-ID exchange),
//! - the command orchestration machines over the encrypted channel,
//! - the inbound dispatcher that populates typed lock state,
//! - the session controller driving connect → pair → execute,
//! - the credential store contract and an in-memory implementation,
//! - the transport contract towards a BLE stack.
//!
//! The BLE stack itself stays outside: implement [`Transport`] over your
//! GATT client of choice and hand it to [`NukiClient`].

#![forbid(unsafe_code)]

pub mod client;
pub mod command;
pub mod error;
pub mod pairing;
pub mod store;
pub mod transport;

mod actions;
mod dispatch;
mod session;

pub use client::{ClientConfig, Event, EventHandler, NukiClient, CMD_TIMEOUT, PAIRING_TIMEOUT};
pub use command::{Action, CommandCategory};
pub use error::{CmdError, CmdResult};
pub use pairing::IdType;
pub use store::{CredentialStore, Credentials, InMemoryStore, StoreError};
pub use transport::{BleAddress, Channel, Transport, TransportError};

pub use nuki_crypto::KeyPair;
