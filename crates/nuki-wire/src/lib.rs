//! Wire layer for the Nuki Smart Lock v2 BLE protocol.
//!
//! This crate implements the plaintext side of the protocol:
//! - the command identifier table,
//! - CRC-16/CCITT-FALSE integrity codes,
//! - the plain frame shape carried over the pairing (GDIO) characteristic,
//! - typed little-endian (de)serializers for every lock-side struct.
//!
//! The encrypted envelope carried over the user (USDIO) characteristic
//! lives in `nuki-crypto`; it reuses the CRC and command table from here.
//!
//! All integer fields are little-endian on the wire. Nothing in this crate
//! relies on host layout: every struct is read and written field by field.

#![forbid(unsafe_code)]

pub mod command;
pub mod crc;
pub mod frame;
pub mod types;

pub use command::Command;
pub use frame::{decode_plain, encode_plain, WireError};
