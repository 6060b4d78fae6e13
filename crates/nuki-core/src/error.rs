//! Error taxonomy of the client.
//!
//! Every public operation resolves to a single `Result` with [`CmdError`].
//! Inbound frames that fail CRC or secretbox authentication are dropped by
//! the dispatcher, never surfaced: the protocol has no negative
//! acknowledgement, so the caller observes them as [`CmdError::Timeout`].

use thiserror::Error;

use crate::store::StoreError;
use crate::transport::TransportError;
use nuki_wire::Command;

/// Terminal result of a public operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CmdError {
    /// No credentials in the store; nothing was sent.
    #[error("not paired")]
    NotPaired,

    /// A state-machine deadline expired.
    #[error("timed out waiting for the lock")]
    Timeout,

    /// The lock answered with an `ErrorReport`; the error byte is retained
    /// and also available through `last_error`.
    #[error("lock reported error 0x{code:02X} for {command}")]
    Failed {
        code: u8,
        /// Command the lock associated with the error.
        command: Command,
    },

    /// Connect or write failed after retry exhaustion.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Credential persistence failed; the store is treated as unpaired.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The OS CSPRNG failed; no frame was sent.
    #[error("rng failure")]
    Rng,

    /// Caller-side validation failed; nothing was sent.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
}

/// Shorthand for the result of a lock operation.
pub type CmdResult<T = ()> = Result<T, CmdError>;
