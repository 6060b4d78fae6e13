//! Mutable session state shared between the dispatcher and the state
//! machines.
//!
//! The dispatcher is the only writer of the "received" fields; the state
//! machines read them and clear the signals they consume. Both run on the
//! same task, so a plain struct behind the client's mutex is enough.

use tracing::{debug, warn};
use zeroize::Zeroize;

use nuki_wire::types::{
    AdvancedConfig, AuthorizationEntry, BatteryReport, Config, KeyTurnerState, KeypadEntry,
    LogEntry, TimeControlEntry,
};
use nuki_wire::Command;

/// `Status` payload value for a completed command.
pub const STATUS_COMPLETE: u8 = 0x00;
/// `Status` payload value for an accepted, still-running command.
pub const STATUS_ACCEPTED: u8 = 0x01;
/// Sentinel meaning no status has been received.
pub const STATUS_NONE: u8 = 0xFF;

/// Everything the lock has told us, plus the pairing scratch space.
#[derive(Default)]
pub struct SessionState {
    // Pairing ephemerals; valid only during a pairing run.
    pub(crate) remote_public_key: [u8; 32],
    pub(crate) challenge_nonce: [u8; 32],
    pub(crate) received_status: u8,
    pub(crate) authorization_id: [u8; 4],
    pub(crate) lock_id: [u8; 16],

    // Signals the command machines are edge-triggered on.
    pub(crate) last_message_code: Command,
    pub(crate) crc_check_ok: bool,

    // Snapshots, overwritten on each successful reply.
    pub(crate) key_turner_state: Option<KeyTurnerState>,
    pub(crate) config: Option<Config>,
    pub(crate) advanced_config: Option<AdvancedConfig>,
    pub(crate) battery_report: Option<BatteryReport>,

    // Record lists, appended in arrival order; cleared by the initiating
    // request before dispatch.
    pub(crate) log_entries: Vec<LogEntry>,
    pub(crate) authorization_entries: Vec<AuthorizationEntry>,
    pub(crate) keypad_entries: Vec<KeypadEntry>,
    pub(crate) time_control_entries: Vec<TimeControlEntry>,

    pub(crate) log_entry_count: u32,
    pub(crate) logging_enabled: bool,
    pub(crate) keypad_code_count: u16,
    pub(crate) authorization_entry_count: u16,
    pub(crate) time_control_entry_count: u8,

    pub(crate) last_error_code: Option<u8>,
    pub(crate) last_error_command: Command,
}

impl SessionState {
    pub fn new() -> Self {
        SessionState {
            received_status: STATUS_NONE,
            last_message_code: Command::EMPTY,
            ..Default::default()
        }
    }

    /// Wipe the pairing scratch space. Called when a pairing run starts
    /// and again on any terminal pairing outcome.
    pub(crate) fn reset_pairing(&mut self) {
        self.remote_public_key.zeroize();
        self.challenge_nonce.zeroize();
        self.authorization_id.zeroize();
        self.lock_id.zeroize();
        self.received_status = STATUS_NONE;
    }

    /// Take the pending challenge nonce, zeroing it. Each nonce the lock
    /// issues is consumed exactly once.
    pub(crate) fn consume_challenge_nonce(&mut self) -> [u8; 32] {
        let nonce = self.challenge_nonce;
        self.challenge_nonce.zeroize();
        nonce
    }

    pub(crate) fn has_challenge_nonce(&self) -> bool {
        self.challenge_nonce != [0u8; 32]
    }

    /// Apply one decoded inbound message.
    ///
    /// Returns `true` when the message was applied and the dispatch
    /// signals were raised; malformed payloads are dropped without
    /// touching any state.
    pub(crate) fn apply_message(&mut self, command: Command, payload: &[u8]) -> bool {
        let applied = match command {
            Command::PUBLIC_KEY => copy_fixed(&mut self.remote_public_key, payload),
            Command::CHALLENGE => copy_fixed(&mut self.challenge_nonce, payload),
            Command::AUTHORIZATION_ID => {
                // authenticator(32) || auth_id(4) || lock_id(16) || nonce(32)
                if payload.len() < 84 {
                    false
                } else {
                    self.authorization_id.copy_from_slice(&payload[32..36]);
                    self.lock_id.copy_from_slice(&payload[36..52]);
                    self.challenge_nonce.copy_from_slice(&payload[52..84]);
                    true
                }
            }
            Command::STATUS => {
                if payload.is_empty() {
                    false
                } else {
                    self.received_status = payload[0];
                    true
                }
            }
            Command::KEYTURNER_STATES => match KeyTurnerState::decode(payload) {
                Ok(state) => {
                    self.key_turner_state = Some(state);
                    true
                }
                Err(_) => false,
            },
            Command::CONFIG => match Config::decode(payload) {
                Ok(config) => {
                    self.config = Some(config);
                    true
                }
                Err(_) => false,
            },
            Command::ADVANCED_CONFIG => match AdvancedConfig::decode(payload) {
                Ok(config) => {
                    self.advanced_config = Some(config);
                    true
                }
                Err(_) => false,
            },
            Command::BATTERY_REPORT => match BatteryReport::decode(payload) {
                Ok(report) => {
                    self.battery_report = Some(report);
                    true
                }
                Err(_) => false,
            },
            Command::LOG_ENTRY => match LogEntry::decode(payload) {
                Ok(entry) => {
                    self.log_entries.push(entry);
                    true
                }
                Err(_) => false,
            },
            Command::AUTHORIZATION_ENTRY => match AuthorizationEntry::decode(payload) {
                Ok(entry) => {
                    self.authorization_entries.push(entry);
                    true
                }
                Err(_) => false,
            },
            Command::KEYPAD_CODE => match KeypadEntry::decode(payload) {
                Ok(entry) => {
                    self.keypad_entries.push(entry);
                    true
                }
                Err(_) => false,
            },
            Command::TIME_CONTROL_ENTRY => match TimeControlEntry::decode(payload) {
                Ok(entry) => {
                    self.time_control_entries.push(entry);
                    true
                }
                Err(_) => false,
            },
            Command::LOG_ENTRY_COUNT => {
                // logging_enabled(1) || count(4 LE)
                if payload.len() < 5 {
                    false
                } else {
                    self.logging_enabled = payload[0] != 0;
                    self.log_entry_count =
                        u32::from_le_bytes([payload[1], payload[2], payload[3], payload[4]]);
                    true
                }
            }
            Command::KEYPAD_CODE_COUNT => {
                if payload.len() < 2 {
                    false
                } else {
                    self.keypad_code_count = u16::from_le_bytes([payload[0], payload[1]]);
                    true
                }
            }
            Command::AUTHORIZATION_ENTRY_COUNT => {
                if payload.len() < 2 {
                    false
                } else {
                    self.authorization_entry_count =
                        u16::from_le_bytes([payload[0], payload[1]]);
                    true
                }
            }
            Command::TIME_CONTROL_ENTRY_COUNT => {
                if payload.is_empty() {
                    false
                } else {
                    self.time_control_entry_count = payload[0];
                    true
                }
            }
            Command::ERROR_REPORT => {
                // error_code(1) || command(2 LE)
                if payload.len() < 3 {
                    false
                } else {
                    let code = payload[0];
                    let context = Command::from(u16::from_le_bytes([payload[1], payload[2]]));
                    warn!("lock reported error 0x{code:02X} for {context}");
                    self.last_error_code = Some(code);
                    self.last_error_command = context;
                    true
                }
            }
            other => {
                debug!(command = %other, len = payload.len(), "ignoring message");
                true
            }
        };

        if applied {
            self.last_message_code = command;
            self.crc_check_ok = true;
        } else {
            warn!(%command, len = payload.len(), "dropping malformed payload");
        }
        applied
    }
}

fn copy_fixed<const N: usize>(target: &mut [u8; N], payload: &[u8]) -> bool {
    if payload.len() < N {
        return false;
    }
    target.copy_from_slice(&payload[..N]);
    true
}
