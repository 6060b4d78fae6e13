//! Command identifiers of the keyturner protocol.
//!
//! Commands are 16-bit values, little-endian on the wire. They are modeled
//! as a newtype with named constants rather than an enum: the lock is free
//! to send identifiers this crate does not know (firmware revisions add
//! commands), and one raw value is shared between an outbound-only and an
//! inbound-only command.

use std::fmt;

/// A 16-bit keyturner command identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Command(pub u16);

impl Command {
    /// Sentinel for "no message received"; never valid on the wire.
    pub const EMPTY: Command = Command(0x0000);

    pub const REQUEST_DATA: Command = Command(0x0001);
    pub const PUBLIC_KEY: Command = Command(0x0003);
    pub const CHALLENGE: Command = Command(0x0004);
    pub const AUTHORIZATION_AUTHENTICATOR: Command = Command(0x0005);
    pub const AUTHORIZATION_DATA: Command = Command(0x0006);
    pub const AUTHORIZATION_ID: Command = Command(0x0007);
    pub const REMOVE_USER_AUTHORIZATION: Command = Command(0x0008);
    pub const KEYTURNER_STATES: Command = Command(0x000C);
    pub const LOCK_ACTION: Command = Command(0x000D);
    pub const STATUS: Command = Command(0x000E);
    pub const BATTERY_REPORT: Command = Command(0x0011);
    pub const ERROR_REPORT: Command = Command(0x0012);
    pub const SET_CONFIG: Command = Command(0x0013);
    pub const REQUEST_CONFIG: Command = Command(0x0014);
    pub const CONFIG: Command = Command(0x0015);
    pub const ADVANCED_CONFIG: Command = Command(0x0019);
    /// Shares its raw value with [`Command::ADVANCED_CONFIG`]; this one is
    /// only ever sent, the other only ever received.
    pub const SET_SECURITY_PIN: Command = Command(0x0019);
    pub const SET_ADVANCED_CONFIG: Command = Command(0x001A);
    pub const REQUEST_ADVANCED_CONFIG: Command = Command(0x001B);
    pub const AUTHORIZATION_ID_CONFIRMATION: Command = Command(0x001E);
    pub const AUTHORIZATION_ID_INVITE: Command = Command(0x001F);
    pub const VERIFY_SECURITY_PIN: Command = Command(0x0020);
    pub const UPDATE_TIME: Command = Command(0x0021);
    pub const AUTHORIZATION_ENTRY: Command = Command(0x0023);
    pub const REQUEST_AUTHORIZATION_ENTRIES: Command = Command(0x0024);
    pub const AUTHORIZATION_DATA_INVITE: Command = Command(0x0025);
    pub const AUTHORIZATION_ENTRY_COUNT: Command = Command(0x0026);
    pub const UPDATE_AUTHORIZATION: Command = Command(0x0027);
    pub const LOG_ENTRY: Command = Command(0x0031);
    pub const REQUEST_LOG_ENTRIES: Command = Command(0x0032);
    pub const LOG_ENTRY_COUNT: Command = Command(0x0033);
    pub const REQUEST_CALIBRATION: Command = Command(0x0034);
    pub const REQUEST_REBOOT: Command = Command(0x0035);
    pub const ADD_KEYPAD_CODE: Command = Command(0x0041);
    pub const UPDATE_KEYPAD_CODE: Command = Command(0x0042);
    pub const REQUEST_KEYPAD_CODES: Command = Command(0x0043);
    pub const KEYPAD_CODE: Command = Command(0x0044);
    pub const KEYPAD_CODE_COUNT: Command = Command(0x0045);
    pub const KEYPAD_CODE_ID: Command = Command(0x0046);
    pub const KEYPAD_ACTION: Command = Command(0x0047);
    pub const ADD_TIME_CONTROL_ENTRY: Command = Command(0x0051);
    pub const TIME_CONTROL_ENTRY: Command = Command(0x0052);
    pub const UPDATE_TIME_CONTROL_ENTRY: Command = Command(0x0053);
    pub const REQUEST_TIME_CONTROL_ENTRIES: Command = Command(0x0054);
    pub const REMOVE_TIME_CONTROL_ENTRY: Command = Command(0x0055);
    pub const TIME_CONTROL_ENTRY_COUNT: Command = Command(0x0056);

    /// Raw identifier as carried on the wire.
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Human-readable name for diagnostics; `None` for identifiers this
    /// crate does not know.
    pub fn name(self) -> Option<&'static str> {
        Some(match self {
            Command::EMPTY => "Empty",
            Command::REQUEST_DATA => "RequestData",
            Command::PUBLIC_KEY => "PublicKey",
            Command::CHALLENGE => "Challenge",
            Command::AUTHORIZATION_AUTHENTICATOR => "AuthorizationAuthenticator",
            Command::AUTHORIZATION_DATA => "AuthorizationData",
            Command::AUTHORIZATION_ID => "AuthorizationId",
            Command::REMOVE_USER_AUTHORIZATION => "RemoveUserAuthorization",
            Command::KEYTURNER_STATES => "KeyturnerStates",
            Command::LOCK_ACTION => "LockAction",
            Command::STATUS => "Status",
            Command::BATTERY_REPORT => "BatteryReport",
            Command::ERROR_REPORT => "ErrorReport",
            Command::SET_CONFIG => "SetConfig",
            Command::REQUEST_CONFIG => "RequestConfig",
            Command::CONFIG => "Config",
            Command::ADVANCED_CONFIG => "AdvancedConfig",
            Command::SET_ADVANCED_CONFIG => "SetAdvancedConfig",
            Command::REQUEST_ADVANCED_CONFIG => "RequestAdvancedConfig",
            Command::AUTHORIZATION_ID_CONFIRMATION => "AuthorizationIdConfirmation",
            Command::AUTHORIZATION_ID_INVITE => "AuthorizationIdInvite",
            Command::VERIFY_SECURITY_PIN => "VerifySecurityPin",
            Command::UPDATE_TIME => "UpdateTime",
            Command::AUTHORIZATION_ENTRY => "AuthorizationEntry",
            Command::REQUEST_AUTHORIZATION_ENTRIES => "RequestAuthorizationEntries",
            Command::AUTHORIZATION_DATA_INVITE => "AuthorizationDataInvite",
            Command::AUTHORIZATION_ENTRY_COUNT => "AuthorizationEntryCount",
            Command::UPDATE_AUTHORIZATION => "UpdateAuthorization",
            Command::LOG_ENTRY => "LogEntry",
            Command::REQUEST_LOG_ENTRIES => "RequestLogEntries",
            Command::LOG_ENTRY_COUNT => "LogEntryCount",
            Command::REQUEST_CALIBRATION => "RequestCalibration",
            Command::REQUEST_REBOOT => "RequestReboot",
            Command::ADD_KEYPAD_CODE => "AddKeypadCode",
            Command::UPDATE_KEYPAD_CODE => "UpdateKeypadCode",
            Command::REQUEST_KEYPAD_CODES => "RequestKeypadCodes",
            Command::KEYPAD_CODE => "KeypadCode",
            Command::KEYPAD_CODE_COUNT => "KeypadCodeCount",
            Command::KEYPAD_CODE_ID => "KeypadCodeId",
            Command::KEYPAD_ACTION => "KeypadAction",
            Command::ADD_TIME_CONTROL_ENTRY => "AddTimeControlEntry",
            Command::TIME_CONTROL_ENTRY => "TimeControlEntry",
            Command::UPDATE_TIME_CONTROL_ENTRY => "UpdateTimeControlEntry",
            Command::REQUEST_TIME_CONTROL_ENTRIES => "RequestTimeControlEntries",
            Command::REMOVE_TIME_CONTROL_ENTRY => "RemoveTimeControlEntry",
            Command::TIME_CONTROL_ENTRY_COUNT => "TimeControlEntryCount",
            _ => return None,
        })
    }
}

impl Default for Command {
    fn default() -> Self {
        Command::EMPTY
    }
}

impl From<u16> for Command {
    fn from(raw: u16) -> Self {
        Command(raw)
    }
}

impl From<Command> for u16 {
    fn from(cmd: Command) -> Self {
        cmd.0
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{}(0x{:04X})", name, self.0),
            None => write!(f, "Unknown(0x{:04X})", self.0),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
