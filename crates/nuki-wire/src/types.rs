//! Typed lock-side structs and their explicit little-endian codecs.
//!
//! Every struct documents its encoded size; decoders check the length up
//! front and then read field by field. Inbound decoders tolerate trailing
//! bytes (newer firmware appends fields) but never accept short buffers.

use bytes::{Buf, BufMut};

use crate::frame::WireError;

// ============================================================================
// Small enums
// ============================================================================

/// Requested keyturner motion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum LockAction {
    Unlock = 0x01,
    Lock = 0x02,
    Unlatch = 0x03,
    LockNGo = 0x04,
    LockNGoUnlatch = 0x05,
    FullLock = 0x06,
    FobAction1 = 0x81,
    FobAction2 = 0x82,
    FobAction3 = 0x83,
}

impl From<LockAction> for u8 {
    fn from(action: LockAction) -> Self {
        action as u8
    }
}

/// Reported keyturner position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LockState {
    #[default]
    Uncalibrated,
    Locked,
    Unlocking,
    Unlocked,
    Locking,
    Unlatched,
    UnlockedLockNGo,
    Unlatching,
    Calibration,
    BootRun,
    MotorBlocked,
    Undefined(u8),
}

impl From<u8> for LockState {
    fn from(raw: u8) -> Self {
        match raw {
            0x00 => LockState::Uncalibrated,
            0x01 => LockState::Locked,
            0x02 => LockState::Unlocking,
            0x03 => LockState::Unlocked,
            0x04 => LockState::Locking,
            0x05 => LockState::Unlatched,
            0x06 => LockState::UnlockedLockNGo,
            0x07 => LockState::Unlatching,
            0xFC => LockState::Calibration,
            0xFD => LockState::BootRun,
            0xFE => LockState::MotorBlocked,
            other => LockState::Undefined(other),
        }
    }
}

// ============================================================================
// Time
// ============================================================================

/// Wall-clock time as the lock encodes it. Encoded size: 7 bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TimeValue {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl TimeValue {
    pub const ENCODED_LEN: usize = 7;

    pub fn decode(data: &[u8]) -> Result<Self, WireError> {
        if data.len() < Self::ENCODED_LEN {
            return Err(WireError::TooShort(data.len()));
        }
        let mut buf = data;
        Ok(Self::read(&mut buf))
    }

    pub(crate) fn read(buf: &mut &[u8]) -> Self {
        TimeValue {
            year: buf.get_u16_le(),
            month: buf.get_u8(),
            day: buf.get_u8(),
            hour: buf.get_u8(),
            minute: buf.get_u8(),
            second: buf.get_u8(),
        }
    }

    pub(crate) fn write(&self, out: &mut Vec<u8>) {
        out.put_u16_le(self.year);
        out.put_u8(self.month);
        out.put_u8(self.day);
        out.put_u8(self.hour);
        out.put_u8(self.minute);
        out.put_u8(self.second);
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::ENCODED_LEN);
        self.write(&mut out);
        out
    }
}

fn read_bytes<const N: usize>(buf: &mut &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    buf.copy_to_slice(&mut out);
    out
}

/// Render a NUL-padded fixed-width name field.
pub fn name_to_string(name: &[u8]) -> String {
    let end = name.iter().position(|&b| b == 0).unwrap_or(name.len());
    String::from_utf8_lossy(&name[..end]).into_owned()
}

// ============================================================================
// Keyturner state
// ============================================================================

/// Snapshot reported by `KeyturnerStates`. Encoded size: 21 bytes, with an
/// optional trailing accessory battery byte on newer firmware.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeyTurnerState {
    pub nuki_state: u8,
    pub lock_state: u8,
    pub trigger: u8,
    pub current_time: TimeValue,
    pub timezone_offset: i16,
    pub critical_battery_state: u8,
    pub config_update_count: u8,
    pub lock_n_go_timer: u8,
    pub last_lock_action: u8,
    pub last_lock_action_trigger: u8,
    pub last_lock_action_completion_status: u8,
    pub door_sensor_state: u8,
    pub night_mode_active: u16,
    pub accessory_battery_state: u8,
}

impl KeyTurnerState {
    pub const ENCODED_LEN: usize = 21;

    pub fn decode(data: &[u8]) -> Result<Self, WireError> {
        if data.len() < Self::ENCODED_LEN {
            return Err(WireError::TooShort(data.len()));
        }
        let mut buf = data;
        let mut state = KeyTurnerState {
            nuki_state: buf.get_u8(),
            lock_state: buf.get_u8(),
            trigger: buf.get_u8(),
            current_time: TimeValue::read(&mut buf),
            timezone_offset: buf.get_i16_le(),
            critical_battery_state: buf.get_u8(),
            config_update_count: buf.get_u8(),
            lock_n_go_timer: buf.get_u8(),
            last_lock_action: buf.get_u8(),
            last_lock_action_trigger: buf.get_u8(),
            last_lock_action_completion_status: buf.get_u8(),
            door_sensor_state: buf.get_u8(),
            night_mode_active: buf.get_u16_le(),
            accessory_battery_state: 0,
        };
        if buf.has_remaining() {
            state.accessory_battery_state = buf.get_u8();
        }
        Ok(state)
    }

    pub fn lock_state(&self) -> LockState {
        LockState::from(self.lock_state)
    }

    /// Battery critically low.
    pub fn is_battery_critical(&self) -> bool {
        self.critical_battery_state & (1 << 0) != 0
    }

    /// Battery charging right now.
    pub fn is_battery_charging(&self) -> bool {
        self.critical_battery_state & (1 << 1) != 0
    }

    /// Battery load in percent, 2% resolution.
    pub fn battery_percent(&self) -> u8 {
        (self.critical_battery_state & 0xFC) >> 1
    }

    /// Keypad battery critically low; only meaningful when the lock
    /// reports keypad support in the accessory state byte.
    pub fn is_keypad_battery_critical(&self) -> bool {
        if self.accessory_battery_state & (1 << 7) != 0 {
            self.accessory_battery_state & (1 << 6) != 0
        } else {
            false
        }
    }
}

// ============================================================================
// Config
// ============================================================================

/// Lock configuration as reported by `Config`. Encoded size: 74 bytes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Config {
    pub nuki_id: u32,
    pub name: [u8; 32],
    pub latitude: f32,
    pub longitude: f32,
    pub auto_unlatch: u8,
    pub pairing_enabled: u8,
    pub button_enabled: u8,
    pub led_enabled: u8,
    pub led_brightness: u8,
    pub current_time: TimeValue,
    pub timezone_offset: i16,
    pub dst_mode: u8,
    pub has_fob: u8,
    pub fob_action_1: u8,
    pub fob_action_2: u8,
    pub fob_action_3: u8,
    pub single_lock: u8,
    pub advertising_mode: u8,
    pub has_keypad: u8,
    pub firmware_version: [u8; 3],
    pub hardware_revision: [u8; 2],
    pub homekit_status: u8,
    pub timezone_id: u16,
}

impl Config {
    pub const ENCODED_LEN: usize = 74;

    pub fn decode(data: &[u8]) -> Result<Self, WireError> {
        if data.len() < Self::ENCODED_LEN {
            return Err(WireError::TooShort(data.len()));
        }
        let mut buf = data;
        Ok(Config {
            nuki_id: buf.get_u32_le(),
            name: read_bytes(&mut buf),
            latitude: buf.get_f32_le(),
            longitude: buf.get_f32_le(),
            auto_unlatch: buf.get_u8(),
            pairing_enabled: buf.get_u8(),
            button_enabled: buf.get_u8(),
            led_enabled: buf.get_u8(),
            led_brightness: buf.get_u8(),
            current_time: TimeValue::read(&mut buf),
            timezone_offset: buf.get_i16_le(),
            dst_mode: buf.get_u8(),
            has_fob: buf.get_u8(),
            fob_action_1: buf.get_u8(),
            fob_action_2: buf.get_u8(),
            fob_action_3: buf.get_u8(),
            single_lock: buf.get_u8(),
            advertising_mode: buf.get_u8(),
            has_keypad: buf.get_u8(),
            firmware_version: read_bytes(&mut buf),
            hardware_revision: read_bytes(&mut buf),
            homekit_status: buf.get_u8(),
            timezone_id: buf.get_u16_le(),
        })
    }

    pub fn name(&self) -> String {
        name_to_string(&self.name)
    }
}

/// Writable subset of [`Config`] sent with `SetConfig`. Encoded size: 55.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NewConfig {
    pub name: [u8; 32],
    pub latitude: f32,
    pub longitude: f32,
    pub auto_unlatch: u8,
    pub pairing_enabled: u8,
    pub button_enabled: u8,
    pub led_enabled: u8,
    pub led_brightness: u8,
    pub timezone_offset: i16,
    pub dst_mode: u8,
    pub fob_action_1: u8,
    pub fob_action_2: u8,
    pub fob_action_3: u8,
    pub single_lock: u8,
    pub advertising_mode: u8,
    pub timezone_id: u16,
}

impl NewConfig {
    pub const ENCODED_LEN: usize = 55;

    /// Carry the writable fields of a reported config over unchanged.
    pub fn from_config(config: &Config) -> Self {
        NewConfig {
            name: config.name,
            latitude: config.latitude,
            longitude: config.longitude,
            auto_unlatch: config.auto_unlatch,
            pairing_enabled: config.pairing_enabled,
            button_enabled: config.button_enabled,
            led_enabled: config.led_enabled,
            led_brightness: config.led_brightness,
            timezone_offset: config.timezone_offset,
            dst_mode: config.dst_mode,
            fob_action_1: config.fob_action_1,
            fob_action_2: config.fob_action_2,
            fob_action_3: config.fob_action_3,
            single_lock: config.single_lock,
            advertising_mode: config.advertising_mode,
            timezone_id: config.timezone_id,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::ENCODED_LEN);
        out.extend_from_slice(&self.name);
        out.put_f32_le(self.latitude);
        out.put_f32_le(self.longitude);
        out.put_u8(self.auto_unlatch);
        out.put_u8(self.pairing_enabled);
        out.put_u8(self.button_enabled);
        out.put_u8(self.led_enabled);
        out.put_u8(self.led_brightness);
        out.put_i16_le(self.timezone_offset);
        out.put_u8(self.dst_mode);
        out.put_u8(self.fob_action_1);
        out.put_u8(self.fob_action_2);
        out.put_u8(self.fob_action_3);
        out.put_u8(self.single_lock);
        out.put_u8(self.advertising_mode);
        out.put_u16_le(self.timezone_id);
        out
    }
}

// ============================================================================
// Advanced config
// ============================================================================

/// Advanced configuration as reported by `AdvancedConfig`. Encoded size: 31.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AdvancedConfig {
    pub total_degrees: u16,
    pub unlocked_position_offset_degrees: i16,
    pub locked_position_offset_degrees: i16,
    pub single_locked_position_offset_degrees: i16,
    pub unlocked_to_locked_transition_offset_degrees: i16,
    pub lock_n_go_timeout: u8,
    pub single_button_press_action: u8,
    pub double_button_press_action: u8,
    pub detached_cylinder: u8,
    pub battery_type: u8,
    pub automatic_battery_type_detection: u8,
    pub unlatch_duration: u8,
    pub auto_lock_timeout: u16,
    pub auto_unlock_disabled: u8,
    pub night_mode_enabled: u8,
    pub night_mode_start_time: [u8; 2],
    pub night_mode_end_time: [u8; 2],
    pub night_mode_auto_lock_enabled: u8,
    pub night_mode_auto_unlock_disabled: u8,
    pub night_mode_immediate_lock_on_start: u8,
    pub auto_lock_enabled: u8,
    pub immediate_auto_lock_enabled: u8,
    pub auto_update_enabled: u8,
}

impl AdvancedConfig {
    pub const ENCODED_LEN: usize = 31;

    pub fn decode(data: &[u8]) -> Result<Self, WireError> {
        if data.len() < Self::ENCODED_LEN {
            return Err(WireError::TooShort(data.len()));
        }
        let mut buf = data;
        Ok(AdvancedConfig {
            total_degrees: buf.get_u16_le(),
            unlocked_position_offset_degrees: buf.get_i16_le(),
            locked_position_offset_degrees: buf.get_i16_le(),
            single_locked_position_offset_degrees: buf.get_i16_le(),
            unlocked_to_locked_transition_offset_degrees: buf.get_i16_le(),
            lock_n_go_timeout: buf.get_u8(),
            single_button_press_action: buf.get_u8(),
            double_button_press_action: buf.get_u8(),
            detached_cylinder: buf.get_u8(),
            battery_type: buf.get_u8(),
            automatic_battery_type_detection: buf.get_u8(),
            unlatch_duration: buf.get_u8(),
            auto_lock_timeout: buf.get_u16_le(),
            auto_unlock_disabled: buf.get_u8(),
            night_mode_enabled: buf.get_u8(),
            night_mode_start_time: read_bytes(&mut buf),
            night_mode_end_time: read_bytes(&mut buf),
            night_mode_auto_lock_enabled: buf.get_u8(),
            night_mode_auto_unlock_disabled: buf.get_u8(),
            night_mode_immediate_lock_on_start: buf.get_u8(),
            auto_lock_enabled: buf.get_u8(),
            immediate_auto_lock_enabled: buf.get_u8(),
            auto_update_enabled: buf.get_u8(),
        })
    }
}

/// Writable subset of [`AdvancedConfig`] sent with `SetAdvancedConfig`.
/// Encoded size: 29 (no `total_degrees`).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NewAdvancedConfig {
    pub unlocked_position_offset_degrees: i16,
    pub locked_position_offset_degrees: i16,
    pub single_locked_position_offset_degrees: i16,
    pub unlocked_to_locked_transition_offset_degrees: i16,
    pub lock_n_go_timeout: u8,
    pub single_button_press_action: u8,
    pub double_button_press_action: u8,
    pub detached_cylinder: u8,
    pub battery_type: u8,
    pub automatic_battery_type_detection: u8,
    pub unlatch_duration: u8,
    pub auto_lock_timeout: u16,
    pub auto_unlock_disabled: u8,
    pub night_mode_enabled: u8,
    pub night_mode_start_time: [u8; 2],
    pub night_mode_end_time: [u8; 2],
    pub night_mode_auto_lock_enabled: u8,
    pub night_mode_auto_unlock_disabled: u8,
    pub night_mode_immediate_lock_on_start: u8,
    pub auto_lock_enabled: u8,
    pub immediate_auto_lock_enabled: u8,
    pub auto_update_enabled: u8,
}

impl NewAdvancedConfig {
    pub const ENCODED_LEN: usize = 29;

    pub fn from_advanced_config(config: &AdvancedConfig) -> Self {
        NewAdvancedConfig {
            unlocked_position_offset_degrees: config.unlocked_position_offset_degrees,
            locked_position_offset_degrees: config.locked_position_offset_degrees,
            single_locked_position_offset_degrees: config.single_locked_position_offset_degrees,
            unlocked_to_locked_transition_offset_degrees: config
                .unlocked_to_locked_transition_offset_degrees,
            lock_n_go_timeout: config.lock_n_go_timeout,
            single_button_press_action: config.single_button_press_action,
            double_button_press_action: config.double_button_press_action,
            detached_cylinder: config.detached_cylinder,
            battery_type: config.battery_type,
            automatic_battery_type_detection: config.automatic_battery_type_detection,
            unlatch_duration: config.unlatch_duration,
            auto_lock_timeout: config.auto_lock_timeout,
            auto_unlock_disabled: config.auto_unlock_disabled,
            night_mode_enabled: config.night_mode_enabled,
            night_mode_start_time: config.night_mode_start_time,
            night_mode_end_time: config.night_mode_end_time,
            night_mode_auto_lock_enabled: config.night_mode_auto_lock_enabled,
            night_mode_auto_unlock_disabled: config.night_mode_auto_unlock_disabled,
            night_mode_immediate_lock_on_start: config.night_mode_immediate_lock_on_start,
            auto_lock_enabled: config.auto_lock_enabled,
            immediate_auto_lock_enabled: config.immediate_auto_lock_enabled,
            auto_update_enabled: config.auto_update_enabled,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::ENCODED_LEN);
        out.put_i16_le(self.unlocked_position_offset_degrees);
        out.put_i16_le(self.locked_position_offset_degrees);
        out.put_i16_le(self.single_locked_position_offset_degrees);
        out.put_i16_le(self.unlocked_to_locked_transition_offset_degrees);
        out.put_u8(self.lock_n_go_timeout);
        out.put_u8(self.single_button_press_action);
        out.put_u8(self.double_button_press_action);
        out.put_u8(self.detached_cylinder);
        out.put_u8(self.battery_type);
        out.put_u8(self.automatic_battery_type_detection);
        out.put_u8(self.unlatch_duration);
        out.put_u16_le(self.auto_lock_timeout);
        out.put_u8(self.auto_unlock_disabled);
        out.put_u8(self.night_mode_enabled);
        out.extend_from_slice(&self.night_mode_start_time);
        out.extend_from_slice(&self.night_mode_end_time);
        out.put_u8(self.night_mode_auto_lock_enabled);
        out.put_u8(self.night_mode_auto_unlock_disabled);
        out.put_u8(self.night_mode_immediate_lock_on_start);
        out.put_u8(self.auto_lock_enabled);
        out.put_u8(self.immediate_auto_lock_enabled);
        out.put_u8(self.auto_update_enabled);
        out
    }
}

// ============================================================================
// Battery report
// ============================================================================

/// Detailed battery data reported by `BatteryReport`. Encoded size: 17.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatteryReport {
    pub battery_drain: u16,
    pub battery_voltage: u16,
    pub critical_battery_state: u8,
    pub lock_action: u8,
    pub start_voltage: u16,
    pub lowest_voltage: u16,
    pub lock_distance: u16,
    pub start_temperature: i8,
    pub max_turn_current: u16,
    pub battery_resistance: u16,
}

impl BatteryReport {
    pub const ENCODED_LEN: usize = 17;

    pub fn decode(data: &[u8]) -> Result<Self, WireError> {
        if data.len() < Self::ENCODED_LEN {
            return Err(WireError::TooShort(data.len()));
        }
        let mut buf = data;
        Ok(BatteryReport {
            battery_drain: buf.get_u16_le(),
            battery_voltage: buf.get_u16_le(),
            critical_battery_state: buf.get_u8(),
            lock_action: buf.get_u8(),
            start_voltage: buf.get_u16_le(),
            lowest_voltage: buf.get_u16_le(),
            lock_distance: buf.get_u16_le(),
            start_temperature: buf.get_i8(),
            max_turn_current: buf.get_u16_le(),
            battery_resistance: buf.get_u16_le(),
        })
    }
}

// ============================================================================
// Log entries
// ============================================================================

/// One activity-log record. Encoded size: 53.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LogEntry {
    pub index: u32,
    pub timestamp: TimeValue,
    pub auth_id: u32,
    pub name: [u8; 32],
    pub log_type: u8,
    pub data: [u8; 5],
}

impl LogEntry {
    pub const ENCODED_LEN: usize = 53;

    pub fn decode(data: &[u8]) -> Result<Self, WireError> {
        if data.len() < Self::ENCODED_LEN {
            return Err(WireError::TooShort(data.len()));
        }
        let mut buf = data;
        Ok(LogEntry {
            index: buf.get_u32_le(),
            timestamp: TimeValue::read(&mut buf),
            auth_id: buf.get_u32_le(),
            name: read_bytes(&mut buf),
            log_type: buf.get_u8(),
            data: read_bytes(&mut buf),
        })
    }

    pub fn name(&self) -> String {
        name_to_string(&self.name)
    }
}

// ============================================================================
// Keypad entries
// ============================================================================

/// One keypad code record. Encoded size: 63.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeypadEntry {
    pub code_id: u16,
    pub code: u32,
    pub name: [u8; 20],
    pub enabled: u8,
    pub date_created: TimeValue,
    pub date_last_active: TimeValue,
    pub lock_count: u16,
    pub time_limited: u8,
    pub allowed_from_date: TimeValue,
    pub allowed_until_date: TimeValue,
    pub allowed_weekdays: u8,
    pub allowed_from_time: [u8; 2],
    pub allowed_until_time: [u8; 2],
}

impl KeypadEntry {
    pub const ENCODED_LEN: usize = 63;

    pub fn decode(data: &[u8]) -> Result<Self, WireError> {
        if data.len() < Self::ENCODED_LEN {
            return Err(WireError::TooShort(data.len()));
        }
        let mut buf = data;
        Ok(KeypadEntry {
            code_id: buf.get_u16_le(),
            code: buf.get_u32_le(),
            name: read_bytes(&mut buf),
            enabled: buf.get_u8(),
            date_created: TimeValue::read(&mut buf),
            date_last_active: TimeValue::read(&mut buf),
            lock_count: buf.get_u16_le(),
            time_limited: buf.get_u8(),
            allowed_from_date: TimeValue::read(&mut buf),
            allowed_until_date: TimeValue::read(&mut buf),
            allowed_weekdays: buf.get_u8(),
            allowed_from_time: read_bytes(&mut buf),
            allowed_until_time: read_bytes(&mut buf),
        })
    }
}

/// Payload of `AddKeypadCode`. Encoded size: 44.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NewKeypadEntry {
    pub code: u32,
    pub name: [u8; 20],
    pub time_limited: u8,
    pub allowed_from_date: TimeValue,
    pub allowed_until_date: TimeValue,
    pub allowed_weekdays: u8,
    pub allowed_from_time: [u8; 2],
    pub allowed_until_time: [u8; 2],
}

impl NewKeypadEntry {
    pub const ENCODED_LEN: usize = 44;

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::ENCODED_LEN);
        out.put_u32_le(self.code);
        out.extend_from_slice(&self.name);
        out.put_u8(self.time_limited);
        self.allowed_from_date.write(&mut out);
        self.allowed_until_date.write(&mut out);
        out.put_u8(self.allowed_weekdays);
        out.extend_from_slice(&self.allowed_from_time);
        out.extend_from_slice(&self.allowed_until_time);
        out
    }
}

/// Payload of `UpdateKeypadCode`. Encoded size: 47.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UpdatedKeypadEntry {
    pub code_id: u16,
    pub code: u32,
    pub name: [u8; 20],
    pub enabled: u8,
    pub time_limited: u8,
    pub allowed_from_date: TimeValue,
    pub allowed_until_date: TimeValue,
    pub allowed_weekdays: u8,
    pub allowed_from_time: [u8; 2],
    pub allowed_until_time: [u8; 2],
}

impl UpdatedKeypadEntry {
    pub const ENCODED_LEN: usize = 47;

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::ENCODED_LEN);
        out.put_u16_le(self.code_id);
        out.put_u32_le(self.code);
        out.extend_from_slice(&self.name);
        out.put_u8(self.enabled);
        out.put_u8(self.time_limited);
        self.allowed_from_date.write(&mut out);
        self.allowed_until_date.write(&mut out);
        out.put_u8(self.allowed_weekdays);
        out.extend_from_slice(&self.allowed_from_time);
        out.extend_from_slice(&self.allowed_until_time);
        out
    }
}

// ============================================================================
// Authorization entries
// ============================================================================

/// One authorization record. Encoded size: 75.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthorizationEntry {
    pub auth_id: u32,
    pub id_type: u8,
    pub name: [u8; 32],
    pub enabled: u8,
    pub remote_allowed: u8,
    pub date_created: TimeValue,
    pub date_last_active: TimeValue,
    pub lock_count: u16,
    pub time_limited: u8,
    pub allowed_from_date: TimeValue,
    pub allowed_until_date: TimeValue,
    pub allowed_weekdays: u8,
    pub allowed_from_time: [u8; 2],
    pub allowed_until_time: [u8; 2],
}

impl AuthorizationEntry {
    pub const ENCODED_LEN: usize = 75;

    pub fn decode(data: &[u8]) -> Result<Self, WireError> {
        if data.len() < Self::ENCODED_LEN {
            return Err(WireError::TooShort(data.len()));
        }
        let mut buf = data;
        Ok(AuthorizationEntry {
            auth_id: buf.get_u32_le(),
            id_type: buf.get_u8(),
            name: read_bytes(&mut buf),
            enabled: buf.get_u8(),
            remote_allowed: buf.get_u8(),
            date_created: TimeValue::read(&mut buf),
            date_last_active: TimeValue::read(&mut buf),
            lock_count: buf.get_u16_le(),
            time_limited: buf.get_u8(),
            allowed_from_date: TimeValue::read(&mut buf),
            allowed_until_date: TimeValue::read(&mut buf),
            allowed_weekdays: buf.get_u8(),
            allowed_from_time: read_bytes(&mut buf),
            allowed_until_time: read_bytes(&mut buf),
        })
    }

    pub fn name(&self) -> String {
        name_to_string(&self.name)
    }
}

/// Payload of `AuthorizationDataInvite`. Encoded size: 86.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewAuthorizationEntry {
    pub name: [u8; 32],
    pub id_type: u8,
    pub shared_key: [u8; 32],
    pub remote_allowed: u8,
    pub time_limited: u8,
    pub allowed_from_date: TimeValue,
    pub allowed_until_date: TimeValue,
    pub allowed_weekdays: u8,
    pub allowed_from_time: [u8; 2],
    pub allowed_until_time: [u8; 2],
}

impl NewAuthorizationEntry {
    pub const ENCODED_LEN: usize = 86;

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::ENCODED_LEN);
        out.extend_from_slice(&self.name);
        out.put_u8(self.id_type);
        out.extend_from_slice(&self.shared_key);
        out.put_u8(self.remote_allowed);
        out.put_u8(self.time_limited);
        self.allowed_from_date.write(&mut out);
        self.allowed_until_date.write(&mut out);
        out.put_u8(self.allowed_weekdays);
        out.extend_from_slice(&self.allowed_from_time);
        out.extend_from_slice(&self.allowed_until_time);
        out
    }
}

impl Default for NewAuthorizationEntry {
    fn default() -> Self {
        NewAuthorizationEntry {
            name: [0; 32],
            id_type: 0,
            shared_key: [0; 32],
            remote_allowed: 0,
            time_limited: 0,
            allowed_from_date: TimeValue::default(),
            allowed_until_date: TimeValue::default(),
            allowed_weekdays: 0,
            allowed_from_time: [0; 2],
            allowed_until_time: [0; 2],
        }
    }
}

/// Payload of `UpdateAuthorization`. Encoded size: 58.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UpdatedAuthorizationEntry {
    pub auth_id: u32,
    pub name: [u8; 32],
    pub enabled: u8,
    pub remote_allowed: u8,
    pub time_limited: u8,
    pub allowed_from_date: TimeValue,
    pub allowed_until_date: TimeValue,
    pub allowed_weekdays: u8,
    pub allowed_from_time: [u8; 2],
    pub allowed_until_time: [u8; 2],
}

impl UpdatedAuthorizationEntry {
    pub const ENCODED_LEN: usize = 58;

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::ENCODED_LEN);
        out.put_u32_le(self.auth_id);
        out.extend_from_slice(&self.name);
        out.put_u8(self.enabled);
        out.put_u8(self.remote_allowed);
        out.put_u8(self.time_limited);
        self.allowed_from_date.write(&mut out);
        self.allowed_until_date.write(&mut out);
        out.put_u8(self.allowed_weekdays);
        out.extend_from_slice(&self.allowed_from_time);
        out.extend_from_slice(&self.allowed_until_time);
        out
    }
}

// ============================================================================
// Time control entries
// ============================================================================

/// One scheduled-action record. Encoded size: 6.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TimeControlEntry {
    pub entry_id: u8,
    pub enabled: u8,
    pub weekdays: u8,
    pub time_hour: u8,
    pub time_minute: u8,
    pub lock_action: u8,
}

impl TimeControlEntry {
    pub const ENCODED_LEN: usize = 6;

    pub fn decode(data: &[u8]) -> Result<Self, WireError> {
        if data.len() < Self::ENCODED_LEN {
            return Err(WireError::TooShort(data.len()));
        }
        let mut buf = data;
        Ok(TimeControlEntry {
            entry_id: buf.get_u8(),
            enabled: buf.get_u8(),
            weekdays: buf.get_u8(),
            time_hour: buf.get_u8(),
            time_minute: buf.get_u8(),
            lock_action: buf.get_u8(),
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        vec![
            self.entry_id,
            self.enabled,
            self.weekdays,
            self.time_hour,
            self.time_minute,
            self.lock_action,
        ]
    }
}

/// Payload of `AddTimeControlEntry`. Encoded size: 4.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NewTimeControlEntry {
    pub weekdays: u8,
    pub time_hour: u8,
    pub time_minute: u8,
    pub lock_action: u8,
}

impl NewTimeControlEntry {
    pub const ENCODED_LEN: usize = 4;

    pub fn encode(&self) -> Vec<u8> {
        vec![self.weekdays, self.time_hour, self.time_minute, self.lock_action]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyturner_state_all_zero() {
        let state = KeyTurnerState::decode(&[0u8; 21]).unwrap();
        assert_eq!(state, KeyTurnerState::default());
        assert_eq!(state.lock_state(), LockState::Uncalibrated);
        assert!(!state.is_battery_critical());
        assert_eq!(state.battery_percent(), 0);
    }

    #[test]
    fn keyturner_state_short_buffer_rejected() {
        assert!(matches!(
            KeyTurnerState::decode(&[0u8; 20]),
            Err(WireError::TooShort(20))
        ));
    }

    #[test]
    fn keyturner_state_optional_accessory_byte() {
        let mut data = vec![0u8; 22];
        data[21] = 0b1100_0000;
        let state = KeyTurnerState::decode(&data).unwrap();
        assert!(state.is_keypad_battery_critical());
    }

    #[test]
    fn battery_flags() {
        let mut data = [0u8; 21];
        // critical, charging, 100% (binary 1100100 shifted into bits 2..8).
        data[12] = (100u8 << 1) | 0b11;
        let state = KeyTurnerState::decode(&data).unwrap();
        assert!(state.is_battery_critical());
        assert!(state.is_battery_charging());
        assert_eq!(state.battery_percent(), 100);
    }

    #[test]
    fn time_value_round_trip() {
        let time = TimeValue { year: 2022, month: 7, day: 19, hour: 13, minute: 37, second: 1 };
        assert_eq!(TimeValue::decode(&time.encode()).unwrap(), time);
    }

    #[test]
    fn config_decode() {
        let mut data = Vec::new();
        data.put_u32_le(0x1234_5678);
        let mut name = [0u8; 32];
        name[..9].copy_from_slice(b"Frontdoor");
        data.extend_from_slice(&name);
        data.put_f32_le(52.52);
        data.put_f32_le(13.40);
        data.extend_from_slice(&[0, 1, 1, 1, 3]); // autoUnlatch..ledBrightness
        TimeValue { year: 2022, month: 1, day: 1, hour: 0, minute: 0, second: 0 }
            .write(&mut data);
        data.put_i16_le(60);
        data.extend_from_slice(&[0, 1, 1, 2, 3, 0, 0, 1]); // dst..hasKeypad
        data.extend_from_slice(&[2, 7, 0]); // firmware
        data.extend_from_slice(&[1, 0]); // hardware
        data.put_u8(0);
        data.put_u16_le(37);
        assert_eq!(data.len(), Config::ENCODED_LEN);

        let config = Config::decode(&data).unwrap();
        assert_eq!(config.nuki_id, 0x1234_5678);
        assert_eq!(config.name(), "Frontdoor");
        assert_eq!(config.led_brightness, 3);
        assert_eq!(config.timezone_id, 37);

        // The writable subset carries everything over unchanged.
        let new_config = NewConfig::from_config(&config);
        assert_eq!(new_config.encode().len(), NewConfig::ENCODED_LEN);
        assert_eq!(new_config.name, config.name);
        assert_eq!(new_config.timezone_id, config.timezone_id);
    }

    #[test]
    fn advanced_config_round_trip_via_writable_subset() {
        let mut data = vec![0u8; AdvancedConfig::ENCODED_LEN];
        data[0] = 0x2C; // totalDegrees = 300
        data[1] = 0x01;
        let advanced = AdvancedConfig::decode(&data).unwrap();
        assert_eq!(advanced.total_degrees, 300);

        let new_advanced = NewAdvancedConfig::from_advanced_config(&advanced);
        assert_eq!(new_advanced.encode().len(), NewAdvancedConfig::ENCODED_LEN);
    }

    #[test]
    fn battery_report_decode() {
        let mut data = Vec::new();
        data.put_u16_le(120);
        data.put_u16_le(5400);
        data.put_u8(0);
        data.put_u8(2);
        data.put_u16_le(5500);
        data.put_u16_le(5100);
        data.put_u16_le(1800);
        data.put_i8(-5);
        data.put_u16_le(600);
        data.put_u16_le(100);
        assert_eq!(data.len(), BatteryReport::ENCODED_LEN);

        let report = BatteryReport::decode(&data).unwrap();
        assert_eq!(report.battery_voltage, 5400);
        assert_eq!(report.start_temperature, -5);
    }

    #[test]
    fn log_entry_decode() {
        let mut data = Vec::new();
        data.put_u32_le(42);
        TimeValue { year: 2022, month: 3, day: 4, hour: 5, minute: 6, second: 7 }
            .write(&mut data);
        data.put_u32_le(7);
        let mut name = [0u8; 32];
        name[..5].copy_from_slice(b"Alice");
        data.extend_from_slice(&name);
        data.put_u8(2);
        data.extend_from_slice(&[1, 0, 0, 0, 0]);
        assert_eq!(data.len(), LogEntry::ENCODED_LEN);

        let entry = LogEntry::decode(&data).unwrap();
        assert_eq!(entry.index, 42);
        assert_eq!(entry.name(), "Alice");
        assert_eq!(entry.log_type, 2);
    }

    #[test]
    fn keypad_entry_sizes_agree() {
        assert_eq!(NewKeypadEntry::default().encode().len(), NewKeypadEntry::ENCODED_LEN);
        assert_eq!(
            UpdatedKeypadEntry::default().encode().len(),
            UpdatedKeypadEntry::ENCODED_LEN
        );
    }

    #[test]
    fn authorization_entry_sizes_agree() {
        assert_eq!(
            NewAuthorizationEntry::default().encode().len(),
            NewAuthorizationEntry::ENCODED_LEN
        );
        assert_eq!(
            UpdatedAuthorizationEntry::default().encode().len(),
            UpdatedAuthorizationEntry::ENCODED_LEN
        );
    }

    #[test]
    fn time_control_entry_round_trip() {
        let entry = TimeControlEntry {
            entry_id: 3,
            enabled: 1,
            weekdays: 0b0111110,
            time_hour: 22,
            time_minute: 30,
            lock_action: LockAction::Lock.into(),
        };
        assert_eq!(TimeControlEntry::decode(&entry.encode()).unwrap(), entry);
        assert_eq!(
            NewTimeControlEntry::default().encode().len(),
            NewTimeControlEntry::ENCODED_LEN
        );
    }
}
