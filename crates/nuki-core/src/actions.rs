//! Public action surface.
//!
//! Each operation builds an [`Action`] with the right category and command
//! and hands it to the controller. Operations that fill a result list
//! clear it before dispatch; operations that return a snapshot read it
//! back after the action succeeds.

use crate::client::{Event, NukiClient};
use crate::command::Action;
use crate::error::{CmdError, CmdResult};
use crate::store::{CredentialStore, Credentials};
use crate::transport::Transport;
use nuki_wire::types::{
    AdvancedConfig, AuthorizationEntry, BatteryReport, Config, KeyTurnerState, KeypadEntry,
    LockAction, LogEntry, NewAdvancedConfig, NewAuthorizationEntry, NewConfig, NewKeypadEntry,
    NewTimeControlEntry, TimeControlEntry, TimeValue, UpdatedAuthorizationEntry,
    UpdatedKeypadEntry,
};
use nuki_wire::Command;

impl<T: Transport, S: CredentialStore> NukiClient<T, S> {
    // ------------------------------------------------------------------
    // State queries
    // ------------------------------------------------------------------

    /// Ask the lock for its keyturner state and return the fresh snapshot.
    pub async fn request_key_turner_state(&self) -> CmdResult<KeyTurnerState> {
        let payload = Command::KEYTURNER_STATES.raw().to_le_bytes().to_vec();
        self.execute(Action::plain(Command::REQUEST_DATA, payload))
            .await?;
        let state = self
            .session
            .lock()
            .await
            .key_turner_state
            .ok_or(CmdError::Timeout)?;
        self.notify(Event::KeyturnerStateUpdated);
        Ok(state)
    }

    /// Most recent keyturner snapshot, if any reply has been seen.
    pub async fn key_turner_state(&self) -> Option<KeyTurnerState> {
        self.session.lock().await.key_turner_state
    }

    pub async fn request_battery_report(&self) -> CmdResult<BatteryReport> {
        let payload = Command::BATTERY_REPORT.raw().to_le_bytes().to_vec();
        self.execute(Action::plain(Command::REQUEST_DATA, payload))
            .await?;
        self.session
            .lock()
            .await
            .battery_report
            .ok_or(CmdError::Timeout)
    }

    pub async fn battery_report(&self) -> Option<BatteryReport> {
        self.session.lock().await.battery_report
    }

    pub async fn is_battery_critical(&self) -> Option<bool> {
        Some(self.key_turner_state().await?.is_battery_critical())
    }

    pub async fn is_battery_charging(&self) -> Option<bool> {
        Some(self.key_turner_state().await?.is_battery_charging())
    }

    pub async fn battery_percent(&self) -> Option<u8> {
        Some(self.key_turner_state().await?.battery_percent())
    }

    pub async fn is_keypad_battery_critical(&self) -> Option<bool> {
        Some(self.key_turner_state().await?.is_keypad_battery_critical())
    }

    // ------------------------------------------------------------------
    // Lock actions
    // ------------------------------------------------------------------

    /// Turn the key. `name_suffix` is an opaque suffix the lock appends to
    /// the log entry name; at most 20 bytes.
    pub async fn lock_action(
        &self,
        action: LockAction,
        flags: u8,
        name_suffix: Option<&[u8]>,
    ) -> CmdResult<()> {
        let suffix = name_suffix.unwrap_or_default();
        if suffix.len() > 20 {
            return Err(CmdError::InvalidArgument("name suffix exceeds 20 bytes"));
        }
        let mut payload = Vec::with_capacity(6 + suffix.len());
        payload.push(action.into());
        payload.extend_from_slice(&self.config.app_id.to_le_bytes());
        payload.push(flags);
        payload.extend_from_slice(suffix);
        self.execute(Action::with_challenge_and_accept(
            Command::LOCK_ACTION,
            payload,
        ))
        .await
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    pub async fn request_config(&self) -> CmdResult<Config> {
        self.execute(Action::with_challenge(Command::REQUEST_CONFIG, Vec::new()))
            .await?;
        self.session
            .lock()
            .await
            .config
            .clone()
            .ok_or(CmdError::Timeout)
    }

    pub async fn request_advanced_config(&self) -> CmdResult<AdvancedConfig> {
        self.execute(Action::with_challenge(
            Command::REQUEST_ADVANCED_CONFIG,
            Vec::new(),
        ))
        .await?;
        self.session
            .lock()
            .await
            .advanced_config
            .clone()
            .ok_or(CmdError::Timeout)
    }

    pub async fn set_config(&self, config: NewConfig) -> CmdResult<()> {
        self.execute(Action::with_challenge_and_pin(
            Command::SET_CONFIG,
            config.encode(),
        ))
        .await
    }

    pub async fn set_advanced_config(&self, config: NewAdvancedConfig) -> CmdResult<()> {
        self.execute(Action::with_challenge_and_pin(
            Command::SET_ADVANCED_CONFIG,
            config.encode(),
        ))
        .await
    }

    /// Fetch the current config, apply `mutate` to its writable subset and
    /// send it back.
    async fn update_config(&self, mutate: impl FnOnce(&mut NewConfig)) -> CmdResult<()> {
        let config = self.request_config().await?;
        let mut new_config = NewConfig::from_config(&config);
        mutate(&mut new_config);
        self.set_config(new_config).await
    }

    async fn update_advanced_config(
        &self,
        mutate: impl FnOnce(&mut NewAdvancedConfig),
    ) -> CmdResult<()> {
        let config = self.request_advanced_config().await?;
        let mut new_config = NewAdvancedConfig::from_advanced_config(&config);
        mutate(&mut new_config);
        self.set_advanced_config(new_config).await
    }

    /// Rename the lock; at most 32 bytes.
    pub async fn set_name(&self, name: &str) -> CmdResult<()> {
        let bytes = name.as_bytes();
        if bytes.len() > 32 {
            return Err(CmdError::InvalidArgument("name exceeds 32 bytes"));
        }
        let mut padded = [0u8; 32];
        padded[..bytes.len()].copy_from_slice(bytes);
        self.update_config(|config| config.name = padded).await
    }

    pub async fn enable_pairing(&self, enable: bool) -> CmdResult<()> {
        self.update_config(|config| config.pairing_enabled = enable as u8)
            .await
    }

    pub async fn enable_button(&self, enable: bool) -> CmdResult<()> {
        self.update_config(|config| config.button_enabled = enable as u8)
            .await
    }

    pub async fn enable_led_flash(&self, enable: bool) -> CmdResult<()> {
        self.update_config(|config| config.led_enabled = enable as u8)
            .await
    }

    /// LED brightness from 0 (off) to 5 (max); clamped.
    pub async fn set_led_brightness(&self, level: u8) -> CmdResult<()> {
        self.update_config(|config| config.led_brightness = level.min(5))
            .await
    }

    pub async fn enable_single_lock(&self, enable: bool) -> CmdResult<()> {
        self.update_config(|config| config.single_lock = enable as u8)
            .await
    }

    pub async fn set_advertising_mode(&self, mode: u8) -> CmdResult<()> {
        self.update_config(|config| config.advertising_mode = mode)
            .await
    }

    pub async fn enable_dst(&self, enable: bool) -> CmdResult<()> {
        self.update_config(|config| config.dst_mode = enable as u8)
            .await
    }

    pub async fn set_timezone_offset(&self, minutes: i16) -> CmdResult<()> {
        self.update_config(|config| config.timezone_offset = minutes)
            .await
    }

    pub async fn set_timezone_id(&self, timezone_id: u16) -> CmdResult<()> {
        self.update_config(|config| config.timezone_id = timezone_id)
            .await
    }

    pub async fn set_single_button_press_action(&self, action: u8) -> CmdResult<()> {
        self.update_advanced_config(|config| config.single_button_press_action = action)
            .await
    }

    pub async fn set_double_button_press_action(&self, action: u8) -> CmdResult<()> {
        self.update_advanced_config(|config| config.double_button_press_action = action)
            .await
    }

    pub async fn set_battery_type(&self, battery_type: u8) -> CmdResult<()> {
        self.update_advanced_config(|config| config.battery_type = battery_type)
            .await
    }

    pub async fn enable_auto_battery_type_detection(&self, enable: bool) -> CmdResult<()> {
        self.update_advanced_config(|config| {
            config.automatic_battery_type_detection = enable as u8
        })
        .await
    }

    pub async fn disable_auto_unlock(&self, disable: bool) -> CmdResult<()> {
        self.update_advanced_config(|config| config.auto_unlock_disabled = disable as u8)
            .await
    }

    pub async fn enable_auto_lock(&self, enable: bool) -> CmdResult<()> {
        self.update_advanced_config(|config| config.auto_lock_enabled = enable as u8)
            .await
    }

    pub async fn enable_immediate_auto_lock(&self, enable: bool) -> CmdResult<()> {
        self.update_advanced_config(|config| config.immediate_auto_lock_enabled = enable as u8)
            .await
    }

    pub async fn enable_auto_update(&self, enable: bool) -> CmdResult<()> {
        self.update_advanced_config(|config| config.auto_update_enabled = enable as u8)
            .await
    }

    // ------------------------------------------------------------------
    // Activity log
    // ------------------------------------------------------------------

    /// Fetch log entries; the previous result list is discarded.
    pub async fn retrieve_log_entries(
        &self,
        start_index: u32,
        count: u16,
        sort_order: u8,
        total_count: bool,
    ) -> CmdResult<()> {
        self.session.lock().await.log_entries.clear();
        let mut payload = Vec::with_capacity(8);
        payload.extend_from_slice(&start_index.to_le_bytes());
        payload.extend_from_slice(&count.to_le_bytes());
        payload.push(sort_order);
        payload.push(total_count as u8);
        self.execute(Action::with_challenge_and_pin(
            Command::REQUEST_LOG_ENTRIES,
            payload,
        ))
        .await
    }

    pub async fn log_entries(&self) -> Vec<LogEntry> {
        self.session.lock().await.log_entries.clone()
    }

    pub async fn logging_enabled(&self) -> bool {
        self.session.lock().await.logging_enabled
    }

    pub async fn log_entry_count(&self) -> u32 {
        self.session.lock().await.log_entry_count
    }

    // ------------------------------------------------------------------
    // Keypad codes
    // ------------------------------------------------------------------

    pub async fn retrieve_keypad_entries(&self, offset: u16, count: u16) -> CmdResult<()> {
        self.session.lock().await.keypad_entries.clear();
        let mut payload = Vec::with_capacity(4);
        payload.extend_from_slice(&offset.to_le_bytes());
        payload.extend_from_slice(&count.to_le_bytes());
        self.execute(Action::with_challenge_and_pin(
            Command::REQUEST_KEYPAD_CODES,
            payload,
        ))
        .await
    }

    pub async fn keypad_entries(&self) -> Vec<KeypadEntry> {
        self.session.lock().await.keypad_entries.clone()
    }

    pub async fn keypad_code_count(&self) -> u16 {
        self.session.lock().await.keypad_code_count
    }

    pub async fn add_keypad_entry(&self, entry: NewKeypadEntry) -> CmdResult<()> {
        self.execute(Action::with_challenge_and_pin(
            Command::ADD_KEYPAD_CODE,
            entry.encode(),
        ))
        .await
    }

    pub async fn update_keypad_entry(&self, entry: UpdatedKeypadEntry) -> CmdResult<()> {
        self.execute(Action::with_challenge_and_pin(
            Command::UPDATE_KEYPAD_CODE,
            entry.encode(),
        ))
        .await
    }

    // ------------------------------------------------------------------
    // Authorizations
    // ------------------------------------------------------------------

    pub async fn retrieve_authorization_entries(&self, offset: u16, count: u16) -> CmdResult<()> {
        self.session.lock().await.authorization_entries.clear();
        let mut payload = Vec::with_capacity(4);
        payload.extend_from_slice(&offset.to_le_bytes());
        payload.extend_from_slice(&count.to_le_bytes());
        self.execute(Action::with_challenge_and_pin(
            Command::REQUEST_AUTHORIZATION_ENTRIES,
            payload,
        ))
        .await
    }

    pub async fn authorization_entries(&self) -> Vec<AuthorizationEntry> {
        self.session.lock().await.authorization_entries.clone()
    }

    pub async fn authorization_entry_count(&self) -> u16 {
        self.session.lock().await.authorization_entry_count
    }

    pub async fn add_authorization_entry(&self, entry: NewAuthorizationEntry) -> CmdResult<()> {
        self.execute(Action::with_challenge_and_pin(
            Command::AUTHORIZATION_DATA_INVITE,
            entry.encode(),
        ))
        .await
    }

    pub async fn update_authorization_entry(
        &self,
        entry: UpdatedAuthorizationEntry,
    ) -> CmdResult<()> {
        self.execute(Action::with_challenge_and_pin(
            Command::UPDATE_AUTHORIZATION,
            entry.encode(),
        ))
        .await
    }

    pub async fn delete_authorization_entry(&self, auth_id: u32) -> CmdResult<()> {
        self.execute(Action::with_challenge_and_pin(
            Command::REMOVE_USER_AUTHORIZATION,
            auth_id.to_le_bytes().to_vec(),
        ))
        .await
    }

    // ------------------------------------------------------------------
    // Time control
    // ------------------------------------------------------------------

    pub async fn retrieve_time_control_entries(&self) -> CmdResult<()> {
        self.session.lock().await.time_control_entries.clear();
        self.execute(Action::with_challenge_and_pin(
            Command::REQUEST_TIME_CONTROL_ENTRIES,
            Vec::new(),
        ))
        .await
    }

    pub async fn time_control_entries(&self) -> Vec<TimeControlEntry> {
        self.session.lock().await.time_control_entries.clone()
    }

    pub async fn add_time_control_entry(&self, entry: NewTimeControlEntry) -> CmdResult<()> {
        self.execute(Action::with_challenge_and_pin(
            Command::ADD_TIME_CONTROL_ENTRY,
            entry.encode(),
        ))
        .await
    }

    pub async fn update_time_control_entry(&self, entry: TimeControlEntry) -> CmdResult<()> {
        self.execute(Action::with_challenge_and_pin(
            Command::UPDATE_TIME_CONTROL_ENTRY,
            entry.encode(),
        ))
        .await
    }

    pub async fn remove_time_control_entry(&self, entry_id: u8) -> CmdResult<()> {
        self.execute(Action::with_challenge_and_pin(
            Command::REMOVE_TIME_CONTROL_ENTRY,
            vec![entry_id],
        ))
        .await
    }

    // ------------------------------------------------------------------
    // Security PIN, time, maintenance
    // ------------------------------------------------------------------

    /// Change the security PIN on the lock and persist it locally.
    pub async fn set_security_pin(&self, new_pin: u16) -> CmdResult<()> {
        self.execute(Action::with_challenge_and_pin(
            Command::SET_SECURITY_PIN,
            new_pin.to_le_bytes().to_vec(),
        ))
        .await?;
        self.save_security_pin(new_pin).await
    }

    /// Update the locally stored PIN without talking to the lock, e.g.
    /// right after pairing a lock whose PIN is already set.
    pub async fn save_security_pin(&self, pin: u16) -> CmdResult<()> {
        let mut credentials = Credentials::load(&*self.store)
            .await?
            .ok_or(CmdError::NotPaired)?;
        credentials.security_pin = pin;
        credentials.save(&*self.store).await?;
        Ok(())
    }

    pub async fn verify_security_pin(&self) -> CmdResult<()> {
        self.execute(Action::with_challenge_and_pin(
            Command::VERIFY_SECURITY_PIN,
            Vec::new(),
        ))
        .await
    }

    pub async fn request_calibration(&self) -> CmdResult<()> {
        self.execute(Action::with_challenge_and_pin(
            Command::REQUEST_CALIBRATION,
            Vec::new(),
        ))
        .await
    }

    pub async fn request_reboot(&self) -> CmdResult<()> {
        self.execute(Action::with_challenge_and_pin(
            Command::REQUEST_REBOOT,
            Vec::new(),
        ))
        .await
    }

    pub async fn update_time(&self, time: TimeValue) -> CmdResult<()> {
        self.execute(Action::with_challenge_and_pin(
            Command::UPDATE_TIME,
            time.encode(),
        ))
        .await
    }
}
