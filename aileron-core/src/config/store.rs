//! Configuration store
//!
//! Owns the master record together with the collaborators needed to
//! persist it. All mutations go through the single [`ConfigStore`]; the
//! flight loop only sees the [`RuntimeConfig`] and the active feature
//! latch, both rebuilt by activation after a successful read.
//!
//! # Boot sequence
//!
//! ```ignore
//! let mut store = ConfigStore::new(flash, rx, beeper, BoardId::Naze.descriptor());
//! store.ensure_eeprom_contains_valid_data()?;
//! store.read_eeprom()?;
//! ```

use aileron_hal::flash::{ConfigFlash, FlashError, CONFIG_WINDOW_SIZE};

use super::board::BoardDescriptor;
use super::defaults::{factory_config, reset_defaults};
use super::eeprom::{self, EepromError};
use super::features::{beeper_mask_all, ActiveFeatures, Features, PersistentFlags};
use super::master::MasterConfig;
use super::pg::{self, ParameterGroup, PgId};
use super::profile::{MAX_CONTROL_RATE_PROFILE_COUNT, MAX_PROFILE_COUNT};
use super::validate::validate_and_fix_config;
use crate::runtime::RuntimeConfig;
use crate::sensors::alignment::update_board_alignment;
use crate::state::FailureMode;
use crate::traits::{Beeper, MotorOutputs, RxSignal};

/// Erase and program attempts before a write is declared failed
pub const WRITE_ATTEMPTS: u8 = 3;

/// Settle time after stopping the motors for a restart
pub const MOTOR_STOP_DELAY_MS: u32 = 50;

/// Extra settle time when OneShot125 was switched off, so ESCs re-arm
/// on the slower protocol
pub const ONESHOT_FEATURE_CHANGED_DELAY_ON_BOOT_MS: u32 = 1500;

/// Errors from store operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Flash access failed outside the retried write path
    Flash(FlashError),
    /// The record could not be encoded or decoded
    Eeprom(EepromError),
    /// A fatal failure mode has been entered
    Failure(FailureMode),
}

impl From<FlashError> for ConfigError {
    fn from(err: FlashError) -> Self {
        ConfigError::Flash(err)
    }
}

impl From<EepromError> for ConfigError {
    fn from(err: EepromError) -> Self {
        ConfigError::Eeprom(err)
    }
}

impl From<FailureMode> for ConfigError {
    fn from(mode: FailureMode) -> Self {
        ConfigError::Failure(mode)
    }
}

/// Access used by code that edits the record and then persists it,
/// such as the calibration pipelines
pub trait ConfigHandle {
    fn config(&self) -> &MasterConfig;
    fn config_mut(&mut self) -> &mut MasterConfig;
    fn runtime(&self) -> &RuntimeConfig;

    /// Persist, re-read, activate and beep once
    fn save_config_and_notify(&mut self) -> Result<(), ConfigError>;
}

/// Single owner of the master record
pub struct ConfigStore<F, R, B> {
    flash: F,
    rx: R,
    beeper: B,
    board: &'static BoardDescriptor,
    record: MasterConfig,
    active: ActiveFeatures,
    runtime: RuntimeConfig,
    failure: Option<FailureMode>,
    scratch: [u8; CONFIG_WINDOW_SIZE],
}

impl<F: ConfigFlash, R: RxSignal, B: Beeper> ConfigStore<F, R, B> {
    /// Create a store holding factory defaults
    ///
    /// Nothing is read or written until the boot sequence runs.
    pub fn new(flash: F, rx: R, beeper: B, board: &'static BoardDescriptor) -> Self {
        let record = factory_config(board);
        let runtime = RuntimeConfig::activate(&record, board, 0, 0);

        Self {
            flash,
            rx,
            beeper,
            board,
            record,
            active: ActiveFeatures::new(),
            runtime,
            failure: None,
            scratch: [0xFF; CONFIG_WINDOW_SIZE],
        }
    }

    pub fn board(&self) -> &'static BoardDescriptor {
        self.board
    }

    /// The in-RAM record
    pub fn record(&self) -> &MasterConfig {
        &self.record
    }

    /// Mutable record; changes reach the flight loop after the next save
    pub fn record_mut(&mut self) -> &mut MasterConfig {
        &mut self.record
    }

    /// Views built by the last activation
    pub fn runtime(&self) -> &RuntimeConfig {
        &self.runtime
    }

    /// Latched failure mode, if any
    pub fn failure(&self) -> Option<FailureMode> {
        self.failure
    }

    pub fn flash(&self) -> &F {
        &self.flash
    }

    pub fn flash_mut(&mut self) -> &mut F {
        &mut self.flash
    }

    pub fn rx(&self) -> &R {
        &self.rx
    }

    pub fn beeper(&self) -> &B {
        &self.beeper
    }

    pub fn beeper_mut(&mut self) -> &mut B {
        &mut self.beeper
    }

    /// Give the collaborators back
    pub fn release(self) -> (F, R, B) {
        (self.flash, self.rx, self.beeper)
    }

    fn ensure_running(&self) -> Result<(), ConfigError> {
        match self.failure {
            Some(mode) => Err(ConfigError::Failure(mode)),
            None => Ok(()),
        }
    }

    fn enter_failure(&mut self, mode: FailureMode) -> ConfigError {
        log_error!("entering failure mode {}", mode.code());
        self.failure = Some(mode);
        ConfigError::Failure(mode)
    }

    fn load_window(&mut self) -> Result<(), FlashError> {
        self.flash.read(0, &mut self.scratch)
    }

    /// True if the flash window holds a current, intact image
    pub fn is_eeprom_content_valid(&mut self) -> bool {
        self.load_window().is_ok() && eeprom::is_valid(&self.scratch)
    }

    /// Stamp the record and program it into flash
    ///
    /// Programming is retried up to [`WRITE_ATTEMPTS`] times. If the
    /// final image does not verify the store enters
    /// [`FailureMode::FlashWriteFailed`] and receiver sampling stays
    /// suspended.
    pub fn write_eeprom(&mut self) -> Result<(), ConfigError> {
        self.ensure_running()?;
        self.rx.suspend();

        let len = match eeprom::stamp(&mut self.record, &mut self.scratch) {
            Ok(len) => len,
            Err(err) => {
                self.rx.resume();
                return Err(err.into());
            }
        };

        for attempt in 1..=WRITE_ATTEMPTS {
            match program(&mut self.flash, &self.scratch[..len]) {
                Ok(()) => break,
                Err(err) => log_warn!("config write attempt {} failed: {}", attempt, err),
            }
        }

        let finished = self.flash.finish();
        if finished.is_err() || !self.is_eeprom_content_valid() {
            return Err(self.enter_failure(FailureMode::FlashWriteFailed));
        }

        log_debug!("config written, {} bytes", len);
        self.rx.resume();
        Ok(())
    }

    /// Load, repair and activate the stored record
    ///
    /// An invalid image is fatal here; boot code runs
    /// [`Self::ensure_eeprom_contains_valid_data`] first.
    pub fn read_eeprom(&mut self) -> Result<(), ConfigError> {
        self.ensure_running()?;
        if !self.is_eeprom_content_valid() {
            return Err(self.enter_failure(FailureMode::InvalidEepromContents));
        }

        self.rx.suspend();
        let decoded = eeprom::decode(&self.scratch);
        let record = match decoded {
            Ok(record) => record,
            Err(_) => {
                self.rx.resume();
                return Err(self.enter_failure(FailureMode::InvalidEepromContents));
            }
        };

        self.record = record;
        validate_and_fix_config(&mut self.record, self.board);
        self.activate_config();

        self.rx.resume();
        Ok(())
    }

    /// Rebuild runtime views and latch the configured features
    pub fn activate_config(&mut self) {
        let rate_index = self.record.current_profile().default_rate_profile_index as usize;
        let rate_index = rate_index.min(MAX_CONTROL_RATE_PROFILE_COUNT - 1);
        let generation = self.runtime.generation.wrapping_add(1);
        self.runtime = RuntimeConfig::activate(&self.record, self.board, rate_index, generation);
        self.latch_active_features();
    }

    /// Write factory defaults if the stored image is unusable
    pub fn ensure_eeprom_contains_valid_data(&mut self) -> Result<(), ConfigError> {
        if self.is_eeprom_content_valid() {
            return Ok(());
        }
        log_warn!("stored config invalid, restoring defaults");
        self.reset_eeprom()
    }

    /// Replace the record with factory defaults and write it
    pub fn reset_eeprom(&mut self) -> Result<(), ConfigError> {
        reset_defaults(&mut self.record, self.board);
        self.write_eeprom()
    }

    /// Write, re-read and confirm with one beep
    pub fn save_config_and_notify(&mut self) -> Result<(), ConfigError> {
        self.write_eeprom()?;
        self.read_eeprom()?;
        self.beeper.confirmation_beeps(1);
        Ok(())
    }

    /// Index of the active profile
    pub fn get_current_profile(&self) -> u8 {
        self.record.current_profile_index
    }

    /// Index of the live rate profile
    pub fn get_current_rate_profile(&self) -> u8 {
        self.runtime.rate_profile_index as u8
    }

    /// Select and persist a profile, then beep `index + 1` times
    pub fn change_profile(&mut self, index: u8) -> Result<(), ConfigError> {
        let index = index.min(MAX_PROFILE_COUNT as u8 - 1);
        self.record.current_profile_index = index;
        self.write_eeprom()?;
        self.read_eeprom()?;
        log_info!("profile {} selected", index);
        self.beeper.confirmation_beeps(index + 1);
        Ok(())
    }

    /// Switch the live rate profile without persisting
    pub fn change_control_rate_profile(&mut self, index: u8) {
        let index = (index as usize).min(MAX_CONTROL_RATE_PROFILE_COUNT - 1);
        let rates = self.record.control_rate_profiles[index];
        self.runtime.use_rate_profile(index, &rates);
    }

    /// Trim the board alignment by a stick delta and save
    pub fn apply_and_save_board_alignment_delta(
        &mut self,
        roll: i16,
        pitch: i16,
    ) -> Result<(), ConfigError> {
        update_board_alignment(&mut self.record.board_alignment, roll, pitch);
        self.save_config_and_notify()
    }

    /// Quiet the motors ahead of a soft restart
    pub fn handle_oneshot_feature_change_on_restart<M: MotorOutputs>(&self, motors: &mut M) {
        motors.stop_all();
        motors.delay_ms(MOTOR_STOP_DELAY_MS);

        if self.feature(Features::ONESHOT125) && !self.feature_configured(Features::ONESHOT125) {
            motors.delay_ms(ONESHOT_FEATURE_CHANGED_DELAY_ON_BOOT_MS);
        }
    }

    // Features

    /// Snapshot the configured features for the flight loop
    pub fn latch_active_features(&self) {
        self.active.latch(self.record.enabled_features);
    }

    /// True when every bit of `mask` was active at the last latch
    pub fn feature(&self, mask: Features) -> bool {
        self.active.contains(mask)
    }

    pub fn active_features(&self) -> Features {
        self.active.get()
    }

    /// True when every bit of `mask` is configured
    pub fn feature_configured(&self, mask: Features) -> bool {
        self.record.feature_configured(mask)
    }

    pub fn feature_set(&mut self, mask: Features) {
        self.record.enabled_features.insert(mask);
    }

    pub fn feature_clear(&mut self, mask: Features) {
        self.record.enabled_features.remove(mask);
    }

    pub fn feature_clear_all(&mut self) {
        self.record.enabled_features = Features::empty();
    }

    pub fn feature_mask(&self) -> Features {
        self.record.enabled_features
    }

    // Persistent flags

    pub fn persistent_flag(&self, mask: PersistentFlags) -> bool {
        self.record.persistent_flags.contains(mask)
    }

    pub fn persistent_flag_set(&mut self, mask: PersistentFlags) {
        self.record.persistent_flags.insert(mask);
    }

    pub fn persistent_flag_clear(&mut self, mask: PersistentFlags) {
        self.record.persistent_flags.remove(mask);
    }

    pub fn persistent_flag_clear_all(&mut self) {
        self.record.persistent_flags = PersistentFlags::empty();
    }

    // Beeper suppression

    pub fn beeper_off_set(&mut self, mask: u32) {
        self.record.beeper_off_flags |= mask;
    }

    /// Silence the first `count` beeper modes
    pub fn beeper_off_set_all(&mut self, count: u8) {
        self.record.beeper_off_flags = beeper_mask_all(count);
    }

    pub fn beeper_off_clear(&mut self, mask: u32) {
        self.record.beeper_off_flags &= !mask;
    }

    pub fn beeper_off_clear_all(&mut self) {
        self.record.beeper_off_flags = 0;
    }

    pub fn beeper_off_mask(&self) -> u32 {
        self.record.beeper_off_flags
    }

    pub fn set_beeper_off_mask(&mut self, mask: u32) {
        self.record.beeper_off_flags = mask;
    }

    pub fn prefered_beeper_off_mask(&self) -> u32 {
        self.record.prefered_beeper_off_flags
    }

    pub fn set_prefered_beeper_off_mask(&mut self, mask: u32) {
        self.record.prefered_beeper_off_flags = mask;
    }

    // Parameter groups

    pub fn read_group(&self, id: PgId) -> ParameterGroup {
        pg::read(&self.record, id)
    }

    pub fn write_group(&mut self, group: ParameterGroup) {
        pg::write(&mut self.record, group);
    }

    pub fn reset_group(&mut self, id: PgId) {
        pg::reset(&mut self.record, id, self.board);
    }
}

fn program<F: ConfigFlash>(flash: &mut F, image: &[u8]) -> Result<(), FlashError> {
    flash.begin()?;
    flash.write(image)
}

impl<F: ConfigFlash, R: RxSignal, B: Beeper> ConfigHandle for ConfigStore<F, R, B> {
    fn config(&self) -> &MasterConfig {
        &self.record
    }

    fn config_mut(&mut self) -> &mut MasterConfig {
        &mut self.record
    }

    fn runtime(&self) -> &RuntimeConfig {
        &self.runtime
    }

    fn save_config_and_notify(&mut self) -> Result<(), ConfigError> {
        ConfigStore::save_config_and_notify(self)
    }
}
