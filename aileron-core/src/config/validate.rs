//! Feature compatibility matrix
//!
//! Repairs a record in place so that it describes a configuration the
//! board can actually run. Rules are applied in order and earlier rules
//! dominate. Every rule reads the configured mask, which keeps a second
//! pass a no-op.

use super::board::{BoardDescriptor, CpuClass, SonarCurrentConflict};
use super::features::Features;
use super::master::MasterConfig;
use super::mixer::DEFAULT_MIXER;
use super::profile::{MAX_CONTROL_RATE_PROFILE_COUNT, MAX_PROFILE_COUNT};
use super::serial::{SerialConfig, SerialFunction, SerialPortIdentifier};
use super::types::CurrentSensor;

/// Loop period floor on F1 parts while GPS is enabled, in microseconds
pub const F1_GPS_MIN_LOOPTIME: u16 = 2000;

/// Gyro sync denominator floor on F1 parts while GPS is enabled
pub const F1_GPS_MIN_GYRO_SYNC_DENOMINATOR: u8 = 2;

/// Repair `config` for `board`
pub fn validate_and_fix_config(config: &mut MasterConfig, board: &BoardDescriptor) {
    let before = config.enabled_features;

    fix_rx_variants(&mut config.enabled_features);
    fix_parallel_pwm(config, board);
    fix_cpu_load(config, board);

    let features = &mut config.enabled_features;
    if board.softserial_shares_led_timer && features.contains(Features::SOFTSERIAL) {
        features.remove(Features::LED_STRIP);
    }

    fix_pin_conflicts(config, board);

    if board.telemetry_inverter {
        config.telemetry.telemetry_inversion = true;
    }

    let features = &mut config.enabled_features;
    if board.sonar_shares_softserial
        && features.contains(Features::SONAR | Features::SOFTSERIAL)
    {
        features.remove(Features::SONAR);
    }

    fix_serial(config, board);
    fix_profile_indexes(config);

    if !config.mixer_mode.is_enabled(board.uncommon_mixers) {
        log_warn!("mixer {} unavailable, using default", config.mixer_mode as u8);
        config.mixer_mode = DEFAULT_MIXER;
    }

    if config.enabled_features != before {
        log_info!(
            "features repaired: {=u32:#x} -> {=u32:#x}",
            before.bits(),
            config.enabled_features.bits()
        );
    }
}

/// Keep exactly one receiver variant
///
/// Precedence is MSP, serial, PPM, then parallel PWM.
fn fix_rx_variants(features: &mut Features) {
    if !features.intersects(Features::RX_VARIANTS) {
        features.insert(Features::RX_PARALLEL_PWM);
    }

    if features.contains(Features::RX_PPM) {
        features.remove(Features::RX_PARALLEL_PWM);
    }

    if features.contains(Features::RX_MSP) {
        features.remove(Features::RX_SERIAL | Features::RX_PARALLEL_PWM | Features::RX_PPM);
    }

    if features.contains(Features::RX_SERIAL) {
        features.remove(Features::RX_PARALLEL_PWM | Features::RX_PPM);
    }
}

fn fix_parallel_pwm(config: &mut MasterConfig, board: &BoardDescriptor) {
    let current_is_adc = config.battery.current_meter_type == CurrentSensor::Adc;
    let features = &mut config.enabled_features;
    if !features.contains(Features::RX_PARALLEL_PWM) {
        return;
    }

    if board.pwm_shares_adc_pins {
        features.remove(Features::RSSI_ADC);
        if current_is_adc {
            features.remove(Features::CURRENT_METER);
        }
    }

    if board.pwm_shares_led_timer {
        features.remove(Features::LED_STRIP);
    }

    // software serial needs free PWM inputs
    features.remove(Features::SOFTSERIAL);
}

fn fix_cpu_load(config: &mut MasterConfig, board: &BoardDescriptor) {
    if board.cpu != CpuClass::F1 || !config.enabled_features.contains(Features::GPS) {
        return;
    }

    if config.gyro_sync && config.gyro_sync_denominator < F1_GPS_MIN_GYRO_SYNC_DENOMINATOR {
        config.gyro_sync_denominator = F1_GPS_MIN_GYRO_SYNC_DENOMINATOR;
    }

    if config.looptime != 0 && config.looptime < F1_GPS_MIN_LOOPTIME {
        config.looptime = F1_GPS_MIN_LOOPTIME;
    }
}

fn fix_pin_conflicts(config: &mut MasterConfig, board: &BoardDescriptor) {
    let current_is_adc = config.battery.current_meter_type == CurrentSensor::Adc;
    let usart3_in_use = config.serial.uses_port(SerialPortIdentifier::Usart3);
    let features = &mut config.enabled_features;

    let sonar_blocks_current = match board.sonar_current_conflict {
        SonarCurrentConflict::None => false,
        SonarCurrentConflict::WithParallelPwm => features.contains(Features::RX_PARALLEL_PWM),
        SonarCurrentConflict::Always => true,
    };
    if sonar_blocks_current
        && current_is_adc
        && features.contains(Features::SONAR | Features::CURRENT_METER)
    {
        features.remove(Features::CURRENT_METER);
    }

    if board.display_shares_usart3 && usart3_in_use {
        features.remove(Features::DISPLAY);
    }
}

fn pin_serial_ports(config: &mut MasterConfig, board: &BoardDescriptor) {
    let Some(pinned) = board.pinned_serial else {
        return;
    };

    if let Some(port) = config.serial.ports.get_mut(pinned.msp_port) {
        port.function_mask = SerialFunction::MSP;
    }
    if config.enabled_features.contains(Features::RX_SERIAL) {
        if let Some(port) = config.serial.ports.get_mut(pinned.rx_serial_port) {
            port.function_mask = SerialFunction::RX_SERIAL;
        }
    }
}

fn fix_serial(config: &mut MasterConfig, board: &BoardDescriptor) {
    pin_serial_ports(config, board);

    if !config.serial.is_valid() {
        log_warn!("serial port table invalid, restoring defaults");
        config.serial = SerialConfig::for_board(board);
        pin_serial_ports(config, board);
    }
}

fn fix_profile_indexes(config: &mut MasterConfig) {
    if config.current_profile_index as usize >= MAX_PROFILE_COUNT {
        config.current_profile_index = 0;
    }

    for profile in config.profiles.iter_mut() {
        if profile.default_rate_profile_index as usize >= MAX_CONTROL_RATE_PROFILE_COUNT {
            profile.default_rate_profile_index = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::board::BoardId;
    use crate::config::defaults::factory_config;
    use crate::config::mixer::MixerMode;

    fn validated(id: BoardId, features: Features) -> MasterConfig {
        let mut config = factory_config(id.descriptor());
        config.enabled_features = features;
        validate_and_fix_config(&mut config, id.descriptor());
        config
    }

    fn rx_bits(config: &MasterConfig) -> Features {
        config.enabled_features & Features::RX_VARIANTS
    }

    #[test]
    fn test_parallel_pwm_when_no_receiver() {
        let config = validated(BoardId::Sparky, Features::VBAT);
        assert_eq!(rx_bits(&config), Features::RX_PARALLEL_PWM);
    }

    #[test]
    fn test_msp_beats_serial() {
        let config = validated(BoardId::Sparky, Features::RX_MSP | Features::RX_SERIAL);
        assert_eq!(rx_bits(&config), Features::RX_MSP);
    }

    #[test]
    fn test_serial_beats_ppm() {
        let config = validated(BoardId::Sparky, Features::RX_PPM | Features::RX_SERIAL);
        assert_eq!(rx_bits(&config), Features::RX_SERIAL);
    }

    #[test]
    fn test_ppm_beats_parallel_pwm() {
        let config = validated(
            BoardId::Sparky,
            Features::RX_PPM | Features::RX_PARALLEL_PWM,
        );
        assert_eq!(rx_bits(&config), Features::RX_PPM);
    }

    #[test]
    fn test_parallel_pwm_on_f1_clears_shared_pins() {
        let config = validated(
            BoardId::Naze,
            Features::RX_PARALLEL_PWM
                | Features::RSSI_ADC
                | Features::CURRENT_METER
                | Features::LED_STRIP
                | Features::SOFTSERIAL
                | Features::VBAT,
        );
        assert_eq!(
            config.enabled_features,
            Features::RX_PARALLEL_PWM | Features::VBAT
        );
    }

    #[test]
    fn test_virtual_current_meter_survives_parallel_pwm() {
        let board = BoardId::Naze.descriptor();
        let mut config = factory_config(board);
        config.battery.current_meter_type = CurrentSensor::Virtual;
        config.enabled_features = Features::RX_PARALLEL_PWM | Features::CURRENT_METER;
        validate_and_fix_config(&mut config, board);
        assert!(config.enabled_features.contains(Features::CURRENT_METER));
    }

    #[test]
    fn test_parallel_pwm_on_f3_keeps_adc_features() {
        let config = validated(
            BoardId::Sparky,
            Features::RX_PARALLEL_PWM | Features::RSSI_ADC | Features::LED_STRIP,
        );
        assert!(config
            .enabled_features
            .contains(Features::RSSI_ADC | Features::LED_STRIP));
    }

    #[test]
    fn test_led_timer_shared_on_discovery() {
        let config = validated(
            BoardId::F3Discovery,
            Features::RX_PARALLEL_PWM | Features::LED_STRIP,
        );
        assert!(!config.enabled_features.contains(Features::LED_STRIP));
    }

    #[test]
    fn test_softserial_takes_led_timer() {
        let config = validated(
            BoardId::Naze,
            Features::RX_PPM | Features::SOFTSERIAL | Features::LED_STRIP,
        );
        assert!(config.enabled_features.contains(Features::SOFTSERIAL));
        assert!(!config.enabled_features.contains(Features::LED_STRIP));
    }

    #[test]
    fn test_f1_gps_relaxes_loop() {
        let board = BoardId::Naze.descriptor();
        let mut config = factory_config(board);
        config.enabled_features = Features::RX_PPM | Features::GPS;
        config.looptime = 1000;
        config.gyro_sync = true;
        config.gyro_sync_denominator = 1;
        validate_and_fix_config(&mut config, board);
        assert_eq!(config.looptime, 2000);
        assert_eq!(config.gyro_sync_denominator, 2);
    }

    #[test]
    fn test_f3_gps_keeps_fast_loop() {
        let board = BoardId::SpRacingF3.descriptor();
        let mut config = factory_config(board);
        config.enabled_features = Features::RX_PPM | Features::GPS;
        config.looptime = 1000;
        validate_and_fix_config(&mut config, board);
        assert_eq!(config.looptime, 1000);
    }

    #[test]
    fn test_naze_sonar_drops_adc_current_meter_with_pwm() {
        let config = validated(
            BoardId::Naze,
            Features::RX_PARALLEL_PWM | Features::SONAR | Features::CURRENT_METER,
        );
        // cleared by the parallel PWM pin rule already
        assert!(!config.enabled_features.contains(Features::CURRENT_METER));

        let config = validated(
            BoardId::Naze,
            Features::RX_PPM | Features::SONAR | Features::CURRENT_METER,
        );
        assert!(config.enabled_features.contains(Features::CURRENT_METER));
    }

    #[test]
    fn test_olimexino_sonar_always_wins() {
        let config = validated(
            BoardId::Olimexino,
            Features::RX_PPM | Features::SONAR | Features::CURRENT_METER,
        );
        assert!(config.enabled_features.contains(Features::SONAR));
        assert!(!config.enabled_features.contains(Features::CURRENT_METER));
    }

    #[test]
    fn test_cc3d_display_conflicts_with_usart3() {
        let board = BoardId::Cc3d.descriptor();
        let mut config = factory_config(board);
        config.enabled_features = Features::RX_PPM | Features::DISPLAY;
        config.serial.ports[2].function_mask = SerialFunction::GPS;
        validate_and_fix_config(&mut config, board);
        assert!(!config.enabled_features.contains(Features::DISPLAY));

        let config = validated(BoardId::Cc3d, Features::RX_PPM | Features::DISPLAY);
        assert!(config.enabled_features.contains(Features::DISPLAY));
    }

    #[test]
    fn test_cc3d_softserial_beats_sonar() {
        let config = validated(
            BoardId::Cc3d,
            Features::RX_PPM | Features::SONAR | Features::SOFTSERIAL,
        );
        assert!(config.enabled_features.contains(Features::SOFTSERIAL));
        assert!(!config.enabled_features.contains(Features::SONAR));
    }

    #[test]
    fn test_inverter_board_forces_inversion() {
        let board = BoardId::SpRacingF3.descriptor();
        let mut config = factory_config(board);
        config.telemetry.telemetry_inversion = false;
        validate_and_fix_config(&mut config, board);
        assert!(config.telemetry.telemetry_inversion);

        let config = validated(BoardId::Naze, Features::RX_PPM);
        assert!(!config.telemetry.telemetry_inversion);
    }

    #[test]
    fn test_colibri_pins_ports() {
        let board = BoardId::ColibriRace.descriptor();
        let mut config = factory_config(board);
        config.enabled_features.insert(Features::RX_SERIAL);
        config.serial.ports[0].function_mask = SerialFunction::GPS;
        validate_and_fix_config(&mut config, board);
        assert_eq!(config.serial.ports[0].function_mask, SerialFunction::MSP);
        assert_eq!(config.serial.ports[2].function_mask, SerialFunction::RX_SERIAL);
    }

    #[test]
    fn test_invalid_serial_table_reset() {
        let board = BoardId::Naze.descriptor();
        let mut config = factory_config(board);
        config.serial.ports[0].function_mask = SerialFunction::GPS;
        config.serial.ports[1].function_mask = SerialFunction::GPS;
        validate_and_fix_config(&mut config, board);
        assert_eq!(config.serial, SerialConfig::for_board(board));
    }

    #[test]
    fn test_disabled_mixer_falls_back() {
        let board = BoardId::Naze.descriptor();
        let mut config = factory_config(board);
        config.mixer_mode = MixerMode::Gimbal;
        validate_and_fix_config(&mut config, board);
        assert_eq!(config.mixer_mode, MixerMode::QuadX);

        let board = BoardId::Cjmcu.descriptor();
        let mut config = factory_config(board);
        config.mixer_mode = MixerMode::Y6;
        validate_and_fix_config(&mut config, board);
        assert_eq!(config.mixer_mode, MixerMode::QuadX);
    }

    #[test]
    fn test_profile_indexes_clamped() {
        let board = BoardId::Naze.descriptor();
        let mut config = factory_config(board);
        config.current_profile_index = 7;
        config.profiles[1].default_rate_profile_index = 3;
        validate_and_fix_config(&mut config, board);
        assert_eq!(config.current_profile_index, 0);
        assert_eq!(config.profiles[1].default_rate_profile_index, 0);
        assert_eq!(config.profiles[2].default_rate_profile_index, 2);
    }
}
