//! Factory defaults
//!
//! A fresh record is built in three layers:
//! 1. universal defaults from each sub-record's `Default`
//! 2. the board descriptor's deltas, applied to profile 0 and rate profile 0
//! 3. propagation of profile 0 and rate profile 0 to the remaining slots

use super::board::BoardDescriptor;
use super::eeprom::EEPROM_CONF_VERSION;
use super::features::{Features, PersistentFlags};
use super::master::MasterConfig;
use super::mixer::{MixerConfig, MixerMode, MotorMixer, MAX_SUPPORTED_MOTORS};
use super::nav::NavConfig;
use super::profile::{
    ControlRateConfig, PidIndex, Profile, MAX_CONTROL_RATE_PROFILE_COUNT, MAX_PROFILE_COUNT,
};
use super::serial::{SerialConfig, SerialFunction};
use super::types::*;

/// Servo update rate for analog servos, in Hz
pub const DEFAULT_SERVO_PWM_RATE: u16 = 50;

/// Build the factory record for a board
pub fn factory_config(board: &BoardDescriptor) -> MasterConfig {
    let mut config = MasterConfig {
        version: EEPROM_CONF_VERSION,
        mixer_mode: MixerMode::QuadX,
        enabled_features: Features::empty(),
        persistent_flags: PersistentFlags::empty(),

        sensor_hardware: SensorHardware::default(),
        board_alignment: BoardAlignment::default(),
        sensor_alignment: SensorAlignmentConfig::default(),

        looptime: 2000,
        emf_avoidance: false,
        i2c_overclock: false,
        gyro_sync: false,
        gyro_sync_denominator: 2,

        yaw_control_direction: 1,
        dcm_kp_acc: 2500,  // 0.25
        dcm_ki_acc: 50,    // 0.005
        dcm_kp_mag: 10000, // 1.0
        dcm_ki_mag: 0,
        small_angle: 25,

        gyro: GyroConfig::default(),
        acc: AccTrims::default(),
        mag: MagConfig::default(),
        baro: BarometerConfig::default(),
        battery: BatteryConfig::default(),
        telemetry: TelemetryConfig::default(),

        rx: RxConfig::default(),
        input_filtering_mode: false,
        disarm_kill_switch: true,
        auto_disarm_delay: 5,

        mixer: MixerConfig::default(),
        esc_and_servo: EscAndServoConfig::default(),
        flight_3d: Flight3dConfig::default(),
        motor_pwm_rate: board.defaults.motor_pwm_rate,
        servo_pwm_rate: DEFAULT_SERVO_PWM_RATE,
        custom_motor_mixer: [MotorMixer::UNUSED; MAX_SUPPORTED_MOTORS],

        gps: GpsConfig::default(),
        nav: NavConfig::default(),
        serial: SerialConfig::for_board(board),
        failsafe: FailsafeConfig::default(),
        blackbox: BlackboxConfig::default(),
        led_strip: LedStripConfig::default(),

        current_profile_index: 0,
        profiles: [Profile::default(); MAX_PROFILE_COUNT],
        control_rate_profiles: [ControlRateConfig::default(); MAX_CONTROL_RATE_PROFILE_COUNT],

        beeper_off_flags: 0,
        prefered_beeper_off_flags: 0,
    };

    config.enabled_features = Features::FAILSAFE | board.defaults.features;
    apply_board_defaults(&mut config, board);
    propagate_profiles(&mut config);
    config
}

/// Replace `config` with the factory record for `board`
pub fn reset_defaults(config: &mut MasterConfig, board: &BoardDescriptor) {
    *config = factory_config(board);
}

fn apply_board_defaults(config: &mut MasterConfig, board: &BoardDescriptor) {
    let defaults = &board.defaults;

    if let Some(looptime) = defaults.looptime {
        config.looptime = looptime;
    }
    if let Some(rcmap) = defaults.rcmap {
        parse_rc_channels(rcmap, &mut config.rx.rcmap);
    }
    if let Some(port) = defaults
        .rx_serial_port
        .and_then(|index| config.serial.ports.get_mut(index))
    {
        port.function_mask = SerialFunction::RX_SERIAL;
    }
    if let Some(provider) = defaults.serialrx_provider {
        config.rx.serialrx_provider = provider;
    }
    if let Some(bind) = defaults.spektrum_sat_bind {
        config.rx.spektrum_sat_bind = bind;
    }
    if let Some((min, max)) = defaults.throttle_range {
        config.esc_and_servo.minthrottle = min;
        config.esc_and_servo.maxthrottle = max;
    }
    if let Some(scale) = defaults.vbatscale {
        config.battery.vbatscale = scale;
    }
    if let Some((delay, off_delay)) = defaults.failsafe_delays {
        config.failsafe.failsafe_delay = delay;
        config.failsafe.failsafe_off_delay = off_delay;
    }
    if defaults.blackbox_on_flash {
        config.enabled_features.insert(Features::BLACKBOX);
        config.blackbox.device = BlackboxDevice::Flash;
    }
    if let Some(rows) = defaults.custom_mixer {
        for (slot, row) in config.custom_motor_mixer.iter_mut().zip(rows) {
            *slot = *row;
        }
        config.mixer_mode = MixerMode::Custom;
    }

    let pid = &mut config.profiles[0].pid;
    if let Some(p) = defaults.roll_pitch_p {
        pid.p8[PidIndex::Roll as usize] = p;
        pid.p8[PidIndex::Pitch as usize] = p;
    }

    let rates = &mut config.control_rate_profiles[0];
    if let Some(rc_rate8) = defaults.rc_rate8 {
        rates.rc_rate8 = rc_rate8;
    }
    if let Some(axis_rates) = defaults.rates {
        rates.rates = axis_rates;
    }
}

fn propagate_profiles(config: &mut MasterConfig) {
    let first = config.profiles[0];
    for (i, profile) in config.profiles.iter_mut().enumerate().skip(1) {
        *profile = first;
        profile.default_rate_profile_index = (i % MAX_CONTROL_RATE_PROFILE_COUNT) as u8;
    }

    let first_rates = config.control_rate_profiles[0];
    for rates in config.control_rate_profiles.iter_mut().skip(1) {
        *rates = first_rates;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::board::{BoardId, BRUSHED_MOTORS_PWM_RATE};
    use crate::config::serial::SerialFunction;

    #[test]
    fn test_universal_defaults() {
        let config = factory_config(BoardId::Cc3d.descriptor());
        assert_eq!(config.version, EEPROM_CONF_VERSION);
        assert_eq!(config.mixer_mode, MixerMode::QuadX);
        assert_eq!(config.enabled_features, Features::FAILSAFE);
        assert_eq!(config.looptime, 2000);
        assert_eq!(
            (config.dcm_kp_acc, config.dcm_ki_acc, config.dcm_kp_mag, config.dcm_ki_mag),
            (2500, 50, 10000, 0)
        );
        assert_eq!(config.gyro.gyro_lpf, 2);
        assert_eq!(config.acc, AccTrims::default());
        assert_eq!(config.rx.midrc, 1500);
        assert_eq!((config.rx.mincheck, config.rx.maxcheck), (1100, 1900));
        assert_eq!((config.rx.rx_min_usec, config.rx.rx_max_usec), (885, 2115));
        assert_eq!(config.serial.ports[0].function_mask, SerialFunction::MSP);
        assert_eq!(config.serial.reboot_character, b'R');
        assert_eq!(config.motor_pwm_rate, 400);
        assert_eq!(config.servo_pwm_rate, 50);
    }

    #[test]
    fn test_voltage_divider_board_enables_vbat() {
        let config = factory_config(BoardId::Naze.descriptor());
        assert_eq!(config.enabled_features, Features::FAILSAFE | Features::VBAT);
    }

    #[test]
    fn test_profile_propagation() {
        let config = factory_config(BoardId::Naze.descriptor());
        for (i, profile) in config.profiles.iter().enumerate() {
            assert_eq!(profile.default_rate_profile_index as usize, i);
            assert_eq!(profile.pid, config.profiles[0].pid);
        }
        for rates in &config.control_rate_profiles {
            assert_eq!(*rates, config.control_rate_profiles[0]);
        }
    }

    #[test]
    fn test_colibri_race_overrides() {
        let config = factory_config(BoardId::ColibriRace.descriptor());
        assert_eq!(config.looptime, 1000);
        assert_eq!(config.rx.rcmap, [1, 2, 3, 0, 4, 5, 6, 7]);
        assert!(config.enabled_features.contains(
            Features::RX_PPM
                | Features::ONESHOT125
                | Features::VBAT
                | Features::LED_STRIP
                | Features::FAILSAFE
        ));
    }

    #[test]
    fn test_alienwii_overrides_reach_every_profile() {
        let config = factory_config(BoardId::AlienWiiF1.descriptor());
        assert!(config
            .enabled_features
            .contains(Features::RX_SERIAL | Features::MOTOR_STOP));
        assert_eq!(config.serial.ports[1].function_mask, SerialFunction::RX_SERIAL);
        assert_eq!(config.rx.serialrx_provider, 1);
        assert_eq!(config.rx.spektrum_sat_bind, 5);
        assert_eq!(config.motor_pwm_rate, 32000);
        assert_eq!(config.mixer_mode, MixerMode::Custom);
        assert_eq!(config.custom_motor_mixer[7].pitch, 0.414178);
        assert_eq!(config.custom_motor_mixer[8], MotorMixer::UNUSED);
        for profile in &config.profiles {
            assert_eq!(profile.pid.get(PidIndex::Roll).0, 36);
        }
        for rates in &config.control_rate_profiles {
            assert_eq!(rates.rc_rate8, 130);
            assert_eq!(rates.rates, [20, 20, 100]);
        }
    }

    #[test]
    fn test_alienwii_f3_serial_port() {
        let config = factory_config(BoardId::AlienWiiF3.descriptor());
        assert_eq!(config.serial.ports[2].function_mask, SerialFunction::RX_SERIAL);
        assert_eq!(config.battery.vbatscale, 20);
    }

    #[test]
    fn test_brushed_board_pwm_rate() {
        let config = factory_config(BoardId::Cjmcu.descriptor());
        assert_eq!(config.motor_pwm_rate, BRUSHED_MOTORS_PWM_RATE);
    }

    #[test]
    fn test_flash_blackbox_board() {
        let config = factory_config(BoardId::SpRacingF3.descriptor());
        assert!(config.enabled_features.contains(Features::BLACKBOX));
        assert_eq!(config.blackbox.device, BlackboxDevice::Flash);
    }

    #[test]
    fn test_reset_discards_user_values() {
        let board = BoardId::Naze.descriptor();
        let mut config = factory_config(board);
        config.looptime = 123;
        config.current_profile_index = 2;
        reset_defaults(&mut config, board);
        assert_eq!(config, factory_config(board));
    }
}
