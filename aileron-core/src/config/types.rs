//! Sub-configuration record types
//!
//! Each named record carries its universal factory defaults in its
//! `Default` impl. Board-specific deltas are applied on top by
//! [`super::defaults::reset_defaults`].

use postcard::experimental::max_size::MaxSize;
use serde::{Deserialize, Serialize};

/// Number of axes on a three-axis sensor
pub const XYZ_AXIS_COUNT: usize = 3;

/// Unit gain for the accelerometer trims (1.0 in Q12)
pub const ACC_GAIN_UNITY: i16 = 4096;

/// Channels whose range can be remapped (roll, pitch, yaw, throttle)
pub const NON_AUX_CHANNEL_COUNT: usize = 4;

/// Receiver channels with their own failsafe behaviour
pub const MAX_SUPPORTED_RC_CHANNEL_COUNT: usize = 18;

/// Channels in the channel map
pub const MAX_MAPPABLE_RX_INPUTS: usize = 8;

/// Addressable LEDs on the strip
pub const MAX_LED_STRIP_LENGTH: usize = 32;

/// User-editable palette entries
pub const CONFIGURABLE_COLOR_COUNT: usize = 16;

/// Hardware selector for the gyroscope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GyroHardware {
    /// Probe whatever the board descriptor lists
    #[default]
    Auto,
    /// InvenSense MPU-6050
    Mpu6050,
    /// Synthetic source for bench tests
    Fake,
}

/// Hardware selector for the accelerometer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AccHardware {
    /// Probe whatever the board descriptor lists
    #[default]
    Auto,
    /// Disabled
    None,
    /// InvenSense MPU-6050
    Mpu6050,
    /// Synthetic source for bench tests
    Fake,
}

/// Hardware selector for the magnetometer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MagHardware {
    /// Probe whatever the board descriptor lists
    #[default]
    Auto,
    /// Disabled
    None,
    /// Honeywell HMC5883L
    Hmc5883l,
    /// Synthetic source for bench tests
    Fake,
}

/// Hardware selector for the barometer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BaroHardware {
    /// Probe whatever the board descriptor lists
    #[default]
    Auto,
    /// Disabled
    None,
    /// Bosch BMP085/BMP180
    Bmp085,
    /// Measurement Specialties MS5611
    Ms5611,
}

/// Which driver serves each sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorHardware {
    pub gyro: GyroHardware,
    pub acc: AccHardware,
    pub mag: MagHardware,
    pub baro: BaroHardware,
}

/// Mounting rotation of a sensor chip relative to the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorAlign {
    /// Use the board descriptor's native orientation
    #[default]
    Default,
    Cw0,
    Cw90,
    Cw180,
    Cw270,
    Cw0Flip,
    Cw90Flip,
    Cw180Flip,
    Cw270Flip,
}

/// Per-sensor mounting rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorAlignmentConfig {
    pub gyro_align: SensorAlign,
    pub acc_align: SensorAlign,
    pub mag_align: SensorAlign,
}

/// Board mounting angles relative to the airframe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BoardAlignment {
    /// Roll offset in tenths of a degree
    pub roll_deci_degrees: i16,
    /// Pitch offset in tenths of a degree
    pub pitch_deci_degrees: i16,
    /// Yaw offset in tenths of a degree
    pub yaw_deci_degrees: i16,
}

/// Gyroscope settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GyroConfig {
    /// Hardware low-pass filter index
    pub gyro_lpf: u8,
    /// Maximum per-axis standard deviation accepted while calibrating
    ///
    /// Zero disables motion detection.
    pub gyro_movement_calibration_threshold: u8,
}

impl Default for GyroConfig {
    fn default() -> Self {
        Self {
            gyro_lpf: 2,
            gyro_movement_calibration_threshold: 32,
        }
    }
}

/// Accelerometer affine correction
///
/// Applied as `(raw - zero) * gain / 4096`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AccTrims {
    /// Per-axis zero offset in raw counts
    pub acc_zero: [i16; XYZ_AXIS_COUNT],
    /// Per-axis gain, 4096 is unity
    pub acc_gain: [i16; XYZ_AXIS_COUNT],
}

impl Default for AccTrims {
    fn default() -> Self {
        Self {
            acc_zero: [0; XYZ_AXIS_COUNT],
            acc_gain: [ACC_GAIN_UNITY; XYZ_AXIS_COUNT],
        }
    }
}

/// Magnetometer hard-iron offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MagConfig {
    /// Per-axis offset in raw counts
    pub mag_zero: [i16; XYZ_AXIS_COUNT],
}

/// Barometer settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BarometerConfig {
    /// Run a median filter over raw pressure samples
    pub use_median_filtering: bool,
}

impl Default for BarometerConfig {
    fn default() -> Self {
        Self {
            use_median_filtering: true,
        }
    }
}

/// Current sensor source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CurrentSensor {
    None,
    /// Analog shunt amplifier
    #[default]
    Adc,
    /// Estimated from throttle
    Virtual,
}

/// Battery voltage and current monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BatteryConfig {
    /// Voltage divider scale
    pub vbatscale: u8,
    /// Resistor divider value
    pub vbatresdivval: u8,
    /// Resistor divider multiplier
    pub vbatresdivmultiplier: u8,
    /// Maximum cell voltage in 0.1V
    pub vbatmaxcellvoltage: u8,
    /// Minimum cell voltage in 0.1V
    pub vbatmincellvoltage: u8,
    /// Warning cell voltage in 0.1V
    pub vbatwarningcellvoltage: u8,
    /// Current sensor scale in 0.1mV/A
    pub current_meter_scale: i16,
    /// Current sensor offset in mV
    pub current_meter_offset: u16,
    /// Current sensor source
    pub current_meter_type: CurrentSensor,
    /// Pack capacity in mAh, zero when unknown
    pub battery_capacity: u16,
}

/// Default voltage divider scale
pub const VBAT_SCALE_DEFAULT: u8 = 110;

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            vbatscale: VBAT_SCALE_DEFAULT,
            vbatresdivval: 10,
            vbatresdivmultiplier: 1,
            vbatmaxcellvoltage: 43,
            vbatmincellvoltage: 33,
            vbatwarningcellvoltage: 35,
            current_meter_scale: 400,
            current_meter_offset: 0,
            current_meter_type: CurrentSensor::Adc,
            battery_capacity: 0,
        }
    }
}

/// FrSky coordinate encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrskyGpsFormat {
    /// Degrees, minutes, seconds
    #[default]
    Dms,
    /// Nautical miles
    Nmea,
}

/// FrSky unit system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrskyUnit {
    #[default]
    Metric,
    Imperial,
}

/// Telemetry output settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TelemetryConfig {
    /// Invert the telemetry UART signal
    pub telemetry_inversion: bool,
    /// Telemetry follows an aux switch instead of the arm state
    pub telemetry_switch: bool,
    /// Position reported before the first fix, in 1e-7 degrees
    pub gps_no_fix_latitude: i32,
    pub gps_no_fix_longitude: i32,
    pub frsky_coordinate_format: FrskyGpsFormat,
    pub frsky_unit: FrskyUnit,
    /// Decimal places of the FrSky VFAS voltage
    pub frsky_vfas_precision: u8,
    /// HoTT alarm repeat interval in seconds
    pub hott_alarm_sound_interval: u8,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            telemetry_inversion: false,
            telemetry_switch: false,
            gps_no_fix_latitude: 0,
            gps_no_fix_longitude: 0,
            frsky_coordinate_format: FrskyGpsFormat::Dms,
            frsky_unit: FrskyUnit::Metric,
            frsky_vfas_precision: 0,
            hott_alarm_sound_interval: 5,
        }
    }
}

/// What a channel does when the receiver signal is lost
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxFailsafeMode {
    /// Controlled by the failsafe procedure
    #[default]
    Auto,
    /// Keep the last good value
    Hold,
    /// Jump to a fixed value
    Set,
}

/// Per-channel failsafe behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RxFailsafeChannelConfig {
    pub mode: RxFailsafeMode,
    /// Value for [`RxFailsafeMode::Set`], in 25µs steps above 750µs
    pub step: u8,
}

/// Convert a pulse width to a failsafe step
pub const fn channel_value_to_rxfail_step(usec: u16) -> u8 {
    let clamped = if usec < 750 {
        750
    } else if usec > 2250 {
        2250
    } else {
        usec
    };
    ((clamped - 750) / 25) as u8
}

/// Convert a failsafe step back to a pulse width
pub const fn rxfail_step_to_channel_value(step: u8) -> u16 {
    750 + step as u16 * 25
}

/// Pulse range a channel is rescaled from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RxChannelRange {
    pub min: u16,
    pub max: u16,
}

impl Default for RxChannelRange {
    fn default() -> Self {
        Self {
            min: 1000,
            max: 2000,
        }
    }
}

/// Receiver settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RxConfig {
    /// Channel order: `rcmap[i]` is the input carrying logical channel `i`
    pub rcmap: [u8; MAX_MAPPABLE_RX_INPUTS],
    /// Serial receiver protocol index
    pub serialrx_provider: u8,
    /// Spektrum satellite bind pulse count, zero disables
    pub spektrum_sat_bind: u8,
    /// Channel carrying RSSI, zero disables
    pub rssi_channel: u8,
    /// RSSI ADC scale in percent
    pub rssi_scale: u8,
    /// RSSI carried on a PPM channel is inverted
    pub rssi_ppm_invert: bool,
    /// Interpolate between receiver frames
    pub rc_smoothing: bool,
    /// Stick centre in µs
    pub midrc: u16,
    /// Below this the stick counts as low
    pub mincheck: u16,
    /// Above this the stick counts as high
    pub maxcheck: u16,
    /// Shortest valid pulse in µs
    pub rx_min_usec: u16,
    /// Longest valid pulse in µs
    pub rx_max_usec: u16,
    pub failsafe_channel_configs: [RxFailsafeChannelConfig; MAX_SUPPORTED_RC_CHANNEL_COUNT],
    pub channel_ranges: [RxChannelRange; NON_AUX_CHANNEL_COUNT],
}

/// Default RSSI ADC scale
pub const RSSI_SCALE_DEFAULT: u8 = 30;

/// Index of the throttle channel after mapping
pub const THROTTLE_CHANNEL: usize = 3;

impl Default for RxConfig {
    fn default() -> Self {
        let midrc = 1500;
        let rx_min_usec = 885;
        let mut failsafe_channel_configs =
            [RxFailsafeChannelConfig::default(); MAX_SUPPORTED_RC_CHANNEL_COUNT];
        for (i, channel) in failsafe_channel_configs.iter_mut().enumerate() {
            channel.mode = if i < NON_AUX_CHANNEL_COUNT {
                RxFailsafeMode::Auto
            } else {
                RxFailsafeMode::Hold
            };
            channel.step = if i == THROTTLE_CHANNEL {
                channel_value_to_rxfail_step(rx_min_usec)
            } else {
                channel_value_to_rxfail_step(midrc)
            };
        }

        Self {
            rcmap: [0, 1, 3, 2, 4, 5, 6, 7],
            serialrx_provider: 0,
            spektrum_sat_bind: 0,
            rssi_channel: 0,
            rssi_scale: RSSI_SCALE_DEFAULT,
            rssi_ppm_invert: false,
            rc_smoothing: true,
            midrc,
            mincheck: 1100,
            maxcheck: 1900,
            rx_min_usec,
            rx_max_usec: 2115,
            failsafe_channel_configs,
            channel_ranges: [RxChannelRange::default(); NON_AUX_CHANNEL_COUNT],
        }
    }
}

/// Logical channel letters in map order
const RC_CHANNEL_LETTERS: &[u8; MAX_MAPPABLE_RX_INPUTS] = b"AERT1234";

/// Build a channel map from a string such as `"AETR1234"`
///
/// Each position names the logical channel wired to that input. Unknown
/// letters are ignored and leave the corresponding entry untouched.
pub fn parse_rc_channels(input: &str, rcmap: &mut [u8; MAX_MAPPABLE_RX_INPUTS]) {
    for (position, c) in input.bytes().take(MAX_MAPPABLE_RX_INPUTS).enumerate() {
        if let Some(channel) = RC_CHANNEL_LETTERS.iter().position(|&l| l == c) {
            rcmap[channel] = position as u8;
        }
    }
}

/// ESC and servo pulse limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EscAndServoConfig {
    /// Lowest throttle sent while armed
    pub minthrottle: u16,
    /// Highest throttle sent
    pub maxthrottle: u16,
    /// Pulse sent while disarmed
    pub mincommand: u16,
    /// Servo neutral pulse
    pub servo_center_pulse: u16,
}

impl Default for EscAndServoConfig {
    fn default() -> Self {
        Self {
            minthrottle: 1150,
            maxthrottle: 1850,
            mincommand: 1000,
            servo_center_pulse: 1500,
        }
    }
}

/// Reversible-motor deadbands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Flight3dConfig {
    pub deadband3d_low: u16,
    pub deadband3d_high: u16,
    pub neutral3d: u16,
    pub deadband3d_throttle: u16,
}

impl Default for Flight3dConfig {
    fn default() -> Self {
        Self {
            deadband3d_low: 1406,
            deadband3d_high: 1514,
            neutral3d: 1460,
            deadband3d_throttle: 50,
        }
    }
}

/// GPS protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GpsProvider {
    Nmea,
    #[default]
    Ublox,
    I2cNav,
    Naza,
}

/// Satellite-based augmentation region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SbasMode {
    #[default]
    Auto,
    Egnos,
    Waas,
    Msas,
    Gagan,
}

/// GPS receiver dynamic model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GpsDynModel {
    Pedestrian,
    Air1g,
    #[default]
    Air4g,
}

/// GPS receiver settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GpsConfig {
    pub provider: GpsProvider,
    pub sbas_mode: SbasMode,
    /// Push a configuration to the receiver at boot
    pub auto_config: bool,
    /// Hunt for the receiver baud rate
    pub auto_baud: bool,
    pub dyn_model: GpsDynModel,
}

impl Default for GpsConfig {
    fn default() -> Self {
        Self {
            provider: GpsProvider::Ublox,
            sbas_mode: SbasMode::Auto,
            auto_config: true,
            auto_baud: true,
            dyn_model: GpsDynModel::Air4g,
        }
    }
}

/// Receiver-loss handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FailsafeConfig {
    /// Guard time before stage 2, in 0.1s
    pub failsafe_delay: u8,
    /// Time before motors stop during landing, in 0.1s
    pub failsafe_off_delay: u8,
    /// Throttle used while landing
    pub failsafe_throttle: u16,
    /// Treat the arm switch as a kill switch
    pub failsafe_kill_switch: bool,
    /// Low-throttle time that allows an immediate disarm, in 0.1s
    pub failsafe_throttle_low_delay: u16,
    /// Landing procedure index
    pub failsafe_procedure: u8,
}

impl Default for FailsafeConfig {
    fn default() -> Self {
        Self {
            failsafe_delay: 10,
            failsafe_off_delay: 200,
            failsafe_throttle: 1000,
            failsafe_kill_switch: false,
            failsafe_throttle_low_delay: 100,
            failsafe_procedure: 0,
        }
    }
}

/// Flight recorder destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BlackboxDevice {
    #[default]
    Serial,
    /// Onboard SPI flash chip
    Flash,
}

/// Flight recorder settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BlackboxConfig {
    pub device: BlackboxDevice,
    /// Log `rate_num` out of every `rate_denom` loop iterations
    pub rate_num: u8,
    pub rate_denom: u8,
}

impl Default for BlackboxConfig {
    fn default() -> Self {
        Self {
            device: BlackboxDevice::Serial,
            rate_num: 1,
            rate_denom: 1,
        }
    }
}

/// Camera gimbal behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GimbalMode {
    #[default]
    Normal,
    MixTilt,
}

/// Camera gimbal settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GimbalConfig {
    pub mode: GimbalMode,
}

/// Hue/saturation/value colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HsvColor {
    /// Hue in degrees, 0-359
    pub h: u16,
    /// Saturation, inverted: 0 is fully saturated
    pub s: u8,
    pub v: u8,
}

impl HsvColor {
    pub const fn new(h: u16, s: u8, v: u8) -> Self {
        Self { h, s, v }
    }
}

/// Factory palette
pub const DEFAULT_COLORS: [HsvColor; CONFIGURABLE_COLOR_COUNT] = [
    HsvColor::new(0, 0, 0),     // black
    HsvColor::new(0, 255, 255), // white
    HsvColor::new(0, 0, 255),   // red
    HsvColor::new(30, 0, 255),  // orange
    HsvColor::new(60, 0, 255),  // yellow
    HsvColor::new(90, 0, 255),  // lime green
    HsvColor::new(120, 0, 255), // green
    HsvColor::new(150, 0, 255), // mint green
    HsvColor::new(180, 0, 255), // cyan
    HsvColor::new(210, 0, 255), // light blue
    HsvColor::new(240, 0, 255), // blue
    HsvColor::new(270, 0, 255), // dark violet
    HsvColor::new(300, 0, 255), // magenta
    HsvColor::new(330, 0, 255), // deep pink
    HsvColor::new(0, 0, 0),
    HsvColor::new(0, 0, 0),
];

/// One LED of the strip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LedConfig {
    /// Grid position, x in the high nibble
    pub xy: u8,
    /// Palette index
    pub color: u8,
    /// Direction and function bits
    pub flags: u16,
}

/// LED strip layout and palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LedStripConfig {
    pub leds: [LedConfig; MAX_LED_STRIP_LENGTH],
    pub colors: [HsvColor; CONFIGURABLE_COLOR_COUNT],
}

impl Default for LedStripConfig {
    fn default() -> Self {
        Self {
            leds: [LedConfig::default(); MAX_LED_STRIP_LENGTH],
            colors: DEFAULT_COLORS,
        }
    }
}
