//! Board descriptor table
//!
//! Everything that differs between flight controller boards lives here as
//! constant data: which peripherals share timers, which sensors are fitted
//! and which factory settings deviate from the universal defaults. The
//! validator and the defaults provider consult the descriptor instead of
//! branching on the board at build time.

use super::features::Features;
use super::mixer::MotorMixer;
use super::serial::SerialPortIdentifier::{self, *};
use super::types::{AccHardware, GyroHardware, MagHardware, SensorAlign};

/// Motor update rate for brushless ESCs, in Hz
pub const BRUSHLESS_MOTORS_PWM_RATE: u16 = 400;

/// Motor update rate for brushed motors driven through FETs, in Hz
pub const BRUSHED_MOTORS_PWM_RATE: u16 = 16000;

/// Supported boards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BoardId {
    Naze,
    Cc3d,
    Olimexino,
    Cjmcu,
    AlienWiiF1,
    ChebuzzF3,
    F3Discovery,
    Sparky,
    ColibriRace,
    Motolab,
    LuxRace,
    AlienWiiF3,
    SpRacingF3,
}

impl BoardId {
    /// Every board in the table
    pub const ALL: [BoardId; 13] = [
        BoardId::Naze,
        BoardId::Cc3d,
        BoardId::Olimexino,
        BoardId::Cjmcu,
        BoardId::AlienWiiF1,
        BoardId::ChebuzzF3,
        BoardId::F3Discovery,
        BoardId::Sparky,
        BoardId::ColibriRace,
        BoardId::Motolab,
        BoardId::LuxRace,
        BoardId::AlienWiiF3,
        BoardId::SpRacingF3,
    ];

    /// Descriptor for this board
    pub fn descriptor(self) -> &'static BoardDescriptor {
        match self {
            BoardId::Naze => &NAZE,
            BoardId::Cc3d => &CC3D,
            BoardId::Olimexino => &OLIMEXINO,
            BoardId::Cjmcu => &CJMCU,
            BoardId::AlienWiiF1 => &ALIENWII_F1,
            BoardId::ChebuzzF3 => &CHEBUZZ_F3,
            BoardId::F3Discovery => &F3_DISCOVERY,
            BoardId::Sparky => &SPARKY,
            BoardId::ColibriRace => &COLIBRI_RACE,
            BoardId::Motolab => &MOTOLAB,
            BoardId::LuxRace => &LUX_RACE,
            BoardId::AlienWiiF3 => &ALIENWII_F3,
            BoardId::SpRacingF3 => &SPRACING_F3,
        }
    }
}

/// MCU family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CpuClass {
    /// STM32F10x, slow enough that GPS needs a relaxed loop
    F1,
    /// STM32F30x
    F3,
}

/// When a sonar and an ADC current meter cannot coexist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SonarCurrentConflict {
    /// They use separate pins
    None,
    /// Only when parallel PWM input occupies the sonar's alternate pins
    WithParallelPwm,
    /// They always share a pin
    Always,
}

/// Serial ports pinned by the board wiring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinnedSerial {
    /// Port that always carries MSP and nothing else
    pub msp_port: usize,
    /// Port that carries the serial receiver when enabled
    pub rx_serial_port: usize,
}

/// Sensors fitted to the board, used when the record says "auto"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BoardSensors {
    pub gyro: GyroHardware,
    pub acc: AccHardware,
    pub mag: MagHardware,
    /// Native gyro chip orientation
    pub gyro_align: SensorAlign,
    /// Native accelerometer chip orientation
    pub acc_align: SensorAlign,
    /// Native magnetometer chip orientation
    pub mag_align: SensorAlign,
}

/// Factory settings that differ from the universal defaults
#[derive(Debug, Clone, Copy)]
pub struct BoardDefaults {
    /// Features enabled on top of FAILSAFE
    pub features: Features,
    pub looptime: Option<u16>,
    pub motor_pwm_rate: u16,
    /// Channel order string, see [`super::types::parse_rc_channels`]
    pub rcmap: Option<&'static str>,
    /// Port assigned to the serial receiver
    pub rx_serial_port: Option<usize>,
    pub serialrx_provider: Option<u8>,
    pub spektrum_sat_bind: Option<u8>,
    /// Minimum and maximum throttle
    pub throttle_range: Option<(u16, u16)>,
    pub vbatscale: Option<u8>,
    /// P gain for both roll and pitch
    pub roll_pitch_p: Option<u8>,
    /// Failsafe guard time and landing time
    pub failsafe_delays: Option<(u8, u8)>,
    pub rc_rate8: Option<u8>,
    /// Roll, pitch and yaw rates
    pub rates: Option<[u8; 3]>,
    /// Record the blackbox to the onboard flash chip
    pub blackbox_on_flash: bool,
    /// Replaces the mixer with this custom table
    pub custom_mixer: Option<&'static [MotorMixer]>,
}

impl BoardDefaults {
    /// No deviations
    pub const NONE: Self = Self {
        features: Features::empty(),
        looptime: None,
        motor_pwm_rate: BRUSHLESS_MOTORS_PWM_RATE,
        rcmap: None,
        rx_serial_port: None,
        serialrx_provider: None,
        spektrum_sat_bind: None,
        throttle_range: None,
        vbatscale: None,
        roll_pitch_p: None,
        failsafe_delays: None,
        rc_rate8: None,
        rates: None,
        blackbox_on_flash: false,
        custom_mixer: None,
    };
}

/// Capabilities and factory deltas of one board
#[derive(Debug, Clone, Copy)]
pub struct BoardDescriptor {
    pub id: BoardId,
    pub name: &'static str,
    pub cpu: CpuClass,
    /// Parallel PWM input occupies the RSSI and current meter ADC pins
    pub pwm_shares_adc_pins: bool,
    /// Parallel PWM input occupies the LED strip timer
    pub pwm_shares_led_timer: bool,
    /// A soft serial port runs on the LED strip timer
    pub softserial_shares_led_timer: bool,
    pub sonar_current_conflict: SonarCurrentConflict,
    /// The display bus is routed through USART3's pins
    pub display_shares_usart3: bool,
    /// The sonar is routed through the soft serial pins
    pub sonar_shares_softserial: bool,
    /// UARTs can invert their signal in hardware
    pub telemetry_inverter: bool,
    /// Enough flash for the less common mixer tables
    pub uncommon_mixers: bool,
    pub pinned_serial: Option<PinnedSerial>,
    /// Physical serial ports in table order
    pub serial_ports: &'static [SerialPortIdentifier],
    /// Ports that carry MSP by default
    pub msp_ports: &'static [usize],
    pub sensors: BoardSensors,
    pub defaults: BoardDefaults,
}

const MPU6050_HMC5883L: BoardSensors = BoardSensors {
    gyro: GyroHardware::Mpu6050,
    acc: AccHardware::Mpu6050,
    mag: MagHardware::Hmc5883l,
    gyro_align: SensorAlign::Cw0,
    acc_align: SensorAlign::Cw0,
    mag_align: SensorAlign::Cw180,
};

const MPU6050_ONLY: BoardSensors = BoardSensors {
    mag: MagHardware::None,
    ..MPU6050_HMC5883L
};

const F1_BOARD: BoardDescriptor = BoardDescriptor {
    id: BoardId::Naze,
    name: "NAZE",
    cpu: CpuClass::F1,
    pwm_shares_adc_pins: true,
    pwm_shares_led_timer: true,
    softserial_shares_led_timer: true,
    sonar_current_conflict: SonarCurrentConflict::None,
    display_shares_usart3: false,
    sonar_shares_softserial: false,
    telemetry_inverter: false,
    uncommon_mixers: true,
    pinned_serial: None,
    serial_ports: &[Usart1, Usart2, Usart3, SoftSerial1, SoftSerial2],
    msp_ports: &[0],
    sensors: MPU6050_HMC5883L,
    defaults: BoardDefaults::NONE,
};

const F3_BOARD: BoardDescriptor = BoardDescriptor {
    cpu: CpuClass::F3,
    pwm_shares_adc_pins: false,
    pwm_shares_led_timer: false,
    softserial_shares_led_timer: false,
    telemetry_inverter: true,
    serial_ports: &[UsbVcp, Usart1, Usart2, Usart3],
    ..F1_BOARD
};

/// 0.414178 = tan(22.5°), the arm offset of an H-frame octo
const AW: f32 = 0.414178;

/// AlienWii 8-motor layout
const ALIENWII_MIXER: [MotorMixer; 8] = [
    MotorMixer::new(1.0, -AW, 1.0, -1.0), // REAR_R
    MotorMixer::new(1.0, -AW, -1.0, 1.0), // FRONT_R
    MotorMixer::new(1.0, AW, 1.0, 1.0),   // REAR_L
    MotorMixer::new(1.0, AW, -1.0, -1.0), // FRONT_L
    MotorMixer::new(1.0, -1.0, -AW, -1.0), // MIDFRONT_R
    MotorMixer::new(1.0, 1.0, -AW, 1.0),  // MIDFRONT_L
    MotorMixer::new(1.0, -1.0, AW, 1.0),  // MIDREAR_R
    MotorMixer::new(1.0, 1.0, AW, -1.0),  // MIDREAR_L
];

const ALIENWII_DEFAULTS: BoardDefaults = BoardDefaults {
    features: Features::RX_SERIAL.union(Features::MOTOR_STOP),
    looptime: Some(2000),
    motor_pwm_rate: 32000,
    rcmap: Some("TAER1234"),
    rx_serial_port: Some(1),
    serialrx_provider: Some(1),
    spektrum_sat_bind: Some(5),
    throttle_range: Some((1000, 2000)),
    vbatscale: None,
    roll_pitch_p: Some(36),
    failsafe_delays: Some((2, 0)),
    rc_rate8: Some(130),
    rates: Some([20, 20, 100]),
    blackbox_on_flash: false,
    custom_mixer: Some(&ALIENWII_MIXER),
};

static NAZE: BoardDescriptor = BoardDescriptor {
    sonar_current_conflict: SonarCurrentConflict::WithParallelPwm,
    defaults: BoardDefaults {
        features: Features::VBAT,
        ..BoardDefaults::NONE
    },
    ..F1_BOARD
};

static CC3D: BoardDescriptor = BoardDescriptor {
    id: BoardId::Cc3d,
    name: "CC3D",
    display_shares_usart3: true,
    sonar_shares_softserial: true,
    serial_ports: &[UsbVcp, Usart1, Usart3, SoftSerial1],
    msp_ports: &[0, 1],
    sensors: BoardSensors {
        gyro_align: SensorAlign::Cw270,
        acc_align: SensorAlign::Cw270,
        ..MPU6050_ONLY
    },
    ..F1_BOARD
};

static OLIMEXINO: BoardDescriptor = BoardDescriptor {
    id: BoardId::Olimexino,
    name: "OLIMEXINO",
    sonar_current_conflict: SonarCurrentConflict::Always,
    sensors: MPU6050_ONLY,
    ..F1_BOARD
};

static CJMCU: BoardDescriptor = BoardDescriptor {
    id: BoardId::Cjmcu,
    name: "CJMCU",
    softserial_shares_led_timer: false,
    uncommon_mixers: false,
    serial_ports: &[Usart1, Usart2],
    defaults: BoardDefaults {
        features: Features::RX_PPM,
        motor_pwm_rate: BRUSHED_MOTORS_PWM_RATE,
        ..BoardDefaults::NONE
    },
    ..F1_BOARD
};

static ALIENWII_F1: BoardDescriptor = BoardDescriptor {
    id: BoardId::AlienWiiF1,
    name: "ALIENWIIF1",
    uncommon_mixers: false,
    serial_ports: &[Usart1, Usart2],
    sensors: MPU6050_ONLY,
    defaults: ALIENWII_DEFAULTS,
    ..F1_BOARD
};

static CHEBUZZ_F3: BoardDescriptor = BoardDescriptor {
    id: BoardId::ChebuzzF3,
    name: "CHEBUZZF3",
    pwm_shares_led_timer: true,
    ..F3_BOARD
};

static F3_DISCOVERY: BoardDescriptor = BoardDescriptor {
    id: BoardId::F3Discovery,
    name: "STM32F3DISCOVERY",
    pwm_shares_led_timer: true,
    ..F3_BOARD
};

static SPARKY: BoardDescriptor = BoardDescriptor {
    id: BoardId::Sparky,
    name: "SPARKY",
    sensors: BoardSensors {
        gyro_align: SensorAlign::Cw270,
        acc_align: SensorAlign::Cw270,
        ..MPU6050_HMC5883L
    },
    defaults: BoardDefaults {
        features: Features::RX_PPM.union(Features::VBAT),
        ..BoardDefaults::NONE
    },
    ..F3_BOARD
};

static COLIBRI_RACE: BoardDescriptor = BoardDescriptor {
    id: BoardId::ColibriRace,
    name: "COLIBRI_RACE",
    pinned_serial: Some(PinnedSerial {
        msp_port: 0,
        rx_serial_port: 2,
    }),
    defaults: BoardDefaults {
        features: Features::RX_PPM
            .union(Features::ONESHOT125)
            .union(Features::VBAT)
            .union(Features::LED_STRIP),
        looptime: Some(1000),
        rcmap: Some("TAER1234"),
        ..BoardDefaults::NONE
    },
    ..F3_BOARD
};

static MOTOLAB: BoardDescriptor = BoardDescriptor {
    id: BoardId::Motolab,
    name: "MOTOLAB",
    sensors: MPU6050_ONLY,
    defaults: BoardDefaults {
        features: Features::RX_PPM.union(Features::VBAT),
        ..BoardDefaults::NONE
    },
    ..F3_BOARD
};

static LUX_RACE: BoardDescriptor = BoardDescriptor {
    id: BoardId::LuxRace,
    name: "LUX_RACE",
    sensors: MPU6050_ONLY,
    defaults: BoardDefaults {
        features: Features::RX_PPM.union(Features::VBAT),
        ..BoardDefaults::NONE
    },
    ..F3_BOARD
};

static ALIENWII_F3: BoardDescriptor = BoardDescriptor {
    id: BoardId::AlienWiiF3,
    name: "ALIENWIIF3",
    uncommon_mixers: false,
    sensors: MPU6050_ONLY,
    defaults: BoardDefaults {
        features: ALIENWII_DEFAULTS.features.union(Features::VBAT),
        rx_serial_port: Some(2),
        vbatscale: Some(20),
        ..ALIENWII_DEFAULTS
    },
    ..F3_BOARD
};

static SPRACING_F3: BoardDescriptor = BoardDescriptor {
    id: BoardId::SpRacingF3,
    name: "SPRACINGF3",
    serial_ports: &[UsbVcp, Usart1, Usart2, Usart3, SoftSerial1],
    defaults: BoardDefaults {
        features: Features::VBAT,
        blackbox_on_flash: true,
        ..BoardDefaults::NONE
    },
    ..F3_BOARD
};
