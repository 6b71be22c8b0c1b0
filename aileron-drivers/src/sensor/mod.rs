//! Inertial and magnetic sensor drivers
//!
//! [`SensorDriver`] wraps whichever chip the board and the stored
//! hardware selection call for, so the core pipelines stay generic over
//! a single device type per sensor.

pub mod fake;
pub mod hmc5883l;
pub mod mpu6050;

pub use fake::FakeSensor;
pub use hmc5883l::Hmc5883l;
pub use mpu6050::{Mpu6050, Mpu6050Channel};

use aileron_core::config::types::{AccHardware, GyroHardware, MagHardware};
use aileron_core::config::{BoardDescriptor, MasterConfig};
use aileron_core::traits::SensorDevice;
use embedded_hal::i2c::I2c;

/// Three big-endian i16 words
pub(crate) fn be_axes(buf: &[u8; 6]) -> [i16; 3] {
    core::array::from_fn(|axis| i16::from_be_bytes([buf[axis * 2], buf[axis * 2 + 1]]))
}

/// Gyro chip to drive: the stored selection unless it defers to the board
pub fn gyro_hardware(record: &MasterConfig, board: &BoardDescriptor) -> GyroHardware {
    match record.sensor_hardware.gyro {
        GyroHardware::Auto => board.sensors.gyro,
        selected => selected,
    }
}

pub fn acc_hardware(record: &MasterConfig, board: &BoardDescriptor) -> AccHardware {
    match record.sensor_hardware.acc {
        AccHardware::Auto => board.sensors.acc,
        selected => selected,
    }
}

pub fn mag_hardware(record: &MasterConfig, board: &BoardDescriptor) -> MagHardware {
    match record.sensor_hardware.mag {
        MagHardware::Auto => board.sensors.mag,
        selected => selected,
    }
}

/// Any supported three-axis source
pub enum SensorDriver<I2C> {
    /// Sensor absent or disabled
    None,
    Fake(FakeSensor),
    Mpu6050(Mpu6050<I2C>),
    Hmc5883l(Hmc5883l<I2C>),
}

impl<I2C: I2c> SensorDriver<I2C> {
    pub fn gyro(record: &MasterConfig, board: &BoardDescriptor, i2c: I2C) -> Self {
        match gyro_hardware(record, board) {
            GyroHardware::Mpu6050 => Self::Mpu6050(Mpu6050::new(i2c, Mpu6050Channel::Gyro)),
            GyroHardware::Fake => Self::Fake(FakeSensor::default()),
            GyroHardware::Auto => Self::None,
        }
    }

    pub fn acc(record: &MasterConfig, board: &BoardDescriptor, i2c: I2C) -> Self {
        match acc_hardware(record, board) {
            AccHardware::Mpu6050 => Self::Mpu6050(Mpu6050::new(i2c, Mpu6050Channel::Accel)),
            AccHardware::Fake => Self::Fake(FakeSensor::default()),
            AccHardware::Auto | AccHardware::None => Self::None,
        }
    }

    pub fn mag(record: &MasterConfig, board: &BoardDescriptor, i2c: I2C) -> Self {
        match mag_hardware(record, board) {
            MagHardware::Hmc5883l => Self::Hmc5883l(Hmc5883l::new(i2c)),
            MagHardware::Fake => Self::Fake(FakeSensor::default()),
            MagHardware::Auto | MagHardware::None => Self::None,
        }
    }

    /// Initialize, falling back to [`SensorDriver::None`] if the chip
    /// does not answer
    pub fn probe(mut self) -> Self {
        if self.init() {
            self
        } else {
            Self::None
        }
    }

    pub fn is_present(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl<I2C: I2c> SensorDevice for SensorDriver<I2C> {
    fn init(&mut self) -> bool {
        match self {
            Self::None => false,
            Self::Fake(sensor) => sensor.init(),
            Self::Mpu6050(sensor) => sensor.init(),
            Self::Hmc5883l(sensor) => sensor.init(),
        }
    }

    fn read(&mut self, raw: &mut [i16; 3]) -> bool {
        match self {
            Self::None => false,
            Self::Fake(sensor) => sensor.read(raw),
            Self::Mpu6050(sensor) => sensor.read(raw),
            Self::Hmc5883l(sensor) => sensor.read(raw),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};

    /// Single device with a flat register file and auto-incrementing
    /// register pointer
    pub struct RegisterBus {
        pub address: u8,
        pub registers: [u8; 256],
        pointer: u8,
    }

    impl RegisterBus {
        pub fn new(address: u8) -> Self {
            Self {
                address,
                registers: [0; 256],
                pointer: 0,
            }
        }
    }

    impl ErrorType for RegisterBus {
        type Error = ErrorKind;
    }

    impl I2c for RegisterBus {
        fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            if address != self.address {
                return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
            }
            for operation in operations {
                match operation {
                    Operation::Write(bytes) => {
                        if let Some((&register, values)) = bytes.split_first() {
                            self.pointer = register;
                            for &value in values {
                                self.registers[self.pointer as usize] = value;
                                self.pointer = self.pointer.wrapping_add(1);
                            }
                        }
                    }
                    Operation::Read(buf) => {
                        for byte in buf.iter_mut() {
                            *byte = self.registers[self.pointer as usize];
                            self.pointer = self.pointer.wrapping_add(1);
                        }
                    }
                }
            }
            Ok(())
        }
    }
}
