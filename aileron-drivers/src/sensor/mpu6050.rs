//! InvenSense MPU-6050 gyroscope and accelerometer (I2C)
//!
//! One chip, two sample streams. Each [`Mpu6050`] instance reads either
//! the gyro or the accelerometer block; share the bus between the two
//! with a bus-sharing wrapper when both are in use.
//!
//! Configuration used:
//! - Clock source: PLL with gyro Z reference
//! - Gyro full scale: +/-2000 deg/s
//! - Accelerometer full scale: +/-8 g ([`ACC_1G`] counts per g)
//! - Digital low pass: 42 Hz

use aileron_core::traits::SensorDevice;
use embedded_hal::i2c::I2c;

/// Default 7-bit address (AD0 low)
pub const ADDRESS: u8 = 0x68;

/// Accelerometer counts per g at +/-8 g full scale
pub const ACC_1G: i32 = 4096;

/// MPU-6050 register addresses
pub mod reg {
    /// Sample rate divider
    pub const SMPLRT_DIV: u8 = 0x19;
    /// Frame sync and digital low pass
    pub const CONFIG: u8 = 0x1A;
    /// Gyro full scale select
    pub const GYRO_CONFIG: u8 = 0x1B;
    /// Accelerometer full scale select
    pub const ACCEL_CONFIG: u8 = 0x1C;
    /// Interrupt pin and auxiliary bus bypass
    pub const INT_PIN_CFG: u8 = 0x37;
    /// First accelerometer output register (X high byte)
    pub const ACCEL_XOUT_H: u8 = 0x3B;
    /// First gyro output register (X high byte)
    pub const GYRO_XOUT_H: u8 = 0x43;
    /// Power management
    pub const PWR_MGMT_1: u8 = 0x6B;
    /// Device identity
    pub const WHO_AM_I: u8 = 0x75;
}

const WHO_AM_I_VALUE: u8 = 0x68;
const CLOCK_PLL_ZGYRO: u8 = 0x03;
const DLPF_42HZ: u8 = 0x03;
const GYRO_FS_2000DPS: u8 = 0x18;
const ACCEL_FS_8G: u8 = 0x10;
/// Expose the auxiliary bus so a compass behind the chip is reachable
const I2C_BYPASS_EN: u8 = 0x02;

/// Which sample block an instance reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mpu6050Channel {
    Gyro,
    Accel,
}

impl Mpu6050Channel {
    fn first_register(self) -> u8 {
        match self {
            Mpu6050Channel::Gyro => reg::GYRO_XOUT_H,
            Mpu6050Channel::Accel => reg::ACCEL_XOUT_H,
        }
    }
}

pub struct Mpu6050<I2C> {
    i2c: I2C,
    address: u8,
    channel: Mpu6050Channel,
    initialized: bool,
}

impl<I2C: I2c> Mpu6050<I2C> {
    pub fn new(i2c: I2C, channel: Mpu6050Channel) -> Self {
        Self::with_address(i2c, ADDRESS, channel)
    }

    pub fn with_address(i2c: I2C, address: u8, channel: Mpu6050Channel) -> Self {
        Self {
            i2c,
            address,
            channel,
            initialized: false,
        }
    }

    pub fn channel(&self) -> Mpu6050Channel {
        self.channel
    }

    pub fn release(self) -> I2C {
        self.i2c
    }

    fn write_register(&mut self, register: u8, value: u8) -> Result<(), I2C::Error> {
        self.i2c.write(self.address, &[register, value])
    }

    fn read_register(&mut self, register: u8) -> Result<u8, I2C::Error> {
        let mut buf = [0u8; 1];
        self.i2c.write_read(self.address, &[register], &mut buf)?;
        Ok(buf[0])
    }

    fn configure(&mut self) -> Result<bool, I2C::Error> {
        if self.read_register(reg::WHO_AM_I)? & 0x7E != WHO_AM_I_VALUE {
            return Ok(false);
        }
        self.write_register(reg::PWR_MGMT_1, CLOCK_PLL_ZGYRO)?;
        self.write_register(reg::SMPLRT_DIV, 0x00)?;
        self.write_register(reg::CONFIG, DLPF_42HZ)?;
        self.write_register(reg::GYRO_CONFIG, GYRO_FS_2000DPS)?;
        self.write_register(reg::ACCEL_CONFIG, ACCEL_FS_8G)?;
        self.write_register(reg::INT_PIN_CFG, I2C_BYPASS_EN)?;
        Ok(true)
    }
}

impl<I2C: I2c> SensorDevice for Mpu6050<I2C> {
    fn init(&mut self) -> bool {
        self.initialized = self.configure().unwrap_or(false);
        self.initialized
    }

    fn read(&mut self, raw: &mut [i16; 3]) -> bool {
        if !self.initialized {
            return false;
        }
        let mut buf = [0u8; 6];
        let register = self.channel.first_register();
        if self.i2c.write_read(self.address, &[register], &mut buf).is_err() {
            return false;
        }
        *raw = super::be_axes(&buf);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::testing::RegisterBus;

    fn chip() -> RegisterBus {
        let mut bus = RegisterBus::new(ADDRESS);
        bus.registers[reg::WHO_AM_I as usize] = WHO_AM_I_VALUE;
        bus
    }

    #[test]
    fn test_init_configures_full_scale() {
        let mut mpu = Mpu6050::new(chip(), Mpu6050Channel::Gyro);
        assert!(mpu.init());

        let bus = mpu.release();
        assert_eq!(bus.registers[reg::PWR_MGMT_1 as usize], CLOCK_PLL_ZGYRO);
        assert_eq!(bus.registers[reg::GYRO_CONFIG as usize], GYRO_FS_2000DPS);
        assert_eq!(bus.registers[reg::ACCEL_CONFIG as usize], ACCEL_FS_8G);
        assert_eq!(bus.registers[reg::INT_PIN_CFG as usize], I2C_BYPASS_EN);
    }

    #[test]
    fn test_wrong_identity() {
        let mut bus = chip();
        bus.registers[reg::WHO_AM_I as usize] = 0x71;
        let mut mpu = Mpu6050::new(bus, Mpu6050Channel::Accel);
        assert!(!mpu.init());

        let mut raw = [7i16; 3];
        assert!(!mpu.read(&mut raw));
        assert_eq!(raw, [7; 3]);
    }

    #[test]
    fn test_absent_chip() {
        let mut mpu = Mpu6050::new(RegisterBus::new(0x50), Mpu6050Channel::Gyro);
        assert!(!mpu.init());
    }

    #[test]
    fn test_channels_read_their_block() {
        let mut bus = chip();
        bus.registers[0x3B..0x41].copy_from_slice(&[0x10, 0x00, 0xF0, 0x00, 0x00, 0x01]);
        bus.registers[0x43..0x49].copy_from_slice(&[0xFF, 0xFE, 0x00, 0x05, 0x80, 0x00]);

        let mut acc = Mpu6050::new(bus, Mpu6050Channel::Accel);
        assert!(acc.init());
        let mut raw = [0i16; 3];
        assert!(acc.read(&mut raw));
        assert_eq!(raw, [4096, -4096, 1]);

        let mut gyro = Mpu6050::new(acc.release(), Mpu6050Channel::Gyro);
        assert!(gyro.init());
        assert!(gyro.read(&mut raw));
        assert_eq!(raw, [-2, 5, i16::MIN]);
    }
}
