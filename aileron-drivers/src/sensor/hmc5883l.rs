//! Honeywell HMC5883L magnetometer (I2C)
//!
//! Runs in continuous measurement mode at 15 Hz with 8-sample averaging,
//! comfortably above the 10 Hz compass tick. The chip reports its axes
//! in X, Z, Y order; [`SensorDevice::read`] returns them as X, Y, Z.

use aileron_core::traits::SensorDevice;
use embedded_hal::i2c::I2c;

/// Fixed 7-bit address
pub const ADDRESS: u8 = 0x1E;

/// HMC5883L register addresses
pub mod reg {
    pub const CONFIG_A: u8 = 0x00;
    pub const CONFIG_B: u8 = 0x01;
    pub const MODE: u8 = 0x02;
    /// X high byte, followed by Z then Y
    pub const DATA_X_H: u8 = 0x03;
    pub const STATUS: u8 = 0x09;
    /// Identification A, B and C
    pub const ID_A: u8 = 0x0A;
}

const IDENTITY: [u8; 3] = *b"H43";
/// 8-sample average, 15 Hz, normal measurement
const CONFIG_A_8AVG_15HZ: u8 = 0x70;
/// +/-1.3 Ga
const CONFIG_B_GAIN_1_3GA: u8 = 0x20;
const MODE_CONTINUOUS: u8 = 0x00;
const STATUS_READY: u8 = 0x01;

pub struct Hmc5883l<I2C> {
    i2c: I2C,
    initialized: bool,
}

impl<I2C: I2c> Hmc5883l<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self {
            i2c,
            initialized: false,
        }
    }

    pub fn release(self) -> I2C {
        self.i2c
    }

    fn configure(&mut self) -> Result<bool, I2C::Error> {
        let mut id = [0u8; 3];
        self.i2c.write_read(ADDRESS, &[reg::ID_A], &mut id)?;
        if id != IDENTITY {
            return Ok(false);
        }
        self.i2c.write(ADDRESS, &[reg::CONFIG_A, CONFIG_A_8AVG_15HZ])?;
        self.i2c.write(ADDRESS, &[reg::CONFIG_B, CONFIG_B_GAIN_1_3GA])?;
        self.i2c.write(ADDRESS, &[reg::MODE, MODE_CONTINUOUS])?;
        Ok(true)
    }

    fn sample(&mut self) -> Result<Option<[i16; 3]>, I2C::Error> {
        let mut status = [0u8; 1];
        self.i2c.write_read(ADDRESS, &[reg::STATUS], &mut status)?;
        if status[0] & STATUS_READY == 0 {
            return Ok(None);
        }
        let mut buf = [0u8; 6];
        self.i2c.write_read(ADDRESS, &[reg::DATA_X_H], &mut buf)?;
        let [x, z, y] = super::be_axes(&buf);
        Ok(Some([x, y, z]))
    }
}

impl<I2C: I2c> SensorDevice for Hmc5883l<I2C> {
    fn init(&mut self) -> bool {
        self.initialized = self.configure().unwrap_or(false);
        self.initialized
    }

    fn read(&mut self, raw: &mut [i16; 3]) -> bool {
        if !self.initialized {
            return false;
        }
        match self.sample() {
            Ok(Some(sample)) => {
                *raw = sample;
                true
            }
            _ => false,
        }
    }
}
