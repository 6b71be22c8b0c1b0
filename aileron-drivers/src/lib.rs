//! Hardware driver implementations
//!
//! Concrete implementations of the collaborator traits defined in
//! aileron-core and aileron-hal:
//!
//! - Configuration window on any `embedded-storage` NOR flash
//! - MPU-6050 gyroscope and accelerometer over I2C
//! - HMC5883L magnetometer over I2C
//! - Synthetic sensors for bench runs

#![no_std]
#![deny(unsafe_code)]

pub mod flash;
pub mod sensor;
