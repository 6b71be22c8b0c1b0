//! Configuration and calibration core for Aileron flight controllers
//!
//! Everything here is board-agnostic and runs on the host:
//!
//! - Master configuration record, factory defaults and board table
//! - Flash image codec and the store that persists the record
//! - Feature compatibility validation
//! - Runtime views rebuilt on activation (curves, filters, alignment)
//! - Gyro, accelerometer and magnetometer calibration engines
//! - Sensor pipelines feeding those engines
//! - Collaborator traits for beeper, receiver, motors and sensors

#![no_std]
#![deny(unsafe_code)]

#[macro_use]
mod log;

pub mod calibration;
pub mod config;
pub mod runtime;
pub mod sensors;
pub mod state;
pub mod traits;
