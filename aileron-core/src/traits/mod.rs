//! Collaborator traits
//!
//! These traits define the interface between the configuration core and
//! the firmware around it. Everything here is blocking and single
//! threaded.

pub mod indicator;
pub mod motor;
pub mod receiver;
pub mod sensor;

pub use indicator::{Beeper, CalibrationEvent, CalibrationObserver};
pub use motor::MotorOutputs;
pub use receiver::RxSignal;
pub use sensor::SensorDevice;
