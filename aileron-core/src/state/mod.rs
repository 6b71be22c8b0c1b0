//! System state shared with the flight loop

pub mod failure;
pub mod flags;

pub use failure::FailureMode;
pub use flags::StateFlags;
