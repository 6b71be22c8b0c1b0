//! Configuration window backends

pub mod nor;

pub use nor::{NorFlashWindow, MAX_WRITE_SIZE};
