//! Aileron Hardware Abstraction Layer
//!
//! This crate defines the hardware seams the configuration core talks
//! through. Chip-specific crates implement them; the core never touches
//! registers directly.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  aileron-core (config, calibration)     │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  aileron-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ aileron-      │       │ mock (host    │
//! │ drivers       │       │ tests)        │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`] - Indicator LED
//! - [`flash::ConfigFlash`] - Reserved configuration window in flash

#![no_std]
#![deny(unsafe_code)]

pub mod flash;
pub mod gpio;
#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export key traits at crate root for convenience
pub use flash::{ConfigFlash, FlashError, CONFIG_WINDOW_SIZE};
pub use gpio::OutputPin;
