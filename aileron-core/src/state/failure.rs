//! Fatal failure modes
//!
//! Entering one of these is one-way: the firmware stops flying and
//! blinks the code until power is removed.

/// Unrecoverable conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FailureMode {
    /// Stored image failed validation on the read path
    InvalidEepromContents,
    /// Written image did not verify
    FlashWriteFailed,
}

impl FailureMode {
    /// Numeric code reported by the status LED
    pub const fn code(self) -> u8 {
        match self {
            FailureMode::InvalidEepromContents => 4,
            FailureMode::FlashWriteFailed => 10,
        }
    }
}
