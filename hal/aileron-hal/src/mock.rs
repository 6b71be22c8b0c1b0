//! In-memory implementations for host tests
//!
//! [`MockFlash`] keeps the configuration window in RAM and can be told to
//! fail a number of upcoming write attempts or the next finish.

use crate::flash::{ConfigFlash, FlashError, CONFIG_WINDOW_SIZE};
use crate::gpio::OutputPin;

/// Simulated configuration window
///
/// Starts erased (all `0xFF`), like a blank chip.
#[derive(Debug, Clone)]
pub struct MockFlash {
    storage: [u8; CONFIG_WINDOW_SIZE],
    cursor: Option<usize>,
    failing_writes: u8,
    fail_finish: bool,
    /// Number of `begin` calls seen
    pub begin_count: u32,
    /// Number of successful `finish` calls
    pub finish_count: u32,
}

impl MockFlash {
    /// Create a blank window
    pub const fn new() -> Self {
        Self {
            storage: [0xFF; CONFIG_WINDOW_SIZE],
            cursor: None,
            failing_writes: 0,
            fail_finish: false,
            begin_count: 0,
            finish_count: 0,
        }
    }

    /// Create a window preloaded with `image` at offset zero
    pub fn with_image(image: &[u8]) -> Self {
        let mut flash = Self::new();
        let len = image.len().min(CONFIG_WINDOW_SIZE);
        flash.storage[..len].copy_from_slice(&image[..len]);
        flash
    }

    /// Make the next `count` write attempts fail
    ///
    /// A write attempt is one `begin` followed by its stream. The first
    /// `write` of a failing attempt returns [`FlashError::Program`].
    pub fn fail_next_writes(&mut self, count: u8) {
        self.failing_writes = count;
    }

    /// Make the next `finish` fail
    pub fn fail_next_finish(&mut self) {
        self.fail_finish = true;
    }

    /// Raw window contents
    pub fn contents(&self) -> &[u8] {
        &self.storage
    }

    /// Overwrite bytes in place without going through the stream
    pub fn poke(&mut self, offset: usize, bytes: &[u8]) {
        self.storage[offset..offset + bytes.len()].copy_from_slice(bytes);
    }
}

impl Default for MockFlash {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigFlash for MockFlash {
    fn read(&mut self, offset: usize, buf: &mut [u8]) -> Result<(), FlashError> {
        let end = offset.checked_add(buf.len()).ok_or(FlashError::OutOfBounds)?;
        if end > CONFIG_WINDOW_SIZE {
            return Err(FlashError::OutOfBounds);
        }
        buf.copy_from_slice(&self.storage[offset..end]);
        Ok(())
    }

    fn begin(&mut self) -> Result<(), FlashError> {
        self.begin_count += 1;
        self.storage = [0xFF; CONFIG_WINDOW_SIZE];
        self.cursor = Some(0);
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<(), FlashError> {
        let cursor = self.cursor.ok_or(FlashError::NotStarted)?;
        if self.failing_writes > 0 {
            self.failing_writes -= 1;
            self.cursor = None;
            return Err(FlashError::Program);
        }
        let end = cursor + data.len();
        if end > CONFIG_WINDOW_SIZE {
            return Err(FlashError::OutOfBounds);
        }
        self.storage[cursor..end].copy_from_slice(data);
        self.cursor = Some(end);
        Ok(())
    }

    fn finish(&mut self) -> Result<(), FlashError> {
        self.cursor.take().ok_or(FlashError::NotStarted)?;
        if self.fail_finish {
            self.fail_finish = false;
            return Err(FlashError::Program);
        }
        self.finish_count += 1;
        Ok(())
    }
}

/// Output pin that only remembers its level
#[derive(Debug, Clone, Copy, Default)]
pub struct MockPin {
    high: bool,
    /// Number of level changes
    pub transitions: u32,
}

impl MockPin {
    /// Create a pin driven low
    pub const fn new() -> Self {
        Self {
            high: false,
            transitions: 0,
        }
    }
}

impl OutputPin for MockPin {
    fn set_high(&mut self) {
        if !self.high {
            self.transitions += 1;
        }
        self.high = true;
    }

    fn set_low(&mut self) {
        if self.high {
            self.transitions += 1;
        }
        self.high = false;
    }

    fn is_set_high(&self) -> bool {
        self.high
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_window_reads_erased() {
        let mut flash = MockFlash::new();
        let mut buf = [0u8; 4];
        flash.read(0, &mut buf).unwrap();
        assert_eq!(buf, [0xFF; 4]);
    }

    #[test]
    fn test_stream_write() {
        let mut flash = MockFlash::new();
        flash.begin().unwrap();
        flash.write(&[1, 2]).unwrap();
        flash.write(&[3]).unwrap();
        flash.finish().unwrap();
        assert_eq!(&flash.contents()[..4], &[1, 2, 3, 0xFF]);
    }

    #[test]
    fn test_write_without_begin() {
        let mut flash = MockFlash::new();
        assert_eq!(flash.write(&[1]), Err(FlashError::NotStarted));
        assert_eq!(flash.finish(), Err(FlashError::NotStarted));
    }

    #[test]
    fn test_injected_write_failures() {
        let mut flash = MockFlash::new();
        flash.fail_next_writes(2);

        for _ in 0..2 {
            flash.begin().unwrap();
            assert_eq!(flash.write(&[0xAA]), Err(FlashError::Program));
        }

        flash.begin().unwrap();
        flash.write(&[0xAA]).unwrap();
        flash.finish().unwrap();
        assert_eq!(flash.begin_count, 3);
        assert_eq!(flash.finish_count, 1);
    }

    #[test]
    fn test_read_out_of_bounds() {
        let mut flash = MockFlash::new();
        let mut buf = [0u8; 8];
        assert_eq!(
            flash.read(CONFIG_WINDOW_SIZE - 4, &mut buf),
            Err(FlashError::OutOfBounds)
        );
    }

    #[test]
    fn test_pin_toggle() {
        let mut pin = MockPin::new();
        pin.toggle();
        assert!(pin.is_set_high());
        pin.toggle();
        assert!(!pin.is_set_high());
        assert_eq!(pin.transitions, 2);
    }
}
