//! Configuration window on a NOR flash device
//!
//! Adapts any `embedded_storage` [`NorFlash`] to [`ConfigFlash`]. The
//! window starts at `base` and spans [`CONFIG_WINDOW_SIZE`] bytes rounded
//! up to whole erase sectors. Streamed bytes are staged until a full
//! write unit is available; `finish` pads the last unit with `0xFF`.

use aileron_hal::flash::{ConfigFlash, FlashError, CONFIG_WINDOW_SIZE};
use embedded_storage::nor_flash::{NorFlash, NorFlashError, NorFlashErrorKind};
use heapless::Vec;

/// Largest device write unit the staging buffer can hold
pub const MAX_WRITE_SIZE: usize = 32;

fn map_error<E: NorFlashError>(err: E, fallback: FlashError) -> FlashError {
    match err.kind() {
        NorFlashErrorKind::OutOfBounds => FlashError::OutOfBounds,
        _ => fallback,
    }
}

pub struct NorFlashWindow<F> {
    flash: F,
    base: u32,
    /// Next device offset to program, relative to `base`
    cursor: Option<u32>,
    pending: Vec<u8, MAX_WRITE_SIZE>,
}

impl<F: NorFlash> NorFlashWindow<F> {
    /// Window starting at `base`
    ///
    /// `base` must sit on an erase sector boundary and the device write
    /// unit must not exceed [`MAX_WRITE_SIZE`].
    pub fn new(flash: F, base: u32) -> Result<Self, FlashError> {
        if F::WRITE_SIZE > MAX_WRITE_SIZE || base as usize % F::ERASE_SIZE != 0 {
            return Err(FlashError::OutOfBounds);
        }
        let end = base as usize + Self::erase_span();
        if end > flash.capacity() {
            return Err(FlashError::OutOfBounds);
        }

        Ok(Self {
            flash,
            base,
            cursor: None,
            pending: Vec::new(),
        })
    }

    /// Bytes erased by `begin`
    fn erase_span() -> usize {
        CONFIG_WINDOW_SIZE.div_ceil(F::ERASE_SIZE) * F::ERASE_SIZE
    }

    pub fn release(self) -> F {
        self.flash
    }

    fn flush(&mut self, cursor: u32) -> Result<u32, FlashError> {
        if cursor as usize + self.pending.len() > CONFIG_WINDOW_SIZE {
            return Err(FlashError::OutOfBounds);
        }
        self.flash
            .write(self.base + cursor, &self.pending)
            .map_err(|e| map_error(e, FlashError::Program))?;
        let next = cursor + self.pending.len() as u32;
        self.pending.clear();
        Ok(next)
    }
}

impl<F: NorFlash> ConfigFlash for NorFlashWindow<F> {
    fn read(&mut self, offset: usize, buf: &mut [u8]) -> Result<(), FlashError> {
        let end = offset.checked_add(buf.len()).ok_or(FlashError::OutOfBounds)?;
        if end > CONFIG_WINDOW_SIZE {
            return Err(FlashError::OutOfBounds);
        }
        self.flash
            .read(self.base + offset as u32, buf)
            .map_err(|e| map_error(e, FlashError::OutOfBounds))
    }

    fn begin(&mut self) -> Result<(), FlashError> {
        self.cursor = None;
        self.pending.clear();
        let end = self.base + Self::erase_span() as u32;
        self.flash
            .erase(self.base, end)
            .map_err(|e| map_error(e, FlashError::Erase))?;
        self.cursor = Some(0);
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<(), FlashError> {
        let mut cursor = self.cursor.ok_or(FlashError::NotStarted)?;
        for &byte in data {
            // capacity is at least WRITE_SIZE, checked in new()
            let _ = self.pending.push(byte);
            if self.pending.len() == F::WRITE_SIZE {
                cursor = match self.flush(cursor) {
                    Ok(next) => next,
                    Err(err) => {
                        self.cursor = None;
                        return Err(err);
                    }
                };
            }
        }
        self.cursor = Some(cursor);
        Ok(())
    }

    fn finish(&mut self) -> Result<(), FlashError> {
        let cursor = self.cursor.take().ok_or(FlashError::NotStarted)?;
        if self.pending.is_empty() {
            return Ok(());
        }
        while self.pending.len() < F::WRITE_SIZE {
            let _ = self.pending.push(0xFF);
        }
        self.flush(cursor).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_storage::nor_flash::{ErrorType, ReadNorFlash};

    const SECTOR: usize = 1024;
    const CAPACITY: usize = 4 * SECTOR;

    /// RAM-backed NOR part with 4-byte program units
    struct RamNor {
        cells: [u8; CAPACITY],
        writes: u32,
    }

    impl RamNor {
        fn new() -> Self {
            Self {
                cells: [0x00; CAPACITY],
                writes: 0,
            }
        }
    }

    impl ErrorType for RamNor {
        type Error = NorFlashErrorKind;
    }

    impl ReadNorFlash for RamNor {
        const READ_SIZE: usize = 1;

        fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
            let start = offset as usize;
            let end = start + bytes.len();
            if end > CAPACITY {
                return Err(NorFlashErrorKind::OutOfBounds);
            }
            bytes.copy_from_slice(&self.cells[start..end]);
            Ok(())
        }

        fn capacity(&self) -> usize {
            CAPACITY
        }
    }

    impl NorFlash for RamNor {
        const WRITE_SIZE: usize = 4;
        const ERASE_SIZE: usize = SECTOR;

        fn erase(&mut self, from: u32, to: u32) -> Result<(), Self::Error> {
            let (from, to) = (from as usize, to as usize);
            if from % SECTOR != 0 || to % SECTOR != 0 {
                return Err(NorFlashErrorKind::NotAligned);
            }
            if to > CAPACITY {
                return Err(NorFlashErrorKind::OutOfBounds);
            }
            self.cells[from..to].fill(0xFF);
            Ok(())
        }

        fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
            let start = offset as usize;
            if start % 4 != 0 || bytes.len() % 4 != 0 {
                return Err(NorFlashErrorKind::NotAligned);
            }
            if start + bytes.len() > CAPACITY {
                return Err(NorFlashErrorKind::OutOfBounds);
            }
            for (cell, byte) in self.cells[start..].iter_mut().zip(bytes) {
                *cell &= *byte;
            }
            self.writes += 1;
            Ok(())
        }
    }

    #[test]
    fn test_stream_is_staged_to_write_units() {
        let mut window = NorFlashWindow::new(RamNor::new(), 2 * SECTOR as u32).unwrap();
        window.begin().unwrap();
        window.write(&[1, 2, 3]).unwrap();
        window.write(&[4, 5, 6, 7, 8, 9]).unwrap();
        window.finish().unwrap();

        let mut buf = [0u8; 12];
        window.read(0, &mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3, 4, 5, 6, 7, 8, 9, 0xFF, 0xFF, 0xFF]);

        let nor = window.release();
        assert_eq!(nor.writes, 3);
        // sector before the window is untouched
        assert_eq!(nor.cells[SECTOR], 0x00);
    }

    #[test]
    fn test_begin_erases_whole_window() {
        let mut window = NorFlashWindow::new(RamNor::new(), 0).unwrap();
        window.begin().unwrap();
        window.finish().unwrap();

        let mut buf = [0u8; CONFIG_WINDOW_SIZE];
        window.read(0, &mut buf).unwrap();
        assert!(buf.iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_rejects_bad_placement() {
        assert_eq!(
            NorFlashWindow::new(RamNor::new(), 100).err(),
            Some(FlashError::OutOfBounds)
        );
        assert_eq!(
            NorFlashWindow::new(RamNor::new(), 3 * SECTOR as u32).err(),
            Some(FlashError::OutOfBounds)
        );
    }

    #[test]
    fn test_write_needs_begin() {
        let mut window = NorFlashWindow::new(RamNor::new(), 0).unwrap();
        assert_eq!(window.write(&[1]), Err(FlashError::NotStarted));
        assert_eq!(window.finish(), Err(FlashError::NotStarted));
    }

    #[test]
    fn test_stream_past_window() {
        let mut window = NorFlashWindow::new(RamNor::new(), 0).unwrap();
        window.begin().unwrap();
        let chunk = [0u8; 256];
        for _ in 0..CONFIG_WINDOW_SIZE / chunk.len() {
            window.write(&chunk).unwrap();
        }
        assert_eq!(window.write(&[0; 4]), Err(FlashError::OutOfBounds));
    }

    #[test]
    fn test_read_past_window() {
        let mut window = NorFlashWindow::new(RamNor::new(), 0).unwrap();
        let mut buf = [0u8; 4];
        assert_eq!(
            window.read(CONFIG_WINDOW_SIZE - 2, &mut buf),
            Err(FlashError::OutOfBounds)
        );
    }
}
