//! Flash storage abstractions
//!
//! The configuration lives in a single contiguous window reserved by the
//! linker. There is no page table and no secondary slot: the whole window
//! is erased and then programmed as one stream.

/// Bytes reserved for the configuration image
pub const CONFIG_WINDOW_SIZE: usize = 0x800;

/// Errors from flash window operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlashError {
    /// Page erase failed
    Erase,
    /// Programming a word failed
    Program,
    /// Access past the end of the window
    OutOfBounds,
    /// Write or finish issued without a preceding begin
    NotStarted,
}

/// Reserved configuration window
///
/// Writes follow a begin / stream / finish sequence:
/// - `begin` unlocks the controller and erases the window
/// - `write` appends bytes at the stream cursor
/// - `finish` flushes any partial word and relocks
///
/// Implementations must leave erased bytes as `0xFF`.
pub trait ConfigFlash {
    /// Size of the window in bytes
    fn capacity(&self) -> usize {
        CONFIG_WINDOW_SIZE
    }

    /// Read bytes starting at `offset` within the window
    fn read(&mut self, offset: usize, buf: &mut [u8]) -> Result<(), FlashError>;

    /// Start a new write stream at the base of the window
    fn begin(&mut self) -> Result<(), FlashError>;

    /// Append bytes to the current stream
    fn write(&mut self, data: &[u8]) -> Result<(), FlashError>;

    /// Complete the stream
    fn finish(&mut self) -> Result<(), FlashError>;
}

impl<T: ConfigFlash + ?Sized> ConfigFlash for &mut T {
    fn capacity(&self) -> usize {
        (**self).capacity()
    }

    fn read(&mut self, offset: usize, buf: &mut [u8]) -> Result<(), FlashError> {
        (**self).read(offset, buf)
    }

    fn begin(&mut self) -> Result<(), FlashError> {
        (**self).begin()
    }

    fn write(&mut self, data: &[u8]) -> Result<(), FlashError> {
        (**self).write(data)
    }

    fn finish(&mut self) -> Result<(), FlashError> {
        (**self).finish()
    }
}
