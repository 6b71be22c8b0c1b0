//! Stored image codec
//!
//! Layout of the configuration window:
//!
//! ```text
//! offset  size  field
//! 0       1     version (EEPROM_CONF_VERSION)
//! 1       2     size, little endian, whole image including this header
//! 3       1     0xBE
//! 4       1     0xEF
//! 5       1     checksum
//! 6       ..    postcard body of MasterConfig
//! ```
//!
//! The checksum byte is chosen so the XOR of every byte of the image is
//! zero. Bytes past `size` are left erased and do not take part.

use aileron_hal::flash::CONFIG_WINDOW_SIZE;
use postcard::experimental::max_size::MaxSize;

use super::master::MasterConfig;

/// Schema tag; any other value forces a reset to defaults
pub const EEPROM_CONF_VERSION: u8 = 117;

pub const MAGIC_BE: u8 = 0xBE;
pub const MAGIC_EF: u8 = 0xEF;

/// Bytes occupied by the header
pub const HEADER_SIZE: usize = 6;

const CHECKSUM_OFFSET: usize = 5;

/// Largest image any record can encode to
pub const MAX_IMAGE_SIZE: usize = HEADER_SIZE + MasterConfig::POSTCARD_MAX_SIZE;

const _: () = assert!(MAX_IMAGE_SIZE <= CONFIG_WINDOW_SIZE);

/// Codec errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EepromError {
    /// Version byte differs from `EEPROM_CONF_VERSION`
    BadVersion,
    /// Size field is outside the window or disagrees with the body
    BadSize,
    /// One of the magic bytes is wrong
    BadMagic,
    /// XOR over the image is not zero
    BadChecksum,
    /// Body did not decode as a record
    Decode,
    /// Record could not be serialized
    Encode,
    /// Encoded record does not fit the window
    TooLarge,
}

/// Parsed image header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ImageHeader {
    pub version: u8,
    pub size: u16,
    pub magic_be: u8,
    pub magic_ef: u8,
    pub checksum: u8,
}

impl ImageHeader {
    /// Read the header fields, without checking them
    pub fn parse(image: &[u8]) -> Option<Self> {
        let bytes = image.get(..HEADER_SIZE)?;
        Some(Self {
            version: bytes[0],
            size: u16::from_le_bytes([bytes[1], bytes[2]]),
            magic_be: bytes[3],
            magic_ef: bytes[4],
            checksum: bytes[CHECKSUM_OFFSET],
        })
    }

    fn write_to(&self, out: &mut [u8]) {
        out[0] = self.version;
        out[1..3].copy_from_slice(&self.size.to_le_bytes());
        out[3] = self.magic_be;
        out[4] = self.magic_ef;
        out[CHECKSUM_OFFSET] = self.checksum;
    }
}

/// XOR of every byte
pub fn xor_checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |acc, b| acc ^ b)
}

/// Validate the header and checksum of `image`
///
/// `image` is the raw window contents; only the first `size` bytes are
/// inspected.
pub fn check_header(image: &[u8]) -> Result<ImageHeader, EepromError> {
    let header = ImageHeader::parse(image).ok_or(EepromError::BadSize)?;

    if header.version != EEPROM_CONF_VERSION {
        return Err(EepromError::BadVersion);
    }

    let size = header.size as usize;
    if size <= HEADER_SIZE || size > image.len() || size > CONFIG_WINDOW_SIZE {
        return Err(EepromError::BadSize);
    }

    if header.magic_be != MAGIC_BE || header.magic_ef != MAGIC_EF {
        return Err(EepromError::BadMagic);
    }

    if xor_checksum(&image[..size]) != 0 {
        return Err(EepromError::BadChecksum);
    }

    Ok(header)
}

/// Decode a stored image into a record
///
/// The body must decode exactly, with no trailing bytes before `size`.
pub fn decode(image: &[u8]) -> Result<MasterConfig, EepromError> {
    let header = check_header(image)?;
    let body = &image[HEADER_SIZE..header.size as usize];

    let (record, rest) =
        postcard::take_from_bytes::<MasterConfig>(body).map_err(|_| EepromError::Decode)?;
    if !rest.is_empty() {
        return Err(EepromError::BadSize);
    }
    if record.version != header.version {
        return Err(EepromError::BadVersion);
    }
    Ok(record)
}

/// True if `image` holds a current, intact record
pub fn is_valid(image: &[u8]) -> bool {
    decode(image).is_ok()
}

/// Stamp `record` and encode it into `out`
///
/// Sets the record's version to the current schema, writes the header
/// with a zeroed checksum, then stores the XOR of the image in the
/// checksum byte. Returns the image length.
pub fn stamp(record: &mut MasterConfig, out: &mut [u8]) -> Result<usize, EepromError> {
    record.version = EEPROM_CONF_VERSION;

    let limit = out.len().min(CONFIG_WINDOW_SIZE);
    if limit <= HEADER_SIZE {
        return Err(EepromError::TooLarge);
    }

    let (head, body) = out[..limit].split_at_mut(HEADER_SIZE);
    let body_len = match postcard::to_slice(record, body) {
        Ok(used) => used.len(),
        Err(postcard::Error::SerializeBufferFull) => return Err(EepromError::TooLarge),
        Err(_) => return Err(EepromError::Encode),
    };
    let size = HEADER_SIZE + body_len;

    ImageHeader {
        version: EEPROM_CONF_VERSION,
        size: size as u16,
        magic_be: MAGIC_BE,
        magic_ef: MAGIC_EF,
        checksum: 0,
    }
    .write_to(head);

    out[CHECKSUM_OFFSET] = xor_checksum(&out[..size]);
    Ok(size)
}
