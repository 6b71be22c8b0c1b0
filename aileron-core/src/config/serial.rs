//! Serial port assignment table
//!
//! Each physical port carries a set of functions. MSP must be reachable
//! somewhere; it is the only function that may share a port, and only
//! with one telemetry protocol or the flight recorder.

use bitflags::bitflags;
use postcard::experimental::max_size::MaxSize;
use serde::{Deserialize, Serialize};

use super::board::BoardDescriptor;

/// Ports tracked in the table
pub const MAX_SERIAL_PORT_COUNT: usize = 5;

/// Ports that may carry MSP at the same time
pub const MAX_MSP_PORT_COUNT: u32 = 2;

/// Character that reboots the board into the bootloader over MSP
pub const DEFAULT_REBOOT_CHARACTER: u8 = b'R';

bitflags! {
    /// Functions a serial port can serve
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct SerialFunction: u16 {
        const MSP = 1 << 0;
        const GPS = 1 << 1;
        const TELEMETRY_FRSKY = 1 << 2;
        const TELEMETRY_HOTT = 1 << 3;
        const TELEMETRY_MSP = 1 << 4;
        const TELEMETRY_SMARTPORT = 1 << 5;
        const RX_SERIAL = 1 << 6;
        const BLACKBOX = 1 << 7;

        /// Telemetry protocols that can ride along with MSP
        const ALL_TELEMETRY = Self::TELEMETRY_FRSKY.bits()
            | Self::TELEMETRY_HOTT.bits()
            | Self::TELEMETRY_SMARTPORT.bits();
        /// Everything MSP may share a port with
        const SHARABLE_WITH_MSP = Self::ALL_TELEMETRY.bits() | Self::BLACKBOX.bits();
        /// Functions at most one port may claim
        const EXCLUSIVE = Self::GPS.bits() | Self::RX_SERIAL.bits() | Self::BLACKBOX.bits();
    }
}

impl MaxSize for SerialFunction {
    const POSTCARD_MAX_SIZE: usize = u16::POSTCARD_MAX_SIZE;
}

#[cfg(feature = "defmt")]
impl defmt::Format for SerialFunction {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "SerialFunction({=u16:#x})", self.bits())
    }
}

/// Physical port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SerialPortIdentifier {
    Usart1,
    Usart2,
    Usart3,
    Usart4,
    Usart5,
    UsbVcp,
    SoftSerial1,
    SoftSerial2,
}

/// Baud rate table index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BaudRate {
    #[default]
    Auto,
    B9600,
    B19200,
    B38400,
    B57600,
    B115200,
    B230400,
    B250000,
}

impl BaudRate {
    /// Rate in bits per second, `None` for auto-detect
    pub const fn bps(self) -> Option<u32> {
        match self {
            BaudRate::Auto => None,
            BaudRate::B9600 => Some(9_600),
            BaudRate::B19200 => Some(19_200),
            BaudRate::B38400 => Some(38_400),
            BaudRate::B57600 => Some(57_600),
            BaudRate::B115200 => Some(115_200),
            BaudRate::B230400 => Some(230_400),
            BaudRate::B250000 => Some(250_000),
        }
    }
}

/// Assignment for one port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SerialPortConfig {
    /// Port this slot describes, `None` for an unused slot
    pub identifier: Option<SerialPortIdentifier>,
    pub function_mask: SerialFunction,
    pub msp_baudrate: BaudRate,
    pub gps_baudrate: BaudRate,
    pub telemetry_baudrate: BaudRate,
    pub blackbox_baudrate: BaudRate,
}

impl SerialPortConfig {
    /// Unassigned port with the factory baud rates
    pub const fn new(identifier: SerialPortIdentifier) -> Self {
        Self {
            identifier: Some(identifier),
            function_mask: SerialFunction::empty(),
            msp_baudrate: BaudRate::B115200,
            gps_baudrate: BaudRate::B38400,
            telemetry_baudrate: BaudRate::Auto,
            blackbox_baudrate: BaudRate::B115200,
        }
    }
}

/// Serial port table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SerialConfig {
    pub ports: [SerialPortConfig; MAX_SERIAL_PORT_COUNT],
    pub reboot_character: u8,
}

impl SerialConfig {
    /// Factory table for a board
    pub fn for_board(board: &BoardDescriptor) -> Self {
        let mut ports = [SerialPortConfig::default(); MAX_SERIAL_PORT_COUNT];
        for (slot, &identifier) in ports.iter_mut().zip(board.serial_ports) {
            *slot = SerialPortConfig::new(identifier);
        }
        for &index in board.msp_ports {
            if let Some(port) = ports.get_mut(index) {
                port.function_mask = SerialFunction::MSP;
            }
        }

        Self {
            ports,
            reboot_character: DEFAULT_REBOOT_CHARACTER,
        }
    }

    /// Configured slot for a physical port
    pub fn find(&self, identifier: SerialPortIdentifier) -> Option<&SerialPortConfig> {
        self.ports
            .iter()
            .find(|port| port.identifier == Some(identifier))
    }

    /// True when the port exists and serves at least one function
    pub fn uses_port(&self, identifier: SerialPortIdentifier) -> bool {
        self.find(identifier)
            .is_some_and(|port| !port.function_mask.is_empty())
    }

    /// Check the sharing rules
    ///
    /// - one to [`MAX_MSP_PORT_COUNT`] ports carry MSP
    /// - a shared port carries exactly MSP plus one sharable function
    /// - GPS, serial RX and blackbox each appear on at most one port
    pub fn is_valid(&self) -> bool {
        let mut msp_ports = 0;
        let mut claimed = SerialFunction::empty();

        for port in &self.ports {
            let mask = port.function_mask;
            if mask.contains(SerialFunction::MSP) {
                msp_ports += 1;
            }

            match mask.bits().count_ones() {
                0 | 1 => {}
                2 => {
                    if !mask.contains(SerialFunction::MSP)
                        || !mask.intersects(SerialFunction::SHARABLE_WITH_MSP)
                    {
                        return false;
                    }
                }
                _ => return false,
            }

            let exclusive = mask & SerialFunction::EXCLUSIVE;
            if claimed.intersects(exclusive) {
                return false;
            }
            claimed |= exclusive;
        }

        (1..=MAX_MSP_PORT_COUNT).contains(&msp_ports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::board::BoardId;

    fn config() -> SerialConfig {
        SerialConfig::for_board(BoardId::Naze.descriptor())
    }

    #[test]
    fn test_factory_table_valid() {
        let serial = config();
        assert!(serial.is_valid());
        assert_eq!(serial.ports[0].function_mask, SerialFunction::MSP);
        assert_eq!(serial.ports[0].msp_baudrate, BaudRate::B115200);
        assert_eq!(serial.ports[0].gps_baudrate, BaudRate::B38400);
        assert_eq!(serial.reboot_character, b'R');
    }

    #[test]
    fn test_cc3d_has_two_msp_ports() {
        let serial = SerialConfig::for_board(BoardId::Cc3d.descriptor());
        assert_eq!(serial.ports[1].function_mask, SerialFunction::MSP);
        assert!(serial.is_valid());
    }

    #[test]
    fn test_no_msp_invalid() {
        let mut serial = config();
        serial.ports[0].function_mask = SerialFunction::GPS;
        assert!(!serial.is_valid());
    }

    #[test]
    fn test_msp_sharing_rules() {
        let mut serial = config();
        serial.ports[0].function_mask = SerialFunction::MSP | SerialFunction::TELEMETRY_FRSKY;
        assert!(serial.is_valid());

        serial.ports[0].function_mask = SerialFunction::MSP | SerialFunction::GPS;
        assert!(!serial.is_valid());

        serial.ports[0].function_mask =
            SerialFunction::MSP | SerialFunction::BLACKBOX | SerialFunction::TELEMETRY_HOTT;
        assert!(!serial.is_valid());
    }

    #[test]
    fn test_exclusive_function_on_two_ports() {
        let mut serial = config();
        serial.ports[1].function_mask = SerialFunction::RX_SERIAL;
        assert!(serial.is_valid());
        serial.ports[2].function_mask = SerialFunction::RX_SERIAL;
        assert!(!serial.is_valid());
    }

    #[test]
    fn test_uses_port() {
        let mut serial = config();
        assert!(serial.uses_port(SerialPortIdentifier::Usart1));
        assert!(!serial.uses_port(SerialPortIdentifier::Usart3));
        serial.ports[2].function_mask = SerialFunction::GPS;
        assert!(serial.uses_port(SerialPortIdentifier::Usart3));
    }
}
