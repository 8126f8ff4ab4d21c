#![no_std]

//! Network interface types shared between the MAC emulation core and the UEFI
//! binding. Layouts mirror what Simple Network Protocol firmware reports so the
//! binding can copy fields across without depending on Rust support libraries.

use core::fmt;
use core::str::FromStr;

/// Length of an Ethernet station address in octets.
pub const ETHER_ADDR_LEN: usize = 6;

/// Size of the firmware `EFI_MAC_ADDRESS` buffer.
pub const EFI_MAC_ADDRESS_LEN: usize = 32;

/// A 48-bit Ethernet station address.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct MacAddress(pub [u8; ETHER_ADDR_LEN]);

impl MacAddress {
    /// Widens the address into the zero-padded firmware buffer layout.
    pub fn to_efi_bytes(&self) -> [u8; EFI_MAC_ADDRESS_LEN] {
        let mut buffer = [0u8; EFI_MAC_ADDRESS_LEN];
        buffer[..ETHER_ADDR_LEN].copy_from_slice(&self.0);
        buffer
    }

    /// Reads the Ethernet-significant prefix of a firmware address buffer.
    pub fn from_efi_bytes(buffer: &[u8; EFI_MAC_ADDRESS_LEN]) -> Self {
        let mut octets = [0u8; ETHER_ADDR_LEN];
        octets.copy_from_slice(&buffer[..ETHER_ADDR_LEN]);
        Self(octets)
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02X}:{b:02X}:{c:02X}:{d:02X}:{e:02X}:{g:02X}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMacError {
    /// The text did not contain exactly six octets.
    Length,
    /// An octet was not two hexadecimal digits.
    Octet,
    /// Separators were missing or not all the same.
    Separator,
}

impl fmt::Display for ParseMacError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::Length => "expected six octets",
            Self::Octet => "octet is not two hex digits",
            Self::Separator => "octets must be separated by ':' or '-' consistently",
        };
        f.write_str(msg)
    }
}

impl FromStr for MacAddress {
    type Err = ParseMacError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let text = text.trim();
        let separator = match text.find(|c: char| c == ':' || c == '-') {
            Some(idx) => text.as_bytes()[idx] as char,
            None => return Err(ParseMacError::Separator),
        };

        let mut octets = [0u8; ETHER_ADDR_LEN];
        let mut count = 0;
        for part in text.split(separator) {
            if count == ETHER_ADDR_LEN {
                return Err(ParseMacError::Length);
            }
            if part.contains(|c: char| c == ':' || c == '-') {
                return Err(ParseMacError::Separator);
            }
            if part.len() != 2 || !part.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(ParseMacError::Octet);
            }
            octets[count] = u8::from_str_radix(part, 16).map_err(|_| ParseMacError::Octet)?;
            count += 1;
        }

        if count != ETHER_ADDR_LEN {
            return Err(ParseMacError::Length);
        }
        Ok(Self(octets))
    }
}

/// Lifecycle state of a Simple Network Protocol instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Stopped,
    Started,
    Initialized,
    /// A raw value outside the states firmware defines.
    Unknown(u32),
}

impl LinkState {
    pub const fn from_raw(raw: u32) -> Self {
        match raw {
            0 => Self::Stopped,
            1 => Self::Started,
            2 => Self::Initialized,
            other => Self::Unknown(other),
        }
    }
}

/// IANA interface type byte reported by the interface.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterfaceType(pub u8);

impl InterfaceType {
    pub const ETHERNET: Self = Self(0x01);
}

/// Read-only view of an interface's mode data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterfaceMode {
    pub state: LinkState,
    pub if_type: InterfaceType,
    pub address_changeable: bool,
    pub permanent_address: MacAddress,
    pub current_address: MacAddress,
}

/// UEFI-style status word. The high bit marks an error.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirmwareStatus(pub usize);

const ERROR_BIT: usize = 1 << (usize::BITS - 1);

impl FirmwareStatus {
    pub const SUCCESS: Self = Self(0);
    pub const INVALID_PARAMETER: Self = Self(ERROR_BIT | 2);
    pub const UNSUPPORTED: Self = Self(ERROR_BIT | 3);
    pub const DEVICE_ERROR: Self = Self(ERROR_BIT | 7);
    pub const OUT_OF_RESOURCES: Self = Self(ERROR_BIT | 9);
    pub const NOT_FOUND: Self = Self(ERROR_BIT | 14);
    pub const NOT_STARTED: Self = Self(ERROR_BIT | 19);
    pub const ALREADY_STARTED: Self = Self(ERROR_BIT | 20);

    pub const fn is_error(&self) -> bool {
        self.0 & ERROR_BIT != 0
    }
}

impl fmt::Display for FirmwareStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match *self {
            Self::SUCCESS => "Success",
            Self::INVALID_PARAMETER => "Invalid Parameter",
            Self::UNSUPPORTED => "Unsupported",
            Self::DEVICE_ERROR => "Device Error",
            Self::OUT_OF_RESOURCES => "Out of Resources",
            Self::NOT_FOUND => "Not Found",
            Self::NOT_STARTED => "Not Started",
            Self::ALREADY_STARTED => "Already Started",
            other => return write!(f, "Status({:#x})", other.0),
        };
        f.write_str(name)
    }
}

/// Task priority levels in ascending order.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TaskPriorityLevel(pub usize);

impl TaskPriorityLevel {
    pub const APPLICATION: Self = Self(4);
    pub const CALLBACK: Self = Self(8);
    pub const NOTIFY: Self = Self(16);
    pub const HIGH_LEVEL: Self = Self(31);
}

/// Lifecycle signals the driver can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Raised by an SNP driver each time an interface completes `Initialize()`.
    InterfaceInitialized,
}
