//! Build-time platform configuration for MAC emulation.
//!
//! `MAC_EMULATION_ADDRESS` selects the emulated address (`AA:BB:CC:DD:EE:FF`);
//! leaving it unset disables emulation. `MAC_EMULATION_EVENT_GUID` names the
//! event the platform's SNP driver signals after initializing an interface
//! and is required alongside the address. `MAC_EMULATION_APPROVE_DEVICES=0`
//! keeps emulation enabled for the platform but approves no interface.

use log::{error, warn};
use snpproto::MacAddress;

/// A GUID in the firmware's in-memory byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventGuid([u8; 16]);

impl EventGuid {
    /// Parses the registry form `xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx`.
    pub fn parse(text: &str) -> Option<Self> {
        const GROUPS: [usize; 5] = [8, 4, 4, 4, 12];
        let mut bytes = [0u8; 16];
        let mut filled = 0;
        let mut groups = text.trim().split('-');
        for len in GROUPS {
            let group = groups.next()?;
            if group.len() != len || !group.bytes().all(|b| b.is_ascii_hexdigit()) {
                return None;
            }
            for pair in group.as_bytes().chunks(2) {
                let pair = core::str::from_utf8(pair).ok()?;
                bytes[filled] = u8::from_str_radix(pair, 16).ok()?;
                filled += 1;
            }
        }
        if groups.next().is_some() {
            return None;
        }
        // The first three fields are stored little-endian.
        bytes[..4].reverse();
        bytes[4..6].reverse();
        bytes[6..8].reverse();
        Some(Self(bytes))
    }

    pub const fn to_bytes(self) -> [u8; 16] {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformConfig {
    pub address: Option<MacAddress>,
    pub event_guid: Option<EventGuid>,
    pub approve_devices: bool,
}

impl PlatformConfig {
    pub const DISABLED: Self = Self {
        address: None,
        event_guid: None,
        approve_devices: true,
    };

    /// Reads the values baked in when the image was built.
    pub fn from_build_env() -> Self {
        Self::from_env_values(
            option_env!("MAC_EMULATION_ADDRESS"),
            option_env!("MAC_EMULATION_EVENT_GUID"),
            option_env!("MAC_EMULATION_APPROVE_DEVICES"),
        )
    }

    pub fn from_env_values(
        address: Option<&str>,
        event_guid: Option<&str>,
        approve_devices: Option<&str>,
    ) -> Self {
        let event_guid = match event_guid.map(str::trim) {
            None | Some("") => None,
            Some(text) => {
                let guid = EventGuid::parse(text);
                if guid.is_none() {
                    error!("invalid MAC_EMULATION_EVENT_GUID {text:?}");
                }
                guid
            }
        };

        let address = match address.map(str::trim) {
            None | Some("") => None,
            Some(text) => match text.parse::<MacAddress>() {
                Ok(address) => Some(address),
                Err(err) => {
                    error!("invalid MAC_EMULATION_ADDRESS {text:?}: {err}");
                    None
                }
            },
        };
        let address = match (address, event_guid) {
            (Some(address), None) => {
                error!("MAC_EMULATION_ADDRESS {address} set without MAC_EMULATION_EVENT_GUID");
                None
            }
            (address, _) => address,
        };

        let approve_devices = match approve_devices {
            None => true,
            Some(value) => parse_flag(value).unwrap_or_else(|| {
                warn!("unrecognized MAC_EMULATION_APPROVE_DEVICES {value:?}, approving devices");
                true
            }),
        };

        Self {
            address,
            event_guid,
            approve_devices,
        }
    }
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self::DISABLED
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    let value = value.trim();
    const TRUE: [&str; 4] = ["1", "true", "yes", "on"];
    const FALSE: [&str; 4] = ["0", "false", "no", "off"];
    if TRUE.iter().any(|t| value.eq_ignore_ascii_case(t)) {
        Some(true)
    } else if FALSE.iter().any(|f| value.eq_ignore_ascii_case(f)) {
        Some(false)
    } else {
        None
    }
}
