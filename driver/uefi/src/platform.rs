use core::fmt::Debug;

use emulation::PlatformPolicy;
use log::{info, warn};
use snpproto::{FirmwareStatus, MacAddress};

use crate::config::PlatformConfig;

/// Platform policy backed by [`PlatformConfig`].
#[derive(Debug, Clone)]
pub struct ConfiguredPlatform {
    config: PlatformConfig,
}

impl ConfiguredPlatform {
    pub const fn new(config: PlatformConfig) -> Self {
        Self { config }
    }
}

impl<H: Debug> PlatformPolicy<H> for ConfiguredPlatform {
    fn emulation_address(&self) -> Result<MacAddress, FirmwareStatus> {
        self.config.address.ok_or(FirmwareStatus::UNSUPPORTED)
    }

    fn approves_device(&self, handle: H) -> bool {
        if !self.config.approve_devices {
            warn!("platform configuration denies emulation on {handle:?}");
        }
        self.config.approve_devices
    }

    fn enable(&mut self, address: &MacAddress) -> Result<(), FirmwareStatus> {
        info!("platform MAC emulation enabled for {address}");
        Ok(())
    }
}
