//! Decides whether a network interface may receive the emulated address.

use log::{debug, warn};
use snpproto::{InterfaceMode, InterfaceType, LinkState};

use crate::context::AssignmentContext;
use crate::services::PlatformPolicy;

/// An interface handle paired with the mode data read from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate<H> {
    pub handle: H,
    pub mode: InterfaceMode,
}

/// Pluggable eligibility policy consulted by the scanner.
pub trait Eligibility<H> {
    fn evaluate(&self, candidate: &Candidate<H>, context: Option<&AssignmentContext>) -> bool;
}

/// The predicate that rejected a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    MissingContext,
    NotInitialized(LinkState),
    NotEthernet(InterfaceType),
    AddressFixed,
    PlatformDeclined,
    /// Emulation already belongs to a device with a different permanent address.
    AssignedElsewhere,
}

/// Default policy: an initialized, programmable Ethernet interface approved by
/// the platform, and only the previously assigned device once emulation is in
/// place.
pub struct SupportsEmulation<'p, P> {
    platform: &'p P,
}

impl<'p, P> SupportsEmulation<'p, P> {
    pub const fn new(platform: &'p P) -> Self {
        Self { platform }
    }

    /// Runs every predicate in order and reports the first one that fails.
    pub fn check<H>(
        &self,
        candidate: &Candidate<H>,
        context: Option<&AssignmentContext>,
    ) -> Result<(), Rejection>
    where
        H: Copy,
        P: PlatformPolicy<H>,
    {
        let context = context.ok_or(Rejection::MissingContext)?;
        let mode = &candidate.mode;

        if mode.state != LinkState::Initialized {
            return Err(Rejection::NotInitialized(mode.state));
        }
        if mode.if_type != InterfaceType::ETHERNET {
            return Err(Rejection::NotEthernet(mode.if_type));
        }
        if !mode.address_changeable {
            return Err(Rejection::AddressFixed);
        }
        if !self.platform.approves_device(candidate.handle) {
            return Err(Rejection::PlatformDeclined);
        }
        match context.permanent_address() {
            Some(owner) if *owner != mode.permanent_address => Err(Rejection::AssignedElsewhere),
            _ => Ok(()),
        }
    }
}

impl<'p, H, P> Eligibility<H> for SupportsEmulation<'p, P>
where
    H: Copy + core::fmt::Debug,
    P: PlatformPolicy<H>,
{
    fn evaluate(&self, candidate: &Candidate<H>, context: Option<&AssignmentContext>) -> bool {
        let handle = candidate.handle;
        match self.check(candidate, context) {
            Ok(()) => true,
            Err(Rejection::MissingContext) => false,
            Err(Rejection::NotInitialized(state)) => {
                warn!("SNP {handle:?} in unexpected state {state:?}, cannot update MAC");
                false
            }
            Err(Rejection::NotEthernet(if_type)) => {
                warn!("SNP {handle:?} interface type {:#x} is not Ethernet", if_type.0);
                false
            }
            Err(Rejection::AddressFixed) => {
                warn!("SNP {handle:?} does not support MAC address programming");
                false
            }
            Err(Rejection::PlatformDeclined) => {
                warn!("platform does not support emulation on SNP {handle:?}");
                false
            }
            Err(Rejection::AssignedElsewhere) => {
                debug!("SNP {handle:?} is not the interface already carrying the emulated MAC");
                false
            }
        }
    }
}
