//! Driver entry sequencing and the per-event notification handler.

use core::fmt;

use log::{error, info, trace};
use snpproto::{EventKind, FirmwareStatus, MacAddress, TaskPriorityLevel};

use crate::assigner::assign;
use crate::context::AssignmentContext;
use crate::eligibility::SupportsEmulation;
use crate::scanner::find_first;
use crate::services::{
    DeviceRegistry, EventService, GlobalPool, Notify, PlatformPolicy, PoolAllocator, TaskPriority,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// Emulation has not been checked yet, or setup failed.
    Unarmed,
    /// Context allocated and the interface listener installed.
    Armed,
    /// The platform declined emulation; nothing further will happen.
    Inactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartError {
    /// The platform does not enable emulation. Not a failure.
    Declined,
    Policy(FirmwareStatus),
    OutOfResources,
    PlatformEnable(FirmwareStatus),
    AlreadyStarted,
}

impl StartError {
    /// Status reported to the image loader.
    pub fn status(&self) -> FirmwareStatus {
        match self {
            Self::Declined => FirmwareStatus::UNSUPPORTED,
            Self::Policy(status) | Self::PlatformEnable(status) => *status,
            Self::OutOfResources => FirmwareStatus::OUT_OF_RESOURCES,
            Self::AlreadyStarted => FirmwareStatus::ALREADY_STARTED,
        }
    }
}

impl fmt::Display for StartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Declined => f.write_str("MAC emulation not enabled by platform"),
            Self::Policy(status) => {
                write!(f, "failed to determine MAC emulation support: {status}")
            }
            Self::OutOfResources => f.write_str("cannot allocate notify context"),
            Self::PlatformEnable(status) => {
                write!(f, "platform MAC emulation enablement failed: {status}")
            }
            Self::AlreadyStarted => f.write_str("driver already started"),
        }
    }
}

/// MAC emulation driver lifecycle. State that outlives `start` comes from
/// `A`, the boot-services pool by default.
pub struct Driver<A = GlobalPool> {
    state: DriverState,
    pool: A,
}

impl Driver {
    pub const fn new() -> Self {
        Self::with_pool(GlobalPool)
    }
}

impl<A: PoolAllocator> Driver<A> {
    pub const fn with_pool(pool: A) -> Self {
        Self {
            state: DriverState::Unarmed,
            pool,
        }
    }

    pub const fn state(&self) -> DriverState {
        self.state
    }

    /// Checks platform enablement and, when enabled, arms the interface
    /// listener. Listener registration failures are logged but do not fail the
    /// start since the platform may have installed its own mechanism.
    pub fn start<P, R, T, E>(
        &mut self,
        platform: P,
        registry: R,
        priority: T,
        events: &mut E,
    ) -> Result<(), StartError>
    where
        P: PlatformPolicy<R::Handle> + 'static,
        R: DeviceRegistry + 'static,
        T: TaskPriority + 'static,
        E: EventService + ?Sized,
    {
        if self.state != DriverState::Unarmed {
            return Err(StartError::AlreadyStarted);
        }

        let address = match platform.emulation_address() {
            Ok(address) => address,
            Err(FirmwareStatus::UNSUPPORTED) => {
                info!("MAC emulation not enabled by platform");
                self.state = DriverState::Inactive;
                return Err(StartError::Declined);
            }
            Err(status) => {
                error!("failed to determine MAC emulation support: {status}");
                return Err(StartError::Policy(status));
            }
        };

        let notifier = Notifier::new(address, platform, registry, priority);
        let Some(mut notifier) = self.pool.try_box(notifier) else {
            error!("cannot allocate notify context");
            return Err(StartError::OutOfResources);
        };

        if let Err(status) = notifier.platform.enable(&address) {
            error!("failed platform initialization of MAC emulation: {status}");
            return Err(StartError::PlatformEnable(status));
        }

        let listen = events.listen(
            EventKind::InterfaceInitialized,
            TaskPriorityLevel::NOTIFY,
            notifier,
        );
        if let Err(status) = listen {
            error!("failed to listen for SNP initialization events: {status}");
        }

        info!("MAC emulation armed with {address}");
        self.state = DriverState::Armed;
        Ok(())
    }
}

impl Default for Driver {
    fn default() -> Self {
        Self::new()
    }
}

/// Owns the assignment state for the life of boot services and runs one
/// scan-then-assign pass per interface initialization.
pub struct Notifier<P, R, T> {
    context: AssignmentContext,
    platform: P,
    registry: R,
    priority: T,
}

impl<P, R, T> Notifier<P, R, T>
where
    P: PlatformPolicy<R::Handle>,
    R: DeviceRegistry,
    T: TaskPriority,
{
    pub fn new(address: MacAddress, platform: P, registry: R, priority: T) -> Self {
        Self {
            context: AssignmentContext::new(address),
            platform,
            registry,
            priority,
        }
    }

    pub fn context(&self) -> &AssignmentContext {
        &self.context
    }
}

impl<P, R, T> Notify for Notifier<P, R, T>
where
    P: PlatformPolicy<R::Handle>,
    R: DeviceRegistry,
    T: TaskPriority,
{
    fn notify(&mut self) {
        trace!("SNP initialized notification");
        let policy = SupportsEmulation::new(&self.platform);
        let Some(candidate) = find_first(&self.registry, &policy, Some(&self.context)) else {
            return;
        };
        // Failures are logged by `assign`; the next initialization retries.
        let _ = assign(&self.registry, &self.priority, &candidate, &mut self.context);
    }
}
