use alloc::boxed::Box;
use alloc::vec::Vec;
use core::ffi::c_void;
use core::ptr::NonNull;

use emulation::{
    DeviceRegistry, Driver, EventService, GlobalPool, Notify, NotifyHandler, PoolAllocator,
    StartError, Station, TaskPriority,
};
use log::error;
use snpproto::{
    EventKind, FirmwareStatus, InterfaceMode, InterfaceType, LinkState,
    MacAddress as EtherAddress, TaskPriorityLevel,
};
use uefi::prelude::*;
use uefi::proto::network::snp::SimpleNetwork;
use uefi::proto::network::MacAddress;
use uefi::table::boot::{
    EventType, OpenProtocolAttributes, OpenProtocolParams, ScopedProtocol, SearchType, Tpl,
};
use uefi::{Event, Guid, Identify};
use uefi_raw::table::boot::BootServices as RawBootServices;
use uefi_raw::table::system::SystemTable as RawSystemTable;

use crate::config::PlatformConfig;
use crate::platform::ConfiguredPlatform;

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    error!("MAC emulation driver panic: {info}");
    loop {
        core::hint::spin_loop();
    }
}

#[entry]
pub fn efi_main(image_handle: Handle, mut system_table: SystemTable<Boot>) -> Status {
    if let Err(err) = uefi_services::init(&mut system_table) {
        return err.status();
    }

    let config = PlatformConfig::from_build_env();
    let interface_initialized = config
        .event_guid
        .map(|guid| Guid::from_bytes(guid.to_bytes()));
    let platform = ConfiguredPlatform::new(config);
    let registry = SnpRegistry::new(image_handle, &system_table);
    let priority = BootPriority::new(&system_table);
    let mut events = NamedEventService::new(&system_table, interface_initialized);

    let mut driver = Driver::new();
    match driver.start(platform, registry, priority, &mut events) {
        Ok(()) => Status::SUCCESS,
        // Unsupported tells the loader to unload the image cleanly.
        Err(StartError::Declined) => Status::UNSUPPORTED,
        Err(err) => {
            error!("MAC emulation driver failed to start: {err}");
            Status(err.status().0)
        }
    }
}

fn firmware_status(err: uefi::Error) -> FirmwareStatus {
    FirmwareStatus(err.status().0)
}

fn tpl(level: TaskPriorityLevel) -> Tpl {
    match level {
        TaskPriorityLevel::APPLICATION => Tpl::APPLICATION,
        TaskPriorityLevel::CALLBACK => Tpl::CALLBACK,
        TaskPriorityLevel::NOTIFY => Tpl::NOTIFY,
        _ => Tpl::HIGH_LEVEL,
    }
}

/// Borrows boot services for the life of the driver. Notifications only run
/// while boot services are available, so the clone never outlives them.
fn boot_table(system_table: &SystemTable<Boot>) -> SystemTable<Boot> {
    unsafe { system_table.unsafe_clone() }
}

/// SNP instances found through the handle database.
struct SnpRegistry {
    system_table: SystemTable<Boot>,
    agent: Handle,
}

impl SnpRegistry {
    fn new(agent: Handle, system_table: &SystemTable<Boot>) -> Self {
        Self {
            system_table: boot_table(system_table),
            agent,
        }
    }

    fn open_snp(&self, handle: Handle) -> uefi::Result<ScopedProtocol<'_, SimpleNetwork>> {
        // SAFETY: GetProtocol takes no ownership; the SNP driver keeps the
        // instance installed for as long as the handle is registered.
        unsafe {
            self.system_table
                .boot_services()
                .open_protocol::<SimpleNetwork>(
                    OpenProtocolParams {
                        handle,
                        agent: self.agent,
                        controller: None,
                    },
                    OpenProtocolAttributes::GetProtocol,
                )
        }
    }
}

fn ether_address(address: &MacAddress) -> EtherAddress {
    EtherAddress::from_efi_bytes(&address.0)
}

impl DeviceRegistry for SnpRegistry {
    type Handle = Handle;
    type Station<'a> = SnpStation<'a>
    where
        Self: 'a;

    fn interfaces(&self) -> Result<Vec<Handle>, FirmwareStatus> {
        let buffer = self
            .system_table
            .boot_services()
            .locate_handle_buffer(SearchType::ByProtocol(&SimpleNetwork::GUID))
            .map_err(firmware_status)?;
        Ok(buffer.to_vec())
    }

    fn describe(&self, handle: Handle) -> Result<InterfaceMode, FirmwareStatus> {
        let snp = self.open_snp(handle).map_err(firmware_status)?;
        let mode = snp.mode();
        Ok(InterfaceMode {
            state: LinkState::from_raw(mode.state.0),
            if_type: InterfaceType(mode.if_type),
            address_changeable: mode.mac_address_changeable,
            permanent_address: ether_address(&mode.permanent_address),
            current_address: ether_address(&mode.current_address),
        })
    }

    fn open(&self, handle: Handle) -> Result<SnpStation<'_>, FirmwareStatus> {
        self.open_snp(handle)
            .map(SnpStation)
            .map_err(firmware_status)
    }
}

/// An open SNP instance; the protocol is closed on drop.
struct SnpStation<'a>(ScopedProtocol<'a, SimpleNetwork>);

impl Station for SnpStation<'_> {
    fn set_station_address(&self, address: &EtherAddress) -> Result<(), FirmwareStatus> {
        let address = MacAddress(address.to_efi_bytes());
        self.0
            .station_address(false, Some(&address))
            .map_err(firmware_status)
    }
}

/// Switches TPL through the raw table. The safe wrapper only raises, and
/// the write has to drop to `CALLBACK` from a `NOTIFY` notification.
struct BootPriority {
    boot: *mut RawBootServices,
}

impl BootPriority {
    fn new(system_table: &SystemTable<Boot>) -> Self {
        // SAFETY: the loader hands the image a valid system table whose boot
        // services table stays in place until boot services exit.
        let raw = unsafe { &*system_table.as_ptr().cast::<RawSystemTable>() };
        Self {
            boot: raw.boot_services,
        }
    }

    /// Raises to `HIGH_LEVEL` and restores to `level`, returning the level in
    /// effect before the raise.
    fn pass_through_high(&self, level: Tpl) -> Tpl {
        // SAFETY: `boot` is valid while boot services run, which is the only
        // time the driver executes.
        unsafe {
            let boot = &*self.boot;
            let previous = (boot.raise_tpl)(Tpl::HIGH_LEVEL);
            (boot.restore_tpl)(level);
            previous
        }
    }
}

struct PriorityWindow<'a> {
    priority: &'a BootPriority,
    previous: Tpl,
}

impl Drop for PriorityWindow<'_> {
    fn drop(&mut self) {
        self.priority.pass_through_high(self.previous);
    }
}

impl TaskPriority for BootPriority {
    type Guard<'a> = PriorityWindow<'a>
    where
        Self: 'a;

    fn switch_to(&self, level: TaskPriorityLevel) -> PriorityWindow<'_> {
        let previous = self.pass_through_high(tpl(level));
        PriorityWindow {
            priority: self,
            previous,
        }
    }
}

/// Listens for named events: a notify event registered against the event
/// GUID, which the signaller installs and uninstalls as a protocol.
struct NamedEventService {
    system_table: SystemTable<Boot>,
    interface_initialized: Option<Guid>,
}

impl NamedEventService {
    fn new(system_table: &SystemTable<Boot>, interface_initialized: Option<Guid>) -> Self {
        Self {
            system_table: boot_table(system_table),
            interface_initialized,
        }
    }
}

impl EventService for NamedEventService {
    fn listen(
        &mut self,
        event: EventKind,
        level: TaskPriorityLevel,
        handler: NotifyHandler,
    ) -> Result<(), FirmwareStatus> {
        let name = match event {
            EventKind::InterfaceInitialized => self.interface_initialized.as_ref(),
        };
        let Some(name) = name else {
            return Err(FirmwareStatus::NOT_FOUND);
        };
        let bt = self.system_table.boot_services();

        // The handler is owned by the event for the rest of boot services.
        let Some(context) = GlobalPool.try_box(handler) else {
            return Err(FirmwareStatus::OUT_OF_RESOURCES);
        };
        let context = Box::into_raw(context);
        let created = unsafe {
            bt.create_event(
                EventType::NOTIFY_SIGNAL,
                tpl(level),
                Some(dispatch_notify),
                NonNull::new(context.cast::<c_void>()),
            )
        };
        let notify_event = match created {
            Ok(notify_event) => notify_event,
            Err(err) => {
                drop(unsafe { Box::from_raw(context) });
                return Err(firmware_status(err));
            }
        };

        if let Err(err) = bt.register_protocol_notify(name, unsafe { notify_event.unsafe_clone() }) {
            let _ = bt.close_event(notify_event);
            drop(unsafe { Box::from_raw(context) });
            return Err(firmware_status(err));
        }
        Ok(())
    }
}

unsafe extern "efiapi" fn dispatch_notify(_event: Event, context: Option<NonNull<c_void>>) {
    let Some(context) = context else {
        error!("SNP notify context unexpectedly null");
        return;
    };
    let handler = &mut *context.as_ptr().cast::<NotifyHandler>();
    handler.notify();
}
