//! Firmware collaborators the emulation core depends on.

use alloc::alloc::{alloc, Layout};
use alloc::boxed::Box;
use alloc::vec::Vec;

use snpproto::{EventKind, FirmwareStatus, InterfaceMode, MacAddress, TaskPriorityLevel};

/// Platform policy deciding whether and where MAC emulation applies.
pub trait PlatformPolicy<H> {
    /// Returns the address to emulate, or `UNSUPPORTED` when the feature is off.
    fn emulation_address(&self) -> Result<MacAddress, FirmwareStatus>;
    /// Per-device approval, e.g. a bus or topology allow-list.
    fn approves_device(&self, handle: H) -> bool;
    /// Out-of-band enablement performed once before listening for interfaces.
    fn enable(&mut self, address: &MacAddress) -> Result<(), FirmwareStatus>;
}

/// Registry of network interface handles. The registry keeps ownership of
/// every device; callers only read mode data and program the station address.
pub trait DeviceRegistry {
    type Handle: Copy + core::fmt::Debug;
    type Station<'a>: Station
    where
        Self: 'a;

    fn interfaces(&self) -> Result<Vec<Self::Handle>, FirmwareStatus>;
    fn describe(&self, handle: Self::Handle) -> Result<InterfaceMode, FirmwareStatus>;
    /// Opens `handle` for programming. The interface is closed again when the
    /// returned station is dropped.
    fn open(&self, handle: Self::Handle) -> Result<Self::Station<'_>, FirmwareStatus>;
}

/// An opened interface.
pub trait Station {
    fn set_station_address(&self, address: &MacAddress) -> Result<(), FirmwareStatus>;
}

/// Task priority control.
pub trait TaskPriority {
    type Guard<'a>
    where
        Self: 'a;

    /// Moves to `level` by raising to `HIGH_LEVEL` and restoring down to
    /// `level`, so pending notifications are flushed at the switch. Dropping
    /// the guard goes back to the previous level the same way. `level` may be
    /// below the current level.
    fn switch_to(&self, level: TaskPriorityLevel) -> Self::Guard<'_>;
}

/// Event callback invoked once per delivered event.
pub trait Notify {
    fn notify(&mut self);
}

pub type NotifyHandler = Box<dyn Notify>;

pub trait EventService {
    /// Registers `handler` to run at `level` every time `event` is signalled.
    /// The handler stays registered for the life of boot services.
    fn listen(
        &mut self,
        event: EventKind,
        level: TaskPriorityLevel,
        handler: NotifyHandler,
    ) -> Result<(), FirmwareStatus>;
}

/// Fallible allocation for state that lives for the rest of boot services.
pub trait PoolAllocator {
    /// Moves `value` to the heap, or returns `None` when the pool is exhausted.
    fn try_box<T>(&self, value: T) -> Option<Box<T>>;
}

/// The global allocator, with exhaustion reported instead of aborting.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalPool;

impl PoolAllocator for GlobalPool {
    fn try_box<T>(&self, value: T) -> Option<Box<T>> {
        let layout = Layout::new::<T>();
        if layout.size() == 0 {
            return Some(Box::new(value));
        }
        // SAFETY: the layout is not zero-sized, and the pointer is initialized
        // before ownership moves into a `Box` using the same layout.
        unsafe {
            let raw = alloc(layout).cast::<T>();
            if raw.is_null() {
                return None;
            }
            raw.write(value);
            Some(Box::from_raw(raw))
        }
    }
}
