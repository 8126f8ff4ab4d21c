#![cfg(test)]

//! In-memory stand-ins for the firmware services. Handles are plain `u32`s and
//! state lives behind `Rc` so tests can keep observing it after the driver
//! takes ownership of a clone.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

use snpproto::{
    EventKind, FirmwareStatus, InterfaceMode, InterfaceType, LinkState, MacAddress,
    TaskPriorityLevel,
};

use crate::services::{
    DeviceRegistry, EventService, NotifyHandler, PlatformPolicy, PoolAllocator, Station,
    TaskPriority,
};

/// Mode data for an initialized, programmable Ethernet interface.
pub fn ethernet_mode(permanent: MacAddress) -> InterfaceMode {
    InterfaceMode {
        state: LinkState::Initialized,
        if_type: InterfaceType::ETHERNET,
        address_changeable: true,
        permanent_address: permanent,
        current_address: permanent,
    }
}

#[derive(Clone)]
pub struct MockPlatform {
    address: Result<MacAddress, FirmwareStatus>,
    enable_result: Result<(), FirmwareStatus>,
    denied: Vec<u32>,
    approval_queries: Rc<Cell<usize>>,
    enable_calls: Rc<Cell<usize>>,
}

impl MockPlatform {
    pub fn enabled(address: MacAddress) -> Self {
        Self::with_address(Ok(address))
    }

    pub fn with_address(address: Result<MacAddress, FirmwareStatus>) -> Self {
        Self {
            address,
            enable_result: Ok(()),
            denied: Vec::new(),
            approval_queries: Rc::new(Cell::new(0)),
            enable_calls: Rc::new(Cell::new(0)),
        }
    }

    pub fn deny(mut self, handle: u32) -> Self {
        self.denied.push(handle);
        self
    }

    pub fn enable_fails(mut self, status: FirmwareStatus) -> Self {
        self.enable_result = Err(status);
        self
    }

    pub fn approval_queries(&self) -> usize {
        self.approval_queries.get()
    }

    pub fn enable_calls(&self) -> usize {
        self.enable_calls.get()
    }
}

impl PlatformPolicy<u32> for MockPlatform {
    fn emulation_address(&self) -> Result<MacAddress, FirmwareStatus> {
        self.address
    }

    fn approves_device(&self, handle: u32) -> bool {
        self.approval_queries.set(self.approval_queries.get() + 1);
        !self.denied.contains(&handle)
    }

    fn enable(&mut self, _address: &MacAddress) -> Result<(), FirmwareStatus> {
        self.enable_calls.set(self.enable_calls.get() + 1);
        self.enable_result
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Open(u32),
    Write(u32),
    Close(u32),
}

#[derive(Default)]
struct RegistryState {
    devices: Vec<(u32, InterfaceMode)>,
    enumeration_error: Option<FirmwareStatus>,
    describe_failures: Vec<u32>,
    write_failures: Vec<(u32, usize, FirmwareStatus)>,
    writes: Vec<(u32, MacAddress, TaskPriorityLevel)>,
    operations: Vec<(Operation, TaskPriorityLevel)>,
}

#[derive(Clone)]
pub struct MockRegistry {
    state: Rc<RefCell<RegistryState>>,
    level: Rc<Cell<TaskPriorityLevel>>,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(RegistryState::default())),
            level: Rc::new(Cell::new(TaskPriorityLevel::APPLICATION)),
        }
    }

    /// Records the level `priority` is at for every open, write and close.
    pub fn observe_priority(mut self, priority: &MockPriority) -> Self {
        self.level = priority.level.clone();
        self
    }

    pub fn add(&self, handle: u32, mode: InterfaceMode) {
        self.state.borrow_mut().devices.push((handle, mode));
    }

    pub fn set_mode(&self, handle: u32, mode: InterfaceMode) {
        let mut state = self.state.borrow_mut();
        if let Some(entry) = state.devices.iter_mut().find(|(h, _)| *h == handle) {
            entry.1 = mode;
        }
    }

    pub fn mode(&self, handle: u32) -> Option<InterfaceMode> {
        self.state
            .borrow()
            .devices
            .iter()
            .find(|(h, _)| *h == handle)
            .map(|(_, mode)| *mode)
    }

    pub fn fail_enumeration(&self, status: FirmwareStatus) {
        self.state.borrow_mut().enumeration_error = Some(status);
    }

    pub fn fail_describe(&self, handle: u32) {
        self.state.borrow_mut().describe_failures.push(handle);
    }

    /// Makes the next `count` writes to `handle` fail with `status`.
    pub fn fail_writes(&self, handle: u32, count: usize, status: FirmwareStatus) {
        self.state
            .borrow_mut()
            .write_failures
            .push((handle, count, status));
    }

    /// Successful station address writes in order.
    pub fn writes(&self) -> Vec<(u32, MacAddress, TaskPriorityLevel)> {
        self.state.borrow().writes.clone()
    }

    /// Every open, write attempt and close with the priority it ran at.
    pub fn operations(&self) -> Vec<(Operation, TaskPriorityLevel)> {
        self.state.borrow().operations.clone()
    }

    fn record(&self, operation: Operation) {
        let level = self.level.get();
        self.state.borrow_mut().operations.push((operation, level));
    }
}

impl DeviceRegistry for MockRegistry {
    type Handle = u32;
    type Station<'a> = MockStation<'a>
    where
        Self: 'a;

    fn interfaces(&self) -> Result<Vec<u32>, FirmwareStatus> {
        let state = self.state.borrow();
        if let Some(status) = state.enumeration_error {
            return Err(status);
        }
        if state.devices.is_empty() {
            return Err(FirmwareStatus::NOT_FOUND);
        }
        Ok(state.devices.iter().map(|(handle, _)| *handle).collect())
    }

    fn describe(&self, handle: u32) -> Result<InterfaceMode, FirmwareStatus> {
        let state = self.state.borrow();
        if state.describe_failures.contains(&handle) {
            return Err(FirmwareStatus::UNSUPPORTED);
        }
        state
            .devices
            .iter()
            .find(|(h, _)| *h == handle)
            .map(|(_, mode)| *mode)
            .ok_or(FirmwareStatus::INVALID_PARAMETER)
    }

    fn open(&self, handle: u32) -> Result<MockStation<'_>, FirmwareStatus> {
        if !self.state.borrow().devices.iter().any(|(h, _)| *h == handle) {
            return Err(FirmwareStatus::INVALID_PARAMETER);
        }
        self.record(Operation::Open(handle));
        Ok(MockStation {
            registry: self,
            handle,
        })
    }
}

pub struct MockStation<'a> {
    registry: &'a MockRegistry,
    handle: u32,
}

impl Station for MockStation<'_> {
    fn set_station_address(&self, address: &MacAddress) -> Result<(), FirmwareStatus> {
        let handle = self.handle;
        self.registry.record(Operation::Write(handle));
        let mut guard = self.registry.state.borrow_mut();
        let state = &mut *guard;
        if let Some(failure) = state
            .write_failures
            .iter_mut()
            .find(|(h, remaining, _)| *h == handle && *remaining > 0)
        {
            failure.1 -= 1;
            return Err(failure.2);
        }

        let level = self.registry.level.get();
        let mode = state
            .devices
            .iter_mut()
            .find(|(h, _)| *h == handle)
            .map(|(_, mode)| mode)
            .ok_or(FirmwareStatus::INVALID_PARAMETER)?;
        mode.current_address = *address;
        state.writes.push((handle, *address, level));
        Ok(())
    }
}

impl Drop for MockStation<'_> {
    fn drop(&mut self) {
        self.registry.record(Operation::Close(self.handle));
    }
}

#[derive(Clone)]
pub struct MockPriority {
    level: Rc<Cell<TaskPriorityLevel>>,
    transitions: Rc<RefCell<Vec<TaskPriorityLevel>>>,
}

impl MockPriority {
    pub fn new(level: TaskPriorityLevel) -> Self {
        Self {
            level: Rc::new(Cell::new(level)),
            transitions: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn current(&self) -> TaskPriorityLevel {
        self.level.get()
    }

    /// Every level set so far, in order.
    pub fn transitions(&self) -> Vec<TaskPriorityLevel> {
        self.transitions.borrow().clone()
    }

    /// Raises to `HIGH_LEVEL`, then restores to `level`.
    fn pass_through_high(&self, level: TaskPriorityLevel) {
        let mut transitions = self.transitions.borrow_mut();
        transitions.push(TaskPriorityLevel::HIGH_LEVEL);
        transitions.push(level);
        self.level.set(level);
    }
}

pub struct MockPriorityGuard<'a> {
    priority: &'a MockPriority,
    previous: TaskPriorityLevel,
}

impl Drop for MockPriorityGuard<'_> {
    fn drop(&mut self) {
        self.priority.pass_through_high(self.previous);
    }
}

impl TaskPriority for MockPriority {
    type Guard<'a> = MockPriorityGuard<'a>
    where
        Self: 'a;

    fn switch_to(&self, level: TaskPriorityLevel) -> MockPriorityGuard<'_> {
        let previous = self.level.get();
        self.pass_through_high(level);
        MockPriorityGuard {
            priority: self,
            previous,
        }
    }
}

/// A pool with nothing left to give.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExhaustedPool;

impl PoolAllocator for ExhaustedPool {
    fn try_box<T>(&self, _value: T) -> Option<Box<T>> {
        None
    }
}

#[derive(Clone, Default)]
pub struct MockEvents {
    listeners: Rc<RefCell<Vec<(EventKind, TaskPriorityLevel, NotifyHandler)>>>,
    failure: Option<FirmwareStatus>,
}

impl MockEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(status: FirmwareStatus) -> Self {
        Self {
            failure: Some(status),
            ..Self::default()
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn listener_level(&self, index: usize) -> Option<TaskPriorityLevel> {
        self.listeners.borrow().get(index).map(|(_, level, _)| *level)
    }

    /// Delivers `event` to every matching listener.
    pub fn signal(&self, event: EventKind) {
        let mut listeners = self.listeners.borrow_mut();
        for (kind, _, handler) in listeners.iter_mut() {
            if *kind == event {
                handler.notify();
            }
        }
    }
}

impl EventService for MockEvents {
    fn listen(
        &mut self,
        event: EventKind,
        level: TaskPriorityLevel,
        handler: NotifyHandler,
    ) -> Result<(), FirmwareStatus> {
        if let Some(status) = self.failure {
            return Err(status);
        }
        self.listeners.borrow_mut().push((event, level, handler));
        Ok(())
    }
}
