#![no_std]

//! MAC address emulation for Simple Network Protocol interfaces.
//!
//! When the platform enables emulation, [`Driver::start`] arms a listener on
//! interface initialization. Each notification scans the registered
//! interfaces, picks the first eligible one, and programs its station address
//! with the emulated address. Once one device holds the address no other
//! device is ever programmed.

extern crate alloc;

pub mod assigner;
pub mod context;
pub mod driver;
pub mod eligibility;
pub mod scanner;
pub mod services;

pub use context::AssignmentContext;
pub use driver::{Driver, DriverState, Notifier, StartError};
pub use eligibility::{Candidate, Eligibility, Rejection, SupportsEmulation};
pub use services::{
    DeviceRegistry, EventService, GlobalPool, Notify, NotifyHandler, PlatformPolicy,
    PoolAllocator, Station, TaskPriority,
};

#[cfg(test)]
mod mock;
