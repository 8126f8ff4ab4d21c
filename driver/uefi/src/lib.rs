#![cfg_attr(feature = "firmware", no_std)]
#![cfg_attr(feature = "firmware", no_main)]

//! DXE driver image that emulates a platform MAC address on one SNP interface.
//!
//! The UEFI bindings only build when the `firmware` feature is enabled. Without
//! it the platform configuration still builds and tests on the host, and the
//! exported entry point simply declines.

#[cfg(feature = "firmware")]
extern crate alloc;

pub mod config;
pub mod platform;

#[cfg(feature = "firmware")]
mod firmware;

#[cfg(not(feature = "firmware"))]
#[no_mangle]
pub extern "C" fn efi_main(_image_handle: usize, _system_table: usize) -> usize {
    snpproto::FirmwareStatus::UNSUPPORTED.0
}
