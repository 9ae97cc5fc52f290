//! Entry points the host looks for in plugin libraries.

use std::ffi::c_void;

use serde::Serialize;

/// Device registration entry point; required in every pluggable device.
pub const DEVICE_INIT_SYMBOL: &[u8] = b"SE_InitPlugin\0";
/// Kernel registration entry point; optional.
pub const KERNEL_INIT_SYMBOL: &[u8] = b"TF_InitKernel\0";

pub type DeviceInitFn = unsafe extern "C" fn(params: *mut c_void, status: *mut c_void);
pub type KernelInitFn = unsafe extern "C" fn();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryPoint {
    DeviceInit,
    KernelInit,
}

impl EntryPoint {
    pub fn symbol_name(self) -> &'static str {
        let raw = match self {
            EntryPoint::DeviceInit => DEVICE_INIT_SYMBOL,
            EntryPoint::KernelInit => KERNEL_INIT_SYMBOL,
        };
        std::str::from_utf8(&raw[..raw.len() - 1]).unwrap_or_default()
    }
}
