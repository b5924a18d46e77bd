//! Raw in-process code/data patching, grounded on `Hooking/Memory.cpp`:
//! flip the target page to RWX, write, restore the old protection, then
//! flush the instruction cache so the CPU doesn't execute a stale icache
//! line if the patched bytes overlap code.

use windows::Win32::System::Diagnostics::Debug::FlushInstructionCache;
use windows::Win32::System::Memory::{VirtualProtect, PAGE_EXECUTE_READWRITE, PAGE_PROTECTION_FLAGS};
use windows::Win32::System::Threading::GetCurrentProcess;

/// # Safety
/// `address` must point to `size` writable-once-unprotected bytes that are
/// valid for the lifetime of the process (typically inside a loaded
/// module's mapped image).
pub unsafe fn patch(address: usize, data: &[u8]) {
    let ptr = address as *mut core::ffi::c_void;
    let mut old = PAGE_PROTECTION_FLAGS(0);
    if VirtualProtect(ptr, data.len(), PAGE_EXECUTE_READWRITE, &mut old).is_err() {
        log::warn!("VirtualProtect failed while patching {address:#x}");
        return;
    }

    core::ptr::copy_nonoverlapping(data.as_ptr(), ptr.cast(), data.len());

    let mut restored = PAGE_PROTECTION_FLAGS(0);
    let _ = VirtualProtect(ptr, data.len(), old, &mut restored);
    let _ = FlushInstructionCache(GetCurrentProcess(), Some(ptr), data.len());
}

/// Writes a single pointer-sized value, the shape every caller in this
/// crate actually needs (IAT slots and vtable entries are always
/// pointer-width).
///
/// # Safety
/// See [`patch`].
pub unsafe fn patch_pointer(address: usize, value: usize) {
    patch(address, &value.to_ne_bytes());
}
