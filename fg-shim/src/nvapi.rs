//! NvAPI's `nvapi_QueryInterface` function-identifier dispatcher, wrapped
//! directly on `NvAPI.cpp`'s `HookedNvAPI_QueryInterface`. NvAPI doesn't
//! export ordinary symbols — every entry point is obtained by calling
//! `nvapi_QueryInterface` with a 32-bit identifier and casting the returned
//! pointer — so this hooks that one lookup function instead of patching an
//! import table entry.

use std::ffi::c_void;
use std::os::raw::c_char;

use parking_lot::Mutex;

const GPU_GET_ARCH_INFO: u32 = 0xD8265D24;
const D3D12_SET_RAW_SCG_PRIORITY: u32 = 0x5DB3048A;

const NV_OK: u32 = 0;
const NV_ERROR: u32 = 0xFFFF_FFFF;

const ADA_ARCHITECTURE: u32 = 0x190;
const ADA_IMPLEMENTATION: u32 = 4;
const ADA_REVISION: u32 = 0xFFFF_FFFF;
const SENTINEL_ARCHITECTURE: u32 = 0xE000_0000;

type QueryInterfaceFn = unsafe extern "system" fn(u32) -> *mut c_void;
type GpuGetArchInfoFn = unsafe extern "system" fn(*mut c_void, *mut ArchInfo) -> u32;

/// Layout of `NV_ARCH_INFO`. `Version` selects which reply shape the caller
/// expects; only `0x10010`/`0x20010` are ones this hook recognizes and
/// rewrites.
#[repr(C)]
struct ArchInfo {
    version: u32,
    architecture: u32,
    implementation: u32,
    revision: u32,
}

static ORIGINAL_GET_ARCH_INFO: Mutex<Option<GpuGetArchInfoFn>> = Mutex::new(None);

/// Whether a reported `(version, architecture)` pair should be spoofed as
/// Ada: only reply shapes this hook understands, and only when the real
/// architecture would fail the driver's "at least Ada" gate.
fn should_rewrite_arch(version: u32, architecture: u32) -> bool {
    (version == 0x10010 || version == 0x20010) && (architecture < ADA_ARCHITECTURE || architecture >= SENTINEL_ARCHITECTURE)
}

unsafe extern "system" fn hooked_gpu_get_arch_info(gpu_handle: *mut c_void, arch_info: *mut ArchInfo) -> u32 {
    let Some(original) = *ORIGINAL_GET_ARCH_INFO.lock() else {
        return NV_ERROR;
    };

    let status = original(gpu_handle, arch_info);

    if status == NV_OK && !arch_info.is_null() {
        let info = &mut *arch_info;
        if should_rewrite_arch(info.version, info.architecture) {
            info.architecture = ADA_ARCHITECTURE;
            info.implementation = ADA_IMPLEMENTATION;
            info.revision = ADA_REVISION;
        }
    }

    status
}

/// Async-compute priority is stubbed unconditionally: the real driver call
/// it wraps is undocumented and calling through reliably device-removes on
/// the architectures this crate targets.
unsafe extern "system" fn hooked_set_raw_scg_priority(_priority_info: *mut c_void) -> u32 {
    NV_OK
}

unsafe extern "system" fn hooked_query_interface(interface_id: u32) -> *mut c_void {
    let Some(original) = *ORIGINAL_QUERY_INTERFACE.lock() else {
        return std::ptr::null_mut();
    };

    let result = original(interface_id);
    if result.is_null() {
        return result;
    }

    match interface_id {
        GPU_GET_ARCH_INFO => {
            *ORIGINAL_GET_ARCH_INFO.lock() = Some(core::mem::transmute::<*mut c_void, GpuGetArchInfoFn>(result));
            hooked_gpu_get_arch_info as *mut c_void
        }
        D3D12_SET_RAW_SCG_PRIORITY => hooked_set_raw_scg_priority as *mut c_void,
        _ => result,
    }
}

static ORIGINAL_QUERY_INTERFACE: Mutex<Option<QueryInterfaceFn>> = Mutex::new(None);

/// Inspects a symbol `GetProcAddress` just resolved; if it's
/// `nvapi_QueryInterface`, swaps the returned pointer for our dispatcher
/// wrapper and stashes the real one to forward to.
///
/// # Safety
/// `function_pointer` must point to a valid, non-null function pointer just
/// returned by `GetProcAddress` for `function_name`.
pub unsafe fn try_intercept(function_name: *const c_char, function_pointer: *mut *mut c_void) -> bool {
    if function_name.is_null() || function_pointer.is_null() || (*function_pointer).is_null() {
        return false;
    }
    if (function_name as usize) < 0x10000 {
        // Ordinal-only GetProcAddress lookups pass the ordinal as the
        // pointer value; never dereference it as a string.
        return false;
    }

    let name = std::ffi::CStr::from_ptr(function_name);
    if !name.to_bytes().eq_ignore_ascii_case(b"nvapi_QueryInterface") {
        return false;
    }

    let original = core::mem::transmute::<*mut c_void, QueryInterfaceFn>(*function_pointer);
    *ORIGINAL_QUERY_INTERFACE.lock() = Some(original);
    *function_pointer = hooked_query_interface as *mut c_void;
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_pre_ada_architectures_on_recognized_versions() {
        assert!(should_rewrite_arch(0x10010, 0x170));
        assert!(should_rewrite_arch(0x20010, 0));
    }

    #[test]
    fn rewrites_out_of_range_sentinel_architectures() {
        assert!(should_rewrite_arch(0x10010, SENTINEL_ARCHITECTURE));
        assert!(should_rewrite_arch(0x20010, 0xFFFF_FFFF));
    }

    #[test]
    fn leaves_ada_and_later_architectures_alone() {
        assert!(!should_rewrite_arch(0x10010, ADA_ARCHITECTURE));
        assert!(!should_rewrite_arch(0x10010, ADA_ARCHITECTURE + 1));
    }

    #[test]
    fn ignores_unrecognized_reply_versions() {
        assert!(!should_rewrite_arch(0x10000, 0));
    }

    #[test]
    fn try_intercept_ignores_ordinal_lookups() {
        let mut pointer = 0x1234usize as *mut c_void;
        unsafe {
            assert!(!try_intercept(7usize as *const c_char, &mut pointer));
        }
    }

    #[test]
    fn try_intercept_ignores_unrelated_symbol_names() {
        let name = std::ffi::CString::new("GetAdapterDescription").unwrap();
        let mut pointer = 0x1234usize as *mut c_void;
        unsafe {
            assert!(!try_intercept(name.as_ptr(), &mut pointer));
        }
        assert_eq!(pointer, 0x1234usize as *mut c_void);
    }

    #[test]
    fn try_intercept_swaps_in_the_dispatcher_for_query_interface() {
        let name = std::ffi::CString::new("nvapi_QueryInterface").unwrap();
        let mut pointer = 0x1234usize as *mut c_void;
        unsafe {
            assert!(try_intercept(name.as_ptr(), &mut pointer));
        }
        assert_eq!(pointer, hooked_query_interface as *mut c_void);
    }
}
