/*! Import-table interposer (spec.md §4.A Shim Loader, §4.B Vendor-API
Interceptor): the DLL that actually sits in the host process's module-load
chain, ahead of the NGX-compatible facade in [`fg_facade`].

This crate never touches a graphics device or drives frame generation
itself — it exists purely to get the facade loaded in place of the vendor
implementation and to neutralize the handful of vendor-API calls that would
otherwise reject a non-vendor GPU or crash the host (spec.md §4.B).
!*/

#![warn(trivial_casts, trivial_numeric_casts, unused_qualifications)]

mod hooks;
mod loader;
mod memory;
mod nvapi;
mod util;

use windows::Win32::Foundation::{HINSTANCE, HMODULE};
use windows::Win32::System::LibraryLoader::DisableThreadLibraryCalls;
use windows::Win32::System::SystemServices::DLL_PROCESS_ATTACH;

#[no_mangle]
pub extern "system" fn DllMain(instance: HINSTANCE, reason: u32, _reserved: *mut core::ffi::c_void) -> i32 {
    if reason == DLL_PROCESS_ATTACH {
        let module = HMODULE(instance.0);
        unsafe {
            let _ = DisableThreadLibraryCalls(module);
        }
        let _ = fgc::init_logging(std::path::Path::new("dlssg_to_fsr3.log"));
        log::info!("fg-shim attached, patching the vendor frame-generation load chain");
        loader::attach(module);
    }
    1
}
