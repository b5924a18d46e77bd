/*! NGX-compatible facade: the `NVSDK_NGX_*` exported entry points a game
process calls expecting Nvidia's `nvngx_dlssg.dll`, backed by
[`fgc::FrameInterpolator`] instead of the real vendor implementation.

This crate owns no frame-generation logic of its own — it reconstructs the
host-facing ABI ([`params`], [`handle`]), tracks process-wide device state
([`device_state`]), and wires concrete [`fg_hal`]-backed command recorders
([`recorder`]) and third-party shader-library bindings ([`effects`]) into
one [`fgc::FrameInterpolator`] per `CreateFeature` call.
!*/

#![warn(trivial_casts, trivial_numeric_casts, unused_qualifications)]

mod callbacks;
pub mod d3d11;
pub mod d3d12;
mod device_state;
mod effects;
mod handle;
mod params;
pub mod recorder;
pub mod vulkan;

use windows::Win32::Foundation::{HINSTANCE, HMODULE};
use windows::Win32::System::LibraryLoader::DisableThreadLibraryCalls;
use windows::Win32::System::SystemServices::DLL_PROCESS_ATTACH;

/// Matches the original's `DllMain`: on attach, starts the line-based log
/// file next to the DLL (spec.md §6, §9) before anything else can log, and
/// disables `DLL_THREAD_ATTACH`/`DETACH` notifications this crate never
/// acts on. Idempotent via [`fgc::init_logging`]'s own `OnceCell` guard, so
/// repeated `DLL_PROCESS_ATTACH` notifications (which the loader never
/// actually sends twice for the same module, but which a hand-rolled
/// loader hook could) stay harmless.
#[no_mangle]
pub extern "system" fn DllMain(instance: HINSTANCE, reason: u32, _reserved: *mut core::ffi::c_void) -> i32 {
    if reason == DLL_PROCESS_ATTACH {
        unsafe {
            let _ = DisableThreadLibraryCalls(HMODULE(instance.0));
        }
        let _ = fgc::init_logging(std::path::Path::new("dlssg_to_fsr3.log"));
        log::warn!("dlssg-to-fsr3 loaded. AMD FSR 3 Frame Generation will replace Nvidia DLSS-G Frame Generation.");
    }
    1
}
