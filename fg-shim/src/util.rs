//! `Util::GetModulePath` ported to an owned `PathBuf`-returning helper.

use std::path::PathBuf;

use windows::core::PCWSTR;
use windows::Win32::Foundation::HMODULE;
use windows::Win32::System::LibraryLoader::{
    GetModuleFileNameW, GetModuleHandleExW, GET_MODULE_HANDLE_EX_FLAG_FROM_ADDRESS, GET_MODULE_HANDLE_EX_FLAG_UNCHANGED_REFCOUNT,
};

const MAX_PATH_WIDE: usize = 2048;

/// Returns the directory containing `module`, or, if `module` is `None`,
/// the directory containing this crate's own module. Mirrors
/// `Util::GetModulePath(Buffer, DirectoryOnly=true, ModuleHandle)`.
pub fn module_directory(module: Option<HMODULE>) -> Option<PathBuf> {
    let handle = match module {
        Some(h) => h,
        None => {
            let mut found = HMODULE::default();
            unsafe {
                GetModuleHandleExW(
                    GET_MODULE_HANDLE_EX_FLAG_FROM_ADDRESS | GET_MODULE_HANDLE_EX_FLAG_UNCHANGED_REFCOUNT,
                    PCWSTR(module_directory as *const () as *const u16),
                    &mut found,
                )
                .ok()?;
            }
            found
        }
    };

    let mut buffer = [0u16; MAX_PATH_WIDE];
    let len = unsafe { GetModuleFileNameW(Some(handle), &mut buffer) } as usize;
    if len == 0 {
        return None;
    }

    let full = String::from_utf16_lossy(&buffer[..len]);
    let cut = full.rfind(['\\', '/'])?;
    Some(PathBuf::from(&full[..=cut]))
}
