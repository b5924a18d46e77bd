//! Shim loader (spec.md §4.A): watches the host's module-load chain for the
//! libraries that eventually pull in the vendor's frame-generation DLL,
//! patches their imports so later loads and lookups run through this
//! crate's hooks, and substitutes the facade for the vendor implementation
//! the moment it's requested. Grounded on `dllmain.cpp`.

use std::collections::HashSet;
use std::ffi::c_void;

use parking_lot::Mutex;
use windows::core::{PCSTR, PCWSTR};
use windows::Win32::Foundation::{SetLastError, ERROR_MOD_NOT_FOUND, FARPROC, HANDLE, HMODULE};
use windows::Win32::System::LibraryLoader::{
    GetModuleHandleExW, GetModuleHandleW, GetProcAddress, LoadLibraryExW, LoadLibraryW, GET_MODULE_HANDLE_EX_FLAG_FROM_ADDRESS,
    GET_MODULE_HANDLE_EX_FLAG_PIN, LOAD_LIBRARY_FLAGS,
};

use crate::hooks::{self, ImportName};
use crate::nvapi;
use crate::util;

/// Libraries this shim watches as they're loaded, in the order the real
/// chain loads them. Suffix-matched case-insensitively, the same contract
/// as `TargetLibrariesToHook`.
const TARGET_LIBRARIES: &[&str] = &["sl.interposer.dll", "sl.common.dll", "sl.dlss_g.dll", "_nvngx.dll"];

/// The vendor DLL whose loads get redirected onto the facade.
const TARGET_IMPLEMENTATION_DLL: &str = "nvngx_dlssg.dll";
/// The facade's own file name, expected to sit next to this shim.
const REPLACEMENT_IMPLEMENTATION_DLL: &str = "dlssg_to_fsr3_facade.dll";

/// A module this crate never lets the host load — typically an overlay
/// that conflicts with hooking the import table (spec.md §4.A step 4).
const BLACKLISTED_OVERLAY_DLL: &str = "EOSOVH-Win64-Shipping.dll";

/// Fixed relative paths a Streamline-style interposer DLL is commonly found
/// under, tried in order when none is loaded yet (spec.md §4.A step 2).
const BRUTE_FORCE_INTERPOSER_PATHS: &[&str] = &[
    "sl.interposer.dll",
    "..\\..\\..\\Engine\\Plugins\\Streamline\\Binaries\\ThirdParty\\Win64\\sl.interposer.dll",
    "..\\..\\..\\Engine\\Plugins\\Runtime\\Nvidia\\Streamline\\Binaries\\ThirdParty\\Win64\\sl.interposer.dll",
];

static PATCHED_MODULES: Mutex<Option<HashSet<usize>>> = Mutex::new(None);

/// Caps the tracked-module set at 100 entries like the original, then
/// starts over — this is a "have we seen this module" cache, not a
/// correctness-critical set, so losing old entries just risks re-patching
/// an already-patched module (a harmless, idempotent IAT write).
fn module_requires_patching(module: HMODULE) -> bool {
    let mut guard = PATCHED_MODULES.lock();
    let set = guard.get_or_insert_with(HashSet::new);
    if set.len() > 100 {
        set.clear();
    }
    set.insert(module.0 as usize)
}

fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

fn ends_with_ci(path: &str, suffix: &str) -> bool {
    path.len() >= suffix.len() && path[path.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
}

unsafe fn pcwstr_to_string(path: PCWSTR) -> Option<String> {
    if path.is_null() {
        return None;
    }
    path.to_string().ok()
}

fn load_implementation_dll() -> Option<HMODULE> {
    let dir = util::module_directory(None)?;
    let path = dir.join(REPLACEMENT_IMPLEMENTATION_DLL);
    let wide_path = wide(path.to_string_lossy().as_ref());
    let result = unsafe { LoadLibraryW(PCWSTR(wide_path.as_ptr())) };
    match result {
        Ok(module) => Some(module),
        Err(err) => {
            log::error!("failed to load facade implementation DLL at {}: {err}", path.display());
            None
        }
    }
}

/// Mirrors `RedirectModule`: if `path` names the vendor implementation DLL,
/// load the facade in its place; if it names the blacklisted overlay,
/// refuse the load outright. Returns `Some(handle)` when the load was
/// intercepted (handle may be null on the blacklist path).
fn redirect_module(path: &str) -> Option<Option<HMODULE>> {
    if ends_with_ci(path, TARGET_IMPLEMENTATION_DLL) {
        return Some(load_implementation_dll());
    }
    if ends_with_ci(path, BLACKLISTED_OVERLAY_DLL) {
        unsafe { SetLastError(ERROR_MOD_NOT_FOUND) };
        return Some(None);
    }
    None
}

/// Patches `KERNEL32.dll`'s `LoadLibraryW`/`LoadLibraryExW`/`GetProcAddress`
/// imports inside `module` if it's one of [`TARGET_LIBRARIES`] and hasn't
/// already been patched (spec.md §4.A step 1 / §4.B).
fn patch_imports_for_module(path: &str, module: HMODULE) -> bool {
    if module.0.is_null() {
        return false;
    }
    if !TARGET_LIBRARIES.iter().any(|target| ends_with_ci(path, target)) {
        return false;
    }
    if !module_requires_patching(module) {
        return false;
    }

    log::debug!("patching imports for newly loaded module: {path}");

    unsafe {
        hooks::redirect_import(module, "KERNEL32.dll", ImportName::Name("LoadLibraryW"), hooked_load_library_w as usize);
        hooks::redirect_import(
            module,
            "KERNEL32.dll",
            ImportName::Name("LoadLibraryExW"),
            hooked_load_library_ex_w as usize,
        );
        hooks::redirect_import(
            module,
            "KERNEL32.dll",
            ImportName::Name("GetProcAddress"),
            hooked_get_proc_address as usize,
        );
    }

    true
}

unsafe extern "system" fn hooked_load_library_w(lp_lib_file_name: PCWSTR) -> HMODULE {
    let Some(path) = pcwstr_to_string(lp_lib_file_name) else {
        return LoadLibraryW(lp_lib_file_name).unwrap_or_default();
    };

    let module = match redirect_module(&path) {
        Some(redirected) => redirected.unwrap_or_default(),
        None => LoadLibraryW(lp_lib_file_name).unwrap_or_default(),
    };

    patch_imports_for_module(&path, module);
    module
}

unsafe extern "system" fn hooked_load_library_ex_w(lp_lib_file_name: PCWSTR, h_file: HANDLE, dw_flags: u32) -> HMODULE {
    let Some(path) = pcwstr_to_string(lp_lib_file_name) else {
        return LoadLibraryExW(lp_lib_file_name, h_file, LOAD_LIBRARY_FLAGS(dw_flags)).unwrap_or_default();
    };

    let module = match redirect_module(&path) {
        Some(redirected) => redirected.unwrap_or_default(),
        None => LoadLibraryExW(lp_lib_file_name, h_file, LOAD_LIBRARY_FLAGS(dw_flags)).unwrap_or_default(),
    };

    patch_imports_for_module(&path, module);
    module
}

unsafe extern "system" fn hooked_get_proc_address(h_module: HMODULE, lp_proc_name: PCSTR) -> FARPROC {
    let proc = GetProcAddress(h_module, lp_proc_name);
    let Some(ptr) = proc else {
        return proc;
    };

    let mut raw = ptr as *mut c_void;
    if nvapi::try_intercept(lp_proc_name.0.cast(), &mut raw) {
        return Some(core::mem::transmute::<*mut c_void, unsafe extern "system" fn() -> isize>(raw));
    }
    proc
}

/// Tries every fixed path in [`BRUTE_FORCE_INTERPOSER_PATHS`] relative to
/// this process's own executable directory until one loads (spec.md §4.A
/// step 2).
fn brute_force_load_interposer() {
    let direct = wide(BRUTE_FORCE_INTERPOSER_PATHS[0]);
    if unsafe { LoadLibraryW(PCWSTR(direct.as_ptr())) }.is_ok() {
        return;
    }

    let Some(exe_dir) = util::module_directory(Some(exe_module_handle())) else {
        return;
    };

    for relative in &BRUTE_FORCE_INTERPOSER_PATHS[1..] {
        let candidate = exe_dir.join(relative);
        let wide_candidate = wide(candidate.to_string_lossy().as_ref());
        if unsafe { LoadLibraryW(PCWSTR(wide_candidate.as_ptr())) }.is_ok() {
            return;
        }
    }
}

fn module_handle(name: &str) -> HMODULE {
    let wide_name = wide(name);
    unsafe { GetModuleHandleW(PCWSTR(wide_name.as_ptr())) }.unwrap_or_default()
}

fn exe_module_handle() -> HMODULE {
    unsafe { GetModuleHandleW(PCWSTR::null()) }.unwrap_or_default()
}

/// Pins this DLL in memory: the patches above can't be undone once another
/// module holds a direct pointer into them, so an unload would leave
/// dangling IAT entries.
fn pin_self(any_instance: HMODULE) {
    let mut unused = HMODULE::default();
    unsafe {
        let _ = GetModuleHandleExW(
            GET_MODULE_HANDLE_EX_FLAG_FROM_ADDRESS | GET_MODULE_HANDLE_EX_FLAG_PIN,
            PCWSTR(any_instance.0 as *const u16),
            &mut unused,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ends_with_ci_matches_regardless_of_case() {
        assert!(ends_with_ci(r"C:\Game\sl.interposer.dll", "sl.interposer.dll"));
        assert!(ends_with_ci(r"C:\Game\SL.INTERPOSER.DLL", "sl.interposer.dll"));
    }

    #[test]
    fn ends_with_ci_rejects_non_suffix_and_short_paths() {
        assert!(!ends_with_ci(r"C:\Game\sl.interposer.dll.bak", "sl.interposer.dll"));
        assert!(!ends_with_ci("dll", "sl.interposer.dll"));
    }

    #[test]
    fn module_requires_patching_is_true_only_once_per_handle() {
        *PATCHED_MODULES.lock() = None;
        let module = HMODULE(0x1000 as *mut c_void);
        assert!(module_requires_patching(module));
        assert!(!module_requires_patching(module));
    }

    #[test]
    fn module_requires_patching_clears_past_the_cap() {
        *PATCHED_MODULES.lock() = None;
        for handle in 1..=101 {
            module_requires_patching(HMODULE(handle as *mut c_void));
        }
        // The set was cleared once it passed 100 entries, so a handle seen
        // early in the run reads as "new" again.
        assert!(module_requires_patching(HMODULE(1 as *mut c_void)));
    }
}

/// Entry point called from `DllMain`'s `DLL_PROCESS_ATTACH`. Performs the
/// full five-step algorithm in spec.md §4.A.
pub fn attach(this_instance: HMODULE) {
    brute_force_load_interposer();

    let mut any_patched = false;
    for target in TARGET_LIBRARIES {
        let handle = module_handle(target);
        if patch_imports_for_module(target, handle) {
            any_patched = true;
        }
    }

    if !any_patched {
        // Nothing is loaded yet; hook the host's own LoadLibrary calls so
        // we catch the chain whenever it does start.
        any_patched = patch_imports_for_module(TARGET_LIBRARIES[0], exe_module_handle());
    }

    if any_patched {
        pin_self(this_instance);
    }
}
