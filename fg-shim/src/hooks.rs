//! Import-table and vtable patching, grounded on `Hooking/Hooks.cpp`.
//!
//! The original walks a module's import table through Microsoft Detours'
//! `DetourEnumerateImportsEx`. Detours isn't a published Rust crate, so this
//! walks the PE import directory itself — the same directory Detours reads,
//! just without going through its enumerator. The PE layout types come from
//! `windows`'s own generated headers rather than a hand-rolled `#[repr(C)]`
//! copy of `winnt.h`.

use std::ffi::CStr;
use std::os::raw::c_char;

use windows::Win32::Foundation::HMODULE;
use windows::Win32::System::SystemServices::{
    IMAGE_DIRECTORY_ENTRY_IMPORT, IMAGE_DOS_HEADER, IMAGE_IMPORT_BY_NAME, IMAGE_IMPORT_DESCRIPTOR, IMAGE_NT_HEADERS64,
    IMAGE_ORDINAL_FLAG64, IMAGE_THUNK_DATA64,
};

use crate::memory;

/// Either an import name or an ordinal, matching `std::variant<const char *, int>`
/// on the original `RedirectImport` signature.
pub enum ImportName<'a> {
    Name(&'a str),
    Ordinal(u16),
}

/// `uintptr_t + index * sizeof(void*)`, used for patching a raw vtable slot.
///
/// # Safety
/// `table` must point to a live vtable of at least `index + 1` entries.
pub unsafe fn write_virtual_function(table: usize, index: u32, callback: usize) -> Option<usize> {
    if table == 0 {
        return None;
    }
    let slot = table + (index as usize) * core::mem::size_of::<usize>();
    let original = *(slot as *const usize);
    memory::patch_pointer(slot, callback);
    Some(original)
}

unsafe fn module_base(module: HMODULE) -> *const u8 {
    module.0 as *const u8
}

unsafe fn rva<T>(base: *const u8, offset: u32) -> *const T {
    base.add(offset as usize).cast()
}

unsafe fn rva_mut<T>(base: *const u8, offset: u32) -> *mut T {
    base.add(offset as usize) as *mut T
}

unsafe fn read_cstr(ptr: *const c_char) -> &'static str {
    CStr::from_ptr(ptr).to_str().unwrap_or("")
}

/// Walks `module`'s import directory looking for `(import_module, import)`;
/// when found, overwrites the IAT slot so every subsequent call through that
/// slot lands on `callback` instead. Returns the previous pointer so the
/// caller can chain back to the original, the same contract as
/// `Hooks::RedirectImport`'s `OriginalFunction` out-parameter.
///
/// # Safety
/// `module` must be a valid, currently-mapped module handle.
pub unsafe fn redirect_import(module: HMODULE, import_module: &str, import: ImportName<'_>, callback: usize) -> Option<usize> {
    if module.0.is_null() {
        return None;
    }

    let base = module_base(module);
    let dos: *const IMAGE_DOS_HEADER = base.cast();
    if (*dos).e_magic != 0x5A4D {
        return None;
    }

    let nt: *const IMAGE_NT_HEADERS64 = rva(base, (*dos).e_lfanew as u32);
    if (*nt).Signature != 0x4550 {
        return None;
    }

    let import_dir = (*nt).OptionalHeader.DataDirectory[IMAGE_DIRECTORY_ENTRY_IMPORT as usize];
    if import_dir.VirtualAddress == 0 {
        return None;
    }

    let mut descriptor: *const IMAGE_IMPORT_DESCRIPTOR = rva(base, import_dir.VirtualAddress);

    'modules: loop {
        let name_rva = (*descriptor).Name;
        if name_rva == 0 {
            return None;
        }

        let this_module_name = read_cstr(rva(base, name_rva));
        if !this_module_name.eq_ignore_ascii_case(import_module) {
            descriptor = descriptor.add(1);
            continue;
        }

        let original_first_thunk = (*descriptor).Anonymous.OriginalFirstThunk;
        let int_rva = if original_first_thunk != 0 { original_first_thunk } else { (*descriptor).FirstThunk };

        let mut int_thunk: *const IMAGE_THUNK_DATA64 = rva(base, int_rva);
        let mut iat_thunk: *mut IMAGE_THUNK_DATA64 = rva_mut(base, (*descriptor).FirstThunk);

        loop {
            let entry = (*int_thunk).u1.Ordinal;
            if entry == 0 {
                // Exhausted this module's imports without a match; the
                // original has only ever been seen importing a name once
                // per module, so move to the next import descriptor.
                descriptor = descriptor.add(1);
                continue 'modules;
            }

            let matches = if entry & IMAGE_ORDINAL_FLAG64 != 0 {
                matches!(&import, ImportName::Ordinal(wanted) if *wanted as u64 == (entry & 0xFFFF))
            } else {
                let by_name: *const IMAGE_IMPORT_BY_NAME = rva(base, entry as u32);
                let name = read_cstr((*by_name).Name.as_ptr().cast());
                matches!(&import, ImportName::Name(wanted) if wanted.eq_ignore_ascii_case(name))
            };

            if matches {
                let slot = iat_thunk as usize;
                let original = *(slot as *const usize);
                memory::patch_pointer(slot, callback);
                return Some(original);
            }

            int_thunk = int_thunk.add(1);
            iat_thunk = iat_thunk.add(1);
        }
    }
}
