//! Bridges the original `NGXInstanceParameters` C++ virtual-function-table
//! ABI into [`fgc::param_bag::ParamBag`] (spec.md §4.D). The core only ever
//! calls `SetVoidPointer`/`Set4`, `GetVoidPointer`/`Get5`/`Get7`; this module
//! is the one place that reconstructs the vtable layout the host's
//! `NGXInstanceParameters*` actually points at (MSVC C++ ABI: the vtable
//! pointer is the object's first field, one slot per virtual in declaration
//! order).

use std::ffi::{c_void, CString};

use fgc::param_bag::ParamBag;

type SetVoidPointerFn = unsafe extern "system" fn(*mut NgxParameters, *const i8, *mut c_void);
type SetFloatFn = unsafe extern "system" fn(*mut NgxParameters, *const i8, f32);
type SetOpaqueFn = unsafe extern "system" fn(*mut NgxParameters, *const i8, *mut c_void);
type SetU32Fn = unsafe extern "system" fn(*mut NgxParameters, *const i8, u32);
type GetVoidPointerFn = unsafe extern "system" fn(*mut NgxParameters, *const i8, *mut *mut c_void) -> u32;
type GetFloatFn = unsafe extern "system" fn(*mut NgxParameters, *const i8, *mut f32) -> u32;
type GetU32Fn = unsafe extern "system" fn(*mut NgxParameters, *const i8, *mut u32) -> u32;
type GetOpaqueFn = unsafe extern "system" fn(*mut NgxParameters, *const i8, *mut c_void) -> u32;
type UnknownFn = unsafe extern "system" fn(*mut NgxParameters);

/// Vtable layout for `NGXInstanceParameters` (original `NvNGX.h`): 8 setters
/// then 8 getters then one trailing no-op, in exactly this order.
#[repr(C)]
struct NgxParametersVtable {
    set_void_pointer: SetVoidPointerFn,
    set2: SetFloatFn,
    set3: SetOpaqueFn,
    set4: SetU32Fn,
    set5: SetU32Fn,
    set6: SetOpaqueFn,
    set7: SetOpaqueFn,
    set8: SetOpaqueFn,
    get_void_pointer: GetVoidPointerFn,
    get2: GetFloatFn,
    get3: GetOpaqueFn,
    get4: GetU32Fn,
    get5: GetU32Fn,
    get6: GetOpaqueFn,
    get7: GetFloatFn,
    get8: GetOpaqueFn,
    unknown: UnknownFn,
}

/// Opaque handle to the host's parameter-bag object. A C++ virtual base
/// class is, at the ABI level, just a pointer to one of these.
#[repr(C)]
pub struct NgxParameters {
    vtable: *const NgxParametersVtable,
}

/// Non-owning [`ParamBag`] view over a host-supplied `NGXInstanceParameters*`.
/// Valid for as long as the pointer the host passed into the entry point
/// that constructed it remains valid — one `CreateFeature`/`EvaluateFeature`
/// call, per spec.md §5's shared-resource policy.
pub struct NgxParamBag {
    raw: *mut NgxParameters,
}

impl NgxParamBag {
    /// # Safety
    /// `raw` must be a non-null, live `NGXInstanceParameters*` whose vtable
    /// matches the layout above, valid for the lifetime of this value.
    pub unsafe fn new(raw: *mut NgxParameters) -> Self {
        Self { raw }
    }

    fn vtable(&self) -> &NgxParametersVtable {
        unsafe { &*(*self.raw).vtable }
    }
}

/// A `NGXInstanceParameters*` is a plain C++ object the host owns; nothing
/// about holding one across threads is inherently unsafe as long as calls
/// into it are externally synchronized the way `EvaluateFeature` already
/// is (spec.md §5).
unsafe impl Send for NgxParamBag {}
unsafe impl Sync for NgxParamBag {}

impl ParamBag for NgxParamBag {
    fn set_void_pointer(&mut self, key: &str, value: *mut c_void) {
        let Ok(key) = CString::new(key) else { return };
        unsafe { (self.vtable().set_void_pointer)(self.raw, key.as_ptr(), value) };
    }

    fn set_u32(&mut self, key: &str, value: u32) {
        let Ok(key) = CString::new(key) else { return };
        unsafe { (self.vtable().set4)(self.raw, key.as_ptr(), value) };
    }

    fn get_void_pointer(&self, key: &str) -> Option<*mut c_void> {
        let key = CString::new(key).ok()?;
        let mut value = std::ptr::null_mut();
        let status = unsafe { (self.vtable().get_void_pointer)(self.raw, key.as_ptr(), &mut value) };
        (status == fgt::NgxStatus::Success as u32).then_some(value)
    }

    fn get_u32(&self, key: &str) -> Option<u32> {
        let key = CString::new(key).ok()?;
        let mut value = 0u32;
        let status = unsafe { (self.vtable().get5)(self.raw, key.as_ptr(), &mut value) };
        (status == fgt::NgxStatus::Success as u32).then_some(value)
    }

    fn get_f32(&self, key: &str) -> Option<f32> {
        let key = CString::new(key).ok()?;
        let mut value = 0f32;
        let status = unsafe { (self.vtable().get7)(self.raw, key.as_ptr(), &mut value) };
        (status == fgt::NgxStatus::Success as u32).then_some(value)
    }
}
