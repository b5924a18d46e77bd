//! UI mask (supplemented feature — not present in spec.md's distillation;
//! recovered from the original implementation's `FFUIMask` helper).
//!
//! `FFUIMask` marks screen regions (HUD, subtitles, overlays) that must
//! never be blended with interpolated content. This crate does not
//! composite pixels itself, so `UiMask` stays a thin carrier: an optional
//! opaque handle threaded from the parameter bag through to the
//! interpolator dispatch description, exactly mirroring the original's
//! pass-through role rather than reimplementing masking logic here.

use fgh::resource::RawHandle;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct UiMask {
    handle: Option<RawHandle>,
}

impl UiMask {
    /// Builds a mask from the raw `DLSSG.UIMask` bag value; a null pointer
    /// means the host supplied no mask this frame.
    pub fn from_raw(ptr: *mut core::ffi::c_void) -> Self {
        if ptr.is_null() {
            Self { handle: None }
        } else {
            Self {
                handle: Some(RawHandle(ptr)),
            }
        }
    }

    pub fn is_present(&self) -> bool {
        self.handle.is_some()
    }

    pub fn handle(&self) -> Option<RawHandle> {
        self.handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_pointer_means_absent() {
        assert!(!UiMask::from_raw(std::ptr::null_mut()).is_present());
    }

    #[test]
    fn nonnull_pointer_is_present() {
        let mut token = 0u8;
        let mask = UiMask::from_raw(&mut token as *mut u8 as *mut core::ffi::c_void);
        assert!(mask.is_present());
        assert!(mask.handle().is_some());
    }
}
