//! Parameter Bag (spec.md §3, §4.D).
//!
//! An abstract interface the host implements; the core only ever touches
//! `SetVoidPointer`, `Set4`/`Set5`, `GetVoidPointer`, `Get5`, `Get7` plus
//! "get-or-default" convenience wrappers built on top of them (spec.md
//! §4.D). The bag is owned by the host: this module never takes ownership
//! of anything it reads out of it, and never grows a lifetime past one
//! `evaluate` call (spec.md §5, "Shared-resource policy").

use fgt::ParamValue;

use crate::error::CoreError;

/// The host-implemented parameter store. `fg-facade` hands the core a
/// `&dyn ParamBag` built over whatever the host actually passed at the ABI
/// boundary; everything downstream of `CreateFeature`/`EvaluateFeature`
/// only ever sees this trait.
pub trait ParamBag {
    fn set_void_pointer(&mut self, key: &str, value: *mut core::ffi::c_void);
    fn set_u32(&mut self, key: &str, value: u32);
    fn get_void_pointer(&self, key: &str) -> Option<*mut core::ffi::c_void>;
    fn get_u32(&self, key: &str) -> Option<u32>;
    fn get_f32(&self, key: &str) -> Option<f32>;
}

/// Typed "get-or-default" wrapper over [`ParamBag`]. Every accessor logs
/// once (via [`crate::log_once`]) the first time a key it expected is
/// missing, then silently applies the default on every subsequent call —
/// spec.md §7's "missing optional bag keys (defaults applied)" recovery
/// policy.
pub struct ParamReader<'a> {
    bag: &'a dyn ParamBag,
}

impl<'a> ParamReader<'a> {
    pub fn new(bag: &'a dyn ParamBag) -> Self {
        Self { bag }
    }

    pub fn u32_or(&self, key: &str, default: u32) -> u32 {
        self.bag.get_u32(key).unwrap_or_else(|| {
            crate::log_once::warn_once(key, || format!("missing bag key {key:?}, defaulting to {default}"));
            default
        })
    }

    pub fn f32_or(&self, key: &str, default: f32) -> f32 {
        self.bag.get_f32(key).unwrap_or_else(|| {
            crate::log_once::warn_once(key, || format!("missing bag key {key:?}, defaulting to {default}"));
            default
        })
    }

    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        self.bag
            .get_u32(key)
            .map(|v| v != 0)
            .unwrap_or(default)
    }

    pub fn void_pointer(&self, key: &str) -> Option<*mut core::ffi::c_void> {
        self.bag.get_void_pointer(key)
    }

    /// A required key: surfaces `NotFound` rather than defaulting (spec.md
    /// §7, "Surfaced: any non-OK effect-dispatch code" and the
    /// `DLSSG.CmdQueue`/`DLSSG.CmdAlloc` path in 4.E Phase 0).
    pub fn required_void_pointer(&self, key: &str) -> Result<*mut core::ffi::c_void, CoreError> {
        self.bag
            .get_void_pointer(key)
            .filter(|p| !p.is_null())
            .ok_or_else(|| CoreError::NotFound(format!("required bag key {key:?} missing")))
    }
}

/// Well-known keys the core writes back into the bag (spec.md §6).
pub mod keys {
    pub const WIDTH: &str = "Width";
    pub const HEIGHT: &str = "Height";

    pub const MUST_CALL_EVAL: &str = "DLSSG.MustCallEval";
    pub const BURST_CAPTURE_RUNNING: &str = "DLSSG.BurstCaptureRunning";
    pub const FLUSH_REQUIRED: &str = "DLSSG.FlushRequired";

    pub const ENABLE_INTERP: &str = "DLSSG.EnableInterp";
    pub const IS_RECORDING: &str = "DLSSG.IsRecording";
    pub const CMD_QUEUE: &str = "DLSSG.CmdQueue";
    pub const CMD_ALLOC: &str = "DLSSG.CmdAlloc";
    pub const DEPTH: &str = "DLSSG.Depth";
    pub const MVECS: &str = "DLSSG.MVecs";
    pub const BACKBUFFER: &str = "DLSSG.Backbuffer";
    pub const HUDLESS: &str = "DLSSG.HUDLess";
    pub const OUTPUT_REAL: &str = "DLSSG.OutputReal";
    pub const OUTPUT_INTERPOLATED: &str = "DLSSG.OutputInterpolated";
    pub const DEPTH_SUBRECT_WIDTH: &str = "DLSSG.DepthSubrectWidth";
    pub const DEPTH_SUBRECT_HEIGHT: &str = "DLSSG.DepthSubrectHeight";
    pub const MVECS_SUBRECT_WIDTH: &str = "DLSSG.MVecsSubrectWidth";
    pub const MVECS_SUBRECT_HEIGHT: &str = "DLSSG.MVecsSubrectHeight";
    pub const MVEC_SCALE_X: &str = "DLSSG.MvecScaleX";
    pub const MVEC_SCALE_Y: &str = "DLSSG.MvecScaleY";
    pub const JITTER_OFFSET_X: &str = "DLSSG.JitterOffsetX";
    pub const JITTER_OFFSET_Y: &str = "DLSSG.JitterOffsetY";
    pub const COLOR_BUFFERS_HDR: &str = "DLSSG.ColorBuffersHDR";
    pub const DEPTH_INVERTED: &str = "DLSSG.DepthInverted";
    pub const RESET: &str = "DLSSG.Reset";
    pub const MVEC_JITTERED: &str = "DLSSG.MVecJittered";
    pub const CAMERA_FOV: &str = "DLSSG.CameraFOV";
    pub const CAMERA_NEAR: &str = "DLSSG.CameraNear";
    pub const CAMERA_FAR: &str = "DLSSG.CameraFar";
    pub const UI_MASK: &str = "DLSSG.UIMask";

    pub const RESOURCE_ALLOC_CALLBACK: &str = "ResourceAllocCallback";
    pub const RESOURCE_RELEASE_CALLBACK: &str = "ResourceReleaseCallback";

    pub const SYNC_CREATE_TIMELINE_OBJECTS_CALLBACK: &str =
        "DLSSG.CreateTimelineSyncObjectsCallback";
    pub const SYNC_SIGNAL_CALLBACK: &str = "DLSSG.SyncSignalCallback";
    pub const SYNC_WAIT_CALLBACK: &str = "DLSSG.SyncWaitCallback";
    pub const SYNC_FLUSH_CALLBACK: &str = "DLSSG.SyncFlushCallback";
}

#[allow(dead_code)]
fn _assert_param_value_is_used(_: ParamValue) {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MockBag {
        u32s: HashMap<String, u32>,
        f32s: HashMap<String, f32>,
        ptrs: HashMap<String, *mut core::ffi::c_void>,
    }

    impl ParamBag for MockBag {
        fn set_void_pointer(&mut self, key: &str, value: *mut core::ffi::c_void) {
            self.ptrs.insert(key.to_string(), value);
        }
        fn set_u32(&mut self, key: &str, value: u32) {
            self.u32s.insert(key.to_string(), value);
        }
        fn get_void_pointer(&self, key: &str) -> Option<*mut core::ffi::c_void> {
            self.ptrs.get(key).copied()
        }
        fn get_u32(&self, key: &str) -> Option<u32> {
            self.u32s.get(key).copied()
        }
        fn get_f32(&self, key: &str) -> Option<f32> {
            self.f32s.get(key).copied()
        }
    }

    #[test]
    fn missing_u32_key_falls_back_to_default() {
        let bag = MockBag::default();
        let reader = ParamReader::new(&bag);
        assert_eq!(reader.u32_or(keys::WIDTH, 1920), 1920);
    }

    #[test]
    fn present_u32_key_overrides_default() {
        let mut bag = MockBag::default();
        bag.set_u32(keys::WIDTH, 2560);
        let reader = ParamReader::new(&bag);
        assert_eq!(reader.u32_or(keys::WIDTH, 1920), 2560);
    }

    #[test]
    fn required_void_pointer_rejects_null_and_missing() {
        let mut bag = MockBag::default();
        let reader = ParamReader::new(&bag);
        assert!(reader.required_void_pointer(keys::CMD_QUEUE).is_err());
        bag.set_void_pointer(keys::CMD_QUEUE, std::ptr::null_mut());
        let reader = ParamReader::new(&bag);
        assert!(reader.required_void_pointer(keys::CMD_QUEUE).is_err());
    }

    #[test]
    fn bool_or_treats_nonzero_as_true() {
        let mut bag = MockBag::default();
        bag.set_u32(keys::ENABLE_INTERP, 1);
        let reader = ParamReader::new(&bag);
        assert!(reader.bool_or(keys::ENABLE_INTERP, false));
    }
}
