//! ABI-visible feature handle, matching the original `NGXHandle` layout
//! field-for-field (spec.md §3, §6) so a host that peeks at the two `u32`s
//! directly still sees what it expects.

use fgt::{FeatureHandle, FeatureKind};

#[repr(C)]
pub struct NgxHandle {
    pub internal_id: u32,
    pub internal_feature_id: u32,
}

impl NgxHandle {
    /// Boxes and leaks a handle for `internal.internal_id`. The box is
    /// deliberately never reclaimed by [`crate::release`] — the original's
    /// `ReleaseFeature` only ever drops its own map entry and leaves the
    /// handle allocation alone, so this mirrors that rather than "fixing"
    /// what looks like a leak.
    pub fn allocate(internal: FeatureHandle) -> *mut NgxHandle {
        Box::into_raw(Box::new(NgxHandle {
            internal_id: internal.internal_id,
            internal_feature_id: internal.feature_kind as u32,
        }))
    }

    /// Reads `internal_id` back out of a raw handle pointer the host handed
    /// back in to `EvaluateFeature`/`ReleaseFeature`. The caller must have
    /// checked the pointer for null first.
    pub fn read(raw: *const NgxHandle) -> FeatureHandle {
        let handle = unsafe { &*raw };
        FeatureHandle {
            internal_id: handle.internal_id,
            feature_kind: FeatureKind::FrameGeneration,
        }
    }
}
