use bitflags::bitflags;

bitflags! {
    /// Dilation effect permutation flags (spec.md §4.F). Cache key for the
    /// lazily-compiled pipeline-state map.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct DilationFlags: u32 {
        const HDR_COLOR_INPUT         = 1 << 0;
        const DEPTH_INVERTED          = 1 << 1;
        const DISPLAY_RESOLUTION_MVS  = 1 << 2;
        const MV_JITTER_CANCELLATION  = 1 << 3;
        const MVS_PRE_DILATED         = 1 << 4;
        const DEPTH_PLANE_AT_INFINITY = 1 << 5;
        const ALLOW_FP16              = 1 << 6;
        const FORCE_WAVE64            = 1 << 7;
    }
}

bitflags! {
    /// Interpolator effect context flags (spec.md §4.G).
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct InterpolatorFlags: u32 {
        const HDR_COLOR_INPUT        = 1 << 0;
        const DEPTH_INVERTED         = 1 << 1;
        const DEPTH_INFINITE         = 1 << 2;
        const MVS_PRE_DILATED        = 1 << 3;
        const MV_JITTER_CANCELLATION = 1 << 4;
        const MV_FULL_RESOLUTION     = 1 << 5;
    }
}
