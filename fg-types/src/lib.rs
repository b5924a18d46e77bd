/*! Plain-data types shared by every crate in the workspace.

Nothing in here talks to a device, a DLL, or the host process; it is the
vocabulary the rest of the workspace (`fg-hal`, `fg-core`, `fg-facade`,
`fg-shim`) uses to talk about GPU resources, status codes and call
parameters without re-deriving them at every layer boundary.
!*/

#![warn(trivial_casts, trivial_numeric_casts, unused_qualifications)]

mod constants;
mod param;
mod permutation;
mod resource;
mod status;

pub use constants::DilationConstants;
pub use param::ParamValue;
pub use permutation::{DilationFlags, InterpolatorFlags};
pub use resource::{Dimensions, Format, ResourceKind, ResourceState, UsageFlags};
pub use status::NgxStatus;

/// `internal_id` of a feature handle. Monotonically increasing, never reused
/// within a process run (spec.md §3, Invariants).
pub type FeatureId = u32;

/// Tag distinguishing which vendor feature a handle was created for.
/// The interposer only ever hands out `FrameGeneration`, but the field is
/// carried because the host may inspect it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum FeatureKind {
    FrameGeneration = 1,
}

/// Identity of a created feature: `internal_id` alone, per spec.md §3
/// ("Identity is by `internal_id` alone").
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FeatureHandle {
    pub internal_id: FeatureId,
    pub feature_kind: FeatureKind,
}
