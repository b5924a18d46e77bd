/*!
# Backend wrapper and VK↔DX12 bridge.

This crate owns everything in spec.md that talks to a concrete graphics API:

  - [`backend`]: wraps the opaque third-party effect backend (a function
    table plus a scratch buffer) and overrides its resource allocation so
    that textures come from the host's allocator instead of the device
    directly (4.H).
  - [`bridge`]: the optional Vulkan-host / D3D12-core interop layer — shared
    textures and shared timeline fences (4.I).
  - [`dx12`] / [`vulkan`]: the two backend implementations the wrapper and
    the bridge are generic over.

## Resource lifetime

Every [`GpuResource`] handed across this crate's API is owned by the host or
by the interpolator orchestrator; nothing here frees device memory it did
not itself allocate through the host's callback (spec.md §3, GPU resource
descriptor).
!*/

#![warn(trivial_casts, trivial_numeric_casts, unused_qualifications)]

pub mod backend;
pub mod bridge;
pub mod fence;
pub mod resource;
pub mod scratch;

#[cfg(feature = "dx12")]
pub mod dx12;
#[cfg(feature = "vulkan")]
pub mod vulkan;

pub use backend::{Backend, BackendWrapper, ResourceAllocCallback, ResourceReleaseCallback};
pub use resource::GpuResource;

/// Errors a backend can raise. Maps onto spec.md §7's `BackendFailure` and
/// `Unsupported` kinds; `fg-core` wraps this into its own error enum rather
/// than re-exposing HAL internals at the orchestrator boundary.
#[derive(thiserror::Error, Debug)]
pub enum DeviceError {
    #[error("device lost")]
    Lost,
    #[error("out of memory")]
    OutOfMemory,
    #[error("resource binding name {0:?} did not resolve to a known slot")]
    UnresolvedBindingName(&'static str),
    #[error("shared-resource creation failed: {0}")]
    SharedResourceCreation(String),
    #[error("required capability unavailable: {0}")]
    Unsupported(&'static str),
}
