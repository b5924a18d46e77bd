use fgt::{Dimensions, Format, ResourceState, UsageFlags};

/// The GPU resource descriptor passed between the facade, the orchestrator,
/// the dilation effect, the interpolator wrapper and the backend wrapper
/// (spec.md §3, "GPU resource descriptor (public-facing)").
///
/// The core never allocates or frees the underlying device object through
/// this type; it only transitions `state` and reads the rest as metadata.
#[derive(Clone, Debug)]
pub struct GpuResource {
    pub device_handle: RawHandle,
    pub state: ResourceState,
    pub format: Format,
    pub dimensions: Dimensions,
    pub usage: UsageFlags,
}

impl GpuResource {
    pub fn new(
        device_handle: RawHandle,
        state: ResourceState,
        format: Format,
        dimensions: Dimensions,
        usage: UsageFlags,
    ) -> Self {
        Self {
            device_handle,
            state,
            format,
            dimensions,
            usage,
        }
    }

    /// Record a transition without touching the device; the caller (the
    /// orchestrator or the backend wrapper) is responsible for recording the
    /// matching GPU barrier alongside this bookkeeping update.
    pub fn set_state(&mut self, next: ResourceState) -> ResourceState {
        std::mem::replace(&mut self.state, next)
    }
}

/// Backend-opaque device handle. The host and the third-party backend both
/// see a raw `ID3D12Resource*` or `VkImage`/`VkBuffer`, so this is the one
/// place in the HAL layer that carries a bare pointer instead of a typed
/// wrapper — everything above this module only ever moves a `RawHandle`
/// around, never dereferences it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RawHandle(pub *mut core::ffi::c_void);

// SAFETY: `RawHandle` is an opaque handle into host- or driver-owned memory
// that this crate never dereferences on its own account; it only forwards
// the pointer to the backend that originated it.
unsafe impl Send for RawHandle {}
unsafe impl Sync for RawHandle {}

impl RawHandle {
    pub const NULL: RawHandle = RawHandle(std::ptr::null_mut());

    pub fn is_null(self) -> bool {
        self.0.is_null()
    }
}
