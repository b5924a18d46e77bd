//! Shared cross-API timeline fences (spec.md §3, "Shared cross-API
//! objects"; §4.I).
//!
//! Grounded on the teacher's own `vulkan::Fence` (`TimelineSemaphore`
//! variant): a monotonically increasing counter, with "wait for N" defined
//! as "blocks until signal ≥ N". Unlike the teacher's `Fence`, which also
//! supports a `FencePool` fallback for pre-1.2 Vulkan, a bridge fence is
//! *always* a timeline object on both sides — the bridge only exists when
//! both a D3D12 fence with an NT handle and a Vulkan timeline semaphore
//! imported from that handle are available (spec.md §4.I requires the
//! import entry points as a precondition of bridge construction).

use std::sync::atomic::{AtomicU64, Ordering};

use crate::resource::RawHandle;
use crate::DeviceError;

/// One half-pair of the bridge's two fences (named `S1`/`S4` in spec.md
/// §3/§4.I).
pub struct SharedTimelineFence {
    vk_semaphore: RawHandle,
    d3d12_fence: RawHandle,
    counter: AtomicU64,
}

impl SharedTimelineFence {
    pub fn new(vk_semaphore: RawHandle, d3d12_fence: RawHandle) -> Self {
        Self {
            vk_semaphore,
            d3d12_fence,
            counter: AtomicU64::new(0),
        }
    }

    pub fn vk_semaphore(&self) -> RawHandle {
        self.vk_semaphore
    }

    pub fn d3d12_fence(&self) -> RawHandle {
        self.d3d12_fence
    }

    /// Bump the counter and return the new value to signal to.
    pub fn next_value(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn current_value(&self) -> u64 {
        self.counter.load(Ordering::Acquire)
    }
}

/// Creates the D3D12 half of a shared fence (`FLAG_SHARED`) and extracts its
/// NT handle; the Vulkan half is imported from that handle by the caller
/// (spec.md §4.I, "Shared timeline fences").
pub trait FenceFactory {
    fn create_shared_d3d12_fence(&self) -> Result<(RawHandle, RawHandle), DeviceError>;
    fn import_d3d12_fence_as_timeline_semaphore(
        &self,
        nt_handle: RawHandle,
    ) -> Result<RawHandle, DeviceError>;
}
