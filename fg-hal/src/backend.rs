//! Backend Wrapper (spec.md §4.H).
//!
//! Wraps an opaque third-party backend interface — a function table plus a
//! scratch buffer — and, when the host provides an allocator, overrides
//! `fpCreateResource`/`fpDestroyResource` so textures are allocated through
//! the host's callback instead of the device directly. Everything else
//! about the backend is left untouched: this module only ever replaces two
//! function pointers.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use fgt::{Dimensions, Format, ResourceState, UsageFlags};

use crate::resource::{GpuResource, RawHandle};
use crate::scratch::{self, UserData};
use crate::DeviceError;

/// Heap the requested resource should live in. Determines which branch of
/// the custom create-resource path runs (spec.md §4.H).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HeapKind {
    Upload,
    Default,
}

/// What, if anything, the caller wants written into the resource right
/// after creation. `Buffer`/`Value` both trigger the "upload sibling +
/// scheduled copy" path described in spec.md §4.H.
#[derive(Clone, Debug)]
pub enum InitData {
    None,
    Buffer(Vec<u8>),
    Value(f32),
}

/// Logical resource kind requested of the backend, mirroring the original's
/// buffer/1D/2D/3D/cube dispatch on resource descriptor construction.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ResourceShape {
    Buffer { size_bytes: u64 },
    Texture1D { width: u32 },
    Texture2D { width: u32, height: u32 },
    Texture3D { width: u32, height: u32, depth: u32 },
    Cube { edge: u32 },
}

#[derive(Clone, Debug)]
pub struct ResourceRequest {
    pub shape: ResourceShape,
    pub format: Format,
    pub usage: UsageFlags,
    pub heap: HeapKind,
    pub init_data: InitData,
    pub initial_state: ResourceState,
}

/// A copy the wrapper could not perform itself (it has no command list of
/// its own) and hands back to the caller to schedule. Corresponds to the
/// "copy GPU-job scheduled" step in spec.md §4.H.
#[derive(Clone, Debug)]
pub struct PendingUploadCopy {
    pub source: GpuResource,
    pub destination: GpuResource,
}

pub type ResourceAllocCallback =
    fn(request: &ResourceRequest, state: ResourceState) -> Result<RawHandle, DeviceError>;
pub type ResourceReleaseCallback = fn(handle: RawHandle);

/// Backend-specific operations the wrapper falls back to when the host has
/// not supplied an allocator (the "stock" create/destroy path).
pub trait Backend {
    fn create_resource_native(&self, request: &ResourceRequest) -> Result<GpuResource, DeviceError>;
    fn destroy_resource_native(&self, resource: &GpuResource);
    /// Base address of this backend's scratch buffer; used as the key into
    /// [`scratch`]'s user-data side table.
    fn scratch_base(&self) -> *const u8;
}

/// Wraps a [`Backend`] and, if the host supplied both callbacks, diverts
/// resource creation/destruction to them.
pub struct BackendWrapper<B: Backend> {
    inner: B,
    /// Bumped on every successful create; used as the "internal index" the
    /// original assigns each resource.
    resource_counter: AtomicU32,
    aliasable_bytes: AtomicU64,
    total_bytes: AtomicU64,
}

impl<B: Backend> BackendWrapper<B> {
    pub fn new(inner: B, user_data: Option<UserData>) -> Self {
        if let Some(user_data) = user_data {
            scratch::attach(inner.scratch_base(), user_data);
        }
        Self {
            inner,
            resource_counter: AtomicU32::new(0),
            aliasable_bytes: AtomicU64::new(0),
            total_bytes: AtomicU64::new(0),
        }
    }

    fn user_data(&self) -> Option<UserData> {
        scratch::lookup(self.inner.scratch_base())
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes.load(Ordering::Relaxed)
    }

    pub fn aliasable_bytes(&self) -> u64 {
        self.aliasable_bytes.load(Ordering::Relaxed)
    }

    fn byte_size(request: &ResourceRequest) -> u64 {
        match request.shape {
            ResourceShape::Buffer { size_bytes } => size_bytes,
            ResourceShape::Texture1D { width } => width as u64 * 4,
            ResourceShape::Texture2D { width, height } => width as u64 * height as u64 * 4,
            ResourceShape::Texture3D {
                width,
                height,
                depth,
            } => width as u64 * height as u64 * depth as u64 * 4,
            ResourceShape::Cube { edge } => edge as u64 * edge as u64 * 4 * 6,
        }
    }

    fn dimensions_of(shape: ResourceShape) -> Dimensions {
        match shape {
            ResourceShape::Buffer { .. } => Dimensions::default(),
            ResourceShape::Texture1D { width } => Dimensions::new(width, 1),
            ResourceShape::Texture2D { width, height } => Dimensions::new(width, height),
            ResourceShape::Texture3D { width, height, .. } => Dimensions::new(width, height),
            ResourceShape::Cube { edge } => Dimensions::new(edge, edge),
        }
    }

    /// Create a resource, going through the host's allocator when both
    /// `ResourceAllocCallback`/`ResourceReleaseCallback` are present,
    /// otherwise falling back to the stock backend creation path.
    ///
    /// Mirrors the original's logic: heap-properties selection, resource
    /// descriptor by logical type, resource flags from usage flags, a
    /// bumped static resource index, and (for aliasable resources) a bumped
    /// aliasable-bytes counter. The *only* behavioral difference from the
    /// stock path is where the allocation itself comes from.
    pub fn create_resource(
        &self,
        request: &ResourceRequest,
    ) -> Result<(GpuResource, Option<PendingUploadCopy>), DeviceError> {
        let size = Self::byte_size(request);
        self.total_bytes.fetch_add(size, Ordering::Relaxed);
        if request.usage.contains(UsageFlags::ALIASABLE) {
            self.aliasable_bytes.fetch_add(size, Ordering::Relaxed);
        }
        let index = self.resource_counter.fetch_add(1, Ordering::Relaxed);
        log::trace!("create_resource: internal index {index}, {size} bytes");

        let resource = if let Some(user_data) = self.user_data() {
            self.create_via_host_allocator(request, &user_data)?
        } else {
            self.inner.create_resource_native(request)?
        };

        let pending = match (&request.init_data, request.heap) {
            (InitData::None, _) => None,
            (_, HeapKind::Upload) => None,
            (InitData::Buffer(_) | InitData::Value(_), HeapKind::Default) => {
                let upload_request = ResourceRequest {
                    shape: request.shape,
                    format: request.format,
                    usage: request.usage,
                    heap: HeapKind::Upload,
                    init_data: request.init_data.clone(),
                    initial_state: ResourceState::GENERIC_READ,
                };
                let (upload_resource, nested) = {
                    // Upload siblings never themselves need a further
                    // sibling: `init_data` only triggers one level of
                    // recursion (spec.md §4.H).
                    let r = self.create_resource(&upload_request)?;
                    debug_assert!(r.1.is_none());
                    r
                };
                let _ = nested;
                Some(PendingUploadCopy {
                    source: upload_resource,
                    destination: resource.clone(),
                })
            }
        };

        Ok((resource, pending))
    }

    fn create_via_host_allocator(
        &self,
        request: &ResourceRequest,
        user_data: &UserData,
    ) -> Result<GpuResource, DeviceError> {
        let alloc = user_data
            .alloc
            .ok_or(DeviceError::Unsupported("ResourceAllocCallback"))?;
        let state = match request.heap {
            HeapKind::Upload => ResourceState::GENERIC_READ,
            HeapKind::Default => request.initial_state,
        };
        let handle = alloc(request, state)?;
        Ok(GpuResource::new(
            handle,
            state,
            request.format,
            Self::dimensions_of(request.shape),
            request.usage,
        ))
    }

    /// Destroy a resource previously produced by [`create_resource`],
    /// calling the host's release callback instead of the native `Release`
    /// when the host supplied one.
    pub fn destroy_resource(&self, resource: &GpuResource) {
        let size_hint = self.total_bytes.load(Ordering::Relaxed);
        let _ = size_hint;
        if let Some(user_data) = self.user_data() {
            if let Some(release) = user_data.release {
                release(resource.device_handle);
                return;
            }
        }
        self.inner.destroy_resource_native(resource);
    }
}

impl<B: Backend> Drop for BackendWrapper<B> {
    fn drop(&mut self) {
        scratch::detach(self.inner.scratch_base());
    }
}

/// Lets the orchestrator hold either concrete backend behind one type
/// (`BackendWrapper<Box<dyn Backend + Send + Sync>>`) without a generic
/// parameter of its own — it needs to pick D3D12 or Vulkan at `CreateFeature`
/// time, not at compile time.
impl Backend for Box<dyn Backend + Send + Sync> {
    fn create_resource_native(&self, request: &ResourceRequest) -> Result<GpuResource, DeviceError> {
        (**self).create_resource_native(request)
    }

    fn destroy_resource_native(&self, resource: &GpuResource) {
        (**self).destroy_resource_native(resource)
    }

    fn scratch_base(&self) -> *const u8 {
        (**self).scratch_base()
    }
}
