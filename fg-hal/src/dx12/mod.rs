/*!
# D3D12 backend.

The interpolator orchestrator always runs its own compute effects on D3D12
(spec.md §4.I: "the host is Vulkan but FG must run on D3D12" — the core
itself never runs the effect chain on Vulkan). This module is the `Backend`
implementation the wrapper in [`crate::backend`] falls back to when the host
has not supplied `ResourceAllocCallback`/`ResourceReleaseCallback`.
!*/

use windows::core::Interface;
use windows::Win32::Graphics::Direct3D12::{
    ID3D12Device, ID3D12Resource, D3D12_HEAP_FLAG_NONE, D3D12_HEAP_PROPERTIES,
    D3D12_HEAP_TYPE_DEFAULT, D3D12_HEAP_TYPE_UPLOAD, D3D12_RESOURCE_DESC,
    D3D12_RESOURCE_DIMENSION_BUFFER, D3D12_RESOURCE_DIMENSION_TEXTURE1D,
    D3D12_RESOURCE_DIMENSION_TEXTURE2D, D3D12_RESOURCE_DIMENSION_TEXTURE3D,
    D3D12_RESOURCE_FLAG_ALLOW_RENDER_TARGET, D3D12_RESOURCE_FLAG_ALLOW_UNORDERED_ACCESS,
    D3D12_RESOURCE_FLAG_NONE, D3D12_RESOURCE_STATE_COMMON, D3D12_RESOURCE_STATE_GENERIC_READ,
};
use windows::Win32::Graphics::Dxgi::Common::{DXGI_FORMAT_UNKNOWN, DXGI_SAMPLE_DESC};

use crate::backend::{Backend, HeapKind, ResourceRequest, ResourceShape};
use crate::resource::{GpuResource, RawHandle};
use crate::DeviceError;
use fgt::{Dimensions, ResourceState, UsageFlags};

pub struct Dx12Backend {
    device: ID3D12Device,
    scratch: Box<[u8]>,
}

impl Dx12Backend {
    pub fn new(device: ID3D12Device, scratch_size: usize) -> Self {
        Self {
            device,
            scratch: vec![0u8; scratch_size].into_boxed_slice(),
        }
    }

    fn resource_desc(shape: ResourceShape, flags: windows::Win32::Graphics::Direct3D12::D3D12_RESOURCE_FLAGS) -> D3D12_RESOURCE_DESC {
        match shape {
            ResourceShape::Buffer { size_bytes } => D3D12_RESOURCE_DESC {
                Dimension: D3D12_RESOURCE_DIMENSION_BUFFER,
                Width: size_bytes,
                Height: 1,
                DepthOrArraySize: 1,
                MipLevels: 1,
                Format: DXGI_FORMAT_UNKNOWN,
                SampleDesc: DXGI_SAMPLE_DESC {
                    Count: 1,
                    Quality: 0,
                },
                Flags: flags,
                ..Default::default()
            },
            ResourceShape::Texture1D { width } => D3D12_RESOURCE_DESC {
                Dimension: D3D12_RESOURCE_DIMENSION_TEXTURE1D,
                Width: width as u64,
                Height: 1,
                DepthOrArraySize: 1,
                MipLevels: 1,
                Flags: flags,
                ..Default::default()
            },
            ResourceShape::Texture2D { width, height } => D3D12_RESOURCE_DESC {
                Dimension: D3D12_RESOURCE_DIMENSION_TEXTURE2D,
                Width: width as u64,
                Height: height,
                DepthOrArraySize: 1,
                MipLevels: 1,
                SampleDesc: DXGI_SAMPLE_DESC {
                    Count: 1,
                    Quality: 0,
                },
                Flags: flags,
                ..Default::default()
            },
            ResourceShape::Texture3D {
                width,
                height,
                depth,
            } => D3D12_RESOURCE_DESC {
                Dimension: D3D12_RESOURCE_DIMENSION_TEXTURE3D,
                Width: width as u64,
                Height: height,
                DepthOrArraySize: depth as u16,
                MipLevels: 1,
                SampleDesc: DXGI_SAMPLE_DESC {
                    Count: 1,
                    Quality: 0,
                },
                Flags: flags,
                ..Default::default()
            },
            ResourceShape::Cube { edge } => D3D12_RESOURCE_DESC {
                Dimension: D3D12_RESOURCE_DIMENSION_TEXTURE2D,
                Width: edge as u64,
                Height: edge,
                DepthOrArraySize: 6,
                MipLevels: 1,
                SampleDesc: DXGI_SAMPLE_DESC {
                    Count: 1,
                    Quality: 0,
                },
                Flags: flags,
                ..Default::default()
            },
        }
    }

    fn resource_flags(usage: UsageFlags) -> windows::Win32::Graphics::Direct3D12::D3D12_RESOURCE_FLAGS {
        let mut flags = D3D12_RESOURCE_FLAG_NONE;
        if usage.contains(UsageFlags::UNORDERED_ACCESS) {
            flags |= D3D12_RESOURCE_FLAG_ALLOW_UNORDERED_ACCESS;
        }
        if usage.contains(UsageFlags::RENDER_TARGET) {
            flags |= D3D12_RESOURCE_FLAG_ALLOW_RENDER_TARGET;
        }
        flags
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
}

impl Backend for Dx12Backend {
    fn create_resource_native(&self, request: &ResourceRequest) -> Result<GpuResource, DeviceError> {
        let flags = Self::resource_flags(request.usage);
        let desc = Self::resource_desc(request.shape, flags);
        let (heap_type, state) = match request.heap {
            HeapKind::Upload => (D3D12_HEAP_TYPE_UPLOAD, D3D12_RESOURCE_STATE_GENERIC_READ),
            HeapKind::Default => (D3D12_HEAP_TYPE_DEFAULT, D3D12_RESOURCE_STATE_COMMON),
        };
        let heap_props = D3D12_HEAP_PROPERTIES {
            Type: heap_type,
            ..Default::default()
        };

        let mut resource: Option<ID3D12Resource> = None;
        unsafe {
            self.device.CreateCommittedResource(
                &heap_props,
                D3D12_HEAP_FLAG_NONE,
                &desc,
                state,
                None,
                &mut resource,
            )
        }
        .map_err(|_| DeviceError::OutOfMemory)?;
        let resource = resource.ok_or(DeviceError::Lost)?;
        let raw = RawHandle(resource.as_raw());
        std::mem::forget(resource);

        let logical_state = match request.heap {
            HeapKind::Upload => ResourceState::GENERIC_READ,
            HeapKind::Default => ResourceState::COMMON,
        };
        Ok(GpuResource::new(
            raw,
            logical_state,
            request.format,
            Self::dimensions_of(request.shape),
            request.usage,
        ))
    }

    fn destroy_resource_native(&self, resource: &GpuResource) {
        if resource.device_handle.is_null() {
            return;
        }
        // SAFETY: `device_handle` was produced by `CreateCommittedResource`
        // above and forgotten into a raw pointer; reconstructing the COM
        // wrapper here and letting it drop is the one place that releases
        // it.
        unsafe {
            let ptr = resource.device_handle.0 as *mut std::ffi::c_void;
            let resource = ID3D12Resource::from_raw(ptr);
            drop(resource);
        }
    }

    fn scratch_base(&self) -> *const u8 {
        self.scratch.as_ptr()
    }
}
