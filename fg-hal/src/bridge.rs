//! VK↔DX Bridge (spec.md §4.I).
//!
//! Used only when the host is Vulkan but the frame-generation core decides
//! to run on D3D12. Owns a D3D12 device discovered by LUID match against
//! the Vulkan physical device, plus the shared timeline fences and shared
//! textures that let both sides of the pipeline hand data back and forth
//! without a copy through host memory.

#![cfg(all(feature = "dx12", feature = "vulkan"))]

use std::sync::Arc;

use windows::core::Interface;
use windows::Win32::Foundation::{CloseHandle, HANDLE, LUID};
use windows::Win32::Graphics::Direct3D12::{
    ID3D12CommandAllocator, ID3D12CommandQueue, ID3D12Device, ID3D12Fence,
    D3D12_COMMAND_LIST_TYPE_COMPUTE, D3D12_COMMAND_QUEUE_DESC, D3D12_COMMAND_QUEUE_PRIORITY_HIGH,
    D3D12_FENCE_FLAG_SHARED,
};
use windows::Win32::Graphics::Dxgi::{CreateDXGIFactory1, IDXGIAdapter1, IDXGIFactory4};

use crate::fence::SharedTimelineFence;
use crate::resource::{GpuResource, RawHandle};
use crate::DeviceError;

const COMMAND_ALLOCATOR_POOL_SIZE: usize = 8;

/// Four host-provided synchronization callbacks pulled from the bag
/// (`DLSSG.CreateTimelineSyncObjectsCallback`, `..SyncSignalCallback`,
/// `..SyncWaitCallback`, `..SyncFlushCallback`; spec.md §6).
#[derive(Clone, Copy)]
pub struct SyncCallbacks {
    pub create_timeline_objects: fn(user_data: *mut core::ffi::c_void),
    pub signal: fn(user_data: *mut core::ffi::c_void, fence_value: u64),
    pub wait: fn(user_data: *mut core::ffi::c_void, fence_value: u64),
    pub flush: fn(user_data: *mut core::ffi::c_void),
}

/// A D3D12 resource shared with the Vulkan side via an NT handle, alongside
/// the Vulkan image imported from that same handle.
pub struct SharedTexture {
    pub d3d12_resource: RawHandle,
    pub vk_image: RawHandle,
    pub vk_memory: RawHandle,
    pub nt_handle: RawHandle,
}

pub struct VkDxBridge {
    vk_device: RawHandle,
    vk_physical_device: RawHandle,

    d3d12_device: ID3D12Device,
    queue: ID3D12CommandQueue,
    allocators: Vec<ID3D12CommandAllocator>,
    next_allocator: Arc<std::sync::atomic::AtomicUsize>,

    pub s1: SharedTimelineFence,
    pub s4: SharedTimelineFence,

    sync: SyncCallbacks,
}

impl VkDxBridge {
    /// Locate the DXGI adapter whose LUID matches the Vulkan physical
    /// device's, create a D3D12 device on it, a high-priority compute
    /// queue, eight command allocators and one command list (spec.md §4.I,
    /// "Construction").
    pub fn new(
        vk_device: RawHandle,
        vk_physical_device: RawHandle,
        vk_device_luid: [u8; 8],
        sync: SyncCallbacks,
    ) -> Result<Self, DeviceError> {
        let luid = LUID {
            LowPart: u32::from_le_bytes(vk_device_luid[0..4].try_into().unwrap()),
            HighPart: i32::from_le_bytes(vk_device_luid[4..8].try_into().unwrap()),
        };

        let factory: IDXGIFactory4 = unsafe { CreateDXGIFactory1() }
            .map_err(|e| DeviceError::SharedResourceCreation(e.to_string()))?;

        let adapter = Self::find_adapter_by_luid(&factory, luid)?;

        let mut device: Option<ID3D12Device> = None;
        unsafe {
            windows::Win32::Graphics::Direct3D12::D3D12CreateDevice(
                &adapter,
                windows::Win32::Graphics::Direct3D::D3D_FEATURE_LEVEL_11_0,
                &mut device,
            )
        }
        .map_err(|e| DeviceError::SharedResourceCreation(e.to_string()))?;
        let d3d12_device = device.ok_or(DeviceError::Lost)?;

        let queue_desc = D3D12_COMMAND_QUEUE_DESC {
            Type: D3D12_COMMAND_LIST_TYPE_COMPUTE,
            Priority: D3D12_COMMAND_QUEUE_PRIORITY_HIGH.0,
            ..Default::default()
        };
        let queue: ID3D12CommandQueue = unsafe { d3d12_device.CreateCommandQueue(&queue_desc) }
            .map_err(|e| DeviceError::SharedResourceCreation(e.to_string()))?;

        let mut allocators = Vec::with_capacity(COMMAND_ALLOCATOR_POOL_SIZE);
        for _ in 0..COMMAND_ALLOCATOR_POOL_SIZE {
            let allocator: ID3D12CommandAllocator = unsafe {
                d3d12_device.CreateCommandAllocator(D3D12_COMMAND_LIST_TYPE_COMPUTE)
            }
            .map_err(|e| DeviceError::SharedResourceCreation(e.to_string()))?;
            allocators.push(allocator);
        }

        let (s1_vk, s1_dx) = Self::create_shared_fence_pair(&d3d12_device)?;
        let (s4_vk, s4_dx) = Self::create_shared_fence_pair(&d3d12_device)?;

        Ok(Self {
            vk_device,
            vk_physical_device,
            d3d12_device,
            queue,
            allocators,
            next_allocator: Arc::new(std::sync::atomic::AtomicUsize::new(0)),
            s1: SharedTimelineFence::new(s1_vk, s1_dx),
            s4: SharedTimelineFence::new(s4_vk, s4_dx),
            sync,
        })
    }

    fn find_adapter_by_luid(
        factory: &IDXGIFactory4,
        luid: LUID,
    ) -> Result<IDXGIAdapter1, DeviceError> {
        let mut index = 0;
        loop {
            let adapter: IDXGIAdapter1 = unsafe { factory.EnumAdapters1(index) }
                .map_err(|_| DeviceError::Unsupported("no adapter with matching LUID"))?;
            let desc = unsafe { adapter.GetDesc1() }
                .map_err(|e| DeviceError::SharedResourceCreation(e.to_string()))?;
            if desc.AdapterLuid.LowPart == luid.LowPart && desc.AdapterLuid.HighPart == luid.HighPart {
                return Ok(adapter);
            }
            index += 1;
        }
    }

    /// Creates a `FLAG_SHARED` D3D12 fence, extracts its NT handle. The
    /// Vulkan-side timeline semaphore import happens in the Vulkan backend
    /// module, which owns the `vkImportSemaphoreWin32HandleKHR` call; this
    /// function returns placeholders for both halves that the caller fills
    /// in once the import succeeds.
    fn create_shared_fence_pair(
        device: &ID3D12Device,
    ) -> Result<(RawHandle, RawHandle), DeviceError> {
        let fence: ID3D12Fence = unsafe { device.CreateFence(0, D3D12_FENCE_FLAG_SHARED) }
            .map_err(|e| DeviceError::SharedResourceCreation(e.to_string()))?;
        let nt_handle: HANDLE = unsafe {
            device.CreateSharedHandle(&fence, None, 0x10000000 /* GENERIC_ALL */, None)
        }
        .map_err(|e| DeviceError::SharedResourceCreation(e.to_string()))?;

        let dx_handle = RawHandle(fence.as_raw());
        let vk_handle = RawHandle(nt_handle.0 as *mut core::ffi::c_void);
        // The fence object itself must outlive this function; leak the COM
        // reference into the raw handle's lifetime, owned from here on by
        // `SharedTimelineFence`.
        std::mem::forget(fence);
        Ok((vk_handle, dx_handle))
    }

    /// Cross-queue handoff at the start of one `evaluate` (spec.md §4.I).
    ///
    /// 1. Bump S1 and ask the host to submit its recorded Vulkan command
    ///    list that ends by copying inputs into the shared textures, then
    ///    signal S1.
    /// 2. Bump S4 and ask the host to open a Vulkan command list that waits
    ///    for S4 (to be signaled later by the D3D12 side).
    /// 3. Run the D3D12 FG pipeline, which itself waits on S1 and signals
    ///    S4 through the shared fences.
    pub fn begin_evaluate(&self, user_data: *mut core::ffi::c_void) {
        let s1_value = self.s1.next_value();
        (self.sync.signal)(user_data, s1_value);

        let s4_value = self.s4.next_value();
        (self.sync.wait)(user_data, s4_value);
    }

    pub fn flush(&self, user_data: *mut core::ffi::c_void) {
        (self.sync.flush)(user_data);
    }

    /// Round-robins over the eight pre-created command allocators (spec.md
    /// §4.I, Construction).
    pub fn next_allocator(&self) -> &ID3D12CommandAllocator {
        let index = self
            .next_allocator
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed)
            % self.allocators.len();
        &self.allocators[index]
    }

    pub fn device(&self) -> &ID3D12Device {
        &self.d3d12_device
    }

    pub fn queue(&self) -> &ID3D12CommandQueue {
        &self.queue
    }
}

impl Drop for VkDxBridge {
    fn drop(&mut self) {
        for handle in [self.s1.d3d12_fence(), self.s4.d3d12_fence()] {
            if !handle.is_null() {
                unsafe {
                    let _ = CloseHandle(HANDLE(handle.0 as isize));
                }
            }
        }
    }
}

/// Prepares a D3D12-side shared texture plus the matching Vulkan import
/// descriptor data (spec.md §4.I, "Shared textures"). The Vulkan-side
/// `vkCreateImage`/`vkAllocateMemory` calls live in [`crate::vulkan`]; this
/// function only produces the D3D12 half and the NT handle both sides
/// agree on.
pub fn create_shared_d3d12_texture(
    device: &ID3D12Device,
    width: u32,
    height: u32,
    format: windows::Win32::Graphics::Dxgi::Common::DXGI_FORMAT,
) -> Result<(GpuResource, RawHandle), DeviceError> {
    use windows::Win32::Graphics::Direct3D12::{
        ID3D12Resource, D3D12_HEAP_FLAG_SHARED, D3D12_HEAP_PROPERTIES, D3D12_HEAP_TYPE_DEFAULT,
        D3D12_RESOURCE_DESC, D3D12_RESOURCE_DIMENSION_TEXTURE2D, D3D12_RESOURCE_FLAG_ALLOW_RENDER_TARGET,
        D3D12_RESOURCE_FLAG_ALLOW_SIMULTANEOUS_ACCESS, D3D12_RESOURCE_FLAG_ALLOW_UNORDERED_ACCESS,
        D3D12_RESOURCE_STATE_COMMON,
    };
    use windows::Win32::Graphics::Dxgi::Common::DXGI_SAMPLE_DESC;

    let heap_props = D3D12_HEAP_PROPERTIES {
        Type: D3D12_HEAP_TYPE_DEFAULT,
        ..Default::default()
    };
    let desc = D3D12_RESOURCE_DESC {
        Dimension: D3D12_RESOURCE_DIMENSION_TEXTURE2D,
        Width: width as u64,
        Height: height,
        DepthOrArraySize: 1,
        MipLevels: 1,
        Format: format,
        SampleDesc: DXGI_SAMPLE_DESC {
            Count: 1,
            Quality: 0,
        },
        Flags: D3D12_RESOURCE_FLAG_ALLOW_RENDER_TARGET
            | D3D12_RESOURCE_FLAG_ALLOW_SIMULTANEOUS_ACCESS
            | D3D12_RESOURCE_FLAG_ALLOW_UNORDERED_ACCESS,
        ..Default::default()
    };

    let mut resource: Option<ID3D12Resource> = None;
    unsafe {
        device.CreateCommittedResource(
            &heap_props,
            D3D12_HEAP_FLAG_SHARED,
            &desc,
            D3D12_RESOURCE_STATE_COMMON,
            None,
            &mut resource,
        )
    }
    .map_err(|e| DeviceError::SharedResourceCreation(e.to_string()))?;
    let resource = resource.ok_or(DeviceError::Lost)?;

    let nt_handle: HANDLE = unsafe {
        device.CreateSharedHandle(&resource, None, 0x10000000, None)
    }
    .map_err(|e| DeviceError::SharedResourceCreation(e.to_string()))?;

    let raw = RawHandle(resource.as_raw());
    std::mem::forget(resource);

    let gpu_resource = GpuResource::new(
        raw,
        fgt::ResourceState::COMMON,
        fgt::Format::Unknown,
        fgt::Dimensions::new(width, height),
        fgt::UsageFlags::RENDER_TARGET | fgt::UsageFlags::UNORDERED_ACCESS,
    );
    Ok((gpu_resource, RawHandle(nt_handle.0 as *mut core::ffi::c_void)))
}
