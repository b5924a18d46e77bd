//! Concrete [`CommandRecorder`] over a live `ID3D12GraphicsCommandList`.
//!
//! Grounded on the backend wrapper's own state-mapping style in
//! `fg-hal/src/dx12/mod.rs`: local, file-scoped translation tables from the
//! HAL-agnostic vocabulary to the concrete D3D12 enum, rather than exposing
//! a shared mapping function across crates for what is a two-direction,
//! narrow translation.

use windows::core::Interface;
use windows::Win32::Graphics::Direct3D12::{
    ID3D12CommandAllocator, ID3D12DescriptorHeap, ID3D12Device,
    ID3D12GraphicsCommandList, ID3D12Resource,
    D3D12_DESCRIPTOR_HEAP_DESC, D3D12_DESCRIPTOR_HEAP_FLAG_SHADER_VISIBLE, D3D12_DESCRIPTOR_HEAP_TYPE_CBV_SRV_UAV,
    D3D12_RESOURCE_BARRIER, D3D12_RESOURCE_BARRIER_0, D3D12_RESOURCE_BARRIER_FLAG_NONE,
    D3D12_RESOURCE_BARRIER_TYPE_TRANSITION, D3D12_RESOURCE_STATES, D3D12_RESOURCE_STATE_COMMON,
    D3D12_RESOURCE_STATE_COPY_DEST, D3D12_RESOURCE_STATE_COPY_SOURCE, D3D12_RESOURCE_STATE_GENERIC_READ,
    D3D12_RESOURCE_STATE_RENDER_TARGET, D3D12_RESOURCE_STATE_UNORDERED_ACCESS,
    D3D12_RESOURCE_TRANSITION_BARRIER,
};

use fgc::error::CoreError;
use fgc::jobs::{CommandRecorder, ComputeExtent};
use fgh::resource::GpuResource;
use fgt::ResourceState;

const UAV_CLEAR_HEAP_SIZE: u32 = 16;

fn state_to_d3d12(state: ResourceState) -> D3D12_RESOURCE_STATES {
    if state.contains(ResourceState::UNORDERED_ACCESS) {
        D3D12_RESOURCE_STATE_UNORDERED_ACCESS
    } else if state.contains(ResourceState::COPY_DEST) {
        D3D12_RESOURCE_STATE_COPY_DEST
    } else if state.contains(ResourceState::COPY_SOURCE) {
        D3D12_RESOURCE_STATE_COPY_SOURCE
    } else if state.contains(ResourceState::RENDER_TARGET) {
        D3D12_RESOURCE_STATE_RENDER_TARGET
    } else if state.contains(ResourceState::GENERIC_READ) {
        D3D12_RESOURCE_STATE_GENERIC_READ
    } else {
        D3D12_RESOURCE_STATE_COMMON
    }
}

/// Reconstructs a non-owning view of a resource the host (or an earlier
/// [`Backend`](fgh::backend::Backend) call) already holds a reference to.
/// Wrapping in `ManuallyDrop` means this never calls `Release` — the handle
/// is borrowed for the duration of this call only, matching every other
/// `GpuResource::device_handle` consumer in this crate.
fn borrow_resource(resource: &GpuResource) -> Option<std::mem::ManuallyDrop<ID3D12Resource>> {
    if resource.device_handle.is_null() {
        return None;
    }
    let ptr = resource.device_handle.0 as *mut std::ffi::c_void;
    Some(std::mem::ManuallyDrop::new(unsafe { ID3D12Resource::from_raw(ptr) }))
}

pub struct D3d12Recorder {
    device: ID3D12Device,
    list: ID3D12GraphicsCommandList,
    owned_allocator: Option<ID3D12CommandAllocator>,
    uav_heap: ID3D12DescriptorHeap,
    next_uav_slot: u32,
}

impl D3d12Recorder {
    /// Wraps the command list the host handed `EvaluateFeature`. Whether it
    /// is already open (`DLSSG.IsRecording=1`, host owns `Reset`/`Close`) or
    /// needs opening internally is decided by the orchestrator, not here
    /// (spec.md §4.E, Phase 0) — this constructor just attaches the UAV
    /// clear heap the dilation/interpolator bootstrap clears need.
    pub fn wrap(device: ID3D12Device, list: ID3D12GraphicsCommandList) -> Result<Self, CoreError> {
        let uav_heap = Self::create_uav_heap(&device)?;
        Ok(Self {
            device,
            list,
            owned_allocator: None,
            uav_heap,
            next_uav_slot: 0,
        })
    }

    fn create_uav_heap(device: &ID3D12Device) -> Result<ID3D12DescriptorHeap, CoreError> {
        let desc = D3D12_DESCRIPTOR_HEAP_DESC {
            Type: D3D12_DESCRIPTOR_HEAP_TYPE_CBV_SRV_UAV,
            NumDescriptors: UAV_CLEAR_HEAP_SIZE,
            Flags: D3D12_DESCRIPTOR_HEAP_FLAG_SHADER_VISIBLE,
            ..Default::default()
        };
        unsafe { device.CreateDescriptorHeap(&desc) }
            .map_err(|e| CoreError::Unsupported(format!("UAV clear heap creation failed: {e}")))
    }

    fn next_uav_handles(&mut self) -> (windows::Win32::Graphics::Direct3D12::D3D12_CPU_DESCRIPTOR_HANDLE, windows::Win32::Graphics::Direct3D12::D3D12_GPU_DESCRIPTOR_HANDLE) {
        let increment = unsafe {
            self.device
                .GetDescriptorHandleIncrementSize(D3D12_DESCRIPTOR_HEAP_TYPE_CBV_SRV_UAV)
        };
        let slot = self.next_uav_slot;
        self.next_uav_slot = (self.next_uav_slot + 1) % UAV_CLEAR_HEAP_SIZE;
        let mut cpu = unsafe { self.uav_heap.GetCPUDescriptorHandleForHeapStart() };
        cpu.ptr += (slot * increment) as usize;
        let mut gpu = unsafe { self.uav_heap.GetGPUDescriptorHandleForHeapStart() };
        gpu.ptr += (slot * increment) as u64;
        (cpu, gpu)
    }
}

impl CommandRecorder for D3d12Recorder {
    fn schedule_clear_float(&mut self, target: &GpuResource, value: f32) -> Result<(), CoreError> {
        let Some(resource) = borrow_resource(target) else {
            return Ok(());
        };
        let resource = &*resource;
        let (cpu, gpu) = self.next_uav_handles();
        unsafe {
            self.device.CreateUnorderedAccessView(resource, None, None, cpu);
            self.list.SetDescriptorHeaps(&[Some(self.uav_heap.clone())]);
            self.list.ClearUnorderedAccessViewFloat(
                gpu,
                cpu,
                resource,
                &[value, value, value, value],
                None,
            );
        }
        Ok(())
    }

    fn schedule_copy(&mut self, dst: &GpuResource, src: &GpuResource) -> Result<(), CoreError> {
        let (Some(dst_res), Some(src_res)) = (borrow_resource(dst), borrow_resource(src)) else {
            return Ok(());
        };
        unsafe { self.list.CopyResource(&*dst_res, &*src_res) };
        Ok(())
    }

    fn schedule_compute(&mut self, extent: ComputeExtent) -> Result<(), CoreError> {
        // Pipeline/root-signature binding for this dispatch already
        // happened through the vendor effect's own `FfxInterface` calls
        // against this same command list (see `crate::effects`); this
        // only issues the dispatch itself.
        unsafe { self.list.Dispatch(extent.groups_x, extent.groups_y, extent.groups_z) };
        Ok(())
    }

    fn transition(&mut self, resource: &mut GpuResource, to: ResourceState) -> Result<(), CoreError> {
        let before = state_to_d3d12(resource.state);
        let after = state_to_d3d12(to);
        resource.set_state(to);
        let Some(native) = borrow_resource(resource) else {
            return Ok(());
        };
        let native = &*native;
        if before == after {
            return Ok(());
        }
        let barrier = D3D12_RESOURCE_BARRIER {
            Type: D3D12_RESOURCE_BARRIER_TYPE_TRANSITION,
            Flags: D3D12_RESOURCE_BARRIER_FLAG_NONE,
            Anonymous: D3D12_RESOURCE_BARRIER_0 {
                Transition: std::mem::ManuallyDrop::new(D3D12_RESOURCE_TRANSITION_BARRIER {
                    pResource: windows_core::ManuallyDrop::new(Some(native.clone())),
                    Subresource: u32::MAX,
                    StateBefore: before,
                    StateAfter: after,
                }),
            },
        };
        unsafe { self.list.ResourceBarrier(&[barrier]) };
        Ok(())
    }

    fn execute_queued(&mut self) -> Result<(), CoreError> {
        Ok(())
    }

    fn begin_recording(&mut self, queue: *mut core::ffi::c_void, allocator: *mut core::ffi::c_void) -> Result<(), CoreError> {
        if allocator.is_null() {
            return Err(CoreError::InvalidArgument("null command allocator".into()));
        }
        let _ = queue;
        // The host (or our own `required_void_pointer` lookup) owns this
        // allocator's refcount; `from_raw` here just reconstructs the COM
        // wrapper around a handle we don't take ownership of.
        let allocator = unsafe { ID3D12CommandAllocator::from_raw(allocator) };
        unsafe { self.list.Reset(&allocator, None) }
            .map_err(|e| CoreError::Unsupported(format!("command list reset failed: {e}")))?;
        self.owned_allocator = Some(allocator);
        Ok(())
    }

    fn end_recording(&mut self) -> Result<(), CoreError> {
        if self.owned_allocator.take().is_some() {
            unsafe { self.list.Close() }.map_err(|e| CoreError::Unsupported(format!("command list close failed: {e}")))?;
        }
        Ok(())
    }

    fn raw_command_list(&mut self) -> *mut core::ffi::c_void {
        self.list.as_raw()
    }
}
