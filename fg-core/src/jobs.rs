//! GPU job scheduling abstraction (spec.md §9, design note).
//!
//! The original schedules compute/clear/copy jobs into a small queue that
//! is flushed once per dispatch. spec.md's design note says an
//! implementer "need not replicate the job queue; a direct command-list
//! recorder is equivalent" — so [`CommandRecorder`] is that direct
//! recorder: each `schedule_*` call records onto the live command list
//! immediately, and [`CommandRecorder::execute_queued`] is the point where
//! anything genuinely batched (here: none) would be flushed. Keeping the
//! `schedule_*`/`execute_queued` split instead of collapsing it to
//! "record immediately" keeps the call sites in [`crate::dilation`] and
//! [`crate::orchestrator`] reading the same way the original's job-queue
//! code does, which is what a production backend would want to swap in a
//! real queue underneath later.

use fgh::resource::GpuResource;
use fgt::ResourceState;

use crate::error::CoreError;

/// One compute dispatch: pipeline identity is the caller's concern
/// ([`crate::dilation`] resolves it); this only carries the grid size.
#[derive(Copy, Clone, Debug)]
pub struct ComputeExtent {
    pub groups_x: u32,
    pub groups_y: u32,
    pub groups_z: u32,
}

impl ComputeExtent {
    /// `ceil(render_w / 8) x ceil(render_h / 8) x 1`, the dispatch size the
    /// dilation effect uses (spec.md §4.F).
    pub fn ceil_div_8(render_width: u32, render_height: u32) -> Self {
        Self {
            groups_x: render_width.div_ceil(8),
            groups_y: render_height.div_ceil(8),
            groups_z: 1,
        }
    }
}

/// Backend-agnostic recorder the orchestrator and the dilation effect drive
/// to build up one frame's command list. A real implementation wraps a
/// `ID3D12GraphicsCommandList`/`VkCommandBuffer`; tests use an in-memory
/// recorder that just counts calls.
pub trait CommandRecorder {
    fn schedule_clear_float(&mut self, target: &GpuResource, value: f32) -> Result<(), CoreError>;
    fn schedule_copy(&mut self, dst: &GpuResource, src: &GpuResource) -> Result<(), CoreError>;
    fn schedule_compute(&mut self, extent: ComputeExtent) -> Result<(), CoreError>;
    fn transition(&mut self, resource: &mut GpuResource, to: ResourceState) -> Result<(), CoreError>;
    fn execute_queued(&mut self) -> Result<(), CoreError>;

    /// Opens a command list against the given queue/allocator (D3D12
    /// `Reset`, Vulkan `vkBeginCommandBuffer`). Only called when the host's
    /// `DLSSG.IsRecording` says it isn't already recording one (spec.md
    /// §4.E, Phase 0).
    fn begin_recording(
        &mut self,
        queue: *mut core::ffi::c_void,
        allocator: *mut core::ffi::c_void,
    ) -> Result<(), CoreError>;

    /// Closes the command list opened by [`Self::begin_recording`] (D3D12
    /// `Close`, Vulkan `vkEndCommandBuffer`; spec.md §4.E, Phase 5).
    fn end_recording(&mut self) -> Result<(), CoreError>;

    /// The underlying `ID3D12GraphicsCommandList`/`VkCommandBuffer` this
    /// recorder wraps, as an opaque pointer. The third-party FG/optical-flow
    /// effect contexts dispatch directly onto this rather than through
    /// `schedule_compute` (spec.md §1: that effect is an external
    /// collaborator this crate never drives the GPU work of itself).
    /// Defaults to null, which in-memory test recorders never dereference.
    fn raw_command_list(&mut self) -> *mut core::ffi::c_void {
        std::ptr::null_mut()
    }
}

/// In-memory recorder used by unit and scenario tests: records what was
/// asked of it without touching a device.
#[derive(Default, Debug)]
pub struct RecordingLog {
    pub clears: Vec<f32>,
    pub copies: usize,
    pub computes: Vec<ComputeExtent>,
    pub transitions: Vec<ResourceState>,
    pub executed: bool,
    pub recordings_opened: usize,
    pub recordings_closed: usize,
}

impl CommandRecorder for RecordingLog {
    fn schedule_clear_float(&mut self, _target: &GpuResource, value: f32) -> Result<(), CoreError> {
        self.clears.push(value);
        Ok(())
    }

    fn schedule_copy(&mut self, _dst: &GpuResource, _src: &GpuResource) -> Result<(), CoreError> {
        self.copies += 1;
        Ok(())
    }

    fn schedule_compute(&mut self, extent: ComputeExtent) -> Result<(), CoreError> {
        self.computes.push(extent);
        Ok(())
    }

    fn transition(&mut self, resource: &mut GpuResource, to: ResourceState) -> Result<(), CoreError> {
        resource.set_state(to);
        self.transitions.push(to);
        Ok(())
    }

    fn execute_queued(&mut self) -> Result<(), CoreError> {
        self.executed = true;
        Ok(())
    }

    fn begin_recording(
        &mut self,
        _queue: *mut core::ffi::c_void,
        _allocator: *mut core::ffi::c_void,
    ) -> Result<(), CoreError> {
        self.recordings_opened += 1;
        Ok(())
    }

    fn end_recording(&mut self) -> Result<(), CoreError> {
        self.recordings_closed += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ceil_div_8_rounds_up() {
        let extent = ComputeExtent::ceil_div_8(1920, 1080);
        assert_eq!(extent.groups_x, 240);
        assert_eq!(extent.groups_y, 135);
        assert_eq!(extent.groups_z, 1);

        let extent = ComputeExtent::ceil_div_8(33, 1);
        assert_eq!(extent.groups_x, 5);
    }
}
