//! Concrete [`CommandRecorder`] over a live `VkCommandBuffer`.

use ash::vk;

use fgc::error::CoreError;
use fgc::jobs::{CommandRecorder, ComputeExtent};
use fgh::resource::GpuResource;
use fgt::ResourceState;

fn state_to_vk_access(state: ResourceState) -> (vk::AccessFlags, vk::ImageLayout) {
    if state.contains(ResourceState::UNORDERED_ACCESS) {
        (vk::AccessFlags::SHADER_WRITE | vk::AccessFlags::SHADER_READ, vk::ImageLayout::GENERAL)
    } else if state.contains(ResourceState::COPY_DEST) {
        (vk::AccessFlags::TRANSFER_WRITE, vk::ImageLayout::TRANSFER_DST_OPTIMAL)
    } else if state.contains(ResourceState::COPY_SOURCE) {
        (vk::AccessFlags::TRANSFER_READ, vk::ImageLayout::TRANSFER_SRC_OPTIMAL)
    } else {
        (vk::AccessFlags::empty(), vk::ImageLayout::UNDEFINED)
    }
}

pub struct VulkanRecorder {
    device: ash::Device,
    buffer: vk::CommandBuffer,
    owns_recording: bool,
}

impl VulkanRecorder {
    pub fn wrap(device: ash::Device, buffer: vk::CommandBuffer) -> Self {
        Self {
            device,
            buffer,
            owns_recording: false,
        }
    }
}

impl CommandRecorder for VulkanRecorder {
    fn schedule_clear_float(&mut self, target: &GpuResource, value: f32) -> Result<(), CoreError> {
        if target.device_handle.is_null() {
            return Ok(());
        }
        let image = vk::Image::from_raw(target.device_handle.0 as u64);
        let range = vk::ImageSubresourceRange::default()
            .aspect_mask(vk::ImageAspectFlags::COLOR)
            .base_mip_level(0)
            .level_count(1)
            .base_array_layer(0)
            .layer_count(1);
        let color = vk::ClearColorValue { float32: [value; 4] };
        unsafe {
            self.device
                .cmd_clear_color_image(self.buffer, image, vk::ImageLayout::GENERAL, &color, &[range]);
        }
        Ok(())
    }

    fn schedule_copy(&mut self, dst: &GpuResource, src: &GpuResource) -> Result<(), CoreError> {
        if dst.device_handle.is_null() || src.device_handle.is_null() {
            return Ok(());
        }
        let dst_image = vk::Image::from_raw(dst.device_handle.0 as u64);
        let src_image = vk::Image::from_raw(src.device_handle.0 as u64);
        let subresource = vk::ImageSubresourceLayers::default()
            .aspect_mask(vk::ImageAspectFlags::COLOR)
            .mip_level(0)
            .base_array_layer(0)
            .layer_count(1);
        let extent = vk::Extent3D {
            width: dst.dimensions.width.max(1),
            height: dst.dimensions.height.max(1),
            depth: 1,
        };
        let region = vk::ImageCopy::default()
            .src_subresource(subresource)
            .dst_subresource(subresource)
            .extent(extent);
        unsafe {
            self.device.cmd_copy_image(
                self.buffer,
                src_image,
                vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                dst_image,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &[region],
            );
        }
        Ok(())
    }

    fn schedule_compute(&mut self, extent: ComputeExtent) -> Result<(), CoreError> {
        unsafe {
            self.device
                .cmd_dispatch(self.buffer, extent.groups_x, extent.groups_y, extent.groups_z);
        }
        Ok(())
    }

    fn transition(&mut self, resource: &mut GpuResource, to: ResourceState) -> Result<(), CoreError> {
        let (_, new_layout) = state_to_vk_access(to);
        resource.set_state(to);
        if resource.device_handle.is_null() {
            return Ok(());
        }
        let image = vk::Image::from_raw(resource.device_handle.0 as u64);
        let range = vk::ImageSubresourceRange::default()
            .aspect_mask(vk::ImageAspectFlags::COLOR)
            .level_count(1)
            .layer_count(1);
        let barrier = vk::ImageMemoryBarrier::default()
            .image(image)
            .old_layout(vk::ImageLayout::UNDEFINED)
            .new_layout(new_layout)
            .subresource_range(range);
        unsafe {
            self.device.cmd_pipeline_barrier(
                self.buffer,
                vk::PipelineStageFlags::ALL_COMMANDS,
                vk::PipelineStageFlags::ALL_COMMANDS,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[barrier],
            );
        }
        Ok(())
    }

    fn execute_queued(&mut self) -> Result<(), CoreError> {
        Ok(())
    }

    fn begin_recording(&mut self, _queue: *mut core::ffi::c_void, _allocator: *mut core::ffi::c_void) -> Result<(), CoreError> {
        let begin_info = vk::CommandBufferBeginInfo::default().flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
        unsafe { self.device.begin_command_buffer(self.buffer, &begin_info) }
            .map_err(|e| CoreError::Unsupported(format!("vkBeginCommandBuffer failed: {e}")))?;
        self.owns_recording = true;
        Ok(())
    }

    fn end_recording(&mut self) -> Result<(), CoreError> {
        if self.owns_recording {
            unsafe { self.device.end_command_buffer(self.buffer) }
                .map_err(|e| CoreError::Unsupported(format!("vkEndCommandBuffer failed: {e}")))?;
            self.owns_recording = false;
        }
        Ok(())
    }

    fn raw_command_list(&mut self) -> *mut core::ffi::c_void {
        self.buffer.as_raw() as *mut core::ffi::c_void
    }
}
