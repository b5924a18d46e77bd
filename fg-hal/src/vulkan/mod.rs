/*!
# Vulkan backend.

Used for the host-side of the VK↔DX bridge (importing shared textures and
timeline semaphores exported by the D3D12 side) and, standalone, as the
`Backend` implementation when the host itself runs Vulkan and the FG core
does not need to cross into D3D12 at all.
!*/

mod import;

pub use import::{
    find_memory_type_index, import_shared_image, import_timeline_semaphore, ExternalImageDesc,
};

use ash::vk;

use crate::backend::{Backend, HeapKind, ResourceRequest, ResourceShape};
use crate::resource::{GpuResource, RawHandle};
use crate::DeviceError;
use fgt::{Dimensions, ResourceState, UsageFlags};

pub struct VulkanBackend {
    device: ash::Device,
    memory_properties: vk::PhysicalDeviceMemoryProperties,
    scratch: Box<[u8]>,
}

impl VulkanBackend {
    pub fn new(
        device: ash::Device,
        memory_properties: vk::PhysicalDeviceMemoryProperties,
        scratch_size: usize,
    ) -> Self {
        Self {
            device,
            memory_properties,
            scratch: vec![0u8; scratch_size].into_boxed_slice(),
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
}

impl Backend for VulkanBackend {
    fn create_resource_native(&self, request: &ResourceRequest) -> Result<GpuResource, DeviceError> {
        match request.shape {
            ResourceShape::Buffer { size_bytes } => {
                let usage = if request.usage.contains(UsageFlags::UNORDERED_ACCESS) {
                    vk::BufferUsageFlags::STORAGE_BUFFER | vk::BufferUsageFlags::TRANSFER_DST
                } else {
                    vk::BufferUsageFlags::TRANSFER_SRC
                };
                let info = vk::BufferCreateInfo::default()
                    .size(size_bytes)
                    .usage(usage)
                    .sharing_mode(vk::SharingMode::EXCLUSIVE);
                let buffer = unsafe { self.device.create_buffer(&info, None) }
                    .map_err(|_| DeviceError::OutOfMemory)?;
                Ok(GpuResource::new(
                    RawHandle(buffer.as_raw() as *mut core::ffi::c_void),
                    match request.heap {
                        HeapKind::Upload => ResourceState::GENERIC_READ,
                        HeapKind::Default => ResourceState::COMMON,
                    },
                    request.format,
                    Dimensions::default(),
                    request.usage,
                ))
            }
            shape => {
                let (width, height) = match shape {
                    ResourceShape::Texture1D { width } => (width, 1),
                    ResourceShape::Texture2D { width, height } => (width, height),
                    ResourceShape::Texture3D { width, height, .. } => (width, height),
                    ResourceShape::Cube { edge } => (edge, edge),
                    ResourceShape::Buffer { .. } => unreachable!(),
                };
                let mut usage =
                    vk::ImageUsageFlags::TRANSFER_SRC | vk::ImageUsageFlags::TRANSFER_DST;
                if request.usage.contains(UsageFlags::UNORDERED_ACCESS) {
                    usage |= vk::ImageUsageFlags::STORAGE;
                }
                if request.usage.contains(UsageFlags::RENDER_TARGET) {
                    usage |= vk::ImageUsageFlags::COLOR_ATTACHMENT;
                }
                let info = vk::ImageCreateInfo::default()
                    .image_type(vk::ImageType::TYPE_2D)
                    .extent(vk::Extent3D {
                        width,
                        height,
                        depth: 1,
                    })
                    .mip_levels(1)
                    .array_layers(if matches!(shape, ResourceShape::Cube { .. }) {
                        6
                    } else {
                        1
                    })
                    .format(vk::Format::R8G8B8A8_UNORM)
                    .tiling(vk::ImageTiling::OPTIMAL)
                    .initial_layout(vk::ImageLayout::UNDEFINED)
                    .usage(usage)
                    .sharing_mode(vk::SharingMode::EXCLUSIVE)
                    .samples(vk::SampleCountFlags::TYPE_1);
                let image = unsafe { self.device.create_image(&info, None) }
                    .map_err(|_| DeviceError::OutOfMemory)?;
                Ok(GpuResource::new(
                    RawHandle(image.as_raw() as *mut core::ffi::c_void),
                    ResourceState::COMMON,
                    request.format,
                    Self::dimensions_of(shape),
                    request.usage,
                ))
            }
        }
    }

    fn destroy_resource_native(&self, resource: &GpuResource) {
        if resource.device_handle.is_null() {
            return;
        }
        // The descriptor doesn't carry enough type information to know
        // whether this was a `VkImage` or `VkBuffer`; the orchestrator keeps
        // that distinction alongside each `GpuResource` it owns and calls
        // the matching destructor directly rather than through this generic
        // path when it needs to.
        unsafe {
            self.device
                .destroy_image(vk::Image::from_raw(resource.device_handle.0 as u64), None);
        }
    }

    fn scratch_base(&self) -> *const u8 {
        self.scratch.as_ptr()
    }
}
