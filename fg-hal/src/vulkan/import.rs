//! Importing D3D12-originated shared resources into Vulkan (spec.md §4.I,
//! "Shared textures", "Memory-type selection").

use ash::vk;

use crate::resource::RawHandle;
use crate::DeviceError;

#[derive(Copy, Clone, Debug)]
pub struct ExternalImageDesc {
    pub width: u32,
    pub height: u32,
    pub format: vk::Format,
    pub usage: vk::ImageUsageFlags,
}

/// First memory type satisfying both the imported handle's
/// `memoryTypeBits` mask and `DEVICE_LOCAL`; `None` if nothing matches
/// (spec.md §4.I, "Memory-type selection" — allocation fails in that case).
pub fn find_memory_type_index(
    properties: &vk::PhysicalDeviceMemoryProperties,
    type_bits: u32,
    required: vk::MemoryPropertyFlags,
) -> Option<u32> {
    (0..properties.memory_type_count).find(|&i| {
        let supported = (type_bits & (1 << i)) != 0;
        let has_properties = properties.memory_types[i as usize]
            .property_flags
            .contains(required);
        supported && has_properties
    })
}

/// Creates a Vulkan image chained with `ExternalMemoryImageCreateInfo`
/// declaring the D3D12-resource handle type, allocates memory imported from
/// the NT handle via `ImportMemoryWin32HandleInfoKHR` +
/// `MemoryDedicatedAllocateInfo`, and binds it (spec.md §4.I, steps 3-4).
pub fn import_shared_image(
    device: &ash::Device,
    external_memory_fn: &ash::khr::external_memory_win32::Device,
    memory_properties: &vk::PhysicalDeviceMemoryProperties,
    desc: ExternalImageDesc,
    nt_handle: RawHandle,
) -> Result<(vk::Image, vk::DeviceMemory), DeviceError> {
    let mut external_info = vk::ExternalMemoryImageCreateInfo::default()
        .handle_types(vk::ExternalMemoryHandleTypeFlags::D3D12_RESOURCE);

    let image_info = vk::ImageCreateInfo::default()
        .push_next(&mut external_info)
        .image_type(vk::ImageType::TYPE_2D)
        .format(desc.format)
        .extent(vk::Extent3D {
            width: desc.width,
            height: desc.height,
            depth: 1,
        })
        .mip_levels(1)
        .array_layers(1)
        .samples(vk::SampleCountFlags::TYPE_1)
        .tiling(vk::ImageTiling::OPTIMAL)
        .usage(desc.usage)
        .sharing_mode(vk::SharingMode::EXCLUSIVE)
        .initial_layout(vk::ImageLayout::UNDEFINED);

    let image = unsafe { device.create_image(&image_info, None) }
        .map_err(|e| DeviceError::SharedResourceCreation(e.to_string()))?;

    let requirements = unsafe { device.get_image_memory_requirements(image) };

    let memory_type_index = find_memory_type_index(
        memory_properties,
        requirements.memory_type_bits,
        vk::MemoryPropertyFlags::DEVICE_LOCAL,
    )
    .ok_or(DeviceError::Unsupported(
        "no DEVICE_LOCAL memory type accepts the imported handle",
    ))?;

    let mut dedicated_info = vk::MemoryDedicatedAllocateInfo::default().image(image);
    let mut import_info = vk::ImportMemoryWin32HandleInfoKHR::default()
        .handle_type(vk::ExternalMemoryHandleTypeFlags::D3D12_RESOURCE)
        .handle(nt_handle.0 as isize);

    let alloc_info = vk::MemoryAllocateInfo::default()
        .allocation_size(requirements.size)
        .memory_type_index(memory_type_index)
        .push_next(&mut dedicated_info)
        .push_next(&mut import_info);

    let memory = unsafe { device.allocate_memory(&alloc_info, None) }.map_err(|e| {
        unsafe { device.destroy_image(image, None) };
        DeviceError::SharedResourceCreation(e.to_string())
    })?;

    unsafe { device.bind_image_memory(image, memory, 0) }
        .map_err(|e| DeviceError::SharedResourceCreation(e.to_string()))?;

    let _ = external_memory_fn;
    Ok((image, memory))
}

/// Creates (or reuses) a Vulkan timeline semaphore and imports the D3D12
/// fence's NT handle into it as `D3D12_FENCE` (spec.md §4.I, "Shared
/// timeline fences").
pub fn import_timeline_semaphore(
    device: &ash::Device,
    external_semaphore_fn: &ash::khr::external_semaphore_win32::Device,
    existing: Option<vk::Semaphore>,
    nt_handle: RawHandle,
) -> Result<vk::Semaphore, DeviceError> {
    let semaphore = match existing {
        Some(s) => s,
        None => {
            let mut type_info = vk::SemaphoreTypeCreateInfo::default()
                .semaphore_type(vk::SemaphoreType::TIMELINE)
                .initial_value(0);
            let info = vk::SemaphoreCreateInfo::default().push_next(&mut type_info);
            unsafe { device.create_semaphore(&info, None) }
                .map_err(|e| DeviceError::SharedResourceCreation(e.to_string()))?
        }
    };

    let import_info = vk::ImportSemaphoreWin32HandleInfoKHR::default()
        .semaphore(semaphore)
        .handle_type(vk::ExternalSemaphoreHandleTypeFlags::D3D12_FENCE)
        .handle(nt_handle.0 as isize);

    unsafe { external_semaphore_fn.import_semaphore_win32_handle(&import_info) }
        .map_err(|e| DeviceError::SharedResourceCreation(e.to_string()))?;

    Ok(semaphore)
}
