//! `NVSDK_NGX_VULKAN_*` exported entry points, grounded directly on
//! `NvNGXVulkan.cpp`. `Init`/`Init_Ext*` load a real [`ash::Device`] dispatch
//! table from the raw handles the host hands in (this crate's own
//! [`fgh::vulkan::VulkanBackend`] needs one; the original never does because
//! it only ever forwards the raw handles straight into the vendor SDK).
//! `CreateFeature` delegates to `CreateFeature1` with the stored device, the
//! same way the original's zero-argument variant forwards to its own
//! `g_LogicalDevice`/`g_PhysicalDevice` globals.

use std::ffi::c_void;

use ash::vk;
use ash::vk::Handle;

use fgc::config::DebugConfig;
use fgc::param_bag::keys;
use fgc::{CoreError, FrameInterpolator};
use fgh::backend::BackendWrapper;
use fgh::vulkan::VulkanBackend;
use fgt::{Dimensions, NgxStatus};

use crate::callbacks;
use crate::device_state::{self, VulkanDeviceState};
use crate::effects::{DilationBackend, VendorInterpolator, VendorOpticalFlow};
use crate::handle::NgxHandle;
use crate::params::{NgxParamBag, NgxParameters};
use crate::recorder::VulkanRecorder;

const SCRATCH_SIZE: usize = 0;

/// Loads an `ash::Device` dispatch table and queries memory properties from
/// the raw instance/physical-device/device handles the host owns. The
/// `ash::Entry`/`ash::Instance` used to do the loading are dropped at the end
/// of this call — once `ash::Device::load` has populated its function-pointer
/// table there is nothing left to keep alive (ash's `Device` does not borrow
/// from its `Instance`).
///
/// # Safety
/// `instance`/`physical_device`/`device` must be live Vulkan handles from the
/// same `VkInstance` hierarchy, valid for the duration of this call.
unsafe fn load_device_state(
    instance: vk::Instance,
    physical_device: vk::PhysicalDevice,
    device: vk::Device,
) -> Result<VulkanDeviceState, CoreError> {
    let entry = ash::Entry::load()
        .map_err(|e| CoreError::Unsupported(format!("failed to load Vulkan loader: {e}")))?;
    let instance_fns = ash::Instance::load(entry.static_fn(), instance);
    let memory_properties = instance_fns.get_physical_device_memory_properties(physical_device);
    let device = ash::Device::load(instance_fns.fp_v1_0(), device);
    Ok(VulkanDeviceState {
        device,
        physical_device,
        memory_properties,
    })
}

fn build_orchestrator(state: &VulkanDeviceState, render_size: Dimensions) -> Result<FrameInterpolator, CoreError> {
    let shared_backend = BackendWrapper::new(
        Box::new(VulkanBackend::new(state.device.clone(), state.memory_properties, SCRATCH_SIZE))
            as Box<dyn fgh::backend::Backend + Send + Sync>,
        None,
    );
    let interpolator_backend = BackendWrapper::new(
        Box::new(VulkanBackend::new(state.device.clone(), state.memory_properties, SCRATCH_SIZE))
            as Box<dyn fgh::backend::Backend + Send + Sync>,
        None,
    );

    let device_ptr = state.device.handle().as_raw() as *mut c_void;
    let physical_device_ptr = state.physical_device.as_raw() as *mut c_void;

    let dilation =
        unsafe { DilationBackend::new_vulkan(device_ptr, physical_device_ptr, std::ptr::null_mut(), SCRATCH_SIZE)? };
    let optical_flow =
        unsafe { VendorOpticalFlow::new_vulkan(device_ptr, physical_device_ptr, std::ptr::null_mut(), SCRATCH_SIZE)? };
    let interpolator =
        unsafe { VendorInterpolator::new_vulkan(device_ptr, physical_device_ptr, std::ptr::null_mut(), SCRATCH_SIZE)? };

    FrameInterpolator::new(
        shared_backend,
        interpolator_backend,
        Box::new(dilation),
        Box::new(optical_flow),
        Box::new(interpolator),
        render_size,
        DebugConfig::load(std::path::Path::new("dlssg_to_fsr3.ini")),
    )
}

/// # Safety
/// `Parameters`/`OutInstanceHandle` must be valid, non-null pointers;
/// `LogicalDevice` must be a live `VkDevice` whose instance/physical-device
/// were already registered via [`NVSDK_NGX_VULKAN_Init`] or an equivalent.
#[no_mangle]
pub unsafe extern "system" fn NVSDK_NGX_VULKAN_CreateFeature1(
    logical_device: vk::Device,
    _command_list: vk::CommandBuffer,
    _unknown: *mut c_void,
    parameters: *mut NgxParameters,
    out_instance_handle: *mut *mut NgxHandle,
) -> u32 {
    if logical_device == vk::Device::null() || parameters.is_null() || out_instance_handle.is_null() {
        return NgxStatus::InvalidParameter as u32;
    }

    let Some(state) = device_state::vulkan_device() else {
        return NgxStatus::FeatureNotFound as u32;
    };

    let mut bag = NgxParamBag::new(parameters);
    bag.set_u32(keys::MUST_CALL_EVAL, 1);
    let reader = fgc::param_bag::ParamReader::new(&bag);
    let width = reader.u32_or(keys::WIDTH, 0);
    let height = reader.u32_or(keys::HEIGHT, 0);
    drop(reader);

    match build_orchestrator(&state, Dimensions::new(width, height)) {
        Ok(orchestrator) => {
            let handle = device_state::registry().create(orchestrator);
            *out_instance_handle = NgxHandle::allocate(handle);
            log::info!("NVSDK_NGX_VULKAN_CreateFeature1: succeeded");
            NgxStatus::Success as u32
        }
        Err(err) => {
            log::error!("NVSDK_NGX_VULKAN_CreateFeature1: failed to initialize: {err}");
            NgxStatus::FeatureNotFound as u32
        }
    }
}

/// # Safety: see [`NVSDK_NGX_VULKAN_CreateFeature1`].
#[no_mangle]
pub unsafe extern "system" fn NVSDK_NGX_VULKAN_CreateFeature(
    command_list: vk::CommandBuffer,
    unknown: *mut c_void,
    parameters: *mut NgxParameters,
    out_instance_handle: *mut *mut NgxHandle,
) -> u32 {
    if parameters.is_null() || out_instance_handle.is_null() {
        return NgxStatus::InvalidParameter as u32;
    }
    let Some(state) = device_state::vulkan_device() else {
        return NgxStatus::FeatureNotFound as u32;
    };
    NVSDK_NGX_VULKAN_CreateFeature1(state.device.handle(), command_list, unknown, parameters, out_instance_handle)
}

/// # Safety: see [`NVSDK_NGX_VULKAN_CreateFeature1`].
#[no_mangle]
pub unsafe extern "system" fn NVSDK_NGX_VULKAN_EvaluateFeature(
    command_list: vk::CommandBuffer,
    instance_handle: *mut NgxHandle,
    parameters: *mut NgxParameters,
) -> u32 {
    if command_list == vk::CommandBuffer::null() || instance_handle.is_null() || parameters.is_null() {
        return NgxStatus::InvalidParameter as u32;
    }

    let handle = NgxHandle::read(instance_handle);
    let Ok(orchestrator) = device_state::registry().get(handle) else {
        return NgxStatus::FeatureNotFound as u32;
    };
    let Some(state) = device_state::vulkan_device() else {
        return NgxStatus::FeatureNotFound as u32;
    };

    let mut recorder = VulkanRecorder::wrap(state.device, command_list);
    let mut bag = NgxParamBag::new(parameters);
    match orchestrator.evaluate(&mut bag, &mut recorder) {
        Ok(()) => {
            log::info!("NVSDK_NGX_VULKAN_EvaluateFeature: succeeded");
            NgxStatus::Success as u32
        }
        Err(err) => {
            err.log_if_warranted();
            fgc::log_once::warn_once("vulkan_evaluate_failed", || {
                format!("NVSDK_NGX_VULKAN_EvaluateFeature: evaluation call failed: {err}")
            });
            err.to_ngx_status() as u32
        }
    }
}

/// # Safety: see [`NVSDK_NGX_VULKAN_CreateFeature1`].
#[no_mangle]
pub unsafe extern "system" fn NVSDK_NGX_VULKAN_GetFeatureRequirements(
    _vulkan_instance: vk::Instance,
    _physical_device: vk::PhysicalDevice,
    feature_discovery_info: *mut c_void,
    requirement_info: *mut callbacks::NgxFeatureRequirementInfo,
) -> u32 {
    callbacks::get_feature_requirements(feature_discovery_info, requirement_info)
}

/// # Safety: see [`NVSDK_NGX_VULKAN_CreateFeature1`].
#[no_mangle]
pub unsafe extern "system" fn NVSDK_NGX_VULKAN_GetScratchBufferSize(
    _unknown1: *mut c_void,
    _unknown2: *mut c_void,
    out_buffer_size: *mut u64,
) -> u32 {
    callbacks::get_scratch_buffer_size(out_buffer_size)
}

fn init(instance: vk::Instance, physical_device: vk::PhysicalDevice, logical_device: vk::Device) -> u32 {
    if instance == vk::Instance::null() || physical_device == vk::PhysicalDevice::null() || logical_device == vk::Device::null() {
        return NgxStatus::InvalidParameter as u32;
    }
    match unsafe { load_device_state(instance, physical_device, logical_device) } {
        Ok(state) => {
            device_state::set_vulkan_device(state);
            NgxStatus::Success as u32
        }
        Err(err) => {
            log::error!("failed to load Vulkan device state: {err}");
            NgxStatus::FeatureNotFound as u32
        }
    }
}

/// # Safety: see [`NVSDK_NGX_VULKAN_CreateFeature1`].
#[no_mangle]
pub unsafe extern "system" fn NVSDK_NGX_VULKAN_Init(
    _unknown1: *mut c_void,
    _unknown2: *mut c_void,
    vulkan_instance: vk::Instance,
    physical_device: vk::PhysicalDevice,
    logical_device: vk::Device,
    _unknown3: u32,
) -> u32 {
    log::info!("NVSDK_NGX_VULKAN_Init");
    init(vulkan_instance, physical_device, logical_device)
}

/// # Safety: see [`NVSDK_NGX_VULKAN_CreateFeature1`].
#[no_mangle]
pub unsafe extern "system" fn NVSDK_NGX_VULKAN_Init_Ext(
    _unknown1: *mut c_void,
    _unknown2: *mut c_void,
    vulkan_instance: vk::Instance,
    physical_device: vk::PhysicalDevice,
    logical_device: vk::Device,
    _unknown3: u32,
    _unknown4: *mut c_void,
) -> u32 {
    log::info!("NVSDK_NGX_VULKAN_Init_Ext");
    init(vulkan_instance, physical_device, logical_device)
}

/// # Safety: see [`NVSDK_NGX_VULKAN_CreateFeature1`].
#[no_mangle]
pub unsafe extern "system" fn NVSDK_NGX_VULKAN_Init_Ext2(
    _unknown1: *mut c_void,
    _unknown2: *mut c_void,
    vulkan_instance: vk::Instance,
    physical_device: vk::PhysicalDevice,
    logical_device: vk::Device,
    _unknown3: *mut c_void,
    _unknown4: u32,
    _parameters: *mut NgxParameters,
) -> u32 {
    log::info!("NVSDK_NGX_VULKAN_Init_Ext2");
    init(vulkan_instance, physical_device, logical_device)
}

/// # Safety: see [`NVSDK_NGX_VULKAN_CreateFeature1`].
#[no_mangle]
pub unsafe extern "system" fn NVSDK_NGX_VULKAN_PopulateParameters_Impl(parameters: *mut NgxParameters) -> u32 {
    callbacks::populate_parameters(parameters)
}

/// # Safety: see [`NVSDK_NGX_VULKAN_CreateFeature1`].
#[no_mangle]
pub unsafe extern "system" fn NVSDK_NGX_VULKAN_ReleaseFeature(instance_handle: *mut NgxHandle) -> u32 {
    log::info!("NVSDK_NGX_VULKAN_ReleaseFeature");
    if instance_handle.is_null() {
        return NgxStatus::InvalidParameter as u32;
    }
    let handle = NgxHandle::read(instance_handle);
    match device_state::registry().release(handle) {
        Ok(()) => NgxStatus::Success as u32,
        Err(_) => NgxStatus::FeatureNotFound as u32,
    }
}

#[no_mangle]
pub extern "system" fn NVSDK_NGX_VULKAN_Shutdown() -> u32 {
    log::info!("NVSDK_NGX_VULKAN_Shutdown");
    NgxStatus::Success as u32
}

#[no_mangle]
pub extern "system" fn NVSDK_NGX_VULKAN_Shutdown1(logical_device: vk::Device) -> u32 {
    log::info!("NVSDK_NGX_VULKAN_Shutdown1");
    if logical_device == vk::Device::null() {
        return NgxStatus::InvalidParameter as u32;
    }
    NgxStatus::Success as u32
}
