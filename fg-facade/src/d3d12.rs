//! `NVSDK_NGX_D3D12_*` exported entry points, grounded directly on
//! `NvNGXDirectX12.cpp`: `CreateFeature` pulls the device off the command
//! list handed in, stamps `DLSSG.MustCallEval`, reads the swapchain extent
//! out of the bag, and builds one [`fgc::FrameInterpolator`] per call;
//! `EvaluateFeature` looks the handle up and dispatches; `ReleaseFeature`
//! only ever drops the registry entry, never the handle allocation itself.

use std::ffi::c_void;

use windows::core::Interface;
use windows::Win32::Graphics::Direct3D12::{ID3D12CommandList, ID3D12Device, ID3D12GraphicsCommandList};

use fgc::config::DebugConfig;
use fgc::param_bag::keys;
use fgc::{CoreError, FrameInterpolator};
use fgh::backend::BackendWrapper;
use fgh::dx12::Dx12Backend;
use fgt::{Dimensions, NgxStatus};

use crate::callbacks;
use crate::device_state;
use crate::effects::{DilationBackend, VendorInterpolator, VendorOpticalFlow};
use crate::handle::NgxHandle;
use crate::params::{NgxParamBag, NgxParameters};
use crate::recorder::D3d12Recorder;

/// No real scratch buffer is ever actually laid out by this crate's own
/// `Backend` impl (it allocates committed resources directly); the original
/// likewise reports a scratch size of zero (`GetScratchBufferSize`).
const SCRATCH_SIZE: usize = 0;

fn build_orchestrator(device: &ID3D12Device, render_size: Dimensions) -> Result<FrameInterpolator, CoreError> {
    let shared_backend = BackendWrapper::new(
        Box::new(Dx12Backend::new(device.clone(), SCRATCH_SIZE)) as Box<dyn fgh::backend::Backend + Send + Sync>,
        None,
    );
    let interpolator_backend = BackendWrapper::new(
        Box::new(Dx12Backend::new(device.clone(), SCRATCH_SIZE)) as Box<dyn fgh::backend::Backend + Send + Sync>,
        None,
    );

    let device_ptr = Interface::as_raw(device);

    let dilation = unsafe { DilationBackend::new_dx12(device_ptr, std::ptr::null_mut(), SCRATCH_SIZE)? };
    let optical_flow = unsafe { VendorOpticalFlow::new_dx12(device_ptr, std::ptr::null_mut(), SCRATCH_SIZE)? };
    let interpolator = unsafe { VendorInterpolator::new_dx12(device_ptr, std::ptr::null_mut(), SCRATCH_SIZE)? };

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
/// `CommandList`/`Parameters`/`OutInstanceHandle` must be valid, non-null
/// pointers for the duration of the call, matching the original ABI.
#[no_mangle]
pub unsafe extern "system" fn NVSDK_NGX_D3D12_CreateFeature(
    command_list: *mut ID3D12CommandList,
    _unknown: *mut c_void,
    parameters: *mut NgxParameters,
    out_instance_handle: *mut *mut NgxHandle,
) -> u32 {
    if command_list.is_null() || parameters.is_null() || out_instance_handle.is_null() {
        return NgxStatus::InvalidParameter as u32;
    }

    let command_list = &*command_list;
    let Ok(device) = command_list.GetDevice::<ID3D12Device>() else {
        return NgxStatus::FeatureNotFound as u32;
    };

    let mut bag = NgxParamBag::new(parameters);
    bag.set_u32(keys::MUST_CALL_EVAL, 1);
    let reader = fgc::param_bag::ParamReader::new(&bag);
    let width = reader.u32_or(keys::WIDTH, 0);
    let height = reader.u32_or(keys::HEIGHT, 0);
    drop(reader);

    match build_orchestrator(&device, Dimensions::new(width, height)) {
        Ok(orchestrator) => {
            let handle = device_state::registry().create(orchestrator);
            device_state::set_d3d12_device(device);
            *out_instance_handle = NgxHandle::allocate(handle);
            log::info!("NVSDK_NGX_D3D12_CreateFeature: succeeded");
            NgxStatus::Success as u32
        }
        Err(err) => {
            log::error!("NVSDK_NGX_D3D12_CreateFeature: failed to initialize: {err}");
            NgxStatus::FeatureNotFound as u32
        }
    }
}

/// # Safety: see [`NVSDK_NGX_D3D12_CreateFeature`].
#[no_mangle]
pub unsafe extern "system" fn NVSDK_NGX_D3D12_EvaluateFeature(
    command_list: *mut ID3D12GraphicsCommandList,
    instance_handle: *mut NgxHandle,
    parameters: *mut NgxParameters,
) -> u32 {
    if command_list.is_null() || instance_handle.is_null() || parameters.is_null() {
        return NgxStatus::InvalidParameter as u32;
    }

    let handle = NgxHandle::read(instance_handle);
    let Ok(orchestrator) = device_state::registry().get(handle) else {
        return NgxStatus::FeatureNotFound as u32;
    };

    let Some(device) = device_state::d3d12_device() else {
        return NgxStatus::FeatureNotFound as u32;
    };
    let list = (*command_list).clone();
    let Ok(mut recorder) = D3d12Recorder::wrap(device, list) else {
        return NgxStatus::FeatureNotFound as u32;
    };

    let mut bag = NgxParamBag::new(parameters);
    match orchestrator.evaluate(&mut bag, &mut recorder) {
        Ok(()) => {
            log::info!("NVSDK_NGX_D3D12_EvaluateFeature: succeeded");
            NgxStatus::Success as u32
        }
        Err(err) => {
            err.log_if_warranted();
            fgc::log_once::warn_once("d3d12_evaluate_failed", || {
                format!("NVSDK_NGX_D3D12_EvaluateFeature: evaluation call failed: {err}")
            });
            err.to_ngx_status() as u32
        }
    }
}

/// # Safety: see [`NVSDK_NGX_D3D12_CreateFeature`].
#[no_mangle]
pub unsafe extern "system" fn NVSDK_NGX_D3D12_GetFeatureRequirements(
    _adapter: *mut c_void,
    feature_discovery_info: *mut c_void,
    requirement_info: *mut callbacks::NgxFeatureRequirementInfo,
) -> u32 {
    callbacks::get_feature_requirements(feature_discovery_info, requirement_info)
}

/// # Safety: see [`NVSDK_NGX_D3D12_CreateFeature`].
#[no_mangle]
pub unsafe extern "system" fn NVSDK_NGX_D3D12_GetScratchBufferSize(
    _unknown1: *mut c_void,
    _unknown2: *mut c_void,
    out_buffer_size: *mut u64,
) -> u32 {
    callbacks::get_scratch_buffer_size(out_buffer_size)
}

/// # Safety: see [`NVSDK_NGX_D3D12_CreateFeature`].
#[no_mangle]
pub unsafe extern "system" fn NVSDK_NGX_D3D12_Init(
    _unknown1: *mut c_void,
    _path: *const u16,
    device: *mut ID3D12Device,
    _unknown3: u32,
) -> u32 {
    if device.is_null() {
        return NgxStatus::InvalidParameter as u32;
    }
    log::info!("NVSDK_NGX_D3D12_Init");
    device_state::set_d3d12_device((*device).clone());
    NgxStatus::Success as u32
}

/// # Safety: see [`NVSDK_NGX_D3D12_CreateFeature`].
#[no_mangle]
pub unsafe extern "system" fn NVSDK_NGX_D3D12_Init_Ext(
    _unknown1: *mut c_void,
    _path: *const u16,
    _unknown2: *mut c_void,
    _unknown4: u32,
    _parameters: *mut NgxParameters,
) -> u32 {
    log::info!("NVSDK_NGX_D3D12_Init_Ext");
    NgxStatus::Success as u32
}

/// # Safety: see [`NVSDK_NGX_D3D12_CreateFeature`].
#[no_mangle]
pub unsafe extern "system" fn NVSDK_NGX_D3D12_PopulateParameters_Impl(parameters: *mut NgxParameters) -> u32 {
    callbacks::populate_parameters(parameters)
}

/// # Safety: see [`NVSDK_NGX_D3D12_CreateFeature`].
#[no_mangle]
pub unsafe extern "system" fn NVSDK_NGX_D3D12_ReleaseFeature(instance_handle: *mut NgxHandle) -> u32 {
    log::info!("NVSDK_NGX_D3D12_ReleaseFeature");
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
pub extern "system" fn NVSDK_NGX_D3D12_Shutdown() -> u32 {
    log::info!("NVSDK_NGX_D3D12_Shutdown");
    NgxStatus::Success as u32
}

/// # Safety: see [`NVSDK_NGX_D3D12_CreateFeature`].
#[no_mangle]
pub unsafe extern "system" fn NVSDK_NGX_D3D12_Shutdown1(device: *mut ID3D12Device) -> u32 {
    log::info!("NVSDK_NGX_D3D12_Shutdown1");
    if device.is_null() {
        return NgxStatus::InvalidParameter as u32;
    }
    NgxStatus::Success as u32
}
