//! `NVSDK_NGX_D3D11_*` exported entry points. Grounded directly on
//! `NvNGXDirectX11.cpp`: every one of these is a pure stub there too — the
//! original never drives frame generation through D3D11 at all, it just
//! keeps the ordinal table satisfied for hosts that probe it. This crate
//! carries the same stubs rather than inventing a D3D11 backend spec.md
//! never asks for.

use std::ffi::c_void;

use fgt::NgxStatus;

use crate::callbacks;
use crate::handle::NgxHandle;
use crate::params::NgxParameters;

/// # Safety: pointer arguments are accepted but never dereferenced.
#[no_mangle]
pub unsafe extern "system" fn NVSDK_NGX_D3D11_CreateFeature(
    _device_context: *mut c_void,
    _unknown: *mut c_void,
    _parameters: *mut NgxParameters,
    _out_instance_handle: *mut *mut NgxHandle,
) -> u32 {
    NgxStatus::Success as u32
}

/// # Safety: see [`NVSDK_NGX_D3D11_CreateFeature`].
#[no_mangle]
pub unsafe extern "system" fn NVSDK_NGX_D3D11_EvaluateFeature(
    _device_context: *mut c_void,
    _instance_handle: *mut NgxHandle,
    _parameters: *mut NgxParameters,
) -> u32 {
    NgxStatus::Success as u32
}

/// # Safety: see [`NVSDK_NGX_D3D11_CreateFeature`].
#[no_mangle]
pub unsafe extern "system" fn NVSDK_NGX_D3D11_GetFeatureRequirements(
    _adapter: *mut c_void,
    feature_discovery_info: *mut c_void,
    requirement_info: *mut callbacks::NgxFeatureRequirementInfo,
) -> u32 {
    callbacks::get_feature_requirements(feature_discovery_info, requirement_info)
}

/// # Safety: see [`NVSDK_NGX_D3D11_CreateFeature`].
#[no_mangle]
pub unsafe extern "system" fn NVSDK_NGX_D3D11_GetScratchBufferSize(
    _unknown1: *mut c_void,
    _unknown2: *mut c_void,
    out_buffer_size: *mut u64,
) -> u32 {
    if !out_buffer_size.is_null() {
        *out_buffer_size = 0;
    }
    NgxStatus::Success as u32
}

/// # Safety: see [`NVSDK_NGX_D3D11_CreateFeature`].
#[no_mangle]
pub unsafe extern "system" fn NVSDK_NGX_D3D11_Init(
    _unknown1: *mut c_void,
    _path: *const u16,
    _device: *mut c_void,
    _unknown3: u32,
) -> u32 {
    NgxStatus::Success as u32
}

/// # Safety: see [`NVSDK_NGX_D3D11_CreateFeature`].
#[no_mangle]
pub unsafe extern "system" fn NVSDK_NGX_D3D11_PopulateParameters_Impl(_parameters: *mut NgxParameters) -> u32 {
    NgxStatus::Success as u32
}

/// # Safety: see [`NVSDK_NGX_D3D11_CreateFeature`].
#[no_mangle]
pub unsafe extern "system" fn NVSDK_NGX_D3D11_ReleaseFeature(_instance_handle: *mut NgxHandle) -> u32 {
    NgxStatus::Success as u32
}

#[no_mangle]
pub extern "system" fn NVSDK_NGX_D3D11_Shutdown() -> u32 {
    NgxStatus::Success as u32
}
