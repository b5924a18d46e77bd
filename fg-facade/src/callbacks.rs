//! Entry points shared between the D3D12 and Vulkan backends: the
//! requirement/scratch-size queries and the two host callbacks
//! `PopulateParameters_Impl` installs (spec.md §6). Grounded directly on
//! `NvNGXDirectX12.cpp`/`NvNGXVulkan.cpp`, which define these identically in
//! both translation units.

use std::ffi::c_void;
use std::os::raw::c_char;

use fgt::NgxStatus;

use crate::handle::NgxHandle;
use crate::params::{NgxParamBag, NgxParameters};

/// `NVSDK_NGX_D3D12_GetFeatureRequirements`/`..._VULKAN_...` output struct
/// (original `NvNGX.h`, "See nvngx_dlssg.dll").
#[repr(C)]
pub struct NgxFeatureRequirementInfo {
    pub flags: u32,
    pub required_gpu_architecture: u32,
    pub required_operating_system_version: [c_char; 32],
}

const NGX_HARDCODED_ARCHITECTURE: u32 = 0xC0;

/// # Safety
/// `feature_discovery_info`/`requirement_info` must be valid for the
/// duration of the call.
pub unsafe fn get_feature_requirements(
    feature_discovery_info: *mut c_void,
    requirement_info: *mut NgxFeatureRequirementInfo,
) -> u32 {
    if feature_discovery_info.is_null() || requirement_info.is_null() {
        return NgxStatus::InvalidParameter as u32;
    }
    let info = &mut *requirement_info;
    info.flags = 0;
    info.required_gpu_architecture = NGX_HARDCODED_ARCHITECTURE;
    let version = b"10.0.0\0";
    for (slot, byte) in info.required_operating_system_version.iter_mut().zip(version.iter()) {
        *slot = *byte as c_char;
    }
    NgxStatus::Success as u32
}

/// # Safety: `out_buffer_size` must be valid for the duration of the call.
pub unsafe fn get_scratch_buffer_size(out_buffer_size: *mut u64) -> u32 {
    if out_buffer_size.is_null() {
        return NgxStatus::InvalidParameter as u32;
    }
    // This crate's own backends never lay out a scratch buffer the host
    // needs to size in advance (see `fg-hal`'s committed-resource path), so
    // zero is the correct answer here, not a stub.
    *out_buffer_size = 0;
    NgxStatus::Success as u32
}

/// Installed under `DLSSG.GetCurrentSettingsCallback`: the host polls this
/// every frame to decide whether it must call `EvaluateFeature` at all.
/// This crate's frame-generation path is always eligible, so it always
/// reports "yes, call eval" and "no burst capture in progress".
unsafe extern "system" fn get_current_settings_callback(
    instance_handle: *mut NgxHandle,
    parameters: *mut NgxParameters,
) -> u32 {
    if instance_handle.is_null() || parameters.is_null() {
        return NgxStatus::InvalidParameter as u32;
    }
    let mut bag = NgxParamBag::new(parameters);
    bag.set_u32(fgc::param_bag::keys::MUST_CALL_EVAL, 1);
    bag.set_u32(fgc::param_bag::keys::BURST_CAPTURE_RUNNING, 0);
    NgxStatus::Success as u32
}

/// Installed under `DLSSG.EstimateVRAMCallback`. The original hardcodes a
/// 300 MiB estimate rather than querying the real effect's working-set size;
/// this crate has nothing better to report either, so it keeps the same
/// number (spec.md §6).
unsafe extern "system" fn estimate_vram_callback(
    _a: u32,
    _b: u32,
    _c: u32,
    _d: u32,
    _e: u32,
    _f: u32,
    _g: u32,
    _h: u32,
    _i: u32,
    estimated_size: *mut usize,
) -> u32 {
    if !estimated_size.is_null() {
        *estimated_size = 300 * 1024 * 1024;
    }
    NgxStatus::Success as u32
}

/// # Safety: `parameters` must be valid for the duration of the call.
pub unsafe fn populate_parameters(parameters: *mut NgxParameters) -> u32 {
    if parameters.is_null() {
        return NgxStatus::InvalidParameter as u32;
    }
    let mut bag = NgxParamBag::new(parameters);
    bag.set_void_pointer("DLSSG.GetCurrentSettingsCallback", get_current_settings_callback as *mut c_void);
    bag.set_void_pointer("DLSSG.EstimateVRAMCallback", estimate_vram_callback as *mut c_void);
    NgxStatus::Success as u32
}
