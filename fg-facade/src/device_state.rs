//! Process-wide graphics-device state (spec.md §9, design note): written
//! only from the `Init`/`Init_Ext*` variants, read from `CreateFeature`.
//! The original keeps one static per backend translation unit; this crate
//! keeps one [`FeatureRegistry`] shared across all three backends instead
//! of three separate maps, since nothing in spec.md requires per-backend
//! isolation and a single map is simpler to reason about (see DESIGN.md).

use once_cell::sync::OnceCell;
use parking_lot::Mutex;

use fgc::FeatureRegistry;
use windows::Win32::Graphics::Direct3D12::ID3D12Device;

static REGISTRY: OnceCell<FeatureRegistry> = OnceCell::new();

pub fn registry() -> &'static FeatureRegistry {
    REGISTRY.get_or_init(FeatureRegistry::new)
}

static D3D12_DEVICE: Mutex<Option<ID3D12Device>> = Mutex::new(None);

pub fn set_d3d12_device(device: ID3D12Device) {
    *D3D12_DEVICE.lock() = Some(device);
}

pub fn d3d12_device() -> Option<ID3D12Device> {
    D3D12_DEVICE.lock().clone()
}

/// Vulkan's two init-time globals (`g_LogicalDevice`/`g_PhysicalDevice` in
/// the original), upgraded to hold a fully loaded [`ash::Device`] rather than
/// a raw `VkDevice`: the original never needs more than the raw handle
/// because it only ever forwards it to the vendor SDK's own
/// `ffxGetInterfaceVK`, but this crate's own [`fgh::vulkan::VulkanBackend`]
/// needs an `ash::Device` dispatch table, so `Init`/`Init_Ext*` load it once
/// here instead of reconstructing it on every `CreateFeature`/`EvaluateFeature`.
#[derive(Clone)]
pub struct VulkanDeviceState {
    pub device: ash::Device,
    pub physical_device: ash::vk::PhysicalDevice,
    pub memory_properties: ash::vk::PhysicalDeviceMemoryProperties,
}

static VULKAN_DEVICE: Mutex<Option<VulkanDeviceState>> = Mutex::new(None);

pub fn set_vulkan_device(state: VulkanDeviceState) {
    *VULKAN_DEVICE.lock() = Some(state);
}

pub fn vulkan_device() -> Option<VulkanDeviceState> {
    VULKAN_DEVICE.lock().clone()
}
