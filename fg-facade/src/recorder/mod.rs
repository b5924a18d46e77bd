//! Concrete [`fgc::jobs::CommandRecorder`] implementations driving a real
//! command list, one per backend (spec.md §4.E's dispatch phases are
//! entirely backend-agnostic; only this module touches a concrete API).

pub mod d3d12;
pub mod vulkan;

pub use d3d12::D3d12Recorder;
pub use vulkan::VulkanRecorder;
