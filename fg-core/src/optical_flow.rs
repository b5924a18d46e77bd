//! Dense optical flow (external collaborator; spec.md §1 lists the
//! third-party FG/optical-flow/dilation shader library as "out of scope —
//! we consume it"). This module is the seam: a trait the real third-party
//! context implements, plus the parameter block the orchestrator builds for
//! it each frame.

use fgh::resource::GpuResource;

use crate::error::CoreError;
use crate::jobs::CommandRecorder;

/// Transfer function the optical-flow input color is interpreted with
/// (spec.md §4.E, Phase 2: "PQ when HDR else sRGB").
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TransferFunction {
    Srgb,
    Pq,
}

#[derive(Clone)]
pub struct OpticalFlowParams<'a> {
    pub color_input: &'a GpuResource,
    pub reset: bool,
    pub transfer_function: TransferFunction,
    pub min_luminance: f32,
    pub max_luminance: f32,
}

/// Resource descriptions the optical-flow context reports back so the
/// orchestrator can create them on the shared backend (spec.md §3,
/// "OpticalFlowVector", "OpticalFlowSCD"; §4.E, Construction step 4).
pub struct OpticalFlowResourceDescs {
    pub vector: fgt::Format,
    pub vector_resolution: fgt::Dimensions,
    pub scd: fgt::Format,
}

/// The seam to the third-party dense optical-flow implementation.
pub trait OpticalFlowContext {
    fn resource_descriptions(&self) -> OpticalFlowResourceDescs;

    fn dispatch(
        &mut self,
        recorder: &mut dyn CommandRecorder,
        vector_out: &GpuResource,
        scd_out: &GpuResource,
        params: &OpticalFlowParams<'_>,
    ) -> Result<(), CoreError>;
}

impl OpticalFlowContext for Box<dyn OpticalFlowContext + Send + Sync> {
    fn resource_descriptions(&self) -> OpticalFlowResourceDescs {
        (**self).resource_descriptions()
    }

    fn dispatch(
        &mut self,
        recorder: &mut dyn CommandRecorder,
        vector_out: &GpuResource,
        scd_out: &GpuResource,
        params: &OpticalFlowParams<'_>,
    ) -> Result<(), CoreError> {
        (**self).dispatch(recorder, vector_out, scd_out, params)
    }
}
