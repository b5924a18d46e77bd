//! Dilation Effect (spec.md §4.F).
//!
//! Produces the three shared textures (`DilatedDepth`, `DilatedMotionVectors`,
//! `ReconstructedPrevNearestDepth`) from the current depth and motion-vector
//! inputs. Pipeline permutations are cached by flag bitset and compiled
//! lazily; "compiling" here means resolving the opaque pipeline handle the
//! real shader library hands back, which this crate never constructs itself
//! (spec.md §1: the shader library is an external collaborator).

use rustc_hash::FxHashMap;

use fgh::resource::GpuResource;
use fgt::{DilationConstants, DilationFlags};

use crate::error::CoreError;
use crate::jobs::{CommandRecorder, ComputeExtent};

/// Opaque compiled pipeline handle. The real shader library returns
/// something like a `ID3D12PipelineState`/`VkPipeline`; this crate only
/// ever stores and re-issues the handle it was given.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PipelineHandle(pub u64);

/// Compiles (or resolves) a permutation into a pipeline handle. Implemented
/// against the real shader library outside this crate; tests use a mock
/// that returns a handle derived from the flags themselves.
pub trait PipelineCompiler {
    fn compile(&self, flags: DilationFlags) -> Result<PipelineHandle, CoreError>;
}

/// Maps a shader-authored binding name to the orchestrator's internal
/// resource index. An unmatched name is fatal (spec.md §4.F,
/// "Resource name remapping").
pub fn resolve_binding_name(name: &str) -> Result<usize, CoreError> {
    const BINDINGS: &[(&str, usize)] = &[
        ("input_depth", 0),
        ("input_motion_vectors", 1),
        ("dilated_depth", 2),
        ("dilated_motion_vectors", 3),
        ("reconstructed_prev_nearest_depth", 4),
    ];
    BINDINGS
        .iter()
        .find(|(known, _)| *known == name)
        .map(|(_, index)| *index)
        .ok_or_else(|| CoreError::InvalidArgument(format!("unknown resource binding {name:?}")))
}

pub struct DilationOutputs<'a> {
    pub dilated_depth: &'a GpuResource,
    pub dilated_motion_vectors: &'a GpuResource,
    pub reconstructed_prev_nearest_depth: &'a GpuResource,
}

pub struct DilationParams<'a> {
    pub input_depth: &'a GpuResource,
    pub input_motion_vectors: &'a GpuResource,
    pub outputs: DilationOutputs<'a>,
    pub render_size: fgt::Dimensions,
    pub output_size: fgt::Dimensions,
    pub flags: DilationFlags,
    pub mvec_scale: (f32, f32),
    pub jitter_offset: (f32, f32),
}

/// Lets the orchestrator hold the dilation effect's compiler behind one
/// type regardless of which concrete shader-library binding is active.
impl PipelineCompiler for Box<dyn PipelineCompiler + Send + Sync> {
    fn compile(&self, flags: DilationFlags) -> Result<PipelineHandle, CoreError> {
        (**self).compile(flags)
    }
}

pub struct DilationEffect<C: PipelineCompiler> {
    compiler: C,
    pipelines: FxHashMap<DilationFlags, PipelineHandle>,
    constants: DilationConstants,
}

impl<C: PipelineCompiler> DilationEffect<C> {
    pub fn new(compiler: C) -> Self {
        Self {
            compiler,
            pipelines: FxHashMap::default(),
            constants: DilationConstants::default(),
        }
    }

    /// Returns the resource descriptions for the three shared textures the
    /// orchestrator must create on the shared backend (spec.md §4.E,
    /// Construction step 3).
    pub fn shared_resource_formats() -> [fgt::Format; 3] {
        [fgt::Format::R32Float, fgt::Format::R16G16Float, fgt::Format::R32Uint]
    }

    fn pipeline_for(&mut self, flags: DilationFlags) -> Result<PipelineHandle, CoreError> {
        if let Some(&handle) = self.pipelines.get(&flags) {
            return Ok(handle);
        }
        let handle = self.compiler.compile(flags)?;
        // At most one pipeline per permutation key (spec.md §3, Invariants).
        self.pipelines.insert(flags, handle);
        Ok(handle)
    }

    /// Dispatch steps per spec.md §4.F:
    /// 1. update constants (sizes, jitter, mv scale), swap current↔previous
    ///    *after* updating;
    /// 2. schedule a `CLEAR_FLOAT` on `ReconstructedPrevNearestDepth` to the
    ///    farthest value;
    /// 3. resolve the permutation's pipeline (compiling if missing);
    /// 4. schedule one compute dispatch sized `ceil(w/8) x ceil(h/8) x 1`;
    /// 5. execute queued jobs.
    pub fn dispatch(
        &mut self,
        recorder: &mut dyn CommandRecorder,
        params: &DilationParams<'_>,
    ) -> Result<PipelineHandle, CoreError> {
        self.constants.render_size = [params.render_size.width, params.render_size.height];
        self.constants.display_size = [params.output_size.width, params.output_size.height];
        self.constants.jitter_offset = [params.jitter_offset.0, params.jitter_offset.1];
        self.constants.motion_vector_scale = [
            params.mvec_scale.0 / params.render_size.width.max(1) as f32,
            params.mvec_scale.1 / params.render_size.height.max(1) as f32,
        ];
        self.constants.advance_jitter();

        let farthest = if params.flags.contains(DilationFlags::DEPTH_INVERTED) {
            0.0
        } else {
            1.0
        };
        recorder.schedule_clear_float(params.outputs.reconstructed_prev_nearest_depth, farthest)?;

        let pipeline = self.pipeline_for(params.flags)?;

        let extent = ComputeExtent::ceil_div_8(params.render_size.width, params.render_size.height);
        recorder.schedule_compute(extent)?;

        recorder.execute_queued()?;
        Ok(pipeline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::RecordingLog;
    use fgh::resource::RawHandle;
    use fgt::{Dimensions, Format, ResourceState, UsageFlags};

    struct StubCompiler;
    impl PipelineCompiler for StubCompiler {
        fn compile(&self, flags: DilationFlags) -> Result<PipelineHandle, CoreError> {
            Ok(PipelineHandle(flags.bits() as u64))
        }
    }

    fn resource() -> GpuResource {
        GpuResource::new(
            RawHandle::NULL,
            ResourceState::COMMON,
            Format::R32Float,
            Dimensions::new(1920, 1080),
            UsageFlags::UNORDERED_ACCESS,
        )
    }

    #[test]
    fn unknown_binding_name_is_fatal() {
        assert!(resolve_binding_name("not_a_real_binding").is_err());
    }

    #[test]
    fn known_binding_names_resolve() {
        assert_eq!(resolve_binding_name("input_depth").unwrap(), 0);
    }

    #[test]
    fn pipeline_is_compiled_once_per_permutation() {
        let mut effect = DilationEffect::new(StubCompiler);
        let mut log = RecordingLog::default();
        let depth = resource();
        let mvs = resource();
        let dilated_depth = resource();
        let dilated_mvs = resource();
        let prev_depth = resource();

        let params = DilationParams {
            input_depth: &depth,
            input_motion_vectors: &mvs,
            outputs: DilationOutputs {
                dilated_depth: &dilated_depth,
                dilated_motion_vectors: &dilated_mvs,
                reconstructed_prev_nearest_depth: &prev_depth,
            },
            render_size: Dimensions::new(1920, 1080),
            output_size: Dimensions::new(1920, 1080),
            flags: DilationFlags::ALLOW_FP16,
            mvec_scale: (1.0, 1.0),
            jitter_offset: (0.0, 0.0),
        };

        let first = effect.dispatch(&mut log, &params).unwrap();
        let second = effect.dispatch(&mut log, &params).unwrap();
        assert_eq!(first, second);
        assert_eq!(effect.pipelines.len(), 1);
    }

    #[test]
    fn clear_value_depends_on_depth_inversion() {
        let mut effect = DilationEffect::new(StubCompiler);
        let mut log = RecordingLog::default();
        let depth = resource();
        let mvs = resource();
        let dilated_depth = resource();
        let dilated_mvs = resource();
        let prev_depth = resource();

        let mut params = DilationParams {
            input_depth: &depth,
            input_motion_vectors: &mvs,
            outputs: DilationOutputs {
                dilated_depth: &dilated_depth,
                dilated_motion_vectors: &dilated_mvs,
                reconstructed_prev_nearest_depth: &prev_depth,
            },
            render_size: Dimensions::new(1920, 1080),
            output_size: Dimensions::new(1920, 1080),
            flags: DilationFlags::empty(),
            mvec_scale: (1.0, 1.0),
            jitter_offset: (0.0, 0.0),
        };
        effect.dispatch(&mut log, &params).unwrap();
        assert_eq!(log.clears, vec![1.0]);

        params.flags = DilationFlags::DEPTH_INVERTED;
        effect.dispatch(&mut log, &params).unwrap();
        assert_eq!(log.clears, vec![1.0, 0.0]);
    }
}
