//! Frame Interpolator Orchestrator (spec.md §4.E) — the per-feature-handle
//! object the registry hands out and `EvaluateFeature` drives every frame.
//! Owns the shared backend wrapper, the dilation effect, the optical-flow
//! context, the interpolator wrapper, and the handful of shared transient
//! textures those effects pass resources through.

use parking_lot::Mutex;

use fgh::backend::{Backend, BackendWrapper, HeapKind, InitData, ResourceRequest, ResourceShape};
use fgh::resource::{GpuResource, RawHandle};
use fgt::{Dimensions, DilationFlags, Format, InterpolatorFlags, ResourceState, UsageFlags};

use crate::config::DebugConfig;
use crate::dilation::{DilationEffect, DilationOutputs, DilationParams, PipelineCompiler};
use crate::error::CoreError;
use crate::interpolator::{
    InterpolatorBackend, InterpolatorDispatchDesc, InterpolatorEffect, NOMINAL_FRAME_TIME_DELTA_MS,
};
use crate::jobs::CommandRecorder;
use crate::optical_flow::{OpticalFlowContext, OpticalFlowParams, TransferFunction};
use crate::param_bag::{keys, ParamBag, ParamReader};
use crate::ui_mask::UiMask;

/// Placeholder luminance range the dispatch description always carries;
/// spec.md's distillation names no bag key for it, and the original wires
/// this to a pair of constants rather than a measured value (spec.md §9).
const MIN_LUMINANCE: f32 = 0.0001;
const MAX_LUMINANCE: f32 = 10_000.0;

type SharedBackend = BackendWrapper<Box<dyn Backend + Send + Sync>>;
type Compiler = Box<dyn PipelineCompiler + Send + Sync>;
type OpticalFlow = Box<dyn OpticalFlowContext + Send + Sync>;
type InterpolatorBackendHandle = Box<dyn InterpolatorBackend + Send + Sync>;

struct SharedTextures {
    dilated_depth: GpuResource,
    dilated_motion_vectors: GpuResource,
    reconstructed_prev_nearest_depth: GpuResource,
    optical_flow_vector: GpuResource,
    optical_flow_scd: GpuResource,
}

struct State {
    shared_backend: SharedBackend,
    interpolator_backend: SharedBackend,
    dilation: DilationEffect<Compiler>,
    optical_flow: OpticalFlow,
    interpolator: InterpolatorEffect<InterpolatorBackendHandle>,
    textures: SharedTextures,
    debug: DebugConfig,
}

/// The orchestrator for one created feature handle. `&self`-methods only:
/// internal mutability lives behind a lock so [`crate::registry::FeatureRegistry`]
/// can hand out `Arc<FrameInterpolator>` and still let `EvaluateFeature` on
/// two different handles run concurrently (spec.md §5).
pub struct FrameInterpolator {
    state: Mutex<State>,
}

fn create_shared_texture(
    backend: &SharedBackend,
    format: Format,
    dims: Dimensions,
) -> Result<GpuResource, CoreError> {
    let (resource, _pending) = backend.create_resource(&ResourceRequest {
        shape: ResourceShape::Texture2D {
            width: dims.width,
            height: dims.height,
        },
        format,
        usage: UsageFlags::UNORDERED_ACCESS | UsageFlags::SHADER_RESOURCE,
        heap: HeapKind::Default,
        init_data: InitData::None,
        initial_state: ResourceState::COMMON,
    })?;
    Ok(resource)
}

fn resource_from_raw(
    ptr: *mut core::ffi::c_void,
    dims: Dimensions,
    state: ResourceState,
) -> GpuResource {
    GpuResource::new(
        RawHandle(ptr),
        state,
        Format::Unknown,
        dims,
        UsageFlags::SHADER_RESOURCE,
    )
}

impl FrameInterpolator {
    /// Construction steps from spec.md §4.E:
    /// 1. shared backend interface is already initialized by the caller
    ///    (it owns the scratch buffer sizing for however many contexts the
    ///    host asked for);
    /// 2. a second, dedicated backend wrapper for the interpolator's own
    ///    scratch buffer;
    /// 3. create the dilation effect, query its three shared resource
    ///    descriptions, create each on the shared backend;
    /// 4. create the optical-flow context, query its two shared resource
    ///    descriptions, create each on the shared backend;
    /// 5. wrap the interpolator, deferring its own context creation to the
    ///    first dispatch (spec.md §4.G).
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        shared_backend: SharedBackend,
        interpolator_backend: SharedBackend,
        dilation_compiler: Compiler,
        optical_flow: OpticalFlow,
        interpolator_backend_impl: InterpolatorBackendHandle,
        max_render_size: Dimensions,
        debug: DebugConfig,
    ) -> Result<Self, CoreError> {
        let dilation_formats = DilationEffect::<Compiler>::shared_resource_formats();
        let dilated_depth = create_shared_texture(&shared_backend, dilation_formats[0], max_render_size)?;
        let dilated_motion_vectors =
            create_shared_texture(&shared_backend, dilation_formats[1], max_render_size)?;
        let reconstructed_prev_nearest_depth =
            create_shared_texture(&shared_backend, dilation_formats[2], max_render_size)?;

        let of_descs = optical_flow.resource_descriptions();
        let optical_flow_vector =
            create_shared_texture(&shared_backend, of_descs.vector, of_descs.vector_resolution)?;
        let optical_flow_scd = create_shared_texture(&shared_backend, of_descs.scd, Dimensions::new(1, 1))?;

        let dilation = DilationEffect::new(dilation_compiler);
        let interpolator = InterpolatorEffect::new(interpolator_backend_impl);

        Ok(Self {
            state: Mutex::new(State {
                shared_backend,
                interpolator_backend,
                dilation,
                optical_flow,
                interpolator,
                textures: SharedTextures {
                    dilated_depth,
                    dilated_motion_vectors,
                    reconstructed_prev_nearest_depth,
                    optical_flow_vector,
                    optical_flow_scd,
                },
                debug,
            }),
        })
    }

    /// `EvaluateFeature` for one frame (spec.md §4.E, Dispatch).
    ///
    /// Phase 0 — early gate: register the two copy endpoints; open the
    /// command list ourselves when the host says it isn't recording one.
    /// Phase 1 — measure: derive the render size from the depth subrect
    /// (falling back to the shared textures' own extent), reject anything
    /// at or below 32px on either axis.
    /// Phase 2 — build the per-effect parameter blocks from the bag.
    /// Phase 3 — dispatch dilation, then optical flow, then the
    /// interpolator, short-circuiting on the first error.
    /// Phase 4 — copy the real back buffer through, substituting the
    /// interpolated output as the copy source under the debug overlay /
    /// "interpolated frames only" override; best-effort, only when phase 3
    /// succeeded and both endpoints were resolved.
    /// Phase 5 — close out: close the command list if we opened it, write
    /// `FlushRequired=0`, return the phase-3 status.
    ///
    /// `EnableInterp` only gates phases 1-3 (spec.md §4.E Phase 0); the
    /// copy in Phase 4 always runs when its endpoints are present, even on
    /// the disabled-interpolation fast path (spec.md §8, S1).
    pub fn evaluate(
        &self,
        bag: &mut dyn ParamBag,
        recorder: &mut dyn CommandRecorder,
    ) -> Result<(), CoreError> {
        let mut state = self.state.lock();

        let (enable_interp, is_recording) = {
            let reader = ParamReader::new(&*bag);
            (
                reader.bool_or(keys::ENABLE_INTERP, false),
                reader.bool_or(keys::IS_RECORDING, false),
            )
        };

        // Phase 0: register the copy endpoints. Absence of either just
        // means Phase 4 has nothing to copy; they are not required for the
        // interpolation pipeline itself.
        let output_size = state.textures.dilated_depth.dimensions;
        let reader = ParamReader::new(&*bag);
        let mut backbuffer = reader
            .void_pointer(keys::BACKBUFFER)
            .filter(|p| !p.is_null())
            .map(|p| resource_from_raw(p, output_size, ResourceState::SHADER_READ_COMPUTE));
        let mut output_real = reader
            .void_pointer(keys::OUTPUT_REAL)
            .filter(|p| !p.is_null())
            .map(|p| resource_from_raw(p, output_size, ResourceState::COPY_DEST));
        drop(reader);

        if !is_recording {
            crate::log_once::warn_once(
                "orchestrator::command_list_not_recording",
                || "command list wasn't recording; opening one internally".to_string(),
            );
            let reader = ParamReader::new(&*bag);
            let queue = reader.required_void_pointer(keys::CMD_QUEUE)?;
            let alloc = reader.required_void_pointer(keys::CMD_ALLOC)?;
            recorder.begin_recording(queue, alloc)?;
        }

        let outcome = if !enable_interp {
            Ok(PipelineOutcome::default())
        } else {
            self.run_pipeline(&mut *state, &*bag, recorder, backbuffer.as_ref())
        };

        // Phase 4: best-effort copy, only when phase 1-3 succeeded (or were
        // skipped) and both endpoints resolved.
        if let Ok(result) = &outcome {
            if let (Some(backbuffer), Some(output_real)) = (backbuffer.as_mut(), output_real.as_mut()) {
                let mut source = result.copy_source_override.clone().unwrap_or_else(|| backbuffer.clone());
                recorder.transition(&mut source, ResourceState::COPY_SOURCE)?;
                recorder.transition(output_real, ResourceState::COPY_DEST)?;
                recorder.schedule_copy(output_real, &source)?;
            }
        }

        // Phase 5.
        if !is_recording {
            recorder.end_recording()?;
        }
        recorder.execute_queued()?;
        bag.set_u32(keys::FLUSH_REQUIRED, 0);

        outcome.map(|_| ())
    }

    /// Phases 1-3: measure, build parameters, dispatch dilation → optical
    /// flow → interpolator. Only reached when `EnableInterp != 0`.
    fn run_pipeline(
        &self,
        state: &mut State,
        bag: &dyn ParamBag,
        recorder: &mut dyn CommandRecorder,
        backbuffer: Option<&GpuResource>,
    ) -> Result<PipelineOutcome, CoreError> {
        // Phase 1: depth's own intrinsic extent isn't queryable from a raw
        // host pointer in this model, so the shared textures' construction
        // extent (the orchestrator's max render size) stands in for it.
        let reader = ParamReader::new(bag);
        let depth_ptr = reader.required_void_pointer(keys::DEPTH)?;
        let mvecs_ptr = reader.required_void_pointer(keys::MVECS)?;
        let output_interp_ptr = reader.required_void_pointer(keys::OUTPUT_INTERPOLATED)?;
        let hudless_ptr = reader.void_pointer(keys::HUDLESS).filter(|p| !p.is_null());

        let depth_intrinsic_extent = state.textures.dilated_depth.dimensions;
        let output_size = depth_intrinsic_extent;
        let render_size = Dimensions::new(
            reader.u32_or(keys::DEPTH_SUBRECT_WIDTH, depth_intrinsic_extent.width),
            reader.u32_or(keys::DEPTH_SUBRECT_HEIGHT, depth_intrinsic_extent.height),
        );
        if render_size.width <= 32 || render_size.height <= 32 {
            return Err(CoreError::InvalidArgument(format!(
                "render size {}x{} at or below the 32px floor",
                render_size.width, render_size.height
            )));
        }
        if !render_size.fits_within(output_size) {
            return Err(CoreError::Unsupported(format!(
                "render size {}x{} exceeds the size the shared textures were created at",
                render_size.width, render_size.height
            )));
        }

        let mvecs_subrect = Dimensions::new(
            reader.u32_or(keys::MVECS_SUBRECT_WIDTH, depth_intrinsic_extent.width),
            reader.u32_or(keys::MVECS_SUBRECT_HEIGHT, depth_intrinsic_extent.height),
        );

        let depth = resource_from_raw(depth_ptr, render_size, ResourceState::COPY_DEST);
        let mvecs = resource_from_raw(mvecs_ptr, mvecs_subrect, ResourceState::COPY_DEST);
        let hudless = hudless_ptr.map(|p| resource_from_raw(p, render_size, ResourceState::COPY_DEST));
        let output_interpolated =
            resource_from_raw(output_interp_ptr, output_size, ResourceState::UNORDERED_ACCESS);

        // Optical-flow and interpolator color input: HUDLess when present,
        // otherwise the back buffer; at least one is required.
        let color_input = hudless
            .as_ref()
            .or(backbuffer)
            .ok_or_else(|| CoreError::NotFound("neither DLSSG.HUDLess nor DLSSG.Backbuffer present".to_string()))?;

        let jitter_offset = (
            reader.f32_or(keys::JITTER_OFFSET_X, 0.0),
            reader.f32_or(keys::JITTER_OFFSET_Y, 0.0),
        );
        let mvec_scale = (
            reader.f32_or(keys::MVEC_SCALE_X, 1.0),
            reader.f32_or(keys::MVEC_SCALE_Y, 1.0),
        );
        let color_hdr = reader.bool_or(keys::COLOR_BUFFERS_HDR, false);
        let depth_inverted = reader.bool_or(keys::DEPTH_INVERTED, false);
        let reset = reader.bool_or(keys::RESET, false);
        let mv_jitter_cancellation = reader.bool_or(keys::MVEC_JITTERED, false);
        let camera_fov_raw = reader.f32_or(keys::CAMERA_FOV, 1.0);
        // Radians when small enough to plausibly already be radians,
        // degrees otherwise (spec.md §4.E, Phase 2).
        let camera_fov = if camera_fov_raw <= 10.0 { camera_fov_raw } else { camera_fov_raw.to_radians() };
        let camera_near = reader.f32_or(keys::CAMERA_NEAR, 0.1);
        let camera_far = reader.f32_or(keys::CAMERA_FAR, 1000.0);
        let ui_mask = UiMask::from_raw(reader.void_pointer(keys::UI_MASK).unwrap_or(std::ptr::null_mut()));
        drop(reader);

        let mv_full_resolution = mvecs_subrect == output_size;

        let mut dilation_flags = DilationFlags::empty();
        dilation_flags.set(DilationFlags::HDR_COLOR_INPUT, color_hdr);
        dilation_flags.set(DilationFlags::DEPTH_INVERTED, depth_inverted);
        dilation_flags.set(DilationFlags::MV_JITTER_CANCELLATION, mv_jitter_cancellation);
        dilation_flags.set(DilationFlags::DISPLAY_RESOLUTION_MVS, mv_full_resolution);

        let mut interpolator_flags = InterpolatorFlags::empty();
        interpolator_flags.set(InterpolatorFlags::HDR_COLOR_INPUT, color_hdr);
        interpolator_flags.set(InterpolatorFlags::DEPTH_INVERTED, depth_inverted);
        interpolator_flags.set(InterpolatorFlags::MV_JITTER_CANCELLATION, mv_jitter_cancellation);
        interpolator_flags.set(InterpolatorFlags::MV_FULL_RESOLUTION, mv_full_resolution);

        let debug_overlay = state.debug.enable_debug_overlay;
        let debug_tear_lines = state.debug.enable_debug_tear_lines;
        let interpolated_frames_only = state.debug.enable_interpolated_frames_only;

        // Phase 3a: dilation.
        let State {
            dilation,
            optical_flow,
            interpolator,
            interpolator_backend,
            textures,
            ..
        } = state;

        dilation
            .dispatch(
                recorder,
                &DilationParams {
                    input_depth: &depth,
                    input_motion_vectors: &mvecs,
                    outputs: DilationOutputs {
                        dilated_depth: &textures.dilated_depth,
                        dilated_motion_vectors: &textures.dilated_motion_vectors,
                        reconstructed_prev_nearest_depth: &textures.reconstructed_prev_nearest_depth,
                    },
                    render_size,
                    output_size,
                    flags: dilation_flags,
                    mvec_scale,
                    jitter_offset,
                },
            )
            .inspect_err(|err| err.log_if_warranted())?;

        // Phase 3b: optical flow.
        let transfer_function = if color_hdr { TransferFunction::Pq } else { TransferFunction::Srgb };
        optical_flow
            .dispatch(
                recorder,
                &textures.optical_flow_vector,
                &textures.optical_flow_scd,
                &OpticalFlowParams {
                    color_input,
                    reset,
                    transfer_function,
                    min_luminance: MIN_LUMINANCE,
                    max_luminance: MAX_LUMINANCE,
                },
            )
            .inspect_err(|err| err.log_if_warranted())?;

        // Phase 3c: interpolator.
        interpolator
            .dispatch(
                recorder,
                interpolator_flags,
                color_input.format,
                InterpolatorDispatchDesc {
                    hudless_input: hudless.as_ref(),
                    color_input,
                    interpolated_output: &output_interpolated,
                    dilated_depth: &textures.dilated_depth,
                    dilated_motion_vectors: &textures.dilated_motion_vectors,
                    reconstructed_prev_nearest_depth: &textures.reconstructed_prev_nearest_depth,
                    optical_flow_vector: &textures.optical_flow_vector,
                    optical_flow_scd: &textures.optical_flow_scd,
                    render_size,
                    output_size,
                    of_block_size: 8,
                    camera_fov_radians: camera_fov,
                    camera_near,
                    camera_far,
                    min_luminance: MIN_LUMINANCE,
                    max_luminance: MAX_LUMINANCE,
                    debug_view: debug_overlay,
                    debug_tear_lines,
                    reset,
                    ui_mask: ui_mask.handle(),
                    frame_id: 0,
                    frame_time_delta_ms: NOMINAL_FRAME_TIME_DELTA_MS,
                },
                |format| create_shared_texture(interpolator_backend, format, render_size),
            )
            .inspect_err(|err| err.log_if_warranted())?;

        let copy_source_override =
            if debug_overlay || interpolated_frames_only { Some(output_interpolated.clone()) } else { None };
        Ok(PipelineOutcome { copy_source_override })
    }
}

/// What Phase 4 should do once phases 1-3 have run (or were skipped).
/// `copy_source_override` is `Some` only when the debug overlay or
/// "interpolated frames only" switch substitutes the interpolated color as
/// the copy source (spec.md §4.E, Phase 3).
#[derive(Default)]
struct PipelineOutcome {
    copy_source_override: Option<GpuResource>,
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::dilation::PipelineHandle;
    use crate::interpolator::{InterpolatorContextHandle, InterpolatorPrepareDesc};
    use crate::optical_flow::OpticalFlowResourceDescs;
    use fgh::backend::ResourceRequest;
    use fgh::DeviceError;

    struct StubBackend;
    impl Backend for StubBackend {
        fn create_resource_native(&self, request: &ResourceRequest) -> Result<GpuResource, DeviceError> {
            Ok(GpuResource::new(
                RawHandle::NULL,
                request.initial_state,
                request.format,
                dims_of(request.shape),
                request.usage,
            ))
        }

        fn destroy_resource_native(&self, _resource: &GpuResource) {}

        fn scratch_base(&self) -> *const u8 {
            self as *const Self as *const u8
        }
    }

    fn dims_of(shape: fgh::backend::ResourceShape) -> Dimensions {
        match shape {
            fgh::backend::ResourceShape::Texture2D { width, height } => Dimensions::new(width, height),
            _ => Dimensions::default(),
        }
    }

    struct StubCompiler;
    impl PipelineCompiler for StubCompiler {
        fn compile(&self, flags: DilationFlags) -> Result<PipelineHandle, CoreError> {
            Ok(PipelineHandle(flags.bits() as u64))
        }
    }

    struct StubOpticalFlow;
    impl OpticalFlowContext for StubOpticalFlow {
        fn resource_descriptions(&self) -> OpticalFlowResourceDescs {
            OpticalFlowResourceDescs {
                vector: Format::R16G16Float,
                vector_resolution: Dimensions::new(240, 135),
                scd: Format::R32Uint,
            }
        }

        fn dispatch(
            &mut self,
            _recorder: &mut dyn CommandRecorder,
            _vector_out: &GpuResource,
            _scd_out: &GpuResource,
            _params: &OpticalFlowParams<'_>,
        ) -> Result<(), CoreError> {
            Ok(())
        }
    }

    struct StubInterpolatorBackend;
    impl InterpolatorBackend for StubInterpolatorBackend {
        fn create_context(
            &mut self,
            _desc: &InterpolatorPrepareDesc<'_>,
        ) -> Result<InterpolatorContextHandle, CoreError> {
            Ok(InterpolatorContextHandle(1))
        }

        fn override_prev_source_slot(
            &mut self,
            _context: InterpolatorContextHandle,
            _replacement: Option<&GpuResource>,
        ) -> Result<(), CoreError> {
            Ok(())
        }

        fn dispatch(
            &mut self,
            _recorder: &mut dyn CommandRecorder,
            _context: InterpolatorContextHandle,
            _desc: &InterpolatorDispatchDesc<'_>,
        ) -> Result<(), CoreError> {
            Ok(())
        }

        fn bootstrap_clear_targets(&self, _context: InterpolatorContextHandle) -> [GpuResource; 4] {
            std::array::from_fn(|_| {
                GpuResource::new(
                    RawHandle::NULL,
                    ResourceState::COMMON,
                    Format::Unknown,
                    Dimensions::new(1, 1),
                    UsageFlags::UNORDERED_ACCESS,
                )
            })
        }
    }

    pub fn stub_orchestrator() -> FrameInterpolator {
        let shared: Box<dyn Backend + Send + Sync> = Box::new(StubBackend);
        let interp: Box<dyn Backend + Send + Sync> = Box::new(StubBackend);
        FrameInterpolator::new(
            BackendWrapper::new(shared, None),
            BackendWrapper::new(interp, None),
            Box::new(StubCompiler),
            Box::new(StubOpticalFlow),
            Box::new(StubInterpolatorBackend),
            Dimensions::new(1920, 1080),
            DebugConfig::default(),
        )
        .expect("stub construction never fails")
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::stub_orchestrator;
    use super::*;
    use crate::jobs::RecordingLog;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MockBag {
        u32s: HashMap<String, u32>,
        f32s: HashMap<String, f32>,
        ptrs: HashMap<String, *mut core::ffi::c_void>,
    }

    impl ParamBag for MockBag {
        fn set_void_pointer(&mut self, key: &str, value: *mut core::ffi::c_void) {
            self.ptrs.insert(key.to_string(), value);
        }
        fn set_u32(&mut self, key: &str, value: u32) {
            self.u32s.insert(key.to_string(), value);
        }
        fn get_void_pointer(&self, key: &str) -> Option<*mut core::ffi::c_void> {
            self.ptrs.get(key).copied()
        }
        fn get_u32(&self, key: &str) -> Option<u32> {
            self.u32s.get(key).copied()
        }
        fn get_f32(&self, key: &str) -> Option<f32> {
            self.f32s.get(key).copied()
        }
    }

    fn token(value: u8) -> *mut core::ffi::c_void {
        Box::into_raw(Box::new(value)) as *mut core::ffi::c_void
    }

    fn populated_bag() -> MockBag {
        let mut bag = MockBag::default();
        bag.set_u32(keys::ENABLE_INTERP, 1);
        bag.set_void_pointer(keys::CMD_QUEUE, token(1));
        bag.set_void_pointer(keys::CMD_ALLOC, token(2));
        bag.set_void_pointer(keys::DEPTH, token(3));
        bag.set_void_pointer(keys::MVECS, token(4));
        bag.set_void_pointer(keys::BACKBUFFER, token(5));
        bag.set_void_pointer(keys::OUTPUT_REAL, token(6));
        bag.set_void_pointer(keys::OUTPUT_INTERPOLATED, token(7));
        bag
    }

    /// spec.md §8, S1: the fast path still performs the back-buffer→real-
    /// output copy even with interpolation disabled.
    #[test]
    fn disabled_interpolation_runs_only_the_backbuffer_copy() {
        let orchestrator = stub_orchestrator();
        let mut bag = populated_bag();
        bag.set_u32(keys::ENABLE_INTERP, 0);
        let mut log = RecordingLog::default();
        orchestrator.evaluate(&mut bag, &mut log).unwrap();
        assert_eq!(bag.get_u32(keys::FLUSH_REQUIRED), Some(0));
        assert_eq!(log.copies, 1);
        assert!(log.clears.is_empty());
        assert!(log.computes.is_empty());
    }

    #[test]
    fn render_size_at_the_32px_floor_is_rejected() {
        let orchestrator = stub_orchestrator();
        let mut bag = populated_bag();
        bag.set_u32(keys::DEPTH_SUBRECT_WIDTH, 32);
        bag.set_u32(keys::DEPTH_SUBRECT_HEIGHT, 32);
        let mut log = RecordingLog::default();
        let result = orchestrator.evaluate(&mut bag, &mut log);
        assert!(matches!(result, Err(CoreError::InvalidArgument(_))));
    }

    /// spec.md §8, S2: a too-small depth subrect is the same 32px floor
    /// rejection from render-size measurement.
    #[test]
    fn undersized_depth_subrect_is_rejected() {
        let orchestrator = stub_orchestrator();
        let mut bag = populated_bag();
        bag.set_u32(keys::DEPTH_SUBRECT_WIDTH, 16);
        bag.set_u32(keys::DEPTH_SUBRECT_HEIGHT, 16);
        let mut log = RecordingLog::default();
        let result = orchestrator.evaluate(&mut bag, &mut log);
        assert!(matches!(result, Err(CoreError::InvalidArgument(_))));
    }

    #[test]
    fn missing_color_input_is_not_found() {
        let orchestrator = stub_orchestrator();
        let mut bag = populated_bag();
        bag.ptrs.remove(keys::BACKBUFFER);
        let mut log = RecordingLog::default();
        let result = orchestrator.evaluate(&mut bag, &mut log);
        assert!(matches!(result, Err(CoreError::NotFound(_))));
    }

    #[test]
    fn full_dispatch_runs_all_three_effects_and_clears_flush_required() {
        let orchestrator = stub_orchestrator();
        let mut bag = populated_bag();
        let mut log = RecordingLog::default();
        orchestrator.evaluate(&mut bag, &mut log).unwrap();
        assert_eq!(bag.get_u32(keys::FLUSH_REQUIRED), Some(0));
        assert!(log.executed);
        // 1 dilation clear (ReconstructedPrevNearestDepth) + 4 interpolator
        // bootstrap clears on this first-ever dispatch (spec.md §3, §8 S3).
        assert_eq!(log.clears.len(), 5);
        assert_eq!(log.copies, 1);
    }

    /// spec.md §8, S5: `IsRecording=0` with a valid queue+allocator opens
    /// and closes exactly one command list around the dispatch.
    #[test]
    fn not_recording_opens_and_closes_the_command_list_once() {
        let orchestrator = stub_orchestrator();
        let mut bag = populated_bag();
        let mut log = RecordingLog::default();
        orchestrator.evaluate(&mut bag, &mut log).unwrap();
        assert_eq!(log.recordings_opened, 1);
        assert_eq!(log.recordings_closed, 1);
    }

    #[test]
    fn already_recording_does_not_open_a_command_list() {
        let orchestrator = stub_orchestrator();
        let mut bag = populated_bag();
        bag.set_u32(keys::IS_RECORDING, 1);
        let mut log = RecordingLog::default();
        orchestrator.evaluate(&mut bag, &mut log).unwrap();
        assert_eq!(log.recordings_opened, 0);
        assert_eq!(log.recordings_closed, 0);
    }

    #[test]
    fn debug_interpolated_only_substitutes_interpolated_output_for_the_copy() {
        let orchestrator = stub_orchestrator();
        orchestrator.state.lock().debug.enable_interpolated_frames_only = true;
        let mut bag = populated_bag();
        let mut log = RecordingLog::default();
        orchestrator.evaluate(&mut bag, &mut log).unwrap();
        assert_eq!(log.copies, 1);
    }
}
