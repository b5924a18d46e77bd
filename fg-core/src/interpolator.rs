//! Interpolator Effect Wrapper (spec.md §4.G).
//!
//! Thin layer over the third-party temporal interpolator. Defers context
//! creation to the first dispatch (the back-buffer format isn't known until
//! then) and works around the underlying effect's format-locked
//! "previous interpolation source" texture by swapping in a backup texture
//! whenever the host presents a different input format.

use fgh::resource::{GpuResource, RawHandle};
use fgt::{Format, InterpolatorFlags};

use crate::error::CoreError;
use crate::jobs::CommandRecorder;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct InterpolatorContextHandle(pub u64);

pub struct InterpolatorPrepareDesc<'a> {
    pub flags: InterpolatorFlags,
    pub back_buffer_format: Format,
    pub render_size: fgt::Dimensions,
    pub output_size: fgt::Dimensions,
}

pub struct InterpolatorDispatchDesc<'a> {
    pub hudless_input: Option<&'a GpuResource>,
    pub color_input: &'a GpuResource,
    pub interpolated_output: &'a GpuResource,
    pub dilated_depth: &'a GpuResource,
    pub dilated_motion_vectors: &'a GpuResource,
    pub reconstructed_prev_nearest_depth: &'a GpuResource,
    pub optical_flow_vector: &'a GpuResource,
    pub optical_flow_scd: &'a GpuResource,
    pub render_size: fgt::Dimensions,
    pub output_size: fgt::Dimensions,
    pub of_block_size: u32,
    pub camera_fov_radians: f32,
    pub camera_near: f32,
    pub camera_far: f32,
    pub min_luminance: f32,
    pub max_luminance: f32,
    pub debug_view: bool,
    pub debug_tear_lines: bool,
    pub reset: bool,
    /// Region the host never wants blended with interpolated content
    /// (spec.md §9 supplemented feature; see [`crate::ui_mask`]).
    pub ui_mask: Option<RawHandle>,
    /// Always `0` — the effect is driven synchronously and not bindless
    /// (spec.md §4.G, Dispatch).
    pub frame_id: u32,
    /// Unused by the effect; fixed at `1000.0 / 60.0` (spec.md §4.G).
    pub frame_time_delta_ms: f32,
}

/// Seam to the third-party interpolator context.
pub trait InterpolatorBackend {
    fn create_context(
        &mut self,
        desc: &InterpolatorPrepareDesc<'_>,
    ) -> Result<InterpolatorContextHandle, CoreError>;

    /// Replaces the effect's internal previous-interpolation-source slot
    /// with `replacement` (or restores the original when `replacement` is
    /// `None`). Internal-handle replacement only — no content is copied
    /// (spec.md §4.G, "Format-swap workaround").
    fn override_prev_source_slot(
        &mut self,
        context: InterpolatorContextHandle,
        replacement: Option<&GpuResource>,
    ) -> Result<(), CoreError>;

    fn dispatch(
        &mut self,
        recorder: &mut dyn CommandRecorder,
        context: InterpolatorContextHandle,
        desc: &InterpolatorDispatchDesc<'_>,
    ) -> Result<(), CoreError>;

    /// The effect's own two alternating radiance buffers and two alternating
    /// variance buffers (spec.md §3, Invariants: "the first evaluate frame
    /// of an orchestrator *must* clear the two alternating radiance and
    /// variance buffers owned by downstream effects"). Queried once, right
    /// after context creation, so the wrapper can schedule their clear
    /// before the context's first real dispatch (spec.md §8, S3).
    fn bootstrap_clear_targets(&self, context: InterpolatorContextHandle) -> [GpuResource; 4];
}

impl InterpolatorBackend for Box<dyn InterpolatorBackend + Send + Sync> {
    fn create_context(
        &mut self,
        desc: &InterpolatorPrepareDesc<'_>,
    ) -> Result<InterpolatorContextHandle, CoreError> {
        (**self).create_context(desc)
    }

    fn override_prev_source_slot(
        &mut self,
        context: InterpolatorContextHandle,
        replacement: Option<&GpuResource>,
    ) -> Result<(), CoreError> {
        (**self).override_prev_source_slot(context, replacement)
    }

    fn dispatch(
        &mut self,
        recorder: &mut dyn CommandRecorder,
        context: InterpolatorContextHandle,
        desc: &InterpolatorDispatchDesc<'_>,
    ) -> Result<(), CoreError> {
        (**self).dispatch(recorder, context, desc)
    }

    fn bootstrap_clear_targets(&self, context: InterpolatorContextHandle) -> [GpuResource; 4] {
        (**self).bootstrap_clear_targets(context)
    }
}

pub struct InterpolatorEffect<B: InterpolatorBackend> {
    backend: B,
    context: Option<InterpolatorContextHandle>,
    declared_format: Option<Format>,
    backup_source: Option<GpuResource>,
    using_backup: bool,
}

impl<B: InterpolatorBackend> InterpolatorEffect<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            context: None,
            declared_format: None,
            backup_source: None,
            using_backup: false,
        }
    }

    /// Returns the context handle plus whether this call just created it —
    /// the caller uses that to decide whether the bootstrap clear (spec.md
    /// §3 Invariants, §8 S3) is due.
    fn ensure_context(
        &mut self,
        flags: InterpolatorFlags,
        initial_format: Format,
        render_size: fgt::Dimensions,
        output_size: fgt::Dimensions,
    ) -> Result<(InterpolatorContextHandle, bool), CoreError> {
        if let Some(context) = self.context {
            return Ok((context, false));
        }
        let desc = InterpolatorPrepareDesc {
            flags,
            back_buffer_format: initial_format,
            render_size,
            output_size,
        };
        let context = self.backend.create_context(&desc)?;
        self.context = Some(context);
        self.declared_format = Some(initial_format);
        Ok((context, true))
    }

    /// Allocates (once) a backup previous-interpolation-source texture at
    /// `format` and swaps it in; swaps the original back when `format`
    /// matches the declared format again (spec.md §4.G).
    fn apply_format_swap_workaround(
        &mut self,
        context: InterpolatorContextHandle,
        current_format: Format,
        allocate_backup: impl FnOnce(Format) -> Result<GpuResource, CoreError>,
    ) -> Result<(), CoreError> {
        let declared = self
            .declared_format
            .expect("context is created before this is called");

        if current_format == declared {
            if self.using_backup {
                self.backend.override_prev_source_slot(context, None)?;
                self.using_backup = false;
            }
            return Ok(());
        }

        if self.backup_source.is_none() {
            self.backup_source = Some(allocate_backup(current_format)?);
        }
        if !self.using_backup {
            let backup = self.backup_source.as_ref().unwrap();
            self.backend.override_prev_source_slot(context, Some(backup))?;
            self.using_backup = true;
        }
        Ok(())
    }

    pub fn backup_source_format(&self) -> Option<Format> {
        self.backup_source.as_ref().map(|r| r.format)
    }

    pub fn dispatch(
        &mut self,
        recorder: &mut dyn CommandRecorder,
        flags: InterpolatorFlags,
        input_format: Format,
        desc: InterpolatorDispatchDesc<'_>,
        allocate_backup: impl FnOnce(Format) -> Result<GpuResource, CoreError>,
    ) -> Result<(), CoreError> {
        let (context, just_created) =
            self.ensure_context(flags, input_format, desc.render_size, desc.output_size)?;
        if just_created {
            for target in self.backend.bootstrap_clear_targets(context) {
                recorder.schedule_clear_float(&target, 0.0)?;
            }
        }
        self.apply_format_swap_workaround(context, input_format, allocate_backup)?;
        self.backend.dispatch(recorder, context, &desc)
    }
}

/// `1000/60`, the nominal placeholder `frameTimeDelta` every frame is
/// dispatched with (spec.md §4.G; §9, Open Question — deriving this from a
/// real timer is explicitly out of scope).
pub const NOMINAL_FRAME_TIME_DELTA_MS: f32 = 1000.0 / 60.0;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::RecordingLog;
    use fgh::resource::RawHandle;
    use fgt::{Dimensions, ResourceState, UsageFlags};

    struct MockBackend {
        contexts_created: u32,
        slot_overrides: Vec<bool>,
    }

    impl InterpolatorBackend for MockBackend {
        fn create_context(
            &mut self,
            _desc: &InterpolatorPrepareDesc<'_>,
        ) -> Result<InterpolatorContextHandle, CoreError> {
            self.contexts_created += 1;
            Ok(InterpolatorContextHandle(1))
        }

        fn override_prev_source_slot(
            &mut self,
            _context: InterpolatorContextHandle,
            replacement: Option<&GpuResource>,
        ) -> Result<(), CoreError> {
            self.slot_overrides.push(replacement.is_some());
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
            std::array::from_fn(|_| resource(Format::Unknown))
        }
    }

    fn resource(format: Format) -> GpuResource {
        GpuResource::new(
            RawHandle::NULL,
            ResourceState::COMMON,
            format,
            Dimensions::new(1920, 1080),
            UsageFlags::UNORDERED_ACCESS,
        )
    }

    fn dispatch_desc(color: &GpuResource, other: &[&GpuResource; 6]) -> InterpolatorDispatchDesc<'_> {
        InterpolatorDispatchDesc {
            hudless_input: None,
            color_input: color,
            interpolated_output: other[0],
            dilated_depth: other[1],
            dilated_motion_vectors: other[2],
            reconstructed_prev_nearest_depth: other[3],
            optical_flow_vector: other[4],
            optical_flow_scd: other[5],
            render_size: Dimensions::new(1920, 1080),
            output_size: Dimensions::new(1920, 1080),
            of_block_size: 8,
            camera_fov_radians: 1.0,
            camera_near: 0.1,
            camera_far: 1000.0,
            min_luminance: 0.00001,
            max_luminance: 1000.0,
            debug_view: false,
            debug_tear_lines: false,
            reset: false,
            ui_mask: None,
            frame_id: 0,
            frame_time_delta_ms: NOMINAL_FRAME_TIME_DELTA_MS,
        }
    }

    #[test]
    fn context_creation_is_deferred_to_first_dispatch() {
        let backend = MockBackend {
            contexts_created: 0,
            slot_overrides: vec![],
        };
        let mut effect = InterpolatorEffect::new(backend);
        assert!(effect.context.is_none());

        let color = resource(Format::R8G8B8A8Unorm);
        let outputs = [
            resource(Format::Unknown),
            resource(Format::Unknown),
            resource(Format::Unknown),
            resource(Format::Unknown),
            resource(Format::Unknown),
            resource(Format::Unknown),
        ];
        let refs: [&GpuResource; 6] = [
            &outputs[0], &outputs[1], &outputs[2], &outputs[3], &outputs[4], &outputs[5],
        ];
        let mut log = RecordingLog::default();
        effect
            .dispatch(
                &mut log,
                InterpolatorFlags::empty(),
                Format::R8G8B8A8Unorm,
                dispatch_desc(&color, &refs),
                |_| unreachable!("format matches declared, no backup expected"),
            )
            .unwrap();
        assert_eq!(effect.backend.contexts_created, 1);
    }

    #[test]
    fn format_drift_allocates_exactly_one_backup_texture() {
        let backend = MockBackend {
            contexts_created: 0,
            slot_overrides: vec![],
        };
        let mut effect = InterpolatorEffect::new(backend);

        let color = resource(Format::R8G8B8A8Unorm);
        let hudless = resource(Format::R16G16B16A16Float);
        let outputs = [
            resource(Format::Unknown),
            resource(Format::Unknown),
            resource(Format::Unknown),
            resource(Format::Unknown),
            resource(Format::Unknown),
            resource(Format::Unknown),
        ];
        let refs: [&GpuResource; 6] = [
            &outputs[0], &outputs[1], &outputs[2], &outputs[3], &outputs[4], &outputs[5],
        ];
        let mut log = RecordingLog::default();
        let mut backups_allocated = 0;

        // First frame: color-only input, declares RGBA8.
        effect
            .dispatch(
                &mut log,
                InterpolatorFlags::empty(),
                Format::R8G8B8A8Unorm,
                dispatch_desc(&color, &refs),
                |_| unreachable!(),
            )
            .unwrap();

        // Second frame: hudless input drifts to RGBA16F.
        effect
            .dispatch(
                &mut log,
                InterpolatorFlags::empty(),
                Format::R16G16B16A16Float,
                dispatch_desc(&hudless, &refs),
                |fmt| {
                    backups_allocated += 1;
                    Ok(resource(fmt))
                },
            )
            .unwrap();

        assert_eq!(backups_allocated, 1);
        assert_eq!(effect.backup_source_format(), Some(Format::R16G16B16A16Float));

        // Third frame: back to RGBA8 — original slot restored, no new backup.
        effect
            .dispatch(
                &mut log,
                InterpolatorFlags::empty(),
                Format::R8G8B8A8Unorm,
                dispatch_desc(&color, &refs),
                |_| unreachable!("backup already allocated once"),
            )
            .unwrap();
        assert_eq!(backups_allocated, 1);
    }

    #[test]
    fn context_creation_schedules_the_four_bootstrap_clears_once() {
        let backend = MockBackend {
            contexts_created: 0,
            slot_overrides: vec![],
        };
        let mut effect = InterpolatorEffect::new(backend);

        let color = resource(Format::R8G8B8A8Unorm);
        let outputs: [GpuResource; 6] = std::array::from_fn(|_| resource(Format::Unknown));
        let refs: [&GpuResource; 6] = [
            &outputs[0], &outputs[1], &outputs[2], &outputs[3], &outputs[4], &outputs[5],
        ];
        let mut log = RecordingLog::default();

        effect
            .dispatch(
                &mut log,
                InterpolatorFlags::empty(),
                Format::R8G8B8A8Unorm,
                dispatch_desc(&color, &refs),
                |_| unreachable!(),
            )
            .unwrap();
        assert_eq!(log.clears.len(), 4);

        effect
            .dispatch(
                &mut log,
                InterpolatorFlags::empty(),
                Format::R8G8B8A8Unorm,
                dispatch_desc(&color, &refs),
                |_| unreachable!(),
            )
            .unwrap();
        assert_eq!(log.clears.len(), 4, "second dispatch reuses the existing context, no re-clear");
    }
}
