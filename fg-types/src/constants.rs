/// Dilation pass constant buffer (spec.md §3, "Constant buffer (dilation)").
///
/// `#[repr(C)]` because this is uploaded verbatim into a GPU constant
/// buffer; field order and types are load-bearing for the shader's `cbuffer`
/// layout. `bytemuck::Pod` lets the backend wrapper copy it into an upload
/// resource without `unsafe` at the call site.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DilationConstants {
    pub render_size: [u32; 2],
    pub max_render_size: [u32; 2],
    pub display_size: [u32; 2],
    pub input_color_size: [u32; 2],

    pub jitter_offset: [f32; 2],
    pub prev_jitter_offset: [f32; 2],

    pub motion_vector_scale: [f32; 2],
    pub mv_jitter_cancellation: [f32; 2],

    pub pre_exposure: f32,
    pub _pad: [f32; 3],
}

impl Default for DilationConstants {
    fn default() -> Self {
        Self {
            render_size: [0, 0],
            max_render_size: [0, 0],
            display_size: [0, 0],
            input_color_size: [0, 0],
            jitter_offset: [0.0, 0.0],
            prev_jitter_offset: [0.0, 0.0],
            motion_vector_scale: [1.0, 1.0],
            mv_jitter_cancellation: [0.0, 0.0],
            pre_exposure: 1.0,
            _pad: [0.0; 3],
        }
    }
}

impl DilationConstants {
    /// Swap current↔previous jitter offset, as required after each frame's
    /// constants are updated (spec.md §4.F, Dispatch step 1).
    pub fn advance_jitter(&mut self) {
        self.prev_jitter_offset = self.jitter_offset;
    }
}
