use bitflags::bitflags;

bitflags! {
    /// Logical resource state, a bitset over the states named in spec.md §3.
    ///
    /// This is the HAL-agnostic vocabulary; `fg-hal` maps each flag to the
    /// matching `D3D12_RESOURCE_STATE_*` or `vk::ImageLayout` value for
    /// whichever backend is active.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct ResourceState: u32 {
        const COMMON              = 1 << 0;
        const UNORDERED_ACCESS     = 1 << 1;
        const COPY_SOURCE          = 1 << 2;
        const COPY_DEST            = 1 << 3;
        const SHADER_READ_COMPUTE  = 1 << 4;
        const SHADER_READ_PIXEL    = 1 << 5;
        const RENDER_TARGET        = 1 << 6;
        const INDIRECT_ARGUMENT    = 1 << 7;
        const GENERIC_READ         = 1 << 8;
        const COMPOSITE_COPY_DEST  = 1 << 9;
    }
}

bitflags! {
    /// Usage flags attached to a resource at creation time (spec.md §3,
    /// GPU resource descriptor; consumed by 4.H's custom create-resource).
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct UsageFlags: u32 {
        const UNORDERED_ACCESS = 1 << 0;
        const RENDER_TARGET    = 1 << 1;
        const ALIASABLE        = 1 << 2;
        const SHADER_RESOURCE  = 1 << 3;
    }
}

/// Logical resource shape requested of the backend wrapper (4.H).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ResourceKind {
    Buffer { size_bytes: u64 },
    Texture1D { width: u32 },
    Texture2D { width: u32, height: u32 },
    Texture3D { width: u32, height: u32, depth: u32 },
    TextureCube { edge: u32 },
}

/// Pixel / buffer-element format. Only the formats the interposer's own
/// shared textures and the host's color/depth surfaces can take; format
/// negotiation with the third-party FG/OF library stays opaque (it reports
/// its own `Format` values which round-trip through here unexamined).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Format {
    R32Float,
    R16G16Float,
    R32Uint,
    R8G8B8A8Unorm,
    R16G16B16A16Float,
    Unknown,
}

/// Width/height pair used throughout the orchestrator (render size, output
/// size, subrects, OF resolution).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn fits_within(self, bound: Dimensions) -> bool {
        self.width <= bound.width && self.height <= bound.height
    }
}
