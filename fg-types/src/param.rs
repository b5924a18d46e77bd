/// A value stored in the host's parameter bag (spec.md §3, §4.D).
///
/// The vendor ABI is nearly-stringly-typed (every value is looked up by
/// name); this sum type is the one place that stringliness stops, per the
/// design note in spec.md §9 ("small typed facades rather than replicating
/// the vendor's nearly-stringly-typed API").
#[derive(Clone, Debug)]
pub enum ParamValue {
    VoidPointer(*mut core::ffi::c_void),
    Float(f32),
    U32(u32),
    /// Opaque graphics-resource pointer (a `ID3D12Resource*` or
    /// `VkImage`/`VkBuffer` handle, depending on backend). The bag never
    /// interprets it; it is handed to `fg-hal` as-is.
    GraphicsResource(*mut core::ffi::c_void),
}

// SAFETY: the pointer variants are opaque host-owned handles that the bag
// never dereferences; they are Sync/Send in the same sense raw FFI handles
// passed across an ABI boundary always are (the host already shares them
// across its own threads before handing them to us).
unsafe impl Send for ParamValue {}
unsafe impl Sync for ParamValue {}

impl ParamValue {
    pub fn as_void_ptr(&self) -> Option<*mut core::ffi::c_void> {
        match self {
            ParamValue::VoidPointer(p) => Some(*p),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            ParamValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            ParamValue::U32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_graphics_resource(&self) -> Option<*mut core::ffi::c_void> {
        match self {
            ParamValue::GraphicsResource(p) => Some(*p),
            _ => None,
        }
    }
}
