/// Status codes returned across the NGX ABI boundary (spec.md §6).
///
/// These match the vendor's own numeric values; the host pattern-matches on
/// them, so the discriminants are load-bearing and must not change.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum NgxStatus {
    Success = 0x1,
    FeatureNotFound = 0xBAD0_0004,
    InvalidParameter = 0xBAD0_0005,
}

impl NgxStatus {
    pub fn is_success(self) -> bool {
        matches!(self, NgxStatus::Success)
    }
}
