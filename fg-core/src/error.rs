//! Error kinds and NGX-status mapping (spec.md §7).

use fgt::NgxStatus;

/// The four error kinds from spec.md §7's table, unified into one enum so a
/// `?`-chain through the orchestrator doesn't need a different error type
/// per layer.
#[derive(thiserror::Error, Debug)]
pub enum CoreError {
    /// Null pointer, zero size, unknown name. Maps to `InvalidParameter`.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Feature handle unknown, required bag key missing. Maps to
    /// `FeatureNotFound`.
    #[error("not found: {0}")]
    NotFound(String),

    /// Device lost, OOM, pipeline-compile failure. Maps to
    /// `FeatureNotFound`, logged at warning level.
    #[error("backend failure: {0}")]
    BackendFailure(#[from] fgh::DeviceError),

    /// Required capability absent (e.g. external-semaphore import). Thrown
    /// during construction; `CreateFeature` catches it and returns
    /// `FeatureNotFound`.
    #[error("unsupported: {0}")]
    Unsupported(String),
}

impl CoreError {
    /// Policy table from spec.md §7: everything but `InvalidArgument` is
    /// `FeatureNotFound` at the ABI boundary; only `InvalidArgument` keeps
    /// its own status.
    pub fn to_ngx_status(&self) -> NgxStatus {
        match self {
            CoreError::InvalidArgument(_) => NgxStatus::InvalidParameter,
            CoreError::NotFound(_) | CoreError::BackendFailure(_) | CoreError::Unsupported(_) => {
                NgxStatus::FeatureNotFound
            }
        }
    }

    /// `BackendFailure` is logged at warning level per spec.md §7; the
    /// facade calls this right before mapping to a status so the log
    /// record and the status transition stay in lockstep.
    pub fn log_if_warranted(&self) {
        if let CoreError::BackendFailure(inner) = self {
            log::warn!("backend failure during dispatch: {inner}");
        }
    }
}
