/*! Per-feature-handle orchestration for the frame-generation interposer.

This is the crate that owns what spec.md calls "the hard core": the
parameter bag (4.D), the frame-interpolator orchestrator (4.E), the dilation
effect (4.F), and the thin wrapper around the third-party interpolator
(4.G). It depends on [`fg_hal`] for everything that touches a concrete
device, and on [`fg_types`] for the shared vocabulary; it never links
against a concrete GPU API itself.
!*/

#![warn(trivial_casts, trivial_numeric_casts, unused_qualifications)]

pub mod config;
pub mod dilation;
pub mod error;
pub mod interpolator;
pub mod jobs;
pub mod log_once;
pub mod optical_flow;
pub mod orchestrator;
pub mod param_bag;
pub mod registry;
pub mod ui_mask;

pub use error::CoreError;
pub use orchestrator::FrameInterpolator;
pub use registry::FeatureRegistry;

use once_cell::sync::OnceCell;

static LOGGER_INIT: OnceCell<()> = OnceCell::new();

/// Initializes the line-based log file next to the core library (spec.md
/// §6: `dlssg_to_fsr3.log`, `[HH:MM:SS] [level] message`), via `fern` over
/// the `log` facade. Idempotent — later calls are no-ops, mirroring the
/// once-only `Init`/`Shutdown` lifecycle of the process-wide device state
/// (spec.md §9).
pub fn init_logging(log_path: &std::path::Path) -> Result<(), fern::InitError> {
    LOGGER_INIT.get_or_try_init(|| {
        fern::Dispatch::new()
            .format(|out, message, record| {
                out.finish(format_args!(
                    "[{}] [{}] {}",
                    chrono_like_time(),
                    record.level(),
                    message
                ))
            })
            .level(log::LevelFilter::Info)
            .chain(fern::log_file(log_path)?)
            .apply()?;
        Ok(())
    })?;
    Ok(())
}

/// `HH:MM:SS` of local wall-clock time, formatted without pulling in a full
/// date/time crate — the log format only ever needs time-of-day (spec.md
/// §6).
fn chrono_like_time() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
        % 86_400;
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}
