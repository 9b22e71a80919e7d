//! Maps `Box<dyn Error>` from trait boundaries to typed `GateError`.
//!
//! The traits in `blastgate_traits` use `Box<dyn Error + Send + Sync>`; this
//! module converts those to our typed error enum, with an optional
//! feature-gated path for `blastgate_hardware::HwError` downcasting.

use crate::error::{GateError, MoveFault};

/// Map a trait-boundary error to a typed `GateError`.
///
/// Errors that already are `GateError` or `MoveFault` pass through. Known
/// hardware error types are downcast next, then string heuristics apply.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> GateError {
    if let Some(g) = e.downcast_ref::<GateError>() {
        return g.clone();
    }
    if let Some(f) = e.downcast_ref::<MoveFault>() {
        return GateError::HardwareFault(f.to_string());
    }

    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<blastgate_hardware::error::HwError>() {
            return match hw {
                blastgate_hardware::error::HwError::Timeout => GateError::Timeout,
                other => GateError::HardwareFault(other.to_string()),
            };
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        GateError::Timeout
    } else {
        GateError::Hardware(s)
    }
}
