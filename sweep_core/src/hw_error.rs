//! Maps `Box<dyn Error>` from trait boundaries to typed `SweepError`.
//!
//! The traits in `sweep_traits` use `Box<dyn Error + Send + Sync>`; this
//! module converts those to our typed error enum, with an optional
//! feature-gated path for `sweep_hardware::HwError` downcasting.

use crate::error::SweepError;

/// Map a scale or arm error to a typed `SweepError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> SweepError {
    #[cfg(feature = "hardware-errors")]
    {
        use sweep_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::DeviceNotReady => SweepError::DeviceNotReady,
                HwError::InvalidConfiguration(code) => {
                    SweepError::InvalidConfiguration(format!("hx711 channel code {code}"))
                }
                other => SweepError::Hardware(other.to_string()),
            };
        }
    }

    if let Some(typed) = e.downcast_ref::<SweepError>() {
        return typed.clone();
    }

    let s = e.to_string();
    let lower = s.to_lowercase();
    if lower.contains("timeout") || lower.contains("not ready") {
        SweepError::DeviceNotReady
    } else {
        SweepError::Hardware(s)
    }
}
