//! Runtime configuration used by the controller.
//!
//! Separate from the TOML-deserialized config in `sweep_config`; see
//! `conversions` for the mapping.

use std::time::Duration;

/// Arm geometry and the timing of the fixed motions.
#[derive(Debug, Clone)]
pub struct ArmCfg {
    /// Resting position, clear of the print head.
    pub up_deg: u16,
    /// Sweep position, level with the bed.
    pub down_deg: u16,
    /// Pause between the two halves of the start-up sweep.
    pub calibration_pause: Duration,
    /// Wait after lifting before the bin is weighed.
    pub settle: Duration,
}

impl Default for ArmCfg {
    fn default() -> Self {
        Self {
            up_deg: 140,
            down_deg: 0,
            calibration_pause: Duration::from_secs(3),
            settle: Duration::from_secs(1),
        }
    }
}

/// Sleep after each tick, per state.
#[derive(Debug, Clone)]
pub struct Intervals {
    pub idle: Duration,
    pub printing: Duration,
    pub removing: Duration,
    /// After a failed network join.
    pub connect_retry: Duration,
}

impl Default for Intervals {
    fn default() -> Self {
        Self {
            idle: Duration::from_secs(5),
            printing: Duration::from_secs(1),
            removing: Duration::from_millis(500),
            connect_retry: Duration::from_secs(5),
        }
    }
}

/// Nozzle-target sentinels and the removal confirmation threshold.
#[derive(Debug, Clone)]
pub struct RemovalCfg {
    pub ready_sentinel: f64,
    pub done_sentinel: f64,
    /// Confirm only when the bin gained strictly more than this.
    pub min_weight_gain: i32,
    pub sentinel_tolerance: f64,
}

impl Default for RemovalCfg {
    fn default() -> Self {
        Self {
            ready_sentinel: 28.0,
            done_sentinel: 29.0,
            min_weight_gain: 100,
            sentinel_tolerance: 1e-3,
        }
    }
}

impl RemovalCfg {
    pub fn is_ready_signal(&self, nozzle_target: f64) -> bool {
        (nozzle_target - self.ready_sentinel).abs() < self.sentinel_tolerance
    }

    pub fn is_done_signal(&self, nozzle_target: f64) -> bool {
        (nozzle_target - self.done_sentinel).abs() < self.sentinel_tolerance
    }
}

/// Sampling of a stable weight.
#[derive(Debug, Clone)]
pub struct StabilizerCfg {
    pub samples: usize,
    pub sample_delay: Duration,
    pub deviation_pct: f64,
    /// Per-read data-ready timeout.
    pub read_timeout: Duration,
}

impl Default for StabilizerCfg {
    fn default() -> Self {
        Self {
            samples: 10,
            sample_delay: Duration::from_micros(500),
            deviation_pct: 10.0,
            read_timeout: Duration::from_secs(5),
        }
    }
}

/// Station-mode join parameters.
#[derive(Debug, Clone)]
pub struct JoinCfg {
    pub ssid: String,
    pub password: String,
    pub attempts: u32,
    pub poll: Duration,
}

impl Default for JoinCfg {
    fn default() -> Self {
        Self {
            ssid: String::new(),
            password: String::new(),
            attempts: 10,
            poll: Duration::from_secs(1),
        }
    }
}
