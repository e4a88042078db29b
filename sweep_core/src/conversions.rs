//! `From` implementations bridging `sweep_config` types to `sweep_core` types.

use std::time::Duration;

use crate::config::{ArmCfg, Intervals, JoinCfg, RemovalCfg, StabilizerCfg};

// ── ArmCfg ───────────────────────────────────────────────────────────────────

impl From<&sweep_config::Arm> for ArmCfg {
    fn from(c: &sweep_config::Arm) -> Self {
        Self {
            up_deg: c.up_deg,
            down_deg: c.down_deg,
            calibration_pause: Duration::from_millis(c.calibration_pause_ms),
            settle: Duration::from_millis(c.settle_ms),
        }
    }
}

// ── Intervals ────────────────────────────────────────────────────────────────

impl From<&sweep_config::Config> for Intervals {
    fn from(c: &sweep_config::Config) -> Self {
        Self {
            idle: Duration::from_millis(c.intervals.idle_ms),
            printing: Duration::from_millis(c.intervals.printing_ms),
            removing: Duration::from_millis(c.intervals.removing_ms),
            connect_retry: Duration::from_millis(c.network.retry_ms),
        }
    }
}

// ── RemovalCfg ───────────────────────────────────────────────────────────────

impl From<&sweep_config::Removal> for RemovalCfg {
    fn from(c: &sweep_config::Removal) -> Self {
        Self {
            ready_sentinel: c.ready_sentinel,
            done_sentinel: c.done_sentinel,
            min_weight_gain: c.min_weight_gain,
            ..Self::default()
        }
    }
}

// ── StabilizerCfg ────────────────────────────────────────────────────────────

impl From<&sweep_config::ScaleCfg> for StabilizerCfg {
    fn from(c: &sweep_config::ScaleCfg) -> Self {
        Self {
            samples: c.samples,
            sample_delay: Duration::from_micros(c.sample_delay_us),
            deviation_pct: c.deviation_pct,
            read_timeout: Duration::from_millis(c.ready_timeout_ms),
        }
    }
}

// ── JoinCfg ──────────────────────────────────────────────────────────────────

impl From<&sweep_config::Network> for JoinCfg {
    fn from(c: &sweep_config::Network) -> Self {
        Self {
            ssid: c.ssid.clone().unwrap_or_default(),
            password: c.password.clone().unwrap_or_default(),
            attempts: c.join_attempts,
            poll: Duration::from_millis(c.join_poll_ms),
        }
    }
}
