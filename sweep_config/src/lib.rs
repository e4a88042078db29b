#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the print-removal station.
//!
//! `Config` and its sections are deserialized from TOML; only `[printer]`
//! is mandatory. Call `validate()` before handing the config to the core.
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Network {
    pub ssid: Option<String>,
    pub password: Option<String>,
    /// Associate with `ssid` ourselves; when false the host is assumed online.
    pub manage_wifi: bool,
    /// Connection polls before a join attempt counts as failed
    pub join_attempts: u32,
    pub join_poll_ms: u64,
    /// Pause after a failed join before the next attempt
    pub retry_ms: u64,
}

impl Default for Network {
    fn default() -> Self {
        Self {
            ssid: None,
            password: None,
            manage_wifi: false,
            join_attempts: 10,
            join_poll_ms: 1000,
            retry_ms: 5000,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Printer {
    pub host: String,
    #[serde(default = "default_http_port")]
    pub port: u16,
    #[serde(default = "default_printer_path")]
    pub path: String,
    /// Sent as `X-Api-Key`
    pub api_key: String,
    #[serde(default = "default_printer_timeout_ms")]
    pub timeout_ms: u64,
}

const fn default_http_port() -> u16 {
    80
}

fn default_printer_path() -> String {
    "/api/printer".to_string()
}

const fn default_printer_timeout_ms() -> u64 {
    5000
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Pins {
    pub servo: u8,
    pub hx711_dt: u8,
    pub hx711_sck: u8,
}

impl Default for Pins {
    fn default() -> Self {
        Self {
            servo: 13,
            hx711_dt: 16,
            hx711_sck: 4,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Arm {
    pub up_deg: u16,
    pub down_deg: u16,
    pub step_deg: u16,
    pub step_delay_ms: u64,
    /// Pause between the two halves of the start-up sweep
    pub calibration_pause_ms: u64,
    /// Wait after lifting before weighing the bin
    pub settle_ms: u64,
}

impl Default for Arm {
    fn default() -> Self {
        Self {
            up_deg: 140,
            down_deg: 0,
            step_deg: 1,
            step_delay_ms: 20,
            calibration_pause_ms: 3000,
            settle_ms: 1000,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Intervals {
    pub idle_ms: u64,
    pub printing_ms: u64,
    pub removing_ms: u64,
}

impl Default for Intervals {
    fn default() -> Self {
        Self {
            idle_ms: 5000,
            printing_ms: 1000,
            removing_ms: 500,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Removal {
    /// Nozzle target that tells us the bed is ready to be cleared
    pub ready_sentinel: f64,
    /// Nozzle target that tells us the clearing pass is over
    pub done_sentinel: f64,
    /// Bin weight increase (counts after tare) that confirms a collected print
    pub min_weight_gain: i32,
}

impl Default for Removal {
    fn default() -> Self {
        Self {
            ready_sentinel: 28.0,
            done_sentinel: 29.0,
            min_weight_gain: 100,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScaleChannel {
    #[default]
    A128,
    A64,
    B32,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ScaleCfg {
    pub samples: usize,
    pub sample_delay_us: u64,
    pub deviation_pct: f64,
    /// Max time to wait for HX711 data-ready (DT low) before failing
    pub ready_timeout_ms: u64,
    pub channel: ScaleChannel,
}

impl Default for ScaleCfg {
    fn default() -> Self {
        Self {
            samples: 10,
            sample_delay_us: 500,
            deviation_pct: 10.0,
            ready_timeout_ms: 5000,
            channel: ScaleChannel::A128,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Status {
    pub bind: String,
    /// 0 picks an ephemeral port
    pub port: u16,
}

impl Default for Status {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 80,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub network: Network,
    pub printer: Printer,
    #[serde(default)]
    pub pins: Pins,
    #[serde(default)]
    pub arm: Arm,
    #[serde(default)]
    pub intervals: Intervals,
    #[serde(default)]
    pub removal: Removal,
    #[serde(default)]
    pub scale: ScaleCfg,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

const MAX_ANGLE: u16 = 180;

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Network
        if self.network.manage_wifi {
            match self.network.ssid.as_deref() {
                Some(s) if !s.trim().is_empty() => {}
                _ => eyre::bail!("network.ssid is required when network.manage_wifi = true"),
            }
        }
        if self.network.join_attempts == 0 {
            eyre::bail!("network.join_attempts must be >= 1");
        }
        if self.network.join_poll_ms == 0 {
            eyre::bail!("network.join_poll_ms must be >= 1");
        }

        // Printer
        if self.printer.host.trim().is_empty() {
            eyre::bail!("printer.host must not be empty");
        }
        if self.printer.api_key.trim().is_empty() {
            eyre::bail!("printer.api_key must not be empty");
        }
        if !self.printer.path.starts_with('/') {
            eyre::bail!("printer.path must start with '/'");
        }
        if self.printer.timeout_ms == 0 {
            eyre::bail!("printer.timeout_ms must be >= 1");
        }

        // Pins
        let p = &self.pins;
        if p.servo == p.hx711_dt || p.servo == p.hx711_sck || p.hx711_dt == p.hx711_sck {
            eyre::bail!("pins.servo, pins.hx711_dt and pins.hx711_sck must be distinct");
        }

        // Arm
        if self.arm.up_deg > MAX_ANGLE || self.arm.down_deg > MAX_ANGLE {
            eyre::bail!("arm.up_deg and arm.down_deg must be in [0, 180]");
        }
        if self.arm.up_deg == self.arm.down_deg {
            eyre::bail!("arm.up_deg must differ from arm.down_deg");
        }
        if self.arm.step_deg == 0 {
            eyre::bail!("arm.step_deg must be >= 1");
        }

        // Intervals
        if self.intervals.idle_ms == 0 || self.intervals.printing_ms == 0 || self.intervals.removing_ms == 0 {
            eyre::bail!("intervals.* must be >= 1 ms");
        }

        // Removal
        if !self.removal.ready_sentinel.is_finite() || !self.removal.done_sentinel.is_finite() {
            eyre::bail!("removal sentinels must be finite numbers");
        }
        if (self.removal.ready_sentinel - self.removal.done_sentinel).abs() < 1e-3 {
            eyre::bail!("removal.ready_sentinel must differ from removal.done_sentinel");
        }
        if self.removal.min_weight_gain < 0 {
            eyre::bail!("removal.min_weight_gain must be >= 0");
        }

        // Scale
        if self.scale.samples == 0 {
            eyre::bail!("scale.samples must be >= 1");
        }
        if !(self.scale.deviation_pct.is_finite() && self.scale.deviation_pct > 0.0) {
            eyre::bail!("scale.deviation_pct must be > 0");
        }
        if self.scale.ready_timeout_ms == 0 {
            eyre::bail!("scale.ready_timeout_ms must be >= 1");
        }

        // Status
        if self.status.bind.trim().is_empty() {
            eyre::bail!("status.bind must not be empty");
        }

        // Logging
        if let Some(r) = self.logging.rotation.as_deref()
            && !matches!(r, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never, daily, hourly");
        }

        Ok(())
    }
}
