pub mod clock;

pub use clock::{Clock, MonotonicClock};

use std::error::Error;
use std::time::Duration;

/// A load cell front end that produces signed raw counts.
pub trait Scale {
    fn read(&mut self, timeout: Duration) -> Result<i32, Box<dyn Error + Send + Sync>>;
}

/// The sweeping arm. Angles are in degrees, 0..=180.
pub trait Arm {
    /// Move from `start_deg` to `end_deg` inclusive. `start_deg == end_deg`
    /// re-asserts (holds) a single position.
    fn sweep(&mut self, start_deg: u16, end_deg: u16) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// What the core needs to know about the printer on each poll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrinterSnapshot {
    pub is_printing: bool,
    /// Nozzle target temperature. Also carries the removal sentinels.
    pub nozzle_target: f64,
}

/// Source of printer telemetry (a REST endpoint in production).
pub trait PrinterStatus {
    fn fetch(&mut self) -> Result<PrinterSnapshot, Box<dyn Error + Send + Sync>>;
}

/// Station-mode network association.
pub trait NetworkLink {
    /// Start associating with the access point. Completion is observed
    /// through `is_connected`.
    fn connect(&mut self, ssid: &str, password: &str) -> Result<(), Box<dyn Error + Send + Sync>>;
    fn is_connected(&mut self) -> bool;
}

impl<T: Scale + ?Sized> Scale for Box<T> {
    fn read(&mut self, timeout: Duration) -> Result<i32, Box<dyn Error + Send + Sync>> {
        (**self).read(timeout)
    }
}

impl<T: Arm + ?Sized> Arm for Box<T> {
    fn sweep(&mut self, start_deg: u16, end_deg: u16) -> Result<(), Box<dyn Error + Send + Sync>> {
        (**self).sweep(start_deg, end_deg)
    }
}

impl<T: PrinterStatus + ?Sized> PrinterStatus for Box<T> {
    fn fetch(&mut self) -> Result<PrinterSnapshot, Box<dyn Error + Send + Sync>> {
        (**self).fetch()
    }
}

impl<T: NetworkLink + ?Sized> NetworkLink for Box<T> {
    fn connect(&mut self, ssid: &str, password: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        (**self).connect(ssid, password)
    }
    fn is_connected(&mut self) -> bool {
        (**self).is_connected()
    }
}
