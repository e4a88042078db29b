//! In-process stand-ins for the scale and the arm.
//!
//! A [`SimulatedBin`] is the shared collection bin: the simulated arm drops
//! a print into it whenever it lifts, and the simulated scale reports its
//! contents.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::time::Duration;

use sweep_traits::{Arm, Scale};
use tracing::{debug, trace};

use crate::error::HwError;

/// Counts added per collected print when the caller does not choose.
pub const DEFAULT_PRINT_COUNTS: i32 = 150;

#[derive(Debug, Clone, Default)]
pub struct SimulatedBin {
    counts: Arc<AtomicI32>,
}

impl SimulatedBin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counts(&self) -> i32 {
        self.counts.load(Ordering::Relaxed)
    }

    pub fn set_counts(&self, counts: i32) {
        self.counts.store(counts, Ordering::Relaxed);
    }

    pub fn add(&self, counts: i32) {
        self.counts.fetch_add(counts, Ordering::Relaxed);
    }
}

pub struct SimulatedScale {
    bin: SimulatedBin,
    zero: i32,
    not_ready: Arc<AtomicBool>,
}

impl SimulatedScale {
    /// `zero` is the raw count of the empty bin.
    pub fn new(bin: SimulatedBin, zero: i32) -> Self {
        Self {
            bin,
            zero,
            not_ready: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Make every read fail the way an unpowered HX711 does.
    pub fn with_not_ready(self) -> Self {
        self.not_ready.store(true, Ordering::Relaxed);
        self
    }

    /// Shared switch for toggling readiness from a test.
    pub fn not_ready_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.not_ready)
    }
}

impl Scale for SimulatedScale {
    fn read(&mut self, _timeout: Duration) -> Result<i32, Box<dyn std::error::Error + Send + Sync>> {
        if self.not_ready.load(Ordering::Relaxed) {
            return Err(Box::new(HwError::DeviceNotReady));
        }
        let raw = self.zero.saturating_add(self.bin.counts());
        trace!(raw, "simulated scale read");
        Ok(raw)
    }
}

pub struct SimulatedArm {
    bin: SimulatedBin,
    print_counts: i32,
    position: Option<u16>,
    sweeps: Vec<(u16, u16)>,
}

impl SimulatedArm {
    pub fn new(bin: SimulatedBin) -> Self {
        Self {
            bin,
            print_counts: DEFAULT_PRINT_COUNTS,
            position: None,
            sweeps: Vec::new(),
        }
    }

    /// Counts each lift adds to the bin; 0 simulates a print that stays stuck.
    pub fn with_print_counts(mut self, counts: i32) -> Self {
        self.print_counts = counts;
        self
    }

    pub fn position(&self) -> Option<u16> {
        self.position
    }

    pub fn sweeps(&self) -> &[(u16, u16)] {
        &self.sweeps
    }

    pub fn clear_sweeps(&mut self) {
        self.sweeps.clear();
    }
}

impl Arm for SimulatedArm {
    fn sweep(&mut self, start_deg: u16, end_deg: u16) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        for angle in [start_deg, end_deg] {
            if angle > crate::servo::MAX_ANGLE {
                return Err(Box::new(HwError::InvalidAngle(angle)));
            }
        }
        debug!(start_deg, end_deg, "simulated arm sweep");
        if start_deg < end_deg {
            self.bin.add(self.print_counts);
        }
        self.sweeps.push((start_deg, end_deg));
        self.position = Some(end_deg);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifting_the_arm_fills_the_bin() {
        let bin = SimulatedBin::new();
        let mut arm = SimulatedArm::new(bin.clone()).with_print_counts(120);
        let mut scale = SimulatedScale::new(bin.clone(), 1_000);

        arm.sweep(140, 0).unwrap();
        assert_eq!(scale.read(Duration::ZERO).unwrap(), 1_000);
        arm.sweep(0, 140).unwrap();
        assert_eq!(scale.read(Duration::ZERO).unwrap(), 1_120);
        assert_eq!(arm.sweeps(), &[(140, 0), (0, 140)]);
        assert_eq!(arm.position(), Some(140));
    }

    #[test]
    fn not_ready_scale_reports_device_not_ready() {
        let mut scale = SimulatedScale::new(SimulatedBin::new(), 0).with_not_ready();
        let err = scale.read(Duration::from_millis(5)).unwrap_err();
        assert!(matches!(err.downcast_ref::<HwError>(), Some(HwError::DeviceNotReady)));

        scale.not_ready_flag().store(false, Ordering::Relaxed);
        assert_eq!(scale.read(Duration::ZERO).unwrap(), 0);
    }
}
