#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sweep_core::RemovalController;
use sweep_hardware::{SimulatedArm, SimulatedBin, SimulatedScale};
use sweep_traits::clock::test_clock::TestClock;
use sweep_traits::{Arm, NetworkLink, PrinterSnapshot, PrinterStatus};

pub type Script = Arc<Mutex<VecDeque<Result<PrinterSnapshot, String>>>>;

/// Printer that replays queued snapshots; an empty queue is a fetch error.
pub struct ScriptedPrinter(pub Script);

impl PrinterStatus for ScriptedPrinter {
    fn fetch(&mut self) -> Result<PrinterSnapshot, Box<dyn std::error::Error + Send + Sync>> {
        let next = self.0.lock().unwrap().pop_front();
        match next {
            Some(Ok(s)) => Ok(s),
            Some(Err(msg)) => Err(msg.into()),
            None => Err("connection refused".into()),
        }
    }
}

/// Arm shared with the test so sweeps can be inspected after the build.
pub struct SharedArm(pub Arc<Mutex<SimulatedArm>>);

impl Arm for SharedArm {
    fn sweep(&mut self, start_deg: u16, end_deg: u16) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.0.lock().unwrap().sweep(start_deg, end_deg)
    }
}

pub struct Link {
    pub up: Arc<AtomicBool>,
}

impl NetworkLink for Link {
    fn connect(&mut self, _ssid: &str, _password: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }

    fn is_connected(&mut self) -> bool {
        self.up.load(Ordering::Relaxed)
    }
}

pub type Controller = RemovalController<ScriptedPrinter, SharedArm, SimulatedScale, Link>;

pub struct Rig {
    pub controller: Controller,
    pub clock: TestClock,
    pub bin: SimulatedBin,
    pub arm: Arc<Mutex<SimulatedArm>>,
    pub script: Script,
    pub online: Arc<AtomicBool>,
    pub not_ready: Arc<AtomicBool>,
    pub launches: Arc<AtomicUsize>,
}

pub fn snapshot(is_printing: bool, nozzle_target: f64) -> Result<PrinterSnapshot, String> {
    Ok(PrinterSnapshot {
        is_printing,
        nozzle_target,
    })
}

impl Rig {
    /// Controller in Connecting; each lift of the arm drops `print_counts`
    /// into the bin.
    pub fn new(print_counts: i32, online: bool) -> Self {
        let clock = TestClock::new();
        let bin = SimulatedBin::new();
        let arm = Arc::new(Mutex::new(
            SimulatedArm::new(bin.clone()).with_print_counts(print_counts),
        ));
        let scale = SimulatedScale::new(bin.clone(), 8_000);
        let not_ready = scale.not_ready_flag();
        let script: Script = Arc::default();
        let online = Arc::new(AtomicBool::new(online));
        let launches = Arc::new(AtomicUsize::new(0));
        let hook_launches = Arc::clone(&launches);

        let controller = RemovalController::builder()
            .with_printer(ScriptedPrinter(Arc::clone(&script)))
            .with_arm(SharedArm(Arc::clone(&arm)))
            .with_scale(scale)
            .with_network(Link {
                up: Arc::clone(&online),
            })
            .with_clock(Arc::new(clock.clone()))
            .on_online(move || {
                hook_launches.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .try_build()
            .expect("build controller");

        Self {
            controller,
            clock,
            bin,
            arm,
            script,
            online,
            not_ready,
            launches,
        }
    }

    /// Online rig already past the start-up sweep, in Idle.
    pub fn idle(print_counts: i32) -> Self {
        let mut rig = Self::new(print_counts, true);
        rig.controller.tick().expect("connect");
        rig.clock.clear_sleeps();
        rig.arm.lock().unwrap().clear_sweeps();
        rig
    }

    pub fn push(&self, s: Result<PrinterSnapshot, String>) {
        self.script.lock().unwrap().push_back(s);
    }

    pub fn sweeps(&self) -> Vec<(u16, u16)> {
        self.arm.lock().unwrap().sweeps().to_vec()
    }

    pub fn last_sleep(&self) -> Option<Duration> {
        self.clock.sleeps().last().copied()
    }
}
