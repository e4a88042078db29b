mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::{Link, Rig, ScriptedPrinter, SharedArm, snapshot};
use sweep_core::runner::{run, run_bounded};
use sweep_core::{ControllerState, RemovalController, SweepError};
use sweep_hardware::{SimulatedArm, SimulatedBin};
use sweep_traits::clock::test_clock::TestClock;

#[test]
fn shutdown_before_start_runs_nothing() {
    let mut rig = Rig::new(150, true);
    let report = run(&mut rig.controller, &AtomicBool::new(true));
    assert_eq!(report.ticks, 0);
    assert_eq!(report.final_state, ControllerState::Connecting);
    assert_eq!(report.fatal, None);
}

#[test]
fn bounded_run_stops_after_max_ticks() {
    let mut rig = Rig::new(150, false);
    let report = run_bounded(&mut rig.controller, &AtomicBool::new(false), Some(3));
    assert_eq!(report.ticks, 3);
    assert_eq!(report.failed_ticks, 0);
    assert_eq!(report.final_state, ControllerState::Connecting);
}

#[test]
fn tick_faults_do_not_stop_the_loop() {
    let mut rig = Rig::idle(150);
    rig.push(snapshot(true, 215.0));
    rig.push(snapshot(true, 28.0));
    rig.push(snapshot(false, 29.0));
    rig.push(snapshot(false, 29.0));
    rig.push(snapshot(false, 0.0));

    // Scale drops out for the first weighing only.
    let flag = rig.not_ready.clone();
    flag.store(true, Ordering::Relaxed);
    let mut controller = rig.controller;
    let shutdown = AtomicBool::new(false);
    let first = run_bounded(&mut controller, &shutdown, Some(3));
    assert_eq!(first.failed_ticks, 1);
    assert_eq!(first.final_state, ControllerState::Removing);

    flag.store(false, Ordering::Relaxed);
    let second = run_bounded(&mut controller, &shutdown, Some(2));
    assert_eq!(second.failed_ticks, 0);
    assert_eq!(second.final_state, ControllerState::Idle);
    assert_eq!(second.collected_prints, 1);
}

/// Scale wired to an unsupported channel code.
struct MisconfiguredScale;

impl sweep_traits::Scale for MisconfiguredScale {
    fn read(&mut self, _timeout: Duration) -> Result<i32, Box<dyn std::error::Error + Send + Sync>> {
        Err(Box::new(sweep_hardware::HwError::InvalidConfiguration(7)))
    }
}

#[test]
fn configuration_fault_stops_the_loop() {
    let arm = SharedArm(Arc::new(Mutex::new(SimulatedArm::new(SimulatedBin::new()))));
    let mut controller = RemovalController::builder()
        .with_printer(ScriptedPrinter(Arc::default()))
        .with_arm(arm)
        .with_scale(MisconfiguredScale)
        .with_network(Link {
            up: Arc::new(AtomicBool::new(true)),
        })
        .with_clock(Arc::new(TestClock::new()))
        .try_build()
        .unwrap();

    let report = run_bounded(&mut controller, &AtomicBool::new(false), Some(10));
    assert_eq!(report.ticks, 1);
    assert_eq!(report.failed_ticks, 1);
    assert_eq!(report.final_state, ControllerState::Connecting);
    assert!(matches!(report.fatal, Some(SweepError::InvalidConfiguration(_))));
}
