use std::sync::atomic::{AtomicBool, Ordering};

use sweep_traits::{Arm, NetworkLink, PrinterStatus, Scale};
use tracing::{error, info, warn};

use crate::controller::{ControllerState, RemovalController};
use crate::error::SweepError;

/// Outcome of a runner session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub ticks: u64,
    /// Ticks that ended with a scale or arm fault.
    pub failed_ticks: u64,
    pub final_state: ControllerState,
    pub collected_prints: u64,
    /// Set when the loop stopped on a configuration fault.
    pub fatal: Option<SweepError>,
}

/// Tick until `shutdown` is set. Operational tick errors are logged and the
/// loop goes on; they are already recorded in the published status. An
/// `InvalidConfiguration` fault cannot clear by itself and stops the loop.
pub fn run<P, A, S, N>(controller: &mut RemovalController<P, A, S, N>, shutdown: &AtomicBool) -> RunReport
where
    P: PrinterStatus,
    A: Arm,
    S: Scale,
    N: NetworkLink,
{
    run_bounded(controller, shutdown, None)
}

/// [`run`], stopping after at most `max_ticks` ticks when given.
pub fn run_bounded<P, A, S, N>(
    controller: &mut RemovalController<P, A, S, N>,
    shutdown: &AtomicBool,
    max_ticks: Option<u64>,
) -> RunReport
where
    P: PrinterStatus,
    A: Arm,
    S: Scale,
    N: NetworkLink,
{
    let mut ticks = 0u64;
    let mut failed_ticks = 0u64;
    let mut fatal = None;
    while !shutdown.load(Ordering::Relaxed) && max_ticks.is_none_or(|max| ticks < max) {
        let result = controller.tick();
        ticks += 1;
        if let Err(e) = result {
            failed_ticks += 1;
            if let Some(se @ SweepError::InvalidConfiguration(_)) = e.downcast_ref::<SweepError>() {
                error!(error = %se, "configuration fault, stopping");
                fatal = Some(se.clone());
                break;
            }
            warn!(error = %e, state = controller.state().name(), "tick failed, continuing");
        }
    }

    let report = RunReport {
        ticks,
        failed_ticks,
        final_state: controller.state(),
        collected_prints: controller.context().collected_prints,
        fatal,
    };
    info!(
        ticks,
        failed_ticks,
        state = report.final_state.name(),
        collected = report.collected_prints,
        "runner stopped"
    );
    report
}
