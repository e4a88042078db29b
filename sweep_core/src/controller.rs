//! Print-removal state machine.
//!
//! One [`RemovalController::tick`] runs the handler of the current state,
//! publishes a [`StatusView`] and then sleeps the interval of the state the
//! tick started in.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use sweep_traits::{Arm, Clock, NetworkLink, PrinterSnapshot, PrinterStatus, Scale};
use tracing::{debug, error, info, warn};

use crate::builder::ControllerBuilder;
use crate::config::{ArmCfg, Intervals, JoinCfg, RemovalCfg};
use crate::error::{Result, SweepError};
use crate::hw_error::map_hw_error;
use crate::network::join_network;
use crate::scale::TareScale;
use crate::status::{StatusHandle, StatusView};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControllerState {
    Connecting,
    Idle,
    Printing,
    Removing,
}

impl ControllerState {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Connecting => "Connecting",
            Self::Idle => "Idle",
            Self::Printing => "Printing",
            Self::Removing => "Removing",
        }
    }
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The user-visible last error.
pub type Fault = SweepError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerContext {
    pub state: ControllerState,
    pub last_error: Option<Fault>,
    /// Never decreases.
    pub collected_prints: u64,
    /// Tared bin weight after the last confirmed removal.
    pub baseline_weight: i32,
}

impl Default for ControllerContext {
    fn default() -> Self {
        Self {
            state: ControllerState::Connecting,
            last_error: None,
            collected_prints: 0,
            baseline_weight: 0,
        }
    }
}

impl ControllerContext {
    /// Status page text for `last_error`; empty when there is none.
    pub fn error_message(&self) -> String {
        self.last_error
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default()
    }
}

/// Runs once, after the first successful network join.
pub type OnlineHook = Box<dyn FnOnce() -> Result<()> + Send>;

pub struct RemovalController<P, A, S, N> {
    pub(crate) printer: P,
    pub(crate) arm: A,
    pub(crate) scale: TareScale<S>,
    pub(crate) link: N,
    pub(crate) clock: Arc<dyn Clock + Send + Sync>,
    pub(crate) arm_cfg: ArmCfg,
    pub(crate) intervals: Intervals,
    pub(crate) removal: RemovalCfg,
    pub(crate) join: JoinCfg,
    pub(crate) ctx: ControllerContext,
    pub(crate) status: StatusHandle,
    pub(crate) on_online: Option<OnlineHook>,
}

impl<P, A, S, N> RemovalController<P, A, S, N>
where
    P: PrinterStatus,
    A: Arm,
    S: Scale,
    N: NetworkLink,
{
    pub fn builder() -> ControllerBuilder<P, A, S, N> {
        ControllerBuilder::default()
    }

    pub fn state(&self) -> ControllerState {
        self.ctx.state
    }

    pub fn context(&self) -> &ControllerContext {
        &self.ctx
    }

    /// Handle for readers of the published snapshot.
    pub fn status_handle(&self) -> StatusHandle {
        self.status.clone()
    }

    pub fn scale(&self) -> &TareScale<S> {
        &self.scale
    }

    /// Sleep interval that follows a tick started in `state`.
    pub fn interval_for(&self, state: ControllerState) -> Duration {
        match state {
            ControllerState::Connecting => self.intervals.connect_retry,
            ControllerState::Idle => self.intervals.idle,
            ControllerState::Printing => self.intervals.printing,
            ControllerState::Removing => self.intervals.removing,
        }
    }

    /// Run one state handler, publish the snapshot, sleep.
    ///
    /// Printer fetch failures and unconfirmed removals are recorded in the
    /// context and do not fail the tick. Scale and arm faults are recorded
    /// too, leave the state unchanged and are returned.
    pub fn tick(&mut self) -> Result<ControllerState> {
        let state = self.ctx.state;
        let outcome = match state {
            ControllerState::Connecting => self.on_connecting(),
            ControllerState::Idle => self.on_idle(),
            ControllerState::Printing => self.on_printing(),
            ControllerState::Removing => self.on_removing(),
        };

        let pause = match &outcome {
            Ok(pause) => *pause,
            Err(e) => {
                error!(state = state.name(), error = %e, "tick aborted");
                self.ctx.state = state;
                self.ctx.last_error = Some(e.clone());
                self.interval_for(state)
            }
        };
        self.publish();
        if !pause.is_zero() {
            self.clock.sleep(pause);
        }

        match outcome {
            Ok(_) => Ok(self.ctx.state),
            Err(e) => Err(e.into()),
        }
    }

    fn on_connecting(&mut self) -> std::result::Result<Duration, SweepError> {
        if let Err(e) = join_network(&mut self.link, &self.join, &*self.clock) {
            warn!(error = %e, retry_in = ?self.intervals.connect_retry, "network join failed");
            self.ctx.last_error = Some(e);
            return Ok(self.intervals.connect_retry);
        }
        let (up, down) = (self.arm_cfg.up_deg, self.arm_cfg.down_deg);
        self.sweep(up, down)?;
        self.clock.sleep(self.arm_cfg.calibration_pause);
        self.sweep(down, up)?;
        let offset = self.scale.tare()?;
        self.ctx.baseline_weight = 0;
        info!(offset, "bin tared");
        self.clear_recovered_fault();
        self.transition(ControllerState::Idle);

        if let Some(hook) = self.on_online.take()
            && let Err(e) = hook()
        {
            warn!(error = %e, "online hook failed");
        }
        Ok(Duration::ZERO)
    }

    fn on_idle(&mut self) -> std::result::Result<Duration, SweepError> {
        let pause = self.intervals.idle;
        let Some(snapshot) = self.fetch() else {
            return Ok(pause);
        };
        self.hold(self.arm_cfg.up_deg)?;
        if snapshot.is_printing {
            self.transition(ControllerState::Printing);
        }
        Ok(pause)
    }

    fn on_printing(&mut self) -> std::result::Result<Duration, SweepError> {
        let pause = self.intervals.printing;
        let Some(snapshot) = self.fetch() else {
            return Ok(pause);
        };
        self.hold(self.arm_cfg.up_deg)?;
        if self.removal.is_ready_signal(snapshot.nozzle_target) {
            self.sweep(self.arm_cfg.up_deg, self.arm_cfg.down_deg)?;
            self.transition(ControllerState::Removing);
        } else if !snapshot.is_printing {
            self.transition(ControllerState::Idle);
        }
        Ok(pause)
    }

    fn on_removing(&mut self) -> std::result::Result<Duration, SweepError> {
        let pause = self.intervals.removing;
        let Some(snapshot) = self.fetch() else {
            return Ok(pause);
        };
        self.hold(self.arm_cfg.down_deg)?;
        if !self.removal.is_done_signal(snapshot.nozzle_target) {
            return Ok(pause);
        }

        self.sweep(self.arm_cfg.down_deg, self.arm_cfg.up_deg)?;
        self.clock.sleep(self.arm_cfg.settle);
        let weight = self.scale.stable_value()?;
        let gain = i64::from(weight) - i64::from(self.ctx.baseline_weight);
        let threshold = self.removal.min_weight_gain;
        if gain > i64::from(threshold) {
            self.ctx.collected_prints += 1;
            self.ctx.baseline_weight = weight;
            self.ctx.last_error = None;
            info!(gain, collected = self.ctx.collected_prints, "print collected");
        } else {
            warn!(gain, threshold, "bin weight did not rise, print not collected");
            self.ctx.last_error = Some(SweepError::RemovalNotConfirmed { gain, threshold });
        }
        self.transition(ControllerState::Idle);
        Ok(pause)
    }

    /// Drop the last error once the system is healthy again. An unconfirmed
    /// removal stays until a print is actually collected.
    fn clear_recovered_fault(&mut self) {
        if !matches!(
            self.ctx.last_error,
            None | Some(SweepError::RemovalNotConfirmed { .. })
        ) {
            self.ctx.last_error = None;
        }
    }

    fn fetch(&mut self) -> Option<PrinterSnapshot> {
        match self.printer.fetch() {
            Ok(snapshot) => {
                self.clear_recovered_fault();
                debug!(
                    printing = snapshot.is_printing,
                    nozzle_target = snapshot.nozzle_target,
                    "printer snapshot"
                );
                Some(snapshot)
            }
            Err(e) => {
                warn!(state = self.ctx.state.name(), error = %e, "printer fetch failed");
                self.ctx.last_error = Some(SweepError::PrinterFetch(e.to_string()));
                None
            }
        }
    }

    fn sweep(&mut self, start: u16, end: u16) -> std::result::Result<(), SweepError> {
        self.arm.sweep(start, end).map_err(|e| map_hw_error(&*e))
    }

    fn hold(&mut self, angle: u16) -> std::result::Result<(), SweepError> {
        self.sweep(angle, angle)
    }

    fn transition(&mut self, next: ControllerState) {
        let from = self.ctx.state;
        if from == next {
            return;
        }
        self.ctx.state = next;
        info!(from = from.name(), to = next.name(), "state transition");
        if next == ControllerState::Removing {
            info!("removing print");
        }
    }

    fn publish(&self) {
        self.status.publish(StatusView::from(&self.ctx));
    }
}
