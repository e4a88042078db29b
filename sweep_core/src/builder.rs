//! Builder for `RemovalController`.
//!
//! The printer source, arm, scale and network link are mandatory;
//! `try_build()` reports the first missing one as a `BuildError`. Every
//! tuning section defaults to the deployment values.

use std::sync::Arc;

use sweep_traits::clock::{Clock, MonotonicClock};
use sweep_traits::{Arm, NetworkLink, PrinterStatus, Scale};

use crate::config::{ArmCfg, Intervals, JoinCfg, RemovalCfg, StabilizerCfg};
use crate::controller::{ControllerContext, OnlineHook, RemovalController};
use crate::error::{BuildError, Result};
use crate::scale::TareScale;
use crate::status::{StatusHandle, StatusView};

pub struct ControllerBuilder<P, A, S, N> {
    printer: Option<P>,
    arm: Option<A>,
    scale: Option<S>,
    link: Option<N>,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
    arm_cfg: ArmCfg,
    intervals: Intervals,
    removal: RemovalCfg,
    stabilizer: StabilizerCfg,
    join: JoinCfg,
    status: Option<StatusHandle>,
    on_online: Option<OnlineHook>,
}

impl<P, A, S, N> Default for ControllerBuilder<P, A, S, N> {
    fn default() -> Self {
        Self {
            printer: None,
            arm: None,
            scale: None,
            link: None,
            clock: None,
            arm_cfg: ArmCfg::default(),
            intervals: Intervals::default(),
            removal: RemovalCfg::default(),
            stabilizer: StabilizerCfg::default(),
            join: JoinCfg::default(),
            status: None,
            on_online: None,
        }
    }
}

fn validate(arm: &ArmCfg, removal: &RemovalCfg, stabilizer: &StabilizerCfg) -> Result<()> {
    if arm.up_deg == arm.down_deg {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "arm up and down angles must differ",
        )));
    }
    if arm.up_deg > 180 || arm.down_deg > 180 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "arm angles must be within 0..=180",
        )));
    }
    if stabilizer.samples == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "stabilizer needs at least one sample",
        )));
    }
    if !(stabilizer.deviation_pct.is_finite() && stabilizer.deviation_pct > 0.0) {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "stabilizer deviation must be > 0",
        )));
    }
    if !(removal.ready_sentinel.is_finite() && removal.done_sentinel.is_finite()) {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "removal sentinels must be finite",
        )));
    }
    if removal.sentinel_tolerance.is_nan() || removal.sentinel_tolerance <= 0.0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "sentinel tolerance must be > 0",
        )));
    }
    Ok(())
}

impl<P, A, S, N> ControllerBuilder<P, A, S, N>
where
    P: PrinterStatus,
    A: Arm,
    S: Scale,
    N: NetworkLink,
{
    pub fn with_printer(mut self, printer: P) -> Self {
        self.printer = Some(printer);
        self
    }

    pub fn with_arm(mut self, arm: A) -> Self {
        self.arm = Some(arm);
        self
    }

    pub fn with_scale(mut self, scale: S) -> Self {
        self.scale = Some(scale);
        self
    }

    pub fn with_network(mut self, link: N) -> Self {
        self.link = Some(link);
        self
    }

    /// Inject a clock (tests use `TestClock`). Default: `MonotonicClock`.
    pub fn with_clock(mut self, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_arm_cfg(mut self, arm: ArmCfg) -> Self {
        self.arm_cfg = arm;
        self
    }

    pub fn with_intervals(mut self, intervals: Intervals) -> Self {
        self.intervals = intervals;
        self
    }

    pub fn with_removal(mut self, removal: RemovalCfg) -> Self {
        self.removal = removal;
        self
    }

    pub fn with_stabilizer(mut self, stabilizer: StabilizerCfg) -> Self {
        self.stabilizer = stabilizer;
        self
    }

    pub fn with_join(mut self, join: JoinCfg) -> Self {
        self.join = join;
        self
    }

    /// Apply every tuning section of a loaded config file.
    pub fn with_config(self, cfg: &sweep_config::Config) -> Self {
        self.with_arm_cfg((&cfg.arm).into())
            .with_intervals(cfg.into())
            .with_removal((&cfg.removal).into())
            .with_stabilizer((&cfg.scale).into())
            .with_join((&cfg.network).into())
    }

    /// Publish snapshots into an existing handle instead of a fresh one.
    pub fn with_status(mut self, status: StatusHandle) -> Self {
        self.status = Some(status);
        self
    }

    /// Runs once after the first successful network join.
    pub fn on_online<F>(mut self, hook: F) -> Self
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        self.on_online = Some(Box::new(hook));
        self
    }

    pub fn try_build(self) -> Result<RemovalController<P, A, S, N>> {
        let printer = self
            .printer
            .ok_or_else(|| eyre::Report::new(BuildError::MissingPrinter))?;
        let arm = self
            .arm
            .ok_or_else(|| eyre::Report::new(BuildError::MissingArm))?;
        let scale = self
            .scale
            .ok_or_else(|| eyre::Report::new(BuildError::MissingScale))?;
        let link = self
            .link
            .ok_or_else(|| eyre::Report::new(BuildError::MissingNetwork))?;
        validate(&self.arm_cfg, &self.removal, &self.stabilizer)?;

        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(MonotonicClock::new()));
        let status = self.status.unwrap_or_default();
        let ctx = ControllerContext::default();
        status.publish(StatusView::from(&ctx));

        Ok(RemovalController {
            printer,
            arm,
            scale: TareScale::new(scale, self.stabilizer, Arc::clone(&clock)),
            link,
            clock,
            arm_cfg: self.arm_cfg,
            intervals: self.intervals,
            removal: self.removal,
            join: self.join,
            ctx,
            status,
            on_online: self.on_online,
        })
    }
}
