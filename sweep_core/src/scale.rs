//! Tare-aware wrapper around a raw `Scale`.

use std::sync::Arc;

use sweep_traits::{Clock, Scale};
use tracing::{debug, trace};

use crate::config::StabilizerCfg;
use crate::error::SweepError;
use crate::hw_error::map_hw_error;
use crate::stabilizer::stabilize;

pub struct TareScale<S> {
    inner: S,
    offset: i32,
    cfg: StabilizerCfg,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl<S: Scale> TareScale<S> {
    pub fn new(inner: S, cfg: StabilizerCfg, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self {
            inner,
            offset: 0,
            cfg,
            clock,
        }
    }

    pub fn offset(&self) -> i32 {
        self.offset
    }

    pub fn set_offset(&mut self, offset: i32) {
        self.offset = offset;
    }

    /// One untared reading.
    pub fn read(&mut self) -> Result<i32, SweepError> {
        self.inner
            .read(self.cfg.read_timeout)
            .map_err(|e| map_hw_error(&*e))
    }

    /// Adopt the current reading as zero.
    pub fn tare(&mut self) -> Result<i32, SweepError> {
        let zero = self.read()?;
        self.offset = zero;
        debug!(offset = zero, "scale tared");
        Ok(zero)
    }

    pub fn raw_value(&mut self) -> Result<i32, SweepError> {
        Ok(self.read()?.saturating_sub(self.offset))
    }

    /// Burst of tared readings reduced by [`stabilize`].
    pub fn stable_value(&mut self) -> Result<i32, SweepError> {
        let mut values = Vec::with_capacity(self.cfg.samples);
        for _ in 0..self.cfg.samples {
            values.push(self.raw_value()?);
            self.clock.sleep(self.cfg.sample_delay);
        }
        let stable = stabilize(&values, self.cfg.deviation_pct);
        trace!(?values, stable, "stable weight");
        Ok(stable)
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}
