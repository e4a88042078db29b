use std::time::Duration;

use sweep_traits::Clock;

use crate::error::{HwError, Result};

/// Wait until the provided `is_high` probe reports the line low, or `timeout`
/// elapses on `clock`. Sleeps `poll_interval` between probes so the wait does
/// not spin the CPU; probe errors end the wait immediately.
pub fn wait_until_low_with_timeout<C: Clock + ?Sized>(
    mut is_high: impl FnMut() -> Result<bool>,
    timeout: Duration,
    poll_interval: Duration,
    clock: &C,
) -> Result<()> {
    let start = clock.now();
    while is_high()? {
        if clock.elapsed_since(start) >= timeout {
            return Err(HwError::DeviceNotReady);
        }
        clock.sleep(poll_interval);
    }
    Ok(())
}
