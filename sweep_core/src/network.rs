use sweep_traits::{Clock, NetworkLink};
use tracing::{debug, info};

use crate::config::JoinCfg;
use crate::error::SweepError;

/// Join the configured access point, polling `is_connected` up to
/// `cfg.attempts` times `cfg.poll` apart. Returns immediately when the link
/// is already up.
pub fn join_network<N, C>(link: &mut N, cfg: &JoinCfg, clock: &C) -> Result<(), SweepError>
where
    N: NetworkLink + ?Sized,
    C: Clock + ?Sized,
{
    if link.is_connected() {
        return Ok(());
    }
    info!(ssid = %cfg.ssid, "joining network");
    link.connect(&cfg.ssid, &cfg.password)
        .map_err(|e| SweepError::Network(e.to_string()))?;

    let mut attempts = cfg.attempts;
    while !link.is_connected() && attempts > 0 {
        clock.sleep(cfg.poll);
        attempts -= 1;
        debug!(remaining = attempts, "waiting for association");
    }
    if link.is_connected() {
        info!(ssid = %cfg.ssid, "network joined");
        Ok(())
    } else {
        Err(SweepError::Network(format!(
            "not associated with {:?} after {} polls",
            cfg.ssid, cfg.attempts
        )))
    }
}
