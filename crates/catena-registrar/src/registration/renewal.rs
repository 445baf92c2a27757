//! Liveness-gated Renewal
//!
//! Each tick is a pure decision on the probe result: renew when healthy,
//! stop when not. Stopping never deletes anything; the lease runs out.

use super::probe::{Health, LivenessProbe};
use super::registrant::{Lease, RegistrationError, RegistrationState, Registrant};
use crate::observability::events;
use crate::store::{with_deadline, Store};
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// What a single renewal tick does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickAction {
    Renew,
    Stop,
}

pub fn decide(health: &Health) -> TickAction {
    match health {
        Health::Healthy => TickAction::Renew,
        Health::Unhealthy(_) => TickAction::Stop,
    }
}

/// Why the renewal loop ended without a store failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenewalExit {
    /// The probe failed on `tick`; no keep-alive was sent for it.
    Unhealthy { tick: u64, reason: String },
    /// Shutdown was requested after `ticks` completed ticks.
    Shutdown { ticks: u64 },
}

impl<S: Store> Registrant<S> {
    /// Renew `lease` every `interval` for as long as `probe` passes.
    ///
    /// The first tick fires one full interval after the call. Returns when
    /// the probe fails, when `shutdown` is cancelled, or with an error when
    /// a keep-alive fails. In every case the registration is left decaying.
    pub async fn run_renewal<P>(
        &mut self,
        lease: &Lease,
        probe: &P,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> Result<RenewalExit, RegistrationError>
    where
        P: LivenessProbe + ?Sized,
    {
        if self.state == RegistrationState::Decaying {
            return Err(RegistrationError::Decaying);
        }
        let first_tick = Instant::now()
            .checked_add(interval)
            .filter(|_| !interval.is_zero())
            .ok_or(RegistrationError::InvalidInterval(interval))?;

        info!(
            lease_id = lease.id(),
            ttl_secs = lease.ttl().as_secs(),
            interval_secs = interval.as_secs_f64(),
            "Starting renewal loop"
        );

        let mut ticker = tokio::time::interval_at(first_tick, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut tick = 0u64;

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    self.state = RegistrationState::Decaying;
                    debug!(lease_id = lease.id(), ticks = tick, "Renewal loop cancelled");
                    events::renewal_stopped(lease.id(), tick, "shutdown");
                    return Ok(RenewalExit::Shutdown { ticks: tick });
                }
                _ = ticker.tick() => {}
            }
            tick += 1;

            let health = probe.check().await;
            match decide(&health) {
                TickAction::Stop => {
                    let reason = match health {
                        Health::Unhealthy(reason) => reason,
                        Health::Healthy => String::new(),
                    };
                    self.state = RegistrationState::Decaying;
                    warn!(
                        lease_id = lease.id(),
                        tick = tick,
                        reason = %reason,
                        "Liveness probe failed, letting lease expire"
                    );
                    events::renewal_stopped(lease.id(), tick, "unhealthy");
                    return Ok(RenewalExit::Unhealthy { tick, reason });
                }
                TickAction::Renew => {
                    self.state = RegistrationState::Renewing;
                    let result = with_deadline(
                        "keep-alive",
                        self.request_timeout,
                        self.store.keep_alive_once(lease.id()),
                    )
                    .await;

                    match result {
                        Ok(ttl) => {
                            self.state = RegistrationState::Registered;
                            events::lease_renewed(lease.id(), ttl, tick);
                        }
                        Err(source) => {
                            self.state = RegistrationState::Decaying;
                            events::renewal_stopped(lease.id(), tick, "keep-alive failed");
                            return Err(RegistrationError::KeepAlive {
                                lease: lease.id(),
                                source,
                            });
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decide() {
        assert_eq!(decide(&Health::Healthy), TickAction::Renew);
        assert_eq!(
            decide(&Health::Unhealthy("socket gone".into())),
            TickAction::Stop
        );
    }
}
