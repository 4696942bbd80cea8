use std::{sync::Arc, time::Duration};

use tokio::time::{interval_at, sleep_until, timeout_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{
    config::PaymentConfig,
    domain::{Charge, ChargeStatus},
    payments::PaymentGateway,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl PollPolicy {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }

    pub fn from_config(config: &PaymentConfig) -> Self {
        Self::new(
            Duration::from_secs(config.poll_interval_secs.max(1)),
            Duration::from_secs(config.poll_timeout_secs),
        )
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(3), Duration::from_secs(600))
    }
}

#[derive(Debug, Clone)]
pub enum PollOutcome {
    Successful(Charge),
    /// `Failed` or `Expired`.
    Failed(ChargeStatus),
    TimedOut,
    Cancelled,
}

/// Polls one charge until it settles or the deadline passes.
///
/// A tick whose request fails is logged and skipped. Requests still in
/// flight at the deadline are abandoned.
pub struct StatusPoller {
    gateway: Arc<dyn PaymentGateway>,
    policy: PollPolicy,
}

impl StatusPoller {
    pub fn new(gateway: Arc<dyn PaymentGateway>, policy: PollPolicy) -> Self {
        Self { gateway, policy }
    }

    pub async fn poll(&self, charge_id: &str, cancel: &CancellationToken) -> PollOutcome {
        let started = Instant::now();
        let deadline = started + self.policy.timeout;
        let mut ticker = interval_at(started + self.policy.interval, self.policy.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut tick: u64 = 0;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return PollOutcome::Cancelled,
                _ = sleep_until(deadline) => {
                    tracing::info!("Stopped polling charge {} after {} ticks: timed out", charge_id, tick);
                    return PollOutcome::TimedOut;
                }
                _ = ticker.tick() => {}
            }
            tick += 1;

            let response = tokio::select! {
                biased;
                _ = cancel.cancelled() => return PollOutcome::Cancelled,
                response = timeout_at(deadline, self.gateway.retrieve_charge(charge_id)) => response,
            };

            match response {
                Err(_) => {
                    tracing::info!("Stopped polling charge {} mid-request: timed out", charge_id);
                    return PollOutcome::TimedOut;
                }
                Ok(Err(e)) => {
                    tracing::warn!("Status check {} for charge {} failed: {}", tick, charge_id, e);
                }
                Ok(Ok(charge)) => match charge.status {
                    ChargeStatus::Successful => {
                        tracing::info!("Charge {} successful after {} ticks", charge_id, tick);
                        return PollOutcome::Successful(charge);
                    }
                    ChargeStatus::Failed | ChargeStatus::Expired => {
                        tracing::info!("Charge {} ended as {}", charge_id, charge.status.as_str());
                        return PollOutcome::Failed(charge.status);
                    }
                    ChargeStatus::Pending | ChargeStatus::Unknown => {
                        tracing::debug!("Charge {} still {} (tick {})", charge_id, charge.status.as_str(), tick);
                    }
                },
            }
        }
    }
}
