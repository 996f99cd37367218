use crate::config::DelayRange;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Randomized, cancellable waits
///
/// Every deliberate pause of the harvest goes through a pacer so that a
/// shutdown request ends the wait immediately.
pub struct Pacer {
    cancel: CancellationToken,
    rng: StdRng,
}

impl Pacer {
    pub fn new(cancel: CancellationToken) -> Self {
        Self::with_rng(cancel, StdRng::from_entropy())
    }

    pub fn with_rng(cancel: CancellationToken, rng: StdRng) -> Self {
        Self { cancel, rng }
    }

    /// A second pacer observing the same shutdown signal
    pub fn fork(&self) -> Self {
        Self::new(self.cancel.clone())
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Waits for a duration drawn from `range`
    ///
    /// Returns `false` when the wait was cut short by shutdown.
    pub async fn pause(&mut self, range: &DelayRange) -> bool {
        let duration = range.sample(&mut self.rng);
        if !duration.is_zero() {
            tracing::debug!("Waiting {:.1}s", duration.as_secs_f64());
        }
        self.sleep(duration).await
    }

    /// Waits for `duration` unless shutdown is requested first
    pub async fn sleep(&self, duration: Duration) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        if duration.is_zero() {
            return true;
        }
        tokio::select! {
            _ = tokio::time::sleep(duration) => true,
            _ = self.cancel.cancelled() => false,
        }
    }

    /// Stands down for a window drawn from `window`
    ///
    /// Logs the minutes remaining every `report_every` until the window ends.
    /// Returns `false` when interrupted by shutdown.
    pub async fn cooldown(&mut self, window: &DelayRange, report_every: Duration) -> bool {
        let total = window.sample(&mut self.rng);
        let deadline = Instant::now() + total;
        tracing::warn!(
            "Too many consecutive timeouts, cooling down for {:.1} minutes",
            total.as_secs_f64() / 60.0
        );

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            tracing::info!(
                "Cooldown: {:.1} minutes remaining",
                remaining.as_secs_f64() / 60.0
            );
            if !self.sleep(remaining.min(report_every)).await {
                tracing::info!("Cooldown interrupted");
                return false;
            }
        }

        tracing::info!("Cooldown finished, resuming");
        true
    }
}
