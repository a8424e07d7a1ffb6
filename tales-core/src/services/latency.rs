//! Simulated latency - async shim in front of the synchronous core
//!
//! The app UI awaited a fake network round-trip before each mutation. The
//! delay is configurable and never changes what the wrapped call does.

use std::time::Duration;

use tracing::trace;

#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedLatency {
    delay: Duration,
}

impl SimulatedLatency {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Sleep for the configured delay, then run `op`
    pub async fn run<T>(&self, op: impl FnOnce() -> T) -> T {
        if !self.delay.is_zero() {
            trace!(delay_ms = self.delay.as_millis() as u64, "simulated latency");
            tokio::time::sleep(self.delay).await;
        }
        op()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_waits_before_running() {
        let latency = SimulatedLatency::new(Duration::from_millis(500));
        let start = Instant::now();
        let value = latency.run(|| 7).await;
        assert_eq!(value, 7);
        assert!(start.elapsed() >= Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_delay_runs_immediately() {
        let latency = SimulatedLatency::default();
        let start = Instant::now();
        latency.run(|| ()).await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
