//! Table-driven backoff for reconnection

use std::time::Duration;

use hw_core::config::BackoffConfig;

/// Widening reconnect delays, stepped on each consecutive failure.
///
/// The step saturates at the last (largest) table entry and resets only on
/// a successful connect, so an unreachable host converges to one attempt
/// per `delays.last()` while a transient blip recovers at `delays[0]`.
pub struct BackoffSchedule {
    /// Ordered delay table
    delays: Vec<Duration>,
    /// Index of the next delay to hand out
    step: usize,
}

impl BackoffSchedule {
    /// Create a schedule from an explicit delay table.
    ///
    /// An empty table falls back to the default configuration.
    pub fn new(delays: Vec<Duration>) -> Self {
        let delays = if delays.is_empty() {
            BackoffConfig::default().delays
        } else {
            delays
        };
        Self { delays, step: 0 }
    }

    /// Create a schedule from configuration
    pub fn from_config(config: &BackoffConfig) -> Self {
        Self::new(config.delays.clone())
    }

    /// Get the next delay and advance the step (saturating at the table end)
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.delays[self.step.min(self.delays.len() - 1)];
        self.step = (self.step + 1).min(self.delays.len() - 1);
        delay
    }

    /// Reset the schedule after a successful connect
    pub fn reset(&mut self) {
        self.step = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule() -> BackoffSchedule {
        BackoffSchedule::from_config(&BackoffConfig::default())
    }

    #[test]
    fn test_delays_follow_table() {
        let mut backoff = schedule();

        let observed: Vec<u64> = (0..8).map(|_| backoff.next_delay().as_secs()).collect();
        assert_eq!(observed, vec![5, 10, 30, 60, 600, 3600, 3600, 3600]);
    }

    #[test]
    fn test_reset_returns_to_first_entry() {
        let mut backoff = schedule();

        backoff.next_delay();
        backoff.next_delay();
        backoff.next_delay();
        backoff.reset();

        assert_eq!(backoff.next_delay(), Duration::from_secs(5));
        assert_eq!(backoff.next_delay(), Duration::from_secs(10));
    }

    #[test]
    fn test_empty_table_uses_defaults() {
        let mut backoff = BackoffSchedule::new(Vec::new());
        assert_eq!(backoff.next_delay(), Duration::from_secs(5));
    }

    #[test]
    fn test_single_entry_table_repeats() {
        let mut backoff = BackoffSchedule::new(vec![Duration::from_secs(7)]);
        assert_eq!(backoff.next_delay(), Duration::from_secs(7));
        assert_eq!(backoff.next_delay(), Duration::from_secs(7));
    }
}
