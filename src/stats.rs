//! Response time statistics

use std::time::Duration;

/// Running totals over successful exchanges
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResponseStats {
    message_count: u32,
    total: Duration,
}

impl ResponseStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed exchange
    pub fn record(&mut self, elapsed: Duration) {
        self.message_count += 1;
        self.total += elapsed;
    }

    pub fn message_count(&self) -> u32 {
        self.message_count
    }

    pub fn total(&self) -> Duration {
        self.total
    }

    /// Mean response time, zero before the first exchange
    pub fn average(&self) -> Duration {
        if self.message_count == 0 {
            Duration::ZERO
        } else {
            self.total / self.message_count
        }
    }

    /// One-line summary, times in seconds with two decimals
    ///
    /// # Examples
    ///
    /// ```
    /// use quillchat::stats::ResponseStats;
    /// use std::time::Duration;
    ///
    /// let mut stats = ResponseStats::new();
    /// stats.record(Duration::from_millis(1500));
    /// stats.record(Duration::from_millis(500));
    /// assert_eq!(stats.summary(), "messages: 2, average: 1.00s, total: 2.00s");
    /// ```
    pub fn summary(&self) -> String {
        format!(
            "messages: {}, average: {:.2}s, total: {:.2}s",
            self.message_count,
            self.average().as_secs_f64(),
            self.total.as_secs_f64()
        )
    }
}
