//! Logger metrics for observability
//!
//! Counters describing what a logger did with the records it was given:
//! how many were dispatched, how many the enabled mask filtered out, and
//! what reached the sinks.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for logger observability
///
/// # Example
///
/// ```
/// use bitmask_logger::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
///
/// metrics.record_dispatched();
/// metrics.record_filtered();
///
/// assert_eq!(metrics.records_dispatched(), 1);
/// assert_eq!(metrics.records_filtered(), 1);
/// ```
#[derive(Debug, Default)]
pub struct LoggerMetrics {
    /// Records that passed the enabled mask
    records_dispatched: AtomicU64,

    /// Records dropped because their level was disabled
    records_filtered: AtomicU64,

    /// Sink calls issued (single records and batches)
    payloads_written: AtomicU64,

    /// Sink calls that carried a batch
    batches_written: AtomicU64,

    /// Sink calls that failed
    write_failures: AtomicU64,
}

impl LoggerMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            records_dispatched: AtomicU64::new(0),
            records_filtered: AtomicU64::new(0),
            payloads_written: AtomicU64::new(0),
            batches_written: AtomicU64::new(0),
            write_failures: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn records_dispatched(&self) -> u64 {
        self.records_dispatched.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn records_filtered(&self) -> u64 {
        self.records_filtered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn payloads_written(&self) -> u64 {
        self.payloads_written.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn batches_written(&self) -> u64 {
        self.batches_written.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn write_failures(&self) -> u64 {
        self.write_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn record_dispatched(&self) -> u64 {
        self.records_dispatched.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_filtered(&self) -> u64 {
        self.records_filtered.fetch_add(1, Ordering::Relaxed)
    }

    /// Record one sink call
    #[inline]
    pub fn record_payload(&self, batch: bool) -> u64 {
        if batch {
            self.batches_written.fetch_add(1, Ordering::Relaxed);
        }
        self.payloads_written.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_failure(&self) -> u64 {
        self.write_failures.fetch_add(1, Ordering::Relaxed)
    }

    /// Share of records dropped by the enabled mask, as a percentage (0.0 - 100.0)
    ///
    /// Returns 0.0 if no records have been seen.
    pub fn filter_rate(&self) -> f64 {
        let filtered = self.records_filtered();
        let total = filtered + self.records_dispatched();

        if total == 0 {
            return 0.0;
        }

        (filtered as f64 / total as f64) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = LoggerMetrics::new();
        assert_eq!(metrics.records_dispatched(), 0);
        assert_eq!(metrics.payloads_written(), 0);
        assert_eq!(metrics.write_failures(), 0);
    }

    #[test]
    fn test_record_payload() {
        let metrics = LoggerMetrics::new();
        metrics.record_payload(false);
        metrics.record_payload(true);

        assert_eq!(metrics.payloads_written(), 2);
        assert_eq!(metrics.batches_written(), 1);
    }

    #[test]
    fn test_filter_rate() {
        let metrics = LoggerMetrics::new();
        assert_eq!(metrics.filter_rate(), 0.0);

        for _ in 0..90 {
            metrics.record_dispatched();
        }
        for _ in 0..10 {
            metrics.record_filtered();
        }

        let rate = metrics.filter_rate();
        assert!((9.9..=10.1).contains(&rate), "Filter rate was {}", rate);
    }
}
