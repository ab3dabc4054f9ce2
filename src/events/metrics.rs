// Dispatch metrics for the in-process event dispatcher
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Counters collected by [`EventDispatcher`](crate::events::EventDispatcher)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DispatchMetrics {
    pub total_dispatches: u64,
    pub dispatches_by_channel: HashMap<String, u64>,
    pub listeners_invoked: u64,
    pub halted_dispatches: u64,
    pub total_listener_time: Duration,
}

impl DispatchMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one `until`/`fire` call on a channel
    pub fn record_dispatch(&mut self, channel: &str) {
        self.total_dispatches += 1;
        *self
            .dispatches_by_channel
            .entry(channel.to_string())
            .or_insert(0) += 1;
    }

    /// Record one listener invocation and how long it took
    pub fn record_listener(&mut self, elapsed: Duration) {
        self.listeners_invoked += 1;
        self.total_listener_time += elapsed;
    }

    /// Record a halting dispatch that stopped on a listener response
    pub fn record_halt(&mut self) {
        self.halted_dispatches += 1;
    }

    pub fn total_dispatches(&self) -> u64 {
        self.total_dispatches
    }

    pub fn dispatches_on(&self, channel: &str) -> u64 {
        self.dispatches_by_channel.get(channel).copied().unwrap_or(0)
    }

    pub fn listeners_invoked(&self) -> u64 {
        self.listeners_invoked
    }

    pub fn halted_dispatches(&self) -> u64 {
        self.halted_dispatches
    }

    /// Average time spent per listener invocation
    pub fn average_listener_time(&self) -> Option<Duration> {
        if self.listeners_invoked == 0 {
            return None;
        }
        let average = self.total_listener_time.as_nanos() / self.listeners_invoked as u128;
        Some(Duration::from_nanos(average as u64))
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Get metrics summary as formatted string
    pub fn summary(&self) -> String {
        format!(
            "Dispatch Metrics:\n\
             - Total dispatches: {}\n\
             - Channels: {}\n\
             - Listeners invoked: {}\n\
             - Halted dispatches: {}\n\
             - Average listener time: {:?}",
            self.total_dispatches,
            self.dispatches_by_channel.len(),
            self.listeners_invoked,
            self.halted_dispatches,
            self.average_listener_time(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = DispatchMetrics::new();

        assert_eq!(metrics.total_dispatches(), 0);
        assert_eq!(metrics.dispatches_on("eloquent.saving: User"), 0);
        assert_eq!(metrics.listeners_invoked(), 0);
        assert_eq!(metrics.average_listener_time(), None);
    }

    #[test]
    fn test_dispatch_recording() {
        let mut metrics = DispatchMetrics::new();

        metrics.record_dispatch("eloquent.saving: User");
        metrics.record_dispatch("eloquent.saving: User");
        metrics.record_dispatch("eloquent.saved: User");
        metrics.record_halt();

        assert_eq!(metrics.total_dispatches(), 3);
        assert_eq!(metrics.dispatches_on("eloquent.saving: User"), 2);
        assert_eq!(metrics.dispatches_on("eloquent.saved: User"), 1);
        assert_eq!(metrics.halted_dispatches(), 1);
    }

    #[test]
    fn test_listener_timing() {
        let mut metrics = DispatchMetrics::new();

        metrics.record_listener(Duration::from_millis(10));
        metrics.record_listener(Duration::from_millis(30));

        assert_eq!(metrics.listeners_invoked(), 2);
        assert_eq!(
            metrics.average_listener_time(),
            Some(Duration::from_millis(20))
        );
    }

    #[test]
    fn test_metrics_reset() {
        let mut metrics = DispatchMetrics::new();
        metrics.record_dispatch("a");
        metrics.record_listener(Duration::from_millis(1));

        metrics.reset();

        assert_eq!(metrics.total_dispatches(), 0);
        assert_eq!(metrics.listeners_invoked(), 0);
        assert!(metrics.dispatches_by_channel.is_empty());
    }

    #[test]
    fn test_metrics_summary() {
        let mut metrics = DispatchMetrics::new();
        metrics.record_dispatch("eloquent.created: Post");
        metrics.record_listener(Duration::from_millis(5));

        let summary = metrics.summary();

        assert!(summary.contains("Total dispatches: 1"));
        assert!(summary.contains("Listeners invoked: 1"));
        assert!(summary.contains("Average listener time"));
    }
}
