// Named-channel dispatcher contract and the in-process implementation
use crate::events::metrics::DispatchMetrics;
use crate::events::payload::Payload;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::cmp::Reverse;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// A listener callback. `None` means "no opinion"; any `Some` value is a
/// response, and `Some(Value::Bool(false))` vetoes the operation.
pub type Listener = Arc<dyn Fn(&Payload<'_>) -> Option<Value> + Send + Sync>;

/// Wrap a closure as a [`Listener`]
pub fn listener<F>(callback: F) -> Listener
where
    F: Fn(&Payload<'_>) -> Option<Value> + Send + Sync + 'static,
{
    Arc::new(callback)
}

/// How listeners on a channel are run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// Stop at the first listener that returns a response
    Until,
    /// Run every listener regardless of responses
    Fire,
}

impl DispatchMode {
    pub fn from_halt(halt: bool) -> Self {
        if halt {
            DispatchMode::Until
        } else {
            DispatchMode::Fire
        }
    }
}

/// Priority-ordered publish/subscribe over named channels.
///
/// Higher priorities run first; equal priorities run in registration order.
pub trait Dispatcher: Send + Sync {
    /// Register a listener on a channel
    fn listen(&self, channel: &str, listener: Listener, priority: i32);

    /// Run listeners in order and return the first response
    fn until(&self, channel: &str, payload: Payload<'_>) -> Option<Value>;

    /// Run all listeners; returns the first response produced, if any
    fn fire(&self, channel: &str, payload: Payload<'_>) -> Option<Value>;

    /// Remove every listener on a channel
    fn forget(&self, channel: &str);

    fn has_listeners(&self, channel: &str) -> bool;

    fn dispatch(&self, channel: &str, payload: Payload<'_>, mode: DispatchMode) -> Option<Value> {
        match mode {
            DispatchMode::Until => self.until(channel, payload),
            DispatchMode::Fire => self.fire(channel, payload),
        }
    }
}

struct Registered {
    listener: Listener,
    priority: i32,
}

/// In-process dispatcher holding listeners per channel
pub struct EventDispatcher {
    channels: RwLock<HashMap<String, Vec<Registered>>>,
    metrics: Mutex<DispatchMetrics>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            metrics: Mutex::new(DispatchMetrics::new()),
        }
    }

    /// Number of listeners registered on a channel
    pub fn listener_count(&self, channel: &str) -> usize {
        self.channels.read().get(channel).map_or(0, Vec::len)
    }

    /// Channels that currently have at least one listener, sorted
    pub fn channels(&self) -> Vec<String> {
        let mut channels: Vec<String> = self
            .channels
            .read()
            .iter()
            .filter(|(_, listeners)| !listeners.is_empty())
            .map(|(channel, _)| channel.clone())
            .collect();
        channels.sort();
        channels
    }

    /// Get current metrics
    pub fn metrics(&self) -> DispatchMetrics {
        self.metrics.lock().clone()
    }

    /// Drop every listener on every channel
    pub fn clear(&self) {
        self.channels.write().clear();
    }

    // Listeners are snapshotted so a callback may register or forget
    // listeners without deadlocking.
    fn snapshot(&self, channel: &str) -> Vec<Listener> {
        self.channels
            .read()
            .get(channel)
            .map(|listeners| listeners.iter().map(|r| Arc::clone(&r.listener)).collect())
            .unwrap_or_default()
    }

    fn run(&self, channel: &str, payload: Payload<'_>, mode: DispatchMode) -> Option<Value> {
        let listeners = self.snapshot(channel);
        self.metrics.lock().record_dispatch(channel);
        tracing::trace!(
            channel = %channel,
            listeners = listeners.len(),
            mode = ?mode,
            "Dispatching model event"
        );

        let mut first_response = None;
        for listener in listeners {
            let started = Instant::now();
            let response = listener(&payload);
            self.metrics.lock().record_listener(started.elapsed());

            if let Some(value) = response {
                if mode == DispatchMode::Until {
                    self.metrics.lock().record_halt();
                    tracing::debug!(
                        channel = %channel,
                        response = %value,
                        "Dispatch halted by listener"
                    );
                    return Some(value);
                }
                first_response.get_or_insert(value);
            }
        }

        first_response
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("channels", &self.channels())
            .finish()
    }
}

impl Dispatcher for EventDispatcher {
    fn listen(&self, channel: &str, listener: Listener, priority: i32) {
        let mut channels = self.channels.write();
        let listeners = channels.entry(channel.to_string()).or_default();
        listeners.push(Registered { listener, priority });
        // Stable sort keeps registration order within a priority
        listeners.sort_by_key(|r| Reverse(r.priority));
        tracing::debug!(channel = %channel, priority, "Registered listener");
    }

    fn until(&self, channel: &str, payload: Payload<'_>) -> Option<Value> {
        self.run(channel, payload, DispatchMode::Until)
    }

    fn fire(&self, channel: &str, payload: Payload<'_>) -> Option<Value> {
        self.run(channel, payload, DispatchMode::Fire)
    }

    fn forget(&self, channel: &str) {
        if let Some(removed) = self.channels.write().remove(channel) {
            tracing::debug!(channel = %channel, listeners = removed.len(), "Forgot channel");
        }
    }

    fn has_listeners(&self, channel: &str) -> bool {
        self.listener_count(channel) > 0
    }
}

/// Dispatcher that accepts registrations and never calls anyone
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDispatcher;

impl Dispatcher for NullDispatcher {
    fn listen(&self, _channel: &str, _listener: Listener, _priority: i32) {}

    fn until(&self, _channel: &str, _payload: Payload<'_>) -> Option<Value> {
        None
    }

    fn fire(&self, _channel: &str, _payload: Payload<'_>) -> Option<Value> {
        None
    }

    fn forget(&self, _channel: &str) {}

    fn has_listeners(&self, _channel: &str) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn recording(
        log: &Arc<Mutex<Vec<&'static str>>>,
        tag: &'static str,
        response: Option<Value>,
    ) -> Listener {
        let log = Arc::clone(log);
        listener(move |_| {
            log.lock().push(tag);
            response.clone()
        })
    }

    #[test]
    fn test_dispatcher_creation() {
        let dispatcher = EventDispatcher::new();

        assert!(dispatcher.channels().is_empty());
        assert!(!dispatcher.has_listeners("eloquent.saving: User"));
        assert_eq!(dispatcher.metrics().total_dispatches(), 0);
    }

    #[test]
    fn test_priority_order_and_registration_order() {
        let dispatcher = EventDispatcher::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        dispatcher.listen("chan", recording(&log, "low", None), -5);
        dispatcher.listen("chan", recording(&log, "first-normal", None), 0);
        dispatcher.listen("chan", recording(&log, "high", None), 10);
        dispatcher.listen("chan", recording(&log, "second-normal", None), 0);

        let result = dispatcher.fire("chan", Payload::Model(&()));

        assert_eq!(result, None);
        assert_eq!(
            *log.lock(),
            vec!["high", "first-normal", "second-normal", "low"]
        );
    }

    #[test]
    fn test_until_stops_at_first_response() {
        let dispatcher = EventDispatcher::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        dispatcher.listen("chan", recording(&log, "silent", None), 0);
        dispatcher.listen("chan", recording(&log, "veto", Some(json!(false))), 0);
        dispatcher.listen("chan", recording(&log, "never", Some(json!("late"))), 0);

        let result = dispatcher.until("chan", Payload::Model(&()));

        assert_eq!(result, Some(json!(false)));
        assert_eq!(*log.lock(), vec!["silent", "veto"]);
        assert_eq!(dispatcher.metrics().halted_dispatches(), 1);
    }

    #[test]
    fn test_fire_runs_all_listeners() {
        let dispatcher = EventDispatcher::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        dispatcher.listen("chan", recording(&log, "a", Some(json!(1))), 0);
        dispatcher.listen("chan", recording(&log, "b", Some(json!(2))), 0);

        let result = dispatcher.dispatch("chan", Payload::Model(&()), DispatchMode::Fire);

        assert_eq!(result, Some(json!(1)));
        assert_eq!(*log.lock(), vec!["a", "b"]);
        assert_eq!(dispatcher.metrics().listeners_invoked(), 2);
        assert_eq!(dispatcher.metrics().halted_dispatches(), 0);
    }

    #[test]
    fn test_forget_removes_channel() {
        let dispatcher = EventDispatcher::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        dispatcher.listen("keep", recording(&log, "keep", None), 0);
        dispatcher.listen("drop", recording(&log, "drop", None), 0);
        dispatcher.forget("drop");
        dispatcher.forget("never-registered");

        assert_eq!(dispatcher.channels(), vec!["keep".to_string()]);
        dispatcher.fire("drop", Payload::Model(&()));
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_listener_may_register_during_dispatch() {
        let dispatcher = Arc::new(EventDispatcher::new());
        let inner = Arc::clone(&dispatcher);

        dispatcher.listen(
            "chan",
            listener(move |_| {
                inner.listen("other", listener(|_| None), 0);
                None
            }),
            0,
        );

        dispatcher.fire("chan", Payload::Model(&()));
        assert!(dispatcher.has_listeners("other"));
    }

    #[test]
    fn test_null_dispatcher() {
        let dispatcher = NullDispatcher;
        dispatcher.listen("chan", listener(|_| Some(json!(false))), 0);

        assert!(!dispatcher.has_listeners("chan"));
        assert_eq!(dispatcher.until("chan", Payload::Model(&())), None);
    }

    #[test]
    fn test_dispatch_mode_from_halt() {
        assert_eq!(DispatchMode::from_halt(true), DispatchMode::Until);
        assert_eq!(DispatchMode::from_halt(false), DispatchMode::Fire);
    }
}
