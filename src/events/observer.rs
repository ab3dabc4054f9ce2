// Observers: handler tables keyed by lifecycle event name
use crate::events::model::Model;
use crate::events::name::EventName;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Typed handler for one event of model `M`
pub type Handler<M> = Arc<dyn Fn(&M) -> Option<Value> + Send + Sync>;

/// The handlers an observer supports, looked up by event name.
///
/// Built once when the observer is registered; event names with no entry
/// get no listener.
pub struct ObserverTable<M> {
    handlers: HashMap<EventName, Handler<M>>,
}

impl<M: Model> ObserverTable<M> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Add (or replace) the handler for `event`
    pub fn on<F>(mut self, event: impl Into<EventName>, handler: F) -> Self
    where
        F: Fn(&M) -> Option<Value> + Send + Sync + 'static,
    {
        self.handlers.insert(event.into(), Arc::new(handler));
        self
    }

    pub fn handler(&self, event: &EventName) -> Option<&Handler<M>> {
        self.handlers.get(event)
    }

    pub fn handles(&self, event: &EventName) -> bool {
        self.handlers.contains_key(event)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<M: Model> Default for ObserverTable<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> Clone for ObserverTable<M> {
    fn clone(&self) -> Self {
        Self {
            handlers: self.handlers.clone(),
        }
    }
}

impl<M> fmt::Debug for ObserverTable<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut events: Vec<&str> = self.handlers.keys().map(EventName::as_str).collect();
        events.sort_unstable();
        f.debug_struct("ObserverTable")
            .field("events", &events)
            .finish()
    }
}

/// Something that reacts to a subset of a model's lifecycle events.
///
/// Implementors return the table of handlers they support; the handlers
/// may capture the `Arc` to reach the observer's own state.
pub trait Observer<M: Model>: Send + Sync + 'static {
    fn handlers(self: Arc<Self>) -> ObserverTable<M>;
}

impl<M: Model> Observer<M> for ObserverTable<M> {
    fn handlers(self: Arc<Self>) -> ObserverTable<M> {
        Arc::try_unwrap(self).unwrap_or_else(|shared| (*shared).clone())
    }
}
