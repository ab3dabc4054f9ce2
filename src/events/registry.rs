// Per-model-type event registry: observable names, custom payloads and firing
use crate::config::RegistryConfig;
use crate::events::dispatcher::{listener, DispatchMode, Dispatcher};
use crate::events::model::Model;
use crate::events::name::EventName;
use crate::events::observer::{Observer, ObserverTable};
use crate::events::payload::{erase_factory, ErasedFactory, Payload, PayloadFactory};
use dashmap::mapref::one::RefMut;
use dashmap::DashMap;
use parking_lot::RwLock;
use serde_json::Value;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

/// Whether a firing result vetoes the operation (a listener returned `false`)
pub fn is_vetoed(result: &Option<Value>) -> bool {
    matches!(result, Some(Value::Bool(false)))
}

/// Lazily created state of one model type
struct ClassEvents {
    /// User extensions on top of [`EventName::BUILTIN`]
    extensions: Vec<EventName>,
    /// Extensions the type starts with, used when flushing
    default_extensions: Vec<EventName>,
    custom: HashMap<EventName, ErasedFactory>,
}

impl ClassEvents {
    fn for_model<M: Model>(config: &RegistryConfig) -> Self {
        let mut extensions = Vec::new();
        push_unique(&mut extensions, M::observables());
        push_unique(
            &mut extensions,
            config.observables_for(M::class_name()).iter().cloned(),
        );

        let custom = M::dispatches_events()
            .into_iter()
            .map(|(event, factory)| (event, erase_factory(factory)))
            .collect();

        Self {
            default_extensions: extensions.clone(),
            extensions,
            custom,
        }
    }

    fn observable_events(&self) -> Vec<EventName> {
        let mut events = EventName::BUILTIN.to_vec();
        push_unique(&mut events, self.extensions.iter().cloned());
        events
    }
}

fn push_unique(target: &mut Vec<EventName>, names: impl IntoIterator<Item = EventName>) {
    for name in names {
        if !target.contains(&name) {
            target.push(name);
        }
    }
}

/// Registry of lifecycle events for every model type sharing one dispatcher.
///
/// One registry per model hierarchy. Events are disabled until a dispatcher
/// is installed; while none is set every firing reports "proceed".
pub struct ModelEventRegistry {
    config: RegistryConfig,
    dispatcher: RwLock<Option<Arc<dyn Dispatcher>>>,
    classes: DashMap<TypeId, ClassEvents>,
}

impl ModelEventRegistry {
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            config,
            dispatcher: RwLock::new(None),
            classes: DashMap::new(),
        }
    }

    /// Create a registry with a dispatcher already installed
    pub fn with_dispatcher(dispatcher: Arc<dyn Dispatcher>) -> Self {
        let registry = Self::new();
        registry.set_event_dispatcher(dispatcher);
        registry
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Typed handle for one model type
    pub fn model<M: Model>(&self) -> ModelEvents<'_, M> {
        ModelEvents {
            registry: self,
            _model: PhantomData,
        }
    }

    // Dispatcher access

    pub fn event_dispatcher(&self) -> Option<Arc<dyn Dispatcher>> {
        self.dispatcher.read().clone()
    }

    pub fn set_event_dispatcher(&self, dispatcher: Arc<dyn Dispatcher>) {
        if !self.config.enabled {
            tracing::warn!("Model events disabled by configuration; dispatcher not installed");
            return;
        }
        *self.dispatcher.write() = Some(dispatcher);
        tracing::debug!("Installed model event dispatcher");
    }

    pub fn unset_event_dispatcher(&self) {
        *self.dispatcher.write() = None;
        tracing::debug!("Removed model event dispatcher");
    }

    /// Run `f` with events disabled, restoring the previous dispatcher after
    pub fn without_events<T>(&self, f: impl FnOnce() -> T) -> T {
        let _restore = DispatcherRestore {
            registry: self,
            previous: self.dispatcher.write().take(),
        };
        f()
    }

    /// Channel carrying the raw model for `event` on type `M`
    pub fn channel_name<M: Model>(&self, event: &EventName) -> String {
        format!(
            "{}.{}: {}",
            self.config.channel_prefix,
            event,
            M::class_name()
        )
    }

    fn class<M: Model>(&self) -> RefMut<'_, TypeId, ClassEvents> {
        self.classes
            .entry(TypeId::of::<M>())
            .or_insert_with(|| ClassEvents::for_model::<M>(&self.config))
    }

    // Observable event names

    pub fn observable_events<M: Model>(&self) -> Vec<EventName> {
        self.class::<M>().observable_events()
    }

    pub fn set_observable_events<M: Model, I, N>(&self, names: I)
    where
        I: IntoIterator<Item = N>,
        N: Into<EventName>,
    {
        let mut class = self.class::<M>();
        class.extensions.clear();
        push_unique(&mut class.extensions, names.into_iter().map(Into::into));
    }

    pub fn add_observable_events<M: Model, I, N>(&self, names: I)
    where
        I: IntoIterator<Item = N>,
        N: Into<EventName>,
    {
        let mut class = self.class::<M>();
        push_unique(&mut class.extensions, names.into_iter().map(Into::into));
    }

    pub fn remove_observable_events<M: Model, I, N>(&self, names: I)
    where
        I: IntoIterator<Item = N>,
        N: Into<EventName>,
    {
        let removed: Vec<EventName> = names.into_iter().map(Into::into).collect();
        self.class::<M>()
            .extensions
            .retain(|name| !removed.contains(name));
    }

    // Custom payloads

    /// Fire a custom payload built by `factory` whenever `event` fires on `M`
    pub fn dispatches_event<M: Model>(
        &self,
        event: impl Into<EventName>,
        factory: PayloadFactory<M>,
    ) {
        let event = event.into();
        tracing::debug!(
            model = M::class_name(),
            event = %event,
            "Mapped custom event payload"
        );
        self.class::<M>().custom.insert(event, erase_factory(factory));
    }

    pub fn has_custom_event<M: Model>(&self, event: &EventName) -> bool {
        self.class::<M>().custom.contains_key(event)
    }

    // Registration

    /// Register every handler of `observer` that matches an observable event
    pub fn observe<M: Model, O: Observer<M>>(&self, observer: O, priority: i32) {
        self.observe_shared::<M, O>(Arc::new(observer), priority);
    }

    pub fn observe_shared<M: Model, O: Observer<M>>(&self, observer: Arc<O>, priority: i32) {
        let table: ObserverTable<M> = observer.handlers();
        let mut registered = 0usize;

        for event in self.observable_events::<M>() {
            if let Some(handler) = table.handler(&event) {
                let handler = Arc::clone(handler);
                self.register_model_event::<M, _>(
                    event,
                    move |model: &M| handler(model),
                    priority,
                );
                registered += 1;
            }
        }

        tracing::debug!(
            model = M::class_name(),
            handlers = table.len(),
            registered,
            "Registered observer"
        );
    }

    pub fn observe_many<M, O, I>(&self, observers: I, priority: i32)
    where
        M: Model,
        O: Observer<M>,
        I: IntoIterator<Item = O>,
    {
        for observer in observers {
            self.observe::<M, O>(observer, priority);
        }
    }

    /// Listen for `event` on the generic channel of `M`; no-op without a dispatcher
    pub fn register_model_event<M, F>(
        &self,
        event: impl Into<EventName>,
        callback: F,
        priority: i32,
    ) where
        M: Model,
        F: Fn(&M) -> Option<Value> + Send + Sync + 'static,
    {
        let Some(dispatcher) = self.event_dispatcher() else {
            return;
        };

        let channel = self.channel_name::<M>(&event.into());
        dispatcher.listen(
            &channel,
            listener(move |payload| payload.model::<M>().and_then(&callback)),
            priority,
        );
    }

    // Firing

    /// Fire `event` for `model`.
    ///
    /// Without a dispatcher this returns `Some(true)`. A custom payload
    /// mapped to the event is published first; its response wins and the
    /// generic channel is skipped. Otherwise the generic channel is
    /// dispatched, stopping at the first response when `halt` is set.
    pub fn fire_model_event<M: Model>(
        &self,
        model: &M,
        event: impl Into<EventName>,
        halt: bool,
    ) -> Option<Value> {
        let Some(dispatcher) = self.event_dispatcher() else {
            return Some(Value::Bool(true));
        };

        let event = event.into();
        let mode = DispatchMode::from_halt(halt);

        if let Some(result) = self.fire_custom_model_event(model, &event, mode) {
            return Some(result);
        }

        let channel = self.channel_name::<M>(&event);
        tracing::trace!(channel = %channel, halt, "Firing model event");
        dispatcher.dispatch(&channel, Payload::Model(model), mode)
    }

    /// Publish the custom payload mapped to `event`, if any
    pub fn fire_custom_model_event<M: Model>(
        &self,
        model: &M,
        event: &EventName,
        mode: DispatchMode,
    ) -> Option<Value> {
        let dispatcher = self.event_dispatcher()?;
        // Clone the factory out so the class entry is not held while listeners run
        let factory = self.class::<M>().custom.get(event).cloned()?;
        let payload = factory(model as &(dyn Any + Send + Sync))?;
        let channel = payload.channel();

        tracing::trace!(channel = %channel, event = %event, "Firing custom model event");
        dispatcher.dispatch(&channel, Payload::Custom(payload.as_ref()), mode)
    }

    /// Forget every generic channel of `M`; custom payload mappings stay
    pub fn flush_event_listeners<M: Model>(&self) {
        let Some(dispatcher) = self.event_dispatcher() else {
            return;
        };

        let events = {
            let class = self.class::<M>();
            let mut events = class.observable_events();
            push_unique(&mut events, class.default_extensions.iter().cloned());
            events
        };

        for event in &events {
            dispatcher.forget(&self.channel_name::<M>(event));
        }

        tracing::debug!(
            model = M::class_name(),
            channels = events.len(),
            "Flushed model event listeners"
        );
    }
}

impl Default for ModelEventRegistry {
    fn default() -> Self {
        Self::new()
    }
}

struct DispatcherRestore<'r> {
    registry: &'r ModelEventRegistry,
    previous: Option<Arc<dyn Dispatcher>>,
}

impl Drop for DispatcherRestore<'_> {
    fn drop(&mut self) {
        *self.registry.dispatcher.write() = self.previous.take();
    }
}

macro_rules! event_shortcuts {
    ($($method:ident => $event:ident),* $(,)?) => {
        $(
            #[doc = concat!("Listen for `", stringify!($method), "` at the given priority")]
            pub fn $method<F>(&self, callback: F, priority: i32) -> &Self
            where
                F: Fn(&M) -> Option<Value> + Send + Sync + 'static,
            {
                self.registry
                    .register_model_event::<M, F>(EventName::$event, callback, priority);
                self
            }
        )*
    };
}

/// Typed view of the registry for model type `M`
pub struct ModelEvents<'r, M> {
    registry: &'r ModelEventRegistry,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model> ModelEvents<'_, M> {
    pub fn observe<O: Observer<M>>(&self, observer: O, priority: i32) -> &Self {
        self.registry.observe::<M, O>(observer, priority);
        self
    }

    pub fn observable_events(&self) -> Vec<EventName> {
        self.registry.observable_events::<M>()
    }

    pub fn set_observable_events<I, N>(&self, names: I) -> &Self
    where
        I: IntoIterator<Item = N>,
        N: Into<EventName>,
    {
        self.registry.set_observable_events::<M, I, N>(names);
        self
    }

    pub fn add_observable_events<I, N>(&self, names: I) -> &Self
    where
        I: IntoIterator<Item = N>,
        N: Into<EventName>,
    {
        self.registry.add_observable_events::<M, I, N>(names);
        self
    }

    pub fn remove_observable_events<I, N>(&self, names: I) -> &Self
    where
        I: IntoIterator<Item = N>,
        N: Into<EventName>,
    {
        self.registry.remove_observable_events::<M, I, N>(names);
        self
    }

    pub fn register<F>(&self, event: impl Into<EventName>, callback: F, priority: i32) -> &Self
    where
        F: Fn(&M) -> Option<Value> + Send + Sync + 'static,
    {
        self.registry
            .register_model_event::<M, F>(event, callback, priority);
        self
    }

    /// Register at the configured default priority
    pub fn on<F>(&self, event: impl Into<EventName>, callback: F) -> &Self
    where
        F: Fn(&M) -> Option<Value> + Send + Sync + 'static,
    {
        self.register(event, callback, self.registry.config.default_priority)
    }

    /// Observe at the configured default priority
    pub fn observe_default<O: Observer<M>>(&self, observer: O) -> &Self {
        self.observe(observer, self.registry.config.default_priority)
    }

    pub fn dispatches(&self, event: impl Into<EventName>, factory: PayloadFactory<M>) -> &Self {
        self.registry.dispatches_event::<M>(event, factory);
        self
    }

    pub fn fire(&self, model: &M, event: impl Into<EventName>, halt: bool) -> Option<Value> {
        self.registry.fire_model_event(model, event, halt)
    }

    pub fn flush(&self) {
        self.registry.flush_event_listeners::<M>();
    }

    pub fn channel(&self, event: impl Into<EventName>) -> String {
        self.registry.channel_name::<M>(&event.into())
    }

    event_shortcuts! {
        saving => Saving,
        saved => Saved,
        updating => Updating,
        updated => Updated,
        creating => Creating,
        created => Created,
        deleting => Deleting,
        deleted => Deleted,
        restoring => Restoring,
        restored => Restored,
    }
}
