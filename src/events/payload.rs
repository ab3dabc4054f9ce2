// Payloads handed to listeners when a model event fires
use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

/// Upcast helper so trait objects can be downcast to their concrete type
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A richer event object that wraps the firing model instance.
///
/// Custom events are published on their own channel instead of the
/// generic `<prefix>.<event>: <Class>` channel. By default the channel is
/// the event's type name.
pub trait CustomEvent: AsAny + Send + Sync + fmt::Debug {
    fn channel(&self) -> String {
        type_name::<Self>().to_string()
    }
}

/// What a listener receives
#[derive(Clone, Copy)]
pub enum Payload<'a> {
    /// The model instance itself (generic named channel)
    Model(&'a (dyn Any + Send + Sync)),
    /// A custom event built from the instance
    Custom(&'a dyn CustomEvent),
}

impl<'a> Payload<'a> {
    /// The model instance, when the payload is the raw model of type `M`
    pub fn model<M: Any>(&self) -> Option<&'a M> {
        match *self {
            Payload::Model(model) => model.downcast_ref::<M>(),
            Payload::Custom(_) => None,
        }
    }

    /// The custom event, when the payload is a custom event of type `E`
    pub fn custom<E: Any>(&self) -> Option<&'a E> {
        match *self {
            Payload::Custom(event) => event.as_any().downcast_ref::<E>(),
            Payload::Model(_) => None,
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Payload::Custom(_))
    }
}

impl fmt::Debug for Payload<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Model(_) => f.write_str("Payload::Model(..)"),
            Payload::Custom(event) => f.debug_tuple("Payload::Custom").field(event).finish(),
        }
    }
}

/// Builds a custom event from a model instance of type `M`
pub type PayloadFactory<M> = Arc<dyn Fn(&M) -> Box<dyn CustomEvent> + Send + Sync>;

/// Type-erased factory as stored in the registry
pub(crate) type ErasedFactory =
    Arc<dyn Fn(&(dyn Any + Send + Sync)) -> Option<Box<dyn CustomEvent>> + Send + Sync>;

/// Wrap a typed factory so it can live in per-type storage
pub(crate) fn erase_factory<M: Any + Send + Sync>(factory: PayloadFactory<M>) -> ErasedFactory {
    Arc::new(move |model: &(dyn Any + Send + Sync)| {
        model.downcast_ref::<M>().map(|m| factory(m))
    })
}

/// Convenience constructor for a [`PayloadFactory`]
pub fn factory<M, E, F>(build: F) -> PayloadFactory<M>
where
    M: 'static,
    E: CustomEvent + 'static,
    F: Fn(&M) -> E + Send + Sync + 'static,
{
    Arc::new(move |model: &M| Box::new(build(model)) as Box<dyn CustomEvent>)
}
