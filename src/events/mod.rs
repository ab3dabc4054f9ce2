// Model lifecycle events: names, dispatcher contract, per-type registry
// and the save/delete/restore flows built on top of them

pub mod dispatcher;
pub mod lifecycle;
pub mod metrics;
pub mod model;
pub mod name;
pub mod observer;
pub mod payload;
pub mod registry;

// Re-export main types for easier access
pub use dispatcher::{
    listener, DispatchMode, Dispatcher, EventDispatcher, Listener, NullDispatcher,
};
pub use lifecycle::{Lifecycle, LifecycleOutcome};
pub use metrics::DispatchMetrics;
pub use model::Model;
pub use name::EventName;
pub use observer::{Handler, Observer, ObserverTable};
pub use payload::{factory, AsAny, CustomEvent, Payload, PayloadFactory};
pub use registry::{is_vetoed, ModelEventRegistry, ModelEvents};
