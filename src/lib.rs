// Lifecycle event hooks for model types
// Observers subscribe to named moments (creating, saved, deleting, ...) per
// model type; models fire them through a shared dispatcher and listeners
// may veto the operation.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

// Re-export main types for easier access
pub use config::RegistryConfig;
pub use error::{ConfigError, EventsError, Result};
pub use events::{
    factory, is_vetoed, listener, CustomEvent, DispatchMetrics, DispatchMode, Dispatcher,
    EventDispatcher, EventName, Handler, Lifecycle, LifecycleOutcome, Listener, Model,
    ModelEventRegistry, ModelEvents, NullDispatcher, Observer, ObserverTable, Payload,
    PayloadFactory,
};
pub use logging::{LogConfig, LogFormat};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
