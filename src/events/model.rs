// Per-type hooks a model exposes to the event registry
use crate::events::name::EventName;
use crate::events::payload::PayloadFactory;
use std::any::{type_name, Any};

/// A model type whose lifecycle events can be observed.
///
/// All methods have defaults; a plain `impl Model for User {}` gives the
/// ten builtin events on channels named after the Rust type path.
pub trait Model: Any + Send + Sync + Sized {
    /// Fully qualified class name used in channel names
    fn class_name() -> &'static str {
        type_name::<Self>()
    }

    /// Extra observable event names the type starts with
    fn observables() -> Vec<EventName> {
        Vec::new()
    }

    /// Events that fire a custom payload instead of the raw model
    fn dispatches_events() -> Vec<(EventName, PayloadFactory<Self>)> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::payload::{factory, CustomEvent};

    struct Plain;
    impl Model for Plain {}

    #[derive(Debug)]
    struct Shipped;
    impl CustomEvent for Shipped {}

    struct Order;
    impl Model for Order {
        fn class_name() -> &'static str {
            "App\\Models\\Order"
        }

        fn observables() -> Vec<EventName> {
            vec!["shipped".into()]
        }

        fn dispatches_events() -> Vec<(EventName, PayloadFactory<Self>)> {
            vec![(EventName::new("shipped"), factory(|_: &Order| Shipped))]
        }
    }

    #[test]
    fn test_defaults() {
        assert!(Plain::class_name().ends_with("Plain"));
        assert!(Plain::observables().is_empty());
        assert!(Plain::dispatches_events().is_empty());
    }

    #[test]
    fn test_overrides() {
        assert_eq!(Order::class_name(), "App\\Models\\Order");
        assert_eq!(Order::observables(), vec![EventName::new("shipped")]);
        assert_eq!(Order::dispatches_events().len(), 1);
    }
}
