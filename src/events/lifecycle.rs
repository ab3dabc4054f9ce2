// Save/delete/restore flows that honour listener vetoes
use crate::error::Result;
use crate::events::model::Model;
use crate::events::name::EventName;
use crate::events::registry::{is_vetoed, ModelEventRegistry};
use crate::logging::utils::lifecycle_span;

/// How a lifecycle operation ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleOutcome {
    /// Persistence ran and the "after" events fired
    Completed,
    /// A listener returned `false` for a "before" event; nothing was persisted
    Vetoed { event: EventName },
}

impl LifecycleOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, LifecycleOutcome::Completed)
    }
}

/// Drives the lifecycle events around a caller-supplied persistence step.
///
/// ```text
/// save:    saving ─► creating|updating ─► persist ─► created|updated ─► saved
/// delete:  deleting ─► persist ─► deleted
/// restore: restoring ─► persist ─► restored
/// ```
/// "Before" events halt on the first response and abort on a veto. "After"
/// events run every listener and their responses are ignored.
pub struct Lifecycle<'r> {
    registry: &'r ModelEventRegistry,
}

impl<'r> Lifecycle<'r> {
    pub fn new(registry: &'r ModelEventRegistry) -> Self {
        Self { registry }
    }

    /// Save `model`. `exists` selects the update path over the insert path.
    pub fn save<M, F>(&self, model: &mut M, exists: bool, persist: F) -> Result<LifecycleOutcome>
    where
        M: Model,
        F: FnOnce(&mut M) -> Result<()>,
    {
        let _span = lifecycle_span(M::class_name(), "save").entered();

        if let Some(outcome) = self.before(model, EventName::Saving) {
            return Ok(outcome);
        }

        let (before, after) = if exists {
            (EventName::Updating, EventName::Updated)
        } else {
            (EventName::Creating, EventName::Created)
        };

        if let Some(outcome) = self.before(model, before) {
            return Ok(outcome);
        }

        persist(model)?;

        self.after(model, after);
        self.after(model, EventName::Saved);
        Ok(LifecycleOutcome::Completed)
    }

    pub fn delete<M, F>(&self, model: &mut M, persist: F) -> Result<LifecycleOutcome>
    where
        M: Model,
        F: FnOnce(&mut M) -> Result<()>,
    {
        let _span = lifecycle_span(M::class_name(), "delete").entered();
        self.around(model, EventName::Deleting, EventName::Deleted, persist)
    }

    pub fn restore<M, F>(&self, model: &mut M, persist: F) -> Result<LifecycleOutcome>
    where
        M: Model,
        F: FnOnce(&mut M) -> Result<()>,
    {
        let _span = lifecycle_span(M::class_name(), "restore").entered();
        self.around(model, EventName::Restoring, EventName::Restored, persist)
    }

    fn around<M, F>(
        &self,
        model: &mut M,
        before: EventName,
        after: EventName,
        persist: F,
    ) -> Result<LifecycleOutcome>
    where
        M: Model,
        F: FnOnce(&mut M) -> Result<()>,
    {
        if let Some(outcome) = self.before(model, before) {
            return Ok(outcome);
        }

        persist(model)?;

        self.after(model, after);
        Ok(LifecycleOutcome::Completed)
    }

    fn before<M: Model>(&self, model: &M, event: EventName) -> Option<LifecycleOutcome> {
        let result = self.registry.fire_model_event(model, event.clone(), true);
        if is_vetoed(&result) {
            tracing::debug!(model = M::class_name(), event = %event, "Lifecycle vetoed");
            return Some(LifecycleOutcome::Vetoed { event });
        }
        None
    }

    fn after<M: Model>(&self, model: &M, event: EventName) {
        self.registry.fire_model_event(model, event, false);
    }
}
