// Lifecycle event names exposed by model types
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// A named lifecycle moment a model type exposes for subscription.
///
/// The ten builtin moments have their own variants. Anything else is a
/// user extension carried in [`EventName::Custom`]. Parsing always maps a
/// builtin spelling to its variant, and equality and hashing go by
/// spelling, so `Custom("saving")` and `Saving` are the same name.
#[derive(Debug, Clone)]
pub enum EventName {
    Creating,
    Created,
    Updating,
    Updated,
    Deleting,
    Deleted,
    Saving,
    Saved,
    Restoring,
    Restored,
    Custom(String),
}

impl EventName {
    /// Builtin names, in the order they are reported as observable
    pub const BUILTIN: [EventName; 10] = [
        EventName::Creating,
        EventName::Created,
        EventName::Updating,
        EventName::Updated,
        EventName::Deleting,
        EventName::Deleted,
        EventName::Saving,
        EventName::Saved,
        EventName::Restoring,
        EventName::Restored,
    ];

    /// Create a name from any string, mapping builtin spellings to their variant
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        match Self::builtin(&name) {
            Some(builtin) => builtin,
            None => EventName::Custom(name),
        }
    }

    fn builtin(name: &str) -> Option<Self> {
        Self::BUILTIN.into_iter().find(|b| b.as_str() == name)
    }

    pub fn as_str(&self) -> &str {
        match self {
            EventName::Creating => "creating",
            EventName::Created => "created",
            EventName::Updating => "updating",
            EventName::Updated => "updated",
            EventName::Deleting => "deleting",
            EventName::Deleted => "deleted",
            EventName::Saving => "saving",
            EventName::Saved => "saved",
            EventName::Restoring => "restoring",
            EventName::Restored => "restored",
            EventName::Custom(name) => name,
        }
    }

    /// Whether this is one of the ten builtin lifecycle moments
    pub fn is_builtin(&self) -> bool {
        Self::builtin(self.as_str()).is_some()
    }

    /// "Before" moments whose listeners may veto the operation
    pub fn is_haltable(&self) -> bool {
        matches!(
            EventName::new(self.as_str()),
            EventName::Creating
                | EventName::Updating
                | EventName::Deleting
                | EventName::Saving
                | EventName::Restoring
        )
    }
}

impl PartialEq for EventName {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for EventName {}

impl Hash for EventName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventName {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(EventName::new(s))
    }
}

impl From<&str> for EventName {
    fn from(name: &str) -> Self {
        EventName::new(name)
    }
}

impl From<String> for EventName {
    fn from(name: String) -> Self {
        EventName::new(name)
    }
}

impl From<&EventName> for EventName {
    fn from(name: &EventName) -> Self {
        name.clone()
    }
}

impl Serialize for EventName {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        String::deserialize(deserializer).map(EventName::new)
    }
}
