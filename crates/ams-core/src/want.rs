//! Launch-intent carrier.
//!
//! A [`Want`] names the target ability and carries an opaque byte payload
//! handed to the ability at launch. The caller's `Want` is never mutated by
//! the manager; the request encoder copies it and the service side owns the
//! copy for the duration of one start operation.

use serde::{Deserialize, Serialize};

/// Identity of one ability: owning bundle plus ability name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementName {
    /// Owning bundle identifier.
    pub bundle_name: String,
    /// Ability name within the bundle (may be empty for the default
    /// ability).
    #[serde(default)]
    pub ability_name: String,
}

impl ElementName {
    /// Creates an element name.
    #[must_use]
    pub fn new(bundle_name: impl Into<String>, ability_name: impl Into<String>) -> Self {
        Self {
            bundle_name: bundle_name.into(),
            ability_name: ability_name.into(),
        }
    }
}

impl std::fmt::Display for ElementName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.ability_name.is_empty() {
            write!(f, "{}", self.bundle_name)
        } else {
            write!(f, "{}/{}", self.bundle_name, self.ability_name)
        }
    }
}

/// Launch parameter carrier: target identity plus opaque data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Want {
    /// Target ability, absent in malformed requests.
    pub element: Option<ElementName>,
    /// Opaque payload passed to the ability at launch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<u8>>,
}

impl Want {
    /// Creates a want targeting the given element.
    #[must_use]
    pub const fn new(element: ElementName) -> Self {
        Self {
            element: Some(element),
            data: None,
        }
    }

    /// Attaches an opaque payload.
    #[must_use]
    pub fn with_data(mut self, data: Vec<u8>) -> Self {
        self.data = Some(data);
        self
    }

    /// Bundle name of the target, if present and non-empty.
    #[must_use]
    pub fn bundle_name(&self) -> Option<&str> {
        self.element
            .as_ref()
            .map(|e| e.bundle_name.as_str())
            .filter(|n| !n.is_empty())
    }
}
