//! Identity and description capabilities shared by ports, adaptors and factories

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A described identifier, as handed out by adaptation factories
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifier {
    /// Stable identifier string (e.g. "ElementMapper300")
    pub id: String,
    /// Human-readable description
    pub description: String,
}

impl Identifier {
    /// Create an identifier with an empty description
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: String::new(),
        }
    }

    /// Create an identifier backed by a random UUID
    pub fn random() -> Self {
        Self::new(Uuid::new_v4().to_string())
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// Anything with a stable id plus mutable caption and description
pub trait Describable {
    /// Stable identifier, fixed at construction
    fn id(&self) -> &str;
    fn caption(&self) -> String;
    fn set_caption(&self, caption: &str);
    fn description(&self) -> String;
    fn set_description(&self, description: &str);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_display_uses_id() {
        let ident = Identifier::new("ElementOperation300").with_description("Polygon area");
        assert_eq!(ident.to_string(), "ElementOperation300");
        assert_eq!(ident.description, "Polygon area");
    }

    #[test]
    fn test_random_identifiers_differ() {
        assert_ne!(Identifier::random().id, Identifier::random().id);
    }
}
