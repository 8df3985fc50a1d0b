//! Capability sets attached to roles
//!
//! Each role declares the external integrations it may use. The agent
//! executor only offers a capability to the model when the role's set
//! contains it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// External integrations a role may invoke
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Search the web for a query
    WebSearch,

    /// Generate text with the language model
    LanguageModel,
}

impl Capability {
    /// Get all defined capabilities
    pub fn all() -> &'static [Capability] {
        &[Capability::WebSearch, Capability::LanguageModel]
    }

    /// Get the string name of this capability
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::WebSearch => "web_search",
            Capability::LanguageModel => "language_model",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A set of capabilities
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySet {
    capabilities: BTreeSet<Capability>,
}

impl CapabilitySet {
    /// Create a capability set with all capabilities
    pub fn all() -> Self {
        Self::from_capabilities(Capability::all().iter().copied())
    }

    /// Create a capability set from an iterator of capabilities
    pub fn from_capabilities(iter: impl IntoIterator<Item = Capability>) -> Self {
        Self {
            capabilities: iter.into_iter().collect(),
        }
    }

    /// Check if capability is present
    pub fn contains(&self, cap: Capability) -> bool {
        self.capabilities.contains(&cap)
    }

    /// Iterate in a stable order
    pub fn iter(&self) -> impl Iterator<Item = &Capability> {
        self.capabilities.iter()
    }
}

impl std::fmt::Display for CapabilitySet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.iter().map(|c| c.as_str()).collect();
        write!(f, "{{{}}}", names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains() {
        let set = CapabilitySet::from_capabilities([Capability::LanguageModel]);
        assert!(set.contains(Capability::LanguageModel));
        assert!(!set.contains(Capability::WebSearch));
        assert_eq!(set.to_string(), "{language_model}");
    }

    #[test]
    fn test_all() {
        let set = CapabilitySet::all();
        assert_eq!(set.iter().count(), 2);
        assert!(set.contains(Capability::WebSearch));
        assert!(set.contains(Capability::LanguageModel));
    }

    #[test]
    fn test_display() {
        let set = CapabilitySet::all();
        assert_eq!(set.to_string(), "{web_search, language_model}");
        assert_eq!(Capability::WebSearch.to_string(), "web_search");
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&Capability::LanguageModel).unwrap();
        assert_eq!(json, "\"language_model\"");
    }
}
