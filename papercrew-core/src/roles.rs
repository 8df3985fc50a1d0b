//! Role catalog
//!
//! Three fixed personas, one per pipeline stage. Roles are created once at
//! process start and shared read-only between requests.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{CompanionError, Result};
use crate::tools::{Capability, CapabilitySet};

/// Identifies one of the catalog roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleKind {
    Explainer,
    LiteratureFinder,
    GapAnalyzer,
}

impl RoleKind {
    /// All kinds in pipeline order
    pub fn all() -> &'static [RoleKind] {
        &[
            RoleKind::Explainer,
            RoleKind::LiteratureFinder,
            RoleKind::GapAnalyzer,
        ]
    }
}

/// Static persona configuration assigned to one pipeline stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleSpec {
    kind: RoleKind,
    name: String,
    goal: String,
    backstory: String,
    capabilities: CapabilitySet,
}

impl RoleSpec {
    /// Create a role.
    ///
    /// # Errors
    ///
    /// Every role must be able to reach the language model; a capability set
    /// without [`Capability::LanguageModel`] is rejected, as are blank names
    /// and goals.
    pub fn new(
        kind: RoleKind,
        name: impl Into<String>,
        goal: impl Into<String>,
        backstory: impl Into<String>,
        capabilities: CapabilitySet,
    ) -> Result<Self> {
        let name = name.into();
        let goal = goal.into();

        if name.trim().is_empty() {
            return Err(CompanionError::Configuration(
                "role name must not be empty".to_string(),
            ));
        }
        if goal.trim().is_empty() {
            return Err(CompanionError::Configuration(format!(
                "role '{}' must have a goal",
                name
            )));
        }
        if !capabilities.contains(Capability::LanguageModel) {
            return Err(CompanionError::Configuration(format!(
                "role '{}' requires the {} capability",
                name,
                Capability::LanguageModel
            )));
        }

        Ok(Self {
            kind,
            name,
            goal,
            backstory: backstory.into(),
            capabilities,
        })
    }

    pub fn kind(&self) -> RoleKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn goal(&self) -> &str {
        &self.goal
    }

    pub fn backstory(&self) -> &str {
        &self.backstory
    }

    pub fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    /// Whether this role may use `cap`
    pub fn can(&self, cap: Capability) -> bool {
        self.capabilities.contains(cap)
    }
}

/// The immutable set of roles used by the pipeline
#[derive(Debug, Clone)]
pub struct RoleCatalog {
    explainer: Arc<RoleSpec>,
    literature_finder: Arc<RoleSpec>,
    gap_analyzer: Arc<RoleSpec>,
}

impl RoleCatalog {
    /// The standard catalog: Topic Explainer, Literature Finder, Gap Analyzer.
    pub fn standard() -> Self {
        Self {
            explainer: Arc::new(RoleSpec {
                kind: RoleKind::Explainer,
                name: "Topic Explainer".to_string(),
                goal: "Break down complex research topics into clear, understandable explanations"
                    .to_string(),
                backstory: "You are an expert academic communicator who specializes in making \
                            complex research topics accessible. You have a gift for identifying \
                            key concepts and explaining them in clear, structured ways."
                    .to_string(),
                capabilities: CapabilitySet::all(),
            }),
            literature_finder: Arc::new(RoleSpec {
                kind: RoleKind::LiteratureFinder,
                name: "Literature Finder".to_string(),
                goal: "Find and summarize relevant research papers and literature".to_string(),
                backstory: "You are a skilled research librarian and academic researcher with \
                            extensive experience in finding, evaluating, and summarizing academic \
                            literature across various fields."
                    .to_string(),
                capabilities: CapabilitySet::all(),
            }),
            gap_analyzer: Arc::new(RoleSpec {
                kind: RoleKind::GapAnalyzer,
                name: "Gap Analyzer".to_string(),
                goal: "Identify research gaps and suggest future research directions".to_string(),
                backstory: "You are a strategic research analyst who excels at identifying gaps \
                            in current research and suggesting innovative directions for future \
                            studies. You have a keen eye for spotting opportunities in academic \
                            literature."
                    .to_string(),
                capabilities: CapabilitySet::all(),
            }),
        }
    }

    /// Get the role for a kind
    pub fn get(&self, kind: RoleKind) -> Arc<RoleSpec> {
        match kind {
            RoleKind::Explainer => Arc::clone(&self.explainer),
            RoleKind::LiteratureFinder => Arc::clone(&self.literature_finder),
            RoleKind::GapAnalyzer => Arc::clone(&self.gap_analyzer),
        }
    }

    /// Iterate roles in pipeline order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<RoleSpec>> {
        [&self.explainer, &self.literature_finder, &self.gap_analyzer].into_iter()
    }

    /// Number of roles (always three)
    pub fn len(&self) -> usize {
        RoleKind::all().len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

impl Default for RoleCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
