//! # Papercrew - a research paper companion
//!
//! Papercrew analyzes a research paper from its title (plus optional
//! abstract and research area) with three cooperating agents run in order:
//!
//! 1. **Topic Explainer** explains the topic and its key concepts
//! 2. **Literature Finder** reviews related work
//! 3. **Gap Analyzer** uses both earlier results to identify research gaps
//!    and suggest future directions
//!
//! The gap analysis is the final report.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use papercrew_core::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> papercrew_core::error::Result<()> {
//!     let config = CompanionConfig::load(None)?;
//!     let companion = ResearchPaperCompanion::from_config(&config);
//!
//!     let report = handle_submit(&companion, "Attention Is All You Need", "", "NLP").await;
//!     println!("{report}");
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **llm**: language-model capability (OpenRouter chat completions)
//! - **tools**: web search capability (Serper) and role capability sets
//! - **parsing**: ReAct parsing of agent responses
//! - **roles**: the fixed role catalog
//! - **workflow**: tasks, the agent loop and the sequential crew
//! - **companion**: the analysis pipeline and form adapter

pub mod companion;
pub mod config;
pub mod error;
pub mod llm;
pub mod parsing;
pub mod roles;
pub mod tools;
pub mod workflow;

/// Current library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Re-export commonly used types
pub mod prelude {
    pub use crate::companion::{
        AnalysisError, AnalysisRequest, AnalysisResult, EMPTY_TITLE_MESSAGE, EXAMPLES,
        ResearchPaperCompanion, handle_submit,
    };
    pub use crate::config::{
        AgentSettings, CompanionConfig, LlmSettings, SearchSettings, ServerSettings,
    };
    pub use crate::error::{CompanionError, Result};
    pub use crate::llm::{
        LLMProvider, LLMRequest, LLMResponse, Message, MessageRole,
        OpenRouterProvider, TokenUsage,
    };
    pub use crate::parsing::{OutputParser, ParseError, ParseResult, ReActParser};
    pub use crate::roles::{RoleCatalog, RoleKind, RoleSpec};
    pub use crate::tools::{
        Capability, CapabilitySet, SearchResult, SearchTool, SerperSearchTool,
    };
    pub use crate::workflow::{
        AgentConfig, AgentExecutor, Crew, CrewBuilder, ExecutionTrace, TaskExecutor, TaskKind,
        TaskOutput, TaskSpec, TaskTrace, WorkflowError, WorkflowResult,
    };
}
