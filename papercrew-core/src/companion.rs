//! Research paper companion
//!
//! [`ResearchPaperCompanion`] runs the three-stage analysis (topic
//! explanation, literature review, gap analysis) for a paper title and
//! returns the gap analysis as the final report. [`handle_submit`] is the
//! thin adapter used by the web form and CLI: it validates the title and
//! turns every failure into a displayable string.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::config::CompanionConfig;
use crate::llm::OpenRouterProvider;
use crate::roles::{RoleCatalog, RoleKind};
use crate::tools::SerperSearchTool;
use crate::workflow::{
    AgentConfig, AgentExecutor, Crew, EXPLAIN_EXPECTED_OUTPUT, ExecutionTrace, GAP_EXPECTED_OUTPUT,
    LITERATURE_EXPECTED_OUTPUT, TaskExecutor, TaskKind, TaskOutput, TaskSpec, WorkflowError,
    explain_description, gap_description, literature_description,
};

/// Shown when the form is submitted without a title
pub const EMPTY_TITLE_MESSAGE: &str = "Please provide a paper title.";

/// Prefix of every failure message shown to the user
pub const ERROR_PREFIX: &str = "Error analyzing paper: ";

/// Example inputs offered next to the form: (title, abstract, research area)
pub const EXAMPLES: [(&str, &str, &str); 3] = [
    (
        "Attention Is All You Need",
        "",
        "Natural Language Processing",
    ),
    (
        "BERT: Pre-training of Deep Bidirectional Transformers for Language Understanding",
        "",
        "Machine Learning",
    ),
    (
        "Deep Residual Learning for Image Recognition",
        "",
        "Computer Vision",
    ),
];

/// Errors returned by [`ResearchPaperCompanion::run_analysis`]
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The request was rejected before any task ran
    #[error("{0}")]
    InvalidRequest(String),

    /// The language model or web search failed during a task
    #[error("{0}")]
    Capability(String),
}

impl From<WorkflowError> for AnalysisError {
    fn from(err: WorkflowError) -> Self {
        AnalysisError::Capability(err.to_string())
    }
}

/// One analysis request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// Paper title (required)
    pub title: String,
    /// Paper abstract, may be empty
    #[serde(default, rename = "abstract")]
    pub abstract_text: String,
    /// Research area, may be empty
    #[serde(default)]
    pub research_area: String,
}

impl AnalysisRequest {
    pub fn new(
        title: impl Into<String>,
        abstract_text: impl Into<String>,
        research_area: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            abstract_text: abstract_text.into(),
            research_area: research_area.into(),
        }
    }
}

/// Outcome of a successful analysis
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    /// Final report (the gap analysis)
    pub text: String,
    /// Every task's output in execution order
    pub task_outputs: Vec<TaskOutput>,
    /// Per-task execution trace
    pub trace: ExecutionTrace,
}

/// The analysis pipeline
pub struct ResearchPaperCompanion {
    roles: RoleCatalog,
    executor: Arc<dyn TaskExecutor>,
}

impl std::fmt::Debug for ResearchPaperCompanion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResearchPaperCompanion")
            .field("roles", &self.roles)
            .finish_non_exhaustive()
    }
}

impl ResearchPaperCompanion {
    /// Create a companion that runs tasks with `executor`
    pub fn new(roles: RoleCatalog, executor: Arc<dyn TaskExecutor>) -> Self {
        Self { roles, executor }
    }

    /// Build the standard companion: OpenRouter for the model and Serper for
    /// search (when enabled).
    pub fn from_config(config: &CompanionConfig) -> Self {
        let provider = Arc::new(OpenRouterProvider::from_settings(&config.llm));
        let mut executor =
            AgentExecutor::new(provider).with_config(AgentConfig::from(&config.agent));

        if config.search.enabled {
            executor = executor.with_search(Arc::new(SerperSearchTool::from_settings(&config.search)));
        } else {
            tracing::info!("Web search disabled, agents will answer from the model alone");
        }

        Self::new(RoleCatalog::standard(), Arc::new(executor))
    }

    pub fn roles(&self) -> &RoleCatalog {
        &self.roles
    }

    /// The three tasks for `request`, in execution order. Inputs are used
    /// exactly as given.
    pub fn build_tasks(&self, request: &AnalysisRequest) -> Vec<TaskSpec> {
        let title = &request.title;
        let research_area = &request.research_area;

        vec![
            TaskSpec::new(
                TaskKind::Explain,
                explain_description(title, &request.abstract_text, research_area),
                EXPLAIN_EXPECTED_OUTPUT,
                self.roles.get(RoleKind::Explainer),
            ),
            TaskSpec::new(
                TaskKind::FindLiterature,
                literature_description(title, research_area),
                LITERATURE_EXPECTED_OUTPUT,
                self.roles.get(RoleKind::LiteratureFinder),
            ),
            TaskSpec::new(
                TaskKind::AnalyzeGaps,
                gap_description(title),
                GAP_EXPECTED_OUTPUT,
                self.roles.get(RoleKind::GapAnalyzer),
            ),
        ]
    }

    /// Run the full analysis for one paper.
    ///
    /// # Errors
    ///
    /// [`AnalysisError::InvalidRequest`] for a blank title (no task runs),
    /// [`AnalysisError::Capability`] when any task fails.
    pub async fn run_analysis(
        &self,
        request: &AnalysisRequest,
    ) -> Result<AnalysisResult, AnalysisError> {
        if request.title.trim().is_empty() {
            return Err(AnalysisError::InvalidRequest(
                "paper title must not be empty".to_string(),
            ));
        }

        tracing::info!(title = %request.title.trim(), area = %request.research_area.trim(), "Starting paper analysis");

        let crew = Crew::builder()
            .name("paper-analysis")
            .tasks(self.build_tasks(request))
            .build();

        let (task_outputs, trace) = crew.execute(self.executor.as_ref()).await?;
        let text = task_outputs
            .last()
            .map(|output| output.raw.clone())
            .unwrap_or_default();

        if let Some(usage) = trace.total_token_usage() {
            tracing::info!(
                run_id = %trace.run_id,
                total_tokens = usage.total_tokens,
                duration_ms = trace.total_duration_ms,
                "Paper analysis finished"
            );
        }

        Ok(AnalysisResult {
            text,
            task_outputs,
            trace,
        })
    }
}

/// Handle one form submission.
///
/// Never fails: a blank title yields [`EMPTY_TITLE_MESSAGE`] without running
/// anything, and any pipeline error is rendered as
/// `"Error analyzing paper: <message>"`.
pub async fn handle_submit(
    companion: &ResearchPaperCompanion,
    title: &str,
    abstract_text: &str,
    research_area: &str,
) -> String {
    if title.trim().is_empty() {
        return EMPTY_TITLE_MESSAGE.to_string();
    }

    let request = AnalysisRequest::new(title, abstract_text, research_area);
    match companion.run_analysis(&request).await {
        Ok(result) => result.text,
        Err(e) => {
            tracing::warn!(error = %e, "Paper analysis failed");
            format!("{ERROR_PREFIX}{e}")
        }
    }
}
