//! Task definitions
//!
//! A [`TaskSpec`] is one pipeline stage's instructions: a description
//! templated from the user's request, an expected-output hint and the role
//! that executes it. Tasks are built per request and dropped afterwards.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::llm::TokenUsage;
use crate::roles::RoleSpec;

/// The three pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Explain,
    FindLiterature,
    AnalyzeGaps,
}

impl TaskKind {
    /// Stable identifier used in logs and traces
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Explain => "explain",
            TaskKind::FindLiterature => "find_literature",
            TaskKind::AnalyzeGaps => "analyze_gaps",
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One pipeline stage's instantiated instructions
#[derive(Debug, Clone)]
pub struct TaskSpec {
    /// Which stage this is
    pub kind: TaskKind,
    /// Templated instructions for the agent
    pub description: String,
    /// What a good answer looks like
    pub expected_output: String,
    /// Role that executes the task
    pub role: Arc<RoleSpec>,
    /// Outputs of earlier tasks, attached by the crew before execution
    pub context: Vec<TaskOutput>,
}

impl TaskSpec {
    pub fn new(
        kind: TaskKind,
        description: impl Into<String>,
        expected_output: impl Into<String>,
        role: Arc<RoleSpec>,
    ) -> Self {
        Self {
            kind,
            description: description.into(),
            expected_output: expected_output.into(),
            role,
            context: Vec::new(),
        }
    }

    /// Render the attached context for a prompt. Empty when there is none.
    pub fn render_context(&self) -> String {
        self.context
            .iter()
            .map(|output| output.raw.trim())
            .filter(|raw| !raw.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n----------\n\n")
    }
}

/// Output of one executed task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskOutput {
    /// Which stage produced this
    pub task: TaskKind,
    /// Role that produced it
    pub role_name: String,
    /// The description the task ran with
    pub description: String,
    /// Final answer text
    pub raw: String,
    /// Token usage summed over every model call of the task
    pub token_usage: Option<TokenUsage>,
}

impl TaskOutput {
    pub fn new(task: &TaskSpec, raw: impl Into<String>) -> Self {
        Self {
            task: task.kind,
            role_name: task.role.name().to_string(),
            description: task.description.clone(),
            raw: raw.into(),
            token_usage: None,
        }
    }

    pub fn with_usage(mut self, usage: Option<TokenUsage>) -> Self {
        self.token_usage = usage;
        self
    }
}

/// Description of the topic explanation task
pub fn explain_description(title: &str, abstract_text: &str, research_area: &str) -> String {
    format!(
        r#"Analyze and explain the research topic: "{title}"

Paper abstract (if provided): {abstract_text}
Research area: {research_area}

Provide:
1. A clear explanation of the main research topic
2. Key concepts and terminology
3. The broader context and significance
4. Why this research matters

Keep explanations accessible but comprehensive."#
    )
}

pub const EXPLAIN_EXPECTED_OUTPUT: &str =
    "A structured explanation of the research topic with key concepts clearly defined";

/// Description of the literature review task
pub fn literature_description(title: &str, research_area: &str) -> String {
    format!(
        r#"Find and summarize relevant literature related to: "{title}"

Research area: {research_area}

Provide:
1. 5-7 key papers in this area
2. Brief summary of each paper's contribution
3. How they relate to the main topic
4. Current trends in this research area

Focus on recent and influential work."#
    )
}

pub const LITERATURE_EXPECTED_OUTPUT: &str =
    "A comprehensive literature review with summaries of key related papers";

/// Description of the gap analysis task
pub fn gap_description(title: &str) -> String {
    format!(
        r#"Based on the topic explanation and literature review, identify research gaps
and suggest future directions for: "{title}"

Provide:
1. Current limitations in the field
2. Unexplored areas or questions
3. Methodological gaps
4. 3-5 specific research directions with rationale
5. Potential impact of suggested research

Be specific and actionable in your suggestions."#
    )
}

pub const GAP_EXPECTED_OUTPUT: &str =
    "A detailed analysis of research gaps with specific, actionable research suggestions";
