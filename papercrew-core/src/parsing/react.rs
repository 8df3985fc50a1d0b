//! ReAct format parser
//!
//! Parses the ReAct (Reasoning + Acting) format the agents are prompted with.
//!
//! Format:
//! ```text
//! Thought: I should look up recent work
//! Action: web_search
//! Action Input: transformer attention survey 2024
//! Observation: search results
//! Thought: I now know the final answer
//! Final Answer: ...
//! ```
//!
//! Markers may be wrapped in markdown bold (`**Final Answer:**`), which many
//! models emit.

use regex::Regex;
use std::sync::LazyLock;

use super::parser::{OutputParser, ParseError, ParseResult};

/// Type of ReAct step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReActStepType {
    /// Reasoning step
    Thought,
    /// Action to take
    Action,
    /// Input for the action
    ActionInput,
    /// Result of action
    Observation,
    /// Final answer
    FinalAnswer,
}

impl ReActStepType {
    /// Check if this is a terminal step
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReActStepType::FinalAnswer)
    }
}

/// A single step in a ReAct trace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReActStep {
    /// Step type
    pub step_type: ReActStepType,
    /// Step content
    pub content: String,
}

impl ReActStep {
    /// Create a new ReAct step
    pub fn new(step_type: ReActStepType, content: impl Into<String>) -> Self {
        Self {
            step_type,
            content: content.into(),
        }
    }
}

static STEP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:\*\*)?(Thought|Action\s*Input|Action|Observation|Final\s*Answer)\s*:(?:\*\*)?\s*(.*)$",
    )
    .expect("ReAct step pattern is valid")
});

/// ReAct format parser
#[derive(Debug, Clone, Default)]
pub struct ReActParser;

impl ReActParser {
    /// Create a new ReAct parser
    pub fn new() -> Self {
        Self
    }

    /// Extract the final answer if present
    pub fn get_final_answer(&self, raw: &str) -> ParseResult<Option<String>> {
        let steps = self.parse(raw)?;

        Ok(steps
            .into_iter()
            .find(|s| s.step_type.is_terminal())
            .map(|s| s.content))
    }

    /// Get the last action and its input
    pub fn get_last_action(&self, raw: &str) -> ParseResult<Option<(String, String)>> {
        let steps = self.parse(raw)?;

        let mut action: Option<String> = None;
        let mut action_input: Option<String> = None;

        for step in steps.iter().rev() {
            match step.step_type {
                ReActStepType::ActionInput if action_input.is_none() => {
                    action_input = Some(step.content.clone());
                }
                ReActStepType::Action if action.is_none() => {
                    action = Some(step.content.clone());
                    if action_input.is_some() {
                        break;
                    }
                }
                _ => {}
            }
        }

        Ok(action.map(|a| (a, action_input.unwrap_or_default())))
    }

    /// Check if the trace is complete (has final answer)
    pub fn is_complete(&self, raw: &str) -> bool {
        self.get_final_answer(raw)
            .map(|a| a.is_some())
            .unwrap_or(false)
    }
}

fn step_type_for(marker: &str) -> ReActStepType {
    let marker = marker.to_lowercase();
    if marker.starts_with("thought") {
        ReActStepType::Thought
    } else if marker.contains("input") {
        ReActStepType::ActionInput
    } else if marker.starts_with("action") {
        ReActStepType::Action
    } else if marker.starts_with("observation") {
        ReActStepType::Observation
    } else {
        ReActStepType::FinalAnswer
    }
}

impl OutputParser for ReActParser {
    type Output = Vec<ReActStep>;

    fn parse(&self, raw: &str) -> ParseResult<Self::Output> {
        if raw.trim().is_empty() {
            return Err(ParseError::EmptyInput);
        }

        let mut steps = Vec::new();
        let mut current_type: Option<ReActStepType> = None;
        let mut current_content = String::new();

        for line in raw.lines() {
            // Everything after the final answer marker belongs to the answer.
            let in_final_answer = matches!(current_type, Some(ReActStepType::FinalAnswer));

            match STEP_RE.captures(line) {
                Some(caps) if !in_final_answer => {
                    if let Some(step_type) = current_type.take() {
                        steps.push(ReActStep::new(step_type, current_content.trim()));
                    }

                    current_type = Some(step_type_for(&caps[1]));
                    current_content = caps[2].to_string();
                }
                _ => {
                    if current_type.is_some() {
                        current_content.push('\n');
                        current_content.push_str(line);
                    }
                }
            }
        }

        if let Some(step_type) = current_type {
            steps.push(ReActStep::new(step_type, current_content.trim()));
        }

        if steps.is_empty() {
            return Err(ParseError::InvalidFormat("No ReAct steps found".to_string()));
        }

        Ok(steps)
    }

    fn can_parse(&self, raw: &str) -> bool {
        raw.lines().any(|line| STEP_RE.is_match(line))
    }

    fn name(&self) -> &'static str {
        "react"
    }
}
