//! Agent execution of a single task
//!
//! [`AgentExecutor`] runs one [`TaskSpec`] as its role: it prompts the
//! language model with the role's persona and the task, and lets the model
//! call the web search tool through the ReAct protocol until it produces a
//! final answer.

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::AgentSettings;
use crate::llm::{LLMProvider, LLMRequest, LLMResponse, Message, TokenUsage};
use crate::parsing::ReActParser;
use crate::roles::RoleSpec;
use crate::tools::{Capability, SearchTool, format_results};

use super::execution::{WorkflowError, WorkflowResult};
use super::task::{TaskOutput, TaskSpec};

/// Executes one task and returns its output.
///
/// This is the seam between the crew and the capabilities; tests substitute
/// recording executors here.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    async fn execute(&self, task: &TaskSpec) -> WorkflowResult<TaskOutput>;
}

/// Agent loop configuration
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Model calls allowed before a final answer is forced
    pub max_iterations: usize,
    /// Sampling temperature
    pub temperature: f32,
    /// Maximum tokens per model call
    pub max_tokens: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig::from(&AgentSettings::default())
    }
}

impl From<&AgentSettings> for AgentConfig {
    fn from(settings: &AgentSettings) -> Self {
        Self {
            max_iterations: settings.max_iterations.max(1),
            temperature: settings.temperature.clamp(0.0, 2.0),
            max_tokens: settings.max_tokens,
        }
    }
}

const OBSERVATION_STOP: &str = "\nObservation:";

const FORCE_FINAL_ANSWER: &str = "Now it's time you MUST give your absolute best final answer. \
     You'll ignore all previous instructions, stop using any tools, and just return your \
     absolute BEST Final Answer.";

/// What the model asked for in one response
#[derive(Debug, Clone, PartialEq, Eq)]
enum AgentMove {
    Final(String),
    Search(String),
    UnknownTool(String),
}

/// LLM-backed executor with optional web search
pub struct AgentExecutor {
    provider: Arc<dyn LLMProvider>,
    search: Option<Arc<dyn SearchTool>>,
    config: AgentConfig,
    parser: ReActParser,
}

impl AgentExecutor {
    /// Create an executor without a search tool
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self {
            provider,
            search: None,
            config: AgentConfig::default(),
            parser: ReActParser::new(),
        }
    }

    /// Offer `tool` to roles that have the web search capability
    pub fn with_search(mut self, tool: Arc<dyn SearchTool>) -> Self {
        self.search = Some(tool);
        self
    }

    pub fn with_config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// The search tool available to `role`, if any.
    fn tool_for(&self, role: &RoleSpec) -> Option<&dyn SearchTool> {
        if role.can(Capability::WebSearch) {
            self.search.as_deref()
        } else {
            None
        }
    }

    /// Persona and protocol instructions for `role`.
    pub fn system_prompt(role: &RoleSpec, tool: Option<&dyn SearchTool>) -> String {
        let mut prompt = format!(
            "You are {}. {}\nYour personal goal is: {}",
            role.name(),
            role.backstory(),
            role.goal()
        );

        match tool {
            Some(tool) => {
                prompt.push_str(&format!(
                    "\n\nYou ONLY have access to the following tools, and should NEVER make up \
                     tools that are not listed here:\n\nTool Name: {name}\nTool Description: \
                     {description}\nTool Arguments: a plain-text search query\n\n\
                     IMPORTANT: Use the following format in your response:\n\n\
                     Thought: you should always think about what to do\n\
                     Action: the action to take, only one name of [{name}]\n\
                     Action Input: the search query\n\
                     Observation: the result of the action\n\n\
                     Once all necessary information is gathered, return the following format:\n\n\
                     Thought: I now know the final answer\n\
                     Final Answer: the final answer to the original input question",
                    name = tool.name(),
                    description = tool.description(),
                ));
            }
            None => {
                prompt.push_str(
                    "\n\nTo give my best complete final answer to the task respond using the \
                     exact following format:\n\n\
                     Thought: I now can give a great answer\n\
                     Final Answer: Your final answer must be the great and the most complete as \
                     possible, it must be outcome described.\n\n\
                     I MUST use these formats, my job depends on it!",
                );
            }
        }

        prompt
    }

    /// Task instructions, including context from earlier tasks.
    pub fn task_prompt(task: &TaskSpec) -> String {
        let mut prompt = format!(
            "Current Task: {}\n\nThis is the expected criteria for your final answer: {}\n\
             you MUST return the actual complete content as the final answer, not a summary.",
            task.description.trim(),
            task.expected_output
        );

        let context = task.render_context();
        if !context.is_empty() {
            prompt.push_str("\n\nThis is the context you're working with:\n");
            prompt.push_str(&context);
        }

        prompt.push_str(
            "\n\nBegin! This is VERY important to you, use the tools available and give your \
             best Final Answer, your job depends on it!\n\nThought:",
        );
        prompt
    }

    fn next_move(&self, raw: &str, tool: Option<&dyn SearchTool>) -> AgentMove {
        if let Ok(Some(answer)) = self.parser.get_final_answer(raw) {
            return AgentMove::Final(answer);
        }

        match self.parser.get_last_action(raw) {
            Ok(Some((action, input))) => match tool {
                Some(tool) if action.trim().eq_ignore_ascii_case(tool.name()) => {
                    AgentMove::Search(clean_query(&input))
                }
                _ => AgentMove::UnknownTool(action.trim().to_string()),
            },
            _ => AgentMove::Final(raw.trim().to_string()),
        }
    }

    async fn call(&self, messages: &[Message], with_tool: bool) -> WorkflowResult<LLMResponse> {
        let mut request = LLMRequest::new(messages.to_vec())
            .with_sampling(self.config.temperature, self.config.max_tokens);
        if with_tool {
            request = request.with_stop(OBSERVATION_STOP);
        }

        self.provider
            .generate_request(&request)
            .await
            .map_err(WorkflowError::from)
    }
}

/// Strip quotes and unwrap `{"query": ...}` style inputs.
fn clean_query(input: &str) -> String {
    let trimmed = input.trim();

    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(trimmed)
    {
        for key in ["query", "search_query", "q"] {
            if let Some(serde_json::Value::String(q)) = map.get(key) {
                return q.trim().to_string();
            }
        }
    }

    trimmed.trim_matches(|c| c == '"' || c == '\'').trim().to_string()
}

fn add_usage(total: Option<TokenUsage>, usage: Option<TokenUsage>) -> Option<TokenUsage> {
    match (total, usage) {
        (Some(a), Some(b)) => Some(a.add(&b)),
        (a, b) => a.or(b),
    }
}

fn non_empty(task: &TaskSpec, answer: String) -> WorkflowResult<String> {
    if answer.trim().is_empty() {
        return Err(WorkflowError::Capability(format!(
            "language model returned an empty answer for task '{}'",
            task.kind
        )));
    }
    Ok(answer)
}

#[async_trait]
impl TaskExecutor for AgentExecutor {
    async fn execute(&self, task: &TaskSpec) -> WorkflowResult<TaskOutput> {
        if !task.role.can(Capability::LanguageModel) {
            return Err(WorkflowError::InvalidConfig(format!(
                "role '{}' cannot use the language model",
                task.role.name()
            )));
        }

        let tool = self.tool_for(&task.role);
        let mut messages = vec![
            Message::system(Self::system_prompt(&task.role, tool)),
            Message::user(Self::task_prompt(task)),
        ];
        let mut usage: Option<TokenUsage> = None;

        for iteration in 1..=self.config.max_iterations {
            tracing::debug!(task = %task.kind, role = task.role.name(), iteration, "Calling language model");

            let response = self.call(&messages, tool.is_some()).await?;
            usage = add_usage(usage, response.usage);

            match self.next_move(&response.content, tool) {
                AgentMove::Final(answer) => {
                    let answer = non_empty(task, answer)?;
                    return Ok(TaskOutput::new(task, answer).with_usage(usage));
                }
                AgentMove::Search(query) => {
                    // tool is Some whenever a Search move is produced
                    let Some(tool) = tool else {
                        continue;
                    };
                    tracing::info!(task = %task.kind, role = task.role.name(), query = %query, "Agent searching the web");

                    let results = tool.search(&query).await.map_err(WorkflowError::from)?;
                    messages.push(Message::assistant(response.content.trim_end()));
                    messages.push(Message::user(format!(
                        "Observation: {}",
                        format_results(&results)
                    )));
                }
                AgentMove::UnknownTool(name) => {
                    tracing::warn!(task = %task.kind, tool = %name, "Agent requested an unavailable tool");

                    let available = tool
                        .map(|t| format!("[{}]", t.name()))
                        .unwrap_or_else(|| "none".to_string());
                    messages.push(Message::assistant(response.content.trim_end()));
                    messages.push(Message::user(format!(
                        "Observation: Error: the tool '{}' does not exist. Available tools: {}. \
                         If you have enough information, give your Final Answer.",
                        name, available
                    )));
                }
            }
        }

        tracing::warn!(
            task = %task.kind,
            max_iterations = self.config.max_iterations,
            "Iteration limit reached, forcing a final answer"
        );

        messages.push(Message::user(FORCE_FINAL_ANSWER));
        let response = self.call(&messages, false).await?;
        usage = add_usage(usage, response.usage);

        let answer = match self.parser.get_final_answer(&response.content) {
            Ok(Some(answer)) => answer,
            _ => response.content.trim().to_string(),
        };
        let answer = non_empty(task, answer)?;

        Ok(TaskOutput::new(task, answer).with_usage(usage))
    }
}
