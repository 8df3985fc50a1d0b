//! Workflow execution types and error handling

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::llm::TokenUsage;

use super::task::TaskKind;

/// Error type for workflow operations
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// A capability (language model or web search) failed
    #[error("{0}")]
    Capability(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<crate::error::CompanionError> for WorkflowError {
    fn from(err: crate::error::CompanionError) -> Self {
        WorkflowError::Capability(err.to_string())
    }
}

/// Result type for workflow operations
pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Trace of a single task execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskTrace {
    /// Which pipeline stage ran
    pub task: TaskKind,

    /// Name of the role that executed the task
    pub role: String,

    /// Duration of task execution
    pub duration_ms: u64,

    /// Whether the task succeeded
    pub success: bool,

    /// Error message if failed
    pub error: Option<String>,

    /// Token usage if available
    pub token_usage: Option<TokenUsage>,
}

impl TaskTrace {
    /// Create a successful task trace
    pub fn success(task: TaskKind, role: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            task,
            role: role.into(),
            duration_ms,
            success: true,
            error: None,
            token_usage: None,
        }
    }

    /// Create a failed task trace
    pub fn failure(
        task: TaskKind,
        role: impl Into<String>,
        error: impl Into<String>,
        duration_ms: u64,
    ) -> Self {
        Self {
            task,
            role: role.into(),
            duration_ms,
            success: false,
            error: Some(error.into()),
            token_usage: None,
        }
    }

    /// Add token usage to the trace
    pub fn with_token_usage(mut self, usage: Option<TokenUsage>) -> Self {
        self.token_usage = usage;
        self
    }
}

/// Complete execution trace for one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionTrace {
    /// Unique id of this run
    pub run_id: Uuid,

    /// Workflow name
    pub workflow_name: String,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// Task traces in execution order
    pub tasks: Vec<TaskTrace>,

    /// Total duration
    pub total_duration_ms: u64,

    /// Whether the workflow completed successfully
    pub success: bool,

    /// Final error if failed
    pub error: Option<String>,
}

impl ExecutionTrace {
    /// Create a new execution trace
    pub fn new(workflow_name: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            workflow_name: workflow_name.into(),
            started_at: Utc::now(),
            tasks: Vec::new(),
            total_duration_ms: 0,
            success: true,
            error: None,
        }
    }

    /// Add a task trace
    pub fn add_task(&mut self, task: TaskTrace) {
        self.total_duration_ms += task.duration_ms;
        if !task.success {
            self.success = false;
            self.error = task.error.clone();
        }
        self.tasks.push(task);
    }

    /// Get total token usage across all tasks
    pub fn total_token_usage(&self) -> Option<TokenUsage> {
        self.tasks
            .iter()
            .filter_map(|t| t.token_usage)
            .reduce(|acc, usage| acc.add(&usage))
    }

    /// Get the number of tasks that completed successfully
    pub fn completed_tasks(&self) -> usize {
        self.tasks.iter().filter(|t| t.success).count()
    }

    /// Task kinds in execution order
    pub fn task_order(&self) -> Vec<TaskKind> {
        self.tasks.iter().map(|t| t.task).collect()
    }
}
