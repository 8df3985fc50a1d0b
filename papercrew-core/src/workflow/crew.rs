//! Crew workflow
//!
//! Sequential execution of tasks where every task sees the outputs of the
//! tasks that ran before it. [`Crew::execute`] returns every output,
//! [`Crew::kickoff`] only the last one.

use std::time::Instant;

use super::agent::TaskExecutor;
use super::execution::{ExecutionTrace, TaskTrace, WorkflowError, WorkflowResult};
use super::task::{TaskOutput, TaskSpec};

/// An ordered group of tasks executed one after another
pub struct Crew {
    /// Crew name, used in traces and logs
    name: String,
    /// Tasks in execution order
    tasks: Vec<TaskSpec>,
}

impl std::fmt::Debug for Crew {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crew")
            .field("name", &self.name)
            .field("tasks", &self.tasks.iter().map(|t| t.kind).collect::<Vec<_>>())
            .finish()
    }
}

impl Crew {
    /// Create a new crew builder
    pub fn builder() -> CrewBuilder {
        CrewBuilder::new()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tasks(&self) -> &[TaskSpec] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Run every task in order and return all outputs.
    ///
    /// Before a task runs, the outputs of all earlier tasks are attached as
    /// its context. Task descriptions are passed through untouched. The
    /// first failing task aborts the crew and its error is returned.
    pub async fn execute(
        &self,
        executor: &dyn TaskExecutor,
    ) -> WorkflowResult<(Vec<TaskOutput>, ExecutionTrace)> {
        if self.tasks.is_empty() {
            return Err(WorkflowError::InvalidConfig(format!(
                "crew '{}' has no tasks",
                self.name
            )));
        }

        let mut trace = ExecutionTrace::new(&self.name);
        let mut outputs: Vec<TaskOutput> = Vec::with_capacity(self.tasks.len());

        tracing::info!(crew = %self.name, run_id = %trace.run_id, tasks = self.tasks.len(), "Crew started");

        for spec in &self.tasks {
            let mut task = spec.clone();
            task.context = outputs.clone();

            tracing::info!(crew = %self.name, task = %task.kind, role = task.role.name(), "Task started");
            let start = Instant::now();

            match executor.execute(&task).await {
                Ok(output) => {
                    let duration_ms = start.elapsed().as_millis() as u64;
                    tracing::info!(task = %task.kind, duration_ms, "Task completed");

                    trace.add_task(
                        TaskTrace::success(task.kind, task.role.name(), duration_ms)
                            .with_token_usage(output.token_usage),
                    );
                    outputs.push(output);
                }
                Err(e) => {
                    let duration_ms = start.elapsed().as_millis() as u64;
                    trace.add_task(TaskTrace::failure(
                        task.kind,
                        task.role.name(),
                        e.to_string(),
                        duration_ms,
                    ));
                    tracing::error!(
                        crew = %self.name,
                        run_id = %trace.run_id,
                        task = %task.kind,
                        completed = trace.completed_tasks(),
                        error = %e,
                        "Crew aborted"
                    );
                    return Err(e);
                }
            }
        }

        tracing::info!(
            crew = %self.name,
            run_id = %trace.run_id,
            duration_ms = trace.total_duration_ms,
            "Crew finished"
        );

        Ok((outputs, trace))
    }

    /// Run every task in order and return the last task's output.
    pub async fn kickoff(
        &self,
        executor: &dyn TaskExecutor,
    ) -> WorkflowResult<(TaskOutput, ExecutionTrace)> {
        let (mut outputs, trace) = self.execute(executor).await?;
        let last = outputs.pop().ok_or_else(|| {
            WorkflowError::InvalidConfig(format!("crew '{}' produced no output", self.name))
        })?;
        Ok((last, trace))
    }
}

/// Builder for creating crews
pub struct CrewBuilder {
    name: String,
    tasks: Vec<TaskSpec>,
}

impl CrewBuilder {
    pub fn new() -> Self {
        Self {
            name: "crew".to_string(),
            tasks: Vec::new(),
        }
    }

    /// Set the crew name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Append a task
    pub fn task(mut self, task: TaskSpec) -> Self {
        self.tasks.push(task);
        self
    }

    /// Append several tasks in order
    pub fn tasks(mut self, tasks: impl IntoIterator<Item = TaskSpec>) -> Self {
        self.tasks.extend(tasks);
        self
    }

    pub fn build(self) -> Crew {
        Crew {
            name: self.name,
            tasks: self.tasks,
        }
    }
}

impl Default for CrewBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::TokenUsage;
    use crate::roles::{RoleCatalog, RoleKind};
    use crate::workflow::task::TaskKind;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Echoes each description and records what it saw.
    #[derive(Default)]
    struct EchoExecutor {
        seen: Mutex<Vec<(TaskKind, usize, String)>>,
        fail_on: Option<TaskKind>,
    }

    #[async_trait]
    impl TaskExecutor for EchoExecutor {
        async fn execute(&self, task: &TaskSpec) -> WorkflowResult<TaskOutput> {
            self.seen
                .lock()
                .unwrap()
                .push((task.kind, task.context.len(), task.description.clone()));

            if self.fail_on == Some(task.kind) {
                return Err(WorkflowError::Capability("search quota exceeded".to_string()));
            }

            Ok(TaskOutput::new(task, format!("echo: {}", task.description)).with_usage(Some(
                TokenUsage {
                    prompt_tokens: 1,
                    completion_tokens: 1,
                    total_tokens: 2,
                },
            )))
        }
    }

    fn three_tasks() -> Vec<TaskSpec> {
        let catalog = RoleCatalog::standard();
        vec![
            TaskSpec::new(TaskKind::Explain, "one", "e", catalog.get(RoleKind::Explainer)),
            TaskSpec::new(
                TaskKind::FindLiterature,
                "two",
                "e",
                catalog.get(RoleKind::LiteratureFinder),
            ),
            TaskSpec::new(TaskKind::AnalyzeGaps, "three", "e", catalog.get(RoleKind::GapAnalyzer)),
        ]
    }

    #[test]
    fn test_crew_builder() {
        let crew = Crew::builder().name("paper-analysis").tasks(three_tasks()).build();
        assert_eq!(crew.name(), "paper-analysis");
        assert_eq!(crew.len(), 3);
        assert_eq!(crew.tasks()[1].kind, TaskKind::FindLiterature);
    }

    #[tokio::test]
    async fn test_kickoff_runs_in_order_with_context() {
        let crew = Crew::builder().tasks(three_tasks()).build();
        let executor = EchoExecutor::default();

        let (output, trace) = crew.kickoff(&executor).await.unwrap();

        assert_eq!(output.raw, "echo: three");
        assert_eq!(output.task, TaskKind::AnalyzeGaps);

        let seen = executor.seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                (TaskKind::Explain, 0, "one".to_string()),
                (TaskKind::FindLiterature, 1, "two".to_string()),
                (TaskKind::AnalyzeGaps, 2, "three".to_string()),
            ]
        );

        assert!(trace.success);
        assert_eq!(
            trace.task_order(),
            vec![TaskKind::Explain, TaskKind::FindLiterature, TaskKind::AnalyzeGaps]
        );
        assert_eq!(trace.total_token_usage().unwrap().total_tokens, 6);
    }

    #[tokio::test]
    async fn test_kickoff_stops_at_first_failure() {
        let crew = Crew::builder().tasks(three_tasks()).build();
        let executor = EchoExecutor {
            fail_on: Some(TaskKind::FindLiterature),
            ..EchoExecutor::default()
        };

        let err = crew.kickoff(&executor).await.unwrap_err();
        assert_eq!(err.to_string(), "search quota exceeded");
        assert_eq!(executor.seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_execute_returns_every_output() {
        let crew = Crew::builder().tasks(three_tasks()).build();
        let (outputs, _) = crew.execute(&EchoExecutor::default()).await.unwrap();
        let raw: Vec<&str> = outputs.iter().map(|o| o.raw.as_str()).collect();
        assert_eq!(raw, vec!["echo: one", "echo: two", "echo: three"]);
    }

    #[tokio::test]
    async fn test_empty_crew_is_invalid() {
        let crew = Crew::builder().build();
        let result = crew.kickoff(&EchoExecutor::default()).await;
        assert!(matches!(result, Err(WorkflowError::InvalidConfig(_))));
    }
}
