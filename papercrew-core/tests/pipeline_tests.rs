//! End-to-end tests of the analysis pipeline
//!
//! `RecordingExecutor` replaces the whole agent, so those tests check
//! orchestration only: ordering, context hand-off, role assignment and error
//! rendering. `EchoModel` replaces only the language model and runs the real
//! `AgentExecutor`.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use papercrew_core::prelude::*;
use papercrew_core::workflow::gap_description;

/// Records every task it sees and answers with an echo of the description.
#[derive(Default)]
struct RecordingExecutor {
    seen: Mutex<Vec<TaskSpec>>,
    fail_on: Option<(TaskKind, String)>,
}

impl RecordingExecutor {
    fn failing_on(kind: TaskKind, message: &str) -> Self {
        Self {
            fail_on: Some((kind, message.to_string())),
            ..Self::default()
        }
    }

    fn seen(&self) -> Vec<TaskSpec> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl TaskExecutor for RecordingExecutor {
    async fn execute(&self, task: &TaskSpec) -> WorkflowResult<TaskOutput> {
        self.seen.lock().unwrap().push(task.clone());

        if let Some((kind, message)) = &self.fail_on {
            if *kind == task.kind {
                return Err(WorkflowError::Capability(message.clone()));
            }
        }

        Ok(TaskOutput::new(task, format!("echo: {}", task.description)))
    }
}

fn companion_with(executor: Arc<RecordingExecutor>) -> ResearchPaperCompanion {
    ResearchPaperCompanion::new(RoleCatalog::standard(), executor)
}

#[tokio::test]
async fn test_blank_title_runs_nothing() {
    let executor = Arc::new(RecordingExecutor::default());
    let companion = companion_with(executor.clone());

    for title in ["", "   ", "\n\t"] {
        let text = handle_submit(&companion, title, "some abstract", "Physics").await;
        assert_eq!(text, "Please provide a paper title.");
    }

    assert!(executor.seen().is_empty());
}

#[tokio::test]
async fn test_three_tasks_in_order_with_roles() {
    let executor = Arc::new(RecordingExecutor::default());
    let companion = companion_with(executor.clone());

    handle_submit(&companion, "Attention Is All You Need", "", "Natural Language Processing")
        .await;

    let seen = executor.seen();
    let order: Vec<(TaskKind, RoleKind)> = seen.iter().map(|t| (t.kind, t.role.kind())).collect();
    assert_eq!(
        order,
        vec![
            (TaskKind::Explain, RoleKind::Explainer),
            (TaskKind::FindLiterature, RoleKind::LiteratureFinder),
            (TaskKind::AnalyzeGaps, RoleKind::GapAnalyzer),
        ]
    );
}

#[tokio::test]
async fn test_title_appears_in_every_description() {
    let executor = Arc::new(RecordingExecutor::default());
    let companion = companion_with(executor.clone());

    handle_submit(&companion, "Attention Is All You Need", "", "").await;

    let seen = executor.seen();
    assert_eq!(seen.len(), 3);
    for task in &seen {
        assert!(
            task.description.contains("Attention Is All You Need"),
            "{} description is missing the title",
            task.kind
        );
    }
}

#[tokio::test]
async fn test_final_text_is_last_task_output() {
    let executor = Arc::new(RecordingExecutor::default());
    let companion = companion_with(executor.clone());

    let text = handle_submit(&companion, "BERT", "", "Machine Learning").await;

    let seen = executor.seen();
    assert_eq!(text, format!("echo: {}", seen[2].description));
    assert_eq!(text, format!("echo: {}", gap_description("BERT")));
}

#[tokio::test]
async fn test_gap_task_receives_prior_outputs_as_context() {
    let executor = Arc::new(RecordingExecutor::default());
    let companion = companion_with(executor.clone());

    let request = AnalysisRequest::new("BERT", "We introduce BERT.", "Machine Learning");
    let expected = companion.build_tasks(&request);

    companion.run_analysis(&request).await.unwrap();

    let seen = executor.seen();
    assert!(seen[0].context.is_empty());
    assert_eq!(seen[1].context.len(), 1);
    assert_eq!(seen[1].context[0].task, TaskKind::Explain);

    let gap = &seen[2];
    let context_kinds: Vec<TaskKind> = gap.context.iter().map(|o| o.task).collect();
    assert_eq!(context_kinds, vec![TaskKind::Explain, TaskKind::FindLiterature]);
    assert_eq!(gap.context[1].raw, format!("echo: {}", seen[1].description));

    // descriptions are passed through exactly as built
    for (ran, built) in seen.iter().zip(expected.iter()) {
        assert_eq!(ran.description, built.description);
    }
}

#[tokio::test]
async fn test_failure_is_rendered_and_stops_pipeline() {
    let executor = Arc::new(RecordingExecutor::failing_on(
        TaskKind::FindLiterature,
        "Serper API error (403): Unauthorized",
    ));
    let companion = companion_with(executor.clone());

    let text = handle_submit(&companion, "Deep Residual Learning", "", "Computer Vision").await;

    assert!(text.starts_with("Error analyzing paper: "));
    assert!(text.contains("Serper API error (403): Unauthorized"));

    let kinds: Vec<TaskKind> = executor.seen().iter().map(|t| t.kind).collect();
    assert_eq!(kinds, vec![TaskKind::Explain, TaskKind::FindLiterature]);
}

#[tokio::test]
async fn test_failure_on_first_task() {
    let executor = Arc::new(RecordingExecutor::failing_on(TaskKind::Explain, "model unavailable"));
    let companion = companion_with(executor.clone());

    let result = companion
        .run_analysis(&AnalysisRequest::new("BERT", "", ""))
        .await;

    match result {
        Err(AnalysisError::Capability(message)) => assert_eq!(message, "model unavailable"),
        other => panic!("expected capability error, got {:?}", other.map(|r| r.text)),
    }
    assert_eq!(executor.seen().len(), 1);
}

#[tokio::test]
async fn test_trace_covers_all_tasks() {
    let executor = Arc::new(RecordingExecutor::default());
    let companion = companion_with(executor);

    let result = companion
        .run_analysis(&AnalysisRequest::new("BERT", "", "Machine Learning"))
        .await
        .unwrap();

    assert!(result.trace.success);
    assert_eq!(result.trace.workflow_name, "paper-analysis");
    assert_eq!(
        result.trace.task_order(),
        vec![TaskKind::Explain, TaskKind::FindLiterature, TaskKind::AnalyzeGaps]
    );
    let roles: Vec<&str> = result.trace.tasks.iter().map(|t| t.role.as_str()).collect();
    assert_eq!(roles, vec!["Topic Explainer", "Literature Finder", "Gap Analyzer"]);
}

/// Answers every request with its last user message as the final answer.
#[derive(Default)]
struct EchoModel {
    requests: Mutex<Vec<LLMRequest>>,
    fail_with: Option<String>,
}

impl EchoModel {
    fn user_messages(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter_map(|r| r.messages.iter().rev().find(|m| m.role == MessageRole::User))
            .map(|m| m.content.clone())
            .collect()
    }
}

#[async_trait]
impl LLMProvider for EchoModel {
    async fn generate_request(&self, request: &LLMRequest) -> Result<LLMResponse> {
        self.requests.lock().unwrap().push(request.clone());

        if let Some(message) = &self.fail_with {
            return Err(CompanionError::Provider(message.clone()));
        }

        let prompt = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.clone())
            .unwrap_or_default();

        Ok(LLMResponse {
            content: format!("Final Answer: {prompt}"),
            usage: None,
        })
    }
}

fn companion_with_model(model: Arc<EchoModel>) -> ResearchPaperCompanion {
    ResearchPaperCompanion::new(
        RoleCatalog::standard(),
        Arc::new(AgentExecutor::new(model)),
    )
}

#[tokio::test]
async fn test_agent_pipeline_calls_model_once_per_task() {
    let model = Arc::new(EchoModel::default());
    let companion = companion_with_model(model.clone());

    let text = handle_submit(
        &companion,
        "Attention Is All You Need",
        "",
        "Natural Language Processing",
    )
    .await;

    let prompts = model.user_messages();
    assert_eq!(prompts.len(), 3);
    for prompt in &prompts {
        assert!(prompt.contains("Attention Is All You Need"));
    }

    assert!(
        text.starts_with("Current Task: Based on the topic explanation"),
        "unexpected report: {text}"
    );
}

#[tokio::test]
async fn test_agent_pipeline_feeds_answers_forward() {
    let model = Arc::new(EchoModel::default());
    let companion = companion_with_model(model.clone());

    let result = companion
        .run_analysis(&AnalysisRequest::new("BERT", "We introduce BERT.", "Machine Learning"))
        .await
        .unwrap();

    assert_eq!(result.task_outputs.len(), 3);
    let prompts = model.user_messages();
    assert!(prompts[1].contains("This is the context you're working with:"));
    assert!(prompts[2].contains(result.task_outputs[1].raw.lines().next().unwrap()));
}

#[tokio::test]
async fn test_agent_pipeline_model_error() {
    let model = Arc::new(EchoModel {
        fail_with: Some("OpenRouter API error (401): No auth credentials found".to_string()),
        ..EchoModel::default()
    });
    let companion = companion_with_model(model.clone());

    let text = handle_submit(&companion, "Attention Is All You Need", "", "").await;

    assert!(text.starts_with("Error analyzing paper: "), "unexpected text: {text}");
    assert!(text.contains("No auth credentials found"));
    assert_eq!(model.user_messages().len(), 1);
}
