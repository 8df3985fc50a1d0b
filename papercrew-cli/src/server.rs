//! Web form server
//!
//! Serves the analysis form and a small JSON API on top of
//! [`handle_submit`]. Every analysis outcome, including failures, is shown
//! as text, so the analysis endpoints always answer 200.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Form, Query, State};
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use papercrew_core::companion::{EXAMPLES, ResearchPaperCompanion, handle_submit};

#[derive(Clone)]
pub struct ServerState {
    pub companion: Arc<ResearchPaperCompanion>,
    pub model_name: String,
}

/// Form fields, shared by the HTML form, the JSON API and example links
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AnalyzeInput {
    #[serde(default)]
    pub title: String,
    #[serde(default, rename = "abstract")]
    pub abstract_text: String,
    #[serde(default)]
    pub research_area: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub result: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub model: String,
}

pub async fn handle_index(Query(input): Query<AnalyzeInput>) -> Html<String> {
    Html(render_page(&input, None))
}

pub async fn handle_analyze_form(
    State(state): State<Arc<ServerState>>,
    Form(input): Form<AnalyzeInput>,
) -> Html<String> {
    let result = run(&state, &input).await;
    Html(render_page(&input, Some(&result)))
}

pub async fn handle_api_analyze(
    State(state): State<Arc<ServerState>>,
    Json(input): Json<AnalyzeInput>,
) -> Json<AnalyzeResponse> {
    let result = run(&state, &input).await;
    Json(AnalyzeResponse { result })
}

pub async fn handle_api_examples() -> Json<Vec<AnalyzeInput>> {
    Json(
        EXAMPLES
            .iter()
            .map(|(title, abstract_text, research_area)| AnalyzeInput {
                title: title.to_string(),
                abstract_text: abstract_text.to_string(),
                research_area: research_area.to_string(),
            })
            .collect(),
    )
}

pub async fn handle_health(State(state): State<Arc<ServerState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: papercrew_core::VERSION,
        model: state.model_name.clone(),
    })
}

async fn run(state: &ServerState, input: &AnalyzeInput) -> String {
    handle_submit(
        &state.companion,
        &input.title,
        &input.abstract_text,
        &input.research_area,
    )
    .await
}

pub fn build_router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/", get(handle_index))
        .route("/analyze", post(handle_analyze_form))
        .route("/api/analyze", post(handle_api_analyze))
        .route("/api/examples", get(handle_api_examples))
        .route("/healthz", get(handle_health))
        .with_state(state)
}

pub async fn run_server(state: ServerState, host: &str, port: u16) -> Result<()> {
    let addr = format!("{host}:{port}")
        .parse::<SocketAddr>()
        .with_context(|| format!("invalid server bind address '{}:{}'", host, port))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(%addr, model = %state.model_name, "Research Paper Companion listening");
    println!("AI Research Paper Companion running on http://{addr}");

    axum::serve(listener, build_router(Arc::new(state)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server runtime failed")
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => { tracing::info!("Received Ctrl+C, shutting down gracefully"); }
        _ = terminate => { tracing::info!("Received SIGTERM, shutting down gracefully"); }
    }
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Percent-encode a query parameter value.
fn render_examples() -> String {
    EXAMPLES
        .iter()
        .map(|(title, abstract_text, area)| {
            format!(
                "<tr><td><a href=\"/?title={}&amp;abstract={}&amp;research_area={}\">{}</a></td><td>{}</td></tr>",
                urlencoding::encode(title),
                urlencoding::encode(abstract_text),
                urlencoding::encode(area),
                escape_html(title),
                escape_html(area),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render the form page, keeping `input` in the fields.
pub fn render_page(input: &AnalyzeInput, result: Option<&str>) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>AI Research Paper Companion</title>
<style>
body {{ font-family: sans-serif; max-width: 1100px; margin: 2rem auto; padding: 0 1rem; }}
.columns {{ display: flex; gap: 2rem; }}
.columns > div {{ flex: 1; }}
label {{ display: block; font-weight: bold; margin-top: 1rem; }}
textarea, input[type=text] {{ width: 100%; box-sizing: border-box; }}
button {{ margin-top: 1rem; padding: 0.5rem 1rem; }}
</style>
</head>
<body>
<h1>&#128300; AI Research Paper Companion</h1>
<p>Get comprehensive analysis of research papers with topic explanations, literature reviews, and gap analysis.</p>
<div class="columns">
<div>
<form method="post" action="/analyze">
<label for="title">Paper Title</label>
<textarea id="title" name="title" rows="2" placeholder="Enter the research paper title..." required>{title}</textarea>
<label for="abstract">Paper Abstract (Optional)</label>
<textarea id="abstract" name="abstract" rows="5" placeholder="Paste the paper abstract here...">{abstract_text}</textarea>
<label for="research_area">Research Area (Optional)</label>
<input type="text" id="research_area" name="research_area" placeholder="e.g., Machine Learning, Natural Language Processing..." value="{research_area}">
<button type="submit">&#128269; Analyze Paper</button>
</form>
</div>
<div>
<label for="output">Analysis Results</label>
<textarea id="output" rows="20" readonly>{output}</textarea>
</div>
</div>
<h2>Examples</h2>
<table>
<tr><th>Paper Title</th><th>Research Area</th></tr>
{examples}
</table>
</body>
</html>
"#,
        title = escape_html(&input.title),
        abstract_text = escape_html(&input.abstract_text),
        research_area = escape_html(&input.research_area),
        output = escape_html(result.unwrap_or_default()),
        examples = render_examples(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use papercrew_core::roles::RoleCatalog;
    use papercrew_core::workflow::{
        TaskExecutor, TaskKind, TaskOutput, TaskSpec, WorkflowError, WorkflowResult,
    };
    use std::sync::Mutex;
    use tower::ServiceExt;

    #[derive(Default)]
    struct StubExecutor {
        calls: Mutex<usize>,
        fail: bool,
    }

    #[async_trait]
    impl TaskExecutor for StubExecutor {
        async fn execute(&self, task: &TaskSpec) -> WorkflowResult<TaskOutput> {
            *self.calls.lock().unwrap() += 1;
            if self.fail {
                return Err(WorkflowError::Capability("quota exceeded".to_string()));
            }
            let text = match task.kind {
                TaskKind::AnalyzeGaps => "Gaps: <none>".to_string(),
                other => format!("{other} output"),
            };
            Ok(TaskOutput::new(task, text))
        }
    }

    fn app(executor: Arc<StubExecutor>) -> Router {
        build_router(Arc::new(ServerState {
            companion: Arc::new(ResearchPaperCompanion::new(RoleCatalog::standard(), executor)),
            model_name: "test-model".to_string(),
        }))
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_index_renders_form_and_examples() {
        let response = app(Arc::new(StubExecutor::default()))
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        assert!(html.contains("AI Research Paper Companion"));
        assert!(html.contains("name=\"title\""));
        assert!(html.contains("Attention Is All You Need"));
        assert!(html.contains("Deep Residual Learning for Image Recognition"));
    }

    #[tokio::test]
    async fn test_index_prefills_from_query() {
        let response = app(Arc::new(StubExecutor::default()))
            .oneshot(
                Request::builder()
                    .uri("/?title=Attention+Is+All+You+Need&research_area=NLP")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let html = body_string(response).await;
        assert!(html.contains("required>Attention Is All You Need</textarea>"));
        assert!(html.contains("value=\"NLP\""));
    }

    #[tokio::test]
    async fn test_form_submit_shows_result_and_keeps_inputs() {
        let executor = Arc::new(StubExecutor::default());
        let response = app(executor.clone())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/analyze")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("title=BERT&abstract=&research_area=Machine+Learning"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        assert!(html.contains("readonly>Gaps: &lt;none&gt;</textarea>"));
        assert!(html.contains("value=\"Machine Learning\""));
        assert_eq!(*executor.calls.lock().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_api_blank_title() {
        let executor = Arc::new(StubExecutor::default());
        let response = app(executor.clone())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/analyze")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"title": "  "}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: AnalyzeResponse = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body.result, "Please provide a paper title.");
        assert_eq!(*executor.calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_api_failure_is_in_band() {
        let executor = Arc::new(StubExecutor {
            fail: true,
            ..StubExecutor::default()
        });
        let response = app(executor)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/analyze")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"title": "BERT", "research_area": "ML"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: AnalyzeResponse = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body.result, "Error analyzing paper: quota exceeded");
    }

    #[tokio::test]
    async fn test_api_examples() {
        let response = app(Arc::new(StubExecutor::default()))
            .oneshot(Request::builder().uri("/api/examples").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let rows: Vec<serde_json::Value> =
            serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2]["research_area"], "Computer Vision");
        assert_eq!(rows[0]["abstract"], "");
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(Arc::new(StubExecutor::default()))
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["model"], "test-model");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">&'"#),
            "&lt;a href=&quot;x&quot;&gt;&amp;&#39;"
        );
    }

    #[test]
    fn test_example_links_are_query_encoded() {
        let html = render_examples();
        assert!(html.contains("/?title=Attention%20Is%20All%20You%20Need&amp;abstract=&amp;research_area=Natural%20Language%20Processing"));
        assert!(html.contains("title=BERT%3A%20Pre-training"));
    }
}
