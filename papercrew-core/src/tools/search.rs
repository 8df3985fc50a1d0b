//! Web search capability
//!
//! [`SerperSearchTool`] queries the Serper Google Search API. Agents see the
//! tool through the [`SearchTool`] trait so tests can substitute a fake.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{SERPER_API_KEY_VAR, SearchSettings};
use crate::error::{CompanionError, Result};

/// A single search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Search the web for a query
#[async_trait]
pub trait SearchTool: Send + Sync {
    /// Tool name as shown to the model
    fn name(&self) -> &str {
        "web_search"
    }

    /// Tool description as shown to the model
    fn description(&self) -> &str {
        "Search the web for a query and return the top results with titles, links and snippets"
    }

    /// Run a search
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>>;
}

/// Render results as an observation for the model.
pub fn format_results(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return "No results found.".to_string();
    }

    results
        .iter()
        .map(|r| format!("Title: {}\nLink: {}\nSnippet: {}\n---", r.title, r.url, r.snippet))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Serper (google.serper.dev) search tool
pub struct SerperSearchTool {
    client: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
    num_results: usize,
}

impl SerperSearchTool {
    /// Create from configuration. A missing key fails on the first search.
    pub fn from_settings(settings: &SearchSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: settings.api_key.clone(),
            endpoint: settings.endpoint.clone(),
            num_results: settings.num_results.max(1),
        }
    }
}

#[derive(Serialize)]
struct SerperRequest<'a> {
    q: &'a str,
    num: usize,
}

#[derive(Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SerperOrganic>,
}

#[derive(Deserialize)]
struct SerperOrganic {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}

fn parse_serper_response(body: &str, limit: usize) -> Result<Vec<SearchResult>> {
    let response: SerperResponse = serde_json::from_str(body)
        .map_err(|e| CompanionError::Search(format!("Failed to parse Serper response: {}", e)))?;

    Ok(response
        .organic
        .into_iter()
        .filter(|r| !r.link.is_empty())
        .take(limit)
        .map(|r| SearchResult {
            title: r.title,
            url: r.link,
            snippet: r.snippet,
        })
        .collect())
}

#[async_trait]
impl SearchTool for SerperSearchTool {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            CompanionError::Configuration(format!(
                "{} environment variable not set",
                SERPER_API_KEY_VAR
            ))
        })?;

        tracing::debug!(query = %query, "Searching the web");

        let response = self
            .client
            .post(&self.endpoint)
            .header("X-API-KEY", api_key)
            .json(&SerperRequest {
                q: query,
                num: self.num_results,
            })
            .send()
            .await
            .map_err(|e| CompanionError::Search(format!("Failed to send search request: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| CompanionError::Search(format!("Failed to read search response: {}", e)))?;

        if !status.is_success() {
            return Err(CompanionError::Search(format!(
                "Serper API error ({}): {}",
                status, text
            )));
        }

        parse_serper_response(&text, self.num_results)
    }
}
