//! Insight summaries.
//!
//! Statistics gathered by the API are rendered into a prompt ([`prompts`]) and sent to
//! an [`InsightProvider`]. Provider failures never reach the caller: after a bounded
//! timeout and one retry the [`InsightSummarizer`] answers with the deterministic
//! template from [`fallback`] built from the same statistics.

#[cfg(feature = "llm")]
mod client;
pub mod fallback;
pub mod prompts;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use taskhive_core::models::{
    DashboardStats, ProjectCompletion, ProjectDigest, ProjectStats, Role, TaskDigest,
    TeamLeadStats,
};
use taskhive_core::Config;

#[cfg(feature = "llm")]
pub use client::ChatCompletionsClient;

/// Attempts per summary before falling back (first call plus one retry).
const MAX_ATTEMPTS: u32 = 2;

/// A chat-style completion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsightRequest {
    pub system: String,
    pub prompt: String,
}

/// Text-completion backend used to phrase insight summaries.
#[async_trait]
pub trait InsightProvider: Send + Sync {
    /// Provider/model label used in logs
    fn name(&self) -> &str;

    /// Return the completion text for `request`.
    async fn complete(&self, request: &InsightRequest) -> anyhow::Result<String>;
}

/// What the dashboard summary is built from.
#[derive(Debug, Clone, Copy)]
pub struct DashboardInput<'a> {
    pub user_name: &'a str,
    pub role: Role,
    pub stats: &'a DashboardStats,
    pub projects: &'a [ProjectDigest],
    pub tasks: &'a [TaskDigest],
}

/// What a single project's summary is built from.
#[derive(Debug, Clone, Copy)]
pub struct ProjectInput<'a> {
    pub title: &'a str,
    pub assigned_to: Option<&'a str>,
    pub assigned_to_role: Option<Role>,
    pub viewer_role: Role,
    pub stats: &'a ProjectStats,
    pub tasks: &'a [TaskDigest],
}

#[derive(Debug, Clone, Copy)]
pub struct TeamLeadInput<'a> {
    pub lead_name: &'a str,
    pub stats: &'a TeamLeadStats,
    pub projects: &'a [ProjectCompletion],
}

/// Input for a stored project summary (progress, highlights, blockers).
#[derive(Debug, Clone, Copy)]
pub struct ProjectSummaryInput<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub tasks: &'a [TaskDigest],
}

/// Calls the provider with a hard timeout and one retry, then falls back to templates.
#[derive(Clone)]
pub struct InsightSummarizer {
    provider: Option<Arc<dyn InsightProvider>>,
    timeout: Duration,
}

impl InsightSummarizer {
    pub fn new(provider: Option<Arc<dyn InsightProvider>>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    /// Summarizer with no provider; every summary is the templated fallback.
    pub fn templated() -> Self {
        Self::new(None, Duration::from_secs(1))
    }

    /// Build from config. Without `LLM_API_KEY` only the fallback templates are used.
    pub fn from_config(config: &Config) -> Self {
        let provider = provider_from_config(config);
        match &provider {
            Some(p) => tracing::info!(provider = %p.name(), "Insight provider enabled"),
            None => tracing::info!("No insight provider configured, using templated summaries"),
        }
        Self::new(provider, config.llm_timeout())
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    pub async fn dashboard(&self, input: &DashboardInput<'_>) -> String {
        self.summarize("dashboard", prompts::dashboard(input), || {
            fallback::dashboard(input)
        })
        .await
    }

    pub async fn project(&self, input: &ProjectInput<'_>) -> String {
        self.summarize("project", prompts::project(input), || fallback::project(input))
            .await
    }

    pub async fn team_lead(&self, input: &TeamLeadInput<'_>) -> String {
        self.summarize("team_lead", prompts::team_lead(input), || {
            fallback::team_lead(input)
        })
        .await
    }

    pub async fn project_summary(&self, input: &ProjectSummaryInput<'_>) -> String {
        self.summarize("project_summary", prompts::project_summary(input), || {
            fallback::project_summary(input)
        })
        .await
    }

    /// Ask the provider for a summary; on timeout, error or empty text use `fallback`.
    #[tracing::instrument(skip(self, request, fallback))]
    pub async fn summarize<F>(&self, kind: &'static str, request: InsightRequest, fallback: F) -> String
    where
        F: FnOnce() -> String,
    {
        let Some(provider) = &self.provider else {
            return fallback();
        };

        for attempt in 1..=MAX_ATTEMPTS {
            match tokio::time::timeout(self.timeout, provider.complete(&request)).await {
                Ok(Ok(text)) => {
                    let text = text.trim();
                    if !text.is_empty() {
                        tracing::debug!(attempt, provider = %provider.name(), "Insight generated");
                        return text.to_string();
                    }
                    tracing::warn!(attempt, provider = %provider.name(), "Insight provider returned empty content");
                }
                Ok(Err(e)) => {
                    tracing::warn!(attempt, provider = %provider.name(), error = %e, "Insight provider failed");
                }
                Err(_) => {
                    tracing::warn!(
                        attempt,
                        provider = %provider.name(),
                        timeout_secs = self.timeout.as_secs_f64(),
                        "Insight provider timed out"
                    );
                }
            }
        }

        tracing::info!("Falling back to templated insight");
        fallback()
    }
}

#[cfg(feature = "llm")]
fn provider_from_config(config: &Config) -> Option<Arc<dyn InsightProvider>> {
    let key = config.llm_api_key()?;
    match ChatCompletionsClient::new(
        key.to_string(),
        config.llm_api_base().to_string(),
        config.llm_model().to_string(),
        config.llm_timeout(),
    ) {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            tracing::error!(error = %e, "Failed to build insight provider client");
            None
        }
    }
}

#[cfg(not(feature = "llm"))]
fn provider_from_config(_config: &Config) -> Option<Arc<dyn InsightProvider>> {
    None
}
