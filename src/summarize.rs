//! Client for the remote summarization service.
//!
//! | Operation | Request | Body |
//! |-----------|---------|------|
//! | [`Summarizer::summarize_section`] | `POST {base}/summarize-section` | `{"content": …}` |
//! | [`Summarizer::summarize_document`] | `POST {base}/summarize-full` | `{"content": …, "title": …}` |
//!
//! The service answers `{"reply": "…"}` on success or
//! `{"error": "…", "details": "…"}` on failure. A non-2xx status or an
//! explicit `error` field becomes [`SummarizeError::Remote`]. Requests are
//! never retried; the caller decides whether to try again.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::SummarizerConfig;

#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("summarizer.base_url is not configured")]
    NotConfigured,
    #[error("{}", remote_message(.message, .details))]
    Remote {
        message: String,
        details: Option<String>,
    },
    #[error("summarization request failed: {0}")]
    Transport(String),
}

fn remote_message(message: &str, details: &Option<String>) -> String {
    match details.as_deref() {
        Some(d) if !d.is_empty() => format!("{}\n{}", message, d),
        _ => message.to_string(),
    }
}

/// Summarization service as seen by the digest commands.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize the body text of one section.
    async fn summarize_section(&self, content: &str) -> Result<String, SummarizeError>;

    /// Summarize a whole document from its (already truncated) text.
    async fn summarize_document(&self, title: &str, content: &str)
        -> Result<String, SummarizeError>;
}

#[derive(Serialize)]
struct SectionRequest<'a> {
    content: &'a str,
}

#[derive(Serialize)]
struct DocumentRequest<'a> {
    content: &'a str,
    title: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct Reply {
    #[serde(default)]
    reply: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

/// [`Summarizer`] speaking JSON over HTTP.
pub struct HttpSummarizer {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSummarizer {
    pub fn new(config: &SummarizerConfig) -> Result<Self, SummarizeError> {
        let base_url = config
            .base_url
            .as_deref()
            .ok_or(SummarizeError::NotConfigured)?
            .trim_end_matches('/')
            .to_string();

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SummarizeError::Transport(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    async fn post<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<String, SummarizeError> {
        let url = format!("{}/{}", self.base_url, path);
        debug!(url = %url, "summarization request");

        let response = self
            .client
            .post(&url)
            .header("Accept", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| SummarizeError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let reply: Reply = response.json().await.unwrap_or_default();
            return Err(SummarizeError::Remote {
                message: reply
                    .error
                    .unwrap_or_else(|| format!("service returned {}", status)),
                details: reply.details,
            });
        }

        let reply: Reply = response
            .json()
            .await
            .map_err(|e| SummarizeError::Transport(e.to_string()))?;
        into_summary(reply)
    }
}

fn into_summary(reply: Reply) -> Result<String, SummarizeError> {
    if let Some(message) = reply.error {
        return Err(SummarizeError::Remote {
            message,
            details: reply.details,
        });
    }
    reply.reply.ok_or_else(|| SummarizeError::Remote {
        message: "response has no reply".to_string(),
        details: None,
    })
}

#[async_trait]
impl Summarizer for HttpSummarizer {
    async fn summarize_section(&self, content: &str) -> Result<String, SummarizeError> {
        self.post("summarize-section", &SectionRequest { content })
            .await
    }

    async fn summarize_document(
        &self,
        title: &str,
        content: &str,
    ) -> Result<String, SummarizeError> {
        self.post("summarize-full", &DocumentRequest { content, title })
            .await
    }
}
