//! Summarization for working-buffer compaction
//!
//! TigerStyle: Explicit configuration, OpenAI-compatible API support.
//!
//! Compaction hands the oldest turns to a [`Summarizer`] and stores the
//! result in the episodic log. The trait keeps the store testable without
//! network access; [`LlmSummarizer`] is the real implementation and
//! [`StaticSummarizer`] the deterministic stand-in.

use crate::error::{MemoryError, MemoryResult};
use crate::working::TurnMessage;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::env;
use tracing::instrument;

/// Environment variable overriding the summarization model
pub const ENV_MODEL: &str = "SELKIE_MODEL";

/// Max tokens requested for a summary
const SUMMARY_TOKENS_MAX: u32 = 512;

const SUMMARY_SYSTEM_PROMPT: &str = "You compress conversation history. Summarize the \
transcript below into a short paragraph preserving names, decisions, preferences, and \
open tasks. Output only the summary.";

const FACTS_SYSTEM_PROMPT: &str = "Extract durable facts about the user or the task from \
the transcript below: stable preferences, identities, decisions. Output one fact per \
line, each starting with \"- \". Output nothing else. If there are no durable facts, \
output an empty response.";

/// Produces summaries and durable facts from conversation turns
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Condense the given turns into a short summary
    async fn summarize(&self, messages: &[TurnMessage]) -> MemoryResult<String>;

    /// Pull durable facts worth keeping long-term out of the turns
    ///
    /// The default keeps nothing; only implementations with a model behind
    /// them can judge durability.
    async fn extract_facts(&self, _messages: &[TurnMessage]) -> MemoryResult<Vec<String>> {
        Ok(Vec::new())
    }
}

/// Render turns as a plain transcript for prompting
pub fn format_transcript(messages: &[TurnMessage]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse "- fact" lines out of a model response
pub fn parse_fact_lines(response: &str) -> Vec<String> {
    response
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            line.strip_prefix("- ")
                .or_else(|| line.strip_prefix("* "))
                .map(|fact| fact.trim().to_string())
        })
        .filter(|fact| !fact.is_empty())
        .collect()
}

/// Summarizer provider configuration
#[derive(Debug, Clone)]
pub struct SummarizerConfig {
    /// API base URL
    pub base_url: String,
    /// API key
    pub api_key: String,
    /// Model to use
    pub model: String,
    /// Max tokens in a response
    pub max_tokens: u32,
}

impl SummarizerConfig {
    /// Create config from environment variables
    ///
    /// Supports:
    /// - ANTHROPIC_API_KEY (Anthropic messages API)
    /// - OPENAI_API_KEY + OPENAI_BASE_URL (chat completions)
    ///
    /// `SELKIE_MODEL` overrides the per-provider default model.
    pub fn from_env() -> Option<Self> {
        if let Ok(api_key) = env::var("ANTHROPIC_API_KEY") {
            return Some(Self {
                base_url: "https://api.anthropic.com/v1".to_string(),
                api_key,
                model: env::var(ENV_MODEL)
                    .unwrap_or_else(|_| "claude-sonnet-4-20250514".to_string()),
                max_tokens: SUMMARY_TOKENS_MAX,
            });
        }

        if let Ok(api_key) = env::var("OPENAI_API_KEY") {
            return Some(Self {
                base_url: env::var("OPENAI_BASE_URL")
                    .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
                api_key,
                model: env::var(ENV_MODEL).unwrap_or_else(|_| "gpt-4o-mini".to_string()),
                max_tokens: SUMMARY_TOKENS_MAX,
            });
        }

        None
    }

    /// Check if using the Anthropic API
    pub fn is_anthropic(&self) -> bool {
        self.base_url.contains("anthropic.com")
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    system: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    #[serde(default)]
    text: Option<String>,
}

/// LLM-backed summarizer
pub struct LlmSummarizer {
    client: reqwest::Client,
    config: SummarizerConfig,
}

impl std::fmt::Debug for LlmSummarizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmSummarizer")
            .field("base_url", &self.config.base_url)
            .field("model", &self.config.model)
            .finish()
    }
}

impl LlmSummarizer {
    /// Create with an explicit configuration
    pub fn new(config: SummarizerConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Create from environment variables, `None` if no provider key is set
    pub fn from_env() -> Option<Self> {
        SummarizerConfig::from_env().map(Self::new)
    }

    #[instrument(skip(self, system, transcript))]
    async fn complete(&self, system: &str, transcript: &str) -> MemoryResult<String> {
        if self.config.is_anthropic() {
            self.complete_anthropic(system, transcript).await
        } else {
            self.complete_openai(system, transcript).await
        }
    }

    async fn complete_anthropic(&self, system: &str, transcript: &str) -> MemoryResult<String> {
        let request = AnthropicRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: transcript,
            }],
            max_tokens: self.config.max_tokens,
            system,
        };

        let response = self
            .client
            .post(format!("{}/messages", self.config.base_url))
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&request)
            .send()
            .await
            .map_err(|e| MemoryError::summarization(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MemoryError::summarization(format!(
                "provider returned {}: {}",
                status, body
            )));
        }

        let parsed: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| MemoryError::summarization(format!("malformed response: {}", e)))?;

        parsed
            .content
            .into_iter()
            .find_map(|c| c.text)
            .map(|text| text.trim().to_string())
            .ok_or_else(|| MemoryError::summarization("provider returned no text"))
    }

    async fn complete_openai(&self, system: &str, transcript: &str) -> MemoryResult<String> {
        let request = ChatCompletionRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: transcript,
                },
            ],
            max_tokens: self.config.max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| MemoryError::summarization(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MemoryError::summarization(format!(
                "provider returned {}: {}",
                status, body
            )));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| MemoryError::summarization(format!("malformed response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .ok_or_else(|| MemoryError::summarization("provider returned no choices"))
    }
}

#[async_trait]
impl Summarizer for LlmSummarizer {
    async fn summarize(&self, messages: &[TurnMessage]) -> MemoryResult<String> {
        if messages.is_empty() {
            return Err(MemoryError::summarization("nothing to summarize"));
        }
        let transcript = format_transcript(messages);
        let summary = self.complete(SUMMARY_SYSTEM_PROMPT, &transcript).await?;
        if summary.is_empty() {
            return Err(MemoryError::summarization("provider returned an empty summary"));
        }
        Ok(summary)
    }

    async fn extract_facts(&self, messages: &[TurnMessage]) -> MemoryResult<Vec<String>> {
        if messages.is_empty() {
            return Ok(Vec::new());
        }
        let transcript = format_transcript(messages);
        let response = self.complete(FACTS_SYSTEM_PROMPT, &transcript).await?;
        Ok(parse_fact_lines(&response))
    }
}

/// Deterministic summarizer for tests and offline use
///
/// Summaries are a fixed-prefix digest of the turns; facts are whatever
/// the constructor was given.
#[derive(Debug, Clone, Default)]
pub struct StaticSummarizer {
    facts: Vec<String>,
}

impl StaticSummarizer {
    /// Create a summarizer that extracts no facts
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a summarizer that always extracts the given facts
    pub fn with_facts(facts: Vec<String>) -> Self {
        Self { facts }
    }
}

#[async_trait]
impl Summarizer for StaticSummarizer {
    async fn summarize(&self, messages: &[TurnMessage]) -> MemoryResult<String> {
        if messages.is_empty() {
            return Err(MemoryError::summarization("nothing to summarize"));
        }
        let first = &messages[0].content;
        let head: String = first.chars().take(60).collect();
        Ok(format!(
            "Conversation summary ({} turns, starting: {})",
            messages.len(),
            head
        ))
    }

    async fn extract_facts(&self, _messages: &[TurnMessage]) -> MemoryResult<Vec<String>> {
        Ok(self.facts.clone())
    }
}

/// Summarizer that always fails, for exercising skip paths in tests
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct FailingSummarizer;

#[cfg(test)]
#[async_trait]
impl Summarizer for FailingSummarizer {
    async fn summarize(&self, _messages: &[TurnMessage]) -> MemoryResult<String> {
        Err(MemoryError::summarization("provider unavailable"))
    }
}
