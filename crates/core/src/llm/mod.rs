pub mod anthropic;
pub mod error;
pub mod openai;

use anyhow::Context;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Anthropic,
    OpenAI,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Sampling settings sent with every completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub n: u32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
    pub stop: Option<Vec<String>>,
}

#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    fn provider(&self) -> Provider;

    /// Runs one chat completion and returns the generated texts in order.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: &GenerationParams,
    ) -> anyhow::Result<Vec<String>>;
}

/// Env override for a client setting; unset or blank values fall back to `default`.
pub(crate) fn env_or(var: &str, default: &str) -> String {
    std::env::var(var)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// reqwest client whose timeout can be tuned through `timeout_var`.
pub(crate) fn http_client(timeout_var: &str, default_secs: u64) -> anyhow::Result<reqwest::Client> {
    let timeout_secs = std::env::var(timeout_var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(default_secs);

    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .with_context(|| format!("failed to build http client ({timeout_var}={timeout_secs}s)"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_env_override_falls_back_to_default() {
        std::env::set_var("FINCHECK_TEST_BLANK_BASE_URL", "  ");
        assert_eq!(
            env_or("FINCHECK_TEST_BLANK_BASE_URL", "https://api.example.com"),
            "https://api.example.com"
        );

        std::env::set_var("FINCHECK_TEST_SET_BASE_URL", "http://localhost:8080");
        assert_eq!(
            env_or("FINCHECK_TEST_SET_BASE_URL", "https://api.example.com"),
            "http://localhost:8080"
        );
        assert_eq!(env_or("FINCHECK_TEST_UNSET_BASE_URL", "fallback"), "fallback");
    }
}
