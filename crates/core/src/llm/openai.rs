use crate::config::Settings;
use crate::llm::error::LlmDiagnosticsError;
use crate::llm::{env_or, http_client, ChatMessage, GenerationParams, LlmClient, Provider};
use anyhow::Context;
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "gpt-4.1";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl OpenAiClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        Ok(Self {
            http: http_client("OPENAI_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?,
            api_key: settings.openai_api_key.clone(),
            base_url: env_or("OPENAI_BASE_URL", DEFAULT_BASE_URL),
            model: env_or("OPENAI_MODEL", DEFAULT_MODEL),
        })
    }

    fn request_body<'a>(
        &'a self,
        messages: &'a [ChatMessage],
        params: &'a GenerationParams,
    ) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &self.model,
            messages,
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            top_p: params.top_p,
            n: params.n,
            frequency_penalty: params.frequency_penalty,
            presence_penalty: params.presence_penalty,
            stop: params.stop.as_deref(),
        }
    }

    async fn create_completion(
        &self,
        req: &ChatCompletionRequest<'_>,
    ) -> anyhow::Result<(serde_json::Value, ChatCompletionResponse)> {
        let url = format!(
            "{}/v1/chat/completions",
            self.base_url.trim_end_matches('/')
        );

        let mut builder = self.http.post(url).json(req);
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let res = builder.send().await.context("OpenAI request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read OpenAI response body")?;
        if !status.is_success() {
            return Err(LlmDiagnosticsError::http(Provider::OpenAI, status, text).into());
        }

        let raw_json = serde_json::from_str::<serde_json::Value>(&text)
            .with_context(|| format!("failed to parse OpenAI response JSON: {text}"))?;
        let parsed = serde_json::from_value::<ChatCompletionResponse>(raw_json.clone())
            .context("failed to decode OpenAI response into ChatCompletionResponse")?;
        Ok((raw_json, parsed))
    }

    /// Choice texts in index order. Stops at the first choice without
    /// content so a refused or empty first choice is never replaced by a later one.
    fn completion_texts(res: &ChatCompletionResponse) -> Vec<String> {
        res.choices
            .iter()
            .map_while(|choice| {
                choice
                    .message
                    .content
                    .clone()
                    .filter(|text| !text.trim().is_empty())
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl LlmClient for OpenAiClient {
    fn provider(&self) -> Provider {
        Provider::OpenAI
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: &GenerationParams,
    ) -> anyhow::Result<Vec<String>> {
        let req = self.request_body(messages, params);
        let (raw_json, res) = self.create_completion(&req).await?;

        let texts = Self::completion_texts(&res);
        if texts.is_empty() {
            return Err(LlmDiagnosticsError::empty_completion(Provider::OpenAI, raw_json).into());
        }

        tracing::debug!(
            model = %self.model,
            completions = texts.len(),
            finish_reason = ?res.choices.first().and_then(|c| c.finish_reason.as_deref()),
            "OpenAI completion received"
        );
        Ok(texts)
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
    n: u32,
    frequency_penalty: f32,
    presence_penalty: f32,
    stop: Option<&'a [String]>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: ChoiceMessage,

    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}
