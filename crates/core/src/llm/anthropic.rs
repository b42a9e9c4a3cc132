use crate::config::Settings;
use crate::llm::error::LlmDiagnosticsError;
use crate::llm::{env_or, http_client, ChatMessage, GenerationParams, LlmClient, Provider, Role};
use anyhow::Context;
use serde::{Deserialize, Serialize};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_MODEL: &str = "claude-sonnet-4-5";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl AnthropicClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        Ok(Self {
            http: http_client("ANTHROPIC_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?,
            api_key: settings.anthropic_api_key.clone(),
            base_url: env_or("ANTHROPIC_BASE_URL", DEFAULT_BASE_URL),
            model: env_or("ANTHROPIC_MODEL", DEFAULT_MODEL),
        })
    }

    async fn create_message(
        &self,
        req: &CreateMessageRequest,
    ) -> anyhow::Result<(serde_json::Value, CreateMessageResponse)> {
        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));
        let mut builder = self
            .http
            .post(url)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(req);
        if let Some(api_key) = &self.api_key {
            builder = builder.header("x-api-key", api_key);
        }

        let res = builder.send().await.context("Anthropic request failed")?;
        let status = res.status();
        let body = res
            .text()
            .await
            .context("failed to read Anthropic response body")?;
        if !status.is_success() {
            return Err(LlmDiagnosticsError::http(Provider::Anthropic, status, body).into());
        }

        let raw_json = serde_json::from_str::<serde_json::Value>(&body)
            .with_context(|| format!("Anthropic response is not JSON: {body}"))?;
        let parsed = CreateMessageResponse::deserialize(&raw_json)
            .context("unexpected Anthropic messages response shape")?;
        Ok((raw_json, parsed))
    }

    /// Maps chat messages onto the messages API: system turns become the
    /// top-level `system` field, everything else keeps its order. Only
    /// `temperature` is forwarded; the API rejects it combined with `top_p`.
    fn request_body(&self, messages: &[ChatMessage], params: &GenerationParams) -> CreateMessageRequest {
        let system: Vec<&str> = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect();

        let turns = messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| Message {
                role: if m.role == Role::Assistant {
                    "assistant"
                } else {
                    "user"
                },
                content: m.content.clone(),
            })
            .collect();

        CreateMessageRequest {
            model: self.model.clone(),
            max_tokens: params.max_tokens,
            system: (!system.is_empty()).then(|| system.join("\n\n")),
            messages: turns,
            temperature: Some(params.temperature),
            stop_sequences: params.stop.clone(),
        }
    }

    fn response_text(res: &CreateMessageResponse) -> String {
        let mut out = String::new();
        for block in &res.content {
            match block {
                ContentBlock::Text { text } => {
                    if !out.is_empty() {
                        out.push('\n');
                    }
                    out.push_str(text);
                }
                ContentBlock::Unknown => {
                    // Thinking and tool blocks carry no narrative text.
                }
            }
        }
        out
    }
}

#[async_trait::async_trait]
impl LlmClient for AnthropicClient {
    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: &GenerationParams,
    ) -> anyhow::Result<Vec<String>> {
        if params.n > 1 {
            tracing::debug!(n = params.n, "Anthropic returns a single completion; ignoring n");
        }

        let req = self.request_body(messages, params);
        let (raw_json, res) = self.create_message(&req).await?;

        if matches!(res.stop_reason.as_deref(), Some("max_tokens")) {
            tracing::warn!(
                max_tokens = params.max_tokens,
                "Anthropic stop_reason=max_tokens; narrative may be truncated"
            );
        }

        let text = Self::response_text(&res);
        if text.trim().is_empty() {
            return Err(LlmDiagnosticsError::empty_completion(Provider::Anthropic, raw_json).into());
        }
        Ok(vec![text])
    }
}

#[derive(Debug, Clone, Serialize)]
struct CreateMessageRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Message>,

    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_sequences: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct CreateMessageResponse {
    content: Vec<ContentBlock>,

    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },

    #[serde(other)]
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> AnthropicClient {
        AnthropicClient {
            http: reqwest::Client::new(),
            api_key: Some("key".to_string()),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    fn params() -> GenerationParams {
        GenerationParams {
            max_tokens: 2000,
            temperature: 0.2,
            top_p: 0.2,
            n: 1,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            stop: None,
        }
    }

    #[test]
    fn folds_system_messages_into_system_field() {
        let messages = vec![
            ChatMessage::system("expert"),
            ChatMessage::user("part one"),
            ChatMessage::user("part two"),
        ];

        let v = serde_json::to_value(client().request_body(&messages, &params())).unwrap();
        assert_eq!(v["system"], json!("expert"));
        assert_eq!(v["messages"].as_array().unwrap().len(), 2);
        assert_eq!(v["messages"][0], json!({"role": "user", "content": "part one"}));
        assert_eq!(v["messages"][1]["content"], json!("part two"));
        assert_eq!(v["max_tokens"], json!(2000));
        assert!(v.get("stop_sequences").is_none());
        assert!(v.get("n").is_none());
    }

    #[test]
    fn sends_temperature_without_top_p() {
        let messages = vec![ChatMessage::system("expert"), ChatMessage::user("go")];
        let req = client().request_body(&messages, &crate::narrative::generation_params());

        let v = serde_json::to_value(&req).unwrap();
        assert!(v["temperature"].is_number());
        assert!(v.get("top_p").is_none());
        assert_eq!(v["model"], json!(DEFAULT_MODEL));
    }

    #[test]
    fn joins_text_blocks_and_skips_others() {
        let res: CreateMessageResponse = serde_json::from_value(json!({
            "content": [
                {"type": "thinking", "thinking": "...", "signature": "sig"},
                {"type": "text", "text": "Liquidity is strong."},
                {"type": "server_tool_use", "id": "x"},
                {"type": "text", "text": "Leverage is moderate."}
            ],
            "stop_reason": "end_turn"
        }))
        .unwrap();

        assert_eq!(
            AnthropicClient::response_text(&res),
            "Liquidity is strong.\nLeverage is moderate."
        );
    }
}
