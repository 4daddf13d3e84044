use crate::config::ModelConfig;
use crate::domain::model::Credentials;
use crate::utils::error::{Result, ScanError};
use crate::utils::retry::{with_retry, RetryPolicy};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::time::Duration;

pub const KEY_NOT_SET: &str = "OpenAI API key not set.";
pub const REQUEST_FAILED: &str = "Error in OpenAI API request.";
pub const NO_ANALYSIS: &str = "No analysis available.";

/// 把錯誤對應到固定的 sentinel 字串
pub fn sentinel_for(error: &ScanError) -> &'static str {
    match error {
        ScanError::ConfigurationMissing { .. } => KEY_NOT_SET,
        ScanError::Transport(_) => REQUEST_FAILED,
        _ => NO_ANALYSIS,
    }
}

/// 語言模型 chat completion 客戶端
pub struct ContractAnalyzer {
    client: Client,
    endpoint: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    max_source_chars: usize,
    system_prompt: String,
    retry: RetryPolicy,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ReplyMessage>,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ContractAnalyzer {
    pub fn new(config: &ModelConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            max_source_chars: config.max_source_chars,
            system_prompt: config.system_prompt.clone(),
            retry: RetryPolicy::new(config.retry_attempts, config.retry_delay_ms),
        })
    }

    /// 回傳模型的分析文字；失敗時回傳 sentinel 字串
    pub async fn analyze(&self, credentials: &Credentials, source_code: &str) -> String {
        match self.try_analyze(credentials, source_code).await {
            Ok(analysis) => analysis,
            Err(e) => {
                tracing::warn!("⚠️ Contract analysis failed: {}", e);
                sentinel_for(&e).to_string()
            }
        }
    }

    pub async fn try_analyze(&self, credentials: &Credentials, source_code: &str) -> Result<String> {
        let api_key = credentials
            .llm_key()
            .ok_or_else(|| ScanError::missing("llm_api_key"))?;

        let source = truncate_source(source_code, self.max_source_chars);
        if matches!(source, Cow::Owned(_)) {
            tracing::warn!(
                "✂️ Source truncated from {} to {} chars before analysis",
                source_code.chars().count(),
                self.max_source_chars
            );
        }

        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &self.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &source,
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        tracing::debug!(
            "Submitting {} chars to {}",
            source.chars().count(),
            self.endpoint
        );
        let reply = with_retry(self.retry, "model chat completion", || {
            self.post(api_key, &request)
        })
        .await?;

        reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| ScanError::upstream("model reply contained no content"))
    }

    async fn post(&self, api_key: &str, request: &ChatRequest<'_>) -> Result<ChatResponse> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("Model response status: {}", status);
        if !status.is_success() {
            return Err(ScanError::upstream(format!("model service returned {}", status)));
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| ScanError::upstream(format!("unreadable model response: {}", e)))
    }
}

/// 超過上限時在字元邊界截斷
fn truncate_source(source: &str, max_chars: usize) -> Cow<'_, str> {
    match source.char_indices().nth(max_chars) {
        Some((byte_index, _)) => Cow::Owned(source[..byte_index].to_string()),
        None => Cow::Borrowed(source),
    }
}
