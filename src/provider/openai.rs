// src/provider/openai.rs
//! OpenAI-compatible chat completions (OpenAI, DeepSeek, Groq, OpenRouter, Mistral).

use async_trait::async_trait;
use serde_json::Value;

use super::{
    build_http_client, non_empty_text, parse_body, require_key, send_for_body, ChatRequest,
    ProviderClient,
};
use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::prompt::Prompt;

#[derive(Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
}

impl OpenAiClient {
    pub fn new() -> Self {
        Self::with_http(build_http_client())
    }

    pub fn with_http(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl Default for OpenAiClient {
    fn default() -> Self {
        Self::new()
    }
}

/// `choices[0].message.content`, or legacy `choices[0].text`.
pub(crate) fn completion_text(v: &Value) -> Option<String> {
    let choice = v.get("choices")?.get(0)?;
    choice
        .pointer("/message/content")
        .and_then(Value::as_str)
        .or_else(|| choice.get("text").and_then(Value::as_str))
        .map(str::to_string)
}

#[async_trait]
impl ProviderClient for OpenAiClient {
    async fn complete(
        &self,
        prompt: &Prompt,
        config: &ProviderConfig,
    ) -> Result<String, ProviderError> {
        let key = require_key(config)?;
        let body = ChatRequest::single_user(prompt, config);
        let request = self
            .http
            .post(&config.endpoint)
            .bearer_auth(key)
            .timeout(config.timeout)
            .json(&body);

        let raw = send_for_body(request).await?;
        let value = parse_body(&raw)?;
        let text = completion_text(&value)
            .ok_or_else(|| ProviderError::malformed("no choices[0].message.content in response"))?;
        non_empty_text(text)
    }

    fn vendor(&self) -> &'static str {
        "openai"
    }
}
