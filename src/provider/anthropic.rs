// src/provider/anthropic.rs
//! Anthropic Messages API client.

use async_trait::async_trait;
use serde_json::Value;

use super::{
    build_http_client, non_empty_text, parse_body, require_key, send_for_body, ChatRequest,
    ProviderClient,
};
use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::prompt::Prompt;

pub const API_VERSION: &str = "2023-06-01";

#[derive(Clone)]
pub struct AnthropicClient {
    http: reqwest::Client,
}

impl AnthropicClient {
    pub fn new() -> Self {
        Self::with_http(build_http_client())
    }

    pub fn with_http(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl Default for AnthropicClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Concatenate all `content[*]` blocks of type "text".
pub(crate) fn message_text(v: &Value) -> Option<String> {
    let blocks = v.get("content")?.as_array()?;
    let parts: Vec<&str> = blocks
        .iter()
        .filter(|b| b.get("type").and_then(Value::as_str) == Some("text"))
        .filter_map(|b| b.get("text").and_then(Value::as_str))
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.concat())
    }
}

#[async_trait]
impl ProviderClient for AnthropicClient {
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
            .header("x-api-key", key)
            .header("anthropic-version", API_VERSION)
            .timeout(config.timeout)
            .json(&body);

        let raw = send_for_body(request).await?;
        let value = parse_body(&raw)?;
        let text = message_text(&value)
            .ok_or_else(|| ProviderError::malformed("no text content blocks in response"))?;
        non_empty_text(text)
    }

    fn vendor(&self) -> &'static str {
        "anthropic"
    }
}
