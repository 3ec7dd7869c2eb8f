// src/provider/mod.rs
//! Provider abstraction: one client per LLM vendor behind a uniform `complete` call.
//!
//! Clients are stateless apart from their pooled HTTP connection; the per-run
//! `ProviderConfig` carries endpoint, key, model and sampling limits.

pub mod anthropic;
pub mod mock;
pub mod openai;

use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::config::ProviderConfig;
use crate::error::{ProviderError, ProviderErrorKind};
use crate::prompt::Prompt;

pub use anthropic::AnthropicClient;
pub use mock::{MockProvider, MockReply};
pub use openai::OpenAiClient;

pub const USER_AGENT: &str = concat!("news-insights/", env!("CARGO_PKG_VERSION"));

#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Send `prompt` as the single user message; return the model's raw text.
    async fn complete(&self, prompt: &Prompt, config: &ProviderConfig)
        -> Result<String, ProviderError>;

    /// Vendor name for diagnostics.
    fn vendor(&self) -> &'static str;
}

pub type DynProviderClient = Arc<dyn ProviderClient>;

/// Single-turn chat body shared by every vendor we talk to.
#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: [ChatMessage<'a>; 1],
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

impl<'a> ChatRequest<'a> {
    pub fn single_user(prompt: &'a Prompt, config: &'a ProviderConfig) -> Self {
        Self {
            model: &config.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt.as_str(),
            }],
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

/// Shared HTTP client with connect timeout; request timeouts come from config.
pub(crate) fn build_http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_secs(5))
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to default reqwest client");
            reqwest::Client::new()
        })
}

/// Send the request and return the body of a 2xx response, classifying everything else.
pub(crate) async fn send_for_body(
    request: reqwest::RequestBuilder,
) -> Result<String, ProviderError> {
    let resp = request.send().await?;
    let status = resp.status();
    if !status.is_success() {
        // The status alone classifies the failure; the body is diagnostics only.
        let body = resp.text().await.unwrap_or_default();
        return Err(ProviderError::from_http(status.as_u16(), &body));
    }
    Ok(resp.text().await?)
}

/// Reject an empty credential before anything is sent.
pub(crate) fn require_key(config: &ProviderConfig) -> Result<&str, ProviderError> {
    if config.api_key.is_empty() {
        return Err(ProviderError::new(
            ProviderErrorKind::Auth,
            format!("no API key configured for provider {}", config.name),
        ));
    }
    Ok(config.api_key.expose())
}

/// Parse a 2xx body as JSON, or report it as malformed.
pub(crate) fn parse_body(body: &str) -> Result<serde_json::Value, ProviderError> {
    serde_json::from_str(body)
        .map_err(|e| ProviderError::malformed(format!("response body is not JSON: {e}")))
}

/// Reject empty replies; an empty string has nothing to extract from.
pub(crate) fn non_empty_text(text: String) -> Result<String, ProviderError> {
    if text.trim().is_empty() {
        Err(ProviderError::malformed("response contained no text"))
    } else {
        Ok(text)
    }
}

/// Vendor name -> client. Configs select their client through `ProviderConfig::vendor`.
#[derive(Clone, Default)]
pub struct ClientRegistry {
    clients: HashMap<String, DynProviderClient>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in HTTP vendors ("openai", "anthropic").
    pub fn with_defaults() -> Self {
        let http = build_http_client();
        Self::new()
            .register("openai", Arc::new(OpenAiClient::with_http(http.clone())))
            .register("anthropic", Arc::new(AnthropicClient::with_http(http)))
    }

    pub fn register(mut self, vendor: impl Into<String>, client: DynProviderClient) -> Self {
        self.clients.insert(vendor.into().to_ascii_lowercase(), client);
        self
    }

    pub fn get(&self, vendor: &str) -> Option<&DynProviderClient> {
        self.clients.get(&vendor.to_ascii_lowercase())
    }

    pub fn vendors(&self) -> Vec<&str> {
        let mut v: Vec<&str> = self.clients.keys().map(String::as_str).collect();
        v.sort_unstable();
        v
    }
}

impl std::fmt::Debug for ClientRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientRegistry")
            .field("vendors", &self.vendors())
            .finish()
    }
}
