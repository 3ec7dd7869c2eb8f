// src/provider/mock.rs
//! Deterministic provider for tests and `INSIGHT_TEST_MODE=mock` runs.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::ProviderClient;
use crate::config::ProviderConfig;
use crate::error::{ProviderError, ProviderErrorKind};
use crate::prompt::Prompt;

#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    Error(ProviderError),
}

impl MockReply {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// Simulated non-success HTTP status.
    pub fn status(code: u16) -> Self {
        Self::Error(ProviderError::from_http(code, ""))
    }

    pub fn error(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self::Error(ProviderError::new(kind, message))
    }
}

/// Replies are consumed in order; the last one repeats once the script runs out.
pub struct MockProvider {
    script: Mutex<VecDeque<MockReply>>,
    fallback: MockReply,
    calls: AtomicUsize,
    prompts: Mutex<Vec<Prompt>>,
}

impl MockProvider {
    pub fn new(reply: MockReply) -> Self {
        Self::scripted(Vec::new(), reply)
    }

    pub fn scripted(script: Vec<MockReply>, fallback: MockReply) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Returns a fixed, well-formed single insight.
    pub fn canned() -> Self {
        Self::new(MockReply::text(
            r#"[{"type":"other","entity":"Mock","prediction":"No material change expected (mock)","confidence":0.5,"reasoning":"Deterministic mock reply"}]"#,
        ))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<Prompt> {
        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl ProviderClient for MockProvider {
    async fn complete(
        &self,
        prompt: &Prompt,
        _config: &ProviderConfig,
    ) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(prompt.clone());

        let next = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        match next {
            MockReply::Text(s) => Ok(s),
            MockReply::Error(e) => Err(e),
        }
    }

    fn vendor(&self) -> &'static str {
        "mock"
    }
}
