// src/error.rs
//! Failure taxonomy for the insight pipeline.
//!
//! Provider- and extraction-level errors are recovered inside the pipeline;
//! only `PipelineFailure` (every provider exhausted) reaches the caller.

use serde::Serialize;
use std::fmt;

/// Classification of a provider call failure. Drives fallback policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
    /// 401/403 from the vendor.
    Auth,
    /// 429 from the vendor.
    RateLimited,
    /// 5xx, other non-success status, network error or timeout.
    Unavailable,
    /// The response carried no extractable text.
    Malformed,
}

impl ProviderErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::RateLimited => "rate_limited",
            Self::Unavailable => "unavailable",
            Self::Malformed => "malformed",
        }
    }

    /// Map a non-success HTTP status to a kind.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::Auth,
            429 => Self::RateLimited,
            _ => Self::Unavailable,
        }
    }
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("provider error ({kind}{}): {message}", status_suffix(.http_status))]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub http_status: Option<u16>,
    pub message: String,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            http_status: None,
            message: message.into(),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }

    /// Build from a non-success HTTP status and (possibly empty) body.
    pub fn from_http(status: u16, body: &str) -> Self {
        let snippet: String = body.trim().chars().take(200).collect();
        let message = if snippet.is_empty() {
            format!("vendor returned HTTP {status}")
        } else {
            format!("vendor returned HTTP {status}: {snippet}")
        };
        Self::new(ProviderErrorKind::from_status(status), message).with_status(status)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Unavailable, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Malformed, message)
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(", http {s}")).unwrap_or_default()
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        let message = if e.is_timeout() {
            format!("request timed out: {e}")
        } else if e.is_connect() {
            format!("connection failed: {e}")
        } else {
            format!("request failed: {e}")
        };
        let mut out = Self::unavailable(message);
        out.http_status = e.status().map(|s| s.as_u16());
        out
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExtractionError {
    #[error("unparseable model output: {0}")]
    Unparseable(String),
}

/// Error recorded against a single provider attempt.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AttemptError {
    #[error(transparent)]
    Provider(ProviderError),
    #[error(transparent)]
    Extraction(ExtractionError),
}

impl AttemptError {
    /// Short label used in logs, metrics and API payloads.
    pub fn kind_label(&self) -> &'static str {
        match self {
            Self::Provider(e) => e.kind.as_str(),
            Self::Extraction(ExtractionError::Unparseable(_)) => "unparseable",
        }
    }

    pub fn provider_kind(&self) -> Option<ProviderErrorKind> {
        match self {
            Self::Provider(e) => Some(e.kind),
            Self::Extraction(_) => None,
        }
    }

    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Provider(e) => e.http_status,
            Self::Extraction(_) => None,
        }
    }
}

impl From<ProviderError> for AttemptError {
    fn from(e: ProviderError) -> Self {
        Self::Provider(e)
    }
}

impl From<ExtractionError> for AttemptError {
    fn from(e: ExtractionError) -> Self {
        Self::Extraction(e)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FailureRecord {
    /// Position in the configured chain (0-based).
    pub index: usize,
    /// Configured provider name.
    pub provider: String,
    pub error: AttemptError,
}

/// Every provider in the chain failed. Records are in attempt order.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("all {} insight providers failed", .records.len())]
pub struct PipelineFailure {
    pub records: Vec<FailureRecord>,
}

impl PipelineFailure {
    pub fn is_empty_chain(&self) -> bool {
        self.records.is_empty()
    }
}
