// src/config/providers.rs
//! Provider chain configuration: ordered list of LLM vendors to try.
//!
//! Lookup order for the default loader:
//! 1) $INSIGHT_PROVIDERS_PATH
//! 2) config/providers.toml
//! 3) config/providers.json

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_PROVIDERS_PATH: &str = "INSIGHT_PROVIDERS_PATH";
pub const DEFAULT_TOML_PATH: &str = "config/providers.toml";
pub const DEFAULT_JSON_PATH: &str = "config/providers.json";

pub const DEFAULT_TEMPERATURE: f32 = 0.3;
pub const DEFAULT_MAX_TOKENS: u32 = 1000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const OPENAI_DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
const ANTHROPIC_DEFAULT_ENDPOINT: &str = "https://api.anthropic.com/v1/messages";

/// Opaque credential. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret(len={})", self.0.len())
    }
}

/// One vendor in the fallback chain. Immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    /// Identity reported in results and failure records.
    pub name: String,
    /// Selects the client implementation ("openai" | "anthropic" | registered name).
    pub vendor: String,
    pub endpoint: String,
    pub api_key: Secret,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl ProviderConfig {
    pub fn new(
        name: impl Into<String>,
        vendor: impl Into<String>,
        endpoint: impl Into<String>,
        api_key: Secret,
        model: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            vendor: vendor.into(),
            endpoint: endpoint.into(),
            api_key,
            model: model.into(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_temperature(mut self, t: f32) -> Self {
        self.temperature = t;
        self
    }

    pub fn with_max_tokens(mut self, n: u32) -> Self {
        self.max_tokens = n;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_api_key(mut self, key: Secret) -> Self {
        self.api_key = key;
        self
    }
}

#[derive(Debug, Deserialize)]
struct ProvidersFile {
    providers: Vec<RawProvider>,
}

#[derive(Debug, Deserialize)]
struct RawProvider {
    name: String,
    #[serde(default)]
    vendor: Option<String>,
    #[serde(default)]
    endpoint: Option<String>,
    /// Literal key, "ENV" (reads <NAME>_API_KEY) or "env:VAR".
    api_key: String,
    model: String,
    #[serde(default)]
    temperature: Option<f32>,
    #[serde(default)]
    max_tokens: Option<u32>,
    #[serde(default)]
    timeout_secs: Option<u64>,
}

/// Load the chain from an explicit path. Supports TOML or JSON.
pub fn load_providers_from(path: &Path) -> Result<Vec<ProviderConfig>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading provider config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_providers(&content, ext.as_str())
        .with_context(|| format!("parsing provider config {}", path.display()))
}

/// Load the chain using env var + fallbacks (see module docs).
pub fn load_providers_default() -> Result<Vec<ProviderConfig>> {
    if let Ok(p) = std::env::var(ENV_PROVIDERS_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_providers_from(&pb);
        }
        bail!("{ENV_PROVIDERS_PATH} points to non-existent path");
    }
    for candidate in [DEFAULT_TOML_PATH, DEFAULT_JSON_PATH] {
        let pb = PathBuf::from(candidate);
        if pb.exists() {
            return load_providers_from(&pb);
        }
    }
    Err(anyhow!(
        "no provider config found ({ENV_PROVIDERS_PATH}, {DEFAULT_TOML_PATH}, {DEFAULT_JSON_PATH})"
    ))
}

/// Parse and validate a provider file body. `hint_ext` is "toml", "json" or "".
pub fn parse_providers(s: &str, hint_ext: &str) -> Result<Vec<ProviderConfig>> {
    let file = parse_file(s, hint_ext)?;
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(file.providers.len());
    for raw in file.providers {
        let cfg = resolve(raw)?;
        if !seen.insert(cfg.name.clone()) {
            bail!("duplicate provider name: {}", cfg.name);
        }
        out.push(cfg);
    }
    if out.is_empty() {
        bail!("provider chain is empty");
    }
    Ok(out)
}

fn parse_file(s: &str, hint_ext: &str) -> Result<ProvidersFile> {
    if hint_ext == "json" {
        return serde_json::from_str(s).context("invalid JSON provider config");
    }
    if hint_ext == "toml" {
        return toml::from_str(s).context("invalid TOML provider config");
    }
    // No hint: JSON first (cheap to reject), then TOML.
    if let Ok(v) = serde_json::from_str(s) {
        return Ok(v);
    }
    toml::from_str(s).context("unsupported provider config format")
}

fn resolve(raw: RawProvider) -> Result<ProviderConfig> {
    let name = raw.name.trim().to_string();
    if name.is_empty() {
        bail!("provider name must not be empty");
    }
    let vendor = raw
        .vendor
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(name.as_str())
        .to_ascii_lowercase();

    let endpoint = match raw.endpoint.as_deref().map(str::trim) {
        Some(e) if !e.is_empty() => e.to_string(),
        _ => default_endpoint(&vendor)
            .ok_or_else(|| anyhow!("provider {name}: endpoint is required for vendor {vendor}"))?
            .to_string(),
    };

    let model = raw.model.trim().to_string();
    if model.is_empty() {
        bail!("provider {name}: model must not be empty");
    }

    let api_key = resolve_secret(&name, &raw.api_key);

    let temperature = raw
        .temperature
        .filter(|t| t.is_finite())
        .map(|t| t.clamp(0.0, 2.0))
        .unwrap_or(DEFAULT_TEMPERATURE);

    let max_tokens = raw.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS);
    if max_tokens == 0 {
        bail!("provider {name}: max_tokens must be > 0");
    }
    let timeout_secs = raw.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
    if timeout_secs == 0 {
        bail!("provider {name}: timeout_secs must be > 0");
    }

    Ok(ProviderConfig {
        name,
        vendor,
        endpoint,
        api_key,
        model,
        temperature,
        max_tokens,
        timeout: Duration::from_secs(timeout_secs),
    })
}

fn default_endpoint(vendor: &str) -> Option<&'static str> {
    match vendor {
        "openai" => Some(OPENAI_DEFAULT_ENDPOINT),
        "anthropic" => Some(ANTHROPIC_DEFAULT_ENDPOINT),
        _ => None,
    }
}

/// "ENV" -> <NAME>_API_KEY, "env:VAR" -> $VAR, anything else is the literal key.
///
/// An unset variable yields an empty secret; the client then fails that one attempt
/// with an auth error and the chain moves on.
fn resolve_secret(name: &str, raw: &str) -> Secret {
    let trimmed = raw.trim();
    let var = if trimmed.eq_ignore_ascii_case("env") {
        Some(default_key_var(name))
    } else {
        trimmed
            .get(..4)
            .filter(|p| p.eq_ignore_ascii_case("env:"))
            .map(|_| trimmed[4..].trim().to_string())
    };

    match var {
        Some(var) => match std::env::var(&var) {
            Ok(key) if !key.trim().is_empty() => Secret::new(key),
            _ => {
                tracing::warn!(
                    provider = %name,
                    var = %var,
                    "api key env var missing; provider will fail with auth error"
                );
                Secret::new("")
            }
        },
        None => Secret::new(trimmed),
    }
}

fn default_key_var(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("{stem}_API_KEY")
}
