// src/bootstrap.rs
use crate::article::{Article, ArticleSource, Entity};
use crate::config::providers::{load_providers_default, load_providers_from};
use crate::config::{ProviderConfig, Secret};
use crate::insight::PipelineResult;
use crate::pipeline::InsightPipeline;
use crate::provider::{ClientRegistry, MockProvider};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

pub const ENV_TEST_MODE: &str = "INSIGHT_TEST_MODE";

/// `INSIGHT_TEST_MODE=mock` swaps every vendor for a deterministic local mock.
pub fn mock_mode() -> bool {
    std::env::var(ENV_TEST_MODE)
        .map(|v| v.eq_ignore_ascii_case("mock"))
        .unwrap_or(false)
}

pub struct InsightRuntime {
    pub providers: Vec<ProviderConfig>,
    pub pipeline: InsightPipeline,
}

impl InsightRuntime {
    pub fn new(providers: Vec<ProviderConfig>, registry: ClientRegistry) -> Self {
        Self {
            providers,
            pipeline: InsightPipeline::new(registry),
        }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let providers = load_providers_from(path.as_ref())?;
        Ok(Self::with_vendor_clients(providers))
    }

    /// Env/default-path config, or the mock chain in mock mode.
    pub fn from_default() -> anyhow::Result<Self> {
        if mock_mode() {
            return Ok(Self::mock());
        }
        let providers = load_providers_default()?;
        Ok(Self::with_vendor_clients(providers))
    }

    fn with_vendor_clients(providers: Vec<ProviderConfig>) -> Self {
        // Safe diagnostics: names + vendors + key lengths only.
        for p in &providers {
            info!(
                "insight provider loaded: name={}, vendor={}, model={}, key_len={}",
                p.name,
                p.vendor,
                p.model,
                p.api_key.expose().len()
            );
        }
        Self::new(providers, ClientRegistry::with_defaults())
    }

    pub fn mock() -> Self {
        let providers = vec![ProviderConfig::new(
            "mock",
            "mock",
            "mock://local",
            Secret::new(""),
            "mock",
        )];
        let registry = ClientRegistry::new().register("mock", Arc::new(MockProvider::canned()));
        Self::new(providers, registry)
    }

    /// One-off smoke run against the configured chain. Logs the outcome, never fails.
    pub async fn quick_probe(&self) {
        let sample = Article {
            id: None,
            title: "Central bank signals possible rate cut as labor market cools".to_string(),
            source: Some(ArticleSource {
                name: Some("Probe".to_string()),
            }),
            categories: vec!["business".to_string(), "economy".to_string()],
            sentiment_assessment: Some("neutral".to_string()),
            entities: vec![
                Entity::new("Federal Reserve", "organization"),
                Entity::new("United States", "country"),
            ],
            description: None,
        };
        match self.pipeline.run(&sample, &self.providers).await {
            PipelineResult::Success { insights, provider } => {
                info!(provider = %provider, insights = insights.len(), "insight quick_probe ok");
            }
            PipelineResult::Failure(f) => {
                warn!(attempts = f.records.len(), "insight quick_probe failed: {f}");
            }
        }
    }
}
