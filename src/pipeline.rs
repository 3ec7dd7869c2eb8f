// src/pipeline.rs
//! Fallback orchestrator: prompt once, then try providers strictly in order.
//!
//! The first provider whose call AND extraction succeed ends the run, even with
//! zero insights. Every failure is recorded and the next provider is tried;
//! nothing short-circuits the chain and nothing is retried within a run.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::{Lazy, OnceCell};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::article::Article;
use crate::config::ProviderConfig;
use crate::error::{AttemptError, FailureRecord, PipelineFailure, ProviderError};
use crate::extract::{extract_with_stats, Extracted};
use crate::insight::PipelineResult;
use crate::prompt::{build_prompt, Prompt};
use crate::provider::ClientRegistry;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "insights_provider_attempts_total",
            "Provider calls attempted, by provider."
        );
        describe_counter!(
            "insights_provider_failures_total",
            "Failed provider attempts, by provider and failure kind."
        );
        describe_counter!("insights_runs_total", "Pipeline runs, by outcome.");
        describe_counter!("insights_emitted_total", "Validated insights returned.");
        describe_counter!(
            "insights_dropped_total",
            "Candidate records dropped by schema validation."
        );
        describe_histogram!(
            "insights_provider_latency_ms",
            "Provider call latency in milliseconds."
        );
    });
}

/// Short, non-reversible article reference for logs. Never log article text.
pub(crate) fn article_ref(article: &Article) -> String {
    if let Some(id) = article.id.as_deref().filter(|s| !s.is_empty()) {
        return id.to_string();
    }
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(article.title.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Stateless across runs; safe to share behind an `Arc` and call concurrently.
#[derive(Debug, Clone)]
pub struct InsightPipeline {
    registry: ClientRegistry,
}

impl InsightPipeline {
    pub fn new(registry: ClientRegistry) -> Self {
        Self { registry }
    }

    /// Pipeline over the built-in HTTP vendor clients.
    pub fn with_default_clients() -> Self {
        Self::new(ClientRegistry::with_defaults())
    }

    pub fn registry(&self) -> &ClientRegistry {
        &self.registry
    }

    /// Generate insights for `article`, falling back through `providers` in order.
    pub async fn run(&self, article: &Article, providers: &[ProviderConfig]) -> PipelineResult {
        ensure_metrics_described();
        let article_ref = article_ref(article);
        let prompt = build_prompt(article);
        let mut records = Vec::new();

        for (index, cfg) in providers.iter().enumerate() {
            debug!(target: "insights", article = %article_ref, provider = %cfg.name, index, "attempting provider");
            counter!("insights_provider_attempts_total", "provider" => cfg.name.clone())
                .increment(1);

            match self.attempt(&prompt, cfg).await {
                Ok(Extracted { insights, dropped }) => {
                    counter!("insights_runs_total", "outcome" => "success").increment(1);
                    counter!("insights_emitted_total").increment(insights.len() as u64);
                    counter!("insights_dropped_total").increment(dropped as u64);
                    info!(
                        target: "insights",
                        article = %article_ref,
                        provider = %cfg.name,
                        insights = insights.len(),
                        dropped,
                        failed_before = records.len(),
                        "insights generated"
                    );
                    return PipelineResult::Success {
                        insights,
                        provider: cfg.name.clone(),
                    };
                }
                Err(error) => {
                    warn!(
                        target: "insights",
                        article = %article_ref,
                        provider = %cfg.name,
                        kind = error.kind_label(),
                        http_status = ?error.http_status(),
                        error = %error,
                        "provider attempt failed, trying next in chain"
                    );
                    counter!(
                        "insights_provider_failures_total",
                        "provider" => cfg.name.clone(),
                        "kind" => error.kind_label()
                    )
                    .increment(1);
                    records.push(FailureRecord {
                        index,
                        provider: cfg.name.clone(),
                        error,
                    });
                }
            }
        }

        counter!("insights_runs_total", "outcome" => "failure").increment(1);
        warn!(
            target: "insights",
            article = %article_ref,
            attempts = records.len(),
            "all insight providers exhausted"
        );
        PipelineResult::Failure(PipelineFailure { records })
    }

    async fn attempt(&self, prompt: &Prompt, cfg: &ProviderConfig) -> Result<Extracted, AttemptError> {
        let client = self.registry.get(&cfg.vendor).ok_or_else(|| {
            ProviderError::unavailable(format!("no client registered for vendor {}", cfg.vendor))
        })?;

        let t0 = Instant::now();
        let reply = client.complete(prompt, cfg).await;
        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("insights_provider_latency_ms", "provider" => cfg.name.clone()).record(ms);

        let raw = reply?;
        Ok(extract_with_stats(&raw)?)
    }
}

static DEFAULT_PIPELINE: Lazy<InsightPipeline> = Lazy::new(InsightPipeline::with_default_clients);

/// Inbound entry point: run the default HTTP-backed pipeline for one article.
pub async fn generate_insights(article: &Article, providers: &[ProviderConfig]) -> PipelineResult {
    DEFAULT_PIPELINE.run(article, providers).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::Article;

    #[test]
    fn article_ref_prefers_id_then_hash() {
        let mut a = Article::new("Secret headline");
        let h = article_ref(&a);
        assert_eq!(h.len(), 12);
        assert!(!h.contains("Secret"));
        assert_eq!(h, article_ref(&Article::new("Secret headline")));
        a.id = Some("abc".into());
        assert_eq!(article_ref(&a), "abc");
    }

    #[tokio::test]
    async fn empty_chain_is_failure_without_records() {
        let p = InsightPipeline::new(ClientRegistry::new());
        let out = p.run(&Article::new("t"), &[]).await;
        match out {
            PipelineResult::Failure(f) => assert!(f.is_empty_chain()),
            other => panic!("expected failure, got {other:?}"),
        }
    }
}
