// src/lib.rs
// Public library surface for the binary, integration tests and external schedulers.

pub mod api;
pub mod article;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod extract;
pub mod insight;
pub mod metrics;
pub mod pipeline;
pub mod prompt;
pub mod provider;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::api::create_router;
pub use crate::article::{Article, ArticleSource, Entity};
pub use crate::config::{ProviderConfig, Secret};
pub use crate::error::{
    AttemptError, ExtractionError, FailureRecord, PipelineFailure, ProviderError,
    ProviderErrorKind,
};
pub use crate::extract::extract_insights;
pub use crate::insight::{Insight, InsightType, PipelineResult};
pub use crate::pipeline::{generate_insights, InsightPipeline};
pub use crate::prompt::{build_prompt, Prompt};
pub use crate::provider::{ClientRegistry, ProviderClient};

use std::sync::Arc;
use tracing::info;

/// Build the full router from the default runtime config (env / `config/providers.*`).
/// Does not mount `/metrics`; the binary merges that after installing the recorder.
pub async fn app() -> anyhow::Result<axum::Router> {
    let rt = bootstrap::InsightRuntime::from_default()?;
    let store = Arc::new(store::MemoryInsightStore::default());
    let state = api::AppState::new(rt.pipeline, rt.providers, store);
    Ok(create_router(state))
}

/// Call this from your Shuttle entrypoint (after tracing init) to perform a one-off
/// smoke test of the provider chain. It won't panic on failure; it just logs the result.
pub async fn run_insight_quick_probe() -> anyhow::Result<()> {
    let rt = bootstrap::InsightRuntime::from_default()?;
    rt.quick_probe().await;
    info!("insight quick probe finished");
    Ok(())
}
