// src/api.rs
//! HTTP surface: run the pipeline for a posted article and read stored results.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::CorsLayer;

use crate::article::Article;
use crate::config::ProviderConfig;
use crate::error::{AttemptError, FailureRecord};
use crate::insight::{Insight, PipelineResult};
use crate::pipeline::InsightPipeline;
use crate::store::{InsightStore, StoredInsights};

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<InsightPipeline>,
    pub providers: Arc<Vec<ProviderConfig>>,
    pub store: Arc<dyn InsightStore>,
}

impl AppState {
    pub fn new(
        pipeline: InsightPipeline,
        providers: Vec<ProviderConfig>,
        store: Arc<dyn InsightStore>,
    ) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            providers: Arc::new(providers),
            store,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/insights", post(generate))
        .route("/insights/{id}", get(stored))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct FailureOut {
    pub index: usize,
    pub provider: String,
    /// "provider" | "extraction"
    pub stage: &'static str,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    pub message: String,
}

impl From<&FailureRecord> for FailureOut {
    fn from(r: &FailureRecord) -> Self {
        let (stage, message) = match &r.error {
            AttemptError::Provider(e) => ("provider", e.message.clone()),
            AttemptError::Extraction(e) => ("extraction", e.to_string()),
        };
        Self {
            index: r.index,
            provider: r.provider.clone(),
            stage,
            kind: r.error.kind_label(),
            http_status: r.error.http_status(),
            message,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InsightsResponse {
    Success {
        provider: String,
        insights: Vec<Insight>,
    },
    Failure {
        failures: Vec<FailureOut>,
    },
}

#[derive(Debug, Serialize)]
struct ErrorOut {
    error: String,
}

async fn generate(
    State(state): State<AppState>,
    Json(article): Json<Article>,
) -> Result<(StatusCode, Json<InsightsResponse>), (StatusCode, Json<ErrorOut>)> {
    if article.title.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorOut {
                error: "article title must not be empty".to_string(),
            }),
        ));
    }

    let result = state.pipeline.run(&article, &state.providers).await;
    match result {
        PipelineResult::Success { insights, provider } => {
            if let Some(id) = article.id.as_deref().filter(|s| !s.trim().is_empty()) {
                let record = StoredInsights::now(provider.clone(), insights.clone());
                if let Err(e) = state.store.upsert(id, record).await {
                    tracing::warn!(error = ?e, article = id, "failed to store insights");
                }
            }
            Ok((
                StatusCode::OK,
                Json(InsightsResponse::Success { provider, insights }),
            ))
        }
        PipelineResult::Failure(failure) => Ok((
            StatusCode::BAD_GATEWAY,
            Json(InsightsResponse::Failure {
                failures: failure.records.iter().map(FailureOut::from).collect(),
            }),
        )),
    }
}

async fn stored(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StoredInsights>, (StatusCode, Json<ErrorOut>)> {
    match state.store.get(&id).await {
        Ok(Some(record)) => Ok(Json(record)),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorOut {
                error: format!("no insights stored for {id}"),
            }),
        )),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorOut {
                error: e.to_string(),
            }),
        )),
    }
}
