// src/insight.rs
//! Validated insight records and the per-run pipeline outcome.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::PipelineFailure;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightType {
    StockPrediction,
    MarketTrend,
    PoliticalImpact,
    SocialImpact,
    TechnologyImpact,
    LegalConsequence,
    Other,
}

impl InsightType {
    pub const ALL: [InsightType; 7] = [
        Self::StockPrediction,
        Self::MarketTrend,
        Self::PoliticalImpact,
        Self::SocialImpact,
        Self::TechnologyImpact,
        Self::LegalConsequence,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StockPrediction => "stock_prediction",
            Self::MarketTrend => "market_trend",
            Self::PoliticalImpact => "political_impact",
            Self::SocialImpact => "social_impact",
            Self::TechnologyImpact => "technology_impact",
            Self::LegalConsequence => "legal_consequence",
            Self::Other => "other",
        }
    }

    /// Exact wire name, tolerant of surrounding whitespace and case.
    pub fn parse(raw: &str) -> Option<Self> {
        let t = raw.trim();
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(t))
    }
}

impl fmt::Display for InsightType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Only constructed by the extractor after schema validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    #[serde(rename = "type")]
    pub kind: InsightType,
    pub entity: String,
    pub prediction: String,
    pub confidence: f32,
    pub reasoning: String,
}

/// Outcome of one pipeline run. One provider's output is used wholesale or not at all.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineResult {
    Success {
        insights: Vec<Insight>,
        provider: String,
    },
    Failure(PipelineFailure),
}

impl PipelineResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn insights(&self) -> &[Insight] {
        match self {
            Self::Success { insights, .. } => insights,
            Self::Failure(_) => &[],
        }
    }

    pub fn provider(&self) -> Option<&str> {
        match self {
            Self::Success { provider, .. } => Some(provider),
            Self::Failure(_) => None,
        }
    }

    /// Convert into a `Result` for callers that prefer `?`.
    pub fn into_result(self) -> Result<(Vec<Insight>, String), PipelineFailure> {
        match self {
            Self::Success { insights, provider } => Ok((insights, provider)),
            Self::Failure(f) => Err(f),
        }
    }
}
