// src/store.rs
//! Storage collaborator for generated insights, keyed by article id.
//!
//! `upsert` is idempotent: storing twice for the same article replaces the entry.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

use crate::insight::Insight;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredInsights {
    pub provider: String,
    pub insights: Vec<Insight>,
    pub generated_at: DateTime<Utc>,
}

impl StoredInsights {
    pub fn now(provider: impl Into<String>, insights: Vec<Insight>) -> Self {
        Self {
            provider: provider.into(),
            insights,
            generated_at: Utc::now(),
        }
    }
}

#[async_trait::async_trait]
pub trait InsightStore: Send + Sync {
    async fn upsert(&self, article_id: &str, record: StoredInsights) -> Result<()>;
    async fn get(&self, article_id: &str) -> Result<Option<StoredInsights>>;
}

/// Process-local store; bounded so a long-running server cannot grow without limit.
#[derive(Debug)]
pub struct MemoryInsightStore {
    inner: RwLock<HashMap<String, StoredInsights>>,
    cap: usize,
}

impl MemoryInsightStore {
    pub fn with_capacity(cap: usize) -> Self {
        let cap = cap.clamp(1, 100_000);
        Self {
            inner: RwLock::new(HashMap::with_capacity(cap.min(1024))),
            cap,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryInsightStore {
    fn default() -> Self {
        Self::with_capacity(10_000)
    }
}

#[async_trait::async_trait]
impl InsightStore for MemoryInsightStore {
    async fn upsert(&self, article_id: &str, record: StoredInsights) -> Result<()> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| anyhow!("insight store lock poisoned"))?;
        if !map.contains_key(article_id) && map.len() >= self.cap {
            // Evict the oldest entry.
            if let Some(oldest) = map
                .iter()
                .min_by_key(|(_, v)| v.generated_at)
                .map(|(k, _)| k.clone())
            {
                map.remove(&oldest);
            }
        }
        map.insert(article_id.to_string(), record);
        Ok(())
    }

    async fn get(&self, article_id: &str) -> Result<Option<StoredInsights>> {
        let map = self
            .inner
            .read()
            .map_err(|_| anyhow!("insight store lock poisoned"))?;
        Ok(map.get(article_id).cloned())
    }
}
