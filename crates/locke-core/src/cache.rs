//! ============================================================================
//! Evaluation Cache - Rule evaluations memoised per session
//! ============================================================================
//! Keyed by rule id. No TTL and no eviction: entries stay valid only for the
//! holdings context they were computed against, so whoever swaps the context
//! must `clear()` the cache in the same critical section (`GateSession`
//! does this).
//! ============================================================================

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::types::GateEvaluation;

/// Manual-invalidation cache of rule evaluations
#[derive(Clone, Default)]
pub struct EvaluationCache {
    entries: Arc<RwLock<HashMap<String, GateEvaluation>>>,
}

impl EvaluationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last evaluation stored for a rule
    pub async fn get(&self, rule_id: &str) -> Option<GateEvaluation> {
        let cache = self.entries.read().await;
        let hit = cache.get(rule_id).cloned();
        debug!(
            "Evaluation cache {} for rule {}",
            if hit.is_some() { "hit" } else { "miss" },
            rule_id
        );
        hit
    }

    /// Store (or overwrite) the evaluation for a rule
    pub async fn put(&self, rule_id: &str, evaluation: GateEvaluation) {
        let mut cache = self.entries.write().await;
        cache.insert(rule_id.to_string(), evaluation);
    }

    /// Drop every entry, returning how many were removed
    pub async fn clear(&self) -> usize {
        let mut cache = self.entries.write().await;
        let count = cache.len();
        cache.clear();
        info!("Cleared {} cached evaluations", count);
        count
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
