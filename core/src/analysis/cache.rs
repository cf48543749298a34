use std::collections::HashMap;
use tokio::sync::RwLock;

use super::finding::Finding;

/// Findings keyed by content hash of everything that went into the
/// classification call. Additive only; cleared with the session.
#[derive(Debug, Default)]
pub struct AnalysisCache {
    entries: RwLock<HashMap<String, Finding>>,
}

impl AnalysisCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &str) -> Option<Finding> {
        self.entries.read().await.get(key).cloned()
    }

    pub async fn insert(&self, key: String, finding: Finding) {
        self.entries.write().await.insert(key, finding);
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::finding::{FindingSource, FindingStatus};

    #[tokio::test]
    async fn insert_then_get() {
        let cache = AnalysisCache::new();
        assert!(cache.get("k").await.is_none());
        cache
            .insert(
                "k".to_string(),
                Finding {
                    clause_id: "4.1".to_string(),
                    process_id: "p_1".to_string(),
                    process_name: "Sales".to_string(),
                    status: FindingStatus::Compliant,
                    reason: "ok".to_string(),
                    reason_translated: None,
                    evidence: "Policy exists".to_string(),
                    suggestion: String::new(),
                    suggestion_translated: None,
                    conclusion_report: String::new(),
                    cross_refs: vec![],
                    analyzed_at: String::new(),
                    source: FindingSource::Remote,
                },
            )
            .await;
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get("k").await.unwrap().evidence, "Policy exists");
        cache.clear().await;
        assert!(cache.is_empty().await);
    }
}
