use crate::error::CoreResult;
use crate::standards::model::ClauseDefinition;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const API_KEY_ENV: &str = "AUDIT_API_KEY";

#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
}

impl Credentials {
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var(API_KEY_ENV)
                .ok()
                .filter(|k| !k.trim().is_empty()),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Everything one classification call needs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClassificationRequest {
    pub clause_id: String,
    pub clause: ClauseDefinition,
    pub standard_name: String,
    pub evidence_text: String,
    pub tag_text: String,
    pub credentials: Credentials,
    pub model_id: String,
}

/// The remote (or fallback) classifier. Returns the raw response text; the
/// caller extracts JSON from it, so implementations may return prose around
/// a fenced block. Slow and fallible by contract.
#[async_trait]
pub trait Classifier: Send + Sync {
    fn name(&self) -> &str;

    async fn classify(&self, req: &ClassificationRequest) -> CoreResult<String>;
}
