use crate::analysis::payload::DEFAULT_EVIDENCE_CHAR_CAP;
use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_PATH_ENV: &str = "AUDIT_CONFIG";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierBackend {
    /// Keyword scoring, no network.
    Heuristic,
    /// Classifier supplied by the embedding application.
    External,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AnalysisConfig {
    pub model_id: String,
    pub concurrency: usize,
    pub evidence_char_cap: usize,
    pub classifier: ClassifierBackend,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            model_id: "gemini-2.5-flash".to_string(),
            concurrency: 3,
            evidence_char_cap: DEFAULT_EVIDENCE_CHAR_CAP,
            classifier: ClassifierBackend::Heuristic,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SessionConfig {
    pub dir: PathBuf,
    pub key: String,
    pub autosave_debounce_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".audit-session"),
            key: "audit_session".to_string(),
            autosave_debounce_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CoreConfig {
    pub analysis: AnalysisConfig,
    pub session: SessionConfig,
}

impl CoreConfig {
    pub fn parse(text: &str) -> CoreResult<Self> {
        let cfg: CoreConfig = toml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: impl AsRef<Path>) -> CoreResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Reads the file named by `AUDIT_CONFIG` when set, defaults otherwise.
    pub fn from_env_or_default() -> CoreResult<Self> {
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::load(path),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.analysis.concurrency == 0 {
            return Err(CoreError::Configuration(
                "analysis.concurrency must be at least 1".to_string(),
            ));
        }
        if self.analysis.evidence_char_cap == 0 {
            return Err(CoreError::Configuration(
                "analysis.evidence_char_cap must be at least 1".to_string(),
            ));
        }
        if self.analysis.model_id.trim().is_empty() {
            return Err(CoreError::Configuration(
                "analysis.model_id cannot be empty".to_string(),
            ));
        }
        if self.session.key.trim().is_empty() {
            return Err(CoreError::Configuration(
                "session.key cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}
