use crate::analysis::finding::Finding;
use crate::determinism::ids::now_rfc3339_utc;
use crate::error::{CoreError, CoreResult};
use crate::process::model::{Process, ProcessId};
use serde::{Deserialize, Serialize};

pub const SESSION_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct AuditInfo {
    pub organization: String,
    pub audit_type: String,
    pub auditor: String,
    pub lead_auditor: String,
    pub audit_date: String,
    pub scope: String,
}

/// Everything needed to rebuild a session. Live buffers are not part of it:
/// they are flushed into `processes` before a snapshot is taken.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub schema_version: u32,
    #[serde(default)]
    pub standard_key: Option<String>,
    #[serde(default)]
    pub audit_info: AuditInfo,
    #[serde(default)]
    pub processes: Vec<Process>,
    #[serde(default)]
    pub active_process_id: Option<ProcessId>,
    #[serde(default)]
    pub findings: Vec<Finding>,
    #[serde(default)]
    pub report_text: String,
    #[serde(default)]
    pub saved_at: String,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            schema_version: SESSION_SCHEMA_VERSION,
            standard_key: None,
            audit_info: AuditInfo::default(),
            processes: Vec::new(),
            active_process_id: None,
            findings: Vec::new(),
            report_text: String::new(),
            saved_at: String::new(),
        }
    }
}

impl SessionSnapshot {
    pub fn stamped(mut self) -> Self {
        self.saved_at = now_rfc3339_utc();
        self
    }

    pub fn to_value(&self) -> CoreResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_value(value: serde_json::Value) -> CoreResult<Self> {
        let snapshot: SessionSnapshot = serde_json::from_value(value)?;
        if snapshot.schema_version > SESSION_SCHEMA_VERSION {
            return Err(CoreError::InvalidInput(format!(
                "session schema version {} is newer than supported version {}",
                snapshot.schema_version, SESSION_SCHEMA_VERSION
            )));
        }
        Ok(snapshot)
    }
}
