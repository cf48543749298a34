use crate::determinism::content_hash::sha256_hex;
use crate::determinism::ids::{matrix_row_id, process_id_ulid, tag_id_ulid};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type ProcessId = String;
pub type ClauseId = String;

/// Clause id → checkable rows for that clause.
pub type MatrixData = BTreeMap<ClauseId, Vec<MatrixRow>>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RowStatus {
    Pending,
    Supplied,
}

impl RowStatus {
    pub fn for_evidence(evidence_input: &str) -> Self {
        if evidence_input.trim().is_empty() {
            RowStatus::Pending
        } else {
            RowStatus::Supplied
        }
    }
}

/// One requirement line inside a clause. `status` always follows
/// `evidence_input`, so it is only readable, never assignable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", from = "MatrixRowWire")]
pub struct MatrixRow {
    pub id: String,
    pub requirement: String,
    evidence_input: String,
    status: RowStatus,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MatrixRowWire {
    id: String,
    #[serde(default)]
    requirement: String,
    #[serde(default)]
    evidence_input: String,
}

impl From<MatrixRowWire> for MatrixRow {
    fn from(w: MatrixRowWire) -> Self {
        let mut row = MatrixRow {
            id: w.id,
            requirement: w.requirement,
            evidence_input: String::new(),
            status: RowStatus::Pending,
        };
        row.set_evidence(w.evidence_input);
        row
    }
}

impl MatrixRow {
    pub fn new(clause_id: &str, ordinal: usize, requirement: impl Into<String>) -> Self {
        Self {
            id: matrix_row_id(clause_id, ordinal),
            requirement: requirement.into(),
            evidence_input: String::new(),
            status: RowStatus::Pending,
        }
    }

    pub fn evidence_input(&self) -> &str {
        &self.evidence_input
    }

    pub fn status(&self) -> RowStatus {
        self.status
    }

    pub fn is_supplied(&self) -> bool {
        self.status == RowStatus::Supplied
    }

    pub fn set_evidence(&mut self, text: impl Into<String>) {
        self.evidence_input = text.into();
        self.status = RowStatus::for_evidence(&self.evidence_input);
    }

    /// Dictation and "insert excerpt" append rather than replace.
    pub fn append_evidence(&mut self, text: &str) {
        if text.trim().is_empty() {
            return;
        }
        let mut next = self.evidence_input.clone();
        if !next.trim().is_empty() && !next.ends_with(char::is_whitespace) {
            next.push(' ');
        }
        next.push_str(text.trim());
        self.set_evidence(next);
    }

    pub fn clear_evidence(&mut self) {
        self.set_evidence(String::new());
    }
}

/// Matrix entry for a freshly selected clause: a single pending row.
pub fn seeded_rows(clause_id: &str, requirement: impl Into<String>) -> Vec<MatrixRow> {
    vec![MatrixRow::new(clause_id, 0, requirement)]
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceTag {
    pub id: String,
    pub clause_id: ClauseId,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl EvidenceTag {
    pub fn new(clause_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: tag_id_ulid(),
            clause_id: clause_id.into(),
            text: text.into(),
            source: None,
        }
    }
}

/// Reference to an attached file. Only the fingerprint of the content is kept.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: u64,
    pub sha256: String,
}

impl UploadedFile {
    pub fn from_bytes(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        content: &[u8],
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes: content.len() as u64,
            sha256: sha256_hex(content),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Process {
    pub id: ProcessId,
    pub name: String,
    #[serde(default)]
    pub evidence: String,
    #[serde(default)]
    pub matrix_data: MatrixData,
    #[serde(default)]
    pub evidence_tags: Vec<EvidenceTag>,
    #[serde(default)]
    pub interviewees: Vec<String>,
    #[serde(default)]
    pub uploaded_files: Vec<UploadedFile>,
}

impl Process {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: process_id_ulid(),
            name: name.into(),
            evidence: String::new(),
            matrix_data: MatrixData::new(),
            evidence_tags: Vec::new(),
            interviewees: Vec::new(),
            uploaded_files: Vec::new(),
        }
    }

    /// Rows for `clause_id` that carry user evidence.
    pub fn supplied_rows(&self, clause_id: &str) -> Vec<&MatrixRow> {
        self.matrix_data
            .get(clause_id)
            .map(|rows| rows.iter().filter(|r| r.is_supplied()).collect())
            .unwrap_or_default()
    }

    pub fn tags_for_clause(&self, clause_id: &str) -> Vec<&EvidenceTag> {
        self.evidence_tags
            .iter()
            .filter(|t| t.clause_id == clause_id)
            .collect()
    }

    /// Clause keys whose rows include at least one supplied row.
    pub fn clauses_with_evidence(&self) -> Vec<&str> {
        self.matrix_data
            .iter()
            .filter(|(_, rows)| rows.iter().any(MatrixRow::is_supplied))
            .map(|(k, _)| k.as_str())
            .collect()
    }
}
