use crate::determinism::content_hash::content_hash;
use crate::process::model::Process;

pub const DEFAULT_EVIDENCE_CHAR_CAP: usize = 8000;
pub const TRUNCATION_MARKER: &str = "…[truncated]";

/// Evidence assembled for one (process, clause) classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidencePayload {
    /// What the classifier sees: supplied rows, capped process notes, tags.
    pub combined: String,
    /// Verbatim `evidence_input` of the supplied rows, newline-joined. This
    /// is what ends up in the finding.
    pub raw_evidence: String,
    pub tag_text: String,
}

impl EvidencePayload {
    pub fn cache_key(&self, clause_id: &str, process_id: &str, model_id: &str) -> String {
        content_hash(&format!(
            "{}|{}|{}|{}",
            clause_id, process_id, model_id, self.combined
        ))
    }
}

pub fn truncate_chars(text: &str, cap: usize) -> String {
    if text.chars().count() <= cap {
        return text.to_string();
    }
    let mut out: String = text.chars().take(cap).collect();
    out.push_str(TRUNCATION_MARKER);
    out
}

pub fn build_payload(process: &Process, clause_id: &str, char_cap: usize) -> EvidencePayload {
    let supplied = process.supplied_rows(clause_id);
    let mut sections = Vec::new();

    if !supplied.is_empty() {
        let mut lines = vec!["Checklist evidence:".to_string()];
        for row in &supplied {
            lines.push(format!("- Requirement: {}", row.requirement.trim()));
            lines.push(format!("  Evidence: {}", row.evidence_input().trim()));
        }
        sections.push(lines.join("\n"));
    }

    if !process.evidence.trim().is_empty() {
        sections.push(format!(
            "Process notes:\n{}",
            truncate_chars(process.evidence.trim(), char_cap)
        ));
    }

    let tag_text = process
        .tags_for_clause(clause_id)
        .iter()
        .map(|t| format!("- {}", t.text.trim()))
        .collect::<Vec<_>>()
        .join("\n");
    if !tag_text.is_empty() {
        sections.push(format!("Tagged excerpts:\n{}", tag_text));
    }

    let raw_evidence = supplied
        .iter()
        .map(|r| r.evidence_input())
        .collect::<Vec<_>>()
        .join("\n");

    EvidencePayload {
        combined: sections.join("\n\n"),
        raw_evidence,
        tag_text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::model::{seeded_rows, EvidenceTag, MatrixRow};

    fn process_with_rows() -> Process {
        let mut p = Process::new("Purchasing");
        let mut rows = seeded_rows("8.4", "Control external providers");
        rows.push(MatrixRow::new("8.4", 1, "Evaluate suppliers"));
        rows[0].set_evidence("Approved supplier list v3");
        p.matrix_data.insert("8.4".to_string(), rows);
        p.evidence_tags.push(EvidenceTag::new("8.4", "Supplier audit 2024 closed"));
        p.evidence_tags.push(EvidenceTag::new("9.2", "Unrelated"));
        p
    }

    #[test]
    fn only_supplied_rows_and_matching_tags_are_included() {
        let payload = build_payload(&process_with_rows(), "8.4", DEFAULT_EVIDENCE_CHAR_CAP);
        assert_eq!(payload.raw_evidence, "Approved supplier list v3");
        assert!(payload.combined.contains("Control external providers"));
        assert!(!payload.combined.contains("Evaluate suppliers"));
        assert_eq!(payload.tag_text, "- Supplier audit 2024 closed");
        assert!(!payload.combined.contains("Unrelated"));
    }

    #[test]
    fn process_notes_are_capped() {
        let mut p = process_with_rows();
        p.evidence = "x".repeat(50);
        let payload = build_payload(&p, "8.4", 10);
        assert!(payload.combined.contains(&format!("{}{}", "x".repeat(10), TRUNCATION_MARKER)));
        assert!(!payload.combined.contains(&"x".repeat(11)));
    }

    #[test]
    fn cache_key_depends_on_model() {
        let payload = build_payload(&process_with_rows(), "8.4", DEFAULT_EVIDENCE_CHAR_CAP);
        assert_ne!(
            payload.cache_key("8.4", "p", "model-a"),
            payload.cache_key("8.4", "p", "model-b")
        );
    }
}
