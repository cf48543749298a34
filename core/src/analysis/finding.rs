use crate::process::model::{ClauseId, ProcessId};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum FindingStatus {
    #[serde(rename = "COMPLIANT")]
    Compliant,
    #[serde(rename = "NC_MINOR")]
    MinorNonconformity,
    #[serde(rename = "NC_MAJOR")]
    MajorNonconformity,
    #[serde(rename = "OFI")]
    OpportunityForImprovement,
    #[serde(rename = "N_A")]
    NotApplicable,
}

impl FindingStatus {
    pub fn label(&self) -> &'static str {
        match self {
            FindingStatus::Compliant => "Compliant",
            FindingStatus::MinorNonconformity => "Minor nonconformity",
            FindingStatus::MajorNonconformity => "Major nonconformity",
            FindingStatus::OpportunityForImprovement => "Opportunity for improvement",
            FindingStatus::NotApplicable => "Not applicable",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            FindingStatus::Compliant => "COMPLIANT",
            FindingStatus::MinorNonconformity => "NC_MINOR",
            FindingStatus::MajorNonconformity => "NC_MAJOR",
            FindingStatus::OpportunityForImprovement => "OFI",
            FindingStatus::NotApplicable => "N_A",
        }
    }

    /// Accepts the spellings models tend to produce ("Major NC",
    /// "non-conformity (minor)", "OFI", "N/A", ...). Negated or hedged
    /// conformity ("not compliant", "partially conforming") reads as a minor
    /// nonconformity; only a bare conformity label reads as compliant.
    pub fn parse_loose(raw: &str) -> Option<Self> {
        let norm: String = raw
            .to_lowercase()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { ' ' })
            .collect();
        let words: Vec<&str> = norm.split_whitespace().collect();
        let joined = words.join(" ");
        let has = |w: &str| words.iter().any(|x| *x == w);

        if joined.is_empty() {
            return None;
        }
        if joined.contains("not applicable") || joined == "n a" || joined == "na" {
            return Some(FindingStatus::NotApplicable);
        }
        if has("major") {
            return Some(FindingStatus::MajorNonconformity);
        }
        if has("minor") {
            return Some(FindingStatus::MinorNonconformity);
        }
        if has("ofi") || joined.contains("opportunity") || joined.contains("improvement") {
            return Some(FindingStatus::OpportunityForImprovement);
        }
        if has("nc")
            || joined.contains("nonconform")
            || joined.contains("noncompli")
            || joined.contains("non conform")
            || joined.contains("non compli")
        {
            return Some(FindingStatus::MinorNonconformity);
        }

        let conformity = words
            .iter()
            .any(|w| w.starts_with("compli") || w.starts_with("conform"));
        let hedged = words.iter().any(|w| HEDGE_WORDS.contains(w));
        if conformity && hedged {
            return Some(FindingStatus::MinorNonconformity);
        }
        if COMPLIANT_LABELS.contains(&joined.as_str()) {
            return Some(FindingStatus::Compliant);
        }
        None
    }
}

const HEDGE_WORDS: [&str; 10] = [
    "not", "no", "non", "never", "partially", "partial", "partly", "fails", "failed", "lacks",
];

const COMPLIANT_LABELS: [&str; 10] = [
    "compliant",
    "compliance",
    "fully compliant",
    "conform",
    "conforms",
    "conforming",
    "conformity",
    "conformant",
    "pass",
    "passed",
];

/// Where a finding came from in the most recent run that touched it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FindingSource {
    #[default]
    Remote,
    Reanalysis,
    Manual,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub clause_id: ClauseId,
    pub process_id: ProcessId,
    pub process_name: String,
    pub status: FindingStatus,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason_translated: Option<String>,
    /// Verbatim user evidence, never the model's paraphrase when user text
    /// exists.
    pub evidence: String,
    #[serde(default)]
    pub suggestion: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion_translated: Option<String>,
    #[serde(rename = "conclusion_report", default)]
    pub conclusion_report: String,
    #[serde(default)]
    pub cross_refs: Vec<String>,
    #[serde(default)]
    pub analyzed_at: String,
    #[serde(default)]
    pub source: FindingSource,
}

impl Finding {
    pub fn same_target(&self, other: &Finding) -> bool {
        self.clause_id == other.clause_id && self.process_id == other.process_id
    }
}

/// Natural ordering for clause ids: numeric segments compare as numbers,
/// so "9.1" < "10.1". Numeric segments sort before alphabetic ones.
pub fn compare_clause_ids(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = match (x.parse::<u64>(), y.parse::<u64>()) {
                    (Ok(nx), Ok(ny)) => nx.cmp(&ny),
                    (Ok(_), Err(_)) => Ordering::Less,
                    (Err(_), Ok(_)) => Ordering::Greater,
                    (Err(_), Err(_)) => x.cmp(y),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

pub fn sort_findings(findings: &mut [Finding]) {
    findings.sort_by(|a, b| {
        compare_clause_ids(&a.clause_id, &b.clause_id).then_with(|| a.process_name.cmp(&b.process_name))
    });
}

/// Whole-collection merge: every fresh finding replaces the entry with the
/// same (clause, process) pair or is appended, then the collection is
/// re-sorted.
pub fn reconcile(existing: &[Finding], fresh: Vec<Finding>) -> Vec<Finding> {
    let mut out = existing.to_vec();
    for finding in fresh {
        match out.iter_mut().find(|f| f.same_target(&finding)) {
            Some(slot) => *slot = finding,
            None => out.push(finding),
        }
    }
    sort_findings(&mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn natural_clause_ordering() {
        let mut ids = vec!["10.1", "9.1", "4.10", "4.2", "A.5.1", "4.2.1"];
        ids.sort_by(|a, b| compare_clause_ids(a, b));
        assert_eq!(ids, vec!["4.2", "4.2.1", "4.10", "9.1", "10.1", "A.5.1"]);
    }

    #[test]
    fn loose_status_spellings() {
        assert_eq!(FindingStatus::parse_loose("Compliant"), Some(FindingStatus::Compliant));
        assert_eq!(FindingStatus::parse_loose("NC_MAJOR"), Some(FindingStatus::MajorNonconformity));
        assert_eq!(
            FindingStatus::parse_loose("Non-conformity (minor)"),
            Some(FindingStatus::MinorNonconformity)
        );
        assert_eq!(FindingStatus::parse_loose("NC"), Some(FindingStatus::MinorNonconformity));
        assert_eq!(FindingStatus::parse_loose("non-compliant"), Some(FindingStatus::MinorNonconformity));
        assert_eq!(FindingStatus::parse_loose("OFI"), Some(FindingStatus::OpportunityForImprovement));
        assert_eq!(FindingStatus::parse_loose("N/A"), Some(FindingStatus::NotApplicable));
        assert_eq!(FindingStatus::parse_loose("N_A"), Some(FindingStatus::NotApplicable));
        assert_eq!(FindingStatus::parse_loose("banana"), None);
    }

    #[test]
    fn negated_or_partial_conformity_is_never_compliant() {
        for raw in [
            "Not compliant",
            "Not Conforming",
            "Does not conform",
            "Partially compliant",
            "No compliance",
        ] {
            assert_eq!(
                FindingStatus::parse_loose(raw),
                Some(FindingStatus::MinorNonconformity),
                "{}",
                raw
            );
        }
        assert_eq!(FindingStatus::parse_loose("Conforming"), Some(FindingStatus::Compliant));
        assert_eq!(FindingStatus::parse_loose("Fully compliant"), Some(FindingStatus::Compliant));
        assert_eq!(FindingStatus::parse_loose("PASS"), Some(FindingStatus::Compliant));
        assert_eq!(FindingStatus::parse_loose("c"), None);
        assert_eq!(FindingStatus::parse_loose("Compliant with remarks"), None);
    }
}
