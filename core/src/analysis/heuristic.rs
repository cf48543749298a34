use crate::error::{CoreError, CoreResult};
use async_trait::async_trait;
use serde_json::json;

use super::classifier::{ClassificationRequest, Classifier};
use super::finding::FindingStatus;

const MAJOR_KEYWORDS: &[&str] = &[
    "not implemented",
    "no procedure",
    "no evidence",
    "not established",
    "absent",
    "missing entirely",
    "never performed",
    "systemic",
];

const MINOR_KEYWORDS: &[&str] = &[
    "overdue",
    "outdated",
    "incomplete",
    "not signed",
    "not updated",
    "partially",
    "missing",
    "expired",
];

const IMPROVEMENT_KEYWORDS: &[&str] = &[
    "could be improved",
    "informal",
    "manually",
    "ad hoc",
    "recommend",
    "consider",
    "not yet automated",
];

const CONFORMITY_KEYWORDS: &[&str] = &[
    "approved",
    "documented",
    "implemented",
    "reviewed",
    "signed",
    "records",
    "exists",
    "maintained",
    "in place",
    "verified",
];

/// Degraded-mode classifier: scores keyword hits in the evidence text and
/// answers in the same JSON shape as the remote service.
#[derive(Debug, Clone, Default)]
pub struct HeuristicClassifier;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeuristicScore {
    pub status: FindingStatus,
    pub keywords_matched: Vec<String>,
}

fn matches(text: &str, keywords: &[&str]) -> Vec<String> {
    keywords
        .iter()
        .filter(|k| text.contains(*k))
        .map(|k| k.to_string())
        .collect()
}

pub fn score_evidence(evidence_text: &str) -> HeuristicScore {
    let text = evidence_text.to_lowercase();
    if text.trim().is_empty() {
        return HeuristicScore {
            status: FindingStatus::NotApplicable,
            keywords_matched: vec![],
        };
    }

    let major = matches(&text, MAJOR_KEYWORDS);
    let minor = matches(&text, MINOR_KEYWORDS);
    let improvement = matches(&text, IMPROVEMENT_KEYWORDS);
    let conformity = matches(&text, CONFORMITY_KEYWORDS);

    let (status, hits) = if !major.is_empty() {
        (FindingStatus::MajorNonconformity, major)
    } else if !minor.is_empty() {
        (FindingStatus::MinorNonconformity, minor)
    } else if !improvement.is_empty() {
        (FindingStatus::OpportunityForImprovement, improvement)
    } else if !conformity.is_empty() {
        (FindingStatus::Compliant, conformity)
    } else {
        // Evidence with no signal either way still shows something exists.
        (FindingStatus::OpportunityForImprovement, vec![])
    };

    HeuristicScore {
        status,
        keywords_matched: hits,
    }
}

#[async_trait]
impl Classifier for HeuristicClassifier {
    fn name(&self) -> &str {
        "heuristic"
    }

    async fn classify(&self, req: &ClassificationRequest) -> CoreResult<String> {
        let score = score_evidence(&format!("{}\n{}", req.evidence_text, req.tag_text));
        let reason = if score.keywords_matched.is_empty() {
            "Offline keyword review found no decisive indicators.".to_string()
        } else {
            format!(
                "Offline keyword review. Indicators found: {}.",
                score.keywords_matched.join(", ")
            )
        };
        let suggestion = match score.status {
            FindingStatus::Compliant | FindingStatus::NotApplicable => String::new(),
            _ => format!(
                "Review clause {} {} against the evidence with the process owner.",
                req.clause.code, req.clause.title
            ),
        };
        let body = json!({
            "clauseId": req.clause_id,
            "status": score.status.code(),
            "reason": reason,
            "suggestion": suggestion,
            "evidence": req.evidence_text,
            "conclusion_report": format!(
                "{} {}: {} (heuristic assessment, {}).",
                req.clause.code,
                req.clause.title,
                score.status.label(),
                req.standard_name
            ),
            "crossRefs": []
        });
        serde_json::to_string(&body).map_err(|e| CoreError::Classification(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn major_keywords_win_over_conformity() {
        let s = score_evidence("Procedure documented but internal audit never performed");
        assert_eq!(s.status, FindingStatus::MajorNonconformity);
        assert_eq!(s.keywords_matched, vec!["never performed".to_string()]);
    }

    #[test]
    fn conformity_only_is_compliant() {
        assert_eq!(score_evidence("Policy exists and is approved").status, FindingStatus::Compliant);
        assert_eq!(score_evidence("   ").status, FindingStatus::NotApplicable);
    }
}
