use crate::error::{CoreError, CoreResult};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::sync::OnceLock;

use super::finding::FindingStatus;

/// Classifier output after tolerant parsing, before it is bound to a
/// process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedClassification {
    pub clause_id: Option<String>,
    pub status: FindingStatus,
    pub reason: String,
    pub reason_translated: Option<String>,
    pub suggestion: String,
    pub suggestion_translated: Option<String>,
    pub evidence: String,
    pub conclusion_report: String,
    pub cross_refs: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawClassification {
    #[serde(default, alias = "clauseId")]
    clause_id: Option<String>,
    #[serde(default)]
    status: String,
    #[serde(default)]
    reason: String,
    #[serde(default, alias = "reasonTranslated", alias = "reason_vi")]
    reason_translated: Option<String>,
    #[serde(default)]
    suggestion: String,
    #[serde(default, alias = "suggestionTranslated", alias = "suggestion_vi")]
    suggestion_translated: Option<String>,
    #[serde(default)]
    evidence: String,
    #[serde(default, alias = "conclusionReport")]
    conclusion_report: String,
    #[serde(default, alias = "crossRefs")]
    cross_refs: Value,
}

fn fence_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"```(?:json|JSON)?\s*([\s\S]*?)```").ok())
        .as_ref()
}

/// Finds the first balanced JSON object or array in `text` that can hold a
/// classification, looking inside a markdown fence first. Bracketed prose
/// ("clause [4.1]", "{draft}") is skipped. String literals are skipped so
/// braces inside values do not confuse the scan.
pub fn extract_json(text: &str) -> Option<&str> {
    let body = fence_re()
        .and_then(|re| re.captures(text))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(text);

    let mut from = 0;
    while let Some(offset) = body[from..].find(['{', '[']) {
        let start = from + offset;
        if let Some(candidate) = balanced_from(body, start) {
            if holds_object(candidate) {
                return Some(candidate);
            }
        }
        from = start + 1;
    }
    None
}

fn holds_object(candidate: &str) -> bool {
    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(_)) => true,
        Ok(Value::Array(items)) => items.iter().any(Value::is_object),
        _ => false,
    }
}

fn balanced_from(body: &str, start: usize) -> Option<&str> {
    let bytes = body.as_bytes();
    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' | b'[' => depth += 1,
            b'}' | b']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&body[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parses one classification out of a model response. Arrays are accepted;
/// the element for `clause_id` wins, otherwise the first element.
pub fn parse_classification(text: &str, clause_id: &str) -> CoreResult<ParsedClassification> {
    let json = extract_json(text)
        .ok_or_else(|| CoreError::ResponseParse("no JSON object found".to_string()))?;
    let value: Value = serde_json::from_str(json)
        .map_err(|e| CoreError::ResponseParse(format!("invalid JSON: {}", e)))?;

    let item = match value {
        Value::Array(items) => {
            let matching = items.iter().position(|v| {
                ["clauseId", "clause_id"]
                    .iter()
                    .any(|k| v.get(*k).and_then(Value::as_str) == Some(clause_id))
            });
            let idx = matching.unwrap_or(0);
            items
                .into_iter()
                .nth(idx)
                .ok_or_else(|| CoreError::ResponseParse("empty result array".to_string()))?
        }
        other => other,
    };

    let raw: RawClassification = serde_json::from_value(item)
        .map_err(|e| CoreError::ResponseParse(format!("unexpected shape: {}", e)))?;
    let status = FindingStatus::parse_loose(&raw.status).ok_or_else(|| {
        CoreError::ResponseParse(format!("unrecognized status {:?}", raw.status))
    })?;

    Ok(ParsedClassification {
        clause_id: raw.clause_id.filter(|c| !c.trim().is_empty()),
        status,
        reason: raw.reason,
        reason_translated: raw.reason_translated.filter(|s| !s.trim().is_empty()),
        suggestion: raw.suggestion,
        suggestion_translated: raw.suggestion_translated.filter(|s| !s.trim().is_empty()),
        evidence: raw.evidence,
        conclusion_report: raw.conclusion_report,
        cross_refs: cross_refs_from(raw.cross_refs),
    })
}

fn cross_refs_from(v: Value) -> Vec<String> {
    let mut out: Vec<String> = match v {
        Value::String(s) => s
            .split([',', ';'])
            .map(|x| x.trim().to_string())
            .collect(),
        Value::Array(items) => items
            .into_iter()
            .filter_map(|x| match x {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };
    out.retain(|x| !x.is_empty());
    out.dedup();
    out
}
