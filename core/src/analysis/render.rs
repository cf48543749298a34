use crate::error::CoreResult;
use crate::session::snapshot::AuditInfo;

use super::finding::{sort_findings, Finding, FindingStatus};

const STATUS_ORDER: [FindingStatus; 5] = [
    FindingStatus::Compliant,
    FindingStatus::MinorNonconformity,
    FindingStatus::MajorNonconformity,
    FindingStatus::OpportunityForImprovement,
    FindingStatus::NotApplicable,
];

pub fn render_findings_csv(findings: &[Finding]) -> CoreResult<String> {
    let mut rows = findings.to_vec();
    sort_findings(&mut rows);

    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(vec![]);
    wtr.write_record([
        "clause_id",
        "process_id",
        "process_name",
        "status",
        "reason",
        "evidence",
        "suggestion",
        "conclusion_report",
        "cross_refs",
        "analyzed_at",
    ])?;
    for row in rows {
        wtr.write_record([
            row.clause_id,
            row.process_id,
            row.process_name,
            row.status.code().to_string(),
            row.reason,
            row.evidence,
            row.suggestion,
            row.conclusion_report,
            row.cross_refs.join(";"),
            row.analyzed_at,
        ])?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', "<br>")
}

pub fn render_findings_markdown(
    findings: &[Finding],
    info: &AuditInfo,
    standard_name: &str,
) -> String {
    let mut rows = findings.to_vec();
    sort_findings(&mut rows);

    let mut out = Vec::new();
    out.push("# Audit Report".to_string());
    out.push("".to_string());
    out.push(format!("- Standard: {}", standard_name));
    for (label, value) in [
        ("Organization", &info.organization),
        ("Audit type", &info.audit_type),
        ("Auditor", &info.auditor),
        ("Lead auditor", &info.lead_auditor),
        ("Audit date", &info.audit_date),
        ("Scope", &info.scope),
    ] {
        if !value.trim().is_empty() {
            out.push(format!("- {}: {}", label, value.trim()));
        }
    }
    out.push("".to_string());

    out.push("## Summary".to_string());
    out.push("".to_string());
    out.push("| Status | Count |".to_string());
    out.push("|---|---|".to_string());
    for status in STATUS_ORDER {
        let count = rows.iter().filter(|f| f.status == status).count();
        out.push(format!("| {} | {} |", status.label(), count));
    }
    out.push("".to_string());

    if rows.is_empty() {
        out.push("No findings recorded.".to_string());
        out.push("".to_string());
        return out.join("\n");
    }

    // Group by process, first-seen order after the clause sort.
    let mut processes: Vec<(&str, &str)> = Vec::new();
    for f in &rows {
        if !processes.iter().any(|(id, _)| *id == f.process_id) {
            processes.push((f.process_id.as_str(), f.process_name.as_str()));
        }
    }
    for (process_id, process_name) in processes {
        out.push(format!("## {}", process_name));
        out.push("".to_string());
        out.push("| Clause | Status | Reason | Evidence | Suggestion |".to_string());
        out.push("|---|---|---|---|---|".to_string());
        for f in rows.iter().filter(|f| f.process_id == process_id) {
            out.push(format!(
                "| {} | {} | {} | {} | {} |",
                f.clause_id,
                f.status.label(),
                cell(&f.reason),
                cell(&f.evidence),
                cell(&f.suggestion)
            ));
        }
        out.push("".to_string());
    }
    out.join("\n")
}
