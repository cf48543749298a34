use crate::concurrency::runner::run_bounded;
use crate::config::AnalysisConfig;
use crate::determinism::ids::now_rfc3339_utc;
use crate::error::{CoreError, CoreResult};
use crate::notify::{Notice, NoticeLevel, Notifier};
use crate::process::model::Process;
use crate::standards::model::{ClauseDefinition, Standard};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::cache::AnalysisCache;
use super::classifier::{ClassificationRequest, Classifier, Credentials};
use super::finding::{Finding, FindingSource};
use super::payload::{build_payload, truncate_chars};
use super::response::{parse_classification, ParsedClassification};

/// One (process, clause) pair queued for classification. The process is a
/// snapshot taken when the queue was built.
#[derive(Debug, Clone)]
pub struct WorkItem {
    pub process: Process,
    pub clause_id: String,
    pub clause: ClauseDefinition,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisOutcome {
    pub queued: usize,
    pub findings: Vec<Finding>,
}

impl AnalysisOutcome {
    pub fn failed(&self) -> usize {
        self.queued - self.findings.len()
    }
}

struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn engage(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct AnalysisOrchestrator {
    classifier: Arc<dyn Classifier>,
    cache: Arc<AnalysisCache>,
    notifier: Arc<dyn Notifier>,
    config: AnalysisConfig,
    credentials: Credentials,
    busy: AtomicBool,
}

impl AnalysisOrchestrator {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        cache: Arc<AnalysisCache>,
        notifier: Arc<dyn Notifier>,
        config: AnalysisConfig,
    ) -> Self {
        Self {
            classifier,
            cache,
            notifier,
            config,
            credentials: Credentials::default(),
            busy: AtomicBool::new(false),
        }
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<AnalysisCache> {
        &self.cache
    }

    /// True while a batch or a single re-analysis is running.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Every (process, clause) with at least one supplied row whose clause
    /// resolves in `standard`. Unresolvable clauses are skipped.
    pub fn build_queue(standard: &Standard, processes: &[Process]) -> Vec<WorkItem> {
        let mut queue = Vec::new();
        for process in processes {
            for clause_id in process.clauses_with_evidence() {
                let Some(clause) = standard.clause_definition(clause_id) else {
                    debug!(process_id = %process.id, clause_id, "clause not in standard, skipped");
                    continue;
                };
                queue.push(WorkItem {
                    process: process.clone(),
                    clause_id: clause_id.to_string(),
                    clause,
                });
            }
        }
        queue
    }

    /// Classifies every clause with evidence across `processes`. Sends
    /// exactly one notice for the terminal outcome. The returned findings
    /// still have to be reconciled into the session's collection.
    pub async fn analyze(
        &self,
        standard: Option<&Standard>,
        processes: &[Process],
    ) -> CoreResult<AnalysisOutcome> {
        let result = match BusyGuard::engage(&self.busy) {
            Some(_guard) => self.run_batch(standard, processes).await,
            None => Err(CoreError::Configuration(
                "an analysis run is already in progress".to_string(),
            )),
        };

        match &result {
            Ok(outcome) if outcome.findings.is_empty() => self.notifier.notify(Notice::new(
                NoticeLevel::Warning,
                format!(
                    "Analysis finished without valid results ({} item(s) attempted).",
                    outcome.queued
                ),
            )),
            Ok(outcome) => self.notifier.notify(Notice::new(
                NoticeLevel::Success,
                format!("Analysis complete: {} finding(s) updated.", outcome.findings.len()),
            )),
            Err(CoreError::Configuration(msg)) => {
                self.notifier.notify(Notice::new(NoticeLevel::Warning, msg.clone()))
            }
            Err(e) => {
                error!(error = %e, "analysis batch failed");
                self.notifier.notify(Notice::new(
                    NoticeLevel::Error,
                    format!("Analysis failed: {}", e),
                ));
            }
        }
        result
    }

    async fn run_batch(
        &self,
        standard: Option<&Standard>,
        processes: &[Process],
    ) -> CoreResult<AnalysisOutcome> {
        let standard = standard.ok_or_else(|| {
            CoreError::Configuration("select a standard before running analysis".to_string())
        })?;
        if processes.is_empty() {
            return Err(CoreError::Configuration(
                "add at least one process before running analysis".to_string(),
            ));
        }

        let queue = Self::build_queue(standard, processes);
        if queue.is_empty() {
            return Err(CoreError::Configuration(
                "no evidence found: supply evidence for at least one clause".to_string(),
            ));
        }

        let queued = queue.len();
        info!(
            queued,
            standard = %standard.name,
            model_id = %self.config.model_id,
            classifier = self.classifier.name(),
            "analysis batch started"
        );
        let standard_name = standard.name.as_str();
        let results = run_bounded(queue, self.config.concurrency, move |item| {
            self.classify_or_skip(standard_name, item)
        })
        .await;
        let findings: Vec<Finding> = results.into_iter().flatten().collect();
        info!(queued, produced = findings.len(), "analysis batch finished");

        Ok(AnalysisOutcome { queued, findings })
    }

    async fn classify_or_skip(&self, standard_name: &str, item: WorkItem) -> Option<Finding> {
        match self.classify_item(standard_name, &item).await {
            Ok(finding) => Some(finding),
            Err(e) => {
                warn!(
                    process_id = %item.process.id,
                    clause_id = %item.clause_id,
                    error = %e,
                    "classification failed, item dropped from batch"
                );
                None
            }
        }
    }

    /// Cache-aware classification of one work item.
    pub async fn classify_item(&self, standard_name: &str, item: &WorkItem) -> CoreResult<Finding> {
        let payload = build_payload(&item.process, &item.clause_id, self.config.evidence_char_cap);
        let key = payload.cache_key(&item.clause_id, &item.process.id, &self.config.model_id);
        if let Some(hit) = self.cache.get(&key).await {
            debug!(process_id = %item.process.id, clause_id = %item.clause_id, cache_hit = true, "classification served from cache");
            return Ok(hit);
        }

        let req = ClassificationRequest {
            clause_id: item.clause_id.clone(),
            clause: item.clause.clone(),
            standard_name: standard_name.to_string(),
            evidence_text: payload.combined.clone(),
            tag_text: payload.tag_text.clone(),
            credentials: self.credentials.clone(),
            model_id: self.config.model_id.clone(),
        };
        let raw = self.classifier.classify(&req).await?;
        let parsed = parse_classification(&raw, &item.clause_id)?;
        let finding = bind_finding(
            parsed,
            &item.process.id,
            &item.process.name,
            &item.clause_id,
            &payload.raw_evidence,
            FindingSource::Remote,
        );
        self.cache.insert(key, finding.clone()).await;
        Ok(finding)
    }

    /// Fresh classification of one existing finding after the user edited
    /// its evidence. Never reads or writes the cache. `process` supplies the
    /// current name and tag excerpts when the process still exists.
    pub async fn reanalyze(
        &self,
        standard: &Standard,
        finding: &Finding,
        process: Option<&Process>,
    ) -> CoreResult<Finding> {
        let result = match BusyGuard::engage(&self.busy) {
            Some(_guard) => self.reanalyze_inner(standard, finding, process).await,
            None => Err(CoreError::Configuration(
                "an analysis run is already in progress".to_string(),
            )),
        };
        match &result {
            Ok(f) => self.notifier.notify(Notice::new(
                NoticeLevel::Success,
                format!("Clause {} re-evaluated: {}.", f.clause_id, f.status.label()),
            )),
            Err(e) => {
                warn!(clause_id = %finding.clause_id, process_id = %finding.process_id, error = %e, "re-analysis failed");
                self.notifier.notify(Notice::new(
                    NoticeLevel::Error,
                    format!("Re-evaluation of clause {} failed: {}", finding.clause_id, e),
                ));
            }
        }
        result
    }

    async fn reanalyze_inner(
        &self,
        standard: &Standard,
        finding: &Finding,
        process: Option<&Process>,
    ) -> CoreResult<Finding> {
        let clause = standard.clause_definition(&finding.clause_id).ok_or_else(|| {
            CoreError::NotFound(format!(
                "clause {} in {}",
                finding.clause_id, standard.name
            ))
        })?;
        let tag_text = process
            .map(|p| {
                p.tags_for_clause(&finding.clause_id)
                    .iter()
                    .map(|t| format!("- {}", t.text.trim()))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default();

        let req = ClassificationRequest {
            clause_id: finding.clause_id.clone(),
            clause,
            standard_name: standard.name.clone(),
            evidence_text: truncate_chars(&finding.evidence, self.config.evidence_char_cap),
            tag_text,
            credentials: self.credentials.clone(),
            model_id: self.config.model_id.clone(),
        };
        let raw = self.classifier.classify(&req).await?;
        let parsed = parse_classification(&raw, &finding.clause_id)?;

        let process_name = process
            .map(|p| p.name.as_str())
            .unwrap_or(finding.process_name.as_str());
        Ok(bind_finding(
            parsed,
            &finding.process_id,
            process_name,
            &finding.clause_id,
            &finding.evidence,
            FindingSource::Reanalysis,
        ))
    }
}

/// Turns a parsed response into a finding. The user's own evidence text
/// replaces whatever the model wrote, unless there is none.
fn bind_finding(
    parsed: ParsedClassification,
    process_id: &str,
    process_name: &str,
    clause_id: &str,
    raw_evidence: &str,
    source: FindingSource,
) -> Finding {
    let evidence = if raw_evidence.trim().is_empty() {
        parsed.evidence
    } else {
        raw_evidence.to_string()
    };
    Finding {
        clause_id: clause_id.to_string(),
        process_id: process_id.to_string(),
        process_name: process_name.to_string(),
        status: parsed.status,
        reason: parsed.reason,
        reason_translated: parsed.reason_translated,
        evidence,
        suggestion: parsed.suggestion,
        suggestion_translated: parsed.suggestion_translated,
        conclusion_report: parsed.conclusion_report,
        cross_refs: parsed.cross_refs,
        analyzed_at: now_rfc3339_utc(),
        source,
    }
}
