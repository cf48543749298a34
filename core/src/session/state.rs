use crate::analysis::finding::{reconcile, sort_findings, Finding, FindingSource, FindingStatus};
use crate::analysis::orchestrator::{AnalysisOrchestrator, AnalysisOutcome};
use crate::error::{CoreError, CoreResult};
use crate::process::model::{Process, ProcessId, UploadedFile};
use crate::process::store::{ClauseSelection, ClauseToggle, ProcessStore};
use crate::process::sync::ActiveContext;
use crate::standards::library::StandardLibrary;
use crate::standards::model::Standard;
use tracing::{info, warn};

use super::autosave::SessionAutosave;
use super::snapshot::{AuditInfo, SessionSnapshot, SESSION_SCHEMA_VERSION};
use super::store::SessionStore;

/// One audit workspace: the selected standard, the process store, the live
/// editing context and the findings produced so far.
///
/// Every structural store mutation first flushes pending buffer edits and
/// then mirrors its effect into the live buffers, so the two never diverge.
#[derive(Debug, Clone, Default)]
pub struct AuditSession {
    standard: Option<Standard>,
    store: ProcessStore,
    context: ActiveContext,
    findings: Vec<Finding>,
    audit_info: AuditInfo,
    report_text: String,
}

impl AuditSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn standard(&self) -> Option<&Standard> {
        self.standard.as_ref()
    }

    pub fn select_standard(&mut self, library: &StandardLibrary, key: &str) -> CoreResult<()> {
        let standard = library
            .get(key)
            .ok_or_else(|| CoreError::NotFound(format!("standard {}", key)))?;
        self.standard = Some(standard.clone());
        Ok(())
    }

    pub fn store(&self) -> &ProcessStore {
        &self.store
    }

    pub fn processes(&self) -> &[Process] {
        self.store.processes()
    }

    pub fn context(&self) -> &ActiveContext {
        &self.context
    }

    /// Buffer edits go through here. They reach the store on the next
    /// [`AuditSession::flush_buffers`] or structural mutation.
    pub fn context_mut(&mut self) -> &mut ActiveContext {
        &mut self.context
    }

    pub fn flush_buffers(&mut self) -> CoreResult<bool> {
        self.context.flush(&mut self.store)
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn audit_info(&self) -> &AuditInfo {
        &self.audit_info
    }

    pub fn set_audit_info(&mut self, info: AuditInfo) {
        self.audit_info = info;
    }

    pub fn report_text(&self) -> &str {
        &self.report_text
    }

    pub fn set_report_text(&mut self, text: impl Into<String>) {
        self.report_text = text.into();
    }

    /// Creates a process and makes it the active, loaded one.
    pub fn add_process(&mut self, name: &str) -> CoreResult<ProcessId> {
        self.flush_buffers()?;
        let id = self.store.add(name)?;
        self.context
            .select_and_load(Some(id.clone()), &mut self.store)?;
        info!(process_id = %id, "process added");
        Ok(id)
    }

    pub fn rename_process(&mut self, id: &str, name: &str) -> CoreResult<()> {
        self.store.rename(id, name)
    }

    /// Removes a process. When it was selected, the first remaining process
    /// (or none) becomes active. Findings for it are kept.
    pub fn delete_process(&mut self, id: &str) -> CoreResult<()> {
        self.flush_buffers()?;
        self.store.remove(id)?;
        if self.context.selected_id() == Some(id) {
            self.context.select(self.store.first_id());
        }
        self.context.load_selected(&mut self.store)?;
        info!(process_id = %id, "process deleted");
        Ok(())
    }

    pub fn select_process(&mut self, id: Option<ProcessId>) -> CoreResult<()> {
        if let Some(id) = id.as_deref() {
            if !self.store.contains(id) {
                return Err(CoreError::NotFound(format!("process {}", id)));
            }
        }
        self.context.select_and_load(id, &mut self.store)?;
        Ok(())
    }

    /// Removing a clause discards its rows and evidence; callers confirm
    /// that with the user first.
    pub fn toggle_clause(&mut self, process_id: &str, clause_id: &str) -> CoreResult<ClauseToggle> {
        self.flush_buffers()?;
        let toggle = self
            .store
            .toggle_clause(process_id, clause_id, self.standard.as_ref())?;
        match &toggle {
            ClauseToggle::Added(rows) => {
                self.context.mirror_clause_added(process_id, clause_id, rows)
            }
            ClauseToggle::Removed => self.context.mirror_clause_removed(process_id, clause_id),
        }
        Ok(toggle)
    }

    /// Additive only. Returns how many clause entries were created.
    pub fn batch_toggle_clauses(&mut self, selections: &[ClauseSelection]) -> CoreResult<usize> {
        self.flush_buffers()?;
        let added = self.store.add_clauses(selections, self.standard.as_ref())?;
        for (process_id, clause_id, rows) in &added {
            self.context.mirror_clause_added(process_id, clause_id, rows);
        }
        Ok(added.len())
    }

    /// Adds every clause of a standard group to each listed process.
    pub fn select_clause_group(
        &mut self,
        process_ids: &[ProcessId],
        group_id: &str,
    ) -> CoreResult<usize> {
        let standard = self.standard.as_ref().ok_or_else(|| {
            CoreError::Configuration("select a standard before choosing clauses".to_string())
        })?;
        let clause_ids = standard.group_clause_ids(group_id);
        if clause_ids.is_empty() {
            return Err(CoreError::NotFound(format!(
                "clause group {} in {}",
                group_id, standard.name
            )));
        }
        let selections: Vec<ClauseSelection> = process_ids
            .iter()
            .map(|pid| ClauseSelection {
                process_id: pid.clone(),
                clause_ids: clause_ids.clone(),
            })
            .collect();
        self.batch_toggle_clauses(&selections)
    }

    pub fn add_interviewee(&mut self, process_id: &str, name: &str) -> CoreResult<bool> {
        self.store.add_interviewee(process_id, name)
    }

    pub fn remove_interviewee(&mut self, process_id: &str, name: &str) -> CoreResult<bool> {
        self.store.remove_interviewee(process_id, name)
    }

    pub fn attach_file(&mut self, process_id: &str, file: UploadedFile) -> CoreResult<bool> {
        self.store.attach_file(process_id, file)
    }

    pub fn detach_file(&mut self, process_id: &str, sha256: &str) -> CoreResult<bool> {
        self.store.detach_file(process_id, sha256)
    }

    fn finding_mut(&mut self, clause_id: &str, process_id: &str) -> CoreResult<&mut Finding> {
        self.findings
            .iter_mut()
            .find(|f| f.clause_id == clause_id && f.process_id == process_id)
            .ok_or_else(|| {
                CoreError::NotFound(format!("finding for clause {} in process {}", clause_id, process_id))
            })
    }

    pub fn override_finding_status(
        &mut self,
        clause_id: &str,
        process_id: &str,
        status: FindingStatus,
    ) -> CoreResult<()> {
        let finding = self.finding_mut(clause_id, process_id)?;
        finding.status = status;
        finding.source = FindingSource::Manual;
        Ok(())
    }

    /// Replaces the evidence text of a finding ahead of a re-analysis.
    pub fn edit_finding_evidence(
        &mut self,
        clause_id: &str,
        process_id: &str,
        text: impl Into<String>,
    ) -> CoreResult<()> {
        self.finding_mut(clause_id, process_id)?.evidence = text.into();
        Ok(())
    }

    /// Flushes the buffers, analyzes a snapshot of every process and merges
    /// the results into the findings in one step.
    pub async fn run_analysis(
        &mut self,
        orchestrator: &AnalysisOrchestrator,
    ) -> CoreResult<AnalysisOutcome> {
        self.flush_buffers()?;
        let processes = self.store.snapshot();
        let outcome = orchestrator
            .analyze(self.standard.as_ref(), &processes)
            .await?;
        self.findings = reconcile(&self.findings, outcome.findings.clone());
        Ok(outcome)
    }

    pub async fn reanalyze_finding(
        &mut self,
        orchestrator: &AnalysisOrchestrator,
        clause_id: &str,
        process_id: &str,
    ) -> CoreResult<Finding> {
        let standard = self.standard.as_ref().ok_or_else(|| {
            CoreError::Configuration("select a standard before re-analysis".to_string())
        })?;
        let current = self
            .findings
            .iter()
            .find(|f| f.clause_id == clause_id && f.process_id == process_id)
            .cloned()
            .ok_or_else(|| {
                CoreError::NotFound(format!("finding for clause {} in process {}", clause_id, process_id))
            })?;
        let process = self.store.get(process_id);
        let fresh = orchestrator.reanalyze(standard, &current, process).await?;
        self.findings = reconcile(&self.findings, vec![fresh.clone()]);
        Ok(fresh)
    }

    /// Persistable view of the session. Unflushed buffer edits are included
    /// for the loaded process without touching the store.
    pub fn snapshot(&self) -> SessionSnapshot {
        let mut processes = self.store.snapshot();
        if self.context.is_dirty() {
            if let Some(loaded) = self.context.loaded_id() {
                if let Some(p) = processes.iter_mut().find(|p| p.id == loaded) {
                    let buffers = self.context.buffers();
                    p.evidence = buffers.evidence.clone();
                    p.matrix_data = buffers.matrix_data.clone();
                    p.evidence_tags = buffers.evidence_tags.clone();
                }
            }
        }
        SessionSnapshot {
            schema_version: SESSION_SCHEMA_VERSION,
            standard_key: self.standard.as_ref().map(|s| s.key.clone()),
            audit_info: self.audit_info.clone(),
            processes,
            active_process_id: self.context.selected_id().map(str::to_string),
            findings: self.findings.clone(),
            report_text: self.report_text.clone(),
            saved_at: String::new(),
        }
        .stamped()
    }

    /// Rebuilds a session. The saved active process is loaded, or the first
    /// process when it no longer exists. An unknown standard key leaves the
    /// session without a standard.
    pub fn restore(snapshot: SessionSnapshot, library: &StandardLibrary) -> CoreResult<Self> {
        let standard = match snapshot.standard_key.as_deref() {
            Some(key) => {
                let found = library.get(key).cloned();
                if found.is_none() {
                    warn!(standard_key = key, "saved standard is not available");
                }
                found
            }
            None => None,
        };

        let mut processes = snapshot.processes;
        for process in &mut processes {
            for row in process.matrix_data.values_mut().flatten() {
                let text = row.evidence_input().to_string();
                row.set_evidence(text);
            }
        }
        let mut store = ProcessStore::from_processes(processes);

        let active = snapshot
            .active_process_id
            .filter(|id| store.contains(id))
            .or_else(|| store.first_id());
        let mut context = ActiveContext::new();
        context.select_and_load(active, &mut store)?;

        let mut findings = snapshot.findings;
        sort_findings(&mut findings);

        Ok(Self {
            standard,
            store,
            context,
            findings,
            audit_info: snapshot.audit_info,
            report_text: snapshot.report_text,
        })
    }

    /// Clears everything, findings included.
    pub fn reset(&mut self) {
        *self = Self::new();
        info!("session reset");
    }

    /// Hands the current snapshot to the debounced writer.
    pub fn schedule_autosave(&self, autosave: &SessionAutosave) -> CoreResult<()> {
        autosave.schedule(&self.snapshot())
    }

    pub fn save_to(&self, store: &dyn SessionStore, key: &str) -> CoreResult<()> {
        store.save(key, &self.snapshot().to_value()?)
    }

    pub fn load_from(
        store: &dyn SessionStore,
        key: &str,
        library: &StandardLibrary,
    ) -> CoreResult<Option<Self>> {
        match store.load(key)? {
            Some(value) => Ok(Some(Self::restore(SessionSnapshot::from_value(value)?, library)?)),
            None => Ok(None),
        }
    }
}
