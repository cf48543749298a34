use crate::error::{CoreError, CoreResult};
use crate::standards::model::{placeholder_requirement, Standard};
use serde::{Deserialize, Serialize};

use super::model::{
    seeded_rows, ClauseId, EvidenceTag, MatrixData, MatrixRow, Process, ProcessId, UploadedFile,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClauseToggle {
    Added(Vec<MatrixRow>),
    Removed,
}

/// One entry of a bulk "select whole group" request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClauseSelection {
    pub process_id: ProcessId,
    pub clause_ids: Vec<ClauseId>,
}

/// The durable collection of processes, in creation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessStore {
    processes: Vec<Process>,
}

impl ProcessStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_processes(processes: Vec<Process>) -> Self {
        Self { processes }
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    pub fn processes(&self) -> &[Process] {
        &self.processes
    }

    pub fn snapshot(&self) -> Vec<Process> {
        self.processes.clone()
    }

    pub fn get(&self, id: &str) -> Option<&Process> {
        self.processes.iter().find(|p| p.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn first_id(&self) -> Option<ProcessId> {
        self.processes.first().map(|p| p.id.clone())
    }

    fn get_mut(&mut self, id: &str) -> CoreResult<&mut Process> {
        self.processes
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| CoreError::NotFound(format!("process {}", id)))
    }

    pub fn add(&mut self, name: &str) -> CoreResult<ProcessId> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::InvalidInput(
                "process name cannot be empty".to_string(),
            ));
        }
        let process = Process::new(name);
        let id = process.id.clone();
        self.processes.push(process);
        Ok(id)
    }

    pub fn rename(&mut self, id: &str, name: &str) -> CoreResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::InvalidInput(
                "process name cannot be empty".to_string(),
            ));
        }
        self.get_mut(id)?.name = name.to_string();
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> CoreResult<Process> {
        let idx = self
            .processes
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| CoreError::NotFound(format!("process {}", id)))?;
        Ok(self.processes.remove(idx))
    }

    /// Removes the clause entry when present (dropping any evidence typed
    /// into it), otherwise adds a single seeded row.
    pub fn toggle_clause(
        &mut self,
        process_id: &str,
        clause_id: &str,
        standard: Option<&Standard>,
    ) -> CoreResult<ClauseToggle> {
        let process = self.get_mut(process_id)?;
        if process.matrix_data.remove(clause_id).is_some() {
            return Ok(ClauseToggle::Removed);
        }
        let rows = seeded_rows(clause_id, requirement_for(standard, clause_id));
        process
            .matrix_data
            .insert(clause_id.to_string(), rows.clone());
        Ok(ClauseToggle::Added(rows))
    }

    /// Adds every listed clause that is missing. Existing entries are left
    /// untouched. Returns what was added per process.
    pub fn add_clauses(
        &mut self,
        selections: &[ClauseSelection],
        standard: Option<&Standard>,
    ) -> CoreResult<Vec<(ProcessId, ClauseId, Vec<MatrixRow>)>> {
        for sel in selections {
            if !self.contains(&sel.process_id) {
                return Err(CoreError::NotFound(format!("process {}", sel.process_id)));
            }
        }
        let mut added = Vec::new();
        for sel in selections {
            let process = self.get_mut(&sel.process_id)?;
            for clause_id in &sel.clause_ids {
                if process.matrix_data.contains_key(clause_id) {
                    continue;
                }
                let rows = seeded_rows(clause_id, requirement_for(standard, clause_id));
                process.matrix_data.insert(clause_id.clone(), rows.clone());
                added.push((sel.process_id.clone(), clause_id.clone(), rows));
            }
        }
        Ok(added)
    }

    /// Replace-if-different write of the live editing buffers. Returns
    /// whether anything changed.
    pub fn write_buffers(
        &mut self,
        id: &str,
        evidence: &str,
        matrix_data: &MatrixData,
        evidence_tags: &[EvidenceTag],
    ) -> CoreResult<bool> {
        let process = self.get_mut(id)?;
        let mut changed = false;
        if process.evidence != evidence {
            process.evidence = evidence.to_string();
            changed = true;
        }
        if &process.matrix_data != matrix_data {
            process.matrix_data = matrix_data.clone();
            changed = true;
        }
        if process.evidence_tags != evidence_tags {
            process.evidence_tags = evidence_tags.to_vec();
            changed = true;
        }
        Ok(changed)
    }

    /// Returns false when the name was blank or already present.
    pub fn add_interviewee(&mut self, id: &str, name: &str) -> CoreResult<bool> {
        let name = name.trim();
        let process = self.get_mut(id)?;
        if name.is_empty() || process.interviewees.iter().any(|n| n == name) {
            return Ok(false);
        }
        process.interviewees.push(name.to_string());
        Ok(true)
    }

    pub fn remove_interviewee(&mut self, id: &str, name: &str) -> CoreResult<bool> {
        let process = self.get_mut(id)?;
        let before = process.interviewees.len();
        process.interviewees.retain(|n| n != name.trim());
        Ok(process.interviewees.len() != before)
    }

    pub fn attach_file(&mut self, id: &str, file: UploadedFile) -> CoreResult<bool> {
        let process = self.get_mut(id)?;
        if process.uploaded_files.iter().any(|f| f.sha256 == file.sha256) {
            return Ok(false);
        }
        process.uploaded_files.push(file);
        Ok(true)
    }

    pub fn detach_file(&mut self, id: &str, sha256: &str) -> CoreResult<bool> {
        let process = self.get_mut(id)?;
        let before = process.uploaded_files.len();
        process.uploaded_files.retain(|f| f.sha256 != sha256);
        Ok(process.uploaded_files.len() != before)
    }
}

fn requirement_for(standard: Option<&Standard>, clause_id: &str) -> String {
    match standard {
        Some(s) => s.requirement_text(clause_id),
        None => placeholder_requirement(clause_id),
    }
}
