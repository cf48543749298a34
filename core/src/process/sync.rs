use crate::error::{CoreError, CoreResult};
use tracing::debug;

use super::model::{EvidenceTag, MatrixData, MatrixRow, ProcessId};
use super::store::ProcessStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncState {
    Unloaded,
    Loaded(ProcessId),
}

/// The editing buffers the UI binds to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveBuffers {
    pub evidence: String,
    pub matrix_data: MatrixData,
    pub evidence_tags: Vec<EvidenceTag>,
}

/// Bridges exactly one process record and the live editing buffers.
///
/// Selection intent (`selected`) and write destination (`state`) are kept
/// apart. A selection change only records intent; buffers are swapped by
/// [`ActiveContext::load_selected`]. Until that happens every write-back
/// still lands in the process whose data the buffers hold, so an edit racing
/// a process switch can never bleed into the newly selected process.
#[derive(Debug, Clone)]
pub struct ActiveContext {
    selected: Option<ProcessId>,
    state: SyncState,
    buffers: LiveBuffers,
    dirty: bool,
}

impl Default for ActiveContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ActiveContext {
    pub fn new() -> Self {
        Self {
            selected: None,
            state: SyncState::Unloaded,
            buffers: LiveBuffers::default(),
            dirty: false,
        }
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn loaded_id(&self) -> Option<&str> {
        match &self.state {
            SyncState::Loaded(id) => Some(id),
            SyncState::Unloaded => None,
        }
    }

    pub fn state(&self) -> &SyncState {
        &self.state
    }

    pub fn buffers(&self) -> &LiveBuffers {
        &self.buffers
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn select(&mut self, id: Option<ProcessId>) {
        self.selected = id;
    }

    /// Load-on-select transition. No-op when the selection already matches
    /// the loaded process, which keeps in-flight edits intact. Pending edits
    /// are written to the outgoing process before the buffers are replaced.
    /// Returns whether the buffers were swapped.
    pub fn load_selected(&mut self, store: &mut ProcessStore) -> CoreResult<bool> {
        if self.selected.as_deref() == self.loaded_id() {
            return Ok(false);
        }
        if let Some(loaded) = self.loaded_id() {
            if store.contains(loaded) {
                self.flush(store)?;
            }
        }

        let target = self
            .selected
            .as_deref()
            .and_then(|id| store.get(id))
            .cloned();
        match target {
            Some(process) => {
                debug!(process_id = %process.id, "loading process into live buffers");
                self.buffers = LiveBuffers {
                    evidence: process.evidence,
                    matrix_data: process.matrix_data,
                    evidence_tags: process.evidence_tags,
                };
                self.state = SyncState::Loaded(process.id);
            }
            None => {
                debug!("no process selected, clearing live buffers");
                self.selected = None;
                self.buffers = LiveBuffers::default();
                self.state = SyncState::Unloaded;
            }
        }
        self.dirty = false;
        Ok(true)
    }

    pub fn select_and_load(
        &mut self,
        id: Option<ProcessId>,
        store: &mut ProcessStore,
    ) -> CoreResult<bool> {
        self.select(id);
        self.load_selected(store)
    }

    /// Write-back of the buffers. Always targets the loaded process, never
    /// the selected one, and skips the store when nothing differs.
    pub fn flush(&mut self, store: &mut ProcessStore) -> CoreResult<bool> {
        let Some(loaded) = self.loaded_id().map(str::to_string) else {
            return Ok(false);
        };
        if !self.dirty {
            return Ok(false);
        }
        let changed = store.write_buffers(
            &loaded,
            &self.buffers.evidence,
            &self.buffers.matrix_data,
            &self.buffers.evidence_tags,
        )?;
        self.dirty = false;
        if changed {
            debug!(process_id = %loaded, "live buffers written back");
        }
        Ok(changed)
    }

    fn require_loaded(&self) -> CoreResult<()> {
        if self.loaded_id().is_none() {
            return Err(CoreError::InvalidInput(
                "no process is loaded for editing".to_string(),
            ));
        }
        Ok(())
    }

    fn row_mut(&mut self, clause_id: &str, row_id: &str) -> CoreResult<&mut MatrixRow> {
        self.require_loaded()?;
        self.buffers
            .matrix_data
            .get_mut(clause_id)
            .and_then(|rows| rows.iter_mut().find(|r| r.id == row_id))
            .ok_or_else(|| {
                CoreError::NotFound(format!("matrix row {} in clause {}", row_id, clause_id))
            })
    }

    pub fn set_evidence(&mut self, text: impl Into<String>) -> CoreResult<()> {
        self.require_loaded()?;
        let text = text.into();
        if self.buffers.evidence != text {
            self.buffers.evidence = text;
            self.dirty = true;
        }
        Ok(())
    }

    pub fn append_evidence(&mut self, text: &str) -> CoreResult<()> {
        self.require_loaded()?;
        if text.trim().is_empty() {
            return Ok(());
        }
        if !self.buffers.evidence.is_empty() && !self.buffers.evidence.ends_with('\n') {
            self.buffers.evidence.push('\n');
        }
        self.buffers.evidence.push_str(text.trim());
        self.dirty = true;
        Ok(())
    }

    pub fn set_row_evidence(
        &mut self,
        clause_id: &str,
        row_id: &str,
        text: impl Into<String>,
    ) -> CoreResult<()> {
        let text = text.into();
        let row = self.row_mut(clause_id, row_id)?;
        if row.evidence_input() == text {
            return Ok(());
        }
        row.set_evidence(text);
        self.dirty = true;
        Ok(())
    }

    pub fn append_row_evidence(&mut self, clause_id: &str, row_id: &str, text: &str) -> CoreResult<()> {
        let row = self.row_mut(clause_id, row_id)?;
        let before = row.evidence_input().len();
        row.append_evidence(text);
        if row.evidence_input().len() != before {
            self.dirty = true;
        }
        Ok(())
    }

    pub fn clear_row_evidence(&mut self, clause_id: &str, row_id: &str) -> CoreResult<()> {
        self.set_row_evidence(clause_id, row_id, String::new())
    }

    pub fn add_tag(&mut self, tag: EvidenceTag) -> CoreResult<()> {
        self.require_loaded()?;
        if tag.text.trim().is_empty() {
            return Err(CoreError::InvalidInput("tag text cannot be empty".to_string()));
        }
        self.buffers.evidence_tags.push(tag);
        self.dirty = true;
        Ok(())
    }

    pub fn remove_tag(&mut self, tag_id: &str) -> CoreResult<bool> {
        self.require_loaded()?;
        let before = self.buffers.evidence_tags.len();
        self.buffers.evidence_tags.retain(|t| t.id != tag_id);
        let removed = self.buffers.evidence_tags.len() != before;
        if removed {
            self.dirty = true;
        }
        Ok(removed)
    }

    /// Applies a clause removal already made in the store, when it targeted
    /// the loaded process.
    pub fn mirror_clause_removed(&mut self, process_id: &str, clause_id: &str) {
        if self.loaded_id() == Some(process_id) {
            self.buffers.matrix_data.remove(clause_id);
        }
    }

    pub fn mirror_clause_added(&mut self, process_id: &str, clause_id: &str, rows: &[MatrixRow]) {
        if self.loaded_id() == Some(process_id) {
            self.buffers
                .matrix_data
                .entry(clause_id.to_string())
                .or_insert_with(|| rows.to_vec());
        }
    }
}
