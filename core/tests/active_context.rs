use audit_core::process::model::EvidenceTag;
use audit_core::process::store::ProcessStore;
use audit_core::process::sync::{ActiveContext, SyncState};
use audit_core::session::state::AuditSession;
use audit_core::standards::library::{StandardLibrary, ISO_9001};

fn two_processes() -> (ProcessStore, String, String) {
    let mut store = ProcessStore::new();
    let a = store.add("Purchasing").unwrap();
    let b = store.add("Sales").unwrap();
    (store, a, b)
}

#[test]
fn selecting_records_intent_without_swapping_buffers() {
    let (mut store, a, b) = two_processes();
    let mut ctx = ActiveContext::new();
    ctx.select_and_load(Some(a.clone()), &mut store).unwrap();
    ctx.set_evidence("notes for A").unwrap();

    ctx.select(Some(b.clone()));
    assert_eq!(ctx.selected_id(), Some(b.as_str()));
    assert_eq!(ctx.loaded_id(), Some(a.as_str()));
    assert_eq!(ctx.buffers().evidence, "notes for A");
}

#[test]
fn write_back_during_a_switch_lands_in_the_loaded_process() {
    let (mut store, a, b) = two_processes();
    let mut ctx = ActiveContext::new();
    ctx.select_and_load(Some(a.clone()), &mut store).unwrap();

    // User types in A, then picks B; the debounced write-back fires before
    // B's data has been loaded.
    ctx.set_evidence("typed into A").unwrap();
    ctx.select(Some(b.clone()));
    assert!(ctx.flush(&mut store).unwrap());

    assert_eq!(store.get(&a).unwrap().evidence, "typed into A");
    assert_eq!(store.get(&b).unwrap().evidence, "");

    ctx.load_selected(&mut store).unwrap();
    assert_eq!(ctx.state(), &SyncState::Loaded(b.clone()));
    assert_eq!(ctx.buffers().evidence, "");
}

#[test]
fn load_flushes_unsaved_edits_to_the_outgoing_process() {
    let (mut store, a, b) = two_processes();
    let mut ctx = ActiveContext::new();
    ctx.select_and_load(Some(a.clone()), &mut store).unwrap();
    ctx.set_evidence("last keystrokes").unwrap();

    ctx.select_and_load(Some(b.clone()), &mut store).unwrap();
    assert_eq!(store.get(&a).unwrap().evidence, "last keystrokes");
    assert_eq!(store.get(&b).unwrap().evidence, "");
    assert!(!ctx.is_dirty());
}

#[test]
fn reselecting_the_loaded_process_is_a_no_op() {
    let (mut store, a, _) = two_processes();
    let mut ctx = ActiveContext::new();
    ctx.select_and_load(Some(a.clone()), &mut store).unwrap();
    ctx.set_evidence("in flight").unwrap();
    assert!(!ctx.select_and_load(Some(a.clone()), &mut store).unwrap());
    assert_eq!(ctx.buffers().evidence, "in flight");
    assert!(ctx.is_dirty());
}

#[test]
fn flush_skips_identical_buffers() {
    let (mut store, a, _) = two_processes();
    let mut ctx = ActiveContext::new();
    ctx.select_and_load(Some(a.clone()), &mut store).unwrap();
    ctx.set_evidence("x").unwrap();
    ctx.set_evidence("").unwrap();
    assert!(!ctx.flush(&mut store).unwrap());
    assert!(!ctx.flush(&mut store).unwrap());
}

#[test]
fn selecting_nothing_or_a_missing_process_unloads() {
    let (mut store, a, _) = two_processes();
    let mut ctx = ActiveContext::new();
    ctx.select_and_load(Some(a.clone()), &mut store).unwrap();
    ctx.select_and_load(Some("p_gone".to_string()), &mut store).unwrap();
    assert_eq!(ctx.state(), &SyncState::Unloaded);
    assert_eq!(ctx.selected_id(), None);
    assert!(ctx.set_evidence("nowhere to go").is_err());
    assert!(!ctx.flush(&mut store).unwrap());
}

#[test]
fn tag_edits_require_text_and_reach_the_store() {
    let (mut store, a, _) = two_processes();
    let mut ctx = ActiveContext::new();
    ctx.select_and_load(Some(a.clone()), &mut store).unwrap();
    assert!(ctx.add_tag(EvidenceTag::new("8.4", "  ")).is_err());
    let tag = EvidenceTag::new("8.4", "Supplier list reviewed 2024");
    let tag_id = tag.id.clone();
    ctx.add_tag(tag).unwrap();
    ctx.flush(&mut store).unwrap();
    assert_eq!(store.get(&a).unwrap().evidence_tags.len(), 1);

    assert!(ctx.remove_tag(&tag_id).unwrap());
    ctx.flush(&mut store).unwrap();
    assert!(store.get(&a).unwrap().evidence_tags.is_empty());
}

#[test]
fn clause_toggles_mirror_into_the_loaded_buffers() {
    let library = StandardLibrary::builtin();
    let mut session = AuditSession::new();
    session.select_standard(&library, ISO_9001).unwrap();
    let a = session.add_process("Purchasing").unwrap();
    let b = session.add_process("Sales").unwrap();
    assert_eq!(session.context().loaded_id(), Some(b.as_str()));

    // Toggling a clause on a process that is not loaded leaves the buffers alone.
    session.toggle_clause(&a, "8.4").unwrap();
    assert!(session.context().buffers().matrix_data.is_empty());

    session.toggle_clause(&b, "8.2").unwrap();
    assert!(session.context().buffers().matrix_data.contains_key("8.2"));

    session
        .context_mut()
        .set_row_evidence("8.2", "8.2-0", "Order review checklist in use")
        .unwrap();
    session.toggle_clause(&b, "8.2").unwrap();
    assert!(!session.context().buffers().matrix_data.contains_key("8.2"));
    assert!(!session.store().get(&b).unwrap().matrix_data.contains_key("8.2"));
}

#[test]
fn deleting_the_active_process_activates_the_first_remaining() {
    let mut session = AuditSession::new();
    let a = session.add_process("A").unwrap();
    let b = session.add_process("B").unwrap();
    session.context_mut().set_evidence("B notes").unwrap();

    session.delete_process(&b).unwrap();
    assert_eq!(session.context().selected_id(), Some(a.as_str()));
    assert_eq!(session.context().loaded_id(), Some(a.as_str()));
    assert_eq!(session.context().buffers().evidence, "");

    session.delete_process(&a).unwrap();
    assert_eq!(session.context().state(), &SyncState::Unloaded);
    assert!(session.processes().is_empty());
}
