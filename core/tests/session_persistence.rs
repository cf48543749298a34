use audit_core::analysis::finding::{Finding, FindingSource, FindingStatus};
use audit_core::config::SessionConfig;
use audit_core::error::CoreResult;
use audit_core::process::model::RowStatus;
use audit_core::session::autosave::SessionAutosave;
use audit_core::session::snapshot::{AuditInfo, SessionSnapshot};
use audit_core::session::state::AuditSession;
use audit_core::session::store::{FileSessionStore, MemorySessionStore, SessionStore};
use audit_core::standards::library::{StandardLibrary, ISO_14001};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn populated_session(library: &StandardLibrary) -> (AuditSession, String, String) {
    let mut session = AuditSession::new();
    session.select_standard(library, ISO_14001).unwrap();
    session.set_audit_info(AuditInfo {
        organization: "Acme Plastics".to_string(),
        auditor: "R. Auditor".to_string(),
        ..AuditInfo::default()
    });
    let a = session.add_process("Waste handling").unwrap();
    session.toggle_clause(&a, "6.1").unwrap();
    session
        .context_mut()
        .set_row_evidence("6.1", "6.1-0", "Aspects register maintained")
        .unwrap();
    let b = session.add_process("Logistics").unwrap();
    session.add_interviewee(&b, "Warehouse lead").unwrap();
    session.select_process(Some(a.clone())).unwrap();
    session.context_mut().set_evidence("unsaved note").unwrap();
    (session, a, b)
}

#[test]
fn snapshot_uses_camel_case_and_includes_unflushed_edits() {
    let library = StandardLibrary::builtin();
    let (session, a, _) = populated_session(&library);
    let value = session.snapshot().to_value().unwrap();

    assert_eq!(value["standardKey"], "ISO_14001");
    assert_eq!(value["activeProcessId"], Value::String(a.clone()));
    assert_eq!(value["auditInfo"]["organization"], "Acme Plastics");
    let first = &value["processes"][0];
    assert_eq!(first["evidence"], "unsaved note");
    assert_eq!(first["matrixData"]["6.1"][0]["evidenceInput"], "Aspects register maintained");
    assert_eq!(first["matrixData"]["6.1"][0]["status"], "supplied");
    assert!(first.get("evidenceTags").is_some());

    // Taking the snapshot did not write into the store.
    assert_eq!(session.store().get(&a).unwrap().evidence, "");
}

#[test]
fn file_store_round_trip_restores_the_active_process() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileSessionStore::open(dir.path().join("session")).unwrap();
    let library = StandardLibrary::builtin();
    let (session, a, b) = populated_session(&library);
    session.save_to(&store, "audit_session").unwrap();

    let restored = AuditSession::load_from(&store, "audit_session", &library)
        .unwrap()
        .unwrap();
    assert_eq!(restored.standard().map(|s| s.key.as_str()), Some(ISO_14001));
    assert_eq!(restored.processes().len(), 2);
    assert_eq!(restored.context().selected_id(), Some(a.as_str()));
    assert_eq!(restored.context().loaded_id(), Some(a.as_str()));
    assert_eq!(restored.context().buffers().evidence, "unsaved note");
    assert_eq!(
        restored.store().get(&b).unwrap().interviewees,
        vec!["Warehouse lead".to_string()]
    );
    assert_eq!(restored.audit_info().auditor, "R. Auditor");

    assert!(AuditSession::load_from(&store, "other", &library).unwrap().is_none());
}

#[test]
fn restore_normalizes_statuses_and_falls_back_to_first_process() {
    let raw = serde_json::json!({
        "schemaVersion": 1,
        "standardKey": "ISO_9001",
        "processes": [
            {
                "id": "p_1",
                "name": "Design",
                "matrixData": {
                    "8.2": [
                        {"id": "8.2-0", "requirement": "r", "evidenceInput": "Review records", "status": "pending"},
                        {"id": "8.2-1", "requirement": "r", "evidenceInput": "", "status": "supplied"}
                    ]
                }
            },
            {"id": "p_2", "name": "Build"}
        ],
        "activeProcessId": "p_deleted",
        "findings": []
    });
    let snapshot = SessionSnapshot::from_value(raw).unwrap();
    let session = AuditSession::restore(snapshot, &StandardLibrary::builtin()).unwrap();

    assert_eq!(session.context().loaded_id(), Some("p_1"));
    let rows = &session.context().buffers().matrix_data["8.2"];
    assert_eq!(rows[0].status(), RowStatus::Supplied);
    assert_eq!(rows[1].status(), RowStatus::Pending);
}

#[test]
fn unknown_standard_and_newer_schema() {
    let snapshot = SessionSnapshot {
        standard_key: Some("ISO_45001".to_string()),
        ..SessionSnapshot::default()
    };
    let session = AuditSession::restore(snapshot, &StandardLibrary::builtin()).unwrap();
    assert!(session.standard().is_none());

    let err = SessionSnapshot::from_value(serde_json::json!({"schemaVersion": 99}));
    assert!(err.is_err());
}

#[test]
fn reset_clears_findings_and_everything_else() {
    let library = StandardLibrary::builtin();
    let (session, a, _) = populated_session(&library);
    let mut snapshot = session.snapshot();
    snapshot.findings.push(Finding {
        clause_id: "6.1".to_string(),
        process_id: a.clone(),
        process_name: "Waste handling".to_string(),
        status: FindingStatus::Compliant,
        reason: "ok".to_string(),
        reason_translated: None,
        evidence: "Aspects register maintained".to_string(),
        suggestion: String::new(),
        suggestion_translated: None,
        conclusion_report: String::new(),
        cross_refs: vec![],
        analyzed_at: String::new(),
        source: FindingSource::Remote,
    });
    let mut session = AuditSession::restore(snapshot, &library).unwrap();
    assert_eq!(session.findings().len(), 1);

    // Deleting a process keeps its findings.
    session.delete_process(&a).unwrap();
    assert_eq!(session.findings().len(), 1);

    session.reset();
    assert!(session.findings().is_empty());
    assert!(session.processes().is_empty());
    assert!(session.standard().is_none());
    assert!(session.context().loaded_id().is_none());
    assert_eq!(session.audit_info(), &AuditInfo::default());
}

struct CountingStore {
    inner: MemorySessionStore,
    saves: AtomicUsize,
}

impl SessionStore for CountingStore {
    fn load(&self, key: &str) -> CoreResult<Option<Value>> {
        self.inner.load(key)
    }

    fn save(&self, key: &str, value: &Value) -> CoreResult<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save(key, value)
    }

    fn remove(&self, key: &str) -> CoreResult<()> {
        self.inner.remove(key)
    }
}

#[tokio::test(start_paused = true)]
async fn autosave_debounces_bursts_and_keeps_the_latest() {
    let store = Arc::new(CountingStore {
        inner: MemorySessionStore::new(),
        saves: AtomicUsize::new(0),
    });
    let autosave = SessionAutosave::spawn(store.clone(), "audit_session", Duration::from_millis(1000));

    for report in ["draft 1", "draft 2", "draft 3"] {
        let snapshot = SessionSnapshot {
            report_text: report.to_string(),
            ..SessionSnapshot::default()
        };
        autosave.schedule(&snapshot).unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
    }
    assert_eq!(store.saves.load(Ordering::SeqCst), 0);

    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert_eq!(store.saves.load(Ordering::SeqCst), 1);
    let saved = store.load("audit_session").unwrap().unwrap();
    assert_eq!(saved["reportText"], "draft 3");

    autosave
        .schedule(&SessionSnapshot {
            report_text: "final".to_string(),
            ..SessionSnapshot::default()
        })
        .unwrap();
    autosave.close().await;
    assert_eq!(store.saves.load(Ordering::SeqCst), 2);
    assert_eq!(store.load("audit_session").unwrap().unwrap()["reportText"], "final");
}

#[tokio::test(start_paused = true)]
async fn configured_autosave_writes_the_session_file() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = SessionConfig {
        dir: dir.path().to_path_buf(),
        key: "plant_audit".to_string(),
        autosave_debounce_ms: 250,
    };
    let store = Arc::new(FileSessionStore::open(&cfg.dir).unwrap());
    let autosave = SessionAutosave::from_config(store.clone(), &cfg);

    let library = StandardLibrary::builtin();
    let (session, a, _) = populated_session(&library);
    session.schedule_autosave(&autosave).unwrap();
    assert!(store.load("plant_audit").unwrap().is_none());

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(store.path_for("plant_audit").unwrap().exists());

    autosave.close().await;
    let restored = AuditSession::load_from(&*store, "plant_audit", &library)
        .unwrap()
        .unwrap();
    assert_eq!(restored.context().loaded_id(), Some(a.as_str()));
    assert_eq!(restored.audit_info().organization, "Acme Plastics");
}
