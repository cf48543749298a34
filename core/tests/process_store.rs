use audit_core::process::model::{MatrixRow, RowStatus, UploadedFile};
use audit_core::process::store::{ClauseSelection, ClauseToggle, ProcessStore};
use audit_core::standards::library::iso_9001;

#[test]
fn row_status_follows_evidence_text() {
    let mut row = MatrixRow::new("4.1", 0, "Determine issues");
    assert_eq!(row.status(), RowStatus::Pending);
    row.set_evidence("   \n\t");
    assert_eq!(row.status(), RowStatus::Pending);
    row.set_evidence("Policy exists");
    assert_eq!(row.status(), RowStatus::Supplied);
    row.append_evidence("and is signed");
    assert_eq!(row.evidence_input(), "Policy exists and is signed");
    row.clear_evidence();
    assert_eq!(row.status(), RowStatus::Pending);
}

#[test]
fn deserialized_rows_are_normalized() {
    let row: MatrixRow = serde_json::from_str(
        r#"{"id":"4.1-0","requirement":"r","evidenceInput":"x","status":"pending"}"#,
    )
    .unwrap();
    assert_eq!(row.status(), RowStatus::Supplied);

    let row: MatrixRow = serde_json::from_str(
        r#"{"id":"4.1-0","requirement":"r","evidenceInput":"  ","status":"supplied"}"#,
    )
    .unwrap();
    assert_eq!(row.status(), RowStatus::Pending);
}

#[test]
fn toggle_adds_a_seeded_row_then_removes_the_entry() {
    let standard = iso_9001();
    let mut store = ProcessStore::new();
    let pid = store.add("Purchasing").unwrap();

    let added = store.toggle_clause(&pid, "8.4", Some(&standard)).unwrap();
    let ClauseToggle::Added(rows) = added else {
        panic!("expected an added clause");
    };
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, "8.4-0");
    assert_eq!(rows[0].status(), RowStatus::Pending);
    assert!(rows[0].requirement.contains("externally provided"));

    let removed = store.toggle_clause(&pid, "8.4", Some(&standard)).unwrap();
    assert_eq!(removed, ClauseToggle::Removed);
    assert!(store.get(&pid).unwrap().matrix_data.is_empty());
}

#[test]
fn unknown_clause_gets_placeholder_requirement() {
    let mut store = ProcessStore::new();
    let pid = store.add("HR").unwrap();
    store.toggle_clause(&pid, "99.9", Some(&iso_9001())).unwrap();
    let rows = &store.get(&pid).unwrap().matrix_data["99.9"];
    assert_eq!(rows[0].requirement, "Requirement text not available for clause 99.9");
}

#[test]
fn batch_toggle_only_adds() {
    let standard = iso_9001();
    let mut store = ProcessStore::new();
    let a = store.add("A").unwrap();
    let b = store.add("B").unwrap();
    store.toggle_clause(&a, "4.1", Some(&standard)).unwrap();

    let added = store
        .add_clauses(
            &[
                ClauseSelection {
                    process_id: a.clone(),
                    clause_ids: vec!["4.1".to_string(), "4.2".to_string()],
                },
                ClauseSelection {
                    process_id: b.clone(),
                    clause_ids: vec!["4.1".to_string()],
                },
            ],
            Some(&standard),
        )
        .unwrap();
    assert_eq!(added.len(), 2);

    let pa = store.get(&a).unwrap();
    assert_eq!(pa.matrix_data.keys().collect::<Vec<_>>(), vec!["4.1", "4.2"]);
    assert!(store.get(&b).unwrap().matrix_data.contains_key("4.1"));

    // Running the same batch again changes nothing.
    let again = store
        .add_clauses(
            &[ClauseSelection {
                process_id: a.clone(),
                clause_ids: vec!["4.1".to_string(), "4.2".to_string()],
            }],
            Some(&standard),
        )
        .unwrap();
    assert!(again.is_empty());
}

#[test]
fn batch_with_unknown_process_changes_nothing() {
    let mut store = ProcessStore::new();
    let a = store.add("A").unwrap();
    let err = store.add_clauses(
        &[
            ClauseSelection {
                process_id: a.clone(),
                clause_ids: vec!["4.1".to_string()],
            },
            ClauseSelection {
                process_id: "p_missing".to_string(),
                clause_ids: vec!["4.1".to_string()],
            },
        ],
        None,
    );
    assert!(err.is_err());
    assert!(store.get(&a).unwrap().matrix_data.is_empty());
}

#[test]
fn blank_names_are_rejected() {
    let mut store = ProcessStore::new();
    assert!(store.add("   ").is_err());
    let id = store.add("Sales").unwrap();
    assert!(store.rename(&id, "").is_err());
    store.rename(&id, " Sales & Marketing ").unwrap();
    assert_eq!(store.get(&id).unwrap().name, "Sales & Marketing");
}

#[test]
fn interviewees_and_files_have_set_semantics() {
    let mut store = ProcessStore::new();
    let id = store.add("Production").unwrap();
    assert!(store.add_interviewee(&id, " Jane Doe ").unwrap());
    assert!(!store.add_interviewee(&id, "Jane Doe").unwrap());
    assert!(!store.add_interviewee(&id, "  ").unwrap());
    assert!(store.remove_interviewee(&id, "Jane Doe").unwrap());
    assert!(store.get(&id).unwrap().interviewees.is_empty());

    let file = UploadedFile::from_bytes("procedure.pdf", "application/pdf", b"abc");
    assert_eq!(file.bytes, 3);
    assert_eq!(
        file.sha256,
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
    assert!(store.attach_file(&id, file.clone()).unwrap());
    assert!(!store.attach_file(&id, file.clone()).unwrap());
    assert!(store.detach_file(&id, &file.sha256).unwrap());
    assert!(store.get(&id).unwrap().uploaded_files.is_empty());
}
