use ulid::Ulid;

pub fn process_id_ulid() -> String {
    format!("p_{}", Ulid::new())
}

pub fn tag_id_ulid() -> String {
    format!("t_{}", Ulid::new())
}

pub fn matrix_row_id(clause_id: &str, ordinal: usize) -> String {
    format!("{}-{}", clause_id, ordinal)
}

pub fn now_rfc3339_utc() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default()
}
