use audit_core::determinism::content_hash::{content_hash, sha256_hex, EMPTY_CONTENT_HASH};

#[test]
fn equal_inputs_hash_equal() {
    let a = content_hash("4.1|p_1|gemini-2.5-flash|Policy exists");
    let b = content_hash("4.1|p_1|gemini-2.5-flash|Policy exists");
    assert_eq!(a, b);
    assert_eq!(a.len(), 32);
}

#[test]
fn one_character_changes_the_hash() {
    assert_ne!(content_hash("Policy exists"), content_hash("Policy exist"));
    assert_ne!(content_hash("abc"), content_hash("abd"));
}

#[test]
fn empty_input_maps_to_sentinel() {
    assert_eq!(content_hash(""), EMPTY_CONTENT_HASH);
    assert_ne!(content_hash(" "), EMPTY_CONTENT_HASH);
}

#[test]
fn file_fingerprint_is_full_sha256() {
    assert_eq!(
        sha256_hex(b"abc"),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}
