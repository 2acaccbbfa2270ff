use super::*;
use serde::{Deserialize, Serialize};
use tempfile::tempdir;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Doc {
    value: u32,
}

#[test]
fn write_then_read_round_trips() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("doc.json");
    write_json_atomic(&path, &Doc { value: 42 }).unwrap();
    let loaded: Option<Doc> = read_json_safe(&path).unwrap();
    assert_eq!(loaded, Some(Doc { value: 42 }));
}

#[test]
fn missing_file_reads_as_none() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing.json");
    let loaded: Option<Doc> = read_json_safe(&path).unwrap();
    assert_eq!(loaded, None);
}

#[test]
fn corrupt_file_is_rotated_to_bak_and_reads_as_none() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("doc.json");
    fs::write(&path, b"not json").unwrap();
    let loaded: Option<Doc> = read_json_safe(&path).unwrap();
    assert_eq!(loaded, None);
    assert!(path.with_extension("bak").exists());
    assert!(!path.exists());
}

#[test]
fn no_tmp_file_left_behind_after_successful_write() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("doc.json");
    write_json_atomic(&path, &Doc { value: 1 }).unwrap();
    assert!(!path.with_extension("tmp").exists());
}

#[test]
fn bak_rotation_keeps_at_most_three_generations() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("doc.json");
    for _ in 0..5 {
        fs::write(&path, b"not json").unwrap();
        let _: Option<Doc> = read_json_safe(&path).unwrap();
    }
    assert!(path.with_extension("bak").exists());
    assert!(path.with_extension("bak.2").exists());
    assert!(path.with_extension("bak.3").exists());
    assert!(!path.with_extension("bak.4").exists());
}
