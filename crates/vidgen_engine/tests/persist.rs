use std::fs;

use tempfile::TempDir;
use vidgen_engine::{ensure_parent_dir, read_optional, write_atomic};

#[test]
fn creates_missing_parent_dir() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("state").join("ledger.ron");
    let parent = ensure_parent_dir(&target).unwrap();
    assert_eq!(parent, temp.path().join("state"));
    assert!(parent.is_dir());
}

#[test]
fn atomic_write_replaces_existing_contents() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("ledger.ron");

    write_atomic(&target, "first").unwrap();
    assert_eq!(fs::read_to_string(&target).unwrap(), "first");

    write_atomic(&target, "second").unwrap();
    assert_eq!(fs::read_to_string(&target).unwrap(), "second");
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
}

#[test]
fn parent_that_is_a_file_is_rejected() {
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("not_a_dir");
    fs::write(&blocker, "x").unwrap();

    let result = write_atomic(&blocker.join("ledger.ron"), "data");
    assert!(result.is_err());
    assert_eq!(fs::read_to_string(&blocker).unwrap(), "x");
}

#[test]
fn missing_file_reads_as_none() {
    let temp = TempDir::new().unwrap();
    assert_eq!(read_optional(&temp.path().join("absent.ron")).unwrap(), None);

    let present = temp.path().join("present.ron");
    fs::write(&present, "[]").unwrap();
    assert_eq!(read_optional(&present).unwrap().as_deref(), Some("[]"));
}
