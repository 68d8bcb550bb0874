//! Project-file persistence integration tests.
//!
//! Round-trips through real files on disk.

use ccflow::{ProjectFile, Suppression};

#[test]
fn test_round_trip_through_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("project.ccflow");

    let mut project = ProjectFile::default();
    project.build_dir = "b".to_string();
    project.include_dirs.push("i".to_string());
    project.max_ctu_depth = 7;
    project.suppressions.push(Suppression {
        error_id: "x".to_string(),
        file_name: "f.c".to_string(),
        line_number: Some(3),
        symbol_name: String::new(),
    });

    project.write(&path).unwrap();
    let back = ProjectFile::read(&path).unwrap();

    assert_eq!(back.build_dir, "b");
    assert_eq!(back.include_dirs, vec!["i"]);
    assert_eq!(back.max_ctu_depth, 7);
    assert_eq!(back.suppressions.len(), 1);
    assert_eq!(back.suppressions[0].error_id, "x");
    assert_eq!(back.suppressions[0].file_name, "f.c");
    assert_eq!(back.suppressions[0].line_number, Some(3));
    // Defaults survive the trip.
    assert!(back.check_headers);
    assert!(back.analyze_all_vs_configs);
    assert_eq!(back, project);
}

#[test]
fn test_read_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ProjectFile::read(dir.path().join("nope.ccflow")).unwrap_err();
    assert!(matches!(err, ccflow::CcflowError::Io(_)));
}

#[test]
fn test_write_read_idempotent() {
    // write(read(write(p))) produces identical XML.
    let mut project = ProjectFile::default();
    project.paths.push("src".to_string());
    project.libraries.push("posix".to_string());
    let first = project.write_to_string().unwrap();
    let back = ProjectFile::read_from_str(&first).unwrap();
    let second = back.write_to_string().unwrap();
    assert_eq!(first, second);
}
