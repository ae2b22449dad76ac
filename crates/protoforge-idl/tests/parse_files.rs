//! File-based parsing tests.

use protoforge_idl::{ParseError, parse_file};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_parse_file_sets_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("user.proto");
    fs::write(
        &path,
        "syntax = \"proto3\";\n\nmessage UserModel {\n  int64 id = 1;\n}\n",
    )
    .unwrap();

    let file = parse_file(&path).unwrap();
    assert_eq!(file.path.as_deref(), Some(path.as_path()));
    assert_eq!(file.messages().count(), 1);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = parse_file(dir.path().join("missing.proto")).unwrap_err();
    assert!(err.is_io_error());
    assert!(err.line().is_none());
}

#[test]
fn test_syntax_error_in_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.proto");
    fs::write(&path, "syntax = \"proto3\";\nmessage {\n}\n").unwrap();

    let err = parse_file(&path).unwrap_err();
    assert!(matches!(err, ParseError::UnexpectedToken { line: 2, .. }));
}

#[test]
fn test_crlf_sources() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("crlf.proto");
    fs::write(
        &path,
        "syntax = \"proto3\";\r\n// @table:people\r\nmessage PersonModel {\r\n  string name = 1; // @pk\r\n}\r\n",
    )
    .unwrap();

    let file = parse_file(&path).unwrap();
    let person = file.messages().next().unwrap();
    assert_eq!(
        person.comments.lines().collect::<Vec<_>>(),
        vec![" @table:people"]
    );
    let name = person.fields().next().unwrap();
    assert_eq!(name.comments.lines().collect::<Vec<_>>(), vec![" @pk"]);
}
