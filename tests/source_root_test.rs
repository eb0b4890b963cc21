//! Tests for single source root parsing, caching, and saving

use std::fs;
use std::path::{Path, PathBuf};

use srcroot::config::{Encoding, ParserConfig};
use srcroot::domain::arena::SyntaxTree;
use srcroot::errors::Error;
use srcroot::root::SourceRoot;
use tempfile::TempDir;

fn write_unit(root: &Path, rel: &str, content: &str) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().expect("parent dir")).expect("create dirs");
    fs::write(&path, content).expect("write unit");
    path
}

fn acme_unit(type_name: &str) -> String {
    format!("package com.acme\n\ntype {type_name}\n    field label = Ok\nend\n")
}

#[test]
fn given_file_on_disk_when_parsing_then_cached_and_successful() {
    // Arrange
    let dir = TempDir::new().expect("tempdir");
    write_unit(dir.path(), "com/acme/Button.unit", &acme_unit("Button"));
    let mut root = SourceRoot::new(dir.path());

    // Act
    let result = root.try_to_parse("com.acme", "Button.unit").expect("parse");

    // Assert
    assert!(result.is_successful());
    assert_eq!(root.cache().len(), 1);
    let tree = result.tree().expect("tree");
    assert_eq!(tree.type_names(), vec!["Button"]);
}

#[test]
fn given_missing_file_when_parsing_then_io_error() {
    // Arrange
    let dir = TempDir::new().expect("tempdir");
    let mut root = SourceRoot::new(dir.path());

    // Act
    let result = root.try_to_parse("com.acme", "Missing.unit");

    // Assert
    assert!(matches!(result, Err(Error::FileRead { .. })));
    assert!(root.cache().is_empty());
}

#[test]
fn given_syntax_problems_when_strict_parsing_then_promoted_to_error() {
    // Arrange
    let dir = TempDir::new().expect("tempdir");
    write_unit(dir.path(), "com/acme/Bad.unit", "package com.acme\n???\n");
    let mut root = SourceRoot::new(dir.path());

    // Act
    let strict = root.parse("com.acme", "Bad.unit");
    let lenient = root.try_to_parse("com.acme", "Bad.unit").expect("parse");

    // Assert
    assert!(matches!(strict, Err(Error::ParseProblems { .. })));
    assert!(!lenient.is_successful());
    assert!(lenient.tree().is_some());
}

#[test]
fn given_reparse_when_parsing_then_cache_entry_overwritten_in_place() {
    // Arrange
    let dir = TempDir::new().expect("tempdir");
    write_unit(dir.path(), "com/acme/A.unit", &acme_unit("A"));
    write_unit(dir.path(), "com/acme/B.unit", &acme_unit("B"));
    let mut root = SourceRoot::new(dir.path());
    root.try_to_parse("com.acme", "A.unit").expect("parse A");
    root.try_to_parse("com.acme", "B.unit").expect("parse B");

    // Act: change A on disk and reparse
    write_unit(dir.path(), "com/acme/A.unit", &acme_unit("Renamed"));
    root.try_to_parse("com.acme", "A.unit").expect("reparse A");

    // Assert: still two entries, original order, fresh content
    let names: Vec<String> = root
        .compilation_units()
        .iter()
        .filter_map(|t| t.primary_type_name())
        .collect();
    assert_eq!(names, vec!["Renamed", "B"]);
}

#[test]
fn given_nested_packages_when_bulk_parsing_then_discovered_deterministically() {
    // Arrange
    let dir = TempDir::new().expect("tempdir");
    write_unit(dir.path(), "com/acme/B.unit", &acme_unit("B"));
    write_unit(dir.path(), "com/acme/sub/C.unit", &acme_unit("C"));
    write_unit(dir.path(), "com/acme/A.unit", &acme_unit("A"));
    write_unit(dir.path(), "readme.txt", "not a source file");
    let mut root = SourceRoot::new(dir.path());

    // Act
    let results = root.try_to_parse_package("com.acme").expect("bulk parse");

    // Assert: only .unit files, sorted by file name within each directory
    assert_eq!(results.len(), 3);
    let names: Vec<String> = root
        .compilation_units()
        .iter()
        .filter_map(|t| t.primary_type_name())
        .collect();
    assert_eq!(names, vec!["A", "B", "C"]);
}

#[test]
fn given_missing_package_dir_when_bulk_parsing_then_root_not_found() {
    let dir = TempDir::new().expect("tempdir");
    let mut root = SourceRoot::new(dir.path());

    let result = root.try_to_parse_package("com.nowhere");

    assert!(matches!(result, Err(Error::RootNotFound(_))));
}

#[test]
fn given_added_unit_when_saving_elsewhere_then_written_under_declared_package() {
    // Arrange
    let source = TempDir::new().expect("tempdir");
    let target = TempDir::new().expect("tempdir");
    let mut tree = SyntaxTree::new();
    tree.set_package("com.acme.widgets").expect("package");
    let ty = tree.add_type("Button").expect("type");
    tree.add_field(ty, "label", "Ok").expect("field");
    let mut root = SourceRoot::new(source.path());
    root.add_unit(tree);

    // Act
    root.save_all_in(target.path()).expect("save");

    // Assert
    let saved = target.path().join("com/acme/widgets/Button.unit");
    let text = fs::read_to_string(&saved).expect("read saved unit");
    assert!(text.contains("package com.acme.widgets"));
    assert!(text.contains("field label = Ok"));

    // And the written file parses back to the same shape
    let mut reparse = SourceRoot::new(target.path());
    let tree = reparse.parse("com.acme.widgets", "Button.unit").expect("reparse");
    assert_eq!(tree.type_names(), vec!["Button"]);
}

#[test]
fn given_cached_units_when_reading_then_fresh_copies_returned() {
    // Arrange
    let dir = TempDir::new().expect("tempdir");
    write_unit(dir.path(), "com/acme/Button.unit", &acme_unit("Button"));
    let mut root = SourceRoot::new(dir.path());
    root.try_to_parse("com.acme", "Button.unit").expect("parse");

    // Act: mutate one copy
    let mut copy = root.compilation_units().remove(0);
    copy.add_import("com.extra").expect("import");

    // Assert: the cache is untouched
    assert!(root.compilation_units()[0].imports().is_empty());
}

#[test]
fn given_latin1_config_when_parsing_then_high_bytes_decoded() {
    // Arrange: 0xE9 is 'é' in Latin-1 but invalid UTF-8
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("Menu.unit");
    fs::write(&path, b"type Menu\n    field label = caf\xE9\nend\n").expect("write unit");

    let latin1 = ParserConfig {
        encoding: Encoding::Latin1,
        ..ParserConfig::default()
    };
    let mut root = SourceRoot::with_config(dir.path(), latin1);

    // Act
    let result = root.try_to_parse("", "Menu.unit").expect("parse latin1");

    // Assert
    assert!(result.is_successful());

    // The same bytes under UTF-8 fail to decode
    let mut utf8_root = SourceRoot::new(dir.path());
    assert!(matches!(
        utf8_root.try_to_parse("", "Menu.unit"),
        Err(Error::Decode { .. })
    ));
}

#[test]
fn given_custom_printer_when_saving_then_printer_output_written() {
    // Arrange
    let dir = TempDir::new().expect("tempdir");
    let mut tree = SyntaxTree::new();
    tree.set_package("com.acme").expect("package");
    tree.add_type("T").expect("type");
    let mut root = SourceRoot::new(dir.path());
    root.set_printer(std::sync::Arc::new(|_| "# generated\n".to_string()));
    root.add_unit(tree);

    // Act
    root.save_all().expect("save");

    // Assert
    let text = fs::read_to_string(dir.path().join("com/acme/T.unit")).expect("read");
    assert_eq!(text, "# generated\n");
}
