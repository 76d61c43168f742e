//! Integration tests for saving changelogs to disk.

mod common;

use std::fs;
use std::io::ErrorKind;

use common::{cypher_changeset, nelson_changelog, NELSON_CYPHER};
use liquichange::prelude::*;
use tempfile::TempDir;

#[test]
fn test_save_writes_the_rendered_document() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("changelog.xml");
    let changelog = nelson_changelog();

    changelog.save_to_file(&path, Encoding::Utf8).unwrap();

    let written = fs::read_to_string(&path).unwrap();
    assert_eq!(written, changelog.to_xml_string(Encoding::Utf8).unwrap());
    assert!(written.contains(NELSON_CYPHER));
}

#[test]
fn test_save_replaces_an_existing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("changelog.xml");
    fs::write(&path, "stale").unwrap();

    nelson_changelog().save_to_file(&path, Encoding::Utf8).unwrap();

    assert!(fs::read_to_string(&path).unwrap().starts_with("<?xml"));
    // Only the destination remains; the temporary file was renamed onto it.
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn test_save_honors_encoding() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("latin1.xml");
    let mut changelog = Changelog::new();
    changelog.add_changeset(cypher_changeset("1", "Jürgen", "RETURN 1"));

    changelog.save_to_file(&path, Encoding::Iso8859_1).unwrap();

    let bytes = fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>"));
    let needle = b"author=\"J\xFCrgen\"";
    assert!(bytes.windows(needle.len()).any(|w| w == needle));
}

#[test]
fn test_save_with_compact_options() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("compact.xml");

    nelson_changelog()
        .save_with_options(&path, &RenderOptions::new().compact())
        .unwrap();

    let written = fs::read_to_string(&path).unwrap();
    assert_eq!(written.lines().count(), 2);
}

#[test]
fn test_missing_directory_is_io_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing").join("changelog.xml");

    let err = nelson_changelog()
        .save_to_file(&path, Encoding::Utf8)
        .unwrap_err();

    assert!(err.is_io());
    assert!(matches!(&err, ChangelogError::Io { path: p, .. } if p == &path));
    assert!(!path.exists());
}

#[test]
fn test_directory_destination_is_io_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("taken");
    fs::create_dir(&path).unwrap();

    let err = nelson_changelog()
        .save_to_file(&path, Encoding::Utf8)
        .unwrap_err();

    assert!(err.is_io());
    assert!(path.is_dir());
    // The temporary file is cleaned up on failure.
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn test_render_failure_touches_nothing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("changelog.xml");
    let changelog = Changelog::from_json(
        r#"{"entries": [{"kind": "change_set", "id": "", "author": "dev"}]}"#,
    )
    .unwrap();

    let err = changelog.save_to_file(&path, Encoding::Utf8).unwrap_err();

    assert!(err.is_serialization());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_read_only_destination_is_refused() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("locked.xml");
    fs::write(&path, "locked").unwrap();
    let mut permissions = fs::metadata(&path).unwrap().permissions();
    permissions.set_readonly(true);
    fs::set_permissions(&path, permissions).unwrap();

    let err = nelson_changelog()
        .save_to_file(&path, Encoding::Utf8)
        .unwrap_err();

    assert!(err.is_io());
    assert!(matches!(
        &err,
        ChangelogError::Io { path: p, source } if p == &path && source.kind() == ErrorKind::PermissionDenied
    ));
    assert_eq!(fs::read_to_string(&path).unwrap(), "locked");
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[cfg(unix)]
#[test]
fn test_new_file_gets_the_default_mode() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let reference = dir.path().join("reference.txt");
    fs::write(&reference, "").unwrap();
    let path = dir.path().join("changelog.xml");

    nelson_changelog().save_to_file(&path, Encoding::Utf8).unwrap();

    let mode = |p: &std::path::Path| fs::metadata(p).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode(&path), mode(&reference));
}

#[cfg(unix)]
#[test]
fn test_existing_file_keeps_its_mode() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("changelog.xml");
    fs::write(&path, "stale").unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();

    nelson_changelog().save_to_file(&path, Encoding::Utf8).unwrap();

    assert!(fs::read_to_string(&path).unwrap().starts_with("<?xml"));
    assert_eq!(fs::metadata(&path).unwrap().permissions().mode() & 0o777, 0o640);
}

#[cfg(unix)]
#[test]
fn test_symlink_destination_writes_through_the_link() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("real.xml");
    fs::write(&target, "stale").unwrap();
    let link = dir.path().join("changelog.xml");
    std::os::unix::fs::symlink(&target, &link).unwrap();

    nelson_changelog().save_to_file(&link, Encoding::Utf8).unwrap();

    assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
    assert!(fs::read_to_string(&target).unwrap().starts_with("<?xml"));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
}
