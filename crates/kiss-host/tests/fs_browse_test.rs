//! Integration tests for filesystem browsing and retrieval.

use std::fs;

use kiss_host::files::{
    change_dir, fetch_target, list_dir, read_excerpt, resolve, EntryKind, READ_CAP,
    TRUNCATION_MARKER,
};
use kiss_host::HostError;
use tempfile::TempDir;

#[test]
fn test_cat_large_file_is_truncated() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("big.txt");
    let content: String = (0..5000).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
    fs::write(&path, &content).unwrap();

    let excerpt = read_excerpt(&path, READ_CAP).unwrap();
    assert!(excerpt.truncated);
    assert_eq!(excerpt.content.len(), READ_CAP);
    assert_eq!(excerpt.content, content[..READ_CAP]);
    assert!(excerpt.to_string().ends_with(TRUNCATION_MARKER));
}

#[test]
fn test_cat_small_file_is_whole() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("small.txt");
    fs::write(&path, "line one\nline two\n").unwrap();

    let excerpt = read_excerpt(&path, READ_CAP).unwrap();
    assert!(!excerpt.truncated);
    assert_eq!(excerpt.content, "line one\nline two\n");
    assert!(!excerpt.to_string().contains(TRUNCATION_MARKER));
}

#[test]
fn test_cat_exactly_cap_is_not_truncated() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("exact.txt");
    fs::write(&path, "x".repeat(READ_CAP)).unwrap();

    let excerpt = read_excerpt(&path, READ_CAP).unwrap();
    assert!(!excerpt.truncated);
    assert_eq!(excerpt.content.len(), READ_CAP);
}

#[test]
fn test_cat_cap_inside_multibyte_char() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("accents.txt");
    let content = format!("{}{}", "a".repeat(READ_CAP - 1), "é".repeat(10));
    fs::write(&path, &content).unwrap();

    let excerpt = read_excerpt(&path, READ_CAP).unwrap();
    assert!(excerpt.truncated);
    assert_eq!(excerpt.content.len(), READ_CAP - 1);
    assert!(content.as_bytes().starts_with(excerpt.content.as_bytes()));
    assert!(!excerpt.content.contains('\u{FFFD}'));
}

#[test]
fn test_cat_multibyte_within_cap_is_whole() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("notes.txt");
    fs::write(&path, "café ☕ naïve\n").unwrap();

    let excerpt = read_excerpt(&path, READ_CAP).unwrap();
    assert!(!excerpt.truncated);
    assert_eq!(excerpt.content, "café ☕ naïve\n");
}

#[test]
fn test_cat_binary_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("blob.bin");
    fs::write(&path, [0xffu8; 10]).unwrap();

    assert!(matches!(
        read_excerpt(&path, READ_CAP),
        Err(HostError::NotText(_))
    ));
}

#[test]
fn test_cat_missing_and_directory() {
    let dir = TempDir::new().unwrap();

    let missing = dir.path().join("nope.txt");
    assert!(matches!(
        read_excerpt(&missing, READ_CAP),
        Err(HostError::NotFound(_))
    ));
    assert!(matches!(
        read_excerpt(dir.path(), READ_CAP),
        Err(HostError::NotAFile(_))
    ));
}

#[test]
fn test_list_dir_tags_entries() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("nested")).unwrap();
    fs::write(dir.path().join("b.txt"), "b").unwrap();
    fs::write(dir.path().join("A.txt"), "a").unwrap();

    let listing = list_dir(dir.path()).unwrap();
    let names: Vec<_> = listing.entries.iter().map(|e| (e.name.as_str(), e.kind)).collect();
    assert_eq!(
        names,
        vec![
            ("nested", EntryKind::Directory),
            ("A.txt", EntryKind::File),
            ("b.txt", EntryKind::File),
        ]
    );

    let text = listing.to_string();
    assert!(text.contains("📁 nested/\n"));
    assert!(text.contains("📄 b.txt\n"));
}

#[test]
fn test_list_dir_errors() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("f.txt");
    fs::write(&file, "f").unwrap();

    assert!(matches!(list_dir(&file), Err(HostError::NotADirectory(_))));
    assert!(matches!(
        list_dir(&dir.path().join("gone")),
        Err(HostError::NotFound(_))
    ));
}

#[test]
fn test_change_dir_resolves_relative() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("file.txt"), "x").unwrap();

    let cwd = fs::canonicalize(dir.path()).unwrap();
    let next = change_dir(&cwd, "sub").unwrap();
    assert_eq!(next, cwd.join("sub"));

    let back = change_dir(&next, "..").unwrap();
    assert_eq!(back, cwd);

    assert!(matches!(
        change_dir(&cwd, "file.txt"),
        Err(HostError::NotADirectory(_))
    ));
    assert!(matches!(
        change_dir(&cwd, "missing"),
        Err(HostError::NotFound(_))
    ));
}

#[test]
fn test_change_dir_leaves_process_cwd_alone() {
    let before = std::env::current_dir().unwrap();
    let dir = TempDir::new().unwrap();

    change_dir(&before, dir.path().to_str().unwrap()).unwrap();
    assert_eq!(std::env::current_dir().unwrap(), before);
}

#[test]
fn test_fetch_missing_file() {
    let dir = TempDir::new().unwrap();
    let missing = resolve(dir.path(), "report.pdf");

    match fetch_target(&missing) {
        Err(HostError::NotFound(path)) => assert_eq!(path, missing),
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[test]
fn test_fetch_preserves_bytes() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("blob.bin");
    let bytes: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
    fs::write(&path, &bytes).unwrap();

    let target = fetch_target(&path).unwrap();
    assert_eq!(fs::read(target).unwrap(), bytes);
}

#[test]
fn test_fetch_rejects_directory() {
    let dir = TempDir::new().unwrap();
    assert!(matches!(
        fetch_target(dir.path()),
        Err(HostError::NotAFile(_))
    ));
}
