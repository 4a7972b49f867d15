//! Persistence round-trip and edge case tests.
//!
//! Tests atomic JSON replacement, directory creation, and append behaviour.

use tempfile::TempDir;

use crate::config::Config;
use crate::persistence::{append_bytes, ensure_dir, write_json_atomic};

// ============================================================================
// JSON Persistence Tests
// ============================================================================

#[test]
fn test_write_and_load_config_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("config.json");

    let mut config = Config::default();
    config.monthly_limit = 250;
    config.search_engine_id = Some("cx-123".to_string());

    write_json_atomic(&file_path, &config).unwrap();
    let loaded = Config::load_from(&file_path).unwrap();

    assert_eq!(loaded.monthly_limit, 250);
    assert_eq!(loaded.search_engine_id.as_deref(), Some("cx-123"));
    assert!((loaded.safety_factor - config.safety_factor).abs() < f64::EPSILON);
}

#[test]
fn test_write_replaces_existing_content() {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("usage.json");

    write_json_atomic(&file_path, &serde_json::json!({"n": 1})).unwrap();
    write_json_atomic(&file_path, &serde_json::json!({"n": 2})).unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&file_path).unwrap()).unwrap();
    assert_eq!(raw, serde_json::json!({"n": 2}));
}

#[test]
fn test_write_leaves_no_temp_file() {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("usage.json");

    write_json_atomic(&file_path, &serde_json::json!({"n": 1})).unwrap();

    let entries: Vec<_> = std::fs::read_dir(temp_dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(entries, vec![std::ffi::OsString::from("usage.json")]);
}

#[test]
fn test_write_into_missing_directory_fails() {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("missing").join("usage.json");

    assert!(write_json_atomic(&file_path, &serde_json::json!({})).is_err());
}

#[test]
fn test_load_corrupt_config_is_error() {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("config.json");
    std::fs::write(&file_path, "{ not json").unwrap();

    assert!(Config::load_from(&file_path).is_err());
}

// ============================================================================
// Append Tests
// ============================================================================

#[tokio::test]
async fn test_append_bytes_accumulates() {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("sub").join("log.txt");

    append_bytes(&file_path, b"one\n").await.unwrap();
    append_bytes(&file_path, b"two\n").await.unwrap();

    let content = tokio::fs::read_to_string(&file_path).await.unwrap();
    assert_eq!(content, "one\ntwo\n");
}

#[tokio::test]
async fn test_ensure_dir_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let dir_path = temp_dir.path().join("test_dir");

    ensure_dir(&dir_path).await.unwrap();
    ensure_dir(&dir_path).await.unwrap();

    assert!(dir_path.is_dir());
}
