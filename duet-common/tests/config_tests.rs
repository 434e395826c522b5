//! Tests for configuration discovery and output folder resolution
//!
//! Tests that manipulate DUET_OUTPUT_FOLDER are marked with #[serial]
//! to ensure they run sequentially, not in parallel.

use duet_common::config::{load_toml, locate_config_file, resolve_output_folder};
use duet_common::Error;
use serde::Deserialize;
use serial_test::serial;
use std::env;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const TEST_ENV: &str = "DUET_TEST_OUTPUT_FOLDER";

#[derive(Debug, Default, Deserialize, PartialEq)]
struct SampleConfig {
    #[serde(default)]
    name: String,
    #[serde(default)]
    rate: u32,
}

#[test]
fn test_explicit_missing_config_is_not_found() {
    let err = locate_config_file(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn test_load_explicit_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "name = \"duet\"\nrate = 22050\n").unwrap();

    let config: SampleConfig = load_toml(Some(&path)).unwrap();
    assert_eq!(
        config,
        SampleConfig {
            name: "duet".to_string(),
            rate: 22050
        }
    );
}

#[test]
fn test_malformed_config_is_config_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "rate = \"not a number\"").unwrap();

    let err = load_toml::<SampleConfig>(Some(&path)).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
#[serial]
fn test_cli_argument_wins() {
    env::set_var(TEST_ENV, "/from/env");
    let resolved = resolve_output_folder(
        Some(Path::new("/from/cli")),
        TEST_ENV,
        Some(Path::new("/from/file")),
    );
    env::remove_var(TEST_ENV);
    assert_eq!(resolved, PathBuf::from("/from/cli"));
}

#[test]
#[serial]
fn test_env_beats_config_file() {
    env::set_var(TEST_ENV, "/from/env");
    let resolved = resolve_output_folder(None, TEST_ENV, Some(Path::new("/from/file")));
    env::remove_var(TEST_ENV);
    assert_eq!(resolved, PathBuf::from("/from/env"));
}

#[test]
#[serial]
fn test_config_file_beats_default() {
    env::remove_var(TEST_ENV);
    let resolved = resolve_output_folder(None, TEST_ENV, Some(Path::new("/from/file")));
    assert_eq!(resolved, PathBuf::from("/from/file"));
}

#[test]
#[serial]
fn test_default_output_folder_is_non_empty() {
    env::remove_var(TEST_ENV);
    let resolved = resolve_output_folder(None, TEST_ENV, None);
    assert!(!resolved.as_os_str().is_empty());
    assert!(resolved.to_string_lossy().contains("duet"));
}
