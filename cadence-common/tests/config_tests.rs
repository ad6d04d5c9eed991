//! Unit tests for config file resolution and graceful degradation
//!
//! Covers:
//! - Missing TOML files do not cause failure (defaults are used)
//! - Priority order: CLI argument, then environment variable
//! - Malformed TOML falls back to defaults
//!
//! Note: Uses serial_test to prevent ENV variable races. Tests that touch
//! CADENCE_TEST_CONFIG are marked with #[serial].

use cadence_common::config::{load_or_default, load_toml, resolve_config_path, LoggingConfig};
use serde::Deserialize;
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[derive(Debug, Default, Deserialize, PartialEq)]
struct SampleConfig {
    #[serde(default)]
    port: u16,
    #[serde(default)]
    logging: LoggingConfig,
}

fn write_temp_toml(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(content.as_bytes()).expect("write temp file");
    file
}

#[test]
#[serial]
fn test_cli_argument_wins_over_env() {
    env::set_var("CADENCE_TEST_CONFIG", "/tmp/from-env.toml");
    let cli = PathBuf::from("/tmp/from-cli.toml");

    let resolved = resolve_config_path(Some(cli.as_path()), "CADENCE_TEST_CONFIG", "cadence-test");
    assert_eq!(resolved, Some(cli));

    env::remove_var("CADENCE_TEST_CONFIG");
}

#[test]
#[serial]
fn test_env_var_used_without_cli() {
    env::set_var("CADENCE_TEST_CONFIG", "/tmp/from-env.toml");

    let resolved = resolve_config_path(None, "CADENCE_TEST_CONFIG", "cadence-test");
    assert_eq!(resolved, Some(PathBuf::from("/tmp/from-env.toml")));

    env::remove_var("CADENCE_TEST_CONFIG");
}

#[test]
#[serial]
fn test_blank_env_var_is_ignored() {
    env::set_var("CADENCE_TEST_CONFIG", "   ");

    let resolved = resolve_config_path(None, "CADENCE_TEST_CONFIG", "cadence-test-nonexistent-app");
    assert_eq!(resolved, None);

    env::remove_var("CADENCE_TEST_CONFIG");
}

#[test]
fn test_load_toml_reads_values() {
    let file = write_temp_toml("port = 6000\n[logging]\nlevel = \"debug\"\n");

    let config: SampleConfig = load_toml(file.path()).expect("valid config");
    assert_eq!(config.port, 6000);
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn test_missing_sections_use_defaults() {
    let file = write_temp_toml("port = 6001\n");

    let config: SampleConfig = load_toml(file.path()).expect("valid config");
    assert_eq!(config.logging, LoggingConfig::default());
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_missing_file_falls_back_to_defaults() {
    let (config, source): (SampleConfig, _) =
        load_or_default(Some(Path::new("/nonexistent/cadence/config.toml")));
    assert_eq!(config, SampleConfig::default());
    assert!(source.is_none());
}

#[test]
fn test_malformed_file_falls_back_to_defaults() {
    let file = write_temp_toml("port = \"not a number\"\n");

    let (config, source): (SampleConfig, _) = load_or_default(Some(file.path()));
    assert_eq!(config, SampleConfig::default());
    assert!(source.is_none());
}

#[test]
fn test_no_path_uses_defaults() {
    let (config, source): (SampleConfig, _) = load_or_default(None);
    assert_eq!(config, SampleConfig::default());
    assert!(source.is_none());
}
