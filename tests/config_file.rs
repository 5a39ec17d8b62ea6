//! Configuration file loading tests

use dakc_model::{CombinePolicy, Dataset, HardwareParameters, ModelConfig, ModelError};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(contents.as_bytes()).expect("Failed to write config");
    file
}

#[test]
fn test_load_full_config() {
    let file = write_config(
        r#"{
            "workload": { "read_len": 100, "read_count": 5000000, "k": 21 },
            "hardware": "h100",
            "buffers": { "c0": 5000, "c1": 512, "c2": 64, "c3": 2000 },
            "partitions": 32,
            "policy": "sum",
            "datasets": ["s20", "s31"]
        }"#,
    );

    let config = ModelConfig::load(file.path()).expect("Failed to load config");
    assert_eq!(config.workload.read_len, 100);
    assert_eq!(config.workload.read_count, 5_000_000);
    assert_eq!(config.workload.k, 21);
    assert_eq!(config.hardware, HardwareParameters::h100());
    assert_eq!(config.buffers.c2, 64.0);
    assert_eq!(config.partitions, 32);
    assert_eq!(config.policy, CombinePolicy::Sum);
    assert_eq!(config.datasets, vec![Dataset::S20, Dataset::S31]);
}

#[test]
fn test_load_partial_buffers() {
    let file = write_config(r#"{ "buffers": { "c0": 1 } }"#);
    let config = ModelConfig::load(file.path()).unwrap();
    assert_eq!(config.buffers.c0, 1.0);
    assert_eq!(config.buffers.c1, 1024.0);
    assert_eq!(config.buffers.c3, 10000.0);
}

#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.json");
    assert!(matches!(ModelConfig::load(&missing), Err(ModelError::Io(_))));
}

#[test]
fn test_load_malformed_json() {
    let file = write_config("{ \"partitions\": ");
    assert!(matches!(ModelConfig::load(file.path()), Err(ModelError::Json(_))));
}

#[test]
fn test_load_rejects_unknown_policy() {
    let file = write_config(r#"{ "policy": "average" }"#);
    let err = ModelConfig::load(file.path()).unwrap_err();
    assert!(matches!(err, ModelError::InvalidPolicy(ref p) if p == "average"));
}
