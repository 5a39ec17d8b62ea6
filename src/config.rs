//! Model Configuration
//!
//! JSON description of one modeling run. Every field is optional and falls
//! back to the reference setup: s30 reads of length 150, k = 31, the Xeon
//! Gold 6226 preset, 8 partitions and the `max` combination policy.
//!
//! ```json
//! {
//!   "workload": { "read_len": 150, "read_count": 357913900, "k": 31 },
//!   "hardware": "h100",
//!   "buffers": { "c0": 10000, "c1": 1024, "c2": 32, "c3": 10000 },
//!   "partitions": 8,
//!   "policy": "sum",
//!   "datasets": ["s20", "s25", "s30"]
//! }
//! ```
//!
//! `hardware` is either a preset name or a full hardware object.

use crate::error::{ModelError, Result};
use crate::model::{BufferConstants, CombinePolicy, Dataset, HardwareParameters, WorkloadParameters};
use log::debug;
use serde::Deserialize;
use std::path::Path;

/// Hardware given by preset name or spelled out inline
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum HardwareSpec {
    Preset(String),
    Inline(HardwareParameters),
}

impl Default for HardwareSpec {
    fn default() -> Self {
        HardwareSpec::Inline(HardwareParameters::default())
    }
}

/// Configuration as written on disk, before name lookups
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawConfig {
    workload: WorkloadParameters,
    hardware: HardwareSpec,
    buffers: BufferConstants,
    partitions: u64,
    policy: String,
    datasets: Option<Vec<String>>,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            workload: WorkloadParameters::default(),
            hardware: HardwareSpec::default(),
            buffers: BufferConstants::default(),
            partitions: 8,
            policy: CombinePolicy::default().name().to_string(),
            datasets: None,
        }
    }
}

/// Fully resolved configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub workload: WorkloadParameters,
    pub hardware: HardwareParameters,
    pub buffers: BufferConstants,
    pub partitions: u64,
    pub policy: CombinePolicy,
    pub datasets: Vec<Dataset>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            workload: WorkloadParameters::default(),
            hardware: HardwareParameters::default(),
            buffers: BufferConstants::default(),
            partitions: 8,
            policy: CombinePolicy::default(),
            datasets: Dataset::VALIDATION.to_vec(),
        }
    }
}

impl TryFrom<RawConfig> for ModelConfig {
    type Error = ModelError;

    fn try_from(raw: RawConfig) -> Result<Self> {
        let hardware = match raw.hardware {
            HardwareSpec::Preset(name) => {
                debug!("Using hardware preset '{}'", name);
                HardwareParameters::preset(&name)?
            }
            HardwareSpec::Inline(hardware) => hardware,
        };

        let datasets = match raw.datasets {
            Some(names) => names
                .iter()
                .map(|name| name.parse::<Dataset>())
                .collect::<Result<Vec<_>>>()?,
            None => Dataset::VALIDATION.to_vec(),
        };

        Ok(ModelConfig {
            workload: raw.workload,
            hardware,
            buffers: raw.buffers,
            partitions: raw.partitions,
            policy: raw.policy.parse()?,
            datasets,
        })
    }
}

impl ModelConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: RawConfig = serde_json::from_str(json)?;
        ModelConfig::try_from(raw)
    }

    /// Load a configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading model configuration from {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_reference_setup() {
        let config = ModelConfig::from_json_str("{}").unwrap();
        assert_eq!(config, ModelConfig::default());
        assert_eq!(config.workload.read_count, Dataset::S30.read_count());
        assert_eq!(config.policy, CombinePolicy::Max);
        assert_eq!(config.datasets.len(), 11);
    }

    #[test]
    fn test_partial_workload_keeps_defaults() {
        let config = ModelConfig::from_json_str(r#"{ "workload": { "k": 21 } }"#).unwrap();
        assert_eq!(config.workload.k, 21);
        assert_eq!(config.workload.read_len, 150);
    }

    #[test]
    fn test_hardware_preset_and_inline() {
        let config = ModelConfig::from_json_str(r#"{ "hardware": "h100" }"#).unwrap();
        assert_eq!(config.hardware, HardwareParameters::h100());

        let config = ModelConfig::from_json_str(
            r#"{ "hardware": {
                "cache_size": 1e6, "cache_line": 32, "mem_bandwidth": 1e10,
                "link_bandwidth": 1e9, "node_throughput": 5e10, "overlap_factor": 5.7
            } }"#,
        )
        .unwrap();
        assert_eq!(config.hardware.cache_line, 32.0);
        assert_eq!(config.hardware.overlap_factor, 5.7);
        assert_eq!(config.hardware.tdp_watts, 0.0);
    }

    #[test]
    fn test_rejects_unknown_names() {
        assert!(matches!(
            ModelConfig::from_json_str(r#"{ "policy": "mean" }"#),
            Err(ModelError::InvalidPolicy(_))
        ));
        assert!(matches!(
            ModelConfig::from_json_str(r#"{ "hardware": "a64fx" }"#),
            Err(ModelError::UnknownPreset(_))
        ));
        assert!(matches!(
            ModelConfig::from_json_str(r#"{ "datasets": ["s20", "s99"] }"#),
            Err(ModelError::UnknownDataset(_))
        ));
        assert!(matches!(
            ModelConfig::from_json_str(r#"{ "nodes": 4 }"#),
            Err(ModelError::Json(_))
        ));
    }
}
