//! Model Parameters
//!
//! Workload and hardware descriptions consumed by every cost formula,
//! together with the reference hardware presets and the synthetic dataset
//! catalogue used in validation runs.

use crate::error::{ModelError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::primitives;

/// Shape of the k-mer counting input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkloadParameters {
    /// Characters per read
    pub read_len: u64,
    /// Number of reads in the input
    pub read_count: u64,
    /// K-mer length (must not exceed `read_len`)
    pub k: u32,
}

impl WorkloadParameters {
    pub fn new(read_len: u64, read_count: u64, k: u32) -> Self {
        Self { read_len, read_count, k }
    }

    /// Workload over one of the synthetic datasets
    pub fn for_dataset(dataset: Dataset, read_len: u64, k: u32) -> Self {
        Self::new(read_len, dataset.read_count(), k)
    }

    /// Same geometry, different read count
    pub fn with_read_count(self, read_count: u64) -> Self {
        Self { read_count, ..self }
    }

    pub fn encoding_bits(&self) -> u64 {
        primitives::kmer_encoding_bits(self.k)
    }

    pub fn encoding_bytes(&self) -> f64 {
        primitives::kmer_encoding_bytes(self.k)
    }

    /// Total k-mers extracted from the whole input
    pub fn kmer_count(&self) -> f64 {
        primitives::kmer_count(self.read_count, self.read_len, self.k)
    }

    /// Raw input size in bytes (one byte per character)
    pub fn input_bytes(&self) -> f64 {
        self.read_count as f64 * self.read_len as f64
    }
}

impl Default for WorkloadParameters {
    fn default() -> Self {
        Self::for_dataset(Dataset::S30, 150, 31)
    }
}

/// Platforms with a built-in hardware preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// Dual Xeon Gold 6226 node on an HDR-100 fabric
    XeonGold6226,
    /// Single H100 GPU per node on the same fabric
    H100,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::XeonGold6226, Platform::H100];

    pub fn name(&self) -> &'static str {
        match self {
            Platform::XeonGold6226 => "xeon-gold-6226",
            Platform::H100 => "h100",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Platform {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        Platform::ALL
            .iter()
            .copied()
            .find(|p| p.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ModelError::UnknownPreset(s.to_string()))
    }
}

/// Machine description for one node of the cluster.
///
/// All quantities are in bytes or bytes/second. `overlap_factor` is the
/// calibration constant A that scales the modeled sort cache misses against
/// measured hardware counters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HardwareParameters {
    /// Last-level cache size
    pub cache_size: f64,
    /// Cache-line size
    pub cache_line: f64,
    /// Sustained memory bandwidth
    pub mem_bandwidth: f64,
    /// Inter-node link bandwidth (bidirectional)
    pub link_bandwidth: f64,
    /// Node compute throughput
    pub node_throughput: f64,
    /// Calibration constant A
    #[serde(default = "default_overlap_factor")]
    pub overlap_factor: f64,
    /// Board power, used only for isopower comparisons
    #[serde(default)]
    pub tdp_watts: f64,
}

fn default_overlap_factor() -> f64 {
    1.0
}

impl HardwareParameters {
    /// Preset for the given platform
    pub fn for_platform(platform: Platform) -> Self {
        match platform {
            Platform::XeonGold6226 => Self::xeon_gold_6226(),
            Platform::H100 => Self::h100(),
        }
    }

    /// Look up a preset by name (`"xeon-gold-6226"`, `"h100"`)
    pub fn preset(name: &str) -> Result<Self> {
        name.parse::<Platform>().map(Self::for_platform)
    }

    /// Dual Xeon Gold 6226 node
    pub fn xeon_gold_6226() -> Self {
        Self {
            cache_size: 38e6,          // LLC
            cache_line: 64.0,
            mem_bandwidth: 47.16e9,    // membandwidth microbenchmark
            link_bandwidth: 12.5e9,    // HDR-100
            node_throughput: 121.9e9,
            overlap_factor: 1.0,
            tdp_watts: 250.0,          // 2 sockets
        }
    }

    /// NVIDIA H100 node
    pub fn h100() -> Self {
        Self {
            cache_size: 50e6,
            cache_line: 128.0,
            mem_bandwidth: 3e12,       // HBM3
            link_bandwidth: 12.5e9,
            node_throughput: 25.6e12,
            overlap_factor: 1.0,
            tdp_watts: 350.0,
        }
    }

    /// Same machine with a different calibration constant
    pub fn with_overlap_factor(self, overlap_factor: f64) -> Self {
        Self { overlap_factor, ..self }
    }

    /// Seconds per cache-line transfer from memory
    pub fn line_transfer_time(&self) -> f64 {
        self.cache_line / self.mem_bandwidth
    }
}

impl Default for HardwareParameters {
    fn default() -> Self {
        Self::xeon_gold_6226()
    }
}

/// Node count on `reference` drawing the same power as `partitions` nodes of `other`.
///
/// Returns `None` when either machine has no recorded board power.
pub fn isopower_partitions(
    reference: &HardwareParameters,
    other: &HardwareParameters,
    partitions: u64,
) -> Option<f64> {
    if reference.tdp_watts <= 0.0 || other.tdp_watts <= 0.0 {
        return None;
    }
    Some(partitions as f64 * other.tdp_watts / reference.tdp_watts)
}

/// Buffer-count constants for each level of the aggregation hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConstants {
    /// Conveyor buffer entries per neighbor
    pub c0: f64,
    /// Packets held in the send buffer
    pub c1: f64,
    /// K-mers per packet
    pub c2: f64,
    /// K-mers held in the output buffer
    pub c3: f64,
}

impl Default for BufferConstants {
    fn default() -> Self {
        Self {
            c0: 10000.0,
            c1: 1024.0,
            c2: 32.0,
            c3: 10000.0,
        }
    }
}

/// Synthetic inputs of 150-character reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dataset {
    S20,
    S21,
    S22,
    S23,
    S24,
    S25,
    S26,
    S27,
    S28,
    S29,
    S30,
    S31,
    S32,
}

impl Dataset {
    pub const ALL: [Dataset; 13] = [
        Dataset::S20,
        Dataset::S21,
        Dataset::S22,
        Dataset::S23,
        Dataset::S24,
        Dataset::S25,
        Dataset::S26,
        Dataset::S27,
        Dataset::S28,
        Dataset::S29,
        Dataset::S30,
        Dataset::S31,
        Dataset::S32,
    ];

    /// Datasets with measured single-cluster runs (s20 through s30)
    pub const VALIDATION: [Dataset; 11] = [
        Dataset::S20,
        Dataset::S21,
        Dataset::S22,
        Dataset::S23,
        Dataset::S24,
        Dataset::S25,
        Dataset::S26,
        Dataset::S27,
        Dataset::S28,
        Dataset::S29,
        Dataset::S30,
    ];

    pub fn read_count(&self) -> u64 {
        match self {
            Dataset::S20 => 349_500,
            Dataset::S21 => 699_050,
            Dataset::S22 => 1_398_100,
            Dataset::S23 => 2_796_200,
            Dataset::S24 => 5_592_400,
            Dataset::S25 => 11_184_800,
            Dataset::S26 => 22_369_600,
            Dataset::S27 => 44_739_200,
            Dataset::S28 => 89_478_450,
            Dataset::S29 => 178_956_950,
            Dataset::S30 => 357_913_900,
            Dataset::S31 => 715_827_850,
            Dataset::S32 => 1_431_655_750,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Dataset::S20 => "s20",
            Dataset::S21 => "s21",
            Dataset::S22 => "s22",
            Dataset::S23 => "s23",
            Dataset::S24 => "s24",
            Dataset::S25 => "s25",
            Dataset::S26 => "s26",
            Dataset::S27 => "s27",
            Dataset::S28 => "s28",
            Dataset::S29 => "s29",
            Dataset::S30 => "s30",
            Dataset::S31 => "s31",
            Dataset::S32 => "s32",
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dataset {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        Dataset::ALL
            .iter()
            .copied()
            .find(|d| d.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ModelError::UnknownDataset(s.to_string()))
    }
}
