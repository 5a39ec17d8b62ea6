//! Analytical performance model for distributed k-mer counting.
//!
//! Estimates execution time, memory footprint and cache misses of a
//! two-phase algorithm (parse and redistribute k-mers, then sort-based
//! aggregation) from workload size and machine parameters.

pub mod config;
pub mod error;
pub mod model;
pub mod sweep;

pub use config::ModelConfig;
pub use error::{ModelError, Result};
pub use model::{
    BufferConstants, CombinePolicy, Dataset, HardwareParameters, Platform, TimeEstimator,
    TimePrediction, Topology, Utilization, WorkloadParameters,
};
pub use sweep::PartitionSweep;
