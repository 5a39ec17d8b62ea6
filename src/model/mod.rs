//! Analytical Cost Model
//!
//! Closed-form estimates for two-phase distributed k-mer counting:
//! - Primitive cost functions (encoding width, data volumes, cache misses, phase terms)
//! - Composition of phase terms into end-to-end time and utilization
//! - Memory footprint of the message-aggregation stack

pub mod composition;
pub mod memory;
pub mod params;
pub mod primitives;

pub use composition::{CombinePolicy, PhaseTerms, TimeEstimator, TimePrediction, Utilization};
pub use memory::{AggregationLayers, Topology};
pub use params::{BufferConstants, Dataset, HardwareParameters, Platform, WorkloadParameters};

// Unit conventions. These are plain aliases: nothing stops a caller from
// mixing them up, they only document what a formula returns.

/// Elapsed time in seconds
pub type Seconds = f64;
/// Data volume or memory in bytes
pub type Bytes = f64;
/// Event count (k-mers, cache misses)
pub type Count = f64;
/// Dimensionless share in `[0, 1]`
pub type Fraction = f64;
