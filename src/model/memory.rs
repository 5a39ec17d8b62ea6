//! Aggregation Memory Model
//!
//! Memory held by the message-aggregation stack of asynchronous k-mer
//! counting, broken into four layers:
//!
//! - layer 0: conveyor buffers, sized by the topology's per-node fan-out
//! - layer 1: send buffer, a fixed number of packets
//! - layer 2: one packet buffer per destination partition
//! - layer 3: output buffer receiving sorted k-mers
//!
//! Layers 0 and 2 are held twice (send and receive side).

use crate::error::{ModelError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::params::{BufferConstants, WorkloadParameters};
use super::primitives::kmer_encoding_bytes;
use super::Bytes;

/// Per-packet metadata appended to every layer-2 packet
pub const PACKET_METADATA_BYTES: Bytes = 8.0;

pub const MIB: f64 = 1024.0 * 1024.0;
pub const GIB: f64 = 1024.0 * MIB;

/// Shape of the conveyor used to route k-mers between partitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Topology {
    #[serde(rename = "1d")]
    OneD,
    #[serde(rename = "2d")]
    TwoD,
    #[serde(rename = "3d")]
    ThreeD,
}

impl Topology {
    pub const ALL: [Topology; 3] = [Topology::OneD, Topology::TwoD, Topology::ThreeD];

    pub fn name(&self) -> &'static str {
        match self {
            Topology::OneD => "1d",
            Topology::TwoD => "2d",
            Topology::ThreeD => "3d",
        }
    }

    /// Neighbors each node buffers for: P, sqrt(P) or cbrt(P)
    pub fn fan_out(&self, partitions: u64) -> f64 {
        let p = partitions as f64;
        match self {
            Topology::OneD => p,
            Topology::TwoD => p.powf(0.5),
            Topology::ThreeD => p.powf(1.0 / 3.0),
        }
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Topology {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "1d" => Ok(Topology::OneD),
            "2d" => Ok(Topology::TwoD),
            "3d" => Ok(Topology::ThreeD),
            other => Err(ModelError::InvalidTopology(other.to_string())),
        }
    }
}

/// Conveyor buffer for one side (send or receive)
pub fn layer0(topology: Topology, partitions: u64, c0: f64) -> Bytes {
    2.0 * c0 * topology.fan_out(partitions)
}

/// Send buffer holding `c1` packets
pub fn layer1(c1: f64, packet_bytes: Bytes) -> Bytes {
    c1 * packet_bytes
}

/// One packet per destination partition, for one side
pub fn layer2(c2: f64, partitions: u64, k: u32) -> Bytes {
    let packet = c2 * kmer_encoding_bytes(k) + PACKET_METADATA_BYTES;
    partitions as f64 * packet
}

pub fn layer3(c3: f64, k: u32) -> Bytes {
    c3 * kmer_encoding_bytes(k)
}

/// Combined aggregation memory for `topology`
pub fn total_memory(
    topology: Topology,
    partitions: u64,
    buffers: &BufferConstants,
    k: u32,
) -> Bytes {
    let mem3 = layer3(buffers.c3, k);
    let mem2 = layer2(buffers.c2, partitions, k);
    let mem1 = layer1(buffers.c1, mem2 / partitions as f64);
    let mem0 = layer0(topology, partitions, buffers.c0);
    (2.0 * mem0) + (2.0 * mem2) + mem1 + mem3
}

/// Baseline memory of the counting algorithm itself: input plus k-mer array
pub fn algorithm_memory(w: &WorkloadParameters, partitions: u64) -> Bytes {
    let output = w.kmer_count() * w.encoding_bytes();
    (w.input_bytes() + output) / partitions as f64
}

/// Held bytes per aggregation layer, send and receive sides included
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AggregationLayers {
    pub topology: Topology,
    pub conveyor: Bytes,
    pub send: Bytes,
    pub packets: Bytes,
    pub output: Bytes,
}

impl AggregationLayers {
    pub fn for_topology(
        topology: Topology,
        partitions: u64,
        buffers: &BufferConstants,
        k: u32,
    ) -> Self {
        let packets = 2.0 * layer2(buffers.c2, partitions, k);
        // a send-buffer packet has the size of one layer-2 packet
        let packet_bytes = packets / (2.0 * partitions as f64);
        Self {
            topology,
            conveyor: 2.0 * layer0(topology, partitions, buffers.c0),
            send: layer1(buffers.c1, packet_bytes),
            packets,
            output: layer3(buffers.c3, k),
        }
    }

    pub fn sum(&self) -> Bytes {
        self.conveyor + self.send + self.packets + self.output
    }
}

/// Relative difference used by the layer cross-check
pub fn relative_difference(a: f64, b: f64) -> f64 {
    let scale = a.abs().max(b.abs());
    if scale == 0.0 {
        0.0
    } else {
        (a - b).abs() / scale
    }
}

/// Combined total for `topology`, verified against its decomposed layers.
///
/// A mismatch means the layer algebra is wrong, so it is reported as
/// [`ModelError::LayerMismatch`] rather than tolerated.
pub fn checked_total_memory(
    topology: Topology,
    partitions: u64,
    buffers: &BufferConstants,
    k: u32,
    tolerance: f64,
) -> Result<Bytes> {
    let combined = total_memory(topology, partitions, buffers, k);
    let decomposed = AggregationLayers::for_topology(topology, partitions, buffers, k).sum();
    if relative_difference(combined, decomposed) > tolerance || !combined.is_finite() {
        return Err(ModelError::LayerMismatch {
            topology: topology.to_string(),
            partitions,
            combined,
            decomposed,
        });
    }
    Ok(combined)
}

pub fn to_mib(bytes: Bytes) -> f64 {
    bytes / MIB
}

pub fn to_gib(bytes: Bytes) -> f64 {
    bytes / GIB
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_formulas() {
        let buffers = BufferConstants::default();
        assert_eq!(layer3(buffers.c3, 31), 80_000.0);
        // (32 * 8 + 8) * 4
        assert_eq!(layer2(buffers.c2, 4, 31), 1056.0);
        assert_eq!(layer1(buffers.c1, 264.0), 270_336.0);
        assert_eq!(layer0(Topology::OneD, 64, buffers.c0), 1_280_000.0);
        assert!((layer0(Topology::TwoD, 64, buffers.c0) - 160_000.0).abs() < 1e-6);
        assert!((layer0(Topology::ThreeD, 64, buffers.c0) - 80_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_total_memory_single_partition() {
        let buffers = BufferConstants::default();
        // every topology has fan-out 1 at P = 1
        let expected = 2.0 * 20_000.0 + 2.0 * 264.0 + 1024.0 * 264.0 + 80_000.0;
        for topology in Topology::ALL {
            assert_eq!(total_memory(topology, 1, &buffers, 31), expected);
        }
    }

    #[test]
    fn test_topology_parsing() {
        assert_eq!("2d".parse::<Topology>().unwrap(), Topology::TwoD);
        assert_eq!("3d".parse::<Topology>().unwrap(), Topology::ThreeD);
        for bad in ["4d", "3D", "1D", ""] {
            assert!(matches!(
                bad.parse::<Topology>(),
                Err(ModelError::InvalidTopology(ref s)) if s == bad
            ));
        }
    }

    #[test]
    fn test_checked_total_memory_tolerance() {
        let buffers = BufferConstants::default();
        let total = checked_total_memory(Topology::TwoD, 256, &buffers, 31, 1e-6).unwrap();
        assert_eq!(total, total_memory(Topology::TwoD, 256, &buffers, 31));
        assert_eq!(relative_difference(0.0, 0.0), 0.0);
        assert!((relative_difference(100.0, 99.0) - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_unit_conversions() {
        assert_eq!(to_mib(3.0 * MIB), 3.0);
        assert_eq!(to_gib(512.0 * MIB), 0.5);
    }
}
