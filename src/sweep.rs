//! Parameter Sweeps
//!
//! Drivers that evaluate the model over a range of partition counts or
//! datasets and collect result series for a reporting layer.
//!
//! The sweep owns its loop state; the model itself holds none. Every term a
//! sweep accepts is checked to be finite and positive. The first failing
//! check halts the sweep with [`ModelError::NonPositiveTerm`], since it means
//! the caller passed an out-of-range parameter.

use crate::error::{ModelError, Result};
use crate::model::memory::{self, Topology};
use crate::model::{
    primitives, BufferConstants, CombinePolicy, Dataset, PhaseTerms, TimeEstimator, Utilization,
    WorkloadParameters,
};
use log::{debug, error, info};
use serde::Serialize;

/// Relative tolerance of the memory layer cross-check
pub const MEMORY_CHECK_TOLERANCE: f64 = 1e-6;

/// Partition counts `start, 2*start, 4*start, ...` up to and including `bound`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionSweep {
    start: u64,
    bound: u64,
}

impl PartitionSweep {
    pub fn new(start: u64, bound: u64) -> Result<Self> {
        if start == 0 {
            return Err(ModelError::InvalidSweep(
                "start partition count must be at least 1".to_string(),
            ));
        }
        if bound < start {
            return Err(ModelError::InvalidSweep(format!(
                "bound {} is below start {}",
                bound, start
            )));
        }
        Ok(Self { start, bound })
    }

    /// A sweep over a single partition count
    pub fn single(partitions: u64) -> Result<Self> {
        Self::new(partitions, partitions)
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn bound(&self) -> u64 {
        self.bound
    }

    pub fn iter(&self) -> impl Iterator<Item = u64> {
        let bound = self.bound;
        std::iter::successors(Some(self.start), move |p| p.checked_mul(2))
            .take_while(move |p| *p <= bound)
    }
}

/// Accept `value` only if it is finite and strictly positive
pub fn ensure_positive(term: &'static str, partitions: u64, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        error!("Sweep halted: {} term is {} at P={}", term, value, partitions);
        Err(ModelError::NonPositiveTerm { term, partitions, value })
    }
}

/// Phase 1 and phase 2 terms at `partitions`, rejected unless every
/// resource total is finite and positive
pub fn checked_terms(
    estimator: &TimeEstimator,
    workload: &WorkloadParameters,
    partitions: u64,
) -> Result<(PhaseTerms, PhaseTerms)> {
    let p1 = estimator.phase1_terms(workload, partitions);
    let p2 = estimator.phase2_terms(workload, partitions);
    ensure_positive("compute", partitions, p1.compute + p2.compute)?;
    ensure_positive("intra-node", partitions, p1.intra + p2.intra)?;
    ensure_positive("inter-node", partitions, p1.inter)?;
    Ok((p1, p2))
}

/// Normalized resource usage at one partition count
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UtilizationPoint {
    pub partitions: u64,
    pub compute: f64,
    pub intra: f64,
    pub inter: f64,
    /// Unnormalized compute + intra + inter, in seconds
    pub total_seconds: f64,
}

/// Predicted times at one partition count
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScalingPoint {
    pub partitions: u64,
    pub phase1: f64,
    pub phase2: f64,
    pub total: f64,
}

/// Predictions for one dataset at a fixed partition count
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DatasetPoint {
    pub dataset: Dataset,
    pub read_count: u64,
    pub total_max: f64,
    pub total_sum: f64,
    pub phase1_max: f64,
    pub phase1_sum: f64,
    pub phase2: f64,
    /// Phase 1 last-level cache misses per partition
    pub parse_cache_misses: f64,
    /// Phase 2 last-level cache misses per partition
    pub sort_cache_misses: f64,
    /// Compute / intra-node / inter-node split at this partition count
    pub utilization: Utilization,
}

/// Memory per partition, in bytes, for the algorithm and each topology
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MemoryPoint {
    pub partitions: u64,
    pub algorithm: f64,
    pub one_d: f64,
    pub two_d: f64,
    pub three_d: f64,
}

impl MemoryPoint {
    pub fn aggregation(&self, topology: Topology) -> f64 {
        match topology {
            Topology::OneD => self.one_d,
            Topology::TwoD => self.two_d,
            Topology::ThreeD => self.three_d,
        }
    }
}

/// Strong-scaling sweep of the compute / intra-node / inter-node split
pub fn utilization_sweep(
    estimator: &TimeEstimator,
    workload: &WorkloadParameters,
    sweep: &PartitionSweep,
) -> Result<Vec<UtilizationPoint>> {
    info!(
        "Utilization sweep: {} reads, P from {} to {}",
        workload.read_count,
        sweep.start(),
        sweep.bound()
    );

    let mut points = Vec::new();
    for partitions in sweep.iter() {
        let totals = estimator.resource_totals(workload, partitions);
        ensure_positive("compute", partitions, totals.compute)?;
        ensure_positive("intra-node", partitions, totals.intra)?;
        ensure_positive("inter-node", partitions, totals.inter)?;

        let share = totals.normalized();
        debug!(
            "P={}: compute {:.4}, intra {:.4}, inter {:.4}",
            partitions, share.compute, share.intra, share.inter
        );
        points.push(UtilizationPoint {
            partitions,
            compute: share.compute,
            intra: share.intra,
            inter: share.inter,
            total_seconds: totals.sum(),
        });
    }
    Ok(points)
}

/// Strong-scaling sweep of phase and end-to-end time under `policy`
pub fn time_sweep(
    estimator: &TimeEstimator,
    workload: &WorkloadParameters,
    sweep: &PartitionSweep,
    policy: CombinePolicy,
) -> Result<Vec<ScalingPoint>> {
    info!(
        "Time sweep ({}): {} reads, P from {} to {}",
        policy,
        workload.read_count,
        sweep.start(),
        sweep.bound()
    );

    let mut points = Vec::new();
    for partitions in sweep.iter() {
        checked_terms(estimator, workload, partitions)?;

        let prediction = estimator.predict(workload, partitions, policy);
        debug!("P={}: {:.6} s", partitions, prediction.total);
        points.push(ScalingPoint {
            partitions,
            phase1: prediction.phase1,
            phase2: prediction.phase2,
            total: prediction.total,
        });
    }
    Ok(points)
}

/// Predictions and resource breakdown across datasets at one partition count.
///
/// `workload` supplies the read length and k; its read count is replaced by
/// each dataset's.
pub fn dataset_sweep(
    estimator: &TimeEstimator,
    workload: &WorkloadParameters,
    datasets: &[Dataset],
    partitions: u64,
) -> Result<Vec<DatasetPoint>> {
    info!("Dataset sweep: {} datasets at P={}", datasets.len(), partitions);

    let hw = estimator.hardware();
    let mut points = Vec::with_capacity(datasets.len());
    for &dataset in datasets {
        let w = workload.with_read_count(dataset.read_count());
        let (p1, p2) = checked_terms(estimator, &w, partitions)?;

        let parse_cache_misses = ensure_positive(
            "phase 1 cache-miss",
            partitions,
            primitives::phase1_cache_misses(&w, hw, partitions),
        )?;
        let sort_cache_misses = ensure_positive(
            "phase 2 cache-miss",
            partitions,
            primitives::phase2_cache_misses(&w, hw, partitions),
        )?;

        let max = estimator.predict(&w, partitions, CombinePolicy::Max);
        let sum = estimator.predict(&w, partitions, CombinePolicy::Sum);
        debug!("{}: max {:.4} s, sum {:.4} s", dataset, max.total, sum.total);

        points.push(DatasetPoint {
            dataset,
            read_count: w.read_count,
            total_max: max.total,
            total_sum: sum.total,
            phase1_max: max.phase1,
            phase1_sum: sum.phase1,
            phase2: max.phase2,
            parse_cache_misses,
            sort_cache_misses,
            utilization: (p1 + p2).normalized(),
        });
    }
    Ok(points)
}

/// Aggregation memory per topology, cross-checked at every step
pub fn memory_sweep(
    workload: &WorkloadParameters,
    buffers: &BufferConstants,
    sweep: &PartitionSweep,
) -> Result<Vec<MemoryPoint>> {
    info!("Memory sweep: P from {} to {}", sweep.start(), sweep.bound());

    let mut points = Vec::new();
    for partitions in sweep.iter() {
        let check = |topology| {
            memory::checked_total_memory(
                topology,
                partitions,
                buffers,
                workload.k,
                MEMORY_CHECK_TOLERANCE,
            )
        };
        let point = MemoryPoint {
            partitions,
            algorithm: memory::algorithm_memory(workload, partitions),
            one_d: check(Topology::OneD)?,
            two_d: check(Topology::TwoD)?,
            three_d: check(Topology::ThreeD)?,
        };
        debug!(
            "P={}: algorithm {:.1} MiB, 1D {:.1} MiB, 2D {:.1} MiB, 3D {:.1} MiB",
            partitions,
            memory::to_mib(point.algorithm),
            memory::to_mib(point.one_d),
            memory::to_mib(point.two_d),
            memory::to_mib(point.three_d)
        );
        points.push(point);
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_sweep_doubles() {
        let sweep = PartitionSweep::new(4, 64).unwrap();
        assert_eq!(sweep.iter().collect::<Vec<_>>(), vec![4, 8, 16, 32, 64]);

        let sweep = PartitionSweep::new(3, 20).unwrap();
        assert_eq!(sweep.iter().collect::<Vec<_>>(), vec![3, 6, 12]);

        let sweep = PartitionSweep::single(8).unwrap();
        assert_eq!(sweep.iter().collect::<Vec<_>>(), vec![8]);
    }

    #[test]
    fn test_partition_sweep_stops_before_overflow() {
        let sweep = PartitionSweep::new(1 << 62, u64::MAX).unwrap();
        assert_eq!(sweep.iter().collect::<Vec<_>>(), vec![1 << 62, 1 << 63]);
    }

    #[test]
    fn test_partition_sweep_rejects_bad_ranges() {
        assert!(matches!(PartitionSweep::new(0, 16), Err(ModelError::InvalidSweep(_))));
        assert!(matches!(PartitionSweep::new(32, 16), Err(ModelError::InvalidSweep(_))));
    }

    #[test]
    fn test_ensure_positive() {
        assert_eq!(ensure_positive("compute", 1, 2.5).unwrap(), 2.5);
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                ensure_positive("compute", 1, bad),
                Err(ModelError::NonPositiveTerm { term: "compute", partitions: 1, .. })
            ));
        }
    }
}
