//! Composition Model
//!
//! Combines the primitive terms into phase times, end-to-end time and the
//! compute / intra-node / inter-node utilization breakdown.

use crate::error::{ModelError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::params::{HardwareParameters, WorkloadParameters};
use super::primitives;
use super::{Fraction, Seconds};

/// How phase 1's intra-node and inter-node terms are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombinePolicy {
    /// Sequential, non-overlapped transfers
    Sum,
    /// Fully overlapped transfers
    Max,
}

impl CombinePolicy {
    pub fn name(&self) -> &'static str {
        match self {
            CombinePolicy::Sum => "sum",
            CombinePolicy::Max => "max",
        }
    }

    pub fn combine(&self, a: Seconds, b: Seconds) -> Seconds {
        match self {
            CombinePolicy::Sum => a + b,
            CombinePolicy::Max => a.max(b),
        }
    }
}

impl Default for CombinePolicy {
    fn default() -> Self {
        CombinePolicy::Max
    }
}

impl fmt::Display for CombinePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CombinePolicy {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sum" => Ok(CombinePolicy::Sum),
            "max" => Ok(CombinePolicy::Max),
            other => Err(ModelError::InvalidPolicy(other.to_string())),
        }
    }
}

/// Raw time terms of one phase, before any max/sum combination
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PhaseTerms {
    pub compute: Seconds,
    pub intra: Seconds,
    pub inter: Seconds,
}

impl PhaseTerms {
    /// Communication time under `policy`
    pub fn communication(&self, policy: CombinePolicy) -> Seconds {
        policy.combine(self.intra, self.inter)
    }

    /// Phase time: compute overlapped with communication
    pub fn time(&self, policy: CombinePolicy) -> Seconds {
        self.compute.max(self.communication(policy))
    }

    /// Unnormalized sum of all three terms
    pub fn sum(&self) -> Seconds {
        self.compute + self.intra + self.inter
    }

    /// Divide each term by the total
    pub fn normalized(&self) -> Utilization {
        let total = self.sum();
        Utilization {
            compute: self.compute / total,
            intra: self.intra / total,
            inter: self.inter / total,
        }
    }
}

impl std::ops::Add for PhaseTerms {
    type Output = PhaseTerms;

    fn add(self, other: PhaseTerms) -> PhaseTerms {
        PhaseTerms {
            compute: self.compute + other.compute,
            intra: self.intra + other.intra,
            inter: self.inter + other.inter,
        }
    }
}

impl std::ops::AddAssign for PhaseTerms {
    fn add_assign(&mut self, other: PhaseTerms) {
        *self = *self + other;
    }
}

/// Fraction of modeled time per resource; the three fields sum to 1
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Utilization {
    pub compute: Fraction,
    pub intra: Fraction,
    pub inter: Fraction,
}

/// End-to-end prediction with its phase decomposition
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimePrediction {
    pub policy: CombinePolicy,
    pub phase1: Seconds,
    pub phase2: Seconds,
    /// Always `phase1 + phase2`; phases never overlap
    pub total: Seconds,
}

/// Time estimator for one machine description.
///
/// Every query is a pure function of the workload, the partition count and
/// the hardware held here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeEstimator {
    hardware: HardwareParameters,
}

impl TimeEstimator {
    pub fn new(hardware: HardwareParameters) -> Self {
        Self { hardware }
    }

    pub fn hardware(&self) -> &HardwareParameters {
        &self.hardware
    }

    /// Phase 1 terms: parse, emit and redistribute k-mers
    pub fn phase1_terms(&self, w: &WorkloadParameters, partitions: u64) -> PhaseTerms {
        let hw = &self.hardware;
        PhaseTerms {
            compute: primitives::phase1_compute(w, hw, partitions),
            intra: primitives::phase1_intra(w, hw, partitions),
            inter: primitives::phase1_inter(w, hw, partitions),
        }
    }

    /// Phase 2 terms: local radix sort; aggregation has no inter-node traffic
    pub fn phase2_terms(&self, w: &WorkloadParameters, partitions: u64) -> PhaseTerms {
        let hw = &self.hardware;
        PhaseTerms {
            compute: primitives::phase2_compute(w, hw, partitions),
            intra: primitives::phase2_intra(w, hw, partitions),
            inter: 0.0,
        }
    }

    /// Phase 1 communication: intra- and inter-node terms combined by `policy`
    pub fn phase1_comm(
        &self,
        w: &WorkloadParameters,
        partitions: u64,
        policy: CombinePolicy,
    ) -> Seconds {
        self.phase1_terms(w, partitions).communication(policy)
    }

    pub fn phase1_time(
        &self,
        w: &WorkloadParameters,
        partitions: u64,
        policy: CombinePolicy,
    ) -> Seconds {
        self.phase1_terms(w, partitions).time(policy)
    }

    pub fn phase2_time(&self, w: &WorkloadParameters, partitions: u64) -> Seconds {
        // inter is zero, so the policy does not matter
        self.phase2_terms(w, partitions).time(CombinePolicy::Max)
    }

    pub fn end_to_end_time(
        &self,
        w: &WorkloadParameters,
        partitions: u64,
        policy: CombinePolicy,
    ) -> Seconds {
        self.phase1_time(w, partitions, policy) + self.phase2_time(w, partitions)
    }

    pub fn predict(
        &self,
        w: &WorkloadParameters,
        partitions: u64,
        policy: CombinePolicy,
    ) -> TimePrediction {
        let phase1 = self.phase1_time(w, partitions, policy);
        let phase2 = self.phase2_time(w, partitions);
        TimePrediction {
            policy,
            phase1,
            phase2,
            total: phase1 + phase2,
        }
    }

    /// Both phases' terms added together (unnormalized)
    pub fn resource_totals(&self, w: &WorkloadParameters, partitions: u64) -> PhaseTerms {
        self.phase1_terms(w, partitions) + self.phase2_terms(w, partitions)
    }

    pub fn compute_total(&self, w: &WorkloadParameters, partitions: u64) -> Seconds {
        self.resource_totals(w, partitions).compute
    }

    pub fn intranode_total(&self, w: &WorkloadParameters, partitions: u64) -> Seconds {
        self.resource_totals(w, partitions).intra
    }

    pub fn internode_total(&self, w: &WorkloadParameters, partitions: u64) -> Seconds {
        self.resource_totals(w, partitions).inter
    }

    /// Normalized utilization breakdown at a fixed partition count
    pub fn utilization(&self, w: &WorkloadParameters, partitions: u64) -> Utilization {
        self.resource_totals(w, partitions).normalized()
    }
}

impl Default for TimeEstimator {
    fn default() -> Self {
        Self::new(HardwareParameters::default())
    }
}
