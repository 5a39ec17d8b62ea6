//! Primitive Cost Functions
//!
//! Leaf formulas of the model: k-mer encoding width, per-partition data
//! volumes, streaming and sort cache-miss counts, and the individual time
//! terms of both phases.
//!
//! None of these validate their inputs. `partitions == 0`, `k == 0` or
//! `k > read_len` yield non-finite or negative values; sweep drivers are
//! expected to reject those before accepting a result.

use super::params::{HardwareParameters, WorkloadParameters};
use super::{Bytes, Count, Seconds};

/// Bits needed to pack one k-mer: 2k rounded up to a power of two
pub fn kmer_encoding_bits(k: u32) -> u64 {
    (2 * k as u64).next_power_of_two()
}

pub fn kmer_encoding_bytes(k: u32) -> Bytes {
    kmer_encoding_bits(k) as f64 / 8.0
}

/// K-mers extracted from `read_count` reads, one per valid start offset
pub fn kmer_count(read_count: u64, read_len: u64, k: u32) -> Count {
    read_count as f64 * (read_len as f64 - k as f64 + 1.0)
}

/// Raw input bytes held by one partition under even sharding
pub fn partition_input_bytes(read_count: u64, read_len: u64, partitions: u64) -> Bytes {
    (read_count as f64 * read_len as f64) / partitions as f64
}

/// Intermediate k-mer array held by one partition after phase 1
pub fn partition_kmer_array_bytes(
    read_count: u64,
    read_len: u64,
    k: u32,
    partitions: u64,
) -> Bytes {
    kmer_count(read_count, read_len, k) * kmer_encoding_bytes(k) / partitions as f64
}

/// Cache-line fetches for one linear pass over `data_bytes`
pub fn cache_misses_for(data_bytes: Bytes, cache_line: Bytes) -> Count {
    1.0 + data_bytes / cache_line
}

/// Cache misses of a radix sort over `data_bytes` of k-mers.
///
/// One streaming pass per byte of the encoding, scaled by the calibration
/// constant.
pub fn sort_cache_misses(
    data_bytes: Bytes,
    k: u32,
    cache_line: Bytes,
    overlap_factor: f64,
) -> Count {
    overlap_factor * kmer_encoding_bytes(k) * cache_misses_for(data_bytes, cache_line)
}

/// Byte volume touched by a radix sort of `kmers` k-mers
pub fn sort_work_bytes(kmers: Count, k: u32) -> Bytes {
    kmers * kmer_encoding_bytes(k)
}

// Phase 1: parse input and redistribute k-mers

pub fn phase1_compute(w: &WorkloadParameters, hw: &HardwareParameters, partitions: u64) -> Seconds {
    partition_input_bytes(w.read_count, w.read_len, partitions) / hw.node_throughput
}

/// Misses from streaming the raw input and the emitted k-mer array once
pub fn phase1_cache_misses(
    w: &WorkloadParameters,
    hw: &HardwareParameters,
    partitions: u64,
) -> Count {
    let input = cache_misses_for(
        partition_input_bytes(w.read_count, w.read_len, partitions),
        hw.cache_line,
    );
    let kmers = cache_misses_for(
        partition_kmer_array_bytes(w.read_count, w.read_len, w.k, partitions),
        hw.cache_line,
    );
    input + kmers
}

pub fn phase1_intra(w: &WorkloadParameters, hw: &HardwareParameters, partitions: u64) -> Seconds {
    phase1_cache_misses(w, hw, partitions) * hw.line_transfer_time()
}

/// Every partition sends and receives its k-mer array over a bidirectional link
pub fn phase1_inter(w: &WorkloadParameters, hw: &HardwareParameters, partitions: u64) -> Seconds {
    2.0 * partition_kmer_array_bytes(w.read_count, w.read_len, w.k, partitions) / hw.link_bandwidth
}

// Phase 2: local sort-based aggregation

pub fn phase2_compute(w: &WorkloadParameters, hw: &HardwareParameters, partitions: u64) -> Seconds {
    let kmers = w.kmer_count() / partitions as f64;
    sort_work_bytes(kmers, w.k) / hw.node_throughput
}

pub fn phase2_cache_misses(
    w: &WorkloadParameters,
    hw: &HardwareParameters,
    partitions: u64,
) -> Count {
    sort_cache_misses(
        partition_kmer_array_bytes(w.read_count, w.read_len, w.k, partitions),
        w.k,
        hw.cache_line,
        hw.overlap_factor,
    )
}

pub fn phase2_intra(w: &WorkloadParameters, hw: &HardwareParameters, partitions: u64) -> Seconds {
    phase2_cache_misses(w, hw, partitions) * hw.line_transfer_time()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_width() {
        assert_eq!(kmer_encoding_bits(31), 64);
        assert_eq!(kmer_encoding_bytes(31), 8.0);
        assert_eq!(kmer_encoding_bits(32), 64);
        assert_eq!(kmer_encoding_bits(33), 128);
        assert_eq!(kmer_encoding_bits(16), 32);
        assert_eq!(kmer_encoding_bits(1), 2);
        assert_eq!(kmer_encoding_bytes(21), 8.0);
        assert_eq!(kmer_encoding_bytes(63), 16.0);
    }

    #[test]
    fn test_volumes() {
        assert_eq!(kmer_count(10, 150, 31), 1200.0);
        assert_eq!(kmer_count(10, 31, 31), 10.0);
        assert_eq!(partition_input_bytes(1000, 150, 4), 37_500.0);
        assert_eq!(partition_kmer_array_bytes(1000, 150, 31, 4), 240_000.0);
    }

    #[test]
    fn test_cache_misses() {
        assert_eq!(cache_misses_for(0.0, 64.0), 1.0);
        assert_eq!(cache_misses_for(6400.0, 64.0), 101.0);
        // one pass per encoding byte
        assert_eq!(sort_cache_misses(6400.0, 31, 64.0, 1.0), 808.0);
        assert_eq!(sort_cache_misses(6400.0, 31, 64.0, 2.5), 2020.0);
    }

    #[test]
    fn test_out_of_range_inputs_do_not_panic() {
        // k > read_len gives a negative k-mer count instead of underflowing
        assert!(kmer_count(10, 20, 31) < 0.0);
        assert!(partition_input_bytes(10, 150, 0).is_infinite());
    }

    #[test]
    fn test_phase_terms_reference() {
        let w = WorkloadParameters::new(150, 1_000_000, 31);
        let hw = HardwareParameters::xeon_gold_6226();

        let compute = phase1_compute(&w, &hw, 2);
        assert!((compute - 75e6 / 121.9e9).abs() < 1e-18);

        // 2 * (1e6 * 120 * 8 / 2) / 12.5e9
        let inter = phase1_inter(&w, &hw, 2);
        assert!((inter - 960e6 / 12.5e9).abs() < 1e-15);

        let expected_misses = (1.0 + 75e6 / 64.0) + (1.0 + 480e6 / 64.0);
        assert_eq!(phase1_cache_misses(&w, &hw, 2), expected_misses);

        let sort_misses = phase2_cache_misses(&w, &hw, 2);
        assert_eq!(sort_misses, 8.0 * (1.0 + 480e6 / 64.0));
        assert!(phase2_intra(&w, &hw, 2) > 0.0);
        assert!(phase2_compute(&w, &hw, 2) > compute);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: per-partition volumes strictly shrink as P grows
            #[test]
            fn prop_volumes_decrease_with_partitions(
                read_count in 1u64..2_000_000_000,
                k in 1u32..64,
                extra in 0u64..300,
                p in 1u64..1_000_000,
            ) {
                let read_len = k as u64 + extra;
                prop_assert!(partition_input_bytes(read_count, read_len, p + 1)
                    < partition_input_bytes(read_count, read_len, p));
                prop_assert!(partition_kmer_array_bytes(read_count, read_len, k, p + 1)
                    < partition_kmer_array_bytes(read_count, read_len, k, p));
            }

            /// Property: encoding is the smallest power of two holding 2k bits
            #[test]
            fn prop_encoding_is_tight(k in 1u32..10_000) {
                let bits = kmer_encoding_bits(k);
                prop_assert!(bits.is_power_of_two());
                prop_assert!(bits >= 2 * k as u64);
                prop_assert!(bits / 2 < 2 * k as u64);
            }

            /// Property: valid inputs give finite positive terms
            #[test]
            fn prop_terms_positive(
                read_count in 1u64..2_000_000_000,
                k in 1u32..64,
                extra in 0u64..300,
                p in 1u64..100_000,
            ) {
                let w = WorkloadParameters::new(k as u64 + extra, read_count, k);
                let hw = HardwareParameters::default();
                for term in [
                    phase1_compute(&w, &hw, p),
                    phase1_intra(&w, &hw, p),
                    phase1_inter(&w, &hw, p),
                    phase2_compute(&w, &hw, p),
                    phase2_intra(&w, &hw, p),
                ] {
                    prop_assert!(term.is_finite() && term > 0.0);
                }
            }
        }
    }
}
