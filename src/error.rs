//! Error types for the k-mer counting model

use thiserror::Error;

/// Result type alias for model operations
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors raised at the model boundary and by sweep drivers.
///
/// The primitive cost functions never fail; out-of-range inputs there are the
/// caller's responsibility. Everything below is either a rejected selector
/// string, a configuration problem, or a fatal check inside a sweep.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Combination policy other than `sum` or `max`
    #[error("Invalid combination policy '{0}': expected 'sum' or 'max'")]
    InvalidPolicy(String),

    /// Aggregation topology other than `1d`, `2d` or `3d`
    #[error("Invalid aggregation topology '{0}': expected '1d', '2d' or '3d'")]
    InvalidTopology(String),

    /// Dataset name not in the synthetic catalogue
    #[error("Unknown dataset '{0}'")]
    UnknownDataset(String),

    /// Hardware preset name not recognized
    #[error("Unknown hardware preset '{0}'")]
    UnknownPreset(String),

    /// Sweep range that cannot produce any partition count
    #[error("Invalid sweep: {0}")]
    InvalidSweep(String),

    /// A computed term was zero, negative or non-finite during a sweep
    #[error("Non-positive {term} term at P={partitions}: {value}")]
    NonPositiveTerm {
        /// Name of the failing term
        term: &'static str,
        /// Partition count at which the sweep halted
        partitions: u64,
        /// Offending value
        value: f64,
    },

    /// Decomposed layer costs disagree with the combined memory formula
    #[error(
        "Memory layers diverge for {topology} at P={partitions}: combined {combined} B, decomposed {decomposed} B"
    )]
    LayerMismatch {
        /// Topology being checked
        topology: String,
        /// Partition count at which the check failed
        partitions: u64,
        /// Value of the combined formula
        combined: f64,
        /// Sum of the independently computed layers
        decomposed: f64,
    },

    /// I/O error while reading a configuration file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed configuration JSON
    #[error("Configuration error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ModelError::InvalidPolicy("avg".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid combination policy 'avg': expected 'sum' or 'max'"
        );

        let err = ModelError::NonPositiveTerm {
            term: "intra-node",
            partitions: 64,
            value: -1.5,
        };
        assert!(err.to_string().contains("P=64"));
        assert!(err.to_string().contains("intra-node"));
    }
}
