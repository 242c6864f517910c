//! Error taxonomy for the bring-up pipeline.
//!
//! Each concern owns a narrow enum (`GraphError`, `LinkError`, `LedgerError`,
//! `ConfigError`, and [`crate::init::InitError`]); [`DeployError`] aggregates
//! them for callers that drive the whole pipeline. Every variant is terminal
//! for the current attempt.

use alloy_primitives::Address;
use thiserror::Error;

use crate::init::InitError;

/// Errors produced while building or ordering the link graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// Two units were declared with the same name.
    #[error("duplicate unit declared: {unit}")]
    DuplicateUnit { unit: String },

    /// A unit (or explicit edge) references a unit that was never declared.
    #[error("unit {unit} depends on unknown unit {dependency}")]
    UnknownDependency { unit: String, dependency: String },

    /// The link graph contains a cycle. `units` lists the cycle members in
    /// dependency order.
    #[error("cyclic link dependency involving units: {units:?}")]
    CyclicDependency { units: Vec<String> },

    /// A lookup named a unit absent from the graph.
    #[error("unit not found in graph: {unit}")]
    UnitNotFound { unit: String },
}

/// Errors produced while substituting dependency addresses into bytecode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("invalid bytecode for unit {unit}: {reason}")]
    InvalidBytecode { unit: String, reason: String },

    /// A dependency has no address in the table yet.
    #[error("unit {unit} links against {dependency}, which has not been deployed")]
    DependencyNotDeployed { unit: String, dependency: String },

    /// A placeholder survived substitution: the artifact references a library
    /// that was not declared as a dependency.
    #[error("unit {unit} still contains unresolved link placeholder {placeholder}")]
    UnresolvedPlaceholder { unit: String, placeholder: String },
}

/// Failures reported by the ledger at the deployment call boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The chain accepted the transaction for processing but rejected it.
    #[error("transaction rejected: {0}")]
    Rejected(String),

    /// The gas limit was insufficient for the submission.
    #[error("out of gas (limit {limit})")]
    OutOfGas { limit: u64 },

    /// The ledger could not be reached.
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

/// Errors produced while loading a deployment manifest.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read manifest {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse manifest: {0}")]
    Parse(#[from] toml::de::Error),

    /// A field could not be converted into its typed form.
    #[error("invalid value for {field}: {reason}")]
    InvalidField { field: String, reason: String },

    /// An initialization target names a unit that is not declared.
    #[error("initialization target {unit} is not a declared unit")]
    UnknownInitTarget { unit: String },

    #[error("unit {unit} has more than one initialization target")]
    DuplicateInitTarget { unit: String },

    #[error("initialization target {unit} expects {expected} commitment roots, got {actual}")]
    CommitmentRootCount {
        unit: String,
        expected: usize,
        actual: usize,
    },
}

/// Aggregate error for the deployment pipeline.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Link(#[from] LinkError),

    /// Initialization parameters for `unit` were rejected by the validator.
    #[error("initialization rejected for {unit}: {source}")]
    Init {
        unit: String,
        #[source]
        source: InitError,
    },

    /// The ledger refused the deployment of `unit`; later units were not
    /// attempted.
    #[error("deployment of {unit} failed: {cause}")]
    DeploymentFailed {
        unit: String,
        #[source]
        cause: LedgerError,
    },

    /// The address table is append-only.
    #[error("address for {unit} already recorded as {existing}")]
    AddressAlreadyRecorded { unit: String, existing: Address },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DeployError {
    /// The validator error, when this failure came from initialization gating.
    pub fn init_error(&self) -> Option<&InitError> {
        match self {
            DeployError::Init { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Result type for deployment pipeline operations.
pub type Result<T> = std::result::Result<T, DeployError>;

/// Result type for graph operations.
pub type GraphResult<T> = std::result::Result<T, GraphError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cyclic_dependency_displays_unit_names() {
        let err = GraphError::CyclicDependency {
            units: vec!["StemRelay".to_string(), "StemCreation".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("StemRelay"));
        assert!(msg.contains("StemCreation"));
    }

    #[test]
    fn test_deployment_failed_names_unit_and_cause() {
        let err = DeployError::DeploymentFailed {
            unit: "StemChallenge".to_string(),
            cause: LedgerError::OutOfGas { limit: 21_000 },
        };
        let msg = err.to_string();
        assert!(msg.contains("StemChallenge"));
        assert!(msg.contains("21000"));
    }

    #[test]
    fn test_graph_error_is_transparent_in_deploy_error() {
        let err: DeployError = GraphError::UnknownDependency {
            unit: "StemRootchain".to_string(),
            dependency: "Missing".to_string(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "unit StemRootchain depends on unknown unit Missing"
        );
    }

    #[test]
    fn test_init_error_accessor() {
        let err = DeployError::Init {
            unit: "StemRootchain".to_string(),
            source: InitError::NoOperators,
        };
        assert_eq!(err.init_error(), Some(&InitError::NoOperators));

        let other = DeployError::Io(std::io::Error::other("boom"));
        assert!(other.init_error().is_none());
    }
}
