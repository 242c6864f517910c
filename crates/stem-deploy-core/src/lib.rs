//! Stem Deploy Core Library
//!
//! Brings up a Stem rootchain: orders deployable units by their link-time
//! dependencies, links each unit against the addresses of the units it
//! depends on, deploys them one at a time through a [`Ledger`], and gates the
//! chain's initialization entry point behind the operator and deposit
//! invariants checked by [`InitValidator`].

pub mod address_book;
pub mod commitment;
pub mod deployer;
pub mod error;
pub mod fakes;
pub mod graph;
pub mod init;
pub mod ledger;
pub mod link;
pub mod manifest;
pub mod obs;
pub mod orchestrator;
pub mod telemetry;
pub mod unit;

pub use address_book::AddressBook;
pub use commitment::binary_merkle_root;
pub use deployer::{Deployer, DeploymentReceipt};
pub use error::{ConfigError, DeployError, GraphError, LedgerError, LinkError, Result};
pub use fakes::MemoryLedger;
pub use graph::{resolve_order, LinkGraph};
pub use init::{
    validate, ChainInitParams, InitCall, InitError, InitRule, InitValidator, ValidatedInit,
    ValidationThresholds,
};
pub use ledger::{DeployPolicy, Ledger, Submission, DEFAULT_GAS_LIMIT};
pub use link::{hashed_placeholder, legacy_placeholder, link, LinkedArtifact};
pub use manifest::{load_plan, parse_plan};
pub use orchestrator::{BringUpPlan, DeploymentReport, InitTarget, Orchestrator};
pub use telemetry::init_tracing;
pub use unit::{LinkEdge, Unit};

/// Crate version, reported by the CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
