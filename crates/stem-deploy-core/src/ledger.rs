//! Deployment call boundary.
//!
//! The orchestrator never talks to a chain directly. It hands a
//! [`Submission`] to a [`Ledger`] implementation and awaits the settled
//! address. Inject a JSON-RPC backed implementation in production, or
//! [`crate::fakes::MemoryLedger`] in tests and simulations.

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::init::InitCall;

/// Gas limit used when the manifest does not set one.
pub const DEFAULT_GAS_LIMIT: u64 = 6_500_000;

/// Sender identity and gas policy for every submission in a bring-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployPolicy {
    pub sender: Address,
    #[serde(default = "default_gas_limit")]
    pub gas_limit: u64,
}

fn default_gas_limit() -> u64 {
    DEFAULT_GAS_LIMIT
}

impl DeployPolicy {
    pub fn new(sender: Address) -> Self {
        Self {
            sender,
            gas_limit: DEFAULT_GAS_LIMIT,
        }
    }

    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }
}

/// A single linked deployment, ready for the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Unit being deployed.
    pub unit: String,
    /// Linked creation bytecode.
    pub bytecode: Vec<u8>,
    /// Value attached to the transaction.
    pub value: U256,
    pub sender: Address,
    pub gas_limit: u64,
    /// Initialization entry-point arguments, for units that create a chain.
    pub init: Option<InitCall>,
}

/// Backend that settles deployments.
///
/// `submit` returns only once the transaction has either confirmed (with the
/// created address) or definitively failed.
#[async_trait]
pub trait Ledger: Send + Sync {
    async fn submit(&self, submission: Submission) -> Result<Address, LedgerError>;
}
