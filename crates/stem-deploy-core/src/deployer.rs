//! Sequential link-and-deploy over a [`LinkGraph`].
//!
//! [`Deployer`] walks units in resolved order. For each one it links the
//! dependency addresses recorded so far, submits the linked bytecode to the
//! [`Ledger`], waits for settlement and records the address. The first
//! failure stops the walk: later units may link against the failed one, so
//! nothing after it is attempted.

use std::collections::HashMap;
use std::sync::Arc;

use alloy_primitives::{Address, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::address_book::AddressBook;
use crate::error::{ConfigError, DeployError, GraphError, Result};
use crate::graph::LinkGraph;
use crate::init::ValidatedInit;
use crate::ledger::{DeployPolicy, Ledger, Submission};
use crate::link::link;
use crate::obs;

/// One settled deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentReceipt {
    pub unit: String,
    pub address: Address,
    /// Hex SHA-256 of the linked creation bytecode.
    pub artifact_digest: String,
    /// Value attached to the deployment transaction.
    pub value: U256,
    /// Whether the deployment carried initialization arguments.
    pub initialized: bool,
    pub recorded_at: DateTime<Utc>,
}

/// Links and deploys the units of one graph against one ledger.
pub struct Deployer {
    graph: LinkGraph,
    ledger: Arc<dyn Ledger>,
    policy: DeployPolicy,
    inits: HashMap<String, ValidatedInit>,
    addresses: AddressBook,
    receipts: Vec<DeploymentReceipt>,
}

impl Deployer {
    pub fn new(graph: LinkGraph, ledger: Arc<dyn Ledger>, policy: DeployPolicy) -> Self {
        Self {
            graph,
            ledger,
            policy,
            inits: HashMap::new(),
            addresses: AddressBook::new(),
            receipts: Vec::new(),
        }
    }

    /// Attach validated initialization arguments to `unit`'s deployment.
    pub fn register_init(&mut self, unit: &str, init: ValidatedInit) -> Result<()> {
        if !self.graph.contains(unit) {
            return Err(ConfigError::UnknownInitTarget {
                unit: unit.to_string(),
            }
            .into());
        }
        if self.inits.contains_key(unit) {
            return Err(ConfigError::DuplicateInitTarget {
                unit: unit.to_string(),
            }
            .into());
        }
        self.inits.insert(unit.to_string(), init);
        Ok(())
    }

    pub fn graph(&self) -> &LinkGraph {
        &self.graph
    }

    pub fn policy(&self) -> &DeployPolicy {
        &self.policy
    }

    pub fn addresses(&self) -> &AddressBook {
        &self.addresses
    }

    pub fn receipts(&self) -> &[DeploymentReceipt] {
        &self.receipts
    }

    /// Link and deploy a single unit whose dependencies are already deployed.
    ///
    /// At most once per unit: when `name` already has an address, that
    /// address is returned and nothing is submitted. On ledger failure no
    /// address is recorded and [`DeployError::DeploymentFailed`] is returned.
    pub async fn deploy_and_link(&mut self, name: &str) -> Result<Address> {
        if let Some(existing) = self.addresses.get(name) {
            obs::emit_unit_skipped(name, &existing);
            return Ok(existing);
        }

        let unit = self.graph.unit(name).ok_or_else(|| GraphError::UnitNotFound {
            unit: name.to_string(),
        })?;
        let dependencies = self.graph.dependencies_of(name)?;
        let linked = link(unit, &dependencies, &self.addresses)?;

        let init = self.inits.get(name);
        let value = init.map(ValidatedInit::value).unwrap_or(U256::ZERO);
        let submission = Submission {
            unit: name.to_string(),
            bytecode: linked.bytecode,
            value,
            sender: self.policy.sender,
            gas_limit: self.policy.gas_limit,
            init: init.map(|i| i.call().clone()),
        };

        tracing::debug!(unit = %name, gas_limit = self.policy.gas_limit, "submitting deployment");
        let address = match self.ledger.submit(submission).await {
            Ok(address) => address,
            Err(cause) => {
                obs::emit_unit_failed(name, &cause);
                return Err(DeployError::DeploymentFailed {
                    unit: name.to_string(),
                    cause,
                });
            }
        };

        self.addresses.record(name, address)?;
        obs::emit_unit_deployed(name, &address, &linked.digest, &value);
        self.receipts.push(DeploymentReceipt {
            unit: name.to_string(),
            address,
            artifact_digest: linked.digest,
            value,
            initialized: init.is_some(),
            recorded_at: Utc::now(),
        });
        Ok(address)
    }

    /// Deploy every unit in resolved order, halting at the first failure.
    ///
    /// Returns the unit names in the order they were processed.
    pub async fn deploy_all(&mut self) -> Result<Vec<String>> {
        let order: Vec<String> = self
            .graph
            .resolve_order()?
            .into_iter()
            .map(|u| u.name.clone())
            .collect();

        for name in &order {
            self.deploy_and_link(name).await?;
        }
        Ok(order)
    }

    /// Consume the deployer, returning the address table and receipts.
    pub fn into_parts(self) -> (AddressBook, Vec<DeploymentReceipt>) {
        (self.addresses, self.receipts)
    }
}
