//! End-to-end chain bring-up.
//!
//! [`Orchestrator::run`] resolves the deployment order, validates every
//! initialization target before any transaction is sent, then deploys the
//! whole graph sequentially. Validation happens up front so that no value is
//! ever committed to a chain that could not legitimately start.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::Instrument;
use uuid::Uuid;

use crate::address_book::AddressBook;
use crate::deployer::{Deployer, DeploymentReceipt};
use crate::error::{DeployError, Result};
use crate::graph::LinkGraph;
use crate::init::{ChainInitParams, InitValidator, ValidationThresholds};
use crate::ledger::{DeployPolicy, Ledger};
use crate::obs;
use crate::unit::{LinkEdge, Unit};

/// Initialization arguments for one entry unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitTarget {
    pub unit: String,
    pub params: ChainInitParams,
}

/// Everything needed for one bring-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BringUpPlan {
    /// Units in declaration order.
    pub units: Vec<Unit>,
    /// Extra link edges beyond each unit's `depends_on`.
    pub edges: Vec<LinkEdge>,
    pub init_targets: Vec<InitTarget>,
    pub thresholds: ValidationThresholds,
    pub policy: DeployPolicy,
}

impl BringUpPlan {
    pub fn graph(&self) -> Result<LinkGraph> {
        Ok(LinkGraph::new(self.units.clone(), &self.edges)?)
    }

    /// Validate every initialization target, in declaration order.
    pub fn validate_inits(&self) -> Result<()> {
        let validator = InitValidator::new(self.thresholds.clone());
        for target in &self.init_targets {
            validator
                .validate(&target.params)
                .map_err(|source| DeployError::Init {
                    unit: target.unit.clone(),
                    source,
                })?;
        }
        Ok(())
    }
}

/// Outcome of a successful bring-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentReport {
    pub run_id: Uuid,
    /// Units in the order they were deployed.
    pub order: Vec<String>,
    pub addresses: AddressBook,
    pub receipts: Vec<DeploymentReceipt>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl DeploymentReport {
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn read_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Drives a [`BringUpPlan`] against a ledger.
pub struct Orchestrator {
    ledger: Arc<dyn Ledger>,
}

impl Orchestrator {
    pub fn new(ledger: Arc<dyn Ledger>) -> Self {
        Self { ledger }
    }

    /// Resolve, validate, then deploy.
    ///
    /// The first error is returned unchanged. Graph and validation errors are
    /// raised before anything is submitted; a deployment failure stops the
    /// sequence at the failing unit.
    pub async fn run(&self, plan: &BringUpPlan) -> Result<DeploymentReport> {
        let run_id = Uuid::new_v4();
        let span = obs::bring_up_span(&run_id.to_string());
        self.run_as(run_id, plan).instrument(span).await
    }

    async fn run_as(&self, run_id: Uuid, plan: &BringUpPlan) -> Result<DeploymentReport> {
        let run_label = run_id.to_string();
        let started_at = Utc::now();
        obs::emit_orchestration_started(&run_label, plan.units.len(), plan.init_targets.len());

        let elapsed_ms = || (Utc::now() - started_at).num_milliseconds().max(0) as u64;

        let mut deployer = match self.prepare(plan) {
            Ok(deployer) => deployer,
            Err(err) => {
                obs::emit_orchestration_finished(&run_label, elapsed_ms(), 0, false);
                return Err(err);
            }
        };

        match deployer.deploy_all().await {
            Ok(order) => {
                let (addresses, receipts) = deployer.into_parts();
                obs::emit_orchestration_finished(&run_label, elapsed_ms(), receipts.len(), true);
                Ok(DeploymentReport {
                    run_id,
                    order,
                    addresses,
                    receipts,
                    started_at,
                    finished_at: Utc::now(),
                })
            }
            Err(err) => {
                let deployed = deployer.receipts().len();
                obs::emit_orchestration_finished(&run_label, elapsed_ms(), deployed, false);
                Err(err)
            }
        }
    }

    /// Build the graph, check it orders, and admit every init target. Nothing
    /// is submitted here.
    fn prepare(&self, plan: &BringUpPlan) -> Result<Deployer> {
        let graph = plan.graph()?;
        graph.resolve_order()?;

        let validator = InitValidator::new(plan.thresholds.clone());
        let mut deployer = Deployer::new(graph, Arc::clone(&self.ledger), plan.policy.clone());
        for target in &plan.init_targets {
            let admitted = validator.admit(target.params.clone()).map_err(|source| {
                obs::emit_init_rejected(&target.unit, &source);
                DeployError::Init {
                    unit: target.unit.clone(),
                    source,
                }
            })?;
            let value = admitted.value();
            deployer.register_init(&target.unit, admitted)?;
            obs::emit_init_validated(&target.unit, target.params.operators.len(), &value);
        }
        Ok(deployer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::MemoryLedger;
    use crate::error::ConfigError;
    use crate::init::InitError;
    use alloy_primitives::{Address, Bytes, U256};
    use tracing_test::traced_test;

    fn params(value: u64) -> ChainInitParams {
        ChainInitParams {
            identifier: Bytes::from_static(b"Annie"),
            commitment_roots: Vec::new(),
            endpoints: vec!["107.105.20.39".to_string()],
            min_deposit: U256::from(10u64),
            operators: vec![Address::repeat_byte(1), Address::repeat_byte(2)],
            deposits: vec![U256::from(10u64); 2],
            beneficiaries: Vec::new(),
            value: U256::from(value),
        }
    }

    fn plan(value: u64) -> BringUpPlan {
        BringUpPlan {
            units: vec![
                Unit::new("Lib", "6001"),
                Unit::new("Root", "6002").with_dependency("Lib"),
            ],
            edges: Vec::new(),
            init_targets: vec![InitTarget {
                unit: "Root".to_string(),
                params: params(value),
            }],
            thresholds: ValidationThresholds::default(),
            policy: DeployPolicy::new(Address::repeat_byte(0x42)),
        }
    }

    #[tokio::test]
    async fn test_run_deploys_and_reports() {
        let ledger = Arc::new(MemoryLedger::new());
        let report = Orchestrator::new(ledger.clone()).run(&plan(30)).await.unwrap();
        assert_eq!(report.order, vec!["Lib", "Root"]);
        assert_eq!(report.addresses.len(), 2);
        assert!(report.finished_at >= report.started_at);
        assert_eq!(ledger.submissions()[1].value, U256::from(30u64));
    }

    #[tokio::test]
    async fn test_invalid_init_blocks_every_submission() {
        let ledger = Arc::new(MemoryLedger::new());
        let err = Orchestrator::new(ledger.clone())
            .run(&plan(5))
            .await
            .unwrap_err();
        assert!(matches!(
            err.init_error(),
            Some(InitError::InsufficientTotalDeposit { .. })
        ));
        assert!(ledger.submissions().is_empty());
    }

    #[tokio::test]
    #[traced_test]
    async fn test_unregistered_target_is_not_reported_validated() {
        let mut plan = plan(30);
        plan.init_targets[0].unit = "Ghost".to_string();

        let ledger = Arc::new(MemoryLedger::new());
        let err = Orchestrator::new(ledger.clone()).run(&plan).await.unwrap_err();
        assert!(matches!(
            err,
            DeployError::Config(ConfigError::UnknownInitTarget { ref unit }) if unit == "Ghost"
        ));
        assert!(!logs_contain("init.validated"));
        assert!(logs_contain("orchestration.finished"));
        assert!(ledger.submissions().is_empty());
    }

    #[test]
    fn test_validate_inits_names_target() {
        let err = plan(5).validate_inits().unwrap_err();
        assert!(err.to_string().contains("Root"));
    }
}
