//! TOML deployment manifest.
//!
//! A manifest declares the units to deploy, the deployer policy, validation
//! thresholds and the initialization targets:
//!
//! ```toml
//! [deployer]
//! sender = "0x627306090abab3a6e1400e9345bc60c78a8bef57"
//! gas_limit = 6500000
//!
//! [thresholds]
//! min_operator_deposit = "1000"
//!
//! [[units]]
//! name = "ECRecovery"
//! bytecode = "0x6080..."
//!
//! [[units]]
//! name = "StemRootchain"
//! depends_on = ["ECRecovery"]
//! bytecode = "0x6080...__ECRecovery______________________________..."
//!
//! [[initialize]]
//! unit = "StemRootchain"
//! identifier = "0x416e6e6965"
//! commitment_roots = ["0x4f2d...", "0x4f2d..."]
//! endpoints = ["107.105.20.39"]
//! min_deposit = "1000"
//! operators = ["0xca35b7d915458ef540ade6068dfe2f44e8fa733c"]
//! deposits = ["1000"]
//! value = "8234567890"
//! expected_commitment_roots = 2
//! ```
//!
//! Amounts may be TOML integers or decimal / `0x` hex strings. Every parse
//! failure names the offending field path.

use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;

use alloy_primitives::{Address, Bytes, B256, U256};
use serde::Deserialize;

use crate::error::{ConfigError, Result};
use crate::init::{ChainInitParams, ValidationThresholds};
use crate::ledger::{DeployPolicy, DEFAULT_GAS_LIMIT};
use crate::orchestrator::{BringUpPlan, InitTarget};
use crate::unit::{LinkEdge, Unit};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawManifest {
    deployer: RawDeployer,
    #[serde(default)]
    thresholds: RawThresholds,
    #[serde(default)]
    units: Vec<Unit>,
    #[serde(default)]
    edges: Vec<LinkEdge>,
    #[serde(default)]
    initialize: Vec<RawInitTarget>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDeployer {
    sender: String,
    #[serde(default)]
    gas_limit: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawThresholds {
    #[serde(default)]
    min_operator_deposit: Option<RawAmount>,
    #[serde(default)]
    creator_minimum: Option<RawAmount>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawInitTarget {
    unit: String,
    identifier: String,
    #[serde(default)]
    commitment_roots: Vec<String>,
    #[serde(default)]
    endpoints: Vec<String>,
    min_deposit: RawAmount,
    #[serde(default)]
    operators: Vec<String>,
    #[serde(default)]
    deposits: Vec<RawAmount>,
    #[serde(default)]
    beneficiaries: Vec<String>,
    value: RawAmount,
    #[serde(default)]
    expected_commitment_roots: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Integer(u64),
    Text(String),
}

impl RawAmount {
    fn parse(&self, field: &str) -> std::result::Result<U256, ConfigError> {
        match self {
            RawAmount::Integer(n) => Ok(U256::from(*n)),
            RawAmount::Text(s) => U256::from_str(s.trim()).map_err(|e| invalid(field, e)),
        }
    }
}

fn invalid(field: &str, reason: impl std::fmt::Display) -> ConfigError {
    ConfigError::InvalidField {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_address(field: &str, raw: &str) -> std::result::Result<Address, ConfigError> {
    Address::from_str(raw.trim()).map_err(|e| invalid(field, e))
}

fn parse_hash(field: &str, raw: &str) -> std::result::Result<B256, ConfigError> {
    B256::from_str(raw.trim()).map_err(|e| invalid(field, e))
}

/// Parse a manifest from TOML text.
pub fn parse_plan(content: &str) -> Result<BringUpPlan> {
    let raw: RawManifest = toml::from_str(content).map_err(ConfigError::from)?;
    Ok(raw.into_plan()?)
}

/// Read and parse a manifest file.
pub fn load_plan(path: &Path) -> Result<BringUpPlan> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let plan = parse_plan(&content)?;
    tracing::debug!(
        path = %path.display(),
        units = plan.units.len(),
        init_targets = plan.init_targets.len(),
        "loaded manifest"
    );
    Ok(plan)
}

impl RawManifest {
    fn into_plan(self) -> std::result::Result<BringUpPlan, ConfigError> {
        let sender = parse_address("deployer.sender", &self.deployer.sender)?;
        let gas_limit = self.deployer.gas_limit.unwrap_or(DEFAULT_GAS_LIMIT);
        if gas_limit == 0 {
            return Err(invalid("deployer.gas_limit", "must be greater than zero"));
        }
        let policy = DeployPolicy::new(sender).with_gas_limit(gas_limit);

        let mut thresholds = ValidationThresholds::default();
        if let Some(raw) = &self.thresholds.min_operator_deposit {
            thresholds.min_operator_deposit = raw.parse("thresholds.min_operator_deposit")?;
        }
        if let Some(raw) = &self.thresholds.creator_minimum {
            thresholds.creator_minimum = Some(raw.parse("thresholds.creator_minimum")?);
        }

        let declared: HashSet<&str> = self.units.iter().map(|u| u.name.as_str()).collect();
        let mut seen = HashSet::new();
        let mut init_targets = Vec::with_capacity(self.initialize.len());
        for (i, raw) in self.initialize.iter().enumerate() {
            if !declared.contains(raw.unit.as_str()) {
                return Err(ConfigError::UnknownInitTarget {
                    unit: raw.unit.clone(),
                });
            }
            if !seen.insert(raw.unit.as_str()) {
                return Err(ConfigError::DuplicateInitTarget {
                    unit: raw.unit.clone(),
                });
            }
            init_targets.push(raw.to_target(&format!("initialize[{}]", i))?);
        }

        Ok(BringUpPlan {
            units: self.units,
            edges: self.edges,
            init_targets,
            thresholds,
            policy,
        })
    }
}

impl RawInitTarget {
    fn to_target(&self, path: &str) -> std::result::Result<InitTarget, ConfigError> {
        if let Some(expected) = self.expected_commitment_roots {
            if expected != self.commitment_roots.len() {
                return Err(ConfigError::CommitmentRootCount {
                    unit: self.unit.clone(),
                    expected,
                    actual: self.commitment_roots.len(),
                });
            }
        }

        let identifier = Bytes::from_str(self.identifier.trim())
            .map_err(|e| invalid(&format!("{}.identifier", path), e))?;
        let commitment_roots = self
            .commitment_roots
            .iter()
            .enumerate()
            .map(|(i, raw)| parse_hash(&format!("{}.commitment_roots[{}]", path, i), raw))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let operators = self
            .operators
            .iter()
            .enumerate()
            .map(|(i, raw)| parse_address(&format!("{}.operators[{}]", path, i), raw))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let deposits = self
            .deposits
            .iter()
            .enumerate()
            .map(|(i, raw)| raw.parse(&format!("{}.deposits[{}]", path, i)))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let beneficiaries = self
            .beneficiaries
            .iter()
            .enumerate()
            .map(|(i, raw)| parse_address(&format!("{}.beneficiaries[{}]", path, i), raw))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(InitTarget {
            unit: self.unit.clone(),
            params: ChainInitParams {
                identifier,
                commitment_roots,
                endpoints: self.endpoints.clone(),
                min_deposit: self.min_deposit.parse(&format!("{}.min_deposit", path))?,
                operators,
                deposits,
                beneficiaries,
                value: self.value.parse(&format!("{}.value", path))?,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeployError;
    use std::io::Write;

    const ROOT: &str = "0x4f2df4a21621b18c71619239c398657a23f198a40a8deff701e340e6e34d0823";

    fn manifest(extra_init: &str) -> String {
        format!(
            r#"
[deployer]
sender = "0x627306090abab3a6e1400e9345bc60c78a8bef57"

[thresholds]
min_operator_deposit = 500

[[units]]
name = "ECRecovery"
bytecode = "6001"

[[units]]
name = "StemRootchain"
depends_on = ["ECRecovery"]
bytecode = "6002"

[[initialize]]
unit = "StemRootchain"
identifier = "0x416e6e6965"
commitment_roots = ["{root}", "{root}"]
endpoints = ["107.105.20.39"]
min_deposit = "1000"
operators = [
    "0xca35b7d915458ef540ade6068dfe2f44e8fa733c",
    "0x14723a09acff6d2a60dcdf7aa4aff308fddc160c",
]
deposits = ["1000", 2000]
value = "8234567890"
{extra}
"#,
            root = ROOT,
            extra = extra_init
        )
    }

    #[test]
    fn test_parse_full_manifest() {
        let plan = parse_plan(&manifest("")).unwrap();
        assert_eq!(plan.units.len(), 2);
        assert_eq!(plan.units[1].depends_on, vec!["ECRecovery"]);
        assert_eq!(plan.policy.gas_limit, DEFAULT_GAS_LIMIT);
        assert_eq!(plan.thresholds.min_operator_deposit, U256::from(500u64));
        assert_eq!(plan.thresholds.creator_minimum, None);

        let target = &plan.init_targets[0];
        assert_eq!(target.unit, "StemRootchain");
        assert_eq!(target.params.identifier.to_vec(), b"Annie".to_vec());
        assert_eq!(target.params.commitment_roots.len(), 2);
        assert_eq!(target.params.deposits[1], U256::from(2000u64));
        assert_eq!(target.params.value, U256::from(8_234_567_890u64));
    }

    #[test]
    fn test_bad_operator_names_field_path() {
        let content = manifest("").replace("0x14723a09acff6d2a60dcdf7aa4aff308fddc160c", "0x1234");
        let err = parse_plan(&content).unwrap_err();
        match err {
            DeployError::Config(ConfigError::InvalidField { field, .. }) => {
                assert_eq!(field, "initialize[0].operators[1]")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_commitment_root_count_enforced() {
        let err = parse_plan(&manifest("expected_commitment_roots = 3")).unwrap_err();
        assert!(matches!(
            err,
            DeployError::Config(ConfigError::CommitmentRootCount {
                expected: 3,
                actual: 2,
                ..
            })
        ));
        assert!(parse_plan(&manifest("expected_commitment_roots = 2")).is_ok());
    }

    #[test]
    fn test_unknown_and_duplicate_init_targets() {
        let unknown = manifest("").replace("unit = \"StemRootchain\"", "unit = \"Ghost\"");
        assert!(matches!(
            parse_plan(&unknown),
            Err(DeployError::Config(ConfigError::UnknownInitTarget { .. }))
        ));

        let base = manifest("");
        let init = &base[base.find("[[initialize]]").unwrap()..];
        let duplicated = format!("{}\n{}", base, init);
        assert!(matches!(
            parse_plan(&duplicated),
            Err(DeployError::Config(ConfigError::DuplicateInitTarget { .. }))
        ));
    }

    #[test]
    fn test_zero_gas_limit_rejected() {
        let content = manifest("").replace(
            "sender = \"0x627306090abab3a6e1400e9345bc60c78a8bef57\"",
            "sender = \"0x627306090abab3a6e1400e9345bc60c78a8bef57\"\ngas_limit = 0",
        );
        assert!(matches!(
            parse_plan(&content),
            Err(DeployError::Config(ConfigError::InvalidField { ref field, .. })) if field == "deployer.gas_limit"
        ));
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        assert!(matches!(
            parse_plan("[deployer"),
            Err(DeployError::Config(ConfigError::Parse(_)))
        ));
    }

    #[test]
    fn test_load_plan_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(manifest("").as_bytes()).unwrap();
        let plan = load_plan(file.path()).unwrap();
        assert_eq!(plan.init_targets.len(), 1);

        let missing = load_plan(Path::new("/nonexistent/stem-deploy.toml")).unwrap_err();
        assert!(matches!(missing, DeployError::Config(ConfigError::Read { .. })));
    }
}
