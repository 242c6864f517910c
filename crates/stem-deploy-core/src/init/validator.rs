//! Initialization invariant engine.
//!
//! Evaluates [`ChainInitParams`] against [`ValidationThresholds`] rule by rule
//! in [`InitRule::ORDER`]. Evaluation stops at the first violated rule, so a
//! caller always sees the same single error for the same input even when
//! several rules are broken at once.

use std::collections::HashMap;

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::init::error::{InitError, InitRule};
use crate::init::params::{ChainInitParams, ValidatedInit};

/// Fixed threshold configuration the validator runs against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationThresholds {
    /// Floor on the per-operator minimum. The effective minimum is the larger
    /// of this and `ChainInitParams::min_deposit`.
    pub min_operator_deposit: U256,
    /// Minimum value the creator must commit beyond the pooled operator
    /// deposits. `None` disables the check.
    pub creator_minimum: Option<U256>,
}

impl ValidationThresholds {
    pub fn with_creator_minimum(mut self, minimum: U256) -> Self {
        self.creator_minimum = Some(minimum);
        self
    }

    pub fn with_min_operator_deposit(mut self, minimum: U256) -> Self {
        self.min_operator_deposit = minimum;
        self
    }

    /// Per-operator minimum applied to `params`.
    pub fn effective_min_deposit(&self, params: &ChainInitParams) -> U256 {
        params.min_deposit.max(self.min_operator_deposit)
    }
}

/// Validate `params`, returning the error for the first violated rule.
///
/// Pure: reads only its arguments and can be retried freely.
pub fn validate(params: &ChainInitParams, thresholds: &ValidationThresholds) -> Result<(), InitError> {
    for rule in InitRule::ORDER {
        check_rule(rule, params, thresholds)?;
    }
    Ok(())
}

fn check_rule(
    rule: InitRule,
    params: &ChainInitParams,
    thresholds: &ValidationThresholds,
) -> Result<(), InitError> {
    match rule {
        InitRule::OperatorsPresent => {
            if params.operators.is_empty() {
                return Err(InitError::NoOperators);
            }
        }
        InitRule::DepositCountMatches => {
            if params.operators.len() != params.deposits.len() {
                return Err(InitError::OperatorDepositCountMismatch {
                    operators: params.operators.len(),
                    deposits: params.deposits.len(),
                });
            }
        }
        InitRule::OperatorsUnique => {
            let mut seen: HashMap<Address, usize> = HashMap::with_capacity(params.operators.len());
            for (index, operator) in params.operators.iter().enumerate() {
                if seen.insert(*operator, index).is_some() {
                    return Err(InitError::DuplicateOperator {
                        address: *operator,
                        index,
                    });
                }
            }
        }
        InitRule::OperatorsNonZero => {
            if let Some(index) = params.operators.iter().position(|a| a.is_zero()) {
                return Err(InitError::InvalidOperatorAddress { index });
            }
        }
        InitRule::DepositsMeetMinimum => {
            let minimum = thresholds.effective_min_deposit(params);
            if let Some((index, deposit)) = params
                .deposits
                .iter()
                .enumerate()
                .find(|(_, d)| **d < minimum)
            {
                return Err(InitError::DepositBelowMinimum {
                    index,
                    deposit: *deposit,
                    minimum,
                });
            }
        }
        InitRule::DepositsCovered => {
            match params.operator_deposit_total() {
                Some(total) if total <= params.value => {}
                total => {
                    return Err(InitError::InsufficientTotalDeposit {
                        total: total.unwrap_or(U256::MAX),
                        attached: params.value,
                    });
                }
            }
        }
        InitRule::CreatorDepositMeetsMinimum => {
            if let Some(required) = thresholds.creator_minimum {
                let committed = params.creator_deposit();
                if committed < required {
                    return Err(InitError::CreatorDepositInsufficient { committed, required });
                }
            }
        }
    }
    Ok(())
}

/// Validator bound to a fixed threshold configuration.
#[derive(Debug, Clone, Default)]
pub struct InitValidator {
    thresholds: ValidationThresholds,
}

impl InitValidator {
    pub fn new(thresholds: ValidationThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &ValidationThresholds {
        &self.thresholds
    }

    pub fn validate(&self, params: &ChainInitParams) -> Result<(), InitError> {
        validate(params, &self.thresholds)
    }

    /// Validate and take ownership, yielding params ready for submission.
    pub fn admit(&self, params: ChainInitParams) -> Result<ValidatedInit, InitError> {
        ValidatedInit::new(params, &self.thresholds)
    }
}
