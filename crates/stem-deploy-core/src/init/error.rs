//! Initialization validation errors.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The invariants checked before a chain may be created, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitRule {
    OperatorsPresent,
    DepositCountMatches,
    OperatorsUnique,
    OperatorsNonZero,
    DepositsMeetMinimum,
    DepositsCovered,
    CreatorDepositMeetsMinimum,
}

impl InitRule {
    /// Fixed evaluation order. The first failing rule decides the error.
    pub const ORDER: [InitRule; 7] = [
        InitRule::OperatorsPresent,
        InitRule::DepositCountMatches,
        InitRule::OperatorsUnique,
        InitRule::OperatorsNonZero,
        InitRule::DepositsMeetMinimum,
        InitRule::DepositsCovered,
        InitRule::CreatorDepositMeetsMinimum,
    ];
}

/// Reason a set of [`crate::init::ChainInitParams`] was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InitError {
    #[error("no operators supplied")]
    NoOperators,

    #[error("{operators} operators but {deposits} deposits")]
    OperatorDepositCountMismatch { operators: usize, deposits: usize },

    /// `index` is the position of the repeated occurrence.
    #[error("operator {address} repeated at index {index}")]
    DuplicateOperator { address: Address, index: usize },

    #[error("operator at index {index} is the zero address")]
    InvalidOperatorAddress { index: usize },

    #[error("deposit {deposit} at index {index} is below the minimum {minimum}")]
    DepositBelowMinimum {
        index: usize,
        deposit: U256,
        minimum: U256,
    },

    /// `total` saturates at `U256::MAX` when the deposits overflow.
    #[error("operator deposits total {total} but only {attached} is attached")]
    InsufficientTotalDeposit { total: U256, attached: U256 },

    #[error("creator deposit {committed} is below the creator minimum {required}")]
    CreatorDepositInsufficient { committed: U256, required: U256 },
}

impl InitError {
    /// The rule this error reports a violation of.
    pub fn rule(&self) -> InitRule {
        match self {
            InitError::NoOperators => InitRule::OperatorsPresent,
            InitError::OperatorDepositCountMismatch { .. } => InitRule::DepositCountMatches,
            InitError::DuplicateOperator { .. } => InitRule::OperatorsUnique,
            InitError::InvalidOperatorAddress { .. } => InitRule::OperatorsNonZero,
            InitError::DepositBelowMinimum { .. } => InitRule::DepositsMeetMinimum,
            InitError::InsufficientTotalDeposit { .. } => InitRule::DepositsCovered,
            InitError::CreatorDepositInsufficient { .. } => InitRule::CreatorDepositMeetsMinimum,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_order_is_complete_and_unique() {
        let mut seen = std::collections::HashSet::new();
        for rule in InitRule::ORDER {
            assert!(seen.insert(rule));
        }
        assert_eq!(seen.len(), 7);
    }

    #[test]
    fn test_error_display_carries_values() {
        let err = InitError::DepositBelowMinimum {
            index: 0,
            deposit: U256::from(10u64),
            minimum: U256::from(1000u64),
        };
        let msg = err.to_string();
        assert!(msg.contains("10"));
        assert!(msg.contains("1000"));
        assert!(msg.contains("index 0"));
        assert_eq!(err.rule(), InitRule::DepositsMeetMinimum);
    }

    #[test]
    fn test_rule_serializes_snake_case() {
        let json = serde_json::to_string(&InitRule::CreatorDepositMeetsMinimum).unwrap();
        assert_eq!(json, "\"creator_deposit_meets_minimum\"");
    }
}
