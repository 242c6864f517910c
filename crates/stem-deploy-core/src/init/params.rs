//! Initialization parameters and the entry-point call assembled from them.

use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};

use crate::init::error::InitError;
use crate::init::validator::{validate, ValidationThresholds};

/// Aggregate argument set for the gated initialization entry point.
///
/// `operators[i]` commits `deposits[i]`. `value` is the total amount attached
/// to the initialization transaction: the pooled operator deposits plus
/// whatever the creator commits on top.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainInitParams {
    /// Opaque chain identifier, e.g. `0x416e6e6965`.
    pub identifier: Bytes,
    /// Commitment roots. The reference entry point takes a root pair.
    pub commitment_roots: Vec<B256>,
    /// Network endpoints operators are reachable at.
    pub endpoints: Vec<String>,
    /// Minimum deposit each operator must commit.
    pub min_deposit: U256,
    pub operators: Vec<Address>,
    pub deposits: Vec<U256>,
    pub beneficiaries: Vec<Address>,
    /// Value attached to the initialization transaction.
    pub value: U256,
}

impl ChainInitParams {
    /// Sum of operator deposits, or `None` on 256-bit overflow.
    pub fn operator_deposit_total(&self) -> Option<U256> {
        self.deposits
            .iter()
            .try_fold(U256::ZERO, |acc, d| acc.checked_add(*d))
    }

    /// Value committed by the creator beyond the pooled operator deposits.
    /// Zero when the deposits already exceed the attached value.
    pub fn creator_deposit(&self) -> U256 {
        match self.operator_deposit_total() {
            Some(total) => self.value.saturating_sub(total),
            None => U256::ZERO,
        }
    }
}

/// Arguments for the initialization entry point, in signature order:
/// `(identifier, commitmentRoots[], endpoints[], minDeposit, operators[],
/// deposits[], beneficiaries[])`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitCall {
    pub identifier: Bytes,
    pub commitment_roots: Vec<B256>,
    pub endpoints: Vec<String>,
    pub min_deposit: U256,
    pub operators: Vec<Address>,
    pub deposits: Vec<U256>,
    pub beneficiaries: Vec<Address>,
}

/// Parameters that passed validation. Only obtainable through
/// [`ValidatedInit::new`], so holding one proves the invariants were checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedInit {
    call: InitCall,
    value: U256,
}

impl ValidatedInit {
    pub fn new(params: ChainInitParams, thresholds: &ValidationThresholds) -> Result<Self, InitError> {
        validate(&params, thresholds)?;
        let ChainInitParams {
            identifier,
            commitment_roots,
            endpoints,
            min_deposit,
            operators,
            deposits,
            beneficiaries,
            value,
        } = params;
        Ok(Self {
            call: InitCall {
                identifier,
                commitment_roots,
                endpoints,
                min_deposit,
                operators,
                deposits,
                beneficiaries,
            },
            value,
        })
    }

    pub fn call(&self) -> &InitCall {
        &self.call
    }

    /// Value to attach to the initialization transaction.
    pub fn value(&self) -> U256 {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    fn params(deposits: &[u64], value: u64) -> ChainInitParams {
        ChainInitParams {
            identifier: Bytes::from_static(b"Annie"),
            commitment_roots: vec![B256::repeat_byte(0x4f); 2],
            endpoints: vec!["107.105.20.39".to_string()],
            min_deposit: U256::from(1000u64),
            operators: (0..deposits.len())
                .map(|i| Address::repeat_byte(i as u8 + 1))
                .collect(),
            deposits: deposits.iter().map(|d| U256::from(*d)).collect(),
            beneficiaries: vec![address!("ca35b7d915458ef540ade6068dfe2f44e8fa733c")],
            value: U256::from(value),
        }
    }

    #[test]
    fn test_creator_deposit_is_surplus_over_operator_total() {
        let p = params(&[1234567890; 4], 8234567890);
        assert_eq!(p.operator_deposit_total(), Some(U256::from(4938271560u64)));
        assert_eq!(p.creator_deposit(), U256::from(3296296330u64));
    }

    #[test]
    fn test_creator_deposit_zero_when_underfunded() {
        let p = params(&[1234567890; 4], 1234567890);
        assert_eq!(p.creator_deposit(), U256::ZERO);
    }

    #[test]
    fn test_deposit_total_overflow_is_none() {
        let mut p = params(&[1, 1], 0);
        p.deposits = vec![U256::MAX, U256::from(1u64)];
        assert_eq!(p.operator_deposit_total(), None);
        assert_eq!(p.creator_deposit(), U256::ZERO);
    }

    #[test]
    fn test_validated_init_preserves_argument_order() {
        let p = params(&[1234567890; 4], 8234567890);
        let validated = ValidatedInit::new(p.clone(), &ValidationThresholds::default()).unwrap();
        assert_eq!(validated.value(), p.value);
        assert_eq!(validated.call().operators, p.operators);
        assert_eq!(validated.call().deposits, p.deposits);
        assert_eq!(validated.call().commitment_roots.len(), 2);
        assert_eq!(validated.call().identifier.to_vec(), b"Annie".to_vec());
    }

    #[test]
    fn test_validated_init_rejects_invalid_params() {
        let p = params(&[], 8234567890);
        assert_eq!(
            ValidatedInit::new(p, &ValidationThresholds::default()).unwrap_err(),
            InitError::NoOperators
        );
    }
}
