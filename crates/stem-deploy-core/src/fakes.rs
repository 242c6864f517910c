//! In-memory ledger for tests and dry runs.
//!
//! `MemoryLedger` settles every submission immediately at a deterministic
//! address derived from the sender and a per-ledger nonce, records what it
//! was given, and can be told to reject specific units.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use alloy_primitives::{keccak256, Address};
use async_trait::async_trait;

use crate::error::LedgerError;
use crate::ledger::{Ledger, Submission};

#[derive(Debug, Default)]
struct LedgerState {
    nonce: u64,
    submissions: Vec<Submission>,
    failures: HashMap<String, LedgerError>,
}

/// Ledger fake backed by a `Mutex<LedgerState>`.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    state: Mutex<LedgerState>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every future submission of `unit` with `error`.
    pub fn fail_on(&self, unit: &str, error: LedgerError) {
        self.lock().failures.insert(unit.to_string(), error);
    }

    /// Every submission received, in arrival order, including rejected ones.
    pub fn submissions(&self) -> Vec<Submission> {
        self.lock().submissions.clone()
    }

    /// Number of submissions received for `unit`.
    pub fn submission_count(&self, unit: &str) -> usize {
        self.lock()
            .submissions
            .iter()
            .filter(|s| s.unit == unit)
            .count()
    }

    /// Address the next successful submission from `sender` will settle at.
    pub fn next_address(&self, sender: Address) -> Address {
        derive_address(sender, self.lock().nonce)
    }

    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn derive_address(sender: Address, nonce: u64) -> Address {
    let mut preimage = Vec::with_capacity(28);
    preimage.extend_from_slice(sender.as_slice());
    preimage.extend_from_slice(&nonce.to_be_bytes());
    Address::from_word(keccak256(preimage))
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn submit(&self, submission: Submission) -> Result<Address, LedgerError> {
        let mut state = self.lock();
        let unit = submission.unit.clone();
        let sender = submission.sender;
        let gas_limit = submission.gas_limit;
        let empty = submission.bytecode.is_empty();
        state.submissions.push(submission);

        if let Some(error) = state.failures.get(&unit) {
            return Err(error.clone());
        }
        if gas_limit == 0 {
            return Err(LedgerError::OutOfGas { limit: gas_limit });
        }
        if empty {
            return Err(LedgerError::Rejected("empty creation code".to_string()));
        }

        let address = derive_address(sender, state.nonce);
        state.nonce += 1;
        Ok(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;

    fn submission(unit: &str) -> Submission {
        Submission {
            unit: unit.to_string(),
            bytecode: vec![0x60, 0x80],
            value: U256::ZERO,
            sender: Address::repeat_byte(0x42),
            gas_limit: 6_500_000,
            init: None,
        }
    }

    #[tokio::test]
    async fn test_addresses_are_deterministic_and_distinct() {
        let a = MemoryLedger::new();
        let b = MemoryLedger::new();
        let expected = a.next_address(Address::repeat_byte(0x42));

        let first = a.submit(submission("ECRecovery")).await.unwrap();
        let second = a.submit(submission("PriorityQueue")).await.unwrap();
        assert_eq!(first, expected);
        assert_ne!(first, second);
        assert_eq!(b.submit(submission("ECRecovery")).await.unwrap(), first);
    }

    #[tokio::test]
    async fn test_injected_failure_is_returned_and_recorded() {
        let ledger = MemoryLedger::new();
        ledger.fail_on("StemRelay", LedgerError::Rejected("revert".into()));

        let err = ledger.submit(submission("StemRelay")).await.unwrap_err();
        assert_eq!(err, LedgerError::Rejected("revert".into()));
        assert_eq!(ledger.submission_count("StemRelay"), 1);
    }

    #[tokio::test]
    async fn test_zero_gas_rejected() {
        let ledger = MemoryLedger::new();
        let mut s = submission("ByteUtils");
        s.gas_limit = 0;
        assert_eq!(
            ledger.submit(s).await.unwrap_err(),
            LedgerError::OutOfGas { limit: 0 }
        );
    }

    #[tokio::test]
    async fn test_failed_submission_does_not_consume_nonce() {
        let ledger = MemoryLedger::new();
        let sender = Address::repeat_byte(0x42);
        let before = ledger.next_address(sender);
        ledger.fail_on("Merkle", LedgerError::Unavailable("down".into()));
        let _ = ledger.submit(submission("Merkle")).await;
        assert_eq!(ledger.next_address(sender), before);
    }
}
