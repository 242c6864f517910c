//! Append-only table of deployed unit addresses.

use std::collections::BTreeMap;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::error::{DeployError, Result};

/// Maps unit names to the address each was deployed at.
///
/// Each unit is written at most once; a second write is rejected with
/// [`DeployError::AddressAlreadyRecorded`] rather than overwriting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddressBook {
    entries: BTreeMap<String, Address>,
}

impl AddressBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `address` for `unit`.
    pub fn record(&mut self, unit: &str, address: Address) -> Result<()> {
        if let Some(existing) = self.entries.get(unit) {
            return Err(DeployError::AddressAlreadyRecorded {
                unit: unit.to_string(),
                existing: *existing,
            });
        }
        self.entries.insert(unit.to_string(), address);
        Ok(())
    }

    pub fn get(&self, unit: &str) -> Option<Address> {
        self.entries.get(unit).copied()
    }

    pub fn contains(&self, unit: &str) -> bool {
        self.entries.contains_key(unit)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sorted by unit name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Address)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn test_record_then_get() {
        let mut book = AddressBook::new();
        let addr = address!("ca35b7d915458ef540ade6068dfe2f44e8fa733c");
        book.record("ECRecovery", addr).unwrap();
        assert_eq!(book.get("ECRecovery"), Some(addr));
        assert!(book.contains("ECRecovery"));
        assert_eq!(book.len(), 1);
        assert!(book.get("PriorityQueue").is_none());
    }

    #[test]
    fn test_second_write_rejected_and_first_kept() {
        let mut book = AddressBook::new();
        let first = address!("ca35b7d915458ef540ade6068dfe2f44e8fa733c");
        let second = address!("14723a09acff6d2a60dcdf7aa4aff308fddc160c");
        book.record("StemCore", first).unwrap();

        let err = book.record("StemCore", second).unwrap_err();
        assert!(matches!(
            err,
            DeployError::AddressAlreadyRecorded { ref unit, existing } if unit == "StemCore" && existing == first
        ));
        assert_eq!(book.get("StemCore"), Some(first));
    }

    #[test]
    fn test_serializes_as_flat_map() {
        let mut book = AddressBook::new();
        book.record("ByteUtils", Address::repeat_byte(0x11)).unwrap();
        let json = serde_json::to_value(&book).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "ByteUtils": "0x1111111111111111111111111111111111111111" })
        );
        let back: AddressBook = serde_json::from_value(json).unwrap();
        assert_eq!(back, book);
    }
}
