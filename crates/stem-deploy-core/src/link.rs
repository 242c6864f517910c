//! Address-substitution linking.
//!
//! Compilers leave a 40-character placeholder wherever creation code calls
//! into an external library. Linking replaces each placeholder with the
//! library's deployed address. Two placeholder styles are recognised:
//!
//! - legacy: `__<name>` right-padded with `_` to 40 characters
//! - hashed: `__$<first 34 hex chars of keccak256(fqn)>$__`
//!
//! [`link`] is a pure function of the unit and an [`AddressBook`], so it can
//! be exercised against a hand-built table without a ledger.

use alloy_primitives::keccak256;
use sha2::{Digest, Sha256};

use crate::address_book::AddressBook;
use crate::error::LinkError;
use crate::unit::Unit;

/// Width of a hex-encoded address, and therefore of every placeholder.
pub const PLACEHOLDER_LEN: usize = 40;

const LEGACY_NAME_MAX: usize = PLACEHOLDER_LEN - 4;
const HASH_PREFIX_LEN: usize = 34;

/// Bytecode with every dependency address substituted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedArtifact {
    pub unit: String,
    pub bytecode: Vec<u8>,
    /// Hex SHA-256 of `bytecode`.
    pub digest: String,
}

/// Legacy placeholder: `__` + name (truncated to 36) padded with `_` to 40.
pub fn legacy_placeholder(name: &str) -> String {
    let truncated: String = name.chars().take(LEGACY_NAME_MAX).collect();
    format!("__{:_<width$}", truncated, width = PLACEHOLDER_LEN - 2)
}

/// Hashed placeholder: `__$` + 34 hex chars of `keccak256(fqn)` + `$__`.
pub fn hashed_placeholder(fully_qualified_name: &str) -> String {
    let hash = hex::encode(keccak256(fully_qualified_name.as_bytes()));
    format!("__${}$__", &hash[..HASH_PREFIX_LEN])
}

fn placeholders_for(dependency: &Unit) -> Vec<String> {
    let fqn = dependency.fully_qualified_name();
    let mut candidates = vec![legacy_placeholder(&dependency.name), hashed_placeholder(&fqn)];
    if dependency.source.is_some() {
        candidates.push(legacy_placeholder(&fqn));
        candidates.push(hashed_placeholder(&dependency.name));
    }
    candidates
}

/// Substitute the addresses of `unit`'s dependencies into its bytecode.
///
/// `dependencies` supplies the dependency units themselves (needed for their
/// fully-qualified names); every name in `unit.depends_on` must have an
/// address in `addresses`.
pub fn link(
    unit: &Unit,
    dependencies: &[&Unit],
    addresses: &AddressBook,
) -> Result<LinkedArtifact, LinkError> {
    let raw = unit.bytecode.trim();
    let mut code = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .unwrap_or(raw)
        .to_string();

    if code.is_empty() {
        return Err(LinkError::InvalidBytecode {
            unit: unit.name.clone(),
            reason: "empty bytecode".to_string(),
        });
    }

    for dependency_name in &unit.depends_on {
        let address =
            addresses
                .get(dependency_name)
                .ok_or_else(|| LinkError::DependencyNotDeployed {
                    unit: unit.name.clone(),
                    dependency: dependency_name.clone(),
                })?;
        let replacement = hex::encode(address.as_slice());

        let candidates = match dependencies.iter().find(|d| &d.name == dependency_name) {
            Some(dependency) => placeholders_for(dependency),
            None => vec![
                legacy_placeholder(dependency_name),
                hashed_placeholder(dependency_name),
            ],
        };

        let mut substituted = false;
        for placeholder in candidates {
            if code.contains(&placeholder) {
                code = code.replace(&placeholder, &replacement);
                substituted = true;
            }
        }
        if !substituted {
            tracing::trace!(unit = %unit.name, dependency = %dependency_name, "no link reference in bytecode");
        }
    }

    // Placeholders use `_` and `$`; anything else must be hex. Checked before
    // the placeholder scan so its byte slicing stays on char boundaries.
    if let Some(bad) = code
        .chars()
        .find(|c| !c.is_ascii_hexdigit() && *c != '_' && *c != '$')
    {
        return Err(LinkError::InvalidBytecode {
            unit: unit.name.clone(),
            reason: format!("unexpected character {:?}", bad),
        });
    }

    if let Some(pos) = code.find('_') {
        let end = (pos + PLACEHOLDER_LEN).min(code.len());
        return Err(LinkError::UnresolvedPlaceholder {
            unit: unit.name.clone(),
            placeholder: code[pos..end].to_string(),
        });
    }

    let bytecode = hex::decode(&code).map_err(|e| LinkError::InvalidBytecode {
        unit: unit.name.clone(),
        reason: e.to_string(),
    })?;
    let digest = hex::encode(Sha256::digest(&bytecode));

    Ok(LinkedArtifact {
        unit: unit.name.clone(),
        bytecode,
        digest,
    })
}
