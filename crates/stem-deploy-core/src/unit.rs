//! Deployable units and link edges.

use serde::{Deserialize, Serialize};

/// A named deployable artifact.
///
/// `bytecode` is the hex creation code as produced by the compiler, which may
/// still contain link placeholders for the units listed in `depends_on`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// Stable identifier, e.g. `"StemCore"`.
    pub name: String,
    /// Units this one links against, in declaration order.
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// Source path used to form the fully-qualified name for hashed
    /// placeholders, e.g. `"contracts/StemCore.sol"`.
    #[serde(default)]
    pub source: Option<String>,
    /// Hex creation bytecode, with or without a `0x` prefix.
    #[serde(default)]
    pub bytecode: String,
}

impl Unit {
    /// Create a unit with no dependencies.
    pub fn new(name: impl Into<String>, bytecode: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            depends_on: Vec::new(),
            source: None,
            bytecode: bytecode.into(),
        }
    }

    /// Add a link dependency. Duplicates are ignored.
    pub fn with_dependency(mut self, dependency: impl Into<String>) -> Self {
        let dependency = dependency.into();
        if !self.depends_on.contains(&dependency) {
            self.depends_on.push(dependency);
        }
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// `<source>:<name>` when a source is declared, otherwise the bare name.
    pub fn fully_qualified_name(&self) -> String {
        match &self.source {
            Some(source) => format!("{}:{}", source, self.name),
            None => self.name.clone(),
        }
    }
}

/// Directed link-time dependency: `dependent` links against `dependency`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkEdge {
    pub dependent: String,
    pub dependency: String,
}

impl LinkEdge {
    pub fn new(dependent: impl Into<String>, dependency: impl Into<String>) -> Self {
        Self {
            dependent: dependent.into(),
            dependency: dependency.into(),
        }
    }
}
