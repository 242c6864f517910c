//! Multi-operator chain initialization gating.
//!
//! Provides:
//! - [`params::ChainInitParams`]: the aggregate argument set for the
//!   initialization entry point
//! - [`validator::InitValidator`]: ordered, first-failure-wins invariant
//!   checks over operators, deposits and attached value
//! - [`params::ValidatedInit`]: params that passed validation, ready to be
//!   assembled into an [`params::InitCall`]

pub mod error;
pub mod params;
pub mod validator;

pub use error::{InitError, InitRule};
pub use params::{ChainInitParams, InitCall, ValidatedInit};
pub use validator::{validate, InitValidator, ValidationThresholds};
