//! Structured lifecycle events for a bring-up.
//!
//! All events go through `tracing` with an `event` field naming the
//! lifecycle step, so JSON output can be filtered on it directly.
//! [`bring_up_span`] tags everything emitted during one orchestration with
//! its run id.

use alloy_primitives::{Address, U256};
use tracing::{info, warn};

/// Span covering one bring-up. Attach it to the orchestration future with
/// `tracing::Instrument` so it stays correct across awaits.
///
/// # Example
///
/// ```ignore
/// orchestrate(plan).instrument(bring_up_span(&run_id.to_string())).await
/// ```
pub fn bring_up_span(run_id: &str) -> tracing::Span {
    tracing::info_span!("stem_deploy.bring_up", run_id = %run_id)
}

pub fn emit_orchestration_started(run_id: &str, units: usize, init_targets: usize) {
    info!(
        event = "orchestration.started",
        run_id = %run_id,
        units = units,
        init_targets = init_targets,
    );
}

pub fn emit_orchestration_finished(run_id: &str, duration_ms: u64, deployed: usize, success: bool) {
    info!(
        event = "orchestration.finished",
        run_id = %run_id,
        duration_ms = duration_ms,
        deployed = deployed,
        success = success,
    );
}

pub fn emit_unit_deployed(unit: &str, address: &Address, digest: &str, value: &U256) {
    info!(
        event = "unit.deployed",
        unit = %unit,
        address = %address,
        artifact_digest = %digest,
        value = %value,
    );
}

/// Unit already had an address; nothing was submitted.
pub fn emit_unit_skipped(unit: &str, address: &Address) {
    info!(event = "unit.skipped", unit = %unit, address = %address);
}

pub fn emit_unit_failed(unit: &str, error: &dyn std::fmt::Display) {
    warn!(event = "unit.failed", unit = %unit, error = %error);
}

pub fn emit_init_validated(unit: &str, operators: usize, value: &U256) {
    info!(
        event = "init.validated",
        unit = %unit,
        operators = operators,
        value = %value,
    );
}

pub fn emit_init_rejected(unit: &str, error: &dyn std::fmt::Display) {
    warn!(event = "init.rejected", unit = %unit, error = %error);
}
