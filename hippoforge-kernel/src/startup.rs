//! Process-start maintenance (§4.10 step 1 / §9's anti-lazy-singleton
//! redesign): an explicit, fallible phase run once before the tick loop
//! begins, rather than the source's lazy-initialized-property pattern.
//! Grounded on the migration/maintenance steps in
//! `orchestrator_loop.py::Orchestrator.__init__`. LLM and GitHub
//! reachability are deliberately not probed here; those degrade lazily
//! at the point of use instead of blocking startup on an external call.

use std::path::Path;

use hippoforge_contracts::{OrchestratorError, OrchestratorResult};
use hippoforge_telemetry::TelemetryLedger;
use tracing::info;

pub async fn run_startup_checks(
    blackboard_root: &Path,
    telemetry: &TelemetryLedger,
    retention_days: i64,
) -> OrchestratorResult<()> {
    std::fs::create_dir_all(blackboard_root)
        .map_err(|e| OrchestratorError::contract(format!("failed to prepare blackboard root: {e}")))?;

    telemetry.optimize().await;
    let pruned = telemetry.prune(retention_days).await;
    info!(pruned, retention_days, "telemetry maintenance complete");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hippoforge_database::SqliteStore;

    #[tokio::test]
    async fn creates_the_blackboard_root_if_missing() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nested").join("blackboard");
        let db_path = dir.path().join("telemetry.db");
        let store = SqliteStore::open(&db_path).await.unwrap();
        let telemetry = TelemetryLedger::new(store);

        assert!(!root.exists());
        run_startup_checks(&root, &telemetry, 30).await.unwrap();
        assert!(root.exists());
    }
}
