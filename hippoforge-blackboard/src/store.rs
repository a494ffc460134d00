use std::path::PathBuf;

use hippoforge_contracts::{OrchestratorError, OrchestratorResult, ProjectProfile};
use tracing::{instrument, warn};

use crate::file_backend::FileBackend;
use crate::lock::SessionLock;
use crate::sql_backend::SqlBackend;

/// The blackboard store contract from §4.1: `load`, `save`,
/// `release_lock`, `cleanup_stale_locks`.
pub struct BlackboardStore {
    file: FileBackend,
    sql: Option<SqlBackend>,
    default_model: String,
}

impl BlackboardStore {
    pub fn new(root: impl Into<PathBuf>, sql: Option<SqlBackend>, default_model: impl Into<String>) -> Self {
        Self {
            file: FileBackend::new(root),
            sql,
            default_model: default_model.into(),
        }
    }

    /// `load(session)`: try SQL first if configured, falling back to the
    /// file backend on SQL failure; if neither returns a profile, start
    /// from a fresh default.
    #[instrument(skip(self))]
    pub async fn load(&self, session_id: &str) -> OrchestratorResult<ProjectProfile> {
        self.file
            .migrate_legacy_filename()
            .map_err(|e| OrchestratorError::contract(format!("migration failed: {e}")))?;

        if let Some(sql) = &self.sql {
            match sql.load(session_id).await {
                Ok(Some(profile)) => return Ok(profile),
                Ok(None) => {}
                Err(e) => warn!(session_id, error = %e, "sql load failed, falling back to file"),
            }
        }

        match self.file.load() {
            Ok(Some(profile)) => Ok(profile),
            Ok(None) => Ok(ProjectProfile::fresh(self.default_model.clone())),
            Err(e) => Err(OrchestratorError::contract(format!(
                "file backend load failed: {e}"
            ))),
        }
    }

    /// `save(session, profile, agent)`: persists to both backends; the
    /// SQL path additionally claims the session lock. SQL failures are
    /// logged and swallowed; file failures are fatal.
    #[instrument(skip(self, profile))]
    pub async fn save(
        &self,
        session_id: &str,
        profile: &ProjectProfile,
        agent: &str,
    ) -> OrchestratorResult<Option<SessionLock>> {
        let mut lock = None;
        if let Some(sql) = &self.sql {
            match sql.save(session_id, profile, agent).await {
                Ok(claimed) => lock = Some(claimed),
                Err(e) => warn!(session_id, error = %e, "sql save failed, continuing file-only"),
            }
        }

        self.file
            .save(profile)
            .map_err(|e| OrchestratorError::contract(format!("file backend save failed: {e}")))?;

        Ok(lock)
    }

    pub async fn release_lock(&self, session_id: &str, agent: &str) -> OrchestratorResult<()> {
        if let Some(sql) = &self.sql {
            if let Err(e) = sql.release_lock(session_id, agent).await {
                warn!(session_id, error = %e, "failed to release sql lock");
            }
        }
        Ok(())
    }

    pub async fn cleanup_stale_locks(&self) -> OrchestratorResult<u64> {
        if let Some(sql) = &self.sql {
            return sql.cleanup_stale_locks().await.or_else(|e| {
                warn!(error = %e, "failed to clean up stale locks");
                Ok(0)
            });
        }
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn loading_an_empty_project_returns_a_fresh_profile_with_default_model() {
        let mut dir = std::env::temp_dir();
        dir.push(format!(
            "hippoforge-blackboard-store-test-{}",
            std::process::id()
        ));
        let store = BlackboardStore::new(dir.clone(), None, "claude-sonnet");
        let profile = store.load("session-1").await.unwrap();
        assert_eq!(
            profile.worker_models.get("default").map(String::as_str),
            Some("claude-sonnet")
        );
        std::fs::remove_dir_all(dir).ok();
    }
}
