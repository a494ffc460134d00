use anyhow::Result;
use chrono::Utc;
use hippoforge_contracts::ProjectProfile;
use hippoforge_database::PostgresClient;
use tracing::warn;

use crate::lock::SessionLock;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS session_state (
    session_id TEXT PRIMARY KEY,
    profile_data JSONB NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL,
    locked_by TEXT,
    lock_expires_at TIMESTAMPTZ
);
"#;

/// The optional SQL backend (§4.1, §6). SQL errors are non-fatal: every
/// method here returns `Result` but callers in [`crate::store`] log and
/// fall back to the file backend rather than propagating.
pub struct SqlBackend {
    client: PostgresClient,
}

impl SqlBackend {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let client = PostgresClient::connect(database_url).await?;
        client.migrate(SCHEMA).await?;
        Ok(Self { client })
    }

    pub async fn load(&self, session_id: &str) -> Result<Option<ProjectProfile>> {
        let row: Option<(serde_json::Value,)> = sqlx::query_as(
            "SELECT profile_data FROM session_state WHERE session_id = $1",
        )
        .bind(session_id)
        .fetch_optional(self.client.pool())
        .await?;
        Ok(row
            .map(|(data,)| serde_json::from_value(data))
            .transpose()?)
    }

    /// Persists the profile and claims the session lock scoped to
    /// `(session_id, agent)` with a five-minute expiry, upserting
    /// `locked_by`/`lock_expires_at` per §4.1.
    pub async fn save(
        &self,
        session_id: &str,
        profile: &ProjectProfile,
        agent: &str,
    ) -> Result<SessionLock> {
        let lock = SessionLock::claim(agent);
        let data = serde_json::to_value(profile)?;
        sqlx::query(
            "INSERT INTO session_state (session_id, profile_data, updated_at, locked_by, lock_expires_at)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (session_id) DO UPDATE
             SET profile_data = EXCLUDED.profile_data,
                 updated_at = EXCLUDED.updated_at,
                 locked_by = EXCLUDED.locked_by,
                 lock_expires_at = EXCLUDED.lock_expires_at",
        )
        .bind(session_id)
        .bind(&data)
        .bind(Utc::now())
        .bind(&lock.locked_by)
        .bind(lock.expires_at)
        .execute(self.client.pool())
        .await?;
        Ok(lock)
    }

    pub async fn release_lock(&self, session_id: &str, agent: &str) -> Result<()> {
        sqlx::query(
            "UPDATE session_state SET locked_by = NULL, lock_expires_at = NULL
             WHERE session_id = $1 AND locked_by = $2",
        )
        .bind(session_id)
        .bind(agent)
        .execute(self.client.pool())
        .await?;
        Ok(())
    }

    /// Clears any lock whose expiry is in the past, safe to run at any
    /// time per §5.
    pub async fn cleanup_stale_locks(&self) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE session_state SET locked_by = NULL, lock_expires_at = NULL
             WHERE lock_expires_at IS NOT NULL AND lock_expires_at < $1",
        )
        .bind(Utc::now())
        .execute(self.client.pool())
        .await?;
        Ok(result.rows_affected())
    }

    pub(crate) fn warn_non_fatal(context: &str, err: &anyhow::Error) {
        warn!(context, error = %err, "sql backend error, continuing with file backend");
    }
}
