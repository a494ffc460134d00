use std::collections::HashMap;

use anyhow::{Context, Result};
use sqlx::PgPool;
use tracing::{debug, error, info};

/// Wraps the optional Postgres-backed SQL session store (§6): tables
/// `session_state`, `archived_memory`, `error_knowledge`. Absence of
/// `POSTGRES_URL` means the blackboard runs file-only; nothing in this
/// crate is load-bearing for that path.
#[derive(Clone)]
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    pub async fn connect(database_url: &str) -> Result<Self> {
        info!("connecting to postgres session store");
        let pool = PgPool::connect(database_url)
            .await
            .context("failed to connect to postgres")?;
        sqlx::query("SELECT 1")
            .execute(&pool)
            .await
            .context("postgres connectivity check failed")?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn health_check(&self) -> bool {
        match sqlx::query("SELECT 1").execute(&self.pool).await {
            Ok(_) => true,
            Err(e) => {
                error!(error = %e, "postgres health check failed");
                false
            }
        }
    }

    pub async fn migrate(&self, migration_sql: &str) -> Result<()> {
        sqlx::query(migration_sql)
            .execute(&self.pool)
            .await
            .context("migration failed")?;
        Ok(())
    }

    /// Row counts per table named in §6's SQL session store schema, for
    /// operational visibility. Missing tables count as zero rather than
    /// failing the whole call.
    pub async fn get_stats(&self) -> DatabaseStats {
        let tables = ["session_state", "archived_memory", "error_knowledge"];
        let mut table_counts = HashMap::new();
        for table in tables {
            let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
                .fetch_one(&self.pool)
                .await
                .unwrap_or_else(|e| {
                    debug!(table, error = %e, "table not present yet");
                    0
                });
            table_counts.insert(table.to_string(), count);
        }
        DatabaseStats {
            pool_size: self.pool.size(),
            idle_connections: self.pool.num_idle() as u32,
            table_counts,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DatabaseStats {
    pub pool_size: u32,
    pub idle_connections: u32,
    pub table_counts: HashMap<String, i64>,
}
