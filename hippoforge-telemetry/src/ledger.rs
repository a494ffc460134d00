use chrono::{Duration, Utc};
use hippoforge_contracts::{TelemetryEvent, TelemetryEventType};
use hippoforge_database::SqliteStore;
use hippoforge_resilience::{tool_status as threshold_status, CircuitStatus};
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

/// The default retention window from §4.2.
pub const DEFAULT_RETENTION_DAYS: i64 = 30;
/// The 10-second normalization constant in `rolePerformanceIndex`.
const MAX_DURATION_MS: f64 = 10_000.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblematicTool {
    pub tool: String,
    pub success_rate: f64,
    pub total_uses: i64,
}

/// C2's contract: `append`, `successRate`, `rolePerformanceIndex`,
/// `problematicTools`, `toolStatus`, `prune`, `optimize`.
pub struct TelemetryLedger {
    store: SqliteStore,
}

impl TelemetryLedger {
    pub fn new(store: SqliteStore) -> Self {
        Self { store }
    }

    /// Writes a single row; failure is logged but never raised to the
    /// caller, per §4.2 and the propagation policy in §7. Idempotent on
    /// `event.id` via `INSERT OR IGNORE`.
    #[instrument(skip(self, event))]
    pub async fn append(&self, event: &TelemetryEvent) {
        let event_type = event_type_str(event.event_type);
        let data = serde_json::json!({
            "tool_name": event.tool_name,
            "success": event.success,
            "duration_ms": event.duration_ms,
            "error_category": event.error_category,
            "properties": event.properties,
        });

        let result = sqlx::query(
            "INSERT OR IGNORE INTO events (id, timestamp, type, session_id, install_id, data)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&event.id)
        .bind(event.timestamp.to_rfc3339())
        .bind(event_type)
        .bind(&event.session_id)
        .bind(&event.install_id)
        .bind(data.to_string())
        .execute(self.store.pool())
        .await;

        if let Err(e) = result {
            warn!(event_id = %event.id, error = %e, "failed to append telemetry event");
        }
    }

    /// `successRate(tool, window)`: successes / attempts over the last N
    /// days, defaulting optimistically to 1.0 on empty data.
    pub async fn success_rate(&self, tool_name: &str, window_days: i64) -> f64 {
        self.rate_over_window(
            "type = 'tool_use' AND json_extract(data, '$.tool_name') = ?1",
            tool_name,
            window_days,
        )
        .await
    }

    async fn role_success_rate(&self, role: &str) -> f64 {
        let row: Option<(i64, Option<i64>)> = sqlx::query_as(
            "SELECT COUNT(*), SUM(CASE WHEN json_extract(data, '$.success') = 1 THEN 1 ELSE 0 END)
             FROM events
             WHERE type = 'provenance' AND json_extract(data, '$.properties.role') = ?1",
        )
        .bind(role)
        .fetch_optional(self.store.pool())
        .await
        .unwrap_or(None);

        match row {
            Some((total, Some(successes))) if total > 0 => successes as f64 / total as f64,
            _ => 1.0,
        }
    }

    async fn rate_over_window(&self, predicate: &str, bound: &str, window_days: i64) -> f64 {
        let cutoff = Utc::now() - Duration::days(window_days);
        let query = format!(
            "SELECT COUNT(*), SUM(CASE WHEN json_extract(data, '$.success') = 1 THEN 1 ELSE 0 END)
             FROM events WHERE {predicate} AND timestamp > ?2"
        );
        let row: Option<(i64, Option<i64>)> = sqlx::query_as(&query)
            .bind(bound)
            .bind(cutoff.to_rfc3339())
            .fetch_optional(self.store.pool())
            .await
            .unwrap_or(None);

        match row {
            Some((total, Some(successes))) if total > 0 => successes as f64 / total as f64,
            _ => 1.0,
        }
    }

    async fn avg_duration_ms(&self, tool_name: &str) -> f64 {
        let row: Option<(Option<f64>,)> = sqlx::query_as(
            "SELECT AVG(json_extract(data, '$.duration_ms'))
             FROM events WHERE type = 'tool_use' AND json_extract(data, '$.tool_name') = ?1",
        )
        .bind(tool_name)
        .fetch_optional(self.store.pool())
        .await
        .unwrap_or(None);
        row.and_then(|(avg,)| avg).unwrap_or(0.0)
    }

    /// `rolePerformanceIndex(role)` = 0.7 * successRate + 0.3 * speedScore,
    /// speedScore = max(0, 1 - avgDuration / 10_000ms). Duration is read
    /// from the role's own `git_role_<role>` tool-use events, matching
    /// the source system's convention for tagging role invocations.
    pub async fn role_performance_index(&self, role: &str) -> f64 {
        let success_rate = self.role_success_rate(role).await;
        let avg_duration = self.avg_duration_ms(&format!("git_role_{role}")).await;
        let speed_score = if avg_duration > 0.0 {
            (1.0 - (avg_duration / MAX_DURATION_MS)).max(0.0)
        } else {
            1.0
        };
        0.7 * success_rate + 0.3 * speed_score
    }

    /// `problematicTools(threshold, window)`: tools with attempts > 5 and
    /// successRate < threshold.
    pub async fn problematic_tools(&self, threshold: f64, window_days: i64) -> Vec<ProblematicTool> {
        let cutoff = Utc::now() - Duration::days(window_days);
        let rows: Vec<(Option<String>, i64, Option<i64>)> = sqlx::query_as(
            "SELECT json_extract(data, '$.tool_name') as name, COUNT(*) as total,
                    SUM(CASE WHEN json_extract(data, '$.success') = 1 THEN 1 ELSE 0 END) as successes
             FROM events
             WHERE type = 'tool_use' AND timestamp > ?1
             GROUP BY name
             HAVING total > 5",
        )
        .bind(cutoff.to_rfc3339())
        .fetch_all(self.store.pool())
        .await
        .unwrap_or_default();

        rows.into_iter()
            .filter_map(|(name, total, successes)| {
                let name = name?;
                let successes = successes.unwrap_or(0);
                let rate = successes as f64 / total as f64;
                (rate < threshold).then_some(ProblematicTool {
                    tool: name,
                    success_rate: rate,
                    total_uses: total,
                })
            })
            .collect()
    }

    /// `toolStatus(tool)` -> READY | WARNING | TRIPPED at 0.7/0.3 over the
    /// last 24 hours.
    pub async fn tool_status(&self, tool_name: &str) -> CircuitStatus {
        let rate = self.success_rate(tool_name, 1).await;
        threshold_status(rate)
    }

    /// `prune(ageDays)`: deletes rows older than the retention window.
    pub async fn prune(&self, age_days: i64) -> u64 {
        let cutoff = Utc::now() - Duration::days(age_days);
        let result = sqlx::query("DELETE FROM events WHERE timestamp < ?1")
            .bind(cutoff.to_rfc3339())
            .execute(self.store.pool())
            .await;
        match result {
            Ok(r) => r.rows_affected(),
            Err(e) => {
                warn!(error = %e, "failed to prune telemetry events");
                0
            }
        }
    }

    /// `optimize()`: enables WAL mode and runs VACUUM.
    pub async fn optimize(&self) {
        if let Err(e) = self.store.vacuum_and_enable_wal().await {
            warn!(error = %e, "failed to optimize telemetry store");
        }
    }
}

fn event_type_str(event_type: TelemetryEventType) -> &'static str {
    match event_type {
        TelemetryEventType::ToolUse => "tool_use",
        TelemetryEventType::TaskRouting => "task_routing",
        TelemetryEventType::Error => "error",
        TelemetryEventType::Provenance => "provenance",
        TelemetryEventType::Startup => "startup",
        TelemetryEventType::GapDetected => "gap_detected",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hippoforge_contracts::TelemetryEventType;

    async fn test_ledger() -> TelemetryLedger {
        let mut path = std::env::temp_dir();
        path.push(format!(
            "hippoforge-telemetry-test-{}-{}.db",
            std::process::id(),
            uuid_like()
        ));
        let store = SqliteStore::open(&path).await.unwrap();
        TelemetryLedger::new(store)
    }

    fn uuid_like() -> u128 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    }

    #[tokio::test]
    async fn empty_store_is_optimistic_about_success_rate() {
        let ledger = test_ledger().await;
        assert_eq!(ledger.success_rate("git", 7).await, 1.0);
    }

    #[tokio::test]
    async fn appending_the_same_event_id_twice_is_a_no_op() {
        let ledger = test_ledger().await;
        let event = TelemetryEvent::new("evt-1", "session-1", "install-1", TelemetryEventType::ToolUse);
        ledger.append(&event).await;
        ledger.append(&event).await;
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM events")
            .fetch_one(ledger.store.pool())
            .await
            .unwrap();
        assert_eq!(count.0, 1);
    }

    #[tokio::test]
    async fn tool_status_thresholds_match_spec() {
        let ledger = test_ledger().await;
        assert_eq!(ledger.tool_status("never-used-tool").await, CircuitStatus::Ready);
    }
}
