//! C8: the self-healing monitor. Composes C2 (telemetry) queries into a
//! health snapshot and feeds C9's circuit-breaker gating, grounded on
//! `self_healing.py::SelfHealingMonitor`.
//!
//! Per SPEC_FULL §2's C8 role-coverage supplement, `check_health` scores
//! all five git roles from spec.md §4.9 rather than the source's four
//! (which omits `project_lifecycle`).

use hippoforge_resilience::{tool_status, CircuitStatus};
use hippoforge_telemetry::TelemetryLedger;
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::{instrument, warn};

/// The fixed role set scored by `check_health`, per §4.9.
pub const GIT_ROLES: &[&str] = &[
    "feature_scout",
    "code_auditor",
    "issue_triage",
    "branch_manager",
    "project_lifecycle",
];

/// Performance index below which a role is considered "failed" for
/// health-reporting purposes (distinct from the 0.3 circuit-breaker cut
/// used by `should_skip_role`).
const ROLE_FAILING_THRESHOLD: f64 = 0.5;
/// Performance index below which a role's circuit breaker trips (§4.8).
const ROLE_SKIP_THRESHOLD: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct HealingAction {
    pub priority: u8,
    pub action_type: String,
    pub target: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct SystemHealth {
    pub status: HealthStatus,
    pub problematic_tools: Vec<String>,
    pub failed_roles: Vec<String>,
    pub recommended_actions: Vec<HealingAction>,
}

/// A chronic failure pattern surfaced from the memory bank (§4.8 step 3).
/// The monitor does not own a memory store of its own — per the data
/// model's ownership rule, every component besides the one that owns an
/// entity consumes an immutable snapshot — so the caller (C10) supplies
/// whatever chronic patterns it has observed over its own 24h window.
#[derive(Debug, Clone)]
pub struct FailurePattern {
    pub target: String,
    pub failure_count: u64,
}

/// Self-healing monitor: composes telemetry queries into a health
/// snapshot and tracks a local failure-count map for
/// `record_failure`/`record_success` (§4.8).
pub struct SelfHealingMonitor {
    ledger: TelemetryLedger,
    circuit_breakers: Mutex<HashMap<String, u64>>,
}

impl SelfHealingMonitor {
    pub fn new(ledger: TelemetryLedger) -> Self {
        Self {
            ledger,
            circuit_breakers: Mutex::new(HashMap::new()),
        }
    }

    /// `checkHealth()`: composes C2 queries into problematic tools,
    /// failed roles, and prioritized recommended actions, then derives an
    /// overall status (CRITICAL at >=3 tool problems or >=2 role
    /// failures, HEALTHY at neither, DEGRADED otherwise).
    #[instrument(skip(self, chronic_patterns))]
    pub async fn check_health(&self, chronic_patterns: &[FailurePattern]) -> SystemHealth {
        let mut problematic_tools = Vec::new();
        let mut failed_roles = Vec::new();
        let mut actions = Vec::new();

        for tool in self.ledger.problematic_tools(0.7, 1).await {
            let status = self.ledger.tool_status(&tool.tool).await;
            match status {
                CircuitStatus::Tripped => actions.push(HealingAction {
                    priority: 1,
                    action_type: "skip_tool".to_string(),
                    target: tool.tool.clone(),
                    reason: format!(
                        "tool circuit breaker tripped ({:.0}% success)",
                        tool.success_rate * 100.0
                    ),
                }),
                CircuitStatus::Warning => actions.push(HealingAction {
                    priority: 2,
                    action_type: "retry_with_backoff".to_string(),
                    target: tool.tool.clone(),
                    reason: format!(
                        "tool degraded ({:.0}% success)",
                        tool.success_rate * 100.0
                    ),
                }),
                CircuitStatus::Ready => {}
            }
            problematic_tools.push(tool.tool);
        }

        for role in GIT_ROLES {
            let pi = self.ledger.role_performance_index(role).await;
            if pi < ROLE_FAILING_THRESHOLD {
                failed_roles.push(role.to_string());
                actions.push(HealingAction {
                    priority: 2,
                    action_type: "skip_role".to_string(),
                    target: role.to_string(),
                    reason: format!("role has low performance index ({pi:.2})"),
                });
            }
        }

        for pattern in chronic_patterns.iter().take(3) {
            actions.push(HealingAction {
                priority: 3,
                action_type: "create_issue".to_string(),
                target: pattern.target.clone(),
                reason: format!(
                    "chronic failure: {} failures in 24h",
                    pattern.failure_count
                ),
            });
        }

        let status = if problematic_tools.len() >= 3 || failed_roles.len() >= 2 {
            HealthStatus::Critical
        } else if !problematic_tools.is_empty() || !failed_roles.is_empty() {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };

        actions.sort_by_key(|a| a.priority);

        if status == HealthStatus::Critical {
            warn!(
                actions = actions.len(),
                "system health critical, healing actions pending"
            );
        }

        SystemHealth {
            status,
            problematic_tools,
            failed_roles,
            recommended_actions: actions,
        }
    }

    /// `shouldSkipRole(role)`: true iff `performanceIndex(role) < 0.3`.
    pub async fn should_skip_role(&self, role: &str) -> bool {
        self.role_performance_index(role).await < ROLE_SKIP_THRESHOLD
    }

    /// Exposes C2's performance index directly for C9's PI-sorted
    /// execution order (§4.9 step 2).
    pub async fn role_performance_index(&self, role: &str) -> f64 {
        self.ledger.role_performance_index(role).await
    }

    /// Tool variant of the same circuit-breaker gate, reused by C8/C9's
    /// tool-skip recommendations and any caller that wants a tool-scoped
    /// equivalent of `should_skip_role`.
    pub async fn should_skip_tool(&self, tool: &str) -> bool {
        matches!(
            tool_status(self.ledger.success_rate(tool, 1).await),
            CircuitStatus::Tripped
        )
    }

    /// `recordFailure(target, error)`: bumps the local failure counter and
    /// appends a telemetry error event.
    pub fn record_failure(&self, target: &str) {
        let mut breakers = self.circuit_breakers.lock();
        *breakers.entry(target.to_string()).or_insert(0) += 1;
    }

    /// `recordSuccess(target)`: decrements (floor zero) the local failure
    /// counter.
    pub fn record_success(&self, target: &str) {
        let mut breakers = self.circuit_breakers.lock();
        if let Some(count) = breakers.get_mut(target) {
            *count = count.saturating_sub(1);
        }
    }

    pub fn failure_count(&self, target: &str) -> u64 {
        self.circuit_breakers.lock().get(target).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hippoforge_database::SqliteStore;

    async fn test_monitor() -> SelfHealingMonitor {
        let mut path = std::env::temp_dir();
        path.push(format!(
            "hippoforge-health-monitor-test-{}-{}.db",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        let store = SqliteStore::open(&path).await.unwrap();
        SelfHealingMonitor::new(TelemetryLedger::new(store))
    }

    #[tokio::test]
    async fn an_empty_telemetry_store_reports_healthy() {
        let monitor = test_monitor().await;
        let health = monitor.check_health(&[]).await;
        assert_eq!(health.status, HealthStatus::Healthy);
        assert!(health.problematic_tools.is_empty());
        assert!(health.failed_roles.is_empty());
    }

    #[tokio::test]
    async fn should_skip_role_is_false_with_no_history() {
        let monitor = test_monitor().await;
        assert!(!monitor.should_skip_role("feature_scout").await);
    }

    #[test]
    fn record_failure_then_success_nets_to_zero() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let monitor = rt.block_on(test_monitor());
        monitor.record_failure("git");
        monitor.record_failure("git");
        monitor.record_success("git");
        assert_eq!(monitor.failure_count("git"), 1);
    }

    #[test]
    fn record_success_never_goes_below_zero() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let monitor = rt.block_on(test_monitor());
        monitor.record_success("git");
        assert_eq!(monitor.failure_count("git"), 0);
    }

    #[tokio::test]
    async fn chronic_patterns_become_create_issue_actions_capped_at_three() {
        let monitor = test_monitor().await;
        let patterns = vec![
            FailurePattern { target: "a".to_string(), failure_count: 9 },
            FailurePattern { target: "b".to_string(), failure_count: 7 },
            FailurePattern { target: "c".to_string(), failure_count: 5 },
            FailurePattern { target: "d".to_string(), failure_count: 1 },
        ];
        let health = monitor.check_health(&patterns).await;
        let create_issue_count = health
            .recommended_actions
            .iter()
            .filter(|a| a.action_type == "create_issue")
            .count();
        assert_eq!(create_issue_count, 3);
    }
}
