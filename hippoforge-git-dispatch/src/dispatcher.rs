use std::sync::Arc;

use hippoforge_contracts::{AuthorSignature, ExitReport, Role as ProvenanceRole};
use hippoforge_contracts::Task;
use hippoforge_health_monitor::SelfHealingMonitor;
use tracing::{info, instrument, warn};

use crate::context::RoleContext;
use crate::role::{
    BranchManagerRole, CodeAuditorRole, FeatureScoutRole, GitAgentRole, GitRoleKind,
    IssueTriageRole, ProjectLifecycleRole,
};

/// The fixed default execution order before PI sorting, matching
/// `git_role_dispatcher.py::_get_optimized_execution_order`'s
/// `default_order` list.
const DEFAULT_ORDER: [GitRoleKind; 5] = [
    GitRoleKind::ProjectLifecycle,
    GitRoleKind::IssueTriage,
    GitRoleKind::FeatureScout,
    GitRoleKind::CodeAuditor,
    GitRoleKind::BranchManager,
];

fn provenance_role(kind: GitRoleKind) -> ProvenanceRole {
    match kind {
        GitRoleKind::FeatureScout => ProvenanceRole::FeatureScout,
        GitRoleKind::CodeAuditor => ProvenanceRole::CodeAuditor,
        GitRoleKind::IssueTriage => ProvenanceRole::IssueTriage,
        GitRoleKind::BranchManager => ProvenanceRole::BranchManager,
        GitRoleKind::ProjectLifecycle => ProvenanceRole::ProjectLifecycle,
    }
}

/// C9: the fixed five-role dispatcher. Computes a PI-sorted execution
/// order, skips circuit-broken roles, and records success/failure back
/// to C8 for every role it actually triggers.
pub struct GitRoleDispatcher {
    roles: Vec<Box<dyn GitAgentRole>>,
    health: Arc<SelfHealingMonitor>,
}

impl GitRoleDispatcher {
    pub fn new(health: Arc<SelfHealingMonitor>) -> Self {
        Self {
            roles: vec![
                Box::new(FeatureScoutRole),
                Box::new(CodeAuditorRole),
                Box::new(IssueTriageRole),
                Box::new(BranchManagerRole),
                Box::new(ProjectLifecycleRole),
            ],
            health,
        }
    }

    fn role_for(&self, kind: GitRoleKind) -> &dyn GitAgentRole {
        self.roles
            .iter()
            .find(|r| r.kind() == kind)
            .expect("all five fixed roles are always registered")
            .as_ref()
    }

    /// `dispatch(task)` from §4.9: snapshot health, compute the
    /// PI-sorted order, run every triggered role (skipping circuit-broken
    /// ones), and return each report paired with the provenance entry the
    /// caller (C10) should append to the blackboard.
    #[instrument(skip(self, task, context))]
    pub async fn dispatch(
        &self,
        task: &Task,
        context: &RoleContext,
    ) -> Vec<(ExitReport, AuthorSignature)> {
        let health = self.health.check_health(&[]).await;
        if health.status == hippoforge_health_monitor::HealthStatus::Critical {
            warn!(
                actions = health.recommended_actions.len(),
                "system health critical ahead of git role dispatch"
            );
        }

        let order = self.execution_order().await;
        let mut results = Vec::new();

        for kind in order {
            let role = self.role_for(kind);
            if !role.trigger_check(task, context) {
                continue;
            }

            if self.health.should_skip_role(kind.as_str()).await {
                warn!(role = kind.as_str(), "skipping role, circuit breaker tripped");
                let report = ExitReport::skipped(task.id.clone(), "circuit breaker tripped");
                let signature = AuthorSignature::new(
                    "git-role-dispatcher",
                    provenance_role(kind),
                    "role_skipped",
                );
                results.push((report, signature));
                continue;
            }

            info!(role = kind.as_str(), "dispatching git role");
            let report = role.execute(task, context);
            match report.status {
                hippoforge_contracts::HandoffStatus::Failed => {
                    self.health.record_failure(kind.as_str());
                }
                _ => self.health.record_success(kind.as_str()),
            }

            let signature = AuthorSignature::new(
                "git-role-dispatcher",
                provenance_role(kind),
                format!("git_role_{}", kind.as_str()),
            );
            results.push((report, signature));
        }

        results
    }

    /// `_get_optimized_execution_order`: sorts the fixed default order by
    /// descending performance index (§4.9 step 2).
    async fn execution_order(&self) -> Vec<GitRoleKind> {
        let mut scored = Vec::with_capacity(DEFAULT_ORDER.len());
        for kind in DEFAULT_ORDER {
            let pi = self.health.role_performance_index(kind.as_str()).await;
            scored.push((kind, pi));
        }
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.into_iter().map(|(kind, _)| kind).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hippoforge_contracts::{Intent, Task};
    use hippoforge_database::SqliteStore;
    use hippoforge_telemetry::TelemetryLedger;

    async fn test_dispatcher() -> GitRoleDispatcher {
        let mut path = std::env::temp_dir();
        path.push(format!(
            "hippoforge-git-dispatch-test-{}-{}.db",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        let store = SqliteStore::open(&path).await.unwrap();
        let health = Arc::new(SelfHealingMonitor::new(TelemetryLedger::new(store)));
        GitRoleDispatcher::new(health)
    }

    #[tokio::test]
    async fn a_task_with_no_triggered_flags_produces_no_reports() {
        let dispatcher = test_dispatcher().await;
        let task = Task::new("t1", "a plain task");
        let context = RoleContext::default();
        let results = dispatcher.dispatch(&task, &context).await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn feature_discovery_intent_triggers_the_feature_scout_role() {
        let dispatcher = test_dispatcher().await;
        let mut task = Task::new("t1", "scan for gaps");
        task.set_intent(Intent::FeatureDiscovery, true);
        let context = RoleContext::default();
        let results = dispatcher.dispatch(&task, &context).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].1.role, hippoforge_contracts::Role::FeatureScout);
    }

    #[tokio::test]
    async fn issue_triage_without_github_client_is_blocked_not_failed() {
        let dispatcher = test_dispatcher().await;
        let mut task = Task::new("t1", "triage issues");
        task.set_intent(Intent::IssueTriage, true);
        let context = RoleContext::default();
        let results = dispatcher.dispatch(&task, &context).await;
        assert_eq!(results.len(), 1);
        assert_eq!(
            results[0].0.status,
            hippoforge_contracts::HandoffStatus::Blocked
        );
    }
}
