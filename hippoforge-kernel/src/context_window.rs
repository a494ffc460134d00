//! The classical-flow context assembly from §4.10 step 4: a bounded
//! slice of recent provenance plus the system-alert/blocked-tool
//! injection `orchestrator_loop.py::process_task` performs from the
//! self-healing snapshot before rendering the worker prompt.

use hippoforge_contracts::AuthorSignature;
use hippoforge_health_monitor::SystemHealth;

/// The source system's `MAX_MEMORY_ITEMS` constant.
pub const MAX_MEMORY_ITEMS: usize = 10;

#[derive(Debug, Clone, Default)]
pub struct ContextWindow {
    pub recent_provenance: Vec<AuthorSignature>,
    pub system_alerts: Vec<String>,
    pub blocked_tools: Vec<String>,
}

/// Builds the per-tick context window: the last `MAX_MEMORY_ITEMS`
/// provenance entries, plus the current health snapshot's recommended
/// actions rendered as `SYSTEM_ALERTS` and its problematic tools as
/// `BLOCKED_TOOLS`.
pub fn build_context_window(provenance_log: &[AuthorSignature], health: &SystemHealth) -> ContextWindow {
    let start = provenance_log.len().saturating_sub(MAX_MEMORY_ITEMS);
    let recent_provenance = provenance_log[start..].to_vec();

    let system_alerts = health
        .recommended_actions
        .iter()
        .map(|action| format!("{}: {} ({})", action.action_type, action.target, action.reason))
        .collect();

    ContextWindow {
        recent_provenance,
        system_alerts,
        blocked_tools: health.problematic_tools.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hippoforge_contracts::Role;
    use hippoforge_health_monitor::HealthStatus;

    fn empty_health() -> SystemHealth {
        SystemHealth {
            status: HealthStatus::Healthy,
            problematic_tools: Vec::new(),
            failed_roles: Vec::new(),
            recommended_actions: Vec::new(),
        }
    }

    #[test]
    fn keeps_only_the_last_ten_provenance_entries() {
        let log: Vec<AuthorSignature> = (0..25)
            .map(|i| AuthorSignature::new("agent-1", Role::Engineer, format!("action_{i}")))
            .collect();
        let window = build_context_window(&log, &empty_health());
        assert_eq!(window.recent_provenance.len(), MAX_MEMORY_ITEMS);
        assert_eq!(window.recent_provenance[0].action, "action_15");
    }

    #[test]
    fn short_logs_are_kept_in_full() {
        let log: Vec<AuthorSignature> = (0..3)
            .map(|i| AuthorSignature::new("agent-1", Role::Engineer, format!("action_{i}")))
            .collect();
        let window = build_context_window(&log, &empty_health());
        assert_eq!(window.recent_provenance.len(), 3);
    }
}
