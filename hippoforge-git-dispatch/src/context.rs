use std::collections::HashMap;

use serde_json::Value;

/// PR status as the branch manager's trigger reads it (§4.9).
#[derive(Debug, Clone, Default)]
pub struct PrStatus {
    pub approved: bool,
    pub ci_passing: bool,
    pub pr_number: Option<u64>,
}

/// Per-dispatch execution context handed to every role's `trigger_check`
/// and `execute`.
///
/// Per SPEC_FULL §2's C9 context-preparation supplement,
/// `git_role_dispatcher.py::_prepare_context` merges `active_context`
/// into the per-role context both under the `memory_bank` key and
/// flattened at the top level "for convenience." `RoleContext` keeps
/// that dual placement: `memory_bank` is the nested form, `top_level`
/// the flattened form callers may also read from, both built from the
/// same source map by [`RoleContext::new`].
#[derive(Debug, Clone, Default)]
pub struct RoleContext {
    pub memory_bank: HashMap<String, Value>,
    pub top_level: HashMap<String, Value>,
    pub periodic_feature_scan: bool,
    pub periodic_audit: bool,
    pub new_issues_count: u32,
    pub pr_status: PrStatus,
    pub stacked_pr_update_needed: bool,
    pub hipporag_available: bool,
    pub github_client_available: bool,
}

impl RoleContext {
    pub fn new(active_context: HashMap<String, Value>) -> Self {
        Self {
            top_level: active_context.clone(),
            memory_bank: active_context,
            ..Default::default()
        }
    }
}
