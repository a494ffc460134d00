use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::provenance::AuthorSignature;
use crate::task::TaskTable;

/// Schema version for ProjectProfile's on-disk/SQL representation. Bumped
/// whenever a field is added or reinterpreted; a version mismatch on load
/// triggers migration rather than a hard failure.
pub const PROFILE_SCHEMA_VERSION: u32 = 1;

/// An optional fingerprint of the host toolchain/stack, persisted so a
/// later session can detect drift (different Rust/Node/Python toolchain)
/// without re-deriving it every tick.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StackFingerprint {
    pub install_id: String,
    pub toolchain: HashMap<String, String>,
}

/// The durable project profile — the blackboard. A single profile
/// corresponds to exactly one session id; locks are advisory and scoped
/// per session, held by at most one agent id at a time with a five-minute
/// expiry (see `hippoforge-blackboard::lock`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectProfile {
    pub schema_version: u32,
    pub tasks: TaskTable,
    pub provenance_log: Vec<AuthorSignature>,
    pub active_context: HashMap<String, serde_json::Value>,
    pub memory_bank: HashMap<String, serde_json::Value>,
    pub worker_models: HashMap<String, String>,
    pub stack_fingerprint: Option<StackFingerprint>,
    pub toolchain_config: Option<HashMap<String, String>>,
}

impl ProjectProfile {
    /// A fresh profile with only the required `default` worker-model key
    /// set, matching the contract's "start from a fresh default" clause
    /// when neither backend returns an existing profile.
    pub fn fresh(default_model: impl Into<String>) -> Self {
        let mut worker_models = HashMap::new();
        worker_models.insert("default".to_string(), default_model.into());
        Self {
            schema_version: PROFILE_SCHEMA_VERSION,
            tasks: TaskTable::new(),
            provenance_log: Vec::new(),
            active_context: HashMap::new(),
            memory_bank: HashMap::new(),
            worker_models,
            stack_fingerprint: None,
            toolchain_config: None,
        }
    }

    pub fn needs_migration(&self) -> bool {
        self.schema_version != PROFILE_SCHEMA_VERSION
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_profile_has_default_worker_model() {
        let profile = ProjectProfile::fresh("claude-sonnet");
        assert_eq!(
            profile.worker_models.get("default").map(String::as_str),
            Some("claude-sonnet")
        );
        assert!(!profile.needs_migration());
    }
}
