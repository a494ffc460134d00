use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Architect,
    Engineer,
    Auditor,
    System,
    FeatureScout,
    CodeAuditor,
    IssueTriage,
    BranchManager,
    ProjectLifecycle,
    GitWriter,
}

/// An append-only provenance entry. Ordered by `timestamp` within a
/// session; truncation happens only via the context pruner (C5), and
/// never to the tail-K most recent entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorSignature {
    pub agent_id: String,
    pub role: Role,
    pub action: String,
    pub contributing_model: Option<String>,
    pub artifact: Option<String>,
    pub timestamp: DateTime<Utc>,
    /// HMAC over the previous signature's digest and this entry's fields,
    /// filled in by `hippoforge-security::SignedProvenanceChain`. `None`
    /// until the chain signs it.
    pub signature: Option<String>,
}

impl AuthorSignature {
    pub fn new(agent_id: impl Into<String>, role: Role, action: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            role,
            action: action.into(),
            contributing_model: None,
            artifact: None,
            timestamp: Utc::now(),
            signature: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.contributing_model = Some(model.into());
        self
    }

    pub fn with_artifact(mut self, artifact: impl Into<String>) -> Self {
        self.artifact = Some(artifact.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_optional_fields() {
        let sig = AuthorSignature::new("agent-1", Role::Engineer, "task_completed")
            .with_model("claude-sonnet")
            .with_artifact("src/main.rs");
        assert_eq!(sig.contributing_model.as_deref(), Some("claude-sonnet"));
        assert_eq!(sig.artifact.as_deref(), Some("src/main.rs"));
        assert!(sig.signature.is_none());
    }
}
