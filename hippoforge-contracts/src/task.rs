use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::intent::{GitMeta, Intent};

/// A task's lifecycle moves PENDING -> IN_PROGRESS -> {COMPLETED, FAILED}
/// monotonically; it is never reverted from COMPLETED/FAILED back to an
/// earlier stage except by the strict-git invariant, which moves a
/// would-be COMPLETED task back to PENDING for exactly one more tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// The loop guard from spec.md §3: once the feedback log exceeds this many
/// entries the task is forced to FAILED with a loop-detected note.
pub const FEEDBACK_LOOP_GUARD: usize = 20;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub description: String,
    pub status: TaskStatus,
    pub assigned_worker: Option<String>,
    pub depends_on: Vec<String>,
    pub input_files: Vec<String>,
    pub output_files: Vec<String>,
    pub intents: HashSet<Intent>,
    /// Free-form task type, checked by the project-lifecycle role's
    /// trigger (§4.9) against `project_update`/`project_archive`; `None`
    /// for ordinary tasks.
    pub task_kind: Option<String>,
    pub git_meta: GitMeta,
    pub feedback_log: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            description: description.into(),
            status: TaskStatus::Pending,
            assigned_worker: None,
            depends_on: Vec::new(),
            input_files: Vec::new(),
            output_files: Vec::new(),
            intents: HashSet::new(),
            task_kind: None,
            git_meta: GitMeta::default(),
            feedback_log: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_intent(&self, intent: Intent) -> bool {
        self.intents.contains(&intent)
    }

    pub fn set_intent(&mut self, intent: Intent, enabled: bool) {
        if enabled {
            self.intents.insert(intent);
        } else {
            self.intents.remove(&intent);
        }
    }

    pub fn push_feedback(&mut self, note: impl Into<String>) {
        self.feedback_log.push(note.into());
        self.updated_at = Utc::now();
    }

    pub fn exceeds_loop_guard(&self) -> bool {
        self.feedback_log.len() > FEEDBACK_LOOP_GUARD
    }

    /// Invariant from spec.md §3: a task with the tests-failing intent that
    /// reaches COMPLETED must carry at least one `task_completed` provenance
    /// entry. This only checks the local precondition; the provenance side
    /// is checked by the blackboard store against the session's log.
    pub fn requires_completion_provenance(&self) -> bool {
        self.has_intent(Intent::TestsFailing) && self.status == TaskStatus::Completed
    }
}

/// Boolean dispatch flags as the plan bridge's Markdown grammar spells
/// them (`git_commit_ready=True`, …). Kept separate from `Intent` because
/// the Markdown flag names are a stable external wire format (§4.12)
/// while `Intent` is the internal dispatch representation; this map is
/// the translation layer between the two, matching only the whitelisted
/// subset spec.md §4.12 requires.
pub fn flag_name(intent: Intent) -> Option<&'static str> {
    match intent {
        Intent::GitCommit => Some("git_commit_ready"),
        Intent::GitPullRequest => Some("git_create_pr"),
        _ => None,
    }
}

pub fn intent_for_flag_name(name: &str) -> Option<Intent> {
    match name {
        "context_needed" => Some(Intent::Context),
        "requires_consensus" => Some(Intent::Consensus),
        "requires_debate" => Some(Intent::Debate),
        "verification_required" => Some(Intent::Verification),
        "tests_failing" => Some(Intent::TestsFailing),
        "git_commit_ready" => Some(Intent::GitCommit),
        "git_create_pr" => Some(Intent::GitPullRequest),
        "feature_discovery" => Some(Intent::FeatureDiscovery),
        "code_audit" => Some(Intent::CodeAudit),
        "issue_triage_needed" => Some(Intent::IssueTriage),
        "project_bootstrap" => Some(Intent::ProjectBootstrap),
        _ => None,
    }
}

/// A set of tasks keyed by id, matching ProjectProfile's `tasks` map.
pub type TaskTable = HashMap<String, Task>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loop_guard_trips_past_twenty_entries() {
        let mut task = Task::new("t1", "refactor x");
        for i in 0..21 {
            task.push_feedback(format!("attempt {i}"));
        }
        assert!(task.exceeds_loop_guard());
    }

    #[test]
    fn loop_guard_does_not_trip_at_exactly_twenty() {
        let mut task = Task::new("t1", "refactor x");
        for i in 0..20 {
            task.push_feedback(format!("attempt {i}"));
        }
        assert!(!task.exceeds_loop_guard());
    }

    #[test]
    fn flag_whitelist_only_covers_git_flags() {
        assert_eq!(flag_name(Intent::GitCommit), Some("git_commit_ready"));
        assert_eq!(flag_name(Intent::GitPullRequest), Some("git_create_pr"));
        assert_eq!(flag_name(Intent::Context), None);
    }

    #[test]
    fn flag_name_round_trips_through_intent_for_flag_name() {
        for intent in [Intent::GitCommit, Intent::GitPullRequest] {
            let name = flag_name(intent).unwrap();
            assert_eq!(intent_for_flag_name(name), Some(intent));
        }
    }
}
