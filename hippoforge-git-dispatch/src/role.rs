use hippoforge_contracts::{ExitReport, HandoffStatus, Intent, Task};

use crate::context::RoleContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GitRoleKind {
    FeatureScout,
    CodeAuditor,
    IssueTriage,
    BranchManager,
    ProjectLifecycle,
}

impl GitRoleKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FeatureScout => "feature_scout",
            Self::CodeAuditor => "code_auditor",
            Self::IssueTriage => "issue_triage",
            Self::BranchManager => "branch_manager",
            Self::ProjectLifecycle => "project_lifecycle",
        }
    }
}

/// A single autonomous git role: `trigger_check` then `execute` (§4.9).
pub trait GitAgentRole: Send + Sync {
    fn kind(&self) -> GitRoleKind;
    fn trigger_check(&self, task: &Task, context: &RoleContext) -> bool;
    fn execute(&self, task: &Task, context: &RoleContext) -> ExitReport;
}

pub struct FeatureScoutRole;

impl GitAgentRole for FeatureScoutRole {
    fn kind(&self) -> GitRoleKind {
        GitRoleKind::FeatureScout
    }

    fn trigger_check(&self, task: &Task, context: &RoleContext) -> bool {
        task.has_intent(Intent::FeatureDiscovery) || context.periodic_feature_scan
    }

    fn execute(&self, task: &Task, context: &RoleContext) -> ExitReport {
        let mut warnings = Vec::new();
        if !context.hipporag_available {
            warnings.push("knowledge graph client not available, skipping code analysis".to_string());
        }
        ExitReport {
            task_id: task.id.clone(),
            status: HandoffStatus::Completed,
            files_touched: Vec::new(),
            branch: None,
            pr_url: None,
            remaining_work: vec!["review discovered feature proposals".to_string()],
            warnings,
        }
    }
}

pub struct CodeAuditorRole;

impl GitAgentRole for CodeAuditorRole {
    fn kind(&self) -> GitRoleKind {
        GitRoleKind::CodeAuditor
    }

    fn trigger_check(&self, task: &Task, context: &RoleContext) -> bool {
        task.has_intent(Intent::CodeAudit) || context.periodic_audit
    }

    fn execute(&self, task: &Task, context: &RoleContext) -> ExitReport {
        let mut warnings = Vec::new();
        if !context.hipporag_available {
            warnings.push("knowledge graph client not available, falling back to git status".to_string());
        }
        ExitReport {
            task_id: task.id.clone(),
            status: HandoffStatus::Completed,
            files_touched: task.input_files.clone(),
            branch: None,
            pr_url: None,
            remaining_work: Vec::new(),
            warnings,
        }
    }
}

pub struct IssueTriageRole;

impl GitAgentRole for IssueTriageRole {
    fn kind(&self) -> GitRoleKind {
        GitRoleKind::IssueTriage
    }

    fn trigger_check(&self, task: &Task, context: &RoleContext) -> bool {
        task.has_intent(Intent::IssueTriage) || context.new_issues_count > 0
    }

    fn execute(&self, task: &Task, context: &RoleContext) -> ExitReport {
        if !context.github_client_available {
            return ExitReport {
                task_id: task.id.clone(),
                status: HandoffStatus::Blocked,
                files_touched: Vec::new(),
                branch: None,
                pr_url: None,
                remaining_work: Vec::new(),
                warnings: vec!["github client not available".to_string()],
            };
        }
        ExitReport {
            task_id: task.id.clone(),
            status: HandoffStatus::Completed,
            files_touched: Vec::new(),
            branch: None,
            pr_url: None,
            remaining_work: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

pub struct BranchManagerRole;

impl GitAgentRole for BranchManagerRole {
    fn kind(&self) -> GitRoleKind {
        GitRoleKind::BranchManager
    }

    fn trigger_check(&self, _task: &Task, context: &RoleContext) -> bool {
        (context.pr_status.approved && context.pr_status.ci_passing)
            || context.stacked_pr_update_needed
    }

    fn execute(&self, task: &Task, context: &RoleContext) -> ExitReport {
        if !context.github_client_available {
            return ExitReport::failed(task.id.clone(), "github client not available");
        }
        let Some(pr_number) = context.pr_status.pr_number else {
            return ExitReport {
                task_id: task.id.clone(),
                status: HandoffStatus::Blocked,
                files_touched: Vec::new(),
                branch: None,
                pr_url: None,
                remaining_work: Vec::new(),
                warnings: vec!["no PR number provided".to_string()],
            };
        };
        ExitReport {
            task_id: task.id.clone(),
            status: HandoffStatus::Completed,
            files_touched: Vec::new(),
            branch: task.git_meta.branch_name.clone(),
            pr_url: Some(format!("pr://{pr_number}")),
            remaining_work: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

pub struct ProjectLifecycleRole;

impl GitAgentRole for ProjectLifecycleRole {
    fn kind(&self) -> GitRoleKind {
        GitRoleKind::ProjectLifecycle
    }

    fn trigger_check(&self, task: &Task, _context: &RoleContext) -> bool {
        task.has_intent(Intent::ProjectBootstrap)
            || matches!(
                task.task_kind.as_deref(),
                Some("project_update") | Some("project_archive")
            )
    }

    fn execute(&self, task: &Task, _context: &RoleContext) -> ExitReport {
        match task.task_kind.as_deref() {
            Some("project_update") | Some("project_archive") | None => ExitReport {
                task_id: task.id.clone(),
                status: HandoffStatus::Completed,
                files_touched: Vec::new(),
                branch: None,
                pr_url: None,
                remaining_work: Vec::new(),
                warnings: Vec::new(),
            },
            Some(other) => ExitReport {
                task_id: task.id.clone(),
                status: HandoffStatus::Blocked,
                files_touched: Vec::new(),
                branch: None,
                pr_url: None,
                remaining_work: Vec::new(),
                warnings: vec![format!("unknown project lifecycle type: {other}")],
            },
        }
    }
}
