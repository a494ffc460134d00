//! The §4.11 git workflow: role-triggered tasks delegate entirely to
//! the fixed five-role dispatcher (C9); everything else runs the
//! manual branch/commit/push/PR sequence directly against
//! `GitAdapter`/`GitHubAdapter`, drafting commit messages and pull
//! request text through the shared `LlmProvider` seam. Grounded on
//! `orchestrator_loop.py::_handle_git_workflow`.

use hippoforge_contracts::{AuthorSignature, ExitReport, Intent, Role, Task, TaskStatus};
use hippoforge_deliberation::LlmProvider;
use hippoforge_git_dispatch::{GitRoleDispatcher, RoleContext};
use tracing::instrument;

use crate::adapters::{GitAdapter, GitHubAdapter};

const COMMIT_PROMPT_TEMPLATE: &str =
    "Write a single-line, conventional-commit-style message for this task: {task}";
const PR_PROMPT_TEMPLATE: &str = "Draft a pull request for this task: {task}\n\
     Respond with the title on the first line and the body on the remaining lines.";

/// `_handle_git_workflow`'s role-trigger check: any of these four
/// intents hands the whole task off to the fixed role dispatcher
/// instead of running the manual commit/push/PR steps below.
pub fn is_role_triggered(task: &Task) -> bool {
    task.has_intent(Intent::FeatureDiscovery)
        || task.has_intent(Intent::CodeAudit)
        || task.has_intent(Intent::IssueTriage)
        || task.has_intent(Intent::ProjectBootstrap)
}

/// Runs the git workflow for one tick, returning the provenance entries
/// the caller should sign and append. Always invoked after the worker
/// flow, independent of which git intents ended up set this tick.
#[instrument(skip_all, fields(task_id = %task.id))]
pub async fn run_git_workflow(
    task: &mut Task,
    git: &dyn GitAdapter,
    github: &dyn GitHubAdapter,
    dispatcher: &GitRoleDispatcher,
    llm: &dyn LlmProvider,
    role_context: &RoleContext,
) -> Vec<AuthorSignature> {
    if !git.is_available() {
        task.push_feedback("git_workflow: no git repository available, skipping".to_string());
        return Vec::new();
    }

    if is_role_triggered(task) {
        let reports = dispatcher.dispatch(&*task, role_context).await;
        let mut signatures = Vec::with_capacity(reports.len());
        for (report, signature) in reports {
            task.push_feedback(describe_exit_report(&report));
            signatures.push(signature);
        }
        return signatures;
    }

    let mut signatures = Vec::new();

    maybe_create_branch(task, git).await;
    maybe_commit(task, git, llm, &mut signatures).await;
    maybe_push(task, git).await;
    maybe_open_pull_request(task, github, llm, &mut signatures).await;

    signatures
}

async fn maybe_create_branch(task: &mut Task, git: &dyn GitAdapter) {
    let Some(branch_name) = task.git_meta.branch_name.clone() else {
        return;
    };
    let already_branched = task.feedback_log.iter().any(|line| line.contains(&branch_name));
    if already_branched {
        return;
    }
    match git.create_branch(&branch_name, task.git_meta.base_branch.as_deref()).await {
        Ok(()) => task.push_feedback(format!("git_workflow: created branch {branch_name}")),
        Err(e) => task.push_feedback(format!("git_workflow: failed to create branch {branch_name}: {e}")),
    }
}

async fn maybe_commit(
    task: &mut Task,
    git: &dyn GitAdapter,
    llm: &dyn LlmProvider,
    signatures: &mut Vec<AuthorSignature>,
) {
    if !task.has_intent(Intent::GitCommit) {
        return;
    }
    match git.has_changes().await {
        Ok(false) => task.push_feedback("git_workflow: git_commit requested but no changes are staged".to_string()),
        Err(e) => task.push_feedback(format!("git_workflow: failed to check for changes: {e}")),
        Ok(true) => {
            let prompt = COMMIT_PROMPT_TEMPLATE.replace("{task}", &task.description);
            let message = match llm.generate(&prompt, 0.3, 200).await {
                Ok(text) => text.trim().to_string(),
                Err(e) => {
                    task.push_feedback(format!("git_workflow: commit message draft failed: {e}"));
                    format!("Automated commit for {}", task.id)
                }
            };

            if let Err(e) = git.run_tool("git_add", &serde_json::json!({"files": "."})).await {
                task.push_feedback(format!("git_error: {e}"));
                signatures.push(AuthorSignature::new("git-workflow", Role::GitWriter, "git_error"));
                return;
            }

            match git.run_tool("git_commit", &serde_json::json!({"message": message})).await {
                Ok(_) => {
                    task.push_feedback(format!("git_workflow: committed with message \"{message}\""));
                    signatures.push(AuthorSignature::new("git-workflow", Role::GitWriter, "git_commit"));
                }
                Err(e) => {
                    task.push_feedback(format!("git_error: {e}"));
                    signatures.push(AuthorSignature::new("git-workflow", Role::GitWriter, "git_error"));
                }
            }
        }
    }
}

async fn maybe_push(task: &mut Task, git: &dyn GitAdapter) {
    if !(task.git_meta.auto_push || task.has_intent(Intent::GitPullRequest)) {
        return;
    }
    let Some(branch_name) = task.git_meta.branch_name.clone() else {
        return;
    };
    match git.has_changes().await {
        Ok(true) => task.push_feedback("git_workflow: deferring push, uncommitted changes remain".to_string()),
        Err(e) => task.push_feedback(format!("git_workflow: failed to check for changes before push: {e}")),
        Ok(false) => match git.push("origin", &branch_name).await {
            Ok(()) => task.push_feedback(format!("git_workflow: pushed {branch_name}")),
            Err(e) => task.push_feedback(format!("git_workflow: push failed: {e}")),
        },
    }
}

async fn maybe_open_pull_request(
    task: &mut Task,
    github: &dyn GitHubAdapter,
    llm: &dyn LlmProvider,
    signatures: &mut Vec<AuthorSignature>,
) {
    let wants_pr = task.has_intent(Intent::GitPullRequest)
        || (task.status == TaskStatus::Completed && task.git_meta.branch_name.is_some());
    if !wants_pr {
        return;
    }

    if !github.is_ready() {
        task.push_feedback("git_workflow: pull request requested but no GitHub adapter is configured".to_string());
        return;
    }

    let Some(branch_name) = task.git_meta.branch_name.clone() else {
        task.push_feedback("git_workflow: pull request requested but no branch is set".to_string());
        return;
    };
    let base = task.git_meta.base_branch.clone().unwrap_or_else(|| "main".to_string());

    let prompt = PR_PROMPT_TEMPLATE.replace("{task}", &task.description);
    let drafted = match llm.generate(&prompt, 0.3, 400).await {
        Ok(text) => text,
        Err(e) => {
            task.push_feedback(format!("git_workflow: pull request draft failed: {e}"));
            return;
        }
    };
    let mut lines = drafted.splitn(2, '\n');
    let title = lines.next().unwrap_or(&task.description).trim().to_string();
    let body = lines.next().unwrap_or("").trim().to_string();

    match github.create_pull_request(&branch_name, &base, &title, &body).await {
        Ok(url) => {
            task.push_feedback(format!("git_workflow: opened pull request {url}"));
            signatures.push(
                AuthorSignature::new("git-workflow", Role::GitWriter, "pull_request_created").with_artifact(url),
            );
        }
        Err(e) => task.push_feedback(format!("git_workflow: pull request creation failed: {e}")),
    }
}

fn describe_exit_report(report: &ExitReport) -> String {
    format!("git_role: task {} -> {:?}", report.task_id, report.status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hippoforge_contracts::HandoffStatus;

    struct NoopGit;

    #[async_trait]
    impl GitAdapter for NoopGit {
        fn is_available(&self) -> bool {
            false
        }
        fn remote_url(&self) -> Option<String> {
            None
        }
        async fn has_changes(&self) -> anyhow::Result<bool> {
            Ok(false)
        }
        async fn create_branch(&self, _name: &str, _base: Option<&str>) -> anyhow::Result<()> {
            Ok(())
        }
        async fn run_tool(&self, _tool: &str, _args: &serde_json::Value) -> anyhow::Result<String> {
            Ok(String::new())
        }
        async fn push(&self, _remote: &str, _branch: &str) -> anyhow::Result<()> {
            Ok(())
        }
    }

    struct NoopGithub;

    #[async_trait]
    impl GitHubAdapter for NoopGithub {
        fn is_ready(&self) -> bool {
            false
        }
        async fn create_pull_request(
            &self,
            _branch: &str,
            _base: &str,
            _title: &str,
            _body: &str,
        ) -> anyhow::Result<String> {
            anyhow::bail!("not ready")
        }
        async fn create_issue(&self, _title: &str, _body: &str) -> anyhow::Result<String> {
            anyhow::bail!("not ready")
        }
    }

    struct NoopLlm;

    #[async_trait]
    impl LlmProvider for NoopLlm {
        async fn generate(&self, _prompt: &str, _temperature: f64, _max_tokens: usize) -> anyhow::Result<String> {
            Ok("title\nbody".to_string())
        }
    }

    #[tokio::test]
    async fn unavailable_git_short_circuits_with_feedback() {
        let mut task = Task::new("t1".to_string(), "do the thing".to_string());
        let db_path = std::env::temp_dir().join(format!(
            "hippoforge-kernel-test-{}-{}.db",
            std::process::id(),
            uuid::Uuid::new_v4()
        ));
        let health = std::sync::Arc::new(hippoforge_health_monitor::SelfHealingMonitor::new(
            hippoforge_telemetry::TelemetryLedger::new(
                hippoforge_database::SqliteStore::open(&db_path).await.unwrap(),
            ),
        ));
        let dispatcher = GitRoleDispatcher::new(health);
        let signatures = run_git_workflow(
            &mut task,
            &NoopGit,
            &NoopGithub,
            &dispatcher,
            &NoopLlm,
            &RoleContext::default(),
        )
        .await;
        assert!(signatures.is_empty());
        assert!(task.feedback_log.iter().any(|line| line.contains("no git repository")));
    }

    #[test]
    fn role_triggered_matches_the_four_workflow_intents() {
        let mut task = Task::new("t1".to_string(), "scan".to_string());
        assert!(!is_role_triggered(&task));
        task.set_intent(Intent::FeatureDiscovery, true);
        assert!(is_role_triggered(&task));
    }

    #[test]
    fn exit_report_description_includes_status() {
        let report = ExitReport::skipped("t1", "circuit breaker tripped");
        let description = describe_exit_report(&report);
        assert!(description.contains("Skipped") || description.contains(&format!("{:?}", HandoffStatus::Skipped)));
    }
}
