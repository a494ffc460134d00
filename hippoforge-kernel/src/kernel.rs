//! C10: the orchestrator kernel's tick loop, grounded on
//! `orchestrator_loop.py::Orchestrator.process_task` and its outer
//! `orchestrate()` poll loop. `process_task` is the single entry point
//! every other component is wired behind; `run_once`/`run_forever`
//! drive it across a session's pending tasks.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use hippoforge_blackboard::BlackboardStore;
use hippoforge_config::SwarmConfig;
use hippoforge_contracts::{
    AuthorSignature, Intent, OrchestratorError, OrchestratorResult, ProjectProfile, Role, Task, TaskStatus,
};
use hippoforge_council::DebateEngine;
use hippoforge_context_pruner::ContextPruner;
use hippoforge_deliberation::{LlmProvider, Verifier};
use hippoforge_fault_localizer::CoverageCollector;
use hippoforge_git_dispatch::{GitRoleDispatcher, RoleContext};
use hippoforge_health_monitor::SelfHealingMonitor;
use hippoforge_knowledge_graph::KnowledgeGraph;
use hippoforge_plan_bridge::{parse_file, sync_inbound, sync_outbound};
use hippoforge_security::SignedProvenanceChain;
use hippoforge_telemetry::TelemetryLedger;
use parking_lot::Mutex;
use tracing::{info, instrument, warn};

use crate::adapters::{AgentProvider, AgentResponseStatus, GitAdapter, GitHubAdapter};
use crate::context_window::build_context_window;
use crate::dispatch::{run_algorithm_dispatch, DispatchDeps};
use crate::git_workflow::run_git_workflow;
use crate::worker::{parse_handoff, render_worker_prompt, role_for_worker, select_worker};

/// Every dependency `Kernel` needs to drive a tick, wired once at
/// process start in `main.rs`.
pub struct KernelDeps {
    pub blackboard: BlackboardStore,
    pub telemetry: TelemetryLedger,
    pub health: Arc<SelfHealingMonitor>,
    pub git_dispatcher: GitRoleDispatcher,
    pub pruner: ContextPruner,
    pub debate_engine: DebateEngine,
    pub verifier: Box<dyn Verifier>,
    pub llm: Box<dyn LlmProvider>,
    pub coverage_collector: Box<dyn CoverageCollector>,
    pub knowledge_graph: Option<KnowledgeGraph>,
    pub git: Box<dyn GitAdapter>,
    pub github: Box<dyn GitHubAdapter>,
    pub agent_provider: Arc<dyn AgentProvider>,
    pub security_chain: Mutex<SignedProvenanceChain>,
    pub agent_id: String,
    pub config: SwarmConfig,
    pub repo_root: String,
    pub test_command: String,
    pub plan_path: PathBuf,
}

/// The outer loop's terminal outcome (§2's exit-code mapping):
/// `Completed` maps to 0, `RestartRequested` (a profile that needs
/// schema migration) maps to 100 so a supervising process can restart
/// the kernel against a migrated profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    RestartRequested,
}

pub struct Kernel {
    deps: KernelDeps,
}

impl Kernel {
    pub fn new(deps: KernelDeps) -> Self {
        Self { deps }
    }

    fn sign(&self, entry: &mut AuthorSignature) -> OrchestratorResult<()> {
        self.deps
            .security_chain
            .lock()
            .sign(entry)
            .map_err(|e| OrchestratorError::contract(format!("failed to sign provenance entry: {e}")))
    }

    /// The single per-task tick: loop-guard check, provenance pruning,
    /// health-aware context assembly, algorithm dispatch, the classical
    /// worker flow, then the git workflow — always run last and
    /// unconditionally, matching `_handle_git_workflow`'s own internal
    /// branching rather than being gated by a dispatch intent.
    #[instrument(skip(self, profile), fields(task_id = %task_id))]
    pub async fn process_task(&self, profile: &mut ProjectProfile, task_id: &str) -> OrchestratorResult<()> {
        let Some(task) = profile.tasks.get(task_id).cloned() else {
            return Err(OrchestratorError::contract(format!("task {task_id} not found")));
        };
        let mut task = task;

        if task.exceeds_loop_guard() {
            task.status = TaskStatus::Failed;
            task.push_feedback("loop guard tripped: feedback log exceeded 20 entries, forcing failure".to_string());
            profile.tasks.insert(task.id.clone(), task);
            return Ok(());
        }

        profile.provenance_log = self
            .deps
            .pruner
            .prune(&profile.provenance_log, &task.description, 10, 20)
            .await;

        let health = self.deps.health.check_health(&[]).await;
        let context_window = build_context_window(&profile.provenance_log, &health);

        let dispatch_deps = DispatchDeps {
            graph: self.deps.knowledge_graph.as_ref(),
            debate_engine: &self.deps.debate_engine,
            verifier: self.deps.verifier.as_ref(),
            coverage_collector: self.deps.coverage_collector.as_ref(),
            sbfl_enabled: self.deps.config.sbfl_enabled,
            test_command: &self.deps.test_command,
            repo_root: &self.deps.repo_root,
        };
        run_algorithm_dispatch(&mut task, &dispatch_deps).await;

        self.run_worker_flow(profile, &mut task, &context_window).await?;

        let role_context = RoleContext::new(profile.active_context.clone());
        let git_signatures = run_git_workflow(
            &mut task,
            self.deps.git.as_ref(),
            self.deps.github.as_ref(),
            &self.deps.git_dispatcher,
            self.deps.llm.as_ref(),
            &role_context,
        )
        .await;
        for mut signature in git_signatures {
            self.sign(&mut signature)?;
            profile.provenance_log.push(signature);
        }

        profile.tasks.insert(task.id.clone(), task);
        Ok(())
    }

    async fn run_worker_flow(
        &self,
        profile: &mut ProjectProfile,
        task: &mut Task,
        context_window: &crate::context_window::ContextWindow,
    ) -> OrchestratorResult<()> {
        let worker = select_worker(task);
        let prompt = render_worker_prompt(task, &worker, context_window);
        let model_alias = profile
            .worker_models
            .get(&worker)
            .or_else(|| profile.worker_models.get("default"))
            .cloned()
            .unwrap_or_else(|| self.deps.config.default_worker_model.clone());

        task.status = TaskStatus::InProgress;

        match self.deps.agent_provider.dispatch(&prompt, &model_alias).await {
            Ok(response) => self.handle_agent_response(profile, task, &worker, response).await?,
            Err(e) => {
                task.status = TaskStatus::Pending;
                task.push_feedback(format!("worker dispatch failed: {e}"));
            }
        }

        Ok(())
    }

    async fn handle_agent_response(
        &self,
        profile: &mut ProjectProfile,
        task: &mut Task,
        worker: &str,
        response: crate::adapters::AgentResponse,
    ) -> OrchestratorResult<()> {
        match response.status {
            AgentResponseStatus::Success => {
                if let Some((role, description)) = parse_handoff(&response.reasoning_trace) {
                    let mut follow_up = Task::new(format!("{}-{}", task.id, uuid::Uuid::new_v4()), description);
                    follow_up.assigned_worker = Some(role);
                    profile.tasks.insert(follow_up.id.clone(), follow_up);
                }

                task.status = TaskStatus::Completed;
                let mut signature =
                    AuthorSignature::new(&self.deps.agent_id, role_for_worker(worker), "task_completed");
                self.sign(&mut signature)?;
                profile.provenance_log.push(signature);

                let has_changes = self.deps.git.has_changes().await.unwrap_or(false);
                if self.deps.config.strict_git && has_changes {
                    task.status = TaskStatus::Pending;
                    task.set_intent(Intent::GitCommit, true);
                    task.git_meta.branch_name.get_or_insert_with(|| "auto/cleanup".to_string());
                    task.push_feedback(
                        "strict_git: completed with uncommitted changes, reverting to pending for a commit pass"
                            .to_string(),
                    );
                } else if has_changes {
                    task.push_feedback(
                        "tip: the workspace has uncommitted changes; consider a git_commit_ready task".to_string(),
                    );
                }
            }
            AgentResponseStatus::Failed => {
                task.status = TaskStatus::Failed;
                task.push_feedback(response.reasoning_trace);
            }
            AgentResponseStatus::NeedsClarification | AgentResponseStatus::Pending => {
                task.status = TaskStatus::Pending;
                task.push_feedback(response.reasoning_trace);
            }
        }
        Ok(())
    }

    /// §4.12: merges the human-edited Markdown plan into the blackboard
    /// before a tick processes pending tasks. A missing plan file is not
    /// an error — the bridge simply has nothing to merge on this tick.
    async fn sync_plan_inbound(&self, profile: &mut ProjectProfile) {
        let Ok(content) = tokio::fs::read_to_string(&self.deps.plan_path).await else {
            return;
        };
        sync_inbound(profile, &content);
    }

    /// §4.10 step 7: regenerates the plan file from the saved profile,
    /// threading the previously parsed document back in so free text
    /// between sections survives the round-trip (§4.12).
    async fn sync_plan_outbound(&self, profile: &ProjectProfile) {
        let previous = tokio::fs::read_to_string(&self.deps.plan_path)
            .await
            .ok()
            .map(|content| parse_file(&content));
        let rendered = sync_outbound(profile, previous.as_ref());

        if let Some(parent) = self.deps.plan_path.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                warn!(error = %e, "failed to prepare plan directory");
                return;
            }
        }
        if let Err(e) = tokio::fs::write(&self.deps.plan_path, rendered).await {
            warn!(error = %e, "failed to write plan file");
        }
    }

    /// Loads the profile, rejects it for restart if it needs migration,
    /// reconciles the Markdown plan inbound, processes every pending
    /// task once, saves, then reconciles the plan outbound.
    #[instrument(skip(self))]
    pub async fn run_once(&self, session_id: &str) -> OrchestratorResult<RunOutcome> {
        let mut profile = self.deps.blackboard.load(session_id).await?;
        if profile.needs_migration() {
            warn!(session_id, "profile requires migration, requesting restart");
            return Ok(RunOutcome::RestartRequested);
        }

        self.sync_plan_inbound(&mut profile).await;

        let pending: Vec<String> = profile
            .tasks
            .values()
            .filter(|t| t.status == TaskStatus::Pending)
            .map(|t| t.id.clone())
            .collect();

        for task_id in pending {
            self.process_task(&mut profile, &task_id).await?;
        }

        self.deps.blackboard.save(session_id, &profile, &self.deps.agent_id).await?;
        self.sync_plan_outbound(&profile).await;
        Ok(RunOutcome::Completed)
    }

    /// `orchestrate()`'s poll loop: repeatedly load, process pending
    /// tasks, save, and sleep when idle. Returns only on migration
    /// request or a propagating error.
    pub async fn run_forever(&self, session_id: &str, poll_interval: Duration) -> OrchestratorResult<RunOutcome> {
        loop {
            let mut profile = self.deps.blackboard.load(session_id).await?;
            if profile.needs_migration() {
                warn!(session_id, "profile requires migration, requesting restart");
                return Ok(RunOutcome::RestartRequested);
            }

            self.sync_plan_inbound(&mut profile).await;

            let pending: Vec<String> = profile
                .tasks
                .values()
                .filter(|t| t.status == TaskStatus::Pending)
                .map(|t| t.id.clone())
                .collect();

            if pending.is_empty() {
                tokio::time::sleep(poll_interval).await;
                continue;
            }

            for task_id in pending {
                self.process_task(&mut profile, &task_id).await?;
            }

            self.deps.blackboard.save(session_id, &profile, &self.deps.agent_id).await?;
            self.sync_plan_outbound(&profile).await;
            info!(session_id, "tick complete");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hippoforge_contracts::TaskStatus;
    use hippoforge_database::SqliteStore;
    use hippoforge_deliberation::NullVerifier;
    use hippoforge_fault_localizer::SubprocessCollector;

    struct AlwaysSuccessProvider;

    #[async_trait]
    impl AgentProvider for AlwaysSuccessProvider {
        async fn dispatch(&self, _prompt: &str, _model_alias: &str) -> anyhow::Result<crate::adapters::AgentResponse> {
            Ok(crate::adapters::AgentResponse::success("all done"))
        }
    }

    struct NoopLlm;

    #[async_trait]
    impl LlmProvider for NoopLlm {
        async fn generate(&self, _prompt: &str, _temperature: f64, _max_tokens: usize) -> anyhow::Result<String> {
            Ok("noop".to_string())
        }
    }

    struct NoChangesGit;

    #[async_trait]
    impl GitAdapter for NoChangesGit {
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

    async fn test_kernel(agent_provider: Arc<dyn AgentProvider>) -> Kernel {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("telemetry.db");
        let store = SqliteStore::open(&db_path).await.unwrap();
        let health = Arc::new(SelfHealingMonitor::new(TelemetryLedger::new(store.clone())));
        let deps = KernelDeps {
            blackboard: BlackboardStore::new(tmp.path().join("blackboard"), None, "default"),
            telemetry: TelemetryLedger::new(store),
            health: health.clone(),
            git_dispatcher: GitRoleDispatcher::new(health),
            pruner: ContextPruner::new(None),
            debate_engine: DebateEngine::new(5),
            verifier: Box::new(NullVerifier),
            llm: Box::new(NoopLlm),
            coverage_collector: Box::new(SubprocessCollector),
            knowledge_graph: None,
            git: Box::new(NoChangesGit),
            github: Box::new(NoopGithub),
            agent_provider,
            security_chain: Mutex::new(SignedProvenanceChain::new(b"test-key".to_vec())),
            agent_id: "kernel-test".to_string(),
            config: SwarmConfig::default(),
            repo_root: ".".to_string(),
            test_command: "true".to_string(),
            plan_path: tmp.path().join("PROJECT_PLAN.md"),
        };
        Kernel::new(deps)
    }

    #[tokio::test]
    async fn a_successful_dispatch_completes_the_task() {
        let kernel = test_kernel(Arc::new(AlwaysSuccessProvider)).await;
        let mut profile = ProjectProfile::fresh("default");
        let task = Task::new("t1".to_string(), "write the docs".to_string());
        profile.tasks.insert(task.id.clone(), task);

        kernel.process_task(&mut profile, "t1").await.unwrap();
        assert_eq!(profile.tasks["t1"].status, TaskStatus::Completed);
    }

    #[tokio::test]
    async fn the_loop_guard_forces_failure_without_dispatching() {
        let kernel = test_kernel(Arc::new(AlwaysSuccessProvider)).await;
        let mut profile = ProjectProfile::fresh("default");
        let mut task = Task::new("t1".to_string(), "stuck task".to_string());
        for i in 0..21 {
            task.push_feedback(format!("attempt {i}"));
        }
        profile.tasks.insert(task.id.clone(), task);

        kernel.process_task(&mut profile, "t1").await.unwrap();
        assert_eq!(profile.tasks["t1"].status, TaskStatus::Failed);
    }

    #[tokio::test]
    async fn run_once_merges_the_plan_inbound_and_regenerates_it_outbound() {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("telemetry.db");
        let store = SqliteStore::open(&db_path).await.unwrap();
        let health = Arc::new(SelfHealingMonitor::new(TelemetryLedger::new(store.clone())));
        let plan_path = tmp.path().join("docs").join("ai").join("PLAN.md");
        tokio::fs::create_dir_all(plan_path.parent().unwrap()).await.unwrap();
        tokio::fs::write(&plan_path, "# Plan\n\n## Todo\n- [ ] write the docs @engineer\n")
            .await
            .unwrap();

        let deps = KernelDeps {
            blackboard: BlackboardStore::new(tmp.path().join("blackboard"), None, "default"),
            telemetry: TelemetryLedger::new(store),
            health: health.clone(),
            git_dispatcher: GitRoleDispatcher::new(health),
            pruner: ContextPruner::new(None),
            debate_engine: DebateEngine::new(5),
            verifier: Box::new(NullVerifier),
            llm: Box::new(NoopLlm),
            coverage_collector: Box::new(SubprocessCollector),
            knowledge_graph: None,
            git: Box::new(NoChangesGit),
            github: Box::new(NoopGithub),
            agent_provider: Arc::new(AlwaysSuccessProvider),
            security_chain: Mutex::new(SignedProvenanceChain::new(b"test-key".to_vec())),
            agent_id: "kernel-test".to_string(),
            config: SwarmConfig::default(),
            repo_root: ".".to_string(),
            test_command: "true".to_string(),
            plan_path: plan_path.clone(),
        };
        let kernel = Kernel::new(deps);

        let outcome = kernel.run_once("default").await.unwrap();
        assert_eq!(outcome, RunOutcome::Completed);

        let rendered = tokio::fs::read_to_string(&plan_path).await.unwrap();
        assert!(rendered.contains("write the docs"));
        assert!(rendered.contains("## Completed"));
    }
}
