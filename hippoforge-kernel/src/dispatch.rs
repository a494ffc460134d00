//! The algorithm-dispatch step of the classical flow (§4.10 step 3),
//! grounded on `orchestrator_loop.py::process_task`'s per-intent
//! handler chain (`_handle_context_retrieval`, `_handle_consensus`,
//! `_handle_debate`, `_handle_verification`, `_handle_fault_localization`).
//! Git-related intents are deliberately skipped here: the source keeps
//! the git workflow as its own unconditional step rather than gating it
//! behind `Intent::DISPATCH_ORDER`, and `git_workflow.rs` mirrors that.

use hippoforge_contracts::{Intent, Task};
use hippoforge_council::{DebateEngine, Topology};
use hippoforge_deliberation::Verifier;
use hippoforge_fault_localizer::{run_full_sbfl_analysis, CoverageCollector};
use hippoforge_knowledge_graph::KnowledgeGraph;

pub struct DispatchDeps<'a> {
    pub graph: Option<&'a KnowledgeGraph>,
    pub debate_engine: &'a DebateEngine,
    pub verifier: &'a dyn Verifier,
    pub coverage_collector: &'a dyn CoverageCollector,
    pub sbfl_enabled: bool,
    pub test_command: &'a str,
    pub repo_root: &'a str,
}

/// Walks `Intent::DISPATCH_ORDER`, running the handler for each intent
/// the task carries and appending its result to the feedback log.
/// Git intents (`GitCommit`, `GitPullRequest`) are handled entirely by
/// `git_workflow::run_git_workflow`, not here.
pub async fn run_algorithm_dispatch(task: &mut Task, deps: &DispatchDeps<'_>) {
    for intent in Intent::DISPATCH_ORDER {
        if !task.has_intent(*intent) {
            continue;
        }
        let note = match intent {
            Intent::Context => handle_context(task, deps),
            Intent::Consensus => handle_consensus(),
            Intent::Debate => handle_debate(task, deps).await,
            Intent::Verification => handle_verification(task, deps),
            Intent::TestsFailing => handle_tests_failing(deps).await,
            Intent::GitCommit | Intent::GitPullRequest => continue,
            _ => continue,
        };
        task.push_feedback(note);
    }
}

fn handle_context(task: &Task, deps: &DispatchDeps<'_>) -> String {
    let Some(graph) = deps.graph else {
        return "context: no knowledge graph available".to_string();
    };
    let chunks = graph.retrieve_context(&task.description, 5, 0.85);
    if chunks.is_empty() {
        return "context: no relevant nodes found".to_string();
    }
    let preview: Vec<String> = chunks
        .iter()
        .take(3)
        .map(|chunk| format!("{}::{}", chunk.file_path, chunk.node_name))
        .collect();
    if chunks.len() > 3 {
        format!(
            "context: found {} relevant nodes ({}, ...and {} more)",
            chunks.len(),
            preview.join(", "),
            chunks.len() - 3
        )
    } else {
        format!("context: found {} relevant nodes ({})", chunks.len(), preview.join(", "))
    }
}

fn handle_consensus() -> String {
    "consensus requested, awaiting agent votes".to_string()
}

async fn handle_debate(task: &Task, deps: &DispatchDeps<'_>) -> String {
    let agents = vec!["agent-a".to_string(), "agent-b".to_string(), "agent-c".to_string()];
    match deps.debate_engine.start_debate(task.id.clone(), agents, Topology::Ring).await {
        Ok(_) => "debate started with 3 agents over a ring topology".to_string(),
        Err(e) => format!("debate: failed to start ({e})"),
    }
}

fn handle_verification(task: &Task, deps: &DispatchDeps<'_>) -> String {
    let outcome = deps.verifier.verify(&task.description);
    format!("verification: {outcome:?}")
}

async fn handle_tests_failing(deps: &DispatchDeps<'_>) -> String {
    if !deps.sbfl_enabled {
        return "fault localization skipped: sbfl disabled".to_string();
    }
    match run_full_sbfl_analysis(deps.coverage_collector, deps.test_command, deps.repo_root, 10).await {
        Ok(report) => report,
        Err(e) => format!("fault localization failed: {e}"),
    }
}
