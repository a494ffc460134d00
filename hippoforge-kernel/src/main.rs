//! Process entry point (§2/§6): loads configuration, wires every
//! component behind a `Kernel`, runs the startup maintenance phase, then
//! drives one orchestration pass over the default session before
//! reconciling the Markdown plan and exiting with the mapped exit code.
//! Grounded on `orchestrator_loop.py`'s `main()`/`orchestrate()` entry
//! plus the teacher's binary-crate `tracing-subscriber` init convention.

use std::path::PathBuf;
use std::sync::Arc;

use hippoforge_blackboard::{BlackboardStore, SqlBackend};
use hippoforge_config::SwarmConfig;
use hippoforge_council::DebateEngine;
use hippoforge_context_pruner::ContextPruner;
use hippoforge_database::SqliteStore;
use hippoforge_deliberation::NullVerifier;
use hippoforge_fault_localizer::SubprocessCollector;
use hippoforge_git_dispatch::GitRoleDispatcher;
use hippoforge_health_monitor::SelfHealingMonitor;
use hippoforge_kernel::{
    AgentProviderLlmAdapter, HttpAgentProvider, HttpGitHubAdapter, Kernel, KernelDeps,
    MockAgentProvider, NullGitHubAdapter, SubprocessGitAdapter, run_startup_checks,
};
use hippoforge_knowledge_graph::KnowledgeGraph;
use hippoforge_parsers::ParserRegistry;
use hippoforge_security::{InstallId, SignedProvenanceChain};
use hippoforge_telemetry::TelemetryLedger;
use parking_lot::Mutex;
use tracing::{error, info, warn};

const DEFAULT_SESSION_ID: &str = "default";
const PROVENANCE_SIGNING_KEY_ENV: &str = "SWARM_PROVENANCE_KEY";
const LLM_ENDPOINT_ENV: &str = "SWARM_LLM_ENDPOINT";

/// §6's exit-code mapping: 0 success, 1 failure, 100 restart-requested.
#[repr(i32)]
enum ExitCode {
    Success = 0,
    Failure = 1,
    RestartRequested = 100,
}

#[tokio::main]
async fn main() {
    let code = run().await;
    std::process::exit(code as i32);
}

async fn run() -> ExitCode {
    let config = match SwarmConfig::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("failed to load configuration: {e}");
            return ExitCode::Failure;
        }
    };

    init_tracing(&config);

    let blackboard_root = PathBuf::from(&config.blackboard_root);
    let telemetry_db_path = blackboard_root.join("telemetry.sqlite3");
    let plan_path = blackboard_root.join("docs").join("ai").join("PLAN.md");

    let sqlite_store = match SqliteStore::open(&telemetry_db_path).await {
        Ok(store) => store,
        Err(e) => {
            error!(error = %e, "failed to open telemetry store");
            return ExitCode::Failure;
        }
    };
    let telemetry = TelemetryLedger::new(sqlite_store);

    if let Err(e) = run_startup_checks(&blackboard_root, &telemetry, 30).await {
        if config.strict_tools {
            error!(error = %e, "startup checks failed, strict_tools is set, aborting");
            return ExitCode::Failure;
        }
        warn!(error = %e, "startup checks failed, continuing in degraded mode");
    }

    let sql_backend = if let Some(url) = &config.postgres_url {
        match SqlBackend::connect(url).await {
            Ok(backend) => Some(backend),
            Err(e) => {
                warn!(error = %e, "postgres session store unreachable, falling back to file backend only");
                None
            }
        }
    } else {
        None
    };

    let blackboard = BlackboardStore::new(blackboard_root.clone(), sql_backend, &config.default_worker_model);

    let install_id = config
        .install_id
        .clone()
        .map(InstallId::from_raw)
        .or_else(|| InstallId::resolve(&blackboard_root.join(".install_id")).ok())
        .unwrap_or_else(|| InstallId::from_raw("unknown"));
    info!(install_id = install_id.as_str(), "install identity resolved");

    let health = Arc::new(SelfHealingMonitor::new(telemetry.clone()));
    let git_dispatcher = GitRoleDispatcher::new(health.clone());
    let pruner = ContextPruner::new(None);
    let debate_engine = DebateEngine::new(5);

    let knowledge_graph = if config.lite_mode {
        info!("SWARM_LITE_MODE set, skipping knowledge-graph construction");
        None
    } else {
        Some(load_or_build_graph(&blackboard_root, config.lite_mode))
    };

    let agent_provider: Arc<dyn hippoforge_kernel::AgentProvider> = match std::env::var(LLM_ENDPOINT_ENV) {
        Ok(endpoint) => Arc::new(HttpAgentProvider::new(endpoint)),
        Err(_) => {
            warn!("{LLM_ENDPOINT_ENV} not set, using a mock agent provider");
            Arc::new(MockAgentProvider::always_success("no LLM endpoint configured"))
        }
    };
    let llm = Box::new(AgentProviderLlmAdapter::new(agent_provider.clone()));

    let git: Box<dyn hippoforge_kernel::GitAdapter> = Box::new(SubprocessGitAdapter::new("."));
    let github: Box<dyn hippoforge_kernel::GitHubAdapter> = match &config.github_token {
        Some(token) => Box::new(HttpGitHubAdapter::new(token.clone(), repo_slug())),
        None => Box::new(NullGitHubAdapter),
    };

    let signing_key = std::env::var(PROVENANCE_SIGNING_KEY_ENV)
        .unwrap_or_else(|_| format!("hipporag-dev-key-{}", install_id.as_str()));
    let security_chain = Mutex::new(SignedProvenanceChain::new(signing_key.into_bytes()));

    let deps = KernelDeps {
        blackboard,
        telemetry,
        health,
        git_dispatcher,
        pruner,
        debate_engine,
        verifier: Box::new(NullVerifier),
        llm,
        coverage_collector: Box::new(SubprocessCollector),
        knowledge_graph,
        git,
        github,
        agent_provider,
        security_chain,
        agent_id: format!("kernel-{}", install_id.as_str()),
        config,
        repo_root: ".".to_string(),
        test_command: std::env::var("SWARM_TEST_COMMAND").unwrap_or_else(|_| "true".to_string()),
        plan_path,
    };

    let kernel = Kernel::new(deps);

    match kernel.run_once(DEFAULT_SESSION_ID).await {
        Ok(hippoforge_kernel::RunOutcome::Completed) => ExitCode::Success,
        Ok(hippoforge_kernel::RunOutcome::RestartRequested) => {
            warn!("profile requires migration, requesting restart");
            ExitCode::RestartRequested
        }
        Err(e) => {
            error!(error = %e, "orchestration tick failed");
            ExitCode::Failure
        }
    }
}

fn init_tracing(config: &SwarmConfig) {
    use tracing_subscriber::EnvFilter;

    let default_level = if config.debug {
        "debug"
    } else if config.verbose_telemetry || config.trace_prompts {
        "info,hippoforge_telemetry=debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn repo_slug() -> String {
    std::env::var("SWARM_GITHUB_REPO").unwrap_or_else(|_| "unknown/unknown".to_string())
}

/// Builds the knowledge graph from the current directory, falling back
/// to an empty graph on any parse/build failure so a missing source
/// tree never blocks startup (§4.4's "graph not built" error is raised
/// only by `retrieve_context`, never by construction itself).
fn load_or_build_graph(blackboard_root: &std::path::Path, lite_mode: bool) -> KnowledgeGraph {
    let cache_path = blackboard_root.join(".hipporag_cache");
    if let Ok(graph) = hippoforge_knowledge_graph::load_cache(&cache_path) {
        info!("loaded knowledge-graph cache");
        return graph;
    }

    info!("building knowledge graph from source tree");
    let registry = ParserRegistry::new(lite_mode);
    let graph = hippoforge_knowledge_graph::build_graph_from_ast(std::path::Path::new("."), &registry);
    if let Err(e) = hippoforge_knowledge_graph::save_cache(&cache_path, &graph) {
        warn!(error = ?e, "failed to persist knowledge-graph cache");
    }
    graph
}
