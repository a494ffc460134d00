//! C10: the orchestrator kernel, grounded on `orchestrator_loop.py::Orchestrator`.
//! Ties every other component together behind a single `Kernel::process_task`
//! tick, implements the §4.11 git workflow, and exposes the process `main`
//! wiring (startup checks, exit codes, tracing init) in `main.rs`.

mod adapters;
mod context_window;
mod dispatch;
mod git_workflow;
mod kernel;
mod startup;
mod worker;

pub use adapters::{
    AgentProvider, AgentProviderLlmAdapter, AgentResponse, AgentResponseStatus, GitAdapter,
    GitHubAdapter, HttpAgentProvider, HttpGitHubAdapter, MockAgentProvider, NullGitHubAdapter,
    SubprocessGitAdapter, ToolCall,
};
pub use hippoforge_deliberation::{NullVerifier, VerifyOutcome, Verifier};
pub use kernel::{Kernel, KernelDeps, RunOutcome};
pub use startup::run_startup_checks;
