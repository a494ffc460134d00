//! Named external-collaborator interfaces from §6 that the kernel calls
//! into but does not implement as real network clients: the LLM
//! provider's `AgentResponse` contract (plus its JSON-repair layer), the
//! git subprocess adapter, and the GitHub adapter. Grounded on
//! `llm.py::generate_response`/`AgentResponse` for the response shape and
//! `orchestrator_loop.py::_execute_git_tool` for the git tool surface.

use std::path::PathBuf;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{info, warn};

/// `AgentResponse.status` from §6: SUCCESS | FAILED | NEEDS_CLARIFICATION | PENDING.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentResponseStatus {
    Success,
    Failed,
    NeedsClarification,
    Pending,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub function: String,
    pub arguments: serde_json::Value,
}

/// The LLM provider's response contract (§6): `(prompt, model_alias) ->
/// AgentResponse`. The transport itself (HTTP client to a specific
/// provider) is out of scope; only this shape and the repair layer that
/// parses it out of raw text are modeled here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResponse {
    pub status: AgentResponseStatus,
    pub reasoning_trace: String,
    pub validation_score: f64,
    pub tool_calls: Vec<ToolCall>,
    pub blackboard_update: Option<serde_json::Value>,
}

impl AgentResponse {
    pub fn success(reasoning_trace: impl Into<String>) -> Self {
        Self {
            status: AgentResponseStatus::Success,
            reasoning_trace: reasoning_trace.into(),
            validation_score: 1.0,
            tool_calls: Vec::new(),
            blackboard_update: None,
        }
    }

    pub fn failed(reasoning_trace: impl Into<String>) -> Self {
        Self {
            status: AgentResponseStatus::Failed,
            reasoning_trace: reasoning_trace.into(),
            validation_score: 0.0,
            tool_calls: Vec::new(),
            blackboard_update: None,
        }
    }
}

/// Wire shape parsed directly off `serde_json`, before the richer
/// `AgentResponseStatus` enum's SCREAMING_SNAKE_CASE rename is applied
/// loosely enough to also accept a bare lowercase/titlecase status from
/// a chatty model — repaired by [`repair_and_parse_agent_response`].
#[derive(Debug, Deserialize)]
struct RawAgentResponse {
    status: String,
    #[serde(default)]
    reasoning_trace: String,
    #[serde(default)]
    validation_score: f64,
    #[serde(default)]
    tool_calls: Vec<ToolCall>,
    #[serde(default)]
    blackboard_update: Option<serde_json::Value>,
}

/// The JSON-repair layer from §6: parses an `AgentResponse` out of raw
/// model output that may be wrapped in a Markdown code fence, prefixed
/// with conversational chatter before the first `{`, or carry trailing
/// commas before a closing brace/bracket.
pub fn repair_and_parse_agent_response(raw: &str) -> anyhow::Result<AgentResponse> {
    let fence_re = Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").unwrap();
    let candidate = if let Some(caps) = fence_re.captures(raw) {
        caps.get(1).unwrap().as_str().to_string()
    } else if let Some(start) = raw.find('{') {
        let end = raw.rfind('}').map(|e| e + 1).unwrap_or(raw.len());
        raw[start..end].to_string()
    } else {
        raw.to_string()
    };

    let trailing_comma_re = Regex::new(r",\s*([}\]])").unwrap();
    let repaired = trailing_comma_re.replace_all(&candidate, "$1");

    let raw_response: RawAgentResponse = serde_json::from_str(&repaired)
        .map_err(|e| anyhow::anyhow!("could not parse agent response after repair: {e}"))?;

    let status = match raw_response.status.to_uppercase().as_str() {
        "SUCCESS" => AgentResponseStatus::Success,
        "FAILED" => AgentResponseStatus::Failed,
        "NEEDS_CLARIFICATION" => AgentResponseStatus::NeedsClarification,
        "PENDING" => AgentResponseStatus::Pending,
        other => anyhow::bail!("unknown agent response status: {other}"),
    };

    Ok(AgentResponse {
        status,
        reasoning_trace: raw_response.reasoning_trace,
        validation_score: raw_response.validation_score,
        tool_calls: raw_response.tool_calls,
        blackboard_update: raw_response.blackboard_update,
    })
}

/// `(prompt, model_alias) -> AgentResponse`, the worker-dispatch and
/// git-workflow LLM boundary (§6). Distinct from
/// `hippoforge_deliberation::LlmProvider`, which returns a bare string
/// for the simpler synthesis-only call the deliberation loop makes.
#[async_trait]
pub trait AgentProvider: Send + Sync {
    async fn dispatch(&self, prompt: &str, model_alias: &str) -> anyhow::Result<AgentResponse>;
}

/// A deterministic test double that runs every prompt through the same
/// repair layer a real provider's raw text would, so tests exercise the
/// repair path. Configured with a canned raw response string.
pub struct MockAgentProvider {
    raw_response: String,
}

impl MockAgentProvider {
    pub fn new(raw_response: impl Into<String>) -> Self {
        Self {
            raw_response: raw_response.into(),
        }
    }

    pub fn always_success(reasoning_trace: impl Into<String>) -> Self {
        let trace = reasoning_trace.into();
        Self::new(format!(
            r#"{{"status": "SUCCESS", "reasoning_trace": "{trace}", "validation_score": 0.9, "tool_calls": [], "blackboard_update": null}}"#
        ))
    }
}

#[async_trait]
impl AgentProvider for MockAgentProvider {
    async fn dispatch(&self, _prompt: &str, _model_alias: &str) -> anyhow::Result<AgentResponse> {
        repair_and_parse_agent_response(&self.raw_response)
    }
}

/// The git adapter boundary (§6): `git_add`/`git_commit`/`git_push` plus
/// a generic `run_command` restricted to commands beginning with `git `.
#[async_trait]
pub trait GitAdapter: Send + Sync {
    fn is_available(&self) -> bool;
    fn remote_url(&self) -> Option<String>;
    async fn has_changes(&self) -> anyhow::Result<bool>;
    async fn create_branch(&self, name: &str, base: Option<&str>) -> anyhow::Result<()>;
    /// Executes one of the restricted tool calls from §4.11: `git_add`,
    /// `git_commit`, `git_push`, or `run_command` (validated to start
    /// with `git `). Returns a short human-readable execution summary.
    async fn run_tool(&self, tool: &str, args: &serde_json::Value) -> anyhow::Result<String>;
    async fn push(&self, remote: &str, branch: &str) -> anyhow::Result<()>;
}

/// The default `GitAdapter`: shells out to the system `git` binary in
/// `repo_path`. Grounded on `orchestrator_loop.py::_execute_git_tool`'s
/// subprocess-per-tool-call shape, including its `run_command`
/// allowlist check.
pub struct SubprocessGitAdapter {
    repo_path: PathBuf,
}

impl SubprocessGitAdapter {
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
        }
    }

    async fn run_git(&self, args: &[&str]) -> anyhow::Result<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo_path)
            .output()
            .await?;
        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            anyhow::bail!(
                "git {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr)
            )
        }
    }
}

#[async_trait]
impl GitAdapter for SubprocessGitAdapter {
    fn is_available(&self) -> bool {
        self.repo_path.join(".git").exists()
    }

    fn remote_url(&self) -> Option<String> {
        None
    }

    async fn has_changes(&self) -> anyhow::Result<bool> {
        let status = self.run_git(&["status", "--porcelain"]).await?;
        Ok(!status.trim().is_empty())
    }

    async fn create_branch(&self, name: &str, base: Option<&str>) -> anyhow::Result<()> {
        if let Some(base) = base {
            self.run_git(&["checkout", "-b", name, base]).await?;
        } else {
            self.run_git(&["checkout", "-b", name]).await?;
        }
        Ok(())
    }

    async fn run_tool(&self, tool: &str, args: &serde_json::Value) -> anyhow::Result<String> {
        match tool {
            "run_command" => {
                let command_line = args
                    .get("command_line")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default();
                if !command_line.starts_with("git ") {
                    anyhow::bail!("rejected non-git command: {command_line}");
                }
                let rest: Vec<&str> = command_line.trim_start_matches("git ").split_whitespace().collect();
                self.run_git(&rest).await
            }
            "git_add" => {
                let files = args
                    .get("files")
                    .and_then(|v| v.as_str())
                    .unwrap_or(".");
                self.run_git(&["add", files]).await
            }
            "git_commit" => {
                let message = args
                    .get("message")
                    .and_then(|v| v.as_str())
                    .unwrap_or("Automated commit");
                let result = self.run_git(&["commit", "-m", message]).await?;
                info!(message, "git commit executed");
                Ok(result)
            }
            "git_push" => {
                let remote = args.get("remote").and_then(|v| v.as_str()).unwrap_or("origin");
                let branch = args.get("branch").and_then(|v| v.as_str()).unwrap_or("HEAD");
                self.run_git(&["push", remote, branch]).await
            }
            other => anyhow::bail!("unknown git tool: {other}"),
        }
    }

    async fn push(&self, remote: &str, branch: &str) -> anyhow::Result<()> {
        self.run_git(&["push", remote, branch]).await?;
        Ok(())
    }
}

/// The GitHub adapter boundary (§6): `create_issue`, `list_issues`,
/// `search_issues`, `create_pull_request`, `merge_pull_request`,
/// `get_pull_request`, all asynchronous with a 5-second connection
/// timeout. Only the two operations the kernel's git workflow (§4.11)
/// and PR-triggered role (§4.9) actually call are exercised here; the
/// rest of the surface is named but not implemented, matching the
/// non-goal boundary around the GitHub HTTP client itself.
#[async_trait]
pub trait GitHubAdapter: Send + Sync {
    fn is_ready(&self) -> bool;
    async fn create_pull_request(
        &self,
        branch: &str,
        base: &str,
        title: &str,
        body: &str,
    ) -> anyhow::Result<String>;
    async fn create_issue(&self, title: &str, body: &str) -> anyhow::Result<String>;
}

/// The real LLM provider adapter: POSTs `{prompt, model, temperature,
/// max_tokens}` to a configurable completions endpoint and repairs the
/// response body into an `AgentResponse`. The endpoint's specific wire
/// contract (provider-specific auth, streaming, …) is the out-of-scope
/// part (§3/§6); only this request shape is modeled.
pub struct HttpAgentProvider {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpAgentProvider {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl AgentProvider for HttpAgentProvider {
    async fn dispatch(&self, prompt: &str, model_alias: &str) -> anyhow::Result<AgentResponse> {
        let body = serde_json::json!({
            "prompt": prompt,
            "model": model_alias,
            "temperature": 0.3,
            "max_tokens": 1500,
        });
        let response = self.client.post(&self.endpoint).json(&body).send().await?;
        let text = response.text().await?;
        repair_and_parse_agent_response(&text)
    }
}

/// Adapts any `AgentProvider` into the simpler `LlmProvider` seam
/// (`hippoforge_deliberation::LlmProvider`) that the deliberation loop
/// and the git workflow's commit-message/PR-body drafting both use:
/// dispatches through the same provider and returns just the
/// reasoning trace, discarding the tool-call/status machinery neither
/// caller needs. Keeps the workspace from wiring up a second network
/// client purely for bare-string generation.
pub struct AgentProviderLlmAdapter {
    provider: std::sync::Arc<dyn AgentProvider>,
}

impl AgentProviderLlmAdapter {
    pub fn new(provider: std::sync::Arc<dyn AgentProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl hippoforge_deliberation::LlmProvider for AgentProviderLlmAdapter {
    async fn generate(&self, prompt: &str, _temperature: f64, _max_tokens: usize) -> anyhow::Result<String> {
        let response = self.provider.dispatch(prompt, "default").await?;
        Ok(response.reasoning_trace)
    }
}

/// Default adapter used whenever `GITHUB_TOKEN` is unset (§6): always
/// reports not-ready and fails any call, so the PR step degrades to a
/// feedback-log warning rather than a panic.
pub struct NullGitHubAdapter;

#[async_trait]
impl GitHubAdapter for NullGitHubAdapter {
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
        warn!("create_pull_request called with no GitHub adapter configured");
        anyhow::bail!("GITHUB_TOKEN not set")
    }

    async fn create_issue(&self, _title: &str, _body: &str) -> anyhow::Result<String> {
        anyhow::bail!("GITHUB_TOKEN not set")
    }
}

/// The real GitHub adapter: a thin `reqwest` client over the REST API's
/// pull-request and issue endpoints, authenticated with a personal
/// access token (§6).
pub struct HttpGitHubAdapter {
    client: reqwest::Client,
    token: String,
    repo: String,
}

impl HttpGitHubAdapter {
    /// `repo` is `owner/name`.
    pub fn new(token: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            token: token.into(),
            repo: repo.into(),
        }
    }
}

#[async_trait]
impl GitHubAdapter for HttpGitHubAdapter {
    fn is_ready(&self) -> bool {
        !self.token.is_empty()
    }

    async fn create_pull_request(
        &self,
        branch: &str,
        base: &str,
        title: &str,
        body: &str,
    ) -> anyhow::Result<String> {
        let url = format!("https://api.github.com/repos/{}/pulls", self.repo);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .header("User-Agent", "hippoforge-kernel")
            .json(&serde_json::json!({"title": title, "head": branch, "base": base, "body": body}))
            .send()
            .await?;
        if !response.status().is_success() {
            anyhow::bail!("github pull request creation failed: {}", response.status());
        }
        let payload: serde_json::Value = response.json().await?;
        Ok(payload
            .get("html_url")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string())
    }

    async fn create_issue(&self, title: &str, body: &str) -> anyhow::Result<String> {
        let url = format!("https://api.github.com/repos/{}/issues", self.repo);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .header("User-Agent", "hippoforge-kernel")
            .json(&serde_json::json!({"title": title, "body": body}))
            .send()
            .await?;
        if !response.status().is_success() {
            anyhow::bail!("github issue creation failed: {}", response.status());
        }
        let payload: serde_json::Value = response.json().await?;
        Ok(payload
            .get("html_url")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repairs_a_response_wrapped_in_a_code_fence() {
        let raw = "Sure, here you go:\n```json\n{\"status\": \"SUCCESS\", \"reasoning_trace\": \"done\", \"validation_score\": 0.8, \"tool_calls\": [],}\n```\nLet me know if you need anything else.";
        let parsed = repair_and_parse_agent_response(raw).unwrap();
        assert_eq!(parsed.status, AgentResponseStatus::Success);
        assert_eq!(parsed.reasoning_trace, "done");
    }

    #[test]
    fn repairs_chatter_prefixed_json_with_a_trailing_comma() {
        let raw = "Here's the result: {\"status\": \"FAILED\", \"reasoning_trace\": \"nope\",}";
        let parsed = repair_and_parse_agent_response(raw).unwrap();
        assert_eq!(parsed.status, AgentResponseStatus::Failed);
    }

    #[tokio::test]
    async fn mock_agent_provider_always_success_round_trips_the_trace() {
        let provider = MockAgentProvider::always_success("worked");
        let response = provider.dispatch("prompt", "model").await.unwrap();
        assert_eq!(response.status, AgentResponseStatus::Success);
        assert_eq!(response.reasoning_trace, "worked");
    }

    #[tokio::test]
    async fn null_github_adapter_is_never_ready() {
        let adapter = NullGitHubAdapter;
        assert!(!adapter.is_ready());
        assert!(adapter.create_pull_request("b", "main", "t", "b").await.is_err());
    }
}
