//! Worker selection and prompt rendering from the classical flow
//! (§4.10 steps 2-5), grounded on `orchestrator_loop.py::process_task`'s
//! heuristic worker-routing chain and its `<handoff_to>` tag parser.

use hippoforge_contracts::{Intent, Role, Task};
use regex::Regex;

use crate::context_window::ContextWindow;

/// Chooses a worker for a task: an explicit assignment wins, then the
/// `tests_failing` intent routes straight to the debugger, then a
/// handful of description keywords route to specialist workers, and
/// everything else falls through to the generalist engineer.
pub fn select_worker(task: &Task) -> String {
    if let Some(worker) = &task.assigned_worker {
        return worker.clone();
    }
    if task.has_intent(Intent::TestsFailing) {
        return "debugger".to_string();
    }
    let description = task.description.to_lowercase();
    if description.contains("research") || description.contains("investigate") {
        return "researcher".to_string();
    }
    if description.contains("plan") {
        return "architect".to_string();
    }
    if description.contains("audit") {
        return "auditor".to_string();
    }
    "engineer".to_string()
}

/// Maps a worker alias to its provenance `Role` for signing.
pub fn role_for_worker(worker: &str) -> Role {
    match worker {
        "architect" => Role::Architect,
        "auditor" => Role::Auditor,
        _ => Role::Engineer,
    }
}

/// Renders the prompt handed to `AgentProvider::dispatch`: task details,
/// the bounded context window, and any accumulated feedback.
pub fn render_worker_prompt(task: &Task, worker: &str, window: &ContextWindow) -> String {
    let mut sections = Vec::new();

    sections.push(format!("ROLE: {worker}"));
    sections.push(format!("TASK: {}", task.description));

    if !task.input_files.is_empty() {
        sections.push(format!("INPUT_FILES: {}", task.input_files.join(", ")));
    }

    if !window.system_alerts.is_empty() {
        sections.push(format!("SYSTEM_ALERTS:\n{}", window.system_alerts.join("\n")));
    }

    if !window.blocked_tools.is_empty() {
        sections.push(format!("BLOCKED_TOOLS: {}", window.blocked_tools.join(", ")));
    }

    if !window.recent_provenance.is_empty() {
        let recent = window
            .recent_provenance
            .iter()
            .map(|entry| format!("- [{:?}] {} by {}", entry.role, entry.action, entry.agent_id))
            .collect::<Vec<_>>()
            .join("\n");
        sections.push(format!("RECENT_ACTIVITY:\n{recent}"));
    }

    if !task.feedback_log.is_empty() {
        sections.push(format!("FEEDBACK_LOG:\n{}", task.feedback_log.join("\n")));
    }

    sections.join("\n\n")
}

/// Parses a `<handoff_to role="...">description</handoff_to>` tag out of
/// a worker's reasoning trace, returning the target role and the
/// follow-up task description it wants created.
pub fn parse_handoff(reasoning_trace: &str) -> Option<(String, String)> {
    let pattern = Regex::new(r#"<handoff_to\s+role="(\w+)"[^>]*>([^<]*)</handoff_to>"#).ok()?;
    let captures = pattern.captures(reasoning_trace)?;
    let role = captures.get(1)?.as_str().to_string();
    let description = captures.get(2)?.as_str().trim().to_string();
    if description.is_empty() {
        return None;
    }
    Some((role, description))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hippoforge_contracts::TaskStatus;

    fn task_with_description(description: &str) -> Task {
        Task::new("task-1".to_string(), description.to_string())
    }

    #[test]
    fn explicit_assignment_wins() {
        let mut task = task_with_description("do something");
        task.assigned_worker = Some("specialist".to_string());
        assert_eq!(select_worker(&task), "specialist");
    }

    #[test]
    fn tests_failing_routes_to_debugger() {
        let mut task = task_with_description("fix the thing");
        task.set_intent(Intent::TestsFailing, true);
        assert_eq!(select_worker(&task), "debugger");
    }

    #[test]
    fn keyword_heuristics_pick_specialists() {
        assert_eq!(select_worker(&task_with_description("Research the API")), "researcher");
        assert_eq!(select_worker(&task_with_description("Plan the rollout")), "architect");
        assert_eq!(select_worker(&task_with_description("Audit the module")), "auditor");
        assert_eq!(select_worker(&task_with_description("Implement the feature")), "engineer");
    }

    #[test]
    fn parses_handoff_tag() {
        let trace = r#"Some reasoning. <handoff_to role="auditor">check the new module</handoff_to>"#;
        let (role, description) = parse_handoff(trace).unwrap();
        assert_eq!(role, "auditor");
        assert_eq!(description, "check the new module");
    }

    #[test]
    fn missing_handoff_tag_returns_none() {
        assert!(parse_handoff("no tag here").is_none());
    }

    #[test]
    fn prompt_includes_task_and_alerts() {
        let task = task_with_description("fix bug");
        let mut window = ContextWindow::default();
        window.system_alerts.push("tool foo is degraded".to_string());
        let prompt = render_worker_prompt(&task, "engineer", &window);
        assert!(prompt.contains("ROLE: engineer"));
        assert!(prompt.contains("fix bug"));
        assert!(prompt.contains("tool foo is degraded"));
        let _ = TaskStatus::Pending;
    }
}
