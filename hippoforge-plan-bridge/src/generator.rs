use hippoforge_contracts::{flag_name, Intent, Task, TaskStatus};

use crate::SECTION_COMPLETED;
use crate::SECTION_IN_PROGRESS;
use crate::SECTION_TODO;

/// Flags re-emitted on the outbound side, per §4.12's whitelist.
const OUTBOUND_FLAGS: &[Intent] = &[Intent::GitCommit, Intent::GitPullRequest];

/// Renders a task table into a canonical Markdown document, grouped by
/// status, grounded on `markdown_bridge.py::generate_markdown`.
pub fn generate_markdown<'a>(
    tasks: impl IntoIterator<Item = &'a Task>,
    preamble: &str,
    todo_notes: &str,
    in_progress_notes: &str,
    completed_notes: &str,
) -> String {
    let mut todo = Vec::new();
    let mut in_progress = Vec::new();
    let mut completed = Vec::new();

    for task in tasks {
        match task.status {
            TaskStatus::Completed => completed.push(task),
            TaskStatus::InProgress => in_progress.push(task),
            TaskStatus::Pending | TaskStatus::Failed => todo.push(task),
        }
    }

    let header = if preamble.is_empty() {
        "# Project Plan".to_string()
    } else {
        preamble.to_string()
    };

    let mut output = vec![header, String::new()];

    output.push(SECTION_TODO.to_string());
    if !todo_notes.is_empty() {
        output.push(todo_notes.to_string());
    }
    for task in &todo {
        output.push(render_task(task));
    }
    output.push(String::new());

    output.push(SECTION_IN_PROGRESS.to_string());
    if !in_progress_notes.is_empty() {
        output.push(in_progress_notes.to_string());
    }
    for task in &in_progress {
        output.push(render_task(task));
    }
    output.push(String::new());

    output.push(SECTION_COMPLETED.to_string());
    if !completed_notes.is_empty() {
        output.push(completed_notes.to_string());
    }
    for task in &completed {
        output.push(render_task(task));
    }

    output.join("\n")
}

fn render_task(task: &Task) -> String {
    let mark = match task.status {
        TaskStatus::Completed => "x",
        TaskStatus::InProgress => "/",
        TaskStatus::Pending | TaskStatus::Failed => " ",
    };

    let mut line = format!("- [{mark}] {}", task.description);
    if let Some(worker) = &task.assigned_worker {
        line.push_str(&format!(" @{worker}"));
    }

    let mut sublines = Vec::new();
    if !task.input_files.is_empty() {
        sublines.push(format!("  - Context: {}", task.input_files.join(", ")));
    }

    let flags: Vec<String> = OUTBOUND_FLAGS
        .iter()
        .filter(|intent| task.has_intent(**intent))
        .filter_map(|intent| flag_name(*intent))
        .map(|name| format!("{name}=True"))
        .collect();
    if !flags.is_empty() {
        sublines.push(format!("  - Flags: {}", flags.join(", ")));
    }

    if sublines.is_empty() {
        line
    } else {
        format!("{line}\n{}", sublines.join("\n"))
    }
}
