use std::collections::HashMap;

use hippoforge_contracts::TaskStatus;
use regex::Regex;

use crate::SECTION_COMPLETED;
use crate::SECTION_IN_PROGRESS;
use crate::SECTION_TODO;

/// A single task line plus its indented metadata children, before it is
/// merged into a blackboard task table.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTask {
    pub description: String,
    pub status: TaskStatus,
    pub assigned_worker: String,
    pub input_files: Vec<String>,
    pub flags: HashMap<String, bool>,
}

/// A parsed Markdown plan document. `*_notes` hold any non-task,
/// non-metadata lines found within that section, preserved verbatim so a
/// load/save round trip does not silently drop free-form notes (§4.12).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedDocument {
    pub preamble: String,
    pub todo_notes: String,
    pub in_progress_notes: String,
    pub completed_notes: String,
    pub tasks: Vec<ParsedTask>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Todo,
    InProgress,
    Completed,
}

/// Parses a Markdown plan file into a task list plus any preserved free
/// text, grounded on `markdown_bridge.py::parse_file`.
pub fn parse_file(content: &str) -> ParsedDocument {
    let task_re = Regex::new(r"^\s*-\s*\[( |x|/)\]\s+(.*)").unwrap();
    let role_re = Regex::new(r"@(\w+)").unwrap();

    let mut doc = ParsedDocument::default();
    let mut section = Section::None;
    let mut current_task: Option<ParsedTask> = None;
    let mut preamble_lines = Vec::new();
    let mut saw_section = false;

    let flush_task = |doc: &mut ParsedDocument, task: Option<ParsedTask>| {
        if let Some(task) = task {
            doc.tasks.push(task);
        }
    };

    for line in content.lines() {
        let trimmed = line.trim();

        if trimmed.starts_with("##") {
            section = match trimmed {
                SECTION_TODO => Section::Todo,
                SECTION_IN_PROGRESS => Section::InProgress,
                SECTION_COMPLETED => Section::Completed,
                _ => Section::None,
            };
            saw_section = true;
            continue;
        }

        if let Some(caps) = task_re.captures(line) {
            flush_task(&mut doc, current_task.take());

            let status_char = &caps[1];
            let mut description = caps[2].to_string();

            let mut assigned_worker = "engineer".to_string();
            if let Some(role_caps) = role_re.captures(&description) {
                assigned_worker = role_caps[1].to_string();
                description = role_re.replace(&description, "").trim().to_string();
            }

            let status = match status_char {
                "x" => TaskStatus::Completed,
                "/" => TaskStatus::InProgress,
                _ => TaskStatus::Pending,
            };

            current_task = Some(ParsedTask {
                description,
                status,
                assigned_worker,
                input_files: Vec::new(),
                flags: HashMap::new(),
            });
            continue;
        }

        if let Some(task) = current_task.as_mut() {
            if line.starts_with("  -") || line.starts_with('\t') && line.trim_start().starts_with('-') {
                let meta = trimmed.trim_start_matches('-').trim();
                let lower = meta.to_ascii_lowercase();
                if let Some(rest) = lower.strip_prefix("context:") {
                    let offset = meta.len() - rest.len();
                    task.input_files = meta[offset..]
                        .split(',')
                        .map(|f| f.trim().to_string())
                        .filter(|f| !f.is_empty())
                        .collect();
                } else if let Some(rest) = lower.strip_prefix("flags:") {
                    let offset = meta.len() - rest.len();
                    for flag in meta[offset..].split(',') {
                        if let Some((key, val)) = flag.split_once('=') {
                            task.flags.insert(
                                key.trim().to_string(),
                                val.trim().eq_ignore_ascii_case("true"),
                            );
                        }
                    }
                }
                continue;
            }
        }

        if !saw_section {
            preamble_lines.push(line.to_string());
            continue;
        }

        if !trimmed.is_empty() {
            let notes = match section {
                Section::Todo => &mut doc.todo_notes,
                Section::InProgress => &mut doc.in_progress_notes,
                Section::Completed => &mut doc.completed_notes,
                Section::None => continue,
            };
            if !notes.is_empty() {
                notes.push('\n');
            }
            notes.push_str(line);
        }
    }

    flush_task(&mut doc, current_task.take());
    doc.preamble = preamble_lines.join("\n").trim().to_string();
    doc
}
