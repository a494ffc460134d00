use hippoforge_contracts::{intent_for_flag_name, Task, TaskStatus, TaskTable};
use tracing::instrument;
use uuid::Uuid;

use crate::parser::ParsedTask;

/// Inbound sync: merges parsed tasks into an existing task table,
/// matching by description. PENDING parsed status never downgrades a
/// non-PENDING in-memory status; Context and Flags are authoritative
/// (overwrite); unmatched descriptions become new tasks (§4.12).
#[instrument(skip(tasks, parsed))]
pub fn merge_inbound(tasks: &mut TaskTable, parsed: Vec<ParsedTask>) {
    for p in parsed {
        let existing_id = tasks
            .values()
            .find(|t| t.description == p.description)
            .map(|t| t.id.clone());

        match existing_id {
            Some(id) => {
                let task = tasks.get_mut(&id).expect("id came from this table");
                apply_parsed(task, p);
            }
            None => {
                let mut task = Task::new(Uuid::new_v4().to_string(), p.description.clone());
                apply_parsed(&mut task, p);
                tasks.insert(task.id.clone(), task);
            }
        }
    }
}

fn apply_parsed(task: &mut Task, p: ParsedTask) {
    let downgrades_to_pending = p.status == TaskStatus::Pending && task.status != TaskStatus::Pending;
    if !downgrades_to_pending {
        task.status = p.status;
    }

    task.assigned_worker = Some(p.assigned_worker);
    task.input_files = p.input_files;

    for (flag, value) in p.flags {
        if let Some(intent) = intent_for_flag_name(&flag) {
            task.set_intent(intent, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn parsed(description: &str, status: TaskStatus) -> ParsedTask {
        ParsedTask {
            description: description.to_string(),
            status,
            assigned_worker: "engineer".to_string(),
            input_files: Vec::new(),
            flags: HashMap::new(),
        }
    }

    #[test]
    fn unmatched_description_becomes_a_new_task() {
        let mut tasks = TaskTable::new();
        merge_inbound(&mut tasks, vec![parsed("new work", TaskStatus::Pending)]);
        assert_eq!(tasks.len(), 1);
    }

    #[test]
    fn pending_parsed_status_does_not_downgrade_in_progress() {
        let mut tasks = TaskTable::new();
        let mut existing = Task::new("t1", "keep going");
        existing.status = TaskStatus::InProgress;
        tasks.insert(existing.id.clone(), existing);

        merge_inbound(&mut tasks, vec![parsed("keep going", TaskStatus::Pending)]);

        assert_eq!(tasks.values().next().unwrap().status, TaskStatus::InProgress);
    }

    #[test]
    fn completed_parsed_status_overwrites_existing_status() {
        let mut tasks = TaskTable::new();
        let mut existing = Task::new("t1", "finish up");
        existing.status = TaskStatus::InProgress;
        tasks.insert(existing.id.clone(), existing);

        merge_inbound(&mut tasks, vec![parsed("finish up", TaskStatus::Completed)]);

        assert_eq!(tasks.values().next().unwrap().status, TaskStatus::Completed);
    }

    #[test]
    fn context_and_flags_overwrite_existing_values() {
        let mut tasks = TaskTable::new();
        let mut existing = Task::new("t1", "ship it");
        existing.input_files = vec!["old.py".to_string()];
        tasks.insert(existing.id.clone(), existing);

        let mut p = parsed("ship it", TaskStatus::Pending);
        p.input_files = vec!["new.py".to_string()];
        p.flags.insert("git_commit_ready".to_string(), true);
        merge_inbound(&mut tasks, vec![p]);

        let task = tasks.values().next().unwrap();
        assert_eq!(task.input_files, vec!["new.py".to_string()]);
        assert!(task.has_intent(hippoforge_contracts::Intent::GitCommit));
    }
}
