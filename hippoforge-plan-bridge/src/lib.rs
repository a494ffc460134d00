//! C11: bidirectional sync between a Markdown project plan and the
//! blackboard's task table, grounded on `markdown_bridge.py`.

mod generator;
mod merge;
mod parser;

pub use generator::generate_markdown;
pub use merge::merge_inbound;
pub use parser::{parse_file, ParsedDocument, ParsedTask};

pub(crate) const SECTION_TODO: &str = "## Todo";
pub(crate) const SECTION_IN_PROGRESS: &str = "## In Progress";
pub(crate) const SECTION_COMPLETED: &str = "## Completed";

use hippoforge_contracts::ProjectProfile;

/// Runs the full inbound sync (file content -> blackboard task table) in
/// one call: parse, then merge into `profile.tasks`.
pub fn sync_inbound(profile: &mut ProjectProfile, content: &str) {
    let doc = parse_file(content);
    merge_inbound(&mut profile.tasks, doc.tasks);
}

/// Runs the full outbound sync (blackboard task table -> file content),
/// preserving the last-seen preamble and per-section free text if the
/// caller threads a previously parsed document back in.
pub fn sync_outbound(profile: &ProjectProfile, previous: Option<&ParsedDocument>) -> String {
    let (preamble, todo_notes, in_progress_notes, completed_notes) = match previous {
        Some(doc) => (
            doc.preamble.as_str(),
            doc.todo_notes.as_str(),
            doc.in_progress_notes.as_str(),
            doc.completed_notes.as_str(),
        ),
        None => ("", "", "", ""),
    };
    generate_markdown(
        profile.tasks.values(),
        preamble,
        todo_notes,
        in_progress_notes,
        completed_notes,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_single_task_through_inbound_then_outbound() {
        let content = "# Project Plan\n\n## Todo\n- [ ] write docs @engineer\n";
        let mut profile = ProjectProfile::fresh("claude-sonnet");
        let doc = parse_file(content);
        merge_inbound(&mut profile.tasks, doc.tasks.clone());
        assert_eq!(profile.tasks.len(), 1);

        let rendered = sync_outbound(&profile, Some(&doc));
        assert!(rendered.contains("- [ ] write docs @engineer"));
    }
}
