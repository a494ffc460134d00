use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandoffStatus {
    Pending,
    InProgress,
    Completed,
    Blocked,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandoffProtocol {
    pub from_role: String,
    pub to_role: String,
    pub task_id: String,
    pub status: HandoffStatus,
    pub context: serde_json::Value,
    pub notes: Vec<String>,
}

/// The outcome of a single git role's dispatch, per §4.9.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExitReport {
    pub task_id: String,
    pub status: HandoffStatus,
    pub files_touched: Vec<String>,
    pub branch: Option<String>,
    pub pr_url: Option<String>,
    pub remaining_work: Vec<String>,
    pub warnings: Vec<String>,
}

impl ExitReport {
    pub fn skipped(task_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            status: HandoffStatus::Skipped,
            files_touched: Vec::new(),
            branch: None,
            pr_url: None,
            remaining_work: Vec::new(),
            warnings: vec![reason.into()],
        }
    }

    pub fn failed(task_id: impl Into<String>, warning: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            status: HandoffStatus::Failed,
            files_touched: Vec::new(),
            branch: None,
            pr_url: None,
            remaining_work: Vec::new(),
            warnings: vec![warning.into()],
        }
    }
}
