//! Planning issues reported by the backend scheduler.

use serde::{Deserialize, Serialize};

use super::TaskId;

/// Machine-readable cause of an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueCode {
    DependencyLoop,
    HierarchyLoop,
    MilestoneMissing,
    NoEffort,
    NoSlotFound,
    PredIssue,
    RequirementMissing,
    ResourceMissing,
    /// Any code this client does not know yet.
    #[serde(other)]
    Unknown,
}

/// Scope of an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueType {
    General,
    PlanningGeneral,
    PlanningTask,
    Task,
}

/// An issue, optionally attached to a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: i32,
    pub code: IssueCode,
    pub description: String,
    pub issue_type: IssueType,
    pub task: Option<TaskId>,
}

impl Issue {
    /// Whether the issue concerns the plan as a whole rather than one task.
    pub fn is_general(&self) -> bool {
        self.task.is_none()
    }
}
