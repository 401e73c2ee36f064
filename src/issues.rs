//! Issue index.
//!
//! Planning issues as reported by the backend, grouped by the task they
//! concern.

use std::collections::HashMap;

use crate::models::{Issue, TaskId};
use crate::query::IssuesQuery;

/// An immutable snapshot of all issues.
#[derive(Debug, Clone, Default)]
pub struct IssueIndex {
    issues: Vec<Issue>,
    by_task: HashMap<TaskId, Vec<usize>>,
}

impl IssueIndex {
    pub fn from_query(query: &IssuesQuery) -> Self {
        let issues: Vec<Issue> = query
            .issues
            .iter()
            .map(|i| Issue {
                id: i.db_id,
                code: i.code,
                description: i.description.clone(),
                issue_type: i.issue_type,
                task: i.task.map(|t| t.db_id),
            })
            .collect();
        let mut by_task: HashMap<TaskId, Vec<usize>> = HashMap::new();
        for (idx, issue) in issues.iter().enumerate() {
            if let Some(task) = issue.task {
                by_task.entry(task).or_default().push(idx);
            }
        }
        Self { issues, by_task }
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// Issues attached to `task`.
    pub fn for_task(&self, task: TaskId) -> Vec<&Issue> {
        self.by_task
            .get(&task)
            .map(|v| v.iter().map(|&i| &self.issues[i]).collect())
            .unwrap_or_default()
    }

    /// Issues not attached to any task.
    pub fn general(&self) -> Vec<&Issue> {
        self.issues.iter().filter(|i| i.is_general()).collect()
    }

    /// Ids of tasks with at least one issue.
    pub fn task_ids(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.by_task.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }
}
