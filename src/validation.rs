//! Data-quality checks for a task/resource snapshot.
//!
//! The builders never fail on malformed input: dangling references are
//! dropped and cycles are tolerated. This module reports those conditions
//! so callers can surface them. Detects:
//! - Duplicate IDs
//! - Parent, predecessor and constraint references to unknown entities
//! - Cycles in the task hierarchy
//! - Cycles in the predecessor graph
//!
//! # Reference
//! Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4 (Topological Sort)

use std::collections::{HashMap, HashSet};

use crate::models::TaskId;
use crate::query::{ResourcesQuery, TasksQuery};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation finding.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Finding category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation findings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two entities share the same ID.
    DuplicateId,
    /// A task names a parent that doesn't exist.
    InvalidParent,
    /// A task names a predecessor that doesn't exist.
    InvalidPredecessor,
    /// A resource constraint names a resource that doesn't exist.
    InvalidResourceReference,
    /// Parent links form a loop.
    HierarchyCycle,
    /// Predecessor links form a loop.
    DependencyCycle,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Checks a `tasks` and `resources` query result for structural problems.
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with every finding.
pub fn validate_snapshot(tasks: &TasksQuery, resources: &ResourcesQuery) -> ValidationResult {
    let mut errors = Vec::new();

    let mut resource_ids = HashSet::new();
    for r in &resources.resources {
        if !resource_ids.insert(r.db_id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate resource ID: {}", r.db_id),
            ));
        }
    }

    let mut task_ids = HashSet::new();
    for t in &tasks.tasks {
        if !task_ids.insert(t.db_id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate task ID: {}", t.db_id),
            ));
        }
    }

    let mut hierarchy: HashMap<TaskId, Vec<TaskId>> = HashMap::new();
    let mut dependencies: HashMap<TaskId, Vec<TaskId>> = HashMap::new();

    for t in &tasks.tasks {
        if let Some(parent) = t.parent {
            if task_ids.contains(&parent.db_id) {
                hierarchy.entry(parent.db_id).or_default().push(t.db_id);
            } else {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidParent,
                    format!("Task {} references unknown parent {}", t.db_id, parent.db_id),
                ));
            }
        }

        for pre in &t.predecessors {
            if task_ids.contains(&pre.db_id) {
                dependencies.entry(pre.db_id).or_default().push(t.db_id);
            } else {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidPredecessor,
                    format!("Task {} references unknown predecessor {}", t.db_id, pre.db_id),
                ));
            }
        }

        for entry in t.resource_constraints.iter().flat_map(|c| &c.entries) {
            if !resource_ids.contains(&entry.resource.db_id) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidResourceReference,
                    format!(
                        "Task {} references unknown resource {}",
                        t.db_id, entry.resource.db_id
                    ),
                ));
            }
        }
    }

    let mut all: Vec<TaskId> = task_ids.into_iter().collect();
    all.sort_unstable();

    if let Some(node) = find_cycle(&all, &hierarchy) {
        errors.push(ValidationError::new(
            ValidationErrorKind::HierarchyCycle,
            format!("Task hierarchy loops through task {node}"),
        ));
    }
    if let Some(node) = find_cycle(&all, &dependencies) {
        errors.push(ValidationError::new(
            ValidationErrorKind::DependencyCycle,
            format!("Circular dependency detected involving task {node}"),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Returns a node from which a cycle is reachable, if any.
///
/// # Algorithm
/// DFS with a recursion-stack set. Visiting a node that is currently on the
/// stack is a back edge, hence a cycle.
fn find_cycle(nodes: &[TaskId], adj: &HashMap<TaskId, Vec<TaskId>>) -> Option<TaskId> {
    let mut visited = HashSet::new();
    let mut in_stack = HashSet::new();

    nodes.iter().copied().find(|&node| {
        !visited.contains(&node) && has_cycle_dfs(node, adj, &mut visited, &mut in_stack)
    })
}

fn has_cycle_dfs(
    node: TaskId,
    adj: &HashMap<TaskId, Vec<TaskId>>,
    visited: &mut HashSet<TaskId>,
    in_stack: &mut HashSet<TaskId>,
) -> bool {
    visited.insert(node);
    in_stack.insert(node);

    if let Some(neighbors) = adj.get(&node) {
        for &next in neighbors {
            if in_stack.contains(&next) {
                return true; // Back edge → cycle
            }
            if !visited.contains(&next) && has_cycle_dfs(next, adj, visited, in_stack) {
                return true;
            }
        }
    }

    in_stack.remove(&node);
    false
}
