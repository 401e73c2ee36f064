//! Task graph builder.
//!
//! Turns the flat `tasks` query result into a forest of tasks with
//! resolved hierarchy (parent/children) and dependency
//! (predecessor/successor) links.
//!
//! # Algorithm
//! Two passes over the records:
//! 1. Build every node with empty relation lists.
//! 2. For each record, look up the already-built parent and predecessor
//!    nodes by id and link both directions.
//!
//! A relation whose target id is not part of the result is dropped.
//! No cycle detection happens here; see
//! [`validate_snapshot`](crate::validation::validate_snapshot) for that.

use std::collections::HashMap;

use tracing::debug;

use crate::models::{ResourceConstraint, Task, TaskId};
use crate::query::{TaskRecord, TasksQuery};

/// An immutable snapshot of all tasks, indexed by id.
///
/// Iteration follows the order of the query result.
#[derive(Debug, Clone, Default)]
pub struct TaskGraph {
    tasks: HashMap<TaskId, Task>,
    order: Vec<TaskId>,
}

impl TaskGraph {
    /// Builds the graph from a `tasks` query result.
    pub fn from_query(query: &TasksQuery) -> Self {
        Self::build(&query.tasks)
    }

    /// Builds the graph from flat records.
    ///
    /// If two records share an id, the later one replaces the earlier.
    pub fn build(records: &[TaskRecord]) -> Self {
        let mut tasks: HashMap<TaskId, Task> = HashMap::with_capacity(records.len());
        let mut order = Vec::with_capacity(records.len());

        for r in records {
            if tasks.insert(r.db_id, node_from_record(r)).is_none() {
                order.push(r.db_id);
            }
        }

        let mut dropped = 0usize;
        for r in records {
            if let Some(parent) = r.parent {
                if tasks.contains_key(&parent.db_id) && parent.db_id != r.db_id {
                    link(&mut tasks, r.db_id, |t| t.parent = Some(parent.db_id));
                    link(&mut tasks, parent.db_id, |p| p.children.push(r.db_id));
                } else {
                    dropped += 1;
                }
            }
            for pre in &r.predecessors {
                if tasks.contains_key(&pre.db_id) {
                    link(&mut tasks, r.db_id, |t| t.predecessors.push(pre.db_id));
                    link(&mut tasks, pre.db_id, |p| p.successors.push(r.db_id));
                } else {
                    dropped += 1;
                }
            }
        }

        if dropped > 0 {
            debug!(dropped, "dropped task relations with unknown targets");
        }
        debug!(tasks = order.len(), "built task graph");

        Self { tasks, order }
    }

    /// Looks up a task by id.
    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    /// Whether a task with this id exists.
    pub fn contains(&self, id: TaskId) -> bool {
        self.tasks.contains_key(&id)
    }

    /// All tasks in query order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> + '_ {
        self.order.iter().filter_map(move |id| self.tasks.get(id))
    }

    /// Tasks without a parent.
    pub fn top_level_tasks(&self) -> Vec<&Task> {
        self.tasks().filter(|t| t.is_top_level()).collect()
    }

    /// Tasks without children.
    pub fn leaf_tasks(&self) -> Vec<&Task> {
        self.tasks().filter(|t| t.is_leaf()).collect()
    }

    /// The parent of `id`, if it has one.
    pub fn parent(&self, id: TaskId) -> Option<&Task> {
        self.task(id)?.parent.and_then(|p| self.task(p))
    }

    /// Children of `id`; empty for unknown ids.
    pub fn children(&self, id: TaskId) -> Vec<&Task> {
        self.resolve(id, |t| &t.children)
    }

    /// Predecessors of `id`; empty for unknown ids.
    pub fn predecessors(&self, id: TaskId) -> Vec<&Task> {
        self.resolve(id, |t| &t.predecessors)
    }

    /// Successors of `id`; empty for unknown ids.
    pub fn successors(&self, id: TaskId) -> Vec<&Task> {
        self.resolve(id, |t| &t.successors)
    }

    /// Chain of ancestors of `id`, nearest first.
    ///
    /// Stops if the hierarchy loops back on itself.
    pub fn ancestors(&self, id: TaskId) -> Vec<&Task> {
        let mut result: Vec<&Task> = Vec::new();
        let mut current = self.parent(id);
        while let Some(p) = current {
            if p.id == id || result.iter().any(|a| a.id == p.id) {
                break;
            }
            result.push(p);
            current = self.parent(p.id);
        }
        result
    }

    /// Number of tasks.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the graph has no tasks.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn resolve(&self, id: TaskId, ids: impl Fn(&Task) -> &Vec<TaskId>) -> Vec<&Task> {
        self.task(id)
            .map(|t| ids(t).iter().filter_map(|i| self.task(*i)).collect())
            .unwrap_or_default()
    }
}

fn node_from_record(r: &TaskRecord) -> Task {
    Task {
        id: r.db_id,
        title: r.title.clone(),
        description: r.description.clone(),
        designation: r.designation,
        earliest_start: r.earliest_start,
        schedule_target: r.schedule_target,
        effort: r.effort,
        parent: None,
        children: Vec::new(),
        predecessors: Vec::new(),
        successors: Vec::new(),
        resource_constraints: r
            .resource_constraints
            .iter()
            .map(|c| ResourceConstraint {
                optional: c.optional,
                speed: c.speed,
                resources: c.entries.iter().map(|e| e.resource.db_id).collect(),
            })
            .collect(),
    }
}

fn link(tasks: &mut HashMap<TaskId, Task>, id: TaskId, f: impl FnOnce(&mut Task)) {
    if let Some(t) = tasks.get_mut(&id) {
        f(t);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskDesignation;

    fn sample_graph() -> TaskGraph {
        // 1 (group)
        // ├── 2
        // └── 3 (after 2)
        // 4 (after 3)
        TaskGraph::build(&[
            TaskRecord::new(1, "Project").with_designation(TaskDesignation::Group),
            TaskRecord::new(2, "Design").with_parent(1),
            TaskRecord::new(3, "Build").with_parent(1).with_predecessor(2),
            TaskRecord::new(4, "Ship").with_predecessor(3),
        ])
    }

    #[test]
    fn test_parent_child_symmetry() {
        let g = sample_graph();
        let parent = g.task(1).unwrap();
        assert_eq!(parent.children, vec![2, 3]);
        for child in g.children(1) {
            assert_eq!(child.parent, Some(1));
            assert_eq!(g.parent(child.id).map(|p| p.id), Some(1));
        }
    }

    #[test]
    fn test_predecessor_successor_symmetry() {
        let g = sample_graph();
        assert_eq!(g.task(3).unwrap().predecessors, vec![2]);
        assert_eq!(g.task(2).unwrap().successors, vec![3]);
        assert_eq!(
            g.successors(3).iter().map(|t| t.id).collect::<Vec<_>>(),
            vec![4]
        );
        assert_eq!(
            g.predecessors(4).iter().map(|t| t.id).collect::<Vec<_>>(),
            vec![3]
        );
    }

    #[test]
    fn test_dangling_parent_dropped() {
        let g = TaskGraph::build(&[
            TaskRecord::new(1, "A"),
            TaskRecord::new(2, "B").with_parent(99),
        ]);
        let b = g.task(2).unwrap();
        assert!(b.parent.is_none());
        assert!(g.task(1).unwrap().children.is_empty());
        assert!(g.top_level_tasks().iter().any(|t| t.id == 2));
    }

    #[test]
    fn test_dangling_predecessor_dropped() {
        let g = TaskGraph::build(&[TaskRecord::new(1, "A").with_predecessor(42)]);
        assert!(g.task(1).unwrap().predecessors.is_empty());
    }

    #[test]
    fn test_top_level_partition() {
        let g = sample_graph();
        let top: Vec<TaskId> = g.top_level_tasks().iter().map(|t| t.id).collect();
        let with_parent: Vec<TaskId> = g
            .tasks()
            .filter(|t| g.parent(t.id).is_some())
            .map(|t| t.id)
            .collect();
        assert_eq!(top, vec![1, 4]);
        assert_eq!(with_parent, vec![2, 3]);
        assert_eq!(top.len() + with_parent.len(), g.len());
        assert!(top.iter().all(|id| !with_parent.contains(id)));
    }

    #[test]
    fn test_leaf_tasks() {
        let g = sample_graph();
        let leaves: Vec<TaskId> = g.leaf_tasks().iter().map(|t| t.id).collect();
        assert_eq!(leaves, vec![2, 3, 4]);
    }

    #[test]
    fn test_self_parent_ignored() {
        let g = TaskGraph::build(&[TaskRecord::new(1, "Loop").with_parent(1)]);
        let t = g.task(1).unwrap();
        assert!(t.parent.is_none());
        assert!(t.children.is_empty());
    }

    #[test]
    fn test_ancestors_stop_on_cycle() {
        let g = TaskGraph::build(&[
            TaskRecord::new(1, "A").with_parent(2),
            TaskRecord::new(2, "B").with_parent(1),
            TaskRecord::new(3, "C").with_parent(2),
        ]);
        let chain: Vec<TaskId> = g.ancestors(3).iter().map(|t| t.id).collect();
        assert_eq!(chain, vec![2, 1]);
    }

    #[test]
    fn test_constraints_resolved_to_ids() {
        let query: TasksQuery = serde_json::from_value(serde_json::json!({
            "tasks": [{
                "dbId": 1,
                "title": "T",
                "resourceConstraints": [
                    { "optional": false, "speed": 2.0, "entries": [{ "resource": { "dbId": 5 } }] }
                ]
            }]
        }))
        .unwrap();
        let g = TaskGraph::from_query(&query);
        let t = g.task(1).unwrap();
        assert_eq!(t.resource_constraints[0].resources, vec![5]);
        assert!((t.resource_constraints[0].speed - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_empty_graph() {
        let g = TaskGraph::default();
        assert!(g.is_empty());
        assert!(g.top_level_tasks().is_empty());
        assert!(g.children(1).is_empty());
        assert!(g.parent(1).is_none());
    }
}
