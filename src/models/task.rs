//! Task model.
//!
//! A task is a node in two overlapping structures: a hierarchy (parent and
//! children, forming a forest) and a dependency graph (predecessors and
//! successors). Links are stored as ids; [`TaskGraph`](crate::graph::TaskGraph)
//! guarantees that every stored id resolves to a task in the same graph.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ResourceId;

/// Backend identity of a task.
pub type TaskId = i32;

/// Category of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskDesignation {
    /// Plain unit of work.
    #[default]
    Task,
    /// Container; carries no allocations of its own.
    Group,
    /// Point in time that must be reached (`schedule_target`).
    Milestone,
    /// External input available from `earliest_start`.
    Requirement,
}

/// A set of candidate resources, any one of which satisfies the constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceConstraint {
    /// Whether the task may be scheduled without this constraint.
    pub optional: bool,
    /// Work rate multiplier (1.0 = normal).
    pub speed: f64,
    /// Candidate resources.
    pub resources: Vec<ResourceId>,
}

impl ResourceConstraint {
    /// Creates a mandatory constraint at normal speed.
    pub fn new(resources: Vec<ResourceId>) -> Self {
        Self {
            optional: false,
            speed: 1.0,
            resources,
        }
    }

    /// Marks the constraint optional.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Sets the speed multiplier.
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }
}

/// A task with resolved hierarchy and dependency links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub designation: TaskDesignation,
    /// Earliest point the task may start.
    pub earliest_start: Option<DateTime<Utc>>,
    /// Desired completion point.
    pub schedule_target: Option<DateTime<Utc>>,
    /// Effort in hours.
    pub effort: Option<f64>,
    pub parent: Option<TaskId>,
    pub children: Vec<TaskId>,
    pub predecessors: Vec<TaskId>,
    pub successors: Vec<TaskId>,
    pub resource_constraints: Vec<ResourceConstraint>,
}

impl Task {
    /// Creates a task with no links.
    pub fn new(id: TaskId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: String::new(),
            designation: TaskDesignation::Task,
            earliest_start: None,
            schedule_target: None,
            effort: None,
            parent: None,
            children: Vec::new(),
            predecessors: Vec::new(),
            successors: Vec::new(),
            resource_constraints: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_designation(mut self, designation: TaskDesignation) -> Self {
        self.designation = designation;
        self
    }

    pub fn with_earliest_start(mut self, at: DateTime<Utc>) -> Self {
        self.earliest_start = Some(at);
        self
    }

    pub fn with_schedule_target(mut self, at: DateTime<Utc>) -> Self {
        self.schedule_target = Some(at);
        self
    }

    pub fn with_effort(mut self, hours: f64) -> Self {
        self.effort = Some(hours);
        self
    }

    pub fn with_constraint(mut self, constraint: ResourceConstraint) -> Self {
        self.resource_constraints.push(constraint);
        self
    }

    /// Whether this task is a group container.
    pub fn is_group(&self) -> bool {
        self.designation == TaskDesignation::Group
    }

    /// Whether this task has no parent.
    pub fn is_top_level(&self) -> bool {
        self.parent.is_none()
    }

    /// Whether this task has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// The date this task pins on a timeline without any allocation.
    ///
    /// Requirements show their earliest start, milestones their target.
    /// Other designations return `None`.
    pub fn timeline_date(&self) -> Option<DateTime<Utc>> {
        match self.designation {
            TaskDesignation::Requirement => self.earliest_start,
            TaskDesignation::Milestone => self.schedule_target,
            TaskDesignation::Task | TaskDesignation::Group => None,
        }
    }
}
