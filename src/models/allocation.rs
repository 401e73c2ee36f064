//! Allocation (plan entry) model.
//!
//! An allocation assigns a set of resources to a task over a time interval.
//! The backend produces two kinds: tentative `Plan` entries computed by the
//! scheduler, and user-confirmed `Booking` entries. The client adds a third,
//! untyped kind: synthetic roll-up records for group tasks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ResourceId, TaskId};

/// Backend identity of an allocation. Synthetic allocations use `-task_id`.
pub type AllocationId = i32;

/// Kind of a backend allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AllocationType {
    /// Computed by the scheduler; replaced on every recalculation.
    Plan,
    /// Entered by a user; kept across recalculations.
    Booking,
}

/// A closed date range `[start, end]` covering some timeline content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateBounds {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateBounds {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Zero-length bounds at a single instant.
    pub fn at(instant: DateTime<Utc>) -> Self {
        Self::new(instant, instant)
    }

    /// Smallest bounds covering both.
    pub fn union(self, other: Self) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Widens the bounds to include `instant`.
    pub fn include(self, instant: DateTime<Utc>) -> Self {
        self.union(Self::at(instant))
    }

    /// Union over an iterator of bounds; `None` when empty.
    pub fn enclosing<I>(bounds: I) -> Option<Self>
    where
        I: IntoIterator<Item = DateBounds>,
    {
        bounds.into_iter().reduce(Self::union)
    }

    pub fn duration(&self) -> chrono::Duration {
        self.end - self.start
    }
}

/// An allocation with references checked against the current directories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub id: AllocationId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// `None` for synthetic roll-up records.
    pub allocation_type: Option<AllocationType>,
    /// Whether a booking is locked against further edits.
    pub is_final: bool,
    /// `None` when the task could not be resolved.
    pub task: Option<TaskId>,
    /// Resolved resources only; unknown ids are filtered out.
    pub resources: Vec<ResourceId>,
}

impl Allocation {
    /// Creates an allocation with no task and no resources.
    pub fn new(
        id: AllocationId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        allocation_type: Option<AllocationType>,
    ) -> Self {
        Self {
            id,
            start,
            end,
            allocation_type,
            is_final: false,
            task: None,
            resources: Vec::new(),
        }
    }

    /// A roll-up record covering `bounds` for `task`.
    ///
    /// The id is `-task`; `i32::MIN` saturates to `i32::MAX`.
    pub fn synthetic(task: TaskId, bounds: DateBounds) -> Self {
        let id = task.checked_neg().unwrap_or(AllocationId::MAX);
        Self::new(id, bounds.start, bounds.end, None).with_task(task)
    }

    pub fn with_task(mut self, task: TaskId) -> Self {
        self.task = Some(task);
        self
    }

    pub fn with_resources(mut self, resources: Vec<ResourceId>) -> Self {
        self.resources = resources;
        self
    }

    pub fn finalized(mut self) -> Self {
        self.is_final = true;
        self
    }

    pub fn bounds(&self) -> DateBounds {
        DateBounds::new(self.start, self.end)
    }

    #[inline]
    pub fn duration(&self) -> chrono::Duration {
        self.end - self.start
    }

    pub fn is_booking(&self) -> bool {
        self.allocation_type == Some(AllocationType::Booking)
    }

    pub fn is_plan(&self) -> bool {
        self.allocation_type == Some(AllocationType::Plan)
    }

    /// Whether this is a client-side roll-up record.
    pub fn is_synthetic(&self) -> bool {
        self.allocation_type.is_none()
    }
}
