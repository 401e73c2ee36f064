//! Client-side domain models.
//!
//! Every type here is rebuilt from a query result; nothing is persisted.
//! Cross-entity links are stored as backend ids.
//!
//! # Entity Map
//!
//! | Model | Backend type | Linked to |
//! |-------|--------------|-----------|
//! | Task | `Task` | parent, children, predecessors, successors, resources |
//! | Resource | `Resource` | holiday, vacations |
//! | Allocation | `Allocation` | task, resources |
//! | Issue | `Issue` | task |

mod allocation;
mod availability;
mod calculation;
mod issue;
mod resource;
mod task;

pub use allocation::{Allocation, AllocationId, AllocationType, DateBounds};
pub use availability::{Availability, Weekday};
pub use calculation::CalculationState;
pub use issue::{Issue, IssueCode, IssueType};
pub use resource::{Country, Holiday, Region, Resource, ResourceId, Vacation};
pub use task::{ResourceConstraint, Task, TaskDesignation, TaskId};
