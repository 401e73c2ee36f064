//! Plan aggregator.
//!
//! Joins the allocations of the current plan against a [`TaskGraph`] and a
//! [`ResourceDirectory`], and derives the lookups a timeline view needs:
//!
//! - allocations by id, by task and by resource,
//! - overall plan bounds,
//! - per-task bounds, rolled up recursively for group tasks,
//! - one synthetic allocation per task that has bounds but no allocations
//!   of its own, so group roll-ups render like ordinary entries.
//!
//! # Resolution
//! An allocation whose task is unknown is kept with `task: None`.
//! Unknown resources are filtered out of `resources`.
//!
//! # Bounds
//! Plan bounds are `min(start)` / `max(end)` over all allocations, widened
//! by requirement start dates and milestone targets. With nothing to
//! measure, both ends are "now".

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::directory::ResourceDirectory;
use crate::graph::TaskGraph;
use crate::models::{Allocation, AllocationId, AllocationType, DateBounds, ResourceId, TaskId};
use crate::query::{BookingSaveInput, PlanQuery};

/// Allocations of the current plan with derived lookups.
#[derive(Debug, Clone)]
pub struct PlanView {
    /// Real allocations first, then synthetic ones.
    entries: Vec<Allocation>,
    real_count: usize,
    by_id: HashMap<AllocationId, usize>,
    by_task: HashMap<TaskId, Vec<usize>>,
    by_resource: HashMap<ResourceId, Vec<usize>>,
    resource_order: Vec<ResourceId>,
    task_bounds: HashMap<TaskId, DateBounds>,
    bounds: DateBounds,
}

impl PlanView {
    /// An empty plan whose bounds collapse to `now`.
    pub fn empty_at(now: DateTime<Utc>) -> Self {
        Self {
            entries: Vec::new(),
            real_count: 0,
            by_id: HashMap::new(),
            by_task: HashMap::new(),
            by_resource: HashMap::new(),
            resource_order: Vec::new(),
            task_bounds: HashMap::new(),
            bounds: DateBounds::at(now),
        }
    }

    /// Builds the view using the current time as the empty-bounds fallback.
    pub fn build(query: &PlanQuery, tasks: &TaskGraph, resources: &ResourceDirectory) -> Self {
        Self::build_at(query, tasks, resources, Utc::now())
    }

    /// Builds the view with an explicit "now".
    pub fn build_at(
        query: &PlanQuery,
        tasks: &TaskGraph,
        resources: &ResourceDirectory,
        now: DateTime<Utc>,
    ) -> Self {
        let mut entries: Vec<Allocation> = query
            .current_plan
            .allocations
            .iter()
            .map(|a| {
                let resolved = a
                    .resources
                    .iter()
                    .map(|r| r.db_id)
                    .filter(|id| resources.contains(*id))
                    .collect();
                let mut allocation = Allocation::new(a.db_id, a.start, a.end, a.allocation_type)
                    .with_resources(resolved);
                if tasks.contains(a.task.db_id) {
                    allocation = allocation.with_task(a.task.db_id);
                }
                if a.is_final {
                    allocation = allocation.finalized();
                }
                allocation
            })
            .collect();
        let real_count = entries.len();

        let mut by_id = HashMap::with_capacity(real_count);
        let mut by_task: HashMap<TaskId, Vec<usize>> = HashMap::new();
        let mut by_resource: HashMap<ResourceId, Vec<usize>> = HashMap::new();
        let mut resource_order = Vec::new();
        for (idx, a) in entries.iter().enumerate() {
            by_id.insert(a.id, idx);
            if let Some(task) = a.task {
                by_task.entry(task).or_default().push(idx);
            }
            for &r in &a.resources {
                let slot = by_resource.entry(r).or_insert_with(|| {
                    resource_order.push(r);
                    Vec::new()
                });
                slot.push(idx);
            }
        }

        let mut rollup = BoundsRollup::new(tasks, &entries, &by_task);
        for t in tasks.tasks() {
            rollup.bounds(t.id);
        }
        let task_bounds: HashMap<TaskId, DateBounds> = rollup
            .memo
            .into_iter()
            .filter_map(|(id, b)| b.map(|b| (id, b)))
            .collect();

        let mut synthetic = 0usize;
        for t in tasks.tasks() {
            if by_task.contains_key(&t.id) {
                continue;
            }
            if let Some(b) = task_bounds.get(&t.id) {
                by_task.insert(t.id, vec![entries.len()]);
                entries.push(Allocation::synthetic(t.id, *b));
                synthetic += 1;
            }
        }

        let bounds = plan_bounds(&entries[..real_count], tasks).unwrap_or(DateBounds::at(now));
        debug!(
            allocations = real_count,
            synthetic,
            resources = resource_order.len(),
            "built plan view"
        );

        Self {
            entries,
            real_count,
            by_id,
            by_task,
            by_resource,
            resource_order,
            task_bounds,
            bounds,
        }
    }

    /// Backend allocations, without synthetic roll-ups.
    pub fn allocations(&self) -> &[Allocation] {
        &self.entries[..self.real_count]
    }

    /// Looks up a backend allocation by id.
    pub fn allocation(&self, id: AllocationId) -> Option<&Allocation> {
        self.by_id.get(&id).map(|&i| &self.entries[i])
    }

    /// Allocations of a task; a synthetic roll-up for groups.
    pub fn by_task(&self, task: TaskId) -> Vec<&Allocation> {
        self.collect(self.by_task.get(&task))
    }

    /// Allocations that involve a resource.
    pub fn by_resource(&self, resource: ResourceId) -> Vec<&Allocation> {
        self.collect(self.by_resource.get(&resource))
    }

    /// Resources with at least one allocation, in first-seen order.
    pub fn resource_ids(&self) -> &[ResourceId] {
        &self.resource_order
    }

    /// Bounds of a single task, if it has any.
    pub fn task_bounds(&self, task: TaskId) -> Option<DateBounds> {
        self.task_bounds.get(&task).copied()
    }

    pub fn bounds(&self) -> DateBounds {
        self.bounds
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.bounds.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.bounds.end
    }

    /// Booking-type allocations of a task.
    pub fn bookings_by_task(&self, task: TaskId) -> Vec<&Allocation> {
        self.by_task(task)
            .into_iter()
            .filter(|a| a.is_booking())
            .collect()
    }

    /// A booking draft for `task`, copied from its earliest plan allocation.
    ///
    /// Without a plan allocation the draft spans the `fallback` period
    /// ending at `now` and names no resources.
    pub fn booking_template(
        &self,
        task: TaskId,
        now: DateTime<Utc>,
        fallback: Duration,
    ) -> BookingSaveInput {
        let source = self
            .by_task(task)
            .into_iter()
            .filter(|a| a.allocation_type.unwrap_or(AllocationType::Plan) == AllocationType::Plan)
            .filter(|a| !a.is_synthetic())
            .min_by_key(|a| a.start);
        match source {
            Some(a) => BookingSaveInput {
                db_id: None,
                task_id: task,
                start: a.start,
                end: a.end,
                resources: a.resources.clone(),
                is_final: false,
            },
            None => BookingSaveInput {
                db_id: None,
                task_id: task,
                start: now
                    .checked_sub_signed(fallback)
                    .unwrap_or(DateTime::<Utc>::MIN_UTC),
                end: now,
                resources: Vec::new(),
                is_final: false,
            },
        }
    }

    fn collect(&self, idx: Option<&Vec<usize>>) -> Vec<&Allocation> {
        idx.map(|v| v.iter().map(|&i| &self.entries[i]).collect())
            .unwrap_or_default()
    }
}

impl Default for PlanView {
    fn default() -> Self {
        Self::empty_at(Utc::now())
    }
}

fn plan_bounds(allocations: &[Allocation], tasks: &TaskGraph) -> Option<DateBounds> {
    let from_allocations = DateBounds::enclosing(allocations.iter().map(Allocation::bounds));
    tasks
        .tasks()
        .filter_map(|t| t.timeline_date())
        .fold(from_allocations, |acc, date| {
            Some(acc.map_or(DateBounds::at(date), |b| b.include(date)))
        })
}

/// Memoized per-task bounds.
///
/// Non-group tasks use their own allocations. Group tasks take the union of
/// their children's bounds. A task reached again while its own bounds are
/// still being computed contributes nothing, so malformed hierarchies
/// terminate.
struct BoundsRollup<'a> {
    tasks: &'a TaskGraph,
    entries: &'a [Allocation],
    by_task: &'a HashMap<TaskId, Vec<usize>>,
    memo: HashMap<TaskId, Option<DateBounds>>,
    visiting: HashSet<TaskId>,
}

impl<'a> BoundsRollup<'a> {
    fn new(
        tasks: &'a TaskGraph,
        entries: &'a [Allocation],
        by_task: &'a HashMap<TaskId, Vec<usize>>,
    ) -> Self {
        Self {
            tasks,
            entries,
            by_task,
            memo: HashMap::new(),
            visiting: HashSet::new(),
        }
    }

    fn bounds(&mut self, id: TaskId) -> Option<DateBounds> {
        if let Some(b) = self.memo.get(&id) {
            return *b;
        }
        if !self.visiting.insert(id) {
            return None;
        }
        let tasks = self.tasks;
        let result = match tasks.task(id) {
            Some(task) if task.is_group() => {
                DateBounds::enclosing(task.children.iter().filter_map(|&c| self.bounds(c)))
            }
            Some(_) => self.by_task.get(&id).and_then(|idx| {
                DateBounds::enclosing(idx.iter().map(|&i| self.entries[i].bounds()))
            }),
            None => None,
        };
        self.visiting.remove(&id);
        self.memo.insert(id, result);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskDesignation;
    use crate::query::{AllocationRecord, ResourceRecord, TaskRecord};
    use chrono::TimeZone;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, d, 0, 0, 0).unwrap()
    }

    fn directory() -> ResourceDirectory {
        ResourceDirectory::build(
            &[
                ResourceRecord::new(1, "Alice", day(1)),
                ResourceRecord::new(2, "Bob", day(1)),
            ],
            None,
        )
    }

    fn group_graph() -> TaskGraph {
        // 10 (group) -> 11, 12
        TaskGraph::build(&[
            TaskRecord::new(10, "Group").with_designation(TaskDesignation::Group),
            TaskRecord::new(11, "A").with_parent(10),
            TaskRecord::new(12, "B").with_parent(10),
        ])
    }

    #[test]
    fn test_empty_plan_bounds_are_now() {
        let now = day(15);
        let view = PlanView::build_at(
            &PlanQuery::default(),
            &TaskGraph::default(),
            &ResourceDirectory::default(),
            now,
        );
        assert_eq!(view.start(), now);
        assert_eq!(view.end(), now);
        assert!(view.allocations().is_empty());
        assert!(view.resource_ids().is_empty());
    }

    #[test]
    fn test_group_bounds_union_of_children() {
        let query = PlanQuery::new(vec![
            AllocationRecord::new(1, 11, day(1), day(2)).with_resources(&[1]),
            AllocationRecord::new(2, 12, day(3), day(5)).with_resources(&[2]),
        ]);
        let view = PlanView::build_at(&query, &group_graph(), &directory(), day(20));

        assert_eq!(view.task_bounds(10), Some(DateBounds::new(day(1), day(5))));
        let rollup = view.by_task(10);
        assert_eq!(rollup.len(), 1);
        assert!(rollup[0].is_synthetic());
        assert_eq!(rollup[0].id, -10);
        assert_eq!(rollup[0].start, day(1));
        assert_eq!(rollup[0].end, day(5));
        assert!(rollup[0].resources.is_empty());

        // synthetic entries never show up in the backend-facing lookups
        assert_eq!(view.allocations().len(), 2);
        assert!(view.allocation(-10).is_none());
        assert_eq!(view.start(), day(1));
        assert_eq!(view.end(), day(5));
    }

    #[test]
    fn test_nested_group_rollup() {
        let tasks = TaskGraph::build(&[
            TaskRecord::new(1, "Top").with_designation(TaskDesignation::Group),
            TaskRecord::new(2, "Mid")
                .with_designation(TaskDesignation::Group)
                .with_parent(1),
            TaskRecord::new(3, "Leaf").with_parent(2),
            TaskRecord::new(4, "Other").with_parent(1),
        ]);
        let query = PlanQuery::new(vec![
            AllocationRecord::new(1, 3, day(4), day(6)),
            AllocationRecord::new(2, 4, day(2), day(3)),
        ]);
        let view = PlanView::build_at(&query, &tasks, &directory(), day(20));
        assert_eq!(view.task_bounds(2), Some(DateBounds::new(day(4), day(6))));
        assert_eq!(view.task_bounds(1), Some(DateBounds::new(day(2), day(6))));
        assert_eq!(view.by_task(1)[0].id, -1);
        assert_eq!(view.by_task(2)[0].id, -2);
    }

    #[test]
    fn test_group_without_allocations_has_no_rollup() {
        let view = PlanView::build_at(&PlanQuery::default(), &group_graph(), &directory(), day(9));
        assert!(view.task_bounds(10).is_none());
        assert!(view.by_task(10).is_empty());
    }

    #[test]
    fn test_unresolved_references() {
        let query = PlanQuery::new(vec![
            AllocationRecord::new(1, 999, day(1), day(2)).with_resources(&[1, 77]),
        ]);
        let view = PlanView::build_at(&query, &group_graph(), &directory(), day(9));
        let a = view.allocation(1).unwrap();
        assert!(a.task.is_none());
        assert_eq!(a.resources, vec![1]);
        assert!(view.by_task(999).is_empty());
        assert_eq!(view.by_resource(1).len(), 1);
        assert!(view.by_resource(77).is_empty());
        assert_eq!(view.resource_ids(), &[1]);
    }

    #[test]
    fn test_by_resource_grouping() {
        let query = PlanQuery::new(vec![
            AllocationRecord::new(1, 11, day(1), day(2)).with_resources(&[2, 1]),
            AllocationRecord::new(2, 12, day(3), day(4)).with_resources(&[1]),
        ]);
        let view = PlanView::build_at(&query, &group_graph(), &directory(), day(9));
        assert_eq!(view.resource_ids(), &[2, 1]);
        let ids: Vec<AllocationId> = view.by_resource(1).iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_resolved_allocation_fields() {
        let mut booking = AllocationRecord::new(5, 11, day(1), day(2))
            .with_type(AllocationType::Booking)
            .with_resources(&[1]);
        booking.is_final = true;
        let view = PlanView::build_at(&PlanQuery::new(vec![booking]), &group_graph(), &directory(), day(9));
        let a = view.allocation(5).unwrap();
        assert_eq!(a.task, Some(11));
        assert_eq!(a.resources, vec![1]);
        assert!(a.is_booking());
        assert!(a.is_final);
        assert_eq!(a.bounds(), DateBounds::new(day(1), day(2)));
    }

    #[test]
    fn test_task_dates_widen_plan_bounds() {
        let tasks = TaskGraph::build(&[
            TaskRecord::new(1, "Input")
                .with_designation(TaskDesignation::Requirement)
                .with_earliest_start(day(1)),
            TaskRecord::new(2, "Release")
                .with_designation(TaskDesignation::Milestone)
                .with_schedule_target(day(28)),
            TaskRecord::new(3, "Work").with_earliest_start(day(2)),
        ]);
        let query = PlanQuery::new(vec![AllocationRecord::new(1, 3, day(10), day(12))]);
        let view = PlanView::build_at(&query, &tasks, &directory(), day(15));
        assert_eq!(view.start(), day(1));
        assert_eq!(view.end(), day(28));
    }

    #[test]
    fn test_task_dates_without_allocations() {
        let tasks = TaskGraph::build(&[TaskRecord::new(1, "Release")
            .with_designation(TaskDesignation::Milestone)
            .with_schedule_target(day(7))]);
        let view = PlanView::build_at(&PlanQuery::default(), &tasks, &directory(), day(20));
        assert_eq!(view.bounds(), DateBounds::at(day(7)));
    }

    #[test]
    fn test_hierarchy_cycle_terminates() {
        let tasks = TaskGraph::build(&[
            TaskRecord::new(1, "A")
                .with_designation(TaskDesignation::Group)
                .with_parent(2),
            TaskRecord::new(2, "B")
                .with_designation(TaskDesignation::Group)
                .with_parent(1),
        ]);
        let view = PlanView::build_at(&PlanQuery::default(), &tasks, &directory(), day(3));
        assert!(view.task_bounds(1).is_none());
        assert!(view.task_bounds(2).is_none());
    }

    #[test]
    fn test_bookings_and_template() {
        let query = PlanQuery::new(vec![
            AllocationRecord::new(1, 11, day(5), day(6)).with_resources(&[1]),
            AllocationRecord::new(2, 11, day(3), day(4)).with_resources(&[2]),
            AllocationRecord::new(3, 11, day(1), day(2)).with_type(AllocationType::Booking),
        ]);
        let view = PlanView::build_at(&query, &group_graph(), &directory(), day(20));

        let bookings: Vec<AllocationId> =
            view.bookings_by_task(11).iter().map(|a| a.id).collect();
        assert_eq!(bookings, vec![3]);

        let draft = view.booking_template(11, day(20), Duration::days(7));
        assert_eq!(draft.start, day(3));
        assert_eq!(draft.end, day(4));
        assert_eq!(draft.resources, vec![2]);
        assert!(draft.db_id.is_none());
        assert!(!draft.is_final);
    }

    #[test]
    fn test_booking_template_fallback() {
        let view = PlanView::build_at(&PlanQuery::default(), &group_graph(), &directory(), day(20));
        let draft = view.booking_template(11, day(20), Duration::days(7));
        assert_eq!(draft.start, day(13));
        assert_eq!(draft.end, day(20));
        assert!(draft.resources.is_empty());
        assert_eq!(draft.task_id, 11);
    }

    #[test]
    fn test_booking_template_huge_fallback_saturates() {
        let view = PlanView::build_at(&PlanQuery::default(), &group_graph(), &directory(), day(20));
        let draft = view.booking_template(11, day(20), Duration::MAX);
        assert_eq!(draft.start, DateTime::<Utc>::MIN_UTC);
        assert_eq!(draft.end, day(20));
    }
}
