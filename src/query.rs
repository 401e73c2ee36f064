//! GraphQL wire contract.
//!
//! Query documents, the shapes of their results, and mutation inputs.
//! Field names follow the backend schema (`camelCase`); references to other
//! entities arrive as shallow `{ dbId }` objects and are resolved by the
//! builders in [`graph`](crate::graph), [`directory`](crate::directory) and
//! [`plan`](crate::plan).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{
    AllocationId, AllocationType, Availability, CalculationState, Country, IssueCode, IssueType,
    Region, Resource, ResourceId, Task, TaskDesignation, TaskId, Weekday,
};

// =============================================================================
// Documents
// =============================================================================

pub const TASKS_QUERY: &str = r#"
query tasks {
  tasks {
    dbId
    title
    description
    designation
    parent { dbId }
    predecessors { dbId }
    earliestStart
    scheduleTarget
    effort
    resourceConstraints {
      optional
      speed
      entries { resource { dbId } }
    }
  }
}"#;

pub const RESOURCES_QUERY: &str = r#"
query resources {
  resources {
    dbId
    name
    timezone
    added
    removed
    vacation { dbId from until }
    holiday {
      dbId
      name
      country { name isocode }
      region { name isocode }
    }
    availability { weekday duration }
  }
}"#;

pub const PLAN_QUERY: &str = r#"
query plan {
  currentPlan {
    allocations {
      dbId
      start
      end
      allocationType
      final
      task { dbId }
      resources { dbId }
    }
  }
}"#;

pub const ISSUES_QUERY: &str = r#"
query issues {
  issues {
    dbId
    code
    description
    type
    task { dbId }
  }
}"#;

pub const COMBINED_AVAILABILITY_QUERY: &str = r#"
query combinedAvailability($start: DateTime!, $end: DateTime!) {
  resources {
    dbId
    combinedAvailability(start: $start, end: $end) { start end }
  }
}"#;

pub const COUNTRIES_QUERY: &str = r#"
query GetCountries {
  countries { isocode name }
}"#;

pub const REGIONS_QUERY: &str = r#"
query GetRegions($isocode: String!) {
  country(isocode: $isocode) {
    regions { name isocode }
  }
}"#;

pub const HOLIDAY_QUERY: &str = r#"
query GetHoliday($isocode: String!) {
  getFromOpenHolidays(isocode: $isocode) {
    dbId
    name
    country { name isocode }
    region { name isocode }
  }
}"#;

pub const TASK_SAVE_MUTATION: &str = r#"
mutation task_save($task: TaskSaveInput!) {
  taskSave(task: $task) { dbId }
}"#;

pub const TASK_DELETE_MUTATION: &str = r#"
mutation task_delete($taskId: Int!) {
  taskDelete(taskId: $taskId)
}"#;

pub const RESOURCE_SAVE_MUTATION: &str = r#"
mutation resource_save($resource: ResourceSaveInput!) {
  resourceSave(resource: $resource) { dbId }
}"#;

pub const RESOURCE_DELETE_MUTATION: &str = r#"
mutation resource_delete($resourceId: Int!) {
  resourceDelete(resourceId: $resourceId)
}"#;

pub const BOOKING_SAVE_MUTATION: &str = r#"
mutation bookingSave($dbId: Int, $taskId: Int!, $start: DateTime!, $end: DateTime!, $resources: [Int!]!, $final: Boolean!) {
  bookingSave(dbId: $dbId, taskId: $taskId, start: $start, end: $end, resources: $resources, final: $final) { dbId }
}"#;

pub const BOOKING_DELETE_MUTATION: &str = r#"
mutation bookingDelete($dbId: Int!) { bookingDelete(dbId: $dbId) }"#;

pub const RECALCULATE_MUTATION: &str = r#"
mutation recalculate { recalculateNow }"#;

pub const CALCULATION_SUBSCRIPTION: &str = r#"
subscription calcUpdate {
  calculationUpdate { state }
}"#;

// =============================================================================
// Query results
// =============================================================================

/// Shallow reference to another entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdRef {
    pub db_id: i32,
}

impl From<i32> for IdRef {
    fn from(db_id: i32) -> Self {
        Self { db_id }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TasksQuery {
    pub tasks: Vec<TaskRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub db_id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub designation: TaskDesignation,
    #[serde(default)]
    pub parent: Option<IdRef>,
    #[serde(default)]
    pub predecessors: Vec<IdRef>,
    #[serde(default)]
    pub earliest_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub schedule_target: Option<DateTime<Utc>>,
    #[serde(default)]
    pub effort: Option<f64>,
    #[serde(default)]
    pub resource_constraints: Vec<ResourceConstraintRecord>,
}

impl TaskRecord {
    /// A bare record, handy for fixtures.
    pub fn new(db_id: TaskId, title: impl Into<String>) -> Self {
        Self {
            db_id,
            title: title.into(),
            description: String::new(),
            designation: TaskDesignation::Task,
            parent: None,
            predecessors: Vec::new(),
            earliest_start: None,
            schedule_target: None,
            effort: None,
            resource_constraints: Vec::new(),
        }
    }

    pub fn with_designation(mut self, designation: TaskDesignation) -> Self {
        self.designation = designation;
        self
    }

    pub fn with_parent(mut self, parent: TaskId) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_predecessor(mut self, predecessor: TaskId) -> Self {
        self.predecessors.push(predecessor.into());
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
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceConstraintRecord {
    pub optional: bool,
    pub speed: f64,
    #[serde(default)]
    pub entries: Vec<ResourceConstraintEntryRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceConstraintEntryRecord {
    pub resource: IdRef,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourcesQuery {
    pub resources: Vec<ResourceRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRecord {
    pub db_id: ResourceId,
    pub name: String,
    pub timezone: String,
    pub added: DateTime<Utc>,
    #[serde(default)]
    pub removed: Option<DateTime<Utc>>,
    #[serde(default)]
    pub vacation: Vec<VacationRecord>,
    #[serde(default)]
    pub holiday: Option<HolidayRecord>,
    #[serde(default)]
    pub availability: Vec<AvailabilityRecord>,
}

impl ResourceRecord {
    pub fn new(db_id: ResourceId, name: impl Into<String>, added: DateTime<Utc>) -> Self {
        Self {
            db_id,
            name: name.into(),
            timezone: "UTC".to_string(),
            added,
            removed: None,
            vacation: Vec::new(),
            holiday: None,
            availability: Vec::new(),
        }
    }

    pub fn with_availability(mut self, weekday: Weekday, duration: i32) -> Self {
        self.availability.push(AvailabilityRecord { weekday, duration });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VacationRecord {
    pub db_id: i32,
    pub from: DateTime<Utc>,
    pub until: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HolidayRecord {
    pub db_id: i32,
    pub name: String,
    #[serde(default)]
    pub country: Option<Country>,
    #[serde(default)]
    pub region: Option<Region>,
}

/// One weekday's availability; `duration` is in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityRecord {
    pub weekday: Weekday,
    pub duration: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanQuery {
    pub current_plan: PlanRecord,
}

impl PlanQuery {
    pub fn new(allocations: Vec<AllocationRecord>) -> Self {
        Self {
            current_plan: PlanRecord { allocations },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanRecord {
    pub allocations: Vec<AllocationRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationRecord {
    pub db_id: AllocationId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub allocation_type: Option<AllocationType>,
    #[serde(default, rename = "final")]
    pub is_final: bool,
    pub task: IdRef,
    #[serde(default)]
    pub resources: Vec<IdRef>,
}

impl AllocationRecord {
    pub fn new(db_id: AllocationId, task: TaskId, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            db_id,
            start,
            end,
            allocation_type: Some(AllocationType::Plan),
            is_final: false,
            task: task.into(),
            resources: Vec::new(),
        }
    }

    pub fn with_type(mut self, allocation_type: AllocationType) -> Self {
        self.allocation_type = Some(allocation_type);
        self
    }

    pub fn with_resources(mut self, resources: &[ResourceId]) -> Self {
        self.resources = resources.iter().map(|&r| r.into()).collect();
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IssuesQuery {
    pub issues: Vec<IssueRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueRecord {
    pub db_id: i32,
    pub code: IssueCode,
    pub description: String,
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    #[serde(default)]
    pub task: Option<IdRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CombinedAvailabilityQuery {
    pub resources: Vec<CombinedAvailabilityRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedAvailabilityRecord {
    pub db_id: ResourceId,
    #[serde(default)]
    pub combined_availability: Vec<IntervalRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalRecord {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CountriesQuery {
    pub countries: Vec<Country>,
}

/// Result of [`REGIONS_QUERY`]; `country` is null for an unknown isocode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionsQuery {
    #[serde(default)]
    pub country: Option<CountryRegionsRecord>,
}

impl RegionsQuery {
    pub fn into_regions(self) -> Vec<Region> {
        self.country.map(|c| c.regions).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CountryRegionsRecord {
    #[serde(default)]
    pub regions: Vec<Region>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HolidayQuery {
    #[serde(default)]
    pub get_from_open_holidays: Option<HolidayRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationUpdate {
    pub state: CalculationState,
}

// =============================================================================
// Mutation inputs and payloads
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSaveInput {
    /// `None` creates a new task.
    pub db_id: Option<TaskId>,
    pub title: String,
    pub description: String,
    pub designation: TaskDesignation,
    pub earliest_start: Option<DateTime<Utc>>,
    pub schedule_target: Option<DateTime<Utc>>,
    pub effort: Option<f64>,
    pub parent_id: Option<TaskId>,
    pub children: Vec<TaskId>,
    pub predecessors: Vec<TaskId>,
    pub successors: Vec<TaskId>,
    pub resource_constraints: Vec<ResourceConstraintInput>,
}

impl TaskSaveInput {
    /// Input for a task that does not exist yet.
    pub fn create(title: impl Into<String>, designation: TaskDesignation) -> Self {
        Self {
            db_id: None,
            title: title.into(),
            description: String::new(),
            designation,
            earliest_start: None,
            schedule_target: None,
            effort: None,
            parent_id: None,
            children: Vec::new(),
            predecessors: Vec::new(),
            successors: Vec::new(),
            resource_constraints: Vec::new(),
        }
    }

    pub fn is_new(&self) -> bool {
        self.db_id.is_none()
    }
}

impl From<&Task> for TaskSaveInput {
    fn from(task: &Task) -> Self {
        Self {
            db_id: Some(task.id),
            title: task.title.clone(),
            description: task.description.clone(),
            designation: task.designation,
            earliest_start: task.earliest_start,
            schedule_target: task.schedule_target,
            effort: task.effort,
            parent_id: task.parent,
            children: task.children.clone(),
            predecessors: task.predecessors.clone(),
            successors: task.successors.clone(),
            resource_constraints: task
                .resource_constraints
                .iter()
                .map(|c| ResourceConstraintInput {
                    optional: c.optional,
                    speed: c.speed,
                    entries: c
                        .resources
                        .iter()
                        .map(|&resource_id| ResourceConstraintEntryInput { resource_id })
                        .collect(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceConstraintInput {
    pub optional: bool,
    pub speed: f64,
    pub entries: Vec<ResourceConstraintEntryInput>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceConstraintEntryInput {
    pub resource_id: ResourceId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSaveInput {
    /// `None` creates a new resource.
    pub db_id: Option<ResourceId>,
    pub name: String,
    pub timezone: String,
    pub added: DateTime<Utc>,
    pub removed: Option<DateTime<Utc>>,
    pub holiday_id: Option<i32>,
    pub availability: Vec<AvailabilityRecord>,
    pub added_vacations: Vec<VacationInput>,
    pub removed_vacations: Vec<i32>,
}

impl ResourceSaveInput {
    /// Input for a resource that does not exist yet.
    pub fn create(name: impl Into<String>, timezone: impl Into<String>, added: DateTime<Utc>) -> Self {
        Self {
            db_id: None,
            name: name.into(),
            timezone: timezone.into(),
            added,
            removed: None,
            holiday_id: None,
            availability: Vec::new(),
            added_vacations: Vec::new(),
            removed_vacations: Vec::new(),
        }
    }

    /// Replaces the availability entries with the seven slots of `availability`.
    pub fn with_availability(mut self, availability: &Availability) -> Self {
        self.availability = availability
            .to_entries()
            .into_iter()
            .map(|(weekday, duration)| AvailabilityRecord { weekday, duration })
            .collect();
        self
    }

    pub fn is_new(&self) -> bool {
        self.db_id.is_none()
    }
}

/// Availability is sent only when the backend reported it or a caller set
/// it; a filled-in default week stays client-side.
impl From<&Resource> for ResourceSaveInput {
    fn from(resource: &Resource) -> Self {
        let input = Self {
            db_id: Some(resource.id),
            name: resource.name.clone(),
            timezone: resource.timezone.clone(),
            added: resource.added,
            removed: resource.removed,
            holiday_id: resource.holiday.as_ref().map(|h| h.id),
            availability: Vec::new(),
            added_vacations: Vec::new(),
            removed_vacations: Vec::new(),
        };
        match &resource.availability {
            Some(a) if resource.availability_reported => input.with_availability(a),
            _ => input,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VacationInput {
    pub from: DateTime<Utc>,
    pub until: DateTime<Utc>,
}

/// Variables of the `bookingSave` mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingSaveInput {
    /// `None` creates a new booking.
    pub db_id: Option<AllocationId>,
    pub task_id: TaskId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub resources: Vec<ResourceId>,
    #[serde(rename = "final")]
    pub is_final: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSavePayload {
    pub task_save: IdRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDeletePayload {
    pub task_delete: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSavePayload {
    pub resource_save: IdRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDeletePayload {
    pub resource_delete: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingSavePayload {
    pub booking_save: IdRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDeletePayload {
    pub booking_delete: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecalculatePayload {
    pub recalculate_now: bool,
}
