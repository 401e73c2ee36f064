//! Stateful stores.
//!
//! Each store owns the latest snapshot of one query, rebuilt atomically from
//! every successful fetch and shared out as an `Arc`. A failed fetch keeps
//! the previous snapshot. Mutations are awaited, then followed by a refetch;
//! their errors are logged, recorded per operation and handed back as a
//! message instead of being propagated.
//!
//! [`Workspace`] bundles the four stores with the side-panel
//! [`NavigationStack`] and keeps the derived views in step.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::backend::SchedulingBackend;
use crate::config::ClientConfig;
use crate::directory::{combined_availability, ResourceDirectory};
use crate::error::{ClientError, Result};
use crate::graph::TaskGraph;
use crate::issues::IssueIndex;
use crate::models::{
    AllocationId, Availability, CalculationState, Country, DateBounds, Holiday, Region, ResourceId,
    TaskId,
};
use crate::navigation::{NavigationStack, PanelEntry};
use crate::plan::PlanView;
use crate::query::{
    BookingSaveInput, IssuesQuery, PlanQuery, ResourceSaveInput, ResourcesQuery, TaskSaveInput,
    TasksQuery,
};
use crate::validation::{validate_snapshot, ValidationResult};

/// Outcome of a mutation: the server's answer, or the error message.
pub type MutationOutcome<T> = std::result::Result<T, String>;

/// Last error per operation, cleared on the operation's next success.
#[derive(Debug, Clone, Default)]
pub struct OperationErrors {
    slots: BTreeMap<&'static str, String>,
}

impl OperationErrors {
    fn record(&mut self, operation: &'static str, message: String) {
        self.slots.insert(operation, message);
    }

    fn clear(&mut self, operation: &'static str) {
        self.slots.remove(operation);
    }

    pub fn get(&self, operation: &str) -> Option<&str> {
        self.slots.get(operation).map(String::as_str)
    }

    /// `(operation, message)` pairs ordered by operation name.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.slots.iter().map(|(op, msg)| (*op, msg.as_str()))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

fn query_failed(errors: &mut OperationErrors, operation: &'static str, err: &ClientError) {
    warn!(operation, error = %err, "refetch failed, keeping previous snapshot");
    errors.record(operation, err.to_string());
}

fn mutation_failed(errors: &mut OperationErrors, operation: &'static str, err: ClientError) -> String {
    warn!(operation, error = %err, "mutation failed");
    let message = err.to_string();
    errors.record(operation, message.clone());
    message
}

// =============================================================================
// Tasks
// =============================================================================

/// Latest task graph plus task mutations.
pub struct TaskStore {
    backend: Arc<dyn SchedulingBackend>,
    raw: Arc<TasksQuery>,
    graph: Arc<TaskGraph>,
    loaded: bool,
    errors: OperationErrors,
}

impl TaskStore {
    pub fn new(backend: Arc<dyn SchedulingBackend>) -> Self {
        Self {
            backend,
            raw: Arc::default(),
            graph: Arc::default(),
            loaded: false,
            errors: OperationErrors::default(),
        }
    }

    pub fn graph(&self) -> Arc<TaskGraph> {
        Arc::clone(&self.graph)
    }

    /// The query result the graph was built from.
    pub fn raw(&self) -> Arc<TasksQuery> {
        Arc::clone(&self.raw)
    }

    /// Whether a fetch has succeeded at least once.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn errors(&self) -> &OperationErrors {
        &self.errors
    }

    pub async fn refetch(&mut self) -> Result<()> {
        match self.backend.tasks().await {
            Ok(query) => {
                self.graph = Arc::new(TaskGraph::from_query(&query));
                self.raw = Arc::new(query);
                self.loaded = true;
                self.errors.clear("tasks");
                debug!(tasks = self.graph.len(), "tasks refetched");
                Ok(())
            }
            Err(err) => {
                query_failed(&mut self.errors, "tasks", &err);
                Err(err)
            }
        }
    }

    /// Saves a task and refetches.
    ///
    /// A newly created task replaces the open creation form in `navigation`.
    pub async fn save_task(
        &mut self,
        input: TaskSaveInput,
        navigation: &mut NavigationStack,
    ) -> MutationOutcome<TaskId> {
        let is_new = input.is_new();
        let id = match self.backend.save_task(input).await {
            Ok(id) => id,
            Err(err) => return Err(mutation_failed(&mut self.errors, "save_task", err)),
        };
        self.errors.clear("save_task");
        info!(task = id, created = is_new, "task saved");
        let _ = self.refetch().await;
        if is_new && navigation.active() == Some(&PanelEntry::CreatingTask) {
            navigation.replace(PanelEntry::ViewingTask(id));
        }
        Ok(id)
    }

    /// Deletes a task; on success drops it from `navigation` and refetches.
    pub async fn delete_task(
        &mut self,
        id: TaskId,
        navigation: &mut NavigationStack,
    ) -> MutationOutcome<bool> {
        let deleted = match self.backend.delete_task(id).await {
            Ok(deleted) => deleted,
            Err(err) => return Err(mutation_failed(&mut self.errors, "delete_task", err)),
        };
        self.errors.clear("delete_task");
        if deleted {
            info!(task = id, "task deleted");
            navigation.remove_task(id);
            let _ = self.refetch().await;
        }
        Ok(deleted)
    }
}

// =============================================================================
// Resources
// =============================================================================

/// Latest resource directory plus resource mutations and holiday lookups.
pub struct ResourceStore {
    backend: Arc<dyn SchedulingBackend>,
    default_availability: Option<Availability>,
    raw: Arc<ResourcesQuery>,
    directory: Arc<ResourceDirectory>,
    countries: Vec<Country>,
    loaded: bool,
    errors: OperationErrors,
}

impl ResourceStore {
    pub fn new(backend: Arc<dyn SchedulingBackend>, default_availability: Option<Availability>) -> Self {
        Self {
            backend,
            default_availability,
            raw: Arc::default(),
            directory: Arc::default(),
            countries: Vec::new(),
            loaded: false,
            errors: OperationErrors::default(),
        }
    }

    pub fn directory(&self) -> Arc<ResourceDirectory> {
        Arc::clone(&self.directory)
    }

    pub fn raw(&self) -> Arc<ResourcesQuery> {
        Arc::clone(&self.raw)
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn errors(&self) -> &OperationErrors {
        &self.errors
    }

    /// Countries fetched by [`load_countries`](Self::load_countries).
    pub fn countries(&self) -> &[Country] {
        &self.countries
    }

    pub async fn refetch(&mut self) -> Result<()> {
        match self.backend.resources().await {
            Ok(query) => {
                self.directory = Arc::new(ResourceDirectory::from_query(
                    &query,
                    self.default_availability.as_ref(),
                ));
                self.raw = Arc::new(query);
                self.loaded = true;
                self.errors.clear("resources");
                debug!(resources = self.directory.len(), "resources refetched");
                Ok(())
            }
            Err(err) => {
                query_failed(&mut self.errors, "resources", &err);
                Err(err)
            }
        }
    }

    pub async fn save_resource(
        &mut self,
        input: ResourceSaveInput,
        navigation: &mut NavigationStack,
    ) -> MutationOutcome<ResourceId> {
        let is_new = input.is_new();
        let id = match self.backend.save_resource(input).await {
            Ok(id) => id,
            Err(err) => return Err(mutation_failed(&mut self.errors, "save_resource", err)),
        };
        self.errors.clear("save_resource");
        info!(resource = id, created = is_new, "resource saved");
        let _ = self.refetch().await;
        if is_new && navigation.active() == Some(&PanelEntry::CreatingResource) {
            navigation.replace(PanelEntry::ViewingResource(id));
        }
        Ok(id)
    }

    pub async fn delete_resource(
        &mut self,
        id: ResourceId,
        navigation: &mut NavigationStack,
    ) -> MutationOutcome<bool> {
        let deleted = match self.backend.delete_resource(id).await {
            Ok(deleted) => deleted,
            Err(err) => return Err(mutation_failed(&mut self.errors, "delete_resource", err)),
        };
        self.errors.clear("delete_resource");
        if deleted {
            info!(resource = id, "resource deleted");
            navigation.remove_resource(id);
            let _ = self.refetch().await;
        }
        Ok(deleted)
    }

    pub async fn load_countries(&mut self) -> Result<&[Country]> {
        match self.backend.countries().await {
            Ok(query) => {
                self.countries = query.countries;
                self.errors.clear("countries");
                Ok(&self.countries)
            }
            Err(err) => {
                query_failed(&mut self.errors, "countries", &err);
                Err(err)
            }
        }
    }

    /// Regions of a country; empty when the server does not know the isocode.
    pub async fn load_regions(&mut self, isocode: &str) -> Result<Vec<Region>> {
        match self.backend.regions(isocode).await {
            Ok(query) => {
                self.errors.clear("regions");
                Ok(query.into_regions())
            }
            Err(err) => {
                query_failed(&mut self.errors, "regions", &err);
                Err(err)
            }
        }
    }

    /// Holiday calendar for an ISO country or region code, if the server knows one.
    pub async fn holiday_for(&self, isocode: &str) -> Result<Option<Holiday>> {
        let query = self.backend.holiday_for(isocode).await?;
        Ok(query.get_from_open_holidays.map(|h| Holiday {
            id: h.db_id,
            name: h.name,
            country: h.country,
            region: h.region,
        }))
    }

    /// Availability intervals per resource within `[start, end)`.
    pub async fn combined_availability(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<HashMap<ResourceId, Vec<DateBounds>>> {
        let query = self.backend.combined_availability(start, end).await?;
        Ok(combined_availability(&query))
    }
}

// =============================================================================
// Plan
// =============================================================================

/// Latest plan view, booking mutations and calculation state.
pub struct PlanStore {
    backend: Arc<dyn SchedulingBackend>,
    raw: Arc<PlanQuery>,
    view: Arc<PlanView>,
    state: CalculationState,
    booking_fallback: Duration,
    loaded: bool,
    errors: OperationErrors,
}

impl PlanStore {
    pub fn new(backend: Arc<dyn SchedulingBackend>) -> Self {
        Self {
            backend,
            raw: Arc::default(),
            view: Arc::default(),
            state: CalculationState::default(),
            booking_fallback: Duration::days(7),
            loaded: false,
            errors: OperationErrors::default(),
        }
    }

    /// Length of bookings drafted for tasks without plan allocations.
    pub fn with_booking_fallback(mut self, fallback: Duration) -> Self {
        self.booking_fallback = fallback;
        self
    }

    pub fn view(&self) -> Arc<PlanView> {
        Arc::clone(&self.view)
    }

    pub fn calculation_state(&self) -> CalculationState {
        self.state
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn errors(&self) -> &OperationErrors {
        &self.errors
    }

    pub async fn refetch(&mut self, tasks: &TaskGraph, resources: &ResourceDirectory) -> Result<()> {
        match self.backend.current_plan().await {
            Ok(query) => {
                self.raw = Arc::new(query);
                self.loaded = true;
                self.errors.clear("plan");
                self.rebuild(tasks, resources);
                debug!(allocations = self.view.allocations().len(), "plan refetched");
                Ok(())
            }
            Err(err) => {
                query_failed(&mut self.errors, "plan", &err);
                Err(err)
            }
        }
    }

    /// Re-joins the last plan result against new task or resource snapshots.
    pub fn rebuild(&mut self, tasks: &TaskGraph, resources: &ResourceDirectory) {
        self.view = Arc::new(PlanView::build(&self.raw, tasks, resources));
    }

    /// Saves a booking, then refetches the plan.
    ///
    /// A non-positive `db_id` names a synthetic allocation and creates a new
    /// booking.
    pub async fn save_booking(
        &mut self,
        mut input: BookingSaveInput,
        tasks: &TaskGraph,
        resources: &ResourceDirectory,
    ) -> MutationOutcome<AllocationId> {
        if input.db_id.is_some_and(|id| id <= 0) {
            input.db_id = None;
        }
        let result = self.backend.save_booking(input).await;
        let _ = self.refetch(tasks, resources).await;
        match result {
            Ok(id) => {
                self.errors.clear("save_booking");
                info!(booking = id, "booking saved");
                Ok(id)
            }
            Err(err) => Err(mutation_failed(&mut self.errors, "save_booking", err)),
        }
    }

    /// Deletes a booking, then refetches the plan. Synthetic ids are ignored.
    pub async fn delete_booking(
        &mut self,
        id: AllocationId,
        tasks: &TaskGraph,
        resources: &ResourceDirectory,
    ) -> MutationOutcome<bool> {
        if id <= 0 {
            return Ok(false);
        }
        let result = self.backend.delete_booking(id).await;
        let _ = self.refetch(tasks, resources).await;
        match result {
            Ok(deleted) => {
                self.errors.clear("delete_booking");
                Ok(deleted)
            }
            Err(err) => Err(mutation_failed(&mut self.errors, "delete_booking", err)),
        }
    }

    /// Books `task` over its earliest plan allocation, or over the fallback
    /// period ending now.
    pub async fn create_booking_from_plan(
        &mut self,
        task: TaskId,
        tasks: &TaskGraph,
        resources: &ResourceDirectory,
    ) -> MutationOutcome<AllocationId> {
        let input = self
            .view
            .booking_template(task, Utc::now(), self.booking_fallback);
        self.save_booking(input, tasks, resources).await
    }

    pub async fn recalculate(
        &mut self,
        tasks: &TaskGraph,
        resources: &ResourceDirectory,
    ) -> MutationOutcome<bool> {
        let result = self.backend.recalculate().await;
        let _ = self.refetch(tasks, resources).await;
        match result {
            Ok(accepted) => {
                self.errors.clear("recalculate");
                Ok(accepted)
            }
            Err(err) => Err(mutation_failed(&mut self.errors, "recalculate", err)),
        }
    }

    /// Records a pushed calculation state; `Finished` refetches plan and issues.
    pub async fn on_calculation_update(
        &mut self,
        state: CalculationState,
        tasks: &TaskGraph,
        resources: &ResourceDirectory,
        issues: &mut IssueStore,
    ) {
        debug!(?state, "calculation update");
        self.state = state;
        if state.plan_ready() {
            let _ = self.refetch(tasks, resources).await;
            let _ = issues.refetch().await;
        }
    }
}

// =============================================================================
// Issues
// =============================================================================

pub struct IssueStore {
    backend: Arc<dyn SchedulingBackend>,
    index: Arc<IssueIndex>,
    errors: OperationErrors,
}

impl IssueStore {
    pub fn new(backend: Arc<dyn SchedulingBackend>) -> Self {
        Self {
            backend,
            index: Arc::default(),
            errors: OperationErrors::default(),
        }
    }

    pub fn index(&self) -> Arc<IssueIndex> {
        Arc::clone(&self.index)
    }

    pub fn errors(&self) -> &OperationErrors {
        &self.errors
    }

    pub async fn refetch(&mut self) -> Result<()> {
        match self.backend.issues().await {
            Ok(query) => {
                self.index = Arc::new(IssueIndex::from_query(&query));
                self.errors.clear("issues");
                debug!(issues = self.index.len(), "issues refetched");
                Ok(())
            }
            Err(err) => {
                query_failed(&mut self.errors, "issues", &err);
                Err(err)
            }
        }
    }

    /// Replaces the index without a round trip.
    pub fn apply(&mut self, query: &IssuesQuery) {
        self.index = Arc::new(IssueIndex::from_query(query));
    }
}

// =============================================================================
// Workspace
// =============================================================================

/// All stores of one client session plus the side-panel history.
pub struct Workspace {
    pub tasks: TaskStore,
    pub resources: ResourceStore,
    pub plan: PlanStore,
    pub issues: IssueStore,
    pub navigation: NavigationStack,
}

impl Workspace {
    pub fn new(backend: Arc<dyn SchedulingBackend>, config: &ClientConfig) -> Self {
        Self {
            tasks: TaskStore::new(Arc::clone(&backend)),
            resources: ResourceStore::new(Arc::clone(&backend), config.default_availability),
            plan: PlanStore::new(Arc::clone(&backend)).with_booking_fallback(config.booking_fallback()),
            issues: IssueStore::new(backend),
            navigation: NavigationStack::with_capacity(config.navigation_capacity),
        }
    }

    /// Fetches every query, continuing past failures.
    ///
    /// Returns the first error encountered.
    pub async fn refetch_all(&mut self) -> Result<()> {
        let tasks = self.tasks.refetch().await;
        let resources = self.resources.refetch().await;
        let plan = self
            .plan
            .refetch(&self.tasks.graph(), &self.resources.directory())
            .await;
        let issues = self.issues.refetch().await;
        self.prune_navigation();
        tasks.and(resources).and(plan).and(issues)
    }

    pub async fn save_task(&mut self, input: TaskSaveInput) -> MutationOutcome<TaskId> {
        let result = self.tasks.save_task(input, &mut self.navigation).await;
        self.rebuild_plan();
        result
    }

    pub async fn delete_task(&mut self, id: TaskId) -> MutationOutcome<bool> {
        let result = self.tasks.delete_task(id, &mut self.navigation).await;
        self.rebuild_plan();
        result
    }

    pub async fn save_resource(&mut self, input: ResourceSaveInput) -> MutationOutcome<ResourceId> {
        let result = self.resources.save_resource(input, &mut self.navigation).await;
        self.rebuild_plan();
        result
    }

    pub async fn delete_resource(&mut self, id: ResourceId) -> MutationOutcome<bool> {
        let result = self.resources.delete_resource(id, &mut self.navigation).await;
        self.rebuild_plan();
        result
    }

    pub async fn save_booking(&mut self, input: BookingSaveInput) -> MutationOutcome<AllocationId> {
        let (tasks, resources) = (self.tasks.graph(), self.resources.directory());
        self.plan.save_booking(input, &tasks, &resources).await
    }

    pub async fn delete_booking(&mut self, id: AllocationId) -> MutationOutcome<bool> {
        let (tasks, resources) = (self.tasks.graph(), self.resources.directory());
        self.plan.delete_booking(id, &tasks, &resources).await
    }

    pub async fn create_booking_from_plan(&mut self, task: TaskId) -> MutationOutcome<AllocationId> {
        let (tasks, resources) = (self.tasks.graph(), self.resources.directory());
        self.plan.create_booking_from_plan(task, &tasks, &resources).await
    }

    pub async fn recalculate(&mut self) -> MutationOutcome<bool> {
        let (tasks, resources) = (self.tasks.graph(), self.resources.directory());
        self.plan.recalculate(&tasks, &resources).await
    }

    pub async fn on_calculation_update(&mut self, state: CalculationState) {
        let (tasks, resources) = (self.tasks.graph(), self.resources.directory());
        self.plan
            .on_calculation_update(state, &tasks, &resources, &mut self.issues)
            .await;
    }

    /// Data-quality findings for the current task and resource snapshots.
    pub fn validate(&self) -> ValidationResult {
        validate_snapshot(&self.tasks.raw(), &self.resources.raw())
    }

    /// Drops history entries whose entity no longer exists.
    pub fn prune_navigation(&mut self) {
        let (tasks, resources) = (self.tasks.graph(), self.resources.directory());
        self.navigation.retain(|e| e.is_valid(&tasks, &resources));
    }

    /// Every recorded error across the stores.
    pub fn errors(&self) -> Vec<(&'static str, &str)> {
        self.tasks
            .errors()
            .iter()
            .chain(self.resources.errors().iter())
            .chain(self.plan.errors().iter())
            .chain(self.issues.errors().iter())
            .collect()
    }

    fn rebuild_plan(&mut self) {
        let (tasks, resources) = (self.tasks.graph(), self.resources.directory());
        self.plan.rebuild(&tasks, &resources);
    }
}
