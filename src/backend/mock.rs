//! In-memory mock implementation of [`SchedulingBackend`] for testing.
//!
//! Holds the server-side records in `tokio::sync::RwLock` collections,
//! records every call, and can be told to fail individual operations.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::SchedulingBackend;
use crate::error::{ClientError, GraphQlError, Result};
use crate::models::{AllocationId, AllocationType, Country, Region, ResourceId, TaskId};
use crate::query::{
    AllocationRecord, BookingSaveInput, CombinedAvailabilityQuery, CombinedAvailabilityRecord,
    CountriesQuery, CountryRegionsRecord, HolidayQuery, HolidayRecord, IdRef, IntervalRecord,
    IssueRecord, IssuesQuery, PlanQuery, RegionsQuery, ResourceConstraintEntryRecord,
    ResourceConstraintRecord, ResourceRecord, ResourceSaveInput, ResourcesQuery, TaskRecord,
    TaskSaveInput, TasksQuery, VacationRecord,
};

#[derive(Default)]
pub(crate) struct MockBackend {
    pub tasks: RwLock<Vec<TaskRecord>>,
    pub resources: RwLock<Vec<ResourceRecord>>,
    pub allocations: RwLock<Vec<AllocationRecord>>,
    pub issues: RwLock<Vec<IssueRecord>>,
    pub countries: RwLock<Vec<Country>>,
    /// `(country isocode, region)` pairs.
    pub regions: RwLock<Vec<(String, Region)>>,
    pub holidays: RwLock<Vec<HolidayRecord>>,
    /// Operation names that return a GraphQL error.
    pub failing: RwLock<HashSet<&'static str>>,
    /// Operation names in call order.
    pub calls: RwLock<Vec<&'static str>>,
    next_id: RwLock<i32>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tasks(self, tasks: Vec<TaskRecord>) -> Self {
        Self {
            tasks: RwLock::new(tasks),
            ..self
        }
    }

    pub fn with_resources(self, resources: Vec<ResourceRecord>) -> Self {
        Self {
            resources: RwLock::new(resources),
            ..self
        }
    }

    pub fn with_allocations(self, allocations: Vec<AllocationRecord>) -> Self {
        Self {
            allocations: RwLock::new(allocations),
            ..self
        }
    }

    pub fn with_issues(self, issues: Vec<IssueRecord>) -> Self {
        Self {
            issues: RwLock::new(issues),
            ..self
        }
    }

    pub async fn fail(&self, op: &'static str) {
        self.failing.write().await.insert(op);
    }

    pub async fn recover(&self, op: &'static str) {
        self.failing.write().await.remove(op);
    }

    pub async fn calls(&self) -> Vec<&'static str> {
        self.calls.read().await.clone()
    }

    pub async fn call_count(&self, op: &'static str) -> usize {
        self.calls.read().await.iter().filter(|c| **c == op).count()
    }

    async fn enter(&self, op: &'static str) -> Result<()> {
        self.calls.write().await.push(op);
        if self.failing.read().await.contains(op) {
            return Err(ClientError::GraphQl(vec![GraphQlError {
                message: format!("{op} failed"),
                path: Vec::new(),
            }]));
        }
        Ok(())
    }

    async fn allocate_id(&self) -> i32 {
        let mut next = self.next_id.write().await;
        *next += 1;
        1000 + *next
    }
}

#[async_trait]
impl SchedulingBackend for MockBackend {
    async fn tasks(&self) -> Result<TasksQuery> {
        self.enter("tasks").await?;
        Ok(TasksQuery {
            tasks: self.tasks.read().await.clone(),
        })
    }

    async fn resources(&self) -> Result<ResourcesQuery> {
        self.enter("resources").await?;
        Ok(ResourcesQuery {
            resources: self.resources.read().await.clone(),
        })
    }

    async fn issues(&self) -> Result<IssuesQuery> {
        self.enter("issues").await?;
        Ok(IssuesQuery {
            issues: self.issues.read().await.clone(),
        })
    }

    async fn current_plan(&self) -> Result<PlanQuery> {
        self.enter("current_plan").await?;
        Ok(PlanQuery::new(self.allocations.read().await.clone()))
    }

    async fn combined_availability(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<CombinedAvailabilityQuery> {
        self.enter("combined_availability").await?;
        let resources = self
            .resources
            .read()
            .await
            .iter()
            .map(|r| CombinedAvailabilityRecord {
                db_id: r.db_id,
                combined_availability: vec![IntervalRecord { start, end }],
            })
            .collect();
        Ok(CombinedAvailabilityQuery { resources })
    }

    async fn countries(&self) -> Result<CountriesQuery> {
        self.enter("countries").await?;
        Ok(CountriesQuery {
            countries: self.countries.read().await.clone(),
        })
    }

    async fn regions(&self, isocode: &str) -> Result<RegionsQuery> {
        self.enter("regions").await?;
        if !self.countries.read().await.iter().any(|c| c.isocode == isocode) {
            return Ok(RegionsQuery { country: None });
        }
        let regions = self
            .regions
            .read()
            .await
            .iter()
            .filter(|(country, _)| country == isocode)
            .map(|(_, region)| region.clone())
            .collect();
        Ok(RegionsQuery {
            country: Some(CountryRegionsRecord { regions }),
        })
    }

    async fn holiday_for(&self, isocode: &str) -> Result<HolidayQuery> {
        self.enter("holiday_for").await?;
        let found = self
            .holidays
            .read()
            .await
            .iter()
            .find(|h| {
                h.region.as_ref().is_some_and(|r| r.isocode == isocode)
                    || h.country.as_ref().is_some_and(|c| c.isocode == isocode)
            })
            .cloned();
        Ok(HolidayQuery {
            get_from_open_holidays: found,
        })
    }

    async fn save_task(&self, input: TaskSaveInput) -> Result<TaskId> {
        self.enter("save_task").await?;
        let id = match input.db_id {
            Some(id) => id,
            None => self.allocate_id().await,
        };
        let record = TaskRecord {
            db_id: id,
            title: input.title,
            description: input.description,
            designation: input.designation,
            parent: input.parent_id.map(IdRef::from),
            predecessors: input.predecessors.into_iter().map(IdRef::from).collect(),
            earliest_start: input.earliest_start,
            schedule_target: input.schedule_target,
            effort: input.effort,
            resource_constraints: input
                .resource_constraints
                .into_iter()
                .map(|c| ResourceConstraintRecord {
                    optional: c.optional,
                    speed: c.speed,
                    entries: c
                        .entries
                        .into_iter()
                        .map(|e| ResourceConstraintEntryRecord {
                            resource: e.resource_id.into(),
                        })
                        .collect(),
                })
                .collect(),
        };
        let mut tasks = self.tasks.write().await;
        match tasks.iter_mut().find(|t| t.db_id == id) {
            Some(existing) => *existing = record,
            None => tasks.push(record),
        }
        Ok(id)
    }

    async fn delete_task(&self, id: TaskId) -> Result<bool> {
        self.enter("delete_task").await?;
        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|t| t.db_id != id);
        Ok(tasks.len() != before)
    }

    async fn save_resource(&self, input: ResourceSaveInput) -> Result<ResourceId> {
        self.enter("save_resource").await?;
        let id = match input.db_id {
            Some(id) => id,
            None => self.allocate_id().await,
        };
        let mut resources = self.resources.write().await;
        let mut vacation: Vec<VacationRecord> = resources
            .iter()
            .find(|r| r.db_id == id)
            .map(|r| r.vacation.clone())
            .unwrap_or_default();
        vacation.retain(|v| !input.removed_vacations.contains(&v.db_id));
        for v in input.added_vacations {
            vacation.push(VacationRecord {
                db_id: self.allocate_id().await,
                from: v.from,
                until: v.until,
            });
        }
        let record = ResourceRecord {
            db_id: id,
            name: input.name,
            timezone: input.timezone,
            added: input.added,
            removed: input.removed,
            vacation,
            holiday: None,
            availability: input.availability,
        };
        match resources.iter_mut().find(|r| r.db_id == id) {
            Some(existing) => *existing = record,
            None => resources.push(record),
        }
        Ok(id)
    }

    async fn delete_resource(&self, id: ResourceId) -> Result<bool> {
        self.enter("delete_resource").await?;
        let mut resources = self.resources.write().await;
        let before = resources.len();
        resources.retain(|r| r.db_id != id);
        Ok(resources.len() != before)
    }

    async fn save_booking(&self, input: BookingSaveInput) -> Result<AllocationId> {
        self.enter("save_booking").await?;
        let id = match input.db_id {
            Some(id) => id,
            None => self.allocate_id().await,
        };
        let mut record = AllocationRecord::new(id, input.task_id, input.start, input.end)
            .with_type(AllocationType::Booking)
            .with_resources(&input.resources);
        record.is_final = input.is_final;
        let mut allocations = self.allocations.write().await;
        match allocations.iter_mut().find(|a| a.db_id == id) {
            Some(existing) => *existing = record,
            None => allocations.push(record),
        }
        Ok(id)
    }

    async fn delete_booking(&self, id: AllocationId) -> Result<bool> {
        self.enter("delete_booking").await?;
        let mut allocations = self.allocations.write().await;
        let before = allocations.len();
        allocations.retain(|a| a.db_id != id);
        Ok(allocations.len() != before)
    }

    async fn recalculate(&self) -> Result<bool> {
        self.enter("recalculate").await?;
        Ok(true)
    }
}
