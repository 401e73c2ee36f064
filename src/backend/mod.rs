//! Scheduling backend seam.
//!
//! Every read returns the raw query result; the stores turn those into
//! snapshots. Mutations return the id or flag the server reports.

mod http;
#[cfg(test)]
pub(crate) mod mock;

pub use http::{decode_response, GraphQlRequest, GraphQlResponse, HttpBackend};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{AllocationId, ResourceId, TaskId};
use crate::query::{
    BookingSaveInput, CombinedAvailabilityQuery, CountriesQuery, HolidayQuery, IssuesQuery,
    PlanQuery, RegionsQuery, ResourceSaveInput, ResourcesQuery, TaskSaveInput, TasksQuery,
};

/// Operations the client needs from the scheduling server.
#[async_trait]
pub trait SchedulingBackend: Send + Sync {
    async fn tasks(&self) -> Result<TasksQuery>;

    async fn resources(&self) -> Result<ResourcesQuery>;

    async fn issues(&self) -> Result<IssuesQuery>;

    async fn current_plan(&self) -> Result<PlanQuery>;

    /// Availability intervals of every resource within `[start, end)`.
    async fn combined_availability(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<CombinedAvailabilityQuery>;

    async fn countries(&self) -> Result<CountriesQuery>;

    /// Regions of the country with ISO code `isocode`.
    async fn regions(&self, isocode: &str) -> Result<RegionsQuery>;

    /// Holiday calendar for a country or region ISO code.
    async fn holiday_for(&self, isocode: &str) -> Result<HolidayQuery>;

    /// Creates or updates a task; returns its id.
    async fn save_task(&self, input: TaskSaveInput) -> Result<TaskId>;

    async fn delete_task(&self, id: TaskId) -> Result<bool>;

    /// Creates or updates a resource; returns its id.
    async fn save_resource(&self, input: ResourceSaveInput) -> Result<ResourceId>;

    async fn delete_resource(&self, id: ResourceId) -> Result<bool>;

    /// Creates or updates a booking; returns its id.
    async fn save_booking(&self, input: BookingSaveInput) -> Result<AllocationId>;

    async fn delete_booking(&self, id: AllocationId) -> Result<bool>;

    /// Asks the server to recompute the plan.
    async fn recalculate(&self) -> Result<bool>;
}
