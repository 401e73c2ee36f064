//! GraphQL-over-HTTP transport.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use super::SchedulingBackend;
use crate::config::ClientConfig;
use crate::error::{ClientError, GraphQlError, Result};
use crate::models::{AllocationId, ResourceId, TaskId};
use crate::query::{
    BookingDeletePayload, BookingSaveInput, BookingSavePayload, CombinedAvailabilityQuery,
    CountriesQuery, HolidayQuery, IssuesQuery, PlanQuery, RecalculatePayload, RegionsQuery,
    ResourceDeletePayload, ResourceSaveInput, ResourceSavePayload, ResourcesQuery,
    TaskDeletePayload, TaskSaveInput, TaskSavePayload, TasksQuery, BOOKING_DELETE_MUTATION,
    BOOKING_SAVE_MUTATION, COMBINED_AVAILABILITY_QUERY, COUNTRIES_QUERY, HOLIDAY_QUERY,
    ISSUES_QUERY, PLAN_QUERY, RECALCULATE_MUTATION, REGIONS_QUERY, RESOURCES_QUERY,
    RESOURCE_DELETE_MUTATION, RESOURCE_SAVE_MUTATION, TASKS_QUERY, TASK_DELETE_MUTATION,
    TASK_SAVE_MUTATION,
};

/// Request body.
#[derive(Debug, Clone, Serialize)]
pub struct GraphQlRequest<'a> {
    pub query: &'a str,
    pub variables: Value,
}

/// Response body.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

/// Unwraps `data`, turning reported errors into [`ClientError::GraphQl`].
///
/// Errors win over partial data.
pub fn decode_response<T>(response: GraphQlResponse<T>) -> Result<T> {
    if !response.errors.is_empty() {
        return Err(ClientError::GraphQl(response.errors));
    }
    response.data.ok_or(ClientError::MissingData("data"))
}

/// [`SchedulingBackend`] talking to a GraphQL endpoint.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    endpoint: String,
}

impl HttpBackend {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(Client::new(), endpoint)
    }

    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.endpoint.trim())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Runs one query or mutation and decodes its `data`.
    pub async fn execute<T: DeserializeOwned>(&self, query: &str, variables: Value) -> Result<T> {
        debug!(endpoint = %self.endpoint, "graphql request");
        let body = GraphQlRequest { query, variables };
        let res = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        let response: GraphQlResponse<T> = res.json().await?;
        decode_response(response)
    }
}

#[async_trait]
impl SchedulingBackend for HttpBackend {
    async fn tasks(&self) -> Result<TasksQuery> {
        self.execute(TASKS_QUERY, json!({})).await
    }

    async fn resources(&self) -> Result<ResourcesQuery> {
        self.execute(RESOURCES_QUERY, json!({})).await
    }

    async fn issues(&self) -> Result<IssuesQuery> {
        self.execute(ISSUES_QUERY, json!({})).await
    }

    async fn current_plan(&self) -> Result<PlanQuery> {
        self.execute(PLAN_QUERY, json!({})).await
    }

    async fn combined_availability(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<CombinedAvailabilityQuery> {
        if end < start {
            return Err(ClientError::InvalidArgument(format!(
                "availability window ends before it starts ({start} > {end})"
            )));
        }
        self.execute(
            COMBINED_AVAILABILITY_QUERY,
            json!({ "start": start, "end": end }),
        )
        .await
    }

    async fn countries(&self) -> Result<CountriesQuery> {
        self.execute(COUNTRIES_QUERY, json!({})).await
    }

    async fn regions(&self, isocode: &str) -> Result<RegionsQuery> {
        self.execute(REGIONS_QUERY, json!({ "isocode": isocode })).await
    }

    async fn holiday_for(&self, isocode: &str) -> Result<HolidayQuery> {
        self.execute(HOLIDAY_QUERY, json!({ "isocode": isocode })).await
    }

    async fn save_task(&self, input: TaskSaveInput) -> Result<TaskId> {
        let payload: TaskSavePayload = self
            .execute(TASK_SAVE_MUTATION, json!({ "task": input }))
            .await?;
        Ok(payload.task_save.db_id)
    }

    async fn delete_task(&self, id: TaskId) -> Result<bool> {
        let payload: TaskDeletePayload = self
            .execute(TASK_DELETE_MUTATION, json!({ "taskId": id }))
            .await?;
        Ok(payload.task_delete)
    }

    async fn save_resource(&self, input: ResourceSaveInput) -> Result<ResourceId> {
        let payload: ResourceSavePayload = self
            .execute(RESOURCE_SAVE_MUTATION, json!({ "resource": input }))
            .await?;
        Ok(payload.resource_save.db_id)
    }

    async fn delete_resource(&self, id: ResourceId) -> Result<bool> {
        let payload: ResourceDeletePayload = self
            .execute(RESOURCE_DELETE_MUTATION, json!({ "resourceId": id }))
            .await?;
        Ok(payload.resource_delete)
    }

    async fn save_booking(&self, input: BookingSaveInput) -> Result<AllocationId> {
        let variables = serde_json::to_value(&input)?;
        let payload: BookingSavePayload = self.execute(BOOKING_SAVE_MUTATION, variables).await?;
        Ok(payload.booking_save.db_id)
    }

    async fn delete_booking(&self, id: AllocationId) -> Result<bool> {
        let payload: BookingDeletePayload = self
            .execute(BOOKING_DELETE_MUTATION, json!({ "dbId": id }))
            .await?;
        Ok(payload.booking_delete)
    }

    async fn recalculate(&self) -> Result<bool> {
        let payload: RecalculatePayload = self.execute(RECALCULATE_MUTATION, json!({})).await?;
        Ok(payload.recalculate_now)
    }
}
