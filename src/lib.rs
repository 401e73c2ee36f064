//! Client-side view models for the siapla project/resource scheduler.
//!
//! Turns the normalized results of the scheduler's GraphQL API into linked,
//! queryable snapshots and keeps them current across mutations and plan
//! recalculations.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Task`, `Resource`, `Availability`,
//!   `Allocation`, `DateBounds`, `Issue`, `CalculationState`
//! - **`query`**: GraphQL documents, result shapes and mutation inputs
//! - **`graph`**: Task graph with parent/child and predecessor/successor links
//! - **`directory`**: Resources with normalized weekly availability
//! - **`plan`**: Allocations joined against tasks and resources, with plan
//!   bounds and group roll-ups
//! - **`navigation`**: Bounded back/forward history of the side panel
//! - **`issues`**: Planning issues grouped by task
//! - **`validation`**: Data-quality report (dangling references, cycles)
//! - **`backend`**: `SchedulingBackend` trait and its HTTP transport
//! - **`store`**: Stateful stores and the `Workspace` that ties them together
//! - **`config`**: `ClientConfig`
//!
//! # Snapshots
//!
//! Every builder is a pure function of one query result. Stores swap in a
//! freshly built `Arc` snapshot on each successful fetch, so readers never
//! observe a half-updated graph.

pub mod backend;
pub mod config;
pub mod directory;
pub mod error;
pub mod graph;
pub mod issues;
pub mod models;
pub mod navigation;
pub mod plan;
pub mod query;
pub mod store;
pub mod validation;

pub use backend::{HttpBackend, SchedulingBackend};
pub use config::ClientConfig;
pub use directory::ResourceDirectory;
pub use error::{ClientError, Result};
pub use graph::TaskGraph;
pub use issues::IssueIndex;
pub use navigation::{NavigationStack, PanelEntry};
pub use plan::PlanView;
pub use store::{IssueStore, MutationOutcome, PlanStore, ResourceStore, TaskStore, Workspace};
