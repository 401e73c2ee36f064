//! Resource model.
//!
//! Resources are the people or machines that tasks are allocated to.
//! Each resource has a lifetime (`added` .. `removed`), a weekly
//! availability, optional public holidays and a list of vacations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Availability, Weekday};

/// Backend identity of a resource.
pub type ResourceId = i32;

/// A country as known to the holiday service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub isocode: String,
    pub name: String,
}

/// A subdivision of a country with its own holidays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub isocode: String,
    pub name: String,
}

/// A public holiday calendar referenced by resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holiday {
    pub id: i32,
    pub name: String,
    pub country: Option<Country>,
    pub region: Option<Region>,
}

/// A vacation interval `[from, until)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vacation {
    pub id: i32,
    pub from: DateTime<Utc>,
    pub until: DateTime<Utc>,
}

impl Vacation {
    /// Whether `at` falls within this vacation.
    #[inline]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.from && at < self.until
    }
}

/// A resource with enriched availability data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub name: String,
    /// IANA timezone name, e.g. `Europe/Berlin`.
    pub timezone: String,
    pub added: DateTime<Utc>,
    /// `None` = still active.
    pub removed: Option<DateTime<Utc>>,
    pub holiday: Option<Holiday>,
    pub availability: Option<Availability>,
    /// Whether `availability` holds entries the backend reported, as opposed
    /// to a configured default week.
    #[serde(default)]
    pub availability_reported: bool,
    pub vacations: Vec<Vacation>,
}

impl Resource {
    /// Creates an active resource with no availability data.
    pub fn new(id: ResourceId, name: impl Into<String>, added: DateTime<Utc>) -> Self {
        Self {
            id,
            name: name.into(),
            timezone: "UTC".to_string(),
            added,
            removed: None,
            holiday: None,
            availability: None,
            availability_reported: false,
            vacations: Vec::new(),
        }
    }

    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }

    pub fn with_removed(mut self, removed: DateTime<Utc>) -> Self {
        self.removed = Some(removed);
        self
    }

    pub fn with_availability(mut self, availability: Availability) -> Self {
        self.availability = Some(availability);
        self.availability_reported = true;
        self
    }

    pub fn with_holiday(mut self, holiday: Holiday) -> Self {
        self.holiday = Some(holiday);
        self
    }

    pub fn with_vacation(mut self, vacation: Vacation) -> Self {
        self.vacations.push(vacation);
        self
    }

    /// Whether the resource exists at `at` (added, not yet removed).
    pub fn is_active_at(&self, at: DateTime<Utc>) -> bool {
        at >= self.added && self.removed.map_or(true, |r| at < r)
    }

    /// Whether `at` falls into any vacation.
    pub fn is_on_vacation_at(&self, at: DateTime<Utc>) -> bool {
        self.vacations.iter().any(|v| v.contains(at))
    }

    /// Nominal working hours on `day` (zero without availability data).
    pub fn hours_on(&self, day: Weekday) -> f64 {
        self.availability.map_or(0.0, |a| a.hours(day))
    }
}
