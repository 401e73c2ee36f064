//! Resource directory builder.
//!
//! Turns the flat `resources` query result into resources with normalized
//! weekly availability, parsed lifetimes, vacations and holiday metadata.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::models::{Availability, DateBounds, Holiday, Resource, ResourceId, Vacation};
use crate::query::{CombinedAvailabilityQuery, ResourceRecord, ResourcesQuery};

/// An immutable snapshot of all resources, indexed by id.
///
/// Iteration follows the order of the query result.
#[derive(Debug, Clone, Default)]
pub struct ResourceDirectory {
    resources: HashMap<ResourceId, Resource>,
    order: Vec<ResourceId>,
}

impl ResourceDirectory {
    /// Builds the directory from a `resources` query result.
    ///
    /// `default_availability` fills weekdays the backend did not report.
    /// Without a default, a resource with no entries has no availability
    /// and missing weekdays count as zero hours.
    pub fn from_query(query: &ResourcesQuery, default_availability: Option<&Availability>) -> Self {
        Self::build(&query.resources, default_availability)
    }

    pub fn build(records: &[ResourceRecord], default_availability: Option<&Availability>) -> Self {
        let mut resources = HashMap::with_capacity(records.len());
        let mut order = Vec::with_capacity(records.len());
        for r in records {
            let resource = resource_from_record(r, default_availability);
            if resources.insert(r.db_id, resource).is_none() {
                order.push(r.db_id);
            }
        }
        debug!(resources = order.len(), "built resource directory");
        Self { resources, order }
    }

    /// Looks up a resource by id.
    pub fn resource(&self, id: ResourceId) -> Option<&Resource> {
        self.resources.get(&id)
    }

    pub fn contains(&self, id: ResourceId) -> bool {
        self.resources.contains_key(&id)
    }

    /// All resources in query order.
    pub fn resources(&self) -> impl Iterator<Item = &Resource> + '_ {
        self.order.iter().filter_map(move |id| self.resources.get(id))
    }

    /// Resources that exist at `at`.
    pub fn active_at(&self, at: DateTime<Utc>) -> Vec<&Resource> {
        self.resources().filter(|r| r.is_active_at(at)).collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

fn resource_from_record(r: &ResourceRecord, default: Option<&Availability>) -> Resource {
    let availability = if r.availability.is_empty() && default.is_none() {
        None
    } else {
        Some(Availability::from_entries(
            r.availability.iter().map(|a| (a.weekday, a.duration)),
            default,
        ))
    };
    Resource {
        id: r.db_id,
        name: r.name.clone(),
        timezone: r.timezone.clone(),
        added: r.added,
        removed: r.removed,
        holiday: r.holiday.as_ref().map(|h| Holiday {
            id: h.db_id,
            name: h.name.clone(),
            country: h.country.clone(),
            region: h.region.clone(),
        }),
        availability,
        availability_reported: !r.availability.is_empty(),
        vacations: r
            .vacation
            .iter()
            .map(|v| Vacation {
                id: v.db_id,
                from: v.from,
                until: v.until,
            })
            .collect(),
    }
}

/// Combined availability intervals per resource, as computed by the backend
/// for a requested window.
pub fn combined_availability(query: &CombinedAvailabilityQuery) -> HashMap<ResourceId, Vec<DateBounds>> {
    query
        .resources
        .iter()
        .map(|r| {
            let intervals = r
                .combined_availability
                .iter()
                .map(|i| DateBounds::new(i.start, i.end))
                .collect();
            (r.db_id, intervals)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Weekday;
    use chrono::TimeZone;
    use serde_json::json;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_build_from_query_json() {
        let q: ResourcesQuery = serde_json::from_value(json!({
            "resources": [{
                "dbId": 1,
                "name": "Alice",
                "timezone": "Europe/Vienna",
                "added": "2024-01-01T00:00:00Z",
                "removed": null,
                "vacation": [{ "dbId": 3, "from": "2024-07-01T00:00:00Z", "until": "2024-07-15T00:00:00Z" }],
                "holiday": {
                    "dbId": 8,
                    "name": "Austria",
                    "country": { "name": "Austria", "isocode": "AT" },
                    "region": null
                },
                "availability": [
                    { "weekday": "MONDAY", "duration": 14400 },
                    { "weekday": "SATURDAY", "duration": 7200 }
                ]
            }]
        }))
        .unwrap();

        let dir = ResourceDirectory::from_query(&q, Some(&Availability::standard_week()));
        let r = dir.resource(1).unwrap();
        assert_eq!(r.timezone, "Europe/Vienna");
        assert!(r.removed.is_none());
        assert_eq!(r.vacations.len(), 1);
        assert_eq!(r.holiday.as_ref().unwrap().country.as_ref().unwrap().isocode, "AT");

        let a = r.availability.unwrap();
        assert!((a.hours(Weekday::Monday) - 4.0).abs() < 1e-10);
        assert!((a.hours(Weekday::Tuesday) - 8.0).abs() < 1e-10);
        assert!((a.hours(Weekday::Saturday) - 2.0).abs() < 1e-10);
        assert!((a.hours(Weekday::Sunday) - 0.0).abs() < 1e-10);
    }

    #[test]
    fn test_no_entries_no_default_has_no_availability() {
        let dir = ResourceDirectory::build(&[ResourceRecord::new(1, "Bob", t0())], None);
        assert!(dir.resource(1).unwrap().availability.is_none());
    }

    #[test]
    fn test_no_entries_with_default_uses_default() {
        let dir = ResourceDirectory::build(
            &[ResourceRecord::new(1, "Bob", t0())],
            Some(&Availability::standard_week()),
        );
        assert_eq!(
            dir.resource(1).unwrap().availability,
            Some(Availability::standard_week())
        );
    }

    #[test]
    fn test_availability_round_trip_through_directory() {
        let record = ResourceRecord::new(1, "Cy", t0())
            .with_availability(Weekday::Monday, 30_000)
            .with_availability(Weekday::Wednesday, 1_234);
        let dir = ResourceDirectory::build(&[record], None);
        let entries = dir.resource(1).unwrap().availability.unwrap().to_entries();
        assert!(entries.contains(&(Weekday::Monday, 30_000)));
        assert!(entries.contains(&(Weekday::Wednesday, 1_234)));
        assert!(entries.contains(&(Weekday::Friday, 0)));
    }

    #[test]
    fn test_active_at() {
        let mut removed = ResourceRecord::new(2, "Old", t0());
        removed.removed = Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
        let dir = ResourceDirectory::build(&[ResourceRecord::new(1, "New", t0()), removed], None);

        let later = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let ids: Vec<ResourceId> = dir.active_at(later).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1]);
        assert_eq!(dir.len(), 2);
    }

    #[test]
    fn test_combined_availability_grouping() {
        let q: CombinedAvailabilityQuery = serde_json::from_value(json!({
            "resources": [
                { "dbId": 1, "combinedAvailability": [
                    { "start": "2024-01-01T08:00:00Z", "end": "2024-01-01T16:00:00Z" }
                ]},
                { "dbId": 2, "combinedAvailability": [] }
            ]
        }))
        .unwrap();
        let map = combined_availability(&q);
        assert_eq!(map[&1].len(), 1);
        assert_eq!(map[&1][0].duration(), chrono::Duration::hours(8));
        assert!(map[&2].is_empty());
    }
}
