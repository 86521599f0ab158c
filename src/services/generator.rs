//! Appointment generator
//!
//! Keeps one appointment per (place, schedule) pair. Creating a place or a
//! schedule raises a [`DomainEvent`]; the generator turns it into the list of
//! keys to insert. Stores apply that plan in the transaction that created the
//! triggering entity, so a crash cannot leave a half-generated fan-out.

use std::collections::{BTreeSet, HashSet};
use serde::{Deserialize, Serialize};
use crate::models::{AppointmentKey, Place, Schedule};

/// Entity creations the generator reacts to
#[derive(Debug, Clone)]
pub enum DomainEvent {
    PlaceCreated(Place),
    ScheduleCreated(Schedule),
}

impl DomainEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::PlaceCreated(_) => "place_created",
            DomainEvent::ScheduleCreated(_) => "schedule_created",
        }
    }

    pub fn entity_id(&self) -> i64 {
        match self {
            DomainEvent::PlaceCreated(place) => place.id,
            DomainEvent::ScheduleCreated(schedule) => schedule.id,
        }
    }
}

/// What to do when a generated key already exists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Log and keep going, the existing appointment is left untouched
    #[default]
    Skip,
    /// Abort the creation with `DuplicateKey`
    Fail,
}

/// Existing entities on the other side of a creation event
#[derive(Debug, Clone, Default)]
pub struct Counterparts<'a> {
    pub places: &'a [Place],
    pub schedules: &'a [Schedule],
}

/// Outcome of applying a fan-out plan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FanOutReport {
    pub created: usize,
    pub skipped: usize,
}

impl FanOutReport {
    pub fn record(&mut self, inserted: bool) {
        if inserted {
            self.created += 1;
        } else {
            self.skipped += 1;
        }
    }
}

/// A freshly created entity with the appointments generated for it
#[derive(Debug, Clone)]
pub struct Created<T> {
    pub entity: T,
    pub fan_out: FanOutReport,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AppointmentGenerator {
    policy: DuplicatePolicy,
}

impl AppointmentGenerator {
    pub fn new(policy: DuplicatePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// One key per existing schedule
    pub fn on_place_created(&self, place: &Place, schedules: &[Schedule]) -> Vec<AppointmentKey> {
        schedules
            .iter()
            .map(|schedule| AppointmentKey::new(place.id, schedule.id))
            .collect()
    }

    /// One key per existing place
    pub fn on_schedule_created(&self, schedule: &Schedule, places: &[Place]) -> Vec<AppointmentKey> {
        places
            .iter()
            .map(|place| AppointmentKey::new(place.id, schedule.id))
            .collect()
    }

    pub fn handle(&self, event: &DomainEvent, counterparts: &Counterparts<'_>) -> Vec<AppointmentKey> {
        match event {
            DomainEvent::PlaceCreated(place) => self.on_place_created(place, counterparts.schedules),
            DomainEvent::ScheduleCreated(schedule) => self.on_schedule_created(schedule, counterparts.places),
        }
    }

    /// Pairs of the cross product that have no appointment yet, in key order
    pub fn missing_pairs(
        &self,
        places: &[Place],
        schedules: &[Schedule],
        existing: &HashSet<AppointmentKey>,
    ) -> Vec<AppointmentKey> {
        let mut missing = BTreeSet::new();
        for place in places {
            for schedule in schedules {
                let key = AppointmentKey::new(place.id, schedule.id);
                if !existing.contains(&key) {
                    missing.insert(key);
                }
            }
        }
        missing.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn place(id: i64) -> Place {
        Place {
            id,
            name: format!("Lab {}", id),
            gauge: 10,
            order: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn schedule(id: i64) -> Schedule {
        Schedule {
            id,
            datetime: Utc::now() + Duration::hours(id),
            authorizeds: "TG".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_place_fans_out_over_every_schedule() {
        let generator = AppointmentGenerator::default();
        let schedules = vec![schedule(1), schedule(2), schedule(5)];
        let keys = generator.on_place_created(&place(7), &schedules);
        assert_eq!(keys, vec![
            AppointmentKey::new(7, 1),
            AppointmentKey::new(7, 2),
            AppointmentKey::new(7, 5),
        ]);
    }

    #[test]
    fn test_schedule_fans_out_over_every_place() {
        let generator = AppointmentGenerator::default();
        let places = vec![place(1), place(2)];
        let event = DomainEvent::ScheduleCreated(schedule(9));
        let keys = generator.handle(&event, &Counterparts { places: &places, schedules: &[] });
        assert_eq!(keys, vec![AppointmentKey::new(1, 9), AppointmentKey::new(2, 9)]);
        assert_eq!(event.name(), "schedule_created");
        assert_eq!(event.entity_id(), 9);
    }

    #[test]
    fn test_no_counterparts_no_appointments() {
        let generator = AppointmentGenerator::default();
        let event = DomainEvent::PlaceCreated(place(1));
        assert!(generator.handle(&event, &Counterparts::default()).is_empty());
    }

    #[test]
    fn test_missing_pairs() {
        let generator = AppointmentGenerator::default();
        let places = vec![place(1), place(2)];
        let schedules = vec![schedule(1), schedule(2)];
        let existing: HashSet<_> = [AppointmentKey::new(1, 1), AppointmentKey::new(2, 2)].into_iter().collect();
        assert_eq!(
            generator.missing_pairs(&places, &schedules, &existing),
            vec![AppointmentKey::new(1, 2), AppointmentKey::new(2, 1)]
        );
    }

    #[test]
    fn test_fan_out_report() {
        let mut report = FanOutReport::default();
        report.record(true);
        report.record(false);
        report.record(true);
        assert_eq!(report, FanOutReport { created: 2, skipped: 1 });
    }

    #[test]
    fn test_duplicate_policy_parses_snake_case() {
        let policy: DuplicatePolicy = serde_json::from_str("\"fail\"").unwrap();
        assert_eq!(policy, DuplicatePolicy::Fail);
        assert_eq!(DuplicatePolicy::default(), DuplicatePolicy::Skip);
    }
}
