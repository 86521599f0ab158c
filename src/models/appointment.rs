//! Appointment model
//!
//! An appointment is the pairing of one place with one schedule. It is keyed
//! by the structured `(place_id, schedule_id)` pair.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use crate::models::{Place, Schedule, Student};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AppointmentKey {
    pub place_id: i64,
    pub schedule_id: i64,
}

impl AppointmentKey {
    pub fn new(place_id: i64, schedule_id: i64) -> Self {
        Self { place_id, schedule_id }
    }

    /// Parse the legacy `"{place}-{schedule}"` identifier.
    pub fn parse_legacy(value: &str) -> Option<Self> {
        let (place, schedule) = value.trim().split_once('-')?;
        Some(Self {
            place_id: place.parse().ok()?,
            schedule_id: schedule.parse().ok()?,
        })
    }
}

impl std::fmt::Display for AppointmentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.place_id, self.schedule_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Appointment {
    pub place_id: i64,
    pub schedule_id: i64,
    pub created_at: DateTime<Utc>,
}

impl Appointment {
    pub fn key(&self) -> AppointmentKey {
        AppointmentKey::new(self.place_id, self.schedule_id)
    }
}

/// An appointment with everything needed to display and price it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentDetail {
    pub key: AppointmentKey,
    pub place: Place,
    pub schedule: Schedule,
    pub students: Vec<Student>,
}

impl AppointmentDetail {
    /// Number of people booked, escorts included
    pub fn filled(&self) -> i64 {
        self.students.iter().map(|s| i64::from(s.people)).sum()
    }
}

impl std::fmt::Display for AppointmentDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.schedule, self.place)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_id_format() {
        let key = AppointmentKey::new(12, 3);
        assert_eq!(key.to_string(), "12-3");
        assert_eq!(AppointmentKey::parse_legacy("12-3"), Some(key));
    }

    #[test]
    fn test_parse_legacy_rejects_garbage() {
        assert_eq!(AppointmentKey::parse_legacy("12"), None);
        assert_eq!(AppointmentKey::parse_legacy("a-3"), None);
        assert_eq!(AppointmentKey::parse_legacy("1-2-3"), None);
    }
}
