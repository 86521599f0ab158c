//! Schedule model
//!
//! A schedule is a visit time slot. Its `authorizeds` field is a
//! whitespace-separated list of school-group tokens allowed to book it.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Groups allowed on a slot when the administrator gives none.
pub const DEFAULT_AUTHORIZEDS: &str = "CS CB AU";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Schedule {
    pub id: i64,
    pub datetime: DateTime<Utc>,
    pub authorizeds: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateScheduleRequest {
    pub datetime: DateTime<Utc>,
    pub authorizeds: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateScheduleRequest {
    pub datetime: Option<DateTime<Utc>>,
    pub authorizeds: Option<String>,
}

impl Schedule {
    pub fn authorized_tokens(&self) -> impl Iterator<Item = &str> {
        self.authorizeds.split_whitespace()
    }

    /// Whether a student from `school` may book this slot.
    ///
    /// A token authorizes the exact school code and every code it prefixes,
    /// so `TG` opens the slot to `TG01` through `TG09`.
    pub fn authorizes(&self, school: &str) -> bool {
        authorizeds_allow(&self.authorizeds, school)
    }
}

/// Token matching behind [`Schedule::authorizes`], usable on a bare column value
pub fn authorizeds_allow(authorizeds: &str, school: &str) -> bool {
    let school = school.trim();
    if school.is_empty() {
        return false;
    }
    authorizeds
        .split_whitespace()
        .any(|token| school == token || school.starts_with(token))
}

impl std::fmt::Display for Schedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.datetime.to_rfc3339())
    }
}
