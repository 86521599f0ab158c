//! Place model

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// A room or stand visitors are taken to.
///
/// `gauge` is the maximum number of people per time slot. It is not
/// constrained to be positive; a non-positive gauge closes the place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Place {
    pub id: i64,
    pub name: String,
    pub gauge: i32,
    pub order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlaceRequest {
    pub name: String,
    pub gauge: i32,
    pub order: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePlaceRequest {
    pub name: Option<String>,
    pub gauge: Option<i32>,
    pub order: Option<i32>,
}

impl Place {
    /// Display sort key
    pub fn sort_key(&self) -> (i32, i64) {
        (self.order, self.id)
    }
}

impl std::fmt::Display for Place {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
