//! Student model

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Student {
    pub id: i64,
    pub lastname: String,
    pub firstname: String,
    pub school: Option<String>,
    pub email: String,
    pub people: i32,
    pub created_at: DateTime<Utc>,
}

/// Registration form data, before escorts are counted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStudent {
    pub lastname: String,
    pub firstname: String,
    pub school: Option<String>,
    pub email: String,
}

/// Validated student row ready for insertion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStudentRequest {
    pub lastname: String,
    pub firstname: String,
    pub school: Option<String>,
    pub email: String,
    pub people: i32,
}

impl Student {
    pub fn display_name(&self) -> String {
        format!("{} {} <{}>", self.firstname, self.lastname, self.email)
    }
}
