//! Registration models

use std::collections::BTreeSet;
use serde::{Deserialize, Serialize};
use crate::models::{AppointmentKey, CreateStudentRequest, Student};

/// A validated registration handed to the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationRequest {
    pub student: CreateStudentRequest,
    pub appointments: BTreeSet<AppointmentKey>,
    /// School to check against each schedule's authorized groups, `None` skips the check
    pub school_filter: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub student: Student,
    pub appointments: Vec<AppointmentKey>,
}
