//! Data models module
//!
//! This module contains all data structures used throughout the application

pub mod place;
pub mod schedule;
pub mod student;
pub mod appointment;
pub mod school;
pub mod site_config;
pub mod registration;

// Re-export commonly used models
pub use place::{Place, CreatePlaceRequest, UpdatePlaceRequest};
pub use schedule::{Schedule, CreateScheduleRequest, UpdateScheduleRequest, DEFAULT_AUTHORIZEDS};
pub use student::{Student, NewStudent, CreateStudentRequest};
pub use appointment::{Appointment, AppointmentKey, AppointmentDetail};
pub use school::{SCHOOL_CODES, is_known_school};
pub use site_config::SiteConfig;
pub use registration::{RegistrationRequest, Registration};
