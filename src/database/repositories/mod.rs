//! Database repositories module
//!
//! This module contains all repository implementations for data access

pub mod place;
pub mod schedule;
pub mod student;
pub mod appointment;
pub mod site_config;

// Re-export repositories
pub use place::PlaceRepository;
pub use schedule::ScheduleRepository;
pub use student::StudentRepository;
pub use appointment::{AppointmentRepository, LockedAppointment};
pub use site_config::SiteConfigRepository;
