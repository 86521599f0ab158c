//! OpenHouse
//!
//! Open-house visit booking for a school. Administrators declare places and
//! time slots; every (place, slot) pair becomes an appointment visitors can
//! register on, up to the place's gauge.

#![allow(non_snake_case)]

pub mod config;
pub mod services;
pub mod models;
pub mod database;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{OpenHouseError, Result};

// Re-export main components for easy access
pub use database::{BookingStore, MemoryBookingStore, PgBookingStore, DatabaseService};
pub use services::{AdminService, AppointmentGenerator, OccupancyCalculator, RegistrationService, ServiceFactory};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
