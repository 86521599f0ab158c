//! Database module
//!
//! This module handles database connections, repositories and the booking
//! stores built on top of them

pub mod connection;
pub mod repositories;
pub mod service;
pub mod store;
pub mod memory;
pub mod postgres;

// Re-export commonly used database components
pub use connection::{DatabasePool, DatabaseConfig, create_pool, run_migrations, health_check};
pub use repositories::{PlaceRepository, ScheduleRepository, StudentRepository, AppointmentRepository, SiteConfigRepository};
pub use service::{DatabaseService, SystemStats};
pub use store::BookingStore;
pub use memory::MemoryBookingStore;
pub use postgres::PgBookingStore;
