//! Services module
//!
//! This module contains business logic services

pub mod admin;
pub mod generator;
pub mod occupancy;
pub mod registration;

// Re-export commonly used services
pub use admin::AdminService;
pub use generator::{AppointmentGenerator, Counterparts, Created, DomainEvent, DuplicatePolicy, FanOutReport};
pub use occupancy::{Occupancy, OccupancyCalculator, OccupancyLevel, OccupancyThresholds};
pub use registration::{RegistrationService, RosterEntry, SlotListing, SlotView};

use std::sync::Arc;
use crate::config::settings::BookingConfig;
use crate::database::BookingStore;
use crate::models::SiteConfig;

/// Service factory for creating and managing all services
#[derive(Clone)]
pub struct ServiceFactory {
    pub admin_service: AdminService,
    pub registration_service: RegistrationService,
}

impl ServiceFactory {
    /// Build every service over one store, with the site record in effect
    pub fn new(store: Arc<dyn BookingStore>, site: &SiteConfig) -> Self {
        Self {
            admin_service: AdminService::new(store.clone()),
            registration_service: RegistrationService::new(store, site.clone()),
        }
    }

    /// Generator configured from the booking settings
    pub fn generator(booking: &BookingConfig) -> AppointmentGenerator {
        AppointmentGenerator::new(booking.duplicate_policy)
    }
}
