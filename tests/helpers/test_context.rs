//! Test context around the in-memory store

use std::collections::BTreeSet;
use std::sync::Arc;
use OpenHouse::database::{BookingStore, MemoryBookingStore};
use OpenHouse::models::*;
use OpenHouse::services::{AdminService, AppointmentGenerator, DuplicatePolicy, RegistrationService};
use super::test_data::{slot_at, test_site_config};

pub struct TestContext {
    pub store: Arc<MemoryBookingStore>,
    pub admin: AdminService,
    pub registration: RegistrationService,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with(test_site_config(), DuplicatePolicy::Skip)
    }

    pub fn with_site(site: SiteConfig) -> Self {
        Self::with(site, DuplicatePolicy::Skip)
    }

    pub fn with(site: SiteConfig, policy: DuplicatePolicy) -> Self {
        let store = Arc::new(MemoryBookingStore::new(AppointmentGenerator::new(policy)));
        Self {
            admin: AdminService::new(store.clone()),
            registration: RegistrationService::new(store.clone(), site),
            store,
        }
    }

    pub async fn place(&self, name: &str, gauge: i32) -> Place {
        self.admin
            .create_place(CreatePlaceRequest { name: name.to_string(), gauge, order: None })
            .await
            .expect("Failed to create place")
            .entity
    }

    pub async fn schedule(&self, hours: i64, authorizeds: &str) -> Schedule {
        self.admin
            .create_schedule(CreateScheduleRequest {
                datetime: slot_at(hours),
                authorizeds: Some(authorizeds.to_string()),
            })
            .await
            .expect("Failed to create schedule")
            .entity
    }

    /// People booked on an appointment
    pub async fn filled(&self, key: AppointmentKey) -> i64 {
        self.store
            .appointment_detail(key)
            .await
            .expect("Failed to load appointment")
            .expect("Appointment should exist")
            .filled()
    }

    pub async fn appointment_keys(&self) -> BTreeSet<AppointmentKey> {
        self.store
            .list_appointments()
            .await
            .expect("Failed to list appointments")
            .iter()
            .map(Appointment::key)
            .collect()
    }
}

pub fn keys(keys: &[AppointmentKey]) -> BTreeSet<AppointmentKey> {
    keys.iter().copied().collect()
}
