//! Administration service
//!
//! Place, schedule and site-record maintenance. Creations go through the
//! store so each one commits with its appointment fan-out.

use std::sync::Arc;
use tracing::info;
use crate::config::validate_site_config;
use crate::database::BookingStore;
use crate::models::*;
use crate::services::generator::{Created, DomainEvent, FanOutReport};
use crate::utils::errors::Result;
use crate::utils::logging::log_admin_action;

#[derive(Clone)]
pub struct AdminService {
    store: Arc<dyn BookingStore>,
}

impl AdminService {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }

    pub async fn create_place(&self, request: CreatePlaceRequest) -> Result<Created<Place>> {
        let created = self.store.create_place(request).await?;
        log_admin_action("create_place", Some(&created.entity.name), Some(&format!("gauge={}", created.entity.gauge)));
        Ok(created)
    }

    pub async fn update_place(&self, id: i64, request: UpdatePlaceRequest) -> Result<Place> {
        let place = self.store.update_place(id, request).await?;
        log_admin_action("update_place", Some(&place.name), None);
        Ok(place)
    }

    pub async fn delete_place(&self, id: i64) -> Result<()> {
        self.store.delete_place(id).await?;
        log_admin_action("delete_place", Some(&id.to_string()), None);
        Ok(())
    }

    pub async fn create_schedule(&self, request: CreateScheduleRequest) -> Result<Created<Schedule>> {
        let created = self.store.create_schedule(request).await?;
        log_admin_action("create_schedule", Some(&created.entity.to_string()), Some(&created.entity.authorizeds));
        Ok(created)
    }

    pub async fn update_schedule(&self, id: i64, request: UpdateScheduleRequest) -> Result<Schedule> {
        let schedule = self.store.update_schedule(id, request).await?;
        log_admin_action("update_schedule", Some(&schedule.to_string()), Some(&schedule.authorizeds));
        Ok(schedule)
    }

    pub async fn delete_schedule(&self, id: i64) -> Result<()> {
        self.store.delete_schedule(id).await?;
        log_admin_action("delete_schedule", Some(&id.to_string()), None);
        Ok(())
    }

    /// Replay a creation event, e.g. after an interrupted import
    pub async fn replay(&self, event: &DomainEvent) -> Result<FanOutReport> {
        let report = self.store.apply_event(event).await?;
        log_admin_action("replay", Some(event.name()), Some(&format!("created={} skipped={}", report.created, report.skipped)));
        Ok(report)
    }

    /// Fill the holes of the place/schedule cross product
    pub async fn repair_appointments(&self) -> Result<FanOutReport> {
        let report = self.store.repair_appointments().await?;
        info!(created = report.created, "Appointment repair finished");
        Ok(report)
    }

    /// Stored site record, or `fallback` saved as the new record
    pub async fn load_or_seed_site_config(&self, fallback: &SiteConfig) -> Result<SiteConfig> {
        if let Some(config) = self.store.load_site_config(&fallback.site).await? {
            validate_site_config(&config)?;
            return Ok(config);
        }
        info!(site = %fallback.site, "Seeding site configuration");
        self.update_site_config(fallback).await
    }

    pub async fn update_site_config(&self, config: &SiteConfig) -> Result<SiteConfig> {
        validate_site_config(config)?;
        let saved = self.store.save_site_config(config).await?;
        log_admin_action("update_site_config", Some(&saved.site), None);
        Ok(saved)
    }
}
