//! Database service layer
//!
//! This module bundles the repositories over one pool

use crate::database::DatabasePool;
use crate::database::repositories::{PlaceRepository, ScheduleRepository, StudentRepository, AppointmentRepository, SiteConfigRepository};
use crate::utils::errors::OpenHouseError;

#[derive(Debug, Clone)]
pub struct DatabaseService {
    pub pool: DatabasePool,
    pub places: PlaceRepository,
    pub schedules: ScheduleRepository,
    pub students: StudentRepository,
    pub appointments: AppointmentRepository,
    pub site_configs: SiteConfigRepository,
}

/// Row counts of every table
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct SystemStats {
    pub places: i64,
    pub schedules: i64,
    pub appointments: i64,
    pub students: i64,
}

impl DatabaseService {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            places: PlaceRepository::new(pool.clone()),
            schedules: ScheduleRepository::new(pool.clone()),
            students: StudentRepository::new(pool.clone()),
            appointments: AppointmentRepository::new(pool.clone()),
            site_configs: SiteConfigRepository::new(pool.clone()),
            pool,
        }
    }

    /// Get system statistics
    pub async fn get_system_stats(&self) -> Result<SystemStats, OpenHouseError> {
        Ok(SystemStats {
            places: self.places.count().await?,
            schedules: self.schedules.count().await?,
            appointments: self.appointments.count().await?,
            students: self.students.count().await?,
        })
    }
}
