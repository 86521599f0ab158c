//! Postgres booking store
//!
//! Builds the `BookingStore` operations from the repositories, one
//! transaction per operation.

use std::collections::HashSet;
use std::time::Instant;
use async_trait::async_trait;
use sqlx::PgConnection;
use tracing::{debug, warn};
use crate::database::DatabaseService;
use crate::database::store::BookingStore;
use crate::models::*;
use crate::models::schedule::authorizeds_allow;
use crate::services::generator::{AppointmentGenerator, Counterparts, Created, DomainEvent, DuplicatePolicy, FanOutReport};
use crate::services::occupancy::OccupancyCalculator;
use crate::utils::errors::{OpenHouseError, Result};
use crate::utils::logging::{log_database_operation, log_fan_out};

#[derive(Debug, Clone)]
pub struct PgBookingStore {
    db: DatabaseService,
    generator: AppointmentGenerator,
}

impl PgBookingStore {
    pub fn new(db: DatabaseService, generator: AppointmentGenerator) -> Self {
        Self { db, generator }
    }

    /// Insert planned keys inside the caller's transaction.
    ///
    /// With `Fail`, any existing key aborts before anything is written; the
    /// caller's transaction then rolls back on drop.
    async fn apply_plan(&self, conn: &mut PgConnection, keys: &[AppointmentKey], policy: DuplicatePolicy) -> Result<FanOutReport> {
        let mut report = FanOutReport::default();
        if keys.is_empty() {
            return Ok(report);
        }

        if policy == DuplicatePolicy::Fail {
            if let Some(key) = self.db.appointments.existing_in(conn, keys).await?.into_iter().next() {
                return Err(OpenHouseError::DuplicateKey { key });
            }
        }

        for key in keys {
            let inserted = self.db.appointments.insert_if_absent_in(conn, *key).await?;
            if !inserted {
                warn!(appointment = %key, "Appointment already exists, skipping");
            }
            report.record(inserted);
        }
        Ok(report)
    }

    /// Appointments joined with their place, schedule and students, read from
    /// one snapshot
    async fn details(&self, key: Option<AppointmentKey>) -> Result<Vec<AppointmentDetail>> {
        let mut tx = self.db.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let places = self.db.places.list_in(&mut *tx).await?;
        let schedules = self.db.schedules.list_in(&mut *tx).await?;
        let appointments = match key {
            Some(key) => self.db.appointments.find_in(&mut *tx, key).await?.into_iter().collect(),
            None => self.db.appointments.list_in(&mut *tx).await?,
        };
        let mut members = self.db.appointments.members_in(&mut *tx, key).await?;
        tx.commit().await?;

        let mut details: Vec<AppointmentDetail> = appointments
            .iter()
            .filter_map(|appointment| {
                let key = appointment.key();
                let place = places.iter().find(|p| p.id == key.place_id)?.clone();
                let schedule = schedules.iter().find(|s| s.id == key.schedule_id)?.clone();
                let students = members.remove(&key).unwrap_or_default();
                Some(AppointmentDetail { key, place, schedule, students })
            })
            .collect();
        details.sort_by_key(|d| (d.schedule.datetime, d.place.order, d.place.id, d.schedule.id));
        Ok(details)
    }
}

#[async_trait]
impl BookingStore for PgBookingStore {
    async fn create_place(&self, request: CreatePlaceRequest) -> Result<Created<Place>> {
        let started = Instant::now();
        let mut tx = self.db.pool.begin().await?;
        self.db.appointments.lock_fan_out_in(&mut *tx).await?;

        let place = self.db.places.create_in(&mut *tx, request).await?;
        let schedules = self.db.schedules.list_in(&mut *tx).await?;
        let event = DomainEvent::PlaceCreated(place.clone());
        let keys = self.generator.handle(&event, &Counterparts { places: &[], schedules: &schedules });
        let fan_out = self.apply_plan(&mut *tx, &keys, self.generator.policy()).await?;

        tx.commit().await?;
        log_fan_out(event.name(), place.id, fan_out.created, fan_out.skipped);
        log_database_operation("create", "places", started.elapsed().as_millis() as u64, true);

        Ok(Created { entity: place, fan_out })
    }

    async fn update_place(&self, id: i64, request: UpdatePlaceRequest) -> Result<Place> {
        self.db.places.update(id, request).await?
            .ok_or(OpenHouseError::PlaceNotFound { place_id: id })
    }

    async fn delete_place(&self, id: i64) -> Result<()> {
        let mut tx = self.db.pool.begin().await?;
        self.db.appointments.lock_fan_out_in(&mut *tx).await?;
        if !self.db.places.delete_in(&mut *tx, id).await? {
            return Err(OpenHouseError::PlaceNotFound { place_id: id });
        }
        tx.commit().await?;
        Ok(())
    }

    async fn list_places(&self) -> Result<Vec<Place>> {
        self.db.places.list().await
    }

    async fn create_schedule(&self, request: CreateScheduleRequest) -> Result<Created<Schedule>> {
        let started = Instant::now();
        let mut tx = self.db.pool.begin().await?;
        self.db.appointments.lock_fan_out_in(&mut *tx).await?;

        let schedule = self.db.schedules.create_in(&mut *tx, request).await?;
        let places = self.db.places.list_in(&mut *tx).await?;
        let event = DomainEvent::ScheduleCreated(schedule.clone());
        let keys = self.generator.handle(&event, &Counterparts { places: &places, schedules: &[] });
        let fan_out = self.apply_plan(&mut *tx, &keys, self.generator.policy()).await?;

        tx.commit().await?;
        log_fan_out(event.name(), schedule.id, fan_out.created, fan_out.skipped);
        log_database_operation("create", "schedules", started.elapsed().as_millis() as u64, true);

        Ok(Created { entity: schedule, fan_out })
    }

    async fn update_schedule(&self, id: i64, request: UpdateScheduleRequest) -> Result<Schedule> {
        self.db.schedules.update(id, request).await?
            .ok_or(OpenHouseError::ScheduleNotFound { schedule_id: id })
    }

    async fn delete_schedule(&self, id: i64) -> Result<()> {
        let mut tx = self.db.pool.begin().await?;
        self.db.appointments.lock_fan_out_in(&mut *tx).await?;
        if !self.db.schedules.delete_in(&mut *tx, id).await? {
            return Err(OpenHouseError::ScheduleNotFound { schedule_id: id });
        }
        tx.commit().await?;
        Ok(())
    }

    async fn list_schedules(&self) -> Result<Vec<Schedule>> {
        self.db.schedules.list().await
    }

    async fn apply_event(&self, event: &DomainEvent) -> Result<FanOutReport> {
        let mut tx = self.db.pool.begin().await?;
        self.db.appointments.lock_fan_out_in(&mut *tx).await?;
        let places = self.db.places.list_in(&mut *tx).await?;
        let schedules = self.db.schedules.list_in(&mut *tx).await?;

        match event {
            DomainEvent::PlaceCreated(place) if !places.iter().any(|p| p.id == place.id) => {
                return Err(OpenHouseError::PlaceNotFound { place_id: place.id });
            }
            DomainEvent::ScheduleCreated(schedule) if !schedules.iter().any(|s| s.id == schedule.id) => {
                return Err(OpenHouseError::ScheduleNotFound { schedule_id: schedule.id });
            }
            _ => {}
        }

        let keys = self.generator.handle(event, &Counterparts { places: &places, schedules: &schedules });
        let report = self.apply_plan(&mut *tx, &keys, self.generator.policy()).await?;
        tx.commit().await?;
        log_fan_out(event.name(), event.entity_id(), report.created, report.skipped);
        Ok(report)
    }

    async fn insert_appointment(&self, key: AppointmentKey) -> Result<Appointment> {
        let mut tx = self.db.pool.begin().await?;
        if self.db.places.find_for_key_share_in(&mut *tx, key.place_id).await?.is_none() {
            return Err(OpenHouseError::PlaceNotFound { place_id: key.place_id });
        }
        if self.db.schedules.find_for_key_share_in(&mut *tx, key.schedule_id).await?.is_none() {
            return Err(OpenHouseError::ScheduleNotFound { schedule_id: key.schedule_id });
        }

        let appointment = self.db.appointments.insert_in(&mut *tx, key).await?;
        tx.commit().await?;
        Ok(appointment)
    }

    async fn list_appointments(&self) -> Result<Vec<Appointment>> {
        self.db.appointments.list().await
    }

    async fn appointment_detail(&self, key: AppointmentKey) -> Result<Option<AppointmentDetail>> {
        Ok(self.details(Some(key)).await?.into_iter().next())
    }

    async fn list_appointment_details(&self) -> Result<Vec<AppointmentDetail>> {
        self.details(None).await
    }

    async fn repair_appointments(&self) -> Result<FanOutReport> {
        let mut tx = self.db.pool.begin().await?;
        self.db.appointments.lock_fan_out_in(&mut *tx).await?;
        let places = self.db.places.list_in(&mut *tx).await?;
        let schedules = self.db.schedules.list_in(&mut *tx).await?;
        let existing: HashSet<AppointmentKey> = self.db.appointments.list_in(&mut *tx).await?
            .iter()
            .map(Appointment::key)
            .collect();

        let missing = self.generator.missing_pairs(&places, &schedules, &existing);
        let report = self.apply_plan(&mut *tx, &missing, DuplicatePolicy::Skip).await?;
        tx.commit().await?;

        if report.created > 0 {
            warn!(created = report.created, "Created missing appointments");
        }
        Ok(report)
    }

    async fn register(&self, request: RegistrationRequest, calculator: &OccupancyCalculator) -> Result<Registration> {
        let started = Instant::now();
        let keys: Vec<AppointmentKey> = request.appointments.iter().copied().collect();
        let mut tx = self.db.pool.begin().await?;

        let locked = self.db.appointments.lock_in(&mut *tx, &keys).await?;
        let filled = self.db.appointments.filled_in(&mut *tx, &keys).await?;

        for key in &keys {
            let row = locked
                .iter()
                .find(|row| row.key() == *key)
                .ok_or(OpenHouseError::AppointmentNotFound { key: *key })?;

            if let Some(school) = &request.school_filter {
                if !authorizeds_allow(&row.authorizeds, school) {
                    return Err(OpenHouseError::NotAuthorized { key: *key, school: school.clone() });
                }
            }

            let booked = filled.get(key).copied().unwrap_or(0);
            let occupancy = calculator.admit(*key, row.gauge, booked, request.student.people)?;
            debug!(appointment = %key, filled = occupancy.filled, level = %occupancy.level, "Appointment admits registration");
        }

        let student = self.db.students.create_in(&mut *tx, request.student).await?;
        for key in &keys {
            self.db.appointments.add_student_in(&mut *tx, *key, student.id).await?;
        }
        tx.commit().await?;
        log_database_operation("register", "appointment_students", started.elapsed().as_millis() as u64, true);

        Ok(Registration { student, appointments: keys })
    }

    async fn find_student_by_email(&self, email: &str) -> Result<Option<Student>> {
        self.db.students.find_by_email(email).await
    }

    async fn delete_student(&self, email: &str) -> Result<()> {
        if !self.db.students.delete_by_email(email).await? {
            return Err(OpenHouseError::StudentNotFound { email: email.to_string() });
        }
        Ok(())
    }

    async fn load_site_config(&self, site: &str) -> Result<Option<SiteConfig>> {
        self.db.site_configs.find(site).await
    }

    async fn save_site_config(&self, config: &SiteConfig) -> Result<SiteConfig> {
        self.db.site_configs.upsert(config).await
    }
}
