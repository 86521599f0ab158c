//! In-memory booking store
//!
//! Keeps every table behind a single `RwLock`. Writers hold the lock for the
//! whole operation, which makes each operation serializable.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use crate::database::store::BookingStore;
use crate::models::*;
use crate::services::generator::{AppointmentGenerator, Counterparts, Created, DomainEvent, DuplicatePolicy, FanOutReport};
use crate::services::occupancy::OccupancyCalculator;
use crate::utils::errors::{OpenHouseError, Result};
use crate::utils::logging::log_fan_out;

#[derive(Debug, Default)]
struct Tables {
    next_place_id: i64,
    next_schedule_id: i64,
    next_student_id: i64,
    places: BTreeMap<i64, Place>,
    schedules: BTreeMap<i64, Schedule>,
    students: BTreeMap<i64, Student>,
    appointments: BTreeMap<AppointmentKey, Appointment>,
    memberships: BTreeMap<AppointmentKey, BTreeSet<i64>>,
    site_configs: HashMap<String, SiteConfig>,
}

impl Tables {
    fn sorted_places(&self) -> Vec<Place> {
        let mut places: Vec<Place> = self.places.values().cloned().collect();
        places.sort_by_key(Place::sort_key);
        places
    }

    fn sorted_schedules(&self) -> Vec<Schedule> {
        let mut schedules: Vec<Schedule> = self.schedules.values().cloned().collect();
        schedules.sort_by_key(|s| (s.datetime, s.id));
        schedules
    }

    fn filled(&self, key: &AppointmentKey) -> i64 {
        self.memberships
            .get(key)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.students.get(id))
                    .map(|s| i64::from(s.people))
                    .sum()
            })
            .unwrap_or(0)
    }

    fn detail(&self, key: &AppointmentKey) -> Option<AppointmentDetail> {
        self.appointments.get(key)?;
        let place = self.places.get(&key.place_id)?.clone();
        let schedule = self.schedules.get(&key.schedule_id)?.clone();
        let students = self
            .memberships
            .get(key)
            .map(|ids| ids.iter().filter_map(|id| self.students.get(id)).cloned().collect())
            .unwrap_or_default();

        Some(AppointmentDetail { key: *key, place, schedule, students })
    }

    fn insert_appointment(&mut self, key: AppointmentKey) -> Appointment {
        let appointment = Appointment {
            place_id: key.place_id,
            schedule_id: key.schedule_id,
            created_at: Utc::now(),
        };
        self.appointments.insert(key, appointment.clone());
        self.memberships.entry(key).or_default();
        appointment
    }

    /// Insert planned keys under the duplicate policy.
    ///
    /// Existing keys are checked up front so a `Fail` leaves the tables untouched.
    fn apply_plan(&mut self, keys: &[AppointmentKey], policy: DuplicatePolicy) -> Result<FanOutReport> {
        if policy == DuplicatePolicy::Fail {
            if let Some(key) = keys.iter().find(|k| self.appointments.contains_key(*k)) {
                return Err(OpenHouseError::DuplicateKey { key: *key });
            }
        }

        let mut report = FanOutReport::default();
        for key in keys {
            if self.appointments.contains_key(key) {
                warn!(appointment = %key, "Appointment already exists, skipping");
                report.record(false);
            } else {
                self.insert_appointment(*key);
                report.record(true);
            }
        }
        Ok(report)
    }

    fn remove_appointments(&mut self, matches: impl Fn(&AppointmentKey) -> bool) -> usize {
        let keys: Vec<AppointmentKey> = self.appointments.keys().filter(|k| matches(*k)).copied().collect();
        for key in &keys {
            self.appointments.remove(key);
            self.memberships.remove(key);
        }
        keys.len()
    }
}

/// Booking store kept in process memory
#[derive(Debug, Clone, Default)]
pub struct MemoryBookingStore {
    tables: Arc<RwLock<Tables>>,
    generator: AppointmentGenerator,
}

impl MemoryBookingStore {
    pub fn new(generator: AppointmentGenerator) -> Self {
        Self {
            tables: Arc::new(RwLock::new(Tables::default())),
            generator,
        }
    }

    /// Number of membership rows, for consistency checks
    pub async fn membership_count(&self) -> usize {
        self.tables.read().await.memberships.values().map(BTreeSet::len).sum()
    }
}

#[async_trait]
impl BookingStore for MemoryBookingStore {
    async fn create_place(&self, request: CreatePlaceRequest) -> Result<Created<Place>> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let place = Place {
            id: tables.next_place_id + 1,
            name: request.name,
            gauge: request.gauge,
            order: request.order.unwrap_or(0),
            created_at: now,
            updated_at: now,
        };

        let schedules = tables.sorted_schedules();
        let event = DomainEvent::PlaceCreated(place.clone());
        let keys = self.generator.handle(&event, &Counterparts { places: &[], schedules: &schedules });
        let fan_out = tables.apply_plan(&keys, self.generator.policy())?;

        tables.next_place_id = place.id;
        tables.places.insert(place.id, place.clone());
        log_fan_out(event.name(), place.id, fan_out.created, fan_out.skipped);

        Ok(Created { entity: place, fan_out })
    }

    async fn update_place(&self, id: i64, request: UpdatePlaceRequest) -> Result<Place> {
        let mut tables = self.tables.write().await;
        let place = tables.places.get_mut(&id).ok_or(OpenHouseError::PlaceNotFound { place_id: id })?;
        if let Some(name) = request.name {
            place.name = name;
        }
        if let Some(gauge) = request.gauge {
            place.gauge = gauge;
        }
        if let Some(order) = request.order {
            place.order = order;
        }
        place.updated_at = Utc::now();
        Ok(place.clone())
    }

    async fn delete_place(&self, id: i64) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.places.remove(&id).is_none() {
            return Err(OpenHouseError::PlaceNotFound { place_id: id });
        }
        let removed = tables.remove_appointments(|k| k.place_id == id);
        info!(place_id = id, appointments = removed, "Place deleted");
        Ok(())
    }

    async fn list_places(&self) -> Result<Vec<Place>> {
        Ok(self.tables.read().await.sorted_places())
    }

    async fn create_schedule(&self, request: CreateScheduleRequest) -> Result<Created<Schedule>> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let schedule = Schedule {
            id: tables.next_schedule_id + 1,
            datetime: request.datetime,
            authorizeds: request.authorizeds.unwrap_or_else(|| DEFAULT_AUTHORIZEDS.to_string()),
            created_at: now,
            updated_at: now,
        };

        let places = tables.sorted_places();
        let event = DomainEvent::ScheduleCreated(schedule.clone());
        let keys = self.generator.handle(&event, &Counterparts { places: &places, schedules: &[] });
        let fan_out = tables.apply_plan(&keys, self.generator.policy())?;

        tables.next_schedule_id = schedule.id;
        tables.schedules.insert(schedule.id, schedule.clone());
        log_fan_out(event.name(), schedule.id, fan_out.created, fan_out.skipped);

        Ok(Created { entity: schedule, fan_out })
    }

    async fn update_schedule(&self, id: i64, request: UpdateScheduleRequest) -> Result<Schedule> {
        let mut tables = self.tables.write().await;
        let schedule = tables.schedules.get_mut(&id).ok_or(OpenHouseError::ScheduleNotFound { schedule_id: id })?;
        if let Some(datetime) = request.datetime {
            schedule.datetime = datetime;
        }
        if let Some(authorizeds) = request.authorizeds {
            schedule.authorizeds = authorizeds;
        }
        schedule.updated_at = Utc::now();
        Ok(schedule.clone())
    }

    async fn delete_schedule(&self, id: i64) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.schedules.remove(&id).is_none() {
            return Err(OpenHouseError::ScheduleNotFound { schedule_id: id });
        }
        let removed = tables.remove_appointments(|k| k.schedule_id == id);
        info!(schedule_id = id, appointments = removed, "Schedule deleted");
        Ok(())
    }

    async fn list_schedules(&self) -> Result<Vec<Schedule>> {
        Ok(self.tables.read().await.sorted_schedules())
    }

    async fn apply_event(&self, event: &DomainEvent) -> Result<FanOutReport> {
        let mut tables = self.tables.write().await;
        match event {
            DomainEvent::PlaceCreated(place) if !tables.places.contains_key(&place.id) => {
                return Err(OpenHouseError::PlaceNotFound { place_id: place.id });
            }
            DomainEvent::ScheduleCreated(schedule) if !tables.schedules.contains_key(&schedule.id) => {
                return Err(OpenHouseError::ScheduleNotFound { schedule_id: schedule.id });
            }
            _ => {}
        }

        let places = tables.sorted_places();
        let schedules = tables.sorted_schedules();
        let keys = self.generator.handle(event, &Counterparts { places: &places, schedules: &schedules });
        let report = tables.apply_plan(&keys, self.generator.policy())?;
        log_fan_out(event.name(), event.entity_id(), report.created, report.skipped);
        Ok(report)
    }

    async fn insert_appointment(&self, key: AppointmentKey) -> Result<Appointment> {
        let mut tables = self.tables.write().await;
        if !tables.places.contains_key(&key.place_id) {
            return Err(OpenHouseError::PlaceNotFound { place_id: key.place_id });
        }
        if !tables.schedules.contains_key(&key.schedule_id) {
            return Err(OpenHouseError::ScheduleNotFound { schedule_id: key.schedule_id });
        }
        if tables.appointments.contains_key(&key) {
            return Err(OpenHouseError::DuplicateKey { key });
        }
        Ok(tables.insert_appointment(key))
    }

    async fn list_appointments(&self) -> Result<Vec<Appointment>> {
        Ok(self.tables.read().await.appointments.values().cloned().collect())
    }

    async fn appointment_detail(&self, key: AppointmentKey) -> Result<Option<AppointmentDetail>> {
        Ok(self.tables.read().await.detail(&key))
    }

    async fn list_appointment_details(&self) -> Result<Vec<AppointmentDetail>> {
        let tables = self.tables.read().await;
        let mut details: Vec<AppointmentDetail> = tables
            .appointments
            .keys()
            .filter_map(|key| tables.detail(key))
            .collect();
        details.sort_by_key(|d| (d.schedule.datetime, d.place.order, d.place.id, d.schedule.id));
        Ok(details)
    }

    async fn repair_appointments(&self) -> Result<FanOutReport> {
        let mut tables = self.tables.write().await;
        let places = tables.sorted_places();
        let schedules = tables.sorted_schedules();
        let existing: HashSet<AppointmentKey> = tables.appointments.keys().copied().collect();
        let missing = self.generator.missing_pairs(&places, &schedules, &existing);
        let report = tables.apply_plan(&missing, DuplicatePolicy::Skip)?;
        if report.created > 0 {
            warn!(created = report.created, "Created missing appointments");
        }
        Ok(report)
    }

    async fn register(&self, request: RegistrationRequest, calculator: &OccupancyCalculator) -> Result<Registration> {
        let mut tables = self.tables.write().await;

        for key in &request.appointments {
            let detail = tables.detail(key).ok_or(OpenHouseError::AppointmentNotFound { key: *key })?;
            if let Some(school) = &request.school_filter {
                if !detail.schedule.authorizes(school) {
                    return Err(OpenHouseError::NotAuthorized { key: *key, school: school.clone() });
                }
            }
            let occupancy = calculator.admit(*key, detail.place.gauge, tables.filled(key), request.student.people)?;
            debug!(appointment = %key, filled = occupancy.filled, level = %occupancy.level, "Appointment admits registration");
        }

        if tables.students.values().any(|s| s.email == request.student.email) {
            return Err(OpenHouseError::AlreadyRegistered { email: request.student.email });
        }

        tables.next_student_id += 1;
        let student = Student {
            id: tables.next_student_id,
            lastname: request.student.lastname,
            firstname: request.student.firstname,
            school: request.student.school,
            email: request.student.email,
            people: request.student.people,
            created_at: Utc::now(),
        };
        tables.students.insert(student.id, student.clone());
        for key in &request.appointments {
            tables.memberships.entry(*key).or_default().insert(student.id);
        }

        Ok(Registration {
            student,
            appointments: request.appointments.into_iter().collect(),
        })
    }

    async fn find_student_by_email(&self, email: &str) -> Result<Option<Student>> {
        let tables = self.tables.read().await;
        Ok(tables.students.values().find(|s| s.email == email).cloned())
    }

    async fn delete_student(&self, email: &str) -> Result<()> {
        let mut tables = self.tables.write().await;
        let id = tables
            .students
            .values()
            .find(|s| s.email == email)
            .map(|s| s.id)
            .ok_or_else(|| OpenHouseError::StudentNotFound { email: email.to_string() })?;
        tables.students.remove(&id);
        for members in tables.memberships.values_mut() {
            members.remove(&id);
        }
        Ok(())
    }

    async fn load_site_config(&self, site: &str) -> Result<Option<SiteConfig>> {
        Ok(self.tables.read().await.site_configs.get(site).cloned())
    }

    async fn save_site_config(&self, config: &SiteConfig) -> Result<SiteConfig> {
        let mut tables = self.tables.write().await;
        tables.site_configs.insert(config.site.clone(), config.clone());
        Ok(config.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    async fn seeded(places: usize, schedules: usize) -> MemoryBookingStore {
        let store = MemoryBookingStore::default();
        for i in 0..places {
            store
                .create_place(CreatePlaceRequest { name: format!("Salle {}", i), gauge: 10, order: None })
                .await
                .unwrap();
        }
        for i in 0..schedules {
            store
                .create_schedule(CreateScheduleRequest {
                    datetime: Utc.with_ymd_and_hms(2025, 1, 25, 9 + i as u32, 0, 0).unwrap(),
                    authorizeds: None,
                })
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_repair_recreates_a_missing_appointment() {
        let store = seeded(2, 3).await;
        let hole = AppointmentKey::new(2, 3);
        assert_eq!(store.tables.write().await.remove_appointments(|k| *k == hole), 1);
        assert!(store.appointment_detail(hole).await.unwrap().is_none());

        let report = store.repair_appointments().await.unwrap();

        assert_eq!(report, FanOutReport { created: 1, skipped: 0 });
        assert!(store.appointment_detail(hole).await.unwrap().is_some());
        assert_eq!(store.list_appointments().await.unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_repair_is_a_no_op_on_a_complete_cross_product() {
        let store = seeded(2, 2).await;
        let report = store.repair_appointments().await.unwrap();
        assert_eq!(report, FanOutReport::default());
    }

    #[tokio::test]
    async fn test_delete_student_drops_memberships() {
        let store = seeded(1, 1).await;
        let key = AppointmentKey::new(1, 1);
        let request = RegistrationRequest {
            student: CreateStudentRequest {
                lastname: "Martin".to_string(),
                firstname: "Lea".to_string(),
                school: None,
                email: "lea.martin@example.org".to_string(),
                people: 2,
            },
            appointments: [key].into_iter().collect(),
            school_filter: None,
        };
        store.register(request, &OccupancyCalculator::default()).await.unwrap();
        assert_eq!(store.tables.read().await.filled(&key), 2);

        store.delete_student("lea.martin@example.org").await.unwrap();

        assert_eq!(store.membership_count().await, 0);
        assert_eq!(store.tables.read().await.filled(&key), 0);
    }
}
