//! Registration service
//!
//! The contract a booking front end relies on: list the slots a visitor may
//! pick, and register a visitor on a set of slots. Capacity checks run inside
//! the store under lock; this layer validates the form against the site
//! configuration it was built with.

use std::collections::BTreeSet;
use std::sync::Arc;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use crate::database::BookingStore;
use crate::models::*;
use crate::services::occupancy::{Occupancy, OccupancyCalculator};
use crate::utils::errors::{OpenHouseError, Result};
use crate::utils::helpers::{is_valid_email, normalize_email, normalize_whitespace};
use crate::utils::logging::log_registration;

/// One bookable slot as shown to a visitor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotView {
    pub key: AppointmentKey,
    pub place_name: String,
    pub datetime: DateTime<Utc>,
    /// People already booked, hidden unless the site shows it
    pub people: Option<i64>,
    pub occupancy: Occupancy,
    /// Rounded fill percentage, hidden with `people`
    pub percent: Option<u32>,
    /// Display colour of the occupancy level
    pub color: Option<String>,
    pub available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotListing {
    pub max_slot: u32,
    pub slots: Vec<SlotView>,
}

/// An appointment with its occupancy and booked students
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterEntry {
    pub appointment: AppointmentDetail,
    pub occupancy: Occupancy,
}

#[derive(Clone)]
pub struct RegistrationService {
    store: Arc<dyn BookingStore>,
    config: SiteConfig,
    calculator: OccupancyCalculator,
}

impl RegistrationService {
    pub fn new(store: Arc<dyn BookingStore>, config: SiteConfig) -> Self {
        let calculator = OccupancyCalculator::from_config(&config);
        Self { store, config, calculator }
    }

    /// Slots open to a school, by time then place order.
    ///
    /// When the site does not ask for the school, every slot is listed and
    /// `school` is ignored.
    pub async fn list_appointments_for(&self, school: Option<&str>) -> Result<SlotListing> {
        let school = if self.config.school {
            let school = school
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| OpenHouseError::InvalidInput("School is required".to_string()))?;
            Some(school)
        } else {
            None
        };

        let slots: Vec<SlotView> = self
            .store
            .list_appointment_details()
            .await?
            .into_iter()
            .filter(|detail| school.map_or(true, |s| detail.schedule.authorizes(s)))
            .map(|detail| self.slot_view(&detail))
            .collect();

        debug!(school = school, slots = slots.len(), "Listed appointments");
        Ok(SlotListing { max_slot: self.config.max_slot, slots })
    }

    fn slot_view(&self, detail: &AppointmentDetail) -> SlotView {
        let occupancy = self.calculator.occupancy_of(detail);
        SlotView {
            key: detail.key,
            place_name: detail.place.name.clone(),
            datetime: detail.schedule.datetime,
            people: self.config.show_people.then_some(occupancy.filled),
            percent: occupancy.percent().filter(|_| self.config.show_people),
            color: occupancy.level.color().map(str::to_string),
            available: occupancy.level.accepts_registrations() && occupancy.remaining() > 0,
            occupancy,
        }
    }

    /// Register a visitor and their escorts on every selected appointment.
    ///
    /// Either the student is attached to all of them or nothing is written.
    pub async fn register(
        &self,
        student: NewStudent,
        appointments: BTreeSet<AppointmentKey>,
        escort_count: Option<u32>,
    ) -> Result<Registration> {
        let email = normalize_email(&student.email);
        let keys: Vec<AppointmentKey> = appointments.iter().copied().collect();

        let outcome = match self.validate(student, &appointments, escort_count) {
            Ok(request) => {
                let people = request.student.people;
                let request = RegistrationRequest { appointments, ..request };
                (people, self.store.register(request, &self.calculator).await)
            }
            Err(err) => (0, Err(err)),
        };

        let (people, result) = outcome;
        log_registration(&email, &keys, people, result.as_ref().map(|_| ()));
        result
    }

    fn validate(
        &self,
        student: NewStudent,
        appointments: &BTreeSet<AppointmentKey>,
        escort_count: Option<u32>,
    ) -> Result<RegistrationRequest> {
        if appointments.is_empty() {
            return Err(OpenHouseError::InvalidInput("Select at least one slot".to_string()));
        }
        if appointments.len() > self.config.max_slot as usize {
            return Err(OpenHouseError::TooManySlots {
                selected: appointments.len(),
                max: self.config.max_slot,
            });
        }

        let lastname = normalize_whitespace(&student.lastname);
        let firstname = normalize_whitespace(&student.firstname);
        if lastname.is_empty() || firstname.is_empty() {
            return Err(OpenHouseError::InvalidInput("First and last name are required".to_string()));
        }

        let email = normalize_email(&student.email);
        if !is_valid_email(&email) {
            return Err(OpenHouseError::InvalidInput(format!("Invalid email: {}", student.email)));
        }

        let school = student.school.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        if self.config.school {
            match &school {
                Some(code) if is_known_school(code) => {}
                Some(code) => return Err(OpenHouseError::InvalidInput(format!("Unknown school: {}", code))),
                None => return Err(OpenHouseError::InvalidInput("School is required".to_string())),
            }
        }

        let escorts = escort_count.unwrap_or(0);
        if !self.config.asks_escorts() && escorts > 0 {
            return Err(OpenHouseError::InvalidInput("Escorts are not accepted".to_string()));
        }
        if escorts > self.config.max_escort && self.config.asks_escorts() {
            return Err(OpenHouseError::InvalidInput(format!(
                "Too many escorts: {} (max {})",
                escorts, self.config.max_escort
            )));
        }
        let people = i32::try_from(escorts)
            .ok()
            .and_then(|e| e.checked_add(1))
            .ok_or_else(|| OpenHouseError::InvalidInput("Escort count out of range".to_string()))?;

        Ok(RegistrationRequest {
            school_filter: if self.config.school { school.clone() } else { None },
            student: CreateStudentRequest { lastname, firstname, school, email, people },
            appointments: BTreeSet::new(),
        })
    }

    /// Cancel a registration
    pub async fn unregister(&self, email: &str) -> Result<()> {
        let email = normalize_email(email);
        self.store.delete_student(&email).await?;
        info!(email = %email, "Registration cancelled");
        Ok(())
    }

    pub async fn find_registration(&self, email: &str) -> Result<Option<Student>> {
        self.store.find_student_by_email(&normalize_email(email)).await
    }

    pub async fn appointment_detail(&self, key: AppointmentKey) -> Result<RosterEntry> {
        let appointment = self
            .store
            .appointment_detail(key)
            .await?
            .ok_or(OpenHouseError::AppointmentNotFound { key })?;
        let occupancy = self.calculator.occupancy_of(&appointment);
        Ok(RosterEntry { appointment, occupancy })
    }

    /// Every appointment with its students, for the organisers
    pub async fn export_roster(&self) -> Result<Vec<RosterEntry>> {
        Ok(self
            .store
            .list_appointment_details()
            .await?
            .into_iter()
            .map(|appointment| {
                let occupancy = self.calculator.occupancy_of(&appointment);
                RosterEntry { appointment, occupancy }
            })
            .collect())
    }
}
