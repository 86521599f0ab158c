//! Booking store abstraction
//!
//! Everything the generator and the registration service need from storage.
//! Each method is atomic: an entity creation commits together with its
//! appointment fan-out, and a registration commits its student and all its
//! memberships or nothing.

use async_trait::async_trait;
use crate::models::*;
use crate::services::generator::{Created, DomainEvent, FanOutReport};
use crate::services::occupancy::OccupancyCalculator;
use crate::utils::errors::Result;

#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Insert a place and one appointment per existing schedule
    async fn create_place(&self, request: CreatePlaceRequest) -> Result<Created<Place>>;

    async fn update_place(&self, id: i64, request: UpdatePlaceRequest) -> Result<Place>;

    /// Delete a place with its appointments and their memberships
    async fn delete_place(&self, id: i64) -> Result<()>;

    /// Places in display order
    async fn list_places(&self) -> Result<Vec<Place>>;

    /// Insert a schedule and one appointment per existing place
    async fn create_schedule(&self, request: CreateScheduleRequest) -> Result<Created<Schedule>>;

    async fn update_schedule(&self, id: i64, request: UpdateScheduleRequest) -> Result<Schedule>;

    /// Delete a schedule with its appointments and their memberships
    async fn delete_schedule(&self, id: i64) -> Result<()>;

    /// Schedules in chronological order
    async fn list_schedules(&self) -> Result<Vec<Schedule>>;

    /// Run the generator again for an already stored entity.
    ///
    /// Existing pairs are handled per the store's duplicate policy.
    async fn apply_event(&self, event: &DomainEvent) -> Result<FanOutReport>;

    /// Insert a single appointment, failing with `DuplicateKey` if it exists
    async fn insert_appointment(&self, key: AppointmentKey) -> Result<Appointment>;

    async fn list_appointments(&self) -> Result<Vec<Appointment>>;

    async fn appointment_detail(&self, key: AppointmentKey) -> Result<Option<AppointmentDetail>>;

    /// Every appointment with place, schedule and students, by schedule time then place order
    async fn list_appointment_details(&self) -> Result<Vec<AppointmentDetail>>;

    /// Create the appointments missing from the place/schedule cross product
    async fn repair_appointments(&self) -> Result<FanOutReport>;

    /// Check capacity on every target and attach a new student, all under lock
    async fn register(&self, request: RegistrationRequest, calculator: &OccupancyCalculator) -> Result<Registration>;

    async fn find_student_by_email(&self, email: &str) -> Result<Option<Student>>;

    /// Remove a student and their memberships
    async fn delete_student(&self, email: &str) -> Result<()>;

    async fn load_site_config(&self, site: &str) -> Result<Option<SiteConfig>>;

    async fn save_site_config(&self, config: &SiteConfig) -> Result<SiteConfig>;
}
