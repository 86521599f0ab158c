//! Postgres store tests
//!
//! These run against the database named by `TEST_DATABASE_URL` and return
//! early when it is unset. The schema is migrated and truncated per test.

mod helpers;

use std::collections::BTreeSet;
use std::sync::Arc;
use assert_matches::assert_matches;
use serial_test::serial;
use helpers::*;
use OpenHouse::database::{create_pool, run_migrations, BookingStore, DatabaseConfig, DatabasePool, DatabaseService, PgBookingStore};
use OpenHouse::models::*;
use OpenHouse::services::{AdminService, AppointmentGenerator, DuplicatePolicy, RegistrationService};
use OpenHouse::OpenHouseError;

struct PgContext {
    pool: DatabasePool,
    store: Arc<PgBookingStore>,
    admin: AdminService,
    registration: RegistrationService,
}

async fn setup(policy: DuplicatePolicy) -> Option<PgContext> {
    let url = match std::env::var("TEST_DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("TEST_DATABASE_URL not set, skipping");
            return None;
        }
    };

    let pool = create_pool(&DatabaseConfig { url, ..Default::default() })
        .await
        .expect("Failed to connect to test database");
    run_migrations(&pool).await.expect("Failed to run migrations");
    sqlx::query(
        "TRUNCATE appointment_students, appointments, students, schedules, places, site_configs RESTART IDENTITY CASCADE",
    )
    .execute(&pool)
    .await
    .expect("Failed to truncate tables");

    let store = Arc::new(PgBookingStore::new(DatabaseService::new(pool.clone()), AppointmentGenerator::new(policy)));
    Some(PgContext {
        pool,
        admin: AdminService::new(store.clone()),
        registration: RegistrationService::new(store.clone(), test_site_config()),
        store,
    })
}

impl PgContext {
    async fn place(&self, name: &str, gauge: i32) -> Place {
        self.admin
            .create_place(CreatePlaceRequest { name: name.to_string(), gauge, order: None })
            .await
            .expect("Failed to create place")
            .entity
    }

    async fn schedule(&self, hours: i64) -> Schedule {
        self.admin
            .create_schedule(CreateScheduleRequest { datetime: slot_at(hours), authorizeds: Some("TG".to_string()) })
            .await
            .expect("Failed to create schedule")
            .entity
    }

    async fn filled(&self, key: AppointmentKey) -> i64 {
        self.store.appointment_detail(key).await.unwrap().unwrap().filled()
    }
}

#[tokio::test]
#[serial]
async fn test_pg_fan_out_and_cascade() {
    let Some(ctx) = setup(DuplicatePolicy::Skip).await else { return };

    let first = ctx.schedule(0).await;
    let second = ctx.schedule(1).await;
    let place = ctx.place("Atelier", 10).await;

    let appointments = ctx.store.list_appointments().await.unwrap();
    assert_eq!(appointments.len(), 2);

    let result = ctx.store.insert_appointment(AppointmentKey::new(place.id, first.id)).await;
    assert_matches!(result, Err(OpenHouseError::DuplicateKey { .. }));

    ctx.admin.delete_schedule(second.id).await.unwrap();
    let keys: Vec<AppointmentKey> = ctx.store.list_appointments().await.unwrap().iter().map(Appointment::key).collect();
    assert_eq!(keys, vec![AppointmentKey::new(place.id, first.id)]);
}

#[tokio::test]
#[serial]
async fn test_pg_fail_policy_rolls_back_replay() {
    let Some(ctx) = setup(DuplicatePolicy::Fail).await else { return };

    let place = ctx.place("Atelier", 10).await;
    ctx.schedule(0).await;

    let result = ctx.admin.replay(&OpenHouse::services::DomainEvent::PlaceCreated(place)).await;
    assert_matches!(result, Err(OpenHouseError::DuplicateKey { .. }));
    assert_eq!(ctx.store.list_appointments().await.unwrap().len(), 1);
}

#[tokio::test]
#[serial]
async fn test_pg_registration_capacity_and_rollback() {
    let Some(ctx) = setup(DuplicatePolicy::Skip).await else { return };

    let small = ctx.place("Petite salle", 3).await;
    let large = ctx.place("Grande salle", 30).await;
    let schedule = ctx.schedule(0).await;
    let small_key = AppointmentKey::new(small.id, schedule.id);
    let large_key = AppointmentKey::new(large.id, schedule.id);

    ctx.registration.register(visitor("TG01"), keys(&[small_key]), Some(2)).await.unwrap();
    assert_eq!(ctx.filled(small_key).await, 3);

    let email = "rollback@example.org";
    let result = ctx
        .registration
        .register(visitor_with_email("TG01", email), keys(&[small_key, large_key]), None)
        .await;
    assert_matches!(result, Err(OpenHouseError::AppointmentFull { .. }));
    assert_eq!(ctx.filled(large_key).await, 0);
    assert!(ctx.registration.find_registration(email).await.unwrap().is_none());

    ctx.registration.register(visitor_with_email("TG01", email), keys(&[large_key]), None).await.unwrap();
    let again = ctx.registration.register(visitor_with_email("TG01", email), keys(&[large_key]), None).await;
    assert_matches!(again, Err(OpenHouseError::AlreadyRegistered { .. }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[serial]
async fn test_pg_concurrent_registrations_on_last_seats() {
    let Some(ctx) = setup(DuplicatePolicy::Skip).await else { return };

    let place = ctx.place("Atelier", 10).await;
    let schedule = ctx.schedule(0).await;
    let key = AppointmentKey::new(place.id, schedule.id);

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let service = ctx.registration.clone();
            tokio::spawn(async move { service.register(visitor("TG01"), keys(&[key]), Some(5)).await })
        })
        .collect();
    let results: Vec<_> = futures::future::join_all(handles).await.into_iter().map(|r| r.unwrap()).collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results.iter().filter_map(|r| r.as_ref().err()).all(OpenHouseError::is_capacity_error));
    assert_eq!(ctx.filled(key).await, 6);
}

#[tokio::test]
#[serial]
async fn test_pg_site_config_round_trip() {
    let Some(ctx) = setup(DuplicatePolicy::Skip).await else { return };

    let seeded = ctx.admin.load_or_seed_site_config(&test_site_config()).await.unwrap();
    assert_eq!(seeded, test_site_config());

    let edited = SiteConfig { max_slot: 4, show_people: false, ..seeded };
    ctx.admin.update_site_config(&edited).await.unwrap();

    let loaded = ctx.admin.load_or_seed_site_config(&test_site_config()).await.unwrap();
    assert_eq!(loaded, edited);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
#[serial]
async fn test_pg_concurrent_creations_keep_the_cross_product() {
    let Some(ctx) = setup(DuplicatePolicy::Skip).await else { return };
    let ctx = Arc::new(ctx);

    let mut handles = Vec::new();
    for i in 0..10i64 {
        let places = ctx.clone();
        handles.push(tokio::spawn(async move {
            places.place(&format!("Salle {}", i), 10).await;
        }));
        let schedules = ctx.clone();
        handles.push(tokio::spawn(async move {
            schedules.schedule(i).await;
        }));
    }
    for handle in futures::future::join_all(handles).await {
        handle.unwrap();
    }

    let places = ctx.store.list_places().await.unwrap();
    let schedules = ctx.store.list_schedules().await.unwrap();
    let appointments = ctx.store.list_appointments().await.unwrap();
    assert_eq!((places.len(), schedules.len()), (10, 10));
    assert_eq!(appointments.len(), places.len() * schedules.len());

    let report = ctx.admin.repair_appointments().await.unwrap();
    assert_eq!(report.created, 0);
}

#[tokio::test]
#[serial]
async fn test_pg_repair_recreates_a_missing_appointment() {
    let Some(ctx) = setup(DuplicatePolicy::Skip).await else { return };

    let first = ctx.place("Atelier", 10).await;
    let second = ctx.place("Amphi", 40).await;
    let morning = ctx.schedule(0).await;
    let afternoon = ctx.schedule(5).await;
    let hole = AppointmentKey::new(second.id, morning.id);

    sqlx::query("DELETE FROM appointments WHERE place_id = $1 AND schedule_id = $2")
        .bind(hole.place_id)
        .bind(hole.schedule_id)
        .execute(&ctx.pool)
        .await
        .expect("Failed to delete appointment");
    assert!(ctx.store.appointment_detail(hole).await.unwrap().is_none());

    let report = ctx.admin.repair_appointments().await.unwrap();

    assert_eq!(report.created, 1);
    assert_eq!(report.skipped, 0);
    let keys: BTreeSet<AppointmentKey> = ctx.store.list_appointments().await.unwrap().iter().map(Appointment::key).collect();
    let expected: BTreeSet<AppointmentKey> = [first.id, second.id]
        .iter()
        .flat_map(|p| [morning.id, afternoon.id].map(|s| AppointmentKey::new(*p, s)))
        .collect();
    assert_eq!(keys, expected);
}

#[tokio::test]
#[serial]
async fn test_pg_insert_for_deleted_place_is_not_found() {
    let Some(ctx) = setup(DuplicatePolicy::Skip).await else { return };

    let place = ctx.place("Atelier", 10).await;
    let schedule = ctx.schedule(0).await;
    ctx.admin.delete_place(place.id).await.unwrap();

    let result = ctx.store.insert_appointment(AppointmentKey::new(place.id, schedule.id)).await;
    assert_matches!(result, Err(OpenHouseError::PlaceNotFound { place_id }) if place_id == place.id);
}

#[tokio::test]
#[serial]
async fn test_pg_roster_joins_students() {
    let Some(ctx) = setup(DuplicatePolicy::Skip).await else { return };

    let place = ctx.place("Atelier", 10).await;
    let schedule = ctx.schedule(0).await;
    let key = AppointmentKey::new(place.id, schedule.id);
    let registration = ctx.registration.register(visitor("TG01"), keys(&[key]), Some(2)).await.unwrap();

    let roster = ctx.registration.export_roster().await.unwrap();
    assert_eq!(roster.len(), 1);
    assert_eq!(roster[0].appointment.place, place);
    assert_eq!(roster[0].appointment.students, vec![registration.student]);
    assert_eq!(roster[0].occupancy.filled, 3);
}
