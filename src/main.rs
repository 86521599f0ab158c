//! OpenHouse
//!
//! Bootstrap entry point: prepares the database, makes sure every
//! place/slot pair has its appointment and reports current occupancy.

use std::sync::Arc;
use tracing::{debug, info, warn};

use OpenHouse::{
    config::Settings,
    utils::logging,
    database::{DatabaseService, PgBookingStore, connection::{create_pool, run_migrations, DatabaseConfig}},
    services::ServiceFactory,
    utils::helpers::format_timestamp,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new()?;
    settings.validate()?;

    // Initialize logging
    let _log_guard = logging::init_logging(&settings.logging)?;

    info!("Starting {}...", OpenHouse::info());

    // Initialize database connection
    info!("Connecting to database...");
    let db_pool = create_pool(&DatabaseConfig::from(&settings.database)).await?;
    run_migrations(&db_pool).await?;

    let database_service = DatabaseService::new(db_pool);
    let generator = ServiceFactory::generator(&settings.booking);
    let store = Arc::new(PgBookingStore::new(database_service.clone(), generator));

    // The stored record wins over the file
    let bootstrap = ServiceFactory::new(store.clone(), &settings.booking.site);
    let site = bootstrap.admin_service.load_or_seed_site_config(&settings.booking.site).await?;
    info!(site = %site.site, max_slot = site.max_slot, "Site configuration loaded");

    let services = ServiceFactory::new(store, &site);
    let repaired = services.admin_service.repair_appointments().await?;
    if repaired.created > 0 {
        warn!(created = repaired.created, "Appointments were missing and have been created");
    }

    for entry in services.registration_service.export_roster().await? {
        info!(
            appointment = %entry.appointment.key,
            place = %entry.appointment.place.name,
            datetime = %format_timestamp(entry.appointment.schedule.datetime),
            filled = entry.occupancy.filled,
            gauge = entry.occupancy.gauge,
            level = %entry.occupancy.level,
            "Appointment occupancy"
        );
        for student in &entry.appointment.students {
            debug!(appointment = %entry.appointment.key, people = student.people, "{}", student.display_name());
        }
    }

    let stats = database_service.get_system_stats().await?;
    info!(
        places = stats.places,
        schedules = stats.schedules,
        appointments = stats.appointments,
        students = stats.students,
        "OpenHouse ready"
    );

    Ok(())
}
