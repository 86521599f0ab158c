//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for OpenHouse.

use tracing::{info, warn, error, debug};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use crate::config::LoggingConfig;
use crate::models::AppointmentKey;
use crate::utils::errors::{OpenHouseError, Result};

/// Initialize logging based on configuration.
///
/// The returned guard flushes the file writer on drop and must be kept alive
/// for the lifetime of the process.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    let file_appender = tracing_appender::rolling::daily(&config.directory, &config.file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = tracing_subscriber::EnvFilter::try_new(&config.level)
        .map_err(|e| OpenHouseError::Config(format!("Invalid log filter {}: {}", config.level, e)))?;

    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(non_blocking);

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout));

    let initialized = if config.json {
        registry.with(file_layer.json()).try_init()
    } else {
        registry.with(file_layer).try_init()
    };
    initialized.map_err(|e| OpenHouseError::Config(format!("Logging already initialized: {}", e)))?;

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log a registration outcome
pub fn log_registration(email: &str, appointments: &[AppointmentKey], people: i32, outcome: std::result::Result<(), &OpenHouseError>) {
    let keys = appointments.iter().map(ToString::to_string).collect::<Vec<_>>().join(",");
    match outcome {
        Ok(()) => info!(
            email = email,
            appointments = %keys,
            people = people,
            "Registration accepted"
        ),
        Err(err) if err.is_user_facing() => warn!(
            email = email,
            appointments = %keys,
            people = people,
            reason = %err,
            "Registration refused"
        ),
        Err(err) => error!(
            email = email,
            appointments = %keys,
            people = people,
            error = %err,
            "Registration failed"
        ),
    }
}

/// Log an appointment fan-out
pub fn log_fan_out(trigger: &str, entity_id: i64, created: usize, skipped: usize) {
    if skipped > 0 {
        warn!(
            trigger = trigger,
            entity_id = entity_id,
            created = created,
            skipped = skipped,
            "Appointment fan-out skipped existing pairs"
        );
    } else {
        info!(
            trigger = trigger,
            entity_id = entity_id,
            created = created,
            "Appointment fan-out completed"
        );
    }
}

/// Log admin actions
pub fn log_admin_action(action: &str, target: Option<&str>, details: Option<&str>) {
    warn!(
        action = action,
        target = target,
        details = details,
        "Admin action performed"
    );
}

/// Log database operations
pub fn log_database_operation(operation: &str, table: &str, duration_ms: u64, success: bool) {
    if success {
        debug!(
            operation = operation,
            table = table,
            duration_ms = duration_ms,
            "Database operation completed"
        );
    } else {
        error!(
            operation = operation,
            table = table,
            duration_ms = duration_ms,
            "Database operation failed"
        );
    }
}
