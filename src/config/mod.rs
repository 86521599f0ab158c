//! Configuration loading
//!
//! Settings come from an optional `config.toml` overlaid with `OPENHOUSE_`
//! environment variables. The `[booking.site]` table seeds the site record.

pub mod settings;
pub mod validation;

pub use settings::{Settings, DatabaseConfig, LoggingConfig, BookingConfig};
pub use validation::validate_site_config;
