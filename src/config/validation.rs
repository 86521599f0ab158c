//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use crate::models::SiteConfig;
use crate::utils::errors::{OpenHouseError, Result};
use super::Settings;

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_database_config(&settings.database)?;
    validate_logging_config(&settings.logging)?;
    validate_site_config(&settings.booking.site)?;

    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(OpenHouseError::Config(
            "Database URL is required".to_string()
        ));
    }

    if config.max_connections == 0 {
        return Err(OpenHouseError::Config(
            "Max connections must be greater than 0".to_string()
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(OpenHouseError::Config(
            "Min connections cannot be greater than max connections".to_string()
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(OpenHouseError::Config(
            "Log level is required".to_string()
        ));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(OpenHouseError::Config(
            format!("Invalid log level: {}. Valid levels: {:?}", config.level, valid_levels)
        ));
    }

    if config.file_name.is_empty() {
        return Err(OpenHouseError::Config(
            "Log file name is required".to_string()
        ));
    }

    Ok(())
}

/// Validate a site record, whether it comes from the file or the database
pub fn validate_site_config(config: &SiteConfig) -> Result<()> {
    if config.site.trim().is_empty() {
        return Err(OpenHouseError::Config(
            "Site name is required".to_string()
        ));
    }

    if config.max_slot == 0 {
        return Err(OpenHouseError::Config(
            "Max slot must be at least 1".to_string()
        ));
    }

    for (name, level) in [
        ("caution_level", config.caution_level),
        ("warning_level", config.warning_level),
        ("forbidden_level", config.forbidden_level),
    ] {
        if level > 100 {
            return Err(OpenHouseError::Config(
                format!("{} must be between 0 and 100, got {}", name, level)
            ));
        }
    }

    // A level at 100 is switched off and does not take part in the ordering.
    if config.warning_level < 100 && config.caution_level < 100 && config.caution_level > config.warning_level {
        return Err(OpenHouseError::Config(
            "Caution level cannot be greater than warning level".to_string()
        ));
    }

    if config.warning_level < 100 && config.warning_level > config.forbidden_level {
        return Err(OpenHouseError::Config(
            "Warning level cannot be greater than forbidden level".to_string()
        ));
    }

    if config.recaptcha && (config.recaptcha_private.is_empty() || config.recaptcha_public.is_empty()) {
        return Err(OpenHouseError::Config(
            "Recaptcha keys are required when recaptcha is enabled".to_string()
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_default_settings_are_valid() {
        assert!(validate_settings(&Settings::default()).is_ok());
    }

    #[test]
    fn test_rejects_invalid_log_level() {
        let mut settings = Settings::default();
        settings.logging.level = "verbose".to_string();
        assert_matches!(validate_settings(&settings), Err(OpenHouseError::Config(_)));
    }

    #[test]
    fn test_rejects_pool_bounds() {
        let mut settings = Settings::default();
        settings.database.min_connections = 20;
        assert_matches!(validate_settings(&settings), Err(OpenHouseError::Config(_)));
    }

    #[test]
    fn test_thresholds_must_be_percentages() {
        let mut site = SiteConfig::default();
        site.forbidden_level = 120;
        assert_matches!(validate_site_config(&site), Err(OpenHouseError::Config(msg)) if msg.contains("forbidden_level"));
    }

    #[test]
    fn test_threshold_ordering() {
        let mut site = SiteConfig::default();
        site.caution_level = 95;
        assert!(validate_site_config(&site).is_err());

        // Warning switched off, caution may sit anywhere below forbidden
        site.warning_level = 100;
        assert!(validate_site_config(&site).is_ok());
    }

    #[test]
    fn test_max_slot_and_recaptcha() {
        let mut site = SiteConfig::default();
        site.max_slot = 0;
        assert!(validate_site_config(&site).is_err());

        let mut site = SiteConfig::default();
        site.recaptcha = true;
        assert!(validate_site_config(&site).is_err());
        site.recaptcha_private = "k1".to_string();
        site.recaptcha_public = "k2".to_string();
        assert!(validate_site_config(&site).is_ok());
    }
}
