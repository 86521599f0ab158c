//! Per-site configuration record
//!
//! One record per deployment, edited by administrators. Services receive it
//! by value; nothing reads it from ambient state.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Site this record belongs to
    pub site: String,
    /// Ask visitors for their school of origin
    pub school: bool,
    /// Maximum number of escorts per registration, 0 disables the question
    pub max_escort: u32,
    /// Maximum number of slots selectable in one registration
    pub max_slot: u32,
    /// Show how many people are booked on each slot
    pub show_people: bool,
    /// Fill rate at which a slot turns orange, 100 disables it
    pub caution_level: u32,
    /// Fill rate at which a slot turns red, 100 disables it
    pub warning_level: u32,
    /// Fill rate at which registration closes, should be 100
    pub forbidden_level: u32,
    pub recaptcha: bool,
    pub recaptcha_private: String,
    pub recaptcha_public: String,
    pub send_email_confirmation: bool,
    /// Warn visitors the site is a test deployment
    pub beta_test: bool,
    /// Show the personal-data notices
    pub rgpd: bool,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site: "default".to_string(),
            school: true,
            max_escort: 0,
            max_slot: 2,
            show_people: true,
            caution_level: 80,
            warning_level: 90,
            forbidden_level: 100,
            recaptcha: false,
            recaptcha_private: String::new(),
            recaptcha_public: String::new(),
            send_email_confirmation: false,
            beta_test: true,
            rgpd: true,
        }
    }
}

impl SiteConfig {
    /// Whether registrations carry an escort count
    pub fn asks_escorts(&self) -> bool {
        self.max_escort > 0
    }
}

impl std::fmt::Display for SiteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.site)
    }
}
