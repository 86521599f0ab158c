//! Occupancy calculator
//!
//! Turns the people booked on an appointment and its place gauge into a fill
//! ratio and a display level.

use serde::{Deserialize, Serialize};
use crate::models::{AppointmentDetail, AppointmentKey, SiteConfig};
use crate::utils::errors::{OpenHouseError, Result};

/// A caution or warning threshold at this value is switched off.
pub const DISABLED_LEVEL: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OccupancyLevel {
    Normal,
    Caution,
    Warning,
    Forbidden,
}

impl OccupancyLevel {
    /// Display colour, `None` for the default style
    pub fn color(&self) -> Option<&'static str> {
        match self {
            OccupancyLevel::Normal => None,
            OccupancyLevel::Caution => Some("orange"),
            OccupancyLevel::Warning | OccupancyLevel::Forbidden => Some("red"),
        }
    }

    pub fn accepts_registrations(&self) -> bool {
        *self != OccupancyLevel::Forbidden
    }
}

impl std::fmt::Display for OccupancyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OccupancyLevel::Normal => write!(f, "normal"),
            OccupancyLevel::Caution => write!(f, "caution"),
            OccupancyLevel::Warning => write!(f, "warning"),
            OccupancyLevel::Forbidden => write!(f, "forbidden"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupancyThresholds {
    pub caution: u32,
    pub warning: u32,
    pub forbidden: u32,
}

impl Default for OccupancyThresholds {
    fn default() -> Self {
        Self::from(&SiteConfig::default())
    }
}

impl From<&SiteConfig> for OccupancyThresholds {
    fn from(config: &SiteConfig) -> Self {
        Self {
            caution: config.caution_level,
            warning: config.warning_level,
            forbidden: config.forbidden_level,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Occupancy {
    pub filled: i64,
    pub gauge: i32,
    /// `filled / gauge`, undefined for a non-positive gauge
    pub ratio: Option<f64>,
    pub level: OccupancyLevel,
}

impl Occupancy {
    /// Rounded fill percentage for display
    pub fn percent(&self) -> Option<u32> {
        self.ratio.map(|r| (r * 100.0).round().max(0.0) as u32)
    }

    /// Seats left before the gauge is reached
    pub fn remaining(&self) -> i64 {
        (i64::from(self.gauge) - self.filled).max(0)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OccupancyCalculator {
    thresholds: OccupancyThresholds,
}

impl OccupancyCalculator {
    pub fn new(thresholds: OccupancyThresholds) -> Self {
        Self { thresholds }
    }

    pub fn from_config(config: &SiteConfig) -> Self {
        Self::new(OccupancyThresholds::from(config))
    }

    pub fn thresholds(&self) -> OccupancyThresholds {
        self.thresholds
    }

    pub fn occupancy(&self, gauge: i32, filled: i64) -> Occupancy {
        if gauge <= 0 {
            return Occupancy {
                filled,
                gauge,
                ratio: None,
                level: OccupancyLevel::Forbidden,
            };
        }

        Occupancy {
            filled,
            gauge,
            ratio: Some(filled as f64 / f64::from(gauge)),
            level: self.classify(gauge, filled),
        }
    }

    pub fn occupancy_of(&self, appointment: &AppointmentDetail) -> Occupancy {
        self.occupancy(appointment.place.gauge, appointment.filled())
    }

    /// Check that `people` more visitors fit on an appointment.
    ///
    /// A slot at the forbidden level takes nobody, and no registration may
    /// push the booked total past the gauge.
    pub fn admit(&self, key: AppointmentKey, gauge: i32, filled: i64, people: i32) -> Result<Occupancy> {
        let occupancy = self.occupancy(gauge, filled);
        if !occupancy.level.accepts_registrations() {
            return Err(OpenHouseError::AppointmentFull { key });
        }
        if filled + i64::from(people) > i64::from(gauge) {
            return Err(OpenHouseError::CapacityExceeded { key, filled, requested: people, gauge });
        }
        Ok(occupancy)
    }

    fn classify(&self, gauge: i32, filled: i64) -> OccupancyLevel {
        // filled / gauge * 100 >= threshold, kept in integers
        let reached = |threshold: u32| {
            i128::from(filled) * 100 >= i128::from(threshold) * i128::from(gauge)
        };

        if reached(self.thresholds.forbidden) {
            OccupancyLevel::Forbidden
        } else if self.thresholds.warning < DISABLED_LEVEL && reached(self.thresholds.warning) {
            OccupancyLevel::Warning
        } else if self.thresholds.caution < DISABLED_LEVEL && reached(self.thresholds.caution) {
            OccupancyLevel::Caution
        } else {
            OccupancyLevel::Normal
        }
    }
}
