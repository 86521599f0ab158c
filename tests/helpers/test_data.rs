//! Test data builders

use std::sync::atomic::{AtomicUsize, Ordering};
use chrono::{DateTime, Duration, TimeZone, Utc};
use fake::Fake;
use fake::faker::name::en::{FirstName, LastName};
use OpenHouse::models::{NewStudent, SiteConfig};

static NEXT_VISITOR: AtomicUsize = AtomicUsize::new(1);

/// Site record used by most tests: school asked, up to 9 escorts, 2 slots
pub fn test_site_config() -> SiteConfig {
    SiteConfig {
        site: "lycee.test".to_string(),
        max_escort: 9,
        ..SiteConfig::default()
    }
}

/// Opening morning of the open house
pub fn open_house_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 25, 9, 0, 0).unwrap()
}

pub fn slot_at(hours: i64) -> DateTime<Utc> {
    open_house_start() + Duration::hours(hours)
}

/// A visitor with a random name and a unique email
pub fn visitor(school: &str) -> NewStudent {
    let n = NEXT_VISITOR.fetch_add(1, Ordering::SeqCst);
    NewStudent {
        lastname: LastName().fake(),
        firstname: FirstName().fake(),
        school: Some(school.to_string()),
        email: format!("visitor{}@example.org", n),
    }
}

pub fn visitor_with_email(school: &str, email: &str) -> NewStudent {
    NewStudent {
        email: email.to_string(),
        ..visitor(school)
    }
}
