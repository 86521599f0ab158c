//! Site configuration repository implementation

use sqlx::{FromRow, PgPool};
use chrono::Utc;
use crate::models::SiteConfig;
use crate::utils::errors::OpenHouseError;

#[derive(Debug, Clone, FromRow)]
struct SiteConfigRow {
    site: String,
    school: bool,
    max_escort: i64,
    max_slot: i64,
    show_people: bool,
    caution_level: i64,
    warning_level: i64,
    forbidden_level: i64,
    recaptcha: bool,
    recaptcha_private: String,
    recaptcha_public: String,
    send_email_confirmation: bool,
    beta_test: bool,
    rgpd: bool,
}

fn to_u32(field: &str, value: i64) -> Result<u32, OpenHouseError> {
    u32::try_from(value)
        .map_err(|_| OpenHouseError::Config(format!("Stored {} out of range: {}", field, value)))
}

impl TryFrom<SiteConfigRow> for SiteConfig {
    type Error = OpenHouseError;

    fn try_from(row: SiteConfigRow) -> Result<Self, Self::Error> {
        Ok(SiteConfig {
            max_escort: to_u32("max_escort", row.max_escort)?,
            max_slot: to_u32("max_slot", row.max_slot)?,
            caution_level: to_u32("caution_level", row.caution_level)?,
            warning_level: to_u32("warning_level", row.warning_level)?,
            forbidden_level: to_u32("forbidden_level", row.forbidden_level)?,
            site: row.site,
            school: row.school,
            show_people: row.show_people,
            recaptcha: row.recaptcha,
            recaptcha_private: row.recaptcha_private,
            recaptcha_public: row.recaptcha_public,
            send_email_confirmation: row.send_email_confirmation,
            beta_test: row.beta_test,
            rgpd: row.rgpd,
        })
    }
}

const COLUMNS: &str = "site, school, max_escort, max_slot, show_people, caution_level, warning_level, forbidden_level, recaptcha, recaptcha_private, recaptcha_public, send_email_confirmation, beta_test, rgpd";

#[derive(Clone, Debug)]
pub struct SiteConfigRepository {
    pool: PgPool,
}

impl SiteConfigRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find the record for a site
    pub async fn find(&self, site: &str) -> Result<Option<SiteConfig>, OpenHouseError> {
        let row = sqlx::query_as::<_, SiteConfigRow>(
            &format!("SELECT {} FROM site_configs WHERE site = $1", COLUMNS)
        )
        .bind(site)
        .fetch_optional(&self.pool)
        .await?;

        row.map(SiteConfig::try_from).transpose()
    }

    /// Insert or replace the record for a site
    pub async fn upsert(&self, config: &SiteConfig) -> Result<SiteConfig, OpenHouseError> {
        let row = sqlx::query_as::<_, SiteConfigRow>(
            &format!(
                r#"
                INSERT INTO site_configs ({columns}, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
                ON CONFLICT (site) DO UPDATE SET
                    school = EXCLUDED.school,
                    max_escort = EXCLUDED.max_escort,
                    max_slot = EXCLUDED.max_slot,
                    show_people = EXCLUDED.show_people,
                    caution_level = EXCLUDED.caution_level,
                    warning_level = EXCLUDED.warning_level,
                    forbidden_level = EXCLUDED.forbidden_level,
                    recaptcha = EXCLUDED.recaptcha,
                    recaptcha_private = EXCLUDED.recaptcha_private,
                    recaptcha_public = EXCLUDED.recaptcha_public,
                    send_email_confirmation = EXCLUDED.send_email_confirmation,
                    beta_test = EXCLUDED.beta_test,
                    rgpd = EXCLUDED.rgpd,
                    updated_at = EXCLUDED.updated_at
                RETURNING {columns}
                "#,
                columns = COLUMNS
            )
        )
        .bind(&config.site)
        .bind(config.school)
        .bind(i64::from(config.max_escort))
        .bind(i64::from(config.max_slot))
        .bind(config.show_people)
        .bind(i64::from(config.caution_level))
        .bind(i64::from(config.warning_level))
        .bind(i64::from(config.forbidden_level))
        .bind(config.recaptcha)
        .bind(&config.recaptcha_private)
        .bind(&config.recaptcha_public)
        .bind(config.send_email_confirmation)
        .bind(config.beta_test)
        .bind(config.rgpd)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        SiteConfig::try_from(row)
    }
}
