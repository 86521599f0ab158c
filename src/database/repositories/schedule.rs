//! Schedule repository implementation

use sqlx::{PgConnection, PgPool};
use chrono::Utc;
use crate::models::schedule::{Schedule, CreateScheduleRequest, UpdateScheduleRequest, DEFAULT_AUTHORIZEDS};
use crate::utils::errors::OpenHouseError;

#[derive(Clone, Debug)]
pub struct ScheduleRepository {
    pool: PgPool,
}

impl ScheduleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new schedule inside a transaction
    pub async fn create_in(&self, conn: &mut PgConnection, request: CreateScheduleRequest) -> Result<Schedule, OpenHouseError> {
        let schedule = sqlx::query_as::<_, Schedule>(
            r#"
            INSERT INTO schedules (datetime, authorizeds, created_at, updated_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, datetime, authorizeds, created_at, updated_at
            "#
        )
        .bind(request.datetime)
        .bind(request.authorizeds.unwrap_or_else(|| DEFAULT_AUTHORIZEDS.to_string()))
        .bind(Utc::now())
        .bind(Utc::now())
        .fetch_one(conn)
        .await?;

        Ok(schedule)
    }

    /// Find schedule by ID and hold it against deletion until the transaction ends
    pub async fn find_for_key_share_in(&self, conn: &mut PgConnection, id: i64) -> Result<Option<Schedule>, OpenHouseError> {
        let schedule = sqlx::query_as::<_, Schedule>(
            "SELECT id, datetime, authorizeds, created_at, updated_at FROM schedules WHERE id = $1 FOR KEY SHARE"
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(schedule)
    }

    /// Update schedule
    pub async fn update(&self, id: i64, request: UpdateScheduleRequest) -> Result<Option<Schedule>, OpenHouseError> {
        let schedule = sqlx::query_as::<_, Schedule>(
            r#"
            UPDATE schedules
            SET datetime = COALESCE($2, datetime),
                authorizeds = COALESCE($3, authorizeds),
                updated_at = $4
            WHERE id = $1
            RETURNING id, datetime, authorizeds, created_at, updated_at
            "#
        )
        .bind(id)
        .bind(request.datetime)
        .bind(request.authorizeds)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(schedule)
    }

    /// Delete schedule, its appointments follow by cascade
    pub async fn delete_in(&self, conn: &mut PgConnection, id: i64) -> Result<bool, OpenHouseError> {
        let result = sqlx::query("DELETE FROM schedules WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// List schedules in chronological order
    pub async fn list(&self) -> Result<Vec<Schedule>, OpenHouseError> {
        let mut conn = self.pool.acquire().await?;
        self.list_in(&mut *conn).await
    }

    pub async fn list_in(&self, conn: &mut PgConnection) -> Result<Vec<Schedule>, OpenHouseError> {
        let schedules = sqlx::query_as::<_, Schedule>(
            "SELECT id, datetime, authorizeds, created_at, updated_at FROM schedules ORDER BY datetime ASC, id ASC"
        )
        .fetch_all(conn)
        .await?;

        Ok(schedules)
    }

    /// Count total schedules
    pub async fn count(&self) -> Result<i64, OpenHouseError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM schedules")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }
}
