//! Place repository implementation

use sqlx::{PgConnection, PgPool};
use chrono::Utc;
use crate::models::place::{Place, CreatePlaceRequest, UpdatePlaceRequest};
use crate::utils::errors::OpenHouseError;

#[derive(Clone, Debug)]
pub struct PlaceRepository {
    pool: PgPool,
}

impl PlaceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new place inside a transaction
    pub async fn create_in(&self, conn: &mut PgConnection, request: CreatePlaceRequest) -> Result<Place, OpenHouseError> {
        let place = sqlx::query_as::<_, Place>(
            r#"
            INSERT INTO places (name, gauge, "order", created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, gauge, "order", created_at, updated_at
            "#
        )
        .bind(request.name)
        .bind(request.gauge)
        .bind(request.order.unwrap_or(0))
        .bind(Utc::now())
        .bind(Utc::now())
        .fetch_one(conn)
        .await?;

        Ok(place)
    }

    /// Find place by ID and hold it against deletion until the transaction ends
    pub async fn find_for_key_share_in(&self, conn: &mut PgConnection, id: i64) -> Result<Option<Place>, OpenHouseError> {
        let place = sqlx::query_as::<_, Place>(
            r#"SELECT id, name, gauge, "order", created_at, updated_at FROM places WHERE id = $1 FOR KEY SHARE"#
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(place)
    }

    /// Update place
    pub async fn update(&self, id: i64, request: UpdatePlaceRequest) -> Result<Option<Place>, OpenHouseError> {
        let place = sqlx::query_as::<_, Place>(
            r#"
            UPDATE places
            SET name = COALESCE($2, name),
                gauge = COALESCE($3, gauge),
                "order" = COALESCE($4, "order"),
                updated_at = $5
            WHERE id = $1
            RETURNING id, name, gauge, "order", created_at, updated_at
            "#
        )
        .bind(id)
        .bind(request.name)
        .bind(request.gauge)
        .bind(request.order)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(place)
    }

    /// Delete place, its appointments follow by cascade
    pub async fn delete_in(&self, conn: &mut PgConnection, id: i64) -> Result<bool, OpenHouseError> {
        let result = sqlx::query("DELETE FROM places WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// List places in display order
    pub async fn list(&self) -> Result<Vec<Place>, OpenHouseError> {
        let mut conn = self.pool.acquire().await?;
        self.list_in(&mut *conn).await
    }

    pub async fn list_in(&self, conn: &mut PgConnection) -> Result<Vec<Place>, OpenHouseError> {
        let places = sqlx::query_as::<_, Place>(
            r#"SELECT id, name, gauge, "order", created_at, updated_at FROM places ORDER BY "order" ASC, id ASC"#
        )
        .fetch_all(conn)
        .await?;

        Ok(places)
    }

    /// Count total places
    pub async fn count(&self) -> Result<i64, OpenHouseError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM places")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }
}
