//! Appointment repository implementation

use std::collections::HashMap;
use sqlx::{FromRow, PgConnection, PgPool};
use chrono::Utc;
use crate::models::{Appointment, AppointmentKey, Student};
use crate::utils::errors::OpenHouseError;

/// Locked appointment row with what the capacity check needs
#[derive(Debug, Clone, FromRow)]
pub struct LockedAppointment {
    pub place_id: i64,
    pub schedule_id: i64,
    pub gauge: i32,
    pub authorizeds: String,
}

impl LockedAppointment {
    pub fn key(&self) -> AppointmentKey {
        AppointmentKey::new(self.place_id, self.schedule_id)
    }
}

#[derive(Debug, Clone, FromRow)]
struct MemberRow {
    place_id: i64,
    schedule_id: i64,
    id: i64,
    lastname: String,
    firstname: String,
    school: Option<String>,
    email: String,
    people: i32,
    created_at: chrono::DateTime<Utc>,
}

/// Advisory lock key shared by every transaction that adds or removes a side
/// of the place/schedule cross product
const FAN_OUT_LOCK_KEY: i64 = 0x4F50_454E_484F_5553;

#[derive(Clone, Debug)]
pub struct AppointmentRepository {
    pool: PgPool,
}

impl AppointmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Serialize fan-out for the rest of the transaction.
    ///
    /// Without it, a place and a schedule created concurrently would each miss
    /// the other's uncommitted row and their pair would get no appointment.
    pub async fn lock_fan_out_in(&self, conn: &mut PgConnection) -> Result<(), OpenHouseError> {
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(FAN_OUT_LOCK_KEY)
            .execute(conn)
            .await?;

        Ok(())
    }

    /// Insert an appointment unless it exists, returns whether a row was written
    pub async fn insert_if_absent_in(&self, conn: &mut PgConnection, key: AppointmentKey) -> Result<bool, OpenHouseError> {
        let result = sqlx::query(
            r#"
            INSERT INTO appointments (place_id, schedule_id, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (place_id, schedule_id) DO NOTHING
            "#
        )
        .bind(key.place_id)
        .bind(key.schedule_id)
        .bind(Utc::now())
        .execute(conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Insert an appointment, failing with `DuplicateKey` if it exists
    pub async fn insert_in(&self, conn: &mut PgConnection, key: AppointmentKey) -> Result<Appointment, OpenHouseError> {
        let appointment = sqlx::query_as::<_, Appointment>(
            r#"
            INSERT INTO appointments (place_id, schedule_id, created_at)
            VALUES ($1, $2, $3)
            RETURNING place_id, schedule_id, created_at
            "#
        )
        .bind(key.place_id)
        .bind(key.schedule_id)
        .bind(Utc::now())
        .fetch_one(conn)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => OpenHouseError::DuplicateKey { key },
            other => OpenHouseError::Database(other),
        })?;

        Ok(appointment)
    }

    /// Existing keys among `keys`
    pub async fn existing_in(&self, conn: &mut PgConnection, keys: &[AppointmentKey]) -> Result<Vec<AppointmentKey>, OpenHouseError> {
        let (place_ids, schedule_ids) = split_keys(keys);
        let rows: Vec<(i64, i64)> = sqlx::query_as(
            r#"
            SELECT place_id, schedule_id FROM appointments
            WHERE (place_id, schedule_id) IN (SELECT * FROM UNNEST($1::BIGINT[], $2::BIGINT[]))
            "#
        )
        .bind(place_ids)
        .bind(schedule_ids)
        .fetch_all(conn)
        .await?;

        Ok(rows.into_iter().map(|(p, s)| AppointmentKey::new(p, s)).collect())
    }

    /// Find appointment by key
    pub async fn find_in(&self, conn: &mut PgConnection, key: AppointmentKey) -> Result<Option<Appointment>, OpenHouseError> {
        let appointment = sqlx::query_as::<_, Appointment>(
            "SELECT place_id, schedule_id, created_at FROM appointments WHERE place_id = $1 AND schedule_id = $2"
        )
        .bind(key.place_id)
        .bind(key.schedule_id)
        .fetch_optional(conn)
        .await?;

        Ok(appointment)
    }

    /// List all appointments in key order
    pub async fn list(&self) -> Result<Vec<Appointment>, OpenHouseError> {
        let mut conn = self.pool.acquire().await?;
        self.list_in(&mut *conn).await
    }

    pub async fn list_in(&self, conn: &mut PgConnection) -> Result<Vec<Appointment>, OpenHouseError> {
        let appointments = sqlx::query_as::<_, Appointment>(
            "SELECT place_id, schedule_id, created_at FROM appointments ORDER BY place_id ASC, schedule_id ASC"
        )
        .fetch_all(conn)
        .await?;

        Ok(appointments)
    }

    /// Lock the target rows for the rest of the transaction.
    ///
    /// Rows are locked in key order so concurrent registrations over
    /// overlapping sets cannot deadlock.
    pub async fn lock_in(&self, conn: &mut PgConnection, keys: &[AppointmentKey]) -> Result<Vec<LockedAppointment>, OpenHouseError> {
        let (place_ids, schedule_ids) = split_keys(keys);
        let rows = sqlx::query_as::<_, LockedAppointment>(
            r#"
            SELECT a.place_id, a.schedule_id, p.gauge, s.authorizeds
            FROM appointments a
            INNER JOIN places p ON p.id = a.place_id
            INNER JOIN schedules s ON s.id = a.schedule_id
            WHERE (a.place_id, a.schedule_id) IN (SELECT * FROM UNNEST($1::BIGINT[], $2::BIGINT[]))
            ORDER BY a.place_id ASC, a.schedule_id ASC
            FOR UPDATE OF a
            "#
        )
        .bind(place_ids)
        .bind(schedule_ids)
        .fetch_all(conn)
        .await?;

        Ok(rows)
    }

    /// People booked per appointment, escorts included
    pub async fn filled_in(&self, conn: &mut PgConnection, keys: &[AppointmentKey]) -> Result<HashMap<AppointmentKey, i64>, OpenHouseError> {
        let (place_ids, schedule_ids) = split_keys(keys);
        let rows: Vec<(i64, i64, i64)> = sqlx::query_as(
            r#"
            SELECT m.place_id, m.schedule_id, COALESCE(SUM(st.people), 0)::BIGINT
            FROM appointment_students m
            INNER JOIN students st ON st.id = m.student_id
            WHERE (m.place_id, m.schedule_id) IN (SELECT * FROM UNNEST($1::BIGINT[], $2::BIGINT[]))
            GROUP BY m.place_id, m.schedule_id
            "#
        )
        .bind(place_ids)
        .bind(schedule_ids)
        .fetch_all(conn)
        .await?;

        Ok(rows.into_iter().map(|(p, s, filled)| (AppointmentKey::new(p, s), filled)).collect())
    }

    /// Attach a student to an appointment
    pub async fn add_student_in(&self, conn: &mut PgConnection, key: AppointmentKey, student_id: i64) -> Result<(), OpenHouseError> {
        sqlx::query(
            "INSERT INTO appointment_students (place_id, schedule_id, student_id) VALUES ($1, $2, $3)"
        )
        .bind(key.place_id)
        .bind(key.schedule_id)
        .bind(student_id)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Students booked on each appointment, optionally restricted to one key
    pub async fn members_in(&self, conn: &mut PgConnection, key: Option<AppointmentKey>) -> Result<HashMap<AppointmentKey, Vec<Student>>, OpenHouseError> {
        let rows = sqlx::query_as::<_, MemberRow>(
            r#"
            SELECT m.place_id, m.schedule_id, st.id, st.lastname, st.firstname, st.school, st.email, st.people, st.created_at
            FROM appointment_students m
            INNER JOIN students st ON st.id = m.student_id
            WHERE ($1::BIGINT IS NULL OR (m.place_id = $1 AND m.schedule_id = $2))
            ORDER BY st.email ASC
            "#
        )
        .bind(key.map(|k| k.place_id))
        .bind(key.map(|k| k.schedule_id))
        .fetch_all(conn)
        .await?;

        let mut members: HashMap<AppointmentKey, Vec<Student>> = HashMap::new();
        for row in rows {
            members
                .entry(AppointmentKey::new(row.place_id, row.schedule_id))
                .or_default()
                .push(Student {
                    id: row.id,
                    lastname: row.lastname,
                    firstname: row.firstname,
                    school: row.school,
                    email: row.email,
                    people: row.people,
                    created_at: row.created_at,
                });
        }

        Ok(members)
    }

    /// Count total appointments
    pub async fn count(&self) -> Result<i64, OpenHouseError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM appointments")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }
}

fn split_keys(keys: &[AppointmentKey]) -> (Vec<i64>, Vec<i64>) {
    keys.iter().map(|k| (k.place_id, k.schedule_id)).unzip()
}
