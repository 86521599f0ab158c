//! Student repository implementation

use sqlx::{PgConnection, PgPool};
use chrono::Utc;
use crate::models::student::{Student, CreateStudentRequest};
use crate::utils::errors::OpenHouseError;

#[derive(Clone, Debug)]
pub struct StudentRepository {
    pool: PgPool,
}

impl StudentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new student inside a transaction
    ///
    /// The unique index on email turns a second registration into
    /// `AlreadyRegistered`.
    pub async fn create_in(&self, conn: &mut PgConnection, request: CreateStudentRequest) -> Result<Student, OpenHouseError> {
        let email = request.email.clone();
        let student = sqlx::query_as::<_, Student>(
            r#"
            INSERT INTO students (lastname, firstname, school, email, people, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, lastname, firstname, school, email, people, created_at
            "#
        )
        .bind(request.lastname)
        .bind(request.firstname)
        .bind(request.school)
        .bind(request.email)
        .bind(request.people)
        .bind(Utc::now())
        .fetch_one(conn)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => OpenHouseError::AlreadyRegistered { email },
            other => OpenHouseError::Database(other),
        })?;

        Ok(student)
    }

    /// Find student by email
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Student>, OpenHouseError> {
        let student = sqlx::query_as::<_, Student>(
            "SELECT id, lastname, firstname, school, email, people, created_at FROM students WHERE email = $1"
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(student)
    }

    /// Delete student, memberships follow by cascade
    pub async fn delete_by_email(&self, email: &str) -> Result<bool, OpenHouseError> {
        let result = sqlx::query("DELETE FROM students WHERE email = $1")
            .bind(email)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Count total students
    pub async fn count(&self) -> Result<i64, OpenHouseError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM students")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }
}
