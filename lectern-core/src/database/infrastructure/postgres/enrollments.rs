use async_trait::async_trait;
use serde_json::Value;
use sqlx::{PgPool, Row};

use lectern_model::{CourseId, EnrolledCourse, UserId};

use crate::database::ports::{EnrollmentRepository, PageKey};
use crate::error::{AuthoringError, Result};

/// Postgres-backed [`EnrollmentRepository`].
#[derive(Clone, Debug)]
pub struct PostgresEnrollmentRepository {
    pool: PgPool,
}

impl PostgresEnrollmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn decode(doc: Value) -> Result<EnrolledCourse> {
        serde_json::from_value(doc).map_err(|e| {
            AuthoringError::Internal(format!("corrupt enrollment document: {e}"))
        })
    }

    fn encode(enrollment: &EnrolledCourse) -> Result<Value> {
        serde_json::to_value(enrollment).map_err(|e| {
            AuthoringError::Internal(format!("failed to encode enrollment: {e}"))
        })
    }
}

#[async_trait]
impl EnrollmentRepository for PostgresEnrollmentRepository {
    async fn insert(&self, enrollment: &EnrolledCourse) -> Result<()> {
        let doc = Self::encode(enrollment)?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AuthoringError::from_sqlx(e, "begin enrollment insert"))?;

        // The unique (user_id, course_id) index enforces one document
        // per pair; a violation surfaces as Conflict.
        sqlx::query(
            r#"
            INSERT INTO enrollments (id, user_id, course_id, doc, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(enrollment.id.to_uuid())
        .bind(enrollment.user.to_uuid())
        .bind(enrollment.course.to_uuid())
        .bind(doc)
        .bind(enrollment.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| AuthoringError::from_sqlx(e, "insert enrollment"))?;

        // The course's enrolled counter lives inside its document.
        sqlx::query(
            r#"
            UPDATE courses
            SET doc = jsonb_set(
                doc,
                '{enrolled}',
                to_jsonb(COALESCE((doc->>'enrolled')::int, 0) + 1)
            )
            WHERE id = $1
            "#,
        )
        .bind(enrollment.course.to_uuid())
        .execute(&mut *tx)
        .await
        .map_err(|e| AuthoringError::from_sqlx(e, "bump enrolled counter"))?;

        tx.commit()
            .await
            .map_err(|e| AuthoringError::from_sqlx(e, "commit enrollment insert"))
    }

    async fn find(
        &self,
        user: UserId,
        course: CourseId,
    ) -> Result<Option<EnrolledCourse>> {
        let row = sqlx::query(
            "SELECT doc FROM enrollments WHERE user_id = $1 AND course_id = $2",
        )
        .bind(user.to_uuid())
        .bind(course.to_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthoringError::from_sqlx(e, "fetch enrollment"))?;

        match row {
            Some(row) => {
                let doc: Value = row.try_get("doc").map_err(|e| {
                    AuthoringError::from_sqlx(e, "read enrollment document")
                })?;
                Ok(Some(Self::decode(doc)?))
            }
            None => Ok(None),
        }
    }

    async fn update(&self, enrollment: &EnrolledCourse) -> Result<()> {
        let doc = Self::encode(enrollment)?;
        let result = sqlx::query(
            "UPDATE enrollments SET doc = $1, updated_at = $2 WHERE id = $3",
        )
        .bind(doc)
        .bind(enrollment.updated_at)
        .bind(enrollment.id.to_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| AuthoringError::from_sqlx(e, "update enrollment"))?;

        if result.rows_affected() == 0 {
            return Err(AuthoringError::NotFound(format!(
                "enrollment {}",
                enrollment.id
            )));
        }
        Ok(())
    }

    async fn list_page(
        &self,
        user: UserId,
        before: Option<PageKey>,
        limit: usize,
    ) -> Result<Vec<EnrolledCourse>> {
        let rows = sqlx::query(
            r#"
            SELECT doc
            FROM enrollments
            WHERE user_id = $1
              AND ($2::timestamptz IS NULL OR (updated_at, id) < ($2, $3))
            ORDER BY updated_at DESC, id DESC
            LIMIT $4
            "#,
        )
        .bind(user.to_uuid())
        .bind(before.map(|k| k.updated_at))
        .bind(before.map(|k| k.id))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AuthoringError::from_sqlx(e, "list enrollments"))?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            let doc: Value = row.try_get("doc").map_err(|e| {
                AuthoringError::from_sqlx(e, "read enrollment document")
            })?;
            items.push(Self::decode(doc)?);
        }
        Ok(items)
    }
}
