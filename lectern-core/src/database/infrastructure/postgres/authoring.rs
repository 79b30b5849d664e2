use async_trait::async_trait;
use serde_json::Value;
use sqlx::{PgPool, Postgres, Row, Transaction};

use lectern_model::{Course, CourseId, Lesson, LessonId};

use crate::database::ports::{AuthoringSession, AuthoringStore};
use crate::error::{AuthoringError, Result};

/// Postgres-backed [`AuthoringStore`].
#[derive(Clone, Debug)]
pub struct PostgresAuthoringStore {
    pool: PgPool,
}

impl PostgresAuthoringStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuthoringStore for PostgresAuthoringStore {
    async fn begin(&self) -> Result<Box<dyn AuthoringSession>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AuthoringError::from_sqlx(e, "begin authoring transaction"))?;

        // The course+lesson pair is the unit of isolation; SERIALIZABLE
        // makes the database arbitrate concurrent edits.
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AuthoringError::from_sqlx(e, "set transaction isolation")
            })?;

        Ok(Box::new(PostgresAuthoringSession { tx }))
    }
}

/// One open transaction. Dropping it without commit rolls back, which
/// covers caller disconnects mid-edit.
struct PostgresAuthoringSession {
    tx: Transaction<'static, Postgres>,
}

impl PostgresAuthoringSession {
    fn decode<T: serde::de::DeserializeOwned>(doc: Value, what: &str) -> Result<T> {
        serde_json::from_value(doc).map_err(|e| {
            AuthoringError::Internal(format!("corrupt {what} document: {e}"))
        })
    }

    fn encode<T: serde::Serialize>(doc: &T, what: &str) -> Result<Value> {
        serde_json::to_value(doc).map_err(|e| {
            AuthoringError::Internal(format!("failed to encode {what}: {e}"))
        })
    }
}

#[async_trait]
impl AuthoringSession for PostgresAuthoringSession {
    async fn fetch_course(&mut self, id: CourseId) -> Result<Course> {
        let row = sqlx::query("SELECT doc FROM courses WHERE id = $1")
            .bind(id.to_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| AuthoringError::from_sqlx(e, "fetch course"))?
            .ok_or_else(|| AuthoringError::NotFound(format!("course {id}")))?;

        let doc: Value = row
            .try_get("doc")
            .map_err(|e| AuthoringError::from_sqlx(e, "read course document"))?;
        Self::decode(doc, "course")
    }

    async fn fetch_lesson(
        &mut self,
        course: CourseId,
        lesson: LessonId,
    ) -> Result<Lesson> {
        let row =
            sqlx::query("SELECT doc FROM lessons WHERE id = $1 AND course_id = $2")
                .bind(lesson.to_uuid())
                .bind(course.to_uuid())
                .fetch_optional(&mut *self.tx)
                .await
                .map_err(|e| AuthoringError::from_sqlx(e, "fetch lesson"))?
                .ok_or_else(|| {
                    AuthoringError::NotFound(format!("lesson {lesson}"))
                })?;

        let doc: Value = row
            .try_get("doc")
            .map_err(|e| AuthoringError::from_sqlx(e, "read lesson document"))?;
        Self::decode(doc, "lesson")
    }

    async fn store_course(&mut self, course: &Course) -> Result<()> {
        let doc = Self::encode(course, "course")?;
        sqlx::query(
            r#"
            INSERT INTO courses (id, doc, last_edited_on)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET
                doc = EXCLUDED.doc,
                last_edited_on = EXCLUDED.last_edited_on
            "#,
        )
        .bind(course.id.to_uuid())
        .bind(doc)
        .bind(course.last_edited_on)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| AuthoringError::from_sqlx(e, "store course"))?;
        Ok(())
    }

    async fn store_lesson(
        &mut self,
        course: CourseId,
        lesson: &Lesson,
    ) -> Result<()> {
        let doc = Self::encode(lesson, "lesson")?;
        sqlx::query(
            r#"
            INSERT INTO lessons (id, course_id, doc, last_edited_on)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE SET
                doc = EXCLUDED.doc,
                last_edited_on = EXCLUDED.last_edited_on
            "#,
        )
        .bind(lesson.id.to_uuid())
        .bind(course.to_uuid())
        .bind(doc)
        .bind(lesson.last_edited_on)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| AuthoringError::from_sqlx(e, "store lesson"))?;
        Ok(())
    }

    async fn delete_lesson(
        &mut self,
        course: CourseId,
        lesson: LessonId,
    ) -> Result<()> {
        sqlx::query("DELETE FROM lessons WHERE id = $1 AND course_id = $2")
            .bind(lesson.to_uuid())
            .bind(course.to_uuid())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| AuthoringError::from_sqlx(e, "delete lesson"))?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| AuthoringError::from_sqlx(e, "commit authoring transaction"))
    }

    async fn abort(self: Box<Self>) -> Result<()> {
        self.tx
            .rollback()
            .await
            .map_err(|e| AuthoringError::from_sqlx(e, "abort authoring transaction"))
    }
}
