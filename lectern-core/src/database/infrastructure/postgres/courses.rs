use async_trait::async_trait;
use serde_json::Value;
use sqlx::{PgPool, Row};

use lectern_model::{Course, CourseId};

use crate::database::ports::CourseReader;
use crate::error::{AuthoringError, Result};

/// Read-only course lookups over the pool, outside any transaction.
#[derive(Clone, Debug)]
pub struct PostgresCourseRepository {
    pool: PgPool,
}

impl PostgresCourseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CourseReader for PostgresCourseRepository {
    async fn course(&self, id: CourseId) -> Result<Course> {
        let row = sqlx::query("SELECT doc FROM courses WHERE id = $1")
            .bind(id.to_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AuthoringError::from_sqlx(e, "fetch course"))?
            .ok_or_else(|| AuthoringError::NotFound(format!("course {id}")))?;

        let doc: Value = row
            .try_get("doc")
            .map_err(|e| AuthoringError::from_sqlx(e, "read course document"))?;
        serde_json::from_value(doc).map_err(|e| {
            AuthoringError::Internal(format!("corrupt course document: {e}"))
        })
    }
}
