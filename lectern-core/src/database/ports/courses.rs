use async_trait::async_trait;

use lectern_model::{Course, CourseId};

use crate::error::Result;

/// Read-only course lookups, used by the authorization gate.
#[async_trait]
pub trait CourseReader: Send + Sync {
    /// Loads a course document; `NotFound` if it does not exist.
    async fn course(&self, id: CourseId) -> Result<Course>;
}
