use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use lectern_model::{CourseId, EnrolledCourse, UserId};

use crate::error::Result;

/// Keyset position within the `(updated_at, id)` descending ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageKey {
    pub updated_at: DateTime<Utc>,
    pub id: Uuid,
}

#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    /// Inserts a new enrollment and bumps the course's enrolled counter
    /// in the same transaction. `Conflict` if the (user, course) pair is
    /// already enrolled.
    async fn insert(&self, enrollment: &EnrolledCourse) -> Result<()>;

    async fn find(
        &self,
        user: UserId,
        course: CourseId,
    ) -> Result<Option<EnrolledCourse>>;

    async fn update(&self, enrollment: &EnrolledCourse) -> Result<()>;

    /// Returns up to `limit` enrollments for `user` strictly after
    /// `before` in `(updated_at, id)` descending order; `None` starts
    /// from the newest.
    async fn list_page(
        &self,
        user: UserId,
        before: Option<PageKey>,
        limit: usize,
    ) -> Result<Vec<EnrolledCourse>>;
}
