use async_trait::async_trait;

use lectern_model::{Course, CourseId, Lesson, LessonId};

use crate::error::Result;

/// One open multi-document transaction against the document store.
///
/// Dropping a session without calling [`commit`](Self::commit) aborts
/// it; callers that disconnect mid-edit therefore roll back rather than
/// leaving a transaction open.
#[async_trait]
pub trait AuthoringSession: Send {
    async fn fetch_course(&mut self, id: CourseId) -> Result<Course>;

    /// Fetches a lesson, scoped to its owning course.
    async fn fetch_lesson(
        &mut self,
        course: CourseId,
        lesson: LessonId,
    ) -> Result<Lesson>;

    /// Stages a course write (insert or replace).
    async fn store_course(&mut self, course: &Course) -> Result<()>;

    /// Stages a lesson write (insert or replace) under its course.
    async fn store_lesson(&mut self, course: CourseId, lesson: &Lesson)
        -> Result<()>;

    /// Stages a lesson deletion.
    async fn delete_lesson(&mut self, course: CourseId, lesson: LessonId)
        -> Result<()>;

    /// Commits every staged write atomically.
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Aborts, discarding every staged write.
    async fn abort(self: Box<Self>) -> Result<()>;
}

/// Factory for authoring transactions.
#[async_trait]
pub trait AuthoringStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn AuthoringSession>>;
}
