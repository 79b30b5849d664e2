//! Enrollment ledger: per-user lesson completion and keyset-paginated
//! enrolled-course listings. Never transactionally coupled to authoring
//! edits.

mod cursor;

pub use cursor::Cursor;

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use lectern_model::{CourseId, EnrolledCourse, LessonId, PurchaseInfo, UserId};

use crate::database::ports::{EnrollmentRepository, PageKey};
use crate::error::{AuthoringError, Result};

/// One page of a keyset-paginated listing.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub has_next: bool,
    pub has_previous: bool,
    pub next_cursor: Option<Cursor>,
}

#[derive(Clone)]
pub struct EnrollmentLedger {
    repo: Arc<dyn EnrollmentRepository>,
}

impl std::fmt::Debug for EnrollmentLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnrollmentLedger").finish_non_exhaustive()
    }
}

impl EnrollmentLedger {
    pub fn new(repo: Arc<dyn EnrollmentRepository>) -> Self {
        Self { repo }
    }

    /// Creates the unique enrollment document for (user, course).
    /// `Conflict` if one already exists.
    pub async fn enroll(
        &self,
        user: UserId,
        course: CourseId,
        purchase: PurchaseInfo,
    ) -> Result<EnrolledCourse> {
        let enrollment = EnrolledCourse::new(user, course, purchase);
        self.repo.insert(&enrollment).await?;
        info!(%user, %course, "enrolled");
        Ok(enrollment)
    }

    /// Lists the user's enrollments ordered by last update, newest
    /// first, `limit` per page.
    pub async fn list_enrolled(
        &self,
        user: UserId,
        cursor: Option<Cursor>,
        limit: usize,
    ) -> Result<Page<EnrolledCourse>> {
        if limit == 0 {
            return Err(AuthoringError::InvalidInput(
                "page limit must be positive".into(),
            ));
        }

        let before = cursor.map(|c| PageKey {
            updated_at: c.updated_at,
            id: c.id,
        });
        // One extra row tells us whether a next page exists.
        let mut items = self.repo.list_page(user, before, limit + 1).await?;

        let has_next = items.len() > limit;
        items.truncate(limit);

        let next_cursor = if has_next {
            items.last().map(|last| Cursor {
                updated_at: last.updated_at,
                id: last.id.to_uuid(),
            })
        } else {
            None
        };

        Ok(Page {
            items,
            has_next,
            has_previous: before.is_some(),
            next_cursor,
        })
    }

    /// Flips the completion flag of `lesson` in the user's enrollment.
    /// `NotFound` if the user is not enrolled in the course.
    pub async fn toggle_lesson_done(
        &self,
        user: UserId,
        course: CourseId,
        lesson: LessonId,
    ) -> Result<EnrolledCourse> {
        let mut enrollment =
            self.repo.find(user, course).await?.ok_or_else(|| {
                AuthoringError::NotFound(format!(
                    "enrollment for user {user} in course {course}"
                ))
            })?;

        let done = enrollment.toggle_lesson(lesson);
        enrollment.updated_at = Utc::now();
        self.repo.update(&enrollment).await?;

        info!(%user, %course, %lesson, done, "toggled lesson completion");
        Ok(enrollment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::infrastructure::memory::MemoryEnrollmentRepository;
    use chrono::{Duration, Utc};

    fn purchase() -> PurchaseInfo {
        PurchaseInfo {
            amount_cents: 2500,
            currency: "USD".into(),
            reference: "ch_test".into(),
            purchased_at: Utc::now(),
        }
    }

    fn ledger() -> (EnrollmentLedger, Arc<MemoryEnrollmentRepository>) {
        let repo = Arc::new(MemoryEnrollmentRepository::new());
        (EnrollmentLedger::new(repo.clone()), repo)
    }

    #[tokio::test]
    async fn pagination_walks_newest_to_oldest() {
        let (ledger, repo) = ledger();
        let user = UserId::new();
        let base = Utc::now();

        // Three enrollments with updated_at t1 < t2 < t3.
        let mut stamps = Vec::new();
        for i in 1..=3 {
            let mut enrollment =
                EnrolledCourse::new(user, CourseId::new(), purchase());
            enrollment.updated_at = base + Duration::seconds(i);
            stamps.push(enrollment.updated_at);
            repo.insert(&enrollment).await.unwrap();
        }

        let first = ledger.list_enrolled(user, None, 1).await.unwrap();
        assert_eq!(first.items.len(), 1);
        assert_eq!(first.items[0].updated_at, stamps[2]);
        assert!(first.has_next);
        assert!(!first.has_previous);

        let second = ledger
            .list_enrolled(user, first.next_cursor, 1)
            .await
            .unwrap();
        assert_eq!(second.items[0].updated_at, stamps[1]);
        assert!(second.has_next);
        assert!(second.has_previous);

        let third = ledger
            .list_enrolled(user, second.next_cursor, 1)
            .await
            .unwrap();
        assert_eq!(third.items[0].updated_at, stamps[0]);
        assert!(!third.has_next);
        assert!(third.next_cursor.is_none());
    }

    #[tokio::test]
    async fn duplicate_enrollment_conflicts() {
        let (ledger, _) = ledger();
        let user = UserId::new();
        let course = CourseId::new();

        ledger.enroll(user, course, purchase()).await.unwrap();
        let err = ledger.enroll(user, course, purchase()).await.unwrap_err();
        assert!(matches!(err, AuthoringError::Conflict(_)));
    }

    #[tokio::test]
    async fn toggle_without_enrollment_is_not_found() {
        let (ledger, _) = ledger();
        let err = ledger
            .toggle_lesson_done(UserId::new(), CourseId::new(), LessonId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthoringError::NotFound(_)));
    }

    #[tokio::test]
    async fn toggle_flips_and_bumps_updated_at() {
        let (ledger, _) = ledger();
        let user = UserId::new();
        let course = CourseId::new();
        let lesson = LessonId::new();

        let enrolled = ledger.enroll(user, course, purchase()).await.unwrap();

        let toggled = ledger
            .toggle_lesson_done(user, course, lesson)
            .await
            .unwrap();
        assert!(toggled.is_done(lesson));
        assert!(toggled.updated_at >= enrolled.updated_at);

        let toggled = ledger
            .toggle_lesson_done(user, course, lesson)
            .await
            .unwrap();
        assert!(!toggled.is_done(lesson));
    }

    #[tokio::test]
    async fn zero_limit_is_invalid() {
        let (ledger, _) = ledger();
        let err = ledger
            .list_enrolled(UserId::new(), None, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthoringError::InvalidInput(_)));
    }
}
