use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{CourseId, EnrollmentId, LessonId, UserId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseInfo {
    pub amount_cents: u32,
    pub currency: String,
    pub reference: String,
    pub purchased_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonProgress {
    pub lesson: LessonId,
    pub done: bool,
}

/// Per-user enrollment and completion record.
///
/// At most one document exists per (user, course) pair. Never
/// transactionally coupled to course/lesson edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrolledCourse {
    pub id: EnrollmentId,
    pub user: UserId,
    pub course: CourseId,
    pub purchase: PurchaseInfo,
    pub progress: Vec<LessonProgress>,
    pub updated_at: DateTime<Utc>,
}

impl EnrolledCourse {
    pub fn new(user: UserId, course: CourseId, purchase: PurchaseInfo) -> Self {
        Self {
            id: EnrollmentId::new(),
            user,
            course,
            purchase,
            progress: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    /// Flips the completion flag for `lesson`, inserting an entry if the
    /// lesson has never been toggled. Returns the new flag value.
    pub fn toggle_lesson(&mut self, lesson: LessonId) -> bool {
        if let Some(entry) = self.progress.iter_mut().find(|p| p.lesson == lesson) {
            entry.done = !entry.done;
            entry.done
        } else {
            self.progress.push(LessonProgress { lesson, done: true });
            true
        }
    }

    pub fn is_done(&self, lesson: LessonId) -> bool {
        self.progress
            .iter()
            .any(|p| p.lesson == lesson && p.done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn purchase() -> PurchaseInfo {
        PurchaseInfo {
            amount_cents: 4900,
            currency: "USD".into(),
            reference: "ch_123".into(),
            purchased_at: Utc::now(),
        }
    }

    #[test]
    fn toggle_flips_and_inserts() {
        let mut enrollment =
            EnrolledCourse::new(UserId::new(), CourseId::new(), purchase());
        let lesson = LessonId::new();

        assert!(!enrollment.is_done(lesson));
        assert!(enrollment.toggle_lesson(lesson));
        assert!(enrollment.is_done(lesson));
        assert!(!enrollment.toggle_lesson(lesson));
        assert!(!enrollment.is_done(lesson));
        assert_eq!(enrollment.progress.len(), 1);
    }
}
