//! Authorization gate: confirms a principal owns a course before any
//! mutation is allowed through.

use std::sync::Arc;

use tracing::debug;

use lectern_model::{Course, CourseId, UserId};

use crate::database::ports::CourseReader;
use crate::error::{AuthoringError, Result};

/// Proof that a principal passed the instructor check for one course.
///
/// Mutating entry points take this instead of a raw course id, so
/// skipping the gate is unrepresentable. The handle is per-call and
/// never cached across requests.
#[derive(Debug, Clone)]
pub struct AuthorizedCourse {
    principal: UserId,
    course: Course,
}

impl AuthorizedCourse {
    pub fn id(&self) -> CourseId {
        self.course.id
    }

    pub fn principal(&self) -> UserId {
        self.principal
    }

    /// The course document as read at authorization time. The authoring
    /// coordinator re-fetches inside its transaction; this copy is for
    /// read paths only.
    pub fn course(&self) -> &Course {
        &self.course
    }
}

/// Gatekeeper for all authoring mutations.
#[derive(Clone)]
pub struct InstructorGate {
    courses: Arc<dyn CourseReader>,
}

impl std::fmt::Debug for InstructorGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstructorGate").finish_non_exhaustive()
    }
}

impl InstructorGate {
    pub fn new(courses: Arc<dyn CourseReader>) -> Self {
        Self { courses }
    }

    /// `NotFound` if the course does not exist, `Forbidden` if the
    /// principal is not one of its instructors. Read-only.
    pub async fn authorize(
        &self,
        principal: UserId,
        course_id: CourseId,
    ) -> Result<AuthorizedCourse> {
        let course = self.courses.course(course_id).await?;

        if !course.is_instructor(principal) {
            return Err(AuthoringError::Forbidden(format!(
                "user {principal} is not an instructor of course {course_id}"
            )));
        }

        debug!(%principal, course = %course_id, "authorized instructor");
        Ok(AuthorizedCourse { principal, course })
    }
}
