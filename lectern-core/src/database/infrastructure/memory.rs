//! In-memory store implementations.
//!
//! Back the domain services in unit tests and demos with the same port
//! surface as Postgres. Sessions stage writes and apply them on commit
//! under one lock, so the fully-old/fully-new guarantee holds here too.
//! Commit failures can be injected to exercise the coordinator's retry
//! and rollback paths.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use lectern_model::{Course, CourseId, EnrolledCourse, Lesson, LessonId, UserId};

use crate::database::ports::{
    AuthoringSession, AuthoringStore, CourseReader, EnrollmentRepository, PageKey,
};
use crate::error::{AuthoringError, Result};

#[derive(Default)]
struct AuthoringState {
    courses: HashMap<CourseId, Course>,
    lessons: HashMap<LessonId, (CourseId, Lesson)>,
    fail_commits: u32,
}

/// In-memory [`AuthoringStore`] and [`CourseReader`].
#[derive(Clone, Default)]
pub struct MemoryAuthoringStore {
    state: Arc<Mutex<AuthoringState>>,
}

impl std::fmt::Debug for MemoryAuthoringStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryAuthoringStore").finish_non_exhaustive()
    }
}

impl MemoryAuthoringStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_course(&self, course: Course) {
        let mut state = self.state.lock().expect("memory store poisoned");
        state.courses.insert(course.id, course);
    }

    pub fn seed_lesson(&self, course: CourseId, lesson: Lesson) {
        let mut state = self.state.lock().expect("memory store poisoned");
        state.lessons.insert(lesson.id, (course, lesson));
    }

    /// Makes the next `n` commits fail with `Conflict`.
    pub fn fail_next_commits(&self, n: u32) {
        let mut state = self.state.lock().expect("memory store poisoned");
        state.fail_commits = n;
    }

    pub fn course(&self, id: CourseId) -> Option<Course> {
        let state = self.state.lock().expect("memory store poisoned");
        state.courses.get(&id).cloned()
    }

    pub fn lesson(&self, id: LessonId) -> Option<Lesson> {
        let state = self.state.lock().expect("memory store poisoned");
        state.lessons.get(&id).map(|(_, l)| l.clone())
    }
}

enum StagedWrite {
    Course(Course),
    Lesson(CourseId, Lesson),
    DeleteLesson(LessonId),
}

struct MemoryAuthoringSession {
    state: Arc<Mutex<AuthoringState>>,
    staged: Vec<StagedWrite>,
}

#[async_trait]
impl AuthoringSession for MemoryAuthoringSession {
    async fn fetch_course(&mut self, id: CourseId) -> Result<Course> {
        let state = self.state.lock().expect("memory store poisoned");
        state
            .courses
            .get(&id)
            .cloned()
            .ok_or_else(|| AuthoringError::NotFound(format!("course {id}")))
    }

    async fn fetch_lesson(
        &mut self,
        course: CourseId,
        lesson: LessonId,
    ) -> Result<Lesson> {
        let state = self.state.lock().expect("memory store poisoned");
        match state.lessons.get(&lesson) {
            Some((owner, doc)) if *owner == course => Ok(doc.clone()),
            _ => Err(AuthoringError::NotFound(format!("lesson {lesson}"))),
        }
    }

    async fn store_course(&mut self, course: &Course) -> Result<()> {
        self.staged.push(StagedWrite::Course(course.clone()));
        Ok(())
    }

    async fn store_lesson(
        &mut self,
        course: CourseId,
        lesson: &Lesson,
    ) -> Result<()> {
        self.staged
            .push(StagedWrite::Lesson(course, lesson.clone()));
        Ok(())
    }

    async fn delete_lesson(
        &mut self,
        _course: CourseId,
        lesson: LessonId,
    ) -> Result<()> {
        self.staged.push(StagedWrite::DeleteLesson(lesson));
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let mut state = self.state.lock().expect("memory store poisoned");
        if state.fail_commits > 0 {
            state.fail_commits -= 1;
            return Err(AuthoringError::Conflict(
                "simulated transaction serialization failure".into(),
            ));
        }
        for write in self.staged {
            match write {
                StagedWrite::Course(course) => {
                    state.courses.insert(course.id, course);
                }
                StagedWrite::Lesson(course, lesson) => {
                    state.lessons.insert(lesson.id, (course, lesson));
                }
                StagedWrite::DeleteLesson(lesson) => {
                    state.lessons.remove(&lesson);
                }
            }
        }
        Ok(())
    }

    async fn abort(self: Box<Self>) -> Result<()> {
        // Staged writes are simply dropped.
        Ok(())
    }
}

#[async_trait]
impl AuthoringStore for MemoryAuthoringStore {
    async fn begin(&self) -> Result<Box<dyn AuthoringSession>> {
        Ok(Box::new(MemoryAuthoringSession {
            state: Arc::clone(&self.state),
            staged: Vec::new(),
        }))
    }
}

#[async_trait]
impl CourseReader for MemoryAuthoringStore {
    async fn course(&self, id: CourseId) -> Result<Course> {
        let state = self.state.lock().expect("memory store poisoned");
        state
            .courses
            .get(&id)
            .cloned()
            .ok_or_else(|| AuthoringError::NotFound(format!("course {id}")))
    }
}

/// In-memory [`EnrollmentRepository`].
#[derive(Clone, Default)]
pub struct MemoryEnrollmentRepository {
    state: Arc<Mutex<HashMap<(UserId, CourseId), EnrolledCourse>>>,
}

impl std::fmt::Debug for MemoryEnrollmentRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryEnrollmentRepository")
            .finish_non_exhaustive()
    }
}

impl MemoryEnrollmentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EnrollmentRepository for MemoryEnrollmentRepository {
    async fn insert(&self, enrollment: &EnrolledCourse) -> Result<()> {
        let mut state = self.state.lock().expect("memory store poisoned");
        let key = (enrollment.user, enrollment.course);
        if state.contains_key(&key) {
            return Err(AuthoringError::Conflict(format!(
                "user {} already enrolled in course {}",
                enrollment.user, enrollment.course
            )));
        }
        state.insert(key, enrollment.clone());
        Ok(())
    }

    async fn find(
        &self,
        user: UserId,
        course: CourseId,
    ) -> Result<Option<EnrolledCourse>> {
        let state = self.state.lock().expect("memory store poisoned");
        Ok(state.get(&(user, course)).cloned())
    }

    async fn update(&self, enrollment: &EnrolledCourse) -> Result<()> {
        let mut state = self.state.lock().expect("memory store poisoned");
        let key = (enrollment.user, enrollment.course);
        if !state.contains_key(&key) {
            return Err(AuthoringError::NotFound(format!(
                "enrollment for user {} in course {}",
                enrollment.user, enrollment.course
            )));
        }
        state.insert(key, enrollment.clone());
        Ok(())
    }

    async fn list_page(
        &self,
        user: UserId,
        before: Option<PageKey>,
        limit: usize,
    ) -> Result<Vec<EnrolledCourse>> {
        let state = self.state.lock().expect("memory store poisoned");
        let mut items: Vec<EnrolledCourse> = state
            .values()
            .filter(|e| e.user == user)
            .filter(|e| match before {
                Some(key) => {
                    (e.updated_at, e.id.to_uuid()) < (key.updated_at, key.id)
                }
                None => true,
            })
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            (b.updated_at, b.id.to_uuid()).cmp(&(a.updated_at, a.id.to_uuid()))
        });
        items.truncate(limit);
        Ok(items)
    }
}
