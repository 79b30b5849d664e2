//! Authoring transaction coordinator.
//!
//! Every authoring edit is one atomic two-document write: the course and
//! one of its lessons are resolved, mutated, and stored inside a single
//! store session, with `last_edited_on` bumped on both to the same
//! instant. Asset-store side effects run strictly before the write
//! phase and are never part of the atomic commit; an aborted commit can
//! therefore leave an orphaned object behind, which is accepted and
//! logged rather than papered over with a cross-store two-phase commit.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use lectern_model::{
    AssetKind, AssetRef, BlockKind, BlockPatch, ContentBlock, Course, CourseId,
    CourseMetaPatch, Group, GroupId, Lesson, LessonId, LessonMetaPatch, UserId,
};

use crate::assets::{delete_best_effort, AssetStore, UploadFile};
use crate::auth::AuthorizedCourse;
use crate::blocks::{self, LessonScope};
use crate::database::ports::{AuthoringSession, AuthoringStore};
use crate::error::{AuthoringError, Result};

/// One logical authoring edit.
#[derive(Debug)]
pub enum EditOp {
    InsertBlockAt { index: usize, kind: BlockKind },
    UpdateBlockAt {
        index: usize,
        patch: BlockPatch,
        file: Option<UploadFile>,
    },
    DeleteBlockAt { index: usize },
    UpdateLessonMeta(LessonMetaPatch),
    UpdateCourseMeta(CourseMetaPatch),
    /// Replaces the lesson's video, deleting the superseded asset.
    UpdateLessonVideo { file: Option<UploadFile> },
    /// Replaces the course's cover image, deleting the superseded asset.
    UpdateCourseCover { file: Option<UploadFile> },
}

/// The fully-new document pair a successful edit committed.
#[derive(Debug, Clone)]
pub struct EditOutcome {
    pub course: Course,
    pub lesson: Lesson,
}

/// Product of the engine phase, carried across commit retries so asset
/// side effects run exactly once per edit.
enum Staged {
    /// Engine produced a block (insert or update).
    Block(ContentBlock),
    /// Engine uploaded a replacement asset (video or cover).
    Asset(AssetRef),
    /// Engine already issued the delete-phase asset cleanup.
    CleanupDone,
    /// Pure edit; nothing to carry.
    Pure,
}

/// Owns begin/commit/abort for every authoring edit, so the atomicity
/// contract lives in one place.
#[derive(Clone)]
pub struct AuthoringCoordinator {
    store: Arc<dyn AuthoringStore>,
    assets: Arc<dyn AssetStore>,
    commit_attempts: u32,
}

impl std::fmt::Debug for AuthoringCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthoringCoordinator")
            .field("commit_attempts", &self.commit_attempts)
            .finish_non_exhaustive()
    }
}

impl AuthoringCoordinator {
    pub fn new(
        store: Arc<dyn AuthoringStore>,
        assets: Arc<dyn AssetStore>,
        commit_attempts: u32,
    ) -> Self {
        Self {
            store,
            assets,
            commit_attempts: commit_attempts.max(1),
        }
    }

    /// Applies one edit to the (course, lesson) pair atomically.
    ///
    /// Commit-phase `Conflict`/`ExternalServiceFailure` is retried up to
    /// the configured bound; the engine phase (and its asset calls) is
    /// not re-run on retry. Every other error surfaces immediately.
    pub async fn apply_edit(
        &self,
        authorized: &AuthorizedCourse,
        lesson_id: LessonId,
        mut op: EditOp,
    ) -> Result<EditOutcome> {
        let course_id = authorized.id();
        let mut staged: Option<Staged> = None;
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            match self
                .attempt_edit(course_id, lesson_id, &mut op, &mut staged)
                .await
            {
                Ok(outcome) => {
                    info!(
                        course = %course_id,
                        lesson = %lesson_id,
                        attempt,
                        "authoring edit committed"
                    );
                    return Ok(outcome);
                }
                // Only failures after the engine phase are retried; a
                // staged value proves the asset work already happened.
                Err(err)
                    if err.is_retryable()
                        && staged.is_some()
                        && attempt < self.commit_attempts =>
                {
                    warn!(
                        course = %course_id,
                        lesson = %lesson_id,
                        attempt,
                        error = %err,
                        "authoring commit failed, retrying"
                    );
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Creates a new draft course owned by `creator`.
    pub async fn create_course(
        &self,
        creator: UserId,
        emoji: &str,
        title: &str,
    ) -> Result<Course> {
        let course = Course::new(creator, emoji, title);
        let mut session = self.store.begin().await?;
        if let Err(err) = session.store_course(&course).await {
            let _ = session.abort().await;
            return Err(err);
        }
        session.commit().await?;
        info!(course = %course.id, %creator, "created course");
        Ok(course)
    }

    /// Appends a new empty group (module) to the course.
    pub async fn create_group(
        &self,
        authorized: &AuthorizedCourse,
        emoji: &str,
        title: &str,
    ) -> Result<Course> {
        let course_id = authorized.id();
        let mut session = self.store.begin().await?;
        let result = async {
            let mut course = session.fetch_course(course_id).await?;
            course.groups.push(Group::new(emoji, title));
            course.last_edited_on = Utc::now();
            session.store_course(&course).await?;
            Ok(course)
        }
        .await;
        match result {
            Ok(course) => {
                session.commit().await?;
                Ok(course)
            }
            Err(err) => {
                let _ = session.abort().await;
                Err(err)
            }
        }
    }

    /// Creates an empty lesson inside `group` and links it into the
    /// course, as one atomic pair write.
    pub async fn create_lesson(
        &self,
        authorized: &AuthorizedCourse,
        group_id: GroupId,
        emoji: &str,
        title: &str,
    ) -> Result<EditOutcome> {
        let course_id = authorized.id();
        let mut session = self.store.begin().await?;
        let result = async {
            let mut course = session.fetch_course(course_id).await?;
            let lesson = Lesson::new(emoji, title);
            let now = Utc::now();
            let group = course.group_mut(group_id).ok_or_else(|| {
                AuthoringError::NotFound(format!(
                    "group {group_id} in course {course_id}"
                ))
            })?;
            group.lessons.push(lesson.id);
            group.last_edited_on = now;
            course.last_edited_on = now;
            session.store_course(&course).await?;
            session.store_lesson(course_id, &lesson).await?;
            Ok(EditOutcome { course, lesson })
        }
        .await;
        match result {
            Ok(outcome) => {
                session.commit().await?;
                info!(course = %course_id, lesson = %outcome.lesson.id, "created lesson");
                Ok(outcome)
            }
            Err(err) => {
                let _ = session.abort().await;
                Err(err)
            }
        }
    }

    /// Removes a lesson from its group, cascading best-effort cleanup of
    /// every asset the lesson owns (video plus image blocks).
    pub async fn remove_lesson(
        &self,
        authorized: &AuthorizedCourse,
        lesson_id: LessonId,
    ) -> Result<Course> {
        let course_id = authorized.id();
        let mut session = self.store.begin().await?;
        let result = self
            .stage_lesson_removal(session.as_mut(), course_id, lesson_id)
            .await;
        match result {
            Ok(course) => {
                session.commit().await?;
                info!(course = %course_id, lesson = %lesson_id, "removed lesson");
                Ok(course)
            }
            Err(err) => {
                let _ = session.abort().await;
                Err(err)
            }
        }
    }

    /// Removes a whole group, cascading lesson deletion and best-effort
    /// asset cleanup over every lesson it contains.
    pub async fn remove_group(
        &self,
        authorized: &AuthorizedCourse,
        group_id: GroupId,
    ) -> Result<Course> {
        let course_id = authorized.id();
        let mut session = self.store.begin().await?;
        let result = self
            .stage_group_removal(session.as_mut(), course_id, group_id)
            .await;
        match result {
            Ok(course) => {
                session.commit().await?;
                info!(course = %course_id, group = %group_id, "removed group");
                Ok(course)
            }
            Err(err) => {
                let _ = session.abort().await;
                Err(err)
            }
        }
    }

    async fn attempt_edit(
        &self,
        course_id: CourseId,
        lesson_id: LessonId,
        op: &mut EditOp,
        staged: &mut Option<Staged>,
    ) -> Result<EditOutcome> {
        let mut session = self.store.begin().await?;
        let result = self
            .stage_edit(session.as_mut(), course_id, lesson_id, op, staged)
            .await;
        match result {
            Ok(outcome) => {
                session.commit().await?;
                Ok(outcome)
            }
            Err(err) => {
                let _ = session.abort().await;
                Err(err)
            }
        }
    }

    async fn stage_edit(
        &self,
        session: &mut dyn AuthoringSession,
        course_id: CourseId,
        lesson_id: LessonId,
        op: &mut EditOp,
        staged: &mut Option<Staged>,
    ) -> Result<EditOutcome> {
        let mut course = session.fetch_course(course_id).await?;
        if course.group_of_lesson(lesson_id).is_none() {
            return Err(AuthoringError::NotFound(format!(
                "lesson {lesson_id} does not belong to course {course_id}"
            )));
        }
        let mut lesson = session.fetch_lesson(course_id, lesson_id).await?;

        match op {
            EditOp::InsertBlockAt { index, kind } => {
                let index = *index;
                if index > lesson.content.len() {
                    return Err(AuthoringError::InvalidInput(format!(
                        "insert index {index} out of range 0..={}",
                        lesson.content.len()
                    )));
                }
                let block = match staged {
                    Some(Staged::Block(block)) => block.clone(),
                    _ => {
                        let block = blocks::generate(*kind);
                        *staged = Some(Staged::Block(block.clone()));
                        block
                    }
                };
                lesson.content.insert(index, block);
            }
            EditOp::UpdateBlockAt { index, patch, file } => {
                let index = *index;
                if index >= lesson.content.len() {
                    return Err(AuthoringError::InvalidInput(format!(
                        "update index {index} out of range 0..{}",
                        lesson.content.len()
                    )));
                }
                let block = match staged {
                    Some(Staged::Block(block)) => block.clone(),
                    _ => {
                        let block = blocks::update(
                            self.assets.as_ref(),
                            &lesson.content[index],
                            patch,
                            file.take(),
                            LessonScope { course: course_id, lesson: lesson_id },
                        )
                        .await?;
                        *staged = Some(Staged::Block(block.clone()));
                        block
                    }
                };
                lesson.content[index] = block;
            }
            EditOp::DeleteBlockAt { index } => {
                let index = *index;
                if index >= lesson.content.len() {
                    return Err(AuthoringError::InvalidInput(format!(
                        "delete index {index} out of range 0..{}",
                        lesson.content.len()
                    )));
                }
                if !matches!(staged, Some(Staged::CleanupDone)) {
                    blocks::delete(self.assets.as_ref(), &lesson.content[index])
                        .await;
                    *staged = Some(Staged::CleanupDone);
                }
                lesson.content.remove(index);
            }
            EditOp::UpdateLessonMeta(patch) => {
                let old_content = lesson.content_duration_secs;
                let old_video = lesson.video_duration_secs;
                lesson.apply_meta(patch);
                // Group aggregates must stay equal to the sum over the
                // contained lessons.
                if let Some(group) = course.group_of_lesson_mut(lesson_id) {
                    group.content_duration_secs = group
                        .content_duration_secs
                        .saturating_sub(old_content)
                        .saturating_add(lesson.content_duration_secs);
                    group.video_duration_secs = group
                        .video_duration_secs
                        .saturating_sub(old_video)
                        .saturating_add(lesson.video_duration_secs);
                }
                *staged = Some(Staged::Pure);
            }
            EditOp::UpdateCourseMeta(patch) => {
                course.apply_meta(patch);
                *staged = Some(Staged::Pure);
            }
            EditOp::UpdateLessonVideo { file } => {
                let uploaded = match staged {
                    Some(Staged::Asset(asset)) => asset.clone(),
                    _ => {
                        let Some(file) = file.take() else {
                            return Err(AuthoringError::InvalidInput(
                                "video update requires an uploaded file".into(),
                            ));
                        };
                        if let Some(old) = &lesson.video {
                            delete_best_effort(
                                self.assets.as_ref(),
                                &old.asset_id,
                                AssetKind::Video,
                            )
                            .await;
                        }
                        let scope =
                            LessonScope { course: course_id, lesson: lesson_id };
                        let uploaded =
                            self.assets.upload(file, &scope.folder()).await?;
                        *staged = Some(Staged::Asset(uploaded.clone()));
                        uploaded
                    }
                };
                lesson.video = Some(uploaded);
            }
            EditOp::UpdateCourseCover { file } => {
                let uploaded = match staged {
                    Some(Staged::Asset(asset)) => asset.clone(),
                    _ => {
                        let Some(file) = file.take() else {
                            return Err(AuthoringError::InvalidInput(
                                "cover update requires an uploaded file".into(),
                            ));
                        };
                        if let Some(old) = &course.cover {
                            delete_best_effort(
                                self.assets.as_ref(),
                                &old.asset_id,
                                AssetKind::Image,
                            )
                            .await;
                        }
                        let folder = format!("courses/{course_id}");
                        let uploaded = self.assets.upload(file, &folder).await?;
                        *staged = Some(Staged::Asset(uploaded.clone()));
                        uploaded
                    }
                };
                course.cover = Some(uploaded);
            }
        }

        let now = Utc::now();
        if let Some(group) = course.group_of_lesson_mut(lesson_id) {
            group.last_edited_on = now;
        }
        course.last_edited_on = now;
        lesson.last_edited_on = now;

        session.store_course(&course).await?;
        session.store_lesson(course_id, &lesson).await?;
        Ok(EditOutcome { course, lesson })
    }

    async fn stage_lesson_removal(
        &self,
        session: &mut dyn AuthoringSession,
        course_id: CourseId,
        lesson_id: LessonId,
    ) -> Result<Course> {
        let mut course = session.fetch_course(course_id).await?;
        if course.group_of_lesson(lesson_id).is_none() {
            return Err(AuthoringError::NotFound(format!(
                "lesson {lesson_id} does not belong to course {course_id}"
            )));
        }
        let lesson = session.fetch_lesson(course_id, lesson_id).await?;
        self.cleanup_lesson_assets(&lesson).await;

        let now = Utc::now();
        if let Some(group) = course.group_of_lesson_mut(lesson_id) {
            group.lessons.retain(|l| *l != lesson_id);
            group.content_duration_secs = group
                .content_duration_secs
                .saturating_sub(lesson.content_duration_secs);
            group.video_duration_secs = group
                .video_duration_secs
                .saturating_sub(lesson.video_duration_secs);
            group.last_edited_on = now;
        }
        course.last_edited_on = now;

        session.delete_lesson(course_id, lesson_id).await?;
        session.store_course(&course).await?;
        Ok(course)
    }

    async fn stage_group_removal(
        &self,
        session: &mut dyn AuthoringSession,
        course_id: CourseId,
        group_id: GroupId,
    ) -> Result<Course> {
        let mut course = session.fetch_course(course_id).await?;
        let lesson_ids = match course.groups.iter().find(|g| g.id == group_id) {
            Some(group) => group.lessons.clone(),
            None => {
                return Err(AuthoringError::NotFound(format!(
                    "group {group_id} in course {course_id}"
                )))
            }
        };

        for lesson_id in lesson_ids {
            let lesson = session.fetch_lesson(course_id, lesson_id).await?;
            self.cleanup_lesson_assets(&lesson).await;
            session.delete_lesson(course_id, lesson_id).await?;
        }

        course.groups.retain(|g| g.id != group_id);
        course.last_edited_on = Utc::now();
        session.store_course(&course).await?;
        Ok(course)
    }

    /// Best-effort release of every asset the lesson owns: the optional
    /// video plus each image block's object.
    async fn cleanup_lesson_assets(&self, lesson: &Lesson) {
        if let Some(video) = &lesson.video {
            delete_best_effort(
                self.assets.as_ref(),
                &video.asset_id,
                AssetKind::Video,
            )
            .await;
        }
        for block in &lesson.content {
            blocks::delete(self.assets.as_ref(), block).await;
        }
    }
}
