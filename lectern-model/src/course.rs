use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::asset::AssetRef;
use crate::ids::{CourseId, GroupId, LessonId, UserId};

/// Publication stage of a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseStage {
    Draft,
    Published,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Faq {
    pub question: String,
    pub answer: String,
}

/// A course module: an ordered slice of the course's lessons.
///
/// `content_duration_secs` / `video_duration_secs` are derived values and
/// must equal the sums over the contained lessons; the authoring
/// coordinator adjusts them whenever a lesson's durations change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub emoji: String,
    pub title: String,
    pub description: String,
    pub lessons: Vec<LessonId>,
    pub content_duration_secs: u32,
    pub video_duration_secs: u32,
    pub last_edited_on: DateTime<Utc>,
}

impl Group {
    pub fn new(emoji: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: GroupId::new(),
            emoji: emoji.into(),
            title: title.into(),
            description: String::new(),
            lessons: Vec::new(),
            content_duration_secs: 0,
            video_duration_secs: 0,
            last_edited_on: Utc::now(),
        }
    }

    pub fn contains_lesson(&self, lesson: LessonId) -> bool {
        self.lessons.contains(&lesson)
    }
}

/// A course document.
///
/// `last_edited_on` is monotonically non-decreasing and refreshed on
/// every committed mutation, including mutations that only touch a
/// contained lesson.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub emoji: String,
    pub title: String,
    pub description: String,
    pub stage: CourseStage,
    pub difficulty: Difficulty,
    /// Ownership set; non-empty after creation. Only these principals
    /// may author the course.
    pub instructors: Vec<UserId>,
    pub cover: Option<AssetRef>,
    pub tags: Vec<String>,
    pub groups: Vec<Group>,
    pub faqs: Vec<Faq>,
    pub enrolled: u32,
    pub rating: f32,
    pub last_edited_on: DateTime<Utc>,
}

impl Course {
    /// New draft course owned by the creating instructor.
    pub fn new(
        creator: UserId,
        emoji: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            id: CourseId::new(),
            emoji: emoji.into(),
            title: title.into(),
            description: String::new(),
            stage: CourseStage::Draft,
            difficulty: Difficulty::Beginner,
            instructors: vec![creator],
            cover: None,
            tags: Vec::new(),
            groups: Vec::new(),
            faqs: Vec::new(),
            enrolled: 0,
            rating: 0.0,
            last_edited_on: Utc::now(),
        }
    }

    pub fn is_instructor(&self, user: UserId) -> bool {
        self.instructors.contains(&user)
    }

    /// The group holding `lesson`, if the lesson belongs to this course.
    pub fn group_of_lesson(&self, lesson: LessonId) -> Option<&Group> {
        self.groups.iter().find(|g| g.contains_lesson(lesson))
    }

    pub fn group_of_lesson_mut(&mut self, lesson: LessonId) -> Option<&mut Group> {
        self.groups.iter_mut().find(|g| g.contains_lesson(lesson))
    }

    pub fn group_mut(&mut self, group: GroupId) -> Option<&mut Group> {
        self.groups.iter_mut().find(|g| g.id == group)
    }

    pub fn apply_meta(&mut self, patch: &CourseMetaPatch) {
        if let Some(emoji) = &patch.emoji {
            self.emoji = emoji.clone();
        }
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(stage) = patch.stage {
            self.stage = stage;
        }
        if let Some(difficulty) = patch.difficulty {
            self.difficulty = difficulty;
        }
        if let Some(tags) = &patch.tags {
            self.tags = tags.clone();
        }
        if let Some(faqs) = &patch.faqs {
            self.faqs = faqs.clone();
        }
    }
}

/// Partial update to course metadata; absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CourseMetaPatch {
    pub emoji: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub stage: Option<CourseStage>,
    pub difficulty: Option<Difficulty>,
    pub tags: Option<Vec<String>>,
    pub faqs: Option<Vec<Faq>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_course_is_owned_by_its_creator() {
        let creator = UserId::new();
        let course = Course::new(creator, "📚", "Intro to Lutherie");
        assert!(course.is_instructor(creator));
        assert_eq!(course.stage, CourseStage::Draft);
        assert!(!course.is_instructor(UserId::new()));
    }

    #[test]
    fn apply_meta_leaves_absent_fields_alone() {
        let mut course = Course::new(UserId::new(), "📚", "Original");
        course.description = "keep me".into();

        course.apply_meta(&CourseMetaPatch {
            title: Some("Renamed".into()),
            stage: Some(CourseStage::Published),
            ..Default::default()
        });

        assert_eq!(course.title, "Renamed");
        assert_eq!(course.stage, CourseStage::Published);
        assert_eq!(course.description, "keep me");
    }

    #[test]
    fn group_lookup_by_lesson() {
        let mut course = Course::new(UserId::new(), "📚", "Course");
        let mut group = Group::new("🧩", "Basics");
        let lesson = LessonId::new();
        group.lessons.push(lesson);
        course.groups.push(group);

        assert!(course.group_of_lesson(lesson).is_some());
        assert!(course.group_of_lesson(LessonId::new()).is_none());
    }
}
