//! Convenience re-exports for downstream crates.

pub use crate::asset::{AssetId, AssetKind, AssetRef};
pub use crate::block::{BlockKind, BlockPatch, ContentBlock};
pub use crate::course::{
    Course, CourseMetaPatch, CourseStage, Difficulty, Faq, Group,
};
pub use crate::enrollment::{EnrolledCourse, LessonProgress, PurchaseInfo};
pub use crate::error::ModelError;
pub use crate::ids::{BlockId, CourseId, EnrollmentId, GroupId, LessonId, UserId};
pub use crate::lesson::{Attachment, Lesson, LessonMetaPatch, QaThread};
pub use crate::wire::{BlockRecord, CourseView, Field, GroupView, LessonView};
