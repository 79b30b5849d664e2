//! Core data model definitions shared across Lectern crates.
#![allow(missing_docs)]

pub mod asset;
pub mod block;
pub mod course;
pub mod enrollment;
pub mod error;
pub mod ids;
pub mod lesson;
pub mod prelude;
pub mod wire;

// Intentionally curated re-exports for downstream consumers.
pub use asset::{AssetId, AssetKind, AssetRef};
pub use block::{BlockKind, BlockPatch, ContentBlock};
pub use course::{Course, CourseMetaPatch, CourseStage, Difficulty, Faq, Group};
pub use enrollment::{EnrolledCourse, LessonProgress, PurchaseInfo};
pub use error::{ModelError, Result};
pub use ids::{BlockId, CourseId, EnrollmentId, GroupId, LessonId, UserId};
pub use lesson::{Attachment, Lesson, LessonMetaPatch, QaThread};
