pub mod authoring;
pub mod courses;
pub mod enrollments;

pub use authoring::{AuthoringSession, AuthoringStore};
pub use courses::CourseReader;
pub use enrollments::{EnrollmentRepository, PageKey};
