//! Core library for the Lectern course-authoring backend.
//!
//! The subsystem is wired leaf-first: the asset-store gateway handles
//! binary objects, the content-block engine applies the typed block
//! lifecycle, the authorization gate guards every mutation, and the
//! authoring coordinator persists each edit as one atomic two-document
//! write. The enrollment ledger tracks per-user completion separately
//! and is never coupled to authoring transactions.

pub mod assets;
pub mod auth;
pub mod authoring;
pub mod blocks;
pub mod config;
pub mod database;
pub mod enrollment;
pub mod error;

pub use auth::{AuthorizedCourse, InstructorGate};
pub use authoring::{AuthoringCoordinator, EditOp, EditOutcome};
pub use enrollment::{EnrollmentLedger, Page};
pub use error::{AuthoringError, Result};
