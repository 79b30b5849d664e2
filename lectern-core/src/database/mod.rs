//! Persistence layer: ports consumed by the domain services and their
//! implementations (Postgres for production, in-memory for tests).

pub mod infrastructure;
pub mod ports;
