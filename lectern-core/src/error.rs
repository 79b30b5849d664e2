use thiserror::Error;

/// Error taxonomy for the authoring subsystem.
///
/// Every error maps to a stable category and status; messages never
/// carry SQL text, connection strings, or storage internals.
#[derive(Error, Debug)]
pub enum AuthoringError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("external service failure: {0}")]
    ExternalService(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthoringError {
    /// Stable machine-readable category for API error bodies.
    pub fn category(&self) -> &'static str {
        match self {
            AuthoringError::NotFound(_) => "not_found",
            AuthoringError::Forbidden(_) => "forbidden",
            AuthoringError::InvalidInput(_) => "invalid_input",
            AuthoringError::Conflict(_) => "conflict",
            AuthoringError::ExternalService(_) => "external_service_failure",
            AuthoringError::Internal(_) => "internal",
        }
    }

    /// HTTP status the upstream request layer should answer with.
    pub fn status(&self) -> u16 {
        match self {
            AuthoringError::NotFound(_) => 404,
            AuthoringError::Forbidden(_) => 403,
            AuthoringError::InvalidInput(_) => 422,
            AuthoringError::Conflict(_) => 409,
            AuthoringError::ExternalService(_) => 502,
            AuthoringError::Internal(_) => 500,
        }
    }

    /// Whether the coordinator may retry the commit phase after this
    /// error. Authorization and validation failures never retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AuthoringError::Conflict(_) | AuthoringError::ExternalService(_)
        )
    }

    /// Maps a database error into the taxonomy.
    ///
    /// Serialization failures and deadlocks become `Conflict` so the
    /// coordinator can retry the losing transaction; unique violations
    /// are `Conflict` too (duplicate enrollment).
    pub fn from_sqlx(err: sqlx::Error, context: &str) -> Self {
        match &err {
            sqlx::Error::RowNotFound => {
                AuthoringError::NotFound(context.to_string())
            }
            sqlx::Error::Database(db) => match db.code().as_deref() {
                Some("40001") | Some("40P01") => {
                    AuthoringError::Conflict(format!(
                        "{context}: transaction serialization failure"
                    ))
                }
                Some("23505") => {
                    AuthoringError::Conflict(format!("{context}: already exists"))
                }
                _ => AuthoringError::Internal(format!("{context}: database error")),
            },
            sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => {
                AuthoringError::ExternalService(format!(
                    "{context}: document store unreachable"
                ))
            }
            _ => AuthoringError::Internal(format!("{context}: database error")),
        }
    }
}

impl From<lectern_model::ModelError> for AuthoringError {
    fn from(err: lectern_model::ModelError) -> Self {
        AuthoringError::InvalidInput(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AuthoringError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_and_statuses_are_stable() {
        assert_eq!(AuthoringError::NotFound("x".into()).status(), 404);
        assert_eq!(AuthoringError::Forbidden("x".into()).status(), 403);
        assert_eq!(AuthoringError::InvalidInput("x".into()).status(), 422);
        assert_eq!(AuthoringError::Conflict("x".into()).status(), 409);
        assert_eq!(AuthoringError::ExternalService("x".into()).status(), 502);
        assert_eq!(AuthoringError::Internal("x".into()).status(), 500);
        assert_eq!(AuthoringError::Conflict("x".into()).category(), "conflict");
    }

    #[test]
    fn only_conflict_and_external_are_retryable() {
        assert!(AuthoringError::Conflict("x".into()).is_retryable());
        assert!(AuthoringError::ExternalService("x".into()).is_retryable());
        assert!(!AuthoringError::Forbidden("x".into()).is_retryable());
        assert!(!AuthoringError::InvalidInput("x".into()).is_retryable());
        assert!(!AuthoringError::NotFound("x".into()).is_retryable());
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        let err = AuthoringError::from_sqlx(sqlx::Error::RowNotFound, "course");
        assert!(matches!(err, AuthoringError::NotFound(_)));
    }
}
