//! Error kinds surfaced by the API

use async_graphql::ErrorExtensions;
use thiserror::Error;

/// Failure reported by a [`DocumentStore`](crate::store::DocumentStore).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store operation failed: {0}")]
    Operation(String),
}

/// Which entity an id failed to resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Student,
    Course,
    User,
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Entity::Student => "Student",
            Entity::Course => "Course",
            Entity::User => "User",
        })
    }
}

/// API errors
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthenticated")]
    Unauthenticated,

    #[error("{0} not found")]
    NotFound(Entity),

    #[error("{0}")]
    AlreadyExists(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("Student not enrolled in this course")]
    NotEnrolled,

    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Detail is logged, never returned to the caller.
    #[error("Internal server error")]
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        Self::Internal(e.to_string())
    }
}

impl ApiError {
    /// Machine-readable code placed in `extensions.code`.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::AlreadyExists(_) => "ALREADY_EXISTS",
            Self::InvalidInput(_) => "BAD_USER_INPUT",
            Self::NotEnrolled => "NOT_ENROLLED",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

impl ErrorExtensions for ApiError {
    fn extend(&self) -> async_graphql::Error {
        // Store details stay in the logs, the caller only sees the kind.
        if let Self::Internal(ref e) = self {
            tracing::error!(error = %e, kind = "INTERNAL", "internal error");
        }
        async_graphql::Error::new(self.to_string()).extend_with(|_, ext| {
            ext.set("code", self.code());
        })
    }
}

/// Result type for API operations
pub type Result<T> = std::result::Result<T, ApiError>;

/// Lift an [`ApiError`] result into a resolver result with extensions.
pub trait IntoGraphQL<T> {
    fn into_gql(self) -> async_graphql::Result<T>;
}

impl<T> IntoGraphQL<T> for Result<T> {
    fn into_gql(self) -> async_graphql::Result<T> {
        self.map_err(|e| e.extend())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_graphql::Value;

    fn code_of(err: ApiError) -> Option<Value> {
        err.extend()
            .extensions
            .and_then(|ext| ext.get("code").cloned())
    }

    #[test]
    fn not_found_names_the_entity() {
        assert_eq!(ApiError::NotFound(Entity::Student).to_string(), "Student not found");
        assert_eq!(ApiError::NotFound(Entity::Course).to_string(), "Course not found");
    }

    #[test]
    fn extensions_carry_code() {
        assert_eq!(
            code_of(ApiError::Unauthenticated),
            Some(Value::from("UNAUTHENTICATED"))
        );
        assert_eq!(code_of(ApiError::NotEnrolled), Some(Value::from("NOT_ENROLLED")));
        assert_eq!(
            code_of(ApiError::invalid("bad age")),
            Some(Value::from("BAD_USER_INPUT"))
        );
    }

    #[test]
    fn internal_hides_store_detail() {
        let err = ApiError::from(StoreError::Unavailable("connection reset by 10.0.0.7".into()));
        let gql = err.extend();
        assert_eq!(gql.message, "Internal server error");
        assert_eq!(err.code(), "INTERNAL_SERVER_ERROR");
    }
}
