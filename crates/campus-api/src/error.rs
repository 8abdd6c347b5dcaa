use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use campus_types::api::ErrorBody;

/// Closed error taxonomy for the whole API. Every variant carries a
/// stable machine-readable code; clients must never match on the
/// human-readable message.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("unauthorized")]
    Unauthorized,
    #[error("user already exists")]
    UserExists,
    #[error("user not found")]
    UserNotFound,
    #[error("teacher already exists")]
    TeacherExists,
    #[error("teacher not found")]
    TeacherNotFound,
    #[error("teacher has classes")]
    TeacherHasClasses,
    #[error("student already exists")]
    StudentExists,
    #[error("student not found")]
    StudentNotFound,
    #[error("student is in a class")]
    StudentInClass,
    #[error("student already in class")]
    AlreadyEnrolled,
    #[error("class not found")]
    ClassNotFound,
    #[error("one or more students not found")]
    StudentsNotFound,
    #[error("internal server error")]
    Internal(#[source] anyhow::Error),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::InvalidCredentials | ApiError::Unauthorized => "UNAUTHORIZED",
            ApiError::UserExists
            | ApiError::TeacherExists
            | ApiError::StudentExists
            | ApiError::AlreadyEnrolled => "ALREADY_EXISTS",
            ApiError::UserNotFound
            | ApiError::TeacherNotFound
            | ApiError::StudentNotFound
            | ApiError::ClassNotFound
            | ApiError::StudentsNotFound => "NOT_FOUND",
            ApiError::TeacherHasClasses | ApiError::StudentInClass => "CONFLICT",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP statuses keep the original wire contract: domain errors on
    /// entity routes are 400, user registration collision is 409, and
    /// only /me answers 404. The `code` field is the discriminator.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidCredentials | ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::UserExists => StatusCode::CONFLICT,
            ApiError::UserNotFound => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Translate a storage error, turning a unique-constraint failure
    /// into the given "already exists" domain error.
    pub fn from_unique(err: anyhow::Error, exists: ApiError) -> ApiError {
        if campus_db::is_unique_violation(&err) {
            exists
        } else {
            ApiError::Internal(err)
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(err) = &self {
            error!("internal error: {:#}", err);
        }

        let body = ErrorBody {
            code: self.code().to_string(),
            message: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_form_a_closed_set() {
        let cases = [
            (ApiError::Validation("x".into()), StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            (ApiError::Unauthorized, StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            (ApiError::InvalidCredentials, StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            (ApiError::UserExists, StatusCode::CONFLICT, "ALREADY_EXISTS"),
            (ApiError::UserNotFound, StatusCode::NOT_FOUND, "NOT_FOUND"),
            (ApiError::TeacherExists, StatusCode::BAD_REQUEST, "ALREADY_EXISTS"),
            (ApiError::TeacherHasClasses, StatusCode::BAD_REQUEST, "CONFLICT"),
            (ApiError::StudentInClass, StatusCode::BAD_REQUEST, "CONFLICT"),
            (ApiError::StudentsNotFound, StatusCode::BAD_REQUEST, "NOT_FOUND"),
        ];

        for (err, status, code) in cases {
            assert_eq!(err.status(), status, "{err}");
            assert_eq!(err.code(), code, "{err}");
        }
    }

    #[test]
    fn unique_violation_maps_to_exists() {
        let db = campus_db::Database::open_in_memory().unwrap();
        db.create_user("u1", "a@b.c", "hash").unwrap();
        let err = db.create_user("u2", "a@b.c", "hash").unwrap_err();

        let mapped = ApiError::from_unique(err, ApiError::UserExists);
        assert!(matches!(mapped, ApiError::UserExists));

        let other = ApiError::from_unique(anyhow::anyhow!("disk on fire"), ApiError::UserExists);
        assert!(matches!(other, ApiError::Internal(_)));
    }
}
