use crate::services::error::CatalogError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// A lightweight wrapper for errors leaving the HTTP boundary.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Shortcut for 400 Bad Request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message,
            "status": self.status.as_u16()
        }));

        (self.status, body).into_response()
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        let status = match &err {
            CatalogError::InvalidArgument(_)
            | CatalogError::UnknownOwnerType(_)
            | CatalogError::VisibilityUnsupported(_)
            | CatalogError::HeterogeneousBatch { .. } => StatusCode::BAD_REQUEST,
            CatalogError::OwnerNotFound { .. }
            | CatalogError::OwnersNotFound(_)
            | CatalogError::ImageNotFoundOnOwner { .. }
            | CatalogError::AssociationsNotFound(_)
            | CatalogError::RecordNotFound { .. } => StatusCode::NOT_FOUND,
            CatalogError::ImageLimitExceeded { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            CatalogError::ImageAlreadyAttached { .. }
            | CatalogError::ConcurrentUpdate { .. } => StatusCode::CONFLICT,
            CatalogError::Internal(source) => {
                tracing::error!(error = %source, "storage failure");
                return AppError::internal("internal server error");
            }
        };
        AppError::new(status, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::owner::OwnerKind;

    #[test]
    fn domain_errors_keep_their_message() {
        let err = AppError::from(CatalogError::ImageLimitExceeded {
            kind: OwnerKind::Course,
            id: "c-1".into(),
            limit: 5,
        });
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(err.message.contains("c-1"));
    }

    #[test]
    fn internal_errors_hide_storage_text() {
        let err = AppError::from(CatalogError::Internal(sqlx::Error::Protocol(
            "table courses is locked".into(),
        )));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.message.contains("courses"));
    }
}
