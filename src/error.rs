// src/error.rs
use rocket::http::Status;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use rocket::{Request, Response};
use thiserror::Error;
use tracing::{error, warn};

use crate::web::types::ErrorResponse;

/// Errors surfaced to HTTP clients. Everything except `Internal` is an
/// expected outcome whose message is safe to show.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    TooManyRequests(String),
    #[error("{0}")]
    Upstream(String),
    #[error(transparent)]
    Internal(anyhow::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        ApiError::Upstream(message.into())
    }

    pub fn status(&self) -> Status {
        match self {
            ApiError::BadRequest(_) => Status::BadRequest,
            ApiError::Unauthorized(_) => Status::Unauthorized,
            ApiError::NotFound(_) => Status::NotFound,
            ApiError::Conflict(_) => Status::Conflict,
            ApiError::TooManyRequests(_) => Status::TooManyRequests,
            ApiError::Upstream(_) => Status::BadGateway,
            ApiError::Internal(_) => Status::InternalServerError,
        }
    }

    pub fn is_operational(&self) -> bool {
        !matches!(self, ApiError::Internal(_))
    }

    pub fn client_message(&self) -> String {
        match self {
            ApiError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        // Store errors arrive wrapped in anyhow context
        match err.downcast_ref::<sqlx::Error>() {
            Some(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                ApiError::Conflict("A record with this value already exists.".to_string())
            }
            Some(sqlx::Error::RowNotFound) => ApiError::NotFound("Record not found.".to_string()),
            _ => ApiError::Internal(err),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::from(anyhow::Error::new(err))
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();

        if self.is_operational() {
            warn!(
                status = status.code,
                path = %request.uri(),
                "Operational error: {}",
                self
            );
        } else {
            error!(
                method = %request.method(),
                path = %request.uri(),
                "Unhandled error: {:#}",
                self
            );
        }

        Response::build_from(Json(ErrorResponse::new(self.client_message())).respond_to(request)?)
            .status(status)
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statuses() {
        assert_eq!(ApiError::bad_request("x").status(), Status::BadRequest);
        assert_eq!(ApiError::unauthorized("x").status(), Status::Unauthorized);
        assert_eq!(ApiError::upstream("x").status(), Status::BadGateway);
        assert_eq!(
            ApiError::TooManyRequests("x".into()).status(),
            Status::TooManyRequests
        );
    }

    #[test]
    fn test_internal_message_is_hidden() {
        let err = ApiError::from(anyhow::anyhow!("connection string leaked"));
        assert!(!err.is_operational());
        assert_eq!(err.client_message(), "Internal server error");

        let err = ApiError::not_found("Analysis not found.");
        assert_eq!(err.client_message(), "Analysis not found.");
    }

    #[test]
    fn test_row_not_found_maps_to_404() {
        use anyhow::Context;

        let err = Err::<(), _>(sqlx::Error::RowNotFound)
            .context("lookup")
            .unwrap_err();
        let err = ApiError::from(err);
        assert_eq!(err.status(), Status::NotFound);
    }
}
