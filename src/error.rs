use crate::services::channel_service::ChannelError;
use crate::youtube_client::YouTubeError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use thiserror::Error;

/// JSON error body: `{ "message": ..., "error": ... }`
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(&'static str),
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0}")]
    ServiceUnavailable(&'static str),
    /// Server-side failure; `message` is route specific, `detail` is the underlying cause
    #[error("{message}: {detail}")]
    Internal { message: &'static str, detail: String },
}

impl AppError {
    pub fn internal(message: &'static str, err: impl std::fmt::Display) -> Self {
        tracing::error!("{}: {}", message, err);
        AppError::Internal {
            message,
            detail: err.to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match self {
            AppError::Internal { message, detail } => ErrorResponse {
                message: message.to_string(),
                error: Some(detail),
            },
            other => ErrorResponse {
                message: other.to_string(),
                error: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::internal("Database error", err)
    }
}

impl From<YouTubeError> for AppError {
    fn from(err: YouTubeError) -> Self {
        match err {
            YouTubeError::NotConfigured => AppError::ServiceUnavailable("YouTube API not configured"),
            YouTubeError::ChannelNotFound => AppError::NotFound("Channel not found"),
            other => AppError::internal("YouTube API request failed", other),
        }
    }
}

impl From<ChannelError> for AppError {
    fn from(err: ChannelError) -> Self {
        match err {
            ChannelError::NotFound => AppError::NotFound("Channel not found"),
            ChannelError::InvalidInput(msg) => AppError::BadRequest(msg),
            ChannelError::Store(e) => AppError::internal("Failed to access YouTube channels", e),
            ChannelError::YouTube(e) => AppError::from(e),
        }
    }
}

impl AppError {
    /// Like the `From` conversion, but server-side failures carry the route's own message
    pub fn channel(err: ChannelError, message: &'static str) -> Self {
        match err {
            ChannelError::Store(e) => AppError::internal(message, e),
            ChannelError::YouTube(e) => AppError::youtube(e, message),
            other => AppError::from(other),
        }
    }

    pub fn youtube(err: YouTubeError, message: &'static str) -> Self {
        match err {
            e @ (YouTubeError::NotConfigured | YouTubeError::ChannelNotFound) => AppError::from(e),
            other => AppError::internal(message, other),
        }
    }
}

/// True when the database rejected a write because of a unique or foreign key constraint
pub fn is_constraint_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => matches!(
            db_err.code().as_deref(),
            Some("23505") | Some("23503") | Some("23502")
        ),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::BadRequest("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Unauthorized("Unauthorized").status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::NotFound("Channel not found").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::internal("Failed to fetch", "boom").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_channel_errors_map_to_http() {
        let not_found: AppError = ChannelError::NotFound.into();
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(not_found.to_string(), "Channel not found");

        let unconfigured: AppError = ChannelError::YouTube(YouTubeError::NotConfigured).into();
        assert_eq!(unconfigured.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_route_specific_messages() {
        let api = YouTubeError::Api { status: 403, body: "quotaExceeded".into() };
        match AppError::youtube(api, "Failed to fetch YouTube videos") {
            AppError::Internal { message, detail } => {
                assert_eq!(message, "Failed to fetch YouTube videos");
                assert!(detail.contains("quotaExceeded"));
            }
            other => panic!("unexpected {:?}", other),
        }

        let missing = AppError::youtube(YouTubeError::ChannelNotFound, "Failed to fetch YouTube videos");
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);

        let invalid = AppError::channel(ChannelError::InvalidInput("bad".into()), "Failed to connect YouTube channel");
        assert_eq!(invalid.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_internal_response_carries_detail() {
        let response = AppError::internal("Failed to fetch YouTube videos", "quota exceeded").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
