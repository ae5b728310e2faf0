use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use cinehub_core::error::{ApiError, ErrorEnvelope};
use cinehub_streaming::SessionError;
use cinehub_tmdb::TmdbError;

/// Newtype wrapper so we can implement `IntoResponse` in this crate.
pub struct AppError(pub ApiError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let envelope = ErrorEnvelope::from(&self.0);
        (status, Json(envelope)).into_response()
    }
}

impl From<ApiError> for AppError {
    fn from(e: ApiError) -> Self {
        Self(e)
    }
}

impl From<TmdbError> for AppError {
    fn from(e: TmdbError) -> Self {
        let api = match e {
            TmdbError::Configuration => ApiError::ServiceUnavailable(e.to_string()),
            TmdbError::Upstream { status, body } => {
                ApiError::Upstream(format!("TMDB request failed {status}: {body}"))
            }
            TmdbError::Network(msg) => ApiError::Internal(format!("TMDB network error: {msg}")),
            TmdbError::Decode(msg) => ApiError::Internal(format!("TMDB response parse: {msg}")),
        };
        Self(api)
    }
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        let api = match e {
            SessionError::NotFound(_) => ApiError::NotFound(e.to_string()),
            SessionError::MaxSessions(_) => ApiError::BadRequest(e.to_string()),
        };
        Self(api)
    }
}
