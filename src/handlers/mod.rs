pub mod events;
pub mod timers;
pub mod workload;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use redis_timer::TimerError;

// ─── Unified error type ──────────────────────────────────────────

#[derive(Debug)]
pub enum AppError {
    Store(TimerError),
    BadRequest(String),
    Internal(String),
    AlreadyRunning,
}

impl From<TimerError> for AppError {
    fn from(e: TimerError) -> Self {
        Self::Store(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Store(e @ TimerError::Connectivity(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, e.to_string())
            }
            Self::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            Self::AlreadyRunning => {
                (StatusCode::CONFLICT, "Workload already running".into())
            }
        };

        let body = serde_json::json!({
            "error":  message,
            "status": status.as_u16(),
        });

        (status, Json(body)).into_response()
    }
}

/// Runs a store call on the blocking pool; the Redis store does
/// synchronous network I/O.
pub async fn blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, TimerError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map_err(AppError::from)
}
