use axum::{
    extract::{Path, Query, State},
    Json,
};
use redis_timer::TimerSnapshot;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::AppState;

use super::{blocking, AppError};

#[derive(Debug, Deserialize)]
pub struct EstimateQuery {
    #[serde(default = "default_remaining")]
    pub remaining: u64,
}

fn default_remaining() -> u64 {
    1
}

#[derive(Debug, Serialize)]
pub struct EstimateResponse {
    pub ident: String,
    pub remaining: u64,
    /// Seconds; `null` until the identifier has at least one sample.
    pub estimate: Option<f64>,
}

// ─── GET /api/timers/:id ─────────────────────────────────────────

pub async fn get_timer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TimerSnapshot>, AppError> {
    let timer = state.timer.clone();
    let snapshot = blocking(move || timer.snapshot(&id)).await?;
    Ok(Json(snapshot))
}

// ─── GET /api/timers/:id/estimate?remaining=N ───────────────────

pub async fn get_estimate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<EstimateQuery>,
) -> Result<Json<EstimateResponse>, AppError> {
    let timer = state.timer.clone();
    let ident = id.clone();
    let remaining = query.remaining;
    let estimate = blocking(move || timer.estimate(&ident, remaining)).await?;

    Ok(Json(EstimateResponse {
        ident: id,
        remaining,
        estimate,
    }))
}
