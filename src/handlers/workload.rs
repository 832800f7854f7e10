use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::AppState;

use super::AppError;

// ─── Request / response types ────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct WorkloadConfig {
    /// Number of blocking worker threads running jobs
    #[serde(default = "default_workers")]
    pub workers: u32,

    /// Jobs per worker
    #[serde(default = "default_iterations")]
    pub iterations: u32,

    /// Each job performs 2^exponent modular squarings
    #[serde(default = "default_exponent")]
    pub exponent: u32,
}

fn default_workers() -> u32 {
    2
}
fn default_iterations() -> u32 {
    10
}
fn default_exponent() -> u32 {
    20
}

impl WorkloadConfig {
    fn validate(&self) -> Result<(), AppError> {
        if self.workers == 0 || self.workers > 64 {
            return Err(AppError::BadRequest(
                "workers must be between 1 and 64".into(),
            ));
        }
        if self.iterations == 0 || self.iterations > 10_000 {
            return Err(AppError::BadRequest(
                "iterations must be between 1 and 10000".into(),
            ));
        }
        if self.exponent == 0 || self.exponent > 28 {
            return Err(AppError::BadRequest(
                "exponent must be between 1 and 28".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct WorkloadStatus {
    pub running: bool,
    pub message: String,
}

// ─── POST /api/workload/start ────────────────────────────────────

pub async fn start_workload(
    State(state): State<Arc<AppState>>,
    Json(config): Json<WorkloadConfig>,
) -> Result<Json<WorkloadStatus>, AppError> {
    // Guard: only one workload at a time
    if state.workload_running.load(Ordering::SeqCst) {
        return Err(AppError::AlreadyRunning);
    }
    config.validate()?;

    // Flip the flag BEFORE spawning so workers see it immediately
    state.workload_running.store(true, Ordering::SeqCst);

    let msg = format!(
        "Started: {} workers × {} jobs, 2^{} squarings each",
        config.workers, config.iterations, config.exponent,
    );

    let running = state.workload_running.clone();
    let timer = state.timer.clone();
    let handle = tokio::spawn(async move {
        crate::load_generator::run(
            running,
            timer,
            config.workers,
            config.iterations,
            config.exponent,
        )
        .await;
    });

    // Stash the handle so `stop` can await clean shutdown
    let mut guard = state.workload_handle.lock().await;
    *guard = Some(handle);

    Ok(Json(WorkloadStatus {
        running: true,
        message: msg,
    }))
}

// ─── POST /api/workload/stop ─────────────────────────────────────

pub async fn stop_workload(
    State(state): State<Arc<AppState>>,
) -> Result<Json<WorkloadStatus>, AppError> {
    if !state.workload_running.load(Ordering::SeqCst) {
        return Ok(Json(WorkloadStatus {
            running: false,
            message: "No workload is running".into(),
        }));
    }

    // Signal all workers to stop
    state.workload_running.store(false, Ordering::SeqCst);

    let mut guard = state.workload_handle.lock().await;
    if let Some(handle) = guard.take() {
        // Ignore JoinError — the task may have already finished
        let _ = handle.await;
    }

    Ok(Json(WorkloadStatus {
        running: false,
        message: "Workload stopped".into(),
    }))
}

// ─── GET /api/workload/status ────────────────────────────────────

pub async fn workload_status(
    State(state): State<Arc<AppState>>,
) -> Json<WorkloadStatus> {
    let running = state.workload_running.load(Ordering::SeqCst);
    Json(WorkloadStatus {
        running,
        message: if running {
            "Workload in progress".into()
        } else {
            "Idle".into()
        },
    })
}
