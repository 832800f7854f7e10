use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use redis_timer::clock;
use std::sync::Arc;
use tracing::{info, warn};

use crate::handlers::blocking;
use crate::AppState;

/// Times every matched `/api/` route into the shared timer under
/// `"<METHOD> <route template>"` and adds two response headers:
///
///   X-Response-Time-Us  — total handler time in microseconds
///   Server-Timing       — same value in the standard Server-Timing format
///
/// The identifier is the route template, not the concrete path, so
/// `/api/timers/a` and `/api/timers/b` share one history. The SSE stream is
/// skipped; it would only ever record one huge sample.
pub async fn timing_middleware(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let route = match req.extensions().get::<MatchedPath>() {
        Some(matched) => matched.as_str().to_owned(),
        None => return next.run(req).await,
    };
    if !route.starts_with("/api/") || route.contains("/stream") {
        return next.run(req).await;
    }

    let method = req.method().clone();
    let ident = format!("{method} {route}");

    let start = clock::monotonic();
    let mut response = next.run(req).await;
    let end = clock::monotonic();

    // Store I/O may hit Redis; keep it off the async workers.
    let timer = state.timer.clone();
    let key = ident.clone();
    if let Err(e) = blocking(move || timer.record(&key, start, end)).await {
        warn!(%ident, error = ?e, "request timing not stored");
    }

    let elapsed = end - start;
    let us = (elapsed * 1_000_000.0) as u64;

    // ── Inject response headers ─────────────────────────────────
    if let Ok(val) = us.to_string().parse() {
        response.headers_mut().insert("X-Response-Time-Us", val);
    }

    let server_timing = format!("total;dur={:.3}", elapsed * 1000.0);
    if let Ok(val) = server_timing.parse() {
        response.headers_mut().insert("Server-Timing", val);
    }

    let status = response.status().as_u16();
    info!(status, %method, %route, us, "request");

    response
}
