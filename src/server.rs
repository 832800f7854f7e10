use axum::{
    middleware as axum_mw,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::handlers;
use crate::middleware::timing;
use crate::AppState;

/// Builds the full Axum `Router` with all routes, middleware, and static serving.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // ── Timer statistics ────────────────────────────────────
        .route("/api/timers/:id", get(handlers::timers::get_timer))
        .route(
            "/api/timers/:id/estimate",
            get(handlers::timers::get_estimate),
        )
        // ── Completed-region feed ───────────────────────────────
        .route("/api/events/stream", get(handlers::events::event_stream))
        // ── Demo workload control ───────────────────────────────
        .route(
            "/api/workload/start",
            post(handlers::workload::start_workload),
        )
        .route(
            "/api/workload/stop",
            post(handlers::workload::stop_workload),
        )
        .route(
            "/api/workload/status",
            get(handlers::workload::workload_status),
        )
        // ── Time every matched API route into the same timer ────
        .route_layer(axum_mw::from_fn_with_state(
            state.clone(),
            timing::timing_middleware,
        ))
        // ── Provide shared state to all routes above ────────────
        .with_state(state)
        // ── Serve static/ directory for the dashboard ───────────
        .fallback_service(ServeDir::new("static"))
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use redis_timer::{EventBus, SampleStore, Timer};
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;

    use super::*;

    fn state() -> Arc<AppState> {
        let events = EventBus::default();
        let timer = Timer::with_limit(100).unwrap().with_events(events.clone());
        Arc::new(AppState {
            timer: Arc::new(timer),
            events,
            workload_running: Arc::new(AtomicBool::new(false)),
            workload_handle: tokio::sync::Mutex::new(None),
        })
    }

    async fn get(app: &Router, uri: &str) -> axum::response::Response {
        app.clone()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn get_json(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let res = get(app, uri).await;
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn timer_snapshot_as_json() {
        let state = state();
        state.timer.store().append("job", 0.5).unwrap();
        state.timer.store().append("job", 1.5).unwrap();
        let app = create_router(state);

        let (status, body) = get_json(&app, "/api/timers/job").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ident"], "job");
        assert_eq!(body["count"], 2);
        assert_eq!(body["sum"], 2.0);
        assert_eq!(body["average"], 1.0);
        assert_eq!(body["latency"]["count"], 2);
    }

    #[tokio::test]
    async fn estimate_is_null_until_samples_exist() {
        let state = state();
        let app = create_router(state.clone());

        let (status, body) = get_json(&app, "/api/timers/job/estimate?remaining=3").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["estimate"].is_null());
        assert_eq!(body["remaining"], 3);

        state.timer.store().append("job", 2.0).unwrap();
        let (_, body) = get_json(&app, "/api/timers/job/estimate?remaining=3").await;
        assert_eq!(body["estimate"], 6.0);
    }

    #[tokio::test]
    async fn requests_are_timed_per_route_template() {
        let state = state();
        let app = create_router(state.clone());

        for i in 0..20 {
            let res = get(&app, &format!("/api/timers/k{i}")).await;
            assert_eq!(res.status(), StatusCode::OK);
            assert!(res.headers().contains_key("X-Response-Time-Us"));
            assert!(res.headers().contains_key("Server-Timing"));
        }

        let store = state.timer.store();
        assert_eq!(store.len("GET /api/timers/:id").unwrap(), 20);
        assert!(!store.contains("GET /api/timers/k0").unwrap());
    }

    #[tokio::test]
    async fn stream_and_unmatched_paths_are_not_timed() {
        let state = state();
        let app = create_router(state.clone());

        let res = get(&app, "/api/events/stream").await;
        assert_eq!(res.status(), StatusCode::OK);
        let res = get(&app, "/api/no-such-route").await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        let store = state.timer.store();
        assert!(!store.contains("GET /api/events/stream").unwrap());
        assert!(!store.contains("GET /api/no-such-route").unwrap());
    }

    #[tokio::test]
    async fn invalid_workload_is_a_bad_request() {
        let app = create_router(state());
        let res = app
            .oneshot(
                Request::post("/api/workload/start")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"workers":0}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
