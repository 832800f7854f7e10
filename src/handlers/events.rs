use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use redis_timer::TIMER_END_SIGNAL;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing::debug;

use crate::AppState;

// ─── GET /api/events/stream ──────────────────────────────────────
/// Server-Sent Events endpoint.
/// Pushes one `timer_end` event per finished region, as JSON.

pub async fn event_stream(
    State(state): State<Arc<AppState>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let stream =
        BroadcastStream::new(state.events.subscribe()).filter_map(|msg| match msg {
            Ok(event) => {
                let json = serde_json::to_string(&event).unwrap_or_default();
                Some(Ok::<_, Infallible>(Event::default().event(TIMER_END_SIGNAL).data(json)))
            }
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                debug!(skipped, "sse subscriber fell behind");
                None
            }
        });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
