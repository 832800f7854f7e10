use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::Context;
use redis_timer::{EventBus, MemoryStore, RedisStore, SampleStore, Timer};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod config;
mod handlers;
mod load_generator;
mod middleware;
mod redis_client;
mod server;

use config::Config;

/// Shared application state available to every handler via `State<Arc<AppState>>`.
pub struct AppState {
    /// Timer every handler and worker records into.
    pub timer: Arc<Timer>,

    /// Completed-region feed; the SSE endpoint subscribes here.
    pub events: EventBus,

    /// Flag checked by every workload worker on each iteration.
    pub workload_running: Arc<AtomicBool>,

    /// Handle to the spawned workload task so we can await clean shutdown.
    pub workload_handle: tokio::sync::Mutex<Option<tokio::task::JoinHandle<()>>>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("redis_timer=info")),
        )
        .init();

    println!();
    println!("╔══════════════════════════════════════════════════╗");
    println!("║   ⏱   REDIS TIMER DASHBOARD                      ║");
    println!("╚══════════════════════════════════════════════════╝");
    println!();

    if let Err(e) = run().await {
        error!("{e:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    // ── 1. Configuration ─────────────────────────────────────────
    let config = Config::from_env().context("reading TIMER_* environment")?;

    // ── 2. Pick the sample store ─────────────────────────────────
    let store: Arc<dyn SampleStore> = match &config.redis_url {
        Some(url) => {
            info!(%url, prefix = %config.prefix, "connecting to redis");
            let conn = redis_client::connect(url, config.redis_timeout)
                .with_context(|| format!("cannot reach redis at {url}"))?;
            Arc::new(RedisStore::new(conn, config.prefix.clone(), config.limit)?)
        }
        None => {
            info!("TIMER_REDIS_URL unset, keeping samples in memory");
            Arc::new(MemoryStore::new(config.limit)?)
        }
    };

    // ── 3. Build shared state ────────────────────────────────────
    let events = EventBus::default();
    let timer = Timer::with_store(store).with_events(events.clone());
    info!(timer = %timer.id(), limit = config.limit, "timer ready");

    let state = Arc::new(AppState {
        timer: Arc::new(timer),
        events,
        workload_running: Arc::new(AtomicBool::new(false)),
        workload_handle: tokio::sync::Mutex::new(None),
    });

    // ── 4. Build Axum router ─────────────────────────────────────
    let app = server::create_router(state);

    // ── 5. Bind & serve ──────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(&config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;

    info!(addr = %config.addr, "dashboard listening");
    info!("timer stats  → /api/timers/:id");
    info!("event stream → /api/events/stream");

    axum::serve(listener, app).await.context("server exited")?;
    Ok(())
}
