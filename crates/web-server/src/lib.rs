use analytics::{AnalyticsEngine, InMemoryCache};
use axum::{Router, routing::get};
use configuration::Settings;
use database::DbRepository;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

pub mod error;
pub mod handlers;

/// The shared application state that all handlers can access.
#[derive(Clone)]
pub struct AppState {
    pub engine: AnalyticsEngine,
}

/// Builds the routed application without binding a socket.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any());

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/chart-data", get(handlers::get_chart_data))
        .route("/api/kpi-data", get(handlers::get_kpi_data))
        .route("/api/date-range", get(handlers::get_date_range))
        .route("/api/sectors", get(handlers::get_sectors))
        .route("/api/sector-performance", get(handlers::get_sector_performance))
        .route("/api/sector-trend", get(handlers::get_sector_trend))
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Drops expired cache entries on a fixed tick.
fn spawn_cache_purger(cache: Arc<InMemoryCache>, every: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every.max(Duration::from_secs(1)));
        loop {
            ticker.tick().await;
            let purged = cache.purge_expired();
            if purged > 0 {
                tracing::debug!(purged, "Purged expired cache entries");
            }
        }
    });
}

/// Connects to Postgres, applies migrations and serves the dashboard API until the
/// process is stopped.
pub async fn run_server(settings: &Settings) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let db_pool = database::connect().await?;
    database::run_migrations(&db_pool).await?;

    let cache = Arc::new(InMemoryCache::new());
    spawn_cache_purger(cache.clone(), settings.cache.analysis_ttl);

    let engine = AnalyticsEngine::new(
        Arc::new(DbRepository::new(db_pool)),
        cache,
        settings.analytics.clone(),
        settings.cache.clone(),
    );
    let app = router(Arc::new(AppState { engine }));

    let addr = settings.server.socket_addr();
    tracing::info!("Web server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
