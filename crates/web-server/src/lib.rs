use axum::{routing::get, Router};
use performance::PerformanceEngine;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

pub mod error;
pub mod handlers;

/// The shared application state that all handlers can access.
#[derive(Clone)]
pub struct AppState {
    pub engine: PerformanceEngine,
}

/// The main function to configure and run the web server.
pub async fn run_server(addr: SocketAddr, state: Arc<AppState>) -> anyhow::Result<()> {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any());

    // --- DEFINE THE APPLICATION ROUTES ---
    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route(
            "/api/market/price-change-performance",
            get(handlers::get_price_change_performance),
        )
        .route(
            "/api/market/liquidity-change-performance",
            get(handlers::get_liquidity_change_performance),
        )
        .route(
            "/api/market/market-cap-change-performance",
            get(handlers::get_market_cap_change_performance),
        )
        .route(
            "/api/market/industry-liquidity-change-performance",
            get(handlers::get_industry_liquidity_change_performance),
        )
        .with_state(state)
        .layer(cors)
        // This middleware will automatically log information about every incoming request.
        .layer(TraceLayer::new_for_http());

    tracing::info!("Web server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
