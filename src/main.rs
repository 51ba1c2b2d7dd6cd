use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kudos_ledger_server::routes::{
    create_card, create_like, dashboard_stats, get_card, get_rankings, health_check,
    register_user,
};
use kudos_ledger_server::{ledger, open_database, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kudos_ledger_server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Kudos Ledger Server...");

    // Load configuration
    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!(
        "Environment: {}, Server: {}",
        config.environment,
        config.server_address()
    );

    // Open the database
    let db = open_database(&config.database_path)?;

    // Start the weekly reset sweeper
    tokio::spawn(ledger::reset::run(
        db.clone(),
        config.reset_utc_offset,
        config.reset_sweep_interval_secs,
    ));

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(
            config
                .allowed_origins
                .iter()
                .map(|s| s.parse().unwrap())
                .collect::<Vec<_>>(),
        )
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers(Any);

    // Create app state
    let state = AppState::new(db, config.clone());

    // Build router
    let app = Router::new()
        .route("/health", get(health_check))
        .route("/api/users", post(register_user))
        .route("/api/cards", post(create_card))
        .route("/api/cards/:id", get(get_card))
        .route("/api/likes", post(create_like))
        .route("/api/dashboard", get(dashboard_stats))
        .route("/api/rankings", get(get_rankings))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config.server_address().parse()?;
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
