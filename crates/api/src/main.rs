use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lectern_api::config::ServerConfig;
use lectern_api::router::build_app_router;
use lectern_api::state::AppState;
use lectern_db::PgCourseStore;
use lectern_events::{EmailConfig, EmailDelivery, EventBus, StatusNotifier};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lectern_api=debug,lectern_core=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = lectern_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    lectern_db::health_check(&pool)
        .await
        .expect("Database health check failed");

    lectern_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Event bus + notifications ---
    let event_bus = Arc::new(EventBus::default());

    let email = match EmailConfig::from_env() {
        Some(email_config) => match EmailDelivery::connect(&email_config) {
            Ok(delivery) => Some(delivery),
            Err(e) => {
                tracing::error!(error = %e, "Invalid SMTP configuration, notifications will be logged only");
                None
            }
        },
        None => {
            tracing::warn!("SMTP_HOST not set, status notifications will be logged only");
            None
        }
    };
    let notifier = StatusNotifier::new(pool.clone(), email);
    let notifier_handle = tokio::spawn(notifier.run(event_bus.subscribe()));

    // --- App state ---
    let store = Arc::new(PgCourseStore::new(pool));
    let shutdown_timeout = Duration::from_secs(config.shutdown_timeout_secs);
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    let state = AppState::new(store, config.clone(), Arc::clone(&event_bus));
    let app = build_app_router(state, &config);

    // --- Start server ---
    tracing::info!(%addr, "Starting server");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    // The router (and the engine's listener handle) is gone once serve
    // returns; dropping the last sender closes the channel.
    drop(event_bus);
    match tokio::time::timeout(shutdown_timeout, notifier_handle).await {
        Ok(Ok(summary)) => tracing::info!(
            sent = summary.sent,
            skipped = summary.skipped,
            failed = summary.failed,
            lagged = summary.lagged,
            "Status notifier drained"
        ),
        Ok(Err(e)) => tracing::error!(error = %e, "Status notifier task failed"),
        Err(_) => tracing::warn!("Status notifier did not drain before the shutdown timeout"),
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or SIGTERM to initiate graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
