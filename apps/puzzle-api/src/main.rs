use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use puzzle_api::auth::jwks::JwksClient;
use puzzle_api::chat::ChatHub;
use puzzle_api::config::Config;
use puzzle_api::db::{PgPuzzleStore, PuzzleStore};
use puzzle_api::AppState;

#[tokio::main]
async fn main() {
    // Load .env file (silently skip if missing, env vars may be set externally)
    if dotenvy::dotenv().is_err() {
        let env_path = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(env_path);
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "puzzle_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let port = config.port;

    let pool = puzzle_api::db::pool::connect(&config.database_url)
        .expect("failed to build connection pool");
    let store: Arc<dyn PuzzleStore> = Arc::new(PgPuzzleStore::new(pool));

    if config.seed_demo_data {
        if let Err(err) = puzzle_api::seed::seed_demo_data(store.as_ref()).await {
            tracing::warn!(code = %err.code, message = %err.message, "demo seed failed");
        }
    }

    let jwks = JwksClient::new(&config.identity_jwks_url);

    tracing::info!(
        auth_required = config.auth_required,
        audience = %config.identity_audience,
        issuer = %config.identity_issuer,
        "puzzle-api configured"
    );

    let state = AppState {
        store,
        jwks,
        config: Arc::new(config),
        chat: ChatHub::new(),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .merge(puzzle_api::routes::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "puzzle-api listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("puzzle-api stopped");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(?e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(?e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
