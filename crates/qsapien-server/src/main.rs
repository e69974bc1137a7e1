mod cleanup;
mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use qsapien_api::AppState;
use qsapien_api::files::IMAGE_URL_PREFIX;
use qsapien_db::Database;

use crate::config::Config;

/// Expired sessions are purged once an hour.
const SESSION_CLEANUP_SECS: u64 = 3600;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "qsapien=debug,qsapien_api=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    // Init database and upload directory
    let db = Arc::new(Database::open(&config.db_path)?);
    info!(
        "Database {} ready, {} registered users",
        config.db_path.display(),
        db.count_users()?
    );
    tokio::fs::create_dir_all(&config.settings.upload_dir).await?;

    tokio::spawn(cleanup::run_cleanup_loop(db.clone(), SESSION_CLEANUP_SECS));

    let images = ServeDir::new(&config.settings.upload_dir);
    let state = AppState::new(db, config.settings);

    let app = Router::new()
        .merge(qsapien_api::router(state))
        .nest_service(&format!("/{}", IMAGE_URL_PREFIX), images)
        .fallback_service(ServeDir::new(&config.public_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("QSapien server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let Ok(mut sigterm) =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        else {
            ctrl_c.await.ok();
            info!("Received Ctrl+C, shutting down...");
            return;
        };
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
