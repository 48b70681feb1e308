use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use bookings::config::AppConfig;
use bookings::db::{self, SqliteBookingStore};
use bookings::handlers;
use bookings::services::bookings::BookingService;
use bookings::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    if config.token_secret == "changeme" {
        tracing::warn!("TOKEN_SECRET is not set, using the insecure default");
    }

    let conn = db::init_db(&config.database_url)?;
    let store = SqliteBookingStore::new(conn);

    let state = Arc::new(AppState {
        config: config.clone(),
        bookings: BookingService::new(Arc::new(store)),
    });

    let app = handlers::app(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!(origins = ?config.cors_origins, "starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
