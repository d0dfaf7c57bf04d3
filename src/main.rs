use dotenvy::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use wavelength::config::AppConfig;
use wavelength::database::{self, DataStore, SqliteStore};
use wavelength::services::post_feed_service::PostFeed;
use wavelength::web::{build_router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    // 1. Logging (RUST_LOG overrides)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // 2. Config and database
    let config = AppConfig::from_env()?;
    info!("Connecting to database: {}", config.database_url);
    let pool = database::connect(&config.database_url).await?;
    let store: Arc<dyn DataStore> = Arc::new(SqliteStore::new(pool));

    // 3. Live public-post feed
    let feed = PostFeed::new();
    if let Err(e) = feed.refresh(store.as_ref()).await {
        error!("📮 Initial post snapshot failed: {}", e);
    }
    let _refresher = feed.spawn_refresher(store.clone(), config.feed_refresh_interval);
    let _snapshot_log = feed.subscribe(|posts| {
        info!(posts = posts.len(), "📮 public post snapshot updated");
    });

    let host = config.host.clone();
    let port = config.port;
    let app = build_router(AppState::new(store, feed, config));

    // 4. Bind (with fallback port)
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            let fallback: SocketAddr = format!("{}:{}", host, port.saturating_add(1)).parse()?;
            warn!(
                "⚠️  Could not bind {}: {}. Trying fallback {}",
                addr, e, fallback
            );
            tokio::net::TcpListener::bind(fallback).await?
        }
    };

    info!("🚀 Server running on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
