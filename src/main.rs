mod analyzer;
mod api;
mod config;
mod fetcher;
mod model;
mod normalizer;
mod parser;
mod service;
mod storage;
mod utils;

#[cfg(test)]
mod tests;

use analyzer::{SyntheticTrend, TrendSource};
use api::AppState;
use config::{load_config, AppConfig};
use fetcher::BookingClient;
use model::UserId;
use service::FlightService;
use std::sync::Arc;
use storage::SqliteStorage;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable naming the config file.
const CONFIG_PATH_ENV: &str = "FARE_SNIPER_CONFIG";

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fare_sniper=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "config.json".into());
    let config: AppConfig = match load_config(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Config load error ({}): {}", config_path, e);
            return;
        }
    };
    if config.upstream.api_key.is_empty() {
        warn!("No RapidAPI key configured; flight searches will be rejected upstream");
    }

    let storage = match SqliteStorage::new(&config.database_path) {
        Ok(s) => Arc::new(Mutex::new(s)),
        Err(e) => {
            error!("Failed to initialize storage: {}", e);
            return;
        }
    };

    let source = match BookingClient::new(config.upstream.clone()) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("Failed to build HTTP client: {}", e);
            return;
        }
    };

    let trends: Arc<dyn TrendSource> = match config.trend_seed {
        Some(seed) => Arc::new(SyntheticTrend::seeded(seed)),
        None => Arc::new(SyntheticTrend::from_entropy()),
    };

    let service = Arc::new(FlightService::new(
        source,
        storage,
        trends,
        config.upstream.default_sort.clone(),
    ));
    let app = api::app(AppState::new(service, UserId::new(config.default_user.clone())));

    let listener = match tokio::net::TcpListener::bind(&config.listen_addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("Cannot listen on {}: {}", config.listen_addr, e);
            return;
        }
    };
    info!("FareSniper listening on {}", config.listen_addr);

    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
    }
}
