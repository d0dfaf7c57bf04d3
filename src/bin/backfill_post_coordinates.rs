use dotenvy::dotenv;
use std::env;

use wavelength::config::AppConfig;
use wavelength::database;
use wavelength::services::location_service::PlacesClient;
use wavelength::services::post_geo_service;

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = match AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("config error: {}", e);
            std::process::exit(1);
        }
    };
    let pool = match database::connect(&config.database_url).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("could not connect to database: {}", e);
            std::process::exit(1);
        }
    };

    let limit: i64 = env::var("BACKFILL_LIMIT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(500);
    let places = PlacesClient::new(&config.places_api_url, &config.places_user_agent);

    match post_geo_service::backfill_post_coordinates(&pool, &places, limit).await {
        Ok(report) => {
            println!(
                "post geo backfill: candidates={}, updated={}, skipped={}, failed={}",
                report.candidates, report.updated, report.skipped, report.failed
            );
        }
        Err(e) => {
            eprintln!("post geo backfill failed: {}", e);
            std::process::exit(1);
        }
    }
}
