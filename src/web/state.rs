use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::DataStore;
use crate::services::location_service::PlacesClient;
use crate::services::post_feed_service::PostFeed;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DataStore>,
    pub feed: PostFeed,
    pub places: PlacesClient,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn DataStore>, feed: PostFeed, config: AppConfig) -> Self {
        Self {
            places: PlacesClient::new(&config.places_api_url, &config.places_user_agent),
            store,
            feed,
            config: Arc::new(config),
        }
    }
}
