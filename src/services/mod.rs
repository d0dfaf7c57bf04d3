pub mod comment_service;
pub mod discover_service;
pub mod feed_service;
pub mod follow_service;
pub mod geo_cluster_service;
pub mod geolocation_service;
pub mod location_service;
pub mod post_feed_service;
pub mod post_geo_service;
pub mod post_service;
pub mod reaction_service;
pub mod user_service;
