use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::models::{CategoryFilter, Coordinate, Post};
use crate::services::geo_cluster_service::{self, LocationCluster, Severity};
use crate::services::geolocation_service::{
    self, LocationProvider, LocationStatus, PositionOptions,
};
use crate::services::post_feed_service::{PostFeed, PostSnapshot};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterPostPreview {
    pub post_id: String,
    pub author_name: String,
    pub rating: Option<f64>,
    pub caption: String,
    pub location_label: String,
}

/// Everything a map marker and its popup need.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterMarkerView {
    pub key: String,
    pub coordinates: Coordinate,
    pub avg_rating: f64,
    pub rating_label: i64,
    pub severity: Severity,
    pub color: &'static str,
    pub post_count: usize,
    pub posts: Vec<ClusterPostPreview>,
}

impl From<&LocationCluster> for ClusterMarkerView {
    fn from(cluster: &LocationCluster) -> Self {
        let severity = cluster.severity();
        Self {
            key: cluster.key.clone(),
            coordinates: cluster.coordinates,
            avg_rating: cluster.avg_rating,
            rating_label: cluster.rating_label(),
            severity,
            color: severity.color(),
            post_count: cluster.posts.len(),
            posts: cluster.posts.iter().map(preview).collect(),
        }
    }
}

fn preview(post: &Post) -> ClusterPostPreview {
    let author_name = if post.author_name.trim().is_empty() {
        "User".to_string()
    } else {
        post.author_name.clone()
    };
    ClusterPostPreview {
        post_id: post.id.clone(),
        author_name,
        rating: post.rating,
        caption: post.caption.clone(),
        location_label: post.location_label.clone(),
    }
}

/// What the map should show right now.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DiscoverState {
    /// No post snapshot received yet.
    Loading,
    /// Posts are in, the viewer location is still being requested.
    Locating,
    LocationUnavailable { reason: String },
    NoResults,
    Ready { clusters: Vec<ClusterMarkerView> },
}

#[derive(Debug, Clone)]
pub struct DiscoverInputs {
    pub snapshot: Option<PostSnapshot>,
    pub location: LocationStatus,
    pub category: CategoryFilter,
    pub radius_miles: f64,
}

impl DiscoverInputs {
    pub fn new(category: CategoryFilter, radius_miles: f64) -> Self {
        Self {
            snapshot: None,
            location: LocationStatus::Pending,
            category,
            radius_miles,
        }
    }

    /// Recomputes the whole state from the current inputs.
    pub fn state(&self) -> DiscoverState {
        let Some(posts) = &self.snapshot else {
            return DiscoverState::Loading;
        };
        let viewer = match &self.location {
            LocationStatus::Pending => return DiscoverState::Locating,
            LocationStatus::Unavailable { reason } => {
                return DiscoverState::LocationUnavailable {
                    reason: reason.clone(),
                }
            }
            LocationStatus::Available { coordinates } => *coordinates,
        };

        let clusters = geo_cluster_service::nearby_clusters(
            posts,
            self.category,
            Some(viewer),
            self.radius_miles,
        );
        if clusters.is_empty() {
            return DiscoverState::NoResults;
        }
        DiscoverState::Ready {
            clusters: clusters.iter().map(ClusterMarkerView::from).collect(),
        }
    }
}

/// Live discover view: follows the post feed, asks for the viewer location
/// once, and republishes a fresh `DiscoverState` after every input change.
/// Dropping the session releases the feed subscription and any pending
/// location request.
pub struct DiscoverSession {
    state_rx: watch::Receiver<DiscoverState>,
    category_tx: watch::Sender<CategoryFilter>,
    task: JoinHandle<()>,
}

impl DiscoverSession {
    pub fn start(
        feed: &PostFeed,
        provider: Arc<dyn LocationProvider>,
        options: PositionOptions,
        category: CategoryFilter,
        radius_miles: f64,
    ) -> Self {
        let mut inputs = DiscoverInputs::new(category, radius_miles);
        let (state_tx, state_rx) = watch::channel(inputs.state());
        let (category_tx, mut category_rx) = watch::channel(category);
        let mut feed_rx = feed.watch();
        feed_rx.mark_changed();

        let task = tokio::spawn(async move {
            let location = async move {
                geolocation_service::acquire_location(provider.as_ref(), options).await
            };
            tokio::pin!(location);
            let mut location_done = false;

            loop {
                tokio::select! {
                    changed = feed_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let snapshot = feed_rx.borrow_and_update().clone();
                        if snapshot.is_some() {
                            inputs.snapshot = snapshot;
                        }
                    }
                    status = &mut location, if !location_done => {
                        location_done = true;
                        inputs.location = status;
                    }
                    changed = category_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        inputs.category = *category_rx.borrow_and_update();
                    }
                }

                let state = inputs.state();
                debug!(category = inputs.category.as_str(), "🗺️ discover state recomputed");
                if state_tx.send(state).is_err() {
                    break;
                }
            }
        });

        Self {
            state_rx,
            category_tx,
            task,
        }
    }

    pub fn current(&self) -> DiscoverState {
        self.state_rx.borrow().clone()
    }

    pub fn states(&self) -> watch::Receiver<DiscoverState> {
        self.state_rx.clone()
    }

    pub fn set_category(&self, category: CategoryFilter) {
        self.category_tx.send_replace(category);
    }
}

impl Drop for DiscoverSession {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use crate::services::geolocation_service::{LocationError, ReportedLocation};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::BTreeMap;
    use std::time::Duration;

    struct NeverResolves;

    #[async_trait]
    impl LocationProvider for NeverResolves {
        async fn current_position(
            &self,
            _options: &PositionOptions,
        ) -> Result<Coordinate, LocationError> {
            std::future::pending().await
        }
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    fn post(id: &str, lat: f64, lon: f64, rating: f64, category: Category) -> Post {
        Post {
            id: id.to_string(),
            author_id: "u".to_string(),
            author_name: String::new(),
            author_avatar: None,
            caption: "cap".to_string(),
            location_label: "somewhere".to_string(),
            coordinates: Some(Coordinate::new(lat, lon)),
            rating: Some(rating),
            category: Some(category),
            photos: vec![],
            is_public: true,
            comments_count: 0,
            created_at: Utc::now(),
            reactions: BTreeMap::new(),
        }
    }

    fn sf() -> LocationStatus {
        LocationStatus::Available {
            coordinates: Coordinate::new(37.7749, -122.4194),
        }
    }

    #[test]
    fn loading_takes_precedence_over_location() {
        let mut inputs = DiscoverInputs::new(CategoryFilter::All, 100.0);
        inputs.location = sf();
        assert_eq!(inputs.state(), DiscoverState::Loading);
    }

    #[test]
    fn pending_and_denied_location_are_distinct() {
        let mut inputs = DiscoverInputs::new(CategoryFilter::All, 100.0);
        inputs.snapshot = Some(Arc::new(vec![post("a", 37.7749, -122.4194, 8.0, Category::Food)]));
        assert_eq!(inputs.state(), DiscoverState::Locating);

        inputs.location = LocationStatus::Unavailable {
            reason: "Location permission denied".into(),
        };
        assert_eq!(
            inputs.state(),
            DiscoverState::LocationUnavailable {
                reason: "Location permission denied".into()
            }
        );
    }

    #[test]
    fn nothing_in_radius_is_no_results() {
        let mut inputs = DiscoverInputs::new(CategoryFilter::All, 100.0);
        inputs.snapshot = Some(Arc::new(vec![post("ny", 40.7128, -74.0060, 9.0, Category::Food)]));
        inputs.location = sf();
        assert_eq!(inputs.state(), DiscoverState::NoResults);
    }

    #[test]
    fn ready_markers_carry_label_and_bucket() {
        let mut inputs = DiscoverInputs::new(CategoryFilter::Only(Category::Food), 100.0);
        inputs.snapshot = Some(Arc::new(vec![
            post("a", 37.7749, -122.4194, 8.0, Category::Food),
            post("b", 37.774904, -122.419404, 5.0, Category::Food),
            post("c", 37.7749, -122.4194, 1.0, Category::Work),
        ]));
        inputs.location = sf();
        let DiscoverState::Ready { clusters } = inputs.state() else {
            panic!("expected clusters");
        };
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].avg_rating, 6.5);
        assert_eq!(clusters[0].rating_label, 7);
        assert_eq!(clusters[0].severity, Severity::Medium);
        assert_eq!(clusters[0].post_count, 2);
        assert_eq!(clusters[0].posts[0].author_name, "User");
    }

    #[tokio::test(start_paused = true)]
    async fn unreported_location_stays_locating_until_timeout() {
        let feed = PostFeed::new();
        feed.publish(vec![post("a", 37.7749, -122.4194, 8.0, Category::Food)]);
        let session = DiscoverSession::start(
            &feed,
            Arc::new(ReportedLocation::default()),
            PositionOptions {
                timeout: Duration::from_secs(30),
                high_accuracy: true,
            },
            CategoryFilter::All,
            100.0,
        );
        settle().await;
        assert_eq!(session.current(), DiscoverState::Locating);

        let started = tokio::time::Instant::now();
        let mut rx = session.states();
        let state = rx
            .wait_for(|s| matches!(s, DiscoverState::LocationUnavailable { .. }))
            .await
            .unwrap()
            .clone();
        assert_eq!(
            state,
            DiscoverState::LocationUnavailable {
                reason: "Timed out while acquiring location".into()
            }
        );
        assert!(started.elapsed() >= Duration::from_secs(30));
    }

    #[tokio::test]
    async fn dropping_the_session_releases_feed_and_location_request() {
        let feed = PostFeed::new();
        let provider = Arc::new(NeverResolves);
        let session = DiscoverSession::start(
            &feed,
            provider.clone(),
            PositionOptions::default(),
            CategoryFilter::All,
            100.0,
        );
        settle().await;
        assert_eq!(feed.subscriber_count(), 1);
        assert_eq!(Arc::strong_count(&provider), 2);

        drop(session);
        settle().await;
        assert_eq!(feed.subscriber_count(), 0);
        assert_eq!(Arc::strong_count(&provider), 1);
    }
}
