use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::database::DataStore;
use crate::models::Post;

/// Complete list of public posts, newest first.
pub type PostSnapshot = Arc<Vec<Post>>;

/// Live source of public-post snapshots. Every publish replaces the previous
/// snapshot; subscribers only ever observe the most recent one.
#[derive(Clone)]
pub struct PostFeed {
    tx: Arc<watch::Sender<Option<PostSnapshot>>>,
}

impl Default for PostFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl PostFeed {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    pub fn publish(&self, posts: Vec<Post>) {
        debug!(posts = posts.len(), "📮 publishing public post snapshot");
        self.tx.send_replace(Some(Arc::new(posts)));
    }

    /// Reloads "all posts where visibility = public" and publishes them.
    pub async fn refresh(&self, store: &dyn DataStore) -> sqlx::Result<()> {
        let posts = store.list_public_posts().await?;
        self.publish(posts);
        Ok(())
    }

    /// Like `refresh`, for callers that already committed their write and
    /// must not fail because the snapshot reload did.
    pub async fn refresh_logged(&self, store: &dyn DataStore) {
        if let Err(e) = self.refresh(store).await {
            warn!("📮 post snapshot refresh failed: {}", e);
        }
    }

    pub fn latest(&self) -> Option<PostSnapshot> {
        self.tx.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<Option<PostSnapshot>> {
        self.tx.subscribe()
    }

    /// Live receivers: `watch()` handles, subscriptions and discover sessions.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Registers `on_snapshot`, called with the current snapshot (if any) and
    /// then once per published snapshot. Dropping the handle unregisters.
    pub fn subscribe<F>(&self, mut on_snapshot: F) -> Subscription
    where
        F: FnMut(PostSnapshot) + Send + 'static,
    {
        let mut rx = self.tx.subscribe();
        rx.mark_changed();
        let handle = tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let snapshot = rx.borrow_and_update().clone();
                if let Some(snapshot) = snapshot {
                    on_snapshot(snapshot);
                }
            }
        });
        Subscription { handle }
    }

    /// Periodically republishes from the store so writes made outside this
    /// process still reach subscribers.
    pub fn spawn_refresher(&self, store: Arc<dyn DataStore>, every: Duration) -> Subscription {
        let feed = self.clone();
        let handle = tokio::spawn(async move {
            // `interval` panics on a zero period.
            let mut ticker = tokio::time::interval(every.max(Duration::from_millis(100)));
            loop {
                ticker.tick().await;
                feed.refresh_logged(store.as_ref()).await;
            }
        });
        Subscription { handle }
    }
}

/// Cancellation handle for a feed callback or background task.
#[must_use = "dropping a Subscription cancels it"]
pub struct Subscription {
    handle: JoinHandle<()>,
}

impl Subscription {
    pub fn cancel(self) {
        drop(self);
    }

    pub fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn latest_snapshot_wins() {
        let feed = PostFeed::new();
        assert!(feed.latest().is_none());
        feed.publish(vec![]);
        feed.publish(vec![]);
        assert_eq!(feed.latest().map(|s| s.len()), Some(0));
    }

    #[tokio::test]
    async fn subscriber_sees_current_and_future_snapshots_until_cancelled() {
        let feed = PostFeed::new();
        feed.publish(vec![]);

        let seen = Arc::new(Mutex::new(0usize));
        let counter = seen.clone();
        let sub = feed.subscribe(move |_snapshot| {
            *counter.lock().unwrap() += 1;
        });
        settle().await;
        assert_eq!(*seen.lock().unwrap(), 1);

        feed.publish(vec![]);
        settle().await;
        assert_eq!(*seen.lock().unwrap(), 2);

        sub.cancel();
        settle().await;
        feed.publish(vec![]);
        settle().await;
        assert_eq!(*seen.lock().unwrap(), 2);
    }
}
