#![allow(dead_code)]

use chrono::Utc;
use std::sync::Arc;

use wavelength::database::{self, DataStore, SqliteStore};
use wavelength::models::Post;
use wavelength::services::post_feed_service::PostFeed;
use wavelength::services::post_service::{self, CreatePostInput};

pub struct TestApp {
    pub sqlite: SqliteStore,
    pub store: Arc<dyn DataStore>,
    pub feed: PostFeed,
}

pub async fn setup() -> TestApp {
    let pool = database::connect("sqlite::memory:").await.unwrap();
    let sqlite = SqliteStore::new(pool);
    TestApp {
        store: Arc::new(sqlite.clone()),
        sqlite,
        feed: PostFeed::new(),
    }
}

impl TestApp {
    pub async fn add_user(&self, user_id: &str, display_name: &str) {
        sqlx::query(
            "INSERT INTO users (user_id, display_name, email, bio, created_at) VALUES (?1, ?2, ?3, '', ?4)",
        )
        .bind(user_id)
        .bind(display_name)
        .bind(format!("{}@example.com", user_id))
        .bind(Utc::now())
        .execute(self.sqlite.pool())
        .await
        .unwrap();
    }

    pub async fn set_local_viewer(&self, user_id: &str) {
        sqlx::query("INSERT INTO current_user (user_id) VALUES (?1)")
            .bind(user_id)
            .execute(self.sqlite.pool())
            .await
            .unwrap();
    }

    pub async fn post_at(
        &self,
        author_id: &str,
        caption: &str,
        category: &str,
        rating: f64,
        coords: Option<(f64, f64)>,
        is_public: bool,
    ) -> Post {
        let input = CreatePostInput {
            caption: caption.to_string(),
            category: Some(category.to_string()),
            rating: Some(rating),
            photos: vec!["https://img.example/p.jpg".to_string()],
            location: Some(caption.to_string()),
            latitude: coords.map(|c| c.0),
            longitude: coords.map(|c| c.1),
            is_public: Some(is_public),
        };
        post_service::create_post(self.store.as_ref(), &self.feed, author_id, input)
            .await
            .unwrap()
    }
}
