pub mod discover;
pub mod feed;
pub mod location;
pub mod posts;
pub mod user;
