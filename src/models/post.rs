use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::models::{Coordinate, Reaction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Food,
    Travel,
    Entertainment,
    Shopping,
    Fitness,
    Work,
    Social,
    Other,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Food,
        Category::Travel,
        Category::Entertainment,
        Category::Shopping,
        Category::Fitness,
        Category::Work,
        Category::Social,
        Category::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Food => "food",
            Category::Travel => "travel",
            Category::Entertainment => "entertainment",
            Category::Shopping => "shopping",
            Category::Fitness => "fitness",
            Category::Work => "work",
            Category::Social => "social",
            Category::Other => "other",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Travel => "Travel",
            Category::Entertainment => "Fun",
            Category::Shopping => "Shopping",
            Category::Fitness => "Fitness",
            Category::Work => "Work",
            Category::Social => "Social",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category '{0}'")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or(UnknownCategory(wanted))
    }
}

/// Category selector used by the feed and the map; `All` is the pass-through sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn matches(self, category: Option<Category>) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(wanted) => category == Some(wanted),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CategoryFilter::All => "all",
            CategoryFilter::Only(c) => c.as_str(),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(CategoryFilter::All);
        }
        s.parse().map(CategoryFilter::Only)
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostRow {
    pub post_id: String,
    pub user_id: String,
    pub username: String,
    pub user_avatar: Option<String>,
    pub caption: String,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub rating: Option<f64>,
    pub category: Option<String>,
    pub photos: String,
    pub is_public: i64,
    pub comments_count: i64,
    pub created_at: DateTime<Utc>,
}

impl PostRow {
    pub fn into_post(self, reactions: impl IntoIterator<Item = (String, Reaction)>) -> Post {
        let mut post = Post {
            coordinates: Coordinate::from_parts(self.latitude, self.longitude),
            category: self.category.as_deref().and_then(|c| c.parse().ok()),
            photos: serde_json::from_str::<Vec<String>>(&self.photos).unwrap_or_default(),
            id: self.post_id,
            author_id: self.user_id,
            author_name: self.username,
            author_avatar: self.user_avatar.filter(|s| !s.trim().is_empty()),
            caption: self.caption,
            location_label: self.location,
            rating: self.rating,
            is_public: self.is_public == 1,
            comments_count: self.comments_count,
            created_at: self.created_at,
            reactions: BTreeMap::new(),
        };
        for (user_id, reaction) in reactions {
            post.set_reaction(&user_id, reaction);
        }
        post
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    pub id: String,
    pub author_id: String,
    pub author_name: String,
    pub author_avatar: Option<String>,
    pub caption: String,
    pub location_label: String,
    pub coordinates: Option<Coordinate>,
    pub rating: Option<f64>,
    pub category: Option<Category>,
    pub photos: Vec<String>,
    pub is_public: bool,
    pub comments_count: i64,
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    pub reactions: BTreeMap<String, Reaction>,
}

impl Post {
    pub fn reaction_of(&self, user_id: &str) -> Reaction {
        self.reactions.get(user_id).copied().unwrap_or_default()
    }

    pub fn set_reaction(&mut self, user_id: &str, reaction: Reaction) {
        if reaction == Reaction::None {
            self.reactions.remove(user_id);
        } else {
            self.reactions.insert(user_id.to_string(), reaction);
        }
    }

    pub fn agree_count(&self) -> usize {
        self.count_reactions(Reaction::Agree)
    }

    pub fn disagree_count(&self) -> usize {
        self.count_reactions(Reaction::Disagree)
    }

    fn count_reactions(&self, wanted: Reaction) -> usize {
        self.reactions.values().filter(|r| **r == wanted).count()
    }

    /// Rating used for averaging: missing or non-finite counts as zero.
    pub fn rating_or_zero(&self) -> f64 {
        self.rating.filter(|r| r.is_finite()).unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> PostRow {
        PostRow {
            post_id: "p1".into(),
            user_id: "u1".into(),
            username: "Ada".into(),
            user_avatar: Some("  ".into()),
            caption: "Tacos".into(),
            location: "Mission".into(),
            latitude: Some(37.76),
            longitude: None,
            rating: Some(8.0),
            category: Some("Food".into()),
            photos: r#"["https://img/1.jpg"]"#.into(),
            is_public: 1,
            comments_count: 2,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn row_conversion_drops_partial_coordinates_and_blank_avatar() {
        let post = row().into_post(vec![
            ("u2".to_string(), Reaction::Agree),
            ("u3".to_string(), Reaction::None),
        ]);
        assert_eq!(post.coordinates, None);
        assert_eq!(post.author_avatar, None);
        assert_eq!(post.category, Some(Category::Food));
        assert_eq!(post.photos, vec!["https://img/1.jpg".to_string()]);
        assert_eq!(post.agree_count(), 1);
        assert_eq!(post.reaction_of("u3"), Reaction::None);
    }

    #[test]
    fn unknown_category_matches_only_all() {
        let mut r = row();
        r.category = Some("gardening".into());
        let post = r.into_post(Vec::new());
        assert_eq!(post.category, None);
        assert!(CategoryFilter::All.matches(post.category));
        assert!(!CategoryFilter::Only(Category::Other).matches(post.category));
    }

    #[test]
    fn category_filter_parsing() {
        assert_eq!("all".parse::<CategoryFilter>(), Ok(CategoryFilter::All));
        assert_eq!("".parse::<CategoryFilter>(), Ok(CategoryFilter::All));
        assert_eq!(
            "Travel".parse::<CategoryFilter>(),
            Ok(CategoryFilter::Only(Category::Travel))
        );
        assert!("nope".parse::<CategoryFilter>().is_err());
    }

    #[test]
    fn switching_reaction_keeps_single_membership() {
        let mut post = row().into_post(Vec::new());
        post.set_reaction("v", Reaction::Agree);
        post.set_reaction("v", Reaction::Disagree);
        assert_eq!(post.agree_count(), 0);
        assert_eq!(post.disagree_count(), 1);
        post.set_reaction("v", Reaction::None);
        assert_eq!(post.disagree_count(), 0);
    }

    #[test]
    fn non_finite_rating_counts_as_zero() {
        let mut post = row().into_post(Vec::new());
        post.rating = Some(f64::NAN);
        assert_eq!(post.rating_or_zero(), 0.0);
        post.rating = None;
        assert_eq!(post.rating_or_zero(), 0.0);
    }
}
