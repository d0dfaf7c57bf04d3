use serde::{Deserialize, Serialize};

/// A viewer's vote on a post. One value per (post, viewer), so agreeing and
/// disagreeing at the same time cannot be represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reaction {
    #[default]
    None,
    Agree,
    Disagree,
}

impl Reaction {
    /// Stored form; `None` is never stored (the row is deleted instead).
    pub fn as_db_str(self) -> Option<&'static str> {
        match self {
            Reaction::None => None,
            Reaction::Agree => Some("agree"),
            Reaction::Disagree => Some("disagree"),
        }
    }

    pub fn from_db_str(raw: &str) -> Reaction {
        match raw.trim() {
            "agree" => Reaction::Agree,
            "disagree" => Reaction::Disagree,
            _ => Reaction::None,
        }
    }

    /// Pressing the button for the reaction the viewer already has clears it.
    pub fn toggled(current: Reaction, pressed: Reaction) -> Reaction {
        if current == pressed {
            Reaction::None
        } else {
            pressed
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostReactionRow {
    pub post_id: String,
    pub user_id: String,
    pub reaction: String,
}
