pub mod comment;
pub mod coordinate;
pub mod current_user;
pub mod follow_request;
pub mod post;
pub mod reaction;
pub mod user;

pub use comment::CommentRow;
pub use coordinate::Coordinate;
pub use current_user::CurrentUserRow;
pub use follow_request::FollowRequestRow;
pub use post::{Category, CategoryFilter, Post, PostRow};
pub use reaction::{PostReactionRow, Reaction};
pub use user::{UserRow, UserStatsRow};
