use serde::Serialize;
use std::str::FromStr;
use tracing::debug;

use crate::database::DataStore;
use crate::error::{ServiceError, ServiceResult};
use crate::models::Reaction;
use crate::services::post_feed_service::PostFeed;
use crate::services::post_service;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionAction {
    Agree,
    Disagree,
    Remove,
}

impl FromStr for ReactionAction {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "agree" => Ok(ReactionAction::Agree),
            "disagree" => Ok(ReactionAction::Disagree),
            "remove" => Ok(ReactionAction::Remove),
            other => Err(ServiceError::invalid(format!("invalid action '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReactionSummary {
    pub post_id: String,
    pub agree_count: usize,
    pub disagree_count: usize,
    pub viewer_reaction: Reaction,
}

/// Applies the viewer's button press. Pressing the reaction they already
/// have clears it; pressing the other one switches.
pub async fn react(
    store: &dyn DataStore,
    feed: &PostFeed,
    viewer_id: &str,
    post_id: &str,
    action: ReactionAction,
) -> ServiceResult<ReactionSummary> {
    let mut post = post_service::load_post_for_viewer(store, viewer_id, post_id).await?;
    let current = post.reaction_of(viewer_id);
    let next = match action {
        ReactionAction::Agree => Reaction::toggled(current, Reaction::Agree),
        ReactionAction::Disagree => Reaction::toggled(current, Reaction::Disagree),
        ReactionAction::Remove => Reaction::None,
    };

    if next != current {
        store.set_reaction(post_id, viewer_id, next).await?;
        post.set_reaction(viewer_id, next);
        debug!(post_id = %post_id, viewer = %viewer_id, reaction = ?next, "reaction updated");
        if post.is_public {
            feed.refresh_logged(store).await;
        }
    }

    Ok(ReactionSummary {
        post_id: post.id.clone(),
        agree_count: post.agree_count(),
        disagree_count: post.disagree_count(),
        viewer_reaction: post.reaction_of(viewer_id),
    })
}
