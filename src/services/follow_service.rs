use serde::Serialize;
use std::str::FromStr;
use tracing::info;
use uuid::Uuid;

use crate::database::DataStore;
use crate::error::{ServiceError, ServiceResult};
use crate::models::FollowRequestRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowAction {
    Request,
    Cancel,
    Accept,
    Decline,
    Unfollow,
}

impl FromStr for FollowAction {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "request" => Ok(FollowAction::Request),
            "cancel" => Ok(FollowAction::Cancel),
            "accept" => Ok(FollowAction::Accept),
            "decline" => Ok(FollowAction::Decline),
            "unfollow" => Ok(FollowAction::Unfollow),
            other => Err(ServiceError::invalid(format!("invalid action '{}'", other))),
        }
    }
}

/// How the viewer relates to another user, from the viewer's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Relationship {
    SelfProfile,
    Following,
    /// Viewer asked to follow, not answered yet.
    Requested,
    /// The other user asked to follow the viewer.
    Incoming,
    None,
}

pub async fn relationship(
    store: &dyn DataStore,
    viewer_id: &str,
    other_id: &str,
) -> ServiceResult<Relationship> {
    if viewer_id == other_id {
        return Ok(Relationship::SelfProfile);
    }
    if store.is_following(viewer_id, other_id).await? {
        return Ok(Relationship::Following);
    }
    if store.find_follow_request(viewer_id, other_id).await?.is_some() {
        return Ok(Relationship::Requested);
    }
    if store.find_follow_request(other_id, viewer_id).await?.is_some() {
        return Ok(Relationship::Incoming);
    }
    Ok(Relationship::None)
}

/// Runs one step of the request/approval workflow and returns the resulting
/// relationship. `accept`/`decline` act on a request *from* `target_user_id`.
pub async fn apply_follow_action(
    store: &dyn DataStore,
    actor_user_id: &str,
    target_user_id: &str,
    action: FollowAction,
) -> ServiceResult<Relationship> {
    if actor_user_id == target_user_id {
        return Err(ServiceError::invalid("cannot follow yourself"));
    }
    if store.load_user(target_user_id).await?.is_none() {
        return Err(ServiceError::NotFound);
    }

    match action {
        FollowAction::Request => {
            let already = store.is_following(actor_user_id, target_user_id).await?
                || store
                    .find_follow_request(actor_user_id, target_user_id)
                    .await?
                    .is_some();
            if !already {
                let id = Uuid::new_v4().to_string();
                store
                    .insert_follow_request(&id, actor_user_id, target_user_id)
                    .await?;
                info!(from = %actor_user_id, to = %target_user_id, "🤝 follow request sent");
            }
        }
        FollowAction::Cancel => {
            store
                .delete_follow_requests(actor_user_id, target_user_id)
                .await?;
        }
        FollowAction::Accept => {
            if !store
                .accept_follow_request(target_user_id, actor_user_id)
                .await?
            {
                return Err(ServiceError::NotFound);
            }
            info!(follower = %target_user_id, followee = %actor_user_id, "🤝 follow request accepted");
        }
        FollowAction::Decline => {
            store
                .delete_follow_requests(target_user_id, actor_user_id)
                .await?;
        }
        FollowAction::Unfollow => {
            store.delete_follow(actor_user_id, target_user_id).await?;
        }
    }

    relationship(store, actor_user_id, target_user_id).await
}

#[derive(Debug, Serialize)]
pub struct FollowRequestsView {
    pub incoming: Vec<FollowRequestRow>,
    pub outgoing: Vec<FollowRequestRow>,
}

pub async fn list_follow_requests(
    store: &dyn DataStore,
    viewer_id: &str,
) -> ServiceResult<FollowRequestsView> {
    Ok(FollowRequestsView {
        incoming: store.list_incoming_requests(viewer_id).await?,
        outgoing: store.list_outgoing_requests(viewer_id).await?,
    })
}
