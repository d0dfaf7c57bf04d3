use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::error::{ServiceError, ServiceResult};
use crate::models::UserRow;
use crate::services::follow_service::{self, FollowAction, FollowRequestsView, Relationship};
use crate::services::post_service::{self, PostView};
use crate::services::user_service::{self, SettingsInput, UserCardView, UserProfileView};
use crate::web::middleware::auth::AuthenticatedUser;
use crate::web::state::AppState;

pub async fn user_profile_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(user_id): Path<String>,
    State(state): State<AppState>,
) -> ServiceResult<Json<UserProfileView>> {
    let view = user_service::load_user_profile_view(state.store.as_ref(), &auth_user.id, &user_id)
        .await?
        .ok_or(ServiceError::NotFound)?;
    Ok(Json(view))
}

pub async fn user_posts_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(user_id): Path<String>,
    State(state): State<AppState>,
) -> ServiceResult<Json<Vec<PostView>>> {
    if state.store.load_user(&user_id).await?.is_none() {
        return Err(ServiceError::NotFound);
    }
    let posts =
        post_service::list_user_posts_for_viewer(state.store.as_ref(), &auth_user.id, &user_id)
            .await?;
    Ok(Json(posts))
}

#[derive(Debug, Deserialize)]
pub struct UserSearchQuery {
    pub q: Option<String>,
}

pub async fn search_users_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Query(query): Query<UserSearchQuery>,
    State(state): State<AppState>,
) -> ServiceResult<Json<Vec<UserCardView>>> {
    let term = query.q.unwrap_or_default();
    let cards = user_service::search_users(state.store.as_ref(), &auth_user.id, &term).await?;
    Ok(Json(cards))
}

pub async fn settings_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
    Json(input): Json<SettingsInput>,
) -> ServiceResult<Json<UserRow>> {
    let user = user_service::update_settings(state.store.as_ref(), &auth_user.id, &input).await?;
    Ok(Json(user))
}

#[derive(Debug, Deserialize)]
pub struct FollowCommand {
    pub action: String, // request|cancel|accept|decline|unfollow
}

#[derive(Debug, Serialize)]
pub struct FollowCommandResult {
    pub user_id: String,
    pub relationship: Relationship,
}

pub async fn follow_command_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(target_user_id): Path<String>,
    State(state): State<AppState>,
    Json(command): Json<FollowCommand>,
) -> ServiceResult<Json<FollowCommandResult>> {
    let action: FollowAction = command.action.parse()?;
    let relationship = follow_service::apply_follow_action(
        state.store.as_ref(),
        &auth_user.id,
        &target_user_id,
        action,
    )
    .await?;
    Ok(Json(FollowCommandResult {
        user_id: target_user_id,
        relationship,
    }))
}

pub async fn follow_requests_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
) -> ServiceResult<Json<FollowRequestsView>> {
    let view = follow_service::list_follow_requests(state.store.as_ref(), &auth_user.id).await?;
    Ok(Json(view))
}
