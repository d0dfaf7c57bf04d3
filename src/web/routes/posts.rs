use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use serde::Deserialize;

use crate::error::ServiceResult;
use crate::models::CommentRow;
use crate::services::comment_service;
use crate::services::post_service::{self, CreatePostInput, PostView};
use crate::services::reaction_service::{self, ReactionAction, ReactionSummary};
use crate::web::middleware::auth::AuthenticatedUser;
use crate::web::state::AppState;

pub async fn create_post_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
    Json(input): Json<CreatePostInput>,
) -> ServiceResult<(StatusCode, Json<PostView>)> {
    let post =
        post_service::create_post(state.store.as_ref(), &state.feed, &auth_user.id, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(PostView::new(post, &auth_user.id, Utc::now())),
    ))
}

pub async fn post_detail_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(post_id): Path<String>,
    State(state): State<AppState>,
) -> ServiceResult<Json<PostView>> {
    let post =
        post_service::load_post_for_viewer(state.store.as_ref(), &auth_user.id, &post_id).await?;
    Ok(Json(PostView::new(post, &auth_user.id, Utc::now())))
}

pub async fn delete_post_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(post_id): Path<String>,
    State(state): State<AppState>,
) -> ServiceResult<StatusCode> {
    post_service::delete_post(state.store.as_ref(), &state.feed, &auth_user.id, &post_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct ReactionCommand {
    pub action: String, // agree|disagree|remove
}

pub async fn reaction_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(post_id): Path<String>,
    State(state): State<AppState>,
    Json(command): Json<ReactionCommand>,
) -> ServiceResult<Json<ReactionSummary>> {
    let action: ReactionAction = command.action.parse()?;
    let summary = reaction_service::react(
        state.store.as_ref(),
        &state.feed,
        &auth_user.id,
        &post_id,
        action,
    )
    .await?;
    Ok(Json(summary))
}

pub async fn list_comments_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(post_id): Path<String>,
    State(state): State<AppState>,
) -> ServiceResult<Json<Vec<CommentRow>>> {
    let comments =
        comment_service::list_comments(state.store.as_ref(), &auth_user.id, &post_id).await?;
    Ok(Json(comments))
}

#[derive(Debug, Deserialize)]
pub struct NewCommentBody {
    pub text: String,
}

pub async fn add_comment_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(post_id): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<NewCommentBody>,
) -> ServiceResult<(StatusCode, Json<CommentRow>)> {
    let comment = comment_service::add_comment(
        state.store.as_ref(),
        &state.feed,
        &auth_user.id,
        &post_id,
        &body.text,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}
