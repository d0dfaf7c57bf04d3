use axum::{
    extract::{Query, State},
    Extension, Json,
};

use crate::error::ServiceResult;
use crate::services::feed_service::{self, FeedQuery};
use crate::services::post_service::PostView;
use crate::web::middleware::auth::AuthenticatedUser;
use crate::web::state::AppState;

pub async fn feed_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Query(query): Query<FeedQuery>,
    State(state): State<AppState>,
) -> ServiceResult<Json<Vec<PostView>>> {
    let posts = feed_service::build_home_feed(state.store.as_ref(), &auth_user.id, &query).await?;
    Ok(Json(posts))
}
