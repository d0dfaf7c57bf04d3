pub mod middleware;
pub mod routes;
pub mod state;

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use http::header::{HeaderValue, CACHE_CONTROL};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::web::middleware::auth as auth_middleware;
use crate::web::routes::{discover, feed, location, posts, user};

pub use state::AppState;

pub fn build_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/api/discover", get(discover::discover_handler))
        .route("/api/discover/stream", get(discover::discover_stream_handler))
        .route("/api/feed", get(feed::feed_handler))
        .route("/api/posts", post(posts::create_post_handler))
        .route(
            "/api/posts/:post_id",
            get(posts::post_detail_handler).delete(posts::delete_post_handler),
        )
        .route(
            "/api/posts/:post_id/reaction",
            post(posts::reaction_handler),
        )
        .route(
            "/api/posts/:post_id/comments",
            get(posts::list_comments_handler).post(posts::add_comment_handler),
        )
        .route("/api/users/search", get(user::search_users_handler))
        .route("/api/users/:user_id", get(user::user_profile_handler))
        .route("/api/users/:user_id/posts", get(user::user_posts_handler))
        .route(
            "/api/users/:user_id/follow",
            post(user::follow_command_handler),
        )
        .route("/api/me/settings", put(user::settings_handler))
        .route(
            "/api/me/follow-requests",
            get(user::follow_requests_handler),
        )
        .route("/api/location/search", get(location::search_locations))
        .route("/api/location/reverse", get(location::reverse_location))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::require_auth,
        ));

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(protected_routes)
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(CatchPanicLayer::new())
        .with_state(state)
}
