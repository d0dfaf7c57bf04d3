use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio_stream::{wrappers::WatchStream, Stream, StreamExt};
use tracing::debug;

use crate::error::ServiceResult;
use crate::models::CategoryFilter;
use crate::services::discover_service::{DiscoverInputs, DiscoverSession, DiscoverState};
use crate::services::geolocation_service::{PositionOptions, ReportedLocation};
use crate::web::middleware::auth::AuthenticatedUser;
use crate::web::state::AppState;

#[derive(Debug, Deserialize, Default)]
pub struct DiscoverQuery {
    pub category: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    /// Set by the client when its own geolocation call failed.
    pub loc_error: Option<String>,
    pub radius_mi: Option<f64>,
}

impl DiscoverQuery {
    fn category(&self) -> ServiceResult<CategoryFilter> {
        Ok(self.category.as_deref().unwrap_or("all").parse()?)
    }

    fn radius(&self, state: &AppState) -> f64 {
        self.radius_mi
            .filter(|r| r.is_finite() && *r > 0.0)
            .unwrap_or(state.config.discover_radius_miles)
    }

    fn reported_location(&self) -> ReportedLocation {
        ReportedLocation::new(self.lat, self.lon, self.loc_error.as_deref())
    }
}

/// Current map state computed from the latest public-post snapshot.
pub async fn discover_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Query(query): Query<DiscoverQuery>,
    State(state): State<AppState>,
) -> ServiceResult<Json<DiscoverState>> {
    let mut inputs = DiscoverInputs::new(query.category()?, query.radius(&state));
    inputs.snapshot = state.feed.latest();
    inputs.location = query.reported_location().status();

    debug!(viewer = %auth_user.id, category = inputs.category.as_str(), "🗺️ discover");
    Ok(Json(inputs.state()))
}

/// Same state as `discover_handler`, pushed again every time the post feed
/// changes. The session lives as long as the client keeps the stream open.
pub async fn discover_stream_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Query(query): Query<DiscoverQuery>,
    State(state): State<AppState>,
) -> ServiceResult<Sse<impl Stream<Item = Result<Event, axum::Error>>>> {
    let session = DiscoverSession::start(
        &state.feed,
        Arc::new(query.reported_location()),
        PositionOptions {
            timeout: state.config.location_timeout,
            high_accuracy: true,
        },
        query.category()?,
        query.radius(&state),
    );
    debug!(viewer = %auth_user.id, "🗺️ discover stream opened");

    let states = WatchStream::new(session.states());
    let events = states.map(move |discover_state| {
        let _session = &session;
        Event::default().event("discover").json_data(&discover_state)
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
