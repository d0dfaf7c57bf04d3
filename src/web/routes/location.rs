use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::error::{ServiceError, ServiceResult};
use crate::models::Coordinate;
use crate::services::location_service::PlaceResult;
use crate::web::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LocationSearchQuery {
    q: Option<String>,
    limit: Option<usize>,
}

pub async fn search_locations(
    Query(query): Query<LocationSearchQuery>,
    State(state): State<AppState>,
) -> ServiceResult<Json<Vec<PlaceResult>>> {
    let q = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|s| s.chars().count() >= 2)
        .ok_or_else(|| ServiceError::invalid("query must be at least 2 characters"))?;

    let limit = query.limit.unwrap_or(8);
    Ok(Json(state.places.search(q, limit).await?))
}

#[derive(Debug, Deserialize)]
pub struct ReverseQuery {
    lat: Option<f64>,
    lon: Option<f64>,
}

pub async fn reverse_location(
    Query(query): Query<ReverseQuery>,
    State(state): State<AppState>,
) -> ServiceResult<Json<Option<PlaceResult>>> {
    let coord = Coordinate::from_parts(query.lat, query.lon)
        .ok_or_else(|| ServiceError::invalid("lat and lon are required"))?;
    Ok(Json(state.places.reverse(coord).await?))
}
