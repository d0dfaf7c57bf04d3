use sqlx::SqlitePool;
use std::collections::HashMap;
use tracing::info;
use tracing::warn;

use crate::database::posts_repo;
use crate::services::location_service::PlacesClient;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct PostGeoBackfillReport {
    pub candidates: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Geocodes posts that have a location label but no coordinates, so they can
/// show up on the discover map.
pub async fn backfill_post_coordinates(
    pool: &SqlitePool,
    places: &PlacesClient,
    limit: i64,
) -> sqlx::Result<PostGeoBackfillReport> {
    let candidates = posts_repo::list_posts_missing_coordinates(pool, limit).await?;
    let mut report = PostGeoBackfillReport {
        candidates: candidates.len(),
        ..Default::default()
    };

    // Many posts share a label ("Golden Gate Park"); look each one up once.
    let mut cache: HashMap<String, Option<(f64, f64)>> = HashMap::new();

    for row in candidates {
        if row.latitude.is_some() && row.longitude.is_some() {
            report.skipped += 1;
            continue;
        }

        let query = normalize_label(&row.location);
        if query.is_empty() {
            report.skipped += 1;
            continue;
        }

        let cache_key = query.to_lowercase();
        let coords = match cache.get(&cache_key) {
            Some(hit) => *hit,
            None => match places.search(&query, 3).await {
                Ok(results) => {
                    let found = results.first().map(|r| (r.latitude, r.longitude));
                    cache.insert(cache_key, found);
                    found
                }
                Err(e) => {
                    warn!("📍 Geocoding failed for post {}: {}", row.post_id, e);
                    report.failed += 1;
                    continue;
                }
            },
        };

        let Some((lat, lon)) = coords else {
            warn!(
                "📍 No coords found for post {} (location='{}')",
                row.post_id, row.location
            );
            report.failed += 1;
            continue;
        };

        let updated = posts_repo::update_post_coordinates(pool, &row.post_id, lat, lon).await?;
        if updated > 0 {
            report.updated += 1;
        } else {
            report.failed += 1;
        }
    }

    info!(
        "📍 Post geo backfill done: candidates={}, updated={}, skipped={}, failed={}",
        report.candidates, report.updated, report.skipped, report.failed
    );

    Ok(report)
}

/// Collapses whitespace and drops a leading pin emoji some clients prepend.
fn normalize_label(raw: &str) -> String {
    raw.trim()
        .trim_start_matches('📍')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_normalized() {
        assert_eq!(normalize_label("  📍 Golden   Gate Park "), "Golden Gate Park");
        assert_eq!(normalize_label("   "), "");
    }
}
