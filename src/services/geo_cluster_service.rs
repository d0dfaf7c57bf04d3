//! Map clustering for the discover view.
//!
//! Public posts are grouped by coordinates rounded to five decimals (about
//! 1.1 m), filtered by category, averaged, and finally cut down to the groups
//! within a fixed radius of the viewer. Every function here is pure and total:
//! bad input is skipped or counted as zero, never reported.

use serde::Serialize;
use std::collections::HashMap;
use std::f64::consts::PI;

use crate::models::{CategoryFilter, Coordinate, Post};

pub const EARTH_RADIUS_KM: f64 = 6371.0;
pub const KM_TO_MILES: f64 = 0.621371;
pub const DEFAULT_RADIUS_MILES: f64 = 100.0;

/// `"<lat>,<lon>"`, fixed-point with five decimals.
pub fn cluster_key(coord: Coordinate) -> String {
    format!("{},{}", fixed5(coord.latitude), fixed5(coord.longitude))
}

/// Five-decimal fixed point where exact ties round away from zero and `-0`
/// prints as `0`. `{:.5}` alone rounds ties to even.
fn fixed5(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let magnitude = value.abs();

    // A binary float sits exactly halfway between two 5-decimal values only
    // when it is an odd multiple of 1/64.
    let sixty_fourths = magnitude * 64.0;
    let is_tie = sixty_fourths.fract() == 0.0 && sixty_fourths % 2.0 == 1.0;
    if !is_tie {
        return format!("{}{:.5}", sign, magnitude);
    }

    let units = (magnitude * 100_000.0).floor() as u64 + 1;
    format!("{}{}.{:05}", sign, units / 100_000, units % 100_000)
}

/// Posts bucketed by cluster key, enumerated in first-seen key order.
#[derive(Debug, Default)]
pub struct LocationGroups<'a> {
    groups: Vec<(String, Vec<&'a Post>)>,
}

impl<'a> LocationGroups<'a> {
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[&'a Post])> {
        self.groups.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn get(&self, key: &str) -> Option<&[&'a Post]> {
        self.groups
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_slice())
    }
}

pub fn group(posts: &[Post]) -> LocationGroups<'_> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<&Post>)> = Vec::new();

    for post in posts {
        let Some(coord) = post.coordinates.filter(Coordinate::is_numeric) else {
            continue;
        };
        let key = cluster_key(coord);
        match index.get(&key) {
            Some(&i) => groups[i].1.push(post),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push((key, vec![post]));
            }
        }
    }

    LocationGroups { groups }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Good,
    Medium,
    Low,
}

impl Severity {
    pub fn from_average(avg_rating: f64) -> Severity {
        if avg_rating >= 7.0 {
            Severity::Good
        } else if avg_rating >= 5.0 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    /// Marker colour used by the map.
    pub fn color(self) -> &'static str {
        match self {
            Severity::Good => "#10b981",
            Severity::Medium => "#f59e0b",
            Severity::Low => "#ef4444",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocationCluster {
    pub key: String,
    pub coordinates: Coordinate,
    pub posts: Vec<Post>,
    pub avg_rating: f64,
}

impl LocationCluster {
    pub fn severity(&self) -> Severity {
        Severity::from_average(self.avg_rating)
    }

    /// Average rounded to the nearest integer, halves rounding up.
    pub fn rating_label(&self) -> i64 {
        (self.avg_rating + 0.5).floor() as i64
    }
}

pub fn filter_and_aggregate(
    groups: &LocationGroups<'_>,
    category: CategoryFilter,
) -> Vec<LocationCluster> {
    groups
        .iter()
        .filter_map(|(key, members)| {
            let items: Vec<Post> = members
                .iter()
                .filter(|p| category.matches(p.category))
                .map(|p| (*p).clone())
                .collect();
            let coordinates = items.first()?.coordinates?;
            let sum: f64 = items.iter().map(Post::rating_or_zero).sum();
            let avg_rating = sum / items.len() as f64;
            Some(LocationCluster {
                key: key.to_string(),
                coordinates,
                posts: items,
                avg_rating,
            })
        })
        .collect()
}

/// Great-circle distance in miles (haversine, atan2 form).
pub fn haversine_miles(from: Coordinate, to: Coordinate) -> f64 {
    let to_rad = |deg: f64| (deg * PI) / 180.0;
    let d_lat = to_rad(to.latitude - from.latitude);
    let d_lon = to_rad(to.longitude - from.longitude);
    let a = (d_lat / 2.0).sin() * (d_lat / 2.0).sin()
        + to_rad(from.latitude).cos()
            * to_rad(to.latitude).cos()
            * (d_lon / 2.0).sin()
            * (d_lon / 2.0).sin();
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c * KM_TO_MILES
}

/// Keeps clusters within `radius_miles` (inclusive). Without a viewer
/// location nothing qualifies.
pub fn within_radius(
    clusters: Vec<LocationCluster>,
    viewer: Option<Coordinate>,
    radius_miles: f64,
) -> Vec<LocationCluster> {
    let Some(viewer) = viewer else {
        return Vec::new();
    };
    clusters
        .into_iter()
        .filter(|c| haversine_miles(viewer, c.coordinates) <= radius_miles)
        .collect()
}

/// group → filter_and_aggregate → within_radius.
pub fn nearby_clusters(
    posts: &[Post],
    category: CategoryFilter,
    viewer: Option<Coordinate>,
    radius_miles: f64,
) -> Vec<LocationCluster> {
    let groups = group(posts);
    let clusters = filter_and_aggregate(&groups, category);
    within_radius(clusters, viewer, radius_miles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn post(id: &str, lat: f64, lon: f64, rating: Option<f64>, category: Category) -> Post {
        Post {
            id: id.to_string(),
            author_id: "author".to_string(),
            author_name: "Author".to_string(),
            author_avatar: None,
            caption: String::new(),
            location_label: String::new(),
            coordinates: Some(Coordinate::new(lat, lon)),
            rating,
            category: Some(category),
            photos: vec![],
            is_public: true,
            comments_count: 0,
            created_at: Utc::now(),
            reactions: BTreeMap::new(),
        }
    }

    fn ids(cluster: &LocationCluster) -> Vec<&str> {
        cluster.posts.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn key_is_fixed_point() {
        assert_eq!(cluster_key(Coordinate::new(37.7749, -122.4194)), "37.77490,-122.41940");
        assert_eq!(cluster_key(Coordinate::new(1e-7, 0.0)), "0.00000,0.00000");
    }

    #[test]
    fn same_rounded_coordinate_shares_a_group() {
        let posts = vec![
            post("a", 37.774900, -122.419400, Some(8.0), Category::Food),
            post("b", 37.774904, -122.419403, Some(6.0), Category::Food),
            post("c", 37.774910, -122.419400, Some(6.0), Category::Food),
        ];
        let groups = group(&posts);
        assert_eq!(groups.len(), 2);
        let shared = groups.get("37.77490,-122.41940").unwrap();
        assert_eq!(shared.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(), ["a", "b"]);
        assert!(groups.get("37.77491,-122.41940").is_some());
    }

    #[test]
    fn key_ties_round_away_from_zero() {
        assert_eq!(
            cluster_key(Coordinate::new(37.015625, -122.046875)),
            "37.01563,-122.04688"
        );
        assert_eq!(
            cluster_key(Coordinate::new(-122.015625, 0.015625)),
            "-122.01563,0.01563"
        );
        assert_eq!(
            cluster_key(Coordinate::new(37.015625, 0.0)),
            cluster_key(Coordinate::new(37.01563, 0.0))
        );
    }

    #[test]
    fn negative_zero_keys_like_zero() {
        assert_eq!(cluster_key(Coordinate::new(-0.0, 10.0)), "0.00000,10.00000");
        assert_eq!(cluster_key(Coordinate::new(-0.000001, 10.0)), "-0.00000,10.00000");
    }

    #[test]
    fn groups_follow_first_seen_order() {
        let posts = vec![
            post("x", 10.0, 10.0, Some(1.0), Category::Food),
            post("y", 20.0, 20.0, Some(1.0), Category::Food),
            post("z", 10.0, 10.0, Some(1.0), Category::Food),
        ];
        let groups = group(&posts);
        let keys: Vec<&str> = groups.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["10.00000,10.00000", "20.00000,20.00000"]);
    }

    #[test]
    fn posts_without_numeric_coordinates_are_skipped() {
        let mut missing = post("m", 0.0, 0.0, Some(5.0), Category::Food);
        missing.coordinates = None;
        let mut nan = post("n", 0.0, 0.0, Some(5.0), Category::Food);
        nan.coordinates = Some(Coordinate::new(f64::NAN, 1.0));
        let posts = vec![missing, nan, post("ok", 1.0, 1.0, Some(5.0), Category::Food)];
        let groups = group(&posts);
        assert_eq!(groups.len(), 1);
    }

    #[test]
    fn all_category_yields_one_cluster_per_key() {
        let posts = vec![
            post("a", 1.0, 1.0, Some(8.0), Category::Food),
            post("b", 1.0, 1.0, Some(6.0), Category::Travel),
            post("c", 2.0, 2.0, Some(4.0), Category::Work),
        ];
        let groups = group(&posts);
        let clusters = filter_and_aggregate(&groups, CategoryFilter::All);
        assert_eq!(clusters.len(), groups.len());
        assert_eq!(ids(&clusters[0]), ["a", "b"]);
        assert_eq!(ids(&clusters[1]), ["c"]);
    }

    #[test]
    fn category_filter_drops_empty_groups() {
        let posts = vec![
            post("a", 1.0, 1.0, Some(8.0), Category::Food),
            post("b", 1.0, 1.0, Some(2.0), Category::Travel),
            post("c", 2.0, 2.0, Some(4.0), Category::Work),
        ];
        let groups = group(&posts);
        let clusters = filter_and_aggregate(&groups, CategoryFilter::Only(Category::Food));
        assert_eq!(clusters.len(), 1);
        assert_eq!(ids(&clusters[0]), ["a"]);
        assert_eq!(clusters[0].avg_rating, 8.0);
    }

    #[test]
    fn averages_count_missing_ratings_as_zero() {
        let cases: [(&[Option<f64>], f64); 3] = [
            (&[Some(8.0), Some(6.0), Some(4.0)], 6.0),
            (&[Some(9.0)], 9.0),
            (&[Some(8.0), None], 4.0),
        ];
        for (ratings, expected) in cases {
            let posts: Vec<Post> = ratings
                .iter()
                .enumerate()
                .map(|(i, r)| post(&i.to_string(), 3.0, 3.0, *r, Category::Food))
                .collect();
            let clusters = filter_and_aggregate(&group(&posts), CategoryFilter::All);
            assert_eq!(clusters[0].avg_rating, expected, "ratings {:?}", ratings);
        }
    }

    #[test]
    fn single_post_without_rating_averages_zero() {
        let posts = vec![post("a", 1.0, 1.0, None, Category::Food)];
        let clusters = filter_and_aggregate(&group(&posts), CategoryFilter::All);
        assert_eq!(clusters[0].avg_rating, 0.0);
        assert_eq!(clusters[0].severity(), Severity::Low);
    }

    #[test]
    fn representative_coordinate_is_first_member() {
        let posts = vec![
            post("a", 37.774901, -122.419401, Some(8.0), Category::Food),
            post("b", 37.774904, -122.419404, Some(6.0), Category::Food),
        ];
        let clusters = filter_and_aggregate(&group(&posts), CategoryFilter::All);
        assert_eq!(clusters[0].coordinates, Coordinate::new(37.774901, -122.419401));
    }

    #[test]
    fn one_degree_of_longitude_at_the_equator() {
        let origin = Coordinate::new(0.0, 0.0);
        let miles = haversine_miles(origin, Coordinate::new(0.0, 1.0));
        assert!((miles - 69.09).abs() < 0.01, "got {}", miles);

        let posts = vec![post("a", 0.0, 1.0, Some(7.0), Category::Food)];
        let clusters = filter_and_aggregate(&group(&posts), CategoryFilter::All);
        assert_eq!(within_radius(clusters.clone(), Some(origin), 100.0).len(), 1);
        assert!(within_radius(clusters, Some(origin), 50.0).is_empty());
    }

    #[test]
    fn radius_boundary_is_inclusive() {
        let origin = Coordinate::new(0.0, 0.0);
        let target = Coordinate::new(0.5, 0.5);
        let exact = haversine_miles(origin, target);
        let posts = vec![post("a", 0.5, 0.5, Some(7.0), Category::Food)];
        let clusters = filter_and_aggregate(&group(&posts), CategoryFilter::All);
        assert_eq!(within_radius(clusters, Some(origin), exact).len(), 1);
    }

    #[test]
    fn no_viewer_location_means_no_clusters() {
        let posts = vec![post("a", 0.0, 0.0, Some(7.0), Category::Food)];
        let clusters = filter_and_aggregate(&group(&posts), CategoryFilter::All);
        assert!(within_radius(clusters, None, f64::MAX).is_empty());
    }

    #[test]
    fn severity_boundaries() {
        assert_eq!(Severity::from_average(7.0), Severity::Good);
        assert_eq!(Severity::from_average(6.999), Severity::Medium);
        assert_eq!(Severity::from_average(5.0), Severity::Medium);
        assert_eq!(Severity::from_average(4.999), Severity::Low);
    }

    #[test]
    fn rating_label_rounds_halves_up() {
        let mut cluster = LocationCluster {
            key: String::new(),
            coordinates: Coordinate::new(0.0, 0.0),
            posts: vec![],
            avg_rating: 6.5,
        };
        assert_eq!(cluster.rating_label(), 7);
        cluster.avg_rating = 6.49;
        assert_eq!(cluster.rating_label(), 6);
    }

    #[test]
    fn rerunning_pipeline_is_idempotent() {
        let viewer = Some(Coordinate::new(37.7749, -122.4194));
        let posts = vec![
            post("a", 37.7749, -122.4194, Some(8.0), Category::Food),
            post("b", 37.80, -122.27, Some(3.0), Category::Social),
            post("c", 40.7128, -74.0060, Some(9.0), Category::Food),
        ];
        let first = nearby_clusters(&posts, CategoryFilter::All, viewer, DEFAULT_RADIUS_MILES);
        let second = nearby_clusters(&posts, CategoryFilter::All, viewer, DEFAULT_RADIUS_MILES);
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn san_francisco_scenario() {
        let viewer = Some(Coordinate::new(37.7749, -122.4194));
        let posts = vec![
            post("A", 37.77490, -122.41940, Some(8.0), Category::Food),
            post("B", 37.774904, -122.419404, Some(6.0), Category::Food),
            post("C", 40.7128, -74.0060, Some(9.0), Category::Food),
        ];
        let clusters = nearby_clusters(
            &posts,
            CategoryFilter::Only(Category::Food),
            viewer,
            DEFAULT_RADIUS_MILES,
        );
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].key, "37.77490,-122.41940");
        assert_eq!(ids(&clusters[0]), ["A", "B"]);
        assert_eq!(clusters[0].avg_rating, 7.0);
        assert_eq!(clusters[0].severity(), Severity::Good);
        assert_eq!(clusters[0].rating_label(), 7);
    }

    #[test]
    fn fifth_decimal_difference_splits_the_scenario_pair() {
        let viewer = Some(Coordinate::new(37.7749, -122.4194));
        let posts = vec![
            post("A", 37.77490, -122.41940, Some(8.0), Category::Food),
            post("B", 37.77491, -122.41941, Some(6.0), Category::Food),
        ];
        let clusters = nearby_clusters(&posts, CategoryFilter::All, viewer, DEFAULT_RADIUS_MILES);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].avg_rating, 8.0);
        assert_eq!(clusters[1].avg_rating, 6.0);
    }
}
