use serde::Deserialize;
use serde::Serialize;
use tracing::warn;

use crate::error::{ServiceError, ServiceResult};
use crate::models::Coordinate;

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct PlaceResult {
    pub id: String,
    pub name: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl PlaceResult {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

// Nominatim returns coordinates as strings; some mirrors send numbers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Degrees {
    Text(String),
    Number(f64),
}

impl Degrees {
    fn value(&self) -> Option<f64> {
        let v = match self {
            Degrees::Text(s) => s.trim().parse().ok()?,
            Degrees::Number(n) => *n,
        };
        v.is_finite().then_some(v)
    }
}

#[derive(Debug, Deserialize)]
struct PlaceHit {
    place_id: Option<serde_json::Value>,
    name: Option<String>,
    display_name: Option<String>,
    lat: Option<Degrees>,
    lon: Option<Degrees>,
}

impl PlaceHit {
    fn into_result(self) -> Option<PlaceResult> {
        let latitude = self.lat.as_ref().and_then(Degrees::value)?;
        let longitude = self.lon.as_ref().and_then(Degrees::value)?;
        let description = self.display_name.unwrap_or_default();
        let name = self
            .name
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .or_else(|| description.split(',').next().map(|s| s.trim().to_string()))
            .unwrap_or_default();

        Some(PlaceResult {
            id: match self.place_id {
                Some(serde_json::Value::String(s)) => s,
                Some(serde_json::Value::Number(n)) => n.to_string(),
                _ => String::new(),
            },
            name,
            description,
            latitude,
            longitude,
        })
    }
}

/// Client for a Nominatim-compatible geocoder.
#[derive(Clone)]
pub struct PlacesClient {
    client: reqwest::Client,
    base_url: String,
    user_agent: String,
}

impl PlacesClient {
    pub fn new(base_url: &str, user_agent: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            user_agent: user_agent.to_string(),
        }
    }

    pub async fn search(&self, q: &str, limit: usize) -> ServiceResult<Vec<PlaceResult>> {
        let q = q.trim();
        if q.chars().count() < 2 {
            return Ok(Vec::new());
        }
        let limit = limit.clamp(1, 20).to_string();

        let url = format!("{}/search", self.base_url);
        let hits: Vec<PlaceHit> = self
            .get_json(
                &url,
                &[
                    ("format", "json"),
                    ("addressdetails", "1"),
                    ("limit", limit.as_str()),
                    ("q", q),
                ],
            )
            .await?;

        Ok(hits
            .into_iter()
            .filter_map(PlaceHit::into_result)
            .collect::<Vec<_>>())
    }

    /// Nearest named place for a coordinate, if the upstream knows one.
    pub async fn reverse(&self, coord: Coordinate) -> ServiceResult<Option<PlaceResult>> {
        let url = format!("{}/reverse", self.base_url);
        let lat = coord.latitude.to_string();
        let lon = coord.longitude.to_string();
        let hit: serde_json::Value = self
            .get_json(&url, &[("format", "json"), ("lat", lat.as_str()), ("lon", lon.as_str())])
            .await?;

        // An unknown location comes back as `{ "error": "Unable to geocode" }`.
        if hit.get("error").is_some() {
            return Ok(None);
        }
        Ok(serde_json::from_value::<PlaceHit>(hit)
            .ok()
            .and_then(PlaceHit::into_result))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> ServiceResult<T> {
        let resp = match self
            .client
            .get(url)
            .query(query)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!("📍 Places upstream unreachable: {}", e);
                return Err(ServiceError::Upstream(e.to_string()));
            }
        };

        if !resp.status().is_success() {
            warn!("📍 Places upstream non-OK: {}", resp.status());
            return Err(ServiceError::Upstream(format!("status {}", resp.status())));
        }

        match resp.json().await {
            Ok(data) => Ok(data),
            Err(e) => {
                warn!("📍 Places upstream JSON parse failed: {}", e);
                Err(ServiceError::Upstream(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hits_with_string_coordinates_parse() {
        let raw = r#"[
            {"place_id": 123, "display_name": "Dolores Park, San Francisco, CA", "lat": "37.7596", "lon": "-122.4269"},
            {"place_id": "x", "name": "Ferry Building", "display_name": "Ferry Building, SF", "lat": 37.7955, "lon": -122.3937},
            {"place_id": 9, "display_name": "Nowhere", "lat": "n/a", "lon": "1"}
        ]"#;
        let hits: Vec<PlaceHit> = serde_json::from_str(raw).unwrap();
        let results: Vec<PlaceResult> = hits.into_iter().filter_map(PlaceHit::into_result).collect();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, "123");
        assert_eq!(results[0].name, "Dolores Park");
        assert_eq!(results[0].coordinate(), Coordinate::new(37.7596, -122.4269));
        assert_eq!(results[1].name, "Ferry Building");
    }

    #[tokio::test]
    async fn short_queries_skip_the_upstream() {
        let client = PlacesClient::new("http://127.0.0.1:9", "test");
        assert!(client.search(" a ", 5).await.unwrap().is_empty());
    }
}
