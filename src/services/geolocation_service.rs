use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::models::Coordinate;

pub const DEFAULT_LOCATION_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy)]
pub struct PositionOptions {
    pub timeout: Duration,
    pub high_accuracy: bool,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_LOCATION_TIMEOUT,
            high_accuracy: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location is not supported on this device")]
    Unsupported,
    #[error("Timed out while acquiring location")]
    Timeout,
    #[error("{0}")]
    Unavailable(String),
}

/// One-shot "where is the viewer" capability.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn current_position(&self, options: &PositionOptions)
        -> Result<Coordinate, LocationError>;
}

/// Viewer location as seen by the aggregation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LocationStatus {
    Pending,
    Unavailable { reason: String },
    Available { coordinates: Coordinate },
}

impl LocationStatus {
    pub fn coordinate(&self) -> Option<Coordinate> {
        match self {
            LocationStatus::Available { coordinates } => Some(*coordinates),
            _ => None,
        }
    }
}

impl From<Result<Coordinate, LocationError>> for LocationStatus {
    fn from(result: Result<Coordinate, LocationError>) -> Self {
        match result {
            Ok(coordinates) => LocationStatus::Available { coordinates },
            Err(e) => LocationStatus::Unavailable {
                reason: e.to_string(),
            },
        }
    }
}

/// Asks the provider once, bounded by `options.timeout`. No retry.
pub async fn acquire_location(
    provider: &dyn LocationProvider,
    options: PositionOptions,
) -> LocationStatus {
    let result = match tokio::time::timeout(options.timeout, provider.current_position(&options))
        .await
    {
        Ok(result) => result,
        Err(_) => Err(LocationError::Timeout),
    };

    match &result {
        Ok(coord) => debug!(
            lat = coord.latitude,
            lon = coord.longitude,
            "📍 viewer location acquired"
        ),
        Err(e) => warn!(error = %e, "📍 viewer location unavailable"),
    }

    result.into()
}

/// Location reported by the client itself (browser geolocation forwarded as
/// query parameters), or the failure it reported instead.
#[derive(Debug, Clone, Default)]
pub struct ReportedLocation {
    pub coordinates: Option<Coordinate>,
    pub error: Option<String>,
}

impl ReportedLocation {
    pub fn new(lat: Option<f64>, lon: Option<f64>, error: Option<&str>) -> Self {
        Self {
            coordinates: Coordinate::from_parts(lat, lon),
            error: error
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string()),
        }
    }

    /// Status without going through a provider; nothing reported yet is `Pending`.
    pub fn status(&self) -> LocationStatus {
        match (&self.coordinates, &self.error) {
            (Some(coordinates), _) => LocationStatus::Available {
                coordinates: *coordinates,
            },
            (None, Some(err)) => LocationStatus::Unavailable {
                reason: parse_reported_error(err).to_string(),
            },
            (None, None) => LocationStatus::Pending,
        }
    }
}

fn parse_reported_error(raw: &str) -> LocationError {
    match raw.to_lowercase().as_str() {
        "denied" | "permission_denied" => LocationError::PermissionDenied,
        "unsupported" => LocationError::Unsupported,
        "timeout" => LocationError::Timeout,
        _ => LocationError::Unavailable(raw.to_string()),
    }
}

#[async_trait]
impl LocationProvider for ReportedLocation {
    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> Result<Coordinate, LocationError> {
        match (&self.coordinates, &self.error) {
            (Some(coord), _) => Ok(*coord),
            (None, Some(err)) => Err(parse_reported_error(err)),
            // Nothing reported yet: stay pending until the caller's timeout.
            (None, None) => std::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NeverResolves;

    #[async_trait]
    impl LocationProvider for NeverResolves {
        async fn current_position(
            &self,
            _options: &PositionOptions,
        ) -> Result<Coordinate, LocationError> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_after_configured_duration() {
        let started = tokio::time::Instant::now();
        let status = acquire_location(&NeverResolves, PositionOptions::default()).await;
        assert_eq!(
            status,
            LocationStatus::Unavailable {
                reason: "Timed out while acquiring location".to_string()
            }
        );
        assert!(started.elapsed() >= DEFAULT_LOCATION_TIMEOUT);
    }

    #[tokio::test]
    async fn reported_coordinates_are_available() {
        let provider = ReportedLocation::new(Some(37.7749), Some(-122.4194), None);
        let status = acquire_location(&provider, PositionOptions::default()).await;
        assert_eq!(status.coordinate(), Some(Coordinate::new(37.7749, -122.4194)));
    }

    #[tokio::test]
    async fn reported_denial_becomes_advisory_reason() {
        let provider = ReportedLocation::new(None, None, Some("denied"));
        let status = acquire_location(&provider, PositionOptions::default()).await;
        assert_eq!(
            status,
            LocationStatus::Unavailable {
                reason: "Location permission denied".to_string()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_reported_waits_for_the_timeout() {
        let options = PositionOptions {
            timeout: Duration::from_secs(3),
            high_accuracy: true,
        };
        let started = tokio::time::Instant::now();
        let status = acquire_location(&ReportedLocation::default(), options).await;
        assert_eq!(
            status,
            LocationStatus::Unavailable {
                reason: "Timed out while acquiring location".to_string()
            }
        );
        assert!(started.elapsed() >= Duration::from_secs(3));
    }

    #[test]
    fn nothing_reported_is_pending() {
        assert_eq!(ReportedLocation::default().status(), LocationStatus::Pending);
        assert_eq!(
            ReportedLocation::new(None, None, Some("GPS off")).status(),
            LocationStatus::Unavailable {
                reason: "GPS off".to_string()
            }
        );
    }
}
