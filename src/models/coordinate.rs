use serde::{Deserialize, Serialize};

/// WGS84 point in decimal degrees. Range is not validated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Builds a coordinate only when both parts are present and finite.
    pub fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> Option<Self> {
        let (lat, lon) = latitude.zip(longitude)?;
        let coord = Self::new(lat, lon);
        coord.is_numeric().then_some(coord)
    }

    pub fn is_numeric(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}
