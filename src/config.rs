use std::env;
use std::time::Duration;

use crate::services::geo_cluster_service::DEFAULT_RADIUS_MILES;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set (e.g. in .env)")]
    Missing(&'static str),
    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub discover_radius_miles: f64,
    pub location_timeout: Duration,
    pub feed_refresh_interval: Duration,
    pub places_api_url: String,
    pub places_user_agent: String,
}

impl AppConfig {
    /// Reads the process environment; call `dotenvy::dotenv()` first.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        Ok(Self {
            database_url,
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or(&lookup, "PORT", 3000)?,
            discover_radius_miles: parse_or(&lookup, "DISCOVER_RADIUS_MILES", DEFAULT_RADIUS_MILES)?,
            location_timeout: Duration::from_secs(parse_or(&lookup, "LOCATION_TIMEOUT_SECS", 10)?),
            feed_refresh_interval: Duration::from_secs(parse_or(
                &lookup,
                "FEED_REFRESH_SECS",
                30,
            )?),
            places_api_url: lookup("PLACES_API_URL")
                .unwrap_or_else(|| "https://nominatim.openstreetmap.org".to_string()),
            places_user_agent: lookup("PLACES_USER_AGENT")
                .unwrap_or_else(|| "wavelength/0.1 (discover map)".to_string()),
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_apply() {
        let cfg = AppConfig::from_lookup(lookup(&[("DATABASE_URL", "sqlite://w.db")])).unwrap();
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.discover_radius_miles, 100.0);
        assert_eq!(cfg.location_timeout, Duration::from_secs(10));
        assert_eq!(cfg.host, "127.0.0.1");
    }

    #[test]
    fn missing_database_url_is_an_error() {
        assert!(matches!(
            AppConfig::from_lookup(lookup(&[])),
            Err(ConfigError::Missing("DATABASE_URL"))
        ));
    }

    #[test]
    fn bad_numbers_are_reported() {
        let err = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }
}
