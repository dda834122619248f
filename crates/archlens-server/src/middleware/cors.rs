//! CORS configuration for the browser front end.

use std::time::Duration;

use axum::http::{HeaderValue, Method, header};
#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Origins allowed when none are configured.
const LOCALHOST_ORIGINS: [&str; 4] = [
    "http://localhost:3000",
    "http://localhost:5173",
    "http://127.0.0.1:3000",
    "http://127.0.0.1:5173",
];

/// CORS (Cross-Origin Resource Sharing) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct CorsConfig {
    /// List of allowed CORS origins.
    /// If empty, defaults to localhost origins for development.
    #[cfg_attr(
        feature = "config",
        arg(long = "cors-origins", env = "CORS_ORIGINS", value_delimiter = ',')
    )]
    pub allowed_origins: Vec<String>,

    /// Maximum age for CORS preflight requests in seconds.
    #[cfg_attr(
        feature = "config",
        arg(long = "cors-max-age", env = "CORS_MAX_AGE", default_value = "3600")
    )]
    pub max_age_seconds: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(),
            max_age_seconds: 3600,
        }
    }
}

impl CorsConfig {
    /// Returns the CORS max age as a Duration.
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_seconds)
    }

    /// Converts configured origins to header values, skipping malformed ones.
    pub fn to_header_values(&self) -> Vec<HeaderValue> {
        if self.allowed_origins.is_empty() {
            LOCALHOST_ORIGINS
                .into_iter()
                .map(HeaderValue::from_static)
                .collect()
        } else {
            self.allowed_origins
                .iter()
                .filter_map(|origin| origin.trim().parse().ok())
                .collect()
        }
    }

    /// Creates the CORS layer.
    pub(crate) fn create_layer(&self) -> CorsLayer {
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(self.to_header_values()))
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::CACHE_CONTROL])
            .max_age(self.max_age())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_localhost() {
        assert_eq!(CorsConfig::default().to_header_values().len(), 4);
    }

    #[test]
    fn skips_malformed_origins() {
        let config = CorsConfig {
            allowed_origins: vec!["https://archlens.dev".to_owned(), "bad\norigin".to_owned()],
            ..CorsConfig::default()
        };

        assert_eq!(
            config.to_header_values(),
            vec![HeaderValue::from_static("https://archlens.dev")]
        );
    }
}
