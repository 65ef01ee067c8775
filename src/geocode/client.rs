use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::GeocoderConfig;

/// Reverse geocoding capability. Never fails: no match, an unexpected
/// response shape and transport errors all come back as `None`.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn reverse(&self, lon: f64, lat: f64) -> Option<String>;
}

/// Mapbox Geocoding v5 `mapbox.places` client.
#[derive(Clone)]
pub struct MapboxGeocoder {
    http: reqwest::Client,
    base_url: String,
    token: String,
    worldview: Option<String>,
}

impl MapboxGeocoder {
    pub fn new(config: &GeocoderConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("build geocoder http client")?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            worldview: config.worldview.clone(),
        })
    }

    fn endpoint(&self, lon: f64, lat: f64) -> String {
        format!("{}/{},{}.json", self.base_url, lon, lat)
    }
}

#[async_trait]
impl Geocoder for MapboxGeocoder {
    async fn reverse(&self, lon: f64, lat: f64) -> Option<String> {
        let mut req = self
            .http
            .get(self.endpoint(lon, lat))
            .query(&[("access_token", self.token.as_str())]);
        if let Some(worldview) = &self.worldview {
            req = req.query(&[("worldview", worldview.as_str())]);
        }

        let resp = match req.send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(error = %e, lon, lat, "geocoder request failed");
                return None;
            }
        };
        let status = resp.status();
        if !status.is_success() {
            warn!(%status, lon, lat, "geocoder returned non-success status");
        }

        let body: Value = match resp.json().await {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, lon, lat, "geocoder response was not json");
                return None;
            }
        };

        let place = first_place_name(&body);
        if place.is_none() {
            debug!(lon, lat, "geocoder returned no place");
        }
        place
    }
}

/// `features[0].place_name`, if the response has that shape.
pub fn first_place_name(body: &Value) -> Option<String> {
    body.get("features")?
        .as_array()?
        .first()?
        .get("place_name")?
        .as_str()
        .map(str::to_owned)
}
