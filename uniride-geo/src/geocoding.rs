use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::warn;
use uniride_core::{GeocodingProvider, Lookup};

/// Reverse-geocoding client. Takes the first result's formatted address;
/// failure degrades to `Lookup::Failed` and the caller shows raw
/// coordinates instead.
pub struct HttpGeocodingClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    formatted: Option<String>,
}

impl HttpGeocodingClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl GeocodingProvider for HttpGeocodingClient {
    async fn reverse(&self, lat: f64, lng: f64) -> Lookup<String> {
        let lat_param = lat.to_string();
        let lon_param = lng.to_string();
        let response = match self
            .http
            .get(&self.base_url)
            .query(&[
                ("lat", lat_param.as_str()),
                ("lon", lon_param.as_str()),
                ("format", "json"),
                ("apiKey", self.api_key.as_str()),
            ])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!("reverse geocode request failed: {}", e);
                return Lookup::Failed;
            }
        };

        if !response.status().is_success() {
            warn!(status = %response.status(), "geocoding API returned error status");
            return Lookup::Failed;
        }

        let body: GeocodeResponse = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                warn!("geocode response decode failed: {}", e);
                return Lookup::Failed;
            }
        };

        match body.results.into_iter().find_map(|r| r.formatted) {
            Some(address) if !address.is_empty() => Lookup::Found(address),
            _ => Lookup::Empty,
        }
    }
}
