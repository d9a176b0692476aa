use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::warn;
use uniride_core::{Lookup, RoutePoint, RoutingProvider};

/// Routing API client. The upstream answers a GeoJSON-style feature
/// collection; only the first feature's coordinate list is used.
///
/// Best-effort by contract: every failure path degrades to `Lookup::Failed`
/// so a missing route never blocks the reservation flow.
pub struct HttpRoutingClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    mode: String,
}

#[derive(Debug, Deserialize)]
struct RouteResponse {
    #[serde(default)]
    features: Vec<RouteFeature>,
}

#[derive(Debug, Deserialize)]
struct RouteFeature {
    geometry: RouteGeometry,
}

#[derive(Debug, Deserialize)]
struct RouteGeometry {
    coordinates: serde_json::Value,
}

impl HttpRoutingClient {
    pub fn new(
        base_url: &str,
        api_key: &str,
        mode: &str,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            mode: mode.to_string(),
        })
    }
}

#[async_trait]
impl RoutingProvider for HttpRoutingClient {
    async fn route(&self, origin: RoutePoint, destination: RoutePoint) -> Lookup<Vec<RoutePoint>> {
        let waypoints = format!(
            "{},{}|{},{}",
            origin.lat, origin.lng, destination.lat, destination.lng
        );

        let response = match self
            .http
            .get(&self.base_url)
            .query(&[
                ("waypoints", waypoints.as_str()),
                ("mode", self.mode.as_str()),
                ("apiKey", self.api_key.as_str()),
            ])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!("routing request failed: {}", e);
                return Lookup::Failed;
            }
        };

        if !response.status().is_success() {
            warn!(status = %response.status(), "routing API returned error status");
            return Lookup::Failed;
        }

        let body: RouteResponse = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                warn!("routing response decode failed: {}", e);
                return Lookup::Failed;
            }
        };

        match body.features.first() {
            Some(feature) => {
                let points = flatten_coordinates(&feature.geometry.coordinates);
                if points.is_empty() {
                    Lookup::Empty
                } else {
                    Lookup::Found(points)
                }
            }
            None => Lookup::Empty,
        }
    }
}

/// Flattens a GeoJSON LineString or MultiLineString coordinate array into
/// route points. GeoJSON order is [lng, lat].
fn flatten_coordinates(value: &serde_json::Value) -> Vec<RoutePoint> {
    let mut points = Vec::new();
    collect_points(value, &mut points);
    points
}

fn collect_points(value: &serde_json::Value, out: &mut Vec<RoutePoint>) {
    let Some(items) = value.as_array() else {
        return;
    };
    // A coordinate pair is an array of two numbers; anything else is a
    // nested segment list.
    if items.len() == 2 && items.iter().all(|v| v.is_number()) {
        if let (Some(lng), Some(lat)) = (items[0].as_f64(), items[1].as_f64()) {
            out.push(RoutePoint { lat, lng });
        }
        return;
    }
    for item in items {
        collect_points(item, out);
    }
}
